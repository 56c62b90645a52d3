//! State machine decoder turning a rune stream into logical keys.
//!
//! The decoder is fed one rune at a time and keeps its escape-parsing state
//! between calls, so a sequence split across reads decodes the same as one
//! delivered whole. Unrecognized sequences never stall the stream: either the
//! final rune is passed through or the sequence is discarded.

use crate::key::Key;

/// Longest CSI parameter string kept before the sequence is abandoned
const MAX_CSI_PARAMS: usize = 16;

/// Decoder state between runes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecoderState {
    /// Plain input
    Idle,
    /// Saw ESC, waiting for the next rune
    SawEsc,
    /// Inside `ESC [`, collecting parameter runes
    Csi(String),
    /// Saw `ESC O`
    Ss3,
}

/// Escape-sequence decoder producing at most one [`Key`] per rune.
#[derive(Debug)]
pub struct KeyDecoder {
    state: DecoderState,
}

impl KeyDecoder {
    pub fn new() -> Self {
        Self {
            state: DecoderState::Idle,
        }
    }

    pub fn state(&self) -> &DecoderState {
        &self.state
    }

    /// Whether a partial escape sequence is buffered.
    pub fn is_pending_escape(&self) -> bool {
        self.state != DecoderState::Idle
    }

    /// Feed one rune. Returns the decoded key once a sequence is complete.
    pub fn feed(&mut self, c: char) -> Option<Key> {
        let state = std::mem::replace(&mut self.state, DecoderState::Idle);
        let key = match state {
            DecoderState::Idle => self.feed_idle(c),
            DecoderState::SawEsc => self.feed_escape(c),
            DecoderState::Csi(params) => self.feed_csi(params, c),
            DecoderState::Ss3 => Some(navigation_key(c).unwrap_or(Key::Char(c))),
        };
        if let Some(key) = &key {
            log::trace!("decoded key {key:?}");
        }
        key
    }

    /// Resolve a pending sequence after the escape timeout expired.
    ///
    /// A lone ESC becomes [`Key::Escape`]; an unfinished CSI/SS3 sequence is
    /// dropped.
    pub fn flush(&mut self) -> Option<Key> {
        match std::mem::replace(&mut self.state, DecoderState::Idle) {
            DecoderState::SawEsc => Some(Key::Escape),
            DecoderState::Idle => None,
            state => {
                log::debug!("discarding incomplete escape sequence {state:?}");
                None
            }
        }
    }

    pub fn reset(&mut self) {
        self.state = DecoderState::Idle;
    }

    fn feed_idle(&mut self, c: char) -> Option<Key> {
        if c == '\x1b' {
            self.state = DecoderState::SawEsc;
            return None;
        }
        Some(control_key(c).unwrap_or(Key::Char(c)))
    }

    fn feed_escape(&mut self, c: char) -> Option<Key> {
        let key = match c {
            '[' => {
                self.state = DecoderState::Csi(String::new());
                return None;
            }
            'O' => {
                self.state = DecoderState::Ss3;
                return None;
            }
            '\x1b' => Key::Escape,
            'b' => Key::MetaBackward,
            'f' => Key::MetaForward,
            'd' => Key::MetaDelete,
            '\x7f' | '\x08' => Key::MetaBackspace,
            't' | '\x14' => Key::MetaTranspose,
            _ => control_key(c).unwrap_or(Key::Char(c)),
        };
        Some(key)
    }

    fn feed_csi(&mut self, mut params: String, c: char) -> Option<Key> {
        if c.is_ascii_digit() || c == ';' {
            if params.len() >= MAX_CSI_PARAMS {
                log::debug!("discarding oversized CSI sequence");
                return None;
            }
            params.push(c);
            self.state = DecoderState::Csi(params);
            return None;
        }

        if params.is_empty() {
            return Some(navigation_key(c).unwrap_or(Key::Char(c)));
        }

        if c == '~' {
            let code = params.split(';').next().unwrap_or_default();
            return match code {
                "1" | "7" => Some(Key::LineStart),
                "4" | "8" => Some(Key::LineEnd),
                "3" => Some(Key::DeleteForward),
                _ => {
                    log::debug!("ignoring CSI {params}~");
                    None
                }
            };
        }

        // modified cursor keys such as `ESC [ 1 ; 5 C` keep their base meaning
        let key = navigation_key(c);
        if key.is_none() {
            log::debug!("ignoring CSI {params}{c}");
        }
        key
    }
}

impl Default for KeyDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a C0 control code to its editing key.
pub fn control_key(c: char) -> Option<Key> {
    let key = match c {
        '\x01' => Key::LineStart,
        '\x02' => Key::Backward,
        '\x03' => Key::Interrupt,
        '\x04' => Key::Delete,
        '\x05' => Key::LineEnd,
        '\x06' => Key::Forward,
        '\x07' => Key::Bell,
        '\x08' | '\x7f' => Key::Backspace,
        '\t' => Key::Tab,
        '\n' | '\r' => Key::Enter,
        '\x0b' => Key::Kill,
        '\x0c' => Key::ClearScreen,
        '\x0e' => Key::Next,
        '\x10' => Key::Prev,
        '\x12' => Key::BackwardSearch,
        '\x13' => Key::ForwardSearch,
        '\x14' => Key::Transpose,
        '\x15' => Key::KillFront,
        '\x17' => Key::BackwardKillWord,
        '\x19' => Key::Yank,
        _ => return None,
    };
    Some(key)
}

fn navigation_key(c: char) -> Option<Key> {
    match c {
        'A' => Some(Key::Prev),
        'B' => Some(Key::Next),
        'C' => Some(Key::Forward),
        'D' => Some(Key::Backward),
        'H' => Some(Key::LineStart),
        'F' => Some(Key::LineEnd),
        _ => None,
    }
}
