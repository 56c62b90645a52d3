//! Modal (vi-style) key interception in front of the dispatcher.
//!
//! Insert mode passes everything through except ESC. Normal mode maps
//! `h/j/k/l` to cursor keys, performs a small set of motions itself and
//! rings the bell for anything else.

use crate::buffer::LineBuffer;
use crate::key::Key;

/// Current vi mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VimMode {
    Normal,
    Insert,
    /// Reserved; behaves like insert mode
    Visual,
}

/// What the dispatcher should do with a key after vi handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VimAction {
    /// Route this key (possibly remapped) through normal editing
    Pass(Key),
    /// Fully handled
    Consumed,
}

/// vi mode state, kept across submitted lines.
#[derive(Debug, Clone)]
pub struct VimEngine {
    enabled: bool,
    mode: VimMode,
}

impl VimEngine {
    pub fn new(enabled: bool) -> Self {
        VimEngine {
            enabled,
            mode: VimMode::Insert,
        }
    }

    /// Turn vi mode on or off. Either way editing resumes in insert mode.
    pub fn set_enabled(&mut self, on: bool) {
        self.enabled = on;
        self.mode = VimMode::Insert;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn mode(&self) -> VimMode {
        self.mode
    }

    pub fn is_normal(&self) -> bool {
        self.enabled && self.mode == VimMode::Normal
    }

    /// Filter `key` through the current mode.
    ///
    /// `read_next` fetches the target key for `f/F/t/T`; it returns `None`
    /// when input ended.
    pub fn handle(
        &mut self,
        key: Key,
        buf: &mut LineBuffer,
        read_next: &mut dyn FnMut() -> Option<Key>,
    ) -> VimAction {
        if !self.enabled {
            return VimAction::Pass(key);
        }
        match self.mode {
            VimMode::Normal => self.handle_normal(key, buf, read_next),
            VimMode::Insert | VimMode::Visual => {
                if key == Key::Escape {
                    log::trace!("vim: insert -> normal");
                    self.mode = VimMode::Normal;
                    return VimAction::Consumed;
                }
                VimAction::Pass(key)
            }
        }
    }

    fn handle_normal(
        &mut self,
        key: Key,
        buf: &mut LineBuffer,
        read_next: &mut dyn FnMut() -> Option<Key>,
    ) -> VimAction {
        let c = match key {
            Key::Enter | Key::Interrupt => return VimAction::Pass(key),
            Key::Char(c) => c,
            _ => {
                buf.bell();
                return VimAction::Consumed;
            }
        };

        let mapped = match c {
            'h' => Some(Key::Backward),
            'j' => Some(Key::Next),
            'k' => Some(Key::Prev),
            'l' => Some(Key::Forward),
            _ => None,
        };
        if let Some(mapped) = mapped {
            return VimAction::Pass(mapped);
        }

        match c {
            'i' | 'I' | 'a' | 'A' | 's' => {
                match c {
                    'I' => {
                        buf.move_to_line_start();
                    }
                    'a' => {
                        buf.move_forward();
                    }
                    'A' => {
                        buf.move_to_line_end();
                    }
                    's' => {
                        buf.delete();
                    }
                    _ => {}
                }
                log::trace!("vim: normal -> insert via {c:?}");
                self.mode = VimMode::Insert;
            }
            '0' | '^' => {
                buf.move_to_line_start();
            }
            '$' => {
                buf.move_to_line_end();
            }
            'b' => {
                buf.move_to_prev_word();
            }
            'w' => {
                buf.move_to_next_word();
            }
            'f' | 'F' | 't' | 'T' => {
                let prev_char = matches!(c, 't' | 'T');
                let reverse = matches!(c, 'F' | 'T');
                if let Some(Key::Char(target)) = read_next() {
                    buf.move_to(target, prev_char, reverse);
                }
            }
            _ => buf.bell(),
        }
        VimAction::Consumed
    }
}

impl Default for VimEngine {
    fn default() -> Self {
        VimEngine::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::MemoryOutput;

    fn setup(text: &str) -> (VimEngine, LineBuffer, MemoryOutput) {
        let output = MemoryOutput::new();
        let mut buf = LineBuffer::new(Box::new(output.clone()), "");
        buf.write_str(text);
        output.clear();
        let mut vim = VimEngine::new(true);
        let mut none = || None;
        vim.handle(Key::Escape, &mut buf, &mut none);
        (vim, buf, output)
    }

    fn press(vim: &mut VimEngine, buf: &mut LineBuffer, key: Key) -> VimAction {
        vim.handle(key, buf, &mut || None)
    }

    #[test]
    fn test_disabled_passes_everything() {
        let output = MemoryOutput::new();
        let mut buf = LineBuffer::new(Box::new(output), "");
        let mut vim = VimEngine::new(false);
        assert_eq!(press(&mut vim, &mut buf, Key::Escape), VimAction::Pass(Key::Escape));
        assert_eq!(vim.mode(), VimMode::Insert);
    }

    #[test]
    fn test_escape_enters_normal() {
        let (vim, _, _) = setup("abc");
        assert!(vim.is_normal());
    }

    #[test]
    fn test_hjkl_remap() {
        let (mut vim, mut buf, _) = setup("abc");
        assert_eq!(press(&mut vim, &mut buf, Key::Char('h')), VimAction::Pass(Key::Backward));
        assert_eq!(press(&mut vim, &mut buf, Key::Char('j')), VimAction::Pass(Key::Next));
        assert_eq!(press(&mut vim, &mut buf, Key::Char('k')), VimAction::Pass(Key::Prev));
        assert_eq!(press(&mut vim, &mut buf, Key::Char('l')), VimAction::Pass(Key::Forward));
        assert_eq!(press(&mut vim, &mut buf, Key::Enter), VimAction::Pass(Key::Enter));
        assert!(vim.is_normal());
    }

    #[test]
    fn test_insert_commands() {
        let (mut vim, mut buf, _) = setup("abc");
        assert_eq!(press(&mut vim, &mut buf, Key::Char('I')), VimAction::Consumed);
        assert_eq!(vim.mode(), VimMode::Insert);
        assert_eq!(buf.idx(), 0);

        press(&mut vim, &mut buf, Key::Escape);
        press(&mut vim, &mut buf, Key::Char('A'));
        assert_eq!(buf.idx(), 3);

        press(&mut vim, &mut buf, Key::Escape);
        press(&mut vim, &mut buf, Key::Char('0'));
        press(&mut vim, &mut buf, Key::Char('s'));
        assert_eq!(buf.text(), "bc");
        assert_eq!(vim.mode(), VimMode::Insert);
        assert_eq!(press(&mut vim, &mut buf, Key::Char('x')), VimAction::Pass(Key::Char('x')));
    }

    #[test]
    fn test_motions() {
        let (mut vim, mut buf, _) = setup("foo bar baz");
        press(&mut vim, &mut buf, Key::Char('0'));
        assert_eq!(buf.idx(), 0);
        press(&mut vim, &mut buf, Key::Char('w'));
        assert_eq!(buf.idx(), 4);
        press(&mut vim, &mut buf, Key::Char('$'));
        assert_eq!(buf.idx(), 11);
        press(&mut vim, &mut buf, Key::Char('b'));
        assert_eq!(buf.idx(), 8);
        press(&mut vim, &mut buf, Key::Char('^'));
        assert_eq!(buf.idx(), 0);
    }

    #[test]
    fn test_find_char_reads_next_key() {
        let (mut vim, mut buf, _) = setup("foo bar baz");
        press(&mut vim, &mut buf, Key::Char('0'));

        let mut next = Some(Key::Char('b'));
        let action = vim.handle(Key::Char('f'), &mut buf, &mut || next.take());
        assert_eq!(action, VimAction::Consumed);
        assert_eq!(buf.idx(), 4);

        let mut next = Some(Key::Char('z'));
        vim.handle(Key::Char('t'), &mut buf, &mut || next.take());
        assert_eq!(buf.idx(), 9);

        let mut next = Some(Key::Char('o'));
        vim.handle(Key::Char('F'), &mut buf, &mut || next.take());
        assert_eq!(buf.idx(), 2);

        let mut next = Some(Key::Escape);
        vim.handle(Key::Char('f'), &mut buf, &mut || next.take());
        assert_eq!(buf.idx(), 2);
    }

    #[test]
    fn test_unknown_key_rings_bell() {
        let (mut vim, mut buf, output) = setup("abc");
        assert_eq!(press(&mut vim, &mut buf, Key::Char('z')), VimAction::Consumed);
        assert_eq!(output.take(), "\x07");
        assert_eq!(buf.text(), "abc");
    }

    #[test]
    fn test_toggle_resets_to_insert() {
        let (mut vim, _, _) = setup("");
        vim.set_enabled(false);
        assert!(!vim.is_normal());
        vim.set_enabled(true);
        assert_eq!(vim.mode(), VimMode::Insert);
    }
}
