//! Reader thread: raw bytes in, decoded keys out.
//!
//! The reader blocks on console input, decodes UTF-8 and escape sequences,
//! and forwards each key to the dispatcher. After a key that may end the read
//! session (Enter, Ctrl-C, Ctrl-D) it parks until kicked, so input typed
//! after the line belongs to whoever reads next and background output is not
//! interleaved with a half-handled keystroke.

use crate::instance::Message;
use runeline_core::{ConsoleInput, Key, KeyDecoder, Utf8Accumulator};
use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender, SyncSender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// How long a read waits before re-checking window size and stop requests.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Input-side events delivered to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Event {
    Key(Key),
    Resize(u16, u16),
    /// Input ended or failed; no further events follow
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    /// Resume reading
    Kick,
    Stop,
}

/// Handle for resuming a parked reader.
#[derive(Debug, Clone)]
pub(crate) struct Kicker {
    control: Sender<Control>,
}

impl Kicker {
    pub(crate) fn kick(&self) {
        if self.control.send(Control::Kick).is_err() {
            log::trace!("kick after reader exit");
        }
    }
}

/// The running reader thread.
#[derive(Debug)]
pub(crate) struct Terminal {
    control: Sender<Control>,
    handle: Option<JoinHandle<()>>,
}

impl Terminal {
    /// Start a parked reader sending into `events`. `size` is the window
    /// size the dispatcher already knows about.
    pub(crate) fn spawn(
        input: Box<dyn ConsoleInput>,
        events: SyncSender<Message>,
        escape_timeout: Duration,
        size: Option<(u16, u16)>,
    ) -> std::io::Result<Self> {
        let (control, control_rx) = mpsc::channel();
        let reader = Reader {
            input,
            events,
            control: control_rx,
            escape_timeout,
            decoder: KeyDecoder::new(),
            utf8: Utf8Accumulator::new(),
            pending: VecDeque::new(),
            size,
            parked: true,
        };
        let handle = thread::Builder::new()
            .name("runeline-reader".to_string())
            .spawn(move || reader.run())?;
        Ok(Terminal {
            control,
            handle: Some(handle),
        })
    }

    pub(crate) fn kicker(&self) -> Kicker {
        Kicker {
            control: self.control.clone(),
        }
    }

    /// Stop the reader and wait for it to exit.
    pub(crate) fn stop(&mut self) {
        let _ = self.control.send(Control::Stop);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("reader thread panicked");
            }
        }
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Reader {
    input: Box<dyn ConsoleInput>,
    events: SyncSender<Message>,
    control: Receiver<Control>,
    escape_timeout: Duration,
    decoder: KeyDecoder,
    utf8: Utf8Accumulator,
    /// Decoded runes not yet fed to the key decoder
    pending: VecDeque<char>,
    size: Option<(u16, u16)>,
    parked: bool,
}

impl Reader {
    fn run(mut self) {
        log::debug!("reader started");
        let mut buf = [0u8; 256];
        loop {
            if self.parked {
                match self.control.recv() {
                    Ok(Control::Kick) => self.parked = false,
                    Ok(Control::Stop) | Err(_) => break,
                }
                // the terminal may have been resized while parked
                if !self.check_size() {
                    break;
                }
                continue;
            }
            match self.control.try_recv() {
                Ok(Control::Stop) | Err(mpsc::TryRecvError::Disconnected) => break,
                Ok(Control::Kick) | Err(mpsc::TryRecvError::Empty) => {}
            }

            if let Some(c) = self.pending.pop_front() {
                if !self.feed(c) {
                    break;
                }
                continue;
            }

            let timeout = if self.decoder.is_pending_escape() || self.utf8.is_pending() {
                self.escape_timeout
            } else {
                POLL_INTERVAL
            };
            match self.input.read_timeout(&mut buf, timeout) {
                Ok(None) => {
                    if !self.check_size() || !self.flush() {
                        break;
                    }
                }
                Ok(Some(0)) => {
                    log::debug!("input closed");
                    let _ = self.events.send(Message::Input(Event::Eof));
                    break;
                }
                Ok(Some(n)) => self.pending.extend(self.utf8.push(&buf[..n])),
                Err(err) => {
                    log::warn!("reading input failed: {err}");
                    let _ = self.events.send(Message::Input(Event::Eof));
                    break;
                }
            }
        }
        log::debug!("reader stopped");
    }

    /// Decode one rune. Returns `false` once the dispatcher is gone.
    fn feed(&mut self, c: char) -> bool {
        match self.decoder.feed(c) {
            Some(key) => self.send_key(key),
            None => true,
        }
    }

    /// Resolve partial input after a quiet period.
    fn flush(&mut self) -> bool {
        if let Some(c) = self.utf8.flush() {
            self.pending.push_back(c);
            return true;
        }
        match self.decoder.flush() {
            Some(key) => self.send_key(key),
            None => true,
        }
    }

    fn send_key(&mut self, key: Key) -> bool {
        if key.parks_reader() {
            self.parked = true;
        }
        self.events.send(Message::Input(Event::Key(key))).is_ok()
    }

    fn check_size(&mut self) -> bool {
        let Ok(size) = self.input.get_window_size() else {
            return true;
        };
        if self.size == Some(size) {
            return true;
        }
        self.size = Some(size);
        self.events
            .send(Message::Input(Event::Resize(size.0, size.1)))
            .is_ok()
    }
}
