//! The `Readline` instance and its dispatcher thread.
//!
//! All editing state lives in an [`Operation`] owned by the dispatcher
//! thread. Callers, background writers and the reader thread talk to it only
//! through one message queue, so rendering from keystrokes and from
//! background writes never interleaves.

use crate::builder::ReadlineBuilder;
use crate::error::{ReadlineError, ReadlineResult};
use crate::terminal::{Event, Kicker, Terminal};
use runeline_core::{
    AutoCompleter, Config, ConsoleResult, HistoryResult, Key, Operation, Outcome, RawModeGuard,
    Stream,
};
use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, SyncSender};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

/// Capacity of the dispatcher queue
pub(crate) const QUEUE_CAPACITY: usize = 64;

/// Requests handled on the dispatcher thread.
pub(crate) enum Message {
    Input(Event),
    Read {
        password: Option<String>,
        reply: Sender<Outcome>,
    },
    Write {
        stream: Stream,
        text: String,
        reply: Sender<ConsoleResult<()>>,
    },
    SetPrompt(String),
    SetVimMode(bool),
    IsVimMode(Sender<bool>),
    SetCompleter(Option<Box<dyn AutoCompleter>>),
    SetHistoryPath {
        path: Option<PathBuf>,
        reply: Sender<HistoryResult<()>>,
    },
    SaveHistory {
        line: String,
        reply: Sender<HistoryResult<()>>,
    },
    Shutdown,
}

/// An interactive line reader bound to one terminal.
///
/// Reads are blocking request/response calls; `Readline` is `Sync`, so
/// background threads may write through [`Readline::stdout`] while another
/// thread waits in [`Readline::readline`].
///
/// # Examples
///
/// ```
/// use runeline::{Readline, ReadlineError};
/// use runeline_core::MemoryOutput;
/// use runeline_io::MockConsoleInput;
///
/// let input = MockConsoleInput::new();
/// input.push_str("echo hi\r");
/// input.close();
///
/// let rl = Readline::builder()
///     .with_prompt("$ ")
///     .with_input(input)
///     .with_output(MemoryOutput::new())
///     .with_error_output(MemoryOutput::new())
///     .build()
///     .unwrap();
///
/// assert_eq!(rl.readline().unwrap(), "echo hi");
/// assert!(matches!(rl.readline(), Err(ReadlineError::Eof)));
/// rl.close().unwrap();
/// ```
pub struct Readline {
    messages: SyncSender<Message>,
    terminal: Mutex<Option<Terminal>>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
    raw_mode: Mutex<Option<RawModeGuard>>,
    closed: AtomicBool,
}

impl Readline {
    /// Create an instance on the process terminal.
    pub fn new(config: Config) -> ReadlineResult<Self> {
        ReadlineBuilder::from_config(config).build()
    }

    pub fn builder() -> ReadlineBuilder {
        ReadlineBuilder::new()
    }

    /// Start the dispatcher and reader threads.
    pub(crate) fn start(
        op: Operation,
        terminal: impl FnOnce(SyncSender<Message>) -> io::Result<Terminal>,
        raw_mode: Option<RawModeGuard>,
    ) -> ReadlineResult<Self> {
        let (messages, inbox) = mpsc::sync_channel(QUEUE_CAPACITY);
        let terminal = terminal(messages.clone())?;
        let dispatcher = Dispatcher {
            op,
            inbox,
            kicker: terminal.kicker(),
            session: None,
            input_closed: false,
            deferred: VecDeque::new(),
        };
        let handle = thread::Builder::new()
            .name("runeline-dispatcher".to_string())
            .spawn(move || dispatcher.run())?;

        Ok(Readline {
            messages,
            terminal: Mutex::new(Some(terminal)),
            dispatcher: Mutex::new(Some(handle)),
            raw_mode: Mutex::new(raw_mode),
            closed: AtomicBool::new(false),
        })
    }

    /// Read one line.
    ///
    /// Returns [`ReadlineError::Interrupt`] on Ctrl-C and
    /// [`ReadlineError::Eof`] on Ctrl-D, closed input or a closed instance.
    pub fn readline(&self) -> ReadlineResult<String> {
        self.read(None)
    }

    /// Read one line as UTF-8 bytes.
    pub fn read_slice(&self) -> ReadlineResult<Vec<u8>> {
        self.readline().map(String::into_bytes)
    }

    /// Read a line without echoing it or recording it in history.
    pub fn read_password(&self, prompt: &str) -> ReadlineResult<String> {
        self.read(Some(prompt.to_string()))
    }

    fn read(&self, password: Option<String>) -> ReadlineResult<String> {
        let outcome = match self.request(|reply| Message::Read { password, reply }) {
            Ok(outcome) => outcome,
            Err(ReadlineError::Closed) => Outcome::Eof,
            Err(err) => return Err(err),
        };
        match outcome {
            Outcome::Line(line) => Ok(line),
            Outcome::Interrupted => Err(ReadlineError::Interrupt),
            Outcome::Eof => Err(ReadlineError::Eof),
        }
    }

    pub fn set_prompt(&self, prompt: &str) {
        self.notify(Message::SetPrompt(prompt.to_string()));
    }

    pub fn set_vim_mode(&self, on: bool) {
        self.notify(Message::SetVimMode(on));
    }

    pub fn is_vim_mode(&self) -> bool {
        self.request(Message::IsVimMode).unwrap_or(false)
    }

    /// Replace the completer, or turn completion off with `None`. Any
    /// completion list on screen is dropped.
    pub fn set_auto_complete(&self, completer: Option<Box<dyn AutoCompleter>>) {
        self.notify(Message::SetCompleter(completer));
    }

    /// Switch history to another file, or to memory-only with `None`.
    pub fn set_history_path(&self, path: Option<&Path>) -> ReadlineResult<()> {
        let path = path.map(Path::to_path_buf);
        Ok(self.request(|reply| Message::SetHistoryPath { path, reply })??)
    }

    /// Record a line in history without reading it.
    pub fn save_history(&self, line: &str) -> ReadlineResult<()> {
        let line = line.to_string();
        Ok(self.request(|reply| Message::SaveHistory { line, reply })??)
    }

    /// Writer for program output that keeps the edited line intact.
    pub fn stdout(&self) -> BackgroundWriter {
        BackgroundWriter {
            stream: Stream::Stdout,
            messages: self.messages.clone(),
        }
    }

    /// Like [`Readline::stdout`], for the error stream.
    pub fn stderr(&self) -> BackgroundWriter {
        BackgroundWriter {
            stream: Stream::Stderr,
            messages: self.messages.clone(),
        }
    }

    /// Stop both threads, end any pending read with EOF and restore the
    /// terminal. Calling it again does nothing.
    pub fn close(&self) -> ReadlineResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        log::debug!("closing readline instance");

        // the reader must be gone before terminal mode is restored
        if let Some(mut terminal) = lock(&self.terminal).take() {
            terminal.stop();
        }
        let _ = self.messages.send(Message::Shutdown);
        if let Some(handle) = lock(&self.dispatcher).take() {
            if handle.join().is_err() {
                log::warn!("dispatcher thread panicked");
            }
        }
        if let Some(guard) = lock(&self.raw_mode).take() {
            guard.restore()?;
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn notify(&self, message: Message) {
        if self.is_closed() || self.messages.send(message).is_err() {
            log::debug!("request dropped: instance closed");
        }
    }

    fn request<T>(&self, message: impl FnOnce(Sender<T>) -> Message) -> ReadlineResult<T> {
        if self.is_closed() {
            return Err(ReadlineError::Closed);
        }
        let (reply, response) = mpsc::channel();
        self.messages
            .send(message(reply))
            .map_err(|_| ReadlineError::Closed)?;
        response.recv().map_err(|_| ReadlineError::Closed)
    }
}

impl Drop for Readline {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            log::warn!("failed to close readline instance: {err}");
        }
    }
}

impl std::fmt::Debug for Readline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Readline")
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// `io::Write` handle that routes output through the dispatcher.
///
/// While a read is in flight the edited line is erased, the text written,
/// and the line drawn again below it.
#[derive(Clone)]
pub struct BackgroundWriter {
    stream: Stream,
    messages: SyncSender<Message>,
}

impl io::Write for BackgroundWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let text = String::from_utf8_lossy(buf).into_owned();
        let (reply, response) = mpsc::channel();
        let closed = || io::Error::new(io::ErrorKind::BrokenPipe, "readline instance closed");
        self.messages
            .send(Message::Write {
                stream: self.stream,
                text,
                reply,
            })
            .map_err(|_| closed())?;
        match response.recv() {
            Ok(Ok(())) => Ok(buf.len()),
            Ok(Err(err)) => Err(io::Error::new(io::ErrorKind::Other, err)),
            Err(_) => Err(closed()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl std::fmt::Debug for BackgroundWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundWriter")
            .field("stream", &self.stream)
            .finish()
    }
}

struct Dispatcher {
    op: Operation,
    inbox: Receiver<Message>,
    kicker: Kicker,
    /// Reply channel of the read in flight
    session: Option<Sender<Outcome>>,
    input_closed: bool,
    /// Messages that arrived while a key was reading ahead
    deferred: VecDeque<Message>,
}

impl Dispatcher {
    fn run(mut self) {
        log::debug!("dispatcher started");
        loop {
            let message = match self.deferred.pop_front() {
                Some(message) => message,
                None => match self.inbox.recv() {
                    Ok(message) => message,
                    Err(_) => break,
                },
            };
            if !self.handle(message) {
                break;
            }
        }
        self.op.shutdown();
        self.complete(Outcome::Eof);
        log::debug!("dispatcher stopped");
    }

    fn handle(&mut self, message: Message) -> bool {
        match message {
            Message::Input(Event::Key(key)) => self.on_key(key),
            Message::Input(Event::Resize(cols, rows)) => {
                self.op.on_resize(cols as usize, rows as usize);
            }
            Message::Input(Event::Eof) => {
                self.input_closed = true;
                if self.session.is_some() {
                    let outcome = self.op.on_input_closed();
                    self.complete(outcome);
                }
            }
            Message::Read { password, reply } => {
                if self.input_closed {
                    let _ = reply.send(Outcome::Eof);
                    return true;
                }
                if self.session.is_some() {
                    log::warn!("rejecting concurrent read");
                    let _ = reply.send(Outcome::Eof);
                    return true;
                }
                match password {
                    Some(prompt) => self.op.begin_password(&prompt),
                    None => self.op.begin(),
                }
                self.session = Some(reply);
                self.kicker.kick();
            }
            Message::Write {
                stream,
                text,
                reply,
            } => {
                let _ = reply.send(self.op.write_external(stream, &text));
            }
            Message::SetPrompt(prompt) => self.op.set_prompt(&prompt),
            Message::SetVimMode(on) => self.op.set_vim_mode(on),
            Message::IsVimMode(reply) => {
                let _ = reply.send(self.op.is_vim_mode());
            }
            Message::SetCompleter(completer) => self.op.set_completer(completer),
            Message::SetHistoryPath { path, reply } => {
                let _ = reply.send(self.op.set_history_path(path.as_deref()));
            }
            Message::SaveHistory { line, reply } => {
                let _ = reply.send(self.op.save_history(&line));
            }
            Message::Shutdown => return false,
        }
        true
    }

    fn on_key(&mut self, key: Key) {
        if self.session.is_none() {
            log::trace!("dropping {key:?} outside a read");
            return;
        }

        let inbox = &self.inbox;
        let deferred = &mut self.deferred;
        let kicker = &self.kicker;
        let mut read_next = || loop {
            match inbox.recv() {
                Ok(Message::Input(Event::Key(next))) => {
                    if next.parks_reader() {
                        kicker.kick();
                    }
                    return Some(next);
                }
                Ok(message @ (Message::Input(Event::Eof) | Message::Shutdown)) => {
                    deferred.push_back(message);
                    return None;
                }
                Ok(message) => deferred.push_back(message),
                Err(_) => return None,
            }
        };

        match self.op.handle_key(key, &mut read_next) {
            Some(outcome) => self.complete(outcome),
            None if key.parks_reader() => self.kicker.kick(),
            None => {}
        }
    }

    fn complete(&mut self, outcome: Outcome) {
        if let Some(reply) = self.session.take() {
            if reply.send(outcome).is_err() {
                log::debug!("reader of the outcome went away");
            }
        }
    }
}
