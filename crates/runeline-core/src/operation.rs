//! Key dispatcher: the state machine between decoded keys and the engines.
//!
//! An [`Operation`] owns the line buffer, history, search and completion
//! state for one terminal. It is driven one key at a time and reports when a
//! read session ends. Routing order per key: completion select/pager mode
//! first, then vi normal mode, then ordinary editing. After each key, search
//! and completion sessions that the key did not explicitly continue are
//! closed and the line repainted.

use crate::buffer::{Echo, LineBuffer};
use crate::completion::{AutoCompleter, CompletionEngine};
use crate::config::Config;
use crate::console::ConsoleOutput;
use crate::error::{ConsoleResult, HistoryResult};
use crate::history::HistoryStore;
use crate::key::Key;
use crate::search::{SearchDirection, SearchEngine};
use crate::unicode;
use crate::vim::{VimAction, VimEngine};
use std::path::Path;

/// How a read session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The submitted line, without its newline
    Line(String),
    /// Ctrl-C with nothing to cancel
    Interrupted,
    /// Ctrl-D on an empty line, or the input stream closed
    Eof,
}

/// Target of a background write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// Settings replaced for the duration of a password read.
#[derive(Debug)]
struct SavedSession {
    prompt: String,
    vim: bool,
}

/// Per-key bookkeeping deciding what survives the key.
#[derive(Debug, Default)]
struct Flow {
    keep_search: bool,
    keep_complete: bool,
    skip_history: bool,
}

/// Dispatcher owning all line-editing state of one terminal.
pub struct Operation {
    buf: LineBuffer,
    history: HistoryStore,
    search: SearchEngine,
    completion: CompletionEngine,
    completer: Option<Box<dyn AutoCompleter>>,
    vim: VimEngine,
    err_out: Box<dyn ConsoleOutput>,
    prompt: String,
    mask_rune: Option<char>,
    disable_auto_save: bool,
    reading: bool,
    password: Option<SavedSession>,
}

impl Operation {
    /// Build a dispatcher rendering to `out`. Background writes for
    /// [`Stream::Stderr`] go to `err_out`.
    ///
    /// A history file that cannot be opened leaves history memory-only.
    pub fn new(config: Config, out: Box<dyn ConsoleOutput>, err_out: Box<dyn ConsoleOutput>) -> Self {
        let mut history = HistoryStore::new(config.effective_history_limit());
        if let Some(path) = config.history_file.as_deref() {
            if let Err(err) = history.set_path(Some(path)) {
                log::warn!("history kept in memory only: {err}");
            }
        }

        let buf = LineBuffer::new(out, &config.prompt).with_interactive(config.interactive);
        let completion = CompletionEngine::new(buf.width(), buf.height());
        Operation {
            buf,
            history,
            search: SearchEngine::new(config.history_search_fold),
            completion,
            completer: config.auto_complete,
            vim: VimEngine::new(config.vim_mode),
            err_out,
            prompt: config.prompt,
            mask_rune: config.mask_rune,
            disable_auto_save: config.disable_auto_save_history,
            reading: false,
            password: None,
        }
    }

    pub fn buffer(&self) -> &LineBuffer {
        &self.buf
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut HistoryStore {
        &mut self.history
    }

    pub fn is_reading(&self) -> bool {
        self.reading
    }

    pub fn is_search_mode(&self) -> bool {
        self.search.is_active()
    }

    pub fn is_complete_mode(&self) -> bool {
        self.completion.is_active()
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Start a read session and draw the prompt.
    pub fn begin(&mut self) {
        log::debug!("begin read session");
        self.reading = true;
        self.buf.refresh();
    }

    /// Start a read session that neither echoes nor records the line.
    pub fn begin_password(&mut self, prompt: &str) {
        self.password = Some(SavedSession {
            prompt: std::mem::replace(&mut self.prompt, prompt.to_string()),
            vim: self.vim.is_enabled(),
        });
        self.buf.set_prompt(prompt);
        self.buf.set_echo(match self.mask_rune {
            Some(mask) => Echo::Masked(mask),
            None => Echo::Hidden,
        });
        self.vim.set_enabled(false);
        self.begin();
    }

    pub fn is_password_mode(&self) -> bool {
        self.password.is_some()
    }

    pub fn set_prompt(&mut self, prompt: &str) {
        self.prompt = prompt.to_string();
        if self.reading {
            self.buf.refresh_with(|b| b.set_prompt(prompt));
        } else {
            self.buf.set_prompt(prompt);
        }
    }

    pub fn set_vim_mode(&mut self, on: bool) {
        self.vim.set_enabled(on);
    }

    pub fn is_vim_mode(&self) -> bool {
        self.vim.is_enabled()
    }

    /// Replace the completer, closing any completion session on screen.
    pub fn set_completer(&mut self, completer: Option<Box<dyn AutoCompleter>>) {
        if self.completion.is_active() {
            self.completion.exit();
            if self.reading {
                self.buf.refresh();
            }
        }
        self.completer = completer;
    }

    /// Switch history to another backing file, or to memory-only.
    pub fn set_history_path(&mut self, path: Option<&Path>) -> HistoryResult<()> {
        self.history.set_path(path)
    }

    /// Record a line in history outside a read session.
    pub fn save_history(&mut self, line: &str) -> HistoryResult<()> {
        self.history.add(line)
    }

    /// Apply new terminal geometry, repainting when a read is in flight.
    pub fn on_resize(&mut self, width: usize, height: usize) {
        log::debug!("terminal resized to {width}x{height}");
        if self.reading {
            self.buf.clean();
        }
        self.buf.on_size_change(width, height);
        self.completion.on_size_change(width, height);
        if self.reading {
            self.buf.print();
            self.refresh_overlays();
        }
    }

    /// Write text that does not belong to the line. While a read is in
    /// flight the line is erased first and drawn again below the text.
    pub fn write_external(&mut self, stream: Stream, text: &str) -> ConsoleResult<()> {
        if self.reading {
            self.buf.clean();
        }
        let result = match stream {
            Stream::Stdout => {
                self.buf.write_raw(text);
                Ok(())
            }
            Stream::Stderr => self
                .err_out
                .write_text(text)
                .and_then(|_| self.err_out.flush()),
        };
        if self.reading {
            self.buf.print();
            self.refresh_overlays();
        }
        result
    }

    /// The input stream ended while reading.
    pub fn on_input_closed(&mut self) -> Outcome {
        self.search.exit(true, &mut self.history, &mut self.buf);
        self.completion.exit();
        self.buf.reset();
        self.history.revert();
        self.finish(Outcome::Eof)
    }

    /// Release the history file.
    pub fn shutdown(&mut self) {
        self.reading = false;
        self.history.close();
    }

    /// Handle one key. Returns the outcome once the read session ends.
    ///
    /// `read_next` blocks for the following key; vi `f/F/t/T` use it to read
    /// their target.
    pub fn handle_key(
        &mut self,
        key: Key,
        read_next: &mut dyn FnMut() -> Option<Key>,
    ) -> Option<Outcome> {
        log::trace!("dispatch {key:?}");

        if self.completion.is_select_mode() {
            if self.completion.handle_select(key, &mut self.buf) {
                return None;
            }
            self.buf.refresh();
            match key {
                Key::Enter => {
                    self.update_shadow();
                    return None;
                }
                Key::Interrupt | Key::Bell => return None,
                _ => {}
            }
        }

        if self.completion.is_pager_mode() {
            if !self.completion.handle_pager(key, &mut self.buf) {
                self.buf.refresh();
            }
            return None;
        }

        let mut flow = Flow::default();
        let key = if self.search.is_active() {
            Some(key)
        } else {
            match self.vim.handle(key, &mut self.buf, &mut *read_next) {
                VimAction::Pass(key) => Some(key),
                VimAction::Consumed => None,
            }
        };

        if let Some(key) = key {
            if let Some(outcome) = self.dispatch(key, &mut flow) {
                return Some(outcome);
            }
        }

        if !flow.keep_search && self.search.is_active() {
            self.search.exit(false, &mut self.history, &mut self.buf);
            self.buf.refresh();
        } else if self.completion.is_active() && !self.completion.is_pager_mode() {
            if flow.keep_complete {
                self.buf.refresh();
                self.completion.refresh(&mut self.buf);
            } else {
                self.completion.exit();
                self.buf.refresh();
            }
        }

        if !flow.skip_history {
            self.update_shadow();
        }
        None
    }

    fn dispatch(&mut self, key: Key, flow: &mut Flow) -> Option<Outcome> {
        let moved = match key {
            Key::Bell => {
                if self.search.is_active() {
                    self.search.exit(true, &mut self.history, &mut self.buf);
                    self.buf.refresh();
                }
                if self.completion.is_active() {
                    self.completion.exit();
                    self.buf.refresh();
                }
                true
            }
            Key::Tab => {
                match self.completer.as_deref() {
                    Some(completer) if self.password.is_none() => {
                        if !self.completion.on_complete(completer, &mut self.buf) {
                            self.buf.bell();
                        }
                        flow.keep_complete = true;
                    }
                    _ => self.buf.write_char('\t'),
                }
                true
            }
            Key::BackwardSearch | Key::ForwardSearch => {
                let dir = if key == Key::BackwardSearch {
                    SearchDirection::Backward
                } else {
                    SearchDirection::Forward
                };
                if self.password.is_some() {
                    self.buf.bell();
                } else {
                    self.completion.exit();
                    if !self.search.enter(dir, &mut self.history, &mut self.buf) {
                        self.buf.bell();
                    }
                    flow.keep_search = true;
                }
                true
            }
            Key::Kill => self.buf.kill(),
            Key::KillFront => self.buf.kill_front(),
            Key::Yank => self.buf.yank(),
            Key::BackwardKillWord | Key::MetaBackspace => self.buf.back_escape_word(),
            Key::MetaDelete => self.buf.delete_word(),
            Key::MetaForward => self.buf.move_to_next_word(),
            Key::MetaBackward => self.buf.move_to_prev_word(),
            Key::Transpose => self.buf.transpose(),
            Key::MetaTranspose => self.buf.transpose_words(),
            Key::LineStart => self.buf.move_to_line_start(),
            Key::LineEnd => self.buf.move_to_line_end(),
            Key::Backward => self.buf.move_backward(),
            Key::Forward => self.buf.move_forward(),
            Key::ClearScreen => {
                self.buf.clear_screen();
                true
            }
            Key::Delete => {
                if self.buf.is_empty() && !self.search.is_active() {
                    return Some(self.end_of_input());
                }
                self.buf.delete()
            }
            Key::DeleteForward => self.buf.delete(),
            Key::Backspace => {
                if self.search.is_active() {
                    self.search.backspace(&mut self.history, &mut self.buf);
                    flow.keep_search = true;
                    return None;
                }
                let deleted = self.buf.backspace();
                if deleted {
                    self.requery_completion(flow);
                }
                deleted
            }
            Key::Enter => {
                if self.search.is_active() {
                    // accept the match as an in-progress edit
                    self.search.exit(false, &mut self.history, &mut self.buf);
                    self.buf.refresh();
                    return None;
                }
                return Some(self.submit());
            }
            Key::Prev | Key::Next => {
                flow.skip_history = true;
                if self.password.is_some() {
                    self.buf.bell();
                    return None;
                }
                let text = if key == Key::Prev {
                    self.history.prev()
                } else {
                    self.history.next()
                };
                if let Some(text) = text {
                    self.buf.set(&text);
                }
                true
            }
            Key::Interrupt => {
                if self.search.is_active() {
                    self.search.exit(true, &mut self.history, &mut self.buf);
                    self.buf.refresh();
                    flow.skip_history = true;
                    return None;
                }
                if self.completion.is_active() {
                    self.completion.exit();
                    self.buf.refresh();
                    return None;
                }
                return Some(self.interrupt());
            }
            Key::Escape => true,
            Key::Char(c) => {
                if self.search.is_active() {
                    self.search.search_char(c, &mut self.history, &mut self.buf);
                    flow.keep_search = true;
                    return None;
                }
                if !unicode::is_printable(c) {
                    log::trace!("ignoring non-printable {c:?}");
                    return None;
                }
                self.buf.write_char(c);
                self.requery_completion(flow);
                true
            }
        };

        if !moved {
            self.buf.bell();
        }
        None
    }

    fn requery_completion(&mut self, flow: &mut Flow) {
        if !self.completion.is_active() {
            return;
        }
        if let Some(completer) = self.completer.as_deref() {
            if !self.completion.on_complete(completer, &mut self.buf) {
                self.buf.bell();
            }
            flow.keep_complete = true;
        }
    }

    fn submit(&mut self) -> Outcome {
        if self.completion.is_active() {
            self.completion.exit();
            self.buf.refresh();
        }
        let line = self.buf.reset_and_return();
        if self.password.is_some() || self.disable_auto_save {
            self.history.revert();
        } else if let Err(err) = self.history.new_line(&line) {
            log::warn!("failed to save history: {err}");
        }
        self.finish(Outcome::Line(line.into_iter().collect()))
    }

    fn interrupt(&mut self) -> Outcome {
        self.buf.move_to_line_end();
        self.buf.refresh();
        if self.buf.is_interactive() {
            self.buf.write_raw("^C\n");
        }
        self.buf.reset();
        self.history.revert();
        self.finish(Outcome::Interrupted)
    }

    fn end_of_input(&mut self) -> Outcome {
        self.completion.exit();
        if self.buf.is_interactive() {
            self.buf.write_raw("\n");
        }
        self.buf.reset();
        self.history.revert();
        self.finish(Outcome::Eof)
    }

    fn finish(&mut self, outcome: Outcome) -> Outcome {
        log::debug!("end read session: {outcome:?}");
        self.reading = false;
        if let Some(saved) = self.password.take() {
            self.prompt = saved.prompt;
            self.buf.set_prompt(&self.prompt);
            self.buf.set_echo(Echo::Plain);
            self.vim.set_enabled(saved.vim);
        }
        outcome
    }

    fn update_shadow(&mut self) {
        if self.search.is_active() || self.password.is_some() {
            return;
        }
        self.history.update_shadow(self.buf.runes());
    }

    fn refresh_overlays(&mut self) {
        if self.search.is_active() {
            self.search.refresh(&mut self.buf);
        }
        if self.completion.is_active() {
            self.completion.refresh(&mut self.buf);
        }
    }
}

impl std::fmt::Debug for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operation")
            .field("buf", &self.buf)
            .field("history", &self.history)
            .field("search", &self.search)
            .field("completion", &self.completion)
            .field("vim", &self.vim)
            .field("reading", &self.reading)
            .field("password", &self.password.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::Candidates;
    use crate::console::MemoryOutput;
    use crate::error::CompletionResult;
    use crate::key_parser::KeyDecoder;

    fn setup(config: Config) -> (Operation, MemoryOutput, MemoryOutput) {
        let out = MemoryOutput::new();
        let err = MemoryOutput::new();
        let mut op = Operation::new(config, Box::new(out.clone()), Box::new(err.clone()));
        op.begin();
        (op, out, err)
    }

    fn feed(op: &mut Operation, input: &str) -> Option<Outcome> {
        let mut decoder = KeyDecoder::new();
        let keys: Vec<Key> = input.chars().filter_map(|c| decoder.feed(c)).collect();
        let mut keys = keys.into_iter();
        let mut result = None;
        while let Some(key) = keys.next() {
            let mut rest = || keys.next();
            if let Some(outcome) = op.handle_key(key, &mut rest) {
                result = Some(outcome);
            }
        }
        result
    }

    #[test]
    fn test_edit_and_submit() {
        let (mut op, _, _) = setup(Config::default());
        let outcome = feed(&mut op, "hello\x7f\x7fy\r");
        assert_eq!(outcome, Some(Outcome::Line("hely".to_string())));
        assert!(!op.is_reading());
        assert_eq!(op.history().committed().collect::<Vec<_>>(), vec!["hely"]);
    }

    #[test]
    fn test_ctrl_d() {
        let (mut op, _, _) = setup(Config::default());
        assert_eq!(feed(&mut op, "ab\x01\x04"), None);
        assert_eq!(op.buffer().text(), "b");
        op.buf.reset();
        assert_eq!(feed(&mut op, "\x04"), Some(Outcome::Eof));
    }

    #[test]
    fn test_interrupt() {
        let (mut op, out, _) = setup(Config::default());
        assert_eq!(feed(&mut op, "abc\x03"), Some(Outcome::Interrupted));
        assert!(out.contents().ends_with("^C\n"));
        assert!(op.buffer().is_empty());
        assert!(op.history().is_empty());
    }

    #[test]
    fn test_edge_moves_ring_bell() {
        let (mut op, out, _) = setup(Config::default());
        out.clear();
        feed(&mut op, "\x02");
        assert_eq!(out.take(), "\x07");
    }

    #[test]
    fn test_non_printable_ignored() {
        let (mut op, _, _) = setup(Config::default());
        feed(&mut op, "a\x1cb");
        assert_eq!(op.buffer().text(), "ab");
    }

    #[test]
    fn test_history_shadow_survives_navigation() {
        let (mut op, _, _) = setup(Config::default());
        for line in ["a", "b", "c"] {
            op.save_history(line).unwrap();
        }
        feed(&mut op, "\x10");
        assert_eq!(op.buffer().text(), "c");
        feed(&mut op, "\x10");
        assert_eq!(op.buffer().text(), "b");
        feed(&mut op, "x");
        feed(&mut op, "\x10");
        assert_eq!(op.buffer().text(), "a");
        feed(&mut op, "\x0e");
        assert_eq!(op.buffer().text(), "bx");

        assert_eq!(feed(&mut op, "\r"), Some(Outcome::Line("bx".to_string())));
        op.begin();
        feed(&mut op, "\x10\x10");
        assert_eq!(op.buffer().text(), "c");
    }

    #[test]
    fn test_incremental_search() {
        let (mut op, out, _) = setup(Config::default());
        op.save_history("hello").unwrap();
        op.save_history("help").unwrap();

        feed(&mut op, "\x12he");
        assert!(op.is_search_mode());
        assert_eq!(op.buffer().text(), "help");
        assert!(out.contents().contains("bck-i-search: he"));

        feed(&mut op, "z");
        assert!(out.contents().contains("failing bck-i-search: hez"));
        assert_eq!(op.buffer().text(), "help");

        feed(&mut op, "\x7f");
        assert!(!op.search.is_failing());

        // repeat key steps to the older entry
        feed(&mut op, "\x12");
        assert_eq!(op.buffer().text(), "hello");

        assert_eq!(feed(&mut op, "\r"), None);
        assert!(!op.is_search_mode());
        assert_eq!(feed(&mut op, "\r"), Some(Outcome::Line("hello".to_string())));
    }

    #[test]
    fn test_search_interrupt_reverts() {
        let (mut op, _, _) = setup(Config::default());
        op.save_history("hello").unwrap();
        feed(&mut op, "x\x12hel");
        assert_eq!(op.buffer().text(), "hello");
        assert_eq!(feed(&mut op, "\x03"), None);
        assert!(!op.is_search_mode());
        assert_eq!(op.buffer().text(), "x");
    }

    #[test]
    fn test_search_exits_on_other_key() {
        let (mut op, _, _) = setup(Config::default());
        op.save_history("hello").unwrap();
        feed(&mut op, "\x12ll\x01");
        assert!(!op.is_search_mode());
        assert_eq!(op.buffer().text(), "hello");
        assert_eq!(op.buffer().idx(), 0);
    }

    fn words(words: &'static [&'static str]) -> Box<dyn AutoCompleter> {
        Box::new(move |line: &[char], pos: usize| -> CompletionResult<Candidates> {
            let typed: String = line[..pos].iter().collect();
            let suffixes: Vec<&str> = words
                .iter()
                .filter_map(|w| w.strip_prefix(typed.as_str()))
                .collect();
            Ok(Candidates::from_strs(&suffixes, pos))
        })
    }

    #[test]
    fn test_tab_completes() {
        let (mut op, _, _) = setup(Config {
            auto_complete: Some(words(&["status", "stash", "commit"])),
            ..Config::default()
        });
        feed(&mut op, "c\t");
        assert_eq!(op.buffer().text(), "commit");

        op.buf.reset();
        feed(&mut op, "s\t");
        assert_eq!(op.buffer().text(), "sta");
        assert!(!op.is_complete_mode());

        feed(&mut op, "\t");
        assert!(op.is_complete_mode());
        feed(&mut op, "\t\t\r");
        assert_eq!(op.buffer().text(), "stash");
        assert!(!op.is_complete_mode());
    }

    #[test]
    fn test_typing_requeries_completion() {
        let (mut op, _, _) = setup(Config {
            auto_complete: Some(words(&["status", "stash"])),
            ..Config::default()
        });
        feed(&mut op, "sta\t");
        assert!(op.is_complete_mode());
        feed(&mut op, "s");
        // single candidate left, list still shown
        assert!(op.is_complete_mode());
        assert_eq!(op.completion.candidates(), &[vec!['h']]);
        feed(&mut op, "\x02");
        assert!(!op.is_complete_mode());
    }

    #[test]
    fn test_interrupt_cancels_pager() {
        let many: Vec<String> = (0..200).map(|i| format!("c{i:03}")).collect();
        let completer = move |_: &[char], _: usize| -> CompletionResult<Candidates> {
            Ok(Candidates::from_strs(&many, 0))
        };
        let (mut op, _, _) = setup(Config {
            auto_complete: Some(Box::new(completer)),
            ..Config::default()
        });
        op.on_resize(20, 5);
        feed(&mut op, "\t");
        assert!(op.completion.is_pager_mode());

        assert_eq!(feed(&mut op, "\x03"), None);
        assert!(!op.is_complete_mode());
        assert!(op.is_reading());
        assert_eq!(feed(&mut op, "x\r"), Some(Outcome::Line("x".to_string())));
    }

    #[test]
    fn test_set_completer_at_runtime() {
        let (mut op, _, _) = setup(Config::default());
        op.set_completer(Some(words(&["commit"])));
        feed(&mut op, "co\t");
        assert_eq!(op.buffer().text(), "commit");

        op.buf.reset();
        op.set_completer(None);
        feed(&mut op, "\t");
        assert_eq!(op.buffer().text(), "\t");
    }

    #[test]
    fn test_tab_without_completer_inserts_tab() {
        let (mut op, _, _) = setup(Config::default());
        feed(&mut op, "\t");
        assert_eq!(op.buffer().text(), "\t");
    }

    #[test]
    fn test_vim_mode() {
        let (mut op, _, _) = setup(Config {
            vim_mode: true,
            ..Config::default()
        });
        feed(&mut op, "foo bar\x1b\x1b");
        feed(&mut op, "0w");
        assert_eq!(op.buffer().idx(), 4);
        feed(&mut op, "iX");
        assert_eq!(op.buffer().text(), "foo Xbar");
        feed(&mut op, "\x1b\x1bhh");
        assert_eq!(op.buffer().idx(), 3);
        assert_eq!(feed(&mut op, "\r"), Some(Outcome::Line("foo Xbar".to_string())));
    }

    #[test]
    fn test_password_session() {
        let (mut op, out, _) = setup(Config::default());
        op.finish(Outcome::Eof);
        out.clear();

        op.begin_password("pw: ");
        assert_eq!(feed(&mut op, "secret\r"), Some(Outcome::Line("secret".to_string())));
        assert!(!out.contents().contains("secret"));
        assert!(op.history().is_empty());
        assert_eq!(op.prompt(), "> ");
        assert!(!op.is_password_mode());
        assert_eq!(op.buffer().echo(), Echo::Plain);
    }

    #[test]
    fn test_masked_password() {
        let (mut op, out, _) = setup(Config {
            mask_rune: Some('*'),
            ..Config::default()
        });
        op.finish(Outcome::Eof);
        out.clear();
        op.begin_password("pw: ");
        feed(&mut op, "abc");
        assert!(out.contents().ends_with("***"));
    }

    #[test]
    fn test_disable_auto_save() {
        let (mut op, _, _) = setup(Config {
            disable_auto_save_history: true,
            ..Config::default()
        });
        feed(&mut op, "ls\r");
        assert!(op.history().is_empty());
    }

    #[test]
    fn test_write_external_repaints() {
        let (mut op, out, err) = setup(Config::default());
        feed(&mut op, "abc");
        out.clear();
        op.write_external(Stream::Stdout, "log line\n").unwrap();
        assert_eq!(out.take(), "\x1b[1G\x1b[Jlog line\n> abc");

        op.write_external(Stream::Stderr, "oops\n").unwrap();
        assert_eq!(err.contents(), "oops\n");
        assert_eq!(out.take(), "\x1b[1G\x1b[J> abc");

        op.finish(Outcome::Eof);
        op.write_external(Stream::Stdout, "after\n").unwrap();
        assert_eq!(out.take(), "after\n");
    }

    #[test]
    fn test_set_prompt_while_reading() {
        let (mut op, out, _) = setup(Config::default());
        out.clear();
        op.set_prompt("$ ");
        assert_eq!(out.take(), "\x1b[1G\x1b[J$ ");
        assert_eq!(op.prompt(), "$ ");
    }

    #[test]
    fn test_unwritable_history_degrades() {
        let dir = tempfile::tempdir().unwrap();
        let (mut op, _, _) = setup(Config {
            history_file: Some(dir.path().join("missing").join("history")),
            ..Config::default()
        });
        assert!(op.history().path().is_none());
        assert_eq!(feed(&mut op, "ok\r"), Some(Outcome::Line("ok".to_string())));
        assert_eq!(op.history().committed().collect::<Vec<_>>(), vec!["ok"]);
    }

    #[test]
    fn test_resize_updates_geometry() {
        let (mut op, _, _) = setup(Config::default());
        op.on_resize(40, 10);
        assert_eq!(op.buffer().width(), 40);
        assert_eq!(op.buffer().height(), 10);
    }
}
