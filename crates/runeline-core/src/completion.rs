//! Tab completion: provider trait, prefix-tree completer and the candidate
//! list UI (list, select and pager modes).
//!
//! A provider receives the whole line and the cursor offset and answers with
//! the suffixes that would complete the word under the cursor, plus how many
//! runes of that word are already typed.

use crate::buffer::LineBuffer;
use crate::console::{ansi, TextStyle};
use crate::error::CompletionResult;
use crate::key::Key;
use crate::unicode;

/// Completion candidates returned by an [`AutoCompleter`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidates {
    /// Text to insert at the cursor for each candidate
    pub suffixes: Vec<Vec<char>>,
    /// Runes before the cursor that candidates share with the line
    pub offset: usize,
}

impl Candidates {
    pub fn new(suffixes: Vec<Vec<char>>, offset: usize) -> Self {
        Candidates { suffixes, offset }
    }

    /// Build candidates from string suffixes.
    pub fn from_strs<S: AsRef<str>>(suffixes: &[S], offset: usize) -> Self {
        Candidates {
            suffixes: suffixes.iter().map(|s| s.as_ref().chars().collect()).collect(),
            offset,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.suffixes.is_empty() || (self.suffixes.len() == 1 && self.suffixes[0].is_empty())
    }
}

/// Source of completion candidates, called on the dispatcher thread.
///
/// # Examples
///
/// ```
/// use runeline_core::completion::{AutoCompleter, Candidates};
/// use runeline_core::error::CompletionResult;
///
/// let commands = ["go", "git", "grep"];
/// let completer = move |line: &[char], pos: usize| -> CompletionResult<Candidates> {
///     let typed: String = line[..pos].iter().collect();
///     let suffixes: Vec<&str> = commands
///         .iter()
///         .filter_map(|c| c.strip_prefix(typed.as_str()))
///         .collect();
///     Ok(Candidates::from_strs(&suffixes, pos))
/// };
///
/// let line: Vec<char> = "gi".chars().collect();
/// let candidates = completer.complete(&line, 2).unwrap();
/// assert_eq!(candidates, Candidates::from_strs(&["t"], 2));
/// ```
pub trait AutoCompleter: Send {
    /// Complete `line` with the cursor at rune offset `pos`.
    fn complete(&self, line: &[char], pos: usize) -> CompletionResult<Candidates>;
}

impl<F> AutoCompleter for F
where
    F: Fn(&[char], usize) -> CompletionResult<Candidates> + Send,
{
    fn complete(&self, line: &[char], pos: usize) -> CompletionResult<Candidates> {
        self(line, pos)
    }
}

/// Tree of words completing a command line one word at a time.
///
/// # Examples
///
/// ```
/// use runeline_core::completion::{AutoCompleter, PrefixCompleter};
///
/// let completer = PrefixCompleter::new(vec![
///     PrefixCompleter::item("mode", vec![
///         PrefixCompleter::leaf("vi"),
///         PrefixCompleter::leaf("emacs"),
///     ]),
///     PrefixCompleter::leaf("help"),
/// ]);
///
/// let line: Vec<char> = "mode e".chars().collect();
/// let candidates = completer.complete(&line, line.len()).unwrap();
/// assert_eq!(candidates.suffixes, vec!["macs ".chars().collect::<Vec<_>>()]);
/// assert_eq!(candidates.offset, 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PrefixCompleter {
    name: Vec<char>,
    children: Vec<PrefixCompleter>,
}

impl PrefixCompleter {
    /// Root node holding the first-word alternatives.
    pub fn new(children: Vec<PrefixCompleter>) -> Self {
        PrefixCompleter {
            name: Vec::new(),
            children,
        }
    }

    /// A word followed by the words that may come after it.
    pub fn item(name: &str, children: Vec<PrefixCompleter>) -> Self {
        let mut name: Vec<char> = name.chars().collect();
        name.push(' ');
        PrefixCompleter { name, children }
    }

    pub fn leaf(name: &str) -> Self {
        PrefixCompleter::item(name, Vec::new())
    }

    pub fn name(&self) -> String {
        self.name.iter().collect::<String>().trim_end().to_string()
    }

    pub fn children(&self) -> &[PrefixCompleter] {
        &self.children
    }

    fn candidates(&self, line: &[char]) -> (Vec<Vec<char>>, usize) {
        let mut suffixes = Vec::new();
        let mut offset = 0;
        let mut next: Option<&PrefixCompleter> = None;
        let mut descend = false;

        for child in &self.children {
            if line.len() >= child.name.len() {
                if unicode::has_prefix(line, &child.name) {
                    if line.len() == child.name.len() {
                        suffixes.push(vec![' ']);
                    } else {
                        suffixes.push(child.name.clone());
                    }
                    offset = child.name.len();
                    next = Some(child);
                    descend = true;
                }
            } else if unicode::has_prefix(&child.name, line) {
                suffixes.push(child.name[line.len()..].to_vec());
                offset = line.len();
                next = Some(child);
            }
        }

        let Some(next) = next else {
            return (suffixes, offset);
        };
        if suffixes.len() != 1 {
            return (suffixes, offset);
        }

        // skip separating spaces and complete the remainder against the child
        if let Some(rest) = line[offset..].iter().position(|&c| c != ' ') {
            return next.candidates(&line[offset + rest..]);
        }
        if descend {
            return next.candidates(&[]);
        }
        (suffixes, offset)
    }
}

impl AutoCompleter for PrefixCompleter {
    fn complete(&self, line: &[char], pos: usize) -> CompletionResult<Candidates> {
        let (suffixes, offset) = self.candidates(&line[..pos.min(line.len())]);
        Ok(Candidates::new(suffixes, offset))
    }
}

/// Which candidate UI is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionMode {
    /// Candidates listed below the line
    List,
    /// A highlighted candidate can be moved with navigation keys
    Select { choice: usize },
    /// Candidates shown a page at a time behind `--More--`
    Pager { next: usize },
}

#[derive(Debug, Clone)]
struct CompletionState {
    candidates: Vec<Vec<char>>,
    /// Buffer contents when the candidates were computed
    source: Vec<char>,
    offset: usize,
    /// Buffer index where the completed word starts
    match_start: usize,
    col_num: usize,
    col_width: usize,
    mode: CompletionMode,
}

/// Candidate list session rendered below the edited line.
#[derive(Debug)]
pub struct CompletionEngine {
    state: Option<CompletionState>,
    width: usize,
    height: usize,
}

impl CompletionEngine {
    pub fn new(width: usize, height: usize) -> Self {
        CompletionEngine {
            state: None,
            width,
            height,
        }
    }

    pub fn on_size_change(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
    }

    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    pub fn is_select_mode(&self) -> bool {
        matches!(self.mode(), Some(CompletionMode::Select { .. }))
    }

    pub fn is_pager_mode(&self) -> bool {
        matches!(self.mode(), Some(CompletionMode::Pager { .. }))
    }

    pub fn mode(&self) -> Option<CompletionMode> {
        self.state.as_ref().map(|s| s.mode)
    }

    pub fn candidates(&self) -> &[Vec<char>] {
        self.state.as_ref().map_or(&[], |s| s.candidates.as_slice())
    }

    /// Column count and width of the current layout.
    pub fn layout(&self) -> Option<(usize, usize)> {
        self.state.as_ref().map(|s| (s.col_num, s.col_width))
    }

    /// Handle the completion key. Returns `false` when the bell should ring:
    /// nothing to complete, a provider failure, or only a partial insert.
    pub fn on_complete(&mut self, completer: &dyn AutoCompleter, buf: &mut LineBuffer) -> bool {
        if self.width == 0 || self.height < 3 {
            return false;
        }
        if self.is_select_mode() {
            self.step(1);
            self.refresh(buf);
            return true;
        }

        // second trigger with the buffer untouched enters select mode
        if let Some(state) = self.state.as_mut() {
            if state.source == buf.runes() {
                if state.candidates.len() > 1 {
                    let same = unicode::aggregate(&state.candidates);
                    if !same.is_empty() {
                        buf.write_runes(&same);
                        self.exit();
                        return false;
                    }
                }
                if state.candidates.len() == 1 {
                    let only = state.candidates[0].clone();
                    buf.write_runes(&only);
                    self.exit();
                    return true;
                }
                state.mode = CompletionMode::Select { choice: 0 };
                self.refresh(buf);
                return true;
            }
        }

        let result = match completer.complete(buf.runes(), buf.idx()) {
            Ok(result) => result,
            Err(err) => {
                log::warn!("completion provider failed: {err}");
                self.exit();
                return false;
            }
        };
        log::debug!(
            "completion provider returned {} candidates at offset {}",
            result.suffixes.len(),
            result.offset
        );
        if result.is_empty() {
            self.exit();
            return false;
        }

        let match_start = buf.idx().saturating_sub(result.offset);
        if let Some(state) = self.state.as_ref() {
            if state.match_start != match_start {
                // the word being completed changed under us
                self.exit();
                return true;
            }
        }

        if self.state.is_none() {
            if result.suffixes.len() == 1 {
                buf.write_runes(&result.suffixes[0]);
                return true;
            }
            let same = unicode::aggregate(&result.suffixes);
            if !same.is_empty() {
                buf.write_runes(&same);
                return false;
            }
        }

        self.enter(result, match_start, buf);
        true
    }

    fn enter(&mut self, result: Candidates, match_start: usize, buf: &mut LineBuffer) {
        let (col_num, col_width) = self.column_layout(&result.suffixes, result.offset, buf);
        let mut state = CompletionState {
            candidates: result.suffixes,
            source: buf.runes().to_vec(),
            offset: result.offset,
            match_start,
            col_num,
            col_width,
            mode: CompletionMode::List,
        };
        if self.need_pager(&state, buf) {
            state.mode = CompletionMode::Pager { next: 0 };
            self.state = Some(state);
            self.pager_refresh(buf);
        } else {
            self.state = Some(state);
            self.refresh(buf);
        }
    }

    /// Column count and width for `candidates`, spreading leftover space
    /// evenly across columns. One column is kept free to avoid line-edge
    /// wrapping.
    pub fn column_layout(
        &self,
        candidates: &[Vec<char>],
        offset: usize,
        buf: &LineBuffer,
    ) -> (usize, usize) {
        let same_width = unicode::runes_width(buf.before_cursor(offset));
        let mut col_width = candidates
            .iter()
            .map(|c| same_width + unicode::runes_width(c))
            .max()
            .unwrap_or(0)
            + 1;

        let width = self.width.saturating_sub(1);
        let col_num = width / col_width;
        if col_num != 0 {
            col_width += (width - col_width * col_num) / col_num;
        }
        (col_num, col_width)
    }

    fn need_pager(&self, state: &CompletionState, buf: &LineBuffer) -> bool {
        let lines_avail = self.height.saturating_sub(buf.line_count());
        if state.col_num > 0 {
            return state.candidates.len() > lines_avail * state.col_num;
        }

        let same_width = unicode::runes_width(buf.before_cursor(state.offset));
        let mut lines = 1;
        for c in &state.candidates {
            lines += self.rows_for(same_width + unicode::runes_width(c));
            if lines > lines_avail {
                return true;
            }
        }
        false
    }

    fn rows_for(&self, width: usize) -> usize {
        if self.width == 0 {
            return 1;
        }
        width.div_ceil(self.width).max(1)
    }

    /// Handle a key while a candidate is highlighted. Returns `true` when the
    /// key was consumed and select mode continues.
    pub fn handle_select(&mut self, key: Key, buf: &mut LineBuffer) -> bool {
        let Some(state) = self.state.as_mut() else {
            return false;
        };
        let CompletionMode::Select { choice } = state.mode else {
            return false;
        };
        let len = state.candidates.len();
        let col_num = state.col_num.max(1);
        let matrix = len.div_ceil(col_num) * col_num;

        let next = match key {
            Key::Enter => {
                let chosen = state.candidates[choice].clone();
                buf.write_runes(&chosen);
                self.exit();
                return false;
            }
            Key::LineStart => choice - choice % col_num,
            Key::LineEnd => (choice + col_num - choice % col_num - 1).min(len - 1),
            Key::Tab | Key::Forward => (choice + 1) % len,
            Key::Backward => (choice + len - 1) % len,
            Key::Next => {
                let mut next = choice + col_num;
                if next >= matrix {
                    next -= matrix;
                } else if next >= len {
                    next = next + col_num - matrix;
                }
                next
            }
            Key::Prev => {
                if choice >= col_num {
                    choice - col_num
                } else {
                    let mut next = choice + matrix - col_num;
                    if next >= len {
                        next -= col_num;
                    }
                    next
                }
            }
            Key::Backspace => {
                state.mode = CompletionMode::List;
                return false;
            }
            Key::Bell | Key::Interrupt => {
                self.exit();
                return false;
            }
            _ => {
                state.mode = CompletionMode::List;
                return false;
            }
        };
        state.mode = CompletionMode::Select { choice: next };
        self.refresh(buf);
        true
    }

    /// Handle a key at the `--More--` prompt. Returns `true` while paging
    /// continues.
    pub fn handle_pager(&mut self, key: Key, buf: &mut LineBuffer) -> bool {
        match key {
            Key::Char(' ' | 'y' | 'Y') => self.pager_refresh(buf),
            Key::Char('q' | 'Q' | 'n' | 'N') | Key::Interrupt | Key::Bell | Key::Delete => {
                self.scroll_out_of_pager(buf);
                self.exit();
                false
            }
            _ => {
                buf.bell();
                true
            }
        }
    }

    fn step(&mut self, delta: usize) {
        if let Some(state) = self.state.as_mut() {
            if let CompletionMode::Select { choice } = state.mode {
                let len = state.candidates.len();
                state.mode = CompletionMode::Select {
                    choice: (choice + delta) % len,
                };
            }
        }
    }

    /// Draw the candidate list below the buffer and return the cursor to
    /// its position in the line.
    pub fn refresh(&self, buf: &mut LineBuffer) {
        let Some(state) = self.state.as_ref() else {
            return;
        };
        if !buf.is_interactive() || matches!(state.mode, CompletionMode::Pager { .. }) {
            return;
        }
        let choice = match state.mode {
            CompletionMode::Select { choice } => Some(choice),
            _ => None,
        };

        let mut out = "\n".repeat(buf.cursor_line_count());
        out.push_str(ansi::ERASE_DOWN);

        let same: String = buf.before_cursor(state.offset).iter().collect();
        let same_width = unicode::runes_width(buf.before_cursor(state.offset));
        let mut col_idx = 0;
        let mut lines = 0;
        for (idx, c) in state.candidates.iter().enumerate() {
            let selected = choice == Some(idx);
            let c_width = same_width + unicode::runes_width(c);
            if lines > 0 && col_idx == 0 {
                out.push('\n');
            }
            if selected {
                out.push_str(&TextStyle::selection().to_ansi());
            }
            out.push_str(&same);
            out.extend(c.iter());
            if state.col_num >= 1 {
                out.push_str(&" ".repeat(state.col_width.saturating_sub(c_width)));
            }
            if selected {
                out.push_str(ansi::RESET);
            }
            col_idx += 1;
            if col_idx >= state.col_num {
                lines += self.rows_for(c_width);
                col_idx = 0;
            }
        }
        if col_idx > 0 {
            lines += 1;
        }

        out.push_str(&ansi::cursor_up(lines));
        out.push_str(&buf.cursor_sequence());
        buf.write_raw(&out);
    }

    /// Write the next page of candidates. Returns `false` once the last page
    /// has been shown and completion has ended.
    pub fn pager_refresh(&mut self, buf: &mut LineBuffer) -> bool {
        let Some(state) = self.state.as_ref() else {
            return false;
        };
        let CompletionMode::Pager { next } = state.mode else {
            return false;
        };
        let first_page = next == 0;

        let mut out = String::new();
        if first_page {
            out.push_str(&"\n".repeat(buf.cursor_line_count()));
        } else {
            // draw over --More--
            out.push('\r');
        }
        out.push_str(ansi::ERASE_DOWN);

        let same: String = buf.before_cursor(state.offset).iter().collect();
        let same_width = unicode::runes_width(buf.before_cursor(state.offset));
        let mut col_idx = 0;
        let mut lines = 1;
        let mut cursor = next;
        while cursor < state.candidates.len() {
            let c = &state.candidates[cursor];
            let c_width = same_width + unicode::runes_width(c);
            let c_lines = self.rows_for(c_width);
            if lines > 1 && lines + c_lines > self.height {
                break;
            }
            out.push_str(&same);
            out.extend(c.iter());
            if state.col_num > 1 {
                out.push_str(&" ".repeat(state.col_width.saturating_sub(c_width)));
            }
            col_idx += 1;
            if col_idx >= state.col_num {
                out.push('\n');
                lines += c_lines;
                col_idx = 0;
            }
            cursor += 1;
        }
        if col_idx != 0 {
            out.push('\n');
        }

        let more = first_page || cursor < state.candidates.len();
        if more {
            out.push_str("--More--");
        }
        buf.write_raw(&out);

        if more {
            if let Some(state) = self.state.as_mut() {
                state.mode = CompletionMode::Pager { next: cursor };
            }
            return true;
        }
        self.scroll_out_of_pager(buf);
        self.exit();
        false
    }

    /// Leave room below the listing so repainting the prompt does not
    /// overwrite it.
    fn scroll_out_of_pager(&self, buf: &mut LineBuffer) {
        let lines = buf.idx_line();
        if lines > 0 {
            buf.write_raw(&"\n".repeat(lines));
        }
    }

    /// End the completion session.
    pub fn exit(&mut self) {
        if self.state.take().is_some() {
            log::trace!("exit completion");
        }
    }
}
