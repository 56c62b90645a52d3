//! Bash-style incremental history search (Ctrl-R / Ctrl-S).
//!
//! Entering search records an anchor: the history entry and cursor the user
//! started from. A growing needle re-searches from the current match, a
//! repeated search key moves strictly past it, and backspace always starts
//! over from the anchor so a shorter needle can find what a longer one missed.

use crate::buffer::LineBuffer;
use crate::console::{ansi, TextStyle};
use crate::history::HistoryStore;
use crate::unicode;

/// Direction of an incremental search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDirection {
    Backward,
    Forward,
}

impl SearchDirection {
    fn label(self) -> &'static str {
        match self {
            SearchDirection::Backward => "bck",
            SearchDirection::Forward => "fwd",
        }
    }
}

#[derive(Debug, Clone)]
struct SearchState {
    dir: SearchDirection,
    needle: Vec<char>,
    /// Matched entry and start offset
    matched: Option<(usize, usize)>,
    /// Entry and cursor when the search began
    anchor: (usize, usize),
    /// Start point of the latest lookup, reused while failing
    origin: From,
    failing: bool,
}

/// Where the next lookup starts.
#[derive(Debug, Clone, Copy)]
enum From {
    /// The anchor entry, bounded by the anchor cursor
    Anchor,
    /// The current match, which may match again
    Inclusive(usize, usize),
    /// Strictly past the current match
    Exclusive(usize, usize),
}

/// Incremental search session driving history navigation and the buffer.
#[derive(Debug, Default)]
pub struct SearchEngine {
    state: Option<SearchState>,
    fold: bool,
}

impl SearchEngine {
    pub fn new(fold: bool) -> Self {
        SearchEngine { state: None, fold }
    }

    pub fn set_fold(&mut self, fold: bool) {
        self.fold = fold;
    }

    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    pub fn is_failing(&self) -> bool {
        self.state.as_ref().map_or(false, |s| s.failing)
    }

    pub fn needle(&self) -> String {
        self.state
            .as_ref()
            .map(|s| s.needle.iter().collect())
            .unwrap_or_default()
    }

    pub fn direction(&self) -> Option<SearchDirection> {
        self.state.as_ref().map(|s| s.dir)
    }

    /// Enter search mode, or step to the next match when already searching.
    ///
    /// Returns `false` when the terminal width is unknown.
    pub fn enter(
        &mut self,
        dir: SearchDirection,
        history: &mut HistoryStore,
        buf: &mut LineBuffer,
    ) -> bool {
        if buf.width() == 0 {
            return false;
        }
        match self.state.as_mut() {
            Some(state) => {
                state.dir = dir;
                let from = match state.matched {
                    Some((entry, start)) => From::Exclusive(entry, start),
                    None => From::Anchor,
                };
                log::trace!("repeat {} search", dir.label());
                self.search(from, history, buf);
            }
            None => {
                log::trace!("enter {} search", dir.label());
                self.state = Some(SearchState {
                    dir,
                    needle: Vec::new(),
                    matched: None,
                    anchor: (history.current(), buf.idx()),
                    origin: From::Anchor,
                    failing: false,
                });
                self.refresh(buf);
            }
        }
        true
    }

    /// Append a rune to the needle and search again from the current match.
    /// While failing, the search resumes from where the failed lookup began,
    /// so it never jumps back past a match already shown.
    pub fn search_char(&mut self, c: char, history: &mut HistoryStore, buf: &mut LineBuffer) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        state.needle.push(c);
        let from = match state.matched {
            _ if state.failing => state.origin,
            Some((entry, start)) => From::Inclusive(entry, start),
            None => From::Anchor,
        };
        self.search(from, history, buf);
    }

    /// Drop the last needle rune and search again from the anchor.
    pub fn backspace(&mut self, history: &mut HistoryStore, buf: &mut LineBuffer) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        if state.needle.pop().is_none() {
            buf.bell();
            return;
        }
        if state.needle.is_empty() {
            let (entry, cursor) = state.anchor;
            state.matched = None;
            state.failing = false;
            history.set_current(entry);
            let text = history.show(entry).to_vec();
            buf.set_highlight(None);
            buf.set_with_idx(cursor, &text);
            self.refresh(buf);
            return;
        }
        self.search(From::Anchor, history, buf);
    }

    /// Leave search mode. With `revert`, restore the pre-search entry and
    /// buffer; otherwise keep the matched entry as an in-progress edit.
    pub fn exit(&mut self, revert: bool, history: &mut HistoryStore, buf: &mut LineBuffer) {
        let Some(state) = self.state.take() else {
            return;
        };
        log::trace!("exit search (revert: {revert})");
        buf.set_highlight(None);
        if revert {
            let (entry, cursor) = state.anchor;
            history.set_current(entry);
            let text = history.show(entry).to_vec();
            buf.set_with_idx(cursor, &text);
        }
    }

    /// Draw the `bck-i-search:` status line below the buffer and put the
    /// cursor back where it was.
    pub fn refresh(&self, buf: &mut LineBuffer) {
        let Some(state) = self.state.as_ref() else {
            return;
        };
        if !buf.is_interactive() {
            return;
        }
        let line_count = buf.cursor_line_count();
        let column = buf.cursor_column();

        let mut out = "\n".repeat(line_count);
        out.push_str(ansi::ERASE_DOWN);
        if state.failing {
            out.push_str("failing ");
        }
        out.push_str(state.dir.label());
        out.push_str("-i-search: ");
        out.extend(state.needle.iter());
        out.push_str(&TextStyle::search_match().to_ansi());
        out.push(' ');
        out.push_str(ansi::RESET);
        out.push('\r');
        out.push_str(&ansi::cursor_up(line_count));
        if column > 0 {
            out.push_str(&ansi::cursor_forward(column));
        }
        buf.write_raw(&out);
    }

    fn search(&mut self, from: From, history: &mut HistoryStore, buf: &mut LineBuffer) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        state.origin = from;
        if state.needle.is_empty() {
            state.failing = false;
            self.refresh(buf);
            return;
        }

        let found = match state.dir {
            SearchDirection::Backward => find_backward(history, &state.needle, from, state.anchor, self.fold),
            SearchDirection::Forward => find_forward(history, &state.needle, from, state.anchor, self.fold),
        };
        match found {
            Some((entry, start)) => {
                state.matched = Some((entry, start));
                state.failing = false;
                let end = start + state.needle.len();
                let cursor = match state.dir {
                    SearchDirection::Backward => start,
                    SearchDirection::Forward => end,
                };
                history.set_current(entry);
                let text = history.show(entry).to_vec();
                buf.set_highlight(Some((start, end)));
                buf.set_with_idx(cursor, &text);
            }
            None => {
                log::trace!("search failing for {:?}", state.needle);
                state.failing = true;
            }
        }
        self.refresh(buf);
    }
}

fn find_backward(
    history: &HistoryStore,
    needle: &[char],
    from: From,
    anchor: (usize, usize),
    fold: bool,
) -> Option<(usize, usize)> {
    // (entry, last allowed start); None means this entry has no candidates left
    let (first, limit) = match from {
        From::Anchor => (anchor.0, Some(anchor.1)),
        From::Inclusive(entry, start) => (entry, Some(start)),
        From::Exclusive(entry, start) => (entry, start.checked_sub(1)),
    };
    if let Some(limit) = limit {
        if let Some(start) = unicode::rindex_upto(history.show(first), needle, limit, fold) {
            return Some((first, start));
        }
    }
    (0..first).rev().find_map(|entry| {
        unicode::rindex_upto(history.show(entry), needle, usize::MAX, fold).map(|start| (entry, start))
    })
}

fn find_forward(
    history: &HistoryStore,
    needle: &[char],
    from: From,
    anchor: (usize, usize),
    fold: bool,
) -> Option<(usize, usize)> {
    let (first, from_idx) = match from {
        From::Anchor => (anchor.0, anchor.1),
        From::Inclusive(entry, start) => (entry, start),
        From::Exclusive(entry, start) => (entry, start + 1),
    };
    if let Some(start) = unicode::index_from(history.show(first), needle, from_idx, fold) {
        return Some((first, start));
    }
    (first + 1..history.len()).find_map(|entry| {
        unicode::index_from(history.show(entry), needle, 0, fold).map(|start| (entry, start))
    })
}
