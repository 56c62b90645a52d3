//! Line buffer with cursor, kill-ring and diff-based terminal repainting.
//!
//! Every mutation except an append at the end of the buffer goes through
//! clean, mutate, repaint: the cursor is moved back to the first row of the
//! prompt, everything below it is erased, and prompt plus buffer are written
//! again. Appends at the end write only the new text.

use crate::console::{ansi, ConsoleOutput, TextStyle};
use crate::unicode::{self, rune_width, split_by_line};

/// How buffer contents are echoed to the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Echo {
    /// Show the text as typed
    Plain,
    /// Show one mask rune per code point
    Masked(char),
    /// Show nothing after the prompt
    Hidden,
}

/// Editable line plus the renderer that keeps the screen in sync with it.
pub struct LineBuffer {
    buf: Vec<char>,
    /// Cursor as rune index, `0 <= idx <= buf.len()`
    idx: usize,
    prompt: Vec<char>,
    /// Single-slot kill-ring
    kill: Vec<char>,
    echo: Echo,
    width: usize,
    height: usize,
    interactive: bool,
    /// Rune range rendered with the search-match style
    highlight: Option<(usize, usize)>,
    backup: Option<(Vec<char>, usize)>,
    out: Box<dyn ConsoleOutput>,
}

impl LineBuffer {
    /// Create an empty buffer rendering to `out` on an 80x24 terminal.
    pub fn new(out: Box<dyn ConsoleOutput>, prompt: &str) -> Self {
        LineBuffer {
            buf: Vec::new(),
            idx: 0,
            prompt: prompt.chars().collect(),
            kill: Vec::new(),
            echo: Echo::Plain,
            width: 80,
            height: 24,
            interactive: true,
            highlight: None,
            backup: None,
            out,
        }
    }

    pub fn with_size(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// A non-interactive buffer edits normally but never renders.
    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    pub fn runes(&self) -> &[char] {
        &self.buf
    }

    pub fn text(&self) -> String {
        self.buf.iter().collect()
    }

    pub fn idx(&self) -> usize {
        self.idx
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn kill_ring(&self) -> &[char] {
        &self.kill
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn echo(&self) -> Echo {
        self.echo
    }

    /// The `n` runes immediately before the cursor.
    pub fn before_cursor(&self, n: usize) -> &[char] {
        &self.buf[self.idx.saturating_sub(n)..self.idx]
    }

    /// Display width of the prompt, ignoring SGR sequences.
    pub fn prompt_width(&self) -> usize {
        unicode::runes_width(&unicode::color_filter(&self.prompt))
    }

    pub fn set_prompt(&mut self, prompt: &str) {
        self.prompt = prompt.chars().collect();
    }

    pub fn set_echo(&mut self, echo: Echo) {
        self.echo = echo;
    }

    pub fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    pub fn on_size_change(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
    }

    pub fn set_highlight(&mut self, highlight: Option<(usize, usize)>) {
        self.highlight = highlight;
    }

    // ---- editing -------------------------------------------------------

    pub fn write_char(&mut self, c: char) {
        self.write_runes(&[c]);
    }

    pub fn write_str(&mut self, s: &str) {
        let rs: Vec<char> = s.chars().collect();
        self.write_runes(&rs);
    }

    /// Insert runes at the cursor.
    pub fn write_runes(&mut self, rs: &[char]) {
        if rs.is_empty() {
            return;
        }
        if self.idx == self.buf.len() {
            self.buf.extend_from_slice(rs);
            self.idx += rs.len();
            if self.interactive {
                self.append_output(rs);
            }
            return;
        }
        self.refresh_with(|b| {
            b.buf.splice(b.idx..b.idx, rs.iter().copied());
            b.idx += rs.len();
        });
    }

    /// Delete the rune under the cursor.
    pub fn delete(&mut self) -> bool {
        if self.idx == self.buf.len() {
            return false;
        }
        self.refresh_with(|b| {
            b.buf.remove(b.idx);
        });
        true
    }

    /// Delete the rune before the cursor.
    pub fn backspace(&mut self) -> bool {
        if self.idx == 0 {
            return false;
        }
        self.refresh_with(|b| {
            b.idx -= 1;
            b.buf.remove(b.idx);
        });
        true
    }

    pub fn move_backward(&mut self) -> bool {
        if self.idx == 0 {
            return false;
        }
        self.refresh_with(|b| b.idx -= 1);
        true
    }

    pub fn move_forward(&mut self) -> bool {
        if self.idx == self.buf.len() {
            return false;
        }
        self.refresh_with(|b| b.idx += 1);
        true
    }

    pub fn move_to_line_start(&mut self) -> bool {
        if self.idx == 0 {
            return false;
        }
        self.refresh_with(|b| b.idx = 0);
        true
    }

    pub fn move_to_line_end(&mut self) -> bool {
        if self.idx == self.buf.len() {
            return false;
        }
        self.refresh_with(|b| b.idx = b.buf.len());
        true
    }

    /// Move to the start of the previous word.
    pub fn move_to_prev_word(&mut self) -> bool {
        if self.idx == 0 {
            return false;
        }
        let target = self.prev_word_start();
        self.refresh_with(|b| b.idx = target);
        true
    }

    /// Move to the start of the next word, or to the end of the buffer.
    pub fn move_to_next_word(&mut self) -> bool {
        if self.idx == self.buf.len() {
            return false;
        }
        let target = (self.idx + 1..self.buf.len())
            .find(|&i| self.is_word_start(i))
            .unwrap_or(self.buf.len());
        self.refresh_with(|b| b.idx = target);
        true
    }

    /// Kill from the cursor to the end of the line.
    pub fn kill(&mut self) -> bool {
        if self.idx == self.buf.len() {
            return false;
        }
        self.refresh_with(|b| {
            b.kill = b.buf.split_off(b.idx);
        });
        true
    }

    /// Kill from the start of the line to the cursor.
    pub fn kill_front(&mut self) -> bool {
        if self.idx == 0 {
            return false;
        }
        self.refresh_with(|b| {
            b.kill = b.buf.drain(..b.idx).collect();
            b.idx = 0;
        });
        true
    }

    /// Kill from the cursor to just before the next word (Meta-d).
    pub fn delete_word(&mut self) -> bool {
        if self.idx == self.buf.len() {
            return false;
        }
        let mut init = self.idx;
        while init < self.buf.len() && unicode::is_word_break(self.buf[init]) {
            init += 1;
        }
        match (init + 1..self.buf.len()).find(|&i| self.is_word_start(i)) {
            Some(next) => {
                self.refresh_with(|b| {
                    b.kill = b.buf.drain(b.idx..next - 1).collect();
                });
                true
            }
            None => self.kill(),
        }
    }

    /// Kill from the start of the current word to the cursor (Ctrl-W).
    pub fn back_escape_word(&mut self) -> bool {
        if self.idx == 0 {
            return false;
        }
        let start = self.prev_word_start();
        self.refresh_with(|b| {
            b.kill = b.buf.drain(start..b.idx).collect();
            b.idx = start;
        });
        true
    }

    /// Reinsert the kill-ring at the cursor.
    pub fn yank(&mut self) -> bool {
        if self.kill.is_empty() {
            return false;
        }
        let text = self.kill.clone();
        self.write_runes(&text);
        true
    }

    /// Swap the rune before the cursor with the one under it.
    pub fn transpose(&mut self) -> bool {
        if self.buf.len() < 2 {
            return false;
        }
        self.refresh_with(|b| {
            if b.idx == 0 {
                b.idx = 1;
            } else if b.idx >= b.buf.len() {
                b.idx = b.buf.len() - 1;
            }
            b.buf.swap(b.idx, b.idx - 1);
            b.idx += 1;
        });
        true
    }

    /// Swap the word at or after the cursor with the word before it.
    pub fn transpose_words(&mut self) -> bool {
        let words = self.word_spans();
        if words.len() < 2 {
            return false;
        }
        let k = words
            .iter()
            .position(|&(_, end)| end > self.idx)
            .unwrap_or(words.len() - 1)
            .max(1);
        let (s1, e1) = words[k - 1];
        let (s2, e2) = words[k];

        let mut middle = Vec::with_capacity(e2 - s1);
        middle.extend_from_slice(&self.buf[s2..e2]);
        middle.extend_from_slice(&self.buf[e1..s2]);
        middle.extend_from_slice(&self.buf[s1..e1]);
        self.replace_range(s1, e2, &middle);
        self.set_cursor(e2);
        true
    }

    /// Replace `buf[start..end]` with `rs`, keeping the cursor clamped.
    pub fn replace_range(&mut self, start: usize, end: usize, rs: &[char]) {
        let end = end.min(self.buf.len());
        let start = start.min(end);
        self.refresh_with(|b| {
            b.buf.splice(start..end, rs.iter().copied());
            b.idx = b.idx.min(b.buf.len());
        });
    }

    /// Move the cursor to `ch` (vim f/F/t/T). `prev_char` stops one rune short.
    pub fn move_to(&mut self, ch: char, prev_char: bool, reverse: bool) -> bool {
        let target = if reverse {
            (0..self.idx)
                .rev()
                .find(|&i| self.buf[i] == ch)
                .map(|i| if prev_char { i + 1 } else { i })
        } else {
            (self.idx + 1..self.buf.len())
                .find(|&i| self.buf[i] == ch)
                .map(|i| if prev_char { i - 1 } else { i })
        };
        match target {
            Some(target) => {
                self.refresh_with(|b| b.idx = target);
                true
            }
            None => false,
        }
    }

    pub fn set(&mut self, rs: &[char]) {
        self.set_with_idx(rs.len(), rs);
    }

    pub fn set_with_idx(&mut self, idx: usize, rs: &[char]) {
        self.refresh_with(|b| {
            b.buf = rs.to_vec();
            b.idx = idx.min(b.buf.len());
        });
    }

    pub fn set_cursor(&mut self, idx: usize) {
        if idx == self.idx {
            return;
        }
        self.refresh_with(|b| b.idx = idx.min(b.buf.len()));
    }

    /// Empty the buffer without rendering and return its previous contents.
    pub fn reset(&mut self) -> Vec<char> {
        self.idx = 0;
        self.highlight = None;
        std::mem::take(&mut self.buf)
    }

    /// Move past the end of the line, emit a newline and empty the buffer.
    pub fn reset_and_return(&mut self) -> Vec<char> {
        self.highlight = None;
        self.move_to_line_end();
        if self.interactive {
            self.emit("\n");
        }
        self.reset()
    }

    pub fn backup(&mut self) {
        self.backup = Some((self.buf.clone(), self.idx));
    }

    pub fn restore(&mut self) {
        if let Some((buf, idx)) = self.backup.take() {
            self.refresh_with(|b| {
                b.buf = buf;
                b.idx = idx;
            });
        }
    }

    // ---- rendering -----------------------------------------------------

    /// Repaint prompt and buffer in place.
    pub fn refresh(&mut self) {
        self.refresh_with(|_| {});
    }

    /// Clean the rendered line, apply `f`, then repaint.
    pub fn refresh_with<F: FnOnce(&mut Self)>(&mut self, f: F) {
        if !self.interactive {
            f(self);
            return;
        }
        self.clean();
        f(self);
        self.print();
    }

    /// Erase the rendered prompt and buffer, leaving the cursor where the
    /// prompt starts.
    pub fn clean(&mut self) {
        if !self.interactive {
            return;
        }
        let seq = self.clean_sequence(self.idx_line());
        self.emit(&seq);
    }

    /// Write prompt and buffer at the current cursor position.
    pub fn print(&mut self) {
        if !self.interactive {
            return;
        }
        let output = self.output();
        self.emit(&output);
    }

    pub fn clear_screen(&mut self) {
        if !self.interactive {
            return;
        }
        self.emit(ansi::CLEAR_SCREEN);
        self.print();
    }

    pub fn bell(&mut self) {
        if self.interactive {
            self.emit(ansi::BELL);
        }
    }

    /// Write text that is not part of the line (status lines, lists).
    pub fn write_raw(&mut self, text: &str) {
        self.emit(text);
    }

    /// Row of the cursor, counted from the prompt's first row.
    pub fn idx_line(&self) -> usize {
        if self.width == 0 {
            return 0;
        }
        self.split_to_cursor().len() - 1
    }

    /// Zero-based screen column of the cursor on its row.
    pub fn cursor_column(&self) -> usize {
        if self.width == 0 {
            return 0;
        }
        self.split_to_cursor()
            .last()
            .map_or(0, |row| unicode::runes_width(row))
    }

    /// Rows occupied by prompt and buffer, including the cursor row.
    pub fn line_count(&self) -> usize {
        self.split(&self.buf, 1).len()
    }

    /// Rows from the cursor row to the first row below the buffer.
    pub fn cursor_line_count(&self) -> usize {
        self.line_count() - self.idx_line()
    }

    /// `CSI n A` + `CSI n G` moving the cursor from the end of the rendered
    /// buffer back to `idx`.
    pub fn cursor_sequence(&self) -> String {
        let mut bcnt = (self.buf.len() - self.idx) as isize;
        let rows = self.split(&self.buf, 1);

        let mut up = 0;
        let mut row = rows.len() - 1;
        loop {
            bcnt -= rows[row].len() as isize;
            if bcnt <= 0 || row == 0 {
                break;
            }
            up += 1;
            row -= 1;
        }

        let mut column = 1;
        for &c in &rows[row] {
            if bcnt >= 0 {
                break;
            }
            column += rune_width(c);
            bcnt += 1;
        }

        let mut seq = String::new();
        if up > 0 {
            seq.push_str(&ansi::cursor_up(up));
        }
        seq.push_str(&ansi::cursor_column(column));
        seq
    }

    /// Rows up to the cursor. The rune under the cursor decides whether the
    /// cursor has wrapped onto a new row.
    fn split_to_cursor(&self) -> Vec<Vec<char>> {
        let next_width = match self.echo {
            _ if self.idx == self.buf.len() => 1,
            Echo::Plain => rune_width(self.buf[self.idx]),
            Echo::Masked(m) => rune_width(m),
            Echo::Hidden => 1,
        };
        self.split(&self.buf[..self.idx], next_width)
    }

    fn split(&self, rs: &[char], next_width: usize) -> Vec<Vec<char>> {
        let prompt = unicode::color_filter(&self.prompt);
        match self.echo {
            Echo::Plain => split_by_line(&prompt, rs, self.width, next_width),
            Echo::Masked(m) => split_by_line(&prompt, &vec![m; rs.len()], self.width, next_width),
            Echo::Hidden => split_by_line(&prompt, &[], self.width, next_width),
        }
    }

    fn is_in_line_edge(&self) -> bool {
        if self.width == 0 {
            return false;
        }
        self.split(&self.buf, 1)
            .last()
            .map_or(false, |row| row.is_empty())
    }

    fn clean_sequence(&self, idx_line: usize) -> String {
        let mut seq = String::new();
        if self.width == 0 {
            seq.push('\r');
        } else {
            if idx_line > 0 {
                seq.push_str(&ansi::cursor_up(idx_line));
            }
            seq.push_str(&ansi::cursor_column(1));
        }
        seq.push_str(ansi::ERASE_DOWN);
        seq
    }

    fn output(&self) -> String {
        let mut out: String = self.prompt.iter().collect();
        match self.echo {
            Echo::Plain => self.render_plain(&mut out),
            Echo::Masked(m) => out.extend(std::iter::repeat(m).take(self.buf.len())),
            Echo::Hidden => {}
        }
        if self.is_in_line_edge() {
            out.push_str(" \x08");
        }
        if self.idx < self.buf.len() && self.echo != Echo::Hidden {
            out.push_str(&self.cursor_sequence());
        }
        out
    }

    fn render_plain(&self, out: &mut String) {
        let highlight = self.highlight.filter(|&(start, end)| start < end);
        for (i, &c) in self.buf.iter().enumerate() {
            if let Some((start, _)) = highlight {
                if i == start {
                    out.push_str(&TextStyle::search_match().to_ansi());
                }
            }
            push_display(out, c);
            if let Some((_, end)) = highlight {
                if i + 1 == end {
                    out.push_str(ansi::RESET);
                }
            }
        }
    }

    /// Render only the runes just appended at the end of the buffer.
    fn append_output(&mut self, rs: &[char]) {
        let mut out = String::new();
        match self.echo {
            Echo::Plain => rs.iter().for_each(|&c| push_display(&mut out, c)),
            Echo::Masked(m) => out.extend(std::iter::repeat(m).take(rs.len())),
            Echo::Hidden => {}
        }
        if self.is_in_line_edge() {
            out.push_str(" \x08");
        }
        self.emit(&out);
    }

    fn emit(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Err(err) = self.out.write_text(text).and_then(|_| self.out.flush()) {
            log::warn!("terminal write failed: {err}");
        }
    }

    fn is_word_start(&self, i: usize) -> bool {
        !unicode::is_word_break(self.buf[i]) && unicode::is_word_break(self.buf[i - 1])
    }

    fn prev_word_start(&self) -> usize {
        (1..self.idx)
            .rev()
            .find(|&i| self.is_word_start(i))
            .unwrap_or(0)
    }

    fn word_spans(&self) -> Vec<(usize, usize)> {
        let mut spans = Vec::new();
        let mut start = None;
        for (i, &c) in self.buf.iter().enumerate() {
            match (start, unicode::is_word_break(c)) {
                (None, false) => start = Some(i),
                (Some(s), true) => {
                    spans.push((s, i));
                    start = None;
                }
                _ => {}
            }
        }
        if let Some(s) = start {
            spans.push((s, self.buf.len()));
        }
        spans
    }
}

fn push_display(out: &mut String, c: char) {
    if c == '\t' {
        out.extend(std::iter::repeat(' ').take(unicode::TAB_WIDTH));
    } else {
        out.push(c);
    }
}

impl std::fmt::Debug for LineBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineBuffer")
            .field("text", &self.text())
            .field("idx", &self.idx)
            .field("echo", &self.echo)
            .field("width", &self.width)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::MemoryOutput;

    fn runes(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn buffer(prompt: &str) -> (LineBuffer, MemoryOutput) {
        let output = MemoryOutput::new();
        let buf = LineBuffer::new(Box::new(output.clone()), prompt);
        (buf, output)
    }

    #[test]
    fn test_append_fast_path() {
        let (mut buf, output) = buffer("> ");
        buf.write_str("hello");
        assert_eq!(buf.text(), "hello");
        assert_eq!(buf.idx(), 5);
        assert_eq!(output.take(), "hello");
    }

    #[test]
    fn test_move_repaints_and_positions_cursor() {
        let (mut buf, output) = buffer("> ");
        buf.write_str("hello");
        output.clear();
        assert!(buf.move_backward());
        assert_eq!(output.take(), "\x1b[1G\x1b[J> hello\x1b[7G");
    }

    #[test]
    fn test_cursor_sequence_across_wrapped_rows() {
        let (buf, _) = buffer("> ");
        let mut buf = buf.with_size(5, 24);
        buf.write_str("abcdefgh");
        assert_eq!(buf.line_count(), 3);
        assert_eq!(buf.idx_line(), 2);
        buf.set_cursor(6);
        assert_eq!(buf.idx_line(), 1);
        assert_eq!(buf.cursor_sequence(), "\x1b[1A\x1b[4G");
    }

    #[test]
    fn test_line_edge_emits_wrap_fix() {
        let (buf, output) = buffer("> ");
        let mut buf = buf.with_size(5, 24);
        buf.write_str("abc");
        assert_eq!(output.take(), "abc \x08");
    }

    #[test]
    fn test_wide_runes_in_cursor_math() {
        let (mut buf, _) = buffer("");
        buf.write_str("世界x");
        buf.set_cursor(2);
        assert_eq!(buf.cursor_sequence(), "\x1b[5G");
    }

    #[test]
    fn test_cursor_stays_in_bounds() {
        let (mut buf, _) = buffer("");
        buf.write_str("ab");
        assert!(!buf.move_forward());
        assert!(buf.backspace());
        assert!(buf.backspace());
        assert!(!buf.backspace());
        assert!(!buf.delete());
        assert!(!buf.move_backward());
        assert_eq!(buf.idx(), 0);
        buf.write_str("xyz");
        buf.set_cursor(10);
        assert_eq!(buf.idx(), 3);
        assert!(buf.idx() <= buf.len());
    }

    #[test]
    fn test_insert_then_delete_round_trip() {
        let (mut buf, _) = buffer("");
        buf.write_str("hello world");
        buf.set_cursor(5);
        buf.write_str(", big");
        assert_eq!(buf.text(), "hello, big world");
        for _ in 0..5 {
            buf.backspace();
        }
        assert_eq!(buf.text(), "hello world");
        assert_eq!(buf.idx(), 5);
    }

    #[test]
    fn test_word_moves_idempotent_at_bounds() {
        let (mut buf, _) = buffer("");
        buf.write_str("foo bar baz");
        assert!(!buf.move_to_next_word());
        assert_eq!(buf.idx(), 11);
        assert!(buf.move_to_prev_word());
        assert_eq!(buf.idx(), 8);
        buf.move_to_line_start();
        assert!(!buf.move_to_prev_word());
        assert_eq!(buf.idx(), 0);
        assert!(buf.move_to_next_word());
        assert_eq!(buf.idx(), 4);
    }

    #[test]
    fn test_kill_and_yank() {
        let (mut buf, _) = buffer("");
        buf.write_str("hello world");
        buf.set_cursor(5);
        assert!(buf.kill());
        assert_eq!(buf.text(), "hello");
        assert_eq!(buf.kill_ring(), runes(" world").as_slice());
        buf.move_to_line_start();
        assert!(buf.yank());
        assert_eq!(buf.text(), " worldhello");
        assert_eq!(buf.idx(), 6);

        assert!(buf.kill_front());
        assert_eq!(buf.text(), "hello");
        assert_eq!(buf.kill_ring(), runes(" world").as_slice());
    }

    #[test]
    fn test_delete_does_not_touch_kill_ring() {
        let (mut buf, _) = buffer("");
        buf.write_str("abc");
        buf.set_cursor(0);
        buf.delete();
        assert!(buf.kill_ring().is_empty());
        assert!(!buf.yank());
    }

    #[test]
    fn test_word_kills() {
        let (mut buf, _) = buffer("");
        buf.write_str("hello big world");
        assert!(buf.back_escape_word());
        assert_eq!(buf.text(), "hello big ");
        assert_eq!(buf.kill_ring(), runes("world").as_slice());

        buf.set_cursor(0);
        assert!(buf.delete_word());
        assert_eq!(buf.text(), " big ");
    }

    #[test]
    fn test_transpose() {
        let (mut buf, _) = buffer("");
        buf.write_str("ab");
        assert!(buf.transpose());
        assert_eq!(buf.text(), "ba");
        buf.set_cursor(0);
        assert!(buf.transpose());
        assert_eq!(buf.text(), "ab");
        assert_eq!(buf.idx(), 2);
    }

    #[test]
    fn test_transpose_words() {
        let (mut buf, _) = buffer("");
        buf.write_str("foo bar");
        buf.set_cursor(4);
        assert!(buf.transpose_words());
        assert_eq!(buf.text(), "bar foo");
        assert_eq!(buf.idx(), 7);

        buf.set(&runes("single"));
        assert!(!buf.transpose_words());
    }

    #[test]
    fn test_move_to_char() {
        let (mut buf, _) = buffer("");
        buf.write_str("a,b,c");
        buf.set_cursor(0);
        assert!(buf.move_to(',', false, false));
        assert_eq!(buf.idx(), 1);
        assert!(buf.move_to('c', true, false));
        assert_eq!(buf.idx(), 3);
        assert!(buf.move_to('a', false, true));
        assert_eq!(buf.idx(), 0);
        assert!(!buf.move_to('z', false, false));
    }

    #[test]
    fn test_masked_and_hidden_echo() {
        let (mut buf, output) = buffer("pw: ");
        buf.set_echo(Echo::Masked('*'));
        buf.write_str("secret");
        assert_eq!(output.take(), "******");
        assert_eq!(buf.text(), "secret");

        buf.set_echo(Echo::Hidden);
        buf.refresh();
        assert_eq!(output.take(), "\x1b[1G\x1b[Jpw: ");
    }

    #[test]
    fn test_highlight_rendering() {
        let (mut buf, output) = buffer("");
        buf.write_str("hello");
        output.clear();
        buf.set_highlight(Some((1, 3)));
        buf.refresh();
        assert_eq!(output.take(), "\x1b[1G\x1b[Jh\x1b[4mel\x1b[0mlo");
    }

    #[test]
    fn test_colored_prompt_width() {
        let (buf, _) = buffer("\x1b[32m> \x1b[0m");
        assert_eq!(buf.prompt_width(), 2);
    }

    #[test]
    fn test_reset_and_return() {
        let (mut buf, output) = buffer("> ");
        buf.write_str("hey");
        output.clear();
        let line = buf.reset_and_return();
        assert_eq!(line, runes("hey"));
        assert!(buf.is_empty());
        assert_eq!(output.take(), "\n");
    }

    #[test]
    fn test_backup_restore() {
        let (mut buf, _) = buffer("");
        buf.write_str("draft");
        buf.backup();
        buf.set(&runes("other"));
        buf.restore();
        assert_eq!(buf.text(), "draft");
    }

    #[test]
    fn test_non_interactive_never_renders() {
        let output = MemoryOutput::new();
        let mut buf = LineBuffer::new(Box::new(output.clone()), "> ").with_interactive(false);
        buf.write_str("abc");
        buf.move_backward();
        buf.backspace();
        assert_eq!(buf.text(), "ac");
        assert_eq!(output.contents(), "");
    }
}
