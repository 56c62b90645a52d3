//! Rune-level helpers for display width, line wrapping and matching.
//!
//! The buffer is a `Vec<char>`, so everything here works on `&[char]` and
//! indexes by rune rather than by byte.

use unicode_width::UnicodeWidthChar;

/// Columns a tab occupies once expanded for display.
pub const TAB_WIDTH: usize = 4;

/// Display width of one rune: 2 for wide/CJK/emoji, 0 for combining and
/// control code points, [`TAB_WIDTH`] for a tab.
pub fn rune_width(c: char) -> usize {
    if c == '\t' {
        return TAB_WIDTH;
    }
    c.width().unwrap_or(0)
}

/// Total display width of a rune slice.
pub fn runes_width(rs: &[char]) -> usize {
    rs.iter().map(|&c| rune_width(c)).sum()
}

/// Strip `ESC [ ... m` sequences so a colored prompt measures correctly.
pub fn color_filter(rs: &[char]) -> Vec<char> {
    let mut out = Vec::with_capacity(rs.len());
    let mut pos = 0;
    while pos < rs.len() {
        if rs[pos] == '\x1b' && rs.get(pos + 1) == Some(&'[') {
            if let Some(end) = rs[pos + 2..].iter().position(|&c| c == 'm') {
                pos += end + 3;
                continue;
            }
            // unterminated: drop only the ESC
            pos += 1;
            continue;
        }
        out.push(rs[pos]);
        pos += 1;
    }
    out
}

/// Split `prompt + rs` into the rows the terminal will show.
///
/// A virtual rune of width `next_width` is appended while splitting: if it
/// would not fit on the last row, an empty trailing row is produced. That row
/// is where the terminal cursor actually sits, which keeps the cursor arithmetic
/// consistent with the `" \b"` emitted at an exact line edge.
pub fn split_by_line(
    prompt: &[char],
    rs: &[char],
    screen_width: usize,
    next_width: usize,
) -> Vec<Vec<char>> {
    let mut rows = Vec::new();
    let mut line: Vec<char> = Vec::new();
    if screen_width == 0 {
        line.extend_from_slice(prompt);
        line.extend_from_slice(rs);
        rows.push(line);
        return rows;
    }

    let mut line_width = 0;
    for &c in prompt.iter().chain(rs.iter()) {
        let w = rune_width(c);
        if line_width + w > screen_width {
            rows.push(std::mem::take(&mut line));
            line_width = 0;
        }
        line.push(c);
        line_width += w;
    }
    if line_width + next_width > screen_width {
        rows.push(std::mem::take(&mut line));
    }
    rows.push(line);
    rows
}

/// Word boundaries are any code point that is not an ASCII letter.
pub fn is_word_break(c: char) -> bool {
    !c.is_ascii_alphabetic()
}

/// Whether a decoded rune should be inserted into the buffer.
pub fn is_printable(c: char) -> bool {
    c >= ' ' && c != '\x7f'
}

fn rune_eq(a: char, b: char, fold: bool) -> bool {
    if fold {
        a == b || a.to_lowercase().eq(b.to_lowercase())
    } else {
        a == b
    }
}

fn matches_at(hay: &[char], needle: &[char], start: usize, fold: bool) -> bool {
    hay[start..start + needle.len()]
        .iter()
        .zip(needle)
        .all(|(&a, &b)| rune_eq(a, b, fold))
}

/// First match of `needle` in `hay` starting at or after `from`.
pub fn index_from(hay: &[char], needle: &[char], from: usize, fold: bool) -> Option<usize> {
    if needle.len() > hay.len() {
        return None;
    }
    (from..=hay.len() - needle.len()).find(|&i| matches_at(hay, needle, i, fold))
}

/// Last match of `needle` in `hay` starting at or before `upto`.
pub fn rindex_upto(hay: &[char], needle: &[char], upto: usize, fold: bool) -> Option<usize> {
    if needle.len() > hay.len() {
        return None;
    }
    let last = upto.min(hay.len() - needle.len());
    (0..=last).rev().find(|&i| matches_at(hay, needle, i, fold))
}

pub fn has_prefix(rs: &[char], prefix: &[char]) -> bool {
    rs.len() >= prefix.len() && rs[..prefix.len()] == *prefix
}

/// Longest prefix shared by every candidate.
pub fn aggregate(candidates: &[Vec<char>]) -> Vec<char> {
    let Some(first) = candidates.first() else {
        return Vec::new();
    };
    let mut len = first.len();
    for c in &candidates[1..] {
        len = len.min(c.len());
        len = first[..len]
            .iter()
            .zip(c.iter())
            .position(|(a, b)| a != b)
            .unwrap_or(len);
    }
    first[..len].to_vec()
}

/// Decodes a UTF-8 byte stream that may be split at arbitrary chunk boundaries.
#[derive(Debug, Default)]
pub struct Utf8Accumulator {
    pending: Vec<u8>,
}

impl Utf8Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes and return every rune that is now complete.
    /// Invalid sequences decode to U+FFFD.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<char> {
        self.pending.extend_from_slice(bytes);
        let mut out = Vec::new();
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(s) => {
                    out.extend(s.chars());
                    self.pending.clear();
                    return out;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    if let Ok(s) = std::str::from_utf8(&self.pending[..valid]) {
                        out.extend(s.chars());
                    }
                    match e.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + bad);
                        }
                        None => {
                            self.pending.drain(..valid);
                            return out;
                        }
                    }
                }
            }
        }
    }

    /// Whether a partial sequence is waiting for more bytes.
    pub fn is_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Drop any partial sequence, yielding U+FFFD if one was buffered.
    pub fn flush(&mut self) -> Option<char> {
        if self.pending.is_empty() {
            return None;
        }
        self.pending.clear();
        Some(char::REPLACEMENT_CHARACTER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runes(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_rune_width() {
        assert_eq!(rune_width('a'), 1);
        assert_eq!(rune_width('世'), 2);
        assert_eq!(rune_width('🦀'), 2);
        assert_eq!(rune_width('\u{0301}'), 0);
        assert_eq!(rune_width('\x07'), 0);
        assert_eq!(runes_width(&runes("Hello 世界")), 10);
    }

    #[test]
    fn test_color_filter() {
        assert_eq!(color_filter(&runes("\x1b[31m> \x1b[0m")), runes("> "));
        assert_eq!(color_filter(&runes("plain")), runes("plain"));
        assert_eq!(color_filter(&runes("\x1b[31")), runes("[31"));
    }

    #[test]
    fn test_split_by_line() {
        let prompt = runes("> ");
        let rows = split_by_line(&prompt, &runes("abc"), 10, 1);
        assert_eq!(rows, vec![runes("> abc")]);

        let rows = split_by_line(&prompt, &runes("abcdefgh"), 5, 1);
        assert_eq!(rows, vec![runes("> abc"), runes("defgh"), vec![]]);

        // a wide rune never straddles a row boundary
        let rows = split_by_line(&prompt, &runes("ab世"), 5, 1);
        assert_eq!(rows, vec![runes("> ab"), runes("世")]);
    }

    #[test]
    fn test_word_break() {
        assert!(!is_word_break('a'));
        assert!(!is_word_break('Z'));
        assert!(is_word_break(' '));
        assert!(is_word_break('1'));
        assert!(is_word_break('é'));
    }

    #[test]
    fn test_index_search() {
        let hay = runes("hello help");
        assert_eq!(index_from(&hay, &runes("he"), 0, false), Some(0));
        assert_eq!(index_from(&hay, &runes("he"), 1, false), Some(6));
        assert_eq!(rindex_upto(&hay, &runes("he"), 10, false), Some(6));
        assert_eq!(rindex_upto(&hay, &runes("he"), 5, false), Some(0));
        assert_eq!(rindex_upto(&hay, &runes("HE"), 10, false), None);
        assert_eq!(rindex_upto(&hay, &runes("HE"), 10, true), Some(6));
        assert_eq!(index_from(&hay, &runes("hello help!"), 0, false), None);
    }

    #[test]
    fn test_aggregate() {
        let candidates = vec![runes("it"), runes("it-shell"), runes("ist")];
        assert_eq!(aggregate(&candidates), runes("i"));
        let candidates = vec![runes("o"), runes("it")];
        assert!(aggregate(&candidates).is_empty());
        assert!(aggregate(&[]).is_empty());
    }

    #[test]
    fn test_utf8_accumulator_split_sequence() {
        let mut acc = Utf8Accumulator::new();
        let bytes = "a世".as_bytes();
        assert_eq!(acc.push(&bytes[..2]), vec!['a']);
        assert!(acc.is_pending());
        assert_eq!(acc.push(&bytes[2..]), vec!['世']);
        assert!(!acc.is_pending());
    }

    #[test]
    fn test_utf8_accumulator_invalid_bytes() {
        let mut acc = Utf8Accumulator::new();
        assert_eq!(acc.push(&[b'x', 0xff, b'y']), vec!['x', '\u{fffd}', 'y']);
        acc.push(&[0xe4]);
        assert_eq!(acc.flush(), Some('\u{fffd}'));
        assert_eq!(acc.flush(), None);
    }
}
