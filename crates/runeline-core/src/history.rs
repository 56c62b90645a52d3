//! History of submitted lines with in-progress shadow edits.
//!
//! Each entry keeps its committed text and a shadow copy that the user may
//! have edited while browsing. A shadow is only shown while its version stamp
//! matches the store's version; submitting or reverting bumps the version,
//! which silently discards every outstanding shadow. The last entry always
//! represents the line currently being edited.

use crate::error::{HistoryError, HistoryResult};
use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Default number of committed entries kept.
pub const DEFAULT_HISTORY_LIMIT: usize = 500;

/// One history slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Text as submitted (or loaded from the backing file)
    pub committed: Vec<char>,
    /// Unsubmitted edit made while this entry was displayed
    pub shadow: Vec<char>,
    /// Store version the shadow belongs to
    pub version: u64,
}

impl HistoryEntry {
    fn committed(text: Vec<char>) -> Self {
        HistoryEntry {
            committed: text,
            ..Default::default()
        }
    }

    fn clean(&mut self) {
        self.committed.clear();
        self.shadow.clear();
    }
}

/// Capacity-bounded, optionally file-backed history.
#[derive(Debug)]
pub struct HistoryStore {
    entries: VecDeque<HistoryEntry>,
    current: usize,
    version: u64,
    limit: usize,
    path: Option<PathBuf>,
    file: Option<File>,
    /// Lines in the backing file since it was last rewritten
    persisted: usize,
    enabled: bool,
}

impl HistoryStore {
    /// In-memory history holding at most `limit` committed entries.
    pub fn new(limit: usize) -> Self {
        let mut store = HistoryStore {
            entries: VecDeque::new(),
            current: 0,
            version: 0,
            limit: if limit == 0 { DEFAULT_HISTORY_LIMIT } else { limit },
            path: None,
            file: None,
            persisted: 0,
            enabled: true,
        };
        store.push_tail();
        store
    }

    /// History backed by `path`, loading whatever it already contains.
    pub fn open(path: impl AsRef<Path>, limit: usize) -> HistoryResult<Self> {
        let mut store = HistoryStore::new(limit);
        store.load(path.as_ref())?;
        Ok(store)
    }

    /// Switch to a different backing file, or to memory-only with `None`.
    ///
    /// Entries are reloaded from the new file. On failure the store is left
    /// empty and memory-only.
    pub fn set_path(&mut self, path: Option<&Path>) -> HistoryResult<()> {
        self.close();
        self.entries.clear();
        self.path = None;
        self.persisted = 0;
        match path {
            Some(path) => {
                let result = self.load(path);
                if result.is_err() {
                    self.push_tail();
                }
                result
            }
            None => {
                self.push_tail();
                Ok(())
            }
        }
    }

    fn load(&mut self, path: &Path) -> HistoryResult<()> {
        let display = path.display().to_string();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(path)
            .map_err(|e| HistoryError::io(&display, e))?;

        // drop the tail so loaded entries precede it
        self.entries.pop_back();
        let mut total = 0;
        let mut reader = BufReader::new(&file);
        let mut raw = Vec::new();
        loop {
            raw.clear();
            let n = reader
                .read_until(b'\n', &mut raw)
                .map_err(|e| HistoryError::io(&display, e))?;
            if n == 0 {
                break;
            }
            total += 1;
            let line = String::from_utf8_lossy(&raw);
            if matches!(line, std::borrow::Cow::Owned(_)) {
                log::warn!("history line {total} in {display} is not valid UTF-8");
            }
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            self.entries
                .push_back(HistoryEntry::committed(line.chars().collect()));
        }
        while self.entries.len() > self.limit {
            self.entries.pop_front();
        }

        self.path = Some(path.to_path_buf());
        self.file = Some(file);
        self.persisted = total;
        log::debug!(
            "loaded {} history entries from {display} ({total} lines)",
            self.entries.len()
        );

        if total > self.limit {
            self.rewrite()?;
        }
        self.version += 1;
        self.push_tail();
        Ok(())
    }

    /// Drop the oldest committed entries beyond the limit.
    pub fn compact(&mut self) {
        while self.entries.len() > self.limit + 1 {
            self.entries.pop_front();
            self.current = self.current.saturating_sub(1);
        }
    }

    /// Rewrite the backing file with only the retained entries.
    ///
    /// The new contents go to `<path>.tmp` first and are renamed over the
    /// original.
    pub fn rewrite(&mut self) -> HistoryResult<()> {
        let path = self.path.clone().ok_or(HistoryError::NotPersisted)?;
        let display = path.display().to_string();
        let mut tmp_path = path.clone().into_os_string();
        tmp_path.push(".tmp");
        let tmp_path = PathBuf::from(tmp_path);

        let tmp = File::create(&tmp_path).map_err(|e| HistoryError::io(&display, e))?;
        let mut writer = BufWriter::new(tmp);
        let kept: Vec<&HistoryEntry> = self
            .entries
            .iter()
            .filter(|e| !e.committed.is_empty())
            .collect();
        let skip = kept.len().saturating_sub(self.limit);
        let mut written = 0;
        for entry in &kept[skip..] {
            let line: String = entry.committed.iter().collect();
            writeln!(writer, "{line}").map_err(|e| HistoryError::io(&display, e))?;
            written += 1;
        }
        writer.flush().map_err(|e| HistoryError::io(&display, e))?;
        drop(writer);

        fs::rename(&tmp_path, &path).map_err(|e| HistoryError::io(&display, e))?;
        let file = OpenOptions::new()
            .append(true)
            .open(&path)
            .map_err(|e| HistoryError::io(&display, e))?;
        self.file = Some(file);
        self.persisted = written;
        log::debug!("compacted history file {display} to {written} entries");
        Ok(())
    }

    /// Text displayed for entry `idx`: the shadow when it belongs to the
    /// current version, otherwise the committed text.
    pub fn show(&self, idx: usize) -> &[char] {
        match self.entries.get(idx) {
            Some(entry) if entry.version == self.version => &entry.shadow,
            Some(entry) => &entry.committed,
            None => &[],
        }
    }

    pub fn current_text(&self) -> &[char] {
        self.show(self.current)
    }

    /// Step to the previous entry, or `None` at the oldest one.
    pub fn prev(&mut self) -> Option<Vec<char>> {
        if self.current == 0 {
            return None;
        }
        self.current -= 1;
        Some(self.current_text().to_vec())
    }

    /// Step to the next entry, or `None` at the in-progress tail.
    pub fn next(&mut self) -> Option<Vec<char>> {
        if self.current + 1 >= self.entries.len() {
            return None;
        }
        self.current += 1;
        Some(self.current_text().to_vec())
    }

    /// Record an unsubmitted edit of the current entry. Shadows never reach
    /// the backing file.
    pub fn update_shadow(&mut self, text: &[char]) {
        let version = self.version;
        if let Some(entry) = self.entries.get_mut(self.current) {
            entry.version = version;
            entry.shadow.clear();
            entry.shadow.extend_from_slice(text);
        }
    }

    /// Commit `text` to the current entry and append it to the backing file.
    fn commit(&mut self, text: &[char]) -> HistoryResult<()> {
        let version = self.version;
        let Some(entry) = self.entries.get_mut(self.current) else {
            return Ok(());
        };
        entry.version = version;
        entry.committed = text.to_vec();
        entry.shadow = text.to_vec();
        self.append_to_file(text)
    }

    /// Submit a line: commit it to the tail entry, start a fresh tail and
    /// invalidate every outstanding shadow.
    pub fn new_line(&mut self, line: &[char]) -> HistoryResult<()> {
        if !self.enabled {
            return Ok(());
        }
        let tail = self.entries.len() - 1;

        // unchanged repeat of the previous command, or an empty line
        let repeats_last = tail >= 1 && self.entries[tail - 1].committed == line;
        if repeats_last || line.is_empty() {
            self.current = tail;
            self.entries[tail].clean();
            self.version += 1;
            return Ok(());
        }

        self.current = tail;
        let result = self.commit(line);
        self.version += 1;
        self.push_tail();
        self.compact();
        result
    }

    /// Save a line without a read session.
    pub fn add(&mut self, line: &str) -> HistoryResult<()> {
        let line: Vec<char> = line.chars().collect();
        self.new_line(&line)
    }

    /// Abandon all shadow edits and point back at the tail.
    pub fn revert(&mut self) {
        self.version += 1;
        self.current = self.entries.len() - 1;
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Release the backing file. Entries stay available in memory.
    pub fn close(&mut self) {
        if let Some(mut file) = self.file.take() {
            if let Err(err) = file.flush() {
                log::warn!("failed to flush history file: {err}");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    pub fn current(&self) -> usize {
        self.current
    }

    /// Point at entry `idx`, clamped to the tail.
    pub fn set_current(&mut self, idx: usize) {
        self.current = idx.min(self.entries.len() - 1);
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn entry(&self, idx: usize) -> Option<&HistoryEntry> {
        self.entries.get(idx)
    }

    /// Committed texts, oldest first, excluding the in-progress tail.
    pub fn committed(&self) -> impl Iterator<Item = String> + '_ {
        self.entries
            .iter()
            .take(self.entries.len() - 1)
            .map(|e| e.committed.iter().collect())
    }

    fn push_tail(&mut self) {
        self.entries.push_back(HistoryEntry::default());
        self.current = self.entries.len() - 1;
    }

    fn append_to_file(&mut self, text: &[char]) -> HistoryResult<()> {
        let Some(file) = self.file.as_mut() else {
            return Ok(());
        };
        let display = self
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let line: String = text.iter().collect();
        writeln!(file, "{line}").map_err(|e| HistoryError::io(&display, e))?;
        self.persisted += 1;
        if self.persisted > self.limit * 2 {
            self.rewrite()?;
        }
        Ok(())
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        HistoryStore::new(DEFAULT_HISTORY_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn runes(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn text(rs: Option<Vec<char>>) -> Option<String> {
        rs.map(|r| r.into_iter().collect())
    }

    fn store_with(lines: &[&str]) -> HistoryStore {
        let mut store = HistoryStore::new(100);
        for line in lines {
            store.add(line).unwrap();
        }
        store
    }

    #[test]
    fn test_prev_walks_backwards() {
        let mut store = store_with(&["a", "b", "c"]);
        assert_eq!(text(store.prev()), Some("c".to_string()));
        assert_eq!(text(store.prev()), Some("b".to_string()));
        assert_eq!(text(store.prev()), Some("a".to_string()));
        assert_eq!(store.prev(), None);
        assert_eq!(store.current(), 0);
    }

    #[test]
    fn test_next_stops_at_tail() {
        let mut store = store_with(&["a"]);
        assert_eq!(store.next(), None);
        store.prev();
        assert_eq!(text(store.next()), Some(String::new()));
        assert_eq!(store.next(), None);
    }

    #[test]
    fn test_shadow_edit_survives_navigation() {
        let mut store = store_with(&["a", "b", "c"]);
        store.prev();
        store.prev();
        assert_eq!(store.current_text(), runes("b").as_slice());
        store.update_shadow(&runes("bx"));

        assert_eq!(text(store.next()), Some("c".to_string()));
        assert_eq!(text(store.prev()), Some("bx".to_string()));
        assert_eq!(store.entry(1).unwrap().committed, runes("b"));
    }

    #[test]
    fn test_submit_invalidates_shadows() {
        let mut store = store_with(&["a", "b"]);
        store.prev();
        store.update_shadow(&runes("edited"));
        store.new_line(&runes("edited")).unwrap();

        assert_eq!(text(store.prev()), Some("edited".to_string()));
        assert_eq!(text(store.prev()), Some("b".to_string()));
    }

    #[test]
    fn test_duplicate_submission_collapses() {
        let mut store = store_with(&["ls", "ls"]);
        assert_eq!(store.committed().collect::<Vec<_>>(), vec!["ls"]);
        store.add("pwd").unwrap();
        store.add("ls").unwrap();
        assert_eq!(store.committed().collect::<Vec<_>>(), vec!["ls", "pwd", "ls"]);
    }

    #[test]
    fn test_empty_line_is_not_recorded() {
        let mut store = store_with(&["a"]);
        store.add("").unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_revert_drops_shadow() {
        let mut store = store_with(&["a"]);
        store.prev();
        store.update_shadow(&runes("ax"));
        store.revert();
        assert_eq!(store.current(), 1);
        assert_eq!(text(store.prev()), Some("a".to_string()));
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut store = HistoryStore::new(2);
        for line in ["one", "two", "three"] {
            store.add(line).unwrap();
        }
        assert_eq!(store.committed().collect::<Vec<_>>(), vec!["two", "three"]);
        assert_eq!(store.current(), store.len() - 1);
    }

    #[test]
    fn test_disabled_store_ignores_submissions() {
        let mut store = HistoryStore::new(10);
        store.disable();
        store.add("secret").unwrap();
        assert!(store.is_empty());
        store.enable();
        assert!(store.is_enabled());
    }

    #[test]
    fn test_load_trims_and_skips_empty_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history");
        fs::write(&path, "  first \n\n second\n").unwrap();

        let store = HistoryStore::open(&path, 10).unwrap();
        assert_eq!(store.committed().collect::<Vec<_>>(), vec!["first", "second"]);
        assert_eq!(store.path(), Some(path.as_path()));
    }

    #[test]
    fn test_commit_appends_to_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history");
        let mut store = HistoryStore::open(&path, 10).unwrap();
        store.add("echo hi").unwrap();
        store.add("ls").unwrap();
        store.close();

        assert_eq!(fs::read_to_string(&path).unwrap(), "echo hi\nls\n");
        let reopened = HistoryStore::open(&path, 10).unwrap();
        assert_eq!(reopened.committed().collect::<Vec<_>>(), vec!["echo hi", "ls"]);
    }

    #[test]
    fn test_overflow_rewrites_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history");
        fs::write(&path, "1\n2\n3\n4\n5\n").unwrap();

        let store = HistoryStore::open(&path, 3).unwrap();
        assert_eq!(store.committed().collect::<Vec<_>>(), vec!["3", "4", "5"]);
        assert_eq!(fs::read_to_string(&path).unwrap(), "3\n4\n5\n");
        assert!(!dir.path().join("history.tmp").exists());
    }

    #[test]
    fn test_append_overflow_keeps_limit_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history");
        let mut store = HistoryStore::open(&path, 2).unwrap();
        for line in ["a", "b", "c", "d", "e"] {
            store.add(line).unwrap();
        }

        assert_eq!(store.committed().collect::<Vec<_>>(), vec!["d", "e"]);
        assert_eq!(fs::read_to_string(&path).unwrap(), "d\ne\n");

        store.add("f").unwrap();
        store.close();
        assert_eq!(fs::read_to_string(&path).unwrap(), "d\ne\nf\n");
    }

    #[test]
    fn test_invalid_utf8_line_keeps_file_attached() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history");
        fs::write(&path, b"first\n\xff\xfe\nsecond\n").unwrap();

        let mut store = HistoryStore::open(&path, 10).unwrap();
        let committed: Vec<String> = store.committed().collect();
        assert_eq!(committed.len(), 3);
        assert_eq!(committed[0], "first");
        assert_eq!(committed[2], "second");
        assert_eq!(store.path(), Some(path.as_path()));

        store.add("new").unwrap();
        store.close();
        let bytes = fs::read(&path).unwrap();
        assert!(bytes.ends_with(b"second\nnew\n"));
    }

    #[test]
    fn test_set_path_switches_backing_file() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("first");
        let second = dir.path().join("second");
        fs::write(&second, "from second\n").unwrap();

        let mut store = HistoryStore::open(&first, 10).unwrap();
        store.add("from first").unwrap();
        store.set_path(Some(&second)).unwrap();
        assert_eq!(store.committed().collect::<Vec<_>>(), vec!["from second"]);

        store.set_path(None).unwrap();
        assert!(store.is_empty());
        assert!(store.path().is_none());
        assert!(matches!(store.rewrite(), Err(HistoryError::NotPersisted)));
    }

    #[test]
    fn test_unwritable_path_reports_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("history");
        let err = HistoryStore::open(&path, 10).unwrap_err();
        assert!(matches!(err, HistoryError::Io { .. }));
    }
}
