//! Mock console input for testing
//!
//! Input is scripted as byte chunks. Each chunk is delivered by a separate
//! read, which lets tests reproduce escape sequences split across reads.
//! Clones share the same script, so a test keeps one handle to feed input
//! while the reader thread owns the other.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use crate::{ConsoleError, ConsoleInput, ConsoleResult, RawModeGuard};

#[derive(Debug, Default)]
struct Script {
    chunks: VecDeque<Vec<u8>>,
    closed: bool,
    size: (u16, u16),
}

/// Scripted keystroke source.
#[derive(Debug, Clone)]
pub struct MockConsoleInput {
    script: Arc<(Mutex<Script>, Condvar)>,
    raw_mode: Arc<AtomicBool>,
}

impl Default for MockConsoleInput {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConsoleInput {
    /// An 80x24 terminal with no pending input.
    pub fn new() -> Self {
        Self {
            script: Arc::new((
                Mutex::new(Script {
                    size: (80, 24),
                    ..Script::default()
                }),
                Condvar::new(),
            )),
            raw_mode: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_size(self, cols: u16, rows: u16) -> Self {
        self.set_size(cols, rows);
        self
    }

    /// Queue one chunk, delivered by a single read.
    pub fn push_bytes(&self, bytes: &[u8]) {
        self.update(|script| script.chunks.push_back(bytes.to_vec()));
    }

    pub fn push_str(&self, text: &str) {
        self.push_bytes(text.as_bytes());
    }

    /// Queue each byte of `text` as its own chunk.
    pub fn push_bytewise(&self, text: &str) {
        self.update(|script| {
            script
                .chunks
                .extend(text.as_bytes().iter().map(|&b| vec![b]))
        });
    }

    /// End the stream once queued chunks are consumed.
    pub fn close(&self) {
        self.update(|script| script.closed = true);
    }

    /// Change the reported window size, as a terminal resize would.
    pub fn set_size(&self, cols: u16, rows: u16) {
        self.update(|script| script.size = (cols, rows));
    }

    /// Chunks not yet read.
    pub fn pending(&self) -> usize {
        self.script.0.lock().map(|s| s.chunks.len()).unwrap_or(0)
    }

    pub fn is_raw_mode(&self) -> bool {
        self.raw_mode.load(Ordering::SeqCst)
    }

    fn update<F: FnOnce(&mut Script)>(&self, f: F) {
        let (lock, cvar) = &*self.script;
        if let Ok(mut script) = lock.lock() {
            f(&mut script);
            cvar.notify_all();
        }
    }
}

impl ConsoleInput for MockConsoleInput {
    fn enable_raw_mode(&self) -> ConsoleResult<RawModeGuard> {
        self.raw_mode.store(true, Ordering::SeqCst);
        let raw_mode = Arc::clone(&self.raw_mode);
        Ok(RawModeGuard::new(
            move || raw_mode.store(false, Ordering::SeqCst),
            "Mock".to_string(),
        ))
    }

    fn get_window_size(&self) -> ConsoleResult<(u16, u16)> {
        let script = self.script.0.lock().map_err(|_| ConsoleError::Closed)?;
        Ok(script.size)
    }

    fn read_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> ConsoleResult<Option<usize>> {
        let (lock, cvar) = &*self.script;
        let script = lock.lock().map_err(|_| ConsoleError::Closed)?;
        let (mut script, _) = cvar
            .wait_timeout_while(script, timeout, |s| s.chunks.is_empty() && !s.closed)
            .map_err(|_| ConsoleError::Closed)?;

        let Some(mut chunk) = script.chunks.pop_front() else {
            return Ok(if script.closed { Some(0) } else { None });
        };
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            script.chunks.push_front(chunk.split_off(n));
        }
        Ok(Some(n))
    }
}
