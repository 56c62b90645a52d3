//! Console input/output abstraction traits and types
//!
//! The engine only ever talks to the terminal through these traits: a byte
//! source for raw keystrokes and an ANSI/VT100 text sink for repaints. Raw-mode
//! syscalls live in `runeline-io`; this module owns the control sequences.

use crate::error::{ConsoleError, ConsoleResult};
use std::io::Write;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

/// Cross-platform console input interface
pub trait ConsoleInput: Send {
    /// Enable raw terminal mode with automatic restoration
    fn enable_raw_mode(&self) -> ConsoleResult<RawModeGuard>;

    /// Get current terminal window size (columns, rows)
    fn get_window_size(&self) -> ConsoleResult<(u16, u16)>;

    /// Wait up to `timeout` for input and copy it into `buf`.
    ///
    /// Returns `Ok(None)` when nothing arrived in time, `Ok(Some(0))` at end of
    /// stream and `Ok(Some(n))` when `n` bytes were read.
    fn read_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> ConsoleResult<Option<usize>>;
}

/// Cross-platform console output interface
pub trait ConsoleOutput: Send {
    /// Write text (including control sequences) at the current cursor position
    fn write_text(&mut self, text: &str) -> ConsoleResult<()>;

    /// Flush buffered output to terminal
    fn flush(&mut self) -> ConsoleResult<()>;
}

/// RAII guard for terminal raw mode with primary restoration responsibility
pub struct RawModeGuard {
    restore_fn: Option<Box<dyn FnOnce() + Send>>,
    platform_info: String,
    is_active: Arc<AtomicBool>,
}

impl RawModeGuard {
    pub fn new<F>(restore_fn: F, platform_info: String) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            restore_fn: Some(Box::new(restore_fn)),
            platform_info,
            is_active: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn platform_info(&self) -> &str {
        &self.platform_info
    }

    pub fn is_active(&self) -> bool {
        self.is_active.load(Ordering::Relaxed)
    }

    /// Manually restore terminal mode (prevents automatic restoration on drop)
    pub fn restore(mut self) -> ConsoleResult<()> {
        match self.restore_fn.take() {
            Some(restore_fn) => {
                self.is_active.store(false, Ordering::Relaxed);
                restore_fn();
                Ok(())
            }
            None => Err(ConsoleError::TerminalError("Already restored".to_string())),
        }
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Some(restore_fn) = self.restore_fn.take() {
            self.is_active.store(false, Ordering::Relaxed);
            restore_fn();
        }
    }
}

impl std::fmt::Debug for RawModeGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawModeGuard")
            .field("platform_info", &self.platform_info)
            .field("is_active", &self.is_active())
            .finish()
    }
}

/// The eight basic ANSI colors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

impl Color {
    fn offset(self) -> u8 {
        match self {
            Color::Black => 0,
            Color::Red => 1,
            Color::Green => 2,
            Color::Yellow => 3,
            Color::Blue => 4,
            Color::Magenta => 5,
            Color::Cyan => 6,
            Color::White => 7,
        }
    }
}

/// Text styling expressed as a single SGR sequence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextStyle {
    pub foreground: Option<Color>,
    pub background: Option<Color>,
    pub bold: bool,
    pub underline: bool,
    pub reverse: bool,
}

impl TextStyle {
    /// Style used to mark the selected completion candidate.
    pub fn selection() -> Self {
        TextStyle {
            foreground: Some(Color::Black),
            background: Some(Color::White),
            ..Default::default()
        }
    }

    /// Style used to mark the matched span during incremental search.
    pub fn search_match() -> Self {
        TextStyle {
            underline: true,
            ..Default::default()
        }
    }

    /// Render the style as `CSI ... m`. An empty style renders as a reset.
    pub fn to_ansi(&self) -> String {
        let mut codes: Vec<String> = Vec::new();
        if self.bold {
            codes.push("1".to_string());
        }
        if self.underline {
            codes.push("4".to_string());
        }
        if self.reverse {
            codes.push("7".to_string());
        }
        if let Some(fg) = self.foreground {
            codes.push((30 + fg.offset()).to_string());
        }
        if let Some(bg) = self.background {
            codes.push((40 + bg.offset()).to_string());
        }
        if codes.is_empty() {
            return ansi::RESET.to_string();
        }
        format!("\x1b[{}m", codes.join(";"))
    }
}

/// ANSI/VT100 control sequences emitted by the renderer.
pub mod ansi {
    /// Audible bell
    pub const BELL: &str = "\x07";
    /// Erase from the cursor to the end of the screen
    pub const ERASE_DOWN: &str = "\x1b[J";
    /// Reset all SGR attributes
    pub const RESET: &str = "\x1b[0m";
    /// Home the cursor and erase the whole screen
    pub const CLEAR_SCREEN: &str = "\x1b[H\x1b[2J";

    /// `CSI n A`
    pub fn cursor_up(n: usize) -> String {
        format!("\x1b[{n}A")
    }

    /// `CSI n C`
    pub fn cursor_forward(n: usize) -> String {
        format!("\x1b[{n}C")
    }

    /// `CSI n G`, 1-based column
    pub fn cursor_column(n: usize) -> String {
        format!("\x1b[{n}G")
    }
}

/// Adapts any `io::Write` into a [`ConsoleOutput`].
pub struct WriterOutput<W: Write + Send> {
    inner: W,
}

impl<W: Write + Send> WriterOutput<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write + Send> ConsoleOutput for WriterOutput<W> {
    fn write_text(&mut self, text: &str) -> ConsoleResult<()> {
        self.inner.write_all(text.as_bytes())?;
        Ok(())
    }

    fn flush(&mut self) -> ConsoleResult<()> {
        self.inner.flush()?;
        Ok(())
    }
}

/// In-memory output sink whose contents can be inspected from another handle.
///
/// Clones share the same buffer, so a test can hand one clone to the engine and
/// read what was rendered through the other.
#[derive(Debug, Clone, Default)]
pub struct MemoryOutput {
    buffer: Arc<Mutex<String>>,
}

impl MemoryOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far
    pub fn contents(&self) -> String {
        self.buffer.lock().map(|b| b.clone()).unwrap_or_default()
    }

    /// Return and clear everything written so far
    pub fn take(&self) -> String {
        self.buffer
            .lock()
            .map(|mut b| std::mem::take(&mut *b))
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut b) = self.buffer.lock() {
            b.clear();
        }
    }
}

impl ConsoleOutput for MemoryOutput {
    fn write_text(&mut self, text: &str) -> ConsoleResult<()> {
        let mut buffer = self.buffer.lock().map_err(|_| ConsoleError::Closed)?;
        buffer.push_str(text);
        Ok(())
    }

    fn flush(&mut self) -> ConsoleResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_to_ansi() {
        assert_eq!(TextStyle::selection().to_ansi(), "\x1b[30;47m");
        assert_eq!(TextStyle::search_match().to_ansi(), "\x1b[4m");
        assert_eq!(TextStyle::default().to_ansi(), "\x1b[0m");

        let style = TextStyle {
            foreground: Some(Color::Green),
            bold: true,
            ..Default::default()
        };
        assert_eq!(style.to_ansi(), "\x1b[1;32m");
    }

    #[test]
    fn test_cursor_sequences() {
        assert_eq!(ansi::cursor_up(3), "\x1b[3A");
        assert_eq!(ansi::cursor_column(1), "\x1b[1G");
        assert_eq!(ansi::cursor_forward(12), "\x1b[12C");
    }

    #[test]
    fn test_memory_output_shares_buffer() {
        let output = MemoryOutput::new();
        let mut writer = output.clone();
        writer.write_text("hello").unwrap();
        writer.write_text(ansi::BELL).unwrap();
        assert_eq!(output.contents(), "hello\x07");
        assert_eq!(output.take(), "hello\x07");
        assert_eq!(output.contents(), "");
    }

    #[test]
    fn test_writer_output() {
        let mut output = WriterOutput::new(Vec::new());
        output.write_text("abc").unwrap();
        output.flush().unwrap();
        assert_eq!(output.into_inner(), b"abc");
    }

    #[test]
    fn test_raw_mode_guard_restores_once() {
        let restored = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&restored);
        let guard = RawModeGuard::new(move || flag.store(true, Ordering::SeqCst), "Mock".to_string());
        assert!(guard.is_active());
        assert_eq!(guard.platform_info(), "Mock");
        guard.restore().unwrap();
        assert!(restored.load(Ordering::SeqCst));
    }
}
