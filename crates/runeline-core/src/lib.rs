//! Runeline Core Library
//!
//! The line-editing engine behind `runeline`: key decoding, the editable
//! buffer and its terminal repainting, history with shadow edits,
//! incremental search, tab completion and vi mode, tied together by the
//! [`Operation`] dispatcher. Nothing here touches a real terminal; output goes
//! through [`ConsoleOutput`] and input arrives as decoded [`Key`]s.

pub mod key;
pub mod key_parser;

// Text buffer and rendering
pub mod buffer;
pub mod error;
pub mod unicode;

// Console I/O abstraction
pub mod console;

// Editing engines
pub mod completion;
pub mod history;
pub mod search;
pub mod vim;

// Dispatcher
pub mod config;
pub mod operation;

pub mod prelude;

// Re-export commonly used types for convenience
pub use key::Key;
pub use key_parser::{DecoderState, KeyDecoder};

pub use buffer::{Echo, LineBuffer};
pub use error::{
    CompletionError, CompletionResult, ConsoleError, ConsoleResult, HistoryError, HistoryResult,
};
pub use unicode::{rune_width, runes_width, Utf8Accumulator};

pub use console::{
    Color, ConsoleInput, ConsoleOutput, MemoryOutput, RawModeGuard, TextStyle, WriterOutput,
};

pub use completion::{AutoCompleter, Candidates, CompletionEngine, CompletionMode, PrefixCompleter};
pub use history::{HistoryEntry, HistoryStore, DEFAULT_HISTORY_LIMIT};
pub use search::{SearchDirection, SearchEngine};
pub use vim::{VimAction, VimEngine, VimMode};

pub use config::Config;
pub use operation::{Operation, Outcome, Stream};
