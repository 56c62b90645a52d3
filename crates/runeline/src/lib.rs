//! # Runeline
//!
//! Interactive line reading for command-line programs: line editing with
//! Emacs-style keys and an optional vi mode, persistent history with
//! incremental search, and tab completion with column layout, selection and
//! paging.
//!
//! ## Quick Start
//!
//! ```no_run
//! use runeline::prelude::*;
//!
//! let rl = Readline::builder()
//!     .with_prompt("> ")
//!     .with_history_file("/tmp/runeline.history")
//!     .build()
//!     .expect("Failed to create readline");
//!
//! loop {
//!     match rl.readline() {
//!         Ok(line) => println!("got {line:?}"),
//!         Err(ReadlineError::Interrupt) => continue,
//!         Err(_) => break,
//!     }
//! }
//! ```
//!
//! ## Completion
//!
//! ```no_run
//! use runeline::prelude::*;
//!
//! let completer = PrefixCompleter::new(vec![
//!     PrefixCompleter::item("mode", vec![
//!         PrefixCompleter::leaf("vi"),
//!         PrefixCompleter::leaf("emacs"),
//!     ]),
//!     PrefixCompleter::leaf("help"),
//! ]);
//! let rl = Readline::builder()
//!     .with_auto_complete(completer)
//!     .build()
//!     .expect("Failed to create readline");
//! ```
//!
//! Background threads can print through [`Readline::stdout`] without
//! corrupting the line being edited.

pub mod builder;
pub mod error;
pub mod global;
pub mod instance;
pub mod prelude;
mod terminal;

pub use builder::{ReadlineBuilder, DEFAULT_ESCAPE_TIMEOUT};
pub use error::{ReadlineError, ReadlineResult};
pub use instance::{BackgroundWriter, Readline};

// Re-export the engine types callers configure
pub use runeline_core::{
    AutoCompleter, Candidates, CompletionError, CompletionResult, Config, ConsoleInput,
    ConsoleOutput, PrefixCompleter,
};
