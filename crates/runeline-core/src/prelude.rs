//! Convenient re-exports for common usage patterns
//!
//! ```
//! use runeline_core::prelude::*;
//!
//! let completer = PrefixCompleter::new(vec![PrefixCompleter::leaf("help")]);
//! let config = Config {
//!     auto_complete: Some(Box::new(completer)),
//!     ..Config::default()
//! };
//! assert!(config.auto_complete.is_some());
//! ```

pub use crate::completion::{AutoCompleter, Candidates, PrefixCompleter};
pub use crate::config::Config;
pub use crate::console::{ConsoleInput, ConsoleOutput, MemoryOutput};
pub use crate::error::{CompletionError, CompletionResult};
pub use crate::key::Key;
pub use crate::operation::Outcome;
