//! Convenient re-exports for common usage patterns
//!
//! ```
//! use runeline::prelude::*;
//!
//! let builder = Readline::builder().with_prompt("$ ");
//! assert_eq!(builder.config().prompt, "$ ");
//! ```

pub use crate::builder::ReadlineBuilder;
pub use crate::error::{ReadlineError, ReadlineResult};
pub use crate::instance::{BackgroundWriter, Readline};

pub use runeline_core::{AutoCompleter, Candidates, CompletionResult, Config, PrefixCompleter};
