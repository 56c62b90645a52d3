//! Process-wide convenience instance on the real terminal.
//!
//! The instance is created on first use and lives until [`close`] is called.
//! Programs that need more than one prompt or custom streams should build
//! their own [`Readline`].

use crate::error::{ReadlineError, ReadlineResult};
use crate::instance::{BackgroundWriter, Readline};
use runeline_core::{AutoCompleter, Config};
use std::path::Path;
use std::sync::{Arc, Mutex};

static STD: Mutex<Option<Arc<Readline>>> = Mutex::new(None);

fn instance() -> ReadlineResult<Arc<Readline>> {
    let mut slot = STD.lock().map_err(|_| ReadlineError::Closed)?;
    if let Some(rl) = slot.as_ref() {
        return Ok(Arc::clone(rl));
    }
    let rl = Arc::new(Readline::new(Config::default())?);
    *slot = Some(Arc::clone(&rl));
    Ok(rl)
}

/// Read one line after showing `prompt`.
pub fn line(prompt: &str) -> ReadlineResult<String> {
    let rl = instance()?;
    rl.set_prompt(prompt);
    rl.readline()
}

/// Read a password after showing `prompt`.
pub fn password(prompt: &str) -> ReadlineResult<String> {
    instance()?.read_password(prompt)
}

/// Record a line in the shared history.
pub fn add_history(line: &str) -> ReadlineResult<()> {
    instance()?.save_history(line)
}

/// Switch the shared history to another file, or to memory-only with `None`.
pub fn set_history_path(path: Option<&Path>) -> ReadlineResult<()> {
    instance()?.set_history_path(path)
}

/// Replace the completer of the shared instance.
pub fn set_auto_complete(completer: Option<Box<dyn AutoCompleter>>) -> ReadlineResult<()> {
    instance()?.set_auto_complete(completer);
    Ok(())
}

/// Writer for program output that keeps the edited line intact.
pub fn stdout() -> ReadlineResult<BackgroundWriter> {
    Ok(instance()?.stdout())
}

/// Close the shared instance and restore the terminal. A later call to
/// [`line`] creates a fresh one.
pub fn close() -> ReadlineResult<()> {
    let rl = STD.lock().map_err(|_| ReadlineError::Closed)?.take();
    match rl {
        Some(rl) => rl.close(),
        None => Ok(()),
    }
}
