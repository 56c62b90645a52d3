//! Session configuration shared by the dispatcher and the caller API.

use crate::completion::AutoCompleter;
use crate::history::DEFAULT_HISTORY_LIMIT;
use std::fmt;
use std::path::PathBuf;

/// Settings for one editing session.
///
/// # Examples
///
/// ```
/// use runeline_core::Config;
///
/// let config = Config {
///     prompt: "db> ".to_string(),
///     history_limit: 0,
///     ..Config::default()
/// };
/// assert_eq!(config.effective_history_limit(), 500);
/// assert!(config.interactive);
/// ```
pub struct Config {
    /// Text shown before the editable line; may contain SGR sequences
    pub prompt: String,
    /// Backing file for history; memory-only when `None`
    pub history_file: Option<PathBuf>,
    /// Committed entries kept; 0 selects the default of 500
    pub history_limit: usize,
    /// Skip recording submitted lines
    pub disable_auto_save_history: bool,
    /// Case-insensitive incremental search
    pub history_search_fold: bool,
    /// Provider consulted on Tab
    pub auto_complete: Option<Box<dyn AutoCompleter>>,
    pub vim_mode: bool,
    /// Rune echoed for password input; nothing is echoed when `None`
    pub mask_rune: Option<char>,
    /// Render edits to the output; off when input is not a terminal
    pub interactive: bool,
}

impl Config {
    pub fn effective_history_limit(&self) -> usize {
        if self.history_limit == 0 {
            DEFAULT_HISTORY_LIMIT
        } else {
            self.history_limit
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            prompt: "> ".to_string(),
            history_file: None,
            history_limit: DEFAULT_HISTORY_LIMIT,
            disable_auto_save_history: false,
            history_search_fold: false,
            auto_complete: None,
            vim_mode: false,
            mask_rune: None,
            interactive: true,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("prompt", &self.prompt)
            .field("history_file", &self.history_file)
            .field("history_limit", &self.history_limit)
            .field("disable_auto_save_history", &self.disable_auto_save_history)
            .field("history_search_fold", &self.history_search_fold)
            .field("auto_complete", &self.auto_complete.is_some())
            .field("vim_mode", &self.vim_mode)
            .field("mask_rune", &self.mask_rune)
            .field("interactive", &self.interactive)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.prompt, "> ");
        assert_eq!(config.effective_history_limit(), DEFAULT_HISTORY_LIMIT);
        assert!(config.history_file.is_none());
        assert!(!config.vim_mode);
    }

    #[test]
    fn test_debug_hides_completer() {
        let config = Config {
            auto_complete: Some(Box::new(
                |_: &[char], _: usize| -> crate::error::CompletionResult<crate::completion::Candidates> {
                    Ok(crate::completion::Candidates::default())
                },
            )),
            ..Config::default()
        };
        assert!(format!("{config:?}").contains("auto_complete: true"));
    }
}
