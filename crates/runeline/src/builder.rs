//! Fluent construction of [`Readline`] instances.

use crate::error::ReadlineResult;
use crate::instance::Readline;
use crate::terminal::Terminal;
use runeline_core::{
    AutoCompleter, Config, ConsoleInput, ConsoleOutput, Operation, WriterOutput,
};
use std::path::PathBuf;
use std::time::Duration;

/// How long a lone ESC waits for the rest of an escape sequence
pub const DEFAULT_ESCAPE_TIMEOUT: Duration = Duration::from_millis(50);

/// Builder for [`Readline`].
///
/// Console streams are explicit configuration: anything not supplied falls
/// back to the process terminal when [`build`](ReadlineBuilder::build) runs.
pub struct ReadlineBuilder {
    config: Config,
    input: Option<Box<dyn ConsoleInput>>,
    output: Option<Box<dyn ConsoleOutput>>,
    error_output: Option<Box<dyn ConsoleOutput>>,
    escape_timeout: Duration,
}

impl ReadlineBuilder {
    /// Create a builder with default settings
    ///
    /// Default settings:
    /// - Prompt: "> "
    /// - Memory-only history of 500 entries
    /// - No completer, vi mode off
    ///
    /// # Examples
    ///
    /// ```
    /// use runeline::ReadlineBuilder;
    ///
    /// let builder = ReadlineBuilder::new().with_prompt("sql> ");
    /// assert_eq!(builder.config().prompt, "sql> ");
    /// ```
    pub fn new() -> Self {
        Self::from_config(Config::default())
    }

    pub fn from_config(config: Config) -> Self {
        Self {
            config,
            input: None,
            output: None,
            error_output: None,
            escape_timeout: DEFAULT_ESCAPE_TIMEOUT,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Set the prompt; it may contain SGR color sequences.
    pub fn with_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.config.prompt = prompt.into();
        self
    }

    /// Persist history in `path`, loading existing entries.
    pub fn with_history_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config.history_file = Some(path.into());
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.config.history_limit = limit;
        self
    }

    pub fn with_disable_auto_save_history(mut self, disable: bool) -> Self {
        self.config.disable_auto_save_history = disable;
        self
    }

    pub fn with_history_search_fold(mut self, fold: bool) -> Self {
        self.config.history_search_fold = fold;
        self
    }

    /// Set a completer using any type that implements `AutoCompleter`
    ///
    /// This includes `PrefixCompleter` and closures with the signature
    /// `Fn(&[char], usize) -> CompletionResult<Candidates>`.
    ///
    /// # Examples
    ///
    /// ```
    /// use runeline::ReadlineBuilder;
    /// use runeline_core::PrefixCompleter;
    ///
    /// let builder = ReadlineBuilder::new().with_auto_complete(PrefixCompleter::new(vec![
    ///     PrefixCompleter::leaf("help"),
    ///     PrefixCompleter::leaf("quit"),
    /// ]));
    /// assert!(builder.config().auto_complete.is_some());
    /// ```
    pub fn with_auto_complete<C>(mut self, completer: C) -> Self
    where
        C: AutoCompleter + 'static,
    {
        self.config.auto_complete = Some(Box::new(completer));
        self
    }

    pub fn with_vim_mode(mut self, on: bool) -> Self {
        self.config.vim_mode = on;
        self
    }

    /// Echo `mask` for each rune of a password instead of nothing.
    pub fn with_mask_rune(mut self, mask: char) -> Self {
        self.config.mask_rune = Some(mask);
        self
    }

    /// Force line rendering on or off. Off by default when stdio is not a
    /// terminal.
    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.config.interactive = interactive;
        self
    }

    /// Set the console input implementation
    pub fn with_input<I: ConsoleInput + 'static>(mut self, input: I) -> Self {
        self.input = Some(Box::new(input));
        self
    }

    /// Set the console output implementation
    pub fn with_output<O: ConsoleOutput + 'static>(mut self, output: O) -> Self {
        self.output = Some(Box::new(output));
        self
    }

    /// Set the sink used by [`Readline::stderr`]
    pub fn with_error_output<O: ConsoleOutput + 'static>(mut self, output: O) -> Self {
        self.error_output = Some(Box::new(output));
        self
    }

    pub fn with_escape_timeout(mut self, timeout: Duration) -> Self {
        self.escape_timeout = timeout;
        self
    }

    /// Build the configured instance and start its threads
    ///
    /// # Errors
    ///
    /// Returns an error if the default console cannot be created or a
    /// thread cannot be spawned. A history file that cannot be opened only
    /// logs a warning.
    pub fn build(self) -> ReadlineResult<Readline> {
        let mut config = self.config;
        let input = match self.input {
            Some(input) => input,
            None => {
                config.interactive = config.interactive && runeline_io::is_interactive();
                runeline_io::create_console_input()?
            }
        };
        let output = match self.output {
            Some(output) => output,
            None => runeline_io::create_console_output()?,
        };
        let error_output = match self.error_output {
            Some(output) => output,
            None => runeline_io::create_error_output()
                .unwrap_or_else(|_| -> Box<dyn ConsoleOutput> {
                    Box::new(WriterOutput::new(std::io::stderr()))
                }),
        };

        let raw_mode = if config.interactive {
            match input.enable_raw_mode() {
                Ok(guard) => Some(guard),
                Err(err) => {
                    log::warn!("raw mode unavailable, rendering disabled: {err}");
                    config.interactive = false;
                    None
                }
            }
        } else {
            None
        };

        let size = input.get_window_size().ok();
        let escape_timeout = self.escape_timeout;
        let mut op = Operation::new(config, output, error_output);
        if let Some((cols, rows)) = size {
            op.on_resize(cols as usize, rows as usize);
        }

        Readline::start(
            op,
            move |messages| Terminal::spawn(input, messages, escape_timeout, size),
            raw_mode,
        )
    }
}

impl Default for ReadlineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ReadlineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadlineBuilder")
            .field("config", &self.config)
            .field("escape_timeout", &self.escape_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_settings() {
        let builder = ReadlineBuilder::new()
            .with_prompt(">> ")
            .with_history_file("/tmp/history")
            .with_history_limit(10)
            .with_vim_mode(true)
            .with_mask_rune('*')
            .with_escape_timeout(Duration::from_millis(5));
        let config = builder.config();
        assert_eq!(config.prompt, ">> ");
        assert_eq!(config.history_file, Some(PathBuf::from("/tmp/history")));
        assert_eq!(config.history_limit, 10);
        assert!(config.vim_mode);
        assert_eq!(config.mask_rune, Some('*'));
        assert_eq!(builder.escape_timeout, Duration::from_millis(5));
    }
}
