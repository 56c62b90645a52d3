//! Terminal backends for runeline.
//!
//! Provides the platform side of console I/O:
//! - `UnixConsoleInput` / `UnixConsoleOutput` (termios raw mode, poll-based stdin)
//! - `MockConsoleInput` for driving a session from tests

// Re-export core types and traits
pub use runeline_core::{ConsoleError, ConsoleInput, ConsoleOutput, ConsoleResult, RawModeGuard};

/// Create both console input and output for the current platform
pub fn create_console_io() -> ConsoleResult<(Box<dyn ConsoleInput>, Box<dyn ConsoleOutput>)> {
    let input = create_console_input()?;
    let output = create_console_output()?;
    Ok((input, output))
}

/// Create console input for the current platform
pub fn create_console_input() -> ConsoleResult<Box<dyn ConsoleInput>> {
    #[cfg(unix)]
    {
        let input = unix::UnixConsoleInput::new()?;
        Ok(Box::new(input))
    }

    #[cfg(not(unix))]
    {
        Err(ConsoleError::UnsupportedFeature(format!(
            "console input on {}",
            std::env::consts::OS
        )))
    }
}

/// Create console output (stdout) for the current platform
pub fn create_console_output() -> ConsoleResult<Box<dyn ConsoleOutput>> {
    #[cfg(unix)]
    {
        let output = unix::UnixConsoleOutput::new()?;
        Ok(Box::new(output))
    }

    #[cfg(not(unix))]
    {
        Err(ConsoleError::UnsupportedFeature(format!(
            "console output on {}",
            std::env::consts::OS
        )))
    }
}

/// Create the stderr sink used for background error writes
pub fn create_error_output() -> ConsoleResult<Box<dyn ConsoleOutput>> {
    #[cfg(unix)]
    {
        let output = unix::UnixConsoleOutput::stderr()?;
        Ok(Box::new(output))
    }

    #[cfg(not(unix))]
    {
        Err(ConsoleError::UnsupportedFeature(format!(
            "console output on {}",
            std::env::consts::OS
        )))
    }
}

/// Whether stdin and stdout are both terminals
pub fn is_interactive() -> bool {
    #[cfg(unix)]
    {
        unix::is_terminal(libc::STDIN_FILENO) && unix::is_terminal(libc::STDOUT_FILENO)
    }

    #[cfg(not(unix))]
    {
        false
    }
}

#[cfg(unix)]
pub mod unix;

pub mod mock;

pub use mock::MockConsoleInput;

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_create_console_io() {
        assert!(create_console_io().is_ok());
        assert!(create_error_output().is_ok());
    }
}
