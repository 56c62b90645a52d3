use runeline_core::{ConsoleError, HistoryError};
use std::io;
use thiserror::Error;

/// Errors returned by [`Readline`](crate::Readline) operations.
///
/// `Interrupt` and `Eof` are sentinels rather than faults: the user pressed
/// Ctrl-C, or input ended (Ctrl-D on an empty line, closed stream, or the
/// instance was closed while a read was pending).
#[derive(Debug, Error)]
pub enum ReadlineError {
    /// Ctrl-C with nothing to cancel
    #[error("Interrupt")]
    Interrupt,

    /// End of input
    #[error("EOF")]
    Eof,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Console(#[from] ConsoleError),

    #[error(transparent)]
    History(#[from] HistoryError),

    /// The instance was closed
    #[error("readline instance closed")]
    Closed,
}

/// Result type for readline operations
pub type ReadlineResult<T> = Result<T, ReadlineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels_display() {
        assert_eq!(ReadlineError::Interrupt.to_string(), "Interrupt");
        assert_eq!(ReadlineError::Eof.to_string(), "EOF");
    }

    #[test]
    fn test_from_console_error() {
        let err: ReadlineError = ConsoleError::TerminalError("no tty".to_string()).into();
        assert!(matches!(err, ReadlineError::Console(_)));
        assert_eq!(err.to_string(), "Terminal error: no tty");
    }
}
