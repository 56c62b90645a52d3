use std::io::{self, Write};
use std::os::unix::io::AsRawFd;
use std::time::Duration;

use crate::{ConsoleError, ConsoleInput, ConsoleOutput, ConsoleResult, RawModeGuard};

/// Whether `fd` refers to a terminal.
pub fn is_terminal(fd: i32) -> bool {
    unsafe { libc::isatty(fd) == 1 }
}

/// Keystroke source reading stdin in raw mode.
pub struct UnixConsoleInput {
    stdin_fd: i32,
}

impl UnixConsoleInput {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            stdin_fd: io::stdin().as_raw_fd(),
        })
    }

    /// Disable canonical mode, echo and signal keys, returning the previous
    /// settings. Output post-processing stays on so `\n` still returns the
    /// carriage.
    fn enter_raw_mode(fd: i32) -> io::Result<libc::termios> {
        let mut original_termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(fd, &mut original_termios) } != 0 {
            return Err(io::Error::last_os_error());
        }
        let mut raw = original_termios;
        raw.c_lflag &= !(libc::ICANON | libc::ECHO | libc::ISIG | libc::IEXTEN);
        raw.c_iflag &= !(libc::IXON | libc::ICRNL | libc::BRKINT | libc::INPCK | libc::ISTRIP);
        raw.c_cflag |= libc::CS8;
        raw.c_cc[libc::VMIN] = 1;
        raw.c_cc[libc::VTIME] = 0;
        if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &raw) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(original_termios)
    }

    fn query_window_size() -> io::Result<(u16, u16)> {
        let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
        if unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) } == -1 {
            return Err(io::Error::last_os_error());
        }
        if ws.ws_col == 0 {
            return Err(io::Error::new(io::ErrorKind::Other, "terminal reported zero width"));
        }
        Ok((ws.ws_col, ws.ws_row))
    }
}

impl ConsoleInput for UnixConsoleInput {
    fn enable_raw_mode(&self) -> ConsoleResult<RawModeGuard> {
        if !is_terminal(self.stdin_fd) {
            return Err(ConsoleError::TerminalError("stdin is not a TTY".to_string()));
        }
        let stdin_fd = self.stdin_fd;
        let original_termios = Self::enter_raw_mode(stdin_fd)?;
        log::debug!("entered raw mode on fd {stdin_fd}");

        let restore_fn = move || {
            unsafe {
                let _ = libc::tcsetattr(stdin_fd, libc::TCSANOW, &original_termios);
            }
        };

        Ok(RawModeGuard::new(restore_fn, "Unix VT".to_string()))
    }

    fn get_window_size(&self) -> ConsoleResult<(u16, u16)> {
        Ok(Self::query_window_size()?)
    }

    fn read_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> ConsoleResult<Option<usize>> {
        let mut poll_fd = libc::pollfd {
            fd: self.stdin_fd,
            events: libc::POLLIN,
            revents: 0,
        };
        let ms = timeout.as_millis().min(i32::MAX as u128) as i32;
        let poll_result = unsafe { libc::poll(&mut poll_fd as *mut libc::pollfd, 1, ms) };
        if poll_result == -1 {
            let error = io::Error::last_os_error();
            if error.kind() == io::ErrorKind::Interrupted {
                return Ok(None);
            }
            return Err(error.into());
        }
        if poll_result == 0 {
            return Ok(None);
        }

        let result = unsafe { libc::read(self.stdin_fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len()) };
        if result == -1 {
            let error = io::Error::last_os_error();
            return match error.kind() {
                io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock => Ok(None),
                _ => Err(error.into()),
            };
        }
        Ok(Some(result as usize))
    }
}

/// Which standard stream an output writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Stdout,
    Stderr,
}

/// ANSI text sink on stdout or stderr.
pub struct UnixConsoleOutput {
    target: Target,
}

impl UnixConsoleOutput {
    pub fn new() -> ConsoleResult<Self> {
        Ok(Self {
            target: Target::Stdout,
        })
    }

    pub fn stderr() -> ConsoleResult<Self> {
        Ok(Self {
            target: Target::Stderr,
        })
    }
}

impl ConsoleOutput for UnixConsoleOutput {
    fn write_text(&mut self, text: &str) -> ConsoleResult<()> {
        match self.target {
            Target::Stdout => io::stdout().lock().write_all(text.as_bytes())?,
            Target::Stderr => io::stderr().lock().write_all(text.as_bytes())?,
        }
        Ok(())
    }

    fn flush(&mut self) -> ConsoleResult<()> {
        match self.target {
            Target::Stdout => io::stdout().flush()?,
            Target::Stderr => io::stderr().flush()?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_input() {
        assert!(UnixConsoleInput::new().is_ok());
    }

    #[test]
    fn test_output_targets() {
        assert_eq!(UnixConsoleOutput::new().unwrap().target, Target::Stdout);
        assert_eq!(UnixConsoleOutput::stderr().unwrap().target, Target::Stderr);
    }

    #[test]
    fn test_raw_mode_requires_tty() {
        let input = UnixConsoleInput::new().unwrap();
        if !is_terminal(input.stdin_fd) {
            assert!(matches!(
                input.enable_raw_mode(),
                Err(ConsoleError::TerminalError(_))
            ));
        }
    }
}
