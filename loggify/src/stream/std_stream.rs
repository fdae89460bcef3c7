use std::io::{self, IsTerminal, Write};

use crate::traits::output_stream::OutputStream;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdKind {
    Stdout,
    Stderr,
}

/// Pass-through `OutputStream` over the real process stdout or stderr.
#[derive(Debug)]
pub struct StdStream {
    kind: StdKind,
}

impl StdStream {
    pub fn stdout() -> Self {
        Self { kind: StdKind::Stdout }
    }

    pub fn stderr() -> Self {
        Self { kind: StdKind::Stderr }
    }

    pub fn kind(&self) -> StdKind {
        self.kind
    }
}

impl OutputStream for StdStream {
    fn write_str(&self, data: &str) -> io::Result<()> {
        self.write_bytes(data.as_bytes())
    }

    fn write_bytes(&self, data: &[u8]) -> io::Result<()> {
        match self.kind {
            StdKind::Stdout => io::stdout().lock().write_all(data),
            StdKind::Stderr => io::stderr().lock().write_all(data),
        }
    }

    fn flush(&self) -> io::Result<()> {
        match self.kind {
            StdKind::Stdout => io::stdout().lock().flush(),
            StdKind::Stderr => io::stderr().lock().flush(),
        }
    }

    fn isatty(&self) -> bool {
        match self.kind {
            StdKind::Stdout => io::stdout().is_terminal(),
            StdKind::Stderr => io::stderr().is_terminal(),
        }
    }

    #[cfg(unix)]
    fn fileno(&self) -> io::Result<i32> {
        use std::os::fd::AsRawFd;
        Ok(match self.kind {
            StdKind::Stdout => io::stdout().as_raw_fd(),
            StdKind::Stderr => io::stderr().as_raw_fd(),
        })
    }

    // CRT descriptor numbers for the standard streams.
    #[cfg(not(unix))]
    fn fileno(&self) -> io::Result<i32> {
        Ok(match self.kind {
            StdKind::Stdout => 1,
            StdKind::Stderr => 2,
        })
    }
}
