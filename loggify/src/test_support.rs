//! Shared fixtures for unit tests.

use std::io;

use parking_lot::Mutex;

use crate::traits::output_stream::OutputStream;

/// Serialises tests that rebind the process-wide stdout/stderr slots.
pub(crate) static SLOT_LOCK: Mutex<()> = Mutex::new(());

/// In-memory `OutputStream` recording everything written to it.
#[derive(Debug, Default)]
pub(crate) struct MemoryStream {
    written: Mutex<String>,
    flushes: Mutex<u32>,
    tty: bool,
    fileno: Option<i32>,
    broken: bool,
}

impl MemoryStream {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn terminal(fileno: i32) -> Self {
        Self {
            tty: true,
            fileno: Some(fileno),
            ..Default::default()
        }
    }

    /// A stream whose every operation fails, like a closed handle.
    pub(crate) fn broken() -> Self {
        Self {
            broken: true,
            ..Default::default()
        }
    }

    pub(crate) fn contents(&self) -> String {
        self.written.lock().clone()
    }

    pub(crate) fn flushes(&self) -> u32 {
        *self.flushes.lock()
    }

    fn check(&self) -> io::Result<()> {
        if self.broken {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "stream closed"));
        }
        Ok(())
    }
}

impl OutputStream for MemoryStream {
    fn write_str(&self, data: &str) -> io::Result<()> {
        self.check()?;
        self.written.lock().push_str(data);
        Ok(())
    }

    fn write_bytes(&self, data: &[u8]) -> io::Result<()> {
        self.check()?;
        self.written.lock().push_str(&String::from_utf8_lossy(data));
        Ok(())
    }

    fn flush(&self) -> io::Result<()> {
        self.check()?;
        *self.flushes.lock() += 1;
        Ok(())
    }

    fn isatty(&self) -> bool {
        self.tty
    }

    fn fileno(&self) -> io::Result<i32> {
        self.check()?;
        match self.fileno {
            Some(fd) => Ok(fd),
            None => Err(io::Error::new(io::ErrorKind::Unsupported, "no descriptor")),
        }
    }
}
