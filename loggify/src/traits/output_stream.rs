use std::io;

/// Writable text stream that can occupy the process-wide stdout/stderr slot.
///
/// Implemented by `StdStream` (the real process streams) and by
/// `StreamAdapter` (the capturing wrapper). Methods take `&self` so a stream
/// can be shared behind an `Arc`; implementations synchronise internally.
pub trait OutputStream: Send + Sync {
    /// Write a chunk of text.
    fn write_str(&self, data: &str) -> io::Result<()>;

    /// Write raw bytes.
    fn write_bytes(&self, data: &[u8]) -> io::Result<()>;

    fn flush(&self) -> io::Result<()>;

    /// Whether the stream is attached to a terminal. `false` when unknown.
    fn isatty(&self) -> bool {
        false
    }

    /// Underlying file descriptor number.
    fn fileno(&self) -> io::Result<i32> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "stream has no file descriptor",
        ))
    }
}
