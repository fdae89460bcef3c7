//! Process-wide stdout/stderr slots.
//!
//! Anything that should be capturable writes through `stdout()`/`stderr()`,
//! the [`Console`] writer or the `cprint!` family of macros instead of the
//! std streams directly. An unbound slot resolves to the real stream, held
//! in a process-lifetime singleton so identity checks with `Arc::ptr_eq`
//! stay meaningful.
//!
//! Only one capture session should own a slot at a time. Rebinding a slot
//! that is already captured shadows the first capture, and the exits must
//! then happen in reverse order for the saved bindings to come back intact.

use std::fmt;
use std::io;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::stream::std_stream::StdStream;
use crate::traits::output_stream::OutputStream;

type Slot = RwLock<Option<Arc<dyn OutputStream>>>;

static STDOUT_SLOT: Slot = RwLock::new(None);
static STDERR_SLOT: Slot = RwLock::new(None);

static ORIGINAL_STDOUT: OnceLock<Arc<dyn OutputStream>> = OnceLock::new();
static ORIGINAL_STDERR: OnceLock<Arc<dyn OutputStream>> = OnceLock::new();

/// The real process stdout.
pub fn original_stdout() -> Arc<dyn OutputStream> {
    Arc::clone(ORIGINAL_STDOUT.get_or_init(|| Arc::new(StdStream::stdout())))
}

/// The real process stderr.
pub fn original_stderr() -> Arc<dyn OutputStream> {
    Arc::clone(ORIGINAL_STDERR.get_or_init(|| Arc::new(StdStream::stderr())))
}

/// Stream currently bound to the stdout slot.
pub fn stdout() -> Arc<dyn OutputStream> {
    STDOUT_SLOT.read().clone().unwrap_or_else(original_stdout)
}

/// Stream currently bound to the stderr slot.
pub fn stderr() -> Arc<dyn OutputStream> {
    STDERR_SLOT.read().clone().unwrap_or_else(original_stderr)
}

/// Bind `stream` to the stdout slot, returning the previous binding.
pub fn set_stdout(stream: Arc<dyn OutputStream>) -> Arc<dyn OutputStream> {
    STDOUT_SLOT.write().replace(stream).unwrap_or_else(original_stdout)
}

/// Bind `stream` to the stderr slot, returning the previous binding.
pub fn set_stderr(stream: Arc<dyn OutputStream>) -> Arc<dyn OutputStream> {
    STDERR_SLOT.write().replace(stream).unwrap_or_else(original_stderr)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Out,
    Err,
}

/// `io::Write` handle that resolves the slot on every call.
///
/// Valid UTF-8 goes through the text path (and is mirrored by a capturing
/// adapter); invalid input is handed over as raw bytes. A multi-byte
/// character split across two `write` calls is held until its remaining
/// bytes arrive.
#[derive(Debug, Clone)]
pub struct Console {
    target: Target,
    partial: Vec<u8>,
}

impl Console {
    pub fn out() -> Self {
        Self {
            target: Target::Out,
            partial: Vec::new(),
        }
    }

    pub fn err() -> Self {
        Self {
            target: Target::Err,
            partial: Vec::new(),
        }
    }

    fn stream(&self) -> Arc<dyn OutputStream> {
        match self.target {
            Target::Out => stdout(),
            Target::Err => stderr(),
        }
    }

    fn write_joined(&mut self, stream: &dyn OutputStream, bytes: &[u8]) -> io::Result<()> {
        match std::str::from_utf8(bytes) {
            Ok(text) => stream.write_str(text),
            Err(e) if e.error_len().is_none() => {
                let (valid, tail) = bytes.split_at(e.valid_up_to());
                if !valid.is_empty() {
                    let text = std::str::from_utf8(valid).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                    stream.write_str(text)?;
                }
                self.partial = tail.to_vec();
                Ok(())
            }
            Err(_) => stream.write_bytes(bytes),
        }
    }
}

impl io::Write for Console {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let stream = self.stream();
        let held = std::mem::take(&mut self.partial);
        let mut bytes = held.clone();
        bytes.extend_from_slice(buf);

        if let Err(e) = self.write_joined(stream.as_ref(), &bytes) {
            self.partial = held;
            return Err(e);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream().flush()
    }
}

#[doc(hidden)]
pub fn _print(args: fmt::Arguments<'_>) {
    if let Err(e) = stdout().write_str(&fmt::format(args)) {
        panic!("failed printing to stdout: {}", e);
    }
}

#[doc(hidden)]
pub fn _eprint(args: fmt::Arguments<'_>) {
    if let Err(e) = stderr().write_str(&fmt::format(args)) {
        panic!("failed printing to stderr: {}", e);
    }
}

/// Like `print!`, but through the capturable stdout slot.
#[macro_export]
macro_rules! cprint {
    ($($arg:tt)*) => {
        $crate::stream::console::_print(format_args!($($arg)*))
    };
}

/// Like `println!`, but through the capturable stdout slot.
#[macro_export]
macro_rules! cprintln {
    () => {
        $crate::stream::console::_print(format_args!("\n"))
    };
    ($($arg:tt)*) => {
        $crate::stream::console::_print(format_args!("{}\n", format_args!($($arg)*)))
    };
}

/// Like `eprint!`, but through the capturable stderr slot.
#[macro_export]
macro_rules! ceprint {
    ($($arg:tt)*) => {
        $crate::stream::console::_eprint(format_args!($($arg)*))
    };
}

/// Like `eprintln!`, but through the capturable stderr slot.
#[macro_export]
macro_rules! ceprintln {
    () => {
        $crate::stream::console::_eprint(format_args!("\n"))
    };
    ($($arg:tt)*) => {
        $crate::stream::console::_eprint(format_args!("{}\n", format_args!($($arg)*)))
    };
}
