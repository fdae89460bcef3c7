use std::any::Any;
use std::error::Error;
use std::fmt::Write as _;

/// Descriptor of the error that terminated a protected region.
///
/// `trace` is what gets written to the error sink, one record per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub kind: String,
    pub message: String,
    pub trace: String,
}

impl ErrorInfo {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        let kind = kind.into();
        let message = message.into();
        let trace = format!("{}: {}\n", kind, message);
        Self { kind, message, trace }
    }

    /// Builds the descriptor from an error value, walking its `source()` chain.
    pub fn from_error<E: Error + ?Sized>(error: &E) -> Self {
        let kind = std::any::type_name::<E>().to_string();
        let message = error.to_string();

        let mut trace = format!("{}: {}\n", kind, message);
        let mut source = error.source();
        if source.is_some() {
            trace.push_str("Caused by:\n");
        }
        let mut depth = 0;
        while let Some(cause) = source {
            let _ = writeln!(trace, "    {}: {}", depth, cause);
            depth += 1;
            source = cause.source();
        }

        Self { kind, message, trace }
    }

    /// Builds the descriptor from a payload returned by `catch_unwind`.
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Box<dyn Any>".to_string()
        };
        Self::new("panic", message)
    }
}
