pub mod file_sink;
pub mod format;
pub mod registry;
