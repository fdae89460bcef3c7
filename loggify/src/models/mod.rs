pub mod config;
pub mod diagnostics;
pub mod error;
pub mod error_info;
pub mod state;
