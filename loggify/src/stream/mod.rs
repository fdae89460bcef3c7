pub mod adapter;
pub mod console;
pub mod std_stream;
