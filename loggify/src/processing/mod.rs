pub mod line_buffer;
