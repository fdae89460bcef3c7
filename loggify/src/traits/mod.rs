pub mod output_stream;
