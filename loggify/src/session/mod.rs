pub mod scoped;
