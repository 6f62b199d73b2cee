pub mod engine;
pub mod file;
pub mod format;
pub mod memory;
