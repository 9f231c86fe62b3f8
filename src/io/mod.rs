//! File access and hashing.

mod digest;
mod file_cache;

pub use digest::hexdigest_str;
pub use file_cache::{FileCache, RealFileCache, VirtualFS};
