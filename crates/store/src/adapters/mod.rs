// adapters/mod.rs

pub mod collection;
pub mod global;
pub mod in_memory;
pub mod native;
pub mod static_unix;
pub mod system;
pub mod test_roots;
