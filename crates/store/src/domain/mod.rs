pub mod error;
pub mod trust_store;
pub mod types;
