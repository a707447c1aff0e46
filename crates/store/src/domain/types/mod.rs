// Re-export all types so callers can use `domain::types::*`
// while the code stays organized by concern.

pub use self::core::*;
pub use config::*;
pub use report::*;

// Module declarations
mod core;
mod config;
mod report;
