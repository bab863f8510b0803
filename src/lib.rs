//! Employee Directory Service Library
//!
//! Employee records kept in a document store partitioned by department,
//! exposed over HTTP.

pub mod config;
pub mod core;
pub mod middleware;
pub mod modules;
pub mod store;

// Re-export commonly used types
pub use modules::employees;
pub use modules::health;
