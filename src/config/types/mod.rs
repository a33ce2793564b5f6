//! Utility types shared by config sections.

mod error;

pub use error::ConfigError;
