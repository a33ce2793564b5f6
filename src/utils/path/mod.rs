//! Path utilities.
//!
//! Pure functions for path manipulation. No side effects.
//!
//! - [`fs`]: Filesystem path normalization (`normalize_path`)
//! - [`name`]: Logical template names (`normalize_name`, `logical_name`)

pub mod fs;
pub mod name;

pub use fs::normalize_path;
pub use name::{logical_name, normalize_name};
