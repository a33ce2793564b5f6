//! Utility modules shared by the config and template layers.

pub mod date;
pub mod path;
