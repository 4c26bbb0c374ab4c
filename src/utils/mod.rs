//! Utility modules: logging and on-disk persistence.

pub mod logging;
pub mod persistence;
