//! Logging setup for the satpop tools
//!
//! This module provides:
//! - Custom log formatting with bracketed output
//! - Dual logging (file + stderr)
//! - Log file management with timestamps

mod formatter;
mod setup;

pub use formatter::BracketedFormatter;
pub use setup::{setup_logging, DEFAULT_FILTER};
