// quakewatch library - public API

// Re-export error types
pub mod error;
pub use error::{QuakeError, Result};

// Module declarations
pub mod commands;
pub mod core;
pub mod logging;
pub mod platform;
pub mod ui;

// Re-export commonly used types
pub use crate::core::config::Config;
