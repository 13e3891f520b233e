// UI and formatting module

pub mod console;
pub mod prompts;

// Re-export commonly used items for cleaner imports
pub use prompts::{dimmed, error, info, success, warn};
