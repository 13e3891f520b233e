// Platform-specific code module

pub mod sound;
pub mod terminal;

// Re-exports for cleaner imports
pub use sound::ProcessSink;
pub use terminal::{stdin_is_interactive, KeyboardInput};
