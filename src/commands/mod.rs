// Command handlers module
pub mod check;
pub mod config;
pub mod last;
pub mod run;
pub mod version;

// Re-exports for cleaner imports
pub use check::execute as check;
pub use last::execute as last;
pub use run::execute as run;
pub use version::execute as version;
