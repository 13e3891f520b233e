use std::io;
use thiserror::Error;

/// Custom error type for quakewatch
#[derive(Error, Debug)]
pub enum QuakeError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Network failure, timeout, non-2xx status or unparseable feed body.
    /// Always transient: the next poll cycle retries.
    #[error("Feed error: {0}")]
    Fetch(String),

    #[error("Could not start alarm: {0}")]
    SinkStart(String),

    #[error("Could not stop alarm: {0}")]
    SinkStop(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for quakewatch
pub type Result<T> = std::result::Result<T, QuakeError>;

impl QuakeError {
    /// Create a feed error
    pub fn fetch<S: Into<String>>(msg: S) -> Self {
        QuakeError::Fetch(msg.into())
    }

    /// Create a sink start error
    pub fn sink_start<S: Into<String>>(msg: S) -> Self {
        QuakeError::SinkStart(msg.into())
    }

    pub fn sink_stop<S: Into<String>>(msg: S) -> Self {
        QuakeError::SinkStop(msg.into())
    }

    pub fn persistence<S: Into<String>>(msg: S) -> Self {
        QuakeError::Persistence(msg.into())
    }

    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        QuakeError::Config(msg.into())
    }

    /// Whether the poll loop should simply retry on its next cycle
    pub fn is_transient(&self) -> bool {
        matches!(self, QuakeError::Fetch(_))
    }
}

impl From<reqwest::Error> for QuakeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            QuakeError::Fetch(format!("request timed out: {}", err))
        } else {
            QuakeError::Fetch(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_fetch_errors_are_transient() {
        assert!(QuakeError::fetch("timeout").is_transient());
        assert!(!QuakeError::sink_start("no player").is_transient());
        assert!(!QuakeError::config("bad latitude").is_transient());
    }

    #[test]
    fn test_display_includes_context() {
        let err = QuakeError::sink_start("alarm.mp3 not found");
        assert_eq!(err.to_string(), "Could not start alarm: alarm.mp3 not found");
    }
}
