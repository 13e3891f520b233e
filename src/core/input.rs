//! Interactive single-key commands.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::alert::{AlertController, Sink};
use crate::ui::console;

/// Upper bound for a single key read
pub const READ_TIMEOUT: Duration = Duration::from_millis(100);
/// Pause after a failed read before trying again
const RETRY_PAUSE: Duration = Duration::from_millis(100);

/// Ctrl+C delivered as a key (ETX) rather than a signal, as in raw mode
pub const INTERRUPT_KEY: char = '\u{3}';

/// A source of key presses, read one at a time with a bounded wait
pub trait InputSource {
    /// Wait up to `timeout` for a key. `Ok(None)` means nothing was pressed.
    fn next_key(&mut self, timeout: Duration) -> io::Result<Option<char>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputCommand {
    /// Silence the running alarm
    Acknowledge,
    /// Stop the monitor
    Quit,
}

impl InputCommand {
    pub fn from_key(key: char) -> Option<Self> {
        match key.to_ascii_lowercase() {
            'a' => Some(InputCommand::Acknowledge),
            'q' | INTERRUPT_KEY => Some(InputCommand::Quit),
            _ => None,
        }
    }
}

/// Feeds key commands to the alert controller until shutdown is requested
pub struct InputListener<S: Sink> {
    controller: Arc<AlertController<S>>,
    shutdown: Arc<AtomicBool>,
}

impl<S: Sink> InputListener<S> {
    pub fn new(controller: Arc<AlertController<S>>, shutdown: Arc<AtomicBool>) -> Self {
        Self {
            controller,
            shutdown,
        }
    }

    /// Read and apply commands until the shutdown flag is set.
    /// Read errors never end the loop.
    pub fn run<I: InputSource>(&self, source: &mut I) {
        while !self.shutdown.load(Ordering::SeqCst) {
            match source.next_key(READ_TIMEOUT) {
                Ok(Some(key)) => {
                    self.handle_key(key);
                }
                Ok(None) => {}
                Err(e) => {
                    log::debug!("Keyboard read failed: {}", e);
                    thread::sleep(RETRY_PAUSE);
                }
            }
        }
    }

    pub fn handle_key(&self, key: char) -> Option<InputCommand> {
        let command = InputCommand::from_key(key)?;
        match command {
            InputCommand::Acknowledge => {
                if self.controller.acknowledge() {
                    log::info!("Alarm acknowledged by user");
                }
            }
            InputCommand::Quit => {
                self.shutdown.store(true, Ordering::SeqCst);
                self.controller.acknowledge();
                console::shutting_down();
            }
        }
        Some(command)
    }
}
