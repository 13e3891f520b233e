// Single-key keyboard input without waiting for Enter

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::tty::IsTty;
use std::io;
use std::time::Duration;

use crate::core::input::{InputSource, INTERRUPT_KEY};

/// Whether stdin is attached to a terminal
pub fn stdin_is_interactive() -> bool {
    io::stdin().is_tty()
}

/// Character for a crossterm key press. Raw mode reports Ctrl+C as a key, so
/// it maps to [`INTERRUPT_KEY`].
#[cfg_attr(unix, allow(dead_code))]
fn key_char(key: &KeyEvent) -> Option<char> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('c') | KeyCode::Char('C')
            if key.modifiers.contains(KeyModifiers::CONTROL) =>
        {
            Some(INTERRUPT_KEY)
        }
        KeyCode::Char(c) => Some(c),
        _ => None,
    }
}

/// Keyboard reader.
///
/// On Unix the terminal is switched to cbreak mode (no line buffering, no
/// echo) while output processing stays untouched, so regular `println!`
/// output keeps working. The previous mode is restored on drop.
#[cfg(unix)]
pub struct KeyboardInput {
    original: libc::termios,
}

#[cfg(unix)]
impl KeyboardInput {
    pub fn new() -> io::Result<Self> {
        let fd = libc::STDIN_FILENO;
        // SAFETY: termios is plain old data and fully written by tcgetattr
        let mut term: libc::termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(fd, &mut term) } != 0 {
            return Err(io::Error::last_os_error());
        }
        let original = term;

        term.c_lflag &= !(libc::ICANON | libc::ECHO);
        term.c_cc[libc::VMIN] = 1;
        term.c_cc[libc::VTIME] = 0;
        if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &term) } != 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(Self { original })
    }
}

#[cfg(unix)]
impl InputSource for KeyboardInput {
    fn next_key(&mut self, timeout: Duration) -> io::Result<Option<char>> {
        let fd = libc::STDIN_FILENO;
        let mut pollfd = libc::pollfd {
            fd,
            events: libc::POLLIN,
            revents: 0,
        };
        let timeout_ms = timeout.as_millis().min(libc::c_int::MAX as u128) as libc::c_int;

        let ready = unsafe { libc::poll(&mut pollfd, 1, timeout_ms) };
        if ready < 0 {
            return Err(io::Error::last_os_error());
        }
        if ready == 0 {
            return Ok(None);
        }

        let mut byte = [0u8; 1];
        let read = unsafe { libc::read(fd, byte.as_mut_ptr().cast(), 1) };
        match read {
            n if n < 0 => Err(io::Error::last_os_error()),
            0 => Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed")),
            _ => Ok(Some(byte[0] as char)),
        }
    }
}

#[cfg(unix)]
impl Drop for KeyboardInput {
    fn drop(&mut self) {
        unsafe {
            libc::tcsetattr(libc::STDIN_FILENO, libc::TCSADRAIN, &self.original);
        }
    }
}

#[cfg(not(unix))]
pub struct KeyboardInput {
    _private: (),
}

#[cfg(not(unix))]
impl KeyboardInput {
    pub fn new() -> io::Result<Self> {
        crossterm::terminal::enable_raw_mode()?;
        Ok(Self { _private: () })
    }
}

#[cfg(not(unix))]
impl InputSource for KeyboardInput {
    fn next_key(&mut self, timeout: Duration) -> io::Result<Option<char>> {
        use crossterm::event::{self, Event};

        if !event::poll(timeout)? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key) => Ok(key_char(&key)),
            _ => Ok(None),
        }
    }
}

#[cfg(not(unix))]
impl Drop for KeyboardInput {
    fn drop(&mut self) {
        let _ = crossterm::terminal::disable_raw_mode();
    }
}
