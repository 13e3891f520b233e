// Alarm playback through an external audio player

use std::io;
use std::path::Path;
use std::process::{Child, Command, Stdio};

use crate::core::alert::Sink;
use crate::error::{QuakeError, Result};

/// A player invocation: program name plus arguments, with the sound file last
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerCommand {
    pub program: &'static str,
    pub args: Vec<String>,
}

/// Players to try, in order of preference
#[cfg(not(windows))]
pub fn player_candidates(sound: &Path) -> Vec<PlayerCommand> {
    let file = sound.to_string_lossy().to_string();
    vec![
        PlayerCommand {
            program: "mpg123",
            args: vec!["-q".into(), "--loop".into(), "-1".into(), file.clone()],
        },
        PlayerCommand {
            program: "mplayer",
            args: vec!["-really-quiet".into(), "-loop".into(), "0".into(), file.clone()],
        },
        // macOS; plays once
        PlayerCommand {
            program: "afplay",
            args: vec![file],
        },
    ]
}

#[cfg(windows)]
pub fn player_candidates(sound: &Path) -> Vec<PlayerCommand> {
    let file = sound.to_string_lossy().replace('\'', "''");
    let script = format!(
        "Add-Type -AssemblyName PresentationCore; \
         $p = New-Object System.Windows.Media.MediaPlayer; \
         $p.Open([Uri]'{}'); \
         while ($true) {{ $p.Position = [TimeSpan]::Zero; $p.Play(); Start-Sleep -Seconds 1; \
         while ($p.NaturalDuration.HasTimeSpan -and $p.Position -lt $p.NaturalDuration.TimeSpan) {{ Start-Sleep -Milliseconds 200 }} }}",
        file
    );
    vec![PlayerCommand {
        program: "powershell",
        args: vec![
            "-NoProfile".into(),
            "-NonInteractive".into(),
            "-Command".into(),
            script,
        ],
    }]
}

/// Plays the alarm by spawning the first available system audio player
#[derive(Debug, Default)]
pub struct ProcessSink;

impl ProcessSink {
    pub fn new() -> Self {
        ProcessSink
    }

    fn spawn(candidate: &PlayerCommand) -> io::Result<Child> {
        let program = which::which(candidate.program)
            .map_err(|e| io::Error::new(io::ErrorKind::NotFound, e.to_string()))?;

        Command::new(program)
            .args(&candidate.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
    }
}

impl Sink for ProcessSink {
    type Handle = Child;

    fn start(&self, sound: &Path) -> Result<Child> {
        if !sound.is_file() {
            return Err(QuakeError::sink_start(format!(
                "alarm sound not found: {}",
                sound.display()
            )));
        }

        let candidates = player_candidates(sound);
        for candidate in &candidates {
            match Self::spawn(candidate) {
                Ok(child) => {
                    log::debug!("Alarm playing with {} (pid {})", candidate.program, child.id());
                    return Ok(child);
                }
                Err(e) => log::debug!("Audio player {} unavailable: {}", candidate.program, e),
            }
        }

        let tried: Vec<&str> = candidates.iter().map(|c| c.program).collect();
        Err(QuakeError::sink_start(format!(
            "no audio player found (tried {})",
            tried.join(", ")
        )))
    }

    fn stop(&self, mut child: Child) -> Result<()> {
        match child.kill() {
            Ok(()) => {}
            // Already exited
            Err(e) if e.kind() == io::ErrorKind::InvalidInput => {}
            Err(e) => return Err(QuakeError::sink_stop(e.to_string())),
        }
        child
            .wait()
            .map_err(|e| QuakeError::sink_stop(e.to_string()))?;
        Ok(())
    }
}
