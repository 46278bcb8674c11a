//! Fire-and-forget playback of reply audio.

use std::process::Stdio;

use log::{debug, warn};
use tokio::process::Command;

use crate::transcript::ChatMessage;

pub trait AudioPlayer: Send + Sync {
    /// Start playback of `url` for an already rendered `reply` without waiting for it to finish.
    /// Failures are logged, never returned.
    fn play(&self, url: &str, reply: &ChatMessage);
}

/// Plays audio by handing the URL to an external player process
#[derive(Debug, Clone)]
pub struct CommandPlayer {
    program: String,
    args: Vec<String>,
}

impl CommandPlayer {
    /// Build from a command line such as `["mpv", "--no-video"]`; the URL is appended last
    pub fn from_command(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl AudioPlayer for CommandPlayer {
    fn play(&self, url: &str, reply: &ChatMessage) {
        let spawned = Command::new(&self.program)
            .args(&self.args)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            Ok(mut child) => {
                debug!("Started {} for {} (reply to {})", self.program, url, reply.exchange);
                let program = self.program.clone();
                tokio::spawn(async move {
                    match child.wait().await {
                        Ok(status) if !status.success() => warn!("{} exited with {}", program, status),
                        Err(e) => warn!("Failed waiting on {}: {}", program, e),
                        _ => {}
                    }
                });
            }
            Err(e) => warn!("Could not start audio player {}: {}", self.program, e),
        }
    }
}

/// Used when audio is turned off
#[derive(Debug, Clone, Default)]
pub struct SilentPlayer;

impl AudioPlayer for SilentPlayer {
    fn play(&self, url: &str, reply: &ChatMessage) {
        debug!("Audio disabled, skipping {} for {}", url, reply.exchange);
    }
}
