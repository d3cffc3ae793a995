use std::{fs, io, path::Path, time::Duration};

use serde::Deserialize;
use thiserror::Error;

/// Which Votifier exchange to run against a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VotifierHandshake {
    /// Challenge, `ok`, ciphertext, `ok`.
    #[default]
    ChallengeAck,
    /// Ciphertext straight after connecting, then a single acknowledgment.
    Direct,
}

/// Tunables shared by the status and vote clients.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub status_timeout_ms: u64,
    pub vote_timeout_ms: u64,
    pub protocol_version: u32,
    /// Largest status frame accepted before the connection is abandoned.
    pub max_status_length: usize,
    pub max_ack_length: usize,
    pub votifier_handshake: VotifierHandshake,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            status_timeout_ms: 5_000,
            vote_timeout_ms: 10_000,
            protocol_version: 0,
            max_status_length: 2 * 1024 * 1024,
            max_ack_length: 1024,
            votifier_handshake: VotifierHandshake::ChallengeAck,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file")]
    Io(#[from] io::Error),

    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ClientConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    pub fn status_timeout(&self) -> Duration {
        Duration::from_millis(self.status_timeout_ms)
    }

    pub fn vote_timeout(&self) -> Duration {
        Duration::from_millis(self.vote_timeout_ms)
    }
}
