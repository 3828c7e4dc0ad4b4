use thiserror::Error;

use crate::types::ModeKind;

#[derive(Debug, Error)]
pub enum KarisError {
    #[error("{command} rejected while {mode}: {reason}")]
    PreconditionViolated {
        command: &'static str,
        mode: ModeKind,
        reason: String,
    },

    #[error("unknown mode '{0}', agent must be terminated")]
    InvalidMode(String),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl KarisError {
    pub fn precondition(command: &'static str, mode: ModeKind, reason: impl Into<String>) -> Self {
        KarisError::PreconditionViolated {
            command,
            mode,
            reason: reason.into(),
        }
    }

    /// Fatal errors mean the simulated agent can no longer be trusted and the
    /// process should stop it.
    pub fn is_fatal(&self) -> bool {
        matches!(self, KarisError::InvalidMode(_) | KarisError::Config(_))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, KarisError>;
