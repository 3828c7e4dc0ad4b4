pub mod messages;
pub mod snapshot;

pub use messages::{InboundCommand, NavigationCode, OutboundMessage};
pub use snapshot::AgentSnapshot;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::KarisError;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Which "arrived" flag justified entering a fine-positioning episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReachedGoal {
    Primary,
    Secondary,
}

/// Current behaviour of the agent. Episode counters live on the variants that
/// use them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Mode {
    Waiting,
    Driving,
    FinePositioning {
        ticks: u32,
        deadline: u32,
        basis: ReachedGoal,
    },
    LiftOperating {
        ticks: u32,
    },
}

impl Mode {
    pub fn kind(&self) -> ModeKind {
        match self {
            Mode::Waiting => ModeKind::Waiting,
            Mode::Driving => ModeKind::Driving,
            Mode::FinePositioning { .. } => ModeKind::FinePositioning,
            Mode::LiftOperating { .. } => ModeKind::LiftOperating,
        }
    }

    /// Ticks spent in the current fine-positioning or lift episode.
    pub fn episode_ticks(&self) -> Option<u32> {
        match self {
            Mode::FinePositioning { ticks, .. } | Mode::LiftOperating { ticks } => Some(*ticks),
            _ => None,
        }
    }
}

/// Payload-free label of a [`Mode`], used on the wire and in config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeKind {
    Waiting,
    Driving,
    FinePositioning,
    LiftOperating,
}

impl ModeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModeKind::Waiting => "waiting",
            ModeKind::Driving => "driving",
            ModeKind::FinePositioning => "fine_positioning",
            ModeKind::LiftOperating => "lift_operating",
        }
    }
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModeKind {
    type Err = KarisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "waiting" => Ok(ModeKind::Waiting),
            "driving" => Ok(ModeKind::Driving),
            "fine_positioning" | "feinpos" => Ok(ModeKind::FinePositioning),
            "lift_operating" | "hub" => Ok(ModeKind::LiftOperating),
            _ => Err(KarisError::InvalidMode(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_kind_round_trips_through_labels() {
        for kind in [
            ModeKind::Waiting,
            ModeKind::Driving,
            ModeKind::FinePositioning,
            ModeKind::LiftOperating,
        ] {
            assert_eq!(kind.as_str().parse::<ModeKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_legacy_labels_accepted() {
        assert_eq!("feinpos".parse::<ModeKind>().unwrap(), ModeKind::FinePositioning);
        assert_eq!("hub".parse::<ModeKind>().unwrap(), ModeKind::LiftOperating);
    }

    #[test]
    fn test_unknown_label_is_invalid_mode() {
        let err = "charging".parse::<ModeKind>().unwrap_err();
        assert!(matches!(err, KarisError::InvalidMode(label) if label == "charging"));
    }

    #[test]
    fn test_episode_ticks_only_for_episodes() {
        assert_eq!(Mode::Waiting.episode_ticks(), None);
        assert_eq!(Mode::Driving.episode_ticks(), None);
        assert_eq!(Mode::LiftOperating { ticks: 7 }.episode_ticks(), Some(7));
        let fine = Mode::FinePositioning {
            ticks: 3,
            deadline: 10,
            basis: ReachedGoal::Primary,
        };
        assert_eq!(fine.episode_ticks(), Some(3));
        assert_eq!(fine.kind(), ModeKind::FinePositioning);
    }
}
