use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ConfigError, KarisError};
use crate::types::{ModeKind, Position};

const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Battery drain per second of loop time, in permille.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrainProfile {
    pub driving: f64,
    pub waiting: f64,
    pub fine_positioning: f64,
    pub lift: f64,
}

impl Default for DrainProfile {
    fn default() -> Self {
        Self {
            driving: 0.5,
            waiting: 0.1,
            fine_positioning: 0.03,
            lift: 0.04,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub loop_frequency_hz: u32,
    pub max_speed: f64,
    pub tolerance: f64,
    pub fine_pos_time_seconds: u32,
    pub fine_pos_jitter_ticks: i32,
    pub lift_time_seconds: u32,
    pub drain: DrainProfile,
    pub initial_mode: String,
    pub initial_goal: Option<Position>,
    pub status_log_interval_ticks: u64,
    pub history_capacity: usize,
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            loop_frequency_hz: 100,
            max_speed: 2.0,
            tolerance: 0.1,
            fine_pos_time_seconds: 30,
            fine_pos_jitter_ticks: 20,
            lift_time_seconds: 10,
            drain: DrainProfile::default(),
            initial_mode: ModeKind::Waiting.as_str().to_string(),
            initial_goal: None,
            status_log_interval_ticks: 100,
            history_capacity: 50,
            seed: None,
        }
    }
}

impl SimConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Applies `KARIS_*` environment overrides on top of the current values.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(raw) = lookup("KARIS_LOOP_FREQUENCY_HZ") {
            self.loop_frequency_hz = parse_override("loop_frequency_hz", &raw)?;
        }
        if let Some(raw) = lookup("KARIS_MAX_SPEED") {
            self.max_speed = parse_override("max_speed", &raw)?;
        }
        if let Some(raw) = lookup("KARIS_SEED") {
            self.seed = Some(parse_override("seed", &raw)?);
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), KarisError> {
        if self.loop_frequency_hz == 0 {
            return Err(invalid("loop_frequency_hz", "must be positive").into());
        }
        if u64::from(self.loop_frequency_hz) > NANOS_PER_SECOND {
            return Err(invalid("loop_frequency_hz", "tick period below 1ns").into());
        }
        if self.fine_pos_time_seconds.checked_mul(self.loop_frequency_hz).is_none() {
            return Err(invalid("fine_pos_time_seconds", "tick count overflows u32").into());
        }
        if self.lift_time_seconds.checked_mul(self.loop_frequency_hz).is_none() {
            return Err(invalid("lift_time_seconds", "tick count overflows u32").into());
        }
        if !(self.max_speed > 0.0) {
            return Err(invalid("max_speed", "must be positive").into());
        }
        if !(self.tolerance >= 0.0) {
            return Err(invalid("tolerance", "must not be negative").into());
        }
        if self.fine_pos_jitter_ticks < 0 {
            return Err(invalid("fine_pos_jitter_ticks", "must not be negative").into());
        }

        match self.initial_mode()? {
            ModeKind::Waiting => {}
            ModeKind::Driving if self.initial_goal.is_some() => {}
            ModeKind::Driving => {
                return Err(invalid("initial_goal", "required when initial_mode is driving").into());
            }
            other => {
                return Err(invalid(
                    "initial_mode",
                    format!("agent cannot start in {}", other),
                )
                .into());
            }
        }
        Ok(())
    }

    /// Fails with `InvalidMode` for labels outside the four known modes.
    pub fn initial_mode(&self) -> Result<ModeKind, KarisError> {
        self.initial_mode.parse()
    }

    /// Distance covered by one driving tick.
    pub fn step_per_tick(&self) -> f64 {
        self.max_speed / self.loop_frequency_hz as f64
    }

    /// Saturates on overflow; `validate` rejects such configs.
    pub fn base_fine_pos_ticks(&self) -> u32 {
        self.fine_pos_time_seconds.saturating_mul(self.loop_frequency_hz)
    }

    pub fn base_lift_ticks(&self) -> u32 {
        self.lift_time_seconds.saturating_mul(self.loop_frequency_hz)
    }

    /// Never shorter than 1ns.
    pub fn tick_period(&self) -> std::time::Duration {
        let nanos = NANOS_PER_SECOND / u64::from(self.loop_frequency_hz.max(1));
        std::time::Duration::from_nanos(nanos.max(1))
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn parse_override<T: std::str::FromStr>(field: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| invalid(field, format!("'{}': {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_nominal_loop() {
        let config = SimConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.step_per_tick() - 0.02).abs() < 1e-12);
        assert_eq!(config.base_fine_pos_ticks(), 3000);
        assert_eq!(config.base_lift_ticks(), 1000);
        assert_eq!(config.tick_period(), std::time::Duration::from_millis(10));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SimConfig::from_toml_str(
            r#"
            max_speed = 1.0
            seed = 7

            [drain]
            waiting = 0.2
            "#,
        )
        .unwrap();

        assert_eq!(config.max_speed, 1.0);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.drain.waiting, 0.2);
        assert_eq!(config.drain.driving, 0.5);
        assert_eq!(config.loop_frequency_hz, 100);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "loop_frequency_hz = 10").unwrap();
        writeln!(file, "initial_mode = \"driving\"").unwrap();
        writeln!(file, "initial_goal = {{ x = 10.0, y = 10.0 }}").unwrap();

        let config = SimConfig::from_file(file.path()).unwrap();
        assert_eq!(config.loop_frequency_hz, 10);
        assert_eq!(config.initial_goal, Some(Position::new(10.0, 10.0)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = SimConfig::from_file("/nonexistent/karis.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/karis.toml"));
    }

    #[test]
    fn test_unknown_initial_mode_is_invalid_mode() {
        let config = SimConfig {
            initial_mode: "hovering".to_string(),
            ..SimConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, KarisError::InvalidMode(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_driving_without_goal_rejected() {
        let config = SimConfig {
            initial_mode: "driving".to_string(),
            ..SimConfig::default()
        };
        assert!(matches!(config.validate(), Err(KarisError::Config(_))));
    }

    #[test]
    fn test_episode_mode_cannot_be_initial() {
        let config = SimConfig {
            initial_mode: "lift_operating".to_string(),
            ..SimConfig::default()
        };
        assert!(matches!(config.validate(), Err(KarisError::Config(_))));
    }

    #[test]
    fn test_zero_frequency_rejected() {
        let config = SimConfig {
            loop_frequency_hz: 0,
            ..SimConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sub_nanosecond_period_rejected() {
        let config = SimConfig {
            loop_frequency_hz: 2_000_000_000,
            ..SimConfig::default()
        };
        assert!(matches!(config.validate(), Err(KarisError::Config(_))));
        assert_eq!(config.tick_period(), std::time::Duration::from_nanos(1));

        let fastest = SimConfig {
            loop_frequency_hz: 1_000_000_000,
            fine_pos_time_seconds: 1,
            lift_time_seconds: 1,
            ..SimConfig::default()
        };
        assert!(fastest.validate().is_ok());
        assert_eq!(fastest.tick_period(), std::time::Duration::from_nanos(1));
    }

    #[test]
    fn test_fine_pos_tick_overflow_rejected() {
        let config = SimConfig {
            fine_pos_time_seconds: 50_000_000,
            ..SimConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("fine_pos_time_seconds"));
        assert_eq!(config.base_fine_pos_ticks(), u32::MAX);
    }

    #[test]
    fn test_lift_tick_overflow_rejected() {
        let config = SimConfig {
            lift_time_seconds: u32::MAX,
            ..SimConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("lift_time_seconds"));
        assert_eq!(config.base_lift_ticks(), u32::MAX);
    }

    #[test]
    fn test_overrides() {
        let config = SimConfig::default()
            .with_overrides(|key| match key {
                "KARIS_MAX_SPEED" => Some("3.5".to_string()),
                "KARIS_SEED" => Some("42".to_string()),
                _ => None,
            })
            .unwrap();

        assert_eq!(config.max_speed, 3.5);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.loop_frequency_hz, 100);
    }

    #[test]
    fn test_bad_override_rejected() {
        let result = SimConfig::default().with_overrides(|key| {
            (key == "KARIS_LOOP_FREQUENCY_HZ").then(|| "fast".to_string())
        });
        assert!(result.is_err());
    }
}
