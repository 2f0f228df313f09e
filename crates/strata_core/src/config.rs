//! # Engine Configuration
//!
//! Loaded once at startup from TOML. Every field has a default, so an empty
//! file is a valid configuration.
//!
//! ```toml
//! [world]
//! max_entities = 4096
//!
//! [frame]
//! min_delay_ms = 5
//!
//! [frame.pacing]
//! mode = "target_fps"
//! fps = 90.0
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ecs::MAX_ENTITIES;
use crate::error::{EcsError, EcsResult};

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// World sizing.
    pub world: WorldConfig,
    /// Frame pacing for the [`Runner`](crate::Runner).
    pub frame: FrameConfig,
}

/// World sizing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldConfig {
    /// Number of entity ids (`1..=max_entities`).
    pub max_entities: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            max_entities: MAX_ENTITIES,
        }
    }
}

/// How long a frame should take.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Pacing {
    /// Aim for a frame rate.
    TargetFps {
        /// Frames per second.
        fps: f64,
    },
    /// Aim for a fixed delay between frame starts.
    FixedDelay {
        /// Milliseconds per frame.
        delay_ms: u64,
    },
}

impl Default for Pacing {
    fn default() -> Self {
        Self::TargetFps { fps: 90.0 }
    }
}

/// Frame pacing settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FrameConfig {
    /// Target frame duration.
    pub pacing: Pacing,
    /// Lower bound on the frame duration, in milliseconds.
    pub min_delay_ms: u64,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            pacing: Pacing::default(),
            min_delay_ms: 5,
        }
    }
}

impl FrameConfig {
    /// Frame duration the runner aims for, never below `min_delay_ms`.
    ///
    /// Whole milliseconds, truncated.
    #[must_use]
    pub fn frame_budget(&self) -> Duration {
        let target_ms = match self.pacing {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            Pacing::TargetFps { fps } => (1000.0 / fps) as u64,
            Pacing::FixedDelay { delay_ms } => delay_ms,
        };
        Duration::from_millis(target_ms.max(self.min_delay_ms))
    }

    /// Runs without any sleeping. Handy for tests and headless batch runs.
    #[must_use]
    pub fn unpaced() -> Self {
        Self {
            pacing: Pacing::FixedDelay { delay_ms: 0 },
            min_delay_ms: 0,
        }
    }
}

impl EngineConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`EcsError::ConfigParse`] for malformed TOML or unknown keys,
    /// [`EcsError::InvalidConfig`] for out-of-range values.
    pub fn from_toml_str(text: &str) -> EcsResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|err| EcsError::ConfigParse(err.to_string()))?;
        config.validate()?;
        tracing::debug!(?config, "loaded engine configuration");
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// [`EcsError::ConfigIo`] if the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn from_file(path: impl AsRef<Path>) -> EcsResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| EcsError::ConfigIo {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    /// Serializes back to TOML.
    ///
    /// # Errors
    ///
    /// [`EcsError::ConfigParse`] if serialization fails.
    pub fn to_toml_string(&self) -> EcsResult<String> {
        toml::to_string(self).map_err(|err| EcsError::ConfigParse(err.to_string()))
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidConfig`] describing the first bad value.
    pub fn validate(&self) -> EcsResult<()> {
        if self.world.max_entities == 0 {
            return Err(EcsError::InvalidConfig(
                "world.max_entities must be greater than zero".into(),
            ));
        }
        if self.world.max_entities == u32::MAX {
            return Err(EcsError::InvalidConfig(
                "world.max_entities must be below u32::MAX".into(),
            ));
        }
        if let Pacing::TargetFps { fps } = self.frame.pacing {
            if !fps.is_finite() || fps <= 0.0 {
                return Err(EcsError::InvalidConfig(format!(
                    "frame.pacing.fps must be a positive number, got {fps}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.world.max_entities, 4096);
        assert_eq!(config.frame.pacing, Pacing::TargetFps { fps: 90.0 });
        assert_eq!(config.frame.min_delay_ms, 5);
    }

    #[test]
    fn test_parse_fixed_delay() {
        let config = EngineConfig::from_toml_str(
            r#"
            [world]
            max_entities = 128

            [frame]
            min_delay_ms = 2

            [frame.pacing]
            mode = "fixed_delay"
            delay_ms = 1000
            "#,
        )
        .unwrap();

        assert_eq!(config.world.max_entities, 128);
        assert_eq!(config.frame.pacing, Pacing::FixedDelay { delay_ms: 1000 });
        assert_eq!(config.frame.frame_budget(), Duration::from_millis(1000));
    }

    #[test]
    fn test_budget_respects_minimum() {
        let frame = FrameConfig {
            pacing: Pacing::TargetFps { fps: 1000.0 },
            min_delay_ms: 5,
        };
        assert_eq!(frame.frame_budget(), Duration::from_millis(5));

        let frame = FrameConfig {
            pacing: Pacing::TargetFps { fps: 90.0 },
            min_delay_ms: 5,
        };
        assert_eq!(frame.frame_budget(), Duration::from_millis(11));
        assert_eq!(FrameConfig::unpaced().frame_budget(), Duration::ZERO);
    }

    #[test]
    fn test_rejects_zero_entities() {
        let err = EngineConfig::from_toml_str("[world]\nmax_entities = 0\n").unwrap_err();
        assert!(matches!(err, EcsError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_non_positive_fps() {
        let err = EngineConfig::from_toml_str(
            "[frame.pacing]\nmode = \"target_fps\"\nfps = 0.0\n",
        )
        .unwrap_err();
        assert!(matches!(err, EcsError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_unknown_keys() {
        let err = EngineConfig::from_toml_str("[world]\nmax_entites = 10\n").unwrap_err();
        assert!(matches!(err, EcsError::ConfigParse(_)));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = EngineConfig::from_file("/definitely/not/here.toml").unwrap_err();
        match err {
            EcsError::ConfigIo { path, .. } => assert!(path.ends_with("here.toml")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_toml_roundtrip_preserves_values() {
        let mut config = EngineConfig::default();
        config.world.max_entities = 77;
        config.frame.pacing = Pacing::FixedDelay { delay_ms: 16 };
        let text = config.to_toml_string().unwrap();
        assert_eq!(EngineConfig::from_toml_str(&text).unwrap(), config);
    }
}
