//! Runtime configuration
//!
//! Loaded from JSON at startup and updatable at any time over the control
//! channels. The field reads it lazily: changes take effect at the next
//! spawn or reset cycle.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// How joints are assigned to spawned batches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JointMode {
    /// Small flush spheres at every bend
    Elbow,
    /// Ball joint at every bend
    Ball,
    /// Ball joint at roughly a third of bends
    Mixed,
    /// Round-robin through elbow, ball, mixed, one step per batch
    Cycle,
}

impl JointMode {
    /// Probability that a bend gets a ball joint under this mode.
    /// `Cycle` must be resolved to a concrete mode before calling.
    pub fn ball_joint_chance(self) -> f32 {
        match self {
            JointMode::Ball => 1.0,
            JointMode::Mixed => 1.0 / 3.0,
            JointMode::Elbow => 0.0,
            JointMode::Cycle => 0.0,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "elbow" => Some(JointMode::Elbow),
            "ball" => Some(JointMode::Ball),
            "mixed" => Some(JointMode::Mixed),
            "cycle" => Some(JointMode::Cycle),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Spawn 2-3 pipes per batch instead of 1
    pub multiple: bool,
    /// Joint assignment mode
    pub joints: JointMode,
    /// Texture applied to pipes; None for random plain colors
    pub texture_path: Option<String>,
    /// Reset timer jitter range in seconds [min, max]
    pub interval: [f32; 2],
}

impl Default for Config {
    fn default() -> Self {
        Self {
            multiple: true,
            joints: JointMode::Elbow,
            texture_path: None,
            interval: [16.0, 24.0],
        }
    }
}

impl Config {
    /// Load config from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, String> {
        let json = fs::read_to_string(path).map_err(|e| e.to_string())?;
        let config: Self = serde_json::from_str(&json).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), String> {
        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;
        fs::write(path, json).map_err(|e| e.to_string())
    }

    /// Reject nonsense at the boundary instead of degrading deep in the tick
    pub fn validate(&self) -> Result<(), String> {
        let [min, max] = self.interval;
        if !(min > 0.0 && max >= min) {
            return Err(format!(
                "interval must satisfy 0 < min <= max, got [{}, {}]",
                min, max
            ));
        }
        Ok(())
    }
}

/// Partial config delivered over MQTT; absent fields keep their value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigUpdate {
    pub multiple: Option<bool>,
    pub joints: Option<JointMode>,
    pub texture_path: Option<String>,
    pub interval: Option<[f32; 2]>,
}

impl ConfigUpdate {
    /// Merge into an existing config, validating the result.
    /// On validation failure the original config is left untouched.
    pub fn apply(&self, config: &Config) -> Result<Config, String> {
        let mut next = config.clone();
        if let Some(multiple) = self.multiple {
            next.multiple = multiple;
        }
        if let Some(joints) = self.joints {
            next.joints = joints;
        }
        if let Some(ref path) = self.texture_path {
            next.texture_path = if path.is_empty() {
                None
            } else {
                Some(path.clone())
            };
        }
        if let Some(interval) = self.interval {
            next.interval = interval;
        }
        next.validate()?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_unknown_joint_mode_rejected() {
        let json = r#"{"joints": "spline"}"#;
        assert!(serde_json::from_str::<Config>(json).is_err());
    }

    #[test]
    fn test_joint_mode_lowercase_roundtrip() {
        let config = Config {
            joints: JointMode::Cycle,
            ..Config::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"cycle\""));
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.joints, JointMode::Cycle);
    }

    #[test]
    fn test_invalid_interval_rejected() {
        let config = Config {
            interval: [24.0, 16.0],
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_update_merges_and_validates() {
        let base = Config::default();
        let update = ConfigUpdate {
            multiple: Some(false),
            joints: Some(JointMode::Ball),
            ..ConfigUpdate::default()
        };
        let next = update.apply(&base).unwrap();
        assert!(!next.multiple);
        assert_eq!(next.joints, JointMode::Ball);
        assert_eq!(next.interval, base.interval);

        let bad = ConfigUpdate {
            interval: Some([-1.0, 5.0]),
            ..ConfigUpdate::default()
        };
        assert!(bad.apply(&base).is_err());
    }

    #[test]
    fn test_ball_joint_chances() {
        assert_eq!(JointMode::Ball.ball_joint_chance(), 1.0);
        assert_eq!(JointMode::Elbow.ball_joint_chance(), 0.0);
        assert!((JointMode::Mixed.ball_joint_chance() - 1.0 / 3.0).abs() < 1e-6);
    }
}
