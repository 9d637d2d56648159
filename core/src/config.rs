// Calibration constants for one session.
// Every field has a default, so a partial JSON object overlays the defaults.
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    /// Silence (seconds) after the last symbol before the letter is decoded
    pub letter_pause: f64,
    /// Silence (seconds) after the last decoded letter before a space is added
    pub space_pause: f64,
    /// Fallback dot/dash boundary in seconds (strictly greater is a dash)
    pub dot_threshold: f64,
    /// EAR samples kept for threshold adaptation
    pub ear_history_window: usize,
    /// Most recent samples used for mean/stddev
    pub threshold_sample_window: usize,
    pub initial_threshold: f64,
    pub threshold_min: f64,
    pub threshold_max: f64,
    /// Weight kept from the old threshold on each update
    pub threshold_smoothing: f64,
    pub threshold_std_multiplier: f64,
    /// Closed ticks required before a closure counts as a blink
    pub consecutive_frames: u32,
    pub min_blink_duration: f64,
    pub max_blink_duration: f64,
    /// Consumer loop cadence
    pub tick_hz: u32,
    /// Predictor calls slower than this fall back to the threshold rule
    pub inference_budget_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            letter_pause: 2.0,
            space_pause: 4.0,
            dot_threshold: 0.4,
            ear_history_window: 30,
            threshold_sample_window: 10,
            initial_threshold: 0.21,
            threshold_min: 0.15,
            threshold_max: 0.25,
            threshold_smoothing: 0.7,
            threshold_std_multiplier: 2.0,
            consecutive_frames: 1,
            min_blink_duration: 0.05,
            max_blink_duration: 3.0,
            tick_hz: 30,
            inference_budget_ms: 50,
        }
    }
}

impl SessionConfig {
    /// Parse a JSON object over the defaults; empty input or `{}` gives the defaults
    pub fn from_json_with_defaults(json: &str) -> Result<Self, ConfigError> {
        let config = if json.trim().is_empty() || json.trim() == "{}" {
            Self::default()
        } else {
            serde_json::from_str::<Self>(json)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("letterPause", self.letter_pause),
            ("spacePause", self.space_pause),
            ("dotThreshold", self.dot_threshold),
            ("maxBlinkDuration", self.max_blink_duration),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }

        if !(self.min_blink_duration >= 0.0 && self.min_blink_duration < self.max_blink_duration)
        {
            return Err(ConfigError::Invalid(format!(
                "blink duration bounds ({}, {}) are empty",
                self.min_blink_duration, self.max_blink_duration
            )));
        }
        if self.threshold_sample_window < 2 {
            return Err(ConfigError::Invalid(
                "thresholdSampleWindow must be at least 2".to_string(),
            ));
        }
        if self.ear_history_window < self.threshold_sample_window {
            return Err(ConfigError::Invalid(format!(
                "earHistoryWindow ({}) is smaller than thresholdSampleWindow ({})",
                self.ear_history_window, self.threshold_sample_window
            )));
        }
        if !(self.threshold_min <= self.threshold_max) {
            return Err(ConfigError::Invalid(format!(
                "threshold bounds [{}, {}] are inverted",
                self.threshold_min, self.threshold_max
            )));
        }
        if !(0.0..=1.0).contains(&self.threshold_smoothing) {
            return Err(ConfigError::Invalid(format!(
                "thresholdSmoothing must be within [0, 1], got {}",
                self.threshold_smoothing
            )));
        }
        if self.tick_hz == 0 {
            return Err(ConfigError::Invalid("tickHz must be non-zero".to_string()));
        }

        if self.space_pause < self.letter_pause {
            // Letter rule still runs first, so a space can never follow a
            // letter on the same tick.
            tracing::warn!(
                "spacePause ({}) is shorter than letterPause ({}); spaces will follow letters closely",
                self.space_pause,
                self.letter_pause
            );
        }

        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_hz.max(1) as f64)
    }

    pub fn inference_budget(&self) -> Duration {
        Duration::from_millis(self.inference_budget_ms)
    }
}
