// Support utilities for WASM bindings
use blinkmorse_core::{ConfigError, EyeLandmarks, SessionConfig};

/// Parse a session config, falling back to the defaults when the JSON is
/// malformed or fails validation. The error is handed back for reporting.
pub fn config_with_defaults(config_json: &str) -> (SessionConfig, Option<ConfigError>) {
    match SessionConfig::from_json_with_defaults(config_json) {
        Ok(config) => (config, None),
        Err(e) => (SessionConfig::default(), Some(e)),
    }
}

/// Flat `[x, y]` landmark buffer from JS; an empty buffer means no face
pub fn landmarks_from_points(points: &[f64]) -> Result<Option<EyeLandmarks>, String> {
    if points.is_empty() {
        return Ok(None);
    }
    EyeLandmarks::from_flat(points)
        .map(Some)
        .ok_or_else(|| format!("expected 24 landmark coordinates, got {}", points.len()))
}

/// First character of a JS string, if any
pub fn first_char(text: &str) -> Option<char> {
    text.chars().next()
}
