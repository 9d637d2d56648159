use serde::{Deserialize, Serialize};

/// A 2D landmark in pixel or normalized image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Six ordered points around one eye: outer corner, two upper lid points,
/// inner corner, two lower lid points (lower points mirror the upper ones).
pub type EyeContour = [Point; 6];

/// Both eye contours for one frame, as produced by an external landmark detector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EyeLandmarks {
    pub left: EyeContour,
    pub right: EyeContour,
}

impl EyeLandmarks {
    pub fn new(left: EyeContour, right: EyeContour) -> Self {
        Self { left, right }
    }

    /// Build from a flat `[x0, y0, x1, y1, ...]` slice of 24 numbers, left eye first
    pub fn from_flat(coords: &[f64]) -> Option<Self> {
        if coords.len() != 24 {
            return None;
        }

        let mut points = [Point::default(); 12];
        for (i, point) in points.iter_mut().enumerate() {
            *point = Point::new(coords[i * 2], coords[i * 2 + 1]);
        }

        let mut left = [Point::default(); 6];
        let mut right = [Point::default(); 6];
        left.copy_from_slice(&points[..6]);
        right.copy_from_slice(&points[6..]);
        Some(Self { left, right })
    }
}

/// One completed close -> open cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlinkEvent {
    /// Seconds between closure start and reopening
    pub duration: f64,
    /// How far the closure undershot the threshold, never below 0.01
    pub intensity: f64,
    /// Completion time in session seconds
    #[serde(default)]
    pub timestamp: f64,
    /// Lowest EAR seen while closed, unknown for hand-entered samples
    #[serde(default)]
    pub min_ear: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Symbol {
    Dot,
    Dash,
}

impl Symbol {
    pub fn as_char(&self) -> char {
        match self {
            Symbol::Dot => '.',
            Symbol::Dash => '-',
        }
    }

    pub fn from_char(ch: char) -> Option<Self> {
        match ch {
            '.' => Some(Symbol::Dot),
            '-' => Some(Symbol::Dash),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeStatus {
    Waiting,
    Decoded,
    SpaceAdded,
}

/// Outcome of one decode-engine evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeOutcome {
    Waiting,
    Decoded(char),
    SpaceAdded,
}

impl DecodeOutcome {
    pub fn status(&self) -> DecodeStatus {
        match self {
            DecodeOutcome::Waiting => DecodeStatus::Waiting,
            DecodeOutcome::Decoded(_) => DecodeStatus::Decoded,
            DecodeOutcome::SpaceAdded => DecodeStatus::SpaceAdded,
        }
    }

    pub fn decoded_char(&self) -> Option<char> {
        match self {
            DecodeOutcome::Decoded(ch) => Some(*ch),
            _ => None,
        }
    }
}

/// Decode surface handed to the boundary layer after each pipeline pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodeEvent {
    pub status: DecodeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub char: Option<char>,
    pub message: String,
    pub sequence: String,
    /// Symbol classified on this pass, if a blink completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<Symbol>,
}

impl DecodeEvent {
    pub fn is_waiting(&self) -> bool {
        self.status == DecodeStatus::Waiting
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_flat_splits_eyes() {
        let coords: Vec<f64> = (0..24).map(|v| v as f64).collect();
        let landmarks = EyeLandmarks::from_flat(&coords).unwrap();
        assert_eq!(landmarks.left[0], Point::new(0.0, 1.0));
        assert_eq!(landmarks.left[5], Point::new(10.0, 11.0));
        assert_eq!(landmarks.right[0], Point::new(12.0, 13.0));
        assert!(EyeLandmarks::from_flat(&coords[..20]).is_none());
    }

    #[test]
    fn test_decode_event_json_shape() {
        let event = DecodeEvent {
            status: DecodeStatus::SpaceAdded,
            char: None,
            message: "HI ".to_string(),
            sequence: String::new(),
            symbol: None,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["status"], "space_added");
        assert_eq!(json["message"], "HI ");
        assert!(json.get("char").is_none());
    }

    #[test]
    fn test_blink_event_training_json() {
        // Training files only carry the three feature fields
        let json = r#"{"duration": 0.2, "intensity": 0.05, "min_ear": 0.12}"#;
        let event: BlinkEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.min_ear, Some(0.12));
        assert_eq!(event.timestamp, 0.0);

        let json = r#"{"duration": 0.7, "intensity": 0.05}"#;
        let event: BlinkEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.min_ear, None);
    }
}
