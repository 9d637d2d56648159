// Eye aspect ratio from two six-point eye contours
use crate::types::{EyeContour, EyeLandmarks};

/// Ratio for one eye: (|p1-p5| + |p2-p4|) / (2 * |p0-p3|).
/// Returns `None` for zero-width (or non-finite) geometry.
pub fn eye_aspect_ratio(eye: &EyeContour) -> Option<f64> {
    let vertical_a = eye[1].distance(&eye[5]);
    let vertical_b = eye[2].distance(&eye[4]);
    let horizontal = eye[0].distance(&eye[3]);

    if horizontal == 0.0 || !horizontal.is_finite() {
        return None;
    }

    let ratio = (vertical_a + vertical_b) / (2.0 * horizontal);
    ratio.is_finite().then_some(ratio)
}

/// Mean of both eyes, absent if either eye is
pub fn combined_ear(landmarks: &EyeLandmarks) -> Option<f64> {
    let left = eye_aspect_ratio(&landmarks.left)?;
    let right = eye_aspect_ratio(&landmarks.right)?;
    Some((left + right) / 2.0)
}
