use crate::config::SessionConfig;
use crate::types::BlinkEvent;

/// Floor for blink intensity so threshold-grazing closures still register
const MIN_INTENSITY: f64 = 0.01;

/// Eye state tracked between ticks
#[derive(Debug, Clone, Copy, PartialEq)]
enum EyeState {
    Open,
    Closed {
        started_at: f64,
        frames: u32,
        min_ear: f64,
    },
}

/// Open -> closed -> open detector that emits one event per completed closure
#[derive(Debug, Clone)]
pub struct BlinkSegmenter {
    state: EyeState,
    consecutive_frames: u32,
    min_duration: f64,
    max_duration: f64,
}

impl Default for BlinkSegmenter {
    fn default() -> Self {
        Self::new(&SessionConfig::default())
    }
}

impl BlinkSegmenter {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            state: EyeState::Open,
            consecutive_frames: config.consecutive_frames.max(1),
            min_duration: config.min_blink_duration,
            max_duration: config.max_blink_duration,
        }
    }

    /// Advance one tick. An absent EAR counts as "not closed".
    /// Events are only produced on the closed -> open transition.
    pub fn update(&mut self, ear: Option<f64>, threshold: f64, now: f64) -> Option<BlinkEvent> {
        let closed_ear = ear.filter(|&value| value < threshold);

        match (self.state, closed_ear) {
            (EyeState::Open, Some(value)) => {
                tracing::trace!(ear = value, threshold, "eye closed at {now:.3}s");
                self.state = EyeState::Closed {
                    started_at: now,
                    frames: 1,
                    min_ear: value,
                };
                None
            }
            (EyeState::Open, None) => None,
            (
                EyeState::Closed {
                    started_at,
                    frames,
                    min_ear,
                },
                Some(value),
            ) => {
                self.state = EyeState::Closed {
                    started_at,
                    frames: frames.saturating_add(1),
                    min_ear: min_ear.min(value),
                };
                None
            }
            (
                EyeState::Closed {
                    started_at,
                    frames,
                    min_ear,
                },
                None,
            ) => {
                self.state = EyeState::Open;
                self.complete(started_at, frames, min_ear, threshold, now)
            }
        }
    }

    fn complete(
        &self,
        started_at: f64,
        frames: u32,
        min_ear: f64,
        threshold: f64,
        now: f64,
    ) -> Option<BlinkEvent> {
        if frames < self.consecutive_frames {
            tracing::trace!(frames, "closure too brief, ignored");
            return None;
        }

        let duration = now - started_at;
        if !(duration > self.min_duration && duration < self.max_duration) {
            tracing::debug!("closure of {duration:.3}s outside blink bounds, discarded");
            return None;
        }

        let intensity = (threshold - min_ear.min(threshold)).max(MIN_INTENSITY);
        tracing::debug!("blink: {duration:.3}s, intensity {intensity:.3}");

        Some(BlinkEvent {
            duration,
            intensity,
            timestamp: now,
            min_ear: Some(min_ear),
        })
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, EyeState::Closed { .. })
    }

    /// Drop any closure in progress
    pub fn reset(&mut self) {
        self.state = EyeState::Open;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const THRESHOLD: f64 = 0.2;
    const OPEN: Option<f64> = Some(0.3);

    /// Close at `start`, stay closed, reopen at `end`; returns every event seen
    fn dip(segmenter: &mut BlinkSegmenter, start: f64, end: f64, low: f64) -> Vec<BlinkEvent> {
        let mut events = Vec::new();
        events.extend(segmenter.update(Some(low), THRESHOLD, start));
        events.extend(segmenter.update(Some(low), THRESHOLD, (start + end) / 2.0));
        events.extend(segmenter.update(OPEN, THRESHOLD, end));
        events
    }

    #[test]
    fn test_single_blink() {
        let mut segmenter = BlinkSegmenter::default();
        assert!(segmenter.update(OPEN, THRESHOLD, 0.0).is_none());
        assert!(segmenter.update(Some(0.1), THRESHOLD, 1.0).is_none());
        assert!(segmenter.is_closed());
        assert!(segmenter.update(Some(0.05), THRESHOLD, 1.1).is_none());

        let event = segmenter.update(OPEN, THRESHOLD, 1.25).unwrap();
        assert!((event.duration - 0.25).abs() < 1e-9);
        assert_eq!(event.min_ear, Some(0.05));
        assert!((event.intensity - 0.15).abs() < 1e-9);
        assert_eq!(event.timestamp, 1.25);
        assert!(!segmenter.is_closed());
    }

    #[test]
    fn test_absent_ear_reopens() {
        let mut segmenter = BlinkSegmenter::default();
        segmenter.update(Some(0.1), THRESHOLD, 0.0);
        let event = segmenter.update(None, THRESHOLD, 0.5).unwrap();
        assert!((event.duration - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_ear_at_threshold_is_open() {
        let mut segmenter = BlinkSegmenter::default();
        assert!(segmenter.update(Some(THRESHOLD), THRESHOLD, 0.0).is_none());
        assert!(!segmenter.is_closed());
    }

    #[test]
    fn test_grazing_closure_has_minimum_intensity() {
        let mut segmenter = BlinkSegmenter::default();
        let events = dip(&mut segmenter, 0.0, 0.3, THRESHOLD - 1e-6);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].intensity, MIN_INTENSITY);
    }

    #[test]
    fn test_duration_bounds_are_strict() {
        for (end, expected) in [(0.0499, 0), (0.05, 0), (0.051, 1), (2.999, 1), (3.0, 0), (3.001, 0)] {
            let mut segmenter = BlinkSegmenter::default();
            segmenter.update(Some(0.1), THRESHOLD, 0.0);
            let events: Vec<_> = segmenter.update(OPEN, THRESHOLD, end).into_iter().collect();
            assert_eq!(events.len(), expected, "reopen at {end}");
            assert!(!segmenter.is_closed());
        }
    }

    #[test]
    fn test_consecutive_frame_requirement() {
        let config = SessionConfig {
            consecutive_frames: 3,
            ..Default::default()
        };
        let mut segmenter = BlinkSegmenter::new(&config);
        // Two closed frames are not enough
        segmenter.update(Some(0.1), THRESHOLD, 0.0);
        segmenter.update(Some(0.1), THRESHOLD, 0.1);
        assert!(segmenter.update(OPEN, THRESHOLD, 0.3).is_none());

        segmenter.update(Some(0.1), THRESHOLD, 1.0);
        segmenter.update(Some(0.1), THRESHOLD, 1.1);
        segmenter.update(Some(0.1), THRESHOLD, 1.2);
        assert!(segmenter.update(OPEN, THRESHOLD, 1.4).is_some());
    }

    #[test]
    fn test_reset_drops_closure() {
        let mut segmenter = BlinkSegmenter::default();
        segmenter.update(Some(0.1), THRESHOLD, 0.0);
        segmenter.reset();
        assert!(segmenter.update(OPEN, THRESHOLD, 0.5).is_none());
    }

    proptest! {
        #[test]
        fn one_event_per_dip(
            gaps in prop::collection::vec((0.1f64..2.0, 0.06f64..2.9), 1..12)
        ) {
            let mut segmenter = BlinkSegmenter::default();
            let mut now = 0.0;
            let mut expected = Vec::new();
            let mut events = Vec::new();

            for (open_for, closed_for) in gaps {
                now += open_for;
                events.extend(segmenter.update(OPEN, THRESHOLD, now));
                let start = now;
                now += closed_for;
                events.extend(dip(&mut segmenter, start, now, 0.1));
                expected.push(now - start);
            }

            prop_assert_eq!(events.len(), expected.len());
            for (event, duration) in events.iter().zip(expected) {
                prop_assert!((event.duration - duration).abs() < 1e-9);
            }
        }
    }
}
