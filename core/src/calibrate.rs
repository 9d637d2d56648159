//! Per-user calibration from labelled blinks.
//!
//! Collection is interactive: the user is asked for short blinks first, then
//! long ones. [`SampleCollector`] screens each candidate; [`calibrate`] turns
//! the accepted samples into a [`ModelBundle`].

use crate::classify::{features, FeatureScaler, Features, DEFAULT_DOT_THRESHOLD};
use crate::error::TrainingError;
use crate::model::ModelBundle;
use crate::types::{BlinkEvent, Symbol};

pub const MIN_SAMPLES_PER_CLASS: usize = 8;

/// Accepted dot duration range, inclusive
pub const DOT_RANGE: (f64, f64) = (0.05, 0.4);
/// A dash must be this much longer than the longest dot
pub const DASH_MARGIN: f64 = 1.25;
/// Dash floor when no dots have been collected
pub const DASH_FLOOR: f64 = 0.5;

/// Derive a dot threshold and feature scaler from labelled blinks
pub fn calibrate(dots: &[BlinkEvent], dashes: &[BlinkEvent]) -> Result<ModelBundle, TrainingError> {
    if dots.len() < MIN_SAMPLES_PER_CLASS || dashes.len() < MIN_SAMPLES_PER_CLASS {
        return Err(TrainingError::InsufficientData {
            dots: dots.len(),
            dashes: dashes.len(),
            required: MIN_SAMPLES_PER_CLASS,
        });
    }

    let dot_threshold = split_threshold(dots, dashes);
    let rows: Vec<Features> = dots.iter().chain(dashes).map(finite_features).collect();
    let scaler = FeatureScaler::fit(&rows);

    tracing::info!(
        dots = dots.len(),
        dashes = dashes.len(),
        "calibrated dot threshold {dot_threshold:.3}s"
    );

    Ok(ModelBundle {
        scaler,
        network: None,
        dot_threshold,
    })
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

/// Midpoint between the longest dot and the shortest dash, when the classes separate on average
fn split_threshold(dots: &[BlinkEvent], dashes: &[BlinkEvent]) -> f64 {
    let dot_mean = mean(dots.iter().map(|b| b.duration));
    let dash_mean = mean(dashes.iter().map(|b| b.duration));
    tracing::debug!("dot mean {dot_mean:.3}s, dash mean {dash_mean:.3}s");

    if dash_mean <= dot_mean {
        tracing::warn!("dashes are not longer than dots on average, keeping default threshold");
        return DEFAULT_DOT_THRESHOLD;
    }

    let longest_dot = dots.iter().map(|b| b.duration).fold(f64::MIN, f64::max);
    let shortest_dash = dashes.iter().map(|b| b.duration).fold(f64::MAX, f64::min);
    (longest_dot + shortest_dash) / 2.0
}

fn finite_features(event: &BlinkEvent) -> Features {
    features(event).map(|v| if v.is_finite() { v } else { 0.0 })
}

/// Why a candidate training blink was refused
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum SampleRejection {
    #[error("dot of {duration:.3}s is outside {min}s..={max}s")]
    DotOutOfRange { duration: f64, min: f64, max: f64 },
    #[error("dash of {duration:.3}s must be longer than {required:.3}s")]
    DashTooShort { duration: f64, required: f64 },
}

/// Accumulates labelled blinks, refusing ones that would blur the classes
#[derive(Debug, Clone, Default)]
pub struct SampleCollector {
    dots: Vec<BlinkEvent>,
    dashes: Vec<BlinkEvent>,
}

impl SampleCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offer(&mut self, label: Symbol, event: BlinkEvent) -> Result<(), SampleRejection> {
        let verdict = match label {
            Symbol::Dot => self.check_dot(event.duration),
            Symbol::Dash => self.check_dash(event.duration),
        };

        match verdict {
            Ok(()) => {
                tracing::debug!("accepted {label:?} sample of {:.3}s", event.duration);
                match label {
                    Symbol::Dot => self.dots.push(event),
                    Symbol::Dash => self.dashes.push(event),
                }
                Ok(())
            }
            Err(rejection) => {
                tracing::info!("rejected sample: {rejection}");
                Err(rejection)
            }
        }
    }

    fn check_dot(&self, duration: f64) -> Result<(), SampleRejection> {
        let (min, max) = DOT_RANGE;
        if (min..=max).contains(&duration) {
            Ok(())
        } else {
            Err(SampleRejection::DotOutOfRange { duration, min, max })
        }
    }

    fn check_dash(&self, duration: f64) -> Result<(), SampleRejection> {
        let accepted = match self.longest_dot() {
            Some(longest) => duration > longest * DASH_MARGIN,
            None => duration >= DASH_FLOOR,
        };
        if accepted {
            Ok(())
        } else {
            Err(SampleRejection::DashTooShort {
                duration,
                required: self.dash_minimum(),
            })
        }
    }

    /// Shortest dash the collector would currently accept
    pub fn dash_minimum(&self) -> f64 {
        self.longest_dot()
            .map(|longest| longest * DASH_MARGIN)
            .unwrap_or(DASH_FLOOR)
    }

    pub fn longest_dot(&self) -> Option<f64> {
        self.dots.iter().map(|b| b.duration).reduce(f64::max)
    }

    pub fn counts(&self) -> (usize, usize) {
        (self.dots.len(), self.dashes.len())
    }

    pub fn is_ready(&self) -> bool {
        self.dots.len() >= MIN_SAMPLES_PER_CLASS && self.dashes.len() >= MIN_SAMPLES_PER_CLASS
    }

    pub fn calibrate(&self) -> Result<ModelBundle, TrainingError> {
        calibrate(&self.dots, &self.dashes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Classifier;

    fn blink(duration: f64) -> BlinkEvent {
        BlinkEvent {
            duration,
            intensity: 0.08,
            timestamp: 0.0,
            min_ear: Some(0.12),
        }
    }

    fn blinks(durations: &[f64]) -> Vec<BlinkEvent> {
        durations.iter().copied().map(blink).collect()
    }

    #[test]
    fn test_requires_eight_per_class() {
        let dots = blinks(&[0.2; 8]);
        let dashes = blinks(&[0.8; 7]);
        assert_eq!(
            calibrate(&dots, &dashes).unwrap_err(),
            TrainingError::InsufficientData {
                dots: 8,
                dashes: 7,
                required: 8
            }
        );
    }

    #[test]
    fn test_threshold_is_midpoint() {
        let dots = blinks(&[0.15, 0.2, 0.2, 0.25, 0.3, 0.2, 0.2, 0.2]);
        let dashes = blinks(&[0.7, 0.8, 0.9, 0.8, 0.8, 0.8, 1.0, 0.8]);
        let bundle = calibrate(&dots, &dashes).unwrap();
        assert!((bundle.dot_threshold - 0.5).abs() < 1e-12);
        assert!(bundle.network.is_none());
        assert_eq!(bundle.scaler.mean.len(), 4);

        let classifier = Classifier::from_bundle(bundle);
        assert_eq!(classifier.classify(&blink(0.45)), Symbol::Dot);
        assert_eq!(classifier.classify(&blink(0.55)), Symbol::Dash);
    }

    #[test]
    fn test_inverted_classes_keep_default() {
        let dots = blinks(&[0.9; 8]);
        let dashes = blinks(&[0.2; 8]);
        let bundle = calibrate(&dots, &dashes).unwrap();
        assert_eq!(bundle.dot_threshold, DEFAULT_DOT_THRESHOLD);
    }

    #[test]
    fn test_collector_screens_dots() {
        let mut collector = SampleCollector::new();
        assert!(collector.offer(Symbol::Dot, blink(0.05)).is_ok());
        assert!(collector.offer(Symbol::Dot, blink(0.4)).is_ok());
        assert!(matches!(
            collector.offer(Symbol::Dot, blink(0.41)),
            Err(SampleRejection::DotOutOfRange { .. })
        ));
        assert_eq!(collector.counts(), (2, 0));
    }

    #[test]
    fn test_collector_dash_margin() {
        let mut collector = SampleCollector::new();
        assert_eq!(collector.dash_minimum(), DASH_FLOOR);
        assert!(collector.offer(Symbol::Dash, blink(0.49)).is_err());

        collector.offer(Symbol::Dot, blink(0.4)).unwrap();
        assert!((collector.dash_minimum() - 0.5).abs() < 1e-12);
        assert!(collector.offer(Symbol::Dash, blink(0.5)).is_err());
        assert!(collector.offer(Symbol::Dash, blink(0.51)).is_ok());
        assert_eq!(collector.counts(), (1, 1));
    }

    #[test]
    fn test_collector_calibrates_when_ready() {
        let mut collector = SampleCollector::new();
        for i in 0..MIN_SAMPLES_PER_CLASS {
            collector.offer(Symbol::Dot, blink(0.1 + i as f64 * 0.02)).unwrap();
        }
        assert!(!collector.is_ready());
        assert!(collector.calibrate().is_err());

        for i in 0..MIN_SAMPLES_PER_CLASS {
            collector.offer(Symbol::Dash, blink(0.8 + i as f64 * 0.1)).unwrap();
        }
        assert!(collector.is_ready());
        let bundle = collector.calibrate().unwrap();
        // Longest dot 0.24, shortest dash 0.8
        assert!((bundle.dot_threshold - 0.52).abs() < 1e-9);
    }
}
