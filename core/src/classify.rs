// Blink -> dot/dash classification.
// A trained predictor is advisory: every failure in that path falls back to
// the duration threshold, so classification itself never fails.
use crate::config::SessionConfig;
use crate::error::PredictError;
use crate::model::{self, ModelBundle};
use crate::types::{BlinkEvent, Symbol};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const FEATURE_COUNT: usize = 4;
pub const DEFAULT_DOT_THRESHOLD: f64 = 0.4;

/// Used when a blink carries no minimum EAR
const DEFAULT_MIN_EAR: f64 = 0.2;
const DASH_PROBABILITY: f64 = 0.5;

pub type Features = [f64; FEATURE_COUNT];

/// `[duration, intensity, min_ear, 1 / (duration + 0.001)]`
pub fn features(event: &BlinkEvent) -> Features {
    [
        event.duration,
        event.intensity,
        event.min_ear.unwrap_or(DEFAULT_MIN_EAR),
        1.0 / (event.duration + 0.001),
    ]
}

/// Trained model contract: scaled features in, dash probability out
pub trait Predictor: Send + Sync + std::fmt::Debug {
    fn predict(&self, features: &Features) -> Result<f64, PredictError>;
}

/// Per-feature standardisation fitted on training blinks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl FeatureScaler {
    pub fn identity() -> Self {
        Self {
            mean: vec![0.0; FEATURE_COUNT],
            scale: vec![1.0; FEATURE_COUNT],
        }
    }

    /// Fit mean and population stddev per column; zero-variance columns get scale 1
    pub fn fit(rows: &[Features]) -> Self {
        if rows.is_empty() {
            return Self::identity();
        }

        let n = rows.len() as f64;
        let mut mean = vec![0.0; FEATURE_COUNT];
        let mut scale = vec![0.0; FEATURE_COUNT];

        for col in 0..FEATURE_COUNT {
            mean[col] = rows.iter().map(|row| row[col]).sum::<f64>() / n;
            let variance = rows
                .iter()
                .map(|row| (row[col] - mean[col]).powi(2))
                .sum::<f64>()
                / n;
            let std_dev = variance.sqrt();
            scale[col] = if std_dev > f64::EPSILON { std_dev } else { 1.0 };
        }

        Self { mean, scale }
    }

    pub fn validate(&self) -> Result<(), PredictError> {
        for width in [self.mean.len(), self.scale.len()] {
            if width != FEATURE_COUNT {
                return Err(PredictError::FeatureWidth {
                    expected: FEATURE_COUNT,
                    actual: width,
                });
            }
        }
        Ok(())
    }

    pub fn transform(&self, features: &Features) -> Result<Features, PredictError> {
        self.validate()?;

        let mut scaled = [0.0; FEATURE_COUNT];
        for (i, value) in features.iter().enumerate() {
            if self.scale[i] == 0.0 {
                return Err(PredictError::NonFinite("scaler"));
            }
            scaled[i] = (value - self.mean[i]) / self.scale[i];
        }

        if scaled.iter().all(|v| v.is_finite()) {
            Ok(scaled)
        } else {
            Err(PredictError::NonFinite("scaled features"))
        }
    }
}

/// Whether a trained profile was found for the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelStatus {
    Trained { has_network: bool },
    Untrained,
}

#[derive(Debug)]
pub enum Classifier {
    ModelBacked {
        predictor: Box<dyn Predictor>,
        scaler: FeatureScaler,
        dot_threshold: f64,
        budget: Option<Duration>,
    },
    ThresholdOnly {
        dot_threshold: f64,
    },
}

impl Default for Classifier {
    fn default() -> Self {
        Classifier::ThresholdOnly {
            dot_threshold: DEFAULT_DOT_THRESHOLD,
        }
    }
}

impl Classifier {
    pub fn threshold_only(dot_threshold: f64) -> Self {
        Classifier::ThresholdOnly { dot_threshold }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::threshold_only(config.dot_threshold)
    }

    pub fn model_backed(
        predictor: Box<dyn Predictor>,
        scaler: FeatureScaler,
        dot_threshold: f64,
    ) -> Self {
        Classifier::ModelBacked {
            predictor,
            scaler,
            dot_threshold,
            budget: None,
        }
    }

    /// Bound each predictor call; slower calls fall back to the threshold rule
    pub fn with_budget(mut self, limit: Duration) -> Self {
        if let Classifier::ModelBacked { budget, .. } = &mut self {
            *budget = Some(limit);
        }
        self
    }

    /// Network-backed when the bundle carries a network, threshold-only otherwise
    pub fn from_bundle(bundle: ModelBundle) -> Self {
        let dot_threshold = bundle.dot_threshold;
        match bundle.network {
            Some(network) => Self::model_backed(Box::new(network), bundle.scaler, dot_threshold),
            None => Self::threshold_only(dot_threshold),
        }
    }

    /// Load a profile; any failure is reported as `Untrained` with the default classifier
    pub fn load_or_fallback(path: &Path) -> (Self, ModelStatus) {
        match model::load_model(path) {
            Ok(bundle) => {
                let has_network = bundle.network.is_some();
                tracing::info!(
                    "loaded profile {} ({})",
                    path.display(),
                    if has_network { "network" } else { "threshold only" }
                );
                (Self::from_bundle(bundle), ModelStatus::Trained { has_network })
            }
            Err(e) => {
                tracing::warn!("no trained model: {e}");
                (Self::default(), ModelStatus::Untrained)
            }
        }
    }

    pub fn dot_threshold(&self) -> f64 {
        match self {
            Classifier::ModelBacked { dot_threshold, .. }
            | Classifier::ThresholdOnly { dot_threshold } => *dot_threshold,
        }
    }

    pub fn is_model_backed(&self) -> bool {
        matches!(self, Classifier::ModelBacked { .. })
    }

    pub fn classify(&self, event: &BlinkEvent) -> Symbol {
        match self {
            Classifier::ModelBacked {
                predictor,
                scaler,
                dot_threshold,
                budget,
            } => match predict_dash_probability(predictor.as_ref(), scaler, *budget, event) {
                Ok(probability) => {
                    if probability > DASH_PROBABILITY {
                        Symbol::Dash
                    } else {
                        Symbol::Dot
                    }
                }
                Err(e) => {
                    tracing::warn!("model prediction failed: {e}, using duration threshold");
                    by_duration(event.duration, *dot_threshold)
                }
            },
            Classifier::ThresholdOnly { dot_threshold } => by_duration(event.duration, *dot_threshold),
        }
    }
}

fn by_duration(duration: f64, dot_threshold: f64) -> Symbol {
    if duration > dot_threshold {
        Symbol::Dash
    } else {
        Symbol::Dot
    }
}

fn predict_dash_probability(
    predictor: &dyn Predictor,
    scaler: &FeatureScaler,
    budget: Option<Duration>,
    event: &BlinkEvent,
) -> Result<f64, PredictError> {
    let scaled = scaler.transform(&features(event))?;
    let (probability, elapsed) = timed(|| predictor.predict(&scaled));
    let probability = probability?;

    if let (Some(limit), Some(elapsed)) = (budget, elapsed) {
        if elapsed > limit {
            return Err(PredictError::OverBudget {
                elapsed_ms: elapsed.as_millis(),
                budget_ms: limit.as_millis(),
            });
        }
    }

    if probability.is_finite() {
        Ok(probability)
    } else {
        Err(PredictError::NonFinite("prediction"))
    }
}

// std::time::Instant is unavailable on wasm32-unknown-unknown
#[cfg(not(target_arch = "wasm32"))]
fn timed<T>(f: impl FnOnce() -> T) -> (T, Option<Duration>) {
    let start = std::time::Instant::now();
    let value = f();
    (value, Some(start.elapsed()))
}

#[cfg(target_arch = "wasm32")]
fn timed<T>(f: impl FnOnce() -> T) -> (T, Option<Duration>) {
    (f(), None)
}
