//! Persisted per-user classifier profile.
//!
//! A profile at path `P` is two companion files:
//! - `P_data.json`: scaler, calibrated dot threshold and a `hasModel` flag
//! - `P_model.json`: optional dense network trained elsewhere
//!
//! A missing network is a valid threshold-only profile. A missing or corrupted
//! data file means there is no usable profile at all.

use crate::classify::{
    FeatureScaler, Features, Predictor, DEFAULT_DOT_THRESHOLD, FEATURE_COUNT,
};
use crate::error::{ModelError, PredictError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Relu,
    Sigmoid,
    Linear,
}

impl Activation {
    fn apply(&self, x: f64) -> f64 {
        match self {
            Activation::Relu => x.max(0.0),
            Activation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Activation::Linear => x,
        }
    }
}

/// Fully connected layer, `weights[out][in]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseLayer {
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
    pub activation: Activation,
}

impl DenseLayer {
    fn inputs(&self) -> usize {
        self.weights.first().map(Vec::len).unwrap_or(0)
    }

    fn forward(&self, input: &[f64]) -> Vec<f64> {
        self.weights
            .iter()
            .zip(&self.bias)
            .map(|(row, bias)| {
                let sum: f64 = row.iter().zip(input).map(|(w, x)| w * x).sum();
                self.activation.apply(sum + bias)
            })
            .collect()
    }
}

/// Small feed-forward network: 4 scaled features in, one probability out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseNetwork {
    pub layers: Vec<DenseLayer>,
}

impl DenseNetwork {
    /// Check that layer shapes chain from 4 inputs to 1 output
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.layers.is_empty() {
            return Err(ModelError::Shape("network has no layers".to_string()));
        }

        let mut width = FEATURE_COUNT;
        for (i, layer) in self.layers.iter().enumerate() {
            if layer.weights.is_empty() {
                return Err(ModelError::Shape(format!("layer {i} has no units")));
            }
            if layer.weights.iter().any(|row| row.len() != width) {
                return Err(ModelError::Shape(format!(
                    "layer {i} expects {} inputs, previous layer gives {width}",
                    layer.inputs()
                )));
            }
            if layer.bias.len() != layer.weights.len() {
                return Err(ModelError::Shape(format!(
                    "layer {i} has {} units but {} biases",
                    layer.weights.len(),
                    layer.bias.len()
                )));
            }
            width = layer.weights.len();
        }

        if width != 1 {
            return Err(ModelError::Shape(format!(
                "network must end in 1 output, got {width}"
            )));
        }
        Ok(())
    }
}

impl Predictor for DenseNetwork {
    fn predict(&self, features: &Features) -> Result<f64, PredictError> {
        if features.iter().any(|v| !v.is_finite()) {
            return Err(PredictError::NonFinite("features"));
        }

        let mut activations = features.to_vec();
        for layer in &self.layers {
            if layer.inputs() != activations.len() {
                return Err(PredictError::FeatureWidth {
                    expected: layer.inputs(),
                    actual: activations.len(),
                });
            }
            activations = layer.forward(&activations);
        }

        match activations.as_slice() {
            [probability] if probability.is_finite() => Ok(*probability),
            [_] => Err(PredictError::NonFinite("network output")),
            other => Err(PredictError::FeatureWidth {
                expected: 1,
                actual: other.len(),
            }),
        }
    }
}

/// Contents of `P_data.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileData {
    scaler: FeatureScaler,
    #[serde(default = "default_dot_threshold")]
    dot_threshold: f64,
    #[serde(default)]
    has_model: bool,
}

fn default_dot_threshold() -> f64 {
    DEFAULT_DOT_THRESHOLD
}

/// Everything a classifier needs from a trained profile
#[derive(Debug, Clone, PartialEq)]
pub struct ModelBundle {
    pub scaler: FeatureScaler,
    pub network: Option<DenseNetwork>,
    pub dot_threshold: f64,
}

impl ModelBundle {
    pub fn threshold_only(dot_threshold: f64) -> Self {
        Self {
            scaler: FeatureScaler::identity(),
            network: None,
            dot_threshold,
        }
    }

    /// Attach a network trained outside this crate
    pub fn with_network(mut self, network: DenseNetwork) -> Result<Self, ModelError> {
        network.validate()?;
        self.network = Some(network);
        Ok(self)
    }
}

pub fn data_path(profile: &Path) -> PathBuf {
    suffixed(profile, "_data.json")
}

pub fn network_path(profile: &Path) -> PathBuf {
    suffixed(profile, "_model.json")
}

fn suffixed(profile: &Path, suffix: &str) -> PathBuf {
    let mut name = profile.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ModelError> {
    let text = fs::read_to_string(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => ModelError::NotFound {
            path: path.to_path_buf(),
        },
        _ => ModelError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;
    serde_json::from_str(&text).map_err(|source| ModelError::Corrupted {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a profile. A broken network file degrades to threshold-only with a
/// warning; a broken data file is an error.
pub fn load_model(profile: &Path) -> Result<ModelBundle, ModelError> {
    let data: ProfileData = read_json(&data_path(profile))?;
    tracing::debug!("reading profile {}", profile.display());
    assemble(data, || read_json(&network_path(profile)))
}

/// Same as [`load_model`] for artifacts already in memory, e.g. fetched by a browser
pub fn parse_model(data_json: &str, network_json: Option<&str>) -> Result<ModelBundle, ModelError> {
    let data: ProfileData = serde_json::from_str(data_json)?;
    assemble(data, || match network_json {
        Some(text) => Ok(serde_json::from_str(text)?),
        None => Err(ModelError::Shape("profile expects a network".to_string())),
    })
}

fn assemble(
    data: ProfileData,
    network: impl FnOnce() -> Result<DenseNetwork, ModelError>,
) -> Result<ModelBundle, ModelError> {
    data.scaler
        .validate()
        .map_err(|e| ModelError::Shape(format!("scaler: {e}")))?;
    if !(data.dot_threshold.is_finite() && data.dot_threshold > 0.0) {
        return Err(ModelError::Shape(format!(
            "dot threshold {} is not positive",
            data.dot_threshold
        )));
    }

    let network = if data.has_model {
        match network().and_then(|n| n.validate().map(|()| n)) {
            Ok(network) => Some(network),
            Err(e) => {
                tracing::warn!("network unusable ({e}), using threshold fallback");
                None
            }
        }
    } else {
        None
    };

    Ok(ModelBundle {
        scaler: data.scaler,
        network,
        dot_threshold: data.dot_threshold,
    })
}

/// Write both artifacts; the network file is only written when present
pub fn save_model(bundle: &ModelBundle, profile: &Path) -> Result<(), ModelError> {
    let write = |path: PathBuf, text: String| {
        fs::write(&path, text).map_err(|source| ModelError::Io { path, source })
    };
    let encode = |path: &Path, result: serde_json::Result<String>| {
        result.map_err(|source| ModelError::Corrupted {
            path: path.to_path_buf(),
            source,
        })
    };

    if let Some(network) = &bundle.network {
        let path = network_path(profile);
        let text = encode(&path, serde_json::to_string_pretty(network))?;
        write(path, text)?;
    }

    let data = ProfileData {
        scaler: bundle.scaler.clone(),
        dot_threshold: bundle.dot_threshold,
        has_model: bundle.network.is_some(),
    };
    let path = data_path(profile);
    let text = encode(&path, serde_json::to_string_pretty(&data))?;
    write(path, text)?;

    tracing::info!("profile saved to {}", profile.display());
    Ok(())
}
