// Blink-to-morse decoding library
// Eye landmarks in, decoded text out, one session per camera stream

pub mod calibrate;
pub mod classify;
pub mod config;
pub mod decoder;
pub mod error;
pub mod model;
pub mod patterns;
pub mod ratio;
pub mod segment;
pub mod session;
pub mod threshold;
pub mod types;

#[cfg(feature = "runtime")]
pub mod runtime;

// Re-export main public API
pub use calibrate::{calibrate, SampleCollector, SampleRejection};
pub use classify::{Classifier, FeatureScaler, ModelStatus, Predictor};
pub use config::SessionConfig;
pub use decoder::MorseDecoder;
pub use error::{ConfigError, ModelError, PredictError, TrainingError};
pub use model::{load_model, parse_model, save_model, DenseNetwork, ModelBundle};
pub use ratio::{combined_ear, eye_aspect_ratio};
pub use segment::BlinkSegmenter;
pub use session::Session;
pub use threshold::ThresholdEstimator;
pub use types::*;

#[cfg(feature = "runtime")]
pub use runtime::{signal_channel, spawn_session, SessionHandle, SessionRunner, Signal};

/// Decode a string of `.`/`-` symbols as one letter
pub fn decode_pattern(pattern: &str) -> char {
    patterns::decode(&patterns::parse_pattern(pattern))
}

/// Morse pattern for every encodable character of `text`, words separated by `/`
pub fn encode_text(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            word.chars()
                .filter_map(patterns::pattern_for)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join(" / ")
}
