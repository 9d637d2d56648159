use crate::classify::{Classifier, ModelStatus};
use crate::config::SessionConfig;
use crate::decoder::MorseDecoder;
use crate::ratio;
use crate::segment::BlinkSegmenter;
use crate::threshold::ThresholdEstimator;
use crate::types::{DecodeEvent, DecodeOutcome, EyeLandmarks, Symbol};
use std::path::Path;

/// One stream's pipeline: EAR -> threshold -> segmenter -> classifier -> decoder.
///
/// A session is single-owner. Concurrent streams each get their own.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    threshold: ThresholdEstimator,
    segmenter: BlinkSegmenter,
    classifier: Classifier,
    decoder: MorseDecoder,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl Session {
    /// Threshold-only session using the configured dot threshold
    pub fn new(config: SessionConfig) -> Self {
        let classifier = Classifier::from_config(&config);
        Self::with_classifier(config, classifier)
    }

    pub fn with_classifier(config: SessionConfig, classifier: Classifier) -> Self {
        let classifier = classifier.with_budget(config.inference_budget());
        Self {
            threshold: ThresholdEstimator::new(&config),
            segmenter: BlinkSegmenter::new(&config),
            decoder: MorseDecoder::new(&config),
            classifier,
            config,
        }
    }

    /// Session backed by the profile at `path`, or threshold-only if it cannot be loaded
    pub fn with_profile(config: SessionConfig, path: &Path) -> (Self, ModelStatus) {
        let (classifier, status) = Classifier::load_or_fallback(path);
        (Self::with_classifier(config, classifier), status)
    }

    /// Swap the classifier, e.g. after calibration. Learned threshold is kept.
    pub fn set_classifier(&mut self, classifier: Classifier) {
        self.classifier = classifier.with_budget(self.config.inference_budget());
    }

    /// One pipeline pass for a new frame; `None` means no face was found.
    pub fn ingest(&mut self, landmarks: Option<&EyeLandmarks>, now: f64) -> Option<DecodeEvent> {
        let ear = landmarks.and_then(ratio::combined_ear);
        self.ingest_ear(ear, now)
    }

    /// One pipeline pass from a precomputed EAR.
    ///
    /// An absent EAR stalls threshold adaptation and segmentation for this
    /// pass; the decoder's pause checks still run. A non-finite EAR or one
    /// outside `[0, 1]` counts as absent.
    pub fn ingest_ear(&mut self, ear: Option<f64>, now: f64) -> Option<DecodeEvent> {
        let mut symbol = None;
        let ear = ear.filter(|value| {
            let valid = value.is_finite() && (0.0..=1.0).contains(value);
            if !valid {
                tracing::debug!(ear = value, "invalid EAR treated as absent");
            }
            valid
        });

        if let Some(value) = ear {
            let threshold = self.threshold.update(Some(value));
            if let Some(blink) = self.segmenter.update(Some(value), threshold, now) {
                let classified = self.classifier.classify(&blink);
                tracing::debug!(
                    duration = blink.duration,
                    "blink classified as {}",
                    classified.as_char()
                );
                self.decoder.push_symbol(classified, now);
                symbol = Some(classified);
            }
        }

        let outcome = self.decoder.tick(now);
        if symbol.is_some() || outcome != DecodeOutcome::Waiting {
            Some(self.event(outcome, symbol))
        } else {
            None
        }
    }

    /// Advance time without a new observation
    pub fn tick(&mut self, now: f64) -> DecodeEvent {
        let outcome = self.decoder.tick(now);
        self.event(outcome, None)
    }

    fn event(&self, outcome: DecodeOutcome, symbol: Option<Symbol>) -> DecodeEvent {
        DecodeEvent {
            status: outcome.status(),
            char: outcome.decoded_char(),
            message: self.decoder.message().to_string(),
            sequence: self.decoder.sequence_string(),
            symbol,
        }
    }

    /// Clear message, sequence, timers and any closure in progress.
    /// The adaptive threshold and the classifier survive.
    pub fn reset(&mut self) {
        self.decoder.reset();
        self.segmenter.reset();
        tracing::info!("session reset");
    }

    pub fn message(&self) -> &str {
        self.decoder.message()
    }

    pub fn sequence(&self) -> String {
        self.decoder.sequence_string()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold.threshold()
    }

    pub fn threshold_history_len(&self) -> usize {
        self.threshold.history_len()
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}
