use crate::config::SessionConfig;
use std::collections::VecDeque;

/// Mean and population standard deviation of a sample window
#[derive(Debug, Clone, Copy)]
struct WindowStats {
    mean: f64,
    std_dev: f64,
}

impl WindowStats {
    fn new<'a>(values: impl ExactSizeIterator<Item = &'a f64> + Clone) -> Option<Self> {
        let len = values.len();
        if len == 0 {
            return None;
        }

        let n = len as f64;
        let mean = values.clone().sum::<f64>() / n;
        let variance = values.map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        Some(Self {
            mean,
            std_dev: variance.sqrt(),
        })
    }
}

/// Slowly adapting closed-eye threshold learned from recent EAR values
#[derive(Debug, Clone)]
pub struct ThresholdEstimator {
    history: VecDeque<f64>,
    threshold: f64,
    capacity: usize,
    sample_window: usize,
    bounds: (f64, f64),
    smoothing: f64,
    std_multiplier: f64,
}

impl Default for ThresholdEstimator {
    fn default() -> Self {
        Self::new(&SessionConfig::default())
    }
}

impl ThresholdEstimator {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            history: VecDeque::with_capacity(config.ear_history_window),
            threshold: config.initial_threshold,
            capacity: config.ear_history_window,
            sample_window: config.threshold_sample_window,
            bounds: (config.threshold_min, config.threshold_max),
            smoothing: config.threshold_smoothing,
            std_multiplier: config.threshold_std_multiplier,
        }
    }

    /// Feed one sample; absent or non-finite samples leave history and
    /// threshold alone. Returns the threshold to use for this tick.
    pub fn update(&mut self, ear: Option<f64>) -> f64 {
        let Some(ear) = ear.filter(|value| value.is_finite()) else {
            return self.threshold;
        };

        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(ear);

        if self.history.len() >= self.sample_window {
            let recent = self.history.range(self.history.len() - self.sample_window..);
            if let Some(stats) = WindowStats::new(recent) {
                let (low, high) = self.bounds;
                let candidate = (stats.mean - self.std_multiplier * stats.std_dev).clamp(low, high);
                let previous = self.threshold;
                self.threshold = self.smoothing * previous + (1.0 - self.smoothing) * candidate;
                tracing::trace!(
                    mean = stats.mean,
                    std_dev = stats.std_dev,
                    candidate,
                    threshold = self.threshold,
                    "threshold updated"
                );
            }
        }

        self.threshold
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn history(&self) -> impl Iterator<Item = f64> + '_ {
        self.history.iter().copied()
    }
}
