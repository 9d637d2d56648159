//! Offline replay of recorded EAR / landmark traces

use anyhow::{bail, Context};
use blinkmorse_core::{DecodeEvent, EyeContour, EyeLandmarks, Session};
use serde::Deserialize;
use std::path::Path;

/// One recorded camera frame. `ear` wins over landmarks when both are present;
/// a frame with neither means no face was detected.
#[derive(Debug, Clone, Deserialize)]
pub struct Frame {
    pub t: f64,
    #[serde(default)]
    pub ear: Option<f64>,
    #[serde(default)]
    pub left: Option<EyeContour>,
    #[serde(default)]
    pub right: Option<EyeContour>,
}

impl Frame {
    fn landmarks(&self) -> Option<EyeLandmarks> {
        Some(EyeLandmarks::new(self.left?, self.right?))
    }
}

/// An event together with the trace time that produced it
#[derive(Debug, Clone)]
pub struct TimedEvent {
    pub t: f64,
    pub event: DecodeEvent,
}

pub fn load_trace(path: &Path) -> anyhow::Result<Vec<Frame>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read trace {}", path.display()))?;
    let frames: Vec<Frame> = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse trace {}", path.display()))?;
    check_order(&frames)?;
    Ok(frames)
}

fn check_order(frames: &[Frame]) -> anyhow::Result<()> {
    for (i, pair) in frames.windows(2).enumerate() {
        if !(pair[1].t >= pair[0].t) {
            bail!(
                "frame {} at t={} goes back in time from t={}",
                i + 1,
                pair[1].t,
                pair[0].t
            );
        }
    }
    Ok(())
}

/// Feed every frame in order, then keep ticking at the session cadence until
/// both pauses have elapsed past the last frame so trailing letters and the
/// final space are flushed.
pub fn replay(session: &mut Session, frames: &[Frame]) -> Vec<TimedEvent> {
    let mut events = Vec::new();

    for frame in frames {
        let event = match frame.ear {
            Some(ear) => session.ingest_ear(Some(ear), frame.t),
            None => session.ingest(frame.landmarks().as_ref(), frame.t),
        };
        if let Some(event) = event {
            events.push(TimedEvent { t: frame.t, event });
        }
    }

    let Some(last) = frames.last().map(|f| f.t) else {
        return events;
    };
    let config = session.config();
    let step = config.tick_interval().as_secs_f64();
    // Both pause checks are strict and run on tick boundaries, so allow a few ticks of slack
    let end = last + config.letter_pause + config.space_pause + 3.0 * step;

    let mut tick = 1u64;
    loop {
        let t = last + tick as f64 * step;
        if t > end {
            break;
        }
        let event = session.tick(t);
        if !event.is_waiting() {
            events.push(TimedEvent { t, event });
        }
        tick += 1;
    }

    tracing::debug!(frames = frames.len(), events = events.len(), "replay finished");
    events
}
