//! Async driver for one [`Session`].
//!
//! The producer (camera, landmark detector) overwrites a single latest-value
//! slot at whatever rate it runs. The runner polls that slot at a fixed
//! cadence, so a slow consumer drops stale frames instead of queueing them.

use crate::ratio;
use crate::session::Session;
use crate::types::{DecodeEvent, EyeLandmarks};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{self, Instant, MissedTickBehavior};

/// Decode events buffered for a slow consumer before new ones are dropped
const EVENT_BUFFER: usize = 64;

/// Latest derived signal for a stream
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Signal {
    /// No face in the latest frame
    #[default]
    Absent,
    Landmarks(EyeLandmarks),
    Ear(f64),
}

impl Signal {
    pub fn ear(&self) -> Option<f64> {
        match self {
            Signal::Absent => None,
            Signal::Landmarks(landmarks) => ratio::combined_ear(landmarks),
            Signal::Ear(value) => Some(*value),
        }
    }
}

/// Producer half of the latest-value slot
#[derive(Debug)]
pub struct SignalSender(watch::Sender<Signal>);

impl SignalSender {
    /// Replace whatever the runner has not yet seen
    pub fn send(&self, signal: Signal) {
        self.0.send_replace(signal);
    }
}

/// Consumer half of the latest-value slot
#[derive(Debug)]
pub struct SignalReceiver(watch::Receiver<Signal>);

impl SignalReceiver {
    /// Take the signal if it changed since the last call
    pub fn take_new(&mut self) -> Option<Signal> {
        match self.0.has_changed() {
            Ok(true) => Some(*self.0.borrow_and_update()),
            // A closed slot just means no more frames; keep ticking
            Ok(false) | Err(_) => None,
        }
    }
}

pub fn signal_channel() -> (SignalSender, SignalReceiver) {
    let (tx, rx) = watch::channel(Signal::Absent);
    (SignalSender(tx), SignalReceiver(rx))
}

/// Fixed-cadence loop owning one session
pub struct SessionRunner {
    session: Session,
    signals: SignalReceiver,
    events: mpsc::Sender<DecodeEvent>,
    active: Arc<AtomicBool>,
    cadence: Duration,
}

impl SessionRunner {
    pub fn new(
        session: Session,
        signals: SignalReceiver,
        events: mpsc::Sender<DecodeEvent>,
        active: Arc<AtomicBool>,
        cadence: Duration,
    ) -> Self {
        Self {
            session,
            signals,
            events,
            active,
            cadence,
        }
    }

    /// Run until the active flag is cleared or the event receiver is gone.
    /// Returns the session so its learned threshold can be reused.
    pub async fn run(mut self) -> Session {
        let origin = Instant::now();
        let mut interval = time::interval(self.cadence);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tracing::debug!("session runner started, cadence {:?}", self.cadence);

        while self.active.load(Ordering::Acquire) {
            interval.tick().await;
            if self.events.is_closed() {
                tracing::debug!("event receiver dropped");
                break;
            }
            let now = origin.elapsed().as_secs_f64();

            // One pipeline pass per new observation, otherwise a time-only tick
            let event = match self.signals.take_new() {
                Some(signal) => self.session.ingest_ear(signal.ear(), now),
                None => Some(self.session.tick(now)).filter(|event| !event.is_waiting()),
            };

            if let Some(event) = event {
                match self.events.try_send(event) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(event)) => {
                        tracing::warn!(status = ?event.status, "event consumer lagging, event dropped");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        tracing::debug!("event receiver dropped");
                        break;
                    }
                }
            }
        }

        tracing::debug!("session runner stopped");
        self.session
    }
}

/// Clears the active flag when dropped
#[derive(Debug)]
struct StopOnDrop(Arc<AtomicBool>);

impl Drop for StopOnDrop {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owner-side view of a spawned session. Dropping it stops the runner.
pub struct SessionHandle {
    signals: SignalSender,
    events: mpsc::Receiver<DecodeEvent>,
    active: StopOnDrop,
    task: JoinHandle<Session>,
}

impl SessionHandle {
    pub fn signals(&self) -> &SignalSender {
        &self.signals
    }

    pub async fn next_event(&mut self) -> Option<DecodeEvent> {
        self.events.recv().await
    }

    /// Request cancellation; honoured at the runner's next tick
    pub fn stop(&self) {
        self.active.0.store(false, Ordering::Release);
    }

    pub fn is_active(&self) -> bool {
        self.active.0.load(Ordering::Acquire)
    }

    /// Stop the runner and hand back its session
    pub async fn join(self) -> Result<Session, JoinError> {
        self.stop();
        self.task.await
    }
}

/// Spawn a runner for `session` on the current tokio runtime
pub fn spawn_session(session: Session, cadence: Duration) -> SessionHandle {
    let (signals, receiver) = signal_channel();
    let (events_tx, events) = mpsc::channel(EVENT_BUFFER);
    let active = Arc::new(AtomicBool::new(true));

    let runner = SessionRunner::new(session, receiver, events_tx, active.clone(), cadence);
    let task = tokio::spawn(runner.run());

    SessionHandle {
        signals,
        events,
        active: StopOnDrop(active),
        task,
    }
}
