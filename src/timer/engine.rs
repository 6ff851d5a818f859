//! Tick sources driving a timer session

use std::time::Duration;

use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::debug;

/// Something that delivers one tick per period while started
pub trait TickSource {
    /// Begin ticking, replacing any run already in progress
    fn start(&mut self);
    /// Stop ticking; a no-op when nothing runs
    fn stop(&mut self);
    fn is_running(&self) -> bool;
}

/// Tick source backed by a tokio interval task
///
/// Every run is tagged with a generation number that travels with each tick,
/// so ticks already queued by a stopped run can be told apart and dropped.
#[derive(Debug)]
pub struct IntervalEngine {
    period: Duration,
    tick_tx: mpsc::UnboundedSender<u64>,
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

impl IntervalEngine {
    /// Create an engine and the receiver its ticks arrive on
    pub fn new(period: Duration) -> (Self, mpsc::UnboundedReceiver<u64>) {
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        let engine = Self {
            period,
            tick_tx,
            generation: 0,
            handle: None,
        };
        (engine, tick_rx)
    }

    /// Whether a tick carrying `generation` belongs to the current run
    pub fn is_current(&self, generation: u64) -> bool {
        self.handle.is_some() && generation == self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl TickSource for IntervalEngine {
    fn start(&mut self) {
        self.stop();
        self.generation += 1;

        let generation = self.generation;
        let period = self.period;
        let tick_tx = self.tick_tx.clone();
        debug!("Starting tick engine run {}", generation);

        self.handle = Some(tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tick_tx.send(generation).is_err() {
                    break;
                }
            }
        }));
    }

    fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!("Stopping tick engine run {}", self.generation);
            handle.abort();
        }
    }

    fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for IntervalEngine {
    fn drop(&mut self) {
        self.stop();
    }
}
