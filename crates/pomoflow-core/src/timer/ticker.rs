//! One-second tick source for the countdown.
//!
//! Ticks are produced by a tokio interval task and delivered over a channel
//! of capacity one, so the producer can never run ahead of the single
//! consumer by more than one tick. Every `start` opens a new generation;
//! ticks from an older generation that are still queued after `stop` are
//! dropped on receipt.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::trace;

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub struct Ticker {
    period: Duration,
    generation: u64,
    tx: mpsc::Sender<u64>,
    rx: mpsc::Receiver<u64>,
    task: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        let (tx, rx) = mpsc::channel(1);
        Self {
            period,
            generation: 0,
            tx,
            rx,
            task: None,
        }
    }

    pub fn every_second() -> Self {
        Self::new(TICK_PERIOD)
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Begin ticking. No-op if already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        if self.task.is_some() {
            return;
        }
        self.generation += 1;
        let generation = self.generation;
        let period = self.period;
        let tx = self.tx.clone();
        self.task = Some(tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(generation).await.is_err() {
                    break;
                }
            }
        }));
        trace!(generation, "ticker started");
    }

    /// Cancel the tick task. Queued ticks from this run are discarded.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            self.generation += 1;
            trace!(generation = self.generation, "ticker stopped");
        }
    }

    /// Wait for the next tick of the current run.
    ///
    /// Returns `false` immediately when the ticker is stopped.
    pub async fn next_tick(&mut self) -> bool {
        loop {
            if self.task.is_none() {
                return false;
            }
            match self.rx.recv().await {
                Some(generation) if generation == self.generation => return true,
                Some(_) => continue,
                None => return false,
            }
        }
    }
}

impl Default for Ticker {
    fn default() -> Self {
        Self::every_second()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
