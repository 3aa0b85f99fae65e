//! Timer-driven decode loop.
//!
//! The engine itself is a pull of one cycle at a time; this driver is
//! the loop around it: run a cycle, sleep the session's preferred
//! period, repeat until the session ends or the caller cancels.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::{
    scheduler::{CycleOutcome, DecodeScheduler, SessionPhase},
    sink::SampleSink,
    source::StreamSource,
};

/// Default real-time value of one scheduling tick. Preferred periods are
/// relative weights; the driver multiplies them by this tick.
pub const DEFAULT_TICK: Duration = Duration::from_millis(1);

/// Owns a scheduler plus its source and sink, and drives decode cycles
/// on a timer.
pub struct DecodeDriver {
    scheduler: DecodeScheduler,
    source: Box<dyn StreamSource>,
    sink: Box<dyn SampleSink>,
    tick: Duration,
}

impl DecodeDriver {
    pub fn new(
        scheduler: DecodeScheduler,
        source: Box<dyn StreamSource>,
        sink: Box<dyn SampleSink>,
    ) -> Self {
        Self {
            scheduler,
            source,
            sink,
            tick: DEFAULT_TICK,
        }
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Runs decode cycles until the session reaches a terminal phase or
    /// `stop` fires. The session is stopped before returning; the phase
    /// it had reached is returned.
    pub async fn run(mut self, stop: CancellationToken) -> SessionPhase {
        loop {
            let outcome = self.scheduler.cycle(self.source.as_mut(), self.sink.as_mut());
            if outcome == CycleOutcome::Terminal {
                let phase = self.scheduler.phase();
                tracing::debug!(?phase, "decode driver finished");
                self.scheduler.stop();
                return phase;
            }

            let delay = self.tick * self.scheduler.preferred_period();
            tokio::select! {
                _ = stop.cancelled() => {
                    let phase = self.scheduler.phase();
                    tracing::debug!(?phase, "decode driver cancelled");
                    self.scheduler.stop();
                    return phase;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
