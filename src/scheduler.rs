//! Cooperative decode scheduling.
//!
//! The scheduler runs at most one decode step per cycle. A cycle is
//! skipped entirely when the sink lacks room for one maximal output
//! block — no source read happens and no flag changes — which is the
//! engine's sole backpressure mechanism.

use crate::{
    flags::DecoderFlags, module::DecodeSession, sink::SampleSink, source::StreamSource,
};

/// Where a decode session currently is in its lifecycle.
///
/// `Underrun` is not terminal: the session returns to `Running` once the
/// source produces data again. `Error` and `EndOfStream` are terminal
/// until an explicit stop/start cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Session created, no step issued yet.
    Started,
    Running,
    /// Source temporarily starved while still live.
    Underrun,
    /// Source drained and the codec finished its buffered data.
    EndOfStream,
    /// Sticky decode failure.
    Error,
    Stopped,
}

impl SessionPhase {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionPhase::EndOfStream | SessionPhase::Error | SessionPhase::Stopped
        )
    }
}

/// What one scheduler cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// One decode step ran.
    Stepped,
    /// The sink lacked room for a maximal block; nothing happened.
    Backpressure,
    /// The session is in a terminal phase; the caller should stop it
    /// (and may start a new session).
    Terminal,
}

pub struct DecodeScheduler {
    session: Box<dyn DecodeSession>,
    phase: SessionPhase,
}

impl DecodeScheduler {
    pub fn new(session: Box<dyn DecodeSession>) -> Self {
        Self {
            session,
            phase: SessionPhase::Started,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn session(&self) -> &dyn DecodeSession {
        self.session.as_ref()
    }

    pub fn preferred_period(&self) -> u32 {
        self.session.preferred_period()
    }

    /// Runs at most one decode step.
    pub fn cycle(
        &mut self,
        source: &mut dyn StreamSource,
        sink: &mut dyn SampleSink,
    ) -> CycleOutcome {
        if self.phase.is_terminal() {
            return CycleOutcome::Terminal;
        }

        if let Some(phase) = terminal_phase(self.session.flags()) {
            tracing::debug!(?phase, "decode session terminal");
            self.phase = phase;
            return CycleOutcome::Terminal;
        }

        if !sink.has_capacity(self.session.max_step_output_bytes(), self.session.sample_rate())
        {
            tracing::trace!("sink backpressure, skipping cycle");
            return CycleOutcome::Backpressure;
        }

        let keep_going = self.session.step(source, sink);
        let flags = self.session.flags();

        if !keep_going {
            // Capacity was available, so a refusal is terminal.
            self.phase = terminal_phase(flags).unwrap_or(SessionPhase::Error);
            tracing::debug!(phase = ?self.phase, "decode step refused to continue");
            return CycleOutcome::Terminal;
        }

        self.phase = match terminal_phase(flags) {
            Some(phase) => phase,
            None if flags.is_underrun() => SessionPhase::Underrun,
            None => SessionPhase::Running,
        };
        CycleOutcome::Stepped
    }

    /// Stops the session and parks the scheduler. Safe to call
    /// repeatedly.
    pub fn stop(&mut self) {
        self.session.stop();
        self.phase = SessionPhase::Stopped;
    }
}

fn terminal_phase(flags: DecoderFlags) -> Option<SessionPhase> {
    if flags.is_error() {
        Some(SessionPhase::Error)
    } else if flags.is_end_of_stream() {
        Some(SessionPhase::EndOfStream)
    } else {
        None
    }
}
