//! The decode module contract and codec registry.
//!
//! Every codec adapter implements [`DecodeModule`] (session factory,
//! identified by a single-character codec id) and hands out
//! [`DecodeSession`] objects that do the actual work one bounded step at
//! a time. Codec selection is explicit through [`CodecRegistry`].

use std::{collections::HashMap, sync::Arc};

use crate::{
    error::DecodeError, flags::DecoderFlags, sink::SampleSink, source::StreamSource,
};

/// Parameters for starting a decode session.
#[derive(Debug, Clone)]
pub struct StartParams {
    /// Opaque codec-specific parameter bytes, passed through untouched.
    pub codec_params: Vec<u8>,
    /// Current output sample rate. Sessions assume this rate until
    /// stream metadata proves otherwise.
    pub output_sample_rate: u32,
}

impl Default for StartParams {
    fn default() -> Self {
        Self {
            codec_params: Vec::new(),
            output_sample_rate: 44_100,
        }
    }
}

/// A codec adapter: stateless session factory for one codec.
pub trait DecodeModule: Send + Sync {
    /// Single-character codec identifier used by the registry.
    fn id(&self) -> char;

    /// Creates one decode session. Fails only by propagating a codec
    /// library initialization failure; the engine never retries.
    fn start(&self, params: &StartParams) -> Result<Box<dyn DecodeSession>, DecodeError>;
}

/// One active decode session, owning the codec-library decoder and the
/// session-local state (sample rate, flags).
///
/// Sessions are single-thread objects: the scheduler, the adapter
/// callbacks and the source/sink all run synchronously inside one
/// [`step`](DecodeSession::step) call.
pub trait DecodeSession {
    /// Performs at most one bounded unit of decode work.
    ///
    /// Returns `false` when a previous step set the error flag or the
    /// session was stopped, and when the sink currently lacks room for
    /// one maximal output block (in which case the source is not
    /// touched). Otherwise one codec decode cycle runs and the call
    /// returns `true`; terminal conditions it discovers are recorded in
    /// the flags and observed on the next cycle.
    fn step(&mut self, source: &mut dyn StreamSource, sink: &mut dyn SampleSink) -> bool;

    /// Relative scheduling weight for re-invocation. Smaller means the
    /// driver should come back sooner. The values are opaque weights,
    /// not a unit of time.
    fn preferred_period(&self) -> u32;

    fn flags(&self) -> DecoderFlags;

    /// Current best-known sample rate.
    fn sample_rate(&self) -> u32;

    /// Worst-case bytes one step may append to the sink.
    fn max_step_output_bytes(&self) -> usize;

    /// Releases the codec decoder. Safe to call repeatedly, including on
    /// a session whose decoder was never fully created; also runs on
    /// drop.
    fn stop(&mut self);
}

/// Maps single-character codec ids to their decode modules.
pub struct CodecRegistry {
    modules: HashMap<char, Arc<dyn DecodeModule>>,
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self {
            modules: HashMap::new(),
        }
    }

    /// Registry with the built-in adapters (FLAC under `'f'`).
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(crate::flac::FlacModule));
        registry
    }

    /// Registers a module under its id, replacing any previous entry.
    pub fn register(&mut self, module: Arc<dyn DecodeModule>) {
        self.modules.insert(module.id(), module);
    }

    pub fn get(&self, id: char) -> Option<Arc<dyn DecodeModule>> {
        self.modules.get(&id).cloned()
    }

    pub fn ids(&self) -> impl Iterator<Item = char> + '_ {
        self.modules.keys().copied()
    }

    /// Starts a session for the requested codec.
    pub fn start(
        &self,
        id: char,
        params: &StartParams,
    ) -> Result<Box<dyn DecodeSession>, DecodeError> {
        match self.get(id) {
            Some(module) => module.start(params),
            None => {
                tracing::debug!(codec = %id, "no decode module registered");
                Err(DecodeError::UnknownCodec(id))
            }
        }
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}
