//! # pmodecode
//!
//! Cooperative streaming-audio decode engine with pluggable codec
//! adapters.
//!
//! A [`DecodeModule`] wraps one codec library and hands out
//! [`DecodeSession`]s that turn a compressed byte stream
//! ([`StreamSource`]) into normalized interleaved-stereo `i32` PCM
//! frames appended to a bounded [`SampleSink`]. The [`DecodeScheduler`]
//! drives sessions one bounded step at a time and only when the sink has
//! room for a full block, so the engine never overruns its consumer and
//! never blocks on a starved source: underrun and backpressure are state
//! observations, not errors.
//!
//! ## Example: decode a FLAC byte stream
//!
//! ```no_run
//! use pmodecode::{
//!     BufferSink, ChunkSource, CodecRegistry, DecodeDriver, DecodeScheduler, StartParams,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), pmodecode::DecodeError> {
//!     let registry = CodecRegistry::with_builtins();
//!     let session = registry.start('f', &StartParams::default())?;
//!
//!     let mut source = ChunkSource::new();
//!     source.push(&std::fs::read("audio.flac").expect("readable input"));
//!     source.finish();
//!     let sink = BufferSink::new(512 * 1024);
//!
//!     let driver = DecodeDriver::new(
//!         DecodeScheduler::new(session),
//!         Box::new(source),
//!         Box::new(sink),
//!     );
//!     let phase = driver.run(CancellationToken::new()).await;
//!     println!("decode finished in phase {phase:?}");
//!     Ok(())
//! }
//! ```

pub mod driver;
pub mod error;
pub mod flac;
pub mod flags;
pub mod module;
pub mod pcm;
pub mod scheduler;
pub mod sink;
pub mod source;

pub use driver::{DEFAULT_TICK, DecodeDriver};
pub use error::DecodeError;
pub use flac::FlacModule;
pub use flags::DecoderFlags;
pub use module::{CodecRegistry, DecodeModule, DecodeSession, StartParams};
pub use pcm::{PcmFrame, STEREO_FRAME_BYTES, normalize_block};
pub use scheduler::{CycleOutcome, DecodeScheduler, SessionPhase};
pub use sink::{BufferSink, SampleSink};
pub use source::{ChunkSource, SourceRead, StreamSource};
