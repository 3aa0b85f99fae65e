//! FLAC decode module.
//!
//! Wraps the libFLAC stream decoder. The callback registration happens
//! once at session start; every [`DecodeSession::step`] is the single
//! synchronous re-entry point that triggers exactly one library-internal
//! callback cycle (`FLAC__stream_decoder_process_single`) and folds the
//! observed decoder state into the session flags.

use std::ffi::c_void;

use libflac_sys::*;

use crate::{
    error::DecodeError,
    flags::DecoderFlags,
    module::{DecodeModule, DecodeSession, StartParams},
    pcm::{self, PcmFrame},
    sink::SampleSink,
    source::{SourceRead, StreamSource},
};

/// Largest block size a subset FLAC stream may produce, in samples per
/// channel.
const MAX_BLOCK_SAMPLES: usize = 4608;

/// Worst-case bytes one decode step may hand to the sink.
const MAX_STEP_OUTPUT_BYTES: usize = MAX_BLOCK_SAMPLES * pcm::STEREO_FRAME_BYTES;

/// FLAC decode module, registered under codec id `'f'`.
pub struct FlacModule;

impl DecodeModule for FlacModule {
    fn id(&self) -> char {
        'f'
    }

    fn start(&self, params: &StartParams) -> Result<Box<dyn DecodeSession>, DecodeError> {
        FlacSession::start(params).map(|session| Box::new(session) as Box<dyn DecodeSession>)
    }
}

/// Scheduling weight by sample-rate regime. Above 48 kHz the decoder
/// must be re-invoked sooner to keep pace with data production. The
/// values are opaque relative weights, not a unit of time.
pub(crate) fn period_for_rate(sample_rate: u32) -> u32 {
    if sample_rate <= 48_000 { 8 } else { 4 }
}

/// What the read callback reports back to libFLAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReadDecision {
    /// Hand over whatever was read (possibly zero bytes on a transient
    /// underrun) and keep decoding.
    Continue,
    /// Tell the codec the stream is finished.
    EndOfStream,
}

/// Folds one source read into the session flags and the status reported
/// back to the codec library.
pub(crate) fn fold_read(read: SourceRead, flags: &mut DecoderFlags) -> ReadDecision {
    if read.bytes == 0 {
        flags.set(DecoderFlags::UNDERRUN);
        if !read.streaming {
            return ReadDecision::EndOfStream;
        }
        ReadDecision::Continue
    } else {
        flags.clear(DecoderFlags::UNDERRUN);
        ReadDecision::Continue
    }
}

/// Source and sink borrowed for the duration of one `process_single`
/// call. Lives on the stack of [`FlacSession::step`]; the callbacks
/// reach it through the raw pointer stashed in [`ClientState`].
struct IoPorts<'a> {
    source: &'a mut dyn StreamSource,
    sink: &'a mut dyn SampleSink,
}

/// Session state shared with the libFLAC callbacks through
/// `client_data`. Boxed so its address stays stable while the session
/// moves.
struct ClientState {
    flags: DecoderFlags,
    sample_rate: u32,
    /// Set once the read callback has reported end of input to libFLAC;
    /// distinguishes a drained stream from an unexpected end.
    source_exhausted: bool,
    /// Points at the current step's [`IoPorts`]; null outside `step`.
    io: *mut c_void,
}

struct DecoderHandle {
    ptr: *mut FLAC__StreamDecoder,
}

impl DecoderHandle {
    fn release(&mut self) {
        if !self.ptr.is_null() {
            unsafe {
                FLAC__stream_decoder_delete(self.ptr);
            }
            self.ptr = std::ptr::null_mut();
        }
    }
}

impl Drop for DecoderHandle {
    fn drop(&mut self) {
        self.release();
    }
}

pub struct FlacSession {
    decoder: DecoderHandle,
    client: Box<ClientState>,
}

impl FlacSession {
    fn start(params: &StartParams) -> Result<Self, DecodeError> {
        tracing::debug!(
            rate_guess = params.output_sample_rate,
            "starting FLAC decode session"
        );

        let mut flags = DecoderFlags::empty();
        flags.set(DecoderFlags::RUNNING);

        let mut client = Box::new(ClientState {
            flags,
            // Assume the current output rate until metadata proves otherwise.
            sample_rate: params.output_sample_rate,
            source_exhausted: false,
            io: std::ptr::null_mut(),
        });

        let ptr = unsafe { FLAC__stream_decoder_new() };
        if ptr.is_null() {
            return Err(DecodeError::CodecInit(
                "FLAC__stream_decoder_new returned null".into(),
            ));
        }
        let decoder = DecoderHandle { ptr };

        let status = unsafe {
            FLAC__stream_decoder_init_stream(
                ptr,
                Some(read_callback),
                None, // seek
                None, // tell
                None, // length
                None, // eof
                Some(write_callback),
                Some(metadata_callback),
                Some(error_callback),
                &mut *client as *mut ClientState as *mut c_void,
            )
        };
        if status != FLAC__STREAM_DECODER_INIT_STATUS_OK {
            return Err(DecodeError::CodecInit(format!(
                "FLAC__stream_decoder_init_stream failed: status {status}"
            )));
        }

        Ok(Self { decoder, client })
    }
}

impl DecodeSession for FlacSession {
    fn step(&mut self, source: &mut dyn StreamSource, sink: &mut dyn SampleSink) -> bool {
        if self.client.flags.is_error() || self.decoder.ptr.is_null() {
            return false;
        }

        // Backpressure gate: without room for one maximal block the
        // source must not be touched at all.
        if !sink.has_capacity(MAX_STEP_OUTPUT_BYTES, self.client.sample_rate) {
            tracing::trace!("sink full, skipping decode step");
            return false;
        }

        let mut ports = IoPorts { source, sink };
        self.client.io = &mut ports as *mut IoPorts as *mut c_void;
        let state = unsafe {
            FLAC__stream_decoder_process_single(self.decoder.ptr);
            FLAC__stream_decoder_get_state(self.decoder.ptr)
        };
        self.client.io = std::ptr::null_mut();

        if state == FLAC__STREAM_DECODER_ABORTED
            || state == FLAC__STREAM_DECODER_MEMORY_ALLOCATION_ERROR
        {
            tracing::debug!(state, "libFLAC decoder aborted");
            self.client.flags.set(DecoderFlags::ERROR);
        } else if state == FLAC__STREAM_DECODER_END_OF_STREAM {
            if self.client.source_exhausted {
                tracing::debug!("FLAC stream fully drained");
                self.client.flags.set(DecoderFlags::END_OF_STREAM);
            } else {
                tracing::debug!("libFLAC reached end of stream unexpectedly");
                self.client.flags.set(DecoderFlags::ERROR);
            }
        }

        true
    }

    fn preferred_period(&self) -> u32 {
        period_for_rate(self.client.sample_rate)
    }

    fn flags(&self) -> DecoderFlags {
        self.client.flags
    }

    fn sample_rate(&self) -> u32 {
        self.client.sample_rate
    }

    fn max_step_output_bytes(&self) -> usize {
        MAX_STEP_OUTPUT_BYTES
    }

    fn stop(&mut self) {
        if !self.decoder.ptr.is_null() {
            tracing::debug!("stopping FLAC decode session");
        }
        self.decoder.release();
        self.client
            .flags
            .clear(DecoderFlags::RUNNING | DecoderFlags::UNDERRUN);
    }
}

unsafe extern "C" fn read_callback(
    _decoder: *const FLAC__StreamDecoder,
    buffer: *mut FLAC__byte,
    bytes: *mut usize,
    client_data: *mut c_void,
) -> FLAC__StreamDecoderReadStatus {
    let state = unsafe { &mut *(client_data as *mut ClientState) };

    if state.flags.is_error() {
        return FLAC__STREAM_DECODER_READ_STATUS_ABORT;
    }

    let requested = unsafe { *bytes };
    if requested == 0 {
        // A zero-byte request would deadlock the decoder.
        return FLAC__STREAM_DECODER_READ_STATUS_ABORT;
    }

    let io = state.io;
    if io.is_null() {
        return FLAC__STREAM_DECODER_READ_STATUS_ABORT;
    }
    let ports = unsafe { &mut *(io as *mut IoPorts) };
    let buf = unsafe { std::slice::from_raw_parts_mut(buffer, requested) };

    let read = ports.source.read(buf);
    unsafe {
        *bytes = read.bytes;
    }

    match fold_read(read, &mut state.flags) {
        ReadDecision::Continue => FLAC__STREAM_DECODER_READ_STATUS_CONTINUE,
        ReadDecision::EndOfStream => {
            state.source_exhausted = true;
            FLAC__STREAM_DECODER_READ_STATUS_END_OF_STREAM
        }
    }
}

unsafe extern "C" fn write_callback(
    _decoder: *const FLAC__StreamDecoder,
    frame: *const FLAC__Frame,
    buffer: *const *const FLAC__int32,
    client_data: *mut c_void,
) -> FLAC__StreamDecoderWriteStatus {
    let state = unsafe { &mut *(client_data as *mut ClientState) };

    if state.flags.is_error() {
        return FLAC__STREAM_DECODER_WRITE_STATUS_ABORT;
    }
    let io = state.io;
    if io.is_null() {
        return FLAC__STREAM_DECODER_WRITE_STATUS_ABORT;
    }
    let ports = unsafe { &mut *(io as *mut IoPorts) };

    let header = unsafe { &(*frame).header };
    let blocksize = header.blocksize as usize;
    let channels = header.channels as usize;
    if channels == 0 || channels > 2 {
        tracing::warn!(channels, "unsupported channel layout in decoded block");
        return FLAC__STREAM_DECODER_WRITE_STATUS_ABORT;
    }

    state.sample_rate = header.sample_rate;

    let left = unsafe { std::slice::from_raw_parts(*buffer, blocksize) };
    let right = if channels == 2 {
        Some(unsafe { std::slice::from_raw_parts(*buffer.add(1), blocksize) })
    } else {
        None
    };

    // The normalized buffer moves straight to the sink; nothing is
    // retained past this callback.
    let stereo = match pcm::normalize_block(header.bits_per_sample, left, right) {
        Ok(stereo) => stereo,
        Err(err) => {
            tracing::warn!(%err, "cannot normalize decoded block");
            return FLAC__STREAM_DECODER_WRITE_STATUS_ABORT;
        }
    };

    ports.sink.append(PcmFrame::new(stereo, header.sample_rate));

    FLAC__STREAM_DECODER_WRITE_STATUS_CONTINUE
}

unsafe extern "C" fn metadata_callback(
    _decoder: *const FLAC__StreamDecoder,
    metadata: *const FLAC__StreamMetadata,
    client_data: *mut c_void,
) {
    let state = unsafe { &mut *(client_data as *mut ClientState) };
    let metadata = unsafe { &*metadata };

    if metadata.type_ == FLAC__METADATA_TYPE_STREAMINFO {
        let sample_rate = unsafe { metadata.data.stream_info.sample_rate };
        tracing::debug!(sample_rate, "stream info reports sample rate");
        state.sample_rate = sample_rate;
    }
}

unsafe extern "C" fn error_callback(
    _decoder: *const FLAC__StreamDecoder,
    status: FLAC__StreamDecoderErrorStatus,
    _client_data: *mut c_void,
) {
    // step() folds the decoder state into the session flags; this only
    // records the report.
    tracing::warn!(status, "libFLAC decode error");
}
