#![allow(dead_code)]

//! Scripted fakes for driving the engine without a real codec library.

use std::{cell::RefCell, rc::Rc};

use pmodecode::{
    ChunkSource, DecodeSession, DecoderFlags, PcmFrame, STEREO_FRAME_BYTES, SampleSink,
    SourceRead, StreamSource, normalize_block,
};

/// Shared control block for [`FakeSession`], kept behind `Rc` so tests
/// can observe and poke the session after boxing it.
pub struct FakeCodecState {
    pub flags: DecoderFlags,
    pub sample_rate: u32,
    pub steps: usize,
    pub stops: usize,
    /// When set, the nth step simulates a codec abort.
    pub fail_on_step: Option<usize>,
}

/// Scripted decode session: treats every input byte as one 16-bit mono
/// sample and normalizes it the way a real adapter would.
pub struct FakeSession {
    state: Rc<RefCell<FakeCodecState>>,
    read_chunk: usize,
}

pub fn fake_session(
    sample_rate: u32,
    read_chunk: usize,
) -> (FakeSession, Rc<RefCell<FakeCodecState>>) {
    let mut flags = DecoderFlags::empty();
    flags.set(DecoderFlags::RUNNING);
    let state = Rc::new(RefCell::new(FakeCodecState {
        flags,
        sample_rate,
        steps: 0,
        stops: 0,
        fail_on_step: None,
    }));
    (
        FakeSession {
            state: state.clone(),
            read_chunk,
        },
        state,
    )
}

impl DecodeSession for FakeSession {
    fn step(&mut self, source: &mut dyn StreamSource, sink: &mut dyn SampleSink) -> bool {
        let mut st = self.state.borrow_mut();
        if st.flags.is_error() {
            return false;
        }
        if !sink.has_capacity(self.read_chunk * STEREO_FRAME_BYTES, st.sample_rate) {
            return false;
        }

        st.steps += 1;
        if st.fail_on_step == Some(st.steps) {
            st.flags.set(DecoderFlags::ERROR);
            return true;
        }

        let mut buf = vec![0u8; self.read_chunk];
        let SourceRead { bytes, streaming } = source.read(&mut buf);
        if bytes == 0 {
            st.flags.set(DecoderFlags::UNDERRUN);
            if !streaming {
                st.flags.set(DecoderFlags::END_OF_STREAM);
            }
            return true;
        }
        st.flags.clear(DecoderFlags::UNDERRUN);

        let samples: Vec<i32> = buf[..bytes].iter().map(|&b| b as i32).collect();
        let stereo = normalize_block(16, &samples, None).expect("16-bit mono always normalizes");
        let rate = st.sample_rate;
        sink.append(PcmFrame::new(stereo, rate));
        true
    }

    fn preferred_period(&self) -> u32 {
        if self.state.borrow().sample_rate <= 48_000 {
            8
        } else {
            4
        }
    }

    fn flags(&self) -> DecoderFlags {
        self.state.borrow().flags
    }

    fn sample_rate(&self) -> u32 {
        self.state.borrow().sample_rate
    }

    fn max_step_output_bytes(&self) -> usize {
        self.read_chunk * STEREO_FRAME_BYTES
    }

    fn stop(&mut self) {
        let mut st = self.state.borrow_mut();
        st.stops += 1;
        st.flags.clear(DecoderFlags::RUNNING | DecoderFlags::UNDERRUN);
    }
}

/// Counts how often the engine pulls from the wrapped source.
pub struct CountingSource {
    pub inner: ChunkSource,
    pub reads: usize,
}

impl CountingSource {
    pub fn new(inner: ChunkSource) -> Self {
        Self { inner, reads: 0 }
    }
}

impl StreamSource for CountingSource {
    fn read(&mut self, buf: &mut [u8]) -> SourceRead {
        self.reads += 1;
        self.inner.read(buf)
    }
}
