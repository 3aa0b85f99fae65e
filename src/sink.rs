//! PCM output sink seam.
//!
//! The sink is the sole arbiter of backpressure: the engine asks
//! [`SampleSink::has_capacity`] before every decode step and never
//! appends more than it was promised room for.

use std::{cell::RefCell, rc::Rc};

use crate::pcm::PcmFrame;

pub trait SampleSink {
    /// Whether the sink can take `bytes` more output at `sample_rate`
    /// right now.
    fn has_capacity(&self, bytes: usize, sample_rate: u32) -> bool;

    /// Takes ownership of one finished frame.
    fn append(&mut self, frame: PcmFrame);
}

impl<K: SampleSink> SampleSink for Rc<RefCell<K>> {
    fn has_capacity(&self, bytes: usize, sample_rate: u32) -> bool {
        self.borrow().has_capacity(bytes, sample_rate)
    }

    fn append(&mut self, frame: PcmFrame) {
        self.borrow_mut().append(frame)
    }
}

/// Bounded in-memory sink; capacity is a byte budget across buffered
/// frames. Used by tests and local playback experiments.
#[derive(Debug)]
pub struct BufferSink {
    frames: Vec<PcmFrame>,
    buffered_bytes: usize,
    max_bytes: usize,
}

impl BufferSink {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            frames: Vec::new(),
            buffered_bytes: 0,
            max_bytes,
        }
    }

    pub fn frames(&self) -> &[PcmFrame] {
        &self.frames
    }

    pub fn buffered_bytes(&self) -> usize {
        self.buffered_bytes
    }

    /// Drains the buffered frames, freeing their capacity.
    pub fn take_frames(&mut self) -> Vec<PcmFrame> {
        self.buffered_bytes = 0;
        std::mem::take(&mut self.frames)
    }
}

impl SampleSink for BufferSink {
    fn has_capacity(&self, bytes: usize, _sample_rate: u32) -> bool {
        self.buffered_bytes + bytes <= self.max_bytes
    }

    fn append(&mut self, frame: PcmFrame) {
        self.buffered_bytes += frame.byte_len();
        self.frames.push(frame);
    }
}
