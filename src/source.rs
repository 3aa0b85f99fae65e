//! Compressed byte source seam.
//!
//! The engine pulls compressed input through [`StreamSource`], a
//! non-blocking read contract: a call must return promptly with zero
//! bytes rather than wait for data to arrive.

use std::{cell::RefCell, collections::VecDeque, rc::Rc};

/// Result of one [`StreamSource::read`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRead {
    /// Bytes copied into the caller's buffer.
    pub bytes: usize,
    /// Whether the source expects more data to arrive. Zero bytes with
    /// `streaming == false` is the definitive end of input; zero bytes
    /// with `streaming == true` is transient starvation.
    pub streaming: bool,
}

pub trait StreamSource {
    /// Copies up to `buf.len()` bytes of compressed input into `buf`.
    fn read(&mut self, buf: &mut [u8]) -> SourceRead;
}

impl<S: StreamSource> StreamSource for Rc<RefCell<S>> {
    fn read(&mut self, buf: &mut [u8]) -> SourceRead {
        self.borrow_mut().read(buf)
    }
}

/// In-memory source fed explicitly, for tests and local experiments.
///
/// Bytes pushed with [`push`](ChunkSource::push) are handed out in order;
/// [`finish`](ChunkSource::finish) marks the end of input while leaving
/// any pending bytes readable.
#[derive(Debug, Default)]
pub struct ChunkSource {
    data: VecDeque<u8>,
    finished: bool,
}

impl ChunkSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bytes(bytes: &[u8]) -> Self {
        let mut source = Self::new();
        source.push(bytes);
        source
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.data.extend(bytes);
    }

    /// Marks the end of input. Pending bytes stay readable.
    pub fn finish(&mut self) {
        self.finished = true;
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl StreamSource for ChunkSource {
    fn read(&mut self, buf: &mut [u8]) -> SourceRead {
        let n = buf.len().min(self.data.len());
        for (dst, src) in buf.iter_mut().zip(self.data.drain(..n)) {
            *dst = src;
        }
        SourceRead {
            bytes: n,
            streaming: !self.finished,
        }
    }
}
