/// Per-session decoder state bits.
///
/// The decode engine historically kept these in a process-wide bitmask;
/// here every session owns its copy so concurrent sessions stay
/// independently observable. `ERROR` and `END_OF_STREAM` are sticky:
/// once set they stay set for the remainder of the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderFlags(u32);

impl DecoderFlags {
    /// Session started and not yet stopped.
    pub const RUNNING: u32 = 1 << 0;
    /// The last source read returned no data while the source stayed live.
    pub const UNDERRUN: u32 = 1 << 1;
    /// Terminal decode failure.
    pub const ERROR: u32 = 1 << 2;
    /// The codec drained a source that reported end of input.
    pub const END_OF_STREAM: u32 = 1 << 3;

    const STICKY: u32 = Self::ERROR | Self::END_OF_STREAM;

    pub fn empty() -> Self {
        Self(0)
    }

    pub fn contains(self, bits: u32) -> bool {
        self.0 & bits != 0
    }

    pub fn set(&mut self, bits: u32) {
        self.0 |= bits;
    }

    /// Clears the given bits, except the sticky ones.
    pub fn clear(&mut self, bits: u32) {
        self.0 &= !(bits & !Self::STICKY);
    }

    pub fn is_error(self) -> bool {
        self.contains(Self::ERROR)
    }

    pub fn is_underrun(self) -> bool {
        self.contains(Self::UNDERRUN)
    }

    pub fn is_end_of_stream(self) -> bool {
        self.contains(Self::END_OF_STREAM)
    }

    pub fn bits(self) -> u32 {
        self.0
    }
}
