//! Normalized PCM frames.
//!
//! Every codec adapter hands the engine the same output shape:
//! interleaved stereo `i32` samples at full scale. Decoded blocks of 16
//! or 24 bits are projected onto that range here, and mono input is
//! duplicated into both channels.

use crate::error::DecodeError;

/// Bytes one interleaved stereo sample pair occupies.
pub const STEREO_FRAME_BYTES: usize = 2 * std::mem::size_of::<i32>();

/// One block of interleaved stereo PCM, tagged with its sample rate.
///
/// Frames are produced transiently per decode step; ownership moves to
/// the sample sink on append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmFrame {
    stereo: Vec<[i32; 2]>,
    sample_rate: u32,
}

impl PcmFrame {
    pub fn new(stereo: Vec<[i32; 2]>, sample_rate: u32) -> Self {
        Self { stereo, sample_rate }
    }

    pub fn stereo(&self) -> &[[i32; 2]] {
        &self.stereo
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of stereo sample pairs.
    pub fn len(&self) -> usize {
        self.stereo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stereo.is_empty()
    }

    pub fn byte_len(&self) -> usize {
        self.stereo.len() * STEREO_FRAME_BYTES
    }

    pub fn into_samples(self) -> Vec<[i32; 2]> {
        self.stereo
    }
}

/// Projects decoded samples onto the full `i32` range and interleaves
/// them as stereo.
///
/// 16-bit samples are shifted left by 16, 24-bit samples by 8, so both
/// land on the same full-scale range. `right == None` means mono input,
/// which is duplicated into both output channels.
pub fn normalize_block(
    bits_per_sample: u32,
    left: &[i32],
    right: Option<&[i32]>,
) -> Result<Vec<[i32; 2]>, DecodeError> {
    let shift = match bits_per_sample {
        16 => 16,
        24 => 8,
        other => {
            return Err(DecodeError::Unsupported(format!(
                "{other} bits per sample"
            )));
        }
    };

    match right {
        None => Ok(left
            .iter()
            .map(|&sample| {
                let sample = sample << shift;
                [sample, sample]
            })
            .collect()),
        Some(right) => {
            if right.len() != left.len() {
                return Err(DecodeError::Unsupported(
                    "stereo channels of unequal length".into(),
                ));
            }
            Ok(left
                .iter()
                .zip(right)
                .map(|(&l, &r)| [l << shift, r << shift])
                .collect())
        }
    }
}
