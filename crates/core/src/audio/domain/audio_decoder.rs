use std::path::Path;

use crate::shared::error::Result;
use crate::shared::waveform::Waveform;

/// Decoded file contents at the file's own sample rate.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedAudio {
    pub waveform: Waveform,
    pub sample_rate: u32,
}

/// Domain interface for decoding an audio file.
///
/// Decoding is synchronous and may be slow; failures surface as
/// `AugmentError::Decode` and are never retried.
pub trait AudioDecoder: Send {
    fn decode(&self, path: &Path) -> Result<DecodedAudio>;
}
