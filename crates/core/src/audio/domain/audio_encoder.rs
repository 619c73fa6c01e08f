use std::path::Path;

use crate::shared::error::Result;
use crate::shared::waveform::Waveform;

/// Domain interface for writing a waveform to an audio file.
pub trait AudioEncoder: Send {
    fn encode(&self, path: &Path, waveform: &Waveform, sample_rate: u32) -> Result<()>;
}
