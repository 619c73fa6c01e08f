use crate::shared::error::Result;
use crate::shared::waveform::Waveform;

/// Domain interface for sample-rate conversion, applied per channel.
pub trait Resampler: Send {
    fn resample(&self, waveform: &Waveform, from_rate: u32, to_rate: u32) -> Result<Waveform>;
}
