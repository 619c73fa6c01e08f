use std::path::Path;

use crate::audio::domain::audio_encoder::AudioEncoder;
use crate::shared::error::{AugmentError, Result};
use crate::shared::waveform::Waveform;

/// Writes 32-bit float WAV files with hound.
pub struct HoundEncoder;

impl AudioEncoder for HoundEncoder {
    fn encode(&self, path: &Path, waveform: &Waveform, sample_rate: u32) -> Result<()> {
        let encode_error = |e: hound::Error| AugmentError::Encode {
            path: path.to_path_buf(),
            source: Box::new(e),
        };

        let channels = u16::try_from(waveform.channels())
            .map_err(|_| AugmentError::shape("too many channels for a WAV file"))?;
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };

        let mut writer = hound::WavWriter::create(path, spec).map_err(encode_error)?;
        for sample in waveform.to_interleaved() {
            writer.write_sample(sample).map_err(encode_error)?;
        }
        writer.finalize().map_err(encode_error)?;
        Ok(())
    }
}
