use std::path::Path;

use crate::audio::domain::audio_decoder::{AudioDecoder, DecodedAudio};
use crate::shared::error::{AugmentError, Result};
use crate::shared::waveform::Waveform;

/// Decodes WAV files (integer or float PCM) with hound.
pub struct HoundDecoder;

impl AudioDecoder for HoundDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedAudio> {
        let decode_error = |e: hound::Error| AugmentError::Decode {
            path: path.to_path_buf(),
            source: Box::new(e),
        };

        let mut reader = hound::WavReader::open(path).map_err(decode_error)?;
        let spec = reader.spec();

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<std::result::Result<_, _>>()
                .map_err(decode_error)?,
            hound::SampleFormat::Int => {
                let full_scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / full_scale))
                    .collect::<std::result::Result<_, _>>()
                    .map_err(decode_error)?
            }
        };

        let waveform = Waveform::from_interleaved(&samples, spec.channels as usize)?;
        Ok(DecodedAudio {
            waveform,
            sample_rate: spec.sample_rate,
        })
    }
}
