use ndarray::Array2;

use crate::audio::domain::resampler::Resampler;
use crate::shared::error::{AugmentError, Result};
use crate::shared::waveform::Waveform;

/// Linear-interpolation resampler. Cheap and adequate for noise beds;
/// not band-limited.
pub struct LinearResampler;

impl Resampler for LinearResampler {
    fn resample(&self, waveform: &Waveform, from_rate: u32, to_rate: u32) -> Result<Waveform> {
        if from_rate == 0 || to_rate == 0 {
            return Err(AugmentError::shape("sample rates must be positive"));
        }
        if from_rate == to_rate || waveform.num_samples() == 0 {
            return Ok(waveform.clone());
        }

        let n_in = waveform.num_samples();
        let n_out = ((n_in as u64 * to_rate as u64 + from_rate as u64 / 2) / from_rate as u64)
            .max(1) as usize;
        let step = from_rate as f64 / to_rate as f64;
        let input = waveform.data();

        let data = Array2::from_shape_fn((waveform.channels(), n_out), |(c, i)| {
            let pos = i as f64 * step;
            let idx = (pos.floor() as usize).min(n_in - 1);
            let next = (idx + 1).min(n_in - 1);
            let frac = (pos - idx as f64).clamp(0.0, 1.0) as f32;
            let a = input[[c, idx]];
            let b = input[[c, next]];
            a + (b - a) * frac
        });
        Ok(waveform.with_data(data))
    }
}
