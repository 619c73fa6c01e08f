use serde::{Deserialize, Serialize};

use crate::augmentation::domain::operator::{Effect, Operator};
use crate::augmentation::domain::parameter_space::{ParameterSpace, SampledParameters};
use crate::shared::error::{AugmentError, Result};
use crate::shared::waveform::Waveform;

/// Length of the linear fade at each edge of a faded mask.
const FADE_SECONDS: f64 = 0.01;

/// Silences one contiguous band of the waveform, on all channels.
///
/// `t` is the band length as a fraction of the input, `t0` where the band
/// starts within the remaining room, also as a fraction.
pub struct TimeMask {
    min_band_part: f64,
    max_band_part: f64,
    fade: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeMaskOptions {
    pub min_band_part: f64,
    pub max_band_part: f64,
    pub fade: bool,
    pub p: f64,
}

impl Default for TimeMaskOptions {
    fn default() -> Self {
        Self {
            min_band_part: 0.0,
            max_band_part: 0.5,
            fade: false,
            p: 0.5,
        }
    }
}

impl TimeMaskOptions {
    pub fn build(self) -> Result<Operator<TimeMask>> {
        if self.min_band_part < 0.0 || self.max_band_part > 1.0 {
            return Err(AugmentError::config(
                "band parts must lie within [0, 1]",
            ));
        }
        Operator::new(
            TimeMask {
                min_band_part: self.min_band_part,
                max_band_part: self.max_band_part,
                fade: self.fade,
            },
            self.p,
        )
    }
}

impl Effect for TimeMask {
    fn name(&self) -> &'static str {
        "TimeMask"
    }

    fn parameter_space(&self) -> Result<ParameterSpace> {
        ParameterSpace::new()
            .uniform("t", self.min_band_part, self.max_band_part)?
            .uniform("t0", 0.0, 1.0)
    }

    fn process(
        &mut self,
        mut waveform: Waveform,
        sample_rate: u32,
        params: &SampledParameters,
    ) -> Result<Waveform> {
        let n = waveform.num_samples();
        let band = ((params.float("t")? * n as f64).round() as usize).min(n);
        if band == 0 {
            return Ok(waveform);
        }
        let start = ((params.float("t0")? * (n - band) as f64).floor() as usize).min(n - band);

        let mask = band_mask(band, self.fade, sample_rate);
        for mut row in waveform.data_mut().rows_mut() {
            for (sample, m) in row.iter_mut().skip(start).zip(&mask) {
                *sample *= m;
            }
        }
        Ok(waveform)
    }
}

/// Multipliers across the band: zeros, optionally ramped at both edges.
fn band_mask(band: usize, fade: bool, sample_rate: u32) -> Vec<f32> {
    let mut mask = vec![0.0f32; band];
    if !fade {
        return mask;
    }
    let fade_len = ((FADE_SECONDS * sample_rate as f64) as usize).min(band / 2);
    for i in 0..fade_len {
        let ramp = 1.0 - i as f32 / fade_len as f32;
        mask[i] = ramp;
        mask[band - 1 - i] = ramp;
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::augmentation::domain::transform::Transform;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fixed_mask(t: f64, fade: bool) -> Operator<TimeMask> {
        TimeMaskOptions {
            min_band_part: t,
            max_band_part: t,
            fade,
            p: 1.0,
        }
        .build()
        .unwrap()
    }

    #[test]
    fn test_silences_exactly_the_band_length() {
        let mut op = fixed_mask(0.25, false);
        let out = op
            .apply(Waveform::mono(vec![1.0; 1000]), 16000, &mut StdRng::seed_from_u64(3))
            .unwrap();
        let zeros = out.data().iter().filter(|&&s| s == 0.0).count();
        assert_eq!(zeros, 250);
    }

    #[test]
    fn test_band_is_contiguous() {
        let mut op = fixed_mask(0.1, false);
        let out = op
            .apply(Waveform::mono(vec![1.0; 500]), 16000, &mut StdRng::seed_from_u64(8))
            .unwrap();
        let samples = out.channel(0).to_vec();
        let first = samples.iter().position(|&s| s == 0.0).unwrap();
        assert!(samples[first..first + 50].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_fade_ramps_edges() {
        let mask = band_mask(1000, true, 16000);
        assert_eq!(mask[0], 1.0);
        assert!(mask[80] > 0.0 && mask[80] < 1.0);
        assert_eq!(mask[500], 0.0);
        assert_eq!(mask[999], 1.0);
    }

    #[test]
    fn test_zero_band_is_identity() {
        let mut op = fixed_mask(0.0, false);
        let input = Waveform::mono(vec![0.3; 64]);
        let out = op
            .apply(input.clone(), 16000, &mut StdRng::seed_from_u64(0))
            .unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn test_band_part_above_one_rejected() {
        let result = TimeMaskOptions {
            max_band_part: 1.2,
            ..Default::default()
        }
        .build();
        assert!(matches!(result, Err(AugmentError::Configuration(_))));
    }
}
