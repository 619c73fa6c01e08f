use serde::{Deserialize, Serialize};

use crate::audio::domain::gain::{is_silent, rms, solve_gain_for_target_snr};
use crate::augmentation::domain::operator::{Effect, Operator};
use crate::augmentation::domain::parameter_space::{ParameterSpace, SampledParameters};
use crate::shared::error::Result;
use crate::shared::waveform::Waveform;

use super::add_gaussian_noise::add_white_noise;

/// Adds white Gaussian noise at an SNR drawn in decibels relative to the
/// input's RMS.
pub struct AddGaussianSnr {
    min_snr_db: f64,
    max_snr_db: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AddGaussianSnrOptions {
    pub min_snr_db: f64,
    pub max_snr_db: f64,
    pub p: f64,
}

impl Default for AddGaussianSnrOptions {
    fn default() -> Self {
        Self {
            min_snr_db: 5.0,
            max_snr_db: 40.0,
            p: 0.5,
        }
    }
}

impl AddGaussianSnrOptions {
    pub fn build(self) -> Result<Operator<AddGaussianSnr>> {
        Operator::new(
            AddGaussianSnr {
                min_snr_db: self.min_snr_db,
                max_snr_db: self.max_snr_db,
            },
            self.p,
        )
    }
}

impl Effect for AddGaussianSnr {
    fn name(&self) -> &'static str {
        "AddGaussianSNR"
    }

    fn parameter_space(&self) -> Result<ParameterSpace> {
        Ok(ParameterSpace::new()
            .uniform("snr_db", self.min_snr_db, self.max_snr_db)?
            .seed("noise_seed"))
    }

    fn process(
        &mut self,
        mut waveform: Waveform,
        _sample_rate: u32,
        params: &SampledParameters,
    ) -> Result<Waveform> {
        let signal_rms = rms(&waveform);
        if is_silent(signal_rms) {
            log::warn!("AddGaussianSNR: input is silent, leaving it unchanged");
            return Ok(waveform);
        }
        // Unit-RMS noise scaled by the solved gain has exactly that RMS.
        let std = solve_gain_for_target_snr(signal_rms, 1.0, params.float("snr_db")?);
        add_white_noise(&mut waveform, std, params.seed("noise_seed")?)?;
        Ok(waveform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::domain::gain::amplitude_ratio_to_db;
    use crate::augmentation::domain::transform::Transform;
    use crate::shared::error::AugmentError;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fixed(snr_db: f64) -> Operator<AddGaussianSnr> {
        AddGaussianSnrOptions {
            min_snr_db: snr_db,
            max_snr_db: snr_db,
            p: 1.0,
        }
        .build()
        .unwrap()
    }

    #[test]
    fn test_realized_snr_is_close_to_target() {
        let signal: Vec<f32> = (0..32000)
            .map(|i| 0.5 * (i as f32 * 0.05).sin())
            .collect();
        let input = Waveform::mono(signal);
        let out = fixed(20.0)
            .apply(input.clone(), 16000, &mut StdRng::seed_from_u64(2))
            .unwrap();

        let noise: Vec<f32> = out
            .data()
            .iter()
            .zip(input.data().iter())
            .map(|(o, i)| o - i)
            .collect();
        let noise_rms = crate::audio::domain::gain::rms_of(noise);
        let snr = amplitude_ratio_to_db(rms(&input) / noise_rms);
        assert!((snr - 20.0).abs() < 0.5, "snr was {snr}");
    }

    #[test]
    fn test_silent_input_unchanged() {
        let input = Waveform::mono(vec![0.0; 512]);
        let out = fixed(10.0)
            .apply(input.clone(), 16000, &mut StdRng::seed_from_u64(2))
            .unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn test_unreachable_snr_is_shape_error() {
        // 10^(-400) underflows to zero, so the solved deviation is infinite.
        let result = fixed(-8000.0).apply(
            Waveform::mono(vec![0.5; 64]),
            16000,
            &mut StdRng::seed_from_u64(2),
        );
        assert!(matches!(result, Err(AugmentError::InputShape(_))));
    }
}
