use std::f64::consts::TAU;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::augmentation::domain::operator::{Effect, Operator};
use crate::augmentation::domain::parameter_space::{ParameterSpace, SampledParameters};
use crate::shared::error::{AugmentError, Result};
use crate::shared::waveform::Waveform;

/// Adds white Gaussian noise with a standard deviation drawn in linear
/// amplitude.
pub struct AddGaussianNoise {
    min_amplitude: f64,
    max_amplitude: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AddGaussianNoiseOptions {
    pub min_amplitude: f64,
    pub max_amplitude: f64,
    pub p: f64,
}

impl Default for AddGaussianNoiseOptions {
    fn default() -> Self {
        Self {
            min_amplitude: 0.001,
            max_amplitude: 0.015,
            p: 0.5,
        }
    }
}

impl AddGaussianNoiseOptions {
    pub fn build(self) -> Result<Operator<AddGaussianNoise>> {
        if self.min_amplitude < 0.0 {
            return Err(AugmentError::config(format!(
                "min_amplitude must be non-negative, got {}",
                self.min_amplitude
            )));
        }
        Operator::new(
            AddGaussianNoise {
                min_amplitude: self.min_amplitude,
                max_amplitude: self.max_amplitude,
            },
            self.p,
        )
    }
}

impl Effect for AddGaussianNoise {
    fn name(&self) -> &'static str {
        "AddGaussianNoise"
    }

    fn parameter_space(&self) -> Result<ParameterSpace> {
        Ok(ParameterSpace::new()
            .uniform("amplitude", self.min_amplitude, self.max_amplitude)?
            .seed("noise_seed"))
    }

    fn process(
        &mut self,
        mut waveform: Waveform,
        _sample_rate: u32,
        params: &SampledParameters,
    ) -> Result<Waveform> {
        let amplitude = params.float("amplitude")?;
        let seed = params.seed("noise_seed")?;
        add_white_noise(&mut waveform, amplitude, seed)?;
        Ok(waveform)
    }
}

/// Adds zero-mean Gaussian noise with standard deviation `std`, drawn from a
/// generator seeded with `seed`, so one seed always gives one realization.
pub(crate) fn add_white_noise(waveform: &mut Waveform, std: f64, seed: u64) -> Result<()> {
    if !std.is_finite() {
        return Err(AugmentError::shape(format!(
            "noise deviation {std} is not finite for this input"
        )));
    }
    if std < 0.0 {
        return Err(AugmentError::Replay(format!(
            "noise deviation must be non-negative, got {std}"
        )));
    }
    let mut rng = StdRng::seed_from_u64(seed);
    waveform
        .data_mut()
        .mapv_inplace(|s| s + (standard_normal(&mut rng) * std) as f32);
    Ok(())
}

/// One N(0, 1) draw (Box-Muller).
fn standard_normal(rng: &mut StdRng) -> f64 {
    // 1 - u keeps the log argument in (0, 1].
    let u1 = 1.0 - rng.gen::<f64>();
    let u2 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos()
}
