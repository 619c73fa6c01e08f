use serde::{Deserialize, Serialize};

use crate::audio::domain::gain::db_to_amplitude_ratio;
use crate::augmentation::domain::operator::{Effect, Operator};
use crate::augmentation::domain::parameter_space::{ParameterSpace, SampledParameters};
use crate::shared::error::Result;
use crate::shared::waveform::Waveform;

/// Multiplies the waveform by a gain drawn uniformly in decibels.
pub struct Gain {
    min_gain_db: f64,
    max_gain_db: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GainOptions {
    pub min_gain_db: f64,
    pub max_gain_db: f64,
    pub p: f64,
}

impl Default for GainOptions {
    fn default() -> Self {
        Self {
            min_gain_db: -12.0,
            max_gain_db: 12.0,
            p: 0.5,
        }
    }
}

impl GainOptions {
    pub fn build(self) -> Result<Operator<Gain>> {
        Operator::new(
            Gain {
                min_gain_db: self.min_gain_db,
                max_gain_db: self.max_gain_db,
            },
            self.p,
        )
    }
}

impl Effect for Gain {
    fn name(&self) -> &'static str {
        "Gain"
    }

    fn parameter_space(&self) -> Result<ParameterSpace> {
        ParameterSpace::new().uniform("gain_db", self.min_gain_db, self.max_gain_db)
    }

    fn process(
        &mut self,
        mut waveform: Waveform,
        _sample_rate: u32,
        params: &SampledParameters,
    ) -> Result<Waveform> {
        let ratio = db_to_amplitude_ratio(params.float("gain_db")?) as f32;
        waveform.data_mut().mapv_inplace(|s| s * ratio);
        Ok(waveform)
    }
}
