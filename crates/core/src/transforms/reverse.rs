use ndarray::s;

use crate::augmentation::domain::operator::{Effect, Operator};
use crate::augmentation::domain::parameter_space::{ParameterSpace, SampledParameters};
use crate::shared::error::Result;
use crate::shared::waveform::Waveform;

/// Plays the waveform backwards.
pub struct Reverse;

impl Reverse {
    pub fn build(p: f64) -> Result<Operator<Self>> {
        Operator::new(Self, p)
    }
}

impl Effect for Reverse {
    fn name(&self) -> &'static str {
        "Reverse"
    }

    fn parameter_space(&self) -> Result<ParameterSpace> {
        Ok(ParameterSpace::new())
    }

    fn process(
        &mut self,
        waveform: Waveform,
        _sample_rate: u32,
        _params: &SampledParameters,
    ) -> Result<Waveform> {
        let reversed = waveform.data().slice(s![.., ..;-1]).to_owned();
        Ok(waveform.with_data(reversed))
    }
}
