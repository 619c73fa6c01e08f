use crate::augmentation::domain::operator::{Effect, Operator};
use crate::augmentation::domain::parameter_space::{ParameterSpace, SampledParameters};
use crate::shared::error::Result;
use crate::shared::waveform::Waveform;

/// Flips the sign of every sample.
pub struct PolarityInversion;

impl PolarityInversion {
    pub fn build(p: f64) -> Result<Operator<Self>> {
        Operator::new(Self, p)
    }
}

impl Effect for PolarityInversion {
    fn name(&self) -> &'static str {
        "PolarityInversion"
    }

    fn parameter_space(&self) -> Result<ParameterSpace> {
        Ok(ParameterSpace::new())
    }

    fn process(
        &mut self,
        mut waveform: Waveform,
        _sample_rate: u32,
        _params: &SampledParameters,
    ) -> Result<Waveform> {
        waveform.data_mut().mapv_inplace(|s| -s);
        Ok(waveform)
    }
}
