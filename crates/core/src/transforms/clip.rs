use crate::augmentation::domain::operator::{Effect, Operator};
use crate::augmentation::domain::parameter_space::{ParamValue, ParameterSpace, SampledParameters};
use crate::shared::error::{AugmentError, Result};
use crate::shared::waveform::Waveform;

/// Hard-limits samples to `[a_min, a_max]`.
pub struct Clip {
    a_min: f64,
    a_max: f64,
}

impl Clip {
    pub fn build(a_min: f64, a_max: f64, p: f64) -> Result<Operator<Self>> {
        if a_min.is_nan() || a_max.is_nan() || a_min > a_max {
            return Err(AugmentError::config(format!(
                "clip bounds inverted: a_min {a_min} > a_max {a_max}"
            )));
        }
        Operator::new(Self { a_min, a_max }, p)
    }
}

impl Effect for Clip {
    fn name(&self) -> &'static str {
        "Clip"
    }

    fn parameter_space(&self) -> Result<ParameterSpace> {
        Ok(ParameterSpace::new()
            .fixed("a_min", ParamValue::Float(self.a_min))
            .fixed("a_max", ParamValue::Float(self.a_max)))
    }

    fn process(
        &mut self,
        mut waveform: Waveform,
        _sample_rate: u32,
        params: &SampledParameters,
    ) -> Result<Waveform> {
        let lo = params.float("a_min")? as f32;
        let hi = params.float("a_max")? as f32;
        waveform.data_mut().mapv_inplace(|s| s.clamp(lo, hi));
        Ok(waveform)
    }
}
