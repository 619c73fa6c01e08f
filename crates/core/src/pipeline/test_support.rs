use crate::augmentation::domain::operator::{Effect, Operator};
use crate::augmentation::domain::parameter_space::{ParamValue, ParameterSpace, SampledParameters};
use crate::shared::error::{AugmentError, Result};
use crate::shared::waveform::Waveform;

fn append(waveform: &Waveform, value: f32) -> Waveform {
    let mut samples = waveform.channel(0).to_vec();
    samples.push(value);
    Waveform::mono(samples)
}

/// Appends a fixed marker sample, so tests can read which children ran.
pub struct Append {
    value: f32,
}

impl Append {
    pub fn build(value: f32, p: f64) -> Operator<Self> {
        Operator::new(Self { value }, p).unwrap()
    }
}

impl Effect for Append {
    fn name(&self) -> &'static str {
        "Append"
    }

    fn parameter_space(&self) -> Result<ParameterSpace> {
        Ok(ParameterSpace::new().fixed("value", ParamValue::Float(self.value as f64)))
    }

    fn process(
        &mut self,
        waveform: Waveform,
        _sample_rate: u32,
        params: &SampledParameters,
    ) -> Result<Waveform> {
        Ok(append(&waveform, params.float("value")? as f32))
    }
}

/// Appends a sample drawn uniformly from [0, 1].
pub struct AppendRandom;

impl AppendRandom {
    pub fn build(p: f64) -> Operator<Self> {
        Operator::new(Self, p).unwrap()
    }
}

impl Effect for AppendRandom {
    fn name(&self) -> &'static str {
        "AppendRandom"
    }

    fn parameter_space(&self) -> Result<ParameterSpace> {
        ParameterSpace::new().uniform("value", 0.0, 1.0)
    }

    fn process(
        &mut self,
        waveform: Waveform,
        _sample_rate: u32,
        params: &SampledParameters,
    ) -> Result<Waveform> {
        Ok(append(&waveform, params.float("value")? as f32))
    }
}

/// Always fails at call time.
pub struct Fails;

impl Fails {
    pub fn build() -> Operator<Self> {
        Operator::new(Self, 1.0).unwrap()
    }
}

impl Effect for Fails {
    fn name(&self) -> &'static str {
        "Fails"
    }

    fn parameter_space(&self) -> Result<ParameterSpace> {
        Ok(ParameterSpace::new())
    }

    fn process(
        &mut self,
        _waveform: Waveform,
        _sample_rate: u32,
        _params: &SampledParameters,
    ) -> Result<Waveform> {
        Err(AugmentError::shape("always fails"))
    }
}
