use serde::{Deserialize, Serialize};

use crate::augmentation::domain::operator::{Effect, Operator};
use crate::augmentation::domain::parameter_space::{ParameterSpace, SampledParameters};
use crate::shared::error::Result;
use crate::shared::waveform::Waveform;

/// Which inputs [`Normalize`] rescales.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizeTarget {
    /// Scale every input so its peak sits at full scale.
    #[default]
    All,
    /// Only scale down inputs whose peak exceeds full scale.
    OnlyTooLoud,
}

/// Peak normalization to 1.0. Silent input is returned unchanged.
pub struct Normalize {
    target: NormalizeTarget,
}

impl Normalize {
    pub fn build(target: NormalizeTarget, p: f64) -> Result<Operator<Self>> {
        Operator::new(Self { target }, p)
    }
}

impl Effect for Normalize {
    fn name(&self) -> &'static str {
        "Normalize"
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
        let peak = waveform.peak();
        if peak == 0.0 {
            return Ok(waveform);
        }
        if self.target == NormalizeTarget::OnlyTooLoud && peak <= 1.0 {
            return Ok(waveform);
        }
        waveform.data_mut().mapv_inplace(|s| s / peak);
        Ok(waveform)
    }
}
