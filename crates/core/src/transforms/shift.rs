use ndarray::{s, Array2};
use serde::{Deserialize, Serialize};

use crate::augmentation::domain::operator::{Effect, Operator};
use crate::augmentation::domain::parameter_space::{ParameterSpace, SampledParameters};
use crate::shared::error::{AugmentError, Result};
use crate::shared::waveform::Waveform;

/// Moves the waveform in time by a fraction of its length. Positive shifts
/// move audio later. With `rollover` the samples that fall off one end come
/// back in at the other; without it the gap is filled with silence.
pub struct Shift {
    min_shift: f64,
    max_shift: f64,
    rollover: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ShiftOptions {
    pub min_shift: f64,
    pub max_shift: f64,
    pub rollover: bool,
    pub p: f64,
}

impl Default for ShiftOptions {
    fn default() -> Self {
        Self {
            min_shift: -0.5,
            max_shift: 0.5,
            rollover: true,
            p: 0.5,
        }
    }
}

impl ShiftOptions {
    pub fn build(self) -> Result<Operator<Shift>> {
        if self.min_shift < -1.0 || self.max_shift > 1.0 {
            return Err(AugmentError::config(
                "shift fractions must lie within [-1, 1]",
            ));
        }
        Operator::new(
            Shift {
                min_shift: self.min_shift,
                max_shift: self.max_shift,
                rollover: self.rollover,
            },
            self.p,
        )
    }
}

impl Effect for Shift {
    fn name(&self) -> &'static str {
        "Shift"
    }

    fn parameter_space(&self) -> Result<ParameterSpace> {
        ParameterSpace::new().uniform("shift", self.min_shift, self.max_shift)
    }

    fn process(
        &mut self,
        waveform: Waveform,
        _sample_rate: u32,
        params: &SampledParameters,
    ) -> Result<Waveform> {
        let n = waveform.num_samples();
        if n == 0 {
            return Ok(waveform);
        }
        let offset = (params.float("shift")? * n as f64).round() as i64;
        let amount = offset.unsigned_abs() as usize;
        if amount == 0 {
            return Ok(waveform);
        }

        let input = waveform.data();
        let mut out = Array2::<f32>::zeros(input.raw_dim());
        let amount = amount.min(n);
        if offset > 0 {
            out.slice_mut(s![.., amount..])
                .assign(&input.slice(s![.., ..n - amount]));
            if self.rollover {
                out.slice_mut(s![.., ..amount])
                    .assign(&input.slice(s![.., n - amount..]));
            }
        } else {
            out.slice_mut(s![.., ..n - amount])
                .assign(&input.slice(s![.., amount..]));
            if self.rollover {
                out.slice_mut(s![.., n - amount..])
                    .assign(&input.slice(s![.., ..amount]));
            }
        }
        Ok(waveform.with_data(out))
    }
}
