use rand::distributions::{Distribution, WeightedIndex};
use rand::RngCore;

use crate::augmentation::domain::parameter_record::ParameterRecord;
use crate::augmentation::domain::parameter_space::{ParamValue, ParameterSpace};
use crate::augmentation::domain::randomizer::Randomizer;
use crate::augmentation::domain::transform::{GatePolicy, Propagation, Transform};
use crate::shared::error::{AugmentError, Result};
use crate::shared::waveform::Waveform;

/// Runs exactly one child, picked by weight.
///
/// The picked child runs unconditionally: its own gate is bypassed, so the
/// composer's `p` is the only chance that applies.
pub struct OneOf {
    transforms: Vec<Box<dyn Transform>>,
    weights: Vec<f64>,
    picker: WeightedIndex<f64>,
    randomizer: Randomizer,
}

impl OneOf {
    /// `weights` are renormalized to sum to 1; `None` means uniform.
    pub fn new(
        transforms: Vec<Box<dyn Transform>>,
        weights: Option<Vec<f64>>,
        p: f64,
    ) -> Result<Self> {
        if transforms.is_empty() {
            return Err(AugmentError::config("OneOf needs at least one transform"));
        }
        let weights = normalize_weights(weights, transforms.len())?;
        let picker = WeightedIndex::new(&weights)
            .map_err(|e| AugmentError::config(format!("invalid OneOf weights: {e}")))?;
        Ok(Self {
            transforms,
            weights,
            picker,
            randomizer: Randomizer::new(p, ParameterSpace::new())?,
        })
    }

    pub fn transforms(&self) -> &[Box<dyn Transform>] {
        &self.transforms
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }
}

/// Checks length and sign, then scales the weights to sum to 1.
pub(crate) fn normalize_weights(weights: Option<Vec<f64>>, count: usize) -> Result<Vec<f64>> {
    let weights = match weights {
        Some(w) => w,
        None => return Ok(vec![1.0 / count as f64; count]),
    };
    if weights.len() != count {
        return Err(AugmentError::config(format!(
            "{} weights given for {count} transforms",
            weights.len()
        )));
    }
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(AugmentError::config(format!(
            "weights must be finite and non-negative, got {weights:?}"
        )));
    }
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Err(AugmentError::config("weights must not all be zero"));
    }
    Ok(weights.iter().map(|w| w / total).collect())
}

impl Transform for OneOf {
    fn name(&self) -> &str {
        "OneOf"
    }

    fn probability(&self) -> f64 {
        self.randomizer.probability()
    }

    fn apply_with_gate(
        &mut self,
        waveform: Waveform,
        sample_rate: u32,
        rng: &mut dyn RngCore,
        gate: GatePolicy,
    ) -> Result<Waveform> {
        let picker = &self.picker;
        let params = self
            .randomizer
            .decide_and_sample_with(rng, gate, |rng, params| {
                let index = picker.sample(rng);
                params.insert("transform_index", ParamValue::Int(index as i64));
            });
        let Some(params) = params else {
            return Ok(waveform);
        };

        let index = params.int("transform_index")?;
        let child = usize::try_from(index)
            .ok()
            .and_then(|i| self.transforms.get_mut(i))
            .ok_or_else(|| {
                AugmentError::Replay(format!("transform_index {index} is out of range"))
            })?;
        child.apply_with_gate(waveform, sample_rate, rng, GatePolicy::Bypass)
    }

    fn freeze_parameters(&mut self, propagation: Propagation) {
        self.randomizer.freeze();
        if let Some(child) = propagation.for_children() {
            for transform in &mut self.transforms {
                transform.freeze_parameters(child);
            }
        }
    }

    fn unfreeze_parameters(&mut self, propagation: Propagation) {
        self.randomizer.unfreeze();
        if let Some(child) = propagation.for_children() {
            for transform in &mut self.transforms {
                transform.unfreeze_parameters(child);
            }
        }
    }

    fn serialize_parameters(&self, propagation: Propagation) -> Vec<ParameterRecord> {
        let mut records = vec![self.randomizer.to_record(self.name())];
        if let Some(child) = propagation.for_children() {
            for transform in &self.transforms {
                records.extend(transform.serialize_parameters(child));
            }
        }
        records
    }

    fn restore_parameters(
        &mut self,
        records: &mut dyn Iterator<Item = ParameterRecord>,
    ) -> Result<()> {
        self.randomizer.restore_next("OneOf", records)?;
        for transform in &mut self.transforms {
            transform.restore_parameters(records)?;
        }
        Ok(())
    }
}
