use rand::seq::index;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use super::one_of::normalize_weights;
use crate::augmentation::domain::parameter_record::ParameterRecord;
use crate::augmentation::domain::parameter_space::{ParamValue, ParameterSpace};
use crate::augmentation::domain::randomizer::Randomizer;
use crate::augmentation::domain::transform::{GatePolicy, Propagation, Transform};
use crate::shared::error::{AugmentError, Result};
use crate::shared::waveform::Waveform;

/// How many children a [`SomeOf`] picks per run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SomeOfCount {
    Exact(usize),
    /// Inclusive range; a missing maximum means all children.
    Range(usize, Option<usize>),
}

/// Runs a random subset of its children, in their declared relative order.
///
/// The subset is drawn without replacement, by weight when weights are
/// given. Each picked child still rolls its own gate.
pub struct SomeOf {
    transforms: Vec<Box<dyn Transform>>,
    min_count: usize,
    max_count: usize,
    weights: Option<Vec<f64>>,
    randomizer: Randomizer,
}

impl SomeOf {
    pub fn new(
        transforms: Vec<Box<dyn Transform>>,
        count: SomeOfCount,
        weights: Option<Vec<f64>>,
        p: f64,
    ) -> Result<Self> {
        let len = transforms.len();
        let weights = match weights {
            Some(w) => Some(normalize_weights(Some(w), len)?),
            None => None,
        };
        // Zero-weight children are never drawn.
        let pickable = weights
            .as_ref()
            .map_or(len, |w| w.iter().filter(|&&w| w > 0.0).count());
        let (min_count, max_count) = match count {
            SomeOfCount::Exact(n) => (n, n),
            SomeOfCount::Range(min, max) => (min, max.unwrap_or(pickable)),
        };
        if min_count > max_count {
            return Err(AugmentError::config(format!(
                "SomeOf: minimum count {min_count} exceeds maximum {max_count}"
            )));
        }
        if max_count > pickable {
            return Err(AugmentError::config(format!(
                "SomeOf: cannot pick {max_count} of {pickable} pickable transforms"
            )));
        }
        Ok(Self {
            transforms,
            min_count,
            max_count,
            weights,
            randomizer: Randomizer::new(p, ParameterSpace::new())?,
        })
    }

    pub fn transforms(&self) -> &[Box<dyn Transform>] {
        &self.transforms
    }

    pub fn count_range(&self) -> (usize, usize) {
        (self.min_count, self.max_count)
    }
}

fn pick_indices(
    rng: &mut dyn RngCore,
    len: usize,
    amount: usize,
    weights: Option<&[f64]>,
) -> Result<Vec<usize>> {
    let picked = match weights {
        Some(weights) => index::sample_weighted(rng, len, |i| weights[i], amount)
            .map_err(|e| AugmentError::config(format!("SomeOf: weighted pick failed: {e}")))?,
        None => index::sample(rng, len, amount),
    };
    let mut picked = picked.into_vec();
    picked.sort_unstable();
    Ok(picked)
}

impl Transform for SomeOf {
    fn name(&self) -> &str {
        "SomeOf"
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
        let len = self.transforms.len();
        let (min_count, max_count) = (self.min_count, self.max_count);
        let weights = self.weights.as_deref();
        let params = self
            .randomizer
            .try_decide_and_sample_with(rng, gate, |rng, params| {
                let amount = rng.gen_range(min_count..=max_count);
                let picked = pick_indices(rng, len, amount, weights)?;
                params.insert(
                    "transform_indices",
                    ParamValue::IntList(picked.into_iter().map(|i| i as i64).collect()),
                );
                Ok(())
            })?;
        let Some(params) = params else {
            return Ok(waveform);
        };

        let mut waveform = waveform;
        for index in params.indices("transform_indices", len)? {
            waveform = self.transforms[index].apply(waveform, sample_rate, rng)?;
        }
        Ok(waveform)
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
        self.randomizer.restore_next("SomeOf", records)?;
        for transform in &mut self.transforms {
            transform.restore_parameters(records)?;
        }
        Ok(())
    }
}
