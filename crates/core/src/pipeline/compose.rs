use rand::seq::SliceRandom;
use rand::RngCore;

use crate::augmentation::domain::parameter_record::ParameterRecord;
use crate::augmentation::domain::parameter_space::{ParamValue, ParameterSpace};
use crate::augmentation::domain::randomizer::Randomizer;
use crate::augmentation::domain::transform::{GatePolicy, Propagation, Transform};
use crate::shared::error::Result;
use crate::shared::waveform::Waveform;

/// Runs every child in turn, each rolling its own gate.
///
/// With `shuffle`, the child order is permuted once per run. The permutation
/// is part of the sampled parameters, so a frozen `Compose` replays it.
pub struct Compose {
    transforms: Vec<Box<dyn Transform>>,
    shuffle: bool,
    randomizer: Randomizer,
}

impl Compose {
    pub fn new(transforms: Vec<Box<dyn Transform>>, shuffle: bool, p: f64) -> Result<Self> {
        Ok(Self {
            transforms,
            shuffle,
            randomizer: Randomizer::new(p, ParameterSpace::new())?,
        })
    }

    /// All children in declared order, never shuffled, with `p = 1`.
    pub fn sequential(transforms: Vec<Box<dyn Transform>>) -> Result<Self> {
        Self::new(transforms, false, 1.0)
    }

    pub fn transforms(&self) -> &[Box<dyn Transform>] {
        &self.transforms
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

impl Transform for Compose {
    fn name(&self) -> &str {
        "Compose"
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
        let count = self.transforms.len();
        let shuffle = self.shuffle;
        let params = self
            .randomizer
            .decide_and_sample_with(rng, gate, |rng, params| {
                let mut order: Vec<i64> = (0..count as i64).collect();
                if shuffle {
                    order.shuffle(rng);
                }
                params.insert("order", ParamValue::IntList(order));
            });
        let Some(params) = params else {
            return Ok(waveform);
        };

        let order = params.indices("order", count)?;
        let mut waveform = waveform;
        for index in order {
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
        self.randomizer.restore_next("Compose", records)?;
        for transform in &mut self.transforms {
            transform.restore_parameters(records)?;
        }
        Ok(())
    }
}
