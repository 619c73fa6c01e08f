use rand::RngCore;

use super::parameter_record::ParameterRecord;
use super::parameter_space::{ParameterSpace, SampledParameters};
use super::randomizer::Randomizer;
use super::transform::{GatePolicy, Propagation, Transform};
use crate::shared::error::{AugmentError, Result};
use crate::shared::waveform::Waveform;

/// The deterministic half of an operator: given concrete parameters, turn
/// one waveform into another.
///
/// All randomness an effect needs must come in through `params` (use a
/// `Seed` declaration for noise realizations) so that frozen parameters
/// reproduce the output exactly.
pub trait Effect: Send {
    /// Name written into serialized parameter records.
    fn name(&self) -> &'static str;

    fn parameter_space(&self) -> Result<ParameterSpace>;

    /// Adds values that depend on the call itself (the input's length, the
    /// sounds it loads) to a fresh sample. Frozen values skip this step.
    fn sample_for_input(
        &mut self,
        _waveform: &Waveform,
        _sample_rate: u32,
        _rng: &mut dyn RngCore,
        _params: &mut SampledParameters,
    ) -> Result<()> {
        Ok(())
    }

    /// Transforms nested inside the effect. They are frozen, serialized and
    /// restored together with the operator, right after its own record.
    fn nested(&self) -> &[Box<dyn Transform>] {
        &[]
    }

    fn nested_mut(&mut self) -> &mut [Box<dyn Transform>] {
        &mut []
    }

    fn process(
        &mut self,
        waveform: Waveform,
        sample_rate: u32,
        params: &SampledParameters,
    ) -> Result<Waveform>;
}

/// An [`Effect`] wrapped with its probability gate and freezable parameters.
pub struct Operator<E> {
    effect: E,
    randomizer: Randomizer,
}

impl<E: Effect> Operator<E> {
    pub fn new(effect: E, p: f64) -> Result<Self> {
        let randomizer = Randomizer::new(p, effect.parameter_space()?)?;
        Ok(Self { effect, randomizer })
    }

    pub fn effect(&self) -> &E {
        &self.effect
    }

    pub fn is_frozen(&self) -> bool {
        self.randomizer.state().is_frozen()
    }

    /// Parameters of the last activation, if the last decision was active.
    pub fn last_parameters(&self) -> Option<&SampledParameters> {
        self.randomizer
            .state()
            .snapshot()
            .filter(|s| s.active)
            .map(|s| &s.parameters)
    }
}

impl<E: Effect> Transform for Operator<E> {
    fn name(&self) -> &str {
        self.effect.name()
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
        if sample_rate == 0 {
            return Err(AugmentError::shape("sample rate must be positive"));
        }
        let effect = &mut self.effect;
        let sampled = self
            .randomizer
            .try_decide_and_sample_with(rng, gate, |rng, params| {
                effect.sample_for_input(&waveform, sample_rate, rng, params)
            })?;
        match sampled {
            Some(params) => {
                log::debug!("{} applied with {:?}", self.effect.name(), params);
                self.effect.process(waveform, sample_rate, &params)
            }
            None => Ok(waveform),
        }
    }

    fn freeze_parameters(&mut self, propagation: Propagation) {
        self.randomizer.freeze();
        if let Some(child) = propagation.for_children() {
            for transform in self.effect.nested_mut() {
                transform.freeze_parameters(child);
            }
        }
    }

    fn unfreeze_parameters(&mut self, propagation: Propagation) {
        self.randomizer.unfreeze();
        if let Some(child) = propagation.for_children() {
            for transform in self.effect.nested_mut() {
                transform.unfreeze_parameters(child);
            }
        }
    }

    fn serialize_parameters(&self, propagation: Propagation) -> Vec<ParameterRecord> {
        let mut records = vec![self.randomizer.to_record(self.effect.name())];
        if let Some(child) = propagation.for_children() {
            for transform in self.effect.nested() {
                records.extend(transform.serialize_parameters(child));
            }
        }
        records
    }

    fn restore_parameters(
        &mut self,
        records: &mut dyn Iterator<Item = ParameterRecord>,
    ) -> Result<()> {
        self.randomizer.restore_next(self.effect.name(), records)?;
        for transform in self.effect.nested_mut() {
            transform.restore_parameters(records)?;
        }
        Ok(())
    }
}
