use rand::RngCore;

use super::freezable_state::FreezableState;
use super::parameter_record::ParameterRecord;
use super::parameter_space::{ParameterSpace, SampledParameters};
use super::random_gate::RandomGate;
use super::transform::GatePolicy;
use crate::shared::error::{AugmentError, Result};

/// Gate, parameter space and freezable state of one transform instance.
///
/// A frozen snapshot replays both the gate decision and the parameters, so a
/// frozen pipeline reproduces the previous run exactly.
#[derive(Clone, Debug)]
pub struct Randomizer {
    gate: RandomGate,
    space: ParameterSpace,
    state: FreezableState,
}

impl Randomizer {
    pub fn new(p: f64, space: ParameterSpace) -> Result<Self> {
        Ok(Self {
            gate: RandomGate::new(p)?,
            space,
            state: FreezableState::new(),
        })
    }

    pub fn probability(&self) -> f64 {
        self.gate.probability()
    }

    pub fn space(&self) -> &ParameterSpace {
        &self.space
    }

    pub fn state(&self) -> &FreezableState {
        &self.state
    }

    pub fn freeze(&mut self) {
        self.state.freeze();
    }

    pub fn unfreeze(&mut self) {
        self.state.unfreeze();
    }

    /// `None` when the transform stays inactive for this call.
    pub fn decide_and_sample(
        &mut self,
        rng: &mut dyn RngCore,
        policy: GatePolicy,
    ) -> Option<SampledParameters> {
        self.decide_and_sample_with(rng, policy, |_, _| {})
    }

    /// Like [`decide_and_sample`](Self::decide_and_sample), with `extra`
    /// adding values that are not simple declarations (child orderings,
    /// weighted picks) to a fresh sample.
    pub fn decide_and_sample_with<F>(
        &mut self,
        rng: &mut dyn RngCore,
        policy: GatePolicy,
        extra: F,
    ) -> Option<SampledParameters>
    where
        F: FnOnce(&mut dyn RngCore, &mut SampledParameters),
    {
        let sampled = self.try_decide_and_sample_with(rng, policy, |rng, params| {
            extra(rng, params);
            Ok(())
        });
        sampled.unwrap_or(None)
    }

    /// Fallible form of [`decide_and_sample_with`](Self::decide_and_sample_with).
    /// When `extra` fails nothing is stored and the error is returned.
    pub fn try_decide_and_sample_with<F>(
        &mut self,
        rng: &mut dyn RngCore,
        policy: GatePolicy,
        extra: F,
    ) -> Result<Option<SampledParameters>>
    where
        F: FnOnce(&mut dyn RngCore, &mut SampledParameters) -> Result<()>,
    {
        if let Some(snapshot) = self.state.frozen_snapshot() {
            if snapshot.active {
                return Ok(Some(snapshot.parameters.clone()));
            }
            if policy == GatePolicy::Roll {
                return Ok(None);
            }
            // Forced while frozen on an inactive snapshot: sample once and
            // keep that as the new frozen snapshot.
        }

        let active = match policy {
            GatePolicy::Roll => self.gate.decide(rng),
            GatePolicy::Bypass => true,
        };
        if !active {
            self.state.store(false, SampledParameters::new());
            return Ok(None);
        }

        let mut params = self.space.sample(rng);
        extra(rng, &mut params)?;
        self.state.store(true, params.clone());
        Ok(Some(params))
    }

    pub fn to_record(&self, name: &str) -> ParameterRecord {
        self.state.to_record(name)
    }

    /// Pulls the next record, checks it belongs to `name` and freezes on it.
    pub fn restore_next(
        &mut self,
        name: &str,
        records: &mut dyn Iterator<Item = ParameterRecord>,
    ) -> Result<()> {
        let record = records.next().ok_or_else(|| {
            AugmentError::Replay(format!("no record left for transform '{name}'"))
        })?;
        if record.name != name {
            return Err(AugmentError::Replay(format!(
                "expected a record for '{name}', found '{}'",
                record.name
            )));
        }
        self.state.restore(record);
        Ok(())
    }
}
