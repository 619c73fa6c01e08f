use rand::RngCore;

use super::parameter_record::ParameterRecord;
use crate::shared::error::Result;
use crate::shared::waveform::Waveform;

/// How far freeze, unfreeze and serialize reach into nested transforms.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Propagation {
    /// Only the transform the call is made on.
    SelfOnly,
    /// The transform and its direct children, but not grandchildren.
    DirectChildren,
    /// The whole nested tree.
    #[default]
    Tree,
}

impl Propagation {
    /// Propagation to hand down to children, or `None` to stop here.
    pub fn for_children(self) -> Option<Propagation> {
        match self {
            Propagation::SelfOnly => None,
            Propagation::DirectChildren => Some(Propagation::SelfOnly),
            Propagation::Tree => Some(Propagation::Tree),
        }
    }
}

/// Whether a transform rolls its own probability gate on this call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GatePolicy {
    Roll,
    /// Run unconditionally; used by composers that already picked the child.
    Bypass,
}

/// Anything that turns a waveform into another waveform: single operators
/// and composers alike, so both nest uniformly.
///
/// Randomness comes from the `rng` handle passed on each call; transforms
/// never reach for a global source. Errors are never swallowed: a failing
/// transform aborts the whole run.
pub trait Transform: Send {
    fn name(&self) -> &str;

    fn probability(&self) -> f64;

    fn apply_with_gate(
        &mut self,
        waveform: Waveform,
        sample_rate: u32,
        rng: &mut dyn RngCore,
        gate: GatePolicy,
    ) -> Result<Waveform>;

    fn apply(
        &mut self,
        waveform: Waveform,
        sample_rate: u32,
        rng: &mut dyn RngCore,
    ) -> Result<Waveform> {
        self.apply_with_gate(waveform, sample_rate, rng, GatePolicy::Roll)
    }

    fn freeze_parameters(&mut self, propagation: Propagation);

    fn unfreeze_parameters(&mut self, propagation: Propagation);

    /// Pre-order records: this transform first, then its children.
    fn serialize_parameters(&self, propagation: Propagation) -> Vec<ParameterRecord>;

    /// Consumes records in the same pre-order `serialize_parameters(Tree)`
    /// produced them and freezes on each.
    fn restore_parameters(
        &mut self,
        records: &mut dyn Iterator<Item = ParameterRecord>,
    ) -> Result<()>;
}

impl Transform for Box<dyn Transform> {
    fn name(&self) -> &str {
        self.as_ref().name()
    }

    fn probability(&self) -> f64 {
        self.as_ref().probability()
    }

    fn apply_with_gate(
        &mut self,
        waveform: Waveform,
        sample_rate: u32,
        rng: &mut dyn RngCore,
        gate: GatePolicy,
    ) -> Result<Waveform> {
        self.as_mut().apply_with_gate(waveform, sample_rate, rng, gate)
    }

    fn freeze_parameters(&mut self, propagation: Propagation) {
        self.as_mut().freeze_parameters(propagation)
    }

    fn unfreeze_parameters(&mut self, propagation: Propagation) {
        self.as_mut().unfreeze_parameters(propagation)
    }

    fn serialize_parameters(&self, propagation: Propagation) -> Vec<ParameterRecord> {
        self.as_ref().serialize_parameters(propagation)
    }

    fn restore_parameters(
        &mut self,
        records: &mut dyn Iterator<Item = ParameterRecord>,
    ) -> Result<()> {
        self.as_mut().restore_parameters(records)
    }
}
