use super::parameter_record::ParameterRecord;
use super::parameter_space::SampledParameters;

/// The outcome of one gate decision plus whatever was sampled for it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    pub active: bool,
    pub parameters: SampledParameters,
}

/// Last-sampled parameters of one transform instance and its freeze flag.
///
/// Every fresh decision overwrites the snapshot, frozen or not, so freezing
/// captures whatever was used last. Freezing before the first activation is
/// allowed: the next decision becomes the frozen snapshot.
#[derive(Clone, Debug, Default)]
pub struct FreezableState {
    snapshot: Option<Snapshot>,
    frozen: bool,
}

impl FreezableState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn unfreeze(&mut self) {
        self.frozen = false;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// The snapshot to replay, if frozen and something has been sampled.
    pub fn frozen_snapshot(&self) -> Option<&Snapshot> {
        if self.frozen {
            self.snapshot.as_ref()
        } else {
            None
        }
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn store(&mut self, active: bool, parameters: SampledParameters) {
        self.snapshot = Some(Snapshot { active, parameters });
    }

    pub fn to_record(&self, name: &str) -> ParameterRecord {
        let snapshot = self.snapshot.clone().unwrap_or_default();
        ParameterRecord {
            name: name.to_string(),
            active: snapshot.active,
            parameters: snapshot.parameters,
        }
    }

    /// Installs a serialized record as the snapshot and freezes on it.
    pub fn restore(&mut self, record: ParameterRecord) {
        self.store(record.active, record.parameters);
        self.frozen = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::augmentation::domain::parameter_space::ParamValue;

    fn params(value: f64) -> SampledParameters {
        let mut p = SampledParameters::new();
        p.insert("gain_db", ParamValue::Float(value));
        p
    }

    #[test]
    fn test_unfrozen_has_no_frozen_snapshot() {
        let mut state = FreezableState::new();
        state.store(true, params(1.0));
        assert!(state.frozen_snapshot().is_none());
        assert!(state.snapshot().is_some());
    }

    #[test]
    fn test_freeze_before_first_sample_waits_for_it() {
        let mut state = FreezableState::new();
        state.freeze();
        assert!(state.is_frozen());
        assert!(state.frozen_snapshot().is_none());
        state.store(true, params(2.0));
        assert_eq!(state.frozen_snapshot().unwrap().parameters, params(2.0));
    }

    #[test]
    fn test_unfreeze_releases_snapshot() {
        let mut state = FreezableState::new();
        state.store(true, params(1.0));
        state.freeze();
        state.unfreeze();
        assert!(state.frozen_snapshot().is_none());
    }

    #[test]
    fn test_record_before_any_activation_is_inactive() {
        let record = FreezableState::new().to_record("Gain");
        assert_eq!(record.name, "Gain");
        assert!(!record.active);
        assert!(record.parameters.is_empty());
    }

    #[test]
    fn test_restore_freezes() {
        let mut state = FreezableState::new();
        state.restore(ParameterRecord {
            name: "Gain".into(),
            active: true,
            parameters: params(-4.0),
        });
        assert!(state.is_frozen());
        assert_eq!(state.frozen_snapshot().unwrap().parameters, params(-4.0));
    }
}
