use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::augmentation::domain::parameter_record::ParameterRecord;
use crate::augmentation::domain::transform::{Propagation, Transform};
use crate::shared::error::{AugmentError, Result};
use crate::shared::waveform::Waveform;

/// A pipeline together with the random source that drives it.
///
/// Two augmenters built from the same pipeline and seed produce the same
/// sequence of outputs.
pub struct Augmenter {
    root: Box<dyn Transform>,
    rng: StdRng,
}

impl Augmenter {
    pub fn new(root: Box<dyn Transform>, seed: u64) -> Self {
        Self {
            root,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seeds from the operating system.
    pub fn from_entropy(root: Box<dyn Transform>) -> Self {
        Self {
            root,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn root(&self) -> &dyn Transform {
        self.root.as_ref()
    }

    pub fn run(&mut self, waveform: Waveform, sample_rate: u32) -> Result<Waveform> {
        log::debug!(
            "Augmenting {} channel(s) x {} samples at {sample_rate} Hz",
            waveform.channels(),
            waveform.num_samples()
        );
        self.root.apply(waveform, sample_rate, &mut self.rng)
    }

    pub fn freeze(&mut self) {
        self.root.freeze_parameters(Propagation::Tree);
    }

    pub fn unfreeze(&mut self) {
        self.root.unfreeze_parameters(Propagation::Tree);
    }

    /// Records for the whole tree, in pre-order.
    pub fn parameters(&self) -> Vec<ParameterRecord> {
        self.root.serialize_parameters(Propagation::Tree)
    }

    pub fn save_parameters(&self, path: &Path) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &self.parameters())?;
        log::info!("Saved augmentation parameters to {}", path.display());
        Ok(())
    }

    /// Installs `records` across the tree and freezes it, so the next run
    /// replays them. Every record must be consumed.
    pub fn restore(&mut self, records: Vec<ParameterRecord>) -> Result<()> {
        let total = records.len();
        let mut iter = records.into_iter();
        self.root.restore_parameters(&mut iter)?;
        let leftover = iter.count();
        if leftover > 0 {
            return Err(AugmentError::Replay(format!(
                "{leftover} of {total} records were not used by the pipeline"
            )));
        }
        Ok(())
    }

    pub fn replay_parameters(&mut self, path: &Path) -> Result<()> {
        let reader = BufReader::new(File::open(path)?);
        let records: Vec<ParameterRecord> = serde_json::from_reader(reader)?;
        log::info!(
            "Replaying {} parameter records from {}",
            records.len(),
            path.display()
        );
        self.restore(records)
    }
}
