use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::audio::domain::gain::{
    is_silent, rms, rms_of, solve_gain_for_target_absolute_rms, solve_gain_for_target_snr,
};
use crate::audio::infrastructure::sound_assets::SoundAssets;
use crate::augmentation::domain::operator::{Effect, Operator};
use crate::augmentation::domain::parameter_space::{ParameterSpace, SampledParameters};
use crate::augmentation::domain::transform::Transform;
use crate::shared::constants::DEFAULT_LRU_CACHE_SIZE;
use crate::shared::error::{AugmentError, Result};
use crate::shared::waveform::Waveform;

/// How the level of the mixed-in noise is chosen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseRms {
    /// Relative to the input: a target SNR in dB.
    #[default]
    Relative,
    /// An absolute RMS level in dBFS, independent of the input.
    Absolute,
}

/// Mixes in an excerpt of a randomly chosen background sound.
pub struct AddBackgroundNoise {
    assets: SoundAssets,
    noise_rms: NoiseRms,
    min_db: f64,
    max_db: f64,
    /// Runs with a generator seeded from `noise_transform_seed`; its own
    /// records follow this operator's record.
    noise_transform: Option<Box<dyn Transform>>,
}

pub struct AddBackgroundNoiseOptions {
    /// Sound files and/or directories searched recursively.
    pub sounds_path: Vec<PathBuf>,
    pub min_snr_db: f64,
    pub max_snr_db: f64,
    pub noise_rms: NoiseRms,
    pub min_absolute_rms_db: f64,
    pub max_absolute_rms_db: f64,
    /// Applied to the fitted noise excerpt before its level is measured.
    pub noise_transform: Option<Box<dyn Transform>>,
    pub lru_cache_size: usize,
    pub p: f64,
}

impl Default for AddBackgroundNoiseOptions {
    fn default() -> Self {
        Self {
            sounds_path: Vec::new(),
            min_snr_db: 3.0,
            max_snr_db: 30.0,
            noise_rms: NoiseRms::Relative,
            min_absolute_rms_db: -45.0,
            max_absolute_rms_db: -15.0,
            noise_transform: None,
            lru_cache_size: DEFAULT_LRU_CACHE_SIZE,
            p: 0.5,
        }
    }
}

impl AddBackgroundNoiseOptions {
    /// Resolves `sounds_path` and builds the operator with the default
    /// decoder and resampler.
    pub fn build(self) -> Result<Operator<AddBackgroundNoise>> {
        self.validate()?;
        let assets = SoundAssets::discover(&self.sounds_path, self.lru_cache_size)?;
        self.build_with_assets(assets)
    }

    /// Builds the operator over an already resolved set of sounds.
    pub fn build_with_assets(self, assets: SoundAssets) -> Result<Operator<AddBackgroundNoise>> {
        self.validate()?;
        let (min_db, max_db) = match self.noise_rms {
            NoiseRms::Relative => (self.min_snr_db, self.max_snr_db),
            NoiseRms::Absolute => (self.min_absolute_rms_db, self.max_absolute_rms_db),
        };
        Operator::new(
            AddBackgroundNoise {
                assets,
                noise_rms: self.noise_rms,
                min_db,
                max_db,
                noise_transform: self.noise_transform,
            },
            self.p,
        )
    }

    fn validate(&self) -> Result<()> {
        if self.noise_rms == NoiseRms::Absolute && self.max_absolute_rms_db > 0.0 {
            return Err(AugmentError::config(format!(
                "max_absolute_rms_db must be at most 0 dB, got {}",
                self.max_absolute_rms_db
            )));
        }
        Ok(())
    }
}

impl AddBackgroundNoise {
    pub fn assets(&self) -> &SoundAssets {
        &self.assets
    }

    fn level_name(&self) -> &'static str {
        match self.noise_rms {
            NoiseRms::Relative => "snr_db",
            NoiseRms::Absolute => "rms_db",
        }
    }
}

impl Effect for AddBackgroundNoise {
    fn name(&self) -> &'static str {
        "AddBackgroundNoise"
    }

    fn parameter_space(&self) -> Result<ParameterSpace> {
        let space = ParameterSpace::new()
            .choice("noise_path", self.assets.choices())?
            .uniform(self.level_name(), self.min_db, self.max_db)?
            .uniform("offset", 0.0, 1.0)?;
        Ok(match self.noise_transform {
            Some(_) => space.seed("noise_transform_seed"),
            None => space,
        })
    }

    fn nested(&self) -> &[Box<dyn Transform>] {
        self.noise_transform.as_slice()
    }

    fn nested_mut(&mut self) -> &mut [Box<dyn Transform>] {
        self.noise_transform.as_mut_slice()
    }

    fn process(
        &mut self,
        mut waveform: Waveform,
        sample_rate: u32,
        params: &SampledParameters,
    ) -> Result<Waveform> {
        let num_samples = waveform.num_samples();
        if num_samples == 0 {
            return Ok(waveform);
        }

        let signal_rms = rms(&waveform);
        if self.noise_rms == NoiseRms::Relative && is_silent(signal_rms) {
            log::warn!("AddBackgroundNoise: input is silent, leaving it unchanged");
            return Ok(waveform);
        }

        let path = params.text("noise_path")?;
        let noise = self.assets.load(Path::new(path), sample_rate)?;
        let fitted = fit_to_length(&noise.downmix(), num_samples, params.float("offset")?);

        let noise = match self.noise_transform.as_mut() {
            Some(transform) => {
                let mut rng = StdRng::seed_from_u64(params.seed("noise_transform_seed")?);
                transform
                    .apply(Waveform::mono(fitted), sample_rate, &mut rng)?
                    .downmix()
            }
            None => fitted,
        };
        if noise.len() != num_samples {
            return Err(AugmentError::shape(format!(
                "noise transform changed the length from {num_samples} to {}",
                noise.len()
            )));
        }

        let noise_rms = rms_of(noise.iter().copied());
        if is_silent(noise_rms) {
            log::warn!("AddBackgroundNoise: {path} is silent, skipping");
            return Ok(waveform);
        }

        let gain = match self.noise_rms {
            NoiseRms::Relative => {
                solve_gain_for_target_snr(signal_rms, noise_rms, params.float("snr_db")?)
            }
            NoiseRms::Absolute => {
                solve_gain_for_target_absolute_rms(noise_rms, params.float("rms_db")?)
            }
        } as f32;

        for mut row in waveform.data_mut().rows_mut() {
            for (s, n) in row.iter_mut().zip(&noise) {
                *s += n * gain;
            }
        }
        Ok(waveform)
    }
}

/// Loops noise shorter than `len` from its start; otherwise cuts a `len`
/// window whose start is `offset` (in [0, 1]) of the available slack.
fn fit_to_length(noise: &[f32], len: usize, offset: f64) -> Vec<f32> {
    if noise.is_empty() {
        return vec![0.0; len];
    }
    if noise.len() < len {
        return noise.iter().copied().cycle().take(len).collect();
    }
    let slack = noise.len() - len;
    let start = ((offset * (slack + 1) as f64).floor() as usize).min(slack);
    noise[start..start + len].to_vec()
}
