use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::compose::Compose;
use super::one_of::OneOf;
use super::some_of::{SomeOf, SomeOfCount};
use crate::augmentation::domain::transform::Transform;
use crate::shared::constants::DEFAULT_LRU_CACHE_SIZE;
use crate::shared::error::Result;
use crate::transforms::add_background_noise::{AddBackgroundNoiseOptions, NoiseRms};
use crate::transforms::add_gaussian_noise::AddGaussianNoiseOptions;
use crate::transforms::add_gaussian_snr::AddGaussianSnrOptions;
use crate::transforms::add_short_noises::AddShortNoisesOptions;
use crate::transforms::apply_impulse_response::ApplyImpulseResponseOptions;
use crate::transforms::clip::Clip;
use crate::transforms::gain::GainOptions;
use crate::transforms::normalize::{Normalize, NormalizeTarget};
use crate::transforms::pitch_shift::PitchShiftOptions;
use crate::transforms::polarity_inversion::PolarityInversion;
use crate::transforms::reverse::Reverse;
use crate::transforms::shift::ShiftOptions;
use crate::transforms::time_mask::TimeMaskOptions;

fn always() -> f64 {
    1.0
}

fn half() -> f64 {
    0.5
}

fn minus_one() -> f64 {
    -1.0
}

/// A whole pipeline as stored on disk.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Seed used when the caller does not pass one.
    #[serde(default)]
    pub seed: Option<u64>,
    pub pipeline: TransformConfig,
}

impl PipelineConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn build(&self) -> Result<Box<dyn Transform>> {
        self.pipeline.build()
    }
}

/// One node of a pipeline description, tagged by `"type"`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TransformConfig {
    Compose {
        transforms: Vec<TransformConfig>,
        #[serde(default)]
        shuffle: bool,
        #[serde(default = "always")]
        p: f64,
    },
    OneOf {
        transforms: Vec<TransformConfig>,
        #[serde(default)]
        weights: Option<Vec<f64>>,
        #[serde(default = "always")]
        p: f64,
    },
    SomeOf {
        transforms: Vec<TransformConfig>,
        num_transforms: SomeOfCount,
        #[serde(default)]
        weights: Option<Vec<f64>>,
        #[serde(default = "always")]
        p: f64,
    },
    AddBackgroundNoise(AddBackgroundNoiseConfig),
    AddShortNoises(AddShortNoisesOptions),
    ApplyImpulseResponse(ApplyImpulseResponseOptions),
    AddGaussianNoise(AddGaussianNoiseOptions),
    #[serde(rename = "AddGaussianSNR")]
    AddGaussianSnr(AddGaussianSnrOptions),
    Gain(GainOptions),
    PolarityInversion {
        #[serde(default = "half")]
        p: f64,
    },
    Reverse {
        #[serde(default = "half")]
        p: f64,
    },
    Normalize {
        #[serde(default)]
        target: NormalizeTarget,
        #[serde(default = "half")]
        p: f64,
    },
    Clip {
        #[serde(default = "minus_one")]
        a_min: f64,
        #[serde(default = "always")]
        a_max: f64,
        #[serde(default = "half")]
        p: f64,
    },
    TimeMask(TimeMaskOptions),
    Shift(ShiftOptions),
    PitchShift(PitchShiftOptions),
}

/// Background noise options, with the nested noise transform given as
/// configuration rather than as a built transform.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AddBackgroundNoiseConfig {
    pub sounds_path: Vec<PathBuf>,
    pub min_snr_db: f64,
    pub max_snr_db: f64,
    pub noise_rms: NoiseRms,
    pub min_absolute_rms_db: f64,
    pub max_absolute_rms_db: f64,
    pub noise_transform: Option<Box<TransformConfig>>,
    pub lru_cache_size: usize,
    pub p: f64,
}

impl Default for AddBackgroundNoiseConfig {
    fn default() -> Self {
        let defaults = AddBackgroundNoiseOptions::default();
        Self {
            sounds_path: defaults.sounds_path,
            min_snr_db: defaults.min_snr_db,
            max_snr_db: defaults.max_snr_db,
            noise_rms: defaults.noise_rms,
            min_absolute_rms_db: defaults.min_absolute_rms_db,
            max_absolute_rms_db: defaults.max_absolute_rms_db,
            noise_transform: None,
            lru_cache_size: DEFAULT_LRU_CACHE_SIZE,
            p: defaults.p,
        }
    }
}

impl TransformConfig {
    /// Builds the described transform tree, validating every node.
    pub fn build(&self) -> Result<Box<dyn Transform>> {
        let transform: Box<dyn Transform> = match self {
            TransformConfig::Compose {
                transforms,
                shuffle,
                p,
            } => Box::new(Compose::new(build_all(transforms)?, *shuffle, *p)?),
            TransformConfig::OneOf {
                transforms,
                weights,
                p,
            } => Box::new(OneOf::new(build_all(transforms)?, weights.clone(), *p)?),
            TransformConfig::SomeOf {
                transforms,
                num_transforms,
                weights,
                p,
            } => Box::new(SomeOf::new(
                build_all(transforms)?,
                *num_transforms,
                weights.clone(),
                *p,
            )?),
            TransformConfig::AddBackgroundNoise(config) => {
                let noise_transform = match &config.noise_transform {
                    Some(nested) => Some(nested.build()?),
                    None => None,
                };
                Box::new(
                    AddBackgroundNoiseOptions {
                        sounds_path: config.sounds_path.clone(),
                        min_snr_db: config.min_snr_db,
                        max_snr_db: config.max_snr_db,
                        noise_rms: config.noise_rms,
                        min_absolute_rms_db: config.min_absolute_rms_db,
                        max_absolute_rms_db: config.max_absolute_rms_db,
                        noise_transform,
                        lru_cache_size: config.lru_cache_size,
                        p: config.p,
                    }
                    .build()?,
                )
            }
            TransformConfig::AddShortNoises(options) => Box::new(options.clone().build()?),
            TransformConfig::ApplyImpulseResponse(options) => Box::new(options.clone().build()?),
            TransformConfig::AddGaussianNoise(options) => Box::new(options.clone().build()?),
            TransformConfig::AddGaussianSnr(options) => Box::new(options.clone().build()?),
            TransformConfig::Gain(options) => Box::new(options.clone().build()?),
            TransformConfig::PolarityInversion { p } => Box::new(PolarityInversion::build(*p)?),
            TransformConfig::Reverse { p } => Box::new(Reverse::build(*p)?),
            TransformConfig::Normalize { target, p } => Box::new(Normalize::build(*target, *p)?),
            TransformConfig::Clip { a_min, a_max, p } => Box::new(Clip::build(*a_min, *a_max, *p)?),
            TransformConfig::TimeMask(options) => Box::new(options.clone().build()?),
            TransformConfig::Shift(options) => Box::new(options.clone().build()?),
            TransformConfig::PitchShift(options) => Box::new(options.clone().build()?),
        };
        Ok(transform)
    }
}

fn build_all(configs: &[TransformConfig]) -> Result<Vec<Box<dyn Transform>>> {
    configs.iter().map(TransformConfig::build).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::infrastructure::sound_assets::test_support::write_wav;
    use crate::augmentation::domain::transform::Propagation;
    use crate::shared::error::AugmentError;

    #[test]
    fn test_parse_and_build_nested_pipeline() {
        let config = PipelineConfig::from_json(
            r#"{
                "seed": 42,
                "pipeline": {
                    "type": "Compose",
                    "shuffle": true,
                    "transforms": [
                        {"type": "Gain", "min_gain_db": -6, "max_gain_db": 6, "p": 1.0},
                        {"type": "OneOf", "weights": [1, 3], "transforms": [
                            {"type": "Reverse"},
                            {"type": "PolarityInversion", "p": 1.0}
                        ]},
                        {"type": "SomeOf", "num_transforms": [1, null], "transforms": [
                            {"type": "Shift"},
                            {"type": "TimeMask", "fade": true},
                            {"type": "AddGaussianSNR"}
                        ]},
                        {"type": "Clip", "a_min": -0.5, "a_max": 0.5}
                    ]
                }
            }"#,
        )
        .unwrap();
        assert_eq!(config.seed, Some(42));

        let pipeline = config.build().unwrap();
        let names: Vec<String> = pipeline
            .serialize_parameters(Propagation::Tree)
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(
            names,
            vec![
                "Compose",
                "Gain",
                "OneOf",
                "Reverse",
                "PolarityInversion",
                "SomeOf",
                "Shift",
                "TimeMask",
                "AddGaussianSNR",
                "Clip",
            ]
        );
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config: TransformConfig = serde_json::from_str(r#"{"type": "Gain"}"#).unwrap();
        match config {
            TransformConfig::Gain(options) => {
                assert_eq!(options.min_gain_db, -12.0);
                assert_eq!(options.max_gain_db, 12.0);
                assert_eq!(options.p, 0.5);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_invalid_options_fail_at_build() {
        let config: TransformConfig =
            serde_json::from_str(r#"{"type": "Gain", "min_gain_db": 6, "max_gain_db": -6}"#)
                .unwrap();
        assert!(matches!(
            config.build(),
            Err(AugmentError::Configuration(_))
        ));
    }

    #[test]
    fn test_unknown_type_is_a_serialization_error() {
        let result = PipelineConfig::from_json(r#"{"pipeline": {"type": "Flanger"}}"#);
        assert!(matches!(result, Err(AugmentError::Serialization(_))));
    }

    #[test]
    fn test_background_noise_with_nested_transform() {
        let dir = tempfile::tempdir().unwrap();
        write_wav(&dir.path().join("hum.wav"), &[0.1; 64], 16000);
        let json = format!(
            r#"{{"type": "AddBackgroundNoise",
                 "sounds_path": [{:?}],
                 "noise_rms": "absolute",
                 "noise_transform": {{"type": "Gain", "p": 1.0}}}}"#,
            dir.path().to_string_lossy()
        );
        let config: TransformConfig = serde_json::from_str(&json).unwrap();
        let transform = config.build().unwrap();
        assert_eq!(transform.name(), "AddBackgroundNoise");
    }

    #[test]
    fn test_short_noises_from_config() {
        let dir = tempfile::tempdir().unwrap();
        write_wav(&dir.path().join("knock.wav"), &[0.2; 160], 16000);
        let json = format!(
            r#"{{"type": "AddShortNoises",
                 "sounds_path": [{:?}],
                 "min_time_between_sounds": 0.5,
                 "max_time_between_sounds": 1.0,
                 "p": 1.0}}"#,
            dir.path().to_string_lossy()
        );
        let config: TransformConfig = serde_json::from_str(&json).unwrap();
        match &config {
            TransformConfig::AddShortNoises(options) => {
                assert_eq!(options.min_time_between_sounds, 0.5);
                assert_eq!(options.burst_probability, 0.22);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(config.build().unwrap().name(), "AddShortNoises");
    }
}
