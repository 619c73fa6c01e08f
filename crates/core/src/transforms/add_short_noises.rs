use std::path::{Path, PathBuf};

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::audio::domain::gain::{
    is_silent, rms, rms_of, solve_gain_for_target_absolute_rms, solve_gain_for_target_snr,
};
use crate::audio::infrastructure::sound_assets::SoundAssets;
use crate::augmentation::domain::operator::{Effect, Operator};
use crate::augmentation::domain::parameter_space::{
    check_range, ParamValue, ParameterSpace, SampledParameters,
};
use crate::shared::constants::SHORT_NOISES_LRU_CACHE_SIZE;
use crate::shared::error::{AugmentError, Result};
use crate::shared::waveform::Waveform;

use super::add_background_noise::NoiseRms;

/// Scatters short sounds (door slams, coughs, clicks) over the input, each
/// with its own level and fades.
///
/// Sounds are laid out one after another: each starts a random pause after
/// the previous one ends. With `burst_probability` a pause is shortened or
/// stretched by a pause factor, which gives clusters of sounds.
pub struct AddShortNoises {
    assets: SoundAssets,
    noise_rms: NoiseRms,
    min_db: f64,
    max_db: f64,
    min_time_between_sounds: f64,
    max_time_between_sounds: f64,
    burst_probability: f64,
    min_pause_factor_during_burst: f64,
    max_pause_factor_during_burst: f64,
    min_fade_in_time: f64,
    max_fade_in_time: f64,
    min_fade_out_time: f64,
    max_fade_out_time: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AddShortNoisesOptions {
    /// Sound files and/or directories searched recursively.
    pub sounds_path: Vec<PathBuf>,
    pub min_snr_db: f64,
    pub max_snr_db: f64,
    pub noise_rms: NoiseRms,
    pub min_absolute_noise_rms_db: f64,
    pub max_absolute_noise_rms_db: f64,
    /// Pause, in seconds, between the end of one sound and the next start.
    pub min_time_between_sounds: f64,
    pub max_time_between_sounds: f64,
    pub burst_probability: f64,
    pub min_pause_factor_during_burst: f64,
    pub max_pause_factor_during_burst: f64,
    /// Linear fade lengths in seconds.
    pub min_fade_in_time: f64,
    pub max_fade_in_time: f64,
    pub min_fade_out_time: f64,
    pub max_fade_out_time: f64,
    pub lru_cache_size: usize,
    pub p: f64,
}

impl Default for AddShortNoisesOptions {
    fn default() -> Self {
        Self {
            sounds_path: Vec::new(),
            min_snr_db: -6.0,
            max_snr_db: 18.0,
            noise_rms: NoiseRms::Relative,
            min_absolute_noise_rms_db: -50.0,
            max_absolute_noise_rms_db: -20.0,
            min_time_between_sounds: 2.0,
            max_time_between_sounds: 8.0,
            burst_probability: 0.22,
            min_pause_factor_during_burst: 0.1,
            max_pause_factor_during_burst: 1.1,
            min_fade_in_time: 0.005,
            max_fade_in_time: 0.08,
            min_fade_out_time: 0.01,
            max_fade_out_time: 0.1,
            lru_cache_size: SHORT_NOISES_LRU_CACHE_SIZE,
            p: 0.5,
        }
    }
}

impl AddShortNoisesOptions {
    pub fn build(self) -> Result<Operator<AddShortNoises>> {
        self.validate()?;
        let assets = SoundAssets::discover(&self.sounds_path, self.lru_cache_size)?;
        self.build_with_assets(assets)
    }

    pub fn build_with_assets(self, assets: SoundAssets) -> Result<Operator<AddShortNoises>> {
        self.validate()?;
        let (min_db, max_db) = match self.noise_rms {
            NoiseRms::Relative => (self.min_snr_db, self.max_snr_db),
            NoiseRms::Absolute => (
                self.min_absolute_noise_rms_db,
                self.max_absolute_noise_rms_db,
            ),
        };
        Operator::new(
            AddShortNoises {
                assets,
                noise_rms: self.noise_rms,
                min_db,
                max_db,
                min_time_between_sounds: self.min_time_between_sounds,
                max_time_between_sounds: self.max_time_between_sounds,
                burst_probability: self.burst_probability,
                min_pause_factor_during_burst: self.min_pause_factor_during_burst,
                max_pause_factor_during_burst: self.max_pause_factor_during_burst,
                min_fade_in_time: self.min_fade_in_time,
                max_fade_in_time: self.max_fade_in_time,
                min_fade_out_time: self.min_fade_out_time,
                max_fade_out_time: self.max_fade_out_time,
            },
            self.p,
        )
    }

    fn validate(&self) -> Result<()> {
        check_range("snr_db", self.min_snr_db, self.max_snr_db)?;
        check_range(
            "absolute_noise_rms_db",
            self.min_absolute_noise_rms_db,
            self.max_absolute_noise_rms_db,
        )?;
        check_range(
            "time_between_sounds",
            self.min_time_between_sounds,
            self.max_time_between_sounds,
        )?;
        check_range(
            "pause_factor_during_burst",
            self.min_pause_factor_during_burst,
            self.max_pause_factor_during_burst,
        )?;
        check_range("fade_in_time", self.min_fade_in_time, self.max_fade_in_time)?;
        check_range("fade_out_time", self.min_fade_out_time, self.max_fade_out_time)?;

        // A zero pause could place sounds forever.
        if self.min_time_between_sounds <= 0.0 {
            return Err(AugmentError::config(format!(
                "min_time_between_sounds must be positive, got {}",
                self.min_time_between_sounds
            )));
        }
        if self.min_pause_factor_during_burst <= 0.0 {
            return Err(AugmentError::config(format!(
                "min_pause_factor_during_burst must be positive, got {}",
                self.min_pause_factor_during_burst
            )));
        }
        if !(0.0..=1.0).contains(&self.burst_probability) {
            return Err(AugmentError::config(format!(
                "burst_probability must be in [0, 1], got {}",
                self.burst_probability
            )));
        }
        if self.min_fade_in_time < 0.0 || self.min_fade_out_time < 0.0 {
            return Err(AugmentError::config("fade times must be non-negative"));
        }
        if self.noise_rms == NoiseRms::Absolute && self.max_absolute_noise_rms_db > 0.0 {
            return Err(AugmentError::config(format!(
                "max_absolute_noise_rms_db must be at most 0 dB, got {}",
                self.max_absolute_noise_rms_db
            )));
        }
        Ok(())
    }
}

impl AddShortNoises {
    pub fn assets(&self) -> &SoundAssets {
        &self.assets
    }

    fn level_name(&self) -> &'static str {
        match self.noise_rms {
            NoiseRms::Relative => "snr_db",
            NoiseRms::Absolute => "rms_db",
        }
    }

    fn pause(&self, rng: &mut dyn RngCore) -> f64 {
        let pause = rng.gen_range(self.min_time_between_sounds..=self.max_time_between_sounds);
        if rng.gen::<f64>() < self.burst_probability {
            pause
                * rng.gen_range(
                    self.min_pause_factor_during_burst..=self.max_pause_factor_during_burst,
                )
        } else {
            pause
        }
    }
}

impl Effect for AddShortNoises {
    fn name(&self) -> &'static str {
        "AddShortNoises"
    }

    /// Everything is laid out per call, since it depends on the input length.
    fn parameter_space(&self) -> Result<ParameterSpace> {
        Ok(ParameterSpace::new())
    }

    fn sample_for_input(
        &mut self,
        waveform: &Waveform,
        sample_rate: u32,
        rng: &mut dyn RngCore,
        params: &mut SampledParameters,
    ) -> Result<()> {
        let duration = waveform.duration(sample_rate);
        let files = self.assets.files().to_vec();

        let mut paths = Vec::new();
        let mut starts = Vec::new();
        let mut levels = Vec::new();
        let mut fade_ins = Vec::new();
        let mut fade_outs = Vec::new();

        // The first sound always begins inside the input.
        let mut time = if duration > 0.0 {
            rng.gen_range(0.0..duration.min(self.min_time_between_sounds))
        } else {
            duration
        };
        while time < duration {
            let path = &files[rng.gen_range(0..files.len())];
            let sound = self.assets.load(path, sample_rate)?;

            paths.push(path.to_string_lossy().into_owned());
            starts.push(time);
            levels.push(rng.gen_range(self.min_db..=self.max_db));
            fade_ins.push(rng.gen_range(self.min_fade_in_time..=self.max_fade_in_time));
            fade_outs.push(rng.gen_range(self.min_fade_out_time..=self.max_fade_out_time));

            time += sound.duration(sample_rate) + self.pause(rng);
        }

        params.insert("noise_paths", ParamValue::TextList(paths));
        params.insert("start_times", ParamValue::FloatList(starts));
        params.insert(self.level_name(), ParamValue::FloatList(levels));
        params.insert("fade_in_times", ParamValue::FloatList(fade_ins));
        params.insert("fade_out_times", ParamValue::FloatList(fade_outs));
        Ok(())
    }

    fn process(
        &mut self,
        mut waveform: Waveform,
        sample_rate: u32,
        params: &SampledParameters,
    ) -> Result<Waveform> {
        let paths = params.texts("noise_paths")?;
        let starts = params.floats("start_times")?;
        let levels = params.floats(self.level_name())?;
        let fade_ins = params.floats("fade_in_times")?;
        let fade_outs = params.floats("fade_out_times")?;
        let count = paths.len();
        if [starts.len(), levels.len(), fade_ins.len(), fade_outs.len()]
            .iter()
            .any(|&len| len != count)
        {
            return Err(AugmentError::Replay(format!(
                "AddShortNoises: per-sound lists disagree on the number of sounds ({count} paths)"
            )));
        }

        let num_samples = waveform.num_samples();
        if count == 0 || num_samples == 0 {
            return Ok(waveform);
        }
        let signal_rms = rms(&waveform);
        if self.noise_rms == NoiseRms::Relative && is_silent(signal_rms) {
            log::warn!("AddShortNoises: input is silent, leaving it unchanged");
            return Ok(waveform);
        }

        let mut mix = vec![0.0f32; num_samples];
        for i in 0..count {
            let mut sound = self
                .assets
                .load(Path::new(&paths[i]), sample_rate)?
                .downmix();
            apply_fades(
                &mut sound,
                seconds_to_samples(fade_ins[i], sample_rate),
                seconds_to_samples(fade_outs[i], sample_rate),
            );

            let sound_rms = rms_of(sound.iter().copied());
            if is_silent(sound_rms) {
                log::warn!("AddShortNoises: {} is silent, skipping", paths[i]);
                continue;
            }
            let gain = match self.noise_rms {
                NoiseRms::Relative => solve_gain_for_target_snr(signal_rms, sound_rms, levels[i]),
                NoiseRms::Absolute => solve_gain_for_target_absolute_rms(sound_rms, levels[i]),
            } as f32;

            let start = (starts[i] * sample_rate as f64).round() as i64;
            for (j, s) in sound.iter().enumerate() {
                let Ok(pos) = usize::try_from(start + j as i64) else {
                    continue;
                };
                if pos >= num_samples {
                    break;
                }
                mix[pos] += s * gain;
            }
        }

        for mut row in waveform.data_mut().rows_mut() {
            for (s, n) in row.iter_mut().zip(&mix) {
                *s += n;
            }
        }
        Ok(waveform)
    }
}

fn seconds_to_samples(seconds: f64, sample_rate: u32) -> usize {
    (seconds.max(0.0) * sample_rate as f64).round() as usize
}

/// Linear fade in over the first `fade_in` samples and fade out over the last
/// `fade_out`, each capped at the sound's length.
fn apply_fades(sound: &mut [f32], fade_in: usize, fade_out: usize) {
    let len = sound.len();
    let fade_in = fade_in.min(len);
    for (i, s) in sound[..fade_in].iter_mut().enumerate() {
        *s *= i as f32 / fade_in as f32;
    }
    let fade_out = fade_out.min(len);
    for (i, s) in sound[len - fade_out..].iter_mut().rev().enumerate() {
        *s *= i as f32 / fade_out as f32;
    }
}
