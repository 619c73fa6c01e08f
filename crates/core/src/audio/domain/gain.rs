//! Level measurement and gain solving for signal-level-aware mixing.
//!
//! RMS is always taken over the flattened buffer, all channels together.
//! Digital silence (`rms == 0`) has no finite dB value; callers check
//! [`is_silent`] before converting and skip mixing instead.

use crate::shared::constants::SILENCE_RMS_THRESHOLD;
use crate::shared::waveform::Waveform;

pub fn rms(waveform: &Waveform) -> f64 {
    rms_of(waveform.data().iter().copied())
}

pub fn rms_of(samples: impl IntoIterator<Item = f32>) -> f64 {
    let (sum, count) = samples
        .into_iter()
        .fold((0.0f64, 0usize), |(sum, count), s| {
            (sum + (s as f64) * (s as f64), count + 1)
        });
    if count == 0 {
        0.0
    } else {
        (sum / count as f64).sqrt()
    }
}

pub fn is_silent(rms: f64) -> bool {
    rms < SILENCE_RMS_THRESHOLD
}

pub fn db_to_amplitude_ratio(db: f64) -> f64 {
    10.0f64.powf(db / 20.0)
}

/// `20 * log10(ratio)`; negative infinity for a zero ratio.
pub fn amplitude_ratio_to_db(ratio: f64) -> f64 {
    20.0 * ratio.log10()
}

/// Gain for the noise so that `20*log10(signal_rms / (noise_rms*gain))`
/// equals `target_snr_db`. Zero (no noise) when either level is silent.
pub fn solve_gain_for_target_snr(signal_rms: f64, noise_rms: f64, target_snr_db: f64) -> f64 {
    if is_silent(signal_rms) || is_silent(noise_rms) {
        return 0.0;
    }
    signal_rms / (noise_rms * db_to_amplitude_ratio(target_snr_db))
}

/// Gain that brings the noise to an absolute RMS level in dBFS, whatever the
/// signal level is. Zero when the noise itself is silent.
pub fn solve_gain_for_target_absolute_rms(noise_rms: f64, target_rms_db: f64) -> f64 {
    if is_silent(noise_rms) {
        return 0.0;
    }
    db_to_amplitude_ratio(target_rms_db) / noise_rms
}
