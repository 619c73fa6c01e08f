use std::f64::consts::TAU;
use std::sync::Arc;

use ndarray::Array2;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use serde::{Deserialize, Serialize};

use crate::augmentation::domain::operator::{Effect, Operator};
use crate::augmentation::domain::parameter_space::{ParameterSpace, SampledParameters};
use crate::shared::error::Result;
use crate::shared::waveform::Waveform;

/// STFT analysis/synthesis window size.
const WINDOW_SIZE: usize = 2048;

/// Hop size between successive STFT frames.
const HOP_SIZE: usize = 512;

/// Number of non-negative frequency bins of one frame.
const BINS: usize = WINDOW_SIZE / 2 + 1;

/// Output samples covered by less than this share of the strongest window
/// overlap are zeroed instead of divided.
const MIN_OVERLAP_SHARE: f64 = 0.1;

/// Phase-vocoder pitch shift by a number of semitones drawn per activation.
///
/// Length preserving; each channel is shifted independently. Inputs shorter
/// than one analysis window pass through unchanged.
pub struct PitchShift {
    min_semitones: f64,
    max_semitones: f64,
    vocoder: PhaseVocoder,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PitchShiftOptions {
    pub min_semitones: f64,
    pub max_semitones: f64,
    pub p: f64,
}

impl Default for PitchShiftOptions {
    fn default() -> Self {
        Self {
            min_semitones: -4.0,
            max_semitones: 4.0,
            p: 0.5,
        }
    }
}

impl PitchShiftOptions {
    pub fn build(self) -> Result<Operator<PitchShift>> {
        Operator::new(
            PitchShift {
                min_semitones: self.min_semitones,
                max_semitones: self.max_semitones,
                vocoder: PhaseVocoder::new(),
            },
            self.p,
        )
    }
}

impl Effect for PitchShift {
    fn name(&self) -> &'static str {
        "PitchShift"
    }

    fn parameter_space(&self) -> Result<ParameterSpace> {
        ParameterSpace::new().uniform("semitones", self.min_semitones, self.max_semitones)
    }

    fn process(
        &mut self,
        waveform: Waveform,
        _sample_rate: u32,
        params: &SampledParameters,
    ) -> Result<Waveform> {
        let semitones = params.float("semitones")?;
        if semitones.abs() < 1e-10 || waveform.num_samples() < WINDOW_SIZE {
            return Ok(waveform);
        }

        let ratio = 2.0_f64.powf(semitones / 12.0);
        let mut out = Array2::<f32>::zeros(waveform.data().raw_dim());
        for (input, mut row) in waveform.data().rows().into_iter().zip(out.rows_mut()) {
            let input: Vec<f32> = input.to_vec();
            let shifted = self.vocoder.shift(&input, ratio);
            row.iter_mut()
                .zip(shifted)
                .for_each(|(dst, src)| *dst = src);
        }
        Ok(waveform.with_data(out))
    }
}

/// Hann-windowed STFT with its FFT plans made once and reused for every
/// channel and every call.
struct PhaseVocoder {
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    window: Vec<f64>,
    /// Phase a stationary sinusoid centred on each bin gains over one hop.
    hop_advance: Vec<f64>,
}

/// Magnitude and instantaneous frequency (radians per hop) of each bin.
struct Frame {
    magnitudes: Vec<f64>,
    frequencies: Vec<f64>,
}

impl PhaseVocoder {
    fn new() -> Self {
        let mut planner = FftPlanner::<f64>::new();
        Self {
            forward: planner.plan_fft_forward(WINDOW_SIZE),
            inverse: planner.plan_fft_inverse(WINDOW_SIZE),
            window: (0..WINDOW_SIZE)
                .map(|i| 0.5 * (1.0 - (TAU * i as f64 / WINDOW_SIZE as f64).cos()))
                .collect(),
            hop_advance: (0..BINS)
                .map(|k| TAU * k as f64 * HOP_SIZE as f64 / WINDOW_SIZE as f64)
                .collect(),
        }
    }

    /// Shifts one channel by `ratio` in frequency; needs at least one window
    /// of input. The result is never louder at its peak than the input.
    fn shift(&self, samples: &[f32], ratio: f64) -> Vec<f32> {
        let n = samples.len();
        let mut last_phases = vec![0.0; BINS];
        let mut synth_phases = vec![0.0; BINS];
        let mut output = vec![0.0f64; n];
        let mut overlap = vec![0.0f64; n];

        for start in (0..=n - WINDOW_SIZE).step_by(HOP_SIZE) {
            let frame = self.analyze(&samples[start..start + WINDOW_SIZE], &mut last_phases);
            let moved = move_bins(&frame, ratio);
            for (phase, freq) in synth_phases.iter_mut().zip(&moved.frequencies) {
                *phase += freq;
            }
            let grain = self.synthesize(&moved.magnitudes, &synth_phases);
            for (i, (g, w)) in grain.iter().zip(&self.window).enumerate() {
                output[start + i] += g * w;
                overlap[start + i] += w * w;
            }
        }

        let floor = overlap.iter().copied().fold(0.0, f64::max) * MIN_OVERLAP_SHARE;
        for (s, &o) in output.iter_mut().zip(&overlap) {
            *s = if o >= floor { *s / o } else { 0.0 };
        }
        limit_to_peak(samples, &output)
    }

    /// Windowed forward transform of one frame. `last_phases` holds the
    /// previous frame's raw phases and is updated in place.
    fn analyze(&self, chunk: &[f32], last_phases: &mut [f64]) -> Frame {
        let mut buf: Vec<Complex<f64>> = chunk
            .iter()
            .zip(&self.window)
            .map(|(&s, &w)| Complex::new(s as f64 * w, 0.0))
            .collect();
        self.forward.process(&mut buf);

        let mut magnitudes = Vec::with_capacity(BINS);
        let mut frequencies = Vec::with_capacity(BINS);
        for k in 0..BINS {
            let phase = buf[k].arg();
            let deviation = wrap_phase(phase - last_phases[k] - self.hop_advance[k]);
            magnitudes.push(buf[k].norm());
            frequencies.push(self.hop_advance[k] + deviation);
            last_phases[k] = phase;
        }
        Frame {
            magnitudes,
            frequencies,
        }
    }

    /// Inverse transform of a half spectrum given as polar pairs, normalized.
    fn synthesize(&self, magnitudes: &[f64], phases: &[f64]) -> Vec<f64> {
        let mut buf = vec![Complex::new(0.0, 0.0); WINDOW_SIZE];
        for k in 0..BINS {
            buf[k] = Complex::from_polar(magnitudes[k], phases[k]);
        }
        for k in 1..BINS - 1 {
            buf[WINDOW_SIZE - k] = buf[k].conj();
        }
        self.inverse.process(&mut buf);
        buf.iter().map(|c| c.re / WINDOW_SIZE as f64).collect()
    }
}

/// Moves bin `k` to `round(k * ratio)`, scaling its frequency by `ratio`.
/// When several bins land on one target the loudest wins.
fn move_bins(frame: &Frame, ratio: f64) -> Frame {
    let mut moved = Frame {
        magnitudes: vec![0.0; BINS],
        frequencies: vec![0.0; BINS],
    };
    for (k, (&magnitude, &freq)) in frame.magnitudes.iter().zip(&frame.frequencies).enumerate() {
        let target = (k as f64 * ratio).round() as usize;
        if target < BINS && magnitude > moved.magnitudes[target] {
            moved.magnitudes[target] = magnitude;
            moved.frequencies[target] = freq * ratio;
        }
    }
    moved
}

/// Wraps a phase into [-pi, pi].
fn wrap_phase(phase: f64) -> f64 {
    phase - TAU * (phase / TAU).round()
}

/// Scales `output` down so its peak does not exceed that of `input`.
fn limit_to_peak(input: &[f32], output: &[f64]) -> Vec<f32> {
    let input_peak = input.iter().map(|s| s.abs() as f64).fold(0.0, f64::max);
    let output_peak = output.iter().map(|s| s.abs()).fold(0.0, f64::max);
    let gain = if output_peak > 1e-10 && output_peak > input_peak {
        input_peak / output_peak
    } else {
        1.0
    };
    output.iter().map(|&s| (s * gain) as f32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::augmentation::domain::transform::Transform;
    use std::f64::consts::PI;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rstest::rstest;

    fn sine(freq: f64, duration: f64, sample_rate: u32) -> Vec<f32> {
        let len = (duration * sample_rate as f64) as usize;
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f64 / sample_rate as f64).sin() as f32)
            .collect()
    }

    fn fixed(semitones: f64) -> Operator<PitchShift> {
        PitchShiftOptions {
            min_semitones: semitones,
            max_semitones: semitones,
            p: 1.0,
        }
        .build()
        .unwrap()
    }

    #[test]
    fn test_pitch_shift_changes_audio_and_keeps_length() {
        let input = Waveform::mono(sine(440.0, 1.0, 16000));
        let out = fixed(4.0)
            .apply(input.clone(), 16000, &mut StdRng::seed_from_u64(0))
            .unwrap();
        assert_eq!(out.num_samples(), input.num_samples());
        assert_ne!(out, input);
    }

    #[test]
    fn test_pitch_shift_does_not_raise_peak() {
        let input = Waveform::mono(sine(440.0, 1.0, 16000));
        let out = fixed(-3.0)
            .apply(input, 16000, &mut StdRng::seed_from_u64(0))
            .unwrap();
        assert!(out.peak() <= 1.0 + 1e-6);
    }

    #[test]
    fn test_short_input_passes_through() {
        let input = Waveform::mono(sine(440.0, 0.05, 16000));
        let out = fixed(4.0)
            .apply(input.clone(), 16000, &mut StdRng::seed_from_u64(0))
            .unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn test_each_channel_is_shifted() {
        let tone = sine(300.0, 0.5, 16000);
        let data = Array2::from_shape_fn((2, tone.len()), |(c, i)| {
            if c == 0 {
                tone[i]
            } else {
                -tone[i]
            }
        });
        let out = fixed(2.0)
            .apply(Waveform::multichannel(data), 16000, &mut StdRng::seed_from_u64(0))
            .unwrap();
        assert_eq!(out.channels(), 2);
        let energy = |c: usize| out.channel(c).iter().map(|s| s * s).sum::<f32>();
        assert!(energy(0) > 0.0 && energy(1) > 0.0);
    }

    #[test]
    fn test_identical_channels_shift_identically() {
        let tone = sine(220.0, 0.5, 16000);
        let data = Array2::from_shape_fn((3, tone.len()), |(_, i)| tone[i]);
        let out = fixed(-5.0)
            .apply(Waveform::multichannel(data), 16000, &mut StdRng::seed_from_u64(0))
            .unwrap();
        assert_eq!(out.channel(0), out.channel(1));
        assert_eq!(out.channel(1), out.channel(2));
    }

    #[test]
    fn test_vocoder_carries_no_state_between_calls() {
        let vocoder = PhaseVocoder::new();
        let tone = sine(330.0, 0.4, 16000);
        let first = vocoder.shift(&tone, 1.5);
        let second = vocoder.shift(&tone, 1.5);
        assert_eq!(first, second);
        assert_eq!(first.len(), tone.len());
    }

    #[test]
    fn test_move_bins_keeps_loudest_source() {
        let mut frame = Frame {
            magnitudes: vec![0.0; BINS],
            frequencies: vec![0.0; BINS],
        };
        frame.magnitudes[10] = 1.0;
        frame.frequencies[10] = 0.5;
        frame.magnitudes[11] = 3.0;
        frame.frequencies[11] = 0.7;
        frame.magnitudes[12] = 2.0;
        frame.frequencies[12] = 0.9;
        // Halving sends 10 to bin 5, and both 11 and 12 to bin 6.
        let moved = move_bins(&frame, 0.5);
        assert_eq!(moved.magnitudes[5], 1.0);
        assert_eq!(moved.magnitudes[6], 3.0);
        assert!((moved.frequencies[6] - 0.35).abs() < 1e-12);

        let up = move_bins(&frame, 2.0);
        assert_eq!(up.magnitudes[20], 1.0);
        assert_eq!(up.magnitudes[22], 3.0);
        assert_eq!(up.magnitudes[24], 2.0);
    }

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(3.0 * PI, PI)]
    #[case(-2.5 * PI, -0.5 * PI)]
    #[case(TAU + 0.25, 0.25)]
    fn test_wrap_phase(#[case] phase: f64, #[case] expected: f64) {
        assert!((wrap_phase(phase).abs() - expected.abs()).abs() < 1e-12);
        assert!(wrap_phase(phase).abs() <= PI + 1e-12);
    }
}
