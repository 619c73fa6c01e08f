use std::path::{Path, PathBuf};

use ndarray::Array2;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use serde::{Deserialize, Serialize};

use crate::audio::infrastructure::sound_assets::SoundAssets;
use crate::augmentation::domain::operator::{Effect, Operator};
use crate::augmentation::domain::parameter_space::{ParameterSpace, SampledParameters};
use crate::shared::constants::DEFAULT_LRU_CACHE_SIZE;
use crate::shared::error::Result;
use crate::shared::waveform::Waveform;

/// Convolves the input with a randomly chosen impulse response, e.g. a room
/// recording, to simulate that acoustic space.
pub struct ApplyImpulseResponse {
    assets: SoundAssets,
    leave_length_unchanged: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplyImpulseResponseOptions {
    /// Impulse response files and/or directories searched recursively.
    pub ir_path: Vec<PathBuf>,
    /// Cut the reverberant tail so the output keeps the input length.
    pub leave_length_unchanged: bool,
    pub lru_cache_size: usize,
    pub p: f64,
}

impl Default for ApplyImpulseResponseOptions {
    fn default() -> Self {
        Self {
            ir_path: Vec::new(),
            leave_length_unchanged: true,
            lru_cache_size: DEFAULT_LRU_CACHE_SIZE,
            p: 0.5,
        }
    }
}

impl ApplyImpulseResponseOptions {
    pub fn build(self) -> Result<Operator<ApplyImpulseResponse>> {
        let assets = SoundAssets::discover(&self.ir_path, self.lru_cache_size)?;
        self.build_with_assets(assets)
    }

    pub fn build_with_assets(self, assets: SoundAssets) -> Result<Operator<ApplyImpulseResponse>> {
        Operator::new(
            ApplyImpulseResponse {
                assets,
                leave_length_unchanged: self.leave_length_unchanged,
            },
            self.p,
        )
    }
}

impl Effect for ApplyImpulseResponse {
    fn name(&self) -> &'static str {
        "ApplyImpulseResponse"
    }

    fn parameter_space(&self) -> Result<ParameterSpace> {
        ParameterSpace::new().choice("ir_path", self.assets.choices())
    }

    fn process(
        &mut self,
        waveform: Waveform,
        sample_rate: u32,
        params: &SampledParameters,
    ) -> Result<Waveform> {
        let num_samples = waveform.num_samples();
        if num_samples == 0 {
            return Ok(waveform);
        }
        let ir = self
            .assets
            .load(Path::new(params.text("ir_path")?), sample_rate)?
            .downmix();
        if ir.is_empty() {
            return Ok(waveform);
        }

        let out_len = if self.leave_length_unchanged {
            num_samples
        } else {
            num_samples + ir.len() - 1
        };
        let mut out = Array2::<f32>::zeros((waveform.channels(), out_len));
        for (c, mut row) in out.rows_mut().into_iter().enumerate() {
            let input = waveform.channel(c).to_vec();
            for (dst, src) in row.iter_mut().zip(convolve(&input, &ir)) {
                *dst = src;
            }
        }
        Ok(waveform.with_data(out))
    }
}

/// Full linear convolution (`signal.len() + ir.len() - 1` samples) via FFT.
fn convolve(signal: &[f32], ir: &[f32]) -> Vec<f32> {
    let full_len = signal.len() + ir.len() - 1;
    let fft_len = full_len.next_power_of_two();

    let mut planner = FftPlanner::<f32>::new();
    let forward = planner.plan_fft_forward(fft_len);
    let inverse = planner.plan_fft_inverse(fft_len);

    let padded = |samples: &[f32]| -> Vec<Complex<f32>> {
        let mut buf = vec![Complex::new(0.0, 0.0); fft_len];
        for (dst, &s) in buf.iter_mut().zip(samples) {
            dst.re = s;
        }
        buf
    };
    let mut a = padded(signal);
    let mut b = padded(ir);
    forward.process(&mut a);
    forward.process(&mut b);

    for (x, y) in a.iter_mut().zip(&b) {
        *x *= *y;
    }
    inverse.process(&mut a);

    // rustfft does not normalize
    let norm = 1.0 / fft_len as f32;
    a[..full_len].iter().map(|c| c.re * norm).collect()
}
