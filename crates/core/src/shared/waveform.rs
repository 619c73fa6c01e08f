use ndarray::{Array1, Array2, ArrayView1, Axis};

use super::error::{AugmentError, Result};

/// Whether a waveform was handed in as a 1-D or a 2-D signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    Mono,
    Multichannel,
}

/// Floating-point audio samples, stored channel-major (`channels × samples`).
///
/// The sample rate is not part of the waveform; it travels alongside it at
/// call time. Mono waveforms are a single row that remembers its 1-D layout so
/// transforms can return the same shape they were given. Samples are never
/// clamped implicitly.
#[derive(Clone, Debug, PartialEq)]
pub struct Waveform {
    data: Array2<f32>,
    layout: Layout,
}

impl Waveform {
    pub fn mono(samples: Vec<f32>) -> Self {
        Self {
            data: Array1::from(samples).insert_axis(Axis(0)),
            layout: Layout::Mono,
        }
    }

    /// Wraps a `channels × samples` array.
    pub fn multichannel(data: Array2<f32>) -> Self {
        Self {
            data,
            layout: Layout::Multichannel,
        }
    }

    /// Builds a waveform from frame-interleaved samples (`L R L R ...`).
    pub fn from_interleaved(samples: &[f32], channels: usize) -> Result<Self> {
        if channels == 0 {
            return Err(AugmentError::shape("channel count must be at least 1"));
        }
        if samples.len() % channels != 0 {
            return Err(AugmentError::shape(format!(
                "{} interleaved samples do not divide into {channels} channels",
                samples.len()
            )));
        }
        if channels == 1 {
            return Ok(Self::mono(samples.to_vec()));
        }
        let frames = samples.len() / channels;
        let data = Array2::from_shape_fn((channels, frames), |(c, i)| samples[i * channels + c]);
        Ok(Self::multichannel(data))
    }

    /// Silence with the given shape and layout.
    pub fn silence(channels: usize, num_samples: usize, layout: Layout) -> Self {
        Self {
            data: Array2::zeros((channels.max(1), num_samples)),
            layout,
        }
    }

    /// Same layout as `self`, new sample data. Used by transforms that
    /// redefine the length (e.g. convolution without trimming).
    pub fn with_data(&self, data: Array2<f32>) -> Self {
        Self {
            data,
            layout: self.layout,
        }
    }

    pub fn to_interleaved(&self) -> Vec<f32> {
        self.data.t().iter().copied().collect()
    }

    pub fn data(&self) -> &Array2<f32> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Array2<f32> {
        &mut self.data
    }

    pub fn into_data(self) -> Array2<f32> {
        self.data
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn is_mono(&self) -> bool {
        self.layout == Layout::Mono
    }

    pub fn channels(&self) -> usize {
        self.data.nrows()
    }

    pub fn num_samples(&self) -> usize {
        self.data.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn channel(&self, index: usize) -> ArrayView1<'_, f32> {
        self.data.row(index)
    }

    /// Channel average as a single mono signal.
    pub fn downmix(&self) -> Vec<f32> {
        match self.data.mean_axis(Axis(0)) {
            Some(mean) => mean.to_vec(),
            None => Vec::new(),
        }
    }

    pub fn duration(&self, sample_rate: u32) -> f64 {
        self.num_samples() as f64 / sample_rate as f64
    }

    pub fn peak(&self) -> f32 {
        self.data.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_mono_has_single_channel() {
        let wf = Waveform::mono(vec![0.1, 0.2, 0.3]);
        assert_eq!(wf.channels(), 1);
        assert_eq!(wf.num_samples(), 3);
        assert!(wf.is_mono());
    }

    #[test]
    fn test_from_interleaved_deinterleaves() {
        let wf = Waveform::from_interleaved(&[1.0, -1.0, 2.0, -2.0, 3.0, -3.0], 2).unwrap();
        assert_eq!(wf.layout(), Layout::Multichannel);
        assert_eq!(wf.channel(0).to_vec(), vec![1.0, 2.0, 3.0]);
        assert_eq!(wf.channel(1).to_vec(), vec![-1.0, -2.0, -3.0]);
    }

    #[test]
    fn test_to_interleaved_inverts_from_interleaved() {
        let samples = [0.5, -0.5, 0.25, -0.25];
        let wf = Waveform::from_interleaved(&samples, 2).unwrap();
        assert_eq!(wf.to_interleaved(), samples.to_vec());
    }

    #[test]
    fn test_from_interleaved_rejects_ragged_input() {
        let result = Waveform::from_interleaved(&[0.0; 5], 2);
        assert!(matches!(result, Err(AugmentError::InputShape(_))));
    }

    #[test]
    fn test_from_interleaved_rejects_zero_channels() {
        assert!(Waveform::from_interleaved(&[0.0; 4], 0).is_err());
    }

    #[test]
    fn test_duration() {
        let wf = Waveform::mono(vec![0.0; 48000]);
        assert_eq!(wf.duration(16000), 3.0);
    }

    #[test]
    fn test_downmix_averages_channels() {
        let wf = Waveform::multichannel(array![[1.0, 0.0], [0.0, 1.0]]);
        assert_eq!(wf.downmix(), vec![0.5, 0.5]);
    }

    #[test]
    fn test_with_data_keeps_layout() {
        let wf = Waveform::mono(vec![0.0; 4]);
        let longer = wf.with_data(Array2::zeros((1, 8)));
        assert!(longer.is_mono());
        assert_eq!(longer.num_samples(), 8);
    }

    #[test]
    fn test_peak() {
        let wf = Waveform::mono(vec![0.1, -0.7, 0.3]);
        assert_eq!(wf.peak(), 0.7);
    }
}
