use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::audio::domain::audio_decoder::AudioDecoder;
use crate::audio::domain::resampler::Resampler;
use crate::augmentation::domain::parameter_space::ParamValue;
use crate::shared::error::{AugmentError, Result};
use crate::shared::waveform::Waveform;

use super::audio_cache::AudioCache;
use super::linear_resampler::LinearResampler;
use super::sound_file_finder::find_audio_files;

/// The decoder used when an operator is built from paths alone.
#[cfg(feature = "ffmpeg")]
pub fn default_decoder() -> Box<dyn AudioDecoder> {
    Box::new(super::ffmpeg_decoder::FfmpegDecoder)
}

/// The decoder used when an operator is built from paths alone.
#[cfg(not(feature = "ffmpeg"))]
pub fn default_decoder() -> Box<dyn AudioDecoder> {
    Box::new(super::hound_decoder::HoundDecoder)
}

/// External sound files one operator draws from: the file list resolved at
/// construction, the operator's private cache, and the resampler used when a
/// file's native rate differs from the call's rate.
pub struct SoundAssets {
    files: Vec<PathBuf>,
    cache: AudioCache,
    resampler: Box<dyn Resampler>,
    /// Files already reported as needing resampling.
    rate_warned: HashSet<PathBuf>,
}

impl SoundAssets {
    pub fn new(
        files: Vec<PathBuf>,
        cache: AudioCache,
        resampler: Box<dyn Resampler>,
    ) -> Result<Self> {
        if files.is_empty() {
            return Err(AugmentError::config("sound file list is empty"));
        }
        Ok(Self {
            files,
            cache,
            resampler,
            rate_warned: HashSet::new(),
        })
    }

    /// Resolves `paths` once and sets up the default decoder and resampler.
    pub fn discover<P: AsRef<Path>>(paths: &[P], cache_size: usize) -> Result<Self> {
        let files = find_audio_files(paths)?;
        log::info!("Found {} sound files", files.len());
        Self::new(
            files,
            AudioCache::new(default_decoder(), cache_size)?,
            Box::new(LinearResampler),
        )
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn cache(&self) -> &AudioCache {
        &self.cache
    }

    /// The file list as categorical parameter choices.
    pub fn choices(&self) -> Vec<ParamValue> {
        self.files
            .iter()
            .map(|f| ParamValue::Text(f.to_string_lossy().into_owned()))
            .collect()
    }

    /// Loads `path` through the cache, resampled to `sample_rate` if needed.
    pub fn load(&mut self, path: &Path, sample_rate: u32) -> Result<Waveform> {
        let decoded = self.cache.get_or_load(path)?;
        if decoded.sample_rate == sample_rate {
            return Ok(decoded.waveform.clone());
        }
        if self.rate_warned.insert(path.to_path_buf()) {
            log::warn!(
                "{} is {} Hz but the input is {} Hz; resampling on every use",
                path.display(),
                decoded.sample_rate,
                sample_rate
            );
        } else {
            log::debug!("resampling {} to {} Hz", path.display(), sample_rate);
        }
        self.resampler
            .resample(&decoded.waveform, decoded.sample_rate, sample_rate)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::write_wav;
    use super::*;
    use crate::audio::infrastructure::hound_decoder::HoundDecoder;

    #[test]
    fn test_discover_lists_files_and_choices() {
        let dir = tempfile::tempdir().unwrap();
        write_wav(&dir.path().join("a.wav"), &[0.1; 16], 16000);
        write_wav(&dir.path().join("b.wav"), &[0.2; 16], 16000);

        let assets = SoundAssets::discover(&[dir.path()], 2).unwrap();

        assert_eq!(assets.files().len(), 2);
        assert_eq!(assets.choices().len(), 2);
        assert_eq!(assets.cache().capacity(), 2);
    }

    #[test]
    fn test_load_at_native_rate_is_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.wav");
        write_wav(&path, &[0.1, 0.2, 0.3, 0.4], 16000);
        let mut assets = SoundAssets::discover(&[&path], 2).unwrap();
        let file = assets.files()[0].clone();

        let wf = assets.load(&file, 16000).unwrap();

        assert_eq!(wf.channel(0).to_vec(), vec![0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn test_load_resamples_mismatched_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.wav");
        write_wav(&path, &[0.5; 8000], 8000);
        let mut assets = SoundAssets::discover(&[&path], 2).unwrap();
        let file = assets.files()[0].clone();

        let wf = assets.load(&file, 16000).unwrap();

        assert_eq!(wf.num_samples(), 16000);
        assert_eq!(assets.cache().misses(), 1);
    }

    #[test]
    fn test_rate_mismatch_reported_once_per_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.wav");
        write_wav(&path, &[0.5; 800], 8000);
        let mut assets = SoundAssets::discover(&[&path], 2).unwrap();
        let file = assets.files()[0].clone();

        for _ in 0..3 {
            assets.load(&file, 16000).unwrap();
        }

        assert_eq!(assets.rate_warned.len(), 1);
        assert!(assets.rate_warned.contains(&file));
    }

    #[test]
    fn test_matching_rate_is_not_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.wav");
        write_wav(&path, &[0.5; 800], 16000);
        let mut assets = SoundAssets::discover(&[&path], 2).unwrap();
        let file = assets.files()[0].clone();

        assets.load(&file, 16000).unwrap();

        assert!(assets.rate_warned.is_empty());
    }

    #[test]
    fn test_empty_file_list_rejected() {
        let cache = AudioCache::new(Box::new(HoundDecoder), 2).unwrap();
        let result = SoundAssets::new(vec![], cache, Box::new(LinearResampler));
        assert!(matches!(result, Err(AugmentError::Configuration(_))));
    }
}
