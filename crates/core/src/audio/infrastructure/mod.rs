pub mod audio_cache;
#[cfg(feature = "ffmpeg")]
pub mod ffmpeg_decoder;
pub mod hound_decoder;
pub mod hound_encoder;
pub mod linear_resampler;
pub mod sound_assets;
pub mod sound_file_finder;
