pub mod audio_decoder;
pub mod audio_encoder;
pub mod gain;
pub mod resampler;
