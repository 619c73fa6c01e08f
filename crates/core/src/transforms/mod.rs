pub mod add_background_noise;
pub mod add_gaussian_noise;
pub mod add_gaussian_snr;
pub mod add_short_noises;
pub mod apply_impulse_response;
pub mod clip;
pub mod gain;
pub mod normalize;
pub mod pitch_shift;
pub mod polarity_inversion;
pub mod reverse;
pub mod shift;
pub mod time_mask;
