//! Randomized audio augmentation pipelines whose sampled parameters can be
//! frozen, serialized and replayed.

pub mod audio;
pub mod augmentation;
pub mod pipeline;
pub mod shared;
pub mod transforms;

pub use augmentation::domain::transform::{Propagation, Transform};
pub use pipeline::augmenter::Augmenter;
pub use pipeline::pipeline_config::{PipelineConfig, TransformConfig};
pub use shared::error::{AugmentError, Result};
pub use shared::waveform::Waveform;
