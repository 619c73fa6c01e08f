use serde::{Deserialize, Serialize};

use super::parameter_space::SampledParameters;

/// Portable account of what one transform did on its last activation.
///
/// Records describe what happened, not how the transform was configured: a
/// pipeline serializes to an ordered pre-order list of them, which can later
/// be loaded back into an identically built pipeline to replay the exact
/// augmentation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterRecord {
    pub name: String,
    pub active: bool,
    pub parameters: SampledParameters,
}
