//! Chain driver limits.

use serde::{Deserialize, Serialize};

/// Limits applied by [`crate::chain`] when encoding and decoding chains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Deepest chain (leaf included) accepted in either direction
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Largest single safe detail accepted on decode, in bytes
    #[serde(default = "default_max_safe_detail_bytes")]
    pub max_safe_detail_bytes: usize,
}

fn default_max_depth() -> usize { 64 }
fn default_max_safe_detail_bytes() -> usize { 64 * 1_024 }

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_safe_detail_bytes: default_max_safe_detail_bytes(),
        }
    }
}

impl CodecConfig {
    /// Load a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
