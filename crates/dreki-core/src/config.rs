//! Runtime configuration for a [`World`](crate::ecs::World).
//!
//! Every field has a default, so a config file only needs the keys it wants
//! to change:
//!
//! ```ignore
//! let config = CoreConfig::from_json(r#"{ "default_scene": "Level1" }"#)?;
//! let world = World::builder().config(config).build();
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::math::DEFAULT_SCALE_EPSILON;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Parent scale axes with a magnitude below this are treated as collapsed
    /// when converting world-space deltas into local space.
    pub scale_epsilon: f32,
    /// Name of the scene created with the world. New entities join it until
    /// another scene is made active.
    pub default_scene: String,
    /// Tag given to newly created entities.
    pub default_tag: String,
    /// `env_logger` filter string used by [`logging::init`](crate::logging::init).
    /// `None` falls back to `RUST_LOG`.
    pub log_filter: Option<String>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            scale_epsilon: DEFAULT_SCALE_EPSILON,
            default_scene: "Main".to_string(),
            default_tag: "Untagged".to_string(),
            log_filter: None,
        }
    }
}

impl CoreConfig {
    /// Parse a config from JSON. Missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let json = std::fs::read_to_string(path.as_ref()).map_err(serde_json::Error::io)?;
        Self::from_json(&json)
    }
}
