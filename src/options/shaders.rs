use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Where shader sources come from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[schemars(title = "Shaders", inline)]
#[serde(default)]
pub struct ShaderOptions {
    /// Directory laid out like `assets/shaders`. Embedded sources are used
    /// when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
    /// Rebuild pipelines when files in `directory` change.
    pub hot_reload: bool,
}

impl Default for ShaderOptions {
    fn default() -> Self {
        Self {
            directory: None,
            hot_reload: true,
        }
    }
}
