//! Runtime options with TOML file support.
//!
//! Every section uses `#[serde(default)]`, so a file only needs the keys it
//! overrides.

mod highlight;
mod picking;
mod shaders;

use std::path::Path;

pub use highlight::HighlightOptions;
pub use picking::PickingOptions;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
pub use shaders::ShaderOptions;

use crate::error::ManipDrawError;

/// Top-level options container.
#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema,
)]
#[serde(default)]
pub struct Options {
    /// Pick pass settings.
    pub picking: PickingOptions,
    /// Hover highlight settings.
    pub highlight: HighlightOptions,
    /// Shader source location and hot reload.
    #[schemars(skip)]
    pub shaders: ShaderOptions,
}

impl Options {
    /// Generate JSON Schema describing the UI-exposed options.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Options)
    }

    /// Load options from a TOML file. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ManipDrawError::Io`] if the file cannot be read and
    /// [`ManipDrawError::OptionsParse`] if it is not valid TOML for these
    /// options.
    pub fn load(path: &Path) -> Result<Self, ManipDrawError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse options from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ManipDrawError::OptionsParse`] on malformed input.
    pub fn from_toml(content: &str) -> Result<Self, ManipDrawError> {
        toml::from_str(content)
            .map_err(|e| ManipDrawError::OptionsParse(e.to_string()))
    }

    /// Save options to a TOML file (pretty-printed).
    ///
    /// # Errors
    ///
    /// Returns [`ManipDrawError::OptionsParse`] if serialization fails and
    /// [`ManipDrawError::Io`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ManipDrawError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ManipDrawError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn default_round_trips_through_toml() {
        let opts = Options::default();
        let toml_str = toml::to_string_pretty(&opts).unwrap();
        let parsed: Options = toml::from_str(&toml_str).unwrap();
        assert_eq!(opts, parsed);
    }

    #[test]
    fn defaults_match_the_documented_values() {
        let opts = Options::default();
        assert_eq!(opts.picking.stall_warn_frames, 120);
        assert!(opts.highlight.enabled);
        assert_eq!(opts.highlight.blink_period_ms, 1000);
        assert_eq!(opts.highlight.idle_restart_ms, 200);
        assert_eq!(opts.shaders.directory, None);
        assert!(opts.shaders.hot_reload);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r#"
[highlight]
blink_period_ms = 600

[shaders]
directory = "assets/shaders"
"#;
        let opts = Options::from_toml(toml_str).unwrap();
        assert_eq!(
            opts.highlight.blink_period(),
            std::time::Duration::from_millis(600)
        );
        // Everything else should be default
        assert_eq!(opts.highlight.idle_restart_ms, 200);
        assert_eq!(opts.picking, PickingOptions::default());
        assert_eq!(
            opts.shaders.directory,
            Some(PathBuf::from("assets/shaders"))
        );
        assert!(opts.shaders.hot_reload);
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(
            Options::from_toml("[highlight]\nenabled = \"maybe\""),
            Err(ManipDrawError::OptionsParse(_))
        ));
    }

    #[test]
    fn save_then_load() {
        let dir = std::env::temp_dir()
            .join(format!("manipdraw-options-{}", std::process::id()));
        let path = dir.join("nested").join("options.toml");
        let mut opts = Options::default();
        opts.highlight.color = [0.0, 1.0, 0.0, 0.5];
        opts.picking.stall_warn_frames = 0;
        opts.save(&path).unwrap();
        assert_eq!(Options::load(&path).unwrap(), opts);
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let path = Path::new("/nonexistent/manipdraw/options.toml");
        assert!(matches!(Options::load(path), Err(ManipDrawError::Io(_))));
    }

    #[test]
    fn schema_has_expected_properties() {
        let schema_value =
            serde_json::to_value(Options::json_schema()).unwrap();
        let props = schema_value["properties"].as_object().unwrap();

        assert!(props.contains_key("picking"));
        assert!(props.contains_key("highlight"));
        // Skipped sections should be absent
        assert!(!props.contains_key("shaders"));

        let highlight = &props["highlight"]["properties"];
        assert!(highlight.get("blink_period_ms").is_some());
        assert!(highlight.get("color").is_some());
    }
}
