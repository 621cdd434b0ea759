//! Resolver configuration.
//!
//! Loaded from `imageplus.toml`. Stock defaults are the base layer; the user
//! file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # Prefix for relative `local` source paths
//! root = "/srv/site"
//!
//! [generator]
//! base_url = "/thumbs"       # Prefix of generated thumbnail URLs
//!
//! [defaults]
//! extra_thumb_params = ""    # Extra generator options, query-string syntax
//! generate_url = true        # Call the generator at all
//! output_template = ""       # Template id; empty returns the bare URL
//!
//! [sources.1]
//! type = "local"
//! base_path = "assets/"
//!
//! [sources.cdn]
//! type = "url"
//! base_url = "https://cdn.example.com/media/"
//!
//! [templates]
//! figure = '<figure><img src="[[+url]]" alt="[[+alt]]"></figure>'
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::source::SourceConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up when no explicit config path is given.
pub const CONFIG_FILE_NAME: &str = "imageplus.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory that relative `local` source paths are anchored at.
    pub root: String,
    pub generator: GeneratorConfig,
    /// Options applied when the caller passes none.
    pub defaults: OptionsConfig,
    /// Media sources keyed by the id stored in payloads.
    pub sources: BTreeMap<String, SourceConfig>,
    /// Output templates keyed by id.
    pub templates: BTreeMap<String, String>,
}

impl Config {
    /// Validate cross-field constraints serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (id, source) in &self.sources {
            if id.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "sources: id must not be empty".into(),
                ));
            }
            if let SourceConfig::Url { base_url } = source {
                if base_url.trim().is_empty() {
                    return Err(ConfigError::Validation(format!(
                        "sources.{id}.base_url must not be empty"
                    )));
                }
            }
        }
        if self.templates.keys().any(|id| id.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "templates: id must not be empty".into(),
            ));
        }
        let template = self.defaults.output_template.as_str();
        if !template.is_empty()
            && template != crate::template::BUILTIN_IMG
            && !self.templates.contains_key(template)
        {
            return Err(ConfigError::Validation(format!(
                "defaults.output_template refers to unknown template '{template}'"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Prefix of generated thumbnail URLs. Empty disables generation.
    pub base_url: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_url: "/thumbs".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptionsConfig {
    pub extra_thumb_params: String,
    pub generate_url: bool,
    pub output_template: String,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            extra_thumb_params: String::new(),
            generate_url: true,
            output_template: String::new(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(Config::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value. A missing file is `Ok(None)`.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<Config, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, falling back to stock defaults if it is absent.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let overlay = load_raw_config(path)?;
    resolve_config(stock_defaults_value(), overlay)
}

/// Load config from a file that must exist.
pub fn load_config_strict(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path)?;
    let overlay: toml::Value = toml::from_str(&content)?;
    resolve_config(stock_defaults_value(), Some(overlay))
}

/// Returns a fully-commented stock `imageplus.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Image+ Resolver Configuration
# ============================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# Directory that relative `local` source paths are anchored at.
# Empty keeps relative paths as written.
root = ""

# ---------------------------------------------------------------------------
# Thumbnail generator
# ---------------------------------------------------------------------------
[generator]
# Prefix of generated thumbnail URLs. The generated URL is
#   <base_url>/<key>/<value>/.../src/<encoded source path>
# An empty value disables generation (`imageplus check` reports it).
base_url = "/thumbs"

# ---------------------------------------------------------------------------
# Default resolver options (overridden per call on the command line)
# ---------------------------------------------------------------------------
[defaults]
# Extra generator options in query-string syntax, e.g. "q=80&zc=1".
# Empty and "0" values are dropped. When any remain, the target size
# (w, h, far) is NOT sent to the generator; only the crop box and these
# options are.
extra_thumb_params = ""

# Call the generator. When false the URL is empty.
generate_url = true

# Template id used to format the result. Empty returns the bare URL.
# "img" is built in and renders an <img> tag.
output_template = ""

# ---------------------------------------------------------------------------
# Media sources, keyed by the id stored in the payload's sourceImg.source
# ---------------------------------------------------------------------------
# [sources.1]
# type = "local"
# base_path = "assets/"           # relative paths are anchored at `root`
#
# [sources.cdn]
# type = "url"
# base_url = "https://cdn.example.com/media/"

# ---------------------------------------------------------------------------
# Output templates. Placeholders: [[+url]] [[+alt]] [[+width]] [[+height]]
# [[+source.src]] [[+source.width]] [[+source.height]] [[+crop.width]]
# [[+crop.height]] [[+crop.x]] [[+crop.y]] [[+options]] [[+crop.options]]
# ---------------------------------------------------------------------------
[templates]
# figure = '<figure><img src="[[+url]]" alt="[[+alt]]"></figure>'
"##
}
