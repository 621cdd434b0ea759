//! Media sources: where a payload's relative image path is anchored.
//!
//! The [`MediaSourceRegistry`] trait hands out a fresh [`MediaSource`] per
//! lookup; the resolver initializes it and prepends its base path to the
//! image path from the payload. Nothing here reads or writes storage.
//!
//! The production implementation is [`SourceRegistry`], built from the
//! `[sources.<id>]` tables of the config file. Each entry is one of:
//!
//! | `type` | Base path |
//! |---|---|
//! | `local` | A filesystem directory; relative paths are anchored at the config `root` |
//! | `url` | A public URL prefix such as a CDN or bucket endpoint |

use crate::request::SourceId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SourceError {
    #[error("media source {0} has an empty base URL")]
    EmptyBaseUrl(String),
    #[error("media source {id} has an unsupported base URL: {url}")]
    UnsupportedBaseUrl { id: String, url: String },
}

/// A storage back-end that can anchor relative image paths.
pub trait MediaSource: Send {
    /// Prepare the source for use. Must be called before [`base_path`](Self::base_path).
    fn initialize(&mut self) -> Result<(), SourceError>;

    /// Prefix for image paths, including any trailing separator.
    fn base_path(&self) -> &str;
}

/// Lookup of media sources by id.
pub trait MediaSourceRegistry: Send + Sync {
    /// Returns a new, uninitialized source, or `None` if `id` is unknown.
    fn lookup(&self, id: &SourceId) -> Option<Box<dyn MediaSource>>;
}

/// Config entry for one media source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceConfig {
    Local { base_path: String },
    Url { base_url: String },
}

/// Filesystem directory source.
#[derive(Debug, Clone)]
pub struct LocalSource {
    root: String,
    base_path: String,
    resolved: String,
}

impl LocalSource {
    pub fn new(root: impl Into<String>, base_path: impl Into<String>) -> Self {
        let base_path = base_path.into();
        Self {
            root: root.into(),
            resolved: base_path.clone(),
            base_path,
        }
    }
}

impl MediaSource for LocalSource {
    fn initialize(&mut self) -> Result<(), SourceError> {
        let mut path = if self.base_path.starts_with('/') || self.root.is_empty() {
            self.base_path.clone()
        } else {
            format!("{}{}", with_trailing_slash(&self.root), self.base_path)
        };
        if !path.is_empty() && !path.ends_with('/') {
            path.push('/');
        }
        self.resolved = path;
        Ok(())
    }

    fn base_path(&self) -> &str {
        &self.resolved
    }
}

/// Remote source addressed by URL prefix.
#[derive(Debug, Clone)]
pub struct UrlSource {
    id: String,
    base_url: String,
}

impl UrlSource {
    pub fn new(id: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            base_url: base_url.into(),
        }
    }
}

impl MediaSource for UrlSource {
    fn initialize(&mut self) -> Result<(), SourceError> {
        let url = self.base_url.trim();
        if url.is_empty() {
            return Err(SourceError::EmptyBaseUrl(self.id.clone()));
        }
        let supported = ["http://", "https://", "//"]
            .iter()
            .any(|scheme| url.starts_with(scheme));
        if !supported {
            return Err(SourceError::UnsupportedBaseUrl {
                id: self.id.clone(),
                url: url.to_string(),
            });
        }
        self.base_url = with_trailing_slash(url);
        Ok(())
    }

    fn base_path(&self) -> &str {
        &self.base_url
    }
}

fn with_trailing_slash(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    }
}

/// Registry backed by the `[sources]` config tables.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    root: String,
    sources: BTreeMap<String, SourceConfig>,
}

impl SourceRegistry {
    pub fn new(root: impl Into<String>, sources: BTreeMap<String, SourceConfig>) -> Self {
        Self {
            root: root.into(),
            sources,
        }
    }
}

impl MediaSourceRegistry for SourceRegistry {
    fn lookup(&self, id: &SourceId) -> Option<Box<dyn MediaSource>> {
        let Some(entry) = self.sources.get(id.as_str()) else {
            debug!(source = %id, "media source not configured");
            return None;
        };
        Some(match entry {
            SourceConfig::Local { base_path } => Box::new(LocalSource::new(&self.root, base_path)),
            SourceConfig::Url { base_url } => Box::new(UrlSource::new(id.as_str(), base_url)),
        })
    }
}
