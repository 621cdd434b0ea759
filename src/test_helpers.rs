//! Shared test doubles for the resolver's collaborators.
//!
//! Each double records what it was asked to do so tests can assert on the
//! exact calls the resolver made. They use `Mutex` (not `RefCell`) because the
//! collaborator traits require `Sync`.
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let resolver = CropUrlResolver::new(
//!     MockSources::with_source("1", "/srv/media/"),
//!     RecordingGenerator::returning("/thumbs/out.jpg"),
//!     RecordingRenderer::new(),
//! );
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::generator::{GeneratorError, ThumbnailGenerator};
use crate::request::SourceId;
use crate::source::{MediaSource, MediaSourceRegistry, SourceError};
use crate::template::{TemplateError, TemplateFields, TemplateRenderer};

// =========================================================================
// Media sources
// =========================================================================

#[derive(Debug, Clone)]
struct MockSourceEntry {
    base_path: String,
    fail_init: bool,
}

/// Registry of fixed base paths that counts lookups and initializations.
#[derive(Default)]
pub struct MockSources {
    entries: BTreeMap<String, MockSourceEntry>,
    lookups: Mutex<Vec<String>>,
    initialized: Arc<AtomicUsize>,
}

impl MockSources {
    pub fn with_source(id: &str, base_path: &str) -> Self {
        let mut sources = Self::default();
        sources.entries.insert(
            id.to_string(),
            MockSourceEntry {
                base_path: base_path.to_string(),
                fail_init: false,
            },
        );
        sources
    }

    /// A registry whose only source fails to initialize.
    pub fn failing(id: &str) -> Self {
        let mut sources = Self::default();
        sources.entries.insert(
            id.to_string(),
            MockSourceEntry {
                base_path: String::new(),
                fail_init: true,
            },
        );
        sources
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }

    pub fn initialized(&self) -> usize {
        self.initialized.load(Ordering::SeqCst)
    }
}

struct MockSource {
    id: String,
    entry: MockSourceEntry,
    initialized: Arc<AtomicUsize>,
}

impl MediaSource for MockSource {
    fn initialize(&mut self) -> Result<(), SourceError> {
        if self.entry.fail_init {
            return Err(SourceError::EmptyBaseUrl(self.id.clone()));
        }
        self.initialized.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn base_path(&self) -> &str {
        &self.entry.base_path
    }
}

impl MediaSourceRegistry for MockSources {
    fn lookup(&self, id: &SourceId) -> Option<Box<dyn MediaSource>> {
        self.lookups.lock().unwrap().push(id.to_string());
        let entry = self.entries.get(id.as_str())?.clone();
        Some(Box::new(MockSource {
            id: id.to_string(),
            entry,
            initialized: Arc::clone(&self.initialized),
        }))
    }
}

// =========================================================================
// Generator
// =========================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateCall {
    pub input: String,
    pub options: String,
}

/// Generator that returns a fixed URL, or is unavailable.
pub struct RecordingGenerator {
    url: Option<String>,
    calls: Mutex<Vec<GenerateCall>>,
}

impl RecordingGenerator {
    pub fn returning(url: &str) -> Self {
        Self {
            url: Some(url.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            url: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<GenerateCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl ThumbnailGenerator for RecordingGenerator {
    fn generate(&self, input: &str, options: &str) -> Result<String, GeneratorError> {
        self.calls.lock().unwrap().push(GenerateCall {
            input: input.to_string(),
            options: options.to_string(),
        });
        self.url.clone().ok_or(GeneratorError::Unavailable)
    }

    fn is_available(&self) -> bool {
        self.url.is_some()
    }
}

// =========================================================================
// Templates
// =========================================================================

/// Renderer that knows the single template `figure` and renders it as
/// `rendered:figure`.
pub struct RecordingRenderer {
    renders: Mutex<Vec<(String, TemplateFields)>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self {
            renders: Mutex::new(Vec::new()),
        }
    }

    pub fn renders(&self) -> Vec<(String, TemplateFields)> {
        self.renders.lock().unwrap().clone()
    }
}

impl TemplateRenderer for RecordingRenderer {
    fn render(&self, id: &str, fields: &TemplateFields) -> Result<String, TemplateError> {
        if id != "figure" {
            return Err(TemplateError::NotFound(id.to_string()));
        }
        self.renders
            .lock()
            .unwrap()
            .push((id.to_string(), fields.clone()));
        Ok(format!("rendered:{id}"))
    }
}
