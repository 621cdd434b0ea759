//! Output templates.
//!
//! A resolved crop can be returned through a named template instead of as a
//! bare URL. Templates come from the `[templates]` config table and use
//! `[[+field]]` placeholders:
//!
//! ```toml
//! [templates]
//! figure = '<figure><img src="[[+url]]" alt="[[+alt]]"></figure>'
//! ```
//!
//! Available fields: `url`, `alt`, `width`, `height`, `source.src`,
//! `source.width`, `source.height`, `crop.width`, `crop.height`, `crop.x`,
//! `crop.y`, `options`, `crop.options`. Unknown placeholders render as empty
//! text. Values are inserted verbatim, so templates that emit HTML are
//! responsible for their own quoting.
//!
//! The id `img` is built in (unless the config defines its own) and renders
//! an escaped `<img>` tag with maud.

use maud::{Markup, html};
use std::collections::BTreeMap;
use thiserror::Error;

/// Id of the built-in `<img>` template.
pub const BUILTIN_IMG: &str = "img";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TemplateError {
    #[error("output template not found: {0}")]
    NotFound(String),
}

/// Values exposed to an output template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateFields {
    pub url: String,
    pub alt: String,
    /// Target width.
    pub width: String,
    /// Target height.
    pub height: String,
    /// Absolute path of the uncropped image.
    pub source_src: String,
    pub source_width: String,
    pub source_height: String,
    pub crop_width: String,
    pub crop_height: String,
    pub crop_x: String,
    pub crop_y: String,
    /// Query string sent to the generator.
    pub options: String,
    /// Crop-only query string.
    pub crop_options: String,
}

impl TemplateFields {
    /// `(placeholder name, value)` for every field.
    pub fn entries(&self) -> [(&'static str, &str); 13] {
        [
            ("url", self.url.as_str()),
            ("alt", self.alt.as_str()),
            ("width", self.width.as_str()),
            ("height", self.height.as_str()),
            ("source.src", self.source_src.as_str()),
            ("source.width", self.source_width.as_str()),
            ("source.height", self.source_height.as_str()),
            ("crop.width", self.crop_width.as_str()),
            ("crop.height", self.crop_height.as_str()),
            ("crop.x", self.crop_x.as_str()),
            ("crop.y", self.crop_y.as_str()),
            ("options", self.options.as_str()),
            ("crop.options", self.crop_options.as_str()),
        ]
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries()
            .into_iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }
}

pub trait TemplateRenderer: Send + Sync {
    fn render(&self, id: &str, fields: &TemplateFields) -> Result<String, TemplateError>;
}

/// Named placeholder templates plus the built-in `img`.
#[derive(Debug, Clone, Default)]
pub struct Templates {
    templates: BTreeMap<String, String>,
}

impl Templates {
    pub fn new(templates: BTreeMap<String, String>) -> Self {
        Self { templates }
    }
}

impl TemplateRenderer for Templates {
    fn render(&self, id: &str, fields: &TemplateFields) -> Result<String, TemplateError> {
        match self.templates.get(id) {
            Some(body) => Ok(fill_placeholders(body, fields)),
            None if id == BUILTIN_IMG => Ok(render_img(fields).into_string()),
            None => Err(TemplateError::NotFound(id.to_string())),
        }
    }
}

fn render_img(fields: &TemplateFields) -> Markup {
    html! {
        img src=(fields.url) alt=(fields.alt) width=(fields.width) height=(fields.height);
    }
}

/// Replace every `[[+name]]` with the field value. An unterminated tag is
/// copied through as-is.
fn fill_placeholders(body: &str, fields: &TemplateFields) -> String {
    let mut out = String::with_capacity(body.len());
    let mut rest = body;
    while let Some(start) = rest.find("[[+") {
        out.push_str(&rest[..start]);
        let tag = &rest[start + 3..];
        let Some(end) = tag.find("]]") else {
            out.push_str(&rest[start..]);
            return out;
        };
        out.push_str(fields.get(tag[..end].trim()).unwrap_or_default());
        rest = &tag[end + 2..];
    }
    out.push_str(rest);
    out
}
