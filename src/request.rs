//! The crop payload stored by the Image+ field.
//!
//! The editor saves one JSON document per image:
//!
//! ```json
//! {
//!   "sourceImg": { "source": 1, "src": "photos/dawn.jpg", "width": 4000, "height": 3000 },
//!   "crop": { "x": 120, "y": 40, "width": 1600, "height": 1200 },
//!   "targetWidth": 800,
//!   "targetHeight": 600,
//!   "altTag": "Dawn over the lake"
//! }
//! ```
//!
//! Numbers are carried as the text they will take in a query string, so
//! `1600`, `1600.0` and `"1600"` all become `1600`. Fractional crop offsets
//! (`120.5`) are kept as written.

use crate::query::QueryParams;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("payload is empty")]
    Empty,
    #[error("invalid payload: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// A JSON number or string, used for ids and dimensions.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Number(serde_json::Number),
    Text(String),
}

impl From<Scalar> for String {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Text(text) => text,
            Scalar::Number(n) => {
                if let Some(i) = n.as_i64() {
                    i.to_string()
                } else if let Some(u) = n.as_u64() {
                    u.to_string()
                } else {
                    let f = n.as_f64().unwrap_or_default();
                    if f.fract() == 0.0 && f.abs() < 1e15 {
                        (f as i64).to_string()
                    } else {
                        f.to_string()
                    }
                }
            }
        }
    }
}

/// Identifier of a media source, e.g. `1` or `"s3-assets"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(from = "Scalar")]
pub struct SourceId(String);

impl SourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Scalar> for SourceId {
    fn from(scalar: Scalar) -> Self {
        Self(scalar.into())
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A dimension or offset in pixels, kept in its query-string form.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "Scalar")]
pub struct Measure(String);

impl Measure {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Scalar> for Measure {
    fn from(scalar: Scalar) -> Self {
        Self(scalar.into())
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The uncropped image as picked in the editor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceImage {
    pub source: SourceId,
    /// Path relative to the media source's base path.
    #[serde(rename = "src", alias = "path")]
    pub path: String,
    pub width: Measure,
    pub height: Measure,
}

/// Crop rectangle in source-image pixels.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CropRect {
    pub x: Measure,
    pub y: Measure,
    pub width: Measure,
    pub height: Measure,
}

impl CropRect {
    /// `sx`, `sy`, `sw`, `sh` in that order.
    pub fn params(&self) -> QueryParams {
        [
            ("sx", self.x.as_str()),
            ("sy", self.y.as_str()),
            ("sw", self.width.as_str()),
            ("sh", self.height.as_str()),
        ]
        .into_iter()
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropRequest {
    #[serde(rename = "sourceImg", alias = "sourceImage")]
    pub source_image: SourceImage,
    pub crop: CropRect,
    pub target_width: Measure,
    pub target_height: Measure,
    #[serde(default)]
    pub alt_tag: Option<String>,
}

impl CropRequest {
    /// Parse a stored payload.
    ///
    /// Blank input and a literal `null` are [`PayloadError::Empty`]; anything
    /// else that does not describe a complete request is
    /// [`PayloadError::Invalid`].
    pub fn from_json(payload: &str) -> Result<Self, PayloadError> {
        if payload.trim().is_empty() {
            return Err(PayloadError::Empty);
        }
        let parsed: Option<CropRequest> = serde_json::from_str(payload)?;
        parsed.ok_or(PayloadError::Empty)
    }

    pub fn alt_text(&self) -> &str {
        self.alt_tag.as_deref().unwrap_or_default()
    }

    /// Crop parameters plus the target size and the fit-and-resize flag.
    pub fn thumb_params(&self) -> QueryParams {
        let mut params = self.crop.params();
        params.insert("w", self.target_width.as_str());
        params.insert("h", self.target_height.as_str());
        params.insert("far", "1");
        params
    }
}
