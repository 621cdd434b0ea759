//! Crop payload → thumbnail URL.
//!
//! [`CropUrlResolver::resolve`] is the whole pipeline:
//!
//! ```text
//! payload JSON ──parse──▶ CropRequest
//!      │ (blank/invalid → default text)
//!      ▼
//! registry.lookup(source) ──▶ MediaSource::initialize, base_path + src
//!      │ (unknown id → "Image+ Error: Invalid Media Source")
//!      ▼
//! crop params (sx sy sw sh) + target params (w h far) or extra params
//!      ▼
//! generator.generate(path, options) ──▶ url, %2F → /
//!      ▼
//! templates.render(id, fields) or bare url
//! ```
//!
//! Malformed input and unknown sources are ordinary results, not errors:
//! the caller is usually a page template that should keep rendering. Failures
//! inside the source, generator or renderer come back as [`ResolveError`].
//!
//! ## Extra parameters replace the target size
//!
//! When the caller passes extra generator options, they are merged onto the
//! crop box only; `w`, `h` and `far` are not sent. Sites rely on this to size
//! thumbnails purely from their own options, so it is kept as-is.

use crate::config::{Config, OptionsConfig};
use crate::generator::{GeneratorError, PathGenerator, ThumbnailGenerator};
use crate::query::QueryParams;
use crate::request::CropRequest;
use crate::source::{MediaSourceRegistry, SourceError, SourceRegistry};
use crate::template::{TemplateError, TemplateFields, TemplateRenderer, Templates};
use thiserror::Error;
use tracing::{debug, info};

/// Returned in place of a URL when the payload names an unknown media source.
pub const INVALID_SOURCE_MESSAGE: &str = "Image+ Error: Invalid Media Source";

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("media source error: {0}")]
    Source(#[from] SourceError),
    #[error(transparent)]
    Generator(#[from] GeneratorError),
    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Per-call options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Extra generator options in query-string syntax.
    pub extra_thumb_params: String,
    /// When false the generator is not called and the URL is empty.
    pub generate_url: bool,
    /// Template to render the result through.
    pub output_template: Option<String>,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            extra_thumb_params: String::new(),
            generate_url: true,
            output_template: None,
        }
    }
}

impl ResolverOptions {
    /// Read options from loose key/value pairs, such as template tag
    /// properties. Unrecognized keys are ignored; missing keys keep their
    /// defaults.
    ///
    /// | Key | Alias |
    /// |---|---|
    /// | `extraThumbParams` | `phpThumbParams` |
    /// | `generateUrl` | |
    /// | `outputTemplate` | `outputChunk` |
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut options = Self::default();
        for (key, value) in pairs {
            match key {
                "extraThumbParams" | "phpThumbParams" => {
                    options.extra_thumb_params = value.to_string();
                }
                "generateUrl" => options.generate_url = parse_flag(value),
                "outputTemplate" | "outputChunk" => {
                    options.output_template =
                        Some(value.trim()).filter(|v| !v.is_empty()).map(String::from);
                }
                _ => {}
            }
        }
        options
    }

    fn template_id(&self) -> Option<&str> {
        self.output_template.as_deref().filter(|id| !id.is_empty())
    }
}

impl From<&OptionsConfig> for ResolverOptions {
    fn from(config: &OptionsConfig) -> Self {
        Self {
            extra_thumb_params: config.extra_thumb_params.clone(),
            generate_url: config.generate_url,
            output_template: Some(config.output_template.clone()).filter(|t| !t.is_empty()),
        }
    }
}

fn parse_flag(value: &str) -> bool {
    let value = value.trim();
    !(value.is_empty()
        || value == "0"
        || value.eq_ignore_ascii_case("false")
        || value.eq_ignore_ascii_case("no"))
}

/// Resolves crop payloads using injected collaborators.
pub struct CropUrlResolver<S, G, T> {
    sources: S,
    generator: G,
    templates: T,
}

/// Resolver wired from an `imageplus.toml`.
pub type ConfiguredResolver = CropUrlResolver<SourceRegistry, PathGenerator, Templates>;

impl ConfiguredResolver {
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            SourceRegistry::new(&config.root, config.sources.clone()),
            PathGenerator::new(&config.generator.base_url),
            Templates::new(config.templates.clone()),
        )
    }
}

impl<S, G, T> CropUrlResolver<S, G, T>
where
    S: MediaSourceRegistry,
    G: ThumbnailGenerator,
    T: TemplateRenderer,
{
    pub fn new(sources: S, generator: G, templates: T) -> Self {
        Self {
            sources,
            generator,
            templates,
        }
    }

    /// Whether the thumbnail generator can be used at all.
    pub fn requirements_met(&self) -> bool {
        self.generator.is_available()
    }

    /// Resolve `payload` to a URL or rendered template.
    ///
    /// Returns `default_text` unchanged when the payload is blank or invalid,
    /// and [`INVALID_SOURCE_MESSAGE`] when its media source is unknown.
    pub fn resolve(
        &self,
        payload: &str,
        options: &ResolverOptions,
        default_text: &str,
    ) -> Result<String, ResolveError> {
        let request = match CropRequest::from_json(payload) {
            Ok(request) => request,
            Err(err) => {
                info!(error = %err, "Image+ renderer failed to parse JSON");
                return Ok(default_text.to_string());
            }
        };

        let Some(mut source) = self.sources.lookup(&request.source_image.source) else {
            return Ok(INVALID_SOURCE_MESSAGE.to_string());
        };
        source.initialize()?;
        let image_path = format!("{}{}", source.base_path(), request.source_image.path);

        let crop_params = request.crop.params();
        let mut extra_params = QueryParams::parse(&options.extra_thumb_params);
        extra_params.retain_non_empty();
        let thumb_params = if extra_params.is_empty() {
            request.thumb_params()
        } else {
            crop_params.clone().merge(extra_params)
        };
        let thumb_options = thumb_params.to_query_string();
        let crop_options = crop_params.to_query_string();
        debug!(path = %image_path, options = %thumb_options, "resolved crop");

        let url = if options.generate_url {
            self.generator.generate(&image_path, &thumb_options)?
        } else {
            String::new()
        };
        let url = url.replace("%2F", "/");

        let Some(template_id) = options.template_id() else {
            return Ok(url);
        };
        let fields = TemplateFields {
            url,
            alt: request.alt_text().to_string(),
            width: request.target_width.to_string(),
            height: request.target_height.to_string(),
            source_src: image_path,
            source_width: request.source_image.width.to_string(),
            source_height: request.source_image.height.to_string(),
            crop_width: request.crop.width.to_string(),
            crop_height: request.crop.height.to_string(),
            crop_x: request.crop.x.to_string(),
            crop_y: request.crop.y.to_string(),
            options: thumb_options,
            crop_options,
        };
        Ok(self.templates.render(template_id, &fields)?)
    }
}
