//! # Image+ crop resolver
//!
//! Turns the JSON an Image+ field stores (a source image, a crop rectangle, a
//! target size and alt text) into the URL of the cropped thumbnail, or into a
//! rendered template fragment around that URL.
//!
//! Nothing in this crate decodes or resizes images. The crate translates
//! parameters and delegates the pixel work to a thumbnail generator:
//!
//! ```text
//! parse JSON → resolve media source path → build query string
//!            → generator(path, query) → url → optional template
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`resolver`] | [`CropUrlResolver`]: the pipeline above, plus per-call [`ResolverOptions`] |
//! | [`request`] | Typed crop payload parsed with serde |
//! | [`query`] | Ordered query parameters: parse, merge, encode |
//! | [`source`] | Media source traits and the config-driven registry |
//! | [`generator`] | Thumbnail generator trait and the path-style URL generator |
//! | [`template`] | Output template trait, placeholder templates, built-in `<img>` |
//! | [`config`] | `imageplus.toml` loading, merging and validation |
//!
//! # Design Decisions
//!
//! ## Collaborators Are Injected
//!
//! The resolver owns a media-source registry, a generator and a template
//! renderer, each behind a trait. There is no global host context: tests
//! swap in recording doubles, and the binary wires the config-driven
//! implementations through [`resolver::ConfiguredResolver::from_config`].
//!
//! ## Soft Failures Stay In-Band
//!
//! A blank or malformed payload means "no crop configured" and yields the
//! caller's default text. An unknown media source yields
//! [`resolver::INVALID_SOURCE_MESSAGE`]. Both are `Ok` values because the
//! output usually lands directly in a page. Only collaborator failures are
//! `Err`.
//!
//! ## Numbers Travel As Text
//!
//! Payload dimensions are forwarded, never computed with, so they are kept in
//! the exact text form they will take in the query string.

pub mod config;
pub mod generator;
pub mod query;
pub mod request;
pub mod resolver;
pub mod source;
pub mod template;

pub use resolver::{CropUrlResolver, ResolveError, ResolverOptions};

#[cfg(test)]
pub(crate) mod test_helpers;
