//! Thumbnail generation seam.
//!
//! A [`ThumbnailGenerator`] turns an absolute image path plus a query string
//! of crop/resize options into a servable URL. Whatever actually crops the
//! pixels sits behind that URL; this crate never does.
//!
//! [`PathGenerator`] builds path-style URLs that a thumbnail server can
//! decode on request:
//!
//! ```text
//! base_url   = "/thumbs"
//! options    = "sx=10&sy=20&sw=300&sh=200&w=150&h=100&far=1"
//! input      = "/srv/site/assets/dawn.jpg"
//!
//! → /thumbs/sx/10/sy/20/sw/300/sh/200/w/150/h/100/far/1/src/srv%2Fsite%2Fassets%2Fdawn.jpg
//! ```
//!
//! The source path is a single encoded segment, so it comes back with `%2F`
//! separators.

use crate::query::QueryParams;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum GeneratorError {
    #[error("thumbnail generator is not configured")]
    Unavailable,
    #[error("thumbnail generation failed: {0}")]
    Failed(String),
}

pub trait ThumbnailGenerator: Send + Sync {
    /// Return the URL of `input` transformed by `options` (a query string).
    fn generate(&self, input: &str, options: &str) -> Result<String, GeneratorError>;

    /// Whether [`generate`](Self::generate) can succeed at all.
    fn is_available(&self) -> bool;
}

#[derive(Debug, Clone)]
pub struct PathGenerator {
    base_url: String,
}

impl PathGenerator {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl ThumbnailGenerator for PathGenerator {
    fn generate(&self, input: &str, options: &str) -> Result<String, GeneratorError> {
        if !self.is_available() {
            return Err(GeneratorError::Unavailable);
        }
        let src = input.trim_start_matches('/');
        if src.is_empty() {
            return Err(GeneratorError::Failed("empty input path".to_string()));
        }

        let mut url = self.base_url.trim_end_matches('/').to_string();
        for (key, value) in QueryParams::parse(options).iter() {
            url.push('/');
            url.push_str(&urlencoding::encode(&key));
            url.push('/');
            url.push_str(&urlencoding::encode(value));
        }
        url.push_str("/src/");
        url.push_str(&urlencoding::encode(src));
        Ok(url)
    }

    fn is_available(&self) -> bool {
        !self.base_url.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_path_style_url() {
        let generator = PathGenerator::new("/thumbs/");
        let url = generator
            .generate("/srv/site/dawn.jpg", "sx=10&sy=20&w=150&far=1")
            .unwrap();
        assert_eq!(url, "/thumbs/sx/10/sy/20/w/150/far/1/src/srv%2Fsite%2Fdawn.jpg");
    }

    #[test]
    fn empty_options_still_carry_source() {
        let generator = PathGenerator::new("https://img.example.com");
        let url = generator.generate("a b.jpg", "").unwrap();
        assert_eq!(url, "https://img.example.com/src/a%20b.jpg");
    }

    #[test]
    fn option_values_are_encoded() {
        let generator = PathGenerator::new("/t");
        let url = generator.generate("x.jpg", "fltr%5B0%5D=gam%7C1.2").unwrap();
        assert_eq!(url, "/t/fltr%5B0%5D/gam%7C1.2/src/x.jpg");
    }

    #[test]
    fn option_spaces_are_percent_encoded_in_path() {
        let generator = PathGenerator::new("/t");
        let url = generator.generate("a b.jpg", "fltr%5B0%5D=wmt%7Ca+b").unwrap();
        assert_eq!(url, "/t/fltr%5B0%5D/wmt%7Ca%20b/src/a%20b.jpg");
        assert!(!url.contains('+'));
    }

    #[test]
    fn blank_base_url_is_unavailable() {
        let generator = PathGenerator::new(" ");
        assert!(!generator.is_available());
        assert_eq!(
            generator.generate("x.jpg", "w=1"),
            Err(GeneratorError::Unavailable)
        );
    }

    #[test]
    fn empty_input_fails() {
        let generator = PathGenerator::new("/t");
        assert!(matches!(
            generator.generate("/", "w=1"),
            Err(GeneratorError::Failed(_))
        ));
    }
}
