//! Image reference handling

use std::fmt;

/// A `repository:tag` pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageRef {
    pub repository: String,
    pub tag: String,
}

impl ImageRef {
    pub fn new(repository: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            tag: tag.into(),
        }
    }

    /// Split an image name into repository and tag.
    ///
    /// A `:` only starts a tag when it comes after the last `/`, so registry
    /// ports (`localhost:5000/app`) stay part of the repository. Untagged
    /// names get `latest`.
    pub fn parse(image: &str) -> Self {
        let image = image.split('@').next().unwrap_or(image);
        let last_slash = image.rfind('/').map(|i| i + 1).unwrap_or(0);

        match image[last_slash..].rfind(':') {
            Some(colon) => {
                let split = last_slash + colon;
                Self::new(&image[..split], &image[split + 1..])
            }
            None => Self::new(image, "latest"),
        }
    }

    /// Reference of `image` inside `registry`, with the given tag.
    ///
    /// Repositories are lower-cased; tags keep their case. The registry
    /// prefix is not repeated when the image already carries it.
    pub fn in_registry(registry: &str, image: &str, tag: &str) -> Self {
        let registry = registry.trim_end_matches('/').to_lowercase();
        let repository = Self::parse(image).repository.to_lowercase();

        let repository = if registry.is_empty() || repository.starts_with(&format!("{}/", registry)) {
            repository
        } else {
            format!("{}/{}", registry, repository)
        };

        Self::new(repository, tag)
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.repository, self.tag)
    }
}
