use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A remote file that can be downloaded to disk
///
/// The resource name is the catalog key and is not stored here.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Resource {
    /// File the resource is saved to, relative to the output directory unless absolute
    pub filename: PathBuf,

    /// Short human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Where the resource is downloaded from
    pub url: String,

    /// Free-text tags used for searching
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Resource {
    pub fn new(filename: impl Into<PathBuf>, url: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            description: None,
            url: url.into(),
            tags: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Destination path for this resource under `output_dir`
    pub fn destination(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(&self.filename)
    }
}
