use crate::catalog::Resource;
use std::path::{Path, PathBuf};

/// One download: fetch `url` into `destination`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTask {
    /// Catalog name the task was resolved from, used to key the report
    pub name: String,
    pub url: String,
    pub destination: PathBuf,
}

impl FetchTask {
    pub fn new(name: impl Into<String>, url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            destination: destination.into(),
        }
    }

    /// Build the task for a catalog entry, placing the file under `output_dir`
    pub fn from_resource(name: &str, resource: &Resource, output_dir: &Path) -> Self {
        Self {
            name: name.to_string(),
            url: resource.url.clone(),
            destination: resource.destination(output_dir),
        }
    }
}
