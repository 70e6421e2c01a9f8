use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write catalog {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed catalog: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize catalog: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("resource '{name}' has an invalid url '{url}': {reason}")]
    InvalidUrl {
        name: String,
        url: String,
        reason: String,
    },

    #[error("resource '{0}' has an empty filename")]
    EmptyFilename(String),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
