use super::error::{CatalogError, Result};
use super::models::Resource;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// In-memory mapping from resource name to [`Resource`]
///
/// Names are unique: [`insert`](Self::insert) never overwrites and
/// [`update`](Self::update) never inserts. The catalog does no locking of its
/// own; callers that share it wrap it in a lock.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResourceCatalog {
    #[serde(default)]
    resources: BTreeMap<String, Resource>,
}

impl ResourceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and validate a TOML catalog file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading resource catalog");

        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let catalog = Self::from_toml_str(&text)?;
        info!(resources = catalog.len(), "Resource catalog loaded");
        Ok(catalog)
    }

    /// Parse and validate catalog text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let catalog: Self = toml::from_str(text)?;
        for (name, resource) in &catalog.resources {
            validate_entry(name, resource)?;
        }
        Ok(catalog)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write the catalog back in the layout [`load`](Self::load) reads
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = self.to_toml_string()?;
        std::fs::write(path, text).map_err(|source| CatalogError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), resources = self.len(), "Resource catalog saved");
        Ok(())
    }

    /// Look up a resource by name
    pub fn resolve(&self, name: &str) -> Option<&Resource> {
        self.resources.get(name)
    }

    /// All entries, ordered by name
    pub fn list_all(&self) -> Vec<(&str, &Resource)> {
        self.resources
            .iter()
            .map(|(name, resource)| (name.as_str(), resource))
            .collect()
    }

    /// Entries carrying `tag` (case-insensitive), ordered by name
    pub fn find_by_tag(&self, tag: &str) -> Vec<(&str, &Resource)> {
        self.resources
            .iter()
            .filter(|(_, resource)| resource.has_tag(tag))
            .map(|(name, resource)| (name.as_str(), resource))
            .collect()
    }

    /// Add a new entry; returns `false` and changes nothing if `name` exists
    pub fn insert(&mut self, name: impl Into<String>, resource: Resource) -> bool {
        let name = name.into();
        if self.resources.contains_key(&name) {
            return false;
        }
        self.resources.insert(name, resource);
        true
    }

    /// Delete an entry; returns whether it existed
    pub fn remove(&mut self, name: &str) -> bool {
        self.resources.remove(name).is_some()
    }

    /// Replace an existing entry; returns `false` and changes nothing if `name` is absent
    pub fn update(&mut self, name: &str, resource: Resource) -> bool {
        match self.resources.get_mut(name) {
            Some(existing) => {
                *existing = resource;
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resources.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Check that an entry can be fetched: absolute http(s) URL and a filename
pub fn validate_entry(name: &str, resource: &Resource) -> Result<()> {
    if resource.filename.as_os_str().is_empty() {
        return Err(CatalogError::EmptyFilename(name.to_string()));
    }

    let invalid = |reason: String| CatalogError::InvalidUrl {
        name: name.to_string(),
        url: resource.url.clone(),
        reason,
    };

    let url = Url::parse(&resource.url).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(format!("unsupported scheme '{}'", other))),
    }
}
