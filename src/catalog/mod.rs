//! Resource catalog
//!
//! Named descriptors of remote files, loaded from a TOML document:
//!
//! ```toml
//! [resources.naif0012]
//! filename = "naif0012.tls"
//! description = "Leapseconds kernel"
//! url = "https://example.org/kernels/lsk/naif0012.tls"
//! tags = ["lsk"]
//! ```

pub mod error;
pub mod models;
pub mod store;

pub use error::{CatalogError, Result};
pub use models::Resource;
pub use store::{ResourceCatalog, validate_entry};
