pub mod catalog;
pub mod config;
pub mod fetcher;
pub mod humanize;
pub mod observability;
pub mod service;

pub use catalog::{Resource, ResourceCatalog};
pub use fetcher::{BoundedFetcher, FetchReport, FetchTask, ResourceFetcher};
pub use service::{BatchOutcome, FetchService};
