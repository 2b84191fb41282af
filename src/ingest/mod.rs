//! Catalog ingestion: CSV reading, page scraping, and the record cache.
//!
//! The pipeline upstream of extraction. A catalog CSV names the model
//! projects; each project page is scraped for its README and tags; scraped
//! records are cached on disk so repeated runs and interrupted crawls never
//! re-fetch pages they already have.

pub mod cache;
pub mod catalog;
pub mod record;
pub mod scrape;

pub use cache::RecordCache;
pub use catalog::{read_catalog, CatalogEntry};
pub use record::ModelRecord;
pub use scrape::PageScraper;
