pub mod catalog_client;

pub use catalog_client::{CatalogSource, HttpCatalogSource};
