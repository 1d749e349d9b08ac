pub mod artifact_store;
pub mod auth_store;
pub mod capture;
pub mod catalog_cache;
pub mod language;
pub mod review_writer;

pub use artifact_store::{ArtifactInventory, ArtifactKind, ArtifactLayout};
pub use auth_store::{AuthStore, LoginCredentials};
pub use capture::{CaptureEngine, CaptureSettings, PassOptions, SolutionOutcome};
pub use catalog_cache::CatalogCache;
pub use language::LanguagePreferences;
pub use review_writer::ReviewWriter;
