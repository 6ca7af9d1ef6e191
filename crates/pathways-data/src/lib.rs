//! Content loading for the pathways engine.
//!
//! Game content lives in JSON files keyed by human-readable names. This
//! crate deserializes them ([`schema`]) and resolves every name into a dense
//! catalog id ([`loader`]), failing loudly on anything unresolved.

pub mod loader;
pub mod schema;

pub use loader::{load_catalog, DataLoadError};
