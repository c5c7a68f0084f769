//! spektor-inventory: Host inventory collection
//!
//! Runs a fixed set of Linux inventory probes through `spektor-exec`,
//! normalizes their output into a versioned JSON document, and persists it.

pub mod collector;
pub mod document;
pub mod error;
pub mod parsers;
pub mod probes;
pub mod store;

pub use collector::{CollectOptions, Extra, collect};
pub use document::{InventoryDocument, SCHEMA_VERSION};
pub use error::StoreError;
pub use store::{load, save};
