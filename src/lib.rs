//! folio — client-side catalog store for CTS text libraries.
//!
//! Fetches catalog data (text groups, works, texts, tables of contents)
//! from a library API, indexes it by URN, and serves filtered, sorted, and
//! hydrated views to a browsing surface.

pub mod client;
pub mod error;
pub mod model;
pub mod store;
pub mod urn;

pub use error::{CatalogError, Result};
pub use store::{CatalogStore, SortKind};
pub use urn::{Urn, UrnLevel};
