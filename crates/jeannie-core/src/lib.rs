//! Core domain model for jeannie.
//!
//! This crate defines the content catalog produced by the DAW content
//! scanner (devices, presets, sample libraries), the curated musical
//! attributes attached to catalog items, the fixed-field enrichment merge,
//! and the genre/vibe taxonomy.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod catalog;
pub mod enrichment;
pub mod error;
pub mod model;
mod repair;
pub mod taxonomy;
pub mod text;

pub use catalog::{Catalog, CatalogStats};
pub use enrichment::{Enrichment, EnrichmentSet};
pub use error::{Error, Result};
pub use model::{ContentItem, ItemId, PlayingMode};
pub use taxonomy::Taxonomy;
pub use text::tokenize;
