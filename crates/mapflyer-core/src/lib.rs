//! KMZ/KML ingestion for the flyer pipeline
//!
//! This crate turns a KMZ container or raw KML file into the two lists the
//! flyer needs:
//!
//! - `Resolver::resolve`: zip sniffing with raw-KML fallback, yielding a
//!   canonical on-disk document
//! - `extract_coordinates` / `extract_addresses`: per-placemark queries
//!   that tolerate missing fields record by record

pub mod error;
pub mod extract;
pub mod resolve;

pub use error::ExtractError;
pub use extract::{extract_addresses, extract_coordinates, Coordinate, SkipReason};
pub use resolve::{ResolvedDocument, Resolver};
