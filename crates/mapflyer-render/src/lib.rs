//! Flyer rendering
//!
//! This crate turns the extraction results into the printable A4 flyer
//! using lopdf. It renders QR codes for the event links, embeds the
//! fetched map image, and lays out the sorted address list in columns.

pub mod error;
pub mod flyer;
pub mod image;
pub mod layout;
pub mod qr;
pub mod text;

pub use error::RenderError;
pub use flyer::Flyer;
pub use image::{CropMargins, EmbeddedImage};
pub use layout::AddressLayout;
pub use qr::qr_png;
