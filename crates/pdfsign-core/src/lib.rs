//! Signature overlay for existing PDF documents
//!
//! Embeds an uploaded image (PNG, JPEG, GIF, BMP, TIFF, WebP) as an image
//! XObject and draws it inside a rectangle on one page, using lopdf for
//! parsing and serialization.
//!
//! Positions are given as the page appears on screen: top-left origin,
//! y growing downward, with `/Rotate` and the CropBox already applied.

pub mod error;
pub mod geometry;
pub mod overlay;
pub mod raster;

pub use error::SignError;
pub use geometry::{PageBox, Rect, Rotation, DEFAULT_SIGNATURE_HEIGHT, DEFAULT_SIGNATURE_WIDTH};
pub use overlay::{resolve_page_index, stamp_signature, Placement};
pub use raster::SignatureImage;

/// Parse PDF bytes and return page count
pub fn page_count(bytes: &[u8]) -> Result<u32, SignError> {
    let doc =
        lopdf::Document::load_mem(bytes).map_err(|e| SignError::ParseError(e.to_string()))?;
    Ok(doc.get_pages().len() as u32)
}
