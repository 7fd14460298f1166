//! Signature image decoding and conversion into PDF image XObjects

use std::io::{Cursor, Write};

use flate2::{write::ZlibEncoder, Compression};
use image::codecs::jpeg::JpegDecoder;
use image::{DynamicImage, ExtendedColorType, ImageDecoder, ImageFormat};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::error::SignError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    Gray,
    Rgb,
}

impl ColorSpace {
    fn pdf_name(&self) -> &'static [u8] {
        match self {
            ColorSpace::Gray => b"DeviceGray",
            ColorSpace::Rgb => b"DeviceRGB",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// JPEG bytes copied as-is
    Dct,
    /// Raw 8-bit samples, zlib compressed
    Flate,
}

impl Encoding {
    fn filter(&self) -> &'static [u8] {
        match self {
            Encoding::Dct => b"DCTDecode",
            Encoding::Flate => b"FlateDecode",
        }
    }
}

/// An image ready to be written into a PDF
#[derive(Debug, Clone)]
pub struct SignatureImage {
    pub width: u32,
    pub height: u32,
    pub color_space: ColorSpace,
    pub encoding: Encoding,
    data: Vec<u8>,
    /// Compressed alpha channel, only kept when some pixel is not opaque
    soft_mask: Option<Vec<u8>>,
}

impl SignatureImage {
    /// Decode an uploaded image. Gray or RGB JPEGs are embedded without
    /// re-encoding; every other input is decoded to 8-bit samples.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignError> {
        if bytes.is_empty() {
            return Err(SignError::UnsupportedImage("empty image".to_string()));
        }

        let format =
            image::guess_format(bytes).map_err(|e| SignError::UnsupportedImage(e.to_string()))?;

        if format == ImageFormat::Jpeg {
            if let Some(jpeg) = Self::jpeg_passthrough(bytes)? {
                return Ok(jpeg);
            }
        }

        let decoded = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| SignError::UnsupportedImage(e.to_string()))?;
        Self::from_dynamic(&decoded)
    }

    fn jpeg_passthrough(bytes: &[u8]) -> Result<Option<Self>, SignError> {
        let decoder = JpegDecoder::new(Cursor::new(bytes))
            .map_err(|e| SignError::UnsupportedImage(e.to_string()))?;
        let (width, height) = decoder.dimensions();

        let Some(color_space) = passthrough_color_space(decoder.original_color_type()) else {
            return Ok(None);
        };

        if width == 0 || height == 0 {
            return Err(SignError::UnsupportedImage("image has no pixels".to_string()));
        }

        Ok(Some(Self {
            width,
            height,
            color_space,
            encoding: Encoding::Dct,
            data: bytes.to_vec(),
            soft_mask: None,
        }))
    }

    pub fn from_dynamic(img: &DynamicImage) -> Result<Self, SignError> {
        let (width, height) = (img.width(), img.height());
        if width == 0 || height == 0 {
            return Err(SignError::UnsupportedImage("image has no pixels".to_string()));
        }

        let color = img.color();

        let soft_mask = if color.has_alpha() {
            let alpha: Vec<u8> = img.to_rgba8().pixels().map(|p| p.0[3]).collect();
            if alpha.iter().all(|&a| a == u8::MAX) {
                None
            } else {
                Some(deflate(&alpha)?)
            }
        } else {
            None
        };

        let (color_space, samples) = if color.has_color() {
            (ColorSpace::Rgb, img.to_rgb8().into_raw())
        } else {
            (ColorSpace::Gray, img.to_luma8().into_raw())
        };

        Ok(Self {
            width,
            height,
            color_space,
            encoding: Encoding::Flate,
            data: deflate(&samples)?,
            soft_mask,
        })
    }

    pub fn has_soft_mask(&self) -> bool {
        self.soft_mask.is_some()
    }

    /// Add the image (and its soft mask) to `doc`, returning the image
    /// XObject id.
    pub fn embed(self, doc: &mut Document) -> ObjectId {
        let mut dict = image_dictionary(
            self.width,
            self.height,
            self.color_space.pdf_name(),
            self.encoding.filter(),
        );

        if let Some(alpha) = self.soft_mask {
            let mask = Stream::new(
                image_dictionary(
                    self.width,
                    self.height,
                    ColorSpace::Gray.pdf_name(),
                    Encoding::Flate.filter(),
                ),
                alpha,
            );
            let mask_id = doc.add_object(Object::Stream(mask));
            dict.set("SMask", Object::Reference(mask_id));
        }

        doc.add_object(Object::Stream(Stream::new(dict, self.data)))
    }
}

/// Color spaces a JPEG can keep when copied verbatim. CMYK and friends are
/// normalized through a full decode.
fn passthrough_color_space(color: ExtendedColorType) -> Option<ColorSpace> {
    match color {
        ExtendedColorType::L8 => Some(ColorSpace::Gray),
        ExtendedColorType::Rgb8 => Some(ColorSpace::Rgb),
        _ => None,
    }
}

fn image_dictionary(width: u32, height: u32, color_space: &[u8], filter: &[u8]) -> Dictionary {
    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"XObject".to_vec()));
    dict.set("Subtype", Object::Name(b"Image".to_vec()));
    dict.set("Width", Object::Integer(i64::from(width)));
    dict.set("Height", Object::Integer(i64::from(height)));
    dict.set("ColorSpace", Object::Name(color_space.to_vec()));
    dict.set("BitsPerComponent", Object::Integer(8));
    dict.set("Filter", Object::Name(filter.to_vec()));
    dict
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, SignError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| SignError::OperationError(format!("Failed to compress image: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| SignError::OperationError(format!("Failed to compress image: {}", e)))
}
