//! Place a signature image on one page of an existing PDF

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SignError;
use crate::geometry::{PageBox, Rect, Rotation, LETTER};
use crate::raster::SignatureImage;

/// Upper bound on `/Parent` hops when resolving inherited page attributes
const MAX_INHERITANCE_DEPTH: usize = 32;

/// Where to draw the signature
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Placement {
    /// 0-based page index, negative values count from the last page
    pub page: i64,
    /// Signature box in visible page coordinates
    pub rect: Rect,
    /// Fit the image inside `rect` keeping its aspect ratio
    #[serde(default = "default_keep_proportion")]
    pub keep_proportion: bool,
}

fn default_keep_proportion() -> bool {
    true
}

impl Placement {
    pub fn new(page: i64, rect: Rect) -> Self {
        Self {
            page,
            rect,
            keep_proportion: true,
        }
    }

    pub fn with_keep_proportion(mut self, keep_proportion: bool) -> Self {
        self.keep_proportion = keep_proportion;
        self
    }
}

/// Turn a 0-based (or negative, from the end) page index into lopdf's
/// 1-based page number.
pub fn resolve_page_index(page: i64, total: u32) -> Result<u32, SignError> {
    let count = i64::from(total);
    let index = if page < 0 { page + count } else { page };
    if !(0..count).contains(&index) {
        return Err(SignError::PageOutOfRange { page, total });
    }
    Ok(index as u32 + 1)
}

/// Draw `image_bytes` on the page selected by `placement` and return the
/// re-serialized document.
pub fn stamp_signature(
    pdf_bytes: &[u8],
    image_bytes: &[u8],
    placement: &Placement,
) -> Result<Vec<u8>, SignError> {
    let mut doc =
        Document::load_mem(pdf_bytes).map_err(|e| SignError::ParseError(e.to_string()))?;

    let pages = doc.get_pages();
    let total = pages.len() as u32;
    let page_number = resolve_page_index(placement.page, total)?;
    let page_id = *pages
        .get(&page_number)
        .ok_or(SignError::PageOutOfRange {
            page: placement.page,
            total,
        })?;

    let page_box = page_box(&doc, page_id);
    let rect = placement.rect;
    if !rect.is_finite() {
        return Err(SignError::InvalidRect(
            "coordinates must be finite numbers".to_string(),
        ));
    }
    if rect.is_empty() {
        return Err(SignError::InvalidRect(format!(
            "width and height must be positive (got {} x {})",
            rect.width, rect.height
        )));
    }
    if !page_box.visible_rect().intersects(&rect) {
        return Err(SignError::OutsidePage(page_number - 1));
    }

    let image = SignatureImage::from_bytes(image_bytes)?;
    let target = if placement.keep_proportion {
        rect.fit(f64::from(image.width), f64::from(image.height))
    } else {
        rect
    };
    let matrix = page_box.image_matrix(&target);

    if image.has_soft_mask() {
        // Soft masks arrived with PDF 1.4
        require_version(&mut doc, "1.4");
    }

    let image_id = image.embed(&mut doc);
    let name = register_xobject(&mut doc, page_id, image_id)?;
    wrap_page_contents(&mut doc, page_id, &draw_image_operators(&name, &matrix))?;

    debug!(
        page = page_number - 1,
        rotation = page_box.rotation.degrees(),
        xobject = %name,
        ?matrix,
        "Placed signature image"
    );

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| SignError::OperationError(e.to_string()))?;

    Ok(output)
}

/// Follow a single indirect reference
fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

/// Look up a page attribute, walking up the page tree for inheritable keys.
fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_INHERITANCE_DEPTH {
        if let Ok(value) = node.get(key) {
            return resolve(doc, value).cloned();
        }
        let parent_id = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        node = doc.get_dictionary(parent_id).ok()?;
    }
    None
}

fn box_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<[f64; 4]> {
    let Object::Array(items) = inherited_attribute(doc, page_id, key)? else {
        return None;
    };
    let values = items
        .iter()
        .map(|item| resolve(doc, item).and_then(number))
        .collect::<Option<Vec<f64>>>()?;
    match values.as_slice() {
        [a, b, c, d] if values.iter().all(|v| v.is_finite()) => Some([*a, *b, *c, *d]),
        _ => None,
    }
}

fn page_box(doc: &Document, page_id: ObjectId) -> PageBox {
    let media_box = box_attribute(doc, page_id, b"MediaBox").unwrap_or(LETTER);
    let crop_box = box_attribute(doc, page_id, b"CropBox");
    let rotation = inherited_attribute(doc, page_id, b"Rotate")
        .and_then(|r| r.as_i64().ok())
        .map(Rotation::from_degrees)
        .unwrap_or_default();
    PageBox::clipped(media_box, crop_box, rotation)
}

fn require_version(doc: &mut Document, minimum: &str) {
    let current: f32 = doc.version.parse().unwrap_or(0.0);
    let wanted: f32 = minimum.parse().unwrap_or(0.0);
    if current < wanted {
        doc.version = minimum.to_string();
    }
}

/// Add the image to the page's `/XObject` resources under an unused name.
///
/// The resources dictionary is copied onto the page itself, so inherited or
/// shared resources seen by other pages stay untouched.
fn register_xobject(
    doc: &mut Document,
    page_id: ObjectId,
    image_id: ObjectId,
) -> Result<String, SignError> {
    let mut resources = match inherited_attribute(doc, page_id, b"Resources") {
        Some(Object::Dictionary(dict)) => dict,
        _ => Dictionary::new(),
    };

    let mut xobjects = match resources.get(b"XObject").ok().and_then(|x| resolve(doc, x)) {
        Some(Object::Dictionary(dict)) => dict.clone(),
        _ => Dictionary::new(),
    };

    let mut index = 0usize;
    let name = loop {
        let candidate = format!("Sig{}", index);
        if !xobjects.has(candidate.as_bytes()) {
            break candidate;
        }
        index += 1;
    };

    xobjects.set(name.clone(), Object::Reference(image_id));
    resources.set("XObject", Object::Dictionary(xobjects));

    page_dictionary_mut(doc, page_id)?.set("Resources", Object::Dictionary(resources));
    Ok(name)
}

/// Bracket the existing page content in `q`/`Q` and append `overlay` after it.
fn wrap_page_contents(
    doc: &mut Document,
    page_id: ObjectId,
    overlay: &str,
) -> Result<(), SignError> {
    let existing: Vec<Object> = {
        let page = doc
            .get_dictionary(page_id)
            .map_err(|e| SignError::OperationError(e.to_string()))?;
        match page.get(b"Contents") {
            Ok(Object::Reference(id)) => match doc.get_object(*id) {
                Ok(Object::Array(parts)) => parts.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(Object::Array(parts)) => parts.clone(),
            _ => Vec::new(),
        }
    };

    let save_id = doc.add_object(Object::Stream(Stream::new(
        Dictionary::new(),
        b"q\n".to_vec(),
    )));
    let overlay_id = doc.add_object(Object::Stream(Stream::new(
        Dictionary::new(),
        overlay.as_bytes().to_vec(),
    )));

    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(save_id));
    contents.extend(existing);
    contents.push(Object::Reference(overlay_id));

    page_dictionary_mut(doc, page_id)?.set("Contents", Object::Array(contents));
    Ok(())
}

fn page_dictionary_mut(
    doc: &mut Document,
    page_id: ObjectId,
) -> Result<&mut Dictionary, SignError> {
    doc.get_object_mut(page_id)
        .and_then(|page| page.as_dict_mut())
        .map_err(|e| SignError::OperationError(format!("Page object {:?}: {}", page_id, e)))
}

fn draw_image_operators(name: &str, matrix: &[f64; 6]) -> String {
    let operands: Vec<String> = matrix.iter().map(|v| format_number(*v)).collect();
    format!("\nQ\nq\n{} cm\n/{} Do\nQ\n", operands.join(" "), name)
}

/// Compact decimal form for content stream operands
fn format_number(value: f64) -> String {
    let formatted = format!("{:.4}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}
