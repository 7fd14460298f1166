//! Page geometry for signature placement
//!
//! Callers position a signature the way the page looks on screen: origin at
//! the top-left corner of the displayed page, y growing downward, units in
//! PDF points. PDF user space has its origin at the bottom-left of the page
//! box and knows nothing about `/Rotate`, so every placement goes through
//! [`PageBox::to_user`].

use serde::{Deserialize, Serialize};

/// Default signature box width in points
pub const DEFAULT_SIGNATURE_WIDTH: f64 = 150.0;
/// Default signature box height in points
pub const DEFAULT_SIGNATURE_HEIGHT: f64 = 50.0;

/// US Letter, used when a page carries no usable MediaBox
pub const LETTER: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// Rectangle in visible page space (top-left origin, y down)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Signature box of the default size with its top-left corner at (x, y)
    pub fn at(x: f64, y: f64) -> Self {
        Self::new(x, y, DEFAULT_SIGNATURE_WIDTH, DEFAULT_SIGNATURE_HEIGHT)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Open intersection: rectangles that only share an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }

    /// Largest rectangle with the image's aspect ratio that fits inside
    /// `self`, centered.
    pub fn fit(&self, image_width: f64, image_height: f64) -> Rect {
        if image_width <= 0.0 || image_height <= 0.0 {
            return *self;
        }
        let scale = (self.width / image_width).min(self.height / image_height);
        let width = image_width * scale;
        let height = image_height * scale;
        Rect::new(
            self.x + (self.width - width) / 2.0,
            self.y + (self.height - height) / 2.0,
            width,
            height,
        )
    }
}

/// Clockwise page rotation as given by `/Rotate`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    None,
    Quarter,
    Half,
    ThreeQuarter,
}

impl Rotation {
    /// Values that are not a multiple of 90 are treated as unrotated.
    pub fn from_degrees(degrees: i64) -> Self {
        match degrees.rem_euclid(360) {
            90 => Rotation::Quarter,
            180 => Rotation::Half,
            270 => Rotation::ThreeQuarter,
            _ => Rotation::None,
        }
    }

    pub fn degrees(&self) -> u32 {
        match self {
            Rotation::None => 0,
            Rotation::Quarter => 90,
            Rotation::Half => 180,
            Rotation::ThreeQuarter => 270,
        }
    }

    fn swaps_axes(&self) -> bool {
        matches!(self, Rotation::Quarter | Rotation::ThreeQuarter)
    }
}

/// Visible area of a page in PDF user space, plus its rotation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    pub rotation: Rotation,
}

impl PageBox {
    /// Build from a `[llx lly urx ury]` array, accepting corners in any order.
    pub fn new(bounds: [f64; 4], rotation: Rotation) -> Self {
        let [ax, ay, bx, by] = bounds;
        Self {
            x0: ax.min(bx),
            y0: ay.min(by),
            x1: ax.max(bx),
            y1: ay.max(by),
            rotation,
        }
    }

    /// Page box from MediaBox clipped by an optional CropBox. A CropBox that
    /// misses the MediaBox entirely is ignored.
    pub fn clipped(media_box: [f64; 4], crop_box: Option<[f64; 4]>, rotation: Rotation) -> Self {
        let media = Self::new(media_box, rotation);
        let Some(crop) = crop_box.map(|c| Self::new(c, rotation)) else {
            return media;
        };
        let clipped = Self {
            x0: media.x0.max(crop.x0),
            y0: media.y0.max(crop.y0),
            x1: media.x1.min(crop.x1),
            y1: media.y1.min(crop.y1),
            rotation,
        };
        if clipped.width() > 0.0 && clipped.height() > 0.0 {
            clipped
        } else {
            media
        }
    }

    /// Unrotated width
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    /// Unrotated height
    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn visible_width(&self) -> f64 {
        if self.rotation.swaps_axes() {
            self.height()
        } else {
            self.width()
        }
    }

    pub fn visible_height(&self) -> f64 {
        if self.rotation.swaps_axes() {
            self.width()
        } else {
            self.height()
        }
    }

    /// The whole visible page as a rectangle
    pub fn visible_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.visible_width(), self.visible_height())
    }

    /// Map a visible point (top-left origin, y down) into PDF user space.
    pub fn to_user(&self, vx: f64, vy: f64) -> (f64, f64) {
        let (w, h) = (self.width(), self.height());
        // (a, b): offset from the unrotated top-left corner, b pointing down
        let (a, b) = match self.rotation {
            Rotation::None => (vx, vy),
            Rotation::Quarter => (vy, h - vx),
            Rotation::Half => (w - vx, h - vy),
            Rotation::ThreeQuarter => (w - vy, vx),
        };
        (self.x0 + a, self.y1 - b)
    }

    /// `cm` operands mapping the image unit square onto `rect` so the image
    /// reads upright on the displayed page.
    pub fn image_matrix(&self, rect: &Rect) -> [f64; 6] {
        let bottom = rect.y + rect.height;
        let origin = self.to_user(rect.x, bottom);
        let right = self.to_user(rect.x + rect.width, bottom);
        let up = self.to_user(rect.x, rect.y);
        [
            right.0 - origin.0,
            right.1 - origin.1,
            up.0 - origin.0,
            up.1 - origin.1,
            origin.0,
            origin.1,
        ]
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn rotation() -> impl Strategy<Value = Rotation> {
        prop_oneof![
            Just(Rotation::None),
            Just(Rotation::Quarter),
            Just(Rotation::Half),
            Just(Rotation::ThreeQuarter),
        ]
    }

    fn page_box() -> impl Strategy<Value = PageBox> {
        (
            -500.0f64..500.0,
            -500.0f64..500.0,
            1.0f64..2000.0,
            1.0f64..2000.0,
            rotation(),
        )
            .prop_map(|(x, y, w, h, r)| PageBox::new([x, y, x + w, y + h], r))
    }

    proptest! {
        /// Visible corners land on page box corners for every rotation
        #[test]
        fn visible_corners_map_to_box_corners(page in page_box()) {
            let corners = [
                (0.0, 0.0),
                (page.visible_width(), 0.0),
                (0.0, page.visible_height()),
                (page.visible_width(), page.visible_height()),
            ];
            for (vx, vy) in corners {
                let (ux, uy) = page.to_user(vx, vy);
                prop_assert!((ux - page.x0).abs() < 1e-6 || (ux - page.x1).abs() < 1e-6);
                prop_assert!((uy - page.y0).abs() < 1e-6 || (uy - page.y1).abs() < 1e-6);
            }
        }

        /// The image is never mirrored
        #[test]
        fn image_matrix_preserves_orientation(
            page in page_box(),
            x in 0.0f64..500.0,
            y in 0.0f64..500.0,
            w in 1.0f64..300.0,
            h in 1.0f64..300.0,
        ) {
            let [a, b, c, d, _, _] = page.image_matrix(&Rect::new(x, y, w, h));
            let det = a * d - b * c;
            prop_assert!((det - w * h).abs() < 1e-6 * (w * h).max(1.0));
        }

        /// Fitting keeps the image aspect ratio and stays inside the box
        #[test]
        fn fit_stays_inside_and_keeps_ratio(
            w in 1.0f64..500.0,
            h in 1.0f64..500.0,
            iw in 1.0f64..4000.0,
            ih in 1.0f64..4000.0,
        ) {
            let rect = Rect::new(10.0, 20.0, w, h);
            let fitted = rect.fit(iw, ih);
            prop_assert!(fitted.x >= rect.x - 1e-9);
            prop_assert!(fitted.y >= rect.y - 1e-9);
            prop_assert!(fitted.x + fitted.width <= rect.x + rect.width + 1e-9);
            prop_assert!(fitted.y + fitted.height <= rect.y + rect.height + 1e-9);
            prop_assert!((fitted.width / fitted.height - iw / ih).abs() < 1e-6 * (iw / ih).max(1.0));
        }
    }
}
