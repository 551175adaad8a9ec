//! Geometric types for displayed images and pointer coordinates
//!
//! Three coordinate spaces meet here:
//! - viewport: raw pointer positions and element bounding boxes
//! - display: relative to the rendered image element's top-left corner
//! - natural: integer pixels of the image's intrinsic resolution

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// A position in viewport or display space
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Translate the point by the given offset
    pub fn offset(self, by: Point) -> Point {
        Point {
            x: self.x + by.x,
            y: self.y + by.y,
        }
    }
}

/// An integer pixel position in the image's natural resolution
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: u32,
    pub y: u32,
}

impl PixelPoint {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Bounding box of an on-screen element (left, top, width, height)
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Whether the element has been laid out with a usable, non-empty size
    pub fn is_measurable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// Check if this box contains a point (edges inclusive)
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left
            && point.x <= self.left + self.width
            && point.y >= self.top
            && point.y <= self.top + self.height
    }

    pub fn origin(&self) -> Point {
        Point::new(self.left, self.top)
    }
}

/// Intrinsic pixel dimensions of an image
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NaturalSize {
    pub width: u32,
    pub height: u32,
}

impl NaturalSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Where the image element and the surface containing it sit in the viewport
///
/// The surface is the region that receives pointer events; the image may be
/// letterboxed inside it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageLayout {
    pub surface: Bounds,
    pub image: Bounds,
}

impl ImageLayout {
    pub fn new(surface: Bounds, image: Bounds) -> Self {
        Self { surface, image }
    }

    /// Layout where the image fills its surface exactly
    pub fn filling(image: Bounds) -> Self {
        Self {
            surface: image,
            image,
        }
    }

    /// Offset of the image's top-left corner relative to the surface
    pub fn image_offset(&self) -> Point {
        Point::new(
            self.image.left - self.surface.left,
            self.image.top - self.surface.top,
        )
    }
}

/// Crop rectangle in natural image pixels
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Logical Size and Position of a rectangle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    /// Create a new rectangle from coordinates
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Rectangle covering a whole image of the given size
    pub fn of_size(size: NaturalSize) -> Self {
        Self::new(
            0,
            0,
            i32::try_from(size.width).unwrap_or(i32::MAX),
            i32::try_from(size.height).unwrap_or(i32::MAX),
        )
    }

    /// Rectangle spanned by a crop request
    pub fn from_crop(crop: CropRect) -> Self {
        let left = i32::try_from(crop.x).unwrap_or(i32::MAX);
        let top = i32::try_from(crop.y).unwrap_or(i32::MAX);
        Self::new(
            left,
            top,
            left.saturating_add(i32::try_from(crop.width).unwrap_or(i32::MAX)),
            top.saturating_add(i32::try_from(crop.height).unwrap_or(i32::MAX)),
        )
    }

    /// Calculate the intersection of two rectangles
    pub fn intersect(&self, other: Rect) -> Option<Rect> {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right.min(other.right);
        let bottom = self.bottom.min(other.bottom);
        if left < right && top < bottom {
            Some(Rect {
                left,
                top,
                right,
                bottom,
            })
        } else {
            None
        }
    }

    /// Get the width of the rectangle
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    /// Get the height of the rectangle
    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Convert to dimensions (NonZeroU32 width and height)
    pub fn dimensions(self) -> Option<RectDimension> {
        let width = NonZeroU32::new((self.width()).unsigned_abs())?;
        let height = NonZeroU32::new((self.height()).unsigned_abs())?;
        Some(RectDimension { width, height })
    }
}

/// Non-zero dimensions of a rectangle
#[derive(Clone, Copy, Debug)]
pub struct RectDimension {
    pub width: NonZeroU32,
    pub height: NonZeroU32,
}

impl RectDimension {
    /// Get the width as u32
    pub fn width(&self) -> u32 {
        self.width.get()
    }

    /// Get the height as u32
    pub fn height(&self) -> u32 {
        self.height.get()
    }
}

/// Maps pointer positions over a rendered image into display and natural space
///
/// Only constructible for a measurable element; an unmeasurable element maps
/// to `None` and callers treat that as "nothing to do".
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoordinateMapper {
    image: Bounds,
    natural: NaturalSize,
}

impl CoordinateMapper {
    pub fn new(image: Bounds, natural: NaturalSize) -> Option<Self> {
        if !image.is_measurable() || natural.width == 0 || natural.height == 0 {
            return None;
        }
        Some(Self { image, natural })
    }

    /// Natural pixels per display pixel along each axis
    pub fn scale(&self) -> (f32, f32) {
        (
            self.natural.width as f32 / self.image.width,
            self.natural.height as f32 / self.image.height,
        )
    }

    /// Pointer position relative to the image, clamped onto the image
    pub fn display_position(&self, pointer: Point) -> Point {
        Point {
            x: (pointer.x - self.image.left).clamp(0.0, self.image.width),
            y: (pointer.y - self.image.top).clamp(0.0, self.image.height),
        }
    }

    /// Scale a display-relative position to natural pixels
    pub fn to_natural(&self, display: Point) -> PixelPoint {
        let (scale_x, scale_y) = self.scale();
        PixelPoint {
            x: round_pixel(display.x * scale_x),
            y: round_pixel(display.y * scale_y),
        }
    }

    /// Clamp and scale a raw pointer position in one step
    pub fn pointer_to_natural(&self, pointer: Point) -> PixelPoint {
        self.to_natural(self.display_position(pointer))
    }

    /// Inverse of [`Self::to_natural`], without rounding
    pub fn to_display(&self, natural: PixelPoint) -> Point {
        let (scale_x, scale_y) = self.scale();
        Point {
            x: natural.x as f32 / scale_x,
            y: natural.y as f32 / scale_y,
        }
    }

    /// Scale a normalized display-space box to natural pixels
    ///
    /// Origin and size are each scaled from the display-space values and
    /// rounded once.
    pub fn crop_rect(&self, display: Bounds) -> CropRect {
        let (scale_x, scale_y) = self.scale();
        CropRect {
            x: round_pixel(display.left * scale_x),
            y: round_pixel(display.top * scale_y),
            width: round_pixel(display.width * scale_x),
            height: round_pixel(display.height * scale_y),
        }
    }
}

/// Round to the nearest pixel; negative and NaN inputs land on zero
fn round_pixel(value: f32) -> u32 {
    value.round().max(0.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper(left: f32, top: f32, width: f32, height: f32, nw: u32, nh: u32) -> CoordinateMapper {
        CoordinateMapper::new(Bounds::new(left, top, width, height), NaturalSize::new(nw, nh))
            .expect("measurable layout")
    }

    #[test]
    fn test_display_position_clamps_to_nearest_edge() {
        let m = mapper(50.0, 20.0, 800.0, 600.0, 4000, 3000);

        let cases = [
            (Point::new(0.0, 0.0), Point::new(0.0, 0.0)),
            (Point::new(-500.0, 300.0), Point::new(0.0, 280.0)),
            (Point::new(10_000.0, 300.0), Point::new(800.0, 280.0)),
            (Point::new(400.0, -1.0), Point::new(350.0, 0.0)),
            (Point::new(400.0, 900.0), Point::new(350.0, 600.0)),
            (Point::new(2000.0, 2000.0), Point::new(800.0, 600.0)),
        ];
        for (pointer, expected) in cases {
            let p = m.display_position(pointer);
            assert_eq!(p, expected, "pointer {pointer:?}");
            assert!(p.x >= 0.0 && p.x <= 800.0);
            assert!(p.y >= 0.0 && p.y <= 600.0);
        }
    }

    #[test]
    fn test_to_natural_scales_and_rounds() {
        let m = mapper(0.0, 0.0, 800.0, 600.0, 4000, 3000);
        assert_eq!(m.scale(), (5.0, 5.0));
        assert_eq!(m.to_natural(Point::new(24.0, 16.0)), PixelPoint::new(120, 80));

        // 1000 px shown at 300 px: 10 display px -> 33.33 natural px
        let m = mapper(0.0, 0.0, 300.0, 300.0, 1000, 1000);
        assert_eq!(m.to_natural(Point::new(10.0, 10.3)), PixelPoint::new(33, 34));
    }

    #[test]
    fn test_round_trip_stays_within_one_pixel() {
        let pairs = [
            ((4000, 3000), (800.0, 600.0)),
            ((1920, 1080), (733.0, 412.4)),
            ((1024, 1024), (1024.0, 1024.0)),
            ((3001, 1999), (640.5, 427.0)),
        ];
        for ((nw, nh), (dw, dh)) in pairs {
            let m = mapper(13.0, 7.0, dw, dh, nw, nh);
            let mut x = 0.0;
            while x <= dw {
                let display = Point::new(x, dh - x * dh / dw);
                let back = m.to_display(m.to_natural(display));
                assert!((back.x - display.x).abs() <= 1.0, "{display:?} -> {back:?}");
                assert!((back.y - display.y).abs() <= 1.0, "{display:?} -> {back:?}");
                x += 17.3;
            }
        }
    }

    #[test]
    fn test_unmeasurable_layout_is_unavailable() {
        let natural = NaturalSize::new(100, 100);
        assert!(CoordinateMapper::new(Bounds::new(0.0, 0.0, 0.0, 10.0), natural).is_none());
        assert!(CoordinateMapper::new(Bounds::new(0.0, 0.0, 10.0, f32::NAN), natural).is_none());
        assert!(
            CoordinateMapper::new(Bounds::new(0.0, 0.0, 10.0, 10.0), NaturalSize::new(0, 5))
                .is_none()
        );
    }

    #[test]
    fn test_crop_rect_rounds_origin_and_size_independently() {
        let m = mapper(0.0, 0.0, 800.0, 600.0, 4000, 3000);
        let crop = m.crop_rect(Bounds::new(100.0, 100.0, 200.0, 150.0));
        assert_eq!(
            crop,
            CropRect {
                x: 500,
                y: 500,
                width: 1000,
                height: 750
            }
        );

        // scale 1.5: origin 10.3 -> 15.45 -> 15, size 20.3 -> 30.45 -> 30
        let m = mapper(0.0, 0.0, 200.0, 200.0, 300, 300);
        let crop = m.crop_rect(Bounds::new(10.3, 10.3, 20.3, 20.3));
        assert_eq!((crop.x, crop.width), (15, 30));
    }

    #[test]
    fn test_rect_intersect_clamps_crop_to_image() {
        let image = Rect::of_size(NaturalSize::new(100, 80));
        let crop = Rect::from_crop(CropRect {
            x: 90,
            y: 70,
            width: 50,
            height: 50,
        });
        let clipped = image.intersect(crop).expect("overlap");
        let dims = clipped.dimensions().expect("non-empty");
        assert_eq!((dims.width(), dims.height()), (10, 10));

        let outside = Rect::from_crop(CropRect {
            x: 200,
            y: 0,
            width: 5,
            height: 5,
        });
        assert!(image.intersect(outside).is_none());
    }

    #[test]
    fn test_layout_offset() {
        let layout = ImageLayout::new(
            Bounds::new(10.0, 20.0, 1000.0, 700.0),
            Bounds::new(110.0, 70.0, 800.0, 600.0),
        );
        assert_eq!(layout.image_offset(), Point::new(100.0, 50.0));
        assert!(layout.surface.contains(Point::new(10.0, 20.0)));
        assert!(!layout.surface.contains(Point::new(9.0, 20.0)));
    }
}
