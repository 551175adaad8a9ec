//! Image rendering using tiny-skia
//!
//! These functions crop images and burn arrows into them before the result
//! is written back to the dataset.

use image::RgbaImage;
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Stroke, Transform};

use super::geometry::arrow;
use crate::config::ShapeColor;
use crate::domain::{CropRect, NaturalSize, PixelPoint, Rect};

/// Convert RgbaImage to Pixmap, apply drawing function, and copy back
fn with_pixmap(img: &mut RgbaImage, f: impl FnOnce(&mut Pixmap)) {
    let (w, h) = (img.width(), img.height());
    let Some(size) = tiny_skia::IntSize::from_wh(w, h) else {
        return;
    };
    let Some(mut pixmap) = Pixmap::from_vec(img.as_raw().clone(), size) else {
        return;
    };

    f(&mut pixmap);

    // Copy back
    img.copy_from_slice(pixmap.data());
}

/// Build the filled arrowhead triangle at the end point
fn build_head_path(start: PixelPoint, end: PixelPoint, head_size: f32) -> Option<tiny_skia::Path> {
    let (end_x, end_y) = (end.x as f32, end.y as f32);
    let (head1_x, head1_y, head2_x, head2_y) =
        arrow::head_points(start.x as f32, start.y as f32, end_x, end_y, head_size)?;

    let mut pb = PathBuilder::new();
    pb.move_to(end_x, end_y);
    pb.line_to(head1_x, head1_y);
    pb.line_to(head2_x, head2_y);
    pb.close();
    pb.finish()
}

/// Draw an arrow from `start` to `end` (natural pixels) onto an image
///
/// Shaft width and head length scale with the image's shorter side.
pub fn draw_arrow_on_image(img: &mut RgbaImage, start: PixelPoint, end: PixelPoint, color: ShapeColor) {
    let [r, g, b, a] = color.to_rgba_u8();
    let width = arrow::line_width(img.width(), img.height());
    let head_size = arrow::head_length(img.width(), img.height());

    with_pixmap(img, |pixmap| {
        let mut paint = Paint::default();
        paint.set_color_rgba8(r, g, b, a);
        paint.anti_alias = true;

        let mut pb = PathBuilder::new();
        pb.move_to(start.x as f32, start.y as f32);
        pb.line_to(end.x as f32, end.y as f32);
        if let Some(shaft) = pb.finish() {
            let stroke = Stroke {
                width,
                ..Default::default()
            };
            pixmap.stroke_path(&shaft, &paint, &stroke, Transform::identity(), None);
        }

        if let Some(head) = build_head_path(start, end, head_size) {
            pixmap.fill_path(&head, &paint, FillRule::Winding, Transform::identity(), None);
        }
    });
}

/// Cut a rectangle out of an image, clipped to the image bounds
///
/// Returns `None` when nothing of the rectangle lies inside the image.
pub fn crop_image(img: &RgbaImage, crop: CropRect) -> Option<RgbaImage> {
    let full = Rect::of_size(NaturalSize::new(img.width(), img.height()));
    let clipped = full.intersect(Rect::from_crop(crop))?;
    let dims = clipped.dimensions()?;
    let view = image::imageops::crop_imm(
        img,
        clipped.left.unsigned_abs(),
        clipped.top.unsigned_abs(),
        dims.width(),
        dims.height(),
    );
    Some(view.to_image())
}
