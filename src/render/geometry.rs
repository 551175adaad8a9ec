//! Shared geometry calculations for arrows
//!
//! This module contains constants and math shared between the on-screen
//! overlay and the arrow burned into saved images (tiny-skia).

/// Arrow geometry constants
pub mod arrow {
    /// Arrowhead angle from shaft in radians (30 degrees)
    pub const HEAD_ANGLE: f32 = std::f32::consts::FRAC_PI_6;
    /// Minimum arrow length to get a head
    pub const MIN_LENGTH: f32 = 1.0;
    /// Overlay arrowhead size in display pixels
    pub const OVERLAY_HEAD_SIZE: f32 = 10.0;

    /// Shaft width for an arrow burned into an image of this size
    pub fn line_width(width: u32, height: u32) -> f32 {
        (width.min(height) / 150).max(3) as f32
    }

    /// Head length for an arrow burned into an image of this size
    pub fn head_length(width: u32, height: u32) -> f32 {
        (width.min(height) / 30).max(15) as f32
    }

    /// Calculate arrow head points given start, end, and head size
    /// Returns (head1_x, head1_y, head2_x, head2_y) for the two head corners
    pub fn head_points(
        start_x: f32,
        start_y: f32,
        end_x: f32,
        end_y: f32,
        head_size: f32,
    ) -> Option<(f32, f32, f32, f32)> {
        let dx = end_x - start_x;
        let dy = end_y - start_y;
        let length = (dx * dx + dy * dy).sqrt();
        if length < MIN_LENGTH {
            return None;
        }

        // Unit direction vector (pointing from start to end)
        let nx = dx / length;
        let ny = dy / length;

        let cos_a = HEAD_ANGLE.cos();
        let sin_a = HEAD_ANGLE.sin();

        // First head line (rotated clockwise from arrow direction)
        let head1_dx = -nx * cos_a - (-ny) * sin_a;
        let head1_dy = -nx * sin_a + (-ny) * cos_a;
        let head1_x = end_x + head1_dx * head_size;
        let head1_y = end_y + head1_dy * head_size;

        // Second head line (rotated counter-clockwise)
        let head2_dx = -nx * cos_a + (-ny) * sin_a;
        let head2_dy = -nx * (-sin_a) + (-ny) * cos_a;
        let head2_x = end_x + head2_dx * head_size;
        let head2_y = end_y + head2_dy * head_size;

        Some((head1_x, head1_y, head2_x, head2_y))
    }
}
