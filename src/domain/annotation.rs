//! Arrow annotation state and the payloads handed to the dataset store
//!
//! Arrow points are stored in natural pixels, unlike crop selections which
//! stay in display space until commit.

use serde::{Deserialize, Serialize};

use super::geometry::{CropRect, PixelPoint};

/// Up to two clicked points of an arrow, in natural pixels
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArrowPoints {
    pub start: Option<PixelPoint>,
    pub end: Option<PixelPoint>,
}

impl ArrowPoints {
    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Both points placed; ready to submit
    pub fn is_complete(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    pub fn segment(&self) -> Option<(PixelPoint, PixelPoint)> {
        Some((self.start?, self.end?))
    }
}

/// Crop commit payload, natural pixels
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRequest {
    pub image_path: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRequest {
    pub fn new(image_path: impl Into<String>, rect: CropRect) -> Self {
        Self {
            image_path: image_path.into(),
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
        }
    }

    pub fn rect(&self) -> CropRect {
        CropRect {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }
}

/// Arrow commit payload, natural pixels
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrowRequest {
    pub image_path: String,
    pub start_x: u32,
    pub start_y: u32,
    pub end_x: u32,
    pub end_y: u32,
}

impl ArrowRequest {
    pub fn new(image_path: impl Into<String>, start: PixelPoint, end: PixelPoint) -> Self {
        Self {
            image_path: image_path.into(),
            start_x: start.x,
            start_y: start.y,
            end_x: end.x,
            end_y: end.y,
        }
    }

    pub fn start(&self) -> PixelPoint {
        PixelPoint::new(self.start_x, self.start_y)
    }

    pub fn end(&self) -> PixelPoint {
        PixelPoint::new(self.end_x, self.end_y)
    }
}

/// Tag text for an image, written next to it as `<stem>.txt`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRequest {
    pub image_path: String,
    pub tag_content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arrow_points_completeness() {
        let mut points = ArrowPoints::default();
        assert!(points.is_empty());
        assert!(points.segment().is_none());

        points.start = Some(PixelPoint::new(1, 2));
        assert!(!points.is_empty());
        assert!(!points.is_complete());

        points.end = Some(PixelPoint::new(3, 4));
        assert_eq!(
            points.segment(),
            Some((PixelPoint::new(1, 2), PixelPoint::new(3, 4)))
        );
    }

    #[test]
    fn test_arrow_request_wire_shape() {
        let request = ArrowRequest::new(
            "datasets/a.png",
            PixelPoint::new(120, 80),
            PixelPoint::new(500, 900),
        );
        let json = serde_json::to_value(&request).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "image_path": "datasets/a.png",
                "start_x": 120,
                "start_y": 80,
                "end_x": 500,
                "end_y": 900
            })
        );
    }
}
