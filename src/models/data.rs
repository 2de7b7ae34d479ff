use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Field name to extracted text, one entry per template field, in template order.
pub type ExtractionResult = IndexMap<String, String>;

/// Field name to expected text, loaded per template. Keeps file order.
pub type GroundTruth = IndexMap<String, String>;

/// Axis-aligned rectangle in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl Region {
    pub fn new(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        Region { x1, y1, x2, y2 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Point { x, y }
    }
}

/// Four corner points, clockwise from top-left.
pub type Quad = [Point; 4];

/// One recognised token and the quadrilateral it was found in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub text: String,
    pub quad: Quad,
}

impl Detection {
    pub fn new(text: impl Into<String>, quad: Quad) -> Self {
        Detection {
            text: text.into(),
            quad,
        }
    }

    /// Builds a detection from an axis-aligned word box as reported by tesseract.
    pub fn from_rect(text: impl Into<String>, left: f32, top: f32, width: f32, height: f32) -> Self {
        let right = left + width;
        let bottom = top + height;
        Detection::new(
            text,
            [
                Point::new(left, top),
                Point::new(right, top),
                Point::new(right, bottom),
                Point::new(left, bottom),
            ],
        )
    }

    pub fn min_y(&self) -> f32 {
        self.quad.iter().map(|p| p.y).fold(f32::INFINITY, f32::min)
    }

    pub fn max_y(&self) -> f32 {
        self.quad.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max)
    }
}

/// Similarity of a single ground-truth field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldScore {
    pub field: String,
    pub similarity: f64,
    pub exact: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub exact_matches: usize,
    pub total_fields: usize,
    pub overall_similarity: f64,
    pub accuracy: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_from_rect_corners() {
        let detection = Detection::from_rect("Total", 10.0, 20.0, 30.0, 8.0);
        assert_eq!(detection.quad[0], Point::new(10.0, 20.0));
        assert_eq!(detection.quad[1], Point::new(40.0, 20.0));
        assert_eq!(detection.quad[2], Point::new(40.0, 28.0));
        assert_eq!(detection.quad[3], Point::new(10.0, 28.0));
        assert_eq!(detection.min_y(), 20.0);
        assert_eq!(detection.max_y(), 28.0);
    }

    #[test]
    fn test_score_report_serializes_four_fields() {
        let report = ScoreReport {
            exact_matches: 1,
            total_fields: 2,
            overall_similarity: 0.5,
            accuracy: 0.5,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["exact_matches"], 1);
        assert_eq!(json["total_fields"], 2);
        assert_eq!(json["overall_similarity"], 0.5);
        assert_eq!(json["accuracy"], 0.5);
    }
}
