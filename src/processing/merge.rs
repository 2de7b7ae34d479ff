// Groups box-aware OCR detections into visual lines

use crate::models::{Detection, Quad};

/// Maximum pixel difference between the top edges (and between the bottom
/// edges) of two boxes that still sit on the same line. Exclusive.
pub const DEFAULT_LINE_THRESHOLD: f32 = 5.0;

/// Whether two boxes share the same y-level within `threshold` pixels.
pub fn share_same_y(a: &Quad, b: &Quad, threshold: f32) -> bool {
    let (a_min, a_max) = y_span(a);
    let (b_min, b_max) = y_span(b);
    (a_min - b_min).abs() < threshold && (a_max - b_max).abs() < threshold
}

fn y_span(quad: &Quad) -> (f32, f32) {
    quad.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), p| {
        (lo.min(p.y), hi.max(p.y))
    })
}

/// One visual line under construction.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedGroup {
    /// Token texts in the order they were attached.
    pub texts: Vec<String>,
    /// Box of the detection that opened the group; membership is always tested against it.
    pub anchor: Quad,
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl MergedGroup {
    fn open(detection: &Detection) -> Self {
        let (top, bottom) = y_span(&detection.quad);
        MergedGroup {
            texts: vec![detection.text.clone()],
            anchor: detection.quad,
            left: detection.quad[0].x,
            right: detection.quad[1].x,
            top,
            bottom,
        }
    }

    fn attach(&mut self, detection: &Detection) {
        self.texts.push(detection.text.clone());
        self.right = detection.quad[1].x;
    }

    pub fn text(&self) -> String {
        self.texts.join(" ")
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TokenMerger {
    threshold: f32,
}

impl Default for TokenMerger {
    fn default() -> Self {
        TokenMerger::new(DEFAULT_LINE_THRESHOLD)
    }
}

impl TokenMerger {
    pub fn new(threshold: f32) -> Self {
        TokenMerger { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Assigns each detection, in arrival order, to the first group whose
    /// anchor box is on the same line, opening a new group otherwise.
    ///
    /// First match wins: when two groups both qualify the older one takes the
    /// detection, regardless of which is geometrically closer. Tokens inside a
    /// group keep arrival order and are not re-sorted by x.
    pub fn group(&self, detections: &[Detection]) -> Vec<MergedGroup> {
        let mut groups: Vec<MergedGroup> = Vec::new();
        for detection in detections {
            match groups
                .iter_mut()
                .find(|g| share_same_y(&g.anchor, &detection.quad, self.threshold))
            {
                Some(group) => group.attach(detection),
                None => groups.push(MergedGroup::open(detection)),
            }
        }
        groups
    }

    /// One string per visual line, in group-creation order.
    pub fn merge(&self, detections: &[Detection]) -> Vec<String> {
        self.group(detections).iter().map(MergedGroup::text).collect()
    }

    /// The final field value: every line joined by a single space.
    pub fn merge_to_text(&self, detections: &[Detection]) -> String {
        self.merge(detections).join(" ")
    }
}
