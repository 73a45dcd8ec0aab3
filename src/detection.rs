//! Detection records and normalization.
//!
//! Raw engine output is wrapped into the typed [`Detection`] record at the
//! boundary; everything downstream works on that shape instead of poking at
//! tensor output again.

use serde::Serialize;

use crate::mapping::correct;

/// One decoded box exactly as emitted by the engine, uncorrected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawDetection {
    pub class_id: i64,
    pub confidence: f32,
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

/// A detection that survived threshold filtering, with the corrected label.
///
/// Invariant: `confidence` is strictly above the threshold it was filtered
/// with, and `bbox` is `[x1, y1, x2, y2]` with `x1 < x2`, `y1 < y2`.
#[derive(Debug, Clone, Serialize)]
pub struct Detection {
    pub class_id: i64,
    pub corrected_label: &'static str,
    pub confidence: f32,
    pub bbox: [f32; 4],
}

/// Filter raw detections by confidence and attach corrected labels.
///
/// Detections at or below `threshold` are discarded; confidence and box
/// coordinates are carried through unchanged. This is the bucketing-stage
/// filter and is independent of the confidence gate applied while decoding
/// model output.
pub fn normalize(raw: &[RawDetection], threshold: f32) -> Vec<Detection> {
    raw.iter()
        .filter(|det| det.confidence > threshold)
        .map(|det| Detection {
            class_id: det.class_id,
            corrected_label: correct(det.class_id),
            confidence: det.confidence,
            bbox: [det.x1, det.y1, det.x2, det.y2],
        })
        .collect()
}
