//! YOLOv8 output decoding and non-maximum suppression.
//!
//! The model emits one tensor of shape (1, 4 + num_classes, anchors):
//! four box rows (cx, cy, w, h in letterbox pixels) followed by per-class
//! scores. Decoding takes the per-anchor argmax, gates on the inference-time
//! confidence threshold, inverts the letterbox transform, and clamps boxes
//! to the original image bounds.

use ndarray::{Array, Axis};

use crate::detection::RawDetection;
use crate::error::DetectError;
use crate::preprocess::Letterbox;

/// Decode the raw output tensor into detections in original-image pixels.
pub fn decode_predictions(
    output: &Array<f32, ndarray::IxDyn>,
    confidence_threshold: f32,
    letterbox: &Letterbox,
    orig_width: u32,
    orig_height: u32,
) -> Result<Vec<RawDetection>, DetectError> {
    let output = output
        .view()
        .into_dimensionality::<ndarray::Ix3>()
        .map_err(|e| DetectError::Output(format!("expected a (1, rows, anchors) tensor: {e}")))?;
    let predictions = output.index_axis(Axis(0), 0);

    let rows = predictions.shape()[0];
    let anchors = predictions.shape()[1];
    if rows < 5 {
        return Err(DetectError::Output(format!(
            "output has {rows} rows, need at least 5"
        )));
    }
    let num_classes = rows - 4;

    let (max_x, max_y) = (orig_width as f32, orig_height as f32);
    let mut detections = Vec::new();

    for anchor in 0..anchors {
        let mut best_class = 0usize;
        let mut best_score = f32::NEG_INFINITY;
        for class in 0..num_classes {
            let score = predictions[[4 + class, anchor]];
            if score > best_score {
                best_score = score;
                best_class = class;
            }
        }
        if best_score <= confidence_threshold {
            continue;
        }

        let cx = predictions[[0, anchor]];
        let cy = predictions[[1, anchor]];
        let w = predictions[[2, anchor]];
        let h = predictions[[3, anchor]];

        // Letterbox space -> original pixels.
        let x1 = ((cx - w / 2.0 - letterbox.pad_x) / letterbox.scale).clamp(0.0, max_x);
        let y1 = ((cy - h / 2.0 - letterbox.pad_y) / letterbox.scale).clamp(0.0, max_y);
        let x2 = ((cx + w / 2.0 - letterbox.pad_x) / letterbox.scale).clamp(0.0, max_x);
        let y2 = ((cy + h / 2.0 - letterbox.pad_y) / letterbox.scale).clamp(0.0, max_y);
        if x2 <= x1 || y2 <= y1 {
            continue;
        }

        detections.push(RawDetection {
            class_id: best_class as i64,
            confidence: best_score,
            x1,
            y1,
            x2,
            y2,
        });
    }

    Ok(detections)
}

/// Intersection over union of two corner-format boxes.
pub fn iou(a: &RawDetection, b: &RawDetection) -> f32 {
    let inter_x1 = a.x1.max(b.x1);
    let inter_y1 = a.y1.max(b.y1);
    let inter_x2 = a.x2.min(b.x2);
    let inter_y2 = a.y2.min(b.y2);

    let inter = (inter_x2 - inter_x1).max(0.0) * (inter_y2 - inter_y1).max(0.0);
    let area_a = (a.x2 - a.x1).max(0.0) * (a.y2 - a.y1).max(0.0);
    let area_b = (b.x2 - b.x1).max(0.0) * (b.y2 - b.y1).max(0.0);
    let union = area_a + area_b - inter;

    if union <= 0.0 { 0.0 } else { inter / union }
}

/// Greedy class-wise non-maximum suppression.
pub fn non_max_suppression(
    mut detections: Vec<RawDetection>,
    iou_threshold: f32,
) -> Vec<RawDetection> {
    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<RawDetection> = Vec::new();
    while !detections.is_empty() {
        let best = detections.remove(0);
        detections.retain(|det| det.class_id != best.class_id || iou(&best, det) <= iou_threshold);
        kept.push(best);
    }
    kept
}
