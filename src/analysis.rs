//! Verdict aggregation.
//!
//! Partitions normalized detections into helmet / no-helmet buckets and
//! collapses them into one safety verdict. The Mixed case is deliberately
//! conservative: any rider without a helmet forces `is_wearing_helmet` to
//! false, no matter how confident the helmeted detections are.

use serde::Serialize;

use crate::detection::Detection;
use crate::mapping::{WITH_HELMET, WITHOUT_HELMET};

/// Overall safety conclusion for one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VerdictStatus {
    #[serde(rename = "No Detection")]
    NoDetection,
    #[serde(rename = "Wearing Helmet")]
    WearingHelmet,
    #[serde(rename = "Not Wearing Helmet")]
    NotWearingHelmet,
    #[serde(rename = "Mixed Detection")]
    Mixed,
    Unknown,
}

/// Per-bucket counts, plus per-bucket max confidence for mixed frames.
#[derive(Debug, Clone, Serialize)]
pub struct VerdictDetails {
    pub with_helmet_count: usize,
    pub without_helmet_count: usize,
    pub total_riders: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_with_helmet_confidence: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_without_helmet_confidence: Option<f32>,
}

/// Aggregated verdict; `confidence` is a percentage in [0, 100].
#[derive(Debug, Clone, Serialize)]
pub struct Verdict {
    pub status: VerdictStatus,
    pub message: String,
    pub confidence: f32,
    pub is_wearing_helmet: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<VerdictDetails>,
}

fn max_confidence(detections: &[&Detection]) -> f32 {
    detections
        .iter()
        .map(|det| det.confidence)
        .fold(0.0, f32::max)
}

/// Round a percentage to two decimals.
pub fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

/// Derive the safety verdict from normalized detections.
///
/// Only class ids 0 and 1 participate; "Unknown" detections are ignored
/// here. Rules are evaluated in fixed precedence: no detection, only-helmet,
/// only-no-helmet, mixed, then an Unknown fallback that should be
/// unreachable.
pub fn analyze(detections: &[Detection]) -> Verdict {
    let with_helmet: Vec<&Detection> = detections
        .iter()
        .filter(|det| det.class_id == WITH_HELMET)
        .collect();
    let without_helmet: Vec<&Detection> = detections
        .iter()
        .filter(|det| det.class_id == WITHOUT_HELMET)
        .collect();

    let total = with_helmet.len() + without_helmet.len();

    if total == 0 {
        Verdict {
            status: VerdictStatus::NoDetection,
            message: "No motorcycle riders detected in the image".to_string(),
            confidence: 0.0,
            is_wearing_helmet: None,
            details: None,
        }
    } else if !with_helmet.is_empty() && without_helmet.is_empty() {
        let max = max_confidence(&with_helmet);
        Verdict {
            status: VerdictStatus::WearingHelmet,
            message: format!(
                "Rider with helmet detected with {:.1}% confidence",
                max * 100.0
            ),
            confidence: max * 100.0,
            is_wearing_helmet: Some(true),
            details: Some(VerdictDetails {
                with_helmet_count: with_helmet.len(),
                without_helmet_count: 0,
                total_riders: total,
                max_with_helmet_confidence: None,
                max_without_helmet_confidence: None,
            }),
        }
    } else if !without_helmet.is_empty() && with_helmet.is_empty() {
        let max = max_confidence(&without_helmet);
        Verdict {
            status: VerdictStatus::NotWearingHelmet,
            message: format!(
                "Rider without helmet detected with {:.1}% confidence",
                max * 100.0
            ),
            confidence: max * 100.0,
            is_wearing_helmet: Some(false),
            details: Some(VerdictDetails {
                with_helmet_count: 0,
                without_helmet_count: without_helmet.len(),
                total_riders: total,
                max_with_helmet_confidence: None,
                max_without_helmet_confidence: None,
            }),
        }
    } else if !with_helmet.is_empty() && !without_helmet.is_empty() {
        let max_with = max_confidence(&with_helmet);
        let max_without = max_confidence(&without_helmet);
        Verdict {
            status: VerdictStatus::Mixed,
            message: format!(
                "Multiple riders detected: {} with helmet, {} without helmet",
                with_helmet.len(),
                without_helmet.len()
            ),
            confidence: max_with.max(max_without) * 100.0,
            // Any unhelmeted rider overrides the helmeted ones.
            is_wearing_helmet: Some(false),
            details: Some(VerdictDetails {
                with_helmet_count: with_helmet.len(),
                without_helmet_count: without_helmet.len(),
                total_riders: total,
                max_with_helmet_confidence: Some(round2(max_with * 100.0)),
                max_without_helmet_confidence: Some(round2(max_without * 100.0)),
            }),
        }
    } else {
        Verdict {
            status: VerdictStatus::Unknown,
            message: "Unable to determine helmet status".to_string(),
            confidence: 0.0,
            is_wearing_helmet: None,
            details: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(class_id: i64, confidence: f32) -> Detection {
        Detection {
            class_id,
            corrected_label: crate::mapping::correct(class_id),
            confidence,
            bbox: [0.0, 0.0, 50.0, 50.0],
        }
    }

    #[test]
    fn empty_input_yields_no_detection() {
        let verdict = analyze(&[]);
        assert_eq!(verdict.status, VerdictStatus::NoDetection);
        assert_eq!(verdict.is_wearing_helmet, None);
        assert_eq!(verdict.confidence, 0.0);
        assert!(verdict.details.is_none());
    }

    #[test]
    fn single_helmet_detection() {
        let verdict = analyze(&[det(0, 0.77)]);
        assert_eq!(verdict.status, VerdictStatus::WearingHelmet);
        assert_eq!(verdict.is_wearing_helmet, Some(true));
        assert!((verdict.confidence - 77.0).abs() < 1e-4);
    }

    #[test]
    fn single_no_helmet_detection() {
        let verdict = analyze(&[det(1, 0.76)]);
        assert_eq!(verdict.status, VerdictStatus::NotWearingHelmet);
        assert_eq!(verdict.is_wearing_helmet, Some(false));
        assert!((verdict.confidence - 76.0).abs() < 1e-4);
    }

    #[test]
    fn mixed_detections_bias_toward_risk() {
        let verdict = analyze(&[det(0, 0.9), det(1, 0.3)]);
        assert_eq!(verdict.status, VerdictStatus::Mixed);
        assert_eq!(verdict.is_wearing_helmet, Some(false));
        assert!((verdict.confidence - 90.0).abs() < 1e-4);
        let details = verdict.details.expect("mixed verdict carries details");
        assert_eq!(details.with_helmet_count, 1);
        assert_eq!(details.without_helmet_count, 1);
        assert_eq!(details.total_riders, 2);
        assert_eq!(details.max_with_helmet_confidence, Some(90.0));
        assert_eq!(details.max_without_helmet_confidence, Some(30.0));
    }

    #[test]
    fn unknown_class_ids_do_not_influence_verdict() {
        let verdict = analyze(&[det(5, 0.99)]);
        assert_eq!(verdict.status, VerdictStatus::NoDetection);

        let verdict = analyze(&[det(5, 0.99), det(0, 0.6)]);
        assert_eq!(verdict.status, VerdictStatus::WearingHelmet);
        assert!((verdict.confidence - 60.0).abs() < 1e-4);
    }

    #[test]
    fn bucket_max_wins_over_count() {
        let verdict = analyze(&[det(0, 0.4), det(0, 0.8), det(0, 0.6)]);
        assert!((verdict.confidence - 80.0).abs() < 1e-4);
        let details = verdict.details.expect("details present");
        assert_eq!(details.with_helmet_count, 3);
        assert_eq!(details.total_riders, 3);
    }

    #[test]
    fn status_serializes_to_original_strings() {
        let json = serde_json::to_value(VerdictStatus::Mixed).unwrap();
        assert_eq!(json, "Mixed Detection");
        let json = serde_json::to_value(VerdictStatus::NoDetection).unwrap();
        assert_eq!(json, "No Detection");
    }
}
