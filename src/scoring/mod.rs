use std::collections::{HashMap, HashSet};
use std::fmt;

use thiserror::Error;

use crate::model::interval::{DetectionInstance, GroundTruthInstance, TimeInterval};
use crate::model::policy::{NegativeIouPolicy, ScoringConfig, TieBreakPolicy};
use crate::model::scores::{LabelScore, ScoreResult};
use crate::tracing::{ScoreEvent, ScoreSink};

pub type GroundTruthByLabel = HashMap<String, Vec<GroundTruthInstance>>;
pub type DetectionsByLabel = HashMap<String, Vec<DetectionInstance>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mapping {
    GroundTruth,
    Detections,
}

impl fmt::Display for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mapping::GroundTruth => write!(f, "ground truth"),
            Mapping::Detections => write!(f, "detections"),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ScoringError {
    #[error("label set is empty; cannot average IoU over zero labels")]
    EmptyLabelSet,
    #[error("label {label:?} has no entry in the {mapping} mapping")]
    MissingLabel { label: String, mapping: Mapping },
    #[error(
        "label {label:?}: detection {detection_index} and ground truth {gt_index} have zero union"
    )]
    ZeroUnion {
        label: String,
        detection_index: usize,
        gt_index: usize,
    },
}

/// Outcome of pairing a single detection with the ground truth of its label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DetectionMatch {
    Insertion,
    Matched {
        gt_index: usize,
        n_candidates: usize,
        iou: f64,
    },
}

/// `g.end >= d.start && d.end >= g.end`. Deliberately not a symmetric overlap
/// test: the detection has to reach at least to the end of the ground truth.
pub fn overlaps(gt: &TimeInterval, det: &TimeInterval) -> bool {
    gt.end >= det.start && det.end >= gt.end
}

/// Unclamped; returns `None` when the union is zero.
pub fn interval_iou(gt: &TimeInterval, det: &TimeInterval) -> Option<f64> {
    let i_left = det.start.max(gt.start);
    let i_right = det.end.min(gt.end);
    let intersection = i_right - i_left;
    let union = gt.duration() + det.duration() - intersection;
    if union == 0.0 {
        return None;
    }
    Some(intersection / union)
}

/// Matched pair whose union is zero, so its IoU is undefined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZeroUnionPair {
    pub gt_index: usize,
}

pub fn match_detection(
    det: &DetectionInstance,
    ground_truth: &[GroundTruthInstance],
    policy: TieBreakPolicy,
) -> Result<DetectionMatch, ZeroUnionPair> {
    let candidates: Vec<usize> = ground_truth
        .iter()
        .enumerate()
        .filter(|(_, g)| overlaps(&g.time, &det.time))
        .map(|(i, _)| i)
        .collect();

    let Some(&first) = candidates.first() else {
        return Ok(DetectionMatch::Insertion);
    };

    let iou_for = |idx: usize| interval_iou(&ground_truth[idx].time, &det.time);

    let (gt_index, iou) = match policy {
        TieBreakPolicy::FirstInOrder => {
            let iou = iou_for(first).ok_or(ZeroUnionPair { gt_index: first })?;
            (first, iou)
        }
        // Candidates with an undefined IoU are passed over; the call only
        // fails when none of them has one.
        TieBreakPolicy::HighestIou => candidates
            .iter()
            .filter_map(|&idx| iou_for(idx).map(|iou| (idx, iou)))
            .fold(None, |best: Option<(usize, f64)>, (idx, iou)| match best {
                Some((_, best_iou)) if best_iou >= iou => best,
                _ => Some((idx, iou)),
            })
            .ok_or(ZeroUnionPair { gt_index: first })?,
    };

    Ok(DetectionMatch::Matched {
        gt_index,
        n_candidates: candidates.len(),
        iou,
    })
}

pub fn compute_iou_per_label(
    labels: &[String],
    ground_truth: &GroundTruthByLabel,
    detections: &DetectionsByLabel,
    config: &ScoringConfig,
    sink: &mut dyn ScoreSink,
) -> Result<ScoreResult, ScoringError> {
    if labels.is_empty() {
        return Err(ScoringError::EmptyLabelSet);
    }

    let mut seen = HashSet::with_capacity(labels.len());
    let mut unique: Vec<&String> = Vec::with_capacity(labels.len());
    for label in labels {
        if seen.insert(label.as_str()) {
            unique.push(label);
        }
    }

    let mut inputs = Vec::with_capacity(unique.len());
    for label in &unique {
        let gt = ground_truth
            .get(label.as_str())
            .ok_or_else(|| ScoringError::MissingLabel {
                label: label.to_string(),
                mapping: Mapping::GroundTruth,
            })?;
        let dets = detections
            .get(label.as_str())
            .ok_or_else(|| ScoringError::MissingLabel {
                label: label.to_string(),
                mapping: Mapping::Detections,
            })?;
        inputs.push((label.as_str(), gt.as_slice(), dets.as_slice()));
    }

    let mut per_label = Vec::with_capacity(inputs.len());
    let mut ambiguous: Vec<(&str, usize, usize, usize)> = Vec::new();
    for (label, gt, dets) in inputs {
        let mut ious = Vec::with_capacity(dets.len());
        let mut n_insertions = 0usize;
        let mut n_ambiguous = 0usize;

        for (det_idx, det) in dets.iter().enumerate() {
            let outcome = match_detection(det, gt, config.tie_break).map_err(|pair| {
                ScoringError::ZeroUnion {
                    label: label.to_string(),
                    detection_index: det_idx,
                    gt_index: pair.gt_index,
                }
            })?;
            let iou = match outcome {
                DetectionMatch::Insertion => {
                    n_insertions += 1;
                    0.0
                }
                DetectionMatch::Matched {
                    gt_index,
                    n_candidates,
                    iou,
                } => {
                    if n_candidates > 1 {
                        n_ambiguous += 1;
                        ambiguous.push((label, det_idx, n_candidates, gt_index));
                    }
                    iou
                }
            };
            let iou = match config.negative_iou {
                NegativeIouPolicy::ClampToZero if iou < 0.0 => 0.0,
                _ => iou,
            };
            ious.push(iou);
        }

        let label_iou = if ious.is_empty() {
            0.0
        } else {
            ious.iter().sum::<f64>() / ious.len() as f64
        };

        per_label.push(LabelScore {
            label: label.to_string(),
            iou: label_iou,
            n_detections: dets.len(),
            n_insertions,
            n_ambiguous,
        });
    }

    let overall_iou = per_label.iter().map(|s| s.iou).sum::<f64>() / per_label.len() as f64;

    for (label, detection_index, n_matches, chosen_gt_index) in ambiguous {
        sink.emit(ScoreEvent::AmbiguousMatch {
            label,
            detection_index,
            n_matches,
            chosen_gt_index,
        });
    }
    sink.emit(ScoreEvent::Overall { iou: overall_iou });
    for score in &per_label {
        sink.emit(ScoreEvent::Label {
            label: &score.label,
            iou: score.iou,
        });
    }

    Ok(ScoreResult {
        overall_iou,
        per_label,
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/scoring/tests.rs"]
mod tests;
