use serde::Serialize;

/// How a detection is paired when several ground-truth intervals satisfy the
/// overlap predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TieBreakPolicy {
    /// First matching ground truth in list order.
    FirstInOrder,
    /// Matching ground truth with the largest IoU; equal IoUs keep the earlier one.
    HighestIou,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NegativeIouPolicy {
    Propagate,
    ClampToZero,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoringConfig {
    pub tie_break: TieBreakPolicy,
    pub negative_iou: NegativeIouPolicy,
}

impl ScoringConfig {
    pub fn default_v1() -> Self {
        Self {
            tie_break: TieBreakPolicy::FirstInOrder,
            negative_iou: NegativeIouPolicy::Propagate,
        }
    }

    pub fn clamped_v1() -> Self {
        let mut base = Self::default_v1();
        base.negative_iou = NegativeIouPolicy::ClampToZero;
        base
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self::default_v1()
    }
}
