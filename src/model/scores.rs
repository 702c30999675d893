use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelScore {
    pub label: String,
    pub iou: f64,
    pub n_detections: usize,
    pub n_insertions: usize,
    pub n_ambiguous: usize,
}

/// Per-label IoU in label order plus the unweighted mean across labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    pub overall_iou: f64,
    pub per_label: Vec<LabelScore>,
}

#[cfg(test)]
impl ScoreResult {
    pub fn label_iou(&self, label: &str) -> Option<f64> {
        self.per_label
            .iter()
            .find(|s| s.label == label)
            .map(|s| s.iou)
    }

    pub fn iou_by_label(&self) -> std::collections::BTreeMap<&str, f64> {
        self.per_label
            .iter()
            .map(|s| (s.label.as_str(), s.iou))
            .collect()
    }
}
