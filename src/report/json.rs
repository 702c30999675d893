use serde::Serialize;

use crate::model::policy::ScoringConfig;
use crate::model::scores::{LabelScore, ScoreResult};
use crate::report::ReportMeta;

#[derive(Debug, Serialize)]
struct Summary<'a> {
    tool: &'a str,
    version: &'a str,
    input: SummaryInput<'a>,
    config: &'a ScoringConfig,
    overall_iou: f64,
    n_labels: usize,
    per_label: &'a [LabelScore],
}

#[derive(Debug, Serialize)]
struct SummaryInput<'a> {
    ground_truth: &'a str,
    detections: &'a str,
    labels_from: &'a str,
}

pub fn render_summary_json(
    result: &ScoreResult,
    config: &ScoringConfig,
    meta: &ReportMeta,
) -> Result<String, serde_json::Error> {
    let summary = Summary {
        tool: &meta.tool_name,
        version: &meta.tool_version,
        input: SummaryInput {
            ground_truth: &meta.ground_truth_path,
            detections: &meta.detections_path,
            labels_from: &meta.label_source,
        },
        config,
        overall_iou: result.overall_iou,
        n_labels: result.per_label.len(),
        per_label: &result.per_label,
    };
    serde_json::to_string_pretty(&summary)
}
