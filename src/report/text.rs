use crate::model::policy::{NegativeIouPolicy, ScoringConfig, TieBreakPolicy};
use crate::model::scores::ScoreResult;
use crate::report::format_f64_6;

pub fn render_report_text(result: &ScoreResult, config: &ScoringConfig) -> String {
    let mut out = String::new();

    out.push_str("Activity Detection IoU Report\n");
    out.push_str("=============================\n\n");

    out.push_str("1. Scoring setup\n");
    out.push_str(&format!(
        "Multiple overlaps resolved by: {}\n",
        tie_break_label(config.tie_break)
    ));
    out.push_str(&format!(
        "Negative IoU: {}\n\n",
        negative_iou_label(config.negative_iou)
    ));

    out.push_str("2. Overall\n");
    out.push_str(&format!("Labels scored: {}\n", result.per_label.len()));
    out.push_str(&format!("IoU: {}\n\n", format_f64_6(result.overall_iou)));

    out.push_str("3. Per label\n");
    let width = result
        .per_label
        .iter()
        .map(|s| s.label.len())
        .max()
        .unwrap_or(0)
        .max("label".len());
    out.push_str(&format!(
        "{:<width$}  {:>9}  {:>10}  {:>10}  {:>9}\n",
        "label", "iou", "detections", "insertions", "ambiguous"
    ));
    for s in &result.per_label {
        out.push_str(&format!(
            "{:<width$}  {:>9}  {:>10}  {:>10}  {:>9}\n",
            s.label,
            format_f64_6(s.iou),
            s.n_detections,
            s.n_insertions,
            s.n_ambiguous
        ));
    }

    let ambiguous: usize = result.per_label.iter().map(|s| s.n_ambiguous).sum();
    let silent: Vec<&str> = result
        .per_label
        .iter()
        .filter(|s| s.n_detections == 0)
        .map(|s| s.label.as_str())
        .collect();
    if ambiguous > 0 || !silent.is_empty() {
        out.push_str("\n4. Caveats\n");
    }
    if ambiguous > 0 {
        out.push_str(&format!(
            "{} detection(s) overlapped more than one ground truth interval.\n",
            ambiguous
        ));
    }
    if !silent.is_empty() {
        out.push_str(&format!(
            "No detections (scored 0): {}\n",
            silent.join(", ")
        ));
    }

    out
}

fn tie_break_label(policy: TieBreakPolicy) -> &'static str {
    match policy {
        TieBreakPolicy::FirstInOrder => "first ground truth in list order",
        TieBreakPolicy::HighestIou => "highest IoU candidate",
    }
}

fn negative_iou_label(policy: NegativeIouPolicy) -> &'static str {
    match policy {
        NegativeIouPolicy::Propagate => "kept as computed",
        NegativeIouPolicy::ClampToZero => "clamped to 0",
    }
}
