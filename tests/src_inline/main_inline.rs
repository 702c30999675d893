use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::model::policy::NegativeIouPolicy;

static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn make_temp_dir() -> PathBuf {
    let mut dir = std::env::temp_dir();
    let id = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    dir.push(format!("kira_activityeval_main_{}_{}", std::process::id(), id));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_fixture(dir: &Path) -> (PathBuf, PathBuf) {
    let gt = dir.join("gt.json");
    let dets = dir.join("dets.json");
    fs::write(
        &gt,
        r#"{"stir": [{"time": [0.0, 10.0]}], "pour water": [{"time": [20.0, 30.0]}], "idle": []}"#,
    )
    .unwrap();
    fs::write(
        &dets,
        r#"{"stir": [{"time": [5.0, 15.0], "conf": 0.8}], "pour water": [], "idle": []}"#,
    )
    .unwrap();
    (gt, dets)
}

fn score_args(cli: Cli) -> ScoreArgs {
    match cli.command {
        Command::Score(args) => args,
        other => panic!("expected score, got {other:?}"),
    }
}

#[test]
fn test_parse_score_defaults() {
    let cli = Cli::try_parse_from([
        "kira-activityeval",
        "score",
        "--gt",
        "gt.json",
        "--dets",
        "dets.json",
        "--out",
        "out",
    ])
    .unwrap();
    assert!(!cli.log.verbose);
    let args = score_args(cli);
    assert_eq!(args.tie_break, TieBreakArg::First);
    assert!(!args.clamp_negative);
    let config = scoring_config(&args);
    assert_eq!(config.tie_break, TieBreakPolicy::FirstInOrder);
    assert_eq!(config.negative_iou, NegativeIouPolicy::Propagate);
}

#[test]
fn test_parse_score_policies() {
    let cli = Cli::try_parse_from([
        "kira-activityeval",
        "score",
        "--gt",
        "gt.json",
        "--dets",
        "dets.json",
        "--out",
        "out",
        "--tie-break",
        "highest-iou",
        "--clamp-negative",
        "-v",
    ])
    .unwrap();
    assert!(cli.log.verbose);
    let config = scoring_config(&score_args(cli));
    assert_eq!(config.tie_break, TieBreakPolicy::HighestIou);
    assert_eq!(config.negative_iou, NegativeIouPolicy::ClampToZero);
}

#[test]
fn test_labels_and_labels_file_conflict() {
    let res = Cli::try_parse_from([
        "kira-activityeval",
        "score",
        "--gt",
        "gt.json",
        "--dets",
        "dets.json",
        "--out",
        "out",
        "--labels",
        "stir",
        "--labels-file",
        "labels.txt",
    ]);
    assert!(res.is_err());
}

#[test]
fn test_parse_plot_highlight() {
    let cli = Cli::try_parse_from([
        "kira-activityeval",
        "plot",
        "--gt",
        "gt.json",
        "--dets",
        "dets.json",
        "--label",
        "pour water",
        "--out",
        "out",
        "--highlight",
        "2.5:4",
    ])
    .unwrap();
    let Command::Plot(args) = cli.command else {
        panic!("expected plot");
    };
    assert_eq!(args.highlight, Some(TimeInterval::new(2.5, 4.0)));
    assert_eq!(args.highlight_color, "red");
}

#[test]
fn test_parse_span_errors() {
    assert!(parse_span("3").is_err());
    assert!(parse_span("a:4").is_err());
    assert!(parse_span("1:b").is_err());
    assert_eq!(parse_span(" 1 : 2 ").unwrap(), TimeInterval::new(1.0, 2.0));
}

#[test]
fn test_run_score_end_to_end() {
    let dir = make_temp_dir();
    let (gt, dets) = write_fixture(&dir);
    let out = dir.join("out");
    let args = ScoreArgs {
        input: InputArgs {
            ground_truth: gt,
            detections: dets,
        },
        out: out.clone(),
        labels: None,
        labels_file: None,
        tie_break: TieBreakArg::First,
        clamp_negative: false,
        plots: true,
    };

    let result = run_score(&args).unwrap();
    // labels sorted: idle, pour water, stir
    assert_eq!(result.per_label.len(), 3);
    assert_eq!(result.per_label[0].label, "idle");
    let expected = (0.0 + 0.0 + 1.0 / 3.0) / 3.0;
    assert!((result.overall_iou - expected).abs() < 1e-12);

    assert!(out.join("summary.json").exists());
    assert!(out.join("report.txt").exists());
    assert!(out.join("plots/activities/stir.png").exists());
    assert!(out.join("plots/activities/pour_water.png").exists());
    // nothing to draw for "idle"
    assert!(!out.join("plots/activities/idle.png").exists());
}

#[test]
fn test_run_score_missing_label() {
    let dir = make_temp_dir();
    let (gt, dets) = write_fixture(&dir);
    let args = ScoreArgs {
        input: InputArgs {
            ground_truth: gt,
            detections: dets,
        },
        out: dir.join("out"),
        labels: Some("stir,wipe".to_string()),
        labels_file: None,
        tie_break: TieBreakArg::First,
        clamp_negative: false,
        plots: false,
    };
    let err = run_score(&args).unwrap_err();
    assert!(err.contains("wipe"));
    assert!(!dir.join("out/summary.json").exists());
}

#[test]
fn test_run_plot_with_highlight() {
    let dir = make_temp_dir();
    let (gt, dets) = write_fixture(&dir);
    let args = PlotArgs {
        input: InputArgs {
            ground_truth: gt,
            detections: dets,
        },
        label: "stir".to_string(),
        out: dir.join("plots_out"),
        highlight: Some(TimeInterval::new(2.0, 4.0)),
        highlight_color: "#ff8800".to_string(),
    };
    let path = run_plot(&args).unwrap();
    assert_eq!(path, dir.join("plots_out/plots/activities/stir.png"));
    assert!(path.exists());

    let bad = PlotArgs {
        highlight_color: "not-a-color".to_string(),
        ..args
    };
    assert!(run_plot(&bad).is_err());
}

#[test]
fn test_run_plot_empty_label_is_fatal() {
    let dir = make_temp_dir();
    let (gt, dets) = write_fixture(&dir);
    let args = PlotArgs {
        input: InputArgs {
            ground_truth: gt,
            detections: dets,
        },
        label: "idle".to_string(),
        out: dir.join("plots_out"),
        highlight: None,
        highlight_color: DEFAULT_HIGHLIGHT_COLOR.to_string(),
    };
    let err = run_plot(&args).unwrap_err();
    assert!(err.contains("idle"));
    assert!(!dir.join("plots_out/plots/activities/idle.png").exists());
}
