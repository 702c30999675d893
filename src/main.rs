mod input;
mod model;
mod plot;
mod report;
mod scoring;
mod tracing;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::input::{LabelSource, load_detections, load_ground_truth, load_inputs};
use crate::model::interval::TimeInterval;
use crate::model::policy::{ScoringConfig, TieBreakPolicy};
use crate::model::scores::ScoreResult;
use crate::plot::{DEFAULT_HIGHLIGHT_COLOR, Highlight, PlotError, plot_activity_confidence};
use crate::report::{ReportMeta, write_reports};
use crate::scoring::{DetectionsByLabel, GroundTruthByLabel, compute_iou_per_label};
use crate::tracing::{LogFormat, TracingSink, init_logging};

#[derive(Debug, Parser)]
#[command(
    name = "kira-activityeval",
    version,
    about = "IoU scoring of temporal activity detections against ground truth"
)]
struct Cli {
    #[command(flatten)]
    log: LogArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct LogArgs {
    /// Debug-level logging; overrides RUST_LOG
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Only warnings and errors; overrides RUST_LOG
    #[arg(short, long, global = true)]
    quiet: bool,
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Score detections per label and write summary.json and report.txt
    Score(ScoreArgs),
    /// Render the confidence-over-time plot for one label
    Plot(PlotArgs),
}

#[derive(Debug, Args)]
struct InputArgs {
    /// Ground-truth JSON (label -> [{"time": [start, end]}]), optionally .gz
    #[arg(long = "gt")]
    ground_truth: PathBuf,
    /// Detections JSON (label -> [{"time": [start, end], "conf": c}]), optionally .gz
    #[arg(long = "dets")]
    detections: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TieBreakArg {
    First,
    HighestIou,
}

#[derive(Debug, Args)]
struct ScoreArgs {
    #[command(flatten)]
    input: InputArgs,
    #[arg(long)]
    out: PathBuf,
    /// Comma-separated labels to score
    #[arg(long)]
    labels: Option<String>,
    /// File with one label per line
    #[arg(long, conflicts_with = "labels")]
    labels_file: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = TieBreakArg::First)]
    tie_break: TieBreakArg,
    /// Replace negative per-detection IoUs with 0
    #[arg(long)]
    clamp_negative: bool,
    /// Also render a plot per scored label
    #[arg(long)]
    plots: bool,
}

#[derive(Debug, Args)]
struct PlotArgs {
    #[command(flatten)]
    input: InputArgs,
    #[arg(long)]
    label: String,
    #[arg(long)]
    out: PathBuf,
    /// Extra span to highlight, as START:END in seconds
    #[arg(long, value_parser = parse_span)]
    highlight: Option<TimeInterval>,
    #[arg(long, default_value = DEFAULT_HIGHLIGHT_COLOR)]
    highlight_color: String,
}

fn main() {
    if let Err(err) = run(Cli::parse()) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let level = if cli.log.verbose {
        Some("debug")
    } else if cli.log.quiet {
        Some("warn")
    } else {
        None
    };
    let format = if cli.log.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    init_logging(level, format)?;

    match cli.command {
        Command::Score(args) => run_score(&args).map(|_| ()),
        Command::Plot(args) => run_plot(&args).map(|_| ()),
    }
}

fn parse_span(raw: &str) -> Result<TimeInterval, String> {
    let (start, end) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected START:END, got {raw:?}"))?;
    let start: f64 = start
        .trim()
        .parse()
        .map_err(|_| format!("invalid span start: {start:?}"))?;
    let end: f64 = end
        .trim()
        .parse()
        .map_err(|_| format!("invalid span end: {end:?}"))?;
    Ok(TimeInterval::new(start, end))
}

fn scoring_config(args: &ScoreArgs) -> ScoringConfig {
    let mut config = if args.clamp_negative {
        ScoringConfig::clamped_v1()
    } else {
        ScoringConfig::default_v1()
    };
    config.tie_break = match args.tie_break {
        TieBreakArg::First => TieBreakPolicy::FirstInOrder,
        TieBreakArg::HighestIou => TieBreakPolicy::HighestIou,
    };
    config
}

fn label_source_name(source: LabelSource) -> &'static str {
    match source {
        LabelSource::CommandLine => "command-line",
        LabelSource::File => "labels-file",
        LabelSource::GroundTruthKeys => "ground-truth-keys",
    }
}

fn run_score(args: &ScoreArgs) -> Result<ScoreResult, String> {
    let inputs = load_inputs(
        &args.input.ground_truth,
        &args.input.detections,
        args.labels.as_deref(),
        args.labels_file.as_deref(),
    )
    .map_err(|e| e.to_string())?;

    let config = scoring_config(args);
    let mut sink = TracingSink;
    let result = compute_iou_per_label(
        &inputs.labels,
        &inputs.ground_truth,
        &inputs.detections,
        &config,
        &mut sink,
    )
    .map_err(|e| e.to_string())?;

    let meta = ReportMeta {
        tool_name: "kira-activityeval".to_string(),
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
        ground_truth_path: args.input.ground_truth.display().to_string(),
        detections_path: args.input.detections.display().to_string(),
        label_source: label_source_name(inputs.label_source).to_string(),
    };
    let paths =
        write_reports(&result, &config, &meta, &args.out).map_err(|e| e.to_string())?;
    ::tracing::info!(
        summary = %paths.summary_json.display(),
        report = %paths.report_txt.display(),
        "wrote reports"
    );

    if args.plots {
        plot_all(&result, &inputs.ground_truth, &inputs.detections, &args.out)?;
    }

    Ok(result)
}

fn plot_all(
    result: &ScoreResult,
    ground_truth: &GroundTruthByLabel,
    detections: &DetectionsByLabel,
    out_dir: &Path,
) -> Result<(), String> {
    for score in &result.per_label {
        let gt = ground_truth
            .get(&score.label)
            .map(Vec::as_slice)
            .unwrap_or_default();
        match plot_activity_confidence(&score.label, gt, detections, out_dir, None) {
            Ok(_) => {}
            Err(PlotError::EmptyRange(label)) => {
                ::tracing::warn!(label = %label, "no intervals to plot; skipping");
            }
            Err(e) => return Err(e.to_string()),
        }
    }
    Ok(())
}

fn run_plot(args: &PlotArgs) -> Result<PathBuf, String> {
    let ground_truth = load_ground_truth(&args.input.ground_truth).map_err(|e| e.to_string())?;
    let detections = load_detections(&args.input.detections).map_err(|e| e.to_string())?;
    let gt = ground_truth
        .get(&args.label)
        .ok_or_else(|| format!("label {:?} has no entry in the ground truth", args.label))?;

    let highlight = args
        .highlight
        .map(|span| Highlight::new(span, &args.highlight_color))
        .transpose()
        .map_err(|e| e.to_string())?;

    plot_activity_confidence(
        &args.label,
        gt,
        &detections,
        &args.out,
        highlight.as_ref(),
    )
    .map_err(|e| e.to_string())
}

#[cfg(test)]
#[path = "../tests/src_inline/main_inline.rs"]
mod tests;
