use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod json;
pub mod text;

use json::render_summary_json;
use text::render_report_text;

use crate::model::policy::ScoringConfig;
use crate::model::scores::ScoreResult;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize summary: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct ReportMeta {
    pub tool_name: String,
    pub tool_version: String,
    pub ground_truth_path: String,
    pub detections_path: String,
    pub label_source: String,
}

#[derive(Debug, Clone)]
pub struct ReportPaths {
    pub summary_json: PathBuf,
    pub report_txt: PathBuf,
}

pub fn format_f64_6(v: f64) -> String {
    format!("{:.6}", v)
}

pub fn write_reports(
    result: &ScoreResult,
    config: &ScoringConfig,
    meta: &ReportMeta,
    out_dir: &Path,
) -> Result<ReportPaths, ReportError> {
    fs::create_dir_all(out_dir).map_err(|source| ReportError::Io {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let summary_json = out_dir.join("summary.json");
    let json = render_summary_json(result, config, meta)?;
    write_text(&summary_json, &json)?;

    let report_txt = out_dir.join("report.txt");
    write_text(&report_txt, &render_report_text(result, config))?;

    Ok(ReportPaths {
        summary_json,
        report_txt,
    })
}

fn write_text(path: &Path, contents: &str) -> Result<(), ReportError> {
    let io_err = |source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut w = BufWriter::new(File::create(path).map_err(io_err)?);
    w.write_all(contents.as_bytes()).map_err(io_err)?;
    w.flush().map_err(io_err)?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/mod.rs"]
mod tests;
