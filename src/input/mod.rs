use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

pub mod labels;
pub mod reader;

use labels::{parse_label_list, parse_labels_file};
use reader::open_maybe_gz;

use crate::scoring::{DetectionsByLabel, GroundTruthByLabel};

#[derive(Debug, Error)]
pub enum InputError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSource {
    CommandLine,
    File,
    GroundTruthKeys,
}

#[derive(Debug, Clone)]
pub struct EvalInputs {
    pub labels: Vec<String>,
    pub label_source: LabelSource,
    pub ground_truth: GroundTruthByLabel,
    pub detections: DetectionsByLabel,
}

fn read_json_mapping<T: DeserializeOwned>(
    path: &Path,
) -> Result<HashMap<String, Vec<T>>, InputError> {
    let reader = open_maybe_gz(path)?;
    serde_json::from_reader(reader).map_err(|source| InputError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_ground_truth(path: &Path) -> Result<GroundTruthByLabel, InputError> {
    read_json_mapping(path)
}

pub fn load_detections(path: &Path) -> Result<DetectionsByLabel, InputError> {
    read_json_mapping(path)
}

/// Explicit list wins over a labels file; with neither, every ground-truth
/// label is scored in sorted order.
pub fn resolve_labels(
    label_list: Option<&str>,
    labels_file: Option<&Path>,
    ground_truth: &GroundTruthByLabel,
) -> Result<(Vec<String>, LabelSource), InputError> {
    if let Some(raw) = label_list {
        let labels = parse_label_list(raw);
        if labels.is_empty() {
            return Err(InputError::InvalidInput(
                "--labels did not name any label".to_string(),
            ));
        }
        return Ok((labels, LabelSource::CommandLine));
    }
    if let Some(path) = labels_file {
        return Ok((parse_labels_file(path)?, LabelSource::File));
    }
    let mut labels: Vec<String> = ground_truth.keys().cloned().collect();
    labels.sort();
    Ok((labels, LabelSource::GroundTruthKeys))
}

pub fn load_inputs(
    gt_path: &Path,
    dets_path: &Path,
    label_list: Option<&str>,
    labels_file: Option<&Path>,
) -> Result<EvalInputs, InputError> {
    let ground_truth = load_ground_truth(gt_path)?;
    let detections = load_detections(dets_path)?;
    let (labels, label_source) = resolve_labels(label_list, labels_file, &ground_truth)?;

    tracing::info!(
        gt = %gt_path.display(),
        dets = %dets_path.display(),
        n_labels = labels.len(),
        ?label_source,
        "loaded evaluation inputs"
    );

    Ok(EvalInputs {
        labels,
        label_source,
        ground_truth,
        detections,
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/tests.rs"]
mod tests;
