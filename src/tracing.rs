use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Picks the filter directive: an explicit flag level, then `RUST_LOG`, then `info`.
pub fn filter_directive(flag_level: Option<&str>, env: Option<&str>) -> String {
    flag_level
        .or_else(|| env.map(str::trim).filter(|e| !e.is_empty()))
        .unwrap_or(DEFAULT_LOG_LEVEL)
        .to_string()
}

/// Installs the process-wide subscriber. `flag_level` comes from `-v`/`-q`.
pub fn init_logging(flag_level: Option<&str>, format: LogFormat) -> Result<(), String> {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directive = filter_directive(flag_level, env.as_deref());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|e| {
        eprintln!("[WARN] invalid log filter {directive:?} ({e}); using {DEFAULT_LOG_LEVEL}");
        EnvFilter::new(DEFAULT_LOG_LEVEL)
    });
    let builder = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    let res = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    res.map_err(|e| format!("failed to initialize logging: {e}"))
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScoreEvent<'a> {
    Overall {
        iou: f64,
    },
    Label {
        label: &'a str,
        iou: f64,
    },
    AmbiguousMatch {
        label: &'a str,
        detection_index: usize,
        n_matches: usize,
        chosen_gt_index: usize,
    },
}

/// Receives what the scoring engine has to report. Injected so scoring never
/// touches the global subscriber directly.
pub trait ScoreSink {
    fn emit(&mut self, event: ScoreEvent<'_>);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ScoreSink for TracingSink {
    fn emit(&mut self, event: ScoreEvent<'_>) {
        match event {
            ScoreEvent::Overall { iou } => tracing::info!(iou, "IoU: {iou}"),
            ScoreEvent::Label { label, iou } => tracing::info!(label, iou, "\t{label}: {iou}"),
            ScoreEvent::AmbiguousMatch {
                label,
                detection_index,
                n_matches,
                chosen_gt_index,
            } => tracing::warn!(
                label,
                detection_index,
                n_matches,
                chosen_gt_index,
                "found more than one overlapping ground truth"
            ),
        }
    }
}

#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedEvent {
    Overall(f64),
    Label(String, f64),
    AmbiguousMatch {
        label: String,
        detection_index: usize,
        n_matches: usize,
        chosen_gt_index: usize,
    },
}

#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub events: Vec<RecordedEvent>,
}

#[cfg(test)]
impl RecordingSink {
    pub fn warnings(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, RecordedEvent::AmbiguousMatch { .. }))
            .count()
    }
}

#[cfg(test)]
impl ScoreSink for RecordingSink {
    fn emit(&mut self, event: ScoreEvent<'_>) {
        let recorded = match event {
            ScoreEvent::Overall { iou } => RecordedEvent::Overall(iou),
            ScoreEvent::Label { label, iou } => RecordedEvent::Label(label.to_string(), iou),
            ScoreEvent::AmbiguousMatch {
                label,
                detection_index,
                n_matches,
                chosen_gt_index,
            } => RecordedEvent::AmbiguousMatch {
                label: label.to_string(),
                detection_index,
                n_matches,
                chosen_gt_index,
            },
        };
        self.events.push(recorded);
    }
}

#[cfg(test)]
#[path = "../tests/src_inline/tracing.rs"]
mod tests;
