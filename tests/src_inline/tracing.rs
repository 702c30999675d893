use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};

use super::*;
use crate::model::interval::{DetectionInstance, GroundTruthInstance};
use crate::model::policy::ScoringConfig;
use crate::scoring::{DetectionsByLabel, GroundTruthByLabel, compute_iou_per_label};

#[derive(Debug, Clone, Default)]
struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl CapturedLog {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl io::Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn score_with_tracing(g: &GroundTruthByLabel, d: &DetectionsByLabel, names: &[&str]) -> String {
    let log = CapturedLog::default();
    let writer = log.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_target(false)
        .finish();
    let labels: Vec<String> = names.iter().map(|s| s.to_string()).collect();
    ::tracing::subscriber::with_default(subscriber, || {
        compute_iou_per_label(
            &labels,
            g,
            d,
            &ScoringConfig::default_v1(),
            &mut TracingSink,
        )
        .unwrap();
    });
    log.contents()
}

#[test]
fn test_flag_level_overrides_env() {
    assert_eq!(filter_directive(Some("debug"), Some("error")), "debug");
    assert_eq!(filter_directive(Some("warn"), Some("trace")), "warn");
}

#[test]
fn test_env_used_without_flag() {
    assert_eq!(filter_directive(None, Some("kira_activityeval=trace")), "kira_activityeval=trace");
}

#[test]
fn test_default_level_without_flag_or_env() {
    assert_eq!(filter_directive(None, None), DEFAULT_LOG_LEVEL);
    assert_eq!(filter_directive(None, Some("  ")), DEFAULT_LOG_LEVEL);
}

#[test]
fn test_tracing_sink_logs_overall_then_each_label() {
    let mut g = HashMap::new();
    g.insert("stir".to_string(), vec![GroundTruthInstance::new(0.0, 10.0)]);
    g.insert("pour water".to_string(), vec![GroundTruthInstance::new(20.0, 30.0)]);
    let mut d = HashMap::new();
    d.insert("stir".to_string(), vec![DetectionInstance::new(0.0, 10.0, 0.9)]);
    d.insert("pour water".to_string(), Vec::new());

    let out = score_with_tracing(&g, &d, &["stir", "pour water"]);

    let overall = out.find("IoU: 0.5").expect("overall line missing");
    let stir = out.find("stir: 1").expect("stir line missing");
    let pour = out.find("pour water: 0").expect("pour water line missing");
    assert!(overall < stir && stir < pour);
    assert_eq!(out.matches(" INFO ").count(), 3);
}

#[test]
fn test_tracing_sink_warns_on_ambiguous_match() {
    let mut g = HashMap::new();
    g.insert(
        "stir".to_string(),
        vec![
            GroundTruthInstance::new(0.0, 4.0),
            GroundTruthInstance::new(2.0, 8.0),
        ],
    );
    let mut d = HashMap::new();
    d.insert("stir".to_string(), vec![DetectionInstance::new(1.0, 10.0, 0.7)]);

    let out = score_with_tracing(&g, &d, &["stir"]);

    let warn = out
        .lines()
        .find(|l| l.contains("WARN"))
        .expect("warning line missing");
    assert!(warn.contains("found more than one overlapping ground truth"));
    assert!(warn.contains("n_matches=2"));
}
