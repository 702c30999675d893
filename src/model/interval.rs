use serde::{Deserialize, Serialize};

/// Closed time span in seconds. `start <= end` is assumed, not checked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct TimeInterval {
    pub start: f64,
    pub end: f64,
}

impl TimeInterval {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

impl From<[f64; 2]> for TimeInterval {
    fn from(value: [f64; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

impl From<TimeInterval> for [f64; 2] {
    fn from(value: TimeInterval) -> Self {
        [value.start, value.end]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundTruthInstance {
    pub time: TimeInterval,
}

#[cfg(test)]
impl GroundTruthInstance {
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            time: TimeInterval::new(start, end),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionInstance {
    pub time: TimeInterval,
    #[serde(rename = "conf")]
    pub confidence: f64,
}

#[cfg(test)]
impl DetectionInstance {
    pub fn new(start: f64, end: f64, confidence: f64) -> Self {
        Self {
            time: TimeInterval::new(start, end),
            confidence,
        }
    }
}
