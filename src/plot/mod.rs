use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use thiserror::Error;

use crate::model::interval::{DetectionInstance, GroundTruthInstance, TimeInterval};
use crate::scoring::DetectionsByLabel;

pub const PLOT_WIDTH: u32 = 1400;
pub const PLOT_HEIGHT: u32 = 600;
const MARGIN_LEFT: u32 = 80;
const MARGIN_RIGHT: u32 = 30;
const MARGIN_TOP: u32 = 40;
const MARGIN_BOTTOM: u32 = 60;

const Y_MAX: f64 = 1.05;
const X_PAD_FRACTION: f64 = 0.05;
const GT_HEIGHT: f64 = 1.0;
const HIGHLIGHT_HEIGHT: f64 = 1.025;
const HIGHLIGHT_ALPHA: f32 = 0.5;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
pub const GT_COLOR: Rgb<u8> = Rgb([144, 238, 144]);
pub const DETECTION_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
pub const DEFAULT_HIGHLIGHT_COLOR: &str = "red";

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("label {0:?} has no entry in the detections mapping")]
    MissingLabel(String),
    #[error("nothing to plot for label {0:?}: no ground truth and no detections")]
    EmptyRange(String),
    #[error("unknown color {0:?}")]
    InvalidColor(String),
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Extra span drawn over the ground truth, e.g. a segment under review.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Highlight {
    pub interval: TimeInterval,
    pub color: Rgb<u8>,
}

impl Highlight {
    pub fn new(interval: TimeInterval, color: &str) -> Result<Self, PlotError> {
        Ok(Self {
            interval,
            color: parse_color(color)?,
        })
    }
}

pub fn parse_color(name: &str) -> Result<Rgb<u8>, PlotError> {
    let lower = name.trim().to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix('#') {
        if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
            if let (Ok(r), Ok(g), Ok(b)) = (channel(0), channel(2), channel(4)) {
                return Ok(Rgb([r, g, b]));
            }
        }
        return Err(PlotError::InvalidColor(name.to_string()));
    }
    let rgb = match lower.as_str() {
        "red" => [255, 0, 0],
        "green" => [0, 128, 0],
        "blue" => [0, 0, 255],
        "orange" => [255, 165, 0],
        "purple" => [128, 0, 128],
        "yellow" => [255, 255, 0],
        "black" => [0, 0, 0],
        "gray" | "grey" => [128, 128, 128],
        "lightgreen" => [144, 238, 144],
        _ => return Err(PlotError::InvalidColor(name.to_string())),
    };
    Ok(Rgb(rgb))
}

pub fn plot_file_name(label: &str) -> String {
    let stem: String = label
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    format!("{stem}.png")
}

pub fn plot_path(output_dir: &Path, label: &str) -> PathBuf {
    output_dir
        .join("plots")
        .join("activities")
        .join(plot_file_name(label))
}

/// Data-to-pixel mapping for the plot area.
#[derive(Debug, Clone, Copy)]
pub struct ChartFrame {
    pub x_min: f64,
    pub x_max: f64,
    left: f32,
    right: f32,
    top: f32,
    bottom: f32,
}

impl ChartFrame {
    pub fn new(x_min: f64, x_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            left: MARGIN_LEFT as f32,
            right: (PLOT_WIDTH - MARGIN_RIGHT) as f32,
            top: MARGIN_TOP as f32,
            bottom: (PLOT_HEIGHT - MARGIN_BOTTOM) as f32,
        }
    }

    /// Padded x-range covering every start and end; `None` without intervals.
    pub fn fit(times: impl IntoIterator<Item = TimeInterval>) -> Option<Self> {
        let mut min_start = f64::INFINITY;
        let mut max_end = f64::NEG_INFINITY;
        let mut any = false;
        for t in times {
            any = true;
            min_start = min_start.min(t.start);
            max_end = max_end.max(t.end);
        }
        if !any {
            return None;
        }
        let pad = X_PAD_FRACTION * (max_end - min_start);
        let (lo, hi) = (min_start - pad, max_end + pad);
        if hi > lo {
            Some(Self::new(lo, hi))
        } else {
            Some(Self::new(lo - 0.5, lo + 0.5))
        }
    }

    pub fn x_px(&self, t: f64) -> f32 {
        let frac = (t - self.x_min) / (self.x_max - self.x_min);
        self.left + (frac as f32) * (self.right - self.left)
    }

    pub fn y_px(&self, v: f64) -> f32 {
        let frac = v / Y_MAX;
        self.bottom - (frac as f32) * (self.bottom - self.top)
    }

    /// Pixel rectangle of a bar starting at `start` with the given width and
    /// height, clipped to the plot area.
    fn bar_rect(&self, start: f64, width: f64, height: f64) -> Option<Rect> {
        let xa = self.x_px(start);
        let xb = self.x_px(start + width);
        let ya = self.y_px(0.0);
        let yb = self.y_px(height);
        let x0 = xa.min(xb).max(self.left).round() as i32;
        let x1 = xa.max(xb).min(self.right).round() as i32;
        let y0 = ya.min(yb).max(self.top).round() as i32;
        let y1 = ya.max(yb).min(self.bottom).round() as i32;
        if x1 < x0 || y1 < y0 {
            return None;
        }
        let w = (x1 - x0).max(1) as u32;
        let h = (y1 - y0).max(1) as u32;
        Some(Rect::at(x0, y0).of_size(w, h))
    }

    fn area(&self) -> Rect {
        Rect::at(self.left as i32, self.top as i32).of_size(
            (self.right - self.left) as u32,
            (self.bottom - self.top) as u32,
        )
    }
}

fn blend_rect(img: &mut RgbImage, rect: Rect, color: Rgb<u8>, alpha: f32) {
    let x_end = (rect.right() + 1).min(img.width() as i32);
    let y_end = (rect.bottom() + 1).min(img.height() as i32);
    for y in rect.top().max(0)..y_end {
        for x in rect.left().max(0)..x_end {
            let px = img.get_pixel_mut(x as u32, y as u32);
            for c in 0..3 {
                let base = px.0[c] as f32;
                px.0[c] = (base + (color.0[c] as f32 - base) * alpha).round() as u8;
            }
        }
    }
}

fn draw_ticks(img: &mut RgbImage, frame: &ChartFrame) {
    let bottom = frame.bottom;
    for i in 0..=10 {
        let t = frame.x_min + (frame.x_max - frame.x_min) * i as f64 / 10.0;
        let x = frame.x_px(t);
        draw_line_segment_mut(img, (x, bottom), (x, bottom + 6.0), BLACK);
    }
    for i in 0..=4 {
        let y = frame.y_px(i as f64 * 0.25);
        draw_line_segment_mut(img, (frame.left - 6.0, y), (frame.left, y), BLACK);
    }
}

fn draw_legend(img: &mut RgbImage, frame: &ChartFrame) {
    let x = frame.right as i32 - 40;
    let y = frame.top as i32 + 10;
    draw_filled_rect_mut(img, Rect::at(x, y).of_size(24, 12), GT_COLOR);
    draw_hollow_rect_mut(img, Rect::at(x, y + 20).of_size(24, 12), DETECTION_COLOR);
}

/// Draws ground truth as filled bars of height 1, the optional highlight at
/// half opacity, and detections as outlines as tall as their confidence.
pub fn render_activity_confidence(
    ground_truth: &[GroundTruthInstance],
    detections: &[DetectionInstance],
    highlight: Option<&Highlight>,
) -> Option<RgbImage> {
    let frame = ChartFrame::fit(
        ground_truth
            .iter()
            .map(|g| g.time)
            .chain(detections.iter().map(|d| d.time)),
    )?;

    let mut img = RgbImage::from_pixel(PLOT_WIDTH, PLOT_HEIGHT, WHITE);

    for g in ground_truth {
        if let Some(rect) = frame.bar_rect(g.time.start, g.time.duration(), GT_HEIGHT) {
            draw_filled_rect_mut(&mut img, rect, GT_COLOR);
        }
    }

    if let Some(h) = highlight {
        let t = h.interval;
        if let Some(rect) = frame.bar_rect(t.start, t.duration(), HIGHLIGHT_HEIGHT) {
            blend_rect(&mut img, rect, h.color, HIGHLIGHT_ALPHA);
        }
    }

    for d in detections {
        if let Some(rect) = frame.bar_rect(d.time.start, d.time.duration(), d.confidence) {
            draw_hollow_rect_mut(&mut img, rect, DETECTION_COLOR);
        }
    }

    draw_hollow_rect_mut(&mut img, frame.area(), BLACK);
    draw_ticks(&mut img, &frame);
    draw_legend(&mut img, &frame);

    Some(img)
}

pub fn plot_activity_confidence(
    label: &str,
    ground_truth: &[GroundTruthInstance],
    detections: &DetectionsByLabel,
    output_dir: &Path,
    highlight: Option<&Highlight>,
) -> Result<PathBuf, PlotError> {
    let dets = detections
        .get(label)
        .ok_or_else(|| PlotError::MissingLabel(label.to_string()))?;

    let img = render_activity_confidence(ground_truth, dets, highlight)
        .ok_or_else(|| PlotError::EmptyRange(label.to_string()))?;

    let path = plot_path(output_dir, label);
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|source| PlotError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    img.save(&path).map_err(|source| PlotError::Image {
        path: path.clone(),
        source,
    })?;

    tracing::info!(label, path = %path.display(), "wrote activity plot");
    Ok(path)
}

#[cfg(test)]
#[path = "../../tests/src_inline/plot/tests.rs"]
mod tests;
