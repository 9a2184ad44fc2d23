//! Frame acquisition seams: where frames come from and where the skin is.
//!
//! Camera capture and face detection live outside this crate. Implement
//! [`FrameSource`] and [`SkinLocator`] to plug them in; [`RoiMeanLocator`]
//! is a simple reference locator for well-framed, front-facing recordings.

use crate::signal::{FrameSample, Rgb};
use anyhow::Result;
use log::{info, warn};

/// One RGB888 frame, row-major, three bytes per pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub timestamp_sec: f64,
}

impl RgbFrame {
    pub fn new(width: u32, height: u32, data: Vec<u8>, timestamp_sec: f64) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            anyhow::bail!(
                "frame {}x{} needs {} bytes, got {}",
                width,
                height,
                expected,
                data.len()
            );
        }
        Ok(Self {
            width,
            height,
            data,
            timestamp_sec,
        })
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        Some([self.data[idx], self.data[idx + 1], self.data[idx + 2]])
    }
}

/// Ordered stream of frames.
pub trait FrameSource {
    /// Nominal capture rate (frames per second).
    fn fps(&self) -> f64;

    /// Next frame, or `None` when the stream has ended.
    fn next_frame(&mut self) -> Result<Option<RgbFrame>>;
}

/// Result of searching one frame for skin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkinSample {
    pub face_found: bool,
    /// Mean color of the skin region.
    pub color: Option<Rgb>,
}

impl SkinSample {
    pub fn not_found() -> Self {
        Self {
            face_found: false,
            color: None,
        }
    }
}

pub trait SkinLocator {
    fn locate(&mut self, frame: &RgbFrame) -> SkinSample;
}

/// Frames held in memory.
#[derive(Debug, Clone, Default)]
pub struct VecFrameSource {
    frames: std::collections::VecDeque<RgbFrame>,
    fps: f64,
}

impl VecFrameSource {
    pub fn new(frames: Vec<RgbFrame>, fps: f64) -> Self {
        Self {
            frames: frames.into(),
            fps,
        }
    }
}

impl FrameSource for VecFrameSource {
    fn fps(&self) -> f64 {
        self.fps
    }

    fn next_frame(&mut self) -> Result<Option<RgbFrame>> {
        Ok(self.frames.pop_front())
    }
}

/// Averages the skin-colored pixels of a centered square region.
///
/// The region is rejected when it is too dark or when too few of its pixels
/// pass the RGB skin rule of Kovac et al. (uniform daylight variant).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoiMeanLocator {
    /// Side of the square as a fraction of the shorter frame dimension.
    pub roi_fraction: f64,
    /// Minimum mean brightness (0–255) of the region.
    pub min_brightness: f64,
    /// Minimum share of region pixels classified as skin.
    pub min_skin_fraction: f64,
}

impl Default for RoiMeanLocator {
    fn default() -> Self {
        Self {
            roi_fraction: 0.6,
            min_brightness: 30.0,
            min_skin_fraction: 0.3,
        }
    }
}

impl RoiMeanLocator {
    fn region(&self, frame: &RgbFrame) -> (u32, u32, u32) {
        let shorter = frame.width.min(frame.height);
        let side = ((shorter as f64 * self.roi_fraction).round() as u32).clamp(1, shorter.max(1));
        let x0 = (frame.width - side.min(frame.width)) / 2;
        let y0 = (frame.height - side.min(frame.height)) / 2;
        (x0, y0, side)
    }
}

fn is_skin([r, g, b]: [u8; 3]) -> bool {
    let (r, g, b) = (r as i32, g as i32, b as i32);
    let spread = r.max(g).max(b) - r.min(g).min(b);
    r > 95 && g > 40 && b > 20 && spread > 15 && (r - g).abs() > 15 && r > g && r > b
}

impl SkinLocator for RoiMeanLocator {
    fn locate(&mut self, frame: &RgbFrame) -> SkinSample {
        if frame.width == 0 || frame.height == 0 {
            return SkinSample::not_found();
        }
        let (x0, y0, side) = self.region(frame);
        let mut total = 0usize;
        let mut brightness = 0.0;
        let mut skin = 0usize;
        let mut sum = [0.0f64; 3];
        for y in y0..y0 + side {
            for x in x0..x0 + side {
                let Some(px) = frame.pixel(x, y) else {
                    continue;
                };
                total += 1;
                brightness += px.iter().map(|&c| c as f64).sum::<f64>() / 3.0;
                if is_skin(px) {
                    skin += 1;
                    for (acc, &c) in sum.iter_mut().zip(&px) {
                        *acc += c as f64;
                    }
                }
            }
        }
        if total == 0 || brightness / (total as f64) < self.min_brightness {
            return SkinSample::not_found();
        }
        let face_found = skin as f64 >= self.min_skin_fraction * total as f64;
        if !face_found || skin == 0 {
            return SkinSample::not_found();
        }
        let n = skin as f64;
        SkinSample {
            face_found,
            color: Some(Rgb::new(sum[0] / n, sum[1] / n, sum[2] / n)),
        }
    }
}

/// Pull every frame from `source` and turn it into a [`FrameSample`].
pub fn collect_frame_samples<S, L>(source: &mut S, locator: &mut L) -> Result<Vec<FrameSample>>
where
    S: FrameSource + ?Sized,
    L: SkinLocator + ?Sized,
{
    let mut samples = Vec::new();
    let mut found = 0usize;
    while let Some(frame) = source.next_frame()? {
        let located = locator.locate(&frame);
        let sample = match located.color {
            Some(color) if located.face_found => {
                found += 1;
                FrameSample::new(color, frame.timestamp_sec)
            }
            _ => FrameSample::missing(frame.timestamp_sec),
        };
        samples.push(sample);
    }
    if found < samples.len() {
        warn!("no skin found in {} of {} frames", samples.len() - found, samples.len());
    }
    info!(
        "collected {} frames at {:.1} fps, {} with skin",
        samples.len(),
        source.fps(),
        found
    );
    Ok(samples)
}
