use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};

/// Average skin color of a frame, channel values as reported by the locator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }
}

/// One sample per input frame. `color` is `None` when no usable skin region was found.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameSample {
    pub color: Option<Rgb>,
    pub timestamp_sec: f64,
}

impl FrameSample {
    pub fn new(color: Rgb, timestamp_sec: f64) -> Self {
        Self {
            color: Some(color),
            timestamp_sec,
        }
    }

    pub fn missing(timestamp_sec: f64) -> Self {
        Self {
            color: None,
            timestamp_sec,
        }
    }
}

/// Parallel R, G, B and timestamp sequences built from the usable frame samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSeries {
    pub red: Vec<f64>,
    pub green: Vec<f64>,
    pub blue: Vec<f64>,
    /// Seconds
    pub timestamps: Vec<f64>,
}

impl ChannelSeries {
    /// Collect the frames that carry a color. Fails when fewer than
    /// `min_frames` remain.
    pub fn from_samples(samples: &[FrameSample], min_frames: usize) -> Result<Self> {
        let usable = samples.iter().filter(|s| s.color.is_some()).count();
        if usable < min_frames {
            return Err(PipelineError::InsufficientFrames {
                found: usable,
                required: min_frames,
            });
        }
        let mut series = Self {
            red: Vec::with_capacity(usable),
            green: Vec::with_capacity(usable),
            blue: Vec::with_capacity(usable),
            timestamps: Vec::with_capacity(usable),
        };
        for sample in samples {
            if let Some(color) = sample.color {
                series.red.push(color.r);
                series.green.push(color.g);
                series.blue.push(color.b);
                series.timestamps.push(sample.timestamp_sec);
            }
        }
        Ok(series)
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// Basic typed time series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Uniform sampling frequency in Hz
    pub fs: f64,
    /// Samples
    pub data: Vec<f64>,
}

impl TimeSeries {
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Point events on a timeline (e.g., pulse peak indices)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Events {
    pub indices: Vec<usize>,
}

impl Events {
    pub fn from_indices(indices: Vec<usize>) -> Self {
        Self { indices }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// RR intervals (milliseconds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RRSeries {
    pub rr: Vec<f64>,
}

impl RRSeries {
    /// Intervals between consecutive events, measured on the frame timestamps
    /// rather than on sample indices so dropped frames do not skew them.
    pub fn from_events(events: &Events, timestamps: &[f64]) -> Self {
        let rr = events
            .indices
            .windows(2)
            .filter_map(|w| {
                let start = timestamps.get(w[0])?;
                let end = timestamps.get(w[1])?;
                Some((end - start) * 1000.0)
            })
            .collect();
        Self { rr }
    }

    pub fn len(&self) -> usize {
        self.rr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rr.is_empty()
    }

    pub fn mean(&self) -> f64 {
        if self.rr.is_empty() {
            0.0
        } else {
            self.rr.iter().sum::<f64>() / self.rr.len() as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(n: usize, drop_every: usize) -> Vec<FrameSample> {
        (0..n)
            .map(|i| {
                let t = i as f64 / 30.0;
                if drop_every > 0 && i % drop_every == 0 {
                    FrameSample::missing(t)
                } else {
                    FrameSample::new(Rgb::new(150.0, 120.0 + i as f64, 100.0), t)
                }
            })
            .collect()
    }

    #[test]
    fn channel_series_skips_frames_without_color() {
        let series = ChannelSeries::from_samples(&samples(20, 4), 10).unwrap();
        assert_eq!(series.len(), 15);
        assert_eq!(series.red.len(), series.timestamps.len());
        assert_eq!(series.green.len(), series.blue.len());
        assert!((series.timestamps[0] - 1.0 / 30.0).abs() < 1e-12);
        assert!((series.green[0] - 121.0).abs() < 1e-12);
    }

    #[test]
    fn channel_series_requires_minimum_frames() {
        let err = ChannelSeries::from_samples(&samples(12, 2), 10).unwrap_err();
        assert_eq!(
            err,
            PipelineError::InsufficientFrames {
                found: 6,
                required: 10
            }
        );
    }

    #[test]
    fn rr_from_events_uses_timestamps() {
        let timestamps = [0.0, 0.1, 0.25, 0.9, 1.7];
        let events = Events::from_indices(vec![0, 3, 4]);
        let rr = RRSeries::from_events(&events, &timestamps);
        assert_eq!(rr.len(), 2);
        assert!((rr.rr[0] - 900.0).abs() < 1e-9);
        assert!((rr.rr[1] - 800.0).abs() < 1e-9);
    }

    #[test]
    fn frame_sample_json_uses_camel_case() {
        let sample = FrameSample::new(Rgb::new(1.0, 2.0, 3.0), 0.5);
        let js = serde_json::to_string(&sample).unwrap();
        assert!(js.contains("\"timestampSec\":0.5"));
    }
}
