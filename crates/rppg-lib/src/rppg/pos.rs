//! Plane-Orthogonal-to-Skin (POS) pulse recovery (Wang et al., 2017).
//!
//! Each color channel is detrended and z-scored, projected onto the two
//! axes of `S = [[0, 1, -1], [-2, 1, 1]]`, and the projections are combined
//! with a ratio of their spreads so the pulsatile component adds up while
//! common-mode illumination changes cancel.

use crate::dsp::stats::{detrend_linear, mean, std_dev};
use crate::error::{PipelineError, Result};
use crate::signal::ChannelSeries;

const PROJECTION: [[f64; 3]; 2] = [[0.0, 1.0, -1.0], [-2.0, 1.0, 1.0]];

/// Recover the pulse signal from the three color channels.
pub fn recover_pulse(series: &ChannelSeries) -> Result<Vec<f64>> {
    let channels = [
        normalize_channel(&series.red, "red")?,
        normalize_channel(&series.green, "green")?,
        normalize_channel(&series.blue, "blue")?,
    ];
    let n = series.len();
    let project = |row: &[f64; 3]| -> Vec<f64> {
        (0..n)
            .map(|i| row[0] * channels[0][i] + row[1] * channels[1][i] + row[2] * channels[2][i])
            .collect()
    };
    let p0 = project(&PROJECTION[0]);
    let p1 = project(&PROJECTION[1]);
    let spread0 = std_dev(&p0);
    let spread1 = std_dev(&p1);
    if is_degenerate(spread1, &p1) {
        return Err(PipelineError::DegenerateSignal(
            "second POS projection has zero variance".into(),
        ));
    }
    let alpha = spread0 / spread1;
    Ok(p0.iter().zip(&p1).map(|(a, b)| a + alpha * b).collect())
}

/// Detrend then z-score a channel.
pub fn normalize_channel(data: &[f64], name: &str) -> Result<Vec<f64>> {
    let detrended = detrend_linear(data);
    let spread = std_dev(&detrended);
    if is_degenerate(spread, data) {
        return Err(PipelineError::DegenerateSignal(format!(
            "{name} channel has zero variance"
        )));
    }
    let offset = mean(&detrended);
    Ok(detrended.iter().map(|x| (x - offset) / spread).collect())
}

/// A spread this small relative to the data's magnitude is rounding noise.
fn is_degenerate(spread: f64, data: &[f64]) -> bool {
    let scale = data.iter().fold(1.0f64, |acc, x| acc.max(x.abs()));
    !spread.is_finite() || spread <= 1e-12 * scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn series(n: usize, red: impl Fn(f64) -> f64, green: impl Fn(f64) -> f64, blue: impl Fn(f64) -> f64) -> ChannelSeries {
        let fs = 30.0;
        let timestamps: Vec<f64> = (0..n).map(|i| i as f64 / fs).collect();
        ChannelSeries {
            red: timestamps.iter().map(|&t| red(t)).collect(),
            green: timestamps.iter().map(|&t| green(t)).collect(),
            blue: timestamps.iter().map(|&t| blue(t)).collect(),
            timestamps,
        }
    }

    fn pulse(t: f64) -> f64 {
        (2.0 * PI * 1.2 * t).sin()
    }

    #[test]
    fn constant_channel_is_degenerate() {
        let s = series(64, |_| 150.0, |t| 120.0 + pulse(t), |t| 100.0 + 0.2 * pulse(t));
        let err = recover_pulse(&s).unwrap_err();
        assert!(matches!(err, PipelineError::DegenerateSignal(msg) if msg.contains("red")));
    }

    #[test]
    fn pure_ramp_is_degenerate_after_detrending() {
        let s = series(64, |t| 150.0 + t, |t| 120.0 + pulse(t), |t| 100.0 + 0.2 * pulse(t));
        assert!(matches!(
            recover_pulse(&s),
            Err(PipelineError::DegenerateSignal(_))
        ));
    }

    #[test]
    fn identical_channels_collapse_projection() {
        let s = series(64, pulse, pulse, pulse);
        let err = recover_pulse(&s).unwrap_err();
        assert!(matches!(err, PipelineError::DegenerateSignal(msg) if msg.contains("projection")));
    }

    #[test]
    fn normalized_channel_has_unit_spread() {
        let data: Vec<f64> = (0..90).map(|i| 80.0 + 0.5 * i as f64 + pulse(i as f64 / 30.0)).collect();
        let out = normalize_channel(&data, "green").unwrap();
        assert!(mean(&out).abs() < 1e-9);
        assert!((std_dev(&out) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn pulse_tracks_green_channel_rhythm() {
        let n = 300;
        let s = series(
            n,
            |t| 150.0 + 0.3 * pulse(t) + 0.8 * (2.0 * PI * 0.08 * t).sin() + 0.05 * t,
            |t| 120.0 + pulse(t) + 0.8 * (2.0 * PI * 0.08 * t).sin() + 0.02 * t,
            |t| 100.0 + 0.15 * pulse(t) + 0.8 * (2.0 * PI * 0.08 * t).sin() - 0.03 * t,
        );
        let out = recover_pulse(&s).unwrap();
        assert_eq!(out.len(), n);
        assert!(out.iter().all(|v| v.is_finite()));
        assert!(std_dev(&out) > 0.0);
    }
}
