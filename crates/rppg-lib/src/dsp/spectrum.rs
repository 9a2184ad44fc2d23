use crate::config::FrequencyBand;
use crate::dsp::stats::mean;
use log::error;
use realfft::RealFftPlanner;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// One-sided magnitude spectrum.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Spectrum {
    pub freqs: Vec<f64>,
    pub magnitudes: Vec<f64>,
}

/// One-sided power spectral density.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Psd {
    pub freqs: Vec<f64>,
    pub power: Vec<f64>,
}

impl Psd {
    pub fn points(&self) -> Vec<[f64; 2]> {
        self.freqs
            .iter()
            .zip(&self.power)
            .map(|(&f, &p)| [f, p])
            .collect()
    }
}

/// |rfft(data)| with bins spaced `fs / data.len()`.
pub fn magnitude_spectrum(data: &[f64], fs: f64) -> Spectrum {
    let n = data.len();
    if n == 0 {
        return Spectrum::default();
    }
    let mut planner = RealFftPlanner::<f64>::new();
    let r2c = planner.plan_fft_forward(n);
    let mut buffer = data.to_vec();
    let mut spectrum = r2c.make_output_vec();
    if let Err(err) = r2c.process(&mut buffer, &mut spectrum) {
        error!("fft of {} samples failed: {}", n, err);
        return Spectrum::default();
    }
    Spectrum {
        freqs: (0..spectrum.len())
            .map(|k| k as f64 * fs / n as f64)
            .collect(),
        magnitudes: spectrum.iter().map(|c| c.norm()).collect(),
    }
}

/// Welch PSD: Hann-windowed segments of `segment_len` samples with 50 %
/// overlap, mean removed per segment, density scaling, averaged.
pub fn welch_psd(data: &[f64], fs: f64, segment_len: usize) -> Psd {
    let n = data.len();
    let window = segment_len.min(n);
    if window < 2 {
        return Psd::default();
    }
    let step = window - window / 2;
    let mut planner = RealFftPlanner::<f64>::new();
    let r2c = planner.plan_fft_forward(window);
    let window_func = hann(window);
    let scale = 1.0 / (fs * window_func.iter().map(|w| w * w).sum::<f64>());
    let mut freqs = Vec::new();
    let mut powers = Vec::new();
    let mut pos = 0;
    let mut segments = 0;
    while pos + window <= n {
        let slice = &data[pos..pos + window];
        let offset = mean(slice);
        let mut frame: Vec<f64> = slice
            .iter()
            .zip(window_func.iter())
            .map(|(x, w)| (x - offset) * w)
            .collect();
        let mut spectrum = r2c.make_output_vec();
        if let Err(err) = r2c.process(&mut frame, &mut spectrum) {
            error!("welch segment fft failed: {}", err);
            return Psd::default();
        }
        for (k, val) in spectrum.iter().enumerate() {
            if segments == 0 {
                freqs.push(k as f64 * fs / window as f64);
                powers.push(0.0);
            }
            let power = if k == 0 || (window % 2 == 0 && k == window / 2) {
                val.norm_sqr()
            } else {
                2.0 * val.norm_sqr()
            } * scale;
            powers[k] += power;
        }
        segments += 1;
        pos += step;
    }
    if segments > 0 {
        for p in powers.iter_mut() {
            *p /= segments as f64;
        }
    }
    Psd {
        freqs,
        power: powers,
    }
}

/// Trapezoidal integral of `powers` over bins with `low <= f < high`.
/// `None` when the band holds no bins.
pub fn integrate_band(freqs: &[f64], powers: &[f64], band: FrequencyBand) -> Option<f64> {
    let selected: Vec<(f64, f64)> = freqs
        .iter()
        .zip(powers)
        .filter(|(f, _)| **f >= band.low_hz && **f < band.high_hz)
        .map(|(f, p)| (*f, *p))
        .collect();
    if selected.is_empty() {
        return None;
    }
    Some(
        selected
            .windows(2)
            .map(|w| (w[1].0 - w[0].0) * (w[0].1 + w[1].1) / 2.0)
            .sum(),
    )
}

/// Periodic Hann window.
fn hann(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / (size as f64)).cos()))
        .collect()
}
