//! Butterworth band-pass design and zero-phase filtering.
//!
//! The design follows the classic analog-prototype route: Butterworth poles
//! on the unit circle, lowpass-to-bandpass transform around the pre-warped
//! band edges, then the bilinear transform. Coefficients are kept in
//! transfer-function form, which is well conditioned for the low orders and
//! frame rates used here.

use crate::config::FrequencyBand;
use crate::dsp::linalg;
use crate::error::{PipelineError, Result};
use log::warn;
use realfft::num_complex::Complex64;
use std::f64::consts::PI;

/// IIR band-pass filter in transfer-function form, `a[0] == 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct BandpassFilter {
    b: Vec<f64>,
    a: Vec<f64>,
}

impl BandpassFilter {
    /// Design an order-`order` Butterworth band-pass for signals sampled at `fs`.
    ///
    /// A band edge at or above Nyquist is pulled down to 95 % of Nyquist so
    /// low frame rates still get a usable filter.
    pub fn butterworth(order: usize, band: FrequencyBand, fs: f64) -> Result<Self> {
        if order == 0 {
            return Err(PipelineError::InvalidConfig(
                "filter order must be positive".into(),
            ));
        }
        if !(fs.is_finite() && fs > 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "sample rate must be positive, got {fs}"
            )));
        }
        let nyquist = fs / 2.0;
        let mut high = band.high_hz;
        if high >= nyquist {
            high = 0.95 * nyquist;
            warn!(
                "band edge {:.2} Hz is above Nyquist ({:.2} Hz); using {:.2} Hz",
                band.high_hz, nyquist, high
            );
        }
        if !(band.low_hz > 0.0 && band.low_hz < high) {
            return Err(PipelineError::InvalidConfig(format!(
                "band {:.2}..{:.2} Hz cannot be realised at {fs} Hz",
                band.low_hz, band.high_hz
            )));
        }

        // Edges normalized to Nyquist and pre-warped for a design rate of 2.
        let warp = |f: f64| 4.0 * (PI * (f / nyquist) / 2.0).tan();
        let w1 = warp(band.low_hz);
        let w2 = warp(high);
        let bw = w2 - w1;
        let w0_sq = w1 * w2;

        let prototype = butterworth_poles(order);
        let mut poles = Vec::with_capacity(2 * order);
        for &p in &prototype {
            let p_lp = p * (bw / 2.0);
            let root = (p_lp * p_lp - w0_sq).sqrt();
            poles.push(p_lp + root);
        }
        for &p in &prototype {
            let p_lp = p * (bw / 2.0);
            let root = (p_lp * p_lp - w0_sq).sqrt();
            poles.push(p_lp - root);
        }

        // Bilinear transform at the design rate.
        let fs2 = Complex64::new(4.0, 0.0);
        let digital_poles: Vec<Complex64> = poles.iter().map(|&p| (fs2 + p) / (fs2 - p)).collect();
        // `order` analog zeros at s = 0 map to z = 1, the rest of the degree goes to z = -1.
        let mut digital_zeros = vec![Complex64::new(1.0, 0.0); order];
        digital_zeros.extend(std::iter::repeat(Complex64::new(-1.0, 0.0)).take(order));

        let num = fs2.powu(order as u32);
        let den = poles
            .iter()
            .fold(Complex64::new(1.0, 0.0), |acc, &p| acc * (fs2 - p));
        let gain = bw.powi(order as i32) * (num / den).re;

        let b = expand_roots(&digital_zeros)
            .into_iter()
            .map(|c| c.re * gain)
            .collect();
        let a = expand_roots(&digital_poles).into_iter().map(|c| c.re).collect();
        Ok(Self { b, a })
    }

    pub fn numerator(&self) -> &[f64] {
        &self.b
    }

    pub fn denominator(&self) -> &[f64] {
        &self.a
    }

    /// |H(e^{jw})| at `freq_hz`.
    pub fn magnitude_response(&self, freq_hz: f64, fs: f64) -> f64 {
        let w = 2.0 * PI * freq_hz / fs;
        let eval = |coeffs: &[f64]| {
            coeffs
                .iter()
                .enumerate()
                .fold(Complex64::new(0.0, 0.0), |acc, (k, &c)| {
                    acc + Complex64::from_polar(c, -w * k as f64)
                })
        };
        (eval(&self.b) / eval(&self.a)).norm()
    }

    /// Direct form II transposed filtering starting from state `zi`.
    pub fn lfilter(&self, data: &[f64], zi: &[f64]) -> Vec<f64> {
        let order = self.a.len() - 1;
        let mut z = vec![0.0; order];
        for (dst, src) in z.iter_mut().zip(zi) {
            *dst = *src;
        }
        let mut out = Vec::with_capacity(data.len());
        for &x in data {
            let y = self.b[0] * x + z.first().copied().unwrap_or(0.0);
            for i in 0..order {
                let next = if i + 1 < order { z[i + 1] } else { 0.0 };
                z[i] = self.b[i + 1] * x + next - self.a[i + 1] * y;
            }
            out.push(y);
        }
        out
    }

    /// Forward-backward filtering with odd-extension padding and steady-state
    /// initial conditions, so the output has no phase lag and small edge
    /// transients.
    pub fn filtfilt(&self, data: &[f64]) -> Vec<f64> {
        let n = data.len();
        if n < 2 {
            return data.to_vec();
        }
        let padlen = (3 * self.a.len().max(self.b.len())).min(n - 1);
        let first = data[0];
        let last = data[n - 1];
        let mut ext = Vec::with_capacity(n + 2 * padlen);
        ext.extend((1..=padlen).rev().map(|i| 2.0 * first - data[i]));
        ext.extend_from_slice(data);
        ext.extend((0..padlen).map(|i| 2.0 * last - data[n - 2 - i]));

        let zi = self.steady_state();
        let start: Vec<f64> = zi.iter().map(|z| z * ext[0]).collect();
        let mut forward = self.lfilter(&ext, &start);
        forward.reverse();
        let start: Vec<f64> = zi.iter().map(|z| z * forward[0]).collect();
        let mut backward = self.lfilter(&forward, &start);
        backward.reverse();
        backward[padlen..padlen + n].to_vec()
    }

    /// Initial state for a unit step input held since forever.
    fn steady_state(&self) -> Vec<f64> {
        let order = self.a.len() - 1;
        let mut m = vec![vec![0.0; order]; order];
        for (j, row) in m.iter_mut().enumerate() {
            row[j] = 1.0;
            row[0] += self.a[j + 1];
            if j + 1 < order {
                row[j + 1] = -1.0;
            }
        }
        let rhs = (0..order)
            .map(|i| self.b[i + 1] - self.a[i + 1] * self.b[0])
            .collect();
        linalg::solve(m, rhs).unwrap_or_else(|| vec![0.0; order])
    }
}

/// Analog lowpass prototype poles, left half plane, unit radius.
fn butterworth_poles(order: usize) -> Vec<Complex64> {
    (0..order)
        .map(|k| {
            let m = 2.0 * k as f64 - order as f64 + 1.0;
            -Complex64::from_polar(1.0, PI * m / (2.0 * order as f64))
        })
        .collect()
}

/// Polynomial coefficients (highest power first) with the given roots.
fn expand_roots(roots: &[Complex64]) -> Vec<Complex64> {
    let mut coeffs = vec![Complex64::new(1.0, 0.0)];
    for &root in roots {
        let mut next = vec![Complex64::new(0.0, 0.0); coeffs.len() + 1];
        for (i, &c) in coeffs.iter().enumerate() {
            next[i] += c;
            next[i + 1] -= c * root;
        }
        coeffs = next;
    }
    coeffs
}
