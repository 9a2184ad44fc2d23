use crate::{
    config::FrequencyHrvConfig,
    dsp::{integrate_band, welch_psd, CubicSpline},
    error::{PipelineError, Result},
    signal::RRSeries,
};
use serde::{Deserialize, Serialize};

const NN50_THRESHOLD_MS: f64 = 50.0;
const MS2_PER_S2: f64 = 1e6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HRVTime {
    pub n: usize,
    pub mean_nn: f64,
    pub sdnn: f64,
    pub rmssd: f64,
    /// Percentage (0–100).
    pub pnn50: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HRVFrequency {
    /// LF power (ms²), clamped.
    pub lf: f64,
    /// HF power (ms²), clamped.
    pub hf: f64,
    pub lf_hf: f64,
    /// Welch PSD of the resampled deviation signal, `[freq_hz, s²/Hz]`.
    pub points: Vec<[f64; 2]>,
}

/// HRV block attached to an analysis result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HRVReport {
    pub lf: f64,
    pub hf: f64,
    pub lf_hf_ratio: f64,
    pub sdnn: f64,
    pub rmssd: f64,
    pub pnn50: f64,
    /// Set when the frequency values are heuristics rather than measured.
    #[serde(default, skip_serializing_if = "is_false")]
    pub approximate: bool,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

impl HRVReport {
    pub fn measured(time: &HRVTime, freq: &HRVFrequency) -> Self {
        Self {
            lf: freq.lf,
            hf: freq.hf,
            lf_hf_ratio: freq.lf_hf,
            sdnn: time.sdnn,
            rmssd: time.rmssd,
            pnn50: time.pnn50,
            approximate: false,
        }
    }

    /// Heuristic LF/HF scaled from heart rate and the time-domain statistics.
    pub fn approximate(
        heart_rate_bpm: f64,
        sdnn: f64,
        rmssd: f64,
        pnn50: f64,
        cfg: &FrequencyHrvConfig,
    ) -> Self {
        let beats_per_sec = heart_rate_bpm / 60.0;
        let lf = (50.0 * beats_per_sec * sdnn / 100.0).max(cfg.lf_clamp.min);
        let hf = (25.0 * beats_per_sec * rmssd / 100.0).max(cfg.hf_clamp.min);
        Self {
            lf,
            hf,
            lf_hf_ratio: cfg.ratio(lf, hf),
            sdnn,
            rmssd,
            pnn50,
            approximate: true,
        }
    }
}

pub fn hrv_time(rr: &RRSeries) -> HRVTime {
    let n = rr.rr.len();
    let mean_nn = rr.mean();
    let sdnn = if n > 1 {
        (rr.rr.iter().map(|x| (x - mean_nn).powi(2)).sum::<f64>() / (n as f64 - 1.0)).sqrt()
    } else {
        0.0
    };
    let rmssd = if n > 1 {
        let diffs = rr.rr.windows(2).map(|w| (w[1] - w[0]).powi(2));
        (diffs.sum::<f64>() / (n as f64 - 1.0)).sqrt()
    } else {
        0.0
    };
    let pnn50 = if n > 1 {
        let count = rr
            .rr
            .windows(2)
            .filter(|w| (w[1] - w[0]).abs() > NN50_THRESHOLD_MS)
            .count();
        100.0 * count as f64 / (n as f64 - 1.0)
    } else {
        0.0
    };

    HRVTime {
        n,
        mean_nn,
        sdnn,
        rmssd,
        pnn50,
    }
}

/// LF/HF power of the RR tachogram.
///
/// The zero-mean RR deviations (seconds) are placed on a beat-time axis that
/// starts at 0, resampled with a not-a-knot cubic spline at `cfg.interp_fs`,
/// and passed through Welch. Band powers are reported in ms².
pub fn hrv_frequency(rr: &RRSeries, cfg: &FrequencyHrvConfig) -> Result<HRVFrequency> {
    let n = rr.rr.len();
    if n <= 3 {
        return Err(PipelineError::InsufficientHrvData(format!(
            "{n} RR intervals, need at least 4"
        )));
    }
    let seconds: Vec<f64> = rr.rr.iter().map(|x| x / 1000.0).collect();
    let mean = seconds.iter().sum::<f64>() / n as f64;
    let deviations: Vec<f64> = seconds.iter().map(|x| x - mean).collect();
    let mut times = Vec::with_capacity(n);
    let mut acc = 0.0;
    for s in &seconds {
        acc += s;
        times.push(acc - seconds[0]);
    }
    let spline = CubicSpline::not_a_knot(&times, &deviations).ok_or_else(|| {
        PipelineError::InsufficientHrvData("RR interpolation failed".to_string())
    })?;
    let resampled = spline.resample(cfg.interp_fs);
    if resampled.len() < 2 {
        return Err(PipelineError::InsufficientHrvData(format!(
            "{} resampled points",
            resampled.len()
        )));
    }
    let segment = resampled.len().min(cfg.max_segment);
    let psd = welch_psd(&resampled, cfg.interp_fs, segment);
    let lf = integrate_band(&psd.freqs, &psd.power, cfg.lf_band)
        .ok_or_else(|| PipelineError::InsufficientHrvData("no PSD bins in LF band".to_string()))?;
    let hf = integrate_band(&psd.freqs, &psd.power, cfg.hf_band)
        .ok_or_else(|| PipelineError::InsufficientHrvData("no PSD bins in HF band".to_string()))?;
    let lf = cfg.lf_clamp.clamp(lf * MS2_PER_S2);
    let hf = cfg.hf_clamp.clamp(hf * MS2_PER_S2);
    Ok(HRVFrequency {
        lf,
        hf,
        lf_hf: cfg.ratio(lf, hf),
        points: psd.points(),
    })
}
