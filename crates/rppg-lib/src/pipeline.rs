//! End-to-end analysis: frame samples in, heart rate and HRV out.
//!
//! Stages run in order (POS pulse recovery, spectral heart rate, peak/RR
//! extraction, HRV). Failures up to the heart-rate estimate are fatal; later
//! ones are resolved by the configured [`FallbackMode`].

use crate::{
    config::{FallbackMode, PipelineConfig},
    detectors::extract_rr,
    error::{PipelineError, Result},
    metrics::{hrv_frequency, hrv_time, HRVReport},
    rppg::{estimate_heart_rate, recover_pulse, HeartRateEstimate},
    signal::{ChannelSeries, FrameSample, TimeSeries},
};
use log::{debug, warn};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Outcome of one analysis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Beats per minute; 0 when no rate could be measured.
    pub heart_rate: f64,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hrv: Option<HRVReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub simulated: bool,
}

impl AnalysisResult {
    pub fn failed(err: &PipelineError) -> Self {
        Self {
            heart_rate: 0.0,
            confidence: 0.0,
            hrv: None,
            error: Some(err.to_string()),
            simulated: false,
        }
    }

    /// True when neither a measured nor a simulated heart rate is available.
    pub fn is_failure(&self) -> bool {
        !self.simulated && self.heart_rate <= 0.0
    }
}

/// Analyze with the default configuration at the given frame rate.
pub fn analyze(samples: &[FrameSample], fps: f64) -> AnalysisResult {
    analyze_with_config(samples, &PipelineConfig::default().with_fps(fps))
}

pub fn analyze_with_config(samples: &[FrameSample], cfg: &PipelineConfig) -> AnalysisResult {
    analyze_with_rng(samples, cfg, &mut rand::thread_rng())
}

/// Analyze with an explicit random source for the simulated fallback.
pub fn analyze_with_rng<R: Rng + ?Sized>(
    samples: &[FrameSample],
    cfg: &PipelineConfig,
    rng: &mut R,
) -> AnalysisResult {
    let (estimate, pulse, timestamps) = match measure_heart_rate(samples, cfg) {
        Ok(measured) => measured,
        Err(err) => {
            // A rejected configuration is reported as is, never simulated over.
            let simulate = cfg.fallback.simulate_on_failure
                && err.is_fatal()
                && !matches!(err, PipelineError::InvalidConfig(_));
            if simulate {
                warn!("{err}; reporting a simulated heart rate");
                return simulated(cfg, rng);
            }
            warn!("analysis failed: {err}");
            return AnalysisResult::failed(&err);
        }
    };
    let mut result = AnalysisResult {
        heart_rate: estimate.heart_rate_bpm,
        confidence: estimate.confidence,
        hrv: None,
        error: None,
        simulated: false,
    };
    match cfg.fallback.mode {
        FallbackMode::Strict => match measure_hrv(&pulse, &timestamps, &estimate, cfg) {
            Ok(report) => result.hrv = Some(report),
            Err(err) => {
                warn!("HRV unavailable: {err}");
                result.error = Some(err.to_string());
            }
        },
        FallbackMode::Degraded => {
            result.hrv = Some(degraded_hrv(&pulse, &timestamps, &estimate, cfg));
        }
    }
    result
}

/// Stages whose failure leaves nothing to report.
fn measure_heart_rate(
    samples: &[FrameSample],
    cfg: &PipelineConfig,
) -> Result<(HeartRateEstimate, TimeSeries, Vec<f64>)> {
    cfg.validate()?;
    let series = ChannelSeries::from_samples(samples, cfg.min_frames)?;
    debug!(
        "{} of {} frames carry a skin color",
        series.len(),
        samples.len()
    );
    let pulse = TimeSeries {
        fs: cfg.fps,
        data: recover_pulse(&series)?,
    };
    let estimate = estimate_heart_rate(&pulse, cfg)?;
    debug!(
        "heart rate {:.1} BPM, confidence {:.3}",
        estimate.heart_rate_bpm, estimate.confidence
    );
    Ok((estimate, pulse, series.timestamps))
}

fn measure_hrv(
    pulse: &TimeSeries,
    timestamps: &[f64],
    estimate: &HeartRateEstimate,
    cfg: &PipelineConfig,
) -> Result<HRVReport> {
    let beats = extract_rr(pulse, timestamps, estimate.heart_rate_bpm, cfg)?;
    let time = hrv_time(&beats.rr);
    let freq = hrv_frequency(&beats.rr, &cfg.frequency)?;
    Ok(HRVReport::measured(&time, &freq))
}

/// Measured HRV where possible, otherwise the approximate report.
fn degraded_hrv(
    pulse: &TimeSeries,
    timestamps: &[f64],
    estimate: &HeartRateEstimate,
    cfg: &PipelineConfig,
) -> HRVReport {
    let hr = estimate.heart_rate_bpm;
    let beats = match extract_rr(pulse, timestamps, hr, cfg) {
        Ok(beats) => beats,
        Err(err) => {
            warn!("{err}; using resting SDNN/RMSSD for approximate HRV");
            return HRVReport::approximate(
                hr,
                cfg.fallback.resting_sdnn_ms,
                cfg.fallback.resting_rmssd_ms,
                0.0,
                &cfg.frequency,
            );
        }
    };
    let time = hrv_time(&beats.rr);
    match hrv_frequency(&beats.rr, &cfg.frequency) {
        Ok(freq) => HRVReport::measured(&time, &freq),
        Err(err) => {
            warn!("{err}; approximating LF/HF from heart rate");
            HRVReport::approximate(hr, time.sdnn, time.rmssd, time.pnn50, &cfg.frequency)
        }
    }
}

fn simulated<R: Rng + ?Sized>(cfg: &PipelineConfig, rng: &mut R) -> AnalysisResult {
    let fallback = &cfg.fallback;
    let draw = Normal::new(fallback.simulated_mean_bpm, fallback.simulated_std_bpm)
        .map(|normal| normal.sample(rng))
        .unwrap_or(fallback.simulated_mean_bpm);
    AnalysisResult {
        heart_rate: fallback.simulated_range.clamp(draw),
        confidence: fallback.simulated_confidence,
        hrv: None,
        error: None,
        simulated: true,
    }
}
