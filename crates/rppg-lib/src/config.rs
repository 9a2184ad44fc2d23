//! Tunable constants of the pipeline.
//!
//! Deployments differ in capture cadence and in how they treat missing HRV
//! data, so every value that differs between them lives here and can be
//! loaded from a TOML file:
//!
//! ```toml
//! fps = 20.0
//!
//! [fallback]
//! mode = "strict"
//! ```

use crate::error::{PipelineError, Result as StageResult};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Inclusive frequency range in Hz.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBand {
    pub low_hz: f64,
    pub high_hz: f64,
}

impl FrequencyBand {
    pub const fn new(low_hz: f64, high_hz: f64) -> Self {
        Self { low_hz, high_hz }
    }

    pub fn contains(&self, freq_hz: f64) -> bool {
        freq_hz >= self.low_hz && freq_hz <= self.high_hz
    }

    fn validate(&self, name: &str) -> StageResult<()> {
        if !(self.low_hz > 0.0 && self.low_hz < self.high_hz && self.high_hz.is_finite()) {
            return Err(PipelineError::InvalidConfig(format!(
                "{name}: expected 0 < low_hz < high_hz, got {}..{}",
                self.low_hz, self.high_hz
            )));
        }
        Ok(())
    }
}

/// Closed interval used for clamping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    fn validate(&self, name: &str) -> StageResult<()> {
        if !(self.min.is_finite() && self.max.is_finite() && self.min <= self.max) {
            return Err(PipelineError::InvalidConfig(format!(
                "{name}: expected min <= max, got {}..{}",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

/// What to return when a stage lacks data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackMode {
    /// Substitute approximate HRV values derived from heart rate, SDNN and RMSSD.
    #[default]
    Degraded,
    /// Report the failure; HRV is omitted.
    Strict,
}

/// Pulse peak detection and RR outlier rejection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeakConfig {
    /// Band-pass applied before peak picking (Hz).
    pub band: FrequencyBand,
    /// Minimum prominence as a multiple of the filtered signal's standard deviation.
    pub prominence_factor: f64,
    /// Minimum peak spacing as a fraction of the expected beat period.
    pub distance_factor: f64,
    /// RR intervals must lie strictly inside (low × mean, high × mean).
    pub outlier_bounds: Bounds,
    /// Minimum number of RR intervals left after outlier rejection.
    pub min_valid_rr: usize,
}

impl Default for PeakConfig {
    fn default() -> Self {
        Self {
            band: FrequencyBand::new(0.8, 3.5),
            prominence_factor: 0.3,
            distance_factor: 0.65,
            outlier_bounds: Bounds::new(0.45, 1.55),
            min_valid_rr: 3,
        }
    }
}

/// Frequency-domain HRV parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrequencyHrvConfig {
    /// Uniform resampling rate of the RR deviation signal (Hz).
    pub interp_fs: f64,
    /// Upper bound on the Welch segment length.
    pub max_segment: usize,
    pub lf_band: FrequencyBand,
    pub hf_band: FrequencyBand,
    /// Clamp for LF power (ms²).
    pub lf_clamp: Bounds,
    /// Clamp for HF power (ms²).
    pub hf_clamp: Bounds,
    pub ratio_clamp: Bounds,
    /// HF power at or below this uses `default_ratio` instead of LF/HF.
    pub min_hf_for_ratio: f64,
    pub default_ratio: f64,
}

impl Default for FrequencyHrvConfig {
    fn default() -> Self {
        Self {
            interp_fs: 4.0,
            max_segment: 256,
            lf_band: FrequencyBand::new(0.04, 0.15),
            hf_band: FrequencyBand::new(0.15, 0.4),
            lf_clamp: Bounds::new(1.0, 10_000.0),
            hf_clamp: Bounds::new(0.5, 10_000.0),
            ratio_clamp: Bounds::new(0.1, 10.0),
            min_hf_for_ratio: 0.1,
            default_ratio: 2.0,
        }
    }
}

impl FrequencyHrvConfig {
    /// LF/HF with the fallback ratio for negligible HF power.
    pub fn ratio(&self, lf: f64, hf: f64) -> f64 {
        let ratio = if hf > self.min_hf_for_ratio {
            lf / hf
        } else {
            self.default_ratio
        };
        self.ratio_clamp.clamp(ratio)
    }
}

/// Fallback policy settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    pub mode: FallbackMode,
    /// Replace a fatal failure with a clearly flagged simulated heart rate.
    pub simulate_on_failure: bool,
    /// SDNN substituted when no RR series could be built (ms).
    pub resting_sdnn_ms: f64,
    /// RMSSD substituted when no RR series could be built (ms).
    pub resting_rmssd_ms: f64,
    pub simulated_mean_bpm: f64,
    pub simulated_std_bpm: f64,
    pub simulated_range: Bounds,
    pub simulated_confidence: f64,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            mode: FallbackMode::Degraded,
            simulate_on_failure: false,
            resting_sdnn_ms: 50.0,
            resting_rmssd_ms: 42.0,
            simulated_mean_bpm: 75.0,
            simulated_std_bpm: 10.0,
            simulated_range: Bounds::new(60.0, 100.0),
            simulated_confidence: 0.3,
        }
    }
}

/// Complete pipeline configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Frame rate of the color samples (frames per second).
    pub fps: f64,
    /// Minimum number of frames with a usable skin color.
    pub min_frames: usize,
    /// Butterworth order used for both band-pass filters.
    pub filter_order: usize,
    /// Plausible heart-rate band (Hz); 0.7–4.0 Hz is 42–240 BPM.
    pub heart_rate_band: FrequencyBand,
    pub peaks: PeakConfig,
    pub frequency: FrequencyHrvConfig,
    pub fallback: FallbackConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fps: 30.0,
            min_frames: 10,
            filter_order: 3,
            heart_rate_band: FrequencyBand::new(0.7, 4.0),
            peaks: PeakConfig::default(),
            frequency: FrequencyHrvConfig::default(),
            fallback: FallbackConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn with_fps(mut self, fps: f64) -> Self {
        self.fps = fps;
        self
    }

    pub fn with_mode(mut self, mode: FallbackMode) -> Self {
        self.fallback.mode = mode;
        self
    }

    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let cfg: PipelineConfig = toml::from_str(text).context("parsing pipeline config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn validate(&self) -> StageResult<()> {
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "fps must be positive, got {}",
                self.fps
            )));
        }
        if self.min_frames < 3 {
            return Err(PipelineError::InvalidConfig(format!(
                "min_frames must be at least 3, got {}",
                self.min_frames
            )));
        }
        if !(1..=8).contains(&self.filter_order) {
            return Err(PipelineError::InvalidConfig(format!(
                "filter_order must be within 1..=8, got {}",
                self.filter_order
            )));
        }
        self.heart_rate_band.validate("heart_rate_band")?;
        self.peaks.band.validate("peaks.band")?;
        if self.peaks.prominence_factor < 0.0 || self.peaks.distance_factor < 0.0 {
            return Err(PipelineError::InvalidConfig(
                "peak factors must be non-negative".into(),
            ));
        }
        self.peaks.outlier_bounds.validate("peaks.outlier_bounds")?;
        if self.peaks.min_valid_rr < 1 {
            return Err(PipelineError::InvalidConfig(
                "peaks.min_valid_rr must be at least 1".into(),
            ));
        }
        let freq = &self.frequency;
        if !(freq.interp_fs.is_finite() && freq.interp_fs > 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "frequency.interp_fs must be positive, got {}",
                freq.interp_fs
            )));
        }
        if freq.max_segment < 2 {
            return Err(PipelineError::InvalidConfig(
                "frequency.max_segment must be at least 2".into(),
            ));
        }
        freq.lf_band.validate("frequency.lf_band")?;
        freq.hf_band.validate("frequency.hf_band")?;
        freq.lf_clamp.validate("frequency.lf_clamp")?;
        freq.hf_clamp.validate("frequency.hf_clamp")?;
        freq.ratio_clamp.validate("frequency.ratio_clamp")?;
        self.fallback
            .simulated_range
            .validate("fallback.simulated_range")?;
        if !(0.0..=1.0).contains(&self.fallback.simulated_confidence) {
            return Err(PipelineError::InvalidConfig(
                "fallback.simulated_confidence must be within [0, 1]".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let cfg = PipelineConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.fps, 30.0);
        assert_eq!(cfg.min_frames, 10);
        assert_eq!(cfg.fallback.mode, FallbackMode::Degraded);
        assert!(!cfg.fallback.simulate_on_failure);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = PipelineConfig::from_toml_str(
            r#"
            fps = 20.0

            [fallback]
            mode = "strict"

            [peaks]
            distance_factor = 0.5
            "#,
        )
        .unwrap();
        assert_eq!(cfg.fps, 20.0);
        assert_eq!(cfg.fallback.mode, FallbackMode::Strict);
        assert_eq!(cfg.peaks.distance_factor, 0.5);
        assert_eq!(cfg.peaks.prominence_factor, 0.3);
        assert_eq!(cfg.frequency.interp_fs, 4.0);
    }

    #[test]
    fn rejects_inverted_band() {
        let err = PipelineConfig::from_toml_str(
            r#"
            [heart_rate_band]
            low_hz = 4.0
            high_hz = 0.7
            "#,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("heart_rate_band"));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "fps = 10.0\nmin_frames = 12").unwrap();
        let cfg = PipelineConfig::load(file.path()).unwrap();
        assert_eq!(cfg.fps, 10.0);
        assert_eq!(cfg.min_frames, 12);
    }

    #[test]
    fn ratio_uses_default_for_tiny_hf() {
        let freq = FrequencyHrvConfig::default();
        assert_eq!(freq.ratio(40.0, 0.05), 2.0);
        assert_eq!(freq.ratio(500.0, 1.0), 10.0);
        assert_eq!(freq.ratio(1.0, 50.0), 0.1);
        assert!((freq.ratio(30.0, 20.0) - 1.5).abs() < 1e-12);
    }
}
