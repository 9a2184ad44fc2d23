use crate::config::PipelineConfig;
use crate::dsp::{magnitude_spectrum, BandpassFilter};
use crate::error::{PipelineError, Result};
use crate::signal::TimeSeries;
use log::debug;
use serde::{Deserialize, Serialize};

/// Dominant pulse frequency with a spectral confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartRateEstimate {
    pub heart_rate_bpm: f64,
    /// Share of in-band spectral magnitude held by the peak bin, in [0, 1].
    pub confidence: f64,
    pub dominant_hz: f64,
}

/// Band-pass the pulse (zero phase), take its magnitude spectrum and pick
/// the strongest bin inside the heart-rate band.
pub fn estimate_heart_rate(pulse: &TimeSeries, cfg: &PipelineConfig) -> Result<HeartRateEstimate> {
    let band = cfg.heart_rate_band;
    let filter = BandpassFilter::butterworth(cfg.filter_order, band, pulse.fs)?;
    let filtered = filter.filtfilt(&pulse.data);
    let spectrum = magnitude_spectrum(&filtered, pulse.fs);

    let mut peak: Option<(f64, f64)> = None;
    let mut total = 0.0;
    for (&freq, &mag) in spectrum.freqs.iter().zip(&spectrum.magnitudes) {
        if !band.contains(freq) {
            continue;
        }
        total += mag;
        match peak {
            Some((_, best)) if mag <= best => {}
            _ => peak = Some((freq, mag)),
        }
    }
    let (dominant_hz, peak_mag) = peak.ok_or(PipelineError::NoValidFrequencyBand)?;
    let confidence = if total > 0.0 {
        (peak_mag / total).clamp(0.0, 1.0)
    } else {
        0.0
    };
    debug!(
        "dominant pulse frequency {:.3} Hz over {} samples, confidence {:.3}",
        dominant_hz,
        pulse.len(),
        confidence
    );
    Ok(HeartRateEstimate {
        heart_rate_bpm: dominant_hz * 60.0,
        confidence,
        dominant_hz,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FrequencyBand;
    use std::f64::consts::PI;

    fn tone(freq: f64, fs: f64, n: usize) -> TimeSeries {
        TimeSeries {
            fs,
            data: (0..n)
                .map(|i| (2.0 * PI * freq * i as f64 / fs).sin())
                .collect(),
        }
    }

    #[test]
    fn recovers_on_bin_tone_with_high_confidence() {
        let cfg = PipelineConfig::default();
        let est = estimate_heart_rate(&tone(1.2, 30.0, 300), &cfg).unwrap();
        assert!((est.heart_rate_bpm - 72.0).abs() < 1e-9);
        assert!(est.confidence > 0.5, "confidence {}", est.confidence);
    }

    #[test]
    fn off_bin_tone_within_one_bin() {
        let cfg = PipelineConfig::default();
        let fs = 30.0;
        let n = 300;
        let bin_bpm = fs / n as f64 * 60.0;
        for freq in [0.85, 1.25, 1.9, 2.45, 3.3] {
            let est = estimate_heart_rate(&tone(freq, fs, n), &cfg).unwrap();
            assert!(
                (est.heart_rate_bpm - freq * 60.0).abs() <= bin_bpm,
                "{freq} Hz -> {} BPM",
                est.heart_rate_bpm
            );
            assert!((0.0..=1.0).contains(&est.confidence));
        }
    }

    #[test]
    fn works_at_low_capture_rate() {
        let cfg = PipelineConfig::default();
        let est = estimate_heart_rate(&tone(1.2, 10.0, 100), &cfg).unwrap();
        assert!((est.heart_rate_bpm - 72.0).abs() < 1e-9);
    }

    #[test]
    fn no_bin_in_band_is_reported() {
        // Ten samples at 30 fps give 3 Hz bins: 0, 3, 6, ... and a band
        // narrower than that catches none of them.
        let mut cfg = PipelineConfig::default();
        cfg.heart_rate_band = FrequencyBand::new(1.0, 2.5);
        let err = estimate_heart_rate(&tone(1.2, 30.0, 10), &cfg).unwrap_err();
        assert_eq!(err, PipelineError::NoValidFrequencyBand);
    }

    #[test]
    fn silent_signal_has_zero_confidence() {
        let cfg = PipelineConfig::default();
        let silent = TimeSeries {
            fs: 30.0,
            data: vec![0.0; 300],
        };
        let est = estimate_heart_rate(&silent, &cfg).unwrap();
        assert_eq!(est.confidence, 0.0);
        assert!((est.dominant_hz - 0.7).abs() < 1e-12);
    }

    #[test]
    fn deterministic() {
        let cfg = PipelineConfig::default();
        let pulse = tone(1.4, 30.0, 256);
        assert_eq!(
            estimate_heart_rate(&pulse, &cfg).unwrap(),
            estimate_heart_rate(&pulse, &cfg).unwrap()
        );
    }
}
