use crate::{
    config::{Bounds, PipelineConfig},
    detectors::peaks::{find_peaks, PeakCriteria},
    dsp::{stats::std_dev, BandpassFilter},
    error::{PipelineError, Result},
    signal::{Events, RRSeries, TimeSeries},
};
use log::debug;
use serde::{Deserialize, Serialize};

/// Combined result of pulse peak detection and RR extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PulseRrResult {
    pub fs: f64,
    pub sample_count: usize,
    pub events: Events,
    /// Every interval between consecutive peaks (ms).
    pub raw_rr: RRSeries,
    /// Intervals left after outlier rejection (ms).
    pub rr: RRSeries,
}

/// Detect individual pulse peaks.
///
/// The pulse is re-filtered with the narrower peak band, then local maxima
/// must stand out by a fraction of the signal's spread and be spaced by a
/// fraction of the beat period implied by `heart_rate_bpm`.
pub fn detect_pulse_peaks(
    pulse: &TimeSeries,
    heart_rate_bpm: f64,
    cfg: &PipelineConfig,
) -> Result<Events> {
    if pulse.is_empty() {
        return Ok(Events::from_indices(Vec::new()));
    }
    let filter = BandpassFilter::butterworth(cfg.filter_order, cfg.peaks.band, pulse.fs)?;
    let shaped = filter.filtfilt(&pulse.data);
    let min_distance = if heart_rate_bpm > 0.0 {
        cfg.peaks.distance_factor * pulse.fs * 60.0 / heart_rate_bpm
    } else {
        0.0
    };
    let criteria = PeakCriteria {
        min_prominence: cfg.peaks.prominence_factor * std_dev(&shaped),
        min_distance,
    };
    let peaks = find_peaks(&shaped, criteria);
    debug!(
        "{} pulse peaks (min distance {:.1} samples, min prominence {:.4})",
        peaks.len(),
        criteria.min_distance,
        criteria.min_prominence
    );
    Ok(Events::from_indices(peaks))
}

/// RR intervals between consecutive peaks, timed by `timestamps` (seconds).
pub fn rr_from_peaks(events: &Events, timestamps: &[f64]) -> Result<RRSeries> {
    if events.len() < 2 {
        return Err(PipelineError::InsufficientPeaks(events.len()));
    }
    Ok(RRSeries::from_events(events, timestamps))
}

/// Keep intervals strictly inside `(bounds.min × mean, bounds.max × mean)`.
pub fn reject_outliers(rr: &RRSeries, bounds: Bounds) -> RRSeries {
    let mean = rr.mean();
    let low = bounds.min * mean;
    let high = bounds.max * mean;
    RRSeries {
        rr: rr
            .rr
            .iter()
            .copied()
            .filter(|&x| x > low && x < high)
            .collect(),
    }
}

/// Peak detection → RR intervals → outlier rejection.
pub fn extract_rr(
    pulse: &TimeSeries,
    timestamps: &[f64],
    heart_rate_bpm: f64,
    cfg: &PipelineConfig,
) -> Result<PulseRrResult> {
    let events = detect_pulse_peaks(pulse, heart_rate_bpm, cfg)?;
    let raw_rr = rr_from_peaks(&events, timestamps)?;
    let rr = reject_outliers(&raw_rr, cfg.peaks.outlier_bounds);
    if rr.len() < cfg.peaks.min_valid_rr {
        return Err(PipelineError::InsufficientValidRr {
            found: rr.len(),
            required: cfg.peaks.min_valid_rr,
        });
    }
    debug!(
        "{} of {} RR intervals kept, mean {:.1} ms",
        rr.len(),
        raw_rr.len(),
        rr.mean()
    );
    Ok(PulseRrResult {
        fs: pulse.fs,
        sample_count: pulse.len(),
        events,
        raw_rr,
        rr,
    })
}
