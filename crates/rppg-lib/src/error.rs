//! Error kinds raised by the individual pipeline stages.

use thiserror::Error;

/// Failure of a single stage of the rPPG pipeline.
///
/// Stages return these as values; the fallback policy in
/// [`crate::pipeline`] decides whether a failure ends the request.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Fewer usable color samples than the configured minimum.
    #[error("insufficient frames: {found} usable samples (minimum {required})")]
    InsufficientFrames { found: usize, required: usize },

    /// A zero-variance channel or projection made normalization impossible.
    #[error("degenerate signal: {0}")]
    DegenerateSignal(String),

    /// No spectral bin fell inside the heart-rate band.
    #[error("No valid frequency components found")]
    NoValidFrequencyBand,

    /// Fewer than two pulse peaks were detected.
    #[error("insufficient peaks: found {0}, need at least 2")]
    InsufficientPeaks(usize),

    /// Too few RR intervals survived outlier rejection.
    #[error("insufficient valid RR intervals: {found} after outlier rejection (minimum {required})")]
    InsufficientValidRr { found: usize, required: usize },

    /// Not enough data for frequency-domain HRV.
    #[error("insufficient HRV data: {0}")]
    InsufficientHrvData(String),

    /// A configuration value was rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PipelineError {
    /// Whether the failure happened at or before heart-rate estimation, in
    /// which case no heart rate can be reported.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PipelineError::InsufficientFrames { .. }
                | PipelineError::DegenerateSignal(_)
                | PipelineError::NoValidFrequencyBand
                | PipelineError::InvalidConfig(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
