use crate::metrics::hrv::HRVReport;
use serde::{Deserialize, Serialize};

/// Coarse stress indication from short-term vagal tone (RMSSD).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StressLevel {
    Low,
    Moderate,
    High,
    Unknown,
}

impl StressLevel {
    pub fn from_rmssd(rmssd_ms: f64) -> Self {
        if !rmssd_ms.is_finite() {
            StressLevel::Unknown
        } else if rmssd_ms > 50.0 {
            StressLevel::Low
        } else if rmssd_ms > 20.0 {
            StressLevel::Moderate
        } else {
            StressLevel::High
        }
    }

    pub fn from_report(report: Option<&HRVReport>) -> Self {
        report.map_or(StressLevel::Unknown, |r| Self::from_rmssd(r.rmssd))
    }
}
