pub mod peaks;
pub mod pulse;

pub use peaks::{find_peaks, PeakCriteria};
pub use pulse::{detect_pulse_peaks, extract_rr, reject_outliers, rr_from_peaks, PulseRrResult};
