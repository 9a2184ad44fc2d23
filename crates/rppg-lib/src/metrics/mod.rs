pub mod hrv;
pub mod stress;

pub use hrv::{hrv_frequency, hrv_time, HRVFrequency, HRVReport, HRVTime};
pub use stress::StressLevel;
