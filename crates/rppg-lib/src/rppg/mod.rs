//! Remote photoplethysmography: from per-frame skin colors to a pulse
//! waveform and a heart-rate estimate.

pub mod heart_rate;
pub mod pos;

pub use heart_rate::{estimate_heart_rate, HeartRateEstimate};
pub use pos::recover_pulse;
