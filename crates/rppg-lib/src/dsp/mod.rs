pub mod butterworth;
pub mod linalg;
pub mod spectrum;
pub mod spline;
pub mod stats;

pub use butterworth::BandpassFilter;
pub use spectrum::{integrate_band, magnitude_spectrum, welch_psd, Psd, Spectrum};
pub use spline::CubicSpline;
