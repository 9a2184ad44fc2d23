pub mod config;
pub mod detectors;
pub mod dsp;
pub mod error;
pub mod io;
pub mod metrics;
pub mod pipeline;
pub mod rppg;
pub mod signal;
pub mod source;

pub use config::*;
pub use error::*;
pub use pipeline::*;
pub use signal::*;
