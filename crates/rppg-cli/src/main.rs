use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use rand::{rngs::StdRng, RngCore, SeedableRng};
use rppg_lib::{
    config::{FallbackMode, FrequencyHrvConfig, PipelineConfig},
    io::{samples as samples_io, text as text_io},
    metrics::{hrv_frequency, hrv_time, HRVTime, StressLevel},
    pipeline::{analyze_with_rng, AnalysisResult},
    rppg::estimate_heart_rate,
    signal::{FrameSample, RRSeries, TimeSeries},
};
use serde::Serialize;
use std::{
    io::{self, Read},
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[command(
    name = "rppg",
    version,
    about = "Camera-based heart rate and HRV from per-frame skin colors"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Mode {
    /// Approximate HRV when it cannot be measured
    Degraded,
    /// Report HRV failures as errors
    Strict,
}

impl From<Mode> for FallbackMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Degraded => FallbackMode::Degraded,
            Mode::Strict => FallbackMode::Strict,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Full pipeline on a timestamp,r,g,b CSV read from stdin or --input file
    Analyze {
        #[arg(long)]
        input: Option<PathBuf>,
        /// Overrides the configured frame rate (default 30)
        #[arg(long)]
        fps: Option<f64>,
        /// TOML pipeline configuration
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        mode: Option<Mode>,
        /// Report a flagged simulated heart rate instead of failing
        #[arg(long)]
        simulate_on_failure: bool,
        /// Seed for the simulated fallback
        #[arg(long)]
        seed: Option<u64>,
        /// Add a stress level derived from RMSSD
        #[arg(long)]
        stress: bool,
    },
    /// Heart rate from a newline-delimited pulse signal
    HeartRate {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long, default_value_t = 30.0)]
        fps: f64,
    },
    /// Time-domain HRV from newline-delimited RR intervals (ms)
    HrvTime {
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Frequency-domain HRV (spline resampling + Welch PSD)
    HrvPsd {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long, default_value_t = 4.0)]
        interp_fs: f64,
    },
}

#[derive(Serialize)]
struct AnalyzeOutput {
    #[serde(flatten)]
    result: AnalysisResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    stress: Option<StressLevel>,
}

#[derive(Serialize)]
struct HrvTimeOutput {
    #[serde(flatten)]
    hrv: HRVTime,
    stress: StressLevel,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze {
            input,
            fps,
            config,
            mode,
            simulate_on_failure,
            seed,
            stress,
        } => {
            let cfg = pipeline_config(config.as_deref(), fps, mode, simulate_on_failure)?;
            cmd_analyze(input.as_deref(), &cfg, seed, stress)?
        }
        Commands::HeartRate { input, fps } => cmd_heart_rate(input.as_deref(), fps)?,
        Commands::HrvTime { input } => cmd_hrv_time(input.as_deref())?,
        Commands::HrvPsd { input, interp_fs } => cmd_hrv_psd(input.as_deref(), interp_fs)?,
    }
    Ok(())
}

fn read_stdin() -> Result<String> {
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn read_series(input: Option<&Path>) -> Result<Vec<f64>> {
    match input {
        Some(path) => text_io::read_f64_series(path),
        None => text_io::parse_f64_series(&read_stdin()?),
    }
}

fn read_frame_samples(input: Option<&Path>) -> Result<Vec<FrameSample>> {
    match input {
        Some(path) => samples_io::read_samples_csv(path),
        None => samples_io::parse_samples_csv(read_stdin()?.as_bytes()),
    }
}

fn rr_series_from_input(input: Option<&Path>) -> Result<RRSeries> {
    let rr = read_series(input)?;
    Ok(RRSeries { rr })
}

fn pipeline_config(
    path: Option<&Path>,
    fps: Option<f64>,
    mode: Option<Mode>,
    simulate_on_failure: bool,
) -> Result<PipelineConfig> {
    let mut cfg = match path {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(fps) = fps {
        cfg.fps = fps;
    }
    if let Some(mode) = mode {
        cfg.fallback.mode = mode.into();
    }
    if simulate_on_failure {
        cfg.fallback.simulate_on_failure = true;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn cmd_analyze(
    input: Option<&Path>,
    cfg: &PipelineConfig,
    seed: Option<u64>,
    stress: bool,
) -> Result<()> {
    let samples = read_frame_samples(input)?;
    info!("{} frame samples at {} fps", samples.len(), cfg.fps);
    let mut rng: Box<dyn RngCore> = match seed {
        Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
        None => Box::new(rand::thread_rng()),
    };
    let result = analyze_with_rng(&samples, cfg, rng.as_mut());
    let failed = result.is_failure();
    let error = result.error.clone();
    let output = AnalyzeOutput {
        stress: stress.then(|| StressLevel::from_report(result.hrv.as_ref())),
        result,
    };
    println!("{}", serde_json::to_string(&output)?);
    if failed {
        return Err(anyhow!(
            "analysis failed: {}",
            error.unwrap_or_else(|| "no heart rate".into())
        ));
    }
    Ok(())
}

fn cmd_heart_rate(input: Option<&Path>, fps: f64) -> Result<()> {
    let data = read_series(input)?;
    let cfg = PipelineConfig::default().with_fps(fps);
    cfg.validate()?;
    let estimate = estimate_heart_rate(&TimeSeries { fs: fps, data }, &cfg)?;
    println!("{}", serde_json::to_string(&estimate)?);
    Ok(())
}

fn cmd_hrv_time(input: Option<&Path>) -> Result<()> {
    let rr = rr_series_from_input(input)?;
    let hrv = hrv_time(&rr);
    let output = HrvTimeOutput {
        stress: StressLevel::from_rmssd(hrv.rmssd),
        hrv,
    };
    println!("{}", serde_json::to_string(&output)?);
    Ok(())
}

fn cmd_hrv_psd(input: Option<&Path>, interp_fs: f64) -> Result<()> {
    if !(interp_fs.is_finite() && interp_fs > 0.0) {
        return Err(anyhow!("--interp-fs must be positive, got {}", interp_fs));
    }
    let rr = rr_series_from_input(input)?;
    let cfg = FrequencyHrvConfig {
        interp_fs,
        ..FrequencyHrvConfig::default()
    };
    let psd = hrv_frequency(&rr, &cfg)?;
    println!("{}", serde_json::to_string(&psd)?);
    Ok(())
}
