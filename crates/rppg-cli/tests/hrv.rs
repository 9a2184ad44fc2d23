use assert_cmd::cargo::cargo_bin_cmd;
use serde::Deserialize;
use std::{error::Error, path::PathBuf};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HeartRateOutput {
    heart_rate_bpm: f64,
    confidence: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HrvTimeOutput {
    n: usize,
    mean_nn: f64,
    sdnn: f64,
    rmssd: f64,
    pnn50: f64,
    stress: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HrvPsdOutput {
    lf: f64,
    hf: f64,
    lf_hf: f64,
    points: Vec<[f64; 2]>,
}

#[test]
fn heart_rate_from_pulse_file() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("rppg");
    cmd.args([
        "heart-rate",
        "--input",
        &sample_path("test_data/pulse_1_2hz_30fps.txt"),
        "--fps",
        "30",
    ]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let value: HeartRateOutput = serde_json::from_slice(&out)?;
    assert_close(value.heart_rate_bpm, 72.0, 1e-9);
    assert!(value.confidence > 0.5);
    Ok(())
}

#[test]
fn hrv_time_reference_values() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("rppg");
    cmd.args(["hrv-time", "--input", &sample_path("test_data/rr_short_ms.txt")]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let value: HrvTimeOutput = serde_json::from_slice(&out)?;
    assert_eq!(value.n, 5);
    assert_close(value.mean_nn, 813.0, 1e-12);
    assert_close(value.sdnn, 145f64.sqrt(), 1e-12);
    assert_close(value.rmssd, 381.25f64.sqrt(), 1e-12);
    assert_eq!(value.pnn50, 0.0);
    assert_eq!(value.stress, "high");
    Ok(())
}

#[test]
fn hrv_time_reads_stdin() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("rppg");
    cmd.arg("hrv-time").write_stdin("# ms\n900\n800\n905\n810\n");
    let out = cmd.assert().success().get_output().stdout.clone();
    let value: HrvTimeOutput = serde_json::from_slice(&out)?;
    assert_eq!(value.n, 4);
    assert_close(value.pnn50, 100.0, 1e-12);
    assert_eq!(value.stress, "low");
    Ok(())
}

#[test]
fn hrv_psd_low_frequency_series() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("rppg");
    cmd.args([
        "hrv-psd",
        "--input",
        &sample_path("test_data/rr_lf_ms.txt"),
        "--interp-fs",
        "4",
    ]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let value: HrvPsdOutput = serde_json::from_slice(&out)?;
    assert!(value.lf > value.hf);
    assert_close(value.lf, 1249.0192111323565, 1e-6);
    assert_close(value.hf, 0.5, 1e-12);
    assert_close(value.lf_hf, 10.0, 1e-12);
    assert!(value.points.len() > 10);
    Ok(())
}

#[test]
fn hrv_psd_rejects_short_series() {
    let mut cmd = cargo_bin_cmd!("rppg");
    cmd.args(["hrv-psd", "--input", &sample_path("test_data/rr_short_ms.txt")]);
    cmd.assert().failure();
}

fn sample_path(relative: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .join(relative)
        .to_string_lossy()
        .to_string()
}

fn assert_close(actual: f64, expected: f64, rel_tol: f64) {
    let tol = expected.abs().max(1.0) * rel_tol;
    let diff = (actual - expected).abs();
    assert!(
        diff <= tol,
        "expected {expected}, got {actual} (diff {diff} > tol {tol})"
    );
}
