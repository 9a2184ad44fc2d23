use assert_cmd::cargo::cargo_bin_cmd;
use rppg_lib::metrics::HRVReport;
use serde::Deserialize;
use std::{error::Error, io::Write, path::PathBuf};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeOutput {
    heart_rate: f64,
    confidence: f64,
    hrv: Option<HRVReport>,
    error: Option<String>,
    simulated: bool,
    stress: Option<String>,
}

#[test]
fn analyze_recording_with_dropped_frames() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("rppg");
    cmd.args([
        "analyze",
        "--input",
        &sample_path("test_data/synthetic_face_30fps.csv"),
        "--fps",
        "30",
        "--stress",
    ]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let actual: AnalyzeOutput = serde_json::from_slice(&out)?;

    assert_close(actual.heart_rate, 72.72727272727273, 1e-9);
    assert_close(actual.confidence, 0.29232463931915975, 1e-6);
    assert!(actual.error.is_none());
    assert!(!actual.simulated);
    let hrv = actual.hrv.expect("hrv present");
    assert!(!hrv.approximate);
    assert_close(hrv.sdnn, 41.43877070053742, 1e-6);
    assert_close(hrv.rmssd, 56.40760748177675, 1e-6);
    assert_close(hrv.pnn50, 18.181818181818183, 1e-6);
    assert_close(hrv.lf, 244.43908277479633, 1e-4);
    assert_close(hrv.hf, 96.46916091945774, 1e-4);
    assert_eq!(actual.stress.as_deref(), Some("low"));
    Ok(())
}

#[test]
fn analyze_reads_stdin() -> Result<(), Box<dyn Error>> {
    let csv = std::fs::read(sample_path("test_data/synthetic_face_5s.csv"))?;
    let mut cmd = cargo_bin_cmd!("rppg");
    cmd.arg("analyze").write_stdin(csv);
    let out = cmd.assert().success().get_output().stdout.clone();
    let actual: AnalyzeOutput = serde_json::from_slice(&out)?;
    assert_close(actual.heart_rate, 72.0, 1e-9);
    assert!(actual.hrv.expect("approximate hrv").approximate);
    assert!(actual.stress.is_none());
    Ok(())
}

#[test]
fn strict_config_reports_missing_hrv() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("rppg");
    cmd.args([
        "analyze",
        "--input",
        &sample_path("test_data/synthetic_face_5s.csv"),
        "--config",
        &sample_path("test_data/strict.toml"),
    ]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let actual: AnalyzeOutput = serde_json::from_slice(&out)?;
    assert_close(actual.heart_rate, 72.0, 1e-9);
    assert!(actual.hrv.is_none());
    assert!(actual
        .error
        .expect("error")
        .starts_with("insufficient HRV data"));
    Ok(())
}

#[test]
fn mode_flag_overrides_config() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("rppg");
    cmd.args([
        "analyze",
        "--input",
        &sample_path("test_data/synthetic_face_5s.csv"),
        "--config",
        &sample_path("test_data/strict.toml"),
        "--mode",
        "degraded",
    ]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let actual: AnalyzeOutput = serde_json::from_slice(&out)?;
    assert!(actual.error.is_none());
    assert!(actual.hrv.expect("hrv").approximate);
    Ok(())
}

#[test]
fn too_few_frames_fails() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("rppg");
    cmd.args(["analyze", "--input", &sample_path("test_data/too_short.csv")]);
    let out = cmd.assert().failure().get_output().stdout.clone();
    let actual: AnalyzeOutput = serde_json::from_slice(&out)?;
    assert_eq!(actual.heart_rate, 0.0);
    assert_eq!(actual.confidence, 0.0);
    assert!(actual.hrv.is_none());
    assert!(actual.error.expect("error").contains("insufficient frames"));
    Ok(())
}

#[test]
fn simulated_fallback_is_seeded() -> Result<(), Box<dyn Error>> {
    let run = || -> Result<AnalyzeOutput, Box<dyn Error>> {
        let mut cmd = cargo_bin_cmd!("rppg");
        cmd.args([
            "analyze",
            "--input",
            &sample_path("test_data/too_short.csv"),
            "--simulate-on-failure",
            "--seed",
            "7",
        ]);
        let out = cmd.assert().success().get_output().stdout.clone();
        Ok(serde_json::from_slice(&out)?)
    };
    let first = run()?;
    let second = run()?;
    assert!(first.simulated);
    assert!((60.0..=100.0).contains(&first.heart_rate));
    assert_eq!(first.confidence, 0.3);
    assert!(first.hrv.is_none());
    assert_eq!(first.heart_rate, second.heart_rate);
    Ok(())
}

#[test]
fn invalid_config_is_rejected() -> Result<(), Box<dyn Error>> {
    let mut config = tempfile::NamedTempFile::new()?;
    writeln!(config, "fps = -5.0")?;
    let mut cmd = cargo_bin_cmd!("rppg");
    cmd.args([
        "analyze",
        "--input",
        &sample_path("test_data/synthetic_face_5s.csv"),
        "--config",
        config.path().to_str().expect("utf8 path"),
    ]);
    cmd.assert().failure();
    Ok(())
}

fn sample_path(relative: &str) -> String {
    workspace_root()
        .join(relative)
        .to_string_lossy()
        .to_string()
}

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .to_path_buf()
}

fn assert_close(actual: f64, expected: f64, rel_tol: f64) {
    let tol = expected.abs().max(1.0) * rel_tol;
    let diff = (actual - expected).abs();
    assert!(
        diff <= tol,
        "expected {expected}, got {actual} (diff {diff} > tol {tol})"
    );
}
