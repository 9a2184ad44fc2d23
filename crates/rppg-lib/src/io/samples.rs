//! Precomputed per-frame skin colors stored as CSV.
//!
//! Columns: `timestamp,r,g,b` (seconds, channel means). A row whose color
//! cells are empty marks a frame with no usable skin region.

use crate::signal::{FrameSample, Rgb};
use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

pub fn read_samples_csv(path: &Path) -> Result<Vec<FrameSample>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    parse_samples_csv(file).with_context(|| format!("reading {}", path.display()))
}

pub fn parse_samples_csv<R: Read>(input: R) -> Result<Vec<FrameSample>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(input);
    let headers = reader.headers().context("reading header")?.clone();
    let ts_idx = locate_column(&headers, "timestamp")?;
    let idx = [
        locate_column(&headers, "r")?,
        locate_column(&headers, "g")?,
        locate_column(&headers, "b")?,
    ];

    let mut samples: Vec<FrameSample> = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result.context("reading record")?;
        let line = row + 2;
        let timestamp = record
            .get(ts_idx)
            .ok_or_else(|| anyhow::anyhow!("line {line}: missing timestamp"))?
            .parse::<f64>()
            .with_context(|| format!("line {line}: parsing timestamp"))?;
        if let Some(prev) = samples.last() {
            if timestamp <= prev.timestamp_sec {
                anyhow::bail!("line {line}: timestamps must be strictly increasing");
            }
        }
        let cells: Vec<&str> = idx
            .iter()
            .map(|&i| record.get(i).unwrap_or(""))
            .collect();
        let sample = if cells.iter().any(|c| c.is_empty()) {
            FrameSample::missing(timestamp)
        } else {
            let mut channel = [0.0; 3];
            for (value, cell) in channel.iter_mut().zip(&cells) {
                *value = cell
                    .parse::<f64>()
                    .with_context(|| format!("line {line}: parsing color value {cell:?}"))?;
            }
            FrameSample::new(Rgb::new(channel[0], channel[1], channel[2]), timestamp)
        };
        samples.push(sample);
    }
    Ok(samples)
}

/// Write samples in the layout accepted by [`read_samples_csv`].
pub fn write_samples_csv<W: Write>(output: W, samples: &[FrameSample]) -> Result<()> {
    let mut writer = WriterBuilder::new().from_writer(output);
    writer.write_record(["timestamp", "r", "g", "b"])?;
    for sample in samples {
        let ts = sample.timestamp_sec.to_string();
        match sample.color {
            Some(c) => {
                writer.write_record([ts, c.r.to_string(), c.g.to_string(), c.b.to_string()])?
            }
            None => writer.write_record([ts.as_str(), "", "", ""])?,
        }
    }
    writer.flush().context("flushing samples")?;
    Ok(())
}

fn locate_column(headers: &StringRecord, requested: &str) -> Result<usize> {
    headers
        .iter()
        .position(|name| name.eq_ignore_ascii_case(requested))
        .ok_or_else(|| anyhow::anyhow!("missing {} column", requested))
}
