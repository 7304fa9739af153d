//! Tab-separated measurement logs.
//!
//! One reading per line, ground truth appended:
//! ```text
//! L  px   py   timestamp_us           gt_px gt_py gt_vx gt_vy
//! R  rho  phi  rho_dot  timestamp_us  gt_px gt_py gt_vx gt_vy
//! ```
//! Files ending in `.gz` are decompressed on the fly.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use anyhow::Context;
use flate2::read::GzDecoder;
use nalgebra::Vector4;
use serde::Serialize;

use crate::error::{FilterError, FilterResult};
use crate::types::{MeasurementPackage, SensorType};

/// True (px, py, vx, vy) recorded alongside a measurement.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GroundTruth {
    pub px: f64,
    pub py: f64,
    pub vx: f64,
    pub vy: f64,
}

impl GroundTruth {
    pub fn as_vector(&self) -> Vector4<f64> {
        Vector4::new(self.px, self.py, self.vx, self.vy)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    pub measurement: MeasurementPackage,
    pub ground_truth: Option<GroundTruth>,
}

/// Parse a single log line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> FilterResult<Option<Sample>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut fields = line.split_whitespace();
    let sensor = match fields.next() {
        Some("L") => SensorType::Position,
        Some("R") => SensorType::RangeBearing,
        Some(other) => {
            return Err(FilterError::InvalidInput(format!(
                "unknown sensor tag '{other}'"
            )))
        }
        None => return Ok(None),
    };

    let dim = sensor.measurement_dim();
    let values = fields
        .by_ref()
        .take(dim)
        .map(parse_f64)
        .collect::<FilterResult<Vec<_>>>()?;

    let timestamp_us = match fields.next() {
        Some(raw) => raw.parse::<i64>().map_err(|_| {
            FilterError::InvalidInput(format!("invalid timestamp '{raw}'"))
        })?,
        None => {
            return Err(FilterError::InvalidInput(format!(
                "{sensor} line has {} of {dim} values and no timestamp",
                values.len()
            )))
        }
    };

    let measurement = MeasurementPackage::from_raw(sensor, &values, timestamp_us)?;

    let truth = fields.map(parse_f64).collect::<FilterResult<Vec<_>>>()?;
    let ground_truth = match truth.as_slice() {
        [] => None,
        [px, py, vx, vy, ..] => Some(GroundTruth {
            px: *px,
            py: *py,
            vx: *vx,
            vy: *vy,
        }),
        partial => {
            return Err(FilterError::InvalidInput(format!(
                "expected 4 ground truth values, got {}",
                partial.len()
            )))
        }
    };

    Ok(Some(Sample {
        measurement,
        ground_truth,
    }))
}

fn parse_f64(raw: &str) -> FilterResult<f64> {
    raw.parse::<f64>()
        .map_err(|_| FilterError::InvalidInput(format!("invalid number '{raw}'")))
}

/// Read every sample from a reader, reporting the offending line number.
pub fn read_samples<R: BufRead>(reader: R) -> anyhow::Result<Vec<Sample>> {
    let mut samples = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if let Some(sample) = parse_line(&line).with_context(|| format!("line {}", idx + 1))? {
            samples.push(sample);
        }
    }
    Ok(samples)
}

/// Load a measurement log from disk (plain text or `.gz`).
pub fn load(path: &Path) -> anyhow::Result<Vec<Sample>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let reader: Box<dyn Read> = if path.extension().map(|e| e == "gz").unwrap_or(false) {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    read_samples(BufReader::new(reader)).with_context(|| format!("reading {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawMeasurement;
    use approx::assert_relative_eq;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::{Cursor, Write};

    const LOG: &str = "\
L\t3.122427e-01\t5.803398e-01\t1477010443000000\t6.000000e-01\t6.000000e-01\t5.199937e+00\t0\n\
R\t1.014892e+00\t5.543292e-01\t4.892807e+00\t1477010443050000\t8.599968e-01\t6.000449e-01\t5.199747e+00\t1.796856e-03\n\
\n\
# trailing comment\n";

    #[test]
    fn test_parse_position_line() {
        let sample = parse_line("L\t1.5\t-2.0\t1000\t1.4\t-2.1\t0.5\t0.0")
            .unwrap()
            .unwrap();
        assert_eq!(sample.measurement, MeasurementPackage::position(1.5, -2.0, 1000));
        let gt = sample.ground_truth.unwrap();
        assert_eq!(gt.as_vector(), Vector4::new(1.4, -2.1, 0.5, 0.0));
    }

    #[test]
    fn test_parse_range_bearing_line() {
        let sample = parse_line("R 1.0 0.5 -0.3 2000").unwrap().unwrap();
        match sample.measurement.raw {
            RawMeasurement::RangeBearing { rho, phi, rho_dot } => {
                assert_eq!((rho, phi, rho_dot), (1.0, 0.5, -0.3));
            }
            other => panic!("unexpected measurement {other:?}"),
        }
        assert_eq!(sample.measurement.timestamp_us, 2000);
        assert!(sample.ground_truth.is_none());
    }

    #[test]
    fn test_extra_ground_truth_columns_ignored() {
        let sample = parse_line("L 1 2 3 4 5 6 7 0.1 0.2").unwrap().unwrap();
        assert_eq!(sample.ground_truth.unwrap().vy, 7.0);
    }

    #[test]
    fn test_skips_blank_and_comments() {
        assert!(parse_line("").unwrap().is_none());
        assert!(parse_line("   ").unwrap().is_none());
        assert!(parse_line("# header").unwrap().is_none());
    }

    #[test]
    fn test_rejects_malformed_lines() {
        for line in [
            "X 1 2 3",
            "L 1 2",
            "L 1 abc 3",
            "R 1 2 3 4.5",
            "L 1 2 3 4 5",
            "L nan 2 3",
        ] {
            assert!(parse_line(line).is_err(), "accepted '{line}'");
        }
    }

    #[test]
    fn test_read_samples() {
        let samples = read_samples(Cursor::new(LOG)).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].measurement.sensor_type(), SensorType::Position);
        assert_eq!(samples[1].measurement.sensor_type(), SensorType::RangeBearing);
        assert_eq!(samples[1].measurement.timestamp_us, 1477010443050000);
        assert_relative_eq!(samples[1].ground_truth.unwrap().px, 0.8599968, epsilon = 1e-12);
    }

    #[test]
    fn test_read_samples_reports_line() {
        let err = read_samples(Cursor::new("L 1 2 3\nL oops 2 3\n")).unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn test_load_gzip() {
        let path = std::env::temp_dir().join(format!("ukf_dataset_{}.txt.gz", std::process::id()));
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(LOG.as_bytes()).unwrap();
        encoder.finish().unwrap();

        let samples = load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(samples.len(), 2);
    }
}
