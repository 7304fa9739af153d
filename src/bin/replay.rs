use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use ctrv_ukf::dataset;
use ctrv_ukf::tools::{calculate_rmse, cartesian_estimate, NisMonitor};
use ctrv_ukf::{SensorType, StepOutcome, Ukf, UkfConfig};
use serde_json::json;

#[derive(Parser, Debug)]
#[command(about = "Replay a lidar/radar measurement log through the CTRV UKF")]
struct Args {
    /// Path to measurement log (.txt or .txt.gz)
    #[arg(long)]
    log: PathBuf,

    /// JSON filter configuration; missing fields keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Longitudinal acceleration noise std (m/s^2)
    #[arg(long)]
    std_a: Option<f64>,

    /// Yaw acceleration noise std (rad/s^2)
    #[arg(long)]
    std_yawdd: Option<f64>,

    /// Ignore position (lidar) measurements after initialization
    #[arg(long, default_value_t = false)]
    no_laser: bool,

    /// Ignore range/bearing (radar) measurements after initialization
    #[arg(long, default_value_t = false)]
    no_radar: bool,

    /// Write per-measurement JSON lines here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn load_config(args: &Args) -> anyhow::Result<UkfConfig> {
    let mut config = match args.config.as_ref() {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
            serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => UkfConfig::default(),
    };

    if let Some(std_a) = args.std_a {
        config.std_a = std_a;
    }
    if let Some(std_yawdd) = args.std_yawdd {
        config.std_yawdd = std_yawdd;
    }
    if args.no_laser {
        config.use_laser = false;
    }
    if args.no_radar {
        config.use_radar = false;
    }
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut ukf = Ukf::new(load_config(&args)?)?;
    log::info!("Filter config: {:?}", ukf.config());

    let samples = dataset::load(&args.log)?;
    log::info!("Loaded {} measurements from {}", samples.len(), args.log.display());

    let mut out: Box<dyn Write> = match args.output.as_ref() {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let mut estimations = Vec::new();
    let mut ground_truth = Vec::new();
    let mut nis_monitor = NisMonitor::new();
    let mut failures = 0u64;

    for sample in &samples {
        let meas = &sample.measurement;
        let outcome = match ukf.process_measurement(meas) {
            Ok(outcome) => outcome,
            Err(e) => {
                failures += 1;
                log::warn!("Measurement at {} us not fused: {}", meas.timestamp_us, e);
                continue;
            }
        };

        let nis = match outcome {
            StepOutcome::Updated(report) => {
                nis_monitor.record(report.sensor, report.nis);
                Some(report.nis)
            }
            _ => None,
        };

        let estimate = cartesian_estimate(ukf.state());
        if let Some(gt) = sample.ground_truth {
            estimations.push(estimate);
            ground_truth.push(gt.as_vector());
        }

        let line = json!({
            "timestamp_us": meas.timestamp_us,
            "sensor": meas.sensor_type(),
            "outcome": outcome,
            "state": ukf.state().as_slice(),
            "estimate": estimate.as_slice(),
            "nis": nis,
            "ground_truth": sample.ground_truth,
        });
        writeln!(out, "{}", line)?;
    }
    out.flush()?;

    let rmse = if estimations.is_empty() {
        log::warn!("No ground truth in log, RMSE not computed");
        None
    } else {
        let rmse = calculate_rmse(&estimations, &ground_truth)?;
        log::info!(
            "RMSE px={:.4} py={:.4} vx={:.4} vy={:.4}",
            rmse[0],
            rmse[1],
            rmse[2],
            rmse[3]
        );
        Some(rmse)
    };

    for sensor in [SensorType::Position, SensorType::RangeBearing] {
        let stats = nis_monitor.stats(sensor);
        log::info!(
            "NIS {}: {} samples, mean {:.3}, {:.1}% above 95% threshold",
            sensor,
            stats.samples,
            stats.mean,
            stats.exceed_fraction() * 100.0
        );
    }

    let summary = json!({
        "log": args.log.display().to_string(),
        "config": ukf.config(),
        "filter": ukf.snapshot(),
        "rmse": rmse.map(|r| [r[0], r[1], r[2], r[3]]),
        "nis_lidar": nis_monitor.stats(SensorType::Position),
        "nis_radar": nis_monitor.stats(SensorType::RangeBearing),
        "failures": failures,
    });
    eprintln!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
