use anyhow::Context;
use bridge::model::DatasetStore;
use bridge::routes::Bridge;
use clap::Parser;
use generator::profile::Recording;
use std::fs;
use std::path::PathBuf;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::WorkflowConfig;
use workflow::runner::Runner;

mod bridge;
mod generator;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Synthetic EEG backend for the dashboard")]
struct Args {
    /// Correlate every label offline and write a CSV report
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    #[arg(long, default_value_t = 20)]
    sensors: usize,
    #[arg(long, default_value_t = 12)]
    epochs: usize,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    #[arg(long, default_value_t = 3000)]
    warmup_ms: u64,
    #[arg(long, default_value = "tools/data/offline_correlation.csv")]
    report: PathBuf,
    /// Serve the tabular endpoints until Ctrl+C
    #[arg(long, default_value_t = false)]
    serve: bool,
}

fn write_report(path: &PathBuf, runner: &Runner, recording: &Recording) -> anyhow::Result<()> {
    let result = runner.execute(recording)?;
    for summary in &result.labels {
        println!(
            "Label {} -> epochs {}, good {}, bad {:?}, mean |corr| time {:.3} freq {:.3}",
            summary.label,
            summary.epochs,
            summary.good,
            summary.bad,
            summary.mean_abs_time(),
            summary.mean_abs_freq()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("opening report {}", path.display()))?;
    for row in result.report_rows() {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let workflow_config = if let Some(path) = args.workflow {
        WorkflowConfig::load(path)?
    } else {
        WorkflowConfig::from_args(args.sensors, args.epochs, args.seed, args.warmup_ms)
    };

    let recording =
        Recording::generate(&workflow_config.recording).context("generating recording")?;
    let runner = Runner::new(workflow_config.clone());

    if args.offline {
        write_report(&args.report, &runner, &recording)?;
        println!("Offline report written to {}", args.report.display());
    }
    if args.serve {
        let bridge = Bridge::new(DatasetStore::new(runner.config(), recording));
        let _server = bridge.spawn(workflow_config.bind);
        bridge.publish_status("HTTP bridge running (Ctrl+C to stop)...");
        let runtime = TokioBuilder::new_current_thread()
            .enable_all()
            .build()
            .context("creating runtime for signal handling")?;
        runtime.block_on(async {
            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
            Ok::<(), anyhow::Error>(())
        })?;
    }

    Ok(())
}
