use crate::generator::profile::{Domain, Recording};
use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use eegcore::correlation::{CorrelationEngine, CorrelationEntry, CorrelationMatrix};
use eegcore::montage::MontageProjector;
use eegcore::prelude::{CorrelationConfig, ProjectionConfig};
use log::info;
use serde::Serialize;

/// Per-label outcome of an offline run.
pub struct LabelSummary {
    pub label: i64,
    pub epochs: usize,
    pub good: usize,
    pub bad: Vec<String>,
    pub time: CorrelationMatrix,
    pub freq: CorrelationMatrix,
}

pub struct WorkflowResult {
    pub labels: Vec<LabelSummary>,
}

/// Flat row of the offline correlation report.
#[derive(Debug, Serialize)]
pub struct ReportRow {
    pub label: i64,
    pub mode: &'static str,
    pub n1: String,
    pub n2: String,
    pub corr: f64,
}

fn mean_abs_offdiagonal(matrix: &CorrelationMatrix) -> f64 {
    let values = matrix.values();
    let n = matrix.len();
    if n < 2 {
        return f64::NAN;
    }
    let mut sum = 0.0;
    for i in 0..n {
        for j in 0..n {
            if i != j {
                sum += values[[i, j]].abs();
            }
        }
    }
    sum / (n * (n - 1)) as f64
}

impl LabelSummary {
    pub fn mean_abs_time(&self) -> f64 {
        mean_abs_offdiagonal(&self.time)
    }

    pub fn mean_abs_freq(&self) -> f64 {
        mean_abs_offdiagonal(&self.freq)
    }
}

impl WorkflowResult {
    pub fn report_rows(&self) -> Vec<ReportRow> {
        let mut rows = Vec::new();
        for summary in &self.labels {
            for (mode, matrix) in [("time", &summary.time), ("freq", &summary.freq)] {
                rows.extend(matrix.entries().into_iter().map(
                    |CorrelationEntry { n1, n2, corr }| ReportRow {
                        label: summary.label,
                        mode,
                        n1,
                        n2,
                        corr,
                    },
                ));
            }
        }
        rows
    }
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Runs the dashboard computations over every label of `recording`.
    pub fn execute(&self, recording: &Recording) -> anyhow::Result<WorkflowResult> {
        let montage = MontageProjector::new(ProjectionConfig::default()).index(&recording.montage);
        let engine = CorrelationEngine::new(CorrelationConfig::default());

        let mut labels = Vec::new();
        for label in recording.events.labels() {
            let time_table = recording
                .evoked(label, Domain::Time)
                .with_context(|| format!("averaging label {}", label))?;
            let freq_table = recording
                .evoked(label, Domain::Freq)
                .with_context(|| format!("spectrum for label {}", label))?;

            let join = montage.join(time_table.columns());
            let time = engine
                .compute(&time_table, &join.good)
                .with_context(|| format!("time-domain correlation for label {}", label))?;
            let freq = engine
                .compute(&freq_table, &join.good)
                .with_context(|| format!("frequency-domain correlation for label {}", label))?;

            let summary = LabelSummary {
                label,
                epochs: recording.events.for_label(label).len(),
                good: join.good.len(),
                bad: join.bad,
                time,
                freq,
            };
            info!(
                "label {}: {} epochs, {} good sensors, mean |corr| time {:.3} freq {:.3}",
                summary.label,
                summary.epochs,
                summary.good,
                summary.mean_abs_time(),
                summary.mean_abs_freq()
            );
            labels.push(summary);
        }

        Ok(WorkflowResult { labels })
    }
}
