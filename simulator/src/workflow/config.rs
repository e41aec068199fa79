use crate::generator::profile::RecordingProfile;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub experiment_name: String,
    pub subject_id: String,
    pub bind: SocketAddr,
    /// Milliseconds the data routes answer 503 after start, imitating a
    /// backend that is still computing epochs.
    pub warmup_ms: u64,
    pub recording: RecordingProfile,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            experiment_name: "demo".into(),
            subject_id: "S01".into(),
            bind: SocketAddr::from(([127, 0, 0, 1], 9000)),
            warmup_ms: 3000,
            recording: RecordingProfile::default(),
        }
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(sensors: usize, epochs_per_label: usize, seed: u64, warmup_ms: u64) -> Self {
        let defaults = Self::default();
        Self {
            warmup_ms,
            recording: RecordingProfile {
                sensors,
                epochs_per_label,
                seed,
                ..defaults.recording.clone()
            },
            ..defaults
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_overrides_recording() {
        let cfg = WorkflowConfig::from_args(8, 5, 42, 0);
        assert_eq!(cfg.recording.sensors, 8);
        assert_eq!(cfg.recording.epochs_per_label, 5);
        assert_eq!(cfg.recording.sample_rate, 200.0);
        assert_eq!(cfg.warmup_ms, 0);
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"experiment_name: mi\nsubject_id: S07\nwarmup_ms: 10\nrecording:\n  sensors: 4\n  labels: [1, 2]\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = WorkflowConfig::load(&path).unwrap();
        assert_eq!(cfg.experiment_name, "mi");
        assert_eq!(cfg.recording.sensors, 4);
        assert_eq!(cfg.recording.labels, vec![1, 2]);
        assert_eq!(cfg.recording.epochs_per_label, 12);
    }

    #[test]
    fn config_load_reports_path_on_error() {
        let err = WorkflowConfig::load("/nonexistent/workflow.yaml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/workflow.yaml"));
    }
}
