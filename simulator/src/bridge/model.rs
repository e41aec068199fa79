use crate::generator::profile::Recording;
use crate::workflow::config::WorkflowConfig;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Why a data request cannot be answered yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    Computing,
    UnknownExperiment,
}

/// Recording served by the bridge, keyed by experiment and subject.
pub struct DatasetStore {
    pub experiment_name: String,
    pub subject_id: String,
    pub recording: Recording,
    started: Instant,
    warmup: Duration,
}

impl DatasetStore {
    pub fn new(config: &WorkflowConfig, recording: Recording) -> Self {
        Self {
            experiment_name: config.experiment_name.clone(),
            subject_id: config.subject_id.clone(),
            recording,
            started: Instant::now(),
            warmup: Duration::from_millis(config.warmup_ms),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.started.elapsed() >= self.warmup
    }

    /// Checks readiness and the `experimentName`/`subjectID` query pair.
    pub fn check(&self, query: &HashMap<String, String>) -> Result<(), Gate> {
        if !self.is_ready() {
            return Err(Gate::Computing);
        }
        let experiment = query.get("experimentName").map(String::as_str);
        let subject = query.get("subjectID").map(String::as_str);
        if experiment != Some(self.experiment_name.as_str())
            || subject != Some(self.subject_id.as_str())
        {
            return Err(Gate::UnknownExperiment);
        }
        Ok(())
    }
}
