use std::sync::Mutex;

pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

/// Copy of the counters at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metrics {
    pub reloads: usize,
    pub stale_drops: usize,
    pub retries: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics::default()),
        }
    }

    pub fn record_reload(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.reloads += 1;
        }
    }

    pub fn record_stale_drop(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.stale_drops += 1;
        }
    }

    pub fn record_retry(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.retries += 1;
        }
    }

    pub fn snapshot(&self) -> Metrics {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            Metrics::default()
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_are_independent() {
        let metrics = MetricsRecorder::new();
        metrics.record_reload();
        metrics.record_reload();
        metrics.record_stale_drop();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.reloads, 2);
        assert_eq!(snapshot.stale_drops, 1);
        assert_eq!(snapshot.retries, 0);
    }
}
