use crate::prelude::{CorrelationConfig, ProjectionConfig};
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};

/// Viewer-side configuration: where the backend lives and how the core is tuned.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub backend_url: String,
    pub experiment_name: String,
    pub subject_id: String,
    pub retry: RetryPolicy,
    pub projection: ProjectionConfig,
    pub correlation: CorrelationConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:9000".into(),
            experiment_name: "demo".into(),
            subject_id: "S01".into(),
            retry: RetryPolicy::default(),
            projection: ProjectionConfig::default(),
            correlation: CorrelationConfig::default(),
        }
    }
}

impl DashboardConfig {
    /// Backend URL with `route` appended, no query.
    pub fn route_url(&self, route: &str) -> String {
        format!(
            "{}/{}",
            self.backend_url.trim_end_matches('/'),
            route.trim_start_matches('/')
        )
    }

    /// Query pairs for a data route: experiment and subject first, then `extra`.
    /// Values are raw; encoding is left to the HTTP client.
    pub fn query<'a>(&'a self, extra: &[(&'a str, &'a str)]) -> Vec<(&'a str, &'a str)> {
        let mut pairs = vec![
            ("experimentName", self.experiment_name.as_str()),
            ("subjectID", self.subject_id.as_str()),
        ];
        pairs.extend_from_slice(extra);
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::ColorPolicy;

    #[test]
    fn route_and_query_carry_experiment() {
        let cfg = DashboardConfig {
            backend_url: "http://host:1/".into(),
            ..Default::default()
        };
        assert_eq!(
            cfg.route_url("/zcc/getEEGEvokedData.csv"),
            "http://host:1/zcc/getEEGEvokedData.csv"
        );
        assert_eq!(
            cfg.query(&[("event", "2")]),
            vec![("experimentName", "demo"), ("subjectID", "S01"), ("event", "2")]
        );
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg: DashboardConfig =
            serde_json::from_str(r#"{"projection": {"color_policy": "categorical"}}"#).unwrap();
        assert_eq!(cfg.projection.color_policy, ColorPolicy::Categorical);
        assert_eq!(cfg.correlation.volts_scale, 1e6);
        assert!(cfg.retry.max_attempts.is_none());
    }
}
