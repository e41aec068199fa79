use anyhow::Context;
use eegcore::config::DashboardConfig;
use eegcore::correlation::CorrelationEngine;
use eegcore::montage::MontageProjector;
use eegcore::prelude::DataMode;
use eegcore::session::{Bootstrap, ViewState};
use eegcore::table::{montage::parse_montage_csv, EventTable, SampleMatrix, SingleSensorTable};
use eegcore::telemetry::MetricsRecorder;
use eegcore::SensorIndex;
use log::{debug, info, warn};
use std::{fs, path::Path, sync::Arc};

pub const EVENTS_ROUTE: &str = "zcc/getEEGEpochsEvents.csv";
pub const EVOKED_ROUTE: &str = "zcc/getEEGEvokedData.csv";
pub const SINGLE_SENSOR_ROUTE: &str = "zcc/getEEGSingleSensorData.csv";
pub const MONTAGE_ROUTE: &str = "asset/montage/sensor.csv";

/// Environment variable naming a YAML dashboard config.
pub const CONFIG_ENV: &str = "EEGDASH_CONFIG";

pub fn load_config<P: AsRef<Path>>(path: P) -> anyhow::Result<DashboardConfig> {
    let path_ref = path.as_ref();
    let contents = fs::read_to_string(path_ref)
        .with_context(|| format!("reading dashboard config {}", path_ref.display()))?;
    serde_yaml::from_str(&contents)
        .with_context(|| format!("parsing dashboard config {}", path_ref.display()))
}

/// Config from `EEGDASH_CONFIG`, or defaults when it is unset or unreadable.
pub fn config_from_env() -> DashboardConfig {
    match std::env::var(CONFIG_ENV) {
        Ok(path) => load_config(&path).unwrap_or_else(|err| {
            warn!("{:#}; using default dashboard config", err);
            DashboardConfig::default()
        }),
        Err(_) => DashboardConfig::default(),
    }
}

async fn fetch_text(client: &reqwest::Client, url: &str) -> Result<String, String> {
    let response = client.get(url).send().await.map_err(|e| e.to_string())?;
    let status = response.status();
    if !status.is_success() {
        return Err(format!("{} from {}", status, url));
    }
    response.text().await.map_err(|e| e.to_string())
}

/// Fetches the backend tables and turns them into core types.
///
/// Every request goes through the configured retry policy, so a backend that is
/// still computing is polled until it answers.
#[derive(Clone)]
pub struct Loader {
    config: Arc<DashboardConfig>,
    client: reqwest::Client,
    metrics: Arc<MetricsRecorder>,
}

impl Loader {
    pub fn new(config: DashboardConfig, metrics: Arc<MetricsRecorder>) -> Self {
        Self {
            config: Arc::new(config),
            client: reqwest::Client::new(),
            metrics,
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Route URL with the experiment query, values percent-encoded.
    pub fn url(&self, route: &str, extra: &[(&str, &str)]) -> Result<reqwest::Url, String> {
        reqwest::Url::parse_with_params(&self.config.route_url(route), self.config.query(extra))
            .map_err(|e| e.to_string())
    }

    async fn get(&self, url: reqwest::Url) -> Result<String, String> {
        let url = url.to_string();
        debug!("GET {}", url);
        let client = self.client.clone();
        self.config
            .retry
            .retry(&self.metrics, |_| {
                let client = client.clone();
                let url = url.clone();
                async move { fetch_text(&client, &url).await }
            })
            .await
            .map_err(|err| err.to_string())
    }

    /// Events table and montage, both needed before any view.
    pub async fn bootstrap(self) -> Result<Bootstrap, String> {
        let events_text = self.get(self.url(EVENTS_ROUTE, &[])?).await?;
        let events = EventTable::from_csv(&events_text).map_err(|e| e.to_string())?;

        let montage_url = reqwest::Url::parse(&self.config.route_url(MONTAGE_ROUTE))
            .map_err(|e| e.to_string())?;
        let montage_text = self.get(montage_url).await?;
        let raw = parse_montage_csv(&montage_text).map_err(|e| e.to_string())?;
        let montage = MontageProjector::new(self.config.projection.clone()).index(&raw);
        info!(
            "bootstrap loaded: {} events, {} montage sensors",
            events.len(),
            montage.len()
        );

        Ok(Bootstrap {
            events,
            montage: Arc::new(montage),
        })
    }

    /// Evoked table for one label, correlated and shaped into a view.
    pub async fn evoked_view(
        self,
        label: i64,
        mode: DataMode,
        montage: Arc<SensorIndex>,
        selected_axis: Option<f64>,
    ) -> Result<ViewState, String> {
        let label_text = label.to_string();
        let mut extra = vec![("event", label_text.as_str())];
        if mode == DataMode::FrequencyDomain {
            extra.push(("domain", "freq"));
        }
        let text = self.get(self.url(EVOKED_ROUTE, &extra)?).await?;
        let evoked = SampleMatrix::from_csv(&text).map_err(|e| e.to_string())?;
        let engine = CorrelationEngine::new(self.config.correlation.clone());
        ViewState::build(&montage, &engine, label, evoked, selected_axis).map_err(|e| e.to_string())
    }

    pub async fn single_sensor(self, name: String) -> Result<SingleSensorTable, String> {
        let url = self.url(SINGLE_SENSOR_ROUTE, &[("sensorName", name.as_str())])?;
        let text = self.get(url).await?;
        SingleSensorTable::from_csv(&text).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eegcore::prelude::ColorPolicy;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn yaml_config_overrides_selected_fields() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"backend_url: http://lab:8080\nretry:\n  interval_ms: 250\n  max_attempts: 5\nprojection:\n  color_policy: categorical\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.backend_url, "http://lab:8080");
        assert_eq!(cfg.retry.interval_ms, 250);
        assert_eq!(cfg.retry.max_attempts, Some(5));
        assert_eq!(cfg.projection.color_policy, ColorPolicy::Categorical);
        assert_eq!(cfg.experiment_name, "demo");
    }

    #[test]
    fn query_values_are_percent_encoded() {
        let loader = Loader::new(DashboardConfig::default(), Arc::new(MetricsRecorder::new()));
        let url = loader
            .url(SINGLE_SENSOR_ROUTE, &[("sensorName", "A&B C")])
            .unwrap();
        assert_eq!(url.path(), "/zcc/getEEGSingleSensorData.csv");
        assert_eq!(
            url.query(),
            Some("experimentName=demo&subjectID=S01&sensorName=A%26B+C")
        );
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs[2], ("sensorName".to_string(), "A&B C".to_string()));
    }

    #[test]
    fn missing_config_file_is_an_error() {
        assert!(load_config("/nonexistent/eegdash.yaml").is_err());
    }
}
