use crate::bridge::model::{DatasetStore, Gate};
use crate::generator::profile::Domain;
use eegcore::table::montage::write_montage_csv;
use log::{error, info, warn};
use std::{collections::HashMap, net::SocketAddr, sync::Arc, thread};
use tokio::runtime::Builder;
use warp::{http::StatusCode, reply::Response, Filter, Rejection, Reply};

type Query = HashMap<String, String>;

fn text_reply(status: StatusCode, message: impl Into<String>) -> Response {
    warp::reply::with_status(message.into(), status).into_response()
}

fn csv_reply<E: std::fmt::Display>(result: Result<String, E>) -> Response {
    match result {
        Ok(body) => warp::reply::with_header(body, "content-type", "text/csv; charset=utf-8")
            .into_response(),
        Err(err) => {
            warn!("table encode error: {}", err);
            text_reply(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

fn json_reply(body: String) -> Response {
    warp::reply::with_header(body, "content-type", "application/json").into_response()
}

fn gated(store: &DatasetStore, query: &Query) -> Option<Response> {
    match store.check(query) {
        Ok(()) => None,
        Err(Gate::Computing) => Some(text_reply(
            StatusCode::SERVICE_UNAVAILABLE,
            "backend is still computing epochs",
        )),
        Err(Gate::UnknownExperiment) => Some(text_reply(
            StatusCode::NOT_FOUND,
            "unknown experiment or subject",
        )),
    }
}

fn events_csv(store: &DatasetStore, query: &Query) -> Response {
    if let Some(reply) = gated(store, query) {
        return reply;
    }
    csv_reply(store.recording.events.to_csv())
}

/// Column-oriented JSON, `{"timeStamp": {"0": ..}, "label": {"0": ..}}`.
fn events_json(store: &DatasetStore, query: &Query) -> Response {
    if let Some(reply) = gated(store, query) {
        return reply;
    }
    let mut time_stamps = serde_json::Map::new();
    let mut labels = serde_json::Map::new();
    for (index, record) in store.recording.events.records.iter().enumerate() {
        time_stamps.insert(index.to_string(), record.time_stamp.into());
        labels.insert(index.to_string(), record.label.into());
    }
    let body = serde_json::json!({ "timeStamp": time_stamps, "label": labels });
    json_reply(body.to_string())
}

fn evoked_csv(store: &DatasetStore, query: &Query) -> Response {
    if let Some(reply) = gated(store, query) {
        return reply;
    }
    let Some(label) = query.get("event").and_then(|v| v.parse::<i64>().ok()) else {
        return text_reply(StatusCode::BAD_REQUEST, "missing or invalid event label");
    };
    let domain = Domain::from_query(query.get("domain").map(String::as_str));
    match store.recording.evoked(label, domain) {
        Ok(matrix) => csv_reply(matrix.to_csv()),
        Err(err) => text_reply(StatusCode::NOT_FOUND, err.to_string()),
    }
}

fn single_sensor_csv(store: &DatasetStore, query: &Query) -> Response {
    if let Some(reply) = gated(store, query) {
        return reply;
    }
    let Some(name) = query.get("sensorName") else {
        return text_reply(StatusCode::BAD_REQUEST, "missing sensorName");
    };
    match store.recording.single_sensor(name) {
        Some(table) => csv_reply(table.to_csv()),
        None => text_reply(StatusCode::NOT_FOUND, format!("unknown sensor {}", name)),
    }
}

fn montage_csv(store: &DatasetStore) -> Response {
    csv_reply(write_montage_csv(&store.recording.montage))
}

/// Bridge that hosts the tabular HTTP endpoints over one synthetic recording.
pub struct Bridge {
    store: Arc<DatasetStore>,
}

impl Bridge {
    pub fn new(store: DatasetStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    pub fn routes(&self) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
        let store = self.store.clone();
        let store_filter = warp::any().map(move || store.clone());

        let events = warp::path!("zcc" / "getEEGEpochsEvents.csv")
            .and(warp::get())
            .and(warp::query::<Query>())
            .and(store_filter.clone())
            .map(|query: Query, store: Arc<DatasetStore>| events_csv(&store, &query));

        let events_as_json = warp::path!("zcc" / "getEEGEpochsEvents.json")
            .and(warp::get())
            .and(warp::query::<Query>())
            .and(store_filter.clone())
            .map(|query: Query, store: Arc<DatasetStore>| events_json(&store, &query));

        let evoked = warp::path!("zcc" / "getEEGEvokedData.csv")
            .and(warp::get())
            .and(warp::query::<Query>())
            .and(store_filter.clone())
            .map(|query: Query, store: Arc<DatasetStore>| evoked_csv(&store, &query));

        let single_sensor = warp::path("zcc")
            .and(warp::path("getEEGSingleSensorData.csv"))
            .and(warp::get())
            .and(warp::query::<Query>())
            .and(store_filter.clone())
            .map(|query: Query, store: Arc<DatasetStore>| single_sensor_csv(&store, &query));

        let montage = warp::path!("asset" / "montage" / "sensor.csv")
            .and(warp::get())
            .and(store_filter)
            .map(|store: Arc<DatasetStore>| montage_csv(&store));

        events
            .or(events_as_json)
            .unify()
            .or(evoked)
            .unify()
            .or(single_sensor)
            .unify()
            .or(montage)
            .unify()
    }

    /// Serves the routes on a background thread with its own runtime.
    pub fn spawn(&self, bind: SocketAddr) -> thread::JoinHandle<()> {
        let routes = self.routes();
        info!(
            "serving {} / {} on http://{}",
            self.store.experiment_name, self.store.subject_id, bind
        );
        thread::spawn(move || {
            let runtime = match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(err) => {
                    error!("failed to build bridge runtime: {}", err);
                    return;
                }
            };
            runtime.block_on(async move {
                warp::serve(routes).run(bind).await;
            });
        })
    }

    pub fn publish_status(&self, message: &str) {
        info!("[bridge] {}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::profile::Recording;
    use crate::workflow::config::WorkflowConfig;
    use eegcore::prelude::DataMode;
    use eegcore::table::{montage::parse_montage_csv, EventTable, SampleMatrix, SingleSensorTable};

    fn bridge(warmup_ms: u64) -> Bridge {
        let config = WorkflowConfig::from_args(5, 2, 9, warmup_ms);
        let recording = Recording::generate(&config.recording).unwrap();
        Bridge::new(DatasetStore::new(&config, recording))
    }

    fn body(response: &warp::http::Response<warp::hyper::body::Bytes>) -> String {
        String::from_utf8_lossy(response.body()).into_owned()
    }

    const QUERY: &str = "experimentName=demo&subjectID=S01";

    #[tokio::test]
    async fn data_routes_answer_503_while_computing() {
        let routes = bridge(60_000).routes();
        let response = warp::test::request()
            .path(&format!("/zcc/getEEGEpochsEvents.csv?{QUERY}"))
            .reply(&routes)
            .await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let montage = warp::test::request()
            .path("/asset/montage/sensor.csv")
            .reply(&routes)
            .await;
        assert_eq!(montage.status(), StatusCode::OK);
        assert_eq!(parse_montage_csv(&body(&montage)).unwrap().len(), 5);
    }

    #[tokio::test]
    async fn events_route_serves_both_encodings() {
        let routes = bridge(0).routes();
        let csv = warp::test::request()
            .path(&format!("/zcc/getEEGEpochsEvents.csv?{QUERY}"))
            .reply(&routes)
            .await;
        let json = warp::test::request()
            .path(&format!("/zcc/getEEGEpochsEvents.json?{QUERY}"))
            .reply(&routes)
            .await;
        let from_csv = EventTable::from_csv(&body(&csv)).unwrap();
        let from_json = EventTable::from_json(&body(&json)).unwrap();
        assert_eq!(from_csv.len(), 6);
        assert_eq!(from_csv, from_json);
    }

    #[tokio::test]
    async fn evoked_route_switches_domain() {
        let routes = bridge(0).routes();
        let time = warp::test::request()
            .path(&format!("/zcc/getEEGEvokedData.csv?{QUERY}&event=1"))
            .reply(&routes)
            .await;
        let freq = warp::test::request()
            .path(&format!("/zcc/getEEGEvokedData.csv?{QUERY}&event=1&domain=freq"))
            .reply(&routes)
            .await;
        let time = SampleMatrix::from_csv(&body(&time)).unwrap();
        let freq = SampleMatrix::from_csv(&body(&freq)).unwrap();
        assert_eq!(time.mode(), DataMode::TimeDomain);
        assert_eq!(freq.mode(), DataMode::FrequencyDomain);
        assert_eq!(time.columns(), freq.columns());

        let missing = warp::test::request()
            .path(&format!("/zcc/getEEGEvokedData.csv?{QUERY}&event=42"))
            .reply(&routes)
            .await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn single_sensor_route_appends_times_row() {
        let routes = bridge(0).routes();
        let response = warp::test::request()
            .path(&format!("/zcc/getEEGSingleSensorData.csv?{QUERY}&sensorName=FP1"))
            .reply(&routes)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let table = SingleSensorTable::from_csv(&body(&response)).unwrap();
        assert_eq!(table.epochs.nrows(), 6);
        assert_eq!(table.times.len(), table.epochs.ncols());
    }

    #[tokio::test]
    async fn wrong_subject_is_not_found() {
        let routes = bridge(0).routes();
        let response = warp::test::request()
            .path("/zcc/getEEGEpochsEvents.csv?experimentName=demo&subjectID=S99")
            .reply(&routes)
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
