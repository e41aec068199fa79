//! Dashboard view state.
//!
//! Every selection change builds a complete [`ViewState`] off to the side and
//! swaps it in with [`Session::complete`]; nothing is patched in place.

use crate::correlation::{CorrelationEngine, CorrelationMatrix};
use crate::montage::{ChannelEntry, SensorIndex, SensorJoin};
use crate::plot::{self, HeatCell, TopoMark};
use crate::prelude::EngineResult;
use crate::table::{EventTable, SampleMatrix};
use crate::telemetry::{LogManager, MetricsRecorder};
use std::sync::Arc;

/// Data fetched once before any view can be built.
#[derive(Debug, Clone)]
pub struct Bootstrap {
    pub events: EventTable,
    pub montage: Arc<SensorIndex>,
}

/// Everything one render of the evoked view needs.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub event_label: i64,
    pub evoked: SampleMatrix,
    pub join: SensorJoin,
    pub channels: Vec<ChannelEntry>,
    pub correlation: CorrelationMatrix,
    pub heat_cells: Vec<HeatCell>,
    /// Axis value chosen for the topographic map.
    pub selected_axis: Option<f64>,
    pub topo: Vec<TopoMark>,
}

impl ViewState {
    /// Joins, correlates and shapes one evoked table.
    ///
    /// With no `selected_axis` the first selectable axis value is used.
    pub fn build(
        montage: &SensorIndex,
        engine: &CorrelationEngine,
        event_label: i64,
        evoked: SampleMatrix,
        selected_axis: Option<f64>,
    ) -> EngineResult<Self> {
        let join = montage.join(evoked.columns());
        let channels = join.channels(evoked.columns());
        let correlation = engine.compute(&evoked, &join.good)?;
        let heat_cells = plot::heatmap_cells(&correlation);

        let selected_axis =
            selected_axis.or_else(|| evoked.selectable_axis_values().first().copied());
        let topo = match selected_axis.and_then(|value| evoked.row_after(value)) {
            Some(row) => plot::topo_marks(&join.good, &evoked, row),
            None => plot::sensor_marks(&join.good),
        };

        Ok(Self {
            event_label,
            evoked,
            join,
            channels,
            correlation,
            heat_cells,
            selected_axis,
            topo,
        })
    }

    /// Same data, topographic map moved to another axis value.
    pub fn at_axis(&self, value: f64) -> Self {
        let topo = match self.evoked.row_after(value) {
            Some(row) => plot::topo_marks(&self.join.good, &self.evoked, row),
            None => plot::sensor_marks(&self.join.good),
        };
        Self {
            selected_axis: Some(value),
            topo,
            ..self.clone()
        }
    }
}

/// Generation number handed out when a reload starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadTicket(u64);

/// Owner of the bootstrap data and the currently displayed view.
pub struct Session {
    bootstrap: Option<Bootstrap>,
    view: Option<ViewState>,
    issued: u64,
    metrics: Arc<MetricsRecorder>,
    logger: LogManager,
}

impl Session {
    pub fn new(metrics: Arc<MetricsRecorder>) -> Self {
        Self {
            bootstrap: None,
            view: None,
            issued: 0,
            metrics,
            logger: LogManager::new("session"),
        }
    }

    pub fn bootstrap(&self) -> Option<&Bootstrap> {
        self.bootstrap.as_ref()
    }

    /// Replaces the bootstrap data and drops any view built from the old one.
    pub fn install_bootstrap(&mut self, bootstrap: Bootstrap) {
        self.logger.record(&format!(
            "bootstrap: {} events, {} montage sensors",
            bootstrap.events.len(),
            bootstrap.montage.len()
        ));
        self.bootstrap = Some(bootstrap);
        self.view = None;
        self.issued += 1;
    }

    pub fn view(&self) -> Option<&ViewState> {
        self.view.as_ref()
    }

    pub fn metrics(&self) -> &Arc<MetricsRecorder> {
        &self.metrics
    }

    /// Starts a reload; any earlier ticket becomes stale.
    pub fn begin_reload(&mut self) -> ReloadTicket {
        self.issued += 1;
        ReloadTicket(self.issued)
    }

    pub fn is_current(&self, ticket: ReloadTicket) -> bool {
        ticket.0 == self.issued
    }

    /// Installs `view` if `ticket` is the newest one issued. A superseded
    /// result is dropped and `false` returned.
    pub fn complete(&mut self, ticket: ReloadTicket, view: ViewState) -> bool {
        if !self.is_current(ticket) {
            self.metrics.record_stale_drop();
            self.logger.trace(&format!(
                "dropped stale view for event {} (ticket {}, current {})",
                view.event_label, ticket.0, self.issued
            ));
            return false;
        }
        self.metrics.record_reload();
        self.view = Some(view);
        true
    }

    /// Moves the topographic map without a reload.
    pub fn select_axis(&mut self, value: f64) {
        if let Some(view) = &self.view {
            self.view = Some(view.at_axis(value));
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Arc::new(MetricsRecorder::new()))
    }
}
