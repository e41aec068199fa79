use charts::{CorrelationHeatmap, EventTimeline, EvokedTraces, SensorScatter, TopoMap};
use eegcore::prelude::DataMode;
use eegcore::session::{Bootstrap, ReloadTicket, Session, ViewState};
use eegcore::table::SingleSensorTable;
use eegcore::telemetry::MetricsRecorder;
use iced::{
    widget::{
        button, canvas::Canvas, column, pick_list, row, scrollable, text, Column, Container,
    },
    Alignment, Element, Length, Task, Theme,
};
use loader::Loader;
use log::{info, warn};
use std::{collections::HashSet, fmt, sync::Arc};

mod charts;
mod loader;

fn main() -> iced::Result {
    env_logger::init();
    iced::application(Dashboard::boot, Dashboard::update, Dashboard::view)
        .title(application_title)
        .theme(application_theme)
        .run()
}

fn application_title(state: &Dashboard) -> String {
    let cfg = state.loader.config();
    format!("EEG Dashboard - {} / {}", cfg.experiment_name, cfg.subject_id)
}

fn application_theme(_: &Dashboard) -> Theme {
    Theme::Dark
}

const DOMAINS: [DataMode; 2] = [DataMode::TimeDomain, DataMode::FrequencyDomain];

/// Axis value as shown in the selector.
#[derive(Debug, Clone, Copy, PartialEq)]
struct AxisChoice(f64);

impl fmt::Display for AxisChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

struct Dashboard {
    loader: Loader,
    session: Session,
    label: Option<i64>,
    /// Time stamp of the highlighted epoch.
    epoch: Option<i64>,
    domain: DataMode,
    /// Channels whose evoked trace is drawn.
    visible: HashSet<String>,
    sensor: Option<String>,
    single: Option<SingleSensorTable>,
    status: String,
    history: Vec<String>,
}

#[derive(Debug, Clone)]
enum Message {
    BootstrapLoaded(Result<Bootstrap, String>),
    LabelSelected(i64),
    EpochSelected(i64),
    DomainSelected(DataMode),
    ChannelToggled(String),
    AllChannels(bool),
    AxisSelected(AxisChoice),
    ViewLoaded(ReloadTicket, Result<ViewState, String>),
    SensorSelected(String),
    SensorLoaded(Result<SingleSensorTable, String>),
}

impl Dashboard {
    fn boot() -> (Self, Task<Message>) {
        let metrics = Arc::new(MetricsRecorder::new());
        let loader = Loader::new(loader::config_from_env(), metrics.clone());
        info!("backend {}", loader.config().backend_url);
        let bootstrap = loader.clone().bootstrap();
        (
            Dashboard {
                loader,
                session: Session::new(metrics),
                label: None,
                epoch: None,
                domain: DataMode::TimeDomain,
                visible: HashSet::new(),
                sensor: None,
                single: None,
                status: "Waiting for backend...".into(),
                history: Vec::new(),
            },
            Task::perform(bootstrap, Message::BootstrapLoaded),
        )
    }

    fn update(state: &mut Self, message: Message) -> Task<Message> {
        match message {
            Message::BootstrapLoaded(Ok(bootstrap)) => {
                state.label = bootstrap.events.labels().first().copied();
                state.epoch = None;
                state.push_history(format!("Bootstrap: {} events", bootstrap.events.len()));
                state.session.install_bootstrap(bootstrap);
                state.single = None;
                state.reload(None)
            }
            Message::BootstrapLoaded(Err(err)) => {
                state.status = format!("Bootstrap error: {err}");
                Task::none()
            }
            Message::LabelSelected(label) => {
                state.label = Some(label);
                state.epoch = None;
                let keep_axis = state
                    .session
                    .view()
                    .filter(|view| view.evoked.mode() == state.domain)
                    .and_then(|view| view.selected_axis);
                state.reload(keep_axis)
            }
            Message::EpochSelected(time_stamp) => {
                state.epoch = Some(time_stamp);
                Task::none()
            }
            Message::ChannelToggled(name) => {
                if !state.visible.remove(&name) {
                    state.visible.insert(name);
                }
                Task::none()
            }
            Message::AllChannels(show) => {
                state.visible = if show {
                    state
                        .session
                        .view()
                        .map(|view| view.channels.iter().map(|c| c.name.clone()).collect())
                        .unwrap_or_default()
                } else {
                    HashSet::new()
                };
                Task::none()
            }
            Message::DomainSelected(domain) => {
                state.domain = domain;
                state.reload(None)
            }
            Message::AxisSelected(AxisChoice(value)) => {
                state.session.select_axis(value);
                Task::none()
            }
            Message::ViewLoaded(ticket, Ok(view)) => {
                let summary = format!(
                    "Event {}: {} good / {} bad sensors, {}",
                    view.event_label,
                    view.join.good.len(),
                    view.join.bad.len(),
                    view.correlation.mode()
                );
                let channels_changed = state
                    .session
                    .view()
                    .map_or(true, |current| current.channels != view.channels);
                let good: HashSet<String> = view
                    .channels
                    .iter()
                    .filter(|entry| entry.is_good)
                    .map(|entry| entry.name.clone())
                    .collect();
                if state.session.complete(ticket, view) {
                    if channels_changed {
                        state.visible = good;
                    }
                    state.status = summary.clone();
                    state.push_history(summary);
                } else {
                    state.push_history("Superseded view dropped".into());
                }
                Task::none()
            }
            Message::ViewLoaded(ticket, Err(err)) => {
                if state.session.is_current(ticket) {
                    warn!("evoked view failed: {}", err);
                    state.status = format!("Evoked error: {err}");
                }
                Task::none()
            }
            Message::SensorSelected(name) => {
                state.sensor = Some(name.clone());
                Task::perform(
                    state.loader.clone().single_sensor(name),
                    Message::SensorLoaded,
                )
            }
            Message::SensorLoaded(Ok(table)) => {
                state.single = Some(table);
                Task::none()
            }
            Message::SensorLoaded(Err(err)) => {
                state.status = format!("Single-sensor error: {err}");
                Task::none()
            }
        }
    }

    /// Starts an evoked fetch for the current label and domain. Results of
    /// earlier fetches still in flight are dropped when they land.
    fn reload(&mut self, selected_axis: Option<f64>) -> Task<Message> {
        let (Some(label), Some(bootstrap)) = (self.label, self.session.bootstrap()) else {
            return Task::none();
        };
        let montage = bootstrap.montage.clone();
        let ticket = self.session.begin_reload();
        self.status = format!("Loading event {} ({})...", label, self.domain);
        Task::perform(
            self.loader
                .clone()
                .evoked_view(label, self.domain, montage, selected_axis),
            move |result| Message::ViewLoaded(ticket, result),
        )
    }

    fn view(state: &Self) -> Element<'_, Message> {
        let labels = state
            .session
            .bootstrap()
            .map(|bootstrap| bootstrap.events.labels())
            .unwrap_or_default();
        let view = state.session.view();

        let axis_choices: Vec<AxisChoice> = view
            .map(|view| {
                view.evoked
                    .selectable_axis_values()
                    .iter()
                    .map(|&v| AxisChoice(v))
                    .collect()
            })
            .unwrap_or_default();
        let epoch_choices: Vec<i64> = match (state.session.bootstrap(), state.label) {
            (Some(bootstrap), Some(label)) => bootstrap
                .events
                .for_label(label)
                .iter()
                .map(|record| record.time_stamp)
                .collect(),
            _ => Vec::new(),
        };
        let channel_list = view
            .map(|view| {
                view.channels.iter().fold(Column::new().spacing(2), |col, entry| {
                    let mark = if state.visible.contains(&entry.name) {
                        "[x]"
                    } else {
                        "[ ]"
                    };
                    let suffix = if entry.is_good { "" } else { " (no position)" };
                    col.push(
                        button(text(format!("{mark} {}{suffix}", entry.name)).size(12))
                            .on_press(Message::ChannelToggled(entry.name.clone()))
                            .padding(2),
                    )
                })
            })
            .unwrap_or_else(|| Column::new().push(text("No channels yet").size(12)));
        let sensor_choices = view
            .map(|view| view.join.sensor_choices())
            .unwrap_or_default();
        let axis_label = match state.domain {
            DataMode::TimeDomain => "Time (s)",
            DataMode::FrequencyDomain => "Frequency (Hz)",
        };

        let metrics = state.session.metrics().snapshot();
        let history_list = if state.history.is_empty() {
            Column::new().push(text("No activity yet").size(12))
        } else {
            state
                .history
                .iter()
                .rev()
                .fold(Column::new().spacing(4), |col, entry| {
                    col.push(text(entry.clone()).size(12))
                })
        };

        let controls = column![
            text("Selection").size(26),
            text("Event label").size(14),
            pick_list(labels.clone(), state.label, Message::LabelSelected),
            text("Epoch time stamp").size(14),
            pick_list(epoch_choices, state.epoch, Message::EpochSelected),
            text("Domain").size(14),
            pick_list(&DOMAINS[..], Some(state.domain), Message::DomainSelected),
            text(axis_label).size(14),
            pick_list(
                axis_choices,
                view.and_then(|view| view.selected_axis).map(AxisChoice),
                Message::AxisSelected
            ),
            text("Channels").size(14),
            row![
                button(text("Show all").size(12))
                    .on_press(Message::AllChannels(true))
                    .padding(4),
                button(text("Hide all").size(12))
                    .on_press(Message::AllChannels(false))
                    .padding(4),
            ]
            .spacing(6),
            Container::new(scrollable(channel_list).height(Length::Fixed(160.0))).padding(6),
            text("Single sensor").size(14),
            pick_list(sensor_choices, state.sensor.clone(), Message::SensorSelected),
            text(&state.status).size(14),
            text(format!(
                "reloads {} | stale dropped {} | retries {}",
                metrics.reloads, metrics.stale_drops, metrics.retries
            ))
            .size(12),
            text("Activity log").size(16),
            Container::new(scrollable(history_list).height(Length::Fixed(160.0))).padding(6),
        ]
        .spacing(10)
        .padding(16)
        .width(Length::Fixed(300.0));

        let timeline = state.session.bootstrap().map(|bootstrap| {
            EventTimeline::new(
                &bootstrap.events.records,
                labels.clone(),
                bootstrap.events.extent(),
                state.label,
                state.epoch,
            )
        });

        let mut plots = Column::new().spacing(10).padding(16).width(Length::Fill);
        plots = plots.push(text("Events").size(18));
        if let Some(timeline) = timeline {
            plots = plots.push(
                Canvas::new(timeline)
                    .width(Length::Fill)
                    .height(Length::Fixed(60.0)),
            );
        }

        if let Some(view) = view {
            let bad = if view.join.bad.is_empty() {
                "none".to_string()
            } else {
                view.join.bad.join(", ")
            };
            plots = plots
                .push(text(format!("Evoked response, event {}", view.event_label)).size(18))
                .push(
                    Canvas::new(EvokedTraces::new(view, &state.visible))
                        .width(Length::Fill)
                        .height(Length::Fixed(220.0)),
                )
                .push(text(format!("Channels without position: {bad}")).size(12))
                .push(
                    row![
                        column![
                            text("Topographic map").size(16),
                            Canvas::new(TopoMap::new(&view.topo))
                                .width(Length::Fixed(300.0))
                                .height(Length::Fixed(300.0)),
                        ]
                        .spacing(6),
                        column![
                            text(format!("Correlation ({})", view.correlation.mode())).size(16),
                            Canvas::new(CorrelationHeatmap::new(
                                view.correlation.names(),
                                &view.heat_cells
                            ))
                            .width(Length::Fixed(300.0))
                            .height(Length::Fixed(300.0)),
                        ]
                        .spacing(6),
                    ]
                    .spacing(20),
                );
        } else {
            plots = plots.push(text("No evoked view yet").size(14));
        }

        if let (Some(table), Some(bootstrap)) = (&state.single, state.session.bootstrap()) {
            let name = state.sensor.clone().unwrap_or_default();
            let placed = view.map_or(true, |view| view.join.is_good(&name));
            let heading = if placed {
                format!("Sensor {name}, every epoch")
            } else {
                format!("Sensor {name}, every epoch (no montage position)")
            };
            plots = plots.push(text(heading).size(16)).push(
                Canvas::new(SensorScatter::new(
                    table.join_events(&bootstrap.events),
                    labels.clone(),
                    state.epoch,
                ))
                .width(Length::Fill)
                .height(Length::Fixed(200.0)),
            );
        }

        let layout = row![controls, scrollable(plots)]
            .spacing(20)
            .align_y(Alignment::Start)
            .padding(20);

        Container::new(layout)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn push_history(&mut self, entry: String) {
        self.history.push(entry);
        if self.history.len() > 20 {
            self.history.remove(0);
        }
    }
}
