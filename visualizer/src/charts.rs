use eegcore::montage::color::{categorical, parse_hex};
use eegcore::plot::{fill_extent, HeatCell, TopoMark};
use eegcore::session::ViewState;
use eegcore::table::{EventRecord, SampleMatrix, SensorSample};
use std::collections::HashSet;

use iced::{
    mouse,
    widget::canvas::{self, Frame, Geometry, Path, Stroke},
    Color, Point, Rectangle, Renderer, Size, Theme,
};

const BACKGROUND: Color = Color::from_rgb(0.05, 0.05, 0.05);
const GRID: Color = Color::from_rgb(0.25, 0.25, 0.3);

/// Parses a core color string, falling back to mid grey.
pub fn rgb(color: &str) -> Color {
    let [r, g, b] = parse_hex(color).unwrap_or([128, 128, 128]);
    Color::from_rgb8(r, g, b)
}

/// Blue through white to red for `t` in `[-1, 1]`.
pub fn diverging(t: f64) -> Color {
    let t = t.clamp(-1.0, 1.0) as f32;
    if t < 0.0 {
        Color::from_rgb(1.0 + t, 1.0 + t, 1.0)
    } else {
        Color::from_rgb(1.0, 1.0 - t, 1.0 - t)
    }
}

fn label_color(labels: &[i64], label: i64) -> Color {
    let index = labels.iter().position(|&l| l == label).unwrap_or(0);
    rgb(categorical(index))
}

/// Finite min and max, widened when they coincide.
pub fn finite_extent<'a>(values: impl IntoIterator<Item = &'a f64>) -> Option<(f64, f64)> {
    let (min, max) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if min > max {
        return None;
    }
    if min == max {
        return Some((min - 1.0, max + 1.0));
    }
    Some((min, max))
}

fn scale(value: f64, (lo, hi): (f64, f64), length: f32) -> f32 {
    ((value - lo) / (hi - lo)) as f32 * length
}

/// One column of the matrix, magnitudes for spectra.
pub fn column_trace(matrix: &SampleMatrix, col: usize) -> Vec<f64> {
    if let Some(column) = matrix.real_column(col) {
        return column.to_vec();
    }
    matrix
        .complex_column(col)
        .map(|column| column.iter().map(|c| c.norm()).collect())
        .unwrap_or_default()
}

fn background(renderer: &Renderer, bounds: Rectangle) -> Frame {
    let mut frame = Frame::new(renderer, bounds.size());
    frame.fill_rectangle(Point::ORIGIN, bounds.size(), BACKGROUND);
    frame
}

/// Event time stamps as ticks, one color per label.
pub struct EventTimeline {
    records: Vec<EventRecord>,
    labels: Vec<i64>,
    extent: Option<(i64, i64)>,
    selected: Option<i64>,
    epoch: Option<i64>,
}

impl EventTimeline {
    pub fn new(
        records: &[EventRecord],
        labels: Vec<i64>,
        extent: Option<(i64, i64)>,
        selected: Option<i64>,
        epoch: Option<i64>,
    ) -> Self {
        Self {
            records: records.to_vec(),
            labels,
            extent,
            selected,
            epoch,
        }
    }
}

impl<Message> canvas::Program<Message> for EventTimeline {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = background(renderer, bounds);
        if let Some((first, last)) = self.extent {
            let domain = (first as f64, (last.max(first + 1)) as f64);
            for record in &self.records {
                let x = scale(record.time_stamp as f64, domain, bounds.width - 8.0) + 4.0;
                let (top, width) = if Some(record.label) == self.selected {
                    (4.0, 2.5)
                } else {
                    (bounds.height * 0.4, 1.5)
                };
                let tick = Path::line(Point::new(x, top), Point::new(x, bounds.height - 4.0));
                frame.stroke(
                    &tick,
                    Stroke::default()
                        .with_width(width)
                        .with_color(label_color(&self.labels, record.label)),
                );
                if Some(record.time_stamp) == self.epoch {
                    let ring = Path::circle(Point::new(x, bounds.height / 2.0), 7.0);
                    frame.stroke(&ring, Stroke::default().with_width(2.0).with_color(Color::WHITE));
                }
            }
        }
        vec![frame.into_geometry()]
    }
}

/// Per-channel evoked traces with a marker at the selected axis value.
pub struct EvokedTraces {
    axis: Vec<f64>,
    traces: Vec<(Color, Vec<f64>)>,
    marker: Option<f64>,
}

impl EvokedTraces {
    /// Traces for the channels named in `visible`, in recording order.
    pub fn new(view: &ViewState, visible: &HashSet<String>) -> Self {
        let traces = view
            .channels
            .iter()
            .enumerate()
            .filter(|(_, entry)| visible.contains(&entry.name))
            .map(|(col, entry)| (rgb(&entry.color), column_trace(&view.evoked, col)))
            .collect();
        Self {
            axis: view.evoked.axis_values().to_vec(),
            traces,
            marker: view.selected_axis,
        }
    }
}

impl<Message> canvas::Program<Message> for EvokedTraces {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = background(renderer, bounds);
        let x_extent = finite_extent(&self.axis);
        let y_extent = finite_extent(self.traces.iter().flat_map(|(_, values)| values));
        if let (Some(x_extent), Some(y_extent)) = (x_extent, y_extent) {
            for (color, values) in &self.traces {
                let path = Path::new(|builder| {
                    let mut pen_down = false;
                    for (&t, &v) in self.axis.iter().zip(values) {
                        if !v.is_finite() {
                            pen_down = false;
                            continue;
                        }
                        let point = Point::new(
                            scale(t, x_extent, bounds.width),
                            bounds.height - scale(v, y_extent, bounds.height),
                        );
                        if pen_down {
                            builder.line_to(point);
                        } else {
                            builder.move_to(point);
                            pen_down = true;
                        }
                    }
                });
                frame.stroke(&path, Stroke::default().with_width(1.5).with_color(*color));
            }

            if let Some(marker) = self.marker {
                let x = scale(marker, x_extent, bounds.width);
                let line = Path::line(Point::new(x, 0.0), Point::new(x, bounds.height));
                frame.stroke(&line, Stroke::default().with_width(1.0).with_color(Color::WHITE));
            }
        }
        vec![frame.into_geometry()]
    }
}

/// Inverse-distance-squared estimate of the field at `(x, y)` from the marks
/// with a finite value. NaN when no mark carries one.
pub fn interpolate(marks: &[TopoMark], x: f64, y: f64) -> f64 {
    let mut weighted = 0.0;
    let mut total = 0.0;
    for mark in marks.iter().filter(|mark| mark.value.is_finite()) {
        let d2 = (mark.x2d - x).powi(2) + (mark.y2d - y).powi(2);
        if d2 < 1e-18 {
            return mark.value;
        }
        weighted += mark.value / d2;
        total += 1.0 / d2;
    }
    if total == 0.0 {
        f64::NAN
    } else {
        weighted / total
    }
}

const TOPO_GRID: usize = 48;

/// Flat scalp map: interpolated field inside the head outline, sensor dots on top.
pub struct TopoMap {
    marks: Vec<TopoMark>,
}

impl TopoMap {
    pub fn new(marks: &[TopoMark]) -> Self {
        Self {
            marks: marks.to_vec(),
        }
    }
}

impl<Message> canvas::Program<Message> for TopoMap {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = background(renderer, bounds);
        let center = Point::new(bounds.width / 2.0, bounds.height / 2.0);
        let radius = bounds.width.min(bounds.height) / 2.0 - 16.0;

        let reach = self
            .marks
            .iter()
            .map(|mark| mark.x2d.hypot(mark.y2d))
            .fold(0.0, f64::max)
            .max(1e-9);
        let peak = self
            .marks
            .iter()
            .map(|mark| mark.value.abs())
            .filter(|v| v.is_finite())
            .fold(0.0, f64::max);

        if peak > 0.0 {
            let cell = 2.0 * radius / TOPO_GRID as f32;
            for row in 0..TOPO_GRID {
                for col in 0..TOPO_GRID {
                    // Cell center in [-1, 1], y up.
                    let u = (col as f32 + 0.5) / TOPO_GRID as f32 * 2.0 - 1.0;
                    let v = 1.0 - (row as f32 + 0.5) / TOPO_GRID as f32 * 2.0;
                    if u * u + v * v > 1.0 {
                        continue;
                    }
                    let value = interpolate(&self.marks, u as f64 * reach, v as f64 * reach);
                    if value.is_finite() {
                        frame.fill_rectangle(
                            Point::new(
                                center.x - radius + col as f32 * cell,
                                center.y - radius + row as f32 * cell,
                            ),
                            Size::new(cell, cell),
                            diverging(value / peak),
                        );
                    }
                }
            }
        }

        let head = Path::circle(center, radius);
        frame.stroke(&head, Stroke::default().with_width(1.5).with_color(GRID));

        for mark in &self.marks {
            let position = Point::new(
                center.x + (mark.x2d / reach) as f32 * radius,
                center.y - (mark.y2d / reach) as f32 * radius,
            );
            let dot = Path::circle(position, 5.0);
            frame.fill(&dot, rgb(&mark.color));
        }
        vec![frame.into_geometry()]
    }
}

/// N×N correlation grid; cells without fill stay background.
pub struct CorrelationHeatmap {
    size: usize,
    cells: Vec<HeatCell>,
    extent: f64,
}

impl CorrelationHeatmap {
    pub fn new(names: &[String], cells: &[HeatCell]) -> Self {
        Self {
            size: names.len(),
            cells: cells.to_vec(),
            extent: fill_extent(cells).unwrap_or(1.0).max(f64::EPSILON),
        }
    }
}

impl<Message> canvas::Program<Message> for CorrelationHeatmap {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = background(renderer, bounds);
        if self.size > 0 {
            let side = bounds.width.min(bounds.height) / self.size as f32;
            for (index, cell) in self.cells.iter().enumerate() {
                let Some(fill) = cell.fill else {
                    continue;
                };
                let (row, col) = (index / self.size, index % self.size);
                frame.fill_rectangle(
                    Point::new(col as f32 * side, row as f32 * side),
                    Size::new(side, side),
                    diverging(fill / self.extent),
                );
            }
        }
        vec![frame.into_geometry()]
    }
}

/// `(secs, v)` points of the epoch recorded at `time_stamp`, in time order.
pub fn epoch_trace(samples: &[SensorSample], time_stamp: i64) -> Vec<(f64, f64)> {
    let mut points: Vec<(f64, f64)> = samples
        .iter()
        .filter(|sample| sample.time_stamp == time_stamp)
        .map(|sample| (sample.secs, sample.v))
        .collect();
    points.sort_by(|a, b| a.0.total_cmp(&b.0));
    points
}

/// Every epoch sample of one sensor, colored by its event label, with the
/// selected epoch drawn as a line on top.
pub struct SensorScatter {
    samples: Vec<SensorSample>,
    labels: Vec<i64>,
    epoch: Option<i64>,
}

impl SensorScatter {
    pub fn new(samples: Vec<SensorSample>, labels: Vec<i64>, epoch: Option<i64>) -> Self {
        Self {
            samples,
            labels,
            epoch,
        }
    }
}

impl<Message> canvas::Program<Message> for SensorScatter {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = background(renderer, bounds);
        let x_extent = finite_extent(self.samples.iter().map(|s| &s.secs));
        let y_extent = finite_extent(self.samples.iter().map(|s| &s.v));
        if let (Some(x_extent), Some(y_extent)) = (x_extent, y_extent) {
            for sample in &self.samples {
                if !sample.v.is_finite() {
                    continue;
                }
                let point = Point::new(
                    scale(sample.secs, x_extent, bounds.width),
                    bounds.height - scale(sample.v, y_extent, bounds.height),
                );
                let dot = Path::circle(point, 1.5);
                frame.fill(&dot, label_color(&self.labels, sample.label));
            }

            if let Some(epoch) = self.epoch {
                let trace = epoch_trace(&self.samples, epoch);
                let path = Path::new(|builder| {
                    let mut pen_down = false;
                    for &(secs, v) in &trace {
                        if !v.is_finite() {
                            pen_down = false;
                            continue;
                        }
                        let point = Point::new(
                            scale(secs, x_extent, bounds.width),
                            bounds.height - scale(v, y_extent, bounds.height),
                        );
                        if pen_down {
                            builder.line_to(point);
                        } else {
                            builder.move_to(point);
                            pen_down = true;
                        }
                    }
                });
                frame.stroke(&path, Stroke::default().with_width(2.0).with_color(Color::WHITE));
            }
        }
        vec![frame.into_geometry()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eegcore::correlation::CorrelationEngine;
    use eegcore::montage::MontageProjector;
    use eegcore::table::{AxisKind, RawSensor};
    use ndarray::array;
    use num_complex::Complex64;

    #[test]
    fn diverging_scale_ends() {
        assert_eq!(diverging(-1.0), Color::from_rgb(0.0, 0.0, 1.0));
        assert_eq!(diverging(0.0), Color::WHITE);
        assert_eq!(diverging(4.0), Color::from_rgb(1.0, 0.0, 0.0));
    }

    #[test]
    fn unknown_colors_render_grey() {
        assert_eq!(rgb("gray"), Color::from_rgb8(128, 128, 128));
        assert_eq!(rgb("not-a-color"), Color::from_rgb8(128, 128, 128));
        assert_eq!(rgb("#1f77b4"), Color::from_rgb8(0x1f, 0x77, 0xb4));
    }

    #[test]
    fn extent_skips_nan_and_widens_flat_data() {
        let values = [f64::NAN, 2.0, -1.0];
        assert_eq!(finite_extent(&values), Some((-1.0, 2.0)));
        assert_eq!(finite_extent(&[3.0]), Some((2.0, 4.0)));
        assert_eq!(finite_extent(&[f64::NAN]), None);
    }

    fn mark(x2d: f64, y2d: f64, value: f64) -> TopoMark {
        TopoMark {
            name: String::new(),
            x2d,
            y2d,
            color: "gray".into(),
            value,
        }
    }

    #[test]
    fn interpolation_honours_sensor_values() {
        let marks = [mark(-1.0, 0.0, 2.0), mark(1.0, 0.0, -2.0), mark(0.0, 1.0, f64::NAN)];
        assert_eq!(interpolate(&marks, -1.0, 0.0), 2.0);
        assert!(interpolate(&marks, 0.0, 0.0).abs() < 1e-12);
        let near_left = interpolate(&marks, -0.5, 0.0);
        assert!(near_left > 0.0 && near_left < 2.0);
        assert!(interpolate(&[mark(0.0, 0.0, f64::NAN)], 0.5, 0.5).is_nan());
    }

    #[test]
    fn epoch_trace_keeps_one_epoch_in_time_order() {
        let sample = |v, secs, time_stamp| SensorSample {
            v,
            secs,
            time_stamp,
            label: 1,
        };
        let samples = [
            sample(1.0, 0.1, 10),
            sample(2.0, 0.0, 20),
            sample(3.0, 0.0, 10),
        ];
        assert_eq!(epoch_trace(&samples, 10), vec![(0.0, 3.0), (0.1, 1.0)]);
        assert!(epoch_trace(&samples, 30).is_empty());
    }

    #[test]
    fn hidden_channels_are_not_traced() {
        let montage = MontageProjector::default().index(&[
            RawSensor::new("FP1", -0.03, 0.08, -0.004),
            RawSensor::new("O1", -0.03, -0.1, 0.01),
        ]);
        let evoked = SampleMatrix::from_real(
            AxisKind::Times,
            vec![0.0, 0.1, 0.2],
            vec!["FP1".into(), "EXG1".into(), "O1".into()],
            array![[1.0, 0.0, 2.0], [2.0, 1.0, 1.0], [4.0, 0.0, 3.0]],
        );
        let view =
            ViewState::build(&montage, &CorrelationEngine::default(), 1, evoked, None).unwrap();
        let visible: HashSet<String> = ["O1".to_string()].into_iter().collect();
        let traces = EvokedTraces::new(&view, &visible);
        assert_eq!(traces.traces.len(), 1);
        assert_eq!(traces.traces[0].1, vec![2.0, 1.0, 3.0]);
    }

    #[test]
    fn spectrum_traces_use_magnitudes() {
        let matrix = SampleMatrix::from_complex(
            AxisKind::Freq,
            vec![0.0, 1.0],
            vec!["A".into()],
            array![[Complex64::new(3.0, 4.0)], [Complex64::new(0.0, -2.0)]],
        );
        assert_eq!(column_trace(&matrix, 0), vec![5.0, 2.0]);

        let real = SampleMatrix::from_real(
            AxisKind::Times,
            vec![0.0, 1.0],
            vec!["A".into()],
            array![[1.5], [-0.5]],
        );
        assert_eq!(column_trace(&real, 0), vec![1.5, -0.5]);
    }
}
