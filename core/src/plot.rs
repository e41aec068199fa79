//! Shapes computed values into the marks the dashboard draws.
//!
//! Filtering unprojectable sensors and blanking the heatmap diagonal happen
//! here, not in the projector or the engine.

use crate::correlation::CorrelationMatrix;
use crate::montage::Sensor;
use crate::table::SampleMatrix;
use serde::Serialize;

/// One sensor dot on the flat scalp map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopoMark {
    pub name: String,
    pub x2d: f64,
    pub y2d: f64,
    pub color: String,
    /// Field value driving the contour fill, NaN when unknown.
    pub value: f64,
}

/// One heatmap cell; `fill` is `None` where nothing should be painted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatCell {
    pub n1: String,
    pub n2: String,
    pub corr: f64,
    pub fill: Option<f64>,
}

fn mark(sensor: &Sensor, value: f64) -> TopoMark {
    TopoMark {
        name: sensor.name.clone(),
        x2d: sensor.x2d(),
        y2d: sensor.y2d(),
        color: sensor.color.clone(),
        value,
    }
}

/// Dots for every projectable sensor, in input order.
pub fn sensor_marks(sensors: &[Sensor]) -> Vec<TopoMark> {
    sensors
        .iter()
        .filter(|sensor| sensor.is_projectable())
        .map(|sensor| mark(sensor, f64::NAN))
        .collect()
}

/// Dots carrying the values of one row of `matrix` (magnitudes for spectra).
pub fn topo_marks(sensors: &[Sensor], matrix: &SampleMatrix, row: usize) -> Vec<TopoMark> {
    let values = matrix.row_values(row).unwrap_or_default();
    sensors
        .iter()
        .filter(|sensor| sensor.is_projectable())
        .map(|sensor| {
            let value = matrix
                .column_index(&sensor.name)
                .and_then(|col| values.get(col).copied())
                .unwrap_or(f64::NAN);
            mark(sensor, value)
        })
        .collect()
}

/// Every N² cell, row-major; the diagonal and NaN entries get no fill.
pub fn heatmap_cells(matrix: &CorrelationMatrix) -> Vec<HeatCell> {
    matrix
        .entries()
        .into_iter()
        .map(|entry| {
            let fill = if entry.n1 == entry.n2 || entry.corr.is_nan() {
                None
            } else {
                Some(entry.corr)
            };
            HeatCell {
                n1: entry.n1,
                n2: entry.n2,
                corr: entry.corr,
                fill,
            }
        })
        .collect()
}

/// Largest absolute fill, for a symmetric diverging color domain.
pub fn fill_extent(cells: &[HeatCell]) -> Option<f64> {
    cells
        .iter()
        .filter_map(|cell| cell.fill)
        .map(f64::abs)
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlation::CorrelationEngine;
    use crate::montage::MontageProjector;
    use crate::table::{AxisKind, RawSensor};
    use ndarray::array;

    fn sensors() -> Vec<Sensor> {
        MontageProjector::default().project(&[
            RawSensor::new("A", -0.03, 0.08, 0.0),
            RawSensor::new("ORIGIN", 0.0, 0.0, 0.0),
            RawSensor::new("B", 0.03, 0.08, 0.0),
        ])
    }

    fn matrix() -> SampleMatrix {
        SampleMatrix::from_real(
            AxisKind::Times,
            vec![0.0, 0.5, 1.0],
            vec!["B".into(), "A".into(), "ORIGIN".into()],
            array![[1.0, 2.0, 9.0], [3.0, 1.0, 8.0], [2.0, 3.0, 7.0]],
        )
    }

    #[test]
    fn unprojectable_sensors_are_left_out() {
        let marks = sensor_marks(&sensors());
        let names: Vec<&str> = marks.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert!(marks[0].value.is_nan());
    }

    #[test]
    fn topo_values_are_joined_by_name() {
        let marks = topo_marks(&sensors(), &matrix(), 1);
        assert_eq!(marks[0].value, 1.0);
        assert_eq!(marks[1].value, 3.0);
    }

    #[test]
    fn diagonal_has_no_fill() {
        let sensors = sensors();
        let good = [sensors[0].clone(), sensors[2].clone()];
        let corr = CorrelationEngine::default().compute(&matrix(), &good).unwrap();
        let cells = heatmap_cells(&corr);
        assert_eq!(cells.len(), 4);
        assert!(cells[0].fill.is_none());
        assert!(cells[0].corr.is_finite());
        assert_eq!(cells[1].fill, Some(cells[1].corr));
        assert!(fill_extent(&cells).unwrap() > 0.0);
    }
}
