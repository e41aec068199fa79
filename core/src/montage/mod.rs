//! Montage Projector: 3D sensor positions to flat scalp-map coordinates and
//! display colors.

pub mod color;
pub mod index;
pub mod projection;
pub mod sensor;

pub use index::{ChannelEntry, SensorIndex, SensorJoin};
pub use projection::{xyz2polar, Polar};
pub use sensor::{remap_axes, Sensor};

use crate::prelude::{ColorPolicy, ProjectionConfig};
use crate::table::RawSensor;
use crate::telemetry::LogManager;

/// Turns montage-table rows into projected [`Sensor`]s.
pub struct MontageProjector {
    config: ProjectionConfig,
    logger: LogManager,
}

impl MontageProjector {
    pub fn new(config: ProjectionConfig) -> Self {
        Self {
            config,
            logger: LogManager::new("montage"),
        }
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// Projects every row, keeping input order.
    ///
    /// Rows with missing or unparsable coordinates are kept with NaN derived
    /// values; filtering them is left to the renderer.
    pub fn project(&self, raw: &[RawSensor]) -> Vec<Sensor> {
        let sensors: Vec<Sensor> = raw
            .iter()
            .enumerate()
            .map(|(index, row)| {
                let [x, y, z] = remap_axes(row);
                let polar = xyz2polar(x, y, z);
                let color = match self.config.color_policy {
                    ColorPolicy::Categorical => color::categorical(index).to_string(),
                    ColorPolicy::Angular => color::angular(polar.theta, polar.phi),
                };
                Sensor {
                    name: row.name.clone(),
                    x,
                    y,
                    z,
                    radius: polar.radius,
                    theta: polar.theta,
                    phi: polar.phi,
                    color,
                }
            })
            .collect();

        let unplaced = sensors.iter().filter(|s| !s.is_projectable()).count();
        self.logger.record(&format!(
            "projected {} sensors ({} unprojectable)",
            sensors.len(),
            unplaced
        ));
        sensors
    }

    /// Projects and indexes a montage in one step.
    pub fn index(&self, raw: &[RawSensor]) -> SensorIndex {
        SensorIndex::new(self.project(raw))
    }
}

impl Default for MontageProjector {
    fn default() -> Self {
        Self::new(ProjectionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn montage() -> Vec<RawSensor> {
        vec![
            RawSensor::new("FP1", -0.03, 0.08, -0.004),
            RawSensor::new("FP2", 0.03, 0.08, -0.004),
            RawSensor::new("CZ", 0.0, 0.0, 0.1),
            RawSensor::new("O1", -0.03, -0.1, 0.01),
            RawSensor::new("T7", -0.08, -0.01, 0.0),
        ]
    }

    #[test]
    fn projection_applies_axis_swap_first() {
        let sensors = MontageProjector::default().project(&[RawSensor::new("T", 1.0, 2.0, 3.0)]);
        let sensor = &sensors[0];
        assert_eq!((sensor.x, sensor.y, sensor.z), (1.0, 3.0, 2.0));
        let expected = xyz2polar(1.0, 3.0, 2.0);
        assert_eq!(sensor.polar(), expected);
    }

    #[test]
    fn vertex_sensor_sits_at_map_center() {
        let sensors = MontageProjector::default().project(&montage());
        let cz = &sensors[2];
        assert!(cz.theta.abs() < 1e-12);
        assert!(cz.x2d().abs() < 1e-12 && cz.y2d().abs() < 1e-12);
    }

    #[test]
    fn categorical_policy_follows_input_order() {
        let projector = MontageProjector::new(ProjectionConfig {
            color_policy: ColorPolicy::Categorical,
        });
        let sensors = projector.project(&montage());
        assert_eq!(sensors[0].color, color::CATEGORY10[0]);
        assert_eq!(sensors[4].color, color::CATEGORY10[4]);
    }

    #[test]
    fn angular_colors_survive_reordering() {
        let projector = MontageProjector::default();
        let forward: HashMap<String, String> = projector
            .project(&montage())
            .into_iter()
            .map(|s| (s.name, s.color))
            .collect();
        let mut reversed = montage();
        reversed.reverse();
        let backward: HashMap<String, String> = projector
            .project(&reversed)
            .into_iter()
            .map(|s| (s.name, s.color))
            .collect();
        assert_eq!(forward, backward);
    }

    #[test]
    fn broken_rows_are_kept_with_nan() {
        let mut raw = montage();
        raw.push(RawSensor::new("REF", 0.0, 0.0, 0.0));
        raw.push(RawSensor {
            name: "BAD".into(),
            x: "".into(),
            y: "0.1".into(),
            z: "0.1".into(),
        });
        let sensors = MontageProjector::default().project(&raw);
        assert_eq!(sensors.len(), raw.len());
        assert!(sensors[5].theta.is_nan());
        assert!(!sensors[5].is_projectable());
        assert!(!sensors[6].is_projectable());
        assert!(sensors[..5].iter().all(Sensor::is_projectable));
    }
}
