use crate::montage::projection::Polar;
use crate::table::{parse_float, RawSensor};
use serde::Serialize;

/// A projected montage sensor.
///
/// `x`, `y`, `z` are in the plotting frame (see [`remap_axes`]). The derived
/// fields are written once by the projector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sensor {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub radius: f64,
    pub theta: f64,
    pub phi: f64,
    pub color: String,
}

/// Montage frame `(x, y, z)` to plotting frame `(x, z, y)`.
///
/// The montage file's vertical axis is its third coordinate while the
/// plotting convention puts vertical second, so polar angles are only right
/// after this swap. Unparsable coordinates come through as NaN.
pub fn remap_axes(raw: &RawSensor) -> [f64; 3] {
    [parse_float(&raw.x), parse_float(&raw.z), parse_float(&raw.y)]
}

impl Sensor {
    pub fn polar(&self) -> Polar {
        Polar {
            radius: self.radius,
            theta: self.theta,
            phi: self.phi,
        }
    }

    pub fn x2d(&self) -> f64 {
        self.theta * self.phi.cos()
    }

    pub fn y2d(&self) -> f64 {
        self.theta * self.phi.sin()
    }

    /// False when any derived coordinate is NaN or infinite; such sensors
    /// cannot be placed on a flat map.
    pub fn is_projectable(&self) -> bool {
        self.polar().is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_remap_swaps_y_and_z() {
        let raw = RawSensor::new("T", 1.0, 2.0, 3.0);
        assert_eq!(remap_axes(&raw), [1.0, 3.0, 2.0]);
    }

    #[test]
    fn unparsable_coordinate_is_nan() {
        let raw = RawSensor {
            name: "T".into(),
            x: "n/a".into(),
            y: "0".into(),
            z: "1".into(),
        };
        let [x, y, z] = remap_axes(&raw);
        assert!(x.is_nan());
        assert_eq!((y, z), (1.0, 0.0));
    }
}
