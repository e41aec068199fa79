/// Spherical coordinates of a sensor in the plotting frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Polar {
    pub radius: f64,
    /// Inclination from +y, `[0, π]`.
    pub theta: f64,
    /// Azimuth in the xz-plane, `(-π, π]`.
    pub phi: f64,
}

/// Cartesian to polar, inclination measured from the +y axis.
///
/// A sensor at the origin has `radius == 0` and `theta` comes out NaN.
pub fn xyz2polar(x: f64, y: f64, z: f64) -> Polar {
    let radius = (x * x + y * y + z * z).sqrt();
    let theta = (y / radius).acos();
    let phi = z.atan2(x);
    Polar { radius, theta, phi }
}

impl Polar {
    /// Azimuthal flattening with `theta` standing in for the radius.
    pub fn flatten(&self) -> (f64, f64) {
        (self.theta * self.phi.cos(), self.theta * self.phi.sin())
    }

    pub fn is_finite(&self) -> bool {
        self.radius.is_finite() && self.theta.is_finite() && self.phi.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn point_on_y_axis_is_the_pole() {
        let polar = xyz2polar(0.0, 3.0, 0.0);
        assert_eq!(polar.radius, 3.0);
        assert_eq!(polar.theta, 0.0);
        assert_eq!(polar.phi, 0.0);
    }

    #[test]
    fn point_on_x_axis_is_on_the_equator() {
        let polar = xyz2polar(1.0, 0.0, 0.0);
        assert_eq!(polar.radius, 1.0);
        assert!(close(polar.theta, FRAC_PI_2));
        assert_eq!(polar.phi, 0.0);
    }

    #[test]
    fn known_point_matches_reference_values() {
        let polar = xyz2polar(1.0, 2.0, 3.0);
        assert!(close(polar.radius, 3.7416573867739413));
        assert!(close(polar.theta, 1.0068536854342678));
        assert!(close(polar.phi, 1.2490457723982544));
    }

    #[test]
    fn origin_has_nan_inclination() {
        let polar = xyz2polar(0.0, 0.0, 0.0);
        assert_eq!(polar.radius, 0.0);
        assert!(polar.theta.is_nan());
        assert!(!polar.is_finite());
    }

    #[test]
    fn angles_stay_in_range() {
        let coords = [-1.0, -0.3, 0.0, 0.7, 2.0];
        for &x in &coords {
            for &y in &coords {
                for &z in &coords {
                    let polar = xyz2polar(x, y, z);
                    if polar.radius == 0.0 {
                        continue;
                    }
                    assert!((0.0..=PI).contains(&polar.theta));
                    assert!(polar.phi > -PI && polar.phi <= PI);
                    let (x2d, y2d) = polar.flatten();
                    assert_eq!(x2d, polar.theta * polar.phi.cos());
                    assert_eq!(y2d, polar.theta * polar.phi.sin());
                    assert!((x2d * x2d + y2d * y2d - polar.theta * polar.theta).abs() < 1e-9);
                }
            }
        }
    }
}
