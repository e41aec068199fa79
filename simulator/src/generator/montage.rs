use eegcore::table::RawSensor;

/// Head radius used for the synthetic cap, meters.
pub const HEAD_RADIUS_M: f64 = 0.095;

/// 10-20 positions as (name, inclination from vertex, azimuth from +x toward
/// the nose), both in degrees.
const STANDARD_1020: [(&str, f64, f64); 20] = [
    ("FP1", 90.0, 108.0),
    ("FP2", 90.0, 72.0),
    ("F7", 90.0, 144.0),
    ("F3", 64.0, 129.0),
    ("FZ", 45.0, 90.0),
    ("F4", 64.0, 51.0),
    ("F8", 90.0, 36.0),
    ("T7", 90.0, 180.0),
    ("C3", 45.0, 180.0),
    ("CZ", 0.0, 0.0),
    ("C4", 45.0, 0.0),
    ("T8", 90.0, 0.0),
    ("P7", 90.0, 216.0),
    ("P3", 64.0, 231.0),
    ("PZ", 45.0, 270.0),
    ("P4", 64.0, 309.0),
    ("P8", 90.0, 324.0),
    ("O1", 90.0, 252.0),
    ("OZ", 90.0, 270.0),
    ("O2", 90.0, 288.0),
];

/// Montage-frame coordinates (z up) of a position on the head sphere.
pub fn sphere_position(inclination_deg: f64, azimuth_deg: f64) -> [f64; 3] {
    let theta = inclination_deg.to_radians();
    let phi = azimuth_deg.to_radians();
    [
        HEAD_RADIUS_M * theta.sin() * phi.cos(),
        HEAD_RADIUS_M * theta.sin() * phi.sin(),
        HEAD_RADIUS_M * theta.cos(),
    ]
}

/// The first `count` standard positions as montage-table rows.
pub fn standard_montage(count: usize) -> Vec<RawSensor> {
    STANDARD_1020
        .iter()
        .take(count)
        .map(|&(name, inclination, azimuth)| {
            let [x, y, z] = sphere_position(inclination, azimuth);
            RawSensor::new(name, x, y, z)
        })
        .collect()
}
