use std::f64::consts::PI;

/// d3 `schemeCategory10`.
pub const CATEGORY10: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

/// Color drawn for recording channels that have no montage position.
pub const UNPLACED_COLOR: &str = "gray";

pub fn categorical(index: usize) -> &'static str {
    CATEGORY10[index % CATEGORY10.len()]
}

/// Hue from azimuth, saturation from inclination, fixed lightness.
pub fn angular(theta: f64, phi: f64) -> String {
    hsl_to_hex(phi / PI / 2.0 * 360.0, theta / PI, 0.5)
}

fn channel(h: f64, m1: f64, m2: f64) -> f64 {
    let value = if h < 60.0 {
        m1 + (m2 - m1) * h / 60.0
    } else if h < 180.0 {
        m2
    } else if h < 240.0 {
        m1 + (m2 - m1) * (240.0 - h) / 60.0
    } else {
        m1
    };
    value * 255.0
}

fn to_byte(value: f64) -> u8 {
    if value.is_nan() {
        0
    } else {
        value.round().clamp(0.0, 255.0) as u8
    }
}

/// HSL to `#rrggbb`. Negative hues wrap into `[0, 360)`; a NaN hue or
/// saturation renders achromatic.
pub fn hsl_to_hex(hue: f64, saturation: f64, lightness: f64) -> String {
    let wrap = if hue < 0.0 { 360.0 } else { 0.0 };
    let h = hue % 360.0 + wrap;
    let s = if h.is_nan() || saturation.is_nan() {
        0.0
    } else {
        saturation
    };
    let l = lightness;
    let spread = if l < 0.5 { l } else { 1.0 - l };
    let m2 = l + spread * s;
    let m1 = 2.0 * l - m2;

    let r = channel(if h >= 240.0 { h - 240.0 } else { h + 120.0 }, m1, m2);
    let g = channel(h, m1, m2);
    let b = channel(if h < 120.0 { h + 240.0 } else { h - 120.0 }, m1, m2);
    format!("#{:02x}{:02x}{:02x}", to_byte(r), to_byte(g), to_byte(b))
}

/// `#rrggbb` to bytes. Named colors other than [`UNPLACED_COLOR`] are not understood.
pub fn parse_hex(color: &str) -> Option<[u8; 3]> {
    if color == UNPLACED_COLOR {
        return Some([128, 128, 128]);
    }
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let byte = |range: std::ops::Range<usize>| u8::from_str_radix(hex.get(range)?, 16).ok();
    Some([byte(0..2)?, byte(2..4)?, byte(4..6)?])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_wraps_every_ten() {
        assert_eq!(categorical(0), "#1f77b4");
        assert_eq!(categorical(13), "#d62728");
    }

    #[test]
    fn primary_hues() {
        assert_eq!(hsl_to_hex(0.0, 1.0, 0.5), "#ff0000");
        assert_eq!(hsl_to_hex(120.0, 1.0, 0.5), "#00ff00");
        assert_eq!(hsl_to_hex(-120.0, 1.0, 0.5), "#0000ff");
    }

    #[test]
    fn nan_saturation_is_grey() {
        assert_eq!(hsl_to_hex(90.0, f64::NAN, 0.5), "#808080");
        assert_eq!(angular(f64::NAN, 0.0), "#808080");
    }

    #[test]
    fn pole_is_unsaturated() {
        assert_eq!(angular(0.0, 1.0), "#808080");
    }

    #[test]
    fn hex_parses_back() {
        assert_eq!(parse_hex("#1f77b4"), Some([0x1f, 0x77, 0xb4]));
        assert_eq!(parse_hex("gray"), Some([128, 128, 128]));
        assert_eq!(parse_hex("#12"), None);
    }
}
