//! Tabular schemas served by the backend.
//!
//! Tables arrive as CSV written by a dataframe library: a leading index column
//! with an empty header is common and is ignored wherever it appears.

pub mod events;
pub mod evoked;
pub mod montage;
pub mod single_sensor;

pub use events::{EventRecord, EventTable};
pub use evoked::{AxisKind, SampleMatrix, Samples};
pub use montage::RawSensor;
pub use single_sensor::{SensorSample, SingleSensorTable};

use crate::prelude::{EngineError, EngineResult};

/// Parse a float the way a lenient table reader would, NaN when unparsable.
pub fn parse_float(cell: &str) -> f64 {
    cell.trim().parse::<f64>().unwrap_or(f64::NAN)
}

pub(crate) fn reader(text: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(text.as_bytes())
}

pub(crate) fn header_position(headers: &csv::StringRecord, name: &str) -> EngineResult<usize> {
    headers
        .iter()
        .position(|header| header == name)
        .ok_or_else(|| EngineError::MissingColumn(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_float_is_nan_on_garbage() {
        assert_eq!(parse_float(" 1.5 "), 1.5);
        assert!(parse_float("").is_nan());
        assert!(parse_float("abc").is_nan());
    }
}
