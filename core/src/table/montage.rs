use crate::prelude::EngineResult;
use crate::table::{header_position, reader};
use serde::{Deserialize, Serialize};

/// One montage-table row exactly as served: coordinates stay text until the
/// projector parses them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSensor {
    pub name: String,
    pub x: String,
    pub y: String,
    pub z: String,
}

impl RawSensor {
    pub fn new(name: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            name: name.into(),
            x: x.to_string(),
            y: y.to_string(),
            z: z.to_string(),
        }
    }
}

/// Parses `name,x,y,z` CSV, ignoring any extra columns.
pub fn parse_montage_csv(text: &str) -> EngineResult<Vec<RawSensor>> {
    let mut rdr = reader(text);
    let headers = rdr.headers()?.clone();
    let name = header_position(&headers, "name")?;
    let x = header_position(&headers, "x")?;
    let y = header_position(&headers, "y")?;
    let z = header_position(&headers, "z")?;

    let mut sensors = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let cell = |pos: usize| record.get(pos).unwrap_or("").to_string();
        sensors.push(RawSensor {
            name: cell(name),
            x: cell(x),
            y: cell(y),
            z: cell(z),
        });
    }
    Ok(sensors)
}

pub fn write_montage_csv(sensors: &[RawSensor]) -> EngineResult<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    for sensor in sensors {
        wtr.serialize(sensor)?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|err| crate::prelude::EngineError::Csv(err.into_error().into()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
