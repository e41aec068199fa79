use crate::prelude::{EngineError, EngineResult};
use crate::table::{parse_float, reader, EventTable};
use ndarray::Array2;
use serde::Serialize;

/// Index label of the trailing row that maps column keys to seconds.
pub const TIMES_ROW: &str = "times";

/// Per-epoch trace of one sensor: one row per epoch, one column per time bin.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleSensorTable {
    pub epochs: Array2<f64>,
    pub times: Vec<f64>,
}

/// One point of the single-sensor scatter, tagged with its epoch's event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensorSample {
    pub v: f64,
    pub secs: f64,
    pub time_stamp: i64,
    pub label: i64,
}

impl SingleSensorTable {
    /// Parses the table; the last row is always read as the time row.
    pub fn from_csv(text: &str) -> EngineResult<Self> {
        let mut rdr = reader(text);
        let headers = rdr.headers()?.clone();
        let value_cols: Vec<usize> = headers
            .iter()
            .enumerate()
            .filter(|(_, name)| !name.is_empty())
            .map(|(pos, _)| pos)
            .collect();

        let mut rows: Vec<Vec<f64>> = Vec::new();
        for record in rdr.records() {
            let record = record?;
            rows.push(
                value_cols
                    .iter()
                    .map(|&pos| parse_float(record.get(pos).unwrap_or("")))
                    .collect(),
            );
        }
        let times = rows
            .pop()
            .ok_or_else(|| EngineError::EmptyTable("single sensor table has no times row".into()))?;

        let n_epochs = rows.len();
        let epochs = Array2::from_shape_vec((n_epochs, times.len()), rows.concat())
            .map_err(|_| EngineError::EmptyTable("ragged single sensor table".into()))?;
        Ok(Self { epochs, times })
    }

    pub fn to_csv(&self) -> EngineResult<String> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        let mut header = vec![String::new()];
        header.extend((0..self.times.len()).map(|bin| bin.to_string()));
        wtr.write_record(&header)?;
        for (epoch, row) in self.epochs.rows().into_iter().enumerate() {
            let mut record = vec![epoch.to_string()];
            record.extend(row.iter().map(|v| v.to_string()));
            wtr.write_record(&record)?;
        }
        let mut record = vec![TIMES_ROW.to_string()];
        record.extend(self.times.iter().map(|v| v.to_string()));
        wtr.write_record(&record)?;

        let bytes = wtr
            .into_inner()
            .map_err(|err| EngineError::Csv(err.into_error().into()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Pairs epoch `i` with event `i`. Epochs beyond the events table are ignored.
    pub fn join_events(&self, events: &EventTable) -> Vec<SensorSample> {
        let mut samples = Vec::with_capacity(self.epochs.len());
        for (event, row) in events.records.iter().zip(self.epochs.rows()) {
            for (&v, &secs) in row.iter().zip(&self.times) {
                samples.push(SensorSample {
                    v,
                    secs,
                    time_stamp: event.time_stamp,
                    label: event.label,
                });
            }
        }
        samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::EventRecord;

    const CSV: &str = ",0,1,2\n0,1.0,2.0,3.0\n1,4.0,5.0,6.0\ntimes,-0.1,0.0,0.1\n";

    #[test]
    fn last_row_holds_times() {
        let table = SingleSensorTable::from_csv(CSV).unwrap();
        assert_eq!(table.epochs.dim(), (2, 3));
        assert_eq!(table.times, vec![-0.1, 0.0, 0.1]);
        assert_eq!(table.epochs[[1, 2]], 6.0);
    }

    #[test]
    fn join_tags_each_point_with_its_event() {
        let table = SingleSensorTable::from_csv(CSV).unwrap();
        let events = EventTable::new(vec![
            EventRecord { time_stamp: 100, label: 1 },
            EventRecord { time_stamp: 200, label: 2 },
        ]);
        let samples = table.join_events(&events);
        assert_eq!(samples.len(), 6);
        assert_eq!(samples[4].v, 5.0);
        assert_eq!(samples[4].secs, 0.0);
        assert_eq!(samples[4].label, 2);
    }

    #[test]
    fn empty_table_is_an_error() {
        assert!(SingleSensorTable::from_csv(",0,1\n").is_err());
    }

    #[test]
    fn written_table_reads_back() {
        let table = SingleSensorTable::from_csv(CSV).unwrap();
        let again = SingleSensorTable::from_csv(&table.to_csv().unwrap()).unwrap();
        assert_eq!(again, table);
    }
}
