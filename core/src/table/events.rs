use crate::prelude::{EngineError, EngineResult};
use crate::table::{header_position, reader};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One recorded event: sample time stamp and event category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "timeStamp")]
    pub time_stamp: i64,
    pub label: i64,
}

/// Events table in recording order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventTable {
    pub records: Vec<EventRecord>,
}

fn parse_int(cell: &str) -> Option<i64> {
    let trimmed = cell.trim();
    trimmed
        .parse::<i64>()
        .ok()
        .or_else(|| trimmed.parse::<f64>().ok().map(|v| v.trunc() as i64))
}

impl EventTable {
    pub fn new(records: Vec<EventRecord>) -> Self {
        Self { records }
    }

    /// Parses `timeStamp,label` CSV. Rows that do not hold integers are skipped.
    pub fn from_csv(text: &str) -> EngineResult<Self> {
        let mut rdr = reader(text);
        let headers = rdr.headers()?.clone();
        let ts_col = header_position(&headers, "timeStamp")?;
        let label_col = header_position(&headers, "label")?;

        let mut records = Vec::new();
        for (row, record) in rdr.records().enumerate() {
            let record = record?;
            let ts = record.get(ts_col).and_then(parse_int);
            let label = record.get(label_col).and_then(parse_int);
            match (ts, label) {
                (Some(time_stamp), Some(label)) => records.push(EventRecord { time_stamp, label }),
                _ => warn!("skipping malformed event row {}", row),
            }
        }
        Ok(Self { records })
    }

    /// Parses column-oriented JSON: `{"timeStamp": {"0": 10, ...}, "label": {"0": 1, ...}}`.
    pub fn from_json(text: &str) -> EngineResult<Self> {
        let columns: BTreeMap<String, BTreeMap<String, serde_json::Value>> =
            serde_json::from_str(text)?;
        let ts = columns
            .get("timeStamp")
            .ok_or_else(|| EngineError::MissingColumn("timeStamp".into()))?;
        let labels = columns
            .get("label")
            .ok_or_else(|| EngineError::MissingColumn("label".into()))?;

        let mut keyed: Vec<(i64, EventRecord)> = Vec::with_capacity(ts.len());
        for (key, value) in ts {
            let (Some(index), Some(time_stamp), Some(label)) = (
                key.parse::<i64>().ok(),
                value.as_i64(),
                labels.get(key).and_then(|v| v.as_i64()),
            ) else {
                warn!("skipping malformed event entry {}", key);
                continue;
            };
            keyed.push((index, EventRecord { time_stamp, label }));
        }
        keyed.sort_by_key(|(index, _)| *index);
        Ok(Self {
            records: keyed.into_iter().map(|(_, record)| record).collect(),
        })
    }

    pub fn to_csv(&self) -> EngineResult<String> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        for record in &self.records {
            wtr.serialize(record)?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|err| EngineError::Csv(err.into_error().into()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Distinct labels in first-seen order.
    pub fn labels(&self) -> Vec<i64> {
        let mut labels = Vec::new();
        for record in &self.records {
            if !labels.contains(&record.label) {
                labels.push(record.label);
            }
        }
        labels
    }

    pub fn for_label(&self, label: i64) -> Vec<EventRecord> {
        self.records
            .iter()
            .filter(|record| record.label == label)
            .copied()
            .collect()
    }

    /// `(min, max)` time stamp, used as the timeline domain.
    pub fn extent(&self) -> Option<(i64, i64)> {
        let min = self.records.iter().map(|r| r.time_stamp).min()?;
        let max = self.records.iter().map(|r| r.time_stamp).max()?;
        Some((min, max))
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = ",timeStamp,label\n0,83767,1\n1,84767,2\n2,85767,1\n3,bad,2\n";

    #[test]
    fn csv_with_index_column_parses() {
        let table = EventTable::from_csv(CSV).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.labels(), vec![1, 2]);
        assert_eq!(table.for_label(1).len(), 2);
        assert_eq!(table.extent(), Some((83767, 85767)));
    }

    #[test]
    fn json_columns_are_ordered_by_index() {
        let json = r#"{"timeStamp": {"10": 300, "2": 100, "3": 200}, "label": {"10": 7, "2": 5, "3": 6}}"#;
        let table = EventTable::from_json(json).unwrap();
        let stamps: Vec<i64> = table.records.iter().map(|r| r.time_stamp).collect();
        assert_eq!(stamps, vec![100, 200, 300]);
        assert_eq!(table.labels(), vec![5, 6, 7]);
    }

    #[test]
    fn missing_label_column_is_a_schema_error() {
        let err = EventTable::from_csv("timeStamp\n1\n").unwrap_err();
        assert!(matches!(err, EngineError::MissingColumn(name) if name == "label"));
    }

    #[test]
    fn written_csv_reads_back() {
        let table = EventTable::new(vec![
            EventRecord { time_stamp: 5, label: 1 },
            EventRecord { time_stamp: 9, label: 3 },
        ]);
        let text = table.to_csv().unwrap();
        assert!(text.starts_with("timeStamp,label"));
        assert_eq!(EventTable::from_csv(&text).unwrap(), table);
    }
}
