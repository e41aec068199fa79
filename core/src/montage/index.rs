use crate::montage::color::UNPLACED_COLOR;
use crate::montage::Sensor;
use log::{debug, warn};
use serde::Serialize;
use std::collections::HashMap;

/// Name-keyed lookup over one montage, built once per montage load.
///
/// Keys are upper-cased so `Fp1` in a montage file matches `FP1` in a recording.
#[derive(Debug, Clone, Default)]
pub struct SensorIndex {
    sensors: Vec<Sensor>,
    by_name: HashMap<String, usize>,
}

/// Recording channels split by whether the montage can place them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorJoin {
    /// Montage sensors renamed to the recording's spelling, recording order.
    pub good: Vec<Sensor>,
    /// Recording-only names, recording order.
    pub bad: Vec<String>,
}

/// Legend entry for a recording channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelEntry {
    pub name: String,
    pub color: String,
    pub is_good: bool,
}

fn key(name: &str) -> String {
    name.trim().to_uppercase()
}

impl SensorIndex {
    pub fn new(sensors: Vec<Sensor>) -> Self {
        let mut by_name = HashMap::with_capacity(sensors.len());
        for (pos, sensor) in sensors.iter().enumerate() {
            if by_name.insert(key(&sensor.name), pos).is_some() {
                warn!("duplicate montage sensor {}; keeping the last entry", sensor.name);
            }
        }
        Self { sensors, by_name }
    }

    /// Sensors in montage order.
    pub fn sensors(&self) -> &[Sensor] {
        &self.sensors
    }

    pub fn get(&self, name: &str) -> Option<&Sensor> {
        self.by_name.get(&key(name)).map(|&pos| &self.sensors[pos])
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    /// Intersects recording channel names with the montage.
    pub fn join<S: AsRef<str>>(&self, channels: &[S]) -> SensorJoin {
        let mut join = SensorJoin::default();
        for channel in channels {
            let name = channel.as_ref();
            match self.get(name) {
                Some(sensor) => {
                    let mut sensor = sensor.clone();
                    sensor.name = name.to_string();
                    join.good.push(sensor);
                }
                None => join.bad.push(name.to_string()),
            }
        }
        if !join.bad.is_empty() {
            debug!("channels without montage position: {:?}", join.bad);
        }
        join
    }
}

impl SensorJoin {
    pub fn is_good(&self, name: &str) -> bool {
        self.good.iter().any(|sensor| sensor.name == name)
    }

    /// Legend entries in recording order; unplaced channels are drawn grey.
    pub fn channels<S: AsRef<str>>(&self, recording_order: &[S]) -> Vec<ChannelEntry> {
        let colors: HashMap<&str, &str> = self
            .good
            .iter()
            .map(|sensor| (sensor.name.as_str(), sensor.color.as_str()))
            .collect();
        recording_order
            .iter()
            .map(|name| {
                let name = name.as_ref();
                let color = colors.get(name).copied();
                ChannelEntry {
                    name: name.to_string(),
                    color: color.unwrap_or(UNPLACED_COLOR).to_string(),
                    is_good: color.is_some(),
                }
            })
            .collect()
    }

    /// Sorted good names followed by sorted bad names.
    pub fn sensor_choices(&self) -> Vec<String> {
        let mut good: Vec<String> = self.good.iter().map(|s| s.name.clone()).collect();
        let mut bad = self.bad.clone();
        good.sort();
        bad.sort();
        good.extend(bad);
        good
    }
}
