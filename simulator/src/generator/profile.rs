use crate::generator::montage::{standard_montage, HEAD_RADIUS_M};
use anyhow::{bail, Context};
use eegcore::table::{
    parse_float, AxisKind, EventRecord, EventTable, RawSensor, SampleMatrix, SingleSensorTable,
};
use ndarray::Array2;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Configuration for generating a synthetic recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingProfile {
    /// Number of standard 10-20 positions placed on the cap.
    pub sensors: usize,
    /// Recording channels with no montage position.
    pub extra_channels: Vec<String>,
    pub sample_rate: f64,
    pub tmin: f64,
    pub tmax: f64,
    pub labels: Vec<i64>,
    pub epochs_per_label: usize,
    /// Samples between consecutive events.
    pub event_spacing: i64,
    /// Peak evoked amplitude, volts.
    pub amplitude: f64,
    /// Uniform noise half-width, volts.
    pub noise: f64,
    pub seed: u64,
}

impl Default for RecordingProfile {
    fn default() -> Self {
        Self {
            sensors: 20,
            extra_channels: vec!["EXG1".into(), "EXG2".into()],
            sample_rate: 200.0,
            tmin: -0.2,
            tmax: 0.8,
            labels: vec![1, 2, 3],
            epochs_per_label: 12,
            event_spacing: 1000,
            amplitude: 8e-6,
            noise: 2e-6,
            seed: 0,
        }
    }
}

/// Which evoked table a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    Time,
    Freq,
}

impl Domain {
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some("freq") | Some("frequency") => Domain::Freq,
            _ => Domain::Time,
        }
    }
}

/// Synthetic epoched recording.
#[derive(Debug, Clone)]
pub struct Recording {
    pub events: EventTable,
    pub montage: Vec<RawSensor>,
    pub channels: Vec<String>,
    pub times: Vec<f64>,
    /// One `times × channels` block per event, aligned with `events.records`.
    pub epochs: Vec<Array2<f64>>,
}

/// Normalized lateral/vertical weight of a sensor for a label's source direction.
fn spatial_weight(sensor: &RawSensor, azimuth: f64) -> f64 {
    let x = parse_float(&sensor.x) / HEAD_RADIUS_M;
    let y = parse_float(&sensor.y) / HEAD_RADIUS_M;
    let z = parse_float(&sensor.z) / HEAD_RADIUS_M;
    x * azimuth.cos() + y * azimuth.sin() + 0.5 * z
}

fn waveform(t: f64, latency: f64) -> f64 {
    let envelope = (-((t - latency) / 0.05).powi(2)).exp();
    envelope * (2.0 * PI * 10.0 * t).sin()
}

impl Recording {
    pub fn generate(profile: &RecordingProfile) -> anyhow::Result<Self> {
        if profile.labels.is_empty() {
            bail!("recording profile needs at least one event label");
        }
        if profile.sample_rate <= 0.0 || profile.tmax <= profile.tmin {
            bail!(
                "invalid epoch window {}..{} at {} Hz",
                profile.tmin,
                profile.tmax,
                profile.sample_rate
            );
        }

        let montage = standard_montage(profile.sensors);
        let mut channels: Vec<String> = montage.iter().map(|s| s.name.clone()).collect();
        channels.extend(profile.extra_channels.iter().cloned());

        let n_times = ((profile.tmax - profile.tmin) * profile.sample_rate).round() as usize + 1;
        let times: Vec<f64> = (0..n_times)
            .map(|i| profile.tmin + i as f64 / profile.sample_rate)
            .collect();

        let n_events = profile
            .epochs_per_label
            .checked_mul(profile.labels.len())
            .context("overflow computing event count")?;
        let mut rng = StdRng::seed_from_u64(profile.seed);
        let mut records = Vec::with_capacity(n_events);
        let mut epochs = Vec::with_capacity(n_events);

        for k in 0..n_events {
            let label_index = k % profile.labels.len();
            records.push(EventRecord {
                time_stamp: (k as i64 + 1) * profile.event_spacing,
                label: profile.labels[label_index],
            });

            let azimuth = label_index as f64 * 2.0 * PI / profile.labels.len() as f64;
            let latency = 0.1 * (label_index as f64 + 1.0);
            let mut block = Array2::zeros((n_times, channels.len()));
            for (row, &t) in times.iter().enumerate() {
                let signal = profile.amplitude * waveform(t, latency);
                for (col, _) in channels.iter().enumerate() {
                    let weight = montage
                        .get(col)
                        .map(|sensor| spatial_weight(sensor, azimuth))
                        .unwrap_or(0.0);
                    let jitter = if profile.noise > 0.0 {
                        rng.gen_range(-profile.noise..profile.noise)
                    } else {
                        0.0
                    };
                    block[[row, col]] = weight * signal + jitter;
                }
            }
            epochs.push(block);
        }

        Ok(Self {
            events: EventTable::new(records),
            montage,
            channels,
            times,
            epochs,
        })
    }

    /// Average over the epochs of `label`, as a `_times` or `_freq` table.
    pub fn evoked(&self, label: i64, domain: Domain) -> anyhow::Result<SampleMatrix> {
        let blocks: Vec<&Array2<f64>> = self
            .events
            .records
            .iter()
            .zip(&self.epochs)
            .filter(|(event, _)| event.label == label)
            .map(|(_, block)| block)
            .collect();
        if blocks.is_empty() {
            bail!("no epochs for event label {}", label);
        }

        let mut mean = Array2::zeros((self.times.len(), self.channels.len()));
        for block in &blocks {
            mean += *block;
        }
        mean /= blocks.len() as f64;

        let matrix =
            SampleMatrix::from_real(AxisKind::Times, self.times.clone(), self.channels.clone(), mean);
        match domain {
            Domain::Time => Ok(matrix),
            Domain::Freq => matrix
                .spectrum()
                .with_context(|| format!("computing spectrum for label {}", label)),
        }
    }

    /// Every epoch of one channel, or `None` for an unknown channel.
    pub fn single_sensor(&self, name: &str) -> Option<SingleSensorTable> {
        let col = self.channels.iter().position(|channel| channel == name)?;
        let mut epochs = Array2::zeros((self.epochs.len(), self.times.len()));
        for (row, block) in self.epochs.iter().enumerate() {
            epochs.row_mut(row).assign(&block.column(col));
        }
        Some(SingleSensorTable {
            epochs,
            times: self.times.clone(),
        })
    }
}
