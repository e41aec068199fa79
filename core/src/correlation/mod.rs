//! Correlation Engine: dense sensor × sensor matrices for the heatmap view.

pub mod frequency;
pub mod matrix;
pub mod time_domain;

pub use matrix::{CorrelationEntry, CorrelationMatrix};

use crate::montage::Sensor;
use crate::prelude::{CorrelationConfig, DataMode, EngineError, EngineResult};
use crate::table::{SampleMatrix, Samples};
use crate::telemetry::LogManager;

pub struct CorrelationEngine {
    config: CorrelationConfig,
    logger: LogManager,
}

impl CorrelationEngine {
    pub fn new(config: CorrelationConfig) -> Self {
        Self {
            config,
            logger: LogManager::new("correlation"),
        }
    }

    /// Correlates every ordered pair of `sensors` in whichever mode the
    /// matrix holds.
    ///
    /// `sensors` must already be the montage/recording intersection; each
    /// must have a column in `matrix`.
    pub fn compute(
        &self,
        matrix: &SampleMatrix,
        sensors: &[Sensor],
    ) -> EngineResult<CorrelationMatrix> {
        match matrix.mode() {
            DataMode::TimeDomain => self.time_domain(matrix, sensors),
            DataMode::FrequencyDomain => self.frequency_domain(matrix, sensors),
        }
    }

    pub fn time_domain(
        &self,
        matrix: &SampleMatrix,
        sensors: &[Sensor],
    ) -> EngineResult<CorrelationMatrix> {
        let Samples::Real(cells) = matrix.cells() else {
            return Err(EngineError::ModeMismatch {
                requested: DataMode::TimeDomain,
                actual: matrix.mode(),
            });
        };
        let positions = resolve_columns(matrix, sensors)?;
        let columns: Vec<Vec<f64>> = positions
            .iter()
            .map(|&col| cells.column(col).to_vec())
            .collect();

        let values = time_domain::correlate(&columns, matrix.n_rows(), self.config.volts_scale);
        self.finish(DataMode::TimeDomain, sensors, values)
    }

    pub fn frequency_domain(
        &self,
        matrix: &SampleMatrix,
        sensors: &[Sensor],
    ) -> EngineResult<CorrelationMatrix> {
        let Samples::Complex(cells) = matrix.cells() else {
            return Err(EngineError::ModeMismatch {
                requested: DataMode::FrequencyDomain,
                actual: matrix.mode(),
            });
        };
        let positions = resolve_columns(matrix, sensors)?;
        let columns: Vec<_> = positions
            .iter()
            .map(|&col| cells.column(col).to_vec())
            .collect();

        let values = frequency::correlate(&columns, matrix.n_rows());
        self.finish(DataMode::FrequencyDomain, sensors, values)
    }

    fn finish(
        &self,
        mode: DataMode,
        sensors: &[Sensor],
        values: ndarray::Array2<f64>,
    ) -> EngineResult<CorrelationMatrix> {
        let nan = values.iter().filter(|v| v.is_nan()).count();
        self.logger.record(&format!(
            "{} matrix over {} sensors ({} NaN entries)",
            mode,
            sensors.len(),
            nan
        ));
        let names = sensors.iter().map(|sensor| sensor.name.clone()).collect();
        Ok(CorrelationMatrix::new(mode, names, values))
    }
}

impl Default for CorrelationEngine {
    fn default() -> Self {
        Self::new(CorrelationConfig::default())
    }
}

/// Column position of each sensor, resolved once ahead of the pair loop.
fn resolve_columns(matrix: &SampleMatrix, sensors: &[Sensor]) -> EngineResult<Vec<usize>> {
    sensors
        .iter()
        .map(|sensor| {
            matrix
                .column_index(&sensor.name)
                .ok_or_else(|| EngineError::MissingColumn(sensor.name.clone()))
        })
        .collect()
}
