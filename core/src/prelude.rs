use serde::{Deserialize, Serialize};

/// Palette policy used when the projector assigns sensor colors.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ColorPolicy {
    /// `CATEGORY10[index % 10]` in montage order.
    Categorical,
    /// Hue from azimuth, saturation from inclination.
    #[default]
    Angular,
}

/// Shared configuration for the montage projector.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProjectionConfig {
    pub color_policy: ColorPolicy,
}

/// Shared configuration for the correlation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    /// Multiplier applied to time-domain columns before z-scoring.
    pub volts_scale: f64,
}

/// Volts to microvolts.
pub const ENGINE_SCALE: f64 = 1e6;

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            volts_scale: ENGINE_SCALE,
        }
    }
}

/// Which of the two correlation modes a sample matrix supports.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DataMode {
    TimeDomain,
    FrequencyDomain,
}

impl std::fmt::Display for DataMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataMode::TimeDomain => write!(f, "time domain"),
            DataMode::FrequencyDomain => write!(f, "frequency domain"),
        }
    }
}

/// Common error type for table parsing and engine invocation.
///
/// Numeric degeneracy (zero variance, zero radius) is never reported here;
/// it shows up as NaN in the computed values.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("csv decode failure: {0}")]
    Csv(#[from] csv::Error),
    #[error("json decode failure: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing column: {0}")]
    MissingColumn(String),
    #[error("table has no axis column (_times or _freq)")]
    MissingAxis,
    #[error("cell {value:?} in column {column} does not hold a {expected} value")]
    CellShape {
        column: String,
        value: String,
        expected: DataMode,
    },
    #[error("{requested} correlation requested on a {actual} sample matrix")]
    ModeMismatch {
        requested: DataMode,
        actual: DataMode,
    },
    #[error("table is empty: {0}")]
    EmptyTable(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
