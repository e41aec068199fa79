//! Core computation for the EEG experiment dashboard.
//!
//! The modules cover the two numeric pieces of the dashboard, sensor-geometry
//! projection for flat scalp maps and pairwise signal correlation, together
//! with the tabular schemas they read and the view state they feed.

pub mod config;
pub mod correlation;
pub mod math;
pub mod montage;
pub mod plot;
pub mod prelude;
pub mod retry;
pub mod session;
pub mod table;
pub mod telemetry;

pub use correlation::{CorrelationEngine, CorrelationMatrix};
pub use montage::{MontageProjector, Sensor, SensorIndex};
pub use prelude::{EngineError, EngineResult};
pub use table::SampleMatrix;
