use crate::prelude::DataMode;
use ndarray::Array2;
use serde::Serialize;

/// One ordered pair of the dense correlation matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationEntry {
    pub n1: String,
    pub n2: String,
    pub corr: f64,
}

/// Dense N × N correlation values over the good sensors, row `i` column `j`
/// holding `corr(names[i], names[j])`.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    mode: DataMode,
    names: Vec<String>,
    values: Array2<f64>,
}

impl CorrelationMatrix {
    pub(crate) fn new(mode: DataMode, names: Vec<String>, values: Array2<f64>) -> Self {
        Self {
            mode,
            names,
            values,
        }
    }

    pub fn mode(&self) -> DataMode {
        self.mode
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn get(&self, n1: &str, n2: &str) -> Option<f64> {
        let i = self.names.iter().position(|name| name == n1)?;
        let j = self.names.iter().position(|name| name == n2)?;
        Some(self.values[[i, j]])
    }

    /// All N² ordered pairs, row-major, diagonal included.
    pub fn entries(&self) -> Vec<CorrelationEntry> {
        let mut entries = Vec::with_capacity(self.names.len() * self.names.len());
        for (i, n1) in self.names.iter().enumerate() {
            for (j, n2) in self.names.iter().enumerate() {
                entries.push(CorrelationEntry {
                    n1: n1.clone(),
                    n2: n2.clone(),
                    corr: self.values[[i, j]],
                });
            }
        }
        entries
    }
}
