use crate::math::FftHelper;
use crate::prelude::{DataMode, EngineError, EngineResult};
use crate::table::{parse_float, reader};
use ndarray::{Array2, ArrayView1};
use num_complex::Complex64;
use std::collections::HashMap;

pub const TIMES_COLUMN: &str = "_times";
pub const FREQ_COLUMN: &str = "_freq";

/// Axis column carried by an evoked table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisKind {
    /// Seconds relative to the event.
    Times,
    /// Hertz.
    Freq,
}

impl AxisKind {
    pub fn column(&self) -> &'static str {
        match self {
            AxisKind::Times => TIMES_COLUMN,
            AxisKind::Freq => FREQ_COLUMN,
        }
    }
}

/// Rows × sensors cell storage.
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    Real(Array2<f64>),
    Complex(Array2<Complex64>),
}

/// Evoked (averaged) data: one row per axis value, one column per sensor.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleMatrix {
    axis: AxisKind,
    axis_values: Vec<f64>,
    columns: Vec<String>,
    index: HashMap<String, usize>,
    cells: Samples,
}

fn index_columns(columns: &[String]) -> HashMap<String, usize> {
    columns
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.clone(), idx))
        .collect()
}

fn parse_real_cell(column: &str, cell: &str) -> EngineResult<f64> {
    if cell.contains(',') {
        return Err(EngineError::CellShape {
            column: column.to_string(),
            value: cell.to_string(),
            expected: DataMode::TimeDomain,
        });
    }
    Ok(parse_float(cell))
}

/// An empty cell is a missing value and reads as NaN in both parts.
fn parse_complex_cell(column: &str, cell: &str) -> EngineResult<Complex64> {
    if cell.trim().is_empty() {
        return Ok(Complex64::new(f64::NAN, f64::NAN));
    }
    let Some((re, im)) = cell.split_once(',') else {
        return Err(EngineError::CellShape {
            column: column.to_string(),
            value: cell.to_string(),
            expected: DataMode::FrequencyDomain,
        });
    };
    Ok(Complex64::new(parse_float(re), parse_float(im)))
}

impl SampleMatrix {
    pub fn from_real(
        axis: AxisKind,
        axis_values: Vec<f64>,
        columns: Vec<String>,
        cells: Array2<f64>,
    ) -> Self {
        let index = index_columns(&columns);
        Self {
            axis,
            axis_values,
            columns,
            index,
            cells: Samples::Real(cells),
        }
    }

    pub fn from_complex(
        axis: AxisKind,
        axis_values: Vec<f64>,
        columns: Vec<String>,
        cells: Array2<Complex64>,
    ) -> Self {
        let index = index_columns(&columns);
        Self {
            axis,
            axis_values,
            columns,
            index,
            cells: Samples::Complex(cells),
        }
    }

    /// Parses an evoked CSV. The axis column decides the cell shape:
    /// `_times` holds plain floats, `_freq` holds `"re,im"` pairs.
    pub fn from_csv(text: &str) -> EngineResult<Self> {
        let mut rdr = reader(text);
        let headers = rdr.headers()?.clone();

        let (axis, axis_col) = if let Some(pos) = headers.iter().position(|h| h == TIMES_COLUMN) {
            (AxisKind::Times, pos)
        } else if let Some(pos) = headers.iter().position(|h| h == FREQ_COLUMN) {
            (AxisKind::Freq, pos)
        } else {
            return Err(EngineError::MissingAxis);
        };

        let sensor_cols: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|(pos, name)| *pos != axis_col && !name.is_empty())
            .map(|(pos, name)| (pos, name.to_string()))
            .collect();
        let columns: Vec<String> = sensor_cols.iter().map(|(_, name)| name.clone()).collect();

        let mut axis_values = Vec::new();
        let mut real = Vec::new();
        let mut complex = Vec::new();
        for record in rdr.records() {
            let record = record?;
            axis_values.push(parse_float(record.get(axis_col).unwrap_or("")));
            for (pos, name) in &sensor_cols {
                let cell = record.get(*pos).unwrap_or("");
                match axis {
                    AxisKind::Times => real.push(parse_real_cell(name, cell)?),
                    AxisKind::Freq => complex.push(parse_complex_cell(name, cell)?),
                }
            }
        }

        let shape = (axis_values.len(), columns.len());
        let matrix = match axis {
            AxisKind::Times => {
                let cells = Array2::from_shape_vec(shape, real)
                    .map_err(|_| EngineError::EmptyTable("ragged evoked table".into()))?;
                Self::from_real(axis, axis_values, columns, cells)
            }
            AxisKind::Freq => {
                let cells = Array2::from_shape_vec(shape, complex)
                    .map_err(|_| EngineError::EmptyTable("ragged evoked table".into()))?;
                Self::from_complex(axis, axis_values, columns, cells)
            }
        };
        Ok(matrix)
    }

    /// Writes the table back in the backend layout, index column first.
    pub fn to_csv(&self) -> EngineResult<String> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        let mut header = vec![String::new(), self.axis.column().to_string()];
        header.extend(self.columns.iter().cloned());
        wtr.write_record(&header)?;

        for (row, axis_value) in self.axis_values.iter().enumerate() {
            let mut record = vec![row.to_string(), axis_value.to_string()];
            match &self.cells {
                Samples::Real(cells) => {
                    record.extend(cells.row(row).iter().map(|v| v.to_string()));
                }
                Samples::Complex(cells) => {
                    record.extend(cells.row(row).iter().map(|c| format!("{},{}", c.re, c.im)));
                }
            }
            wtr.write_record(&record)?;
        }

        let bytes = wtr
            .into_inner()
            .map_err(|err| EngineError::Csv(err.into_error().into()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn axis(&self) -> AxisKind {
        self.axis
    }

    pub fn mode(&self) -> DataMode {
        match self.cells {
            Samples::Real(_) => DataMode::TimeDomain,
            Samples::Complex(_) => DataMode::FrequencyDomain,
        }
    }

    pub fn axis_values(&self) -> &[f64] {
        &self.axis_values
    }

    /// Sensor column names in table order, without the index or axis columns.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn cells(&self) -> &Samples {
        &self.cells
    }

    pub fn n_rows(&self) -> usize {
        self.axis_values.len()
    }

    pub fn real_column(&self, col: usize) -> Option<ArrayView1<'_, f64>> {
        match &self.cells {
            Samples::Real(cells) if col < cells.ncols() => Some(cells.column(col)),
            _ => None,
        }
    }

    pub fn complex_column(&self, col: usize) -> Option<ArrayView1<'_, Complex64>> {
        match &self.cells {
            Samples::Complex(cells) if col < cells.ncols() => Some(cells.column(col)),
            _ => None,
        }
    }

    /// Per-sensor scalar for one row: the value itself, or its magnitude for spectra.
    pub fn row_values(&self, row: usize) -> Option<Vec<f64>> {
        if row >= self.n_rows() {
            return None;
        }
        Some(match &self.cells {
            Samples::Real(cells) => cells.row(row).to_vec(),
            Samples::Complex(cells) => cells.row(row).iter().map(|c| c.norm()).collect(),
        })
    }

    /// First row whose axis value is strictly greater than `value`.
    pub fn row_after(&self, value: f64) -> Option<usize> {
        self.axis_values.iter().position(|&axis| axis > value)
    }

    /// Axis values offered for selection; the final row is never selectable
    /// because no row can follow it.
    pub fn selectable_axis_values(&self) -> &[f64] {
        let end = self.axis_values.len().saturating_sub(1);
        &self.axis_values[..end]
    }

    /// One-sided spectrum of every sensor column, as a `_freq` matrix.
    ///
    /// The sample rate is taken from the spacing of the first two time values.
    pub fn spectrum(&self) -> EngineResult<SampleMatrix> {
        let Samples::Real(cells) = &self.cells else {
            return Err(EngineError::ModeMismatch {
                requested: DataMode::TimeDomain,
                actual: self.mode(),
            });
        };
        if self.n_rows() < 2 {
            return Err(EngineError::EmptyTable(
                "spectrum needs at least two samples".into(),
            ));
        }
        let sample_rate = 1.0 / (self.axis_values[1] - self.axis_values[0]);
        let fft = FftHelper::new(self.n_rows());
        let freqs = fft.frequencies(sample_rate);

        let mut spectra = Array2::zeros((freqs.len(), self.columns.len()));
        for (col, column) in cells.columns().into_iter().enumerate() {
            let bins = fft.one_sided(&column.to_vec());
            for (row, bin) in bins.into_iter().enumerate() {
                spectra[[row, col]] = bin;
            }
        }
        Ok(SampleMatrix::from_complex(
            AxisKind::Freq,
            freqs,
            self.columns.clone(),
            spectra,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMES_CSV: &str = ",_times,FP1,CZ\n0,-0.1,1e-6,2e-6\n1,0.0,3e-6,4e-6\n2,0.1,5e-6,-1e-6\n";
    const FREQ_CSV: &str = ",_freq,FP1,CZ\n0,0.0,\"1,0\",\"0,1\"\n1,5.0,\"2,-1\",\"3,3\"\n";

    #[test]
    fn time_table_skips_index_and_axis_columns() {
        let matrix = SampleMatrix::from_csv(TIMES_CSV).unwrap();
        assert_eq!(matrix.mode(), DataMode::TimeDomain);
        assert_eq!(matrix.columns(), &["FP1".to_string(), "CZ".to_string()]);
        assert_eq!(matrix.axis_values(), &[-0.1, 0.0, 0.1]);
        assert_eq!(matrix.column_index("CZ"), Some(1));
        let cz = matrix.real_column(1).unwrap();
        assert_eq!(cz[2], -1e-6);
    }

    #[test]
    fn freq_table_parses_complex_pairs() {
        let matrix = SampleMatrix::from_csv(FREQ_CSV).unwrap();
        assert_eq!(matrix.mode(), DataMode::FrequencyDomain);
        let fp1 = matrix.complex_column(0).unwrap();
        assert_eq!(fp1[1], Complex64::new(2.0, -1.0));
        assert!(matrix.real_column(0).is_none());
    }

    #[test]
    fn complex_cell_in_time_table_is_rejected_not_truncated() {
        // A lenient float parser would read "1,2" as 1.0 and silently drop
        // the imaginary part.
        let text = ",_times,FP1\n0,0.0,\"1,2\"\n1,0.1,\"3,4\"\n";
        let err = SampleMatrix::from_csv(text).unwrap_err();
        assert!(matches!(
            err,
            EngineError::CellShape { expected: DataMode::TimeDomain, .. }
        ));
    }

    #[test]
    fn real_cell_in_freq_table_is_rejected() {
        let text = ",_freq,FP1\n0,0.0,1.5\n";
        assert!(matches!(
            SampleMatrix::from_csv(text),
            Err(EngineError::CellShape { expected: DataMode::FrequencyDomain, .. })
        ));
    }

    #[test]
    fn empty_freq_cell_is_missing_not_malformed() {
        let text = ",_freq,FP1,CZ\n0,0.0,\"1,0\",\n1,5.0,\"2,-1\", \n";
        let matrix = SampleMatrix::from_csv(text).unwrap();
        let cz = matrix.complex_column(1).unwrap();
        assert!(cz.iter().all(|c| c.re.is_nan() && c.im.is_nan()));
        assert_eq!(matrix.complex_column(0).unwrap()[1], Complex64::new(2.0, -1.0));
    }

    #[test]
    fn unparsable_value_becomes_nan() {
        let text = ",_times,FP1\n0,0.0,oops\n1,0.1,2\n";
        let matrix = SampleMatrix::from_csv(text).unwrap();
        assert!(matrix.real_column(0).unwrap()[0].is_nan());
    }

    #[test]
    fn missing_axis_is_reported() {
        assert!(matches!(
            SampleMatrix::from_csv("a,b\n1,2\n"),
            Err(EngineError::MissingAxis)
        ));
    }

    #[test]
    fn row_after_is_strictly_greater() {
        let matrix = SampleMatrix::from_csv(TIMES_CSV).unwrap();
        assert_eq!(matrix.row_after(-0.1), Some(1));
        assert_eq!(matrix.row_after(-1.0), Some(0));
        assert_eq!(matrix.row_after(0.1), None);
        assert_eq!(matrix.selectable_axis_values(), &[-0.1, 0.0]);
    }

    #[test]
    fn csv_output_reads_back_in_both_modes() {
        for text in [TIMES_CSV, FREQ_CSV] {
            let matrix = SampleMatrix::from_csv(text).unwrap();
            let again = SampleMatrix::from_csv(&matrix.to_csv().unwrap()).unwrap();
            assert_eq!(again, matrix);
        }
    }

    #[test]
    fn spectrum_of_time_table_has_freq_axis() {
        let axis: Vec<f64> = (0..8).map(|i| i as f64 * 0.01).collect();
        let cells = Array2::from_shape_fn((8, 1), |(row, _)| if row % 2 == 0 { 1.0 } else { -1.0 });
        let matrix = SampleMatrix::from_real(AxisKind::Times, axis, vec!["O1".into()], cells);
        let spectrum = matrix.spectrum().unwrap();
        assert_eq!(spectrum.axis(), AxisKind::Freq);
        assert_eq!(spectrum.n_rows(), 5);
        assert!((spectrum.axis_values()[4] - 50.0).abs() < 1e-9);
        let o1 = spectrum.complex_column(0).unwrap();
        assert!((o1[4].re - 8.0).abs() < 1e-9);
        assert!(spectrum.spectrum().is_err());
    }
}
