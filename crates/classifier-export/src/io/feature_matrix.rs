//! Delimited text reader for training feature matrices.
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use ndarray::Array2;

/// Configuration for reading a numeric feature matrix.
#[derive(Debug, Clone)]
pub struct MatrixReaderConfig {
    /// Field delimiter. `None` picks tab for `.tsv` files and comma otherwise.
    pub delimiter: Option<u8>,
    /// Whether the first row holds column names.
    pub has_headers: bool,
}

impl Default for MatrixReaderConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            has_headers: true,
        }
    }
}

fn delimiter_for(path: &Path) -> u8 {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
        _ => b',',
    }
}

/// Read a CSV/TSV feature matrix with a header row.
pub fn read_feature_matrix<P: AsRef<Path>>(path: P) -> Result<Array2<f32>> {
    read_feature_matrix_with_config(path, &MatrixReaderConfig::default())
}

/// Read a feature matrix where every row is one sample and every column one feature.
pub fn read_feature_matrix_with_config<P: AsRef<Path>>(
    path: P,
    config: &MatrixReaderConfig,
) -> Result<Array2<f32>> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(config.delimiter.unwrap_or_else(|| delimiter_for(path)))
        .has_headers(config.has_headers)
        .from_path(path)
        .with_context(|| format!("Failed to open feature matrix: {}", path.display()))?;

    let mut values = Vec::new();
    let mut ncols: Option<usize> = None;
    let mut nrows = 0;

    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;
        match ncols {
            None => ncols = Some(record.len()),
            Some(n) if n != record.len() => {
                return Err(anyhow!(
                    "Row {} has {} columns, expected {}",
                    row_idx + 1,
                    record.len(),
                    n
                ))
            }
            Some(_) => {}
        }
        for (col_idx, field) in record.iter().enumerate() {
            let v = field.trim().parse::<f32>().with_context(|| {
                format!("Invalid value '{}' at row {}, column {}", field, row_idx + 1, col_idx + 1)
            })?;
            values.push(v);
        }
        nrows += 1;
    }

    let ncols = ncols.ok_or_else(|| anyhow!("No rows in feature matrix: {}", path.display()))?;
    Array2::from_shape_vec((nrows, ncols), values).context("Failed to shape feature matrix")
}
