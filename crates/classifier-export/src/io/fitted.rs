//! JSON dumps of fitted models.
//!
//! The SVM dump uses the toolkit's attribute names:
//!
//! ```json
//! {
//!   "kernel": "rbf",
//!   "gamma": "scale",
//!   "support_vectors": [[5.1, 3.5], [4.9, 3.0]],
//!   "n_support": [1, 1],
//!   "dual_coef": [[0.5, -0.5]],
//!   "intercept": [0.1]
//! }
//! ```
//!
//! The tree dump holds the parallel node arrays of [`DecisionTree`].
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use ndarray::{Array1, Array2};
use serde::Deserialize;

use crate::gamma::{GammaSpec, Kernel};
use crate::models::decision_tree::DecisionTree;
use crate::models::svm::SvmParameters;

#[derive(Deserialize, Debug)]
struct RawSvm {
    kernel: String,
    #[serde(default)]
    gamma: GammaSpec,
    support_vectors: Vec<Vec<f32>>,
    n_support: Vec<usize>,
    dual_coef: Vec<Vec<f32>>,
    intercept: Vec<f32>,
}

/// Stack equally long rows into a matrix with `ncols` columns.
fn rows_to_array(name: &str, rows: Vec<Vec<f32>>, ncols: usize) -> Result<Array2<f32>> {
    let nrows = rows.len();
    let mut flat = Vec::with_capacity(nrows * ncols);
    for (i, row) in rows.into_iter().enumerate() {
        if row.len() != ncols {
            return Err(anyhow!(
                "Row {} of '{}' has {} values, expected {}",
                i,
                name,
                row.len(),
                ncols
            ));
        }
        flat.extend(row);
    }
    Array2::from_shape_vec((nrows, ncols), flat)
        .with_context(|| format!("Failed to shape '{}'", name))
}

/// Parse fitted SVM parameters from a JSON string.
pub fn parse_svm_parameters(json: &str) -> Result<SvmParameters> {
    let raw: RawSvm = serde_json::from_str(json).context("Failed to parse SVM parameters")?;
    let kernel: Kernel = raw.kernel.parse()?;

    let n_feat = raw.support_vectors.first().map_or(0, |row| row.len());
    let n_sv = raw.support_vectors.len();
    let support_vectors = rows_to_array("support_vectors", raw.support_vectors, n_feat)?;
    let dual_coef = rows_to_array("dual_coef", raw.dual_coef, n_sv)?;

    Ok(SvmParameters {
        kernel,
        gamma: raw.gamma,
        support_vectors,
        n_support: raw.n_support,
        dual_coef,
        intercept: Array1::from_vec(raw.intercept),
    })
}

/// Read fitted SVM parameters from a JSON file.
pub fn read_svm_parameters<P: AsRef<Path>>(path: P) -> Result<SvmParameters> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to open SVM file: {}", path.as_ref().display()))?;
    parse_svm_parameters(&content)
        .with_context(|| format!("Invalid SVM file: {}", path.as_ref().display()))
}

/// Read a fitted decision tree from a JSON file.
pub fn read_decision_tree<P: AsRef<Path>>(path: P) -> Result<DecisionTree> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to open tree file: {}", path.as_ref().display()))?;
    let tree: DecisionTree = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse tree file: {}", path.as_ref().display()))?;
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExportError;

    #[test]
    fn parses_rbf_dump() {
        let json = r#"{
            "kernel": "rbf",
            "gamma": "auto",
            "support_vectors": [[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]],
            "n_support": [2, 1],
            "dual_coef": [[0.5, 0.5, -1.0]],
            "intercept": [0.25]
        }"#;
        let params = parse_svm_parameters(json).unwrap();
        assert_eq!(params.kernel, Kernel::Rbf);
        assert_eq!(params.gamma, GammaSpec::Auto);
        assert_eq!(params.support_vectors.dim(), (3, 2));
        assert_eq!(params.dual_coef.dim(), (1, 3));
        assert_eq!(params.intercept.len(), 1);
    }

    #[test]
    fn missing_gamma_defaults_to_scale() {
        let json = r#"{"kernel": "linear", "support_vectors": [[1.0]], "n_support": [1],
            "dual_coef": [[1.0]], "intercept": [0.0]}"#;
        assert_eq!(parse_svm_parameters(json).unwrap().gamma, GammaSpec::Scale);
    }

    #[test]
    fn unknown_kernel_surfaces_as_unsupported() {
        let json = r#"{"kernel": "poly", "gamma": 0.5, "support_vectors": [[1.0]],
            "n_support": [1], "dual_coef": [[1.0]], "intercept": [0.0]}"#;
        let err = parse_svm_parameters(json).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExportError>(),
            Some(ExportError::UnsupportedKernel(_))
        ));
    }

    #[test]
    fn ragged_support_vectors_fail() {
        let json = r#"{"kernel": "linear", "support_vectors": [[1.0, 2.0], [3.0]],
            "n_support": [1, 1], "dual_coef": [[1.0, -1.0]], "intercept": [0.0]}"#;
        assert!(parse_svm_parameters(json).is_err());
    }
}
