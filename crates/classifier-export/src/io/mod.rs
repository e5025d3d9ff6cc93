//! IO utilities for loading fitted models and training data.

pub mod feature_matrix;
pub mod fitted;

pub use feature_matrix::{read_feature_matrix, read_feature_matrix_with_config, MatrixReaderConfig};
pub use fitted::{parse_svm_parameters, read_decision_tree, read_svm_parameters};
