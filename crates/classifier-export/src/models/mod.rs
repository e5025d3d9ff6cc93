//! In-memory snapshots of fitted models handed over by the training toolkit.
pub mod decision_tree;
pub mod svm;
