//! classifier-export: turn fitted classifiers into artifacts for a native
//! inference engine.
//!
//! Two outputs are supported. Multiclass SVMs (linear or RBF kernel) are
//! written as a fixed-layout little-endian binary file, see [`format`] and
//! [`export`]. Decision trees are flattened into nested `if`/`else` source
//! lines, see [`tree_codegen`].
pub mod config;
pub mod error;
pub mod export;
pub mod format;
pub mod gamma;
pub mod io;
pub mod models;
pub mod stats;
pub mod tree_codegen;
