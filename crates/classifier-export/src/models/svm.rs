use ndarray::{Array1, Array2};

use crate::config::ExportConfig;
use crate::error::Result;
use crate::format::{ModelData, ModelHeader};
use crate::gamma::{resolve_gamma, GammaSpec, Kernel};

/// Parameters of a fitted multiclass SVM, in the toolkit's one-vs-one layout.
#[derive(Debug, Clone, PartialEq)]
pub struct SvmParameters {
    pub kernel: Kernel,
    pub gamma: GammaSpec,
    /// `[nSV, n_feat]`, grouped by class in `n_support` order.
    pub support_vectors: Array2<f32>,
    /// Support vectors per class.
    pub n_support: Vec<usize>,
    /// `[n_cls - 1, nSV]`
    pub dual_coef: Array2<f32>,
    /// One intercept per class pair.
    pub intercept: Array1<f32>,
}

impl SvmParameters {
    pub fn n_classes(&self) -> usize {
        self.n_support.len()
    }

    pub fn n_features(&self) -> usize {
        self.support_vectors.ncols()
    }

    pub fn n_support_vectors(&self) -> usize {
        self.support_vectors.nrows()
    }

    /// Gamma as the inference engine expects it.
    pub fn resolved_gamma(&self, sample_variance: f64) -> Result<f32> {
        resolve_gamma(self.kernel, self.gamma, self.n_features(), sample_variance)
    }

    /// Header for these parameters, stamped with `config`'s metadata.
    pub fn header(&self, config: &ExportConfig) -> Result<ModelHeader> {
        ModelHeader::new(
            config,
            self.kernel,
            self.n_classes(),
            self.n_features(),
            self.n_support_vectors(),
        )
    }

    /// Copy the numeric arrays into the file's data section.
    pub fn model_data(&self, gamma: f32) -> ModelData {
        ModelData {
            nv: self.n_support.clone(),
            gamma,
            dual_coef: self.dual_coef.clone(),
            bias: self.intercept.clone(),
            support_vectors: self.support_vectors.clone(),
        }
    }
}
