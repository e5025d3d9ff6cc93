//! Kernel names and the RBF gamma hyperparameter.
//!
//! The training toolkit stores gamma either as a number or as a keyword
//! (`"auto"`, `"scale"`). The exported model file needs the concrete value the
//! fitted model used, so keywords are resolved here against the feature count
//! and the variance of the training matrix.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ExportError, Result};

/// Gamma written for kernels that do not use it.
pub const UNUSED_GAMMA: f32 = -1.0;

/// Kernels understood by the native inference engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kernel {
    Linear,
    Rbf,
}

impl Kernel {
    /// Name stored in the model header.
    pub fn name(&self) -> &'static str {
        match self {
            Kernel::Linear => "linear",
            Kernel::Rbf => "rbf",
        }
    }
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Kernel {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "linear" => Ok(Kernel::Linear),
            "rbf" => Ok(Kernel::Rbf),
            other => Err(ExportError::UnsupportedKernel(other.to_string())),
        }
    }
}

/// Gamma as recorded by the toolkit's hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GammaSpec {
    Fixed(f32),
    /// `1 / n_features`
    Auto,
    /// `1 / (n_features * var(X))`
    Scale,
}

impl GammaSpec {
    /// Interpret a symbolic gamma. Anything mentioning `auto` is [`GammaSpec::Auto`],
    /// every other keyword falls back to [`GammaSpec::Scale`].
    pub fn from_keyword(keyword: &str) -> Self {
        if keyword.contains("auto") {
            GammaSpec::Auto
        } else {
            GammaSpec::Scale
        }
    }
}

impl Default for GammaSpec {
    fn default() -> Self {
        GammaSpec::Scale
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawGamma {
    Number(f32),
    Keyword(String),
}

impl<'de> Deserialize<'de> for GammaSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(match RawGamma::deserialize(deserializer)? {
            RawGamma::Number(value) => GammaSpec::Fixed(value),
            RawGamma::Keyword(keyword) => GammaSpec::from_keyword(&keyword),
        })
    }
}

impl Serialize for GammaSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            GammaSpec::Fixed(value) => serializer.serialize_f32(*value),
            GammaSpec::Auto => serializer.serialize_str("auto"),
            GammaSpec::Scale => serializer.serialize_str("scale"),
        }
    }
}

/// Resolve the gamma value written to the model file.
///
/// # Arguments
///
/// * `kernel` - Kernel of the fitted model.
/// * `gamma` - Gamma as stored in the model's hyperparameters.
/// * `n_features` - Number of input features.
/// * `sample_variance` - Variance of the flattened training matrix; only read for [`GammaSpec::Scale`].
///
/// # Returns
///
/// [`UNUSED_GAMMA`] for linear kernels, the concrete bandwidth for RBF kernels.
/// A zero `sample_variance` under [`GammaSpec::Scale`] yields `1.0` rather than
/// `1 / (n_features * 0)`, matching the bandwidth the toolkit trains with.
pub fn resolve_gamma(
    kernel: Kernel,
    gamma: GammaSpec,
    n_features: usize,
    sample_variance: f64,
) -> Result<f32> {
    match kernel {
        Kernel::Linear => Ok(UNUSED_GAMMA),
        Kernel::Rbf => match gamma {
            GammaSpec::Fixed(value) => Ok(value),
            GammaSpec::Auto => {
                require_features(n_features)?;
                Ok((1.0 / n_features as f64) as f32)
            }
            GammaSpec::Scale => {
                require_features(n_features)?;
                if !sample_variance.is_finite() || sample_variance < 0.0 {
                    return Err(ExportError::InvalidDimensions(format!(
                        "sample variance must be finite and non-negative, got {}",
                        sample_variance
                    )));
                }
                // Constant training data: the toolkit falls back to 1.0.
                if sample_variance == 0.0 {
                    return Ok(1.0);
                }
                Ok((1.0 / (n_features as f64 * sample_variance)) as f32)
            }
        },
    }
}

/// Same as [`resolve_gamma`] for a kernel given by name.
pub fn resolve_gamma_named(
    kernel: &str,
    gamma: GammaSpec,
    n_features: usize,
    sample_variance: f64,
) -> Result<f32> {
    resolve_gamma(kernel.parse()?, gamma, n_features, sample_variance)
}

fn require_features(n_features: usize) -> Result<()> {
    if n_features == 0 {
        return Err(ExportError::InvalidDimensions(
            "gamma needs at least one feature".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_ignores_gamma() {
        for spec in [GammaSpec::Auto, GammaSpec::Scale, GammaSpec::Fixed(3.0)] {
            assert_eq!(resolve_gamma(Kernel::Linear, spec, 0, f64::NAN).unwrap(), -1.0);
        }
    }

    #[test]
    fn rbf_auto_is_inverse_feature_count() {
        assert_eq!(resolve_gamma(Kernel::Rbf, GammaSpec::Auto, 4, 123.0).unwrap(), 0.25);
    }

    #[test]
    fn rbf_scale_uses_variance() {
        let g = resolve_gamma(Kernel::Rbf, GammaSpec::Scale, 4, 0.5).unwrap();
        assert!((g - 0.5).abs() < 1e-7, "gamma = {}", g);
    }

    #[test]
    fn rbf_scale_constant_data() {
        assert_eq!(resolve_gamma(Kernel::Rbf, GammaSpec::Scale, 3, 0.0).unwrap(), 1.0);
    }

    #[test]
    fn rbf_scale_rejects_nan_variance() {
        let err = resolve_gamma(Kernel::Rbf, GammaSpec::Scale, 3, f64::NAN).unwrap_err();
        assert!(matches!(err, ExportError::InvalidDimensions(_)));
    }

    #[test]
    fn unknown_kernel_name_fails() {
        let err = resolve_gamma_named("poly", GammaSpec::Auto, 4, 1.0).unwrap_err();
        assert!(matches!(err, ExportError::UnsupportedKernel(ref k) if k == "poly"));
    }

    #[test]
    fn keyword_parsing() {
        assert_eq!(GammaSpec::from_keyword("auto"), GammaSpec::Auto);
        assert_eq!(GammaSpec::from_keyword("auto_deprecated"), GammaSpec::Auto);
        assert_eq!(GammaSpec::from_keyword("scale"), GammaSpec::Scale);
    }

    #[test]
    fn gamma_spec_from_json() {
        let fixed: GammaSpec = serde_json::from_str("0.7").unwrap();
        assert_eq!(fixed, GammaSpec::Fixed(0.7));
        let auto: GammaSpec = serde_json::from_str("\"auto\"").unwrap();
        assert_eq!(auto, GammaSpec::Auto);
        assert_eq!(serde_json::to_string(&GammaSpec::Scale).unwrap(), "\"scale\"");
    }
}
