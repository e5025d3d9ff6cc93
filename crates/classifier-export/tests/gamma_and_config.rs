//! Integration tests for gamma resolution and export configuration.

use classifier_export::config::{load_export_config, ExportConfig};
use classifier_export::error::ExportError;
use classifier_export::format::FORMAT_VERSION;
use classifier_export::gamma::{resolve_gamma, resolve_gamma_named, GammaSpec, Kernel, UNUSED_GAMMA};

// ---------------------------------------------------------------------------
// Gamma
// ---------------------------------------------------------------------------

#[test]
fn linear_always_returns_sentinel() {
    let g = resolve_gamma_named("linear", GammaSpec::Fixed(0.3), 10, 2.0).unwrap();
    assert_eq!(g, UNUSED_GAMMA);
    assert_eq!(g, -1.0);
}

#[test]
fn rbf_auto_four_features() {
    assert_eq!(resolve_gamma_named("rbf", GammaSpec::Auto, 4, 9.0).unwrap(), 0.25);
}

#[test]
fn rbf_scale_matches_formula() {
    for (n, v) in [(1usize, 2.0f64), (4, 0.125), (13, 37.5)] {
        let g = resolve_gamma(Kernel::Rbf, GammaSpec::Scale, n, v).unwrap();
        assert_eq!(g, (1.0 / (n as f64 * v)) as f32, "n = {}, var = {}", n, v);
    }
}

#[test]
fn rbf_fixed_passes_through() {
    assert_eq!(resolve_gamma_named("rbf", GammaSpec::Fixed(0.7), 4, 1.0).unwrap(), 0.7);
}

#[test]
fn poly_is_unsupported() {
    for spec in [GammaSpec::Auto, GammaSpec::Scale, GammaSpec::Fixed(1.0)] {
        let err = resolve_gamma_named("poly", spec, 4, 1.0).unwrap_err();
        assert!(matches!(err, ExportError::UnsupportedKernel(_)));
    }
    assert!("sigmoid".parse::<Kernel>().is_err());
}

#[test]
fn rbf_without_features_is_rejected() {
    let err = resolve_gamma(Kernel::Rbf, GammaSpec::Auto, 0, 1.0).unwrap_err();
    assert!(matches!(err, ExportError::InvalidDimensions(_)));
}

// ---------------------------------------------------------------------------
// ExportConfig
// ---------------------------------------------------------------------------

#[test]
fn export_config_defaults() {
    let cfg = ExportConfig::default();
    assert_eq!(cfg.version, FORMAT_VERSION);
    assert_eq!(cfg.description, "sklearn_svm");
    assert!(cfg.contact.is_empty());
}

#[test]
fn export_config_round_trips_json() {
    let cfg = ExportConfig::new("ml-team@example.org", "iris");
    let json = serde_json::to_string(&cfg).unwrap();
    let cfg2: ExportConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(cfg, cfg2);
}

#[test]
fn export_config_loads_partial_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("export.json");
    std::fs::write(&path, r#"{ "contact": "ops@example.org", "version": [1, 2, 0] }"#).unwrap();

    let cfg = load_export_config(&path).unwrap();
    assert_eq!(cfg.contact, "ops@example.org");
    assert_eq!(cfg.version, [1, 2, 0]);
    assert_eq!(cfg.description, "sklearn_svm");
}

#[test]
fn export_config_missing_file_errors() {
    let err = load_export_config("/nonexistent/export.json").unwrap_err();
    assert!(err.to_string().contains("Failed to read config"));
}

#[test]
fn export_config_invalid_json_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("export.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(load_export_config(&path).is_err());
}
