//! Writing SVM model files for the native inference engine.
//!
//! Files are written to a temporary sibling of the destination and renamed
//! into place, so a reader never observes a partially written model.

use std::io::Write;
use std::path::Path;

use log::{debug, info};
use tempfile::NamedTempFile;

use crate::config::ExportConfig;
use crate::error::{ExportError, Result};
use crate::format::{encode_model, ModelData, ModelHeader};
use crate::models::svm::SvmParameters;

/// Values shown per array in the export summary.
const PREVIEW_LEN: usize = 3;

/// Write `header` and `data` to `destination`, replacing any existing file.
///
/// Dimensions and header strings are validated before the file is touched.
/// On failure `destination` is left as it was.
pub fn export_model<P: AsRef<Path>>(header: &ModelHeader, data: &ModelData, destination: P) -> Result<()> {
    let destination = destination.as_ref();
    let bytes = encode_model(header, data)?;
    write_atomically(destination, &bytes)?;
    info!(
        "Exported {} SVM model ({} bytes) to {}",
        header.kernel,
        bytes.len(),
        destination.display()
    );
    log_summary(header, data);
    Ok(())
}

/// Resolve gamma for `params` and export them in one call.
///
/// # Arguments
///
/// * `params` - Fitted SVM parameters.
/// * `config` - Version and contact metadata for the header.
/// * `sample_variance` - Variance of the flattened training matrix, see [`crate::stats::flattened_variance`].
/// * `destination` - Output file path.
///
/// # Returns
///
/// The header that was written.
pub fn export_svm<P: AsRef<Path>>(
    params: &SvmParameters,
    config: &ExportConfig,
    sample_variance: f64,
    destination: P,
) -> Result<ModelHeader> {
    let gamma = params.resolved_gamma(sample_variance)?;
    let header = params.header(config)?;
    let data = params.model_data(gamma);
    export_model(&header, &data, destination)?;
    Ok(header)
}

fn write_atomically(destination: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    // Dropping `tmp` on an error path removes the temporary file.
    let mut tmp = NamedTempFile::new_in(dir)?;
    debug!("Writing {} bytes to {}", bytes.len(), tmp.path().display());
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(destination)
        .map_err(|err| ExportError::Io(err.error))?;
    Ok(())
}

fn preview<'a>(values: impl Iterator<Item = &'a f32>) -> String {
    let mut values = values.peekable();
    let mut parts = Vec::with_capacity(PREVIEW_LEN + 1);
    for v in values.by_ref().take(PREVIEW_LEN) {
        parts.push(format!("{:.4}", v));
    }
    if values.peek().is_some() {
        parts.push("...".to_string());
    }
    format!("[{}]", parts.join(", "))
}

fn log_summary(header: &ModelHeader, data: &ModelData) {
    let [major, minor, rc] = header.version;
    info!("SVM Header Info");
    info!("Version:{}.{}.{}", major, minor, rc);
    info!("Contact:{}", header.contact.as_str());
    info!("Description:{}", header.description.as_str());
    info!("SVM Kernel:{}", header.kernel);
    info!("Number of classes:{}", header.n_cls);
    info!("Number of features:{}", header.n_feat);
    info!("Number of support vectors:{}", header.n_sv);
    info!("nv:{:?}", data.nv);
    info!("g:{:.4}", data.gamma);
    info!("a:{}", preview(data.dual_coef.iter()));
    info!("b:{}", preview(data.bias.iter()));
    info!("sv:{}", preview(data.support_vectors.iter()));
}
