//! SVM model file layout.
//!
//! All integers are `i32` and all floats `f32`, little-endian, concatenated
//! without alignment padding:
//!
//! ```text
//! [version: 3 x i32]
//! [contact: 32 bytes, zero padded]
//! [description: 16 bytes, zero padded]
//! [kernel: 16 bytes, zero padded]
//! [n_cls, n_feat, nSV: 3 x i32]
//! [nv: n_cls x i32]
//! [gamma: f32]
//! [dual_coef: (n_cls - 1) x nSV f32, row-major]
//! [bias: n_cls * (n_cls - 1) / 2 f32]
//! [support_vectors: nSV x n_feat f32, row-major]
//! ```

use std::fmt;
use std::io::{Cursor, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::{debug, warn};
use ndarray::{Array1, Array2};

use crate::config::ExportConfig;
use crate::error::{ExportError, Result};
use crate::gamma::Kernel;

/// Format version understood by the inference engine (major, minor, rc).
pub const FORMAT_VERSION: [i32; 3] = [0, 0, 1];

pub const CONTACT_LEN: usize = 32;
pub const DESCRIPTION_LEN: usize = 16;
pub const KERNEL_LEN: usize = 16;

/// Bytes before the `nv` array.
pub const HEADER_LEN: usize = 3 * 4 + CONTACT_LEN + DESCRIPTION_LEN + KERNEL_LEN + 3 * 4;

/// Text stored in a fixed-width, zero-padded byte field.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct FixedStr<const N: usize> {
    bytes: [u8; N],
}

impl<const N: usize> FixedStr<N> {
    /// Pad `text` with trailing zeros. Text longer than `N` bytes is rejected
    /// instead of truncated, as are interior NULs.
    pub fn encode(field: &'static str, text: &str) -> Result<Self> {
        let raw = text.as_bytes();
        if raw.len() > N {
            return Err(ExportError::FieldTooLong {
                field,
                max: N,
                len: raw.len(),
            });
        }
        if raw.contains(&0) {
            return Err(ExportError::InvalidDimensions(format!(
                "field '{}' contains a NUL byte",
                field
            )));
        }
        let mut bytes = [0u8; N];
        bytes[..raw.len()].copy_from_slice(raw);
        Ok(Self { bytes })
    }

    /// Parse a field read from a model file.
    pub fn decode(field: &'static str, bytes: [u8; N]) -> Result<Self> {
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(N);
        if bytes[end..].iter().any(|&b| b != 0) {
            return Err(ExportError::Malformed(format!(
                "field '{}' has data after its terminator",
                field
            )));
        }
        if std::str::from_utf8(&bytes[..end]).is_err() {
            return Err(ExportError::Malformed(format!(
                "field '{}' is not valid UTF-8",
                field
            )));
        }
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; N] {
        &self.bytes
    }

    pub fn as_str(&self) -> &str {
        let end = self.bytes.iter().position(|&b| b == 0).unwrap_or(N);
        // Both constructors guarantee the prefix is UTF-8.
        std::str::from_utf8(&self.bytes[..end]).unwrap_or_default()
    }
}

impl<const N: usize> fmt::Debug for FixedStr<N> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "FixedStr<{}>({:?})", N, self.as_str())
    }
}

/// Fixed-width header written at the start of the file.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelHeader {
    pub version: [i32; 3],
    pub contact: FixedStr<CONTACT_LEN>,
    pub description: FixedStr<DESCRIPTION_LEN>,
    pub kernel: Kernel,
    pub n_cls: usize,
    pub n_feat: usize,
    pub n_sv: usize,
}

impl ModelHeader {
    /// Build a header from export metadata and the model's dimensions.
    pub fn new(
        config: &ExportConfig,
        kernel: Kernel,
        n_cls: usize,
        n_feat: usize,
        n_sv: usize,
    ) -> Result<Self> {
        Ok(Self {
            version: config.version,
            contact: FixedStr::encode("contact", &config.contact)?,
            description: FixedStr::encode("description", &config.description)?,
            kernel,
            n_cls,
            n_feat,
            n_sv,
        })
    }

    /// Number of one-vs-one classifiers, and so of bias terms.
    pub fn n_pairs(&self) -> usize {
        self.n_cls * self.n_cls.saturating_sub(1) / 2
    }

    /// Total size in bytes of a file holding this header and its data.
    pub fn encoded_len(&self) -> usize {
        let floats = 1
            + self.n_cls.saturating_sub(1) * self.n_sv
            + self.n_pairs()
            + self.n_sv * self.n_feat;
        HEADER_LEN + 4 * self.n_cls + 4 * floats
    }
}

/// Numeric arrays following the header.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelData {
    /// Support vectors per class, `[n_cls]`.
    pub nv: Vec<usize>,
    pub gamma: f32,
    /// One-vs-one dual coefficients, `[n_cls - 1, nSV]`.
    pub dual_coef: Array2<f32>,
    /// One bias per class pair, `[n_cls * (n_cls - 1) / 2]`.
    pub bias: Array1<f32>,
    /// `[nSV, n_feat]`
    pub support_vectors: Array2<f32>,
}

/// A decoded model file.
#[derive(Debug, Clone, PartialEq)]
pub struct SvmModel {
    pub header: ModelHeader,
    pub data: ModelData,
}

/// Check that the header counts agree with every data array.
pub fn validate_dimensions(header: &ModelHeader, data: &ModelData) -> Result<()> {
    let fail = |msg: String| -> Result<()> { Err(ExportError::InvalidDimensions(msg)) };

    if header.n_cls < 2 {
        return fail(format!("n_cls must be at least 2, got {}", header.n_cls));
    }
    if header.n_feat < 1 {
        return fail("n_feat must be at least 1".to_string());
    }
    if header.n_sv < 1 {
        return fail("nSV must be at least 1".to_string());
    }
    if data.nv.len() != header.n_cls {
        return fail(format!(
            "nv has {} entries but n_cls is {}",
            data.nv.len(),
            header.n_cls
        ));
    }
    if let Some(count) = data.nv.iter().find(|&&count| count > header.n_sv) {
        return fail(format!("nv entry {} exceeds nSV = {}", count, header.n_sv));
    }
    let total = data
        .nv
        .iter()
        .try_fold(0usize, |acc, &count| acc.checked_add(count));
    if total != Some(header.n_sv) {
        return match total {
            Some(total) => fail(format!("sum(nv) = {} but nSV = {}", total, header.n_sv)),
            None => fail("sum(nv) overflows".to_string()),
        };
    }
    if data.dual_coef.dim() != (header.n_cls - 1, header.n_sv) {
        return fail(format!(
            "dual_coef has shape {:?}, expected {:?}",
            data.dual_coef.dim(),
            (header.n_cls - 1, header.n_sv)
        ));
    }
    if data.bias.len() != header.n_pairs() {
        return fail(format!(
            "bias has {} entries, expected {}",
            data.bias.len(),
            header.n_pairs()
        ));
    }
    if data.support_vectors.dim() != (header.n_sv, header.n_feat) {
        return fail(format!(
            "support_vectors has shape {:?}, expected {:?}",
            data.support_vectors.dim(),
            (header.n_sv, header.n_feat)
        ));
    }
    // Every count is stored as i32.
    let largest = header.n_cls.max(header.n_feat).max(header.n_sv);
    if i32::try_from(largest).is_err() {
        return fail(format!("count {} does not fit in a 32-bit integer", largest));
    }
    Ok(())
}

/// Write the header and data to `writer` after validating dimensions.
pub fn write_model<W: Write>(writer: &mut W, header: &ModelHeader, data: &ModelData) -> Result<()> {
    validate_dimensions(header, data)?;
    let kernel = FixedStr::<KERNEL_LEN>::encode("kernel", header.kernel.name())?;

    for v in header.version {
        writer.write_i32::<LittleEndian>(v)?;
    }
    writer.write_all(header.contact.as_bytes())?;
    writer.write_all(header.description.as_bytes())?;
    writer.write_all(kernel.as_bytes())?;

    for count in [header.n_cls, header.n_feat, header.n_sv]
        .into_iter()
        .chain(data.nv.iter().copied())
    {
        let count = i32::try_from(count).map_err(|_| {
            ExportError::InvalidDimensions(format!("count {} does not fit in a 32-bit integer", count))
        })?;
        writer.write_i32::<LittleEndian>(count)?;
    }

    writer.write_f32::<LittleEndian>(data.gamma)?;
    let floats = data
        .dual_coef
        .iter()
        .chain(data.bias.iter())
        .chain(data.support_vectors.iter());
    for &v in floats {
        writer.write_f32::<LittleEndian>(v)?;
    }
    debug!(
        "Encoded {} model: {} classes, {} features, {} support vectors",
        header.kernel, header.n_cls, header.n_feat, header.n_sv
    );
    Ok(())
}

/// Encode a model into an in-memory buffer.
pub fn encode_model(header: &ModelHeader, data: &ModelData) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(header.encoded_len());
    write_model(&mut buf, header, data)?;
    Ok(buf)
}

fn truncated(what: &str) -> impl FnOnce(std::io::Error) -> ExportError + '_ {
    move |_| ExportError::Malformed(format!("file ends inside {}", what))
}

fn read_count(cursor: &mut Cursor<&[u8]>, what: &str) -> Result<usize> {
    let v = cursor.read_i32::<LittleEndian>().map_err(truncated(what))?;
    usize::try_from(v).map_err(|_| ExportError::Malformed(format!("{} is negative ({})", what, v)))
}

fn read_fixed<const N: usize>(cursor: &mut Cursor<&[u8]>, field: &'static str) -> Result<FixedStr<N>> {
    let mut bytes = [0u8; N];
    cursor.read_exact(&mut bytes).map_err(truncated(field))?;
    FixedStr::decode(field, bytes)
}

fn read_floats(cursor: &mut Cursor<&[u8]>, len: usize, what: &str) -> Result<Vec<f32>> {
    let remaining = cursor.get_ref().len() as u64 - cursor.position();
    if (len as u64).saturating_mul(4) > remaining {
        return Err(ExportError::Malformed(format!("file ends inside {}", what)));
    }
    let mut values = vec![0.0f32; len];
    cursor
        .read_f32_into::<LittleEndian>(&mut values)
        .map_err(truncated(what))?;
    Ok(values)
}

fn checked_len(a: usize, b: usize, what: &str) -> Result<usize> {
    a.checked_mul(b)
        .ok_or_else(|| ExportError::Malformed(format!("{} size overflows", what)))
}

/// Parse a model file back into its header and data.
///
/// Rejects truncated input and trailing bytes. A version different from
/// [`FORMAT_VERSION`] is accepted with a warning.
pub fn decode_model(bytes: &[u8]) -> Result<SvmModel> {
    let mut cursor = Cursor::new(bytes);

    let mut version = [0i32; 3];
    for v in version.iter_mut() {
        *v = cursor.read_i32::<LittleEndian>().map_err(truncated("version"))?;
    }
    if version != FORMAT_VERSION {
        warn!(
            "Model version (v{}.{}.{}) differs from format version (v{}.{}.{})",
            version[0], version[1], version[2],
            FORMAT_VERSION[0], FORMAT_VERSION[1], FORMAT_VERSION[2]
        );
    }

    let contact = read_fixed::<CONTACT_LEN>(&mut cursor, "contact")?;
    let description = read_fixed::<DESCRIPTION_LEN>(&mut cursor, "description")?;
    let kernel: Kernel = read_fixed::<KERNEL_LEN>(&mut cursor, "kernel")?.as_str().parse()?;

    let n_cls = read_count(&mut cursor, "n_cls")?;
    let n_feat = read_count(&mut cursor, "n_feat")?;
    let n_sv = read_count(&mut cursor, "nSV")?;
    if n_cls < 2 {
        return Err(ExportError::Malformed(format!("n_cls must be at least 2, got {}", n_cls)));
    }

    let nv = (0..n_cls)
        .map(|_| read_count(&mut cursor, "nv"))
        .collect::<Result<Vec<_>>>()?;

    let gamma = cursor.read_f32::<LittleEndian>().map_err(truncated("gamma"))?;

    let dual_len = checked_len(n_cls - 1, n_sv, "dual_coef")?;
    let dual_coef = read_floats(&mut cursor, dual_len, "dual_coef")?;
    let n_pairs = checked_len(n_cls, n_cls - 1, "bias")? / 2;
    let bias = read_floats(&mut cursor, n_pairs, "bias")?;
    let sv_len = checked_len(n_sv, n_feat, "support_vectors")?;
    let support_vectors = read_floats(&mut cursor, sv_len, "support_vectors")?;

    let consumed = cursor.position() as usize;
    if consumed != bytes.len() {
        return Err(ExportError::Malformed(format!(
            "{} trailing bytes after support vectors",
            bytes.len() - consumed
        )));
    }

    let shape_err = |e: ndarray::ShapeError| ExportError::Malformed(e.to_string());
    let header = ModelHeader {
        version,
        contact,
        description,
        kernel,
        n_cls,
        n_feat,
        n_sv,
    };
    let data = ModelData {
        nv,
        gamma,
        dual_coef: Array2::from_shape_vec((n_cls - 1, n_sv), dual_coef).map_err(shape_err)?,
        bias: Array1::from_vec(bias),
        support_vectors: Array2::from_shape_vec((n_sv, n_feat), support_vectors)
            .map_err(shape_err)?,
    };
    validate_dimensions(&header, &data)?;
    Ok(SvmModel { header, data })
}
