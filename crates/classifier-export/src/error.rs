use std::error::Error;
use std::fmt;
use std::io;

/// Errors raised while resolving, encoding, exporting or generating code
/// for a fitted classifier.
#[derive(Debug)]
pub enum ExportError {
    /// Kernel name other than `linear` or `rbf`.
    UnsupportedKernel(String),
    /// Failure opening, writing or renaming the destination file.
    Io(io::Error),
    /// Structural violation in the decision tree node arrays.
    MalformedTree(String),
    /// Header counts and data array shapes disagree.
    InvalidDimensions(String),
    /// Text does not fit its fixed-width header field.
    FieldTooLong {
        field: &'static str,
        max: usize,
        len: usize,
    },
    /// Bytes that do not follow the model file layout.
    Malformed(String),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExportError::UnsupportedKernel(kernel) => {
                write!(f, "Unsupported kernel '{}'. Valid options are: linear, rbf", kernel)
            }
            ExportError::Io(err) => write!(f, "I/O error: {}", err),
            ExportError::MalformedTree(msg) => write!(f, "Malformed decision tree: {}", msg),
            ExportError::InvalidDimensions(msg) => write!(f, "Invalid dimensions: {}", msg),
            ExportError::FieldTooLong { field, max, len } => write!(
                f,
                "Field '{}' is {} bytes long but at most {} bytes fit",
                field, len, max
            ),
            ExportError::Malformed(msg) => write!(f, "Malformed model file: {}", msg),
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ExportError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ExportError {
    fn from(err: io::Error) -> Self {
        ExportError::Io(err)
    }
}

pub type Result<T> = std::result::Result<T, ExportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_too_long_names_the_field() {
        let err = ExportError::FieldTooLong {
            field: "contact",
            max: 32,
            len: 40,
        };
        let msg = err.to_string();
        assert!(msg.contains("contact"));
        assert!(msg.contains("40"));
    }

    #[test]
    fn io_errors_keep_their_source() {
        let err = ExportError::from(io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert!(err.source().is_some());
        assert!(matches!(err, ExportError::Io(_)));
    }
}
