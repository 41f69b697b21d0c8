use thiserror::Error;

#[derive(Error, Debug)]
/// Codec error
pub enum CodecError {
    /// Malformed input or a value that does not convert: unterminated quote,
    /// failed type conversion, missing column, unexpected field count.
    #[error("Format error: {0}")]
    Format(String),

    /// Duplicate registration, removal of an absent type or a lookup that
    /// found no processor up to the root of the type's lineage.
    #[error("Registration error: {0}")]
    Registration(String),

    /// Failure of the underlying stream, or use of a released one.
    #[error("Resource error: {0}")]
    Resource(#[from] std::io::Error),

    /// A dialect whose special characters collide or break lines.
    #[error("Invalid dialect: {0}")]
    InvalidDialect(String),
}

impl CodecError {
    pub fn is_format(&self) -> bool {
        matches!(self, CodecError::Format(_))
    }

    pub fn is_registration(&self) -> bool {
        matches!(self, CodecError::Registration(_))
    }

    pub fn is_resource(&self) -> bool {
        matches!(self, CodecError::Resource(_))
    }

    /// Prefixes a format error with the line the record started on.
    /// Other kinds are returned untouched.
    pub(crate) fn at_line(self, line: usize) -> Self {
        match self {
            CodecError::Format(message) => CodecError::Format(format!("line {line}: {message}")),
            other => other,
        }
    }
}
