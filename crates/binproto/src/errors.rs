//! Error types for BinProto

use thiserror::Error;

/// Result type for BinProto operations
pub type Result<T> = core::result::Result<T, Error>;

/// Errors that can occur while resolving, encoding or decoding a type definition.
///
/// Variants fall into three groups, see [`Error::is_config`], [`Error::is_data`]
/// and [`Error::is_stream`]. Every variant raised while walking a schema carries
/// the diagnostic path of the failing element.
#[derive(Debug, Error)]
pub enum Error {
    /// A type definition names a codec or shape that is not registered
    #[error("Received unknown codec selector `{selector}` at {path}")]
    UnknownSelector {
        /// Offending selector
        selector: String,
        /// Path to the element
        path: String,
    },

    /// A structure definition declares a field its host shape does not have
    #[error("Shape `{shape}` does not contain `{field}` field")]
    MissingShapeField {
        /// Name of the shape
        shape: String,
        /// Declared field
        field: String,
    },

    /// A structure definition declares the same field twice
    #[error("Shape `{shape}` declares `{field}` field more than once")]
    DuplicateField {
        /// Name of the shape
        shape: String,
        /// Repeated field
        field: String,
    },

    /// A host value was asked to store a field it does not have
    #[error("Shape `{shape}` has no field `{field}`")]
    UnknownField {
        /// Name of the shape
        shape: String,
        /// Requested field
        field: String,
    },

    /// A length or count prefix decoded to a negative number outside the null convention
    #[error("Received negative length {length} at {path}")]
    NegativeLength {
        /// Decoded length
        length: i64,
        /// Path to the element
        path: String,
    },

    /// A value does not match a literal fixed size
    #[error("Expected exactly {expected} items but received {actual} at {path}")]
    SizeMismatch {
        /// Configured fixed size
        expected: usize,
        /// Actual length, -1 for null
        actual: i64,
        /// Path to the element
        path: String,
    },

    /// A codec received a value of the wrong kind
    #[error("Invalid value received for {codec} at {path}: expected {expected}, got {actual}")]
    UnexpectedValue {
        /// Codec selector
        codec: &'static str,
        /// Expected value kind
        expected: &'static str,
        /// Received value kind
        actual: &'static str,
        /// Path to the element
        path: String,
    },

    /// An integer does not fit the domain of the codec
    #[error("Value {value} is out of range for {codec} at {path}")]
    ValueOutOfRange {
        /// Codec selector
        codec: &'static str,
        /// Rendered value
        value: String,
        /// Path to the element
        path: String,
    },

    /// A keyed array decoded an element that is not a structure
    #[error("Associative array can be applied to structures only, got {actual} at {path}")]
    KeyOnPrimitive {
        /// Received value kind
        actual: &'static str,
        /// Path to the element
        path: String,
    },

    /// A keyed array element lacks the key field
    #[error("Structure has no `{key}` field to key the array at {path}")]
    MissingKeyField {
        /// Key field name
        key: String,
        /// Path to the element
        path: String,
    },

    /// The key field holds a value that cannot be a map key
    #[error("Field `{key}` holds {actual}, which cannot key an array at {path}")]
    InvalidKey {
        /// Key field name
        key: String,
        /// Received value kind
        actual: &'static str,
        /// Path to the element
        path: String,
    },

    /// A variable-length integer did not terminate within its maximum width
    #[error("Variable-length integer exceeds {max} bytes at {path}")]
    VarIntTooLong {
        /// Maximum number of groups
        max: usize,
        /// Path to the element
        path: String,
    },

    /// A host field could not hold the decoded value
    #[error("Cannot assign {actual} to a field of type {expected}")]
    FieldType {
        /// Host field type
        expected: &'static str,
        /// Received value kind
        actual: &'static str,
    },

    /// Invalid UTF-8 in a string field
    #[error("Invalid UTF-8 string")]
    InvalidUtf8,

    /// Not enough bytes left in the stream
    #[error("Not enough data in the buffer: requested {requested} bytes, has {available}")]
    OutOfBounds {
        /// Requested byte count
        requested: usize,
        /// Bytes left in the stream
        available: usize,
    },
}

impl Error {
    /// Schema or options are malformed; independent of stream contents
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Error::UnknownSelector { .. }
                | Error::MissingShapeField { .. }
                | Error::DuplicateField { .. }
                | Error::UnknownField { .. }
        )
    }

    /// The value or the stream contents violate a codec contract
    pub fn is_data(&self) -> bool {
        !self.is_config() && !self.is_stream()
    }

    /// The stream ran out of bytes
    pub fn is_stream(&self) -> bool {
        matches!(self, Error::OutOfBounds { .. })
    }

    /// Attach a path to a host field conversion error
    pub(crate) fn at_field(self, codec: &'static str, path: &str) -> Self {
        match self {
            Error::FieldType { expected, actual } => Error::UnexpectedValue {
                codec,
                expected,
                actual,
                path: path.to_string(),
            },
            other => other,
        }
    }
}

impl From<core::str::Utf8Error> for Error {
    fn from(_: core::str::Utf8Error) -> Self {
        Error::InvalidUtf8
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(_: std::string::FromUtf8Error) -> Self {
        Error::InvalidUtf8
    }
}
