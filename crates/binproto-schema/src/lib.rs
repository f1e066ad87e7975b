//! BinProto schema language
//!
//! A schema declares structures as ordered, typed fields:
//!
//! ```text
//! struct Entry {
//!     key: BinaryString(size = Int8);
//!     value: NullableString(size = VarInt);
//!     children: ArrayOf(item = Entry, key = "key");
//! }
//! ```
//!
//! [`load`] parses and validates a schema file. [`ast::Schema::register`]
//! then lowers every structure to a record-backed shape and registers it
//! with a [`BinaryProtocol`], after which the structures can be named in
//! [`TypeDef::Named`](binproto::TypeDef::Named) references.

#![warn(missing_docs)]

pub mod ast;
pub mod lower;
pub mod parser;
pub mod validator;

pub use parser::{parse, parse_type};

use std::path::Path;

use binproto::BinaryProtocol;
use thiserror::Error;
use tracing::debug;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Errors that can occur while loading a schema
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Source text does not follow the schema grammar
    #[error("Parse error: {0}")]
    Parse(String),

    /// Schema parsed but names, references or options are invalid
    #[error("Validation error: {0}")]
    Validation(String),

    /// Schema file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Schema file does not exist
    #[error("File not found: {0}")]
    FileNotFound(String),
}

/// Parse and validate schema source
pub fn load_str(input: &str) -> Result<ast::Schema> {
    let schema = parser::parse(input)?;
    validator::validate(&schema)?;
    Ok(schema)
}

/// Read, parse and validate a schema file
pub fn load<P: AsRef<Path>>(path: P) -> Result<ast::Schema> {
    let path = path.as_ref();
    let input = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => SchemaError::FileNotFound(path.display().to_string()),
        _ => SchemaError::Io(e),
    })?;

    let schema = load_str(&input)?;
    debug!(path = %path.display(), structs = schema.structs.len(), "loaded schema");
    Ok(schema)
}

impl ast::Schema {
    /// Register every structure of a validated schema with `protocol`
    ///
    /// Nothing is registered if any structure name is already taken.
    /// Returns the number of registered shapes.
    pub fn register(&self, protocol: &BinaryProtocol) -> Result<usize> {
        let shapes = lower::lower(self)?;
        if let Some(taken) = shapes.iter().find(|s| protocol.shape(s.name()).is_some()) {
            return Err(SchemaError::Validation(format!(
                "Structure '{}' is already registered",
                taken.name()
            )));
        }

        let mut count = 0;
        for shape in shapes {
            if protocol.register_shape(shape) {
                count += 1;
            }
        }
        Ok(count)
    }
}
