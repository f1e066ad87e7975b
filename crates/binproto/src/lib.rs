//! BinProto - Schema-driven binary codec runtime
//!
//! This crate encodes host values into byte streams and decodes them back
//! according to declarative type definitions:
//! - Fixed-width integers in native, big and little endian order
//! - Base-128 variable-length integers with optional zig-zag mapping
//! - Length-prefixed byte strings, optionally nullable or wrapping an envelope
//! - Length-prefixed arrays, optionally keyed by a field of each element
//! - Structures with ordered, typed fields bound to host types
//!
//! # Quick Start
//!
//! ```rust
//! use binproto::prelude::*;
//!
//! let protocol = BinaryProtocol::new();
//! let def = TypeDef::array(TypeDef::VarInt);
//! let value = Value::Array(vec![Value::Int(1), Value::Int(300)]);
//!
//! let bytes = protocol.encode(&value, &def)?;
//! assert_eq!(&bytes[..], &[0, 0, 0, 2, 0x01, 0xAC, 0x02]);
//! assert_eq!(protocol.decode(&def, bytes)?, value);
//! # Ok::<(), binproto::Error>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(clippy::all)]

use core::fmt;

mod array;
mod errors;
mod primitives;
mod protocol;
mod shape;
mod stream;
mod string;
mod structure;
mod types;
mod value;
mod varint;

pub use array::ArrayOfCodec;
pub use errors::{Error, Result};
pub use primitives::{Endian, FixedInt, FixedIntCodec};
pub use protocol::BinaryProtocol;
pub use shape::{HostShape, Record, SchemeDefinition, Shape, Structure, StructureDefinition};
pub use stream::{BufferStream, Stream};
pub use string::BinaryStringCodec;
pub use structure::StructureCodec;
pub use types::{ArrayOptions, Size, StringOptions, StructureOptions, TypeDef};
pub use value::{Deferred, FieldValue, MapKey, Value};
pub use varint::{VarIntCodec, VarKind};

#[cfg(feature = "derive")]
#[cfg_attr(docsrs, doc(cfg(feature = "derive")))]
pub use binproto_macros::Structure;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        errors::{Error, Result},
        primitives::FixedInt,
        protocol::BinaryProtocol,
        shape::{HostShape, Record, SchemeDefinition, Shape, Structure, StructureDefinition},
        stream::{BufferStream, Stream},
        types::{ArrayOptions, Size, StringOptions, TypeDef},
        value::{FieldValue, MapKey, Value},
    };
}

/// Encoder and decoder bound to one normalized [`TypeDef`]
///
/// Composite codecs recurse through the [`BinaryProtocol`] for their nested
/// definitions. `size_of` must return exactly the number of bytes `write`
/// emits for the same value.
pub trait Codec: fmt::Debug + Send + Sync {
    /// Decode a value from the stream
    fn read(&self, protocol: &BinaryProtocol, stream: &mut dyn Stream, path: &str) -> Result<Value>;

    /// Encode a value into the stream
    fn write(
        &self,
        protocol: &BinaryProtocol,
        value: &Value,
        stream: &mut dyn Stream,
        path: &str,
    ) -> Result<()>;

    /// Number of bytes `write` would emit
    fn size_of(&self, protocol: &BinaryProtocol, value: &Value, path: &str) -> Result<usize>;
}
