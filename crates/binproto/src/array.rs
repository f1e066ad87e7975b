//! Length-prefixed homogeneous sequences

use indexmap::IndexMap;

use crate::{
    errors::{Error, Result},
    protocol::BinaryProtocol,
    stream::Stream,
    types::ArrayOptions,
    value::{MapKey, Value},
    Codec,
};

/// Upper bound for capacity reserved from an untrusted count
const MAX_PREALLOCATED_ITEMS: usize = 1024;

/// Codec for `ArrayOf`
///
/// With a `key` configured, decoding yields a [`Value::Map`] keyed by that
/// field of every element; a later duplicate key replaces the earlier element
/// in place. Both sequences and maps are accepted for encoding.
#[derive(Debug, Clone)]
pub struct ArrayOfCodec {
    options: ArrayOptions,
}

impl ArrayOfCodec {
    /// Create a codec with the given options
    pub fn new(options: ArrayOptions) -> Self {
        Self { options }
    }

    fn key_of(&self, key: &str, element: &Value, path: &str) -> Result<MapKey> {
        let structure = match element {
            Value::Struct(s) => s,
            other => {
                return Err(Error::KeyOnPrimitive {
                    actual: other.kind(),
                    path: path.to_string(),
                })
            }
        };
        let field = structure.field(key).ok_or_else(|| Error::MissingKeyField {
            key: key.to_string(),
            path: path.to_string(),
        })?;
        MapKey::try_from(&field).map_err(|actual| Error::InvalidKey {
            key: key.to_string(),
            actual,
            path: path.to_string(),
        })
    }

    /// Elements paired with their paths, `None` for null
    fn elements<'a>(&self, value: &'a Value, path: &str) -> Result<Option<Vec<(String, &'a Value)>>> {
        match value {
            Value::Null if self.options.nullable => Ok(None),
            Value::Array(items) => Ok(Some(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| (format!("{path}[{i}]"), item))
                    .collect(),
            )),
            Value::Map(map) => Ok(Some(
                map.iter()
                    .map(|(key, item)| (format!("{path}[{key}]"), item))
                    .collect(),
            )),
            other => Err(Error::UnexpectedValue {
                codec: "ArrayOf",
                expected: "array",
                actual: other.kind(),
                path: path.to_string(),
            }),
        }
    }
}

impl Codec for ArrayOfCodec {
    fn read(&self, protocol: &BinaryProtocol, stream: &mut dyn Stream, path: &str) -> Result<Value> {
        let count = self.options.size.read_length(protocol, stream, path)?;
        if count == -1 && self.options.nullable {
            return Ok(Value::Null);
        }
        if count < 0 {
            return Err(Error::NegativeLength {
                length: count,
                path: path.to_string(),
            });
        }

        let capacity = (count as usize).min(MAX_PREALLOCATED_ITEMS);
        match &self.options.key {
            None => {
                let mut items = Vec::with_capacity(capacity);
                for index in 0..count {
                    items.push(protocol.read(&self.options.item, stream, &format!("{path}[{index}]"))?);
                }
                Ok(Value::Array(items))
            }
            Some(key) => {
                let mut map = IndexMap::with_capacity(capacity);
                for index in 0..count {
                    let item_path = format!("{path}[{index}]");
                    let element = protocol.read(&self.options.item, stream, &item_path)?;
                    map.insert(self.key_of(key, &element, &item_path)?, element);
                }
                Ok(Value::Map(map))
            }
        }
    }

    fn write(
        &self,
        protocol: &BinaryProtocol,
        value: &Value,
        stream: &mut dyn Stream,
        path: &str,
    ) -> Result<()> {
        let elements = self.elements(value, path)?;
        let count = elements.as_ref().map(Vec::len);
        self.options.size.write_length(protocol, count, stream, path)?;
        for (item_path, item) in elements.into_iter().flatten() {
            protocol.write(item, &self.options.item, stream, &item_path)?;
        }
        Ok(())
    }

    fn size_of(&self, protocol: &BinaryProtocol, value: &Value, path: &str) -> Result<usize> {
        let elements = self.elements(value, path)?;
        let count = elements.as_ref().map(Vec::len);
        let mut total = self.options.size.length_size(protocol, count, path)?;
        for (item_path, item) in elements.into_iter().flatten() {
            total += protocol.size_of(item, &self.options.item, &item_path)?;
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        primitives::FixedInt,
        shape::{Record, Shape, StructureDefinition},
        stream::BufferStream,
        types::TypeDef,
    };

    fn ints(values: &[i64]) -> Value {
        Value::Array(values.iter().copied().map(Value::Int).collect())
    }

    #[test]
    fn test_default_count_prefix() -> Result<()> {
        let protocol = BinaryProtocol::new();
        let codec = ArrayOfCodec::new(ArrayOptions::new(FixedInt::Int8));
        let mut stream = BufferStream::new();
        codec.write(&protocol, &ints(&[1, -1]), &mut stream, "")?;
        assert_eq!(stream.buffer(), &[0, 0, 0, 2, 0x01, 0xFF]);
        assert_eq!(codec.size_of(&protocol, &ints(&[1, -1]), "")?, 6);
        assert_eq!(codec.read(&protocol, &mut stream, "")?, ints(&[1, -1]));
        Ok(())
    }

    #[test]
    fn test_nullable_array() -> Result<()> {
        let protocol = BinaryProtocol::new();
        let codec = ArrayOfCodec::new(
            ArrayOptions::new(TypeDef::VarInt)
                .size(TypeDef::VarIntZigZag)
                .nullable(true),
        );
        let mut stream = BufferStream::new();
        codec.write(&protocol, &Value::Null, &mut stream, "")?;
        assert_eq!(stream.buffer(), &[0x01]);
        assert_eq!(codec.read(&protocol, &mut stream, "")?, Value::Null);
        Ok(())
    }

    #[test]
    fn test_fixed_count_mismatch_writes_nothing() {
        let protocol = BinaryProtocol::new();
        let codec = ArrayOfCodec::new(ArrayOptions::new(FixedInt::Int8).size(3usize));
        let mut stream = BufferStream::new();
        let err = codec
            .write(&protocol, &ints(&[1, 2]), &mut stream, "->items")
            .unwrap_err();
        assert!(matches!(err, Error::SizeMismatch { expected: 3, actual: 2, .. }));
        assert!(stream.is_empty());
    }

    #[test]
    fn test_element_errors_carry_index() {
        let protocol = BinaryProtocol::new();
        let codec = ArrayOfCodec::new(ArrayOptions::new(FixedInt::UInt8));
        let err = codec
            .size_of(&protocol, &ints(&[1, 2, 300]), "->items")
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ValueOutOfRange { ref path, .. } if path == "->items[2]"
        ));
    }

    #[test]
    fn test_key_on_primitive() {
        let protocol = BinaryProtocol::new();
        let codec = ArrayOfCodec::new(ArrayOptions::new(FixedInt::Int8).key("id"));
        let mut stream = BufferStream::from(vec![0, 0, 0, 1, 5]);
        let err = codec.read(&protocol, &mut stream, "").unwrap_err();
        assert!(matches!(err, Error::KeyOnPrimitive { actual: "int", .. }));
    }

    #[test]
    fn test_duplicate_keys_overwrite_in_place() -> Result<()> {
        let protocol = BinaryProtocol::new();
        let shape = Shape::record(
            "Entry",
            StructureDefinition::new()
                .field("id", FixedInt::Int8)
                .field("v", FixedInt::Int8),
        );
        let codec = ArrayOfCodec::new(ArrayOptions::new(TypeDef::shape(shape)).key("id"));
        let mut stream = BufferStream::from(vec![0, 0, 0, 3, 1, 10, 2, 20, 1, 30]);
        let value = codec.read(&protocol, &mut stream, "")?;
        let map = value.as_map().unwrap();

        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec![MapKey::Int(1), MapKey::Int(2)]);
        assert_eq!(
            map[&MapKey::Int(1)],
            Value::structure(Record::new("Entry").with("id", 1i64).with("v", 30i64))
        );
        Ok(())
    }
}
