//! Length-prefixed byte strings
//!
//! The length is either a literal fixed size or an integer decoded with a
//! nested type. A nullable string stores null as length `-1`. When an
//! envelope is configured the payload is itself the encoding of that type.

use bytes::Bytes;

use crate::{
    errors::{Error, Result},
    protocol::BinaryProtocol,
    stream::{BufferStream, Stream},
    types::StringOptions,
    value::Value,
    Codec,
};

/// Codec for `BinaryString` and `NullableString`
#[derive(Debug, Clone)]
pub struct BinaryStringCodec {
    name: &'static str,
    options: StringOptions,
}

impl BinaryStringCodec {
    /// `BinaryString` codec
    pub fn new(options: StringOptions) -> Self {
        Self {
            name: "BinaryString",
            options,
        }
    }

    /// `NullableString` codec: same options with nullability forced on
    pub fn nullable(options: StringOptions) -> Self {
        Self {
            name: "NullableString",
            options: options.nullable(true),
        }
    }

    /// Payload bytes of a value, `None` for null
    fn payload(&self, protocol: &BinaryProtocol, value: &Value, path: &str) -> Result<Option<Bytes>> {
        match (value, &self.options.envelope) {
            (Value::Null, _) if self.options.nullable => Ok(None),
            (value, Some(envelope)) => {
                let mut buffer = BufferStream::new();
                protocol.write(value, envelope, &mut buffer, &format!("{path}[envelope]"))?;
                Ok(Some(buffer.into_bytes()))
            }
            (Value::Bytes(bytes), None) => Ok(Some(bytes.clone())),
            (other, None) => Err(Error::UnexpectedValue {
                codec: self.name,
                expected: "bytes",
                actual: other.kind(),
                path: path.to_string(),
            }),
        }
    }
}

impl Codec for BinaryStringCodec {
    fn read(&self, protocol: &BinaryProtocol, stream: &mut dyn Stream, path: &str) -> Result<Value> {
        let length = self.options.size.read_length(protocol, stream, path)?;
        if length == -1 && self.options.nullable {
            return Ok(Value::Null);
        }
        if length < 0 {
            return Err(Error::NegativeLength {
                length,
                path: path.to_string(),
            });
        }

        let payload = stream.read(length as usize)?;
        match &self.options.envelope {
            Some(envelope) => {
                let mut buffer = BufferStream::from(payload);
                protocol.read(envelope, &mut buffer, &format!("{path}[envelope]"))
            }
            None => Ok(Value::Bytes(payload)),
        }
    }

    fn write(
        &self,
        protocol: &BinaryProtocol,
        value: &Value,
        stream: &mut dyn Stream,
        path: &str,
    ) -> Result<()> {
        let payload = self.payload(protocol, value, path)?;
        let length = payload.as_ref().map(Bytes::len);
        self.options.size.write_length(protocol, length, stream, path)?;
        if let Some(payload) = payload.filter(|p| !p.is_empty()) {
            stream.write(&payload);
        }
        Ok(())
    }

    fn size_of(&self, protocol: &BinaryProtocol, value: &Value, path: &str) -> Result<usize> {
        let payload = self.payload(protocol, value, path)?;
        let length = payload.as_ref().map(Bytes::len);
        let prefix = self.options.size.length_size(protocol, length, path)?;
        Ok(prefix + length.unwrap_or(0))
    }
}
