//! Codec for host shapes with ordered, typed fields

use std::collections::HashSet;

use crate::{
    errors::{Error, Result},
    protocol::BinaryProtocol,
    shape::{Shape, Structure, StructureDefinition},
    stream::Stream,
    value::Value,
    Codec,
};

/// Codec for `Structure`
///
/// Fields are visited in declaration order by every operation, and every
/// declared field is always present on the wire.
#[derive(Debug, Clone)]
pub struct StructureCodec {
    shape: Shape,
    definition: StructureDefinition,
}

impl StructureCodec {
    /// Fetch the shape definition and check it against the host fields
    pub fn new(shape: Shape) -> Result<Self> {
        let definition = shape.definition();
        let mut seen = HashSet::with_capacity(definition.len());
        for name in definition.names() {
            if !seen.insert(name) {
                return Err(Error::DuplicateField {
                    shape: shape.name().to_string(),
                    field: name.to_string(),
                });
            }
            if !shape.has_field(name) {
                return Err(Error::MissingShapeField {
                    shape: shape.name().to_string(),
                    field: name.to_string(),
                });
            }
        }
        Ok(Self { shape, definition })
    }

    /// Host shape
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Validated field definitions
    pub fn definition(&self) -> &StructureDefinition {
        &self.definition
    }

    fn host<'a>(&self, value: &'a Value, path: &str) -> Result<&'a dyn Structure> {
        value.as_struct().ok_or_else(|| Error::UnexpectedValue {
            codec: "Structure",
            expected: "struct",
            actual: value.kind(),
            path: path.to_string(),
        })
    }

    fn base_path(&self, path: &str) -> String {
        format!("{path}:{}", self.shape.name())
    }
}

impl Codec for StructureCodec {
    fn read(&self, protocol: &BinaryProtocol, stream: &mut dyn Stream, path: &str) -> Result<Value> {
        let base = self.base_path(path);
        let mut instance = self.shape.blank();
        for (name, def) in self.definition.fields() {
            let field_path = format!("{base}->{name}");
            let value = protocol.read(def, stream, &field_path)?;
            instance
                .set_field(name, value)
                .map_err(|e| e.at_field("Structure", &field_path))?;
        }
        Ok(Value::Struct(instance))
    }

    fn write(
        &self,
        protocol: &BinaryProtocol,
        value: &Value,
        stream: &mut dyn Stream,
        path: &str,
    ) -> Result<()> {
        let host = self.host(value, path)?;
        let base = self.base_path(path);
        for (name, def) in self.definition.fields() {
            let field = host.field(name).unwrap_or(Value::Null);
            protocol.write(&field, def, stream, &format!("{base}->{name}"))?;
        }
        Ok(())
    }

    fn size_of(&self, protocol: &BinaryProtocol, value: &Value, path: &str) -> Result<usize> {
        let host = self.host(value, path)?;
        let base = self.base_path(path);
        let mut total = 0;
        for (name, def) in self.definition.fields() {
            let field = host.field(name).unwrap_or(Value::Null);
            total += protocol.size_of(&field, def, &format!("{base}->{name}"))?;
        }
        Ok(total)
    }
}
