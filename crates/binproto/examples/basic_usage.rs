//! Basic usage example for BinProto

use binproto::prelude::*;
use binproto::Structure;
use bytes::Bytes;

#[derive(Debug, Clone, PartialEq, Default, Structure)]
struct Header {
    key: String,
    value: Option<Bytes>,
}

impl SchemeDefinition for Header {
    fn definition() -> StructureDefinition {
        StructureDefinition::new()
            .field("key", TypeDef::BinaryString(StringOptions::new().size(TypeDef::VarInt)))
            .field("value", TypeDef::NullableString(StringOptions::new().size(TypeDef::VarInt)))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Structure)]
struct BatchRecord {
    offset_delta: i32,
    timestamp_delta: i64,
    key: Option<Bytes>,
    value: Option<Bytes>,
    headers: Vec<Header>,
}

impl SchemeDefinition for BatchRecord {
    fn definition() -> StructureDefinition {
        let bytes = TypeDef::NullableString(StringOptions::new().size(TypeDef::VarIntZigZag));
        StructureDefinition::new()
            .field("offset_delta", TypeDef::VarIntZigZag)
            .field("timestamp_delta", TypeDef::VarLongZigZag)
            .field("key", bytes.clone())
            .field("value", bytes)
            .field(
                "headers",
                ArrayOptions::new(TypeDef::structure::<Header>()).size(TypeDef::VarIntZigZag),
            )
    }
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    println!("BinProto Basic Usage Example");
    println!("============================");

    let protocol = BinaryProtocol::new();

    // Primitive codecs
    let bytes = protocol.encode(&Value::Int(127), &TypeDef::INT16BE)?;
    println!("Int16BE 127       -> {:02x?}", &bytes[..]);
    let bytes = protocol.encode(&Value::Int(300), &TypeDef::VarInt)?;
    println!("VarInt 300        -> {:02x?}", &bytes[..]);
    let bytes = protocol.encode(&Value::Int(-1), &TypeDef::VarIntZigZag)?;
    println!("VarIntZigZag -1   -> {:02x?}", &bytes[..]);

    // A record batch entry bound to host types
    let record = BatchRecord {
        offset_delta: 3,
        timestamp_delta: -120,
        key: Some(Bytes::from_static(b"user-42")),
        value: None,
        headers: vec![Header {
            key: "trace-id".to_string(),
            value: Some(Bytes::from_static(b"0af7651916cd43dd")),
        }],
    };

    let def = TypeDef::structure::<BatchRecord>();
    let value = record.to_value();
    let size = protocol.size_of(&value, &def, "")?;
    let serialized = protocol.encode(&value, &def)?;
    println!("\nSerialized record: {} bytes (predicted {})", serialized.len(), size);
    println!("   {:02x?}", &serialized[..]);

    let decoded = BatchRecord::from_value(protocol.decode(&def, serialized)?)?;
    println!("\nDecoded record:");
    println!("   Offset delta: {}", decoded.offset_delta);
    println!("   Timestamp delta: {}", decoded.timestamp_delta);
    println!("   Key: {:?}", decoded.key);
    println!("   Value: {:?}", decoded.value);
    for header in &decoded.headers {
        println!("   Header {} = {:?}", header.key, header.value);
    }
    assert_eq!(decoded, record);

    println!("\nCodecs cached by this protocol: {}", protocol.cached_codecs());
    Ok(())
}
