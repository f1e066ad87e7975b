//! Byte-exact wire fixtures for the BinProto codecs

use binproto::prelude::*;
use indexmap::IndexMap;

fn pair_shape() -> Shape {
    Shape::record(
        "Pair",
        StructureDefinition::new()
            .field("key", TypeDef::string())
            .field("value", TypeDef::string()),
    )
}

fn pair(key: &str, value: &str) -> Value {
    Value::structure(Record::new("Pair").with("key", key).with("value", value))
}

fn encode_hex(protocol: &BinaryProtocol, value: &Value, def: &TypeDef) -> String {
    let bytes = protocol.encode(value, def).unwrap();
    assert_eq!(bytes.len(), protocol.size_of(value, def, "").unwrap());
    hex::encode(bytes)
}

fn decode_hex(protocol: &BinaryProtocol, def: &TypeDef, input: &str) -> Value {
    protocol.decode(def, hex::decode(input).unwrap()).unwrap()
}

#[test]
fn test_int16_be_sign() {
    let protocol = BinaryProtocol::new();
    assert_eq!(encode_hex(&protocol, &Value::Int(127), &TypeDef::INT16BE), "007f");
    assert_eq!(decode_hex(&protocol, &TypeDef::INT16BE, "ffff"), Value::Int(-1));
}

#[test]
fn test_explicit_endianness() {
    let protocol = BinaryProtocol::new();
    let value = Value::Int(0x0102_0304);
    assert_eq!(
        encode_hex(&protocol, &value, &FixedInt::Int32LE.into()),
        "04030201"
    );
    assert_eq!(
        encode_hex(&protocol, &value, &FixedInt::Int32BE.into()),
        "01020304"
    );
    assert_eq!(
        decode_hex(&protocol, &FixedInt::UInt16LE.into(), "feff"),
        Value::UInt(0xFFFE)
    );
    assert_eq!(
        decode_hex(&protocol, &FixedInt::UInt64BE.into(), "ffffffffffffffff"),
        Value::UInt(u64::MAX)
    );
}

#[test]
fn test_varint_boundaries() {
    let protocol = BinaryProtocol::new();
    assert_eq!(encode_hex(&protocol, &Value::Int(127), &TypeDef::VarInt), "7f");
    assert_eq!(encode_hex(&protocol, &Value::Int(128), &TypeDef::VarInt), "8001");
    assert_eq!(protocol.size_of(&Value::Int(128), &TypeDef::VarInt, "").unwrap(), 2);
    assert_eq!(encode_hex(&protocol, &Value::Int(-1), &TypeDef::VarInt), "ffffffff0f");
    assert_eq!(
        encode_hex(&protocol, &Value::Int(-1), &TypeDef::VarLong),
        "ffffffffffffffffff01"
    );
}

#[test]
fn test_zigzag_boundaries() {
    let protocol = BinaryProtocol::new();
    for (value, expected) in [(0, "00"), (-1, "01"), (1, "02"), (-2, "03")] {
        assert_eq!(
            encode_hex(&protocol, &Value::Int(value), &TypeDef::VarIntZigZag),
            expected
        );
        assert_eq!(
            encode_hex(&protocol, &Value::Int(value), &TypeDef::VarLongZigZag),
            expected
        );
    }
}

#[test]
fn test_nullable_string_int32_prefix() {
    let protocol = BinaryProtocol::new();
    let def = TypeDef::NullableString(StringOptions::new().size(FixedInt::Int32));
    assert_eq!(encode_hex(&protocol, &Value::Null, &def), "ffffffff");
    assert_eq!(decode_hex(&protocol, &def, "ffffffff"), Value::Null);
}

#[test]
fn test_envelope_payload_is_structure_encoding() {
    let protocol = BinaryProtocol::new();
    let def = TypeDef::BinaryString(
        StringOptions::new()
            .size(FixedInt::Int32LE)
            .envelope(TypeDef::shape(pair_shape())),
    );
    let value = pair("test", "value");

    assert_eq!(
        encode_hex(&protocol, &value, &def),
        "0d000000000474657374000576616c7565"
    );
    assert_eq!(
        decode_hex(&protocol, &def, "0d000000000474657374000576616c7565"),
        value
    );
}

#[test]
fn test_keyed_array() {
    let protocol = BinaryProtocol::new();
    let def = TypeDef::from(
        ArrayOptions::new(TypeDef::shape(pair_shape()))
            .size(FixedInt::Int32)
            .key("key"),
    );
    let expected = format!(
        "{}000474657374000576616c7565",
        hex::encode(1i32.to_ne_bytes())
    );

    let mut map = IndexMap::new();
    map.insert(MapKey::from("test"), pair("test", "value"));
    let value = Value::Map(map);
    assert_eq!(encode_hex(&protocol, &value, &def), expected);

    // a plain sequence encodes the same way
    let sequence = Value::Array(vec![pair("test", "value")]);
    assert_eq!(encode_hex(&protocol, &sequence, &def), expected);

    let decoded = decode_hex(&protocol, &def, &expected);
    let map = decoded.as_map().unwrap();
    assert_eq!(map.len(), 1);
    assert_eq!(map.get(&MapKey::from("test")), Some(&pair("test", "value")));
}

#[test]
fn test_fixed_size_mismatch_emits_nothing() {
    let protocol = BinaryProtocol::new();
    let def = TypeDef::BinaryString(StringOptions::new().size(8usize));
    let mut stream = BufferStream::new();

    let err = protocol
        .write(&Value::from("short"), &def, &mut stream, "")
        .unwrap_err();
    assert!(err.is_data());
    assert!(matches!(err, Error::SizeMismatch { expected: 8, actual: 5, .. }));
    assert!(stream.is_empty());

    assert!(protocol.size_of(&Value::from("short"), &def, "").is_err());
}

#[test]
fn test_unknown_selector_read_and_write() {
    let protocol = BinaryProtocol::new();
    let def = TypeDef::named("Missing");

    let mut stream = BufferStream::from(vec![0u8; 4]);
    let err = protocol.read(&def, &mut stream, "->root").unwrap_err();
    assert!(err.is_config());
    assert!(matches!(
        err,
        Error::UnknownSelector { ref selector, ref path } if selector == "Missing" && path == "->root"
    ));

    let mut stream = BufferStream::new();
    let err = protocol
        .write(&Value::Int(1), &def, &mut stream, "->root")
        .unwrap_err();
    assert!(matches!(err, Error::UnknownSelector { ref selector, .. } if selector == "Missing"));
    assert!(stream.is_empty());
}

#[test]
fn test_unknown_selector_nested_in_array() {
    let protocol = BinaryProtocol::new();
    let def = TypeDef::array(TypeDef::named("Missing"));
    let err = protocol
        .encode(&Value::Array(Vec::new()), &def)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::UnknownSelector { ref path, .. } if path == "[item]"
    ));
}

#[test]
fn test_errors_report_nested_path() {
    let protocol = BinaryProtocol::new();
    let def = TypeDef::array(TypeDef::shape(pair_shape()));
    let value = Value::Array(vec![
        pair("a", "b"),
        Value::structure(Record::new("Pair").with("key", "c").with("value", 3i64)),
    ]);

    let err = protocol.encode(&value, &def).unwrap_err();
    assert!(matches!(
        err,
        Error::UnexpectedValue { ref path, .. } if path == "[1]:Pair->value"
    ));
}

#[test]
fn test_truncated_input_is_a_stream_error() {
    let protocol = BinaryProtocol::new();
    let err = protocol
        .decode(&TypeDef::string(), hex::decode("000574657374").unwrap())
        .unwrap_err();
    assert!(err.is_stream());
    assert!(matches!(err, Error::OutOfBounds { requested: 5, available: 4 }));
}

#[test]
fn test_deferred_value_resolved_at_write_time() {
    let protocol = BinaryProtocol::new();
    let def = TypeDef::array(TypeDef::VarInt);
    let value = Value::Array(vec![
        Value::Int(1),
        Value::deferred(|_, _| Ok(Value::Int(300))),
    ]);

    assert_eq!(encode_hex(&protocol, &value, &def), "0000000201ac02");
}

#[test]
fn test_codec_cache_is_structural() {
    let protocol = BinaryProtocol::new();
    let value = Value::Array(vec![Value::Int(1)]);

    protocol.encode(&value, &TypeDef::array(TypeDef::INT8)).unwrap();
    let cached = protocol.cached_codecs();
    protocol.encode(&value, &TypeDef::array(TypeDef::INT8)).unwrap();
    assert_eq!(protocol.cached_codecs(), cached);

    // a fresh protocol starts empty
    assert_eq!(BinaryProtocol::new().cached_codecs(), 0);
}
