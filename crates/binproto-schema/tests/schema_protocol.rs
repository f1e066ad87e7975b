//! Schemas registered with a protocol and used for encoding

use binproto::{BinaryProtocol, MapKey, Record, Structure, TypeDef, Value};
use binproto_schema::{load, load_str, SchemaError};
use std::io::Write;

const BATCH_SCHEMA: &str = r#"
    // Headers are keyed by name once decoded
    struct Batch {
        base_offset: Int64BE;
        producer: NullableString(size = Int16BE);
        headers: ArrayOf(item = Header, size = VarInt, key = "name");
        payload: BinaryString(size = Int32LE, envelope = Header);
    }

    struct Header {
        name: BinaryString(size = VarInt);
        value: NullableString(size = VarIntZigZag);
    }
"#;

fn header(name: &str, value: Option<&str>) -> Value {
    Value::structure(Record::new("Header").with("name", name).with("value", value))
}

#[test]
fn test_batch_wire_layout() {
    let protocol = BinaryProtocol::new();
    let registered = load_str(BATCH_SCHEMA).unwrap().register(&protocol).unwrap();
    assert_eq!(registered, 2);

    let batch = Value::structure(
        Record::new("Batch")
            .with("base_offset", 1i64)
            .with("producer", Value::Null)
            .with("headers", vec![header("a", Some("b"))])
            .with("payload", header("k", None)),
    );

    let def = TypeDef::named("Batch");
    let bytes = protocol.encode(&batch, &def).unwrap();
    assert_eq!(
        hex::encode(&bytes),
        concat!(
            "0000000000000001", // base_offset
            "ffff",             // producer: null
            "01", "0161", "0262", // one header
            "03000000", "016b01", // payload envelope
        )
    );

    let decoded = protocol.decode(&def, bytes).unwrap();
    let headers = decoded.as_struct().unwrap().field("headers").unwrap();
    assert_eq!(
        headers.as_map().unwrap().get(&MapKey::from("a")),
        Some(&header("a", Some("b")))
    );
}

#[test]
fn test_schema_file_roundtrip() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(BATCH_SCHEMA.as_bytes()).unwrap();

    let protocol = BinaryProtocol::new();
    load(file.path()).unwrap().register(&protocol).unwrap();

    let value = header("x", Some("y"));
    let bytes = protocol.encode(&value, &TypeDef::named("Header")).unwrap();
    assert_eq!(protocol.decode(&TypeDef::named("Header"), bytes).unwrap(), value);
}

#[test]
fn test_unregistered_reference_is_reported() {
    let protocol = BinaryProtocol::new();
    load_str("struct Only { x: Int8; }")
        .unwrap()
        .register(&protocol)
        .unwrap();

    let err = protocol
        .encode(&Value::Int(1), &TypeDef::named("Batch"))
        .unwrap_err();
    assert!(err.is_config());
}

#[test]
fn test_errors_are_classified() {
    assert!(matches!(
        load_str("struct { x: Int8; }"),
        Err(SchemaError::Parse(_))
    ));
    assert!(matches!(
        load_str("struct A { x: ArrayOf(item = Int8, key = \"x\"); }"),
        Err(SchemaError::Validation(_))
    ));
}
