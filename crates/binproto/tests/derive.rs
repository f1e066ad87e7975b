//! Structures bound to derived host types
#![cfg(feature = "derive")]

use binproto::prelude::*;
use binproto::Structure;
use bytes::Bytes;
use indexmap::IndexMap;

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
struct Message {
    offset: i64,
    timestamp: i64,
    partition: u16,
    headers: Vec<Header>,
    payload: Option<Bytes>,
}

impl SchemeDefinition for Message {
    fn definition() -> StructureDefinition {
        StructureDefinition::new()
            .field("offset", TypeDef::INT64BE)
            .field("timestamp", TypeDef::VarLongZigZag)
            .field("partition", FixedInt::UInt16BE)
            .field(
                "headers",
                ArrayOptions::new(TypeDef::structure::<Header>()).size(TypeDef::VarInt),
            )
            .field("payload", TypeDef::nullable_string())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Structure)]
struct HeaderIndex {
    headers: IndexMap<MapKey, Header>,
}

impl SchemeDefinition for HeaderIndex {
    fn definition() -> StructureDefinition {
        StructureDefinition::new().field(
            "headers",
            ArrayOptions::new(TypeDef::structure::<Header>()).key("key"),
        )
    }
}

/// Self-referential shape
#[derive(Debug, Clone, PartialEq, Default, Structure)]
struct Node {
    id: i32,
    children: Vec<Node>,
}

impl SchemeDefinition for Node {
    fn definition() -> StructureDefinition {
        StructureDefinition::new()
            .field("id", TypeDef::VarIntZigZag)
            .field("children", TypeDef::array(TypeDef::structure::<Node>()))
    }
}

/// Declares a field its host type does not have
#[derive(Debug, Clone, PartialEq, Default, Structure)]
struct Broken {
    id: i32,
}

impl SchemeDefinition for Broken {
    fn definition() -> StructureDefinition {
        StructureDefinition::new()
            .field("id", TypeDef::INT32BE)
            .field("name", TypeDef::string())
    }
}

fn header(key: &str, value: Option<&str>) -> Header {
    Header {
        key: key.to_string(),
        value: value.map(|v| Bytes::copy_from_slice(v.as_bytes())),
    }
}

#[test]
fn test_message_roundtrip() -> Result<()> {
    let protocol = BinaryProtocol::new();
    let message = Message {
        offset: 42,
        timestamp: -1_700_000_000_000,
        partition: 7,
        headers: vec![header("trace", Some("abc")), header("empty", None)],
        payload: Some(Bytes::from_static(b"hello")),
    };

    let def = TypeDef::structure::<Message>();
    let value = Value::structure(message.clone());
    let bytes = protocol.encode(&value, &def)?;
    assert_eq!(bytes.len(), protocol.size_of(&value, &def, "")?);
    assert_eq!(&bytes[..8], &42i64.to_be_bytes());

    let decoded = protocol.decode(&def, bytes)?;
    assert_eq!(decoded.downcast_ref::<Message>(), Some(&message));
    assert_eq!(Message::from_value(decoded)?, message);
    Ok(())
}

#[test]
fn test_header_wire_layout() -> Result<()> {
    let protocol = BinaryProtocol::new();
    let def = TypeDef::structure::<Header>();

    let bytes = protocol.encode(&header("k", Some("v")).to_value(), &def)?;
    assert_eq!(hex::encode(&bytes), "016b0176");

    let bytes = protocol.encode(&header("k", None).to_value(), &def)?;
    assert_eq!(hex::encode(&bytes), "016bffffffff0f");
    Ok(())
}

#[test]
fn test_keyed_headers() -> Result<()> {
    let protocol = BinaryProtocol::new();
    let def = TypeDef::structure::<HeaderIndex>();

    let mut headers = IndexMap::new();
    headers.insert(MapKey::from("a"), header("a", Some("1")));
    headers.insert(MapKey::from("b"), header("b", None));
    let index = HeaderIndex { headers };

    let bytes = protocol.encode(&index.to_value(), &def)?;
    assert_eq!(&bytes[..4], &[0, 0, 0, 2]);
    let decoded = HeaderIndex::from_value(protocol.decode(&def, bytes)?)?;
    assert_eq!(decoded, index);
    assert_eq!(
        decoded.headers.keys().cloned().collect::<Vec<_>>(),
        vec![MapKey::from("a"), MapKey::from("b")]
    );
    Ok(())
}

#[test]
fn test_duplicate_key_replaces_in_place() -> Result<()> {
    let protocol = BinaryProtocol::new();
    let item = TypeDef::structure::<Header>();
    let plain = TypeDef::array(item.clone());
    let keyed = TypeDef::from(ArrayOptions::new(item).key("key"));

    let items = vec![
        header("a", Some("1")),
        header("b", Some("2")),
        header("a", Some("3")),
    ];
    let bytes = protocol.encode(&items.to_value(), &plain)?;
    let decoded = protocol.decode(&keyed, bytes)?;

    let map = IndexMap::<MapKey, Header>::from_value(decoded)?;
    assert_eq!(map.len(), 2);
    assert_eq!(map.get_index(0), Some((&MapKey::from("a"), &header("a", Some("3")))));
    Ok(())
}

#[test]
fn test_key_on_primitive_items() {
    let protocol = BinaryProtocol::new();
    let def = TypeDef::from(ArrayOptions::new(TypeDef::INT8).key("id"));
    let err = protocol
        .decode(&def, vec![0, 0, 0, 1, 5])
        .unwrap_err();
    assert!(matches!(err, Error::KeyOnPrimitive { ref path, .. } if path == "[0]"));
}

#[test]
fn test_recursive_shape() -> Result<()> {
    let protocol = BinaryProtocol::new();
    let tree = Node {
        id: -1,
        children: vec![
            Node { id: 2, children: Vec::new() },
            Node {
                id: 3,
                children: vec![Node { id: -4, children: Vec::new() }],
            },
        ],
    };

    let def = TypeDef::structure::<Node>();
    let bytes = protocol.encode(&tree.to_value(), &def)?;
    assert_eq!(Node::from_value(protocol.decode(&def, bytes)?)?, tree);
    Ok(())
}

#[test]
fn test_registered_host_type_by_name() -> Result<()> {
    let protocol = BinaryProtocol::new();
    assert!(protocol.register::<Header>());
    assert!(!protocol.register::<Header>());

    let def = TypeDef::named("Header");
    let value = header("x", None).to_value();
    let bytes = protocol.encode(&value, &def)?;
    assert_eq!(protocol.decode(&def, bytes)?, value);
    Ok(())
}

#[test]
fn test_missing_shape_field_is_config_error() {
    let protocol = BinaryProtocol::new();
    let err = protocol
        .encode(&Broken::default().to_value(), &TypeDef::structure::<Broken>())
        .unwrap_err();
    assert!(err.is_config());
    assert!(matches!(
        err,
        Error::MissingShapeField { ref shape, ref field } if shape == "Broken" && field == "name"
    ));
}

#[test]
fn test_field_type_error_carries_path() {
    let protocol = BinaryProtocol::new();
    // partition is u16 on the host but decoded from an Int8 here
    let def = TypeDef::shape(Shape::new(
        "Message",
        Message::FIELDS.iter().map(|f| f.to_string()).collect(),
        || StructureDefinition::new().field("partition", TypeDef::INT8),
        || Box::new(Message::default()) as Box<dyn Structure>,
    ));
    let err = protocol.decode(&def, vec![0xFF]).unwrap_err();
    assert!(err.is_data());
    let message = err.to_string();
    assert!(message.contains(":Message->partition"), "{message}");
}

mod v1 {
    use binproto::prelude::*;
    use binproto::Structure;

    #[derive(Debug, Clone, PartialEq, Default, Structure)]
    pub struct Header {
        pub id: i8,
    }

    impl SchemeDefinition for Header {
        fn definition() -> StructureDefinition {
            StructureDefinition::new().field("id", TypeDef::INT8)
        }
    }
}

mod v2 {
    use binproto::prelude::*;
    use binproto::Structure;

    #[derive(Debug, Clone, PartialEq, Default, Structure)]
    pub struct Header {
        pub id: i32,
    }

    impl SchemeDefinition for Header {
        fn definition() -> StructureDefinition {
            StructureDefinition::new().field("id", TypeDef::INT32BE)
        }
    }
}

#[test]
fn test_same_named_host_types_keep_their_layouts() -> Result<()> {
    let protocol = BinaryProtocol::new();
    let narrow = TypeDef::structure::<v1::Header>();
    let wide = TypeDef::structure::<v2::Header>();
    assert_ne!(narrow, wide);

    let bytes = protocol.encode(&v1::Header { id: 1 }.to_value(), &narrow)?;
    assert_eq!(&bytes[..], &[0x01]);

    let bytes = protocol.encode(&v2::Header { id: 1 }.to_value(), &wide)?;
    assert_eq!(&bytes[..], &[0x00, 0x00, 0x00, 0x01]);

    let decoded = protocol.decode(&wide, bytes)?;
    assert_eq!(decoded.downcast_ref::<v2::Header>(), Some(&v2::Header { id: 1 }));
    Ok(())
}
