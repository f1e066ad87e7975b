//! Round-trip and size/write agreement properties

use binproto::prelude::*;
use proptest::prelude::*;

fn roundtrip(protocol: &BinaryProtocol, value: &Value, def: &TypeDef) -> Result<Value> {
    let mut stream = BufferStream::new();
    protocol.write(value, def, &mut stream, "")?;
    assert_eq!(stream.remaining(), protocol.size_of(value, def, "")?);
    let decoded = protocol.read(def, &mut stream, "")?;
    assert!(stream.is_empty());
    Ok(decoded)
}

fn fixed_int() -> impl Strategy<Value = FixedInt> {
    prop::sample::select(FixedInt::ALL.to_vec())
}

fn fixed_int_value() -> impl Strategy<Value = (FixedInt, Value)> {
    fixed_int().prop_flat_map(|kind| {
        let value = if kind.is_signed() {
            (kind.min() as i64..=kind.max() as i64)
                .prop_map(Value::Int)
                .boxed()
        } else {
            (0..=kind.max() as u64).prop_map(Value::UInt).boxed()
        };
        (Just(kind), value)
    })
}

fn entry_shape() -> Shape {
    Shape::record(
        "Entry",
        StructureDefinition::new()
            .field("id", TypeDef::VarLongZigZag)
            .field("name", TypeDef::BinaryString(StringOptions::new().size(TypeDef::VarInt)))
            .field("note", TypeDef::nullable_string()),
    )
}

fn entry() -> impl Strategy<Value = Value> {
    (
        -(1i64 << 62)..(1i64 << 62),
        prop::collection::vec(any::<u8>(), 0..64),
        prop::option::of(prop::collection::vec(any::<u8>(), 0..16)),
    )
        .prop_map(|(id, name, note)| {
            Value::structure(
                Record::new("Entry")
                    .with("id", id)
                    .with("name", &name[..])
                    .with("note", note.as_deref()),
            )
        })
}

proptest! {
    #[test]
    fn fixed_ints_roundtrip((kind, value) in fixed_int_value()) {
        let protocol = BinaryProtocol::new();
        let def = TypeDef::from(kind);
        prop_assert_eq!(protocol.size_of(&value, &def, "").unwrap(), kind.width());
        prop_assert_eq!(roundtrip(&protocol, &value, &def).unwrap(), value);
    }

    #[test]
    fn fixed_ints_reject_out_of_range(kind in fixed_int(), excess in 1i64..1000) {
        prop_assume!(kind.width() < 8);
        let protocol = BinaryProtocol::new();
        let value = Value::Int(kind.max() as i64 + excess);
        let err = protocol.size_of(&value, &TypeDef::from(kind), "").unwrap_err();
        let out_of_range = matches!(err, Error::ValueOutOfRange { .. });
        prop_assert!(out_of_range);
    }

    #[test]
    fn varint_roundtrip(value in any::<i32>()) {
        let protocol = BinaryProtocol::new();
        for def in [TypeDef::VarInt, TypeDef::VarIntZigZag] {
            let value = Value::Int(value.into());
            prop_assert_eq!(roundtrip(&protocol, &value, &def).unwrap(), value);
        }
    }

    #[test]
    fn varlong_roundtrip(value in any::<i64>()) {
        let protocol = BinaryProtocol::new();
        let value = Value::Int(value);
        prop_assert_eq!(roundtrip(&protocol, &value, &TypeDef::VarLong).unwrap(), value);
    }

    #[test]
    fn varlong_zigzag_roundtrip(value in -(1i64 << 62)..(1i64 << 62)) {
        let protocol = BinaryProtocol::new();
        let value = Value::Int(value);
        prop_assert_eq!(roundtrip(&protocol, &value, &TypeDef::VarLongZigZag).unwrap(), value);
    }

    #[test]
    fn zigzag_keeps_small_magnitudes_short(value in -64i64..64) {
        let protocol = BinaryProtocol::new();
        prop_assert_eq!(protocol.size_of(&Value::Int(value), &TypeDef::VarIntZigZag, "").unwrap(), 1);
    }

    #[test]
    fn strings_roundtrip(
        payload in prop::option::of(prop::collection::vec(any::<u8>(), 0..300)),
        prefix in prop::sample::select(vec![
            TypeDef::INT16BE,
            TypeDef::Int(FixedInt::Int32LE),
            TypeDef::VarInt,
            TypeDef::VarIntZigZag,
        ]),
    ) {
        let protocol = BinaryProtocol::new();
        let def = TypeDef::NullableString(StringOptions::new().size(prefix));
        let value = Value::from(payload.as_deref());
        prop_assert_eq!(roundtrip(&protocol, &value, &def).unwrap(), value);
    }

    #[test]
    fn arrays_of_structures_roundtrip(
        items in prop::collection::vec(entry(), 0..8),
        nullable in any::<bool>(),
    ) {
        let protocol = BinaryProtocol::new();
        let def = TypeDef::from(
            ArrayOptions::new(TypeDef::shape(entry_shape()))
                .size(TypeDef::VarInt)
                .nullable(nullable),
        );
        let value = Value::Array(items);
        prop_assert_eq!(roundtrip(&protocol, &value, &def).unwrap(), value);
    }

    #[test]
    fn envelope_roundtrip(item in entry()) {
        let protocol = BinaryProtocol::new();
        let def = TypeDef::BinaryString(
            StringOptions::new()
                .size(FixedInt::Int32BE)
                .envelope(TypeDef::shape(entry_shape())),
        );
        prop_assert_eq!(roundtrip(&protocol, &item, &def).unwrap(), item);
    }

    #[test]
    fn truncated_input_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..32)) {
        let protocol = BinaryProtocol::new();
        let def = TypeDef::array(TypeDef::shape(entry_shape()));
        let _ = protocol.decode(&def, bytes);
    }
}
