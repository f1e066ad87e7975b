//! Debug example showing error paths and envelope layout

use binproto::prelude::*;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    println!("BinProto Debug Example");
    println!("======================");

    let protocol = BinaryProtocol::new();
    let pair = Shape::record(
        "Pair",
        StructureDefinition::new()
            .field("key", TypeDef::string())
            .field("value", TypeDef::string()),
    );
    protocol.register_shape(pair);

    // A string whose payload is the encoding of a Pair
    let envelope = TypeDef::BinaryString(
        StringOptions::new()
            .size(FixedInt::Int32LE)
            .envelope(TypeDef::named("Pair")),
    );
    let value = Value::structure(Record::new("Pair").with("key", "test").with("value", "value"));
    let data = protocol.encode(&value, &envelope)?;
    println!("Serialized envelope: {:02x?}", &data[..]);

    let length = i32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    println!("Payload length from prefix: {}", length);
    println!("Payload bytes: {:02x?}", &data[4..]);
    println!("Decoded: {:?}", protocol.decode(&envelope, data)?);

    // Errors carry the nested location they occurred at
    let batch = TypeDef::array(TypeDef::named("Pair"));
    let broken = Value::Array(vec![
        value.clone(),
        Value::structure(Record::new("Pair").with("key", "k").with("value", 7i64)),
    ]);
    match protocol.encode(&broken, &batch) {
        Ok(_) => println!("Unexpectedly encoded a broken batch"),
        Err(e) => println!("Error encoding batch: {}", e),
    }

    match protocol.decode(&TypeDef::named("Unknown"), vec![0u8; 4]) {
        Ok(_) => println!("Unexpectedly decoded an unknown shape"),
        Err(e) => println!("Error decoding: {} (config error: {})", e, e.is_config()),
    }

    match protocol.decode(&TypeDef::string(), vec![0x00, 0x08, b'a']) {
        Ok(_) => println!("Unexpectedly decoded a truncated string"),
        Err(e) => println!("Error decoding: {} (stream error: {})", e, e.is_stream()),
    }

    Ok(())
}
