use std::fmt::Write;

use amqp_types_shim_protocol::message::{CollectionValue, List, Map, SimpleValue, Value};
use serde_json::{Map as JsonMap, Value as JsonValue};

use super::AmqpType;
use crate::error::CodecError;

/// Render a received value as the literal for `ty`.
///
/// The value must carry the type the caller asked for, otherwise the
/// result is [`CodecError::TypeMismatch`]. Integers are rendered in `0x` hex.
pub fn decode(ty: AmqpType, value: &Value) -> Result<JsonValue, CodecError> {
    let found = value_type(value)?;
    if found != ty && !(ty.is_null() && found.is_null()) {
        return Err(CodecError::TypeMismatch {
            expected: ty,
            found: found.name().to_owned(),
        });
    }
    match value {
        Value::Simple(simple) => Ok(JsonValue::String(render(simple, IntegerStyle::Hex))),
        Value::Collection(CollectionValue::List(list)) => decode_list(list),
        Value::Collection(CollectionValue::Map(map)) => decode_map(map),
        other => Err(unsupported(other)),
    }
}

/// Render a list element or map entry, inferring its tag from the value.
///
/// Integers are rendered in decimal and null comes out as `none` with an
/// empty literal.
pub fn decode_element(value: &Value) -> Result<(AmqpType, JsonValue), CodecError> {
    match value {
        Value::Simple(SimpleValue::Null) => Ok((AmqpType::None, JsonValue::String(String::new()))),
        Value::Simple(simple) => Ok((
            simple_type(simple),
            JsonValue::String(render(simple, IntegerStyle::Decimal)),
        )),
        Value::Collection(CollectionValue::List(list)) => Ok((AmqpType::List, decode_list(list)?)),
        Value::Collection(CollectionValue::Map(map)) => Ok((AmqpType::Map, decode_map(map)?)),
        other => Err(unsupported(other)),
    }
}

fn decode_list(list: &List) -> Result<JsonValue, CodecError> {
    list.iter()
        .map(tagged_entry)
        .collect::<Result<Vec<_>, _>>()
        .map(JsonValue::Array)
}

fn decode_map(map: &Map<Value, Value>) -> Result<JsonValue, CodecError> {
    let mut object = JsonMap::new();
    for (key, value) in map.iter() {
        if matches!(key, Value::Collection(_)) {
            return Err(CodecError::CollectionKey);
        }
        let key = match tagged_entry(key)? {
            JsonValue::String(key) => key,
            _ => return Err(CodecError::CollectionKey),
        };
        object.insert(key, tagged_entry(value)?);
    }
    Ok(JsonValue::Object(object))
}

// scalars get their tag back, nested collections stay bare
fn tagged_entry(value: &Value) -> Result<JsonValue, CodecError> {
    match decode_element(value)? {
        (ty, nested) if ty.is_collection() => Ok(nested),
        (ty, JsonValue::String(literal)) => Ok(JsonValue::String(format!("{}:{}", ty, literal))),
        (_, other) => Ok(other),
    }
}

fn value_type(value: &Value) -> Result<AmqpType, CodecError> {
    match value {
        Value::Simple(simple) => Ok(simple_type(simple)),
        Value::Collection(CollectionValue::List(_)) => Ok(AmqpType::List),
        Value::Collection(CollectionValue::Map(_)) => Ok(AmqpType::Map),
        other => Err(unsupported(other)),
    }
}

fn simple_type(simple: &SimpleValue) -> AmqpType {
    match simple {
        SimpleValue::Null => AmqpType::None,
        SimpleValue::Boolean(_) => AmqpType::Boolean,
        SimpleValue::Ubyte(_) => AmqpType::Ubyte,
        SimpleValue::Ushort(_) => AmqpType::Ushort,
        SimpleValue::Uint(_) => AmqpType::Uint,
        SimpleValue::Ulong(_) => AmqpType::Ulong,
        SimpleValue::Byte(_) => AmqpType::Byte,
        SimpleValue::Short(_) => AmqpType::Short,
        SimpleValue::Int(_) => AmqpType::Int,
        SimpleValue::Long(_) => AmqpType::Long,
        SimpleValue::Float(_) => AmqpType::Float,
        SimpleValue::Double(_) => AmqpType::Double,
        SimpleValue::Decimal32(_) => AmqpType::Decimal32,
        SimpleValue::Decimal64(_) => AmqpType::Decimal64,
        SimpleValue::Decimal128(_) => AmqpType::Decimal128,
        SimpleValue::Char(_) => AmqpType::Char,
        SimpleValue::Timestamp(_) => AmqpType::Timestamp,
        SimpleValue::Uuid(_) => AmqpType::Uuid,
        SimpleValue::Binary(_) => AmqpType::Binary,
        SimpleValue::String(_) => AmqpType::String,
        SimpleValue::Symbol(_) => AmqpType::Symbol,
    }
}

fn unsupported(value: &Value) -> CodecError {
    match value {
        Value::Collection(CollectionValue::Array(array)) => {
            CodecError::Unsupported(format!("array of {} elements", array.len()))
        }
        Value::Described(described) => CodecError::Unsupported(format!(
            "described value with descriptor {:?}",
            described.descriptor()
        )),
        other => CodecError::Unsupported(format!("{:?}", other)),
    }
}

#[derive(Clone, Copy)]
enum IntegerStyle {
    Hex,
    Decimal,
}

fn render(simple: &SimpleValue, style: IntegerStyle) -> String {
    if let Some(integer) = integer_value(simple) {
        return match style {
            IntegerStyle::Hex => signed_hex(integer),
            IntegerStyle::Decimal => integer.to_string(),
        };
    }
    match simple {
        SimpleValue::Null => "None".to_owned(),
        SimpleValue::Boolean(true) => "True".to_owned(),
        SimpleValue::Boolean(false) => "False".to_owned(),
        SimpleValue::Float(float) => render_float32(float.value()),
        SimpleValue::Double(double) => render_float64(double.value()),
        SimpleValue::Char(c) => render_char(*c),
        SimpleValue::String(string) => string.clone(),
        SimpleValue::Symbol(symbol) => symbol.to_string(),
        SimpleValue::Binary(bytes) => render_binary(bytes),
        SimpleValue::Decimal32(decimal) => hex_bytes(decimal.as_bytes()),
        SimpleValue::Decimal64(decimal) => hex_bytes(decimal.as_bytes()),
        SimpleValue::Decimal128(decimal) => hex_bytes(decimal.as_bytes()),
        SimpleValue::Timestamp(timestamp) => signed_hex(timestamp.timestamp_millis().into()),
        SimpleValue::Uuid(uuid) => uuid.to_string(),
        other => format!("{:?}", other),
    }
}

fn integer_value(simple: &SimpleValue) -> Option<i128> {
    match simple {
        SimpleValue::Ubyte(value) => Some((*value).into()),
        SimpleValue::Ushort(value) => Some((*value).into()),
        SimpleValue::Uint(value) => Some((*value).into()),
        SimpleValue::Ulong(value) => Some((*value).into()),
        SimpleValue::Byte(value) => Some((*value).into()),
        SimpleValue::Short(value) => Some((*value).into()),
        SimpleValue::Int(value) => Some((*value).into()),
        SimpleValue::Long(value) => Some((*value).into()),
        _ => None,
    }
}

fn signed_hex(value: i128) -> String {
    if value < 0 {
        format!("-{:#x}", value.unsigned_abs())
    } else {
        format!("{:#x}", value)
    }
}

// small magnitudes read better in decimal, anything else keeps its exact bits
fn render_float32(value: f32) -> String {
    if (-10.0..=10.0).contains(&value) {
        value.to_string()
    } else {
        format!("{:#x}", value.to_bits())
    }
}

fn render_float64(value: f64) -> String {
    if (-10.0..=10.0).contains(&value) {
        value.to_string()
    } else {
        format!("{:#x}", value.to_bits())
    }
}

// letters and digits must be ASCII, whitespace need not be
fn render_char(c: char) -> String {
    if c.is_ascii_alphanumeric() || c.is_whitespace() {
        c.to_string()
    } else {
        format!("{:#x}", c as u32)
    }
}

fn render_binary(bytes: &[u8]) -> String {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return text.to_owned();
    }
    let mut rendered = String::with_capacity(bytes.len());
    for byte in bytes {
        if byte.is_ascii_graphic() || *byte == b' ' {
            rendered.push(*byte as char);
        } else {
            let _ = write!(rendered, "\\x{:02x}", byte);
        }
    }
    rendered
}

fn hex_bytes(bytes: &[u8]) -> String {
    bytes.iter().fold(String::from("0x"), |mut hex, byte| {
        let _ = write!(hex, "{:02x}", byte);
        hex
    })
}
