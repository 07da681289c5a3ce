use amqp_types_shim_protocol::message::{Double, Float, List, Map, Symbol, Value};
use serde_json::{Map as JsonMap, Value as JsonValue};

use super::AmqpType;
use crate::error::CodecError;

/// Build the native AMQP value for `literal` interpreted as `ty`.
///
/// Scalars expect a JSON string, `list` a JSON array and `map` a JSON object.
/// `null`, `none` and the tags without a textual encoding always produce a
/// null value.
pub fn encode(ty: AmqpType, literal: &JsonValue) -> Result<Value, CodecError> {
    match (ty, literal) {
        (AmqpType::List, JsonValue::Array(items)) => encode_list(items),
        (AmqpType::Map, JsonValue::Object(entries)) => encode_map(entries),
        (ty, _) if ty.is_null() || ty.is_placeholder() => Ok(Value::null()),
        (ty, JsonValue::String(literal)) if !ty.is_collection() => encode_scalar(ty, literal),
        (ty, other) => Err(CodecError::UnexpectedShape {
            ty,
            found: json_shape(other),
        }),
    }
}

fn encode_scalar(ty: AmqpType, literal: &str) -> Result<Value, CodecError> {
    let value: Value = match ty {
        AmqpType::Null
        | AmqpType::None
        | AmqpType::Decimal32
        | AmqpType::Decimal64
        | AmqpType::Decimal128
        | AmqpType::Timestamp
        | AmqpType::Uuid => Value::null(),
        AmqpType::Boolean => boolean(literal)?.into(),
        AmqpType::Ubyte => integer::<u8>(ty, literal)?.into(),
        AmqpType::Ushort => integer::<u16>(ty, literal)?.into(),
        AmqpType::Uint => integer::<u32>(ty, literal)?.into(),
        AmqpType::Ulong => integer::<u64>(ty, literal)?.into(),
        AmqpType::Byte => integer::<i8>(ty, literal)?.into(),
        AmqpType::Short => integer::<i16>(ty, literal)?.into(),
        AmqpType::Int => integer::<i32>(ty, literal)?.into(),
        AmqpType::Long => integer::<i64>(ty, literal)?.into(),
        AmqpType::Float => Float::from(float32(literal)?).into(),
        AmqpType::Double => Double::from(float64(literal)?).into(),
        AmqpType::Char => character(literal)?.into(),
        AmqpType::String => literal.to_owned().into(),
        AmqpType::Symbol => Symbol::from(literal).into(),
        AmqpType::Binary => literal.as_bytes().to_vec().into(),
        AmqpType::List | AmqpType::Map => {
            return Err(CodecError::UnexpectedShape { ty, found: "string" })
        }
    };
    Ok(value)
}

fn encode_list(items: &[JsonValue]) -> Result<Value, CodecError> {
    let elements = items
        .iter()
        .map(encode_element)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(List::from(elements).into())
}

fn encode_map(entries: &JsonMap<String, JsonValue>) -> Result<Value, CodecError> {
    let mut map = Map::<Value, Value>::new();
    for (key, value) in entries {
        map.insert(encode_tagged(key)?, encode_element(value)?);
    }
    Ok(map.into())
}

/// Element of a list or value of a map: tagged strings or nested collections
fn encode_element(item: &JsonValue) -> Result<Value, CodecError> {
    match item {
        JsonValue::String(text) => encode_tagged(text),
        JsonValue::Array(_) => encode(AmqpType::List, item),
        JsonValue::Object(_) => encode(AmqpType::Map, item),
        other => Err(CodecError::Unsupported(format!(
            "collection element {} is neither a tagged string nor a collection",
            other
        ))),
    }
}

// text without a tag separator is carried as a plain string
fn encode_tagged(text: &str) -> Result<Value, CodecError> {
    match text.split_once(':') {
        Some((tag, literal)) => encode_scalar(tag.parse()?, literal),
        None => Ok(text.to_owned().into()),
    }
}

fn boolean(literal: &str) -> Result<bool, CodecError> {
    match literal.to_ascii_lowercase().as_str() {
        "true" | "t" | "1" => Ok(true),
        "false" | "f" | "0" => Ok(false),
        _ => Err(CodecError::invalid_literal(
            AmqpType::Boolean,
            literal,
            "not a boolean",
        )),
    }
}

/// Signed integer with an optional `0x` prefix on the magnitude
fn parse_integer(literal: &str) -> Result<i128, &'static str> {
    let (negative, unsigned) = match literal.as_bytes().first() {
        Some(b'-') => (true, &literal[1..]),
        Some(b'+') => (false, &literal[1..]),
        _ => (false, literal),
    };
    let (radix, digits) = match unsigned
        .strip_prefix("0x")
        .or_else(|| unsigned.strip_prefix("0X"))
    {
        Some(hex) => (16, hex),
        None => (10, unsigned),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err("not an integer");
    }
    let magnitude = u64::from_str_radix(digits, radix).map_err(|_| "out of range")?;
    Ok(if negative {
        -i128::from(magnitude)
    } else {
        i128::from(magnitude)
    })
}

fn integer<T: TryFrom<i128>>(ty: AmqpType, literal: &str) -> Result<T, CodecError> {
    let value = parse_integer(literal)
        .map_err(|reason| CodecError::invalid_literal(ty, literal, reason))?;
    T::try_from(value).map_err(|_| CodecError::invalid_literal(ty, literal, "out of range"))
}

// a literal that is not a decimal number is the IEEE-754 bit pattern
fn float32(literal: &str) -> Result<f32, CodecError> {
    match literal.parse::<f32>() {
        Ok(value) if value.is_finite() || names_infinity(literal) => Ok(value),
        Ok(_) => Err(CodecError::invalid_literal(
            AmqpType::Float,
            literal,
            "out of range",
        )),
        Err(_) => integer::<u32>(AmqpType::Float, literal).map(f32::from_bits),
    }
}

fn float64(literal: &str) -> Result<f64, CodecError> {
    match literal.parse::<f64>() {
        Ok(value) if value.is_finite() || names_infinity(literal) => Ok(value),
        Ok(_) => Err(CodecError::invalid_literal(
            AmqpType::Double,
            literal,
            "out of range",
        )),
        Err(_) => integer::<u64>(AmqpType::Double, literal).map(f64::from_bits),
    }
}

// decimal parsing saturates to infinity, only an explicit spelling may
fn names_infinity(literal: &str) -> bool {
    let unsigned = literal.trim_start_matches(['+', '-']);
    unsigned.eq_ignore_ascii_case("inf") || unsigned.eq_ignore_ascii_case("infinity")
}

fn character(literal: &str) -> Result<char, CodecError> {
    if let Ok(code) = parse_integer(literal) {
        return u32::try_from(code)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| {
                CodecError::invalid_literal(AmqpType::Char, literal, "not a Unicode scalar value")
            });
    }
    let mut chars = literal.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(CodecError::invalid_literal(
            AmqpType::Char,
            literal,
            "expected a single character or a code point",
        )),
    }
}

fn json_shape(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use amqp_types_shim_protocol::message::{Double, Float, List, Map, Symbol, Value};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::encode;
    use crate::{error::CodecError, tagged::AmqpType};

    fn scalar(ty: AmqpType, literal: &str) -> Result<Value, CodecError> {
        encode(ty, &json!(literal))
    }

    #[test]
    fn integer_range_test() {
        assert_eq!(Value::from(127i8), scalar(AmqpType::Byte, "0x7f").unwrap());
        assert_eq!(Value::from(-128i8), scalar(AmqpType::Byte, "-0x80").unwrap());
        assert_eq!(Value::from(65535u16), scalar(AmqpType::Ushort, "65535").unwrap());
        assert_eq!(Value::from(5i32), scalar(AmqpType::Int, "+5").unwrap());
        assert_eq!(
            Value::from(i64::MIN),
            scalar(AmqpType::Long, "-0x8000000000000000").unwrap()
        );
        assert_eq!(
            Value::from(u64::MAX),
            scalar(AmqpType::Ulong, "0xFFFFFFFFFFFFFFFF").unwrap()
        );

        assert!(matches!(
            scalar(AmqpType::Byte, "0x80"),
            Err(CodecError::InvalidLiteral { ty: AmqpType::Byte, .. })
        ));
        assert!(scalar(AmqpType::Ubyte, "-1").is_err());
        assert!(scalar(AmqpType::Ubyte, "256").is_err());
        assert!(scalar(AmqpType::Ulong, "0x10000000000000000").is_err());
        assert!(scalar(AmqpType::Int, "").is_err());
        assert!(scalar(AmqpType::Int, "0x").is_err());
        assert!(scalar(AmqpType::Int, "--1").is_err());
        assert!(scalar(AmqpType::Int, "12abc").is_err());
    }

    #[test]
    fn float_test() {
        assert_eq!(
            Value::from(Float::from(f32::MIN)),
            scalar(AmqpType::Float, "0xff7fffff").unwrap()
        );
        assert_eq!(
            Value::from(Float::from(3.14f32)),
            scalar(AmqpType::Float, "3.14").unwrap()
        );
        assert_eq!(
            Value::from(Double::from(f64::MIN)),
            scalar(AmqpType::Double, "0xffefffffffffffff").unwrap()
        );
        assert_eq!(
            Value::from(Double::from(-1.5f64)),
            scalar(AmqpType::Double, "-1.5").unwrap()
        );
        assert!(scalar(AmqpType::Float, "0x1ffffffff").is_err());
        assert!(scalar(AmqpType::Double, "pi").is_err());

        assert_eq!(
            Value::from(Float::from(f32::NEG_INFINITY)),
            scalar(AmqpType::Float, "-inf").unwrap()
        );
        assert_eq!(
            Value::from(Double::from(f64::INFINITY)),
            scalar(AmqpType::Double, "Infinity").unwrap()
        );
        assert!(matches!(
            scalar(AmqpType::Float, "1e40"),
            Err(CodecError::InvalidLiteral { .. })
        ));
        assert!(matches!(
            scalar(AmqpType::Double, "-1e400"),
            Err(CodecError::InvalidLiteral { .. })
        ));
    }

    #[test]
    fn char_test() {
        assert_eq!(Value::from('G'), scalar(AmqpType::Char, "G").unwrap());
        assert_eq!(Value::from('\u{16b5}'), scalar(AmqpType::Char, "0x16b5").unwrap());
        assert_eq!(Value::from('-'), scalar(AmqpType::Char, "-").unwrap());
        assert!(scalar(AmqpType::Char, "ab").is_err());
        assert!(scalar(AmqpType::Char, "").is_err());
        assert!(scalar(AmqpType::Char, "0xd800").is_err());
        assert!(scalar(AmqpType::Char, "0x110000").is_err());
    }

    #[test]
    fn boolean_test() {
        for literal in ["True", "true", "TRUE", "t", "1"] {
            assert_eq!(Value::from(true), scalar(AmqpType::Boolean, literal).unwrap());
        }
        for literal in ["False", "false", "F", "0"] {
            assert_eq!(Value::from(false), scalar(AmqpType::Boolean, literal).unwrap());
        }
        assert!(scalar(AmqpType::Boolean, "yes").is_err());
    }

    #[test]
    fn text_types_test() {
        assert_eq!(
            Value::from("a:b".to_owned()),
            scalar(AmqpType::String, "a:b").unwrap()
        );
        assert_eq!(
            Value::from(Symbol::from("myDomain.123")),
            scalar(AmqpType::Symbol, "myDomain.123").unwrap()
        );
        assert_eq!(
            Value::from(b"someData".to_vec()),
            scalar(AmqpType::Binary, "someData").unwrap()
        );
    }

    #[test]
    fn null_and_placeholder_test() {
        for ty in [
            AmqpType::Null,
            AmqpType::None,
            AmqpType::Decimal64,
            AmqpType::Timestamp,
            AmqpType::Uuid,
        ] {
            assert_eq!(Value::null(), scalar(ty, "anything").unwrap());
        }
        assert_eq!(Value::null(), encode(AmqpType::Null, &json!([1, 2])).unwrap());
    }

    #[test]
    fn collection_test() {
        let value = encode(
            AmqpType::List,
            &json!(["ubyte:1", "plain", [], {"int:-2": "none:"}]),
        )
        .unwrap();

        let mut nested = Map::<Value, Value>::new();
        nested.insert(-2i32, Value::null());
        let expected = List::from(vec![
            Value::from(1u8),
            Value::from("plain".to_owned()),
            Value::from(List::new()),
            Value::from(nested),
        ]);
        assert_eq!(Value::from(expected), value);
    }

    #[test]
    fn collection_errors_test() {
        assert!(matches!(
            encode(AmqpType::List, &json!(["integer:1"])),
            Err(CodecError::UnknownType(tag)) if tag == "integer"
        ));
        assert!(matches!(
            encode(AmqpType::List, &json!(["list:x"])),
            Err(CodecError::UnexpectedShape { ty: AmqpType::List, found: "string" })
        ));
        assert!(matches!(
            encode(AmqpType::List, &json!([1])),
            Err(CodecError::Unsupported(_))
        ));
        assert!(matches!(
            encode(AmqpType::Map, &json!({"int:x": "none:"})),
            Err(CodecError::InvalidLiteral { ty: AmqpType::Int, .. })
        ));
    }

    #[test]
    fn unexpected_shape_test() {
        assert!(matches!(
            encode(AmqpType::Int, &json!([])),
            Err(CodecError::UnexpectedShape { ty: AmqpType::Int, found: "array" })
        ));
        assert!(matches!(
            encode(AmqpType::List, &json!({})),
            Err(CodecError::UnexpectedShape { ty: AmqpType::List, found: "object" })
        ));
        assert!(matches!(
            encode(AmqpType::String, &json!(12)),
            Err(CodecError::UnexpectedShape { found: "number", .. })
        ));
    }
}
