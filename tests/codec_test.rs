use amqp_types_shim::{
    error::CodecError,
    tagged::{self, AmqpType},
    types::Message,
};
use amqp_types_shim_protocol::codec::Decoder;
use pretty_assertions::assert_eq;
use serde_json::Value as JsonValue;

/// Literals that must come back unchanged after a trip through a message body
const ROUND_TRIPS: &[(&str, &str)] = &[
    ("string", r#"["aString"]"#),
    ("string", r#"["aString","secondString"]"#),
    ("null", r#"["None"]"#),
    ("boolean", r#"["True"]"#),
    ("boolean", r#"["False"]"#),
    ("ubyte", r#"["0xff"]"#),
    ("ushort", r#"["0xffff"]"#),
    ("uint", r#"["0xffffffff"]"#),
    ("ulong", r#"["0xffffffffffffffff"]"#),
    ("byte", r#"["-0x80"]"#),
    ("short", r#"["-0x8000"]"#),
    ("int", r#"["-0x80000000"]"#),
    ("long", r#"["-0x8000000000000000"]"#),
    ("ubyte", r#"["0x0","0x1","0x7f"]"#),
    ("byte", r#"["0x7f","0x0","-0x1"]"#),
    ("float", r#"["0xff7fffff"]"#),
    ("float", r#"["3.14"]"#),
    ("double", r#"["0xffefffffffffffff"]"#),
    ("double", r#"["3.14"]"#),
    ("char", r#"["G"]"#),
    ("char", r#"["0x16b5"]"#),
    ("string", r#"["Hello, World!"]"#),
    ("symbol", r#"["myDomain.123"]"#),
    ("binary", r#"["someData"]"#),
    ("string", r#"[]"#),
    ("list", r#"[[]]"#),
    ("map", r#"[{}]"#),
    ("list", r#"[[[],[]]]"#),
    ("list", r#"[["string:v"]]"#),
    ("map", r#"[{"string:k":"string:v"}]"#),
    ("map", r#"[{"string:k":[]}]"#),
    ("map", r#"[{"string:k":{"string:k":"string:v"}}]"#),
    ("list", r#"[[[],[[],[[],[],[]],[]],[]]]"#),
    ("list", r#"[["ubyte:1"]]"#),
    ("list", r#"[["int:-2"]]"#),
    ("list", r#"[["float:3.14"]]"#),
    ("list", r#"[["string:a"]]"#),
    ("list", r#"[["ulong:12345"]]"#),
    ("list", r#"[["short:-2500"]]"#),
    ("list", r#"[["symbol:a.b.c"]]"#),
    ("list", r#"[["none:"]]"#),
    ("list", r#"[["boolean:True"]]"#),
    ("list", r#"[["long:1234"]]"#),
    ("map", r#"[{"string:None":"none:"}]"#),
    ("map", r#"[{"none:":"string:None"}]"#),
];

fn through_message(ty: AmqpType, literal: &JsonValue) -> Result<JsonValue, CodecError> {
    let value = tagged::encode(ty, literal)?;
    let bytes = Message::builder().value(value).build().to_bytes().unwrap();
    let (remaining, message) = Message::decode(&bytes).unwrap();
    assert!(remaining.is_empty());
    tagged::decode(ty, message.value().unwrap())
}

#[test]
fn round_trip_table_test() {
    for (tag, input) in ROUND_TRIPS {
        let ty: AmqpType = tag.parse().unwrap();
        let values: Vec<JsonValue> = serde_json::from_str(input).unwrap();

        let decoded = values
            .iter()
            .map(|value| through_message(ty, value))
            .collect::<Result<Vec<_>, _>>()
            .unwrap_or_else(|err| panic!("{} {}: {}", tag, input, err));

        assert_eq!(
            *input,
            serde_json::to_string(&decoded).unwrap(),
            "round trip of {} {}",
            tag,
            input
        );
    }
}

#[test]
fn canonical_rendering_test() {
    let cases = [
        ("ubyte", "255", "0xff"),
        ("int", "-2", "-0x2"),
        ("long", "0X10", "0x10"),
        ("boolean", "true", "True"),
        ("boolean", "f", "False"),
        ("float", "10.5", "0x41280000"),
        ("double", "-2.5", "-2.5"),
        ("char", "71", "G"),
        ("char", "é", "0xe9"),
    ];
    for (tag, input, expected) in cases {
        let ty: AmqpType = tag.parse().unwrap();
        let decoded = through_message(ty, &JsonValue::from(input)).unwrap();
        assert_eq!(JsonValue::from(expected), decoded, "{} {}", tag, input);
    }
}

#[test]
fn wire_only_types_encode_null_test() {
    for tag in ["decimal32", "decimal64", "decimal128", "timestamp", "uuid"] {
        let ty: AmqpType = tag.parse().unwrap();
        let value = tagged::encode(ty, &JsonValue::from("0x1")).unwrap();
        assert!(value.is_null(), "{}", tag);
    }
}

#[test]
fn mismatched_type_test() {
    let value = tagged::encode(AmqpType::Ubyte, &JsonValue::from("0x1")).unwrap();
    match tagged::decode(AmqpType::Ushort, &value) {
        Err(CodecError::TypeMismatch { expected, found }) => {
            assert_eq!(AmqpType::Ushort, expected);
            assert_eq!("ubyte", found);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn invalid_literals_test() {
    let cases = [
        ("ubyte", "0x100"),
        ("byte", "-0x81"),
        ("ushort", "-1"),
        ("int", "twelve"),
        ("boolean", "yes"),
        ("char", "ab"),
        ("float", "1e40"),
        ("double", "1e400"),
    ];
    for (tag, input) in cases {
        let ty: AmqpType = tag.parse().unwrap();
        assert!(
            matches!(
                tagged::encode(ty, &JsonValue::from(input)),
                Err(CodecError::InvalidLiteral { .. })
            ),
            "{} {}",
            tag,
            input
        );
    }
}
