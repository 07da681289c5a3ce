use std::{fmt, str::FromStr};

use crate::error::CodecError;

/// AMQP type tag as used on the command line and inside tagged literals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AmqpType {
    Null,
    None,
    Boolean,
    Ubyte,
    Ushort,
    Uint,
    Ulong,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Char,
    String,
    Symbol,
    Binary,
    List,
    Map,
    Decimal32,
    Decimal64,
    Decimal128,
    Timestamp,
    Uuid,
}

const TYPE_NAMES: [(AmqpType, &str); 24] = [
    (AmqpType::Null, "null"),
    (AmqpType::None, "none"),
    (AmqpType::Boolean, "boolean"),
    (AmqpType::Ubyte, "ubyte"),
    (AmqpType::Ushort, "ushort"),
    (AmqpType::Uint, "uint"),
    (AmqpType::Ulong, "ulong"),
    (AmqpType::Byte, "byte"),
    (AmqpType::Short, "short"),
    (AmqpType::Int, "int"),
    (AmqpType::Long, "long"),
    (AmqpType::Float, "float"),
    (AmqpType::Double, "double"),
    (AmqpType::Char, "char"),
    (AmqpType::String, "string"),
    (AmqpType::Symbol, "symbol"),
    (AmqpType::Binary, "binary"),
    (AmqpType::List, "list"),
    (AmqpType::Map, "map"),
    (AmqpType::Decimal32, "decimal32"),
    (AmqpType::Decimal64, "decimal64"),
    (AmqpType::Decimal128, "decimal128"),
    (AmqpType::Timestamp, "timestamp"),
    (AmqpType::Uuid, "uuid"),
];

impl AmqpType {
    pub fn name(&self) -> &'static str {
        TYPE_NAMES
            .iter()
            .find(|(ty, _)| ty == self)
            .map_or("unknown", |(_, name)| name)
    }

    /// Every known tag, in declaration order
    pub fn all() -> impl Iterator<Item = AmqpType> {
        TYPE_NAMES.iter().map(|(ty, _)| *ty)
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, AmqpType::List | AmqpType::Map)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AmqpType::Null | AmqpType::None)
    }

    /// Tags accepted on input but carried as null on the wire
    pub fn is_placeholder(&self) -> bool {
        matches!(
            self,
            AmqpType::Decimal32
                | AmqpType::Decimal64
                | AmqpType::Decimal128
                | AmqpType::Timestamp
                | AmqpType::Uuid
        )
    }
}

impl FromStr for AmqpType {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TYPE_NAMES
            .iter()
            .find(|(_, name)| *name == s)
            .map(|(ty, _)| *ty)
            .ok_or_else(|| CodecError::UnknownType(s.to_owned()))
    }
}

impl fmt::Display for AmqpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::AmqpType;
    use crate::error::CodecError;

    #[test]
    fn names_round_trip_test() {
        for ty in AmqpType::all() {
            assert_eq!(ty, ty.name().parse::<AmqpType>().unwrap());
            assert_eq!(ty.name(), ty.to_string());
        }
        assert_eq!(24, AmqpType::all().count());
    }

    #[test]
    fn unknown_tag_test() {
        let err = "integer".parse::<AmqpType>().unwrap_err();
        assert!(matches!(err, CodecError::UnknownType(tag) if tag == "integer"));

        // tags are case sensitive
        assert!("Int".parse::<AmqpType>().is_err());
    }
}
