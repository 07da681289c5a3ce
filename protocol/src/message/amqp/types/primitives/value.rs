use std::{
    collections::hash_map::DefaultHasher,
    convert::TryFrom,
    hash::{Hash, Hasher},
};

use super::{
    Array, Binary, Boolean, Byte, Char, Double, Float, Int, List, Long, Map, Short, SimpleValue,
    Str, Timestamp, UByte, UInt, ULong, UShort, Uuid,
};
use crate::{
    error::DecodeError,
    message::amqp::{
        codec::constants::TypeCode, types::Descriptor, AmqpDecodeError, AmqpDecoder,
        AmqpEncodeError, AmqpEncoder, Symbol,
    },
    utils::TupleMapperSecond,
};
use derive_more::From;

#[cfg(test)]
use fake::Fake;

/// AMQP 1.0 data types
#[derive(Debug, Eq, PartialEq, Hash, Clone)]
#[cfg_attr(test, derive(fake::Dummy))]
pub enum Value {
    Simple(SimpleValue),
    Collection(CollectionValue),
    Described(DescribedValue),
}

impl Value {
    pub fn null() -> Value {
        Value::Simple(SimpleValue::Null)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Simple(SimpleValue::Null))
    }
}

/// A value annotated with a descriptor
#[derive(Debug, Eq, PartialEq, Hash, Clone)]
#[cfg_attr(test, derive(fake::Dummy))]
pub struct DescribedValue {
    descriptor: Descriptor,
    value: Box<Value>,
}

impl DescribedValue {
    pub fn new(descriptor: Descriptor, value: impl Into<Value>) -> Self {
        DescribedValue {
            descriptor,
            value: Box::new(value.into()),
        }
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        *self.value
    }
}

impl AmqpEncoder for DescribedValue {
    fn encoded_size(&self) -> u32 {
        self.descriptor.encoded_size() + self.value.encoded_size()
    }

    fn encode(&self, writer: &mut impl std::io::Write) -> Result<(), AmqpEncodeError> {
        self.descriptor.encode(writer)?;
        self.value.encode(writer)?;
        Ok(())
    }
}

impl AmqpDecoder for DescribedValue {
    fn decode(input: &[u8]) -> Result<(&[u8], Self), AmqpDecodeError> {
        let (input, descriptor) = Descriptor::decode(input)?;
        let (input, value) = Value::decode(input)?;
        Ok((
            input,
            DescribedValue {
                descriptor,
                value: Box::new(value),
            },
        ))
    }
}

#[derive(Debug, Eq, PartialEq, Hash, Clone, From)]
#[cfg_attr(test, derive(fake::Dummy))]
pub enum CollectionValue {
    List(List),
    Map(Map<Value, Value>),
    Array(Array),
}

impl AmqpDecoder for CollectionValue {
    fn decode(input: &[u8]) -> Result<(&[u8], Self), AmqpDecodeError> {
        let (_, code) = TypeCode::decode(input)?;

        match code {
            TypeCode::List0 | TypeCode::List8 | TypeCode::List32 => {
                List::decode(input).map_second(CollectionValue::List)
            }
            TypeCode::Map8 | TypeCode::Map32 => Map::decode(input).map_second(CollectionValue::Map),
            TypeCode::Array8 | TypeCode::Array32 => {
                Array::decode(input).map_second(CollectionValue::Array)
            }
            _ => Err(Self::invalid_type_code(code)),
        }
    }
}

impl AmqpEncoder for CollectionValue {
    fn encoded_size(&self) -> u32 {
        match self {
            CollectionValue::List(list) => list.encoded_size(),
            CollectionValue::Map(map) => map.encoded_size(),
            CollectionValue::Array(array) => array.encoded_size(),
        }
    }

    fn encode(&self, writer: &mut impl std::io::Write) -> Result<(), AmqpEncodeError> {
        match self {
            CollectionValue::List(list) => list.encode(writer),
            CollectionValue::Map(map) => map.encode(writer),
            CollectionValue::Array(array) => array.encode(writer),
        }
    }
}

// Entries are hashed independently and combined with XOR so that two equal
// maps hash the same regardless of iteration order.
impl Hash for Map<Value, Value> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let combined = self.iter().fold(0u64, |acc, (key, value)| {
            let mut hasher = DefaultHasher::new();
            key.hash(&mut hasher);
            value.hash(&mut hasher);
            acc ^ hasher.finish()
        });
        state.write_usize(self.len());
        state.write_u64(combined);
    }
}

impl AmqpDecoder for Value {
    fn decode(input: &[u8]) -> Result<(&[u8], Self), AmqpDecodeError> {
        let (_, code) = TypeCode::decode(input)?;

        match code {
            TypeCode::Described => DescribedValue::decode(input).map_second(Value::Described),
            TypeCode::List0
            | TypeCode::List8
            | TypeCode::List32
            | TypeCode::Map8
            | TypeCode::Map32
            | TypeCode::Array8
            | TypeCode::Array32 => CollectionValue::decode(input).map_second(Value::Collection),

            _ => SimpleValue::decode(input).map_second(Value::Simple),
        }
    }
}

impl AmqpEncoder for Value {
    fn encoded_size(&self) -> u32 {
        match self {
            Value::Simple(simple) => simple.encoded_size(),
            Value::Collection(collection) => collection.encoded_size(),
            Value::Described(described) => described.encoded_size(),
        }
    }

    fn encode(&self, writer: &mut impl std::io::Write) -> Result<(), AmqpEncodeError> {
        match self {
            Value::Simple(simple) => simple.encode(writer),
            Value::Collection(collection) => collection.encode(writer),
            Value::Described(described) => described.encode(writer),
        }
    }
}

impl From<SimpleValue> for Value {
    fn from(value: SimpleValue) -> Self {
        Value::Simple(value)
    }
}

impl From<CollectionValue> for Value {
    fn from(value: CollectionValue) -> Self {
        Value::Collection(value)
    }
}

impl From<DescribedValue> for Value {
    fn from(value: DescribedValue) -> Self {
        Value::Described(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or_else(Value::null, Into::into)
    }
}

macro_rules! impl_simple_value {
    ($type:ty) => {
        impl From<$type> for Value {
            fn from(value: $type) -> Value {
                Value::Simple(value.into())
            }
        }
    };
}
macro_rules! impl_collection_value {
    ($type:ty) => {
        impl From<$type> for Value {
            fn from(value: $type) -> Value {
                Value::Collection(value.into())
            }
        }
    };
}

macro_rules! impl_try_from_simple_value_ref {
    ($type:ty) => {
        impl<'a> TryFrom<&'a Value> for $type {
            type Error = DecodeError;

            fn try_from(value: &'a Value) -> Result<Self, Self::Error> {
                match value {
                    Value::Simple(simple) => <Self as TryFrom<&'a SimpleValue>>::try_from(simple)
                        .map_err(|err| DecodeError::MessageParse(err.to_string())),
                    _ => Err(DecodeError::MessageParse(
                        "Failed to cast Value to simple type".to_string(),
                    )),
                }
            }
        }
    };
}

impl_try_from_simple_value_ref!(&'a Boolean);
impl_try_from_simple_value_ref!(&'a UByte);
impl_try_from_simple_value_ref!(&'a UShort);
impl_try_from_simple_value_ref!(&'a UInt);
impl_try_from_simple_value_ref!(&'a ULong);
impl_try_from_simple_value_ref!(&'a Byte);
impl_try_from_simple_value_ref!(&'a Short);
impl_try_from_simple_value_ref!(&'a Int);
impl_try_from_simple_value_ref!(&'a Long);
impl_try_from_simple_value_ref!(&'a Float);
impl_try_from_simple_value_ref!(&'a Double);
impl_try_from_simple_value_ref!(&'a Char);
impl_try_from_simple_value_ref!(&'a Timestamp);
impl_try_from_simple_value_ref!(&'a Uuid);
impl_try_from_simple_value_ref!(&'a Binary);
impl_try_from_simple_value_ref!(&'a Str);
impl_try_from_simple_value_ref!(&'a Symbol);

impl_simple_value!(Boolean);
impl_simple_value!(UByte);
impl_simple_value!(UShort);
impl_simple_value!(UInt);
impl_simple_value!(ULong);
impl_simple_value!(Byte);
impl_simple_value!(Short);
impl_simple_value!(Int);
impl_simple_value!(Long);
impl_simple_value!(Float);
impl_simple_value!(Double);
impl_simple_value!(Char);
impl_simple_value!(Timestamp);
impl_simple_value!(Uuid);
impl_simple_value!(Binary);
impl_simple_value!(Str);
impl_simple_value!(Symbol);
impl_simple_value!(&str);

impl_collection_value!(List);
impl_collection_value!(Map<Value, Value>);
impl_collection_value!(Array);

#[cfg(test)]
mod tests {
    use std::{
        collections::hash_map::DefaultHasher,
        convert::TryInto,
        hash::{Hash, Hasher},
    };

    use pretty_assertions::assert_eq;

    use super::{DescribedValue, Value};
    use crate::message::amqp::{
        tests::type_encode_decode_test_fuzzy,
        types::{Descriptor, List, Map},
        AmqpDecoder, AmqpEncoder,
    };

    fn hash_of(value: &impl Hash) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn value_encode_decode_test() {
        type_encode_decode_test_fuzzy::<Value>()
    }

    #[test]
    fn described_value_test() {
        let value = DescribedValue::new(Descriptor::Ulong(0x77), "hello");
        let mut buffer = vec![];
        value.encode(&mut buffer).unwrap();

        assert_eq!(buffer.len() as u32, value.encoded_size());
        assert_eq!(&[0x00, 0x53, 0x77, 0xa1, 0x05], &buffer[..5]);

        let (remaining, decoded) = Value::decode(&buffer).unwrap();
        assert!(remaining.is_empty());
        assert_eq!(Value::Described(value), decoded);
    }

    #[test]
    fn map_hash_is_order_independent_test() {
        let mut first: Map<Value, Value> = Map::new();
        let mut second: Map<Value, Value> = Map::new();
        for idx in 0..20 {
            first.insert(Value::from(idx as i32), Value::from(format!("v{}", idx)));
        }
        for idx in (0..20).rev() {
            second.insert(Value::from(idx as i32), Value::from(format!("v{}", idx)));
        }

        assert_eq!(first, second);
        assert_eq!(hash_of(&first), hash_of(&second));
    }

    #[test]
    fn option_into_value_test() {
        assert!(Value::from(None::<u32>).is_null());
        assert_eq!(Value::from(7u32), Value::from(Some(7u32)));
    }

    #[test]
    fn value_try_into_ref_test() {
        let mut list = List::new();
        list.push("test");
        let value = Value::from(list);
        let as_str: Result<&String, _> = (&value).try_into();
        assert!(as_str.is_err());

        let value = Value::from(42i64);
        let long: &i64 = (&value).try_into().unwrap();
        assert_eq!(42, *long);
    }
}
