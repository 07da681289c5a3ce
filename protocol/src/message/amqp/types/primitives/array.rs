use byteorder::{BigEndian, WriteBytesExt};

use crate::{
    codec::decoder::{read_exact, read_u32, read_u8},
    message::amqp::{
        codec::constants::TypeCode, AmqpDecodeError, AmqpDecoder, AmqpEncodeError, AmqpEncoder,
    },
};

use super::{SimpleValue, Value};

/// Sequence of values sharing a single constructor
#[derive(Debug, PartialEq, Eq, Clone, Hash, Default)]
pub struct Array(pub Vec<Value>);

impl Array {
    pub fn new() -> Self {
        Self(vec![])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Constructor shared by every element, the widest form of the element type
    fn element_code(&self) -> Result<TypeCode, AmqpEncodeError> {
        let code = match self.0.first() {
            None => return Ok(TypeCode::Null),
            Some(Value::Simple(simple)) => wide_code(simple),
            Some(other) => {
                return Err(AmqpEncodeError::Unsupported(format!(
                    "Array element {:?} is not a primitive",
                    other
                )))
            }
        };
        for elem in &self.0 {
            match elem {
                Value::Simple(simple) if wide_code(simple) == code => {}
                _ => {
                    return Err(AmqpEncodeError::Unsupported(format!(
                        "Array elements must share the type code {:?}",
                        code
                    )))
                }
            }
        }
        Ok(code)
    }

    fn content_size(&self) -> u32 {
        self.0
            .iter()
            .map(|elem| match elem {
                Value::Simple(simple) => element_size(simple),
                other => other.encoded_size(),
            })
            .sum()
    }
}

fn wide_code(value: &SimpleValue) -> TypeCode {
    match value {
        SimpleValue::Null => TypeCode::Null,
        SimpleValue::Boolean(_) => TypeCode::Boolean,
        SimpleValue::Ubyte(_) => TypeCode::UByte,
        SimpleValue::Ushort(_) => TypeCode::UShort,
        SimpleValue::Uint(_) => TypeCode::UInt,
        SimpleValue::Ulong(_) => TypeCode::ULong,
        SimpleValue::Byte(_) => TypeCode::Byte,
        SimpleValue::Short(_) => TypeCode::Short,
        SimpleValue::Int(_) => TypeCode::Int,
        SimpleValue::Long(_) => TypeCode::Long,
        SimpleValue::Float(_) => TypeCode::Float,
        SimpleValue::Double(_) => TypeCode::Double,
        SimpleValue::Decimal32(_) => TypeCode::Decimal32,
        SimpleValue::Decimal64(_) => TypeCode::Decimal64,
        SimpleValue::Decimal128(_) => TypeCode::Decimal128,
        SimpleValue::Char(_) => TypeCode::Char,
        SimpleValue::Timestamp(_) => TypeCode::Timestamp,
        SimpleValue::Uuid(_) => TypeCode::Uuid,
        SimpleValue::Binary(_) => TypeCode::Binary32,
        SimpleValue::String(_) => TypeCode::String32,
        SimpleValue::Symbol(_) => TypeCode::Symbol32,
    }
}

/// Size of an element body once the constructor is stripped
fn element_size(value: &SimpleValue) -> u32 {
    match value {
        SimpleValue::Null => 0,
        SimpleValue::Boolean(_) => 1,
        SimpleValue::Uint(_) => 4,
        SimpleValue::Ulong(_) => 8,
        SimpleValue::Int(_) => 4,
        SimpleValue::Long(_) => 8,
        SimpleValue::Binary(bytes) => 4 + bytes.len() as u32,
        SimpleValue::String(string) => 4 + string.len() as u32,
        SimpleValue::Symbol(symbol) => 4 + symbol.len() as u32,
        other => other.encoded_size() - 1,
    }
}

fn encode_element(
    value: &SimpleValue,
    writer: &mut impl std::io::Write,
) -> Result<(), AmqpEncodeError> {
    match value {
        SimpleValue::Null => {}
        SimpleValue::Boolean(b) => writer.write_u8(u8::from(*b))?,
        SimpleValue::Uint(v) => writer.write_u32::<BigEndian>(*v)?,
        SimpleValue::Ulong(v) => writer.write_u64::<BigEndian>(*v)?,
        SimpleValue::Int(v) => writer.write_i32::<BigEndian>(*v)?,
        SimpleValue::Long(v) => writer.write_i64::<BigEndian>(*v)?,
        SimpleValue::Binary(bytes) => {
            writer.write_u32::<BigEndian>(bytes.len() as u32)?;
            writer.write_all(bytes)?;
        }
        SimpleValue::String(string) => {
            writer.write_u32::<BigEndian>(string.len() as u32)?;
            writer.write_all(string.as_bytes())?;
        }
        SimpleValue::Symbol(symbol) => {
            writer.write_u32::<BigEndian>(symbol.len() as u32)?;
            writer.write_all(symbol.as_bytes())?;
        }
        // fixed width types always use their single constructor
        other => {
            let mut buffer = Vec::with_capacity(other.encoded_size() as usize);
            other.encode(&mut buffer)?;
            writer.write_all(&buffer[1..])?;
        }
    }
    Ok(())
}

impl AmqpEncoder for Array {
    fn encoded_size(&self) -> u32 {
        let content_size = self.content_size();
        // constructor byte plus count
        if content_size + 2 > u8::MAX as u32 || self.0.len() > u8::MAX as usize {
            1 + 8 + 1 + content_size
        } else {
            1 + 2 + 1 + content_size
        }
    }

    fn encode(&self, writer: &mut impl std::io::Write) -> Result<(), AmqpEncodeError> {
        let code = self.element_code()?;
        let content_size = self.content_size();

        if content_size + 2 > u8::MAX as u32 || self.0.len() > u8::MAX as usize {
            TypeCode::Array32.encode(writer)?;
            writer.write_u32::<BigEndian>(content_size + 5)?;
            writer.write_u32::<BigEndian>(self.0.len() as u32)?;
        } else {
            TypeCode::Array8.encode(writer)?;
            writer.write_u8((content_size + 2) as u8)?;
            writer.write_u8(self.0.len() as u8)?;
        }
        code.encode(writer)?;

        for elem in &self.0 {
            if let Value::Simple(simple) = elem {
                encode_element(simple, writer)?;
            }
        }
        Ok(())
    }
}

/// Length of the element constructor at the start of `input`, which is either
/// a single type code or a descriptor followed by one
fn constructor_len(input: &[u8]) -> Result<usize, AmqpDecodeError> {
    let (rest, code) = TypeCode::decode(input)?;
    if code != TypeCode::Described {
        return Ok(1);
    }
    let (after_descriptor, _) = Value::decode(rest)?;
    let descriptor_len = rest.len() - after_descriptor.len();
    Ok(1 + descriptor_len + constructor_len(after_descriptor)?)
}

impl AmqpDecoder for Array {
    fn decode(input: &[u8]) -> Result<(&[u8], Self), AmqpDecodeError> {
        let (input, code) = TypeCode::decode(input)?;

        let (input, count) = match code {
            TypeCode::Array8 => {
                let (input, _) = read_u8(input)?;
                let (input, count) = read_u8(input)?;
                (input, u32::from(count))
            }
            TypeCode::Array32 => {
                let (input, _) = read_u32(input)?;
                read_u32(input)?
            }
            _ => return Err(Self::invalid_type_code(code)),
        };

        let (mut input, constructor) = read_exact(input, constructor_len(input)?)?;

        // every element is decoded as if it carried the shared constructor
        let mut scratch = Vec::with_capacity(constructor.len() + input.len());
        let mut array = Array::new();
        for _ in 0..count {
            scratch.clear();
            scratch.extend_from_slice(constructor);
            scratch.extend_from_slice(input);

            let (rest, elem) = Value::decode(&scratch)?;
            let consumed = scratch.len() - rest.len() - constructor.len();
            array.0.push(elem);
            input = &input[consumed..];
        }

        Ok((input, array))
    }
}

#[cfg(test)]
mod tests {
    use std::ops::Range;

    use fake::{Dummy, Fake, Faker};
    use pretty_assertions::assert_eq;

    use super::Array;
    use crate::message::amqp::{
        tests::type_encode_decode_test_fuzzy,
        types::{List, Symbol, Value},
        AmqpDecoder, AmqpEncoder,
    };

    const DEFAULT_LEN_RANGE: Range<usize> = 0..10;

    impl Dummy<Faker> for Array {
        fn dummy_with_rng<R: fake::rand::Rng + ?Sized>(config: &Faker, rng: &mut R) -> Self {
            let len: usize = DEFAULT_LEN_RANGE.fake_with_rng(rng);
            let mut array = Array::new();
            for _ in 0..len {
                let value: i64 = config.fake_with_rng(rng);
                array.0.push(Value::from(value));
            }
            array
        }
    }

    #[test]
    fn array_encode_decode_test() {
        type_encode_decode_test_fuzzy::<Array>()
    }

    #[test]
    fn array_of_symbols_test() {
        let array = Array(vec![
            Value::from(Symbol::from("a")),
            Value::from(Symbol::from("bc")),
        ]);
        let mut buffer = vec![];
        array.encode(&mut buffer).unwrap();

        assert_eq!(
            vec![0xe0, 0x0d, 0x02, 0xb3, 0, 0, 0, 1, b'a', 0, 0, 0, 2, b'b', b'c'],
            buffer
        );
        assert_eq!(buffer.len() as u32, array.encoded_size());

        let (remaining, decoded) = Array::decode(&buffer).unwrap();
        assert!(remaining.is_empty());
        assert_eq!(array, decoded);
    }

    #[test]
    fn array_with_compact_constructor_test() {
        // array8 of three smalluint
        let buffer = [0xe0, 0x05, 0x03, 0x52, 0x01, 0x02, 0x03, 0xff];
        let (remaining, decoded) = Array::decode(&buffer).unwrap();

        assert_eq!(&[0xff], remaining);
        assert_eq!(
            Array(vec![Value::from(1u32), Value::from(2u32), Value::from(3u32)]),
            decoded
        );
    }

    #[test]
    fn array_rejects_mixed_elements_test() {
        let array = Array(vec![Value::from(1u32), Value::from(List::new())]);
        assert!(array.encode(&mut Vec::<u8>::new()).is_err());

        let array = Array(vec![Value::from(1u32), Value::from("one")]);
        assert!(array.encode(&mut Vec::<u8>::new()).is_err());
    }
}
