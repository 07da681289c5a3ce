use byteorder::{BigEndian, WriteBytesExt};

use crate::{
    codec::decoder::{read_u32, read_u8},
    message::amqp::{
        codec::constants::TypeCode, AmqpDecodeError, AmqpDecoder, AmqpEncodeError, AmqpEncoder,
    },
    utils::TupleMapperSecond,
};

use super::Value;

#[derive(Debug, PartialEq, Eq, Clone, Hash, Default)]
pub struct List(pub Vec<Value>);

impl List {
    pub fn new() -> Self {
        Self(vec![])
    }
    pub fn push(&mut self, elem: impl Into<Value>) {
        self.0.push(elem.into())
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

    fn content_size(&self) -> u32 {
        self.0.iter().fold(0, |acc, item| acc + item.encoded_size())
    }
}

impl From<Vec<Value>> for List {
    fn from(values: Vec<Value>) -> Self {
        List(values)
    }
}

impl IntoIterator for List {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl AmqpEncoder for List {
    fn encoded_size(&self) -> u32 {
        if self.0.is_empty() {
            return 1;
        }
        let content_size = self.content_size();

        let header = if content_size + 1 > u8::MAX as u32 || self.0.len() > u8::MAX as usize {
            9
        } else {
            3
        };

        header + content_size
    }

    fn encode(&self, writer: &mut impl std::io::Write) -> Result<(), AmqpEncodeError> {
        if self.0.is_empty() {
            return TypeCode::List0.encode(writer);
        }
        let content_size = self.content_size();

        if content_size + 1 > u8::MAX as u32 || self.0.len() > u8::MAX as usize {
            TypeCode::List32.encode(writer)?;
            writer.write_u32::<BigEndian>(content_size + 4)?;
            writer.write_u32::<BigEndian>(self.0.len() as u32)?;
        } else {
            TypeCode::List8.encode(writer)?;
            writer.write_u8((content_size + 1) as u8)?;
            writer.write_u8(self.0.len() as u8)?;
        }

        for item in &self.0 {
            item.encode(writer)?;
        }
        Ok(())
    }
}

impl AmqpDecoder for List {
    fn decode(input: &[u8]) -> Result<(&[u8], Self), AmqpDecodeError> {
        let (input, code) = TypeCode::decode(input)?;

        let (mut input, count) = match code {
            TypeCode::List0 => return Ok((input, List::new())),
            TypeCode::List8 => {
                let (input, _) = read_u8(input)?;
                read_u8(input)
                    .map_second(u32::from)
                    .map_err(AmqpDecodeError::from)?
            }
            TypeCode::List32 => {
                let (input, _) = read_u32(input)?;
                read_u32(input).map_err(AmqpDecodeError::from)?
            }
            _ => return Err(Self::invalid_type_code(code)),
        };

        let mut list = List::new();

        for _ in 0..count {
            let (input_inner, elem) = Value::decode(input)?;
            list.0.push(elem);
            input = input_inner;
        }

        Ok((input, list))
    }
}
