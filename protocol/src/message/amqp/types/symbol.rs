use std::{fmt, ops::Deref};

use crate::{
    codec::decoder::{read_exact, read_u32, read_u8},
    message::amqp::{
        codec::{constants::TypeCode, AmqpDecoder, AmqpEncoder},
        error::{AmqpDecodeError, AmqpEncodeError},
    },
};

use byteorder::{BigEndian, WriteBytesExt};
#[cfg(test)]
use fake::Fake;

use super::Str;

/// Symbolic value, textually a string but encoded with its own type code
#[derive(Debug, Clone, Eq, PartialEq, Hash, Default)]
#[cfg_attr(test, derive(fake::Dummy))]
pub struct Symbol(Str);

impl Symbol {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for Symbol {
    type Target = Str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AmqpEncoder for Symbol {
    fn encoded_size(&self) -> u32 {
        let length = self.0.len() as u32;
        let size = if length > u8::MAX as u32 { 5 } else { 2 };
        size + length
    }

    fn encode(&self, writer: &mut impl std::io::Write) -> Result<(), AmqpEncodeError> {
        let length = self.0.len();
        if length > u8::MAX as usize {
            TypeCode::Symbol32.encode(writer)?;
            writer.write_u32::<BigEndian>(length as u32)?;
        } else {
            TypeCode::Symbol8.encode(writer)?;
            writer.write_u8(length as u8)?;
        }

        writer.write_all(self.0.as_bytes())?;
        Ok(())
    }
}
impl AmqpDecoder for Symbol {
    fn decode(input: &[u8]) -> Result<(&[u8], Self), AmqpDecodeError> {
        let (input, code) = TypeCode::decode(input)?;

        let (input, len) = match code {
            TypeCode::Symbol8 => read_u8(input).map(|(input, len)| (input, len as usize))?,
            TypeCode::Symbol32 => read_u32(input).map(|(input, len)| (input, len as usize))?,
            _ => return Err(Self::invalid_type_code(code)),
        };
        let (input, bytes) = read_exact(input, len)?;
        Ok((input, Symbol(String::from_utf8(bytes.to_vec())?)))
    }
}

impl From<Str> for Symbol {
    fn from(string: Str) -> Self {
        Symbol(string)
    }
}

impl From<&str> for Symbol {
    fn from(string: &str) -> Self {
        Symbol(string.to_string())
    }
}
