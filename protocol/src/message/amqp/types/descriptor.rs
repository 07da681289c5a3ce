use super::primitives::ULong;
use super::symbol::Symbol;
use crate::message::amqp::codec::constants::TypeCode;
use crate::message::amqp::codec::{AmqpDecoder, AmqpEncoder};
use crate::message::amqp::error::{AmqpDecodeError, AmqpEncodeError};
use crate::utils::TupleMapperSecond;

#[cfg(test)]
use fake::Fake;

#[derive(Debug, PartialEq, Eq, Clone, Hash)]
#[cfg_attr(test, derive(fake::Dummy))]
pub enum Descriptor {
    Ulong(u64),
    Symbol(Symbol),
}

impl Descriptor {
    /// Numeric code of the descriptor, if it is not symbolic
    pub fn code(&self) -> Option<u64> {
        match self {
            Descriptor::Ulong(code) => Some(*code),
            Descriptor::Symbol(_) => None,
        }
    }
}

impl From<u64> for Descriptor {
    fn from(code: u64) -> Self {
        Descriptor::Ulong(code)
    }
}

impl From<Symbol> for Descriptor {
    fn from(symbol: Symbol) -> Self {
        Descriptor::Symbol(symbol)
    }
}

impl AmqpEncoder for Descriptor {
    fn encoded_size(&self) -> u32 {
        match *self {
            Descriptor::Ulong(v) => 1 + v.encoded_size(),
            Descriptor::Symbol(ref v) => 1 + v.encoded_size(),
        }
    }

    fn encode(&self, writer: &mut impl std::io::Write) -> Result<(), AmqpEncodeError> {
        TypeCode::Described.encode(writer)?;
        match *self {
            Descriptor::Ulong(v) => v.encode(writer),
            Descriptor::Symbol(ref v) => v.encode(writer),
        }
    }
}

impl AmqpDecoder for Descriptor {
    fn decode(input: &[u8]) -> Result<(&[u8], Self), AmqpDecodeError> {
        match TypeCode::decode(input)? {
            (input, TypeCode::Described) => {
                let (_, code) = TypeCode::decode(input)?;
                match code {
                    TypeCode::ULong | TypeCode::ULong0 | TypeCode::ULongSmall => {
                        ULong::decode(input).map_second(Descriptor::Ulong)
                    }
                    TypeCode::Symbol8 | TypeCode::Symbol32 => {
                        Symbol::decode(input).map_second(Descriptor::Symbol)
                    }
                    _ => Err(Self::invalid_type_code(code)),
                }
            }
            (_, code) => Err(Self::invalid_type_code(code)),
        }
    }
}
