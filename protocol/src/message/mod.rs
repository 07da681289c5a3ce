use std::convert::TryFrom;
use std::sync::Arc;

mod amqp;
mod builder;

use crate::codec::{Decoder, Encoder};
use crate::error::{DecodeError, EncodeError};

use amqp::AmqpMessage;

pub use self::amqp::{
    AmqpDecodeError, AmqpDecoder, AmqpEncodeError, AmqpEncoder, Array, Binary, CollectionValue,
    Decimal128, Decimal32, Decimal64, DescribedValue, Descriptor, Double, Float, List, Map,
    MessageBody, SimpleValue, Symbol, Timestamp, TypeCode, Uuid, Value,
};

pub use self::builder::MessageBuilder;

/// API for inbound and outbound messages
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Message(Arc<AmqpMessage>);

impl Encoder for Message {
    fn encoded_size(&self) -> u32 {
        self.0.encoded_size()
    }

    fn encode(&self, writer: &mut impl std::io::Write) -> Result<(), EncodeError> {
        self.0.encode(writer)?;
        Ok(())
    }
}

impl Message {
    /// Builder for creating [`Message`]
    pub fn builder() -> MessageBuilder {
        MessageBuilder(AmqpMessage::default())
    }

    /// Extract a value as reference from the `amqp-value` section of the body if present
    pub fn value_ref<'a, T>(&'a self) -> Result<Option<T>, DecodeError>
    where
        T: TryFrom<&'a Value, Error = DecodeError>,
    {
        self.0.body().value().map(|value| T::try_from(value)).transpose()
    }

    /// The `amqp-value` body section if present
    pub fn value(&self) -> Option<&Value> {
        self.0.body().value()
    }

    /// Get the data associated to the message if any
    pub fn data(&self) -> Option<&[u8]> {
        self.0.body().data().map(|data| data.as_slice())
    }

    /// Full body of the message
    pub fn body(&self) -> &MessageBody {
        self.0.body()
    }

    /// Non-body sections preceding the body, undecoded
    pub fn sections(&self) -> &[DescribedValue] {
        self.0.sections()
    }

    /// Encode the message into a fresh buffer
    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        let mut buffer = Vec::with_capacity(self.encoded_size() as usize);
        self.encode(&mut buffer)?;
        Ok(buffer)
    }
}

impl Decoder for Message {
    fn decode(input: &[u8]) -> Result<(&[u8], Self), DecodeError> {
        AmqpMessage::decode(input)
            .map(|(remaining, message)| (remaining, Message(Arc::new(message))))
            .map_err(DecodeError::from)
    }
}
