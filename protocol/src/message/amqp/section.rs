use crate::{
    message::amqp::codec::constants::MESSAGE_BODY_DATA,
    message::amqp::{types::Binary, AmqpDecoder},
    utils::TupleMapperSecond,
};

use super::{
    codec::constants::{
        MESSAGE_ANNOTATIONS, MESSAGE_APPLICATION_PROPERTIES, MESSAGE_BODY_SEQUENCE,
        MESSAGE_BODY_VALUE, MESSAGE_DELIVERY_ANNOTATIONS, MESSAGE_FOOTER, MESSAGE_HEADER,
        MESSAGE_PROPERTIES,
    },
    types::{AmqpSequence, AmqpValue, DescribedValue, Descriptor, Value},
    AmqpDecodeError,
};

/// A single section of a bare or annotated message.
///
/// Only the body sections are interpreted, the others are kept as the raw
/// described value so they survive a decode/encode cycle untouched.
#[derive(Clone, Debug, PartialEq)]
pub enum MessageSection {
    Data(Binary),
    AmqpSequence(AmqpSequence),
    AmqpValue(AmqpValue),
    Footer(DescribedValue),
    Other(DescribedValue),
}

/// Maps symbolic section descriptors to their numeric form
fn numeric_descriptor(descriptor: Descriptor) -> Descriptor {
    let code = match &descriptor {
        Descriptor::Symbol(symbol) => match symbol.as_str() {
            "amqp:header:list" => 0x70,
            "amqp:delivery-annotations:map" => 0x71,
            "amqp:message-annotations:map" => 0x72,
            "amqp:properties:list" => 0x73,
            "amqp:application-properties:map" => 0x74,
            "amqp:data:binary" => 0x75,
            "amqp:amqp-sequence:list" => 0x76,
            "amqp:amqp-value:*" => 0x77,
            "amqp:footer:map" => 0x78,
            _ => return descriptor,
        },
        Descriptor::Ulong(_) => return descriptor,
    };
    Descriptor::Ulong(code)
}

impl AmqpDecoder for MessageSection {
    fn decode(input: &[u8]) -> Result<(&[u8], Self), AmqpDecodeError> {
        let (remaining, described) = Descriptor::decode(input)?;

        match numeric_descriptor(described) {
            MESSAGE_BODY_DATA => Binary::decode(remaining).map_second(MessageSection::Data),
            MESSAGE_BODY_VALUE => Value::decode(remaining).map_second(MessageSection::AmqpValue),
            MESSAGE_BODY_SEQUENCE => {
                AmqpSequence::decode(remaining).map_second(MessageSection::AmqpSequence)
            }
            MESSAGE_FOOTER => DescribedValue::decode(input).map_second(MessageSection::Footer),
            MESSAGE_HEADER
            | MESSAGE_DELIVERY_ANNOTATIONS
            | MESSAGE_ANNOTATIONS
            | MESSAGE_PROPERTIES
            | MESSAGE_APPLICATION_PROPERTIES => {
                DescribedValue::decode(input).map_second(MessageSection::Other)
            }
            descriptor => Err(AmqpDecodeError::InvalidDescriptor(format!(
                "Invalid section {:?}",
                descriptor
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::MessageSection;
    use crate::message::amqp::{
        types::{DescribedValue, Descriptor, List, Symbol, Value},
        AmqpDecodeError, AmqpDecoder, AmqpEncoder,
    };

    #[test]
    fn symbolic_value_section_test() {
        let section = DescribedValue::new(
            Descriptor::from(Symbol::from("amqp:amqp-value:*")),
            Value::from(42u64),
        );
        let mut buffer = vec![];
        section.encode(&mut buffer).unwrap();

        let (remaining, decoded) = MessageSection::decode(&buffer).unwrap();
        assert!(remaining.is_empty());
        assert_eq!(MessageSection::AmqpValue(Value::from(42u64)), decoded);
    }

    #[test]
    fn header_section_kept_raw_test() {
        let mut fields = List::new();
        fields.push(true);
        let section = DescribedValue::new(Descriptor::Ulong(0x70), fields);
        let mut buffer = vec![];
        section.encode(&mut buffer).unwrap();

        let (_, decoded) = MessageSection::decode(&buffer).unwrap();
        assert_eq!(MessageSection::Other(section), decoded);
    }

    #[test]
    fn unknown_section_test() {
        let section = DescribedValue::new(Descriptor::Ulong(0x10), List::new());
        let mut buffer = vec![];
        section.encode(&mut buffer).unwrap();

        assert!(matches!(
            MessageSection::decode(&buffer),
            Err(AmqpDecodeError::InvalidDescriptor(_))
        ));
    }
}
