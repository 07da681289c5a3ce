use super::body::MessageBody;
use super::codec::AmqpEncoder;
use super::error::AmqpEncodeError;
use super::section::MessageSection;
use super::types::DescribedValue;
use super::{AmqpDecodeError, AmqpDecoder};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    sections: Vec<DescribedValue>,
    body: MessageBody,
    footer: Option<DescribedValue>,
}

impl Message {
    /// Message body
    pub fn body(&self) -> &MessageBody {
        &self.body
    }

    pub fn set_body<F>(&mut self, f: F) -> &mut Self
    where
        F: FnOnce(&mut MessageBody),
    {
        f(&mut self.body);
        self
    }

    /// Sections preceding the body, in wire order
    pub fn sections(&self) -> &[DescribedValue] {
        &self.sections
    }

    pub fn push_section(&mut self, section: DescribedValue) -> &mut Self {
        self.sections.push(section);
        self
    }
}

impl AmqpDecoder for Message {
    fn decode(input: &[u8]) -> Result<(&[u8], Self), AmqpDecodeError> {
        let mut message = Message::default();
        let mut input = input;
        loop {
            if input.is_empty() {
                break;
            }
            let (inner, sec) = MessageSection::decode(input)?;
            input = inner;
            match sec {
                MessageSection::Other(val) => {
                    message.sections.push(val);
                }
                MessageSection::Footer(val) => {
                    message.footer = Some(val);
                }
                // body
                MessageSection::AmqpSequence(val) => {
                    message.body.sequence.push(val);
                }
                MessageSection::AmqpValue(val) => {
                    message.body.value = Some(val);
                }
                MessageSection::Data(val) => {
                    message.body.data.push(val);
                }
            }
        }
        Ok((input, message))
    }
}

impl AmqpEncoder for Message {
    fn encoded_size(&self) -> u32 {
        let mut size = self.body.encoded_size();

        size += self
            .sections
            .iter()
            .map(AmqpEncoder::encoded_size)
            .sum::<u32>();
        if let Some(ref f) = self.footer {
            size += f.encoded_size();
        }

        size
    }

    fn encode(&self, writer: &mut impl std::io::Write) -> Result<(), AmqpEncodeError> {
        for section in &self.sections {
            section.encode(writer)?;
        }

        self.body.encode(writer)?;

        if let Some(ref f) = self.footer {
            f.encode(writer)?;
        }

        Ok(())
    }
}
