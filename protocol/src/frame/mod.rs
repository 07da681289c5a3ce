//! AMQP 1.0 transport framing: protocol headers, frames and the
//! performatives they carry.
use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};

use crate::{
    codec::{
        check_len,
        decoder::{read_exact, read_u16, read_u32, read_u8},
        Decoder, Encoder,
    },
    error::{DecodeError, EncodeError},
    message::{AmqpDecoder, AmqpEncoder, Value},
    utils::TupleMapperSecond,
};

mod fields;
pub mod performative;
pub mod sasl;

pub use fields::{symbol_array, symbols, Composite, FromField, Fields};
pub use performative::*;
pub use sasl::*;

pub const FRAME_HEADER_SIZE: u32 = 8;
/// Smallest max-frame-size a peer may advertise
pub const MIN_MAX_FRAME_SIZE: u32 = 512;

const FRAME_TYPE_AMQP: u8 = 0x00;
const FRAME_TYPE_SASL: u8 = 0x01;
const DOFF: u8 = 2;

/// Protocol header exchanged before any frame of a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolHeader {
    Amqp,
    Sasl,
}

impl ProtocolHeader {
    pub fn as_bytes(&self) -> [u8; 8] {
        match self {
            ProtocolHeader::Amqp => *b"AMQP\x00\x01\x00\x00",
            ProtocolHeader::Sasl => *b"AMQP\x03\x01\x00\x00",
        }
    }
}

impl Encoder for ProtocolHeader {
    fn encoded_size(&self) -> u32 {
        8
    }

    fn encode(&self, writer: &mut impl Write) -> Result<(), EncodeError> {
        writer.write_all(&self.as_bytes())?;
        Ok(())
    }
}

impl Decoder for ProtocolHeader {
    fn decode(input: &[u8]) -> Result<(&[u8], Self), DecodeError> {
        let (input, bytes) = read_exact(input, 8)?;
        match bytes {
            b"AMQP\x00\x01\x00\x00" => Ok((input, ProtocolHeader::Amqp)),
            b"AMQP\x03\x01\x00\x00" => Ok((input, ProtocolHeader::Sasl)),
            other => Err(DecodeError::MessageParse(format!(
                "Unsupported protocol header {:?}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameBody {
    /// Empty AMQP frame, used as a heartbeat
    Empty,
    Amqp {
        performative: Performative,
        payload: Vec<u8>,
    },
    Sasl(SaslFrame),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub channel: u16,
    pub body: FrameBody,
}

impl Frame {
    pub fn new(channel: u16, performative: Performative) -> Frame {
        Frame {
            channel,
            body: FrameBody::Amqp {
                performative,
                payload: vec![],
            },
        }
    }

    pub fn with_payload(channel: u16, performative: Performative, payload: Vec<u8>) -> Frame {
        Frame {
            channel,
            body: FrameBody::Amqp {
                performative,
                payload,
            },
        }
    }

    pub fn sasl(frame: SaslFrame) -> Frame {
        Frame {
            channel: 0,
            body: FrameBody::Sasl(frame),
        }
    }

    pub fn empty() -> Frame {
        Frame {
            channel: 0,
            body: FrameBody::Empty,
        }
    }

    fn frame_type(&self) -> u8 {
        match self.body {
            FrameBody::Sasl(_) => FRAME_TYPE_SASL,
            _ => FRAME_TYPE_AMQP,
        }
    }

    fn body_value(&self) -> Option<Value> {
        match &self.body {
            FrameBody::Empty => None,
            FrameBody::Amqp { performative, .. } => Some(performative.to_value()),
            FrameBody::Sasl(sasl) => Some(sasl.to_value()),
        }
    }
}

impl Encoder for Frame {
    fn encoded_size(&self) -> u32 {
        let payload = match &self.body {
            FrameBody::Amqp { payload, .. } => payload.len() as u32,
            _ => 0,
        };
        FRAME_HEADER_SIZE
            + self
                .body_value()
                .map_or(0, |value| AmqpEncoder::encoded_size(&value))
            + payload
    }

    fn encode(&self, writer: &mut impl Write) -> Result<(), EncodeError> {
        writer.write_u32::<BigEndian>(self.encoded_size())?;
        writer.write_u8(DOFF)?;
        writer.write_u8(self.frame_type())?;
        writer.write_u16::<BigEndian>(self.channel)?;
        if let Some(value) = self.body_value() {
            AmqpEncoder::encode(&value, writer)?;
        }
        if let FrameBody::Amqp { payload, .. } = &self.body {
            writer.write_all(payload)?;
        }
        Ok(())
    }
}

impl Decoder for Frame {
    fn decode(input: &[u8]) -> Result<(&[u8], Self), DecodeError> {
        let (_, size) = read_u32(input)?;
        if size < FRAME_HEADER_SIZE {
            return Err(DecodeError::MessageParse(format!(
                "Frame size {} smaller than its header",
                size
            )));
        }
        check_len(input, size as usize)?;
        let (frame, remaining) = input.split_at(size as usize);

        let (frame, _) = read_u32(frame)?;
        let (frame, doff) = read_u8(frame)?;
        let (frame, frame_type) = read_u8(frame)?;
        let (frame, channel) = read_u16(frame)?;

        let extended_header = (doff as usize * 4).checked_sub(FRAME_HEADER_SIZE as usize);
        let body = match extended_header {
            Some(len) if len <= frame.len() => &frame[len..],
            _ => {
                return Err(DecodeError::MessageParse(format!(
                    "Invalid data offset {}",
                    doff
                )))
            }
        };

        let body = match frame_type {
            FRAME_TYPE_AMQP if body.is_empty() => FrameBody::Empty,
            FRAME_TYPE_AMQP => {
                let (payload, value) = Value::decode(body)?;
                FrameBody::Amqp {
                    performative: Performative::from_value(&value)?,
                    payload: payload.to_vec(),
                }
            }
            FRAME_TYPE_SASL => {
                let (_, value) = Value::decode(body)?;
                FrameBody::Sasl(SaslFrame::from_value(&value)?)
            }
            other => return Err(DecodeError::InvalidFrameType(other)),
        };

        Ok((remaining, Frame { channel, body }))
    }
}

/// Unit read from or written to the socket: a protocol header during the
/// handshake, frames afterwards
#[derive(Debug, Clone, PartialEq)]
pub enum Transmission {
    Header(ProtocolHeader),
    Frame(Frame),
}

impl Encoder for Transmission {
    fn encoded_size(&self) -> u32 {
        match self {
            Transmission::Header(header) => header.encoded_size(),
            Transmission::Frame(frame) => frame.encoded_size(),
        }
    }

    fn encode(&self, writer: &mut impl Write) -> Result<(), EncodeError> {
        match self {
            Transmission::Header(header) => header.encode(writer),
            Transmission::Frame(frame) => frame.encode(writer),
        }
    }
}

impl Decoder for Transmission {
    fn decode(input: &[u8]) -> Result<(&[u8], Self), DecodeError> {
        check_len(input, 4)?;
        // a frame can never start with these bytes as its size would exceed any
        // sane max-frame-size
        if input.starts_with(b"AMQP") {
            ProtocolHeader::decode(input).map_second(Transmission::Header)
        } else {
            Frame::decode(input).map_second(Transmission::Frame)
        }
    }
}

impl From<Frame> for Transmission {
    fn from(frame: Frame) -> Self {
        Transmission::Frame(frame)
    }
}

impl From<ProtocolHeader> for Transmission {
    fn from(header: ProtocolHeader) -> Self {
        Transmission::Header(header)
    }
}
