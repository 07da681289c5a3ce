use std::string::FromUtf8Error;

use crate::message::{AmqpDecodeError, AmqpEncodeError};

/// Not enough bytes in the input, carries the number of bytes needed
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct IncompleteError(pub usize);

#[derive(Debug)]
pub enum DecodeError {
    Incomplete(usize),
    InvalidFormatCode(u8),
    InvalidFrameType(u8),
    InvalidDescriptor(String),
    MessageParse(String),
    Utf8Error(FromUtf8Error),
}

#[derive(Debug)]
pub enum EncodeError {
    Io(std::io::Error),
    Unsupported(String),
}

impl DecodeError {
    pub fn is_incomplete(&self) -> bool {
        matches!(self, DecodeError::Incomplete(_))
    }
}

impl From<std::io::Error> for EncodeError {
    fn from(err: std::io::Error) -> Self {
        EncodeError::Io(err)
    }
}

impl From<IncompleteError> for DecodeError {
    fn from(err: IncompleteError) -> Self {
        DecodeError::Incomplete(err.0)
    }
}

impl From<FromUtf8Error> for DecodeError {
    fn from(err: FromUtf8Error) -> Self {
        DecodeError::Utf8Error(err)
    }
}

impl From<AmqpEncodeError> for EncodeError {
    fn from(err: AmqpEncodeError) -> Self {
        match err {
            AmqpEncodeError::Io(err) => EncodeError::Io(err),
            AmqpEncodeError::Unsupported(msg) => EncodeError::Unsupported(msg),
        }
    }
}

impl From<AmqpDecodeError> for DecodeError {
    fn from(err: AmqpDecodeError) -> Self {
        match err {
            AmqpDecodeError::InvalidTypeCode(code) => DecodeError::InvalidFormatCode(code),
            AmqpDecodeError::MessageParse(err) => DecodeError::MessageParse(err),
            AmqpDecodeError::Incomplete(err) => DecodeError::Incomplete(err.0),
            AmqpDecodeError::Utf8Error(err) => DecodeError::Utf8Error(err),
            AmqpDecodeError::UuidError(err) => DecodeError::MessageParse(err.to_string()),
            AmqpDecodeError::InvalidTypeCodeFor { target, code } => {
                DecodeError::MessageParse(format!("Invalid type code {:?} for {}", code, target))
            }
            AmqpDecodeError::InvalidDescriptor(descriptor) => {
                DecodeError::InvalidDescriptor(descriptor)
            }
        }
    }
}
