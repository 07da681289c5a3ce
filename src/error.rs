use amqp_types_shim_protocol::{
    error::{DecodeError, EncodeError},
    frame::AmqpError,
};

use crate::tagged::AmqpType;

/// Errors raised while translating between tagged JSON and AMQP values
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("unknown AMQP type '{0}'")]
    UnknownType(String),

    #[error("cannot encode '{literal}' as {ty}: {reason}")]
    InvalidLiteral {
        ty: AmqpType,
        literal: String,
        reason: String,
    },

    #[error("a {ty} value cannot be built from a JSON {found}")]
    UnexpectedShape { ty: AmqpType, found: &'static str },

    #[error("type mismatch: expected {expected}, received {found}")]
    TypeMismatch { expected: AmqpType, found: String },

    #[error("lists and maps cannot be used as map keys")]
    CollectionKey,

    #[error("unsupported AMQP value: {0}")]
    Unsupported(String),
}

impl CodecError {
    pub(crate) fn invalid_literal(
        ty: AmqpType,
        literal: &str,
        reason: impl std::fmt::Display,
    ) -> Self {
        CodecError::InvalidLiteral {
            ty,
            literal: literal.to_owned(),
            reason: reason.to_string(),
        }
    }
}

/// Transport failures while talking to the broker
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid broker address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("frame encoding failed: {0}")]
    Encode(String),

    #[error("frame decoding failed: {0}")]
    Decode(String),

    #[error("timed out waiting for {0}")]
    Timeout(String),

    #[error("connection closed by peer")]
    ConnectionClosed,

    #[error("SASL authentication failed with code {0}")]
    SaslFailed(u8),

    #[error("no usable SASL mechanism: {0}")]
    SaslMechanism(String),

    #[error("remote error {condition}: {description}")]
    Remote {
        condition: String,
        description: String,
    },

    #[error("unexpected {0}")]
    UnexpectedFrame(String),

    #[error("delivery {delivery_id} was not accepted: {outcome}")]
    Outcome { delivery_id: u32, outcome: String },

    #[error("link detached by peer")]
    Detached,
}

impl ClientError {
    pub(crate) fn remote(error: Option<AmqpError>, fallback: ClientError) -> ClientError {
        match error {
            Some(error) => ClientError::Remote {
                condition: error.condition.to_string(),
                description: error.description.unwrap_or_default(),
            },
            None => fallback,
        }
    }
}

impl From<EncodeError> for ClientError {
    fn from(err: EncodeError) -> Self {
        match err {
            EncodeError::Io(err) => ClientError::Io(err),
            EncodeError::Unsupported(msg) => ClientError::Encode(msg),
        }
    }
}

impl From<DecodeError> for ClientError {
    fn from(err: DecodeError) -> Self {
        ClientError::Decode(format!("{:?}", err))
    }
}

/// Anything that makes a driver run fail
#[derive(Debug, thiserror::Error)]
pub enum ShimError {
    #[error("invalid test values: {0}")]
    Input(String),

    #[error("expected {expected} test values, found {found}")]
    Count { expected: usize, found: usize },

    #[error("invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
