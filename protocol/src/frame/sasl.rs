use crate::{
    error::DecodeError,
    message::{Symbol, Value},
};

use super::fields::{symbol_array, symbols, Composite, Fields};

pub const SASL_MECHANISMS: u64 = 0x40;
pub const SASL_INIT: u64 = 0x41;
pub const SASL_CHALLENGE: u64 = 0x42;
pub const SASL_RESPONSE: u64 = 0x43;
pub const SASL_OUTCOME: u64 = 0x44;

pub const ANONYMOUS: &str = "ANONYMOUS";
pub const PLAIN: &str = "PLAIN";

/// Body of a SASL (type 1) frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaslFrame {
    Mechanisms(SaslMechanisms),
    Init(SaslInit),
    Challenge(SaslChallenge),
    Response(SaslResponse),
    Outcome(SaslOutcome),
}

impl SaslFrame {
    pub fn to_value(&self) -> Value {
        match self {
            SaslFrame::Mechanisms(mechanisms) => mechanisms.to_value(),
            SaslFrame::Init(init) => init.to_value(),
            SaslFrame::Challenge(challenge) => challenge.to_value(),
            SaslFrame::Response(response) => response.to_value(),
            SaslFrame::Outcome(outcome) => outcome.to_value(),
        }
    }

    pub fn from_value(value: &Value) -> Result<Self, DecodeError> {
        let code = match value {
            Value::Described(described) => described.descriptor().code(),
            _ => None,
        };
        match code {
            Some(SASL_MECHANISMS) => SaslMechanisms::from_value(value).map(SaslFrame::Mechanisms),
            Some(SASL_INIT) => SaslInit::from_value(value).map(SaslFrame::Init),
            Some(SASL_CHALLENGE) => SaslChallenge::from_value(value).map(SaslFrame::Challenge),
            Some(SASL_RESPONSE) => SaslResponse::from_value(value).map(SaslFrame::Response),
            Some(SASL_OUTCOME) => SaslOutcome::from_value(value).map(SaslFrame::Outcome),
            _ => Err(DecodeError::InvalidDescriptor(format!(
                "Unknown sasl frame {:?}",
                value
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SaslMechanisms {
    pub mechanisms: Vec<Symbol>,
}

impl SaslMechanisms {
    pub fn supports(&self, mechanism: &str) -> bool {
        self.mechanisms
            .iter()
            .any(|offered| offered.as_str() == mechanism)
    }
}

impl Composite for SaslMechanisms {
    const CODE: u64 = SASL_MECHANISMS;
    const NAME: &'static str = "amqp:sasl-mechanisms:list";

    fn fields(&self) -> Vec<Value> {
        vec![symbol_array(&self.mechanisms)]
    }

    fn from_fields(fields: Fields<'_>) -> Result<Self, DecodeError> {
        Ok(SaslMechanisms {
            mechanisms: symbols(fields.raw(0))?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SaslInit {
    pub mechanism: Symbol,
    pub initial_response: Option<Vec<u8>>,
    pub hostname: Option<String>,
}

impl SaslInit {
    pub fn anonymous() -> Self {
        SaslInit {
            mechanism: ANONYMOUS.into(),
            ..Default::default()
        }
    }

    /// PLAIN initial response: empty authorization id, username, password
    pub fn plain(username: &str, password: &str) -> Self {
        let mut response = Vec::with_capacity(username.len() + password.len() + 2);
        response.push(0);
        response.extend_from_slice(username.as_bytes());
        response.push(0);
        response.extend_from_slice(password.as_bytes());
        SaslInit {
            mechanism: PLAIN.into(),
            initial_response: Some(response),
            hostname: None,
        }
    }
}

impl Composite for SaslInit {
    const CODE: u64 = SASL_INIT;
    const NAME: &'static str = "amqp:sasl-init:list";

    fn fields(&self) -> Vec<Value> {
        vec![
            self.mechanism.clone().into(),
            self.initial_response.clone().into(),
            self.hostname.clone().into(),
        ]
    }

    fn from_fields(fields: Fields<'_>) -> Result<Self, DecodeError> {
        Ok(SaslInit {
            mechanism: fields.required(0, "mechanism")?,
            initial_response: fields.get(1)?,
            hostname: fields.get(2)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SaslChallenge {
    pub challenge: Vec<u8>,
}

impl Composite for SaslChallenge {
    const CODE: u64 = SASL_CHALLENGE;
    const NAME: &'static str = "amqp:sasl-challenge:list";

    fn fields(&self) -> Vec<Value> {
        vec![self.challenge.clone().into()]
    }

    fn from_fields(fields: Fields<'_>) -> Result<Self, DecodeError> {
        Ok(SaslChallenge {
            challenge: fields.required(0, "challenge")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SaslResponse {
    pub response: Vec<u8>,
}

impl Composite for SaslResponse {
    const CODE: u64 = SASL_RESPONSE;
    const NAME: &'static str = "amqp:sasl-response:list";

    fn fields(&self) -> Vec<Value> {
        vec![self.response.clone().into()]
    }

    fn from_fields(fields: Fields<'_>) -> Result<Self, DecodeError> {
        Ok(SaslResponse {
            response: fields.required(0, "response")?,
        })
    }
}

/// Outcome codes: 0 ok, 1 auth, 2 sys, 3 sys-perm, 4 sys-temp
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SaslOutcome {
    pub code: u8,
    pub additional_data: Option<Vec<u8>>,
}

impl SaslOutcome {
    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}

impl Composite for SaslOutcome {
    const CODE: u64 = SASL_OUTCOME;
    const NAME: &'static str = "amqp:sasl-outcome:list";

    fn fields(&self) -> Vec<Value> {
        vec![self.code.into(), self.additional_data.clone().into()]
    }

    fn from_fields(fields: Fields<'_>) -> Result<Self, DecodeError> {
        Ok(SaslOutcome {
            code: fields.required(0, "code")?,
            additional_data: fields.get(1)?,
        })
    }
}
