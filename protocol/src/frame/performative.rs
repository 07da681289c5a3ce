use crate::{
    error::DecodeError,
    message::{CollectionValue, DescribedValue, Descriptor, List, Symbol, Value},
};

use super::fields::{Composite, Fields};

pub const OPEN: u64 = 0x10;
pub const BEGIN: u64 = 0x11;
pub const ATTACH: u64 = 0x12;
pub const FLOW: u64 = 0x13;
pub const TRANSFER: u64 = 0x14;
pub const DISPOSITION: u64 = 0x15;
pub const DETACH: u64 = 0x16;
pub const END: u64 = 0x17;
pub const CLOSE: u64 = 0x18;
pub const ERROR: u64 = 0x1d;
pub const RECEIVED: u64 = 0x23;
pub const ACCEPTED: u64 = 0x24;
pub const REJECTED: u64 = 0x25;
pub const RELEASED: u64 = 0x26;
pub const MODIFIED: u64 = 0x27;
pub const SOURCE: u64 = 0x28;
pub const TARGET: u64 = 0x29;

/// Body of an AMQP (type 0) frame
#[derive(Debug, Clone, PartialEq)]
pub enum Performative {
    Open(Open),
    Begin(Begin),
    Attach(Attach),
    Flow(Flow),
    Transfer(Transfer),
    Disposition(Disposition),
    Detach(Detach),
    End(End),
    Close(Close),
}

impl Performative {
    pub fn to_value(&self) -> Value {
        match self {
            Performative::Open(open) => open.to_value(),
            Performative::Begin(begin) => begin.to_value(),
            Performative::Attach(attach) => attach.to_value(),
            Performative::Flow(flow) => flow.to_value(),
            Performative::Transfer(transfer) => transfer.to_value(),
            Performative::Disposition(disposition) => disposition.to_value(),
            Performative::Detach(detach) => detach.to_value(),
            Performative::End(end) => end.to_value(),
            Performative::Close(close) => close.to_value(),
        }
    }

    pub fn from_value(value: &Value) -> Result<Self, DecodeError> {
        let code = match value {
            Value::Described(described) => described.descriptor().code(),
            _ => None,
        };
        match code {
            Some(OPEN) => Open::from_value(value).map(Performative::Open),
            Some(BEGIN) => Begin::from_value(value).map(Performative::Begin),
            Some(ATTACH) => Attach::from_value(value).map(Performative::Attach),
            Some(FLOW) => Flow::from_value(value).map(Performative::Flow),
            Some(TRANSFER) => Transfer::from_value(value).map(Performative::Transfer),
            Some(DISPOSITION) => Disposition::from_value(value).map(Performative::Disposition),
            Some(DETACH) => Detach::from_value(value).map(Performative::Detach),
            Some(END) => End::from_value(value).map(Performative::End),
            Some(CLOSE) => Close::from_value(value).map(Performative::Close),
            _ => Err(DecodeError::InvalidDescriptor(format!(
                "Unknown performative {:?}",
                value
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Performative::Open(_) => "open",
            Performative::Begin(_) => "begin",
            Performative::Attach(_) => "attach",
            Performative::Flow(_) => "flow",
            Performative::Transfer(_) => "transfer",
            Performative::Disposition(_) => "disposition",
            Performative::Detach(_) => "detach",
            Performative::End(_) => "end",
            Performative::Close(_) => "close",
        }
    }
}

/// Link role, carried on the wire as a boolean
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Sender,
    Receiver,
}

impl Role {
    fn to_value(self) -> Value {
        Value::from(self == Role::Receiver)
    }

    fn from_bool(receiver: bool) -> Role {
        if receiver {
            Role::Receiver
        } else {
            Role::Sender
        }
    }
}

pub const SETTLE_MODE_UNSETTLED: u8 = 0;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Open {
    pub container_id: String,
    pub hostname: Option<String>,
    pub max_frame_size: Option<u32>,
    pub channel_max: Option<u16>,
    pub idle_time_out: Option<u32>,
}

impl Open {
    pub fn max_frame_size(&self) -> u32 {
        self.max_frame_size.unwrap_or(u32::MAX)
    }
}

impl Composite for Open {
    const CODE: u64 = OPEN;
    const NAME: &'static str = "amqp:open:list";

    fn fields(&self) -> Vec<Value> {
        vec![
            self.container_id.clone().into(),
            self.hostname.clone().into(),
            self.max_frame_size.into(),
            self.channel_max.into(),
            self.idle_time_out.into(),
        ]
    }

    fn from_fields(fields: Fields<'_>) -> Result<Self, DecodeError> {
        Ok(Open {
            container_id: fields.required(0, "container-id")?,
            hostname: fields.get(1)?,
            max_frame_size: fields.get(2)?,
            channel_max: fields.get(3)?,
            idle_time_out: fields.get(4)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Begin {
    pub remote_channel: Option<u16>,
    pub next_outgoing_id: u32,
    pub incoming_window: u32,
    pub outgoing_window: u32,
    pub handle_max: Option<u32>,
}

impl Composite for Begin {
    const CODE: u64 = BEGIN;
    const NAME: &'static str = "amqp:begin:list";

    fn fields(&self) -> Vec<Value> {
        vec![
            self.remote_channel.into(),
            self.next_outgoing_id.into(),
            self.incoming_window.into(),
            self.outgoing_window.into(),
            self.handle_max.into(),
        ]
    }

    fn from_fields(fields: Fields<'_>) -> Result<Self, DecodeError> {
        Ok(Begin {
            remote_channel: fields.get(0)?,
            next_outgoing_id: fields.required(1, "next-outgoing-id")?,
            incoming_window: fields.required(2, "incoming-window")?,
            outgoing_window: fields.required(3, "outgoing-window")?,
            handle_max: fields.get(4)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Source {
    pub address: Option<String>,
}

impl Composite for Source {
    const CODE: u64 = SOURCE;
    const NAME: &'static str = "amqp:source:list";

    fn fields(&self) -> Vec<Value> {
        vec![self.address.clone().into()]
    }

    fn from_fields(fields: Fields<'_>) -> Result<Self, DecodeError> {
        Ok(Source {
            address: fields.get::<Symbol>(0)?.map(|address| address.to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Target {
    pub address: Option<String>,
}

impl Composite for Target {
    const CODE: u64 = TARGET;
    const NAME: &'static str = "amqp:target:list";

    fn fields(&self) -> Vec<Value> {
        vec![self.address.clone().into()]
    }

    fn from_fields(fields: Fields<'_>) -> Result<Self, DecodeError> {
        Ok(Target {
            address: fields.get::<Symbol>(0)?.map(|address| address.to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attach {
    pub name: String,
    pub handle: u32,
    pub role: Role,
    pub snd_settle_mode: Option<u8>,
    pub rcv_settle_mode: Option<u8>,
    pub source: Option<Source>,
    pub target: Option<Target>,
    pub initial_delivery_count: Option<u32>,
    pub max_message_size: Option<u64>,
}

impl Composite for Attach {
    const CODE: u64 = ATTACH;
    const NAME: &'static str = "amqp:attach:list";

    fn fields(&self) -> Vec<Value> {
        vec![
            self.name.clone().into(),
            self.handle.into(),
            self.role.to_value(),
            self.snd_settle_mode.into(),
            self.rcv_settle_mode.into(),
            self.source.as_ref().map(Composite::to_value).into(),
            self.target.as_ref().map(Composite::to_value).into(),
            // unsettled, incomplete-unsettled
            Value::null(),
            Value::null(),
            self.initial_delivery_count.into(),
            self.max_message_size.into(),
        ]
    }

    fn from_fields(fields: Fields<'_>) -> Result<Self, DecodeError> {
        Ok(Attach {
            name: fields.required(0, "name")?,
            handle: fields.required(1, "handle")?,
            role: Role::from_bool(fields.required(2, "role")?),
            snd_settle_mode: fields.get(3)?,
            rcv_settle_mode: fields.get(4)?,
            source: fields.raw(5).map(Source::from_value).transpose()?,
            target: fields.raw(6).map(Target::from_value).transpose()?,
            initial_delivery_count: fields.get(9)?,
            max_message_size: fields.get(10)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Flow {
    pub next_incoming_id: Option<u32>,
    pub incoming_window: u32,
    pub next_outgoing_id: u32,
    pub outgoing_window: u32,
    pub handle: Option<u32>,
    pub delivery_count: Option<u32>,
    pub link_credit: Option<u32>,
    pub available: Option<u32>,
    pub drain: bool,
    pub echo: bool,
}

impl Composite for Flow {
    const CODE: u64 = FLOW;
    const NAME: &'static str = "amqp:flow:list";

    fn fields(&self) -> Vec<Value> {
        vec![
            self.next_incoming_id.into(),
            self.incoming_window.into(),
            self.next_outgoing_id.into(),
            self.outgoing_window.into(),
            self.handle.into(),
            self.delivery_count.into(),
            self.link_credit.into(),
            self.available.into(),
            self.drain.into(),
            self.echo.into(),
        ]
    }

    fn from_fields(fields: Fields<'_>) -> Result<Self, DecodeError> {
        Ok(Flow {
            next_incoming_id: fields.get(0)?,
            incoming_window: fields.required(1, "incoming-window")?,
            next_outgoing_id: fields.required(2, "next-outgoing-id")?,
            outgoing_window: fields.required(3, "outgoing-window")?,
            handle: fields.get(4)?,
            delivery_count: fields.get(5)?,
            link_credit: fields.get(6)?,
            available: fields.get(7)?,
            drain: fields.get_or(8, false)?,
            echo: fields.get_or(9, false)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Transfer {
    pub handle: u32,
    pub delivery_id: Option<u32>,
    pub delivery_tag: Option<Vec<u8>>,
    pub message_format: Option<u32>,
    pub settled: Option<bool>,
    pub more: bool,
    pub rcv_settle_mode: Option<u8>,
    pub state: Option<DeliveryState>,
    pub aborted: bool,
}

impl Composite for Transfer {
    const CODE: u64 = TRANSFER;
    const NAME: &'static str = "amqp:transfer:list";

    fn fields(&self) -> Vec<Value> {
        vec![
            self.handle.into(),
            self.delivery_id.into(),
            self.delivery_tag.clone().into(),
            self.message_format.into(),
            self.settled.into(),
            self.more.into(),
            self.rcv_settle_mode.into(),
            self.state.as_ref().map(DeliveryState::to_value).into(),
            // resume
            Value::null(),
            self.aborted.into(),
        ]
    }

    fn from_fields(fields: Fields<'_>) -> Result<Self, DecodeError> {
        Ok(Transfer {
            handle: fields.required(0, "handle")?,
            delivery_id: fields.get(1)?,
            delivery_tag: fields.get(2)?,
            message_format: fields.get(3)?,
            settled: fields.get(4)?,
            more: fields.get_or(5, false)?,
            rcv_settle_mode: fields.get(6)?,
            state: fields.raw(7).map(DeliveryState::from_value).transpose()?,
            aborted: fields.get_or(9, false)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disposition {
    pub role: Role,
    pub first: u32,
    pub last: Option<u32>,
    pub settled: bool,
    pub state: Option<DeliveryState>,
}

impl Composite for Disposition {
    const CODE: u64 = DISPOSITION;
    const NAME: &'static str = "amqp:disposition:list";

    fn fields(&self) -> Vec<Value> {
        vec![
            self.role.to_value(),
            self.first.into(),
            self.last.into(),
            self.settled.into(),
            self.state.as_ref().map(DeliveryState::to_value).into(),
        ]
    }

    fn from_fields(fields: Fields<'_>) -> Result<Self, DecodeError> {
        Ok(Disposition {
            role: Role::from_bool(fields.required(0, "role")?),
            first: fields.required(1, "first")?,
            last: fields.get(2)?,
            settled: fields.get_or(3, false)?,
            state: fields.raw(4).map(DeliveryState::from_value).transpose()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Detach {
    pub handle: u32,
    pub closed: bool,
    pub error: Option<AmqpError>,
}

impl Composite for Detach {
    const CODE: u64 = DETACH;
    const NAME: &'static str = "amqp:detach:list";

    fn fields(&self) -> Vec<Value> {
        vec![
            self.handle.into(),
            self.closed.into(),
            self.error.as_ref().map(Composite::to_value).into(),
        ]
    }

    fn from_fields(fields: Fields<'_>) -> Result<Self, DecodeError> {
        Ok(Detach {
            handle: fields.required(0, "handle")?,
            closed: fields.get_or(1, false)?,
            error: fields.raw(2).map(AmqpError::from_value).transpose()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct End {
    pub error: Option<AmqpError>,
}

impl Composite for End {
    const CODE: u64 = END;
    const NAME: &'static str = "amqp:end:list";

    fn fields(&self) -> Vec<Value> {
        vec![self.error.as_ref().map(Composite::to_value).into()]
    }

    fn from_fields(fields: Fields<'_>) -> Result<Self, DecodeError> {
        Ok(End {
            error: fields.raw(0).map(AmqpError::from_value).transpose()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Close {
    pub error: Option<AmqpError>,
}

impl Composite for Close {
    const CODE: u64 = CLOSE;
    const NAME: &'static str = "amqp:close:list";

    fn fields(&self) -> Vec<Value> {
        vec![self.error.as_ref().map(Composite::to_value).into()]
    }

    fn from_fields(fields: Fields<'_>) -> Result<Self, DecodeError> {
        Ok(Close {
            error: fields.raw(0).map(AmqpError::from_value).transpose()?,
        })
    }
}

/// Error condition attached to detach, end, close and rejected
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AmqpError {
    pub condition: Symbol,
    pub description: Option<String>,
}

impl AmqpError {
    pub fn new(condition: impl Into<Symbol>, description: Option<String>) -> Self {
        AmqpError {
            condition: condition.into(),
            description,
        }
    }
}

impl Composite for AmqpError {
    const CODE: u64 = ERROR;
    const NAME: &'static str = "amqp:error:list";

    fn fields(&self) -> Vec<Value> {
        vec![self.condition.clone().into(), self.description.clone().into()]
    }

    fn from_fields(fields: Fields<'_>) -> Result<Self, DecodeError> {
        Ok(AmqpError {
            condition: fields.required(0, "condition")?,
            description: fields.get(1)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryState {
    Received { section_number: u32, section_offset: u64 },
    Accepted,
    Rejected(Option<AmqpError>),
    Released,
    Modified {
        delivery_failed: bool,
        undeliverable_here: bool,
    },
}

impl DeliveryState {
    pub fn code(&self) -> u64 {
        match self {
            DeliveryState::Received { .. } => RECEIVED,
            DeliveryState::Accepted => ACCEPTED,
            DeliveryState::Rejected(_) => REJECTED,
            DeliveryState::Released => RELEASED,
            DeliveryState::Modified { .. } => MODIFIED,
        }
    }

    /// Whether this is a terminal outcome rather than a transient state
    pub fn is_outcome(&self) -> bool {
        !matches!(self, DeliveryState::Received { .. })
    }

    pub fn to_value(&self) -> Value {
        let fields = match self {
            DeliveryState::Received {
                section_number,
                section_offset,
            } => vec![(*section_number).into(), (*section_offset).into()],
            DeliveryState::Accepted | DeliveryState::Released => vec![],
            DeliveryState::Rejected(error) => {
                vec![error.as_ref().map(Composite::to_value).into()]
            }
            DeliveryState::Modified {
                delivery_failed,
                undeliverable_here,
            } => vec![(*delivery_failed).into(), (*undeliverable_here).into()],
        };
        DescribedValue::new(Descriptor::Ulong(self.code()), List(fields)).into()
    }

    pub fn from_value(value: &Value) -> Result<Self, DecodeError> {
        let described = match value {
            Value::Described(described) => described,
            other => {
                return Err(DecodeError::InvalidDescriptor(format!(
                    "Expected delivery state but found {:?}",
                    other
                )))
            }
        };
        let fields = match described.value() {
            Value::Collection(CollectionValue::List(list)) => Fields(&list.0),
            _ => Fields(&[]),
        };
        match described.descriptor().code() {
            Some(RECEIVED) => Ok(DeliveryState::Received {
                section_number: fields.required(0, "section-number")?,
                section_offset: fields.required(1, "section-offset")?,
            }),
            Some(ACCEPTED) => Ok(DeliveryState::Accepted),
            Some(REJECTED) => Ok(DeliveryState::Rejected(
                fields.raw(0).map(AmqpError::from_value).transpose()?,
            )),
            Some(RELEASED) => Ok(DeliveryState::Released),
            Some(MODIFIED) => Ok(DeliveryState::Modified {
                delivery_failed: fields.get_or(0, false)?,
                undeliverable_here: fields.get_or(1, false)?,
            }),
            _ => Err(DecodeError::InvalidDescriptor(format!(
                "Unknown delivery state {:?}",
                described.descriptor()
            ))),
        }
    }
}
