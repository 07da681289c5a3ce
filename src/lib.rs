//! Type fidelity shim for AMQP 1.0 interoperability tests.
//!
//! The `sender` and `receiver` binaries move values of one AMQP type through
//! a broker so a harness can compare what different clients put on and take
//! off the wire.
pub mod client;
pub mod error;
pub mod shim;
pub mod tagged;

pub type ShimResult<T> = Result<T, error::ShimError>;

pub use crate::client::{ClientOptions, Connection};

pub mod types {
    pub use crate::client::{Delivery, ReceiverLink, SenderLink};
    pub use crate::tagged::AmqpType;
    pub use amqp_types_shim_protocol::message::{Message, Value};
}
