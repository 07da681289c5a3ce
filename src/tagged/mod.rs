//! Translation between the tagged JSON used by the test harness and native
//! AMQP values.
//!
//! A scalar is written `"<tag>:<literal>"` inside lists and maps, while the
//! top level value gets its tag from the command line. Lists are JSON arrays
//! and maps are JSON objects keyed by tagged strings.
mod amqp_type;
mod decode;
mod encode;

pub use amqp_type::AmqpType;
pub use decode::{decode, decode_element};
pub use encode::encode;
