//! AMQP 1.0 type system, message codec and transport frames.
//!
//! Everything in this crate is synchronous and works on byte slices and
//! [`std::io::Write`] sinks; socket handling lives in the client.
pub mod codec;
pub mod error;
pub mod frame;
pub mod message;
mod utils;
