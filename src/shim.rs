//! Sender and receiver drivers shared by the two binaries.
//!
//! Both take `<broker-address> <queue-name> <amqp-type> <count>`. The sender
//! reads a JSON array of `count` literals from stdin and sends each as the
//! `amqp-value` body of its own message. The receiver takes `count` messages
//! and prints the type tag followed by the JSON array of received literals.
use std::{io::Read, time::Duration};

use amqp_types_shim_protocol::message::{Message, Value};
use async_trait::async_trait;
use clap::Parser;
use serde_json::Value as JsonValue;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::{
    client::{ClientOptions, Connection, Delivery, ReceiverLink, SenderLink},
    error::{ClientError, CodecError, ShimError},
    tagged::{self, AmqpType},
    ShimResult,
};

/// How long the receiver waits for each message
pub const RECEIVE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser, Debug, Clone)]
#[command(version, about = "AMQP 1.0 type fidelity test shim")]
pub struct Args {
    /// Broker address: host, host:port or amqp://[user[:password]@]host[:port]
    pub broker: String,
    /// Queue the link attaches to
    pub queue: String,
    /// AMQP type of the test values
    pub amqp_type: AmqpType,
    /// Number of test values
    pub count: usize,
}

#[async_trait]
pub trait MessageSender: Send {
    /// Send one message, resolving once the peer accepted it
    async fn send(&mut self, message: &Message, timeout: Duration) -> Result<(), ClientError>;
}

#[async_trait]
pub trait MessageReceiver: Send {
    async fn receive(&mut self, timeout: Duration) -> Result<Delivery, ClientError>;

    async fn accept(&mut self, delivery: &Delivery) -> Result<(), ClientError>;
}

#[async_trait]
impl<'a> MessageSender for SenderLink<'a> {
    async fn send(&mut self, message: &Message, timeout: Duration) -> Result<(), ClientError> {
        SenderLink::send(self, message, timeout).await
    }
}

#[async_trait]
impl<'a> MessageReceiver for ReceiverLink<'a> {
    async fn receive(&mut self, timeout: Duration) -> Result<Delivery, ClientError> {
        ReceiverLink::receive(self, timeout).await
    }

    async fn accept(&mut self, delivery: &Delivery) -> Result<(), ClientError> {
        ReceiverLink::accept(self, delivery).await
    }
}

/// Logs go to stderr, stdout carries the results read by the harness.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Read the JSON array of test values, which must hold exactly `count` items.
pub fn read_values(input: impl Read, count: usize) -> ShimResult<Vec<JsonValue>> {
    let values: JsonValue = serde_json::from_reader(input)?;
    let values = match values {
        JsonValue::Array(values) => values,
        other => {
            return Err(ShimError::Input(format!(
                "expected a JSON array, found {}",
                other
            )))
        }
    };
    if values.len() != count {
        return Err(ShimError::Count {
            expected: count,
            found: values.len(),
        });
    }
    Ok(values)
}

/// One message per test value, the value being the `amqp-value` body.
pub fn encode_messages(ty: AmqpType, values: &[JsonValue]) -> ShimResult<Vec<Message>> {
    values
        .iter()
        .map(|value| -> ShimResult<Message> {
            let body = tagged::encode(ty, value)?;
            Ok(Message::builder().value(body).build())
        })
        .collect()
}

pub async fn send_messages<S: MessageSender>(
    sender: &mut S,
    messages: &[Message],
    timeout: Duration,
) -> ShimResult<()> {
    for (index, message) in messages.iter().enumerate() {
        sender.send(message, timeout).await?;
        debug!(index, "test value sent");
    }
    Ok(())
}

/// Receive `count` messages, decoding and accepting each in turn.
pub async fn receive_values<R: MessageReceiver>(
    receiver: &mut R,
    ty: AmqpType,
    count: usize,
    timeout: Duration,
) -> ShimResult<Vec<JsonValue>> {
    let mut values = Vec::with_capacity(count);
    for index in 0..count {
        let delivery = receiver.receive(timeout).await?;
        values.push(decode_body(ty, delivery.message())?);
        receiver.accept(&delivery).await?;
        debug!(index, delivery_id = delivery.delivery_id(), "test value received");
    }
    Ok(values)
}

fn decode_body(ty: AmqpType, message: &Message) -> Result<JsonValue, CodecError> {
    match message.value() {
        Some(value) => tagged::decode(ty, value),
        // a message without body stands for null
        None if message.body().is_empty() => tagged::decode(ty, &Value::null()),
        None => Err(CodecError::Unsupported(
            "message body is not an amqp-value section".to_owned(),
        )),
    }
}

/// Receiver output: the type tag, then the compact JSON array.
pub fn format_output(ty: AmqpType, values: Vec<JsonValue>) -> ShimResult<String> {
    let values = serde_json::to_string(&JsonValue::Array(values))?;
    Ok(format!("{}\n{}\n", ty, values))
}

pub async fn run_sender(args: &Args, values: Vec<JsonValue>) -> ShimResult<()> {
    let messages = encode_messages(args.amqp_type, &values)?;
    let options = ClientOptions::from_address(&args.broker)?;
    let timeout = options.operation_timeout();

    let mut connection = Connection::open(options).await?;
    let mut sender = connection.create_sender(&args.queue).await?;
    send_messages(&mut sender, &messages, timeout).await?;
    sender.close().await?;
    connection.close().await?;

    info!(count = messages.len(), queue = %args.queue, "test values sent");
    Ok(())
}

/// Receive the test values and render the receiver output.
pub async fn run_receiver(args: &Args) -> ShimResult<String> {
    let options = ClientOptions::from_address(&args.broker)?;

    let mut connection = Connection::open(options).await?;
    let mut receiver = connection.create_receiver(&args.queue).await?;
    let values =
        receive_values(&mut receiver, args.amqp_type, args.count, RECEIVE_TIMEOUT).await?;
    receiver.close().await?;
    connection.close().await?;

    info!(count = values.len(), queue = %args.queue, "test values received");
    format_output(args.amqp_type, values)
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::{format_output, read_values, Args};
    use crate::{error::ShimError, tagged::AmqpType};

    #[test]
    fn args_test() {
        let args = Args::try_parse_from(["sender", "localhost:5672", "q1", "ubyte", "3"]).unwrap();
        assert_eq!("localhost:5672", args.broker);
        assert_eq!("q1", args.queue);
        assert_eq!(AmqpType::Ubyte, args.amqp_type);
        assert_eq!(3, args.count);

        assert!(Args::try_parse_from(["sender", "localhost", "q1", "ubyte"]).is_err());
        assert!(Args::try_parse_from(["sender", "localhost", "q1", "integer", "1"]).is_err());
        assert!(Args::try_parse_from(["sender", "localhost", "q1", "int", "-1"]).is_err());
    }

    #[test]
    fn read_values_test() {
        let values = read_values(&br#"["0x1", "0xff"]"#[..], 2).unwrap();
        assert_eq!(vec![json!("0x1"), json!("0xff")], values);

        assert!(matches!(
            read_values(&br#"["0x1"]"#[..], 2),
            Err(ShimError::Count {
                expected: 2,
                found: 1
            })
        ));
        assert!(matches!(
            read_values(&br#"{"a": 1}"#[..], 1),
            Err(ShimError::Input(_))
        ));
        assert!(matches!(read_values(&b"[1,"[..], 1), Err(ShimError::Json(_))));
    }

    #[test]
    fn format_output_test() {
        let output = format_output(
            AmqpType::Map,
            vec![json!({"string:k": "string:v"}), json!({})],
        )
        .unwrap();
        assert_eq!("map\n[{\"string:k\":\"string:v\"},{}]\n", output);
    }
}
