use std::sync::Arc;

use super::amqp::{AmqpMessage, DescribedValue, Value};
use super::Message;

pub struct MessageBuilder(pub(crate) AmqpMessage);

impl MessageBuilder {
    /// Set the `amqp-value` body section
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.0.set_body(|body| {
            body.set_value(value);
        });
        self
    }

    /// Set a single `data` body section
    pub fn data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.0.set_body(|body| {
            body.set_data(data);
        });
        self
    }

    /// Add a section preceding the body, such as properties or annotations
    pub fn section(mut self, section: DescribedValue) -> Self {
        self.0.push_section(section);
        self
    }

    pub fn build(self) -> Message {
        Message(Arc::new(self.0))
    }
}
