use std::time::Duration;

use amqp_types_shim_protocol::{
    codec::Decoder,
    frame::{
        Composite, DeliveryState, Disposition, Flow, Performative, Role, Transfer,
        FRAME_HEADER_SIZE,
    },
    message::{AmqpEncoder, Message},
};
use tokio::time::Instant;
use tracing::{debug, trace};

use super::{Connection, SESSION_WINDOW};
use crate::error::ClientError;

/// Message taken from a receiving link, to be accepted once processed
#[derive(Debug, Clone)]
pub struct Delivery {
    delivery_id: u32,
    tag: Vec<u8>,
    settled: bool,
    message: Message,
}

impl Delivery {
    pub fn new(delivery_id: u32, message: Message) -> Delivery {
        Delivery {
            delivery_id,
            tag: delivery_id.to_be_bytes().to_vec(),
            settled: false,
            message,
        }
    }

    pub fn delivery_id(&self) -> u32 {
        self.delivery_id
    }

    pub fn tag(&self) -> &[u8] {
        &self.tag
    }

    /// Whether the sender settled the delivery before sending it
    pub fn is_settled(&self) -> bool {
        self.settled
    }

    pub fn message(&self) -> &Message {
        &self.message
    }
}

pub struct SenderLink<'a> {
    connection: &'a mut Connection,
    handle: u32,
    remote_handle: u32,
    delivery_count: u32,
    link_credit: u32,
    next_tag: u64,
}

impl<'a> SenderLink<'a> {
    pub(super) fn new(connection: &'a mut Connection, handle: u32, remote_handle: u32) -> Self {
        SenderLink {
            connection,
            handle,
            remote_handle,
            delivery_count: 0,
            link_credit: 0,
            next_tag: 0,
        }
    }

    /// Send `message` and wait until the peer settles it.
    ///
    /// Only the `accepted` outcome counts as success.
    pub async fn send(&mut self, message: &Message, timeout: Duration) -> Result<(), ClientError> {
        let deadline = Instant::now() + timeout;
        let payload = message.to_bytes()?;

        while self.link_credit == 0 {
            self.next_event(deadline, "link credit").await?;
        }

        let delivery_id = self.connection.session.next_delivery_id;
        self.connection.session.next_delivery_id = delivery_id.wrapping_add(1);
        let tag = self.next_tag.to_be_bytes().to_vec();
        self.next_tag += 1;

        let mut transfer = Transfer {
            handle: self.handle,
            delivery_id: Some(delivery_id),
            delivery_tag: Some(tag),
            message_format: Some(0),
            settled: Some(false),
            more: true,
            ..Transfer::default()
        };
        let overhead = FRAME_HEADER_SIZE + transfer.to_value().encoded_size();
        let chunk_size = self.connection.max_frame_size.saturating_sub(overhead).max(1) as usize;

        let mut chunks = payload.chunks(chunk_size).peekable();
        while let Some(chunk) = chunks.next() {
            transfer.more = chunks.peek().is_some();
            while self.connection.session.remote_incoming_window == 0 {
                self.next_event(deadline, "session window").await?;
            }
            self.connection
                .send_frame(Performative::Transfer(transfer.clone()), chunk.to_vec())
                .await?;
            let session = &mut self.connection.session;
            session.next_outgoing_id = session.next_outgoing_id.wrapping_add(1);
            session.remote_incoming_window -= 1;

            // continuation frames only repeat the handle
            transfer = Transfer {
                handle: self.handle,
                ..Transfer::default()
            };
        }

        self.delivery_count = self.delivery_count.wrapping_add(1);
        self.link_credit = self.link_credit.saturating_sub(1);
        debug!(delivery_id, size = payload.len(), "message sent");

        self.await_outcome(delivery_id, deadline).await
    }

    /// Detach the link.
    pub async fn close(self) -> Result<(), ClientError> {
        self.connection.detach(self.handle, self.remote_handle).await
    }

    async fn await_outcome(
        &mut self,
        delivery_id: u32,
        deadline: Instant,
    ) -> Result<(), ClientError> {
        loop {
            let disposition = match self.next_event(deadline, "disposition").await? {
                Some(disposition) => disposition,
                None => continue,
            };
            let last = disposition.last.unwrap_or(disposition.first);
            if !(disposition.first..=last).contains(&delivery_id) {
                continue;
            }

            let outcome = disposition.state.filter(DeliveryState::is_outcome);
            if outcome.is_none() && !disposition.settled {
                continue;
            }
            if !disposition.settled {
                self.settle(delivery_id).await?;
            }
            return match outcome {
                None | Some(DeliveryState::Accepted) => {
                    trace!(delivery_id, "delivery accepted");
                    Ok(())
                }
                Some(other) => Err(ClientError::Outcome {
                    delivery_id,
                    outcome: describe_outcome(&other),
                }),
            };
        }
    }

    async fn settle(&mut self, delivery_id: u32) -> Result<(), ClientError> {
        let disposition = Disposition {
            role: Role::Sender,
            first: delivery_id,
            last: None,
            settled: true,
            state: None,
        };
        self.connection
            .send_frame(Performative::Disposition(disposition), vec![])
            .await
    }

    /// Process one incoming frame, handing back dispositions from the receiver
    async fn next_event(
        &mut self,
        deadline: Instant,
        waiting_for: &str,
    ) -> Result<Option<Disposition>, ClientError> {
        let (performative, _) = self.connection.read_amqp(deadline, waiting_for).await?;
        match performative {
            Performative::Flow(flow) if flow.handle == Some(self.remote_handle) => {
                self.link_credit = flow
                    .delivery_count
                    .unwrap_or(self.delivery_count)
                    .wrapping_add(flow.link_credit.unwrap_or(0))
                    .wrapping_sub(self.delivery_count);
                trace!(link_credit = self.link_credit, "credit updated");
                Ok(None)
            }
            Performative::Disposition(disposition) if disposition.role == Role::Receiver => {
                Ok(Some(disposition))
            }
            Performative::Detach(detach) if detach.handle == self.remote_handle => {
                Err(ClientError::remote(detach.error, ClientError::Detached))
            }
            other => {
                trace!(performative = other.name(), "ignored by sender");
                Ok(None)
            }
        }
    }
}

pub struct ReceiverLink<'a> {
    connection: &'a mut Connection,
    handle: u32,
    remote_handle: u32,
    delivery_count: u32,
    link_credit: u32,
}

struct PartialDelivery {
    delivery_id: u32,
    tag: Vec<u8>,
    settled: bool,
    payload: Vec<u8>,
}

impl PartialDelivery {
    fn start(transfer: &Transfer) -> Result<PartialDelivery, ClientError> {
        let delivery_id = transfer.delivery_id.ok_or_else(|| {
            ClientError::UnexpectedFrame("transfer without delivery-id".to_owned())
        })?;
        Ok(PartialDelivery {
            delivery_id,
            tag: transfer.delivery_tag.clone().unwrap_or_default(),
            settled: false,
            payload: vec![],
        })
    }
}

impl<'a> ReceiverLink<'a> {
    pub(super) fn new(
        connection: &'a mut Connection,
        handle: u32,
        remote_handle: u32,
        delivery_count: u32,
    ) -> Self {
        ReceiverLink {
            connection,
            handle,
            remote_handle,
            delivery_count,
            link_credit: 0,
        }
    }

    /// Wait for the next message, granting a single credit if none is
    /// outstanding.
    pub async fn receive(&mut self, timeout: Duration) -> Result<Delivery, ClientError> {
        let deadline = Instant::now() + timeout;
        if self.link_credit == 0 {
            self.issue_credit(1).await?;
        }

        let mut partial: Option<PartialDelivery> = None;
        loop {
            let (performative, payload) = self.connection.read_amqp(deadline, "message").await?;
            let transfer = match performative {
                Performative::Transfer(transfer) if transfer.handle == self.remote_handle => {
                    transfer
                }
                Performative::Detach(detach) if detach.handle == self.remote_handle => {
                    return Err(ClientError::remote(detach.error, ClientError::Detached))
                }
                other => {
                    trace!(performative = other.name(), "ignored by receiver");
                    continue;
                }
            };

            let session = &mut self.connection.session;
            session.next_incoming_id = session.next_incoming_id.wrapping_add(1);
            if transfer.aborted {
                debug!("delivery aborted by sender");
                partial = None;
                continue;
            }

            let mut current = match partial.take() {
                Some(current) => current,
                None => PartialDelivery::start(&transfer)?,
            };
            current.payload.extend_from_slice(&payload);
            current.settled |= transfer.settled.unwrap_or(false);
            if transfer.more {
                partial = Some(current);
                continue;
            }

            self.delivery_count = self.delivery_count.wrapping_add(1);
            self.link_credit = self.link_credit.saturating_sub(1);
            let (_, message) = Message::decode(&current.payload)?;
            debug!(
                delivery_id = current.delivery_id,
                size = current.payload.len(),
                "message received"
            );
            return Ok(Delivery {
                delivery_id: current.delivery_id,
                tag: current.tag,
                settled: current.settled,
                message,
            });
        }
    }

    /// Settle the delivery with the `accepted` outcome.
    pub async fn accept(&mut self, delivery: &Delivery) -> Result<(), ClientError> {
        if delivery.settled {
            return Ok(());
        }
        let disposition = Disposition {
            role: Role::Receiver,
            first: delivery.delivery_id,
            last: None,
            settled: true,
            state: Some(DeliveryState::Accepted),
        };
        self.connection
            .send_frame(Performative::Disposition(disposition), vec![])
            .await
    }

    /// Detach the link.
    pub async fn close(self) -> Result<(), ClientError> {
        self.connection.detach(self.handle, self.remote_handle).await
    }

    async fn issue_credit(&mut self, credit: u32) -> Result<(), ClientError> {
        let session = &self.connection.session;
        let flow = Flow {
            next_incoming_id: Some(session.next_incoming_id),
            incoming_window: SESSION_WINDOW,
            next_outgoing_id: session.next_outgoing_id,
            outgoing_window: SESSION_WINDOW,
            handle: Some(self.handle),
            delivery_count: Some(self.delivery_count),
            link_credit: Some(credit),
            available: None,
            drain: false,
            echo: false,
        };
        self.link_credit = credit;
        self.connection
            .send_frame(Performative::Flow(flow), vec![])
            .await
    }
}

fn describe_outcome(state: &DeliveryState) -> String {
    match state {
        DeliveryState::Rejected(Some(error)) => format!(
            "rejected ({}: {})",
            error.condition,
            error.description.as_deref().unwrap_or_default()
        ),
        DeliveryState::Rejected(None) => "rejected".to_owned(),
        DeliveryState::Released => "released".to_owned(),
        DeliveryState::Modified { .. } => "modified".to_owned(),
        DeliveryState::Accepted => "accepted".to_owned(),
        DeliveryState::Received { .. } => "received".to_owned(),
    }
}
