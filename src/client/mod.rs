//! Minimal AMQP 1.0 client: a single connection carrying one session on
//! channel 0, with links attached one at a time.
use amqp_types_shim_protocol::frame::{
    Attach, Begin, Close, Detach, End, Flow, Frame, FrameBody, Open, Performative,
    ProtocolHeader, Role, SaslFrame, SaslInit, SaslResponse, Source, Target, Transmission,
    ANONYMOUS, MIN_MAX_FRAME_SIZE, PLAIN, SETTLE_MODE_UNSETTLED,
};
use futures::{SinkExt, StreamExt};
use tokio::{
    net::TcpStream,
    time::{timeout, timeout_at, Instant},
};
use tokio_util::codec::Framed;
use tracing::{debug, trace};

use crate::error::ClientError;

mod codec;
mod link;
mod options;

use codec::AmqpCodec;
pub use link::{Delivery, ReceiverLink, SenderLink};
pub use options::ClientOptions;

const CHANNEL: u16 = 0;
const SESSION_WINDOW: u32 = 2048;
// receiver settles first, the sender settles after the outcome arrives
const RCV_SETTLE_MODE_FIRST: u8 = 0;

#[derive(Debug, Default)]
struct Session {
    next_outgoing_id: u32,
    next_incoming_id: u32,
    remote_incoming_window: u32,
    next_delivery_id: u32,
}

impl Session {
    fn apply_flow(&mut self, flow: &Flow) {
        self.remote_incoming_window = flow
            .next_incoming_id
            .unwrap_or(0)
            .wrapping_add(flow.incoming_window)
            .wrapping_sub(self.next_outgoing_id);
    }
}

pub struct Connection {
    transport: Framed<TcpStream, AmqpCodec>,
    options: ClientOptions,
    max_frame_size: u32,
    session: Session,
    next_handle: u32,
}

impl Connection {
    /// Connect, authenticate and begin the session.
    pub async fn open(options: ClientOptions) -> Result<Connection, ClientError> {
        let stream = timeout(
            options.connect_timeout,
            TcpStream::connect((options.host.as_str(), options.port)),
        )
        .await
        .map_err(|_| {
            ClientError::Timeout(format!("connection to {}:{}", options.host, options.port))
        })??;
        stream.set_nodelay(true)?;
        debug!(host = %options.host, port = options.port, "connected");

        let deadline = Instant::now() + options.operation_timeout;
        let mut connection = Connection {
            transport: Framed::new(stream, AmqpCodec::default()),
            max_frame_size: options.max_frame_size,
            options,
            session: Session::default(),
            next_handle: 0,
        };

        connection.authenticate(deadline).await?;
        connection.open_connection(deadline).await?;
        connection.begin_session(deadline).await?;

        Ok(connection)
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Attach a sending link targeting `queue`.
    pub async fn create_sender(&mut self, queue: &str) -> Result<SenderLink<'_>, ClientError> {
        let handle = self.allocate_handle();
        let attach = Attach {
            name: format!("{}-{}-sender", self.options.container_id, queue),
            handle,
            role: Role::Sender,
            snd_settle_mode: Some(SETTLE_MODE_UNSETTLED),
            rcv_settle_mode: Some(RCV_SETTLE_MODE_FIRST),
            source: Some(Source::default()),
            target: Some(Target {
                address: Some(queue.to_owned()),
            }),
            initial_delivery_count: Some(0),
            max_message_size: None,
        };
        let remote = self.attach(attach).await?;
        Ok(SenderLink::new(self, handle, remote.handle))
    }

    /// Attach a receiving link sourcing from `queue`.
    pub async fn create_receiver(&mut self, queue: &str) -> Result<ReceiverLink<'_>, ClientError> {
        let handle = self.allocate_handle();
        let attach = Attach {
            name: format!("{}-{}-receiver", self.options.container_id, queue),
            handle,
            role: Role::Receiver,
            snd_settle_mode: Some(SETTLE_MODE_UNSETTLED),
            rcv_settle_mode: Some(RCV_SETTLE_MODE_FIRST),
            source: Some(Source {
                address: Some(queue.to_owned()),
            }),
            target: Some(Target::default()),
            initial_delivery_count: None,
            max_message_size: None,
        };
        let remote = self.attach(attach).await?;
        Ok(ReceiverLink::new(
            self,
            handle,
            remote.handle,
            remote.initial_delivery_count.unwrap_or(0),
        ))
    }

    /// End the session and close the connection.
    pub async fn close(mut self) -> Result<(), ClientError> {
        let deadline = Instant::now() + self.options.operation_timeout;

        self.send_frame(Performative::End(End::default()), vec![]).await?;
        self.await_closing(deadline, "end").await?;

        self.send_frame(Performative::Close(Close::default()), vec![]).await?;
        self.await_closing(deadline, "close").await?;

        SinkExt::<Transmission>::close(&mut self.transport).await?;
        debug!("connection closed");
        Ok(())
    }

    fn allocate_handle(&mut self) -> u32 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    async fn authenticate(&mut self, deadline: Instant) -> Result<(), ClientError> {
        self.exchange_headers(ProtocolHeader::Sasl, deadline).await?;

        let mechanisms = match self.read_sasl(deadline).await? {
            SaslFrame::Mechanisms(mechanisms) => mechanisms,
            other => {
                return Err(ClientError::UnexpectedFrame(format!(
                    "{:?} instead of SASL mechanisms",
                    other
                )))
            }
        };

        let init = match (&self.options.user, &self.options.password) {
            (Some(user), password) if mechanisms.supports(PLAIN) => {
                SaslInit::plain(user, password.as_deref().unwrap_or_default())
            }
            _ if mechanisms.supports(ANONYMOUS) => SaslInit::anonymous(),
            _ => {
                return Err(ClientError::SaslMechanism(format!(
                    "server offers {:?}",
                    mechanisms.mechanisms
                )))
            }
        };
        debug!(mechanism = %init.mechanism, "authenticating");
        self.transport
            .send(Transmission::from(Frame::sasl(SaslFrame::Init(init))))
            .await?;

        loop {
            match self.read_sasl(deadline).await? {
                SaslFrame::Outcome(outcome) if outcome.is_ok() => break,
                SaslFrame::Outcome(outcome) => return Err(ClientError::SaslFailed(outcome.code)),
                SaslFrame::Challenge(_) => {
                    let response = Frame::sasl(SaslFrame::Response(SaslResponse::default()));
                    self.transport.send(Transmission::from(response)).await?
                }
                other => {
                    return Err(ClientError::UnexpectedFrame(format!(
                        "{:?} during SASL exchange",
                        other
                    )))
                }
            }
        }

        self.exchange_headers(ProtocolHeader::Amqp, deadline).await
    }

    async fn open_connection(&mut self, deadline: Instant) -> Result<(), ClientError> {
        let open = Open {
            container_id: self.options.container_id.clone(),
            hostname: Some(self.options.host.clone()),
            max_frame_size: Some(self.options.max_frame_size),
            channel_max: Some(self.options.channel_max),
            idle_time_out: None,
        };
        self.send_frame(Performative::Open(open), vec![]).await?;

        match self.read_amqp(deadline, "open").await? {
            (Performative::Open(remote), _) => {
                self.max_frame_size = self
                    .options
                    .max_frame_size
                    .min(remote.max_frame_size())
                    .max(MIN_MAX_FRAME_SIZE);
                debug!(
                    remote_container = %remote.container_id,
                    max_frame_size = self.max_frame_size,
                    "connection opened"
                );
                Ok(())
            }
            (other, _) => Err(unexpected(&other, "open")),
        }
    }

    async fn begin_session(&mut self, deadline: Instant) -> Result<(), ClientError> {
        let begin = Begin {
            remote_channel: None,
            next_outgoing_id: self.session.next_outgoing_id,
            incoming_window: SESSION_WINDOW,
            outgoing_window: SESSION_WINDOW,
            handle_max: None,
        };
        self.send_frame(Performative::Begin(begin), vec![]).await?;

        match self.read_amqp(deadline, "begin").await? {
            (Performative::Begin(remote), _) => {
                self.session.next_incoming_id = remote.next_outgoing_id;
                self.session.remote_incoming_window = remote.incoming_window;
                debug!(
                    remote_incoming_window = remote.incoming_window,
                    "session begun"
                );
                Ok(())
            }
            (other, _) => Err(unexpected(&other, "begin")),
        }
    }

    async fn attach(&mut self, attach: Attach) -> Result<Attach, ClientError> {
        let deadline = Instant::now() + self.options.operation_timeout;
        let handle = attach.handle;
        let role = attach.role;
        let name = attach.name.clone();
        self.send_frame(Performative::Attach(attach), vec![]).await?;

        loop {
            match self.read_amqp(deadline, "attach").await? {
                (Performative::Attach(remote), _) if remote.name == name => {
                    // a refusing peer answers without terminus and detaches right after
                    let refused = match role {
                        Role::Sender => remote.target.is_none(),
                        Role::Receiver => remote.source.is_none(),
                    };
                    if refused {
                        return Err(self.refused(handle, deadline).await);
                    }
                    debug!(name = %name, handle, remote_handle = remote.handle, "link attached");
                    return Ok(remote);
                }
                (Performative::Detach(detach), _) => {
                    return Err(ClientError::remote(detach.error, ClientError::Detached))
                }
                (other, _) => trace!(performative = other.name(), "ignored while attaching"),
            }
        }
    }

    async fn refused(&mut self, handle: u32, deadline: Instant) -> ClientError {
        loop {
            match self.read_amqp(deadline, "detach").await {
                Ok((Performative::Detach(detach), _)) => {
                    let reply = Detach {
                        handle,
                        closed: true,
                        error: None,
                    };
                    if let Err(err) = self.send_frame(Performative::Detach(reply), vec![]).await {
                        trace!(?err, "failed to acknowledge detach");
                    }
                    return ClientError::remote(detach.error, ClientError::Detached);
                }
                Ok(_) => continue,
                Err(err) => return err,
            }
        }
    }

    async fn detach(&mut self, handle: u32, remote_handle: u32) -> Result<(), ClientError> {
        let deadline = Instant::now() + self.options.operation_timeout;
        let detach = Detach {
            handle,
            closed: true,
            error: None,
        };
        self.send_frame(Performative::Detach(detach), vec![]).await?;

        loop {
            match self.read_amqp(deadline, "detach").await? {
                (Performative::Detach(detach), _) if detach.handle == remote_handle => {
                    debug!(handle, "link detached");
                    return match detach.error {
                        Some(error) => Err(ClientError::remote(Some(error), ClientError::Detached)),
                        None => Ok(()),
                    };
                }
                (other, _) => trace!(performative = other.name(), "ignored while detaching"),
            }
        }
    }

    async fn exchange_headers(
        &mut self,
        header: ProtocolHeader,
        deadline: Instant,
    ) -> Result<(), ClientError> {
        self.transport.send(Transmission::from(header)).await?;
        match self.read(deadline, "protocol header").await? {
            Transmission::Header(received) if received == header => Ok(()),
            other => Err(ClientError::UnexpectedFrame(format!(
                "{:?} in reply to the {:?} protocol header",
                other, header
            ))),
        }
    }

    async fn send_frame(
        &mut self,
        performative: Performative,
        payload: Vec<u8>,
    ) -> Result<(), ClientError> {
        trace!(
            channel = CHANNEL,
            performative = performative.name(),
            payload = payload.len(),
            "sending frame"
        );
        self.transport
            .send(Transmission::from(Frame::with_payload(
                CHANNEL,
                performative,
                payload,
            )))
            .await
    }

    /// Next header or non-empty frame
    async fn read(
        &mut self,
        deadline: Instant,
        waiting_for: &str,
    ) -> Result<Transmission, ClientError> {
        loop {
            let next = timeout_at(deadline, self.transport.next())
                .await
                .map_err(|_| ClientError::Timeout(waiting_for.to_owned()))?;
            match next {
                None => return Err(ClientError::ConnectionClosed),
                Some(Ok(Transmission::Frame(Frame {
                    body: FrameBody::Empty,
                    ..
                }))) => trace!("heartbeat received"),
                Some(transmission) => return transmission,
            }
        }
    }

    async fn read_sasl(&mut self, deadline: Instant) -> Result<SaslFrame, ClientError> {
        match self.read(deadline, "SASL exchange").await? {
            Transmission::Frame(Frame {
                body: FrameBody::Sasl(frame),
                ..
            }) => {
                trace!(?frame, "received SASL frame");
                Ok(frame)
            }
            other => Err(ClientError::UnexpectedFrame(format!(
                "{:?} during SASL exchange",
                other
            ))),
        }
    }

    /// Next performative, with session flow applied and remote end or close
    /// turned into errors
    async fn read_amqp(
        &mut self,
        deadline: Instant,
        waiting_for: &str,
    ) -> Result<(Performative, Vec<u8>), ClientError> {
        match self.read(deadline, waiting_for).await? {
            Transmission::Frame(Frame {
                channel,
                body:
                    FrameBody::Amqp {
                        performative,
                        payload,
                    },
            }) => {
                trace!(
                    channel,
                    performative = performative.name(),
                    payload = payload.len(),
                    "received frame"
                );
                match performative {
                    Performative::Close(close) => {
                        Err(ClientError::remote(close.error, ClientError::ConnectionClosed))
                    }
                    Performative::End(end) => {
                        Err(ClientError::remote(end.error, ClientError::ConnectionClosed))
                    }
                    Performative::Flow(flow) => {
                        self.session.apply_flow(&flow);
                        Ok((Performative::Flow(flow), payload))
                    }
                    performative => Ok((performative, payload)),
                }
            }
            other => Err(ClientError::UnexpectedFrame(format!(
                "{:?} while waiting for {}",
                other, waiting_for
            ))),
        }
    }

    async fn await_closing(
        &mut self,
        deadline: Instant,
        waiting_for: &str,
    ) -> Result<(), ClientError> {
        loop {
            let performative = match self.read(deadline, waiting_for).await? {
                Transmission::Frame(Frame {
                    body: FrameBody::Amqp { performative, .. },
                    ..
                }) => performative,
                other => {
                    trace!(?other, "ignored while closing");
                    continue;
                }
            };
            let error = match performative {
                Performative::End(end) => end.error,
                Performative::Close(close) => close.error,
                other => {
                    trace!(performative = other.name(), "ignored while closing");
                    continue;
                }
            };
            return match error {
                Some(error) => Err(ClientError::remote(Some(error), ClientError::ConnectionClosed)),
                None => Ok(()),
            };
        }
    }
}

fn unexpected(performative: &Performative, waiting_for: &str) -> ClientError {
    ClientError::UnexpectedFrame(format!(
        "{} while waiting for {}",
        performative.name(),
        waiting_for
    ))
}
