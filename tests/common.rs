#![allow(dead_code)]

use std::io;

use amqp_types_shim::ClientOptions;
use amqp_types_shim_protocol::{
    codec::{Decoder, Encoder},
    error::DecodeError,
    frame::{
        Attach, Begin, Close, Detach, End, Frame, FrameBody, Open, Performative, ProtocolHeader,
        Role, SaslFrame, SaslMechanisms, SaslOutcome, Source, Target, Transmission,
    },
    message::{Message, Symbol},
};
use bytes::{Buf, BufMut, BytesMut};
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{Decoder as TokioDecoder, Encoder as TokioEncoder, Framed};

#[derive(Default)]
pub struct PeerCodec {}

impl TokioDecoder for PeerCodec {
    type Item = Transmission;
    type Error = io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Transmission>, io::Error> {
        match Transmission::decode(buf) {
            Ok((remaining, transmission)) => {
                let len = remaining.len();
                buf.advance(buf.len() - len);
                Ok(Some(transmission))
            }
            Err(DecodeError::Incomplete(_)) => Ok(None),
            Err(e) => Err(io::Error::new(io::ErrorKind::InvalidData, format!("{:?}", e))),
        }
    }
}

impl TokioEncoder<Transmission> for PeerCodec {
    type Error = io::Error;

    fn encode(&mut self, item: Transmission, buf: &mut BytesMut) -> Result<(), io::Error> {
        let mut writer = buf.writer();
        item.encode(&mut writer)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("{:?}", e)))
    }
}

/// Listener standing in for the broker, each test scripts the frames it
/// answers with.
pub struct TestBroker {
    listener: TcpListener,
    pub address: String,
}

impl TestBroker {
    pub async fn bind() -> TestBroker {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        TestBroker { listener, address }
    }

    pub fn options(&self) -> ClientOptions {
        ClientOptions::from_address(&self.address).unwrap()
    }

    pub async fn accept(&self) -> Peer {
        let (stream, _) = self.listener.accept().await.unwrap();
        Peer {
            transport: Framed::new(stream, PeerCodec::default()),
            max_frame_size: 65536,
        }
    }
}

pub struct Peer {
    transport: Framed<TcpStream, PeerCodec>,
    pub max_frame_size: u32,
}

impl Peer {
    pub async fn next(&mut self) -> Transmission {
        self.transport.next().await.unwrap().unwrap()
    }

    pub async fn expect_header(&mut self, header: ProtocolHeader) {
        assert_eq!(Transmission::Header(header), self.next().await);
        self.transport
            .send(Transmission::from(header))
            .await
            .unwrap();
    }

    pub async fn recv_sasl(&mut self) -> SaslFrame {
        match self.next().await {
            Transmission::Frame(Frame {
                body: FrameBody::Sasl(frame),
                ..
            }) => frame,
            other => panic!("expected a SASL frame, got {:?}", other),
        }
    }

    pub async fn send_sasl(&mut self, frame: SaslFrame) {
        self.transport
            .send(Transmission::from(Frame::sasl(frame)))
            .await
            .unwrap();
    }

    pub async fn recv(&mut self) -> (Performative, Vec<u8>) {
        match self.next().await {
            Transmission::Frame(Frame {
                body:
                    FrameBody::Amqp {
                        performative,
                        payload,
                    },
                ..
            }) => (performative, payload),
            other => panic!("expected an AMQP frame, got {:?}", other),
        }
    }

    pub async fn send(&mut self, performative: Performative) {
        self.send_with_payload(performative, vec![]).await
    }

    pub async fn send_with_payload(&mut self, performative: Performative, payload: Vec<u8>) {
        self.transport
            .send(Transmission::from(Frame::with_payload(
                0,
                performative,
                payload,
            )))
            .await
            .unwrap();
    }

    /// SASL ANONYMOUS, then open and begin
    pub async fn handshake(&mut self) {
        self.expect_header(ProtocolHeader::Sasl).await;
        self.send_sasl(SaslFrame::Mechanisms(SaslMechanisms {
            mechanisms: vec![Symbol::from("ANONYMOUS"), Symbol::from("PLAIN")],
        }))
        .await;
        match self.recv_sasl().await {
            SaslFrame::Init(init) => assert_eq!("ANONYMOUS", init.mechanism.as_str()),
            other => panic!("expected sasl-init, got {:?}", other),
        }
        self.send_sasl(SaslFrame::Outcome(SaslOutcome {
            code: 0,
            additional_data: None,
        }))
        .await;

        self.expect_header(ProtocolHeader::Amqp).await;
        match self.recv().await {
            (Performative::Open(_), _) => {}
            (other, _) => panic!("expected open, got {:?}", other),
        }
        self.send(Performative::Open(Open {
            container_id: "test-broker".to_owned(),
            hostname: None,
            max_frame_size: Some(self.max_frame_size),
            channel_max: Some(0),
            idle_time_out: None,
        }))
        .await;

        match self.recv().await {
            (Performative::Begin(begin), _) => assert_eq!(None, begin.remote_channel),
            (other, _) => panic!("expected begin, got {:?}", other),
        }
        self.send(Performative::Begin(Begin {
            remote_channel: Some(0),
            next_outgoing_id: 0,
            incoming_window: 2048,
            outgoing_window: 2048,
            handle_max: None,
        }))
        .await;
    }

    pub async fn recv_attach(&mut self) -> Attach {
        match self.recv().await {
            (Performative::Attach(attach), _) => attach,
            (other, _) => panic!("expected attach, got {:?}", other),
        }
    }

    /// Answer the link attach with the mirrored role on handle 0
    pub async fn accept_link(&mut self) -> Attach {
        let attach = self.recv_attach().await;
        let role = match attach.role {
            Role::Sender => Role::Receiver,
            Role::Receiver => Role::Sender,
        };
        self.send(Performative::Attach(Attach {
            name: attach.name.clone(),
            handle: 0,
            role,
            snd_settle_mode: attach.snd_settle_mode,
            rcv_settle_mode: attach.rcv_settle_mode,
            source: attach.source.clone().or_else(|| Some(Source::default())),
            target: attach.target.clone().or_else(|| Some(Target::default())),
            initial_delivery_count: Some(0),
            max_message_size: None,
        }))
        .await;
        attach
    }

    /// Reassemble the next delivery from its transfer frames
    pub async fn recv_message(&mut self) -> (u32, usize, Message) {
        let mut delivery_id = None;
        let mut frames = 0;
        let mut payload = vec![];
        loop {
            match self.recv().await {
                (Performative::Transfer(transfer), chunk) => {
                    frames += 1;
                    delivery_id = delivery_id.or(transfer.delivery_id);
                    payload.extend_from_slice(&chunk);
                    if !transfer.more {
                        break;
                    }
                }
                (Performative::Flow(_), _) => continue,
                (other, _) => panic!("expected transfer, got {:?}", other),
            }
        }
        let (remaining, message) = Message::decode(&payload).unwrap();
        assert!(remaining.is_empty());
        (delivery_id.unwrap(), frames, message)
    }

    pub async fn expect_detach(&mut self) {
        match self.recv().await {
            (Performative::Detach(detach), _) => assert!(detach.closed),
            (other, _) => panic!("expected detach, got {:?}", other),
        }
        self.send(Performative::Detach(Detach {
            handle: 0,
            closed: true,
            error: None,
        }))
        .await;
    }

    pub async fn expect_close(&mut self) {
        match self.recv().await {
            (Performative::End(_), _) => {}
            (other, _) => panic!("expected end, got {:?}", other),
        }
        self.send(Performative::End(End::default())).await;
        match self.recv().await {
            (Performative::Close(_), _) => {}
            (other, _) => panic!("expected close, got {:?}", other),
        }
        self.send(Performative::Close(Close::default())).await;
    }
}
