use amqp_types_shim_protocol::{
    codec::{Decoder, Encoder},
    error::DecodeError,
    frame::Transmission,
};
use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder as TokioDecoder, Encoder as TokioEncoder};

use crate::error::ClientError;

#[derive(Debug, Default)]
pub(crate) struct AmqpCodec {}

impl TokioDecoder for AmqpCodec {
    type Item = Transmission;
    type Error = ClientError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Transmission>, ClientError> {
        match Transmission::decode(buf) {
            Ok((remaining, transmission)) => {
                let len = remaining.len();
                buf.advance(buf.len() - len);
                Ok(Some(transmission))
            }
            Err(DecodeError::Incomplete(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl TokioEncoder<Transmission> for AmqpCodec {
    type Error = ClientError;

    fn encode(&mut self, item: Transmission, buf: &mut BytesMut) -> Result<(), ClientError> {
        let len = item.encoded_size();
        buf.reserve(len as usize);
        let mut writer = buf.writer();
        item.encode(&mut writer)?;

        Ok(())
    }
}
