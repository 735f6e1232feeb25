use std::io::Error;

use bytes::{BufMut, BytesMut};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_util::codec::{Decoder, Encoder, Framed};

pub type MessageProtocol = Framed<TcpStream, MessageCodec>;

/// Newline-delimited JSON framing for controller-facing sockets
#[derive(Debug, Default)]
pub struct MessageCodec;

impl MessageCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for MessageCodec {
    type Item = Value;
    type Error = Error;

    // Look for a full line, using serde_json to decode each message
    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Error> {
        if let Some(pos) = buf.iter().position(|b| *b == b'\n') {
            let line = buf.split_to(pos + 1);
            let message = serde_json::from_slice(&line[..pos])?;
            Ok(Some(message))
        } else {
            Ok(None)
        }
    }
}

impl Encoder<Value> for MessageCodec {
    type Error = Error;

    fn encode(&mut self, message: Value, buf: &mut BytesMut) -> Result<(), Error> {
        let encoded = serde_json::to_vec(&message)?;
        buf.reserve(encoded.len() + 1);
        buf.put_slice(&encoded);
        buf.put_u8(b'\n');
        Ok(())
    }
}
