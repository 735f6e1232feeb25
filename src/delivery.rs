use std::error;
use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use log::trace;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::time;

use crate::codec::{MessageCodec, MessageProtocol};
use crate::models::RouteUpdate;

#[derive(Debug)]
pub enum DeliveryError {
    /// Controller endpoint refused or failed the connection
    Connect(io::Error),
    /// Sending the envelope failed mid-stream
    Send(io::Error),
    /// Connect or reply exceeded the delivery timeout
    Timeout,
    /// Controller closed the connection before acknowledging
    NoReply,
    /// Reply was not a decodable message [reason]
    MalformedReply(String),
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Delivery Error: ")?;
        use DeliveryError::*;
        match self {
            Connect(err) => write!(f, "Connect failed [{}]", err),
            Send(err) => write!(f, "Send failed [{}]", err),
            Timeout => write!(f, "Timed out"),
            NoReply => write!(f, "Connection closed before reply"),
            MalformedReply(reason) => write!(f, "Malformed reply [{}]", reason),
        }
    }
}

impl error::Error for DeliveryError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            DeliveryError::Connect(err) | DeliveryError::Send(err) => Some(err),
            _ => None,
        }
    }
}

/// Send one route update to a participant controller: a fresh
/// connection per delivery, one envelope out, one acknowledgment
/// back, then the connection is dropped. No reuse, no retry.
pub async fn deliver(
    endpoint: SocketAddr,
    update: &RouteUpdate,
    timeout: Duration,
) -> Result<Value, DeliveryError> {
    let stream = time::timeout(timeout, TcpStream::connect(endpoint))
        .await
        .map_err(|_| DeliveryError::Timeout)?
        .map_err(DeliveryError::Connect)?;
    let mut protocol = MessageProtocol::new(stream, MessageCodec::new());

    protocol
        .send(update.envelope())
        .await
        .map_err(DeliveryError::Send)?;

    let reply = time::timeout(timeout, protocol.next())
        .await
        .map_err(|_| DeliveryError::Timeout)?;
    match reply {
        Some(Ok(ack)) => {
            trace!("Controller {} acknowledged: {}", endpoint, ack);
            Ok(ack)
        }
        Some(Err(err)) => Err(DeliveryError::MalformedReply(err.to_string())),
        None => Err(DeliveryError::NoReply),
    }
}
