use std::io;
use std::net::SocketAddr;

use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};

use crate::codec::{MessageCodec, MessageProtocol};
use crate::models::Announcement;
use crate::transport::AnnouncementTx;

// Fixed reply for every successfully enqueued announcement
const ACK: &str = "Announcement processed";

/// Accepts route-injection requests from participant controllers and
/// forwards them onto the announcement queue for the speaker bridge.
///
/// Connections are served strictly one at a time: read one message,
/// enqueue, acknowledge, close, then accept the next. A slow submitter
/// therefore holds up later submissions; that serialization is the
/// documented behavior, not an accident.
pub struct AnnouncementListener {
    listener: TcpListener,
}

impl AnnouncementListener {
    pub async fn bind(addr: SocketAddr) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn run(self, announcements: AnnouncementTx) {
        info!("Announcement listener started");
        loop {
            let (stream, remote) = match self.listener.accept().await {
                Ok(connection) => connection,
                Err(err) => {
                    warn!("Accepting announcement connection failed: {}", err);
                    continue;
                }
            };
            // A failed connection is that connection's problem only
            if let Err(err) = handle_connection(stream, &announcements).await {
                warn!("Announcement from {} failed: {}", remote, err);
            }
        }
    }
}

/// Read exactly one framed announcement, enqueue it, send the fixed ack
async fn handle_connection(stream: TcpStream, announcements: &AnnouncementTx) -> io::Result<()> {
    let mut protocol = MessageProtocol::new(stream, MessageCodec::new());
    let message = match protocol.next().await {
        Some(Ok(message)) => message,
        Some(Err(err)) => return Err(err),
        None => {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed before an announcement was read",
            ));
        }
    };
    debug!("Received an announcement");
    announcements
        .send(Announcement::new(message))
        .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "announcement queue closed"))?;
    protocol.send(Value::from(ACK)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport;
    use serde_json::json;
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;
    use tokio::time;

    async fn submit(addr: SocketAddr, announcement: Value) -> Value {
        let stream = TcpStream::connect(addr).await.unwrap();
        let mut protocol = MessageProtocol::new(stream, MessageCodec::new());
        protocol.send(announcement).await.unwrap();
        protocol.next().await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_announcement_round_trip() {
        let listener = AnnouncementListener::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, mut rx) = transport::announcement_channel();
        let server = tokio::spawn(listener.run(tx));

        let announcement = json!({"asn": 100, "route": {"prefix": "4.5.6.0/24"}});
        let reply = submit(addr, announcement.clone()).await;
        assert_eq!(reply, json!(ACK));

        let queued = rx.recv().await.unwrap();
        assert_eq!(queued.value(), &announcement);
        server.abort();
    }

    #[tokio::test]
    async fn test_announcements_kept_in_submission_order() {
        let listener = AnnouncementListener::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, mut rx) = transport::announcement_channel();
        let server = tokio::spawn(listener.run(tx));

        for seq in 0..3 {
            submit(addr, json!({ "seq": seq })).await;
        }
        for seq in 0..3 {
            assert_eq!(rx.recv().await.unwrap().value(), &json!({ "seq": seq }));
        }
        server.abort();
    }

    #[tokio::test]
    async fn test_malformed_message_fails_only_that_connection() {
        let listener = AnnouncementListener::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, mut rx) = transport::announcement_channel();
        let server = tokio::spawn(listener.run(tx));

        // Garbage line: no ack, nothing enqueued, listener stays up
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(b"not json\n").await.unwrap();
        drop(stream);

        // Connection closed without sending anything at all
        let stream = TcpStream::connect(addr).await.unwrap();
        drop(stream);

        let reply = submit(addr, json!({"ok": true})).await;
        assert_eq!(reply, json!(ACK));
        assert_eq!(rx.recv().await.unwrap().value(), &json!({"ok": true}));
        assert!(
            time::timeout(Duration::from_millis(100), rx.recv())
                .await
                .is_err(),
            "garbage submissions must not be enqueued"
        );
        server.abort();
    }
}
