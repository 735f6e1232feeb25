//! Line pipe to the BGP speaker process.
//!
//! The speaker (e.g. ExaBGP) writes one JSON document per line on our
//! stdin and reads re-injection requests one per line from our stdout.
//! This is the concrete realization of the transport boundary; the
//! core only ever sees the channels.

use log::{info, warn};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::transport::{AnnouncementRx, RouteTx};

/// Forward speaker output into the inbound route queue until EOF
pub async fn read_updates(routes: RouteTx) {
    let stdin = BufReader::new(io::stdin());
    let mut lines = stdin.lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if routes.send(line).is_err() {
                    // Dissemination loop is gone, nothing left to feed
                    break;
                }
            }
            Ok(None) => {
                info!("BGP speaker closed its pipe");
                break;
            }
            Err(err) => {
                warn!("Error reading from BGP speaker: {}", err);
                break;
            }
        }
    }
}

/// Drain announcements back out to the speaker, one JSON line each
pub async fn write_announcements(mut announcements: AnnouncementRx) {
    let mut stdout = io::stdout();
    while let Some(announcement) = announcements.recv().await {
        let mut line = announcement.into_value().to_string();
        line.push('\n');
        if let Err(err) = stdout.write_all(line.as_bytes()).await {
            warn!("Error writing announcement to BGP speaker: {}", err);
            break;
        }
        if let Err(err) = stdout.flush().await {
            warn!("Error flushing announcement to BGP speaker: {}", err);
            break;
        }
    }
}
