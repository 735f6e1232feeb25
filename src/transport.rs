//! Channel boundary to the BGP speaker bridge.
//!
//! The core only ever does a bounded-wait receive on the route channel
//! and a non-blocking send on the announcement channel; how messages
//! cross to and from the live BGP session is the bridge's business.

use tokio::sync::mpsc;

use crate::models::Announcement;

/// Raw update text from the speaker, one entry per received route
pub type RouteTx = mpsc::UnboundedSender<String>;
pub type RouteRx = mpsc::UnboundedReceiver<String>;

/// Re-injection requests headed back to the speaker
pub type AnnouncementTx = mpsc::UnboundedSender<Announcement>;
pub type AnnouncementRx = mpsc::UnboundedReceiver<Announcement>;

pub fn route_channel() -> (RouteTx, RouteRx) {
    mpsc::unbounded_channel()
}

pub fn announcement_channel() -> (AnnouncementTx, AnnouncementRx) {
    mpsc::unbounded_channel()
}
