mod codec;
mod config;
mod delivery;
mod dissemination;
mod listener;
mod models;
pub mod speaker;
mod topology;
pub mod transport;

pub use config::{ConfigError, ExchangeConfig};
pub use delivery::{deliver, DeliveryError};
pub use dissemination::Disseminator;
pub use listener::AnnouncementListener;
pub use models::{Announcement, RouteUpdate};
pub use topology::{Participant, ParticipantId, Port, Topology};
