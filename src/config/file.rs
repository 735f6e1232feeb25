use std::fs::File;
use std::io::Read;
use std::net::{IpAddr, SocketAddr};

use serde::Deserialize;

use super::ConfigError;

struct Defaults {}

impl Defaults {
    fn poll_interval_ms() -> u64 {
        1000
    }

    fn delivery_timeout_ms() -> u64 {
        2000
    }
}

/// Config (toml) representation of an exchange-side attachment port
#[derive(Clone, Debug, Deserialize)]
pub(super) struct PortSpec {
    pub(super) id: String,
    pub(super) ip: IpAddr,
    pub(super) mac: String,
}

/// Config (toml) representation of a Participant
#[derive(Clone, Debug, Deserialize)]
pub(super) struct ParticipantSpec {
    pub(super) id: u32,
    pub(super) asn: u32,
    // Controller endpoint that approved route updates are delivered to
    pub(super) controller: SocketAddr,
    #[serde(default = "Vec::new")]
    pub(super) ports: Vec<PortSpec>,

    // Legacy undirected relation: fills both directions when the
    // directional keys below are absent
    pub(super) peers: Option<Vec<u32>>,
    // Participants this one accepts announcements from
    pub(super) peers_in: Option<Vec<u32>>,
    // Participants this one is willing to announce to
    pub(super) peers_out: Option<Vec<u32>>,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct ExchangeSpec {
    // Socket participant controllers submit announcements to
    pub(super) announcement_listener: SocketAddr,

    // Bounded wait on the inbound route queue
    #[serde(default = "Defaults::poll_interval_ms")]
    pub(super) poll_interval_ms: u64,

    // Per-delivery connect/reply timeout
    #[serde(default = "Defaults::delivery_timeout_ms")]
    pub(super) delivery_timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub(super) struct ExchangeConfigSpec {
    pub(super) exchange: ExchangeSpec,
    #[serde(default = "Vec::new")]
    pub(super) participants: Vec<ParticipantSpec>,
}

impl ExchangeConfigSpec {
    pub(super) fn from_file(path: &str) -> Result<Self, ConfigError> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        let config: ExchangeConfigSpec = toml::from_str(&contents)?;
        Ok(config)
    }
}
