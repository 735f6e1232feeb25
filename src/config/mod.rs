mod file;

use std::collections::HashSet;
use std::error;
use std::fmt;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

#[derive(Debug)]
pub struct ExchangeConfig {
    pub listener_addr: SocketAddr,
    pub poll_interval: Duration,
    pub delivery_timeout: Duration,
    pub participants: Vec<ParticipantConfig>,
}

#[derive(Clone, Debug)]
pub struct PortConfig {
    pub id: String,
    pub ip: IpAddr,
    pub mac: String,
}

/// In-Memory representation of a Participant config
///   Has the legacy `peers` key expanded into both directional relations
#[derive(Clone, Debug)]
pub struct ParticipantConfig {
    pub id: u32,
    pub asn: u32,
    pub controller: SocketAddr,
    pub ports: Vec<PortConfig>,
    pub peers_in: HashSet<u32>,
    pub peers_out: HashSet<u32>,
}

impl ExchangeConfig {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let spec = file::ExchangeConfigSpec::from_file(path)?;
        Ok(Self::from_spec(spec))
    }

    fn from_spec(spec: file::ExchangeConfigSpec) -> Self {
        let participants: Vec<_> = spec
            .participants
            .into_iter()
            .map(|p| {
                let undirected: HashSet<u32> =
                    p.peers.clone().unwrap_or_default().into_iter().collect();
                let peers_in = p
                    .peers_in
                    .map(|peers| peers.into_iter().collect())
                    .unwrap_or_else(|| undirected.clone());
                let peers_out = p
                    .peers_out
                    .map(|peers| peers.into_iter().collect())
                    .unwrap_or(undirected);
                ParticipantConfig {
                    id: p.id,
                    asn: p.asn,
                    controller: p.controller,
                    ports: p
                        .ports
                        .into_iter()
                        .map(|port| PortConfig {
                            id: port.id,
                            ip: port.ip,
                            mac: port.mac,
                        })
                        .collect(),
                    peers_in,
                    peers_out,
                }
            })
            .collect();

        Self {
            listener_addr: spec.exchange.announcement_listener,
            poll_interval: Duration::from_millis(spec.exchange.poll_interval_ms),
            delivery_timeout: Duration::from_millis(spec.exchange.delivery_timeout_ms),
            participants,
        }
    }
}

/// Fatal startup failures: a config that can't be read, parsed,
/// or assembled into a consistent topology
#[derive(Debug)]
pub enum ConfigError {
    /// Failed reading the config file
    Read(io::Error),
    /// Config file is not a valid TOML document
    Parse(toml::de::Error),
    /// Two participant entries claim the same id
    DuplicateParticipant(u32),
    /// Two participants claim the same ASN
    DuplicateAsn(u32),
    /// A port id appears on more than one participant
    DuplicatePort(String),
    /// An attachment IP appears on more than one participant
    DuplicateIp(IpAddr),
    /// An attachment MAC appears on more than one participant
    DuplicateMac(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Config Error: ")?;
        use ConfigError::*;
        match self {
            Read(err) => write!(f, "{}", err),
            Parse(err) => write!(f, "{}", err),
            DuplicateParticipant(id) => write!(f, "Duplicate participant id {}", id),
            DuplicateAsn(asn) => write!(f, "Duplicate ASN {}", asn),
            DuplicatePort(port) => write!(f, "Duplicate port id '{}'", port),
            DuplicateIp(ip) => write!(f, "Duplicate attachment IP {}", ip),
            DuplicateMac(mac) => write!(f, "Duplicate attachment MAC {}", mac),
        }
    }
}

impl From<io::Error> for ConfigError {
    fn from(error: io::Error) -> Self {
        ConfigError::Read(error)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(error: toml::de::Error) -> Self {
        ConfigError::Parse(error)
    }
}

impl error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            ConfigError::Read(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
            _ => None,
        }
    }
}
