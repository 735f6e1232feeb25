use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use log::warn;

use crate::config::{ConfigError, ExchangeConfig};

pub type ParticipantId = u32;

/// Exchange-side attachment point a participant's BGP session is reachable through
#[derive(Clone, Debug, PartialEq)]
pub struct Port {
    pub id: String,
    pub ip: IpAddr,
    pub mac: String,
}

#[derive(Clone, Debug)]
pub struct Participant {
    pub id: ParticipantId,
    pub asn: u32,
    pub ports: Vec<Port>,
    // Participants this one accepts announcements from (receiver-side check)
    pub peers_in: HashSet<ParticipantId>,
    // Participants this one is willing to announce to (advertiser-side check)
    pub peers_out: HashSet<ParticipantId>,
    pub controller: SocketAddr,
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "<Participant {} AS{} ports={}>",
            self.id,
            self.asn,
            self.ports.len()
        )
    }
}

/// Immutable-after-load view of the exchange: participants and the
/// attachment indices (port, IP, MAC, ASN) they are resolved through.
///
/// Built once at startup; both long-running loops share it read-only.
pub struct Topology {
    participants: BTreeMap<ParticipantId, Participant>,
    by_port: HashMap<String, ParticipantId>,
    by_ip: HashMap<IpAddr, ParticipantId>,
    by_mac: HashMap<String, ParticipantId>,
    by_asn: HashMap<u32, ParticipantId>,
}

impl Topology {
    pub fn new(config: &ExchangeConfig) -> Result<Self, ConfigError> {
        let mut participants = BTreeMap::new();
        let mut by_port = HashMap::new();
        let mut by_ip = HashMap::new();
        let mut by_mac = HashMap::new();
        let mut by_asn = HashMap::new();

        for entry in &config.participants {
            if participants.contains_key(&entry.id) {
                return Err(ConfigError::DuplicateParticipant(entry.id));
            }
            if by_asn.insert(entry.asn, entry.id).is_some() {
                return Err(ConfigError::DuplicateAsn(entry.asn));
            }

            let mut ports = Vec::with_capacity(entry.ports.len());
            for port in &entry.ports {
                let mac = port.mac.to_ascii_lowercase();
                if by_port.insert(port.id.clone(), entry.id).is_some() {
                    return Err(ConfigError::DuplicatePort(port.id.clone()));
                }
                if by_ip.insert(port.ip, entry.id).is_some() {
                    return Err(ConfigError::DuplicateIp(port.ip));
                }
                if by_mac.insert(mac.clone(), entry.id).is_some() {
                    return Err(ConfigError::DuplicateMac(mac));
                }
                ports.push(Port {
                    id: port.id.clone(),
                    ip: port.ip,
                    mac,
                });
            }

            participants.insert(
                entry.id,
                Participant {
                    id: entry.id,
                    asn: entry.asn,
                    ports,
                    peers_in: entry.peers_in.clone(),
                    peers_out: entry.peers_out.clone(),
                    controller: entry.controller,
                },
            );
        }

        // Peer references to unconfigured ids never match, but are worth flagging
        for participant in participants.values() {
            for peer in participant.peers_in.iter().chain(&participant.peers_out) {
                if !participants.contains_key(peer) {
                    warn!(
                        "Participant {} lists unknown peer {}",
                        participant.id, peer
                    );
                }
            }
        }

        Ok(Self {
            participants,
            by_port,
            by_ip,
            by_mac,
            by_asn,
        })
    }

    pub fn resolve_by_ip(&self, ip: IpAddr) -> Option<ParticipantId> {
        self.by_ip.get(&ip).copied()
    }

    pub fn resolve_by_port(&self, port_id: &str) -> Option<ParticipantId> {
        self.by_port.get(port_id).copied()
    }

    pub fn resolve_by_mac(&self, mac: &str) -> Option<ParticipantId> {
        self.by_mac.get(&mac.to_ascii_lowercase()).copied()
    }

    pub fn resolve_by_asn(&self, asn: u32) -> Option<ParticipantId> {
        self.by_asn.get(&asn).copied()
    }

    pub fn get(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.get(&id)
    }

    /// Participant ids in ascending order (the fan-out order)
    pub fn ids(&self) -> impl Iterator<Item = ParticipantId> + '_ {
        self.participants.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Participants a route advertised by `advertiser` may be revealed to:
    /// both directions must agree, the advertiser willing to announce out
    /// and the receiver willing to accept in. Agreement is checked, never
    /// assumed symmetric.
    pub fn eligible_receivers(&self, advertiser: ParticipantId) -> Vec<ParticipantId> {
        let advertising = match self.participants.get(&advertiser) {
            Some(participant) => participant,
            None => return Vec::new(),
        };
        self.participants
            .values()
            .filter(|receiver| {
                advertising.peers_out.contains(&receiver.id)
                    && receiver.peers_in.contains(&advertiser)
            })
            .map(|receiver| receiver.id)
            .collect()
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<Topology participants={}>", self.participants.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ParticipantConfig, PortConfig};
    use std::time::Duration;

    fn port(id: &str, ip: &str, mac: &str) -> PortConfig {
        PortConfig {
            id: id.to_string(),
            ip: ip.parse().unwrap(),
            mac: mac.to_string(),
        }
    }

    fn participant(
        id: u32,
        asn: u32,
        ports: Vec<PortConfig>,
        peers_in: &[u32],
        peers_out: &[u32],
    ) -> ParticipantConfig {
        ParticipantConfig {
            id,
            asn,
            controller: format!("127.0.0.1:{}", 6000 + id).parse().unwrap(),
            ports,
            peers_in: peers_in.iter().copied().collect(),
            peers_out: peers_out.iter().copied().collect(),
        }
    }

    fn config(participants: Vec<ParticipantConfig>) -> ExchangeConfig {
        ExchangeConfig {
            listener_addr: "127.0.0.1:6000".parse().unwrap(),
            poll_interval: Duration::from_millis(1000),
            delivery_timeout: Duration::from_millis(2000),
            participants,
        }
    }

    #[test]
    fn test_attachment_lookups() {
        let topology = Topology::new(&config(vec![
            participant(
                1,
                100,
                vec![port("phy1", "10.0.0.1", "08:00:27:89:3B:9F")],
                &[2],
                &[2],
            ),
            participant(
                2,
                200,
                vec![
                    port("phy2", "10.0.0.2", "08:00:27:92:18:1f"),
                    port("phy3", "10.0.0.3", "08:00:27:54:56:ea"),
                ],
                &[1],
                &[1],
            ),
        ]))
        .unwrap();

        assert_eq!(topology.len(), 2);
        assert_eq!(topology.resolve_by_ip("10.0.0.1".parse().unwrap()), Some(1));
        assert_eq!(topology.resolve_by_ip("10.0.0.3".parse().unwrap()), Some(2));
        assert_eq!(topology.resolve_by_ip("10.9.9.9".parse().unwrap()), None);
        assert_eq!(topology.resolve_by_port("phy2"), Some(2));
        // MAC resolution is case-insensitive
        assert_eq!(topology.resolve_by_mac("08:00:27:89:3b:9f"), Some(1));
        assert_eq!(topology.resolve_by_mac("08:00:27:54:56:EA"), Some(2));
        assert_eq!(topology.resolve_by_asn(200), Some(2));
        assert_eq!(topology.resolve_by_asn(300), None);
        assert_eq!(topology.ids().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_duplicate_ip_err() {
        let result = Topology::new(&config(vec![
            participant(
                1,
                100,
                vec![port("phy1", "10.0.0.1", "08:00:27:89:3b:9f")],
                &[],
                &[],
            ),
            participant(
                2,
                200,
                vec![port("phy2", "10.0.0.1", "08:00:27:92:18:1f")],
                &[],
                &[],
            ),
        ]));
        assert!(matches!(result, Err(ConfigError::DuplicateIp(_))));
    }

    #[test]
    fn test_duplicate_port_id_err() {
        let result = Topology::new(&config(vec![
            participant(
                1,
                100,
                vec![port("phy1", "10.0.0.1", "08:00:27:89:3b:9f")],
                &[],
                &[],
            ),
            participant(
                2,
                200,
                vec![port("phy1", "10.0.0.2", "08:00:27:92:18:1f")],
                &[],
                &[],
            ),
        ]));
        assert!(matches!(result, Err(ConfigError::DuplicatePort(_))));
    }

    #[test]
    fn test_duplicate_asn_err() {
        let result = Topology::new(&config(vec![
            participant(1, 100, vec![], &[], &[]),
            participant(2, 100, vec![], &[], &[]),
        ]));
        assert!(matches!(result, Err(ConfigError::DuplicateAsn(100))));
    }

    #[test]
    fn test_duplicate_participant_id_err() {
        let result = Topology::new(&config(vec![
            participant(1, 100, vec![], &[], &[]),
            participant(1, 200, vec![], &[], &[]),
        ]));
        assert!(matches!(result, Err(ConfigError::DuplicateParticipant(1))));
    }

    #[test]
    fn test_eligible_receivers_require_agreement() {
        let topology = Topology::new(&config(vec![
            // 1 announces to 2 and 3
            participant(1, 100, vec![], &[2], &[2, 3]),
            // 2 accepts from 1
            participant(2, 200, vec![], &[1], &[1]),
            // 3 does NOT accept from 1
            participant(3, 300, vec![], &[], &[]),
        ]))
        .unwrap();

        assert_eq!(topology.eligible_receivers(1), vec![2]);
        assert_eq!(topology.eligible_receivers(2), vec![1]);
        // 3 announces to nobody
        assert_eq!(topology.eligible_receivers(3), Vec::<u32>::new());
        // Unknown advertiser resolves to an empty fan-out
        assert_eq!(topology.eligible_receivers(9), Vec::<u32>::new());
    }

    #[test]
    fn test_self_forwarding_is_config_driven() {
        // A participant listing itself in both relations is forwarded
        // its own routes; nothing in the code special-cases it
        let topology = Topology::new(&config(vec![participant(1, 100, vec![], &[1], &[1])]))
            .unwrap();
        assert_eq!(topology.eligible_receivers(1), vec![1]);
    }
}
