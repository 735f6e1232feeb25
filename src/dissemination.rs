use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::watch;
use tokio::time;

use crate::delivery;
use crate::models::RouteUpdate;
use crate::topology::{ParticipantId, Topology};
use crate::transport::RouteRx;

// After the first idle diagnostic, log again every this many
// consecutive empty polls
const IDLE_LOG_PERIOD: u32 = 30;

/// The main control loop: drains inbound route updates, resolves the
/// advertising participant from the attachment IP, evaluates peering
/// authorization against every participant, and synchronously delivers
/// approved updates to each eligible controller.
pub struct Disseminator {
    topology: Arc<Topology>,
    inbound: RouteRx,
    poll_interval: Duration,
    delivery_timeout: Duration,
    shutdown: watch::Receiver<bool>,
}

impl Disseminator {
    pub fn new(
        topology: Arc<Topology>,
        inbound: RouteRx,
        poll_interval: Duration,
        delivery_timeout: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            topology,
            inbound,
            poll_interval,
            delivery_timeout,
            shutdown,
        }
    }

    /// Poll the route queue until shutdown is signaled or the speaker
    /// bridge hangs up. Nothing that happens to a single update is
    /// allowed to stop the loop.
    pub async fn run(mut self) {
        info!("Starting route dissemination...");
        let mut idle_polls: u32 = 0;

        loop {
            if *self.shutdown.borrow() {
                info!("Stop signal received, ending dissemination");
                break;
            }
            match time::timeout(self.poll_interval, self.inbound.recv()).await {
                Ok(Some(raw)) => {
                    idle_polls = 0;
                    self.process(&raw).await;
                }
                Ok(None) => {
                    info!("Inbound route queue closed, ending dissemination");
                    break;
                }
                Err(_) => {
                    // First empty poll logs right away, then every
                    // IDLE_LOG_PERIOD'th so an idle exchange doesn't
                    // flood the log
                    if idle_polls == 0 {
                        debug!("Waiting for BGP update...");
                        idle_polls = 1;
                    } else {
                        idle_polls = (idle_polls % IDLE_LOG_PERIOD) + 1;
                        if idle_polls == IDLE_LOG_PERIOD {
                            debug!("Waiting for BGP update...");
                        }
                    }
                }
            }
        }
    }

    /// Handle one raw update: deserialize, resolve the advertiser,
    /// fan out to every participant that passes the two-way check
    async fn process(&self, raw: &str) {
        let update = match RouteUpdate::from_json(raw) {
            Ok(update) => update,
            Err(err) => {
                warn!("Dropping undecodable route update: {}", err);
                return;
            }
        };
        let advertiser = match update
            .neighbor_ip()
            .and_then(|ip| self.topology.resolve_by_ip(ip))
        {
            Some(id) => id,
            None => {
                // Updates from unconfigured attachments are expected traffic
                debug!("Dropping route update from unknown attachment");
                return;
            }
        };
        debug!("Got route update from participant {}", advertiser);

        for receiver in self.topology.eligible_receivers(advertiser) {
            self.send_update(receiver, &update).await;
        }
    }

    /// One synchronous delivery attempt; failure is logged and the
    /// fan-out to remaining receivers continues
    async fn send_update(&self, receiver: ParticipantId, update: &RouteUpdate) {
        let endpoint = match self.topology.get(receiver) {
            Some(participant) => participant.controller,
            None => return,
        };
        debug!("Sending route update to participant {}", receiver);
        if let Err(err) = delivery::deliver(endpoint, update, self.delivery_timeout).await {
            warn!("Delivery to participant {} failed: {}", receiver, err);
        }
    }
}
