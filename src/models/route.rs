use std::net::IpAddr;

use serde_json::{json, Value};

/// A single BGP update as received from the speaker bridge.
///
/// The payload is opaque; only `neighbor.ip` (the exchange-side
/// attachment the route arrived on) is ever inspected, everything
/// else passes through to the delivery envelope unmodified.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteUpdate {
    payload: Value,
}

impl RouteUpdate {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let payload = serde_json::from_str(raw)?;
        Ok(Self { payload })
    }

    /// Attachment address the update arrived on, if present and parsable
    pub fn neighbor_ip(&self) -> Option<IpAddr> {
        self.payload
            .get("neighbor")
            .and_then(|neighbor| neighbor.get("ip"))
            .and_then(Value::as_str)
            .and_then(|ip| ip.parse().ok())
    }

    /// Envelope sent to participant controllers
    pub fn envelope(&self) -> Value {
        json!({ "bgp": self.payload })
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }
}

impl From<Value> for RouteUpdate {
    fn from(payload: Value) -> Self {
        Self { payload }
    }
}
