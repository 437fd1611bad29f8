//! Per-session fan-out of encoded messages to connected clients.

use std::collections::BTreeMap;

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;

/// Messages a connection may have queued before it is treated as stalled.
pub const OUTBOUND_CAPACITY: usize = 64;

/// Outbound half of a client connection.
pub type Outbound = mpsc::Sender<String>;

/// Receiving half drained by a connection's writer.
pub type Inbound = mpsc::Receiver<String>;

/// Creates the bounded queue between a session and one connection writer.
#[must_use]
pub fn channel() -> (Outbound, Inbound) {
    mpsc::channel(OUTBOUND_CAPACITY)
}

/// Identifier of a connection within its session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new connection identifier.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Connections attached to one session.
#[derive(Debug, Default)]
pub struct Connections {
    next_id: u64,
    peers: BTreeMap<ConnectionId, Outbound>,
}

impl Connections {
    /// Creates an empty connection set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection and returns its identifier.
    pub fn attach(&mut self, outbound: Outbound) -> ConnectionId {
        let id = ConnectionId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        let _ = self.peers.insert(id, outbound);
        id
    }

    /// Removes a connection; returns whether it was attached.
    pub fn detach(&mut self, id: ConnectionId) -> bool {
        self.peers.remove(&id).is_some()
    }

    /// Number of attached connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// Reports whether no connection is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Sends `payload` to a single connection, detaching it on failure.
    pub fn send_to(&mut self, id: ConnectionId, payload: &str) -> bool {
        let Some(outbound) = self.peers.get(&id) else {
            return false;
        };
        if deliver(id, outbound, payload) {
            return true;
        }
        let _ = self.peers.remove(&id);
        false
    }

    /// Sends `payload` to every connection and returns how many received it.
    ///
    /// Connections whose receiving half is gone, or whose queue is full, are
    /// detached; delivery to the remaining connections continues.
    pub fn broadcast(&mut self, payload: &str) -> usize {
        let mut delivered = 0;
        self.peers.retain(|id, outbound| {
            let kept = deliver(*id, outbound, payload);
            if kept {
                delivered += 1;
            }
            kept
        });
        delivered
    }
}

fn deliver(id: ConnectionId, outbound: &Outbound, payload: &str) -> bool {
    match outbound.try_send(payload.to_owned()) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            debug!(connection = id.get(), "dropping stalled connection");
            false
        }
        Err(TrySendError::Closed(_)) => {
            debug!(connection = id.get(), "dropping closed connection");
            false
        }
    }
}
