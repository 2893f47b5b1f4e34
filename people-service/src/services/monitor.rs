//! Connection-state tracking for the MongoDB client.
//!
//! The driver reports topology and heartbeat events; this module folds them
//! into opened / closed / errored transitions and logs each one. The state is
//! informational only and never gates request handling.

use mongodb::event::sdam::{
    SdamEventHandler, ServerClosedEvent, ServerHeartbeatFailedEvent,
    ServerHeartbeatSucceededEvent, ServerOpeningEvent, TopologyClosedEvent,
};
use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    Connecting = 0,
    Open = 1,
    Closed = 2,
    Errored = 3,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => ConnectionState::Open,
            2 => ConnectionState::Closed,
            3 => ConnectionState::Errored,
            _ => ConnectionState::Connecting,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    Opened { address: String },
    Closed { address: String },
    Errored { address: String, error: String },
}

#[derive(Debug)]
pub struct ConnectionMonitor {
    state: AtomicU8,
}

impl Default for ConnectionMonitor {
    fn default() -> Self {
        Self {
            state: AtomicU8::new(ConnectionState::Connecting as u8),
        }
    }
}

impl ConnectionMonitor {
    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Applies an event and returns the state it left behind. Repeated events
    /// for the current state are logged at debug only.
    pub fn record(&self, event: ConnectionEvent) -> ConnectionState {
        let next = match &event {
            ConnectionEvent::Opened { .. } => ConnectionState::Open,
            ConnectionEvent::Closed { .. } => ConnectionState::Closed,
            ConnectionEvent::Errored { .. } => ConnectionState::Errored,
        };
        let previous = ConnectionState::from_u8(self.state.swap(next as u8, Ordering::AcqRel));

        if previous == next {
            tracing::debug!(?event, "MongoDB connection event");
            return next;
        }

        match event {
            ConnectionEvent::Opened { address } => {
                tracing::info!(address = %address, "Connected to MongoDB")
            }
            ConnectionEvent::Closed { address } => {
                tracing::info!(address = %address, "Disconnected from MongoDB")
            }
            ConnectionEvent::Errored { address, error } => {
                tracing::error!(address = %address, error = %error, "MongoDB connection error")
            }
        }
        next
    }
}

impl SdamEventHandler for ConnectionMonitor {
    fn handle_server_opening_event(&self, event: ServerOpeningEvent) {
        tracing::debug!(address = %event.address, "MongoDB server monitor opening");
    }

    fn handle_server_heartbeat_succeeded_event(&self, event: ServerHeartbeatSucceededEvent) {
        self.record(ConnectionEvent::Opened {
            address: event.server_address.to_string(),
        });
    }

    fn handle_server_heartbeat_failed_event(&self, event: ServerHeartbeatFailedEvent) {
        self.record(ConnectionEvent::Errored {
            address: event.server_address.to_string(),
            error: event.failure.to_string(),
        });
    }

    fn handle_server_closed_event(&self, event: ServerClosedEvent) {
        self.record(ConnectionEvent::Closed {
            address: event.address.to_string(),
        });
    }

    fn handle_topology_closed_event(&self, _event: TopologyClosedEvent) {
        self.record(ConnectionEvent::Closed {
            address: "topology".to_string(),
        });
    }
}
