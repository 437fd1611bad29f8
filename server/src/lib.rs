#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Multi-session server for Dice Defense.
//!
//! A [`SessionRegistry`] owns the running sessions and subscribes each one to
//! an explicitly constructed [`Scheduler`]. The scheduler ticks every session
//! at a fixed rate and pushes snapshots to the connections attached through
//! the TCP [`listener`].

pub mod config;
pub mod error;
pub mod listener;
pub mod protocol;
pub mod registry;
pub mod scheduler;
pub mod transport;

pub use crate::config::ServerConfig;
pub use error::{ServerError, TickError};
pub use registry::{LiveSession, SessionId, SessionRegistry};
pub use scheduler::{CycleReport, Scheduler, SessionDriver, SubscriptionId};
pub use transport::{ConnectionId, Connections, Inbound, Outbound};
