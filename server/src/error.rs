//! Error types surfaced by the server layer.

use dice_defense_core::{units::UnknownUnitKind, DeckError};
use thiserror::Error;

use crate::registry::SessionId;

/// Failures of registry, protocol and configuration operations.
#[derive(Debug, Error)]
pub enum ServerError {
    /// No session is registered under the id.
    #[error("unknown session `{0}`")]
    UnknownSession(SessionId),
    /// The requested deck cannot be used.
    #[error("invalid deck: {0}")]
    InvalidDeck(#[from] DeckError),
    /// A unit kind name did not match the registry.
    #[error(transparent)]
    UnknownUnit(#[from] UnknownUnitKind),
    /// An inbound or outbound payload could not be (de)serialized.
    #[error("malformed payload: {0}")]
    Payload(#[from] serde_json::Error),
    /// An inbound line was not UTF-8 or exceeded the line limit.
    #[error("line is not UTF-8 or exceeds {} bytes", crate::listener::MAX_LINE_BYTES)]
    MalformedLine,
    /// Configuration sources could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
    /// Socket level failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of a single session during a scheduler cycle.
#[derive(Debug, Error)]
pub enum TickError {
    /// The snapshot could not be encoded for broadcast.
    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
    /// The driver reported a failure of its own.
    ///
    /// [`LiveSession`](crate::LiveSession) never produces it, because a
    /// simulation tick cannot fail. It is reserved for other
    /// [`SessionDriver`](crate::SessionDriver) implementations; the scheduler
    /// logs it and skips that driver for the cycle.
    #[error("session tick failed: {0}")]
    Failed(String),
}
