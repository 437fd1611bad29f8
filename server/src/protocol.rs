//! JSON wire protocol exchanged with clients.
//!
//! Every message is a single JSON object tagged by its `"type"` field. On the
//! TCP transport each object occupies one line.

use dice_defense_core::{CellIndex, MapLayout, PlayerCommand, SessionSnapshot, UnitKind};
use serde::{Deserialize, Serialize};

use crate::error::ServerError;

/// First message of a connection: join an existing room or open a new one.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Handshake {
    /// Opens a new room, optionally with an explicit deck.
    Create {
        /// Unit kind names; the server default deck is used when absent.
        #[serde(default)]
        deck: Option<Vec<String>>,
    },
    /// Joins the room with the given code.
    Join {
        /// Six character room code.
        room: String,
    },
}

/// Gameplay messages sent by clients.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    /// Summons a random deck unit into a random empty cell.
    #[serde(alias = "SUMMON")]
    Spawn,
    /// Merges the unit at `source_index` into the unit at `target_index`.
    Merge {
        /// Cell holding the consumed unit.
        source_index: i64,
        /// Cell receiving the upgraded unit.
        target_index: i64,
    },
    /// Raises the power tier of a deck unit kind.
    PowerUp {
        /// Kind to upgrade.
        unit: UnitKind,
    },
}

impl ClientMessage {
    /// Converts the message into a session command.
    ///
    /// Merge indices that cannot name a cell at all (negative or beyond
    /// `u32`) are dropped here; indices past the board still reach the
    /// session and are rejected there.
    #[must_use]
    pub fn into_command(self) -> Option<PlayerCommand> {
        match self {
            Self::Spawn => Some(PlayerCommand::Summon),
            Self::Merge {
                source_index,
                target_index,
            } => {
                let source = u32::try_from(source_index).ok()?;
                let target = u32::try_from(target_index).ok()?;
                Some(PlayerCommand::Merge {
                    source: CellIndex::new(source),
                    target: CellIndex::new(target),
                })
            }
            Self::PowerUp { unit } => Some(PlayerCommand::PowerUp { kind: unit }),
        }
    }
}

/// Messages pushed to clients.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    /// Sent once on connect with the board geometry and the current state.
    Init {
        /// Room the connection joined.
        room: String,
        /// Static board geometry.
        map: MapLayout,
        /// Current session state.
        state: SessionSnapshot,
    },
    /// Full session state, pushed on the broadcast cadence.
    StateUpdate(SessionSnapshot),
    /// Reports a request the server could not honour.
    Error {
        /// Human readable reason.
        message: String,
    },
}

/// Parses a handshake line.
pub fn decode_handshake(line: &str) -> Result<Handshake, ServerError> {
    Ok(serde_json::from_str(line)?)
}

/// Parses a gameplay line.
pub fn decode(line: &str) -> Result<ClientMessage, ServerError> {
    Ok(serde_json::from_str(line)?)
}

/// Serializes an outbound message into a single line of JSON.
pub fn encode(message: &ServerMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(message)
}

#[cfg(test)]
mod tests {
    use dice_defense_core::Phase;
    use serde_json::{json, Value};

    use super::*;

    #[test]
    fn spawn_and_summon_are_equivalent() {
        assert_eq!(decode(r#"{"type":"SPAWN"}"#).expect("spawn"), ClientMessage::Spawn);
        assert_eq!(decode(r#"{"type":"SUMMON"}"#).expect("summon"), ClientMessage::Spawn);
    }

    #[test]
    fn merge_maps_to_cell_indices() {
        let message = decode(r#"{"type":"MERGE","source_index":3,"target_index":7}"#)
            .expect("merge");
        assert_eq!(
            message.into_command(),
            Some(PlayerCommand::Merge {
                source: CellIndex::new(3),
                target: CellIndex::new(7),
            })
        );
    }

    #[test]
    fn negative_merge_indices_are_dropped() {
        let message = decode(r#"{"type":"MERGE","source_index":-1,"target_index":2}"#)
            .expect("merge");
        assert_eq!(message.into_command(), None);
    }

    #[test]
    fn power_up_names_a_unit_kind() {
        let message = decode(r#"{"type":"POWER_UP","unit":"iron"}"#).expect("power up");
        assert_eq!(
            message.into_command(),
            Some(PlayerCommand::PowerUp {
                kind: UnitKind::Iron,
            })
        );
    }

    #[test]
    fn unknown_types_are_malformed() {
        assert!(matches!(
            decode(r#"{"type":"DANCE"}"#),
            Err(ServerError::Payload(_))
        ));
        assert!(decode("not json").is_err());
    }

    #[test]
    fn handshake_variants_parse() {
        assert_eq!(
            decode_handshake(r#"{"type":"CREATE"}"#).expect("create"),
            Handshake::Create { deck: None }
        );
        assert_eq!(
            decode_handshake(r#"{"type":"JOIN","room":"AB12CD"}"#).expect("join"),
            Handshake::Join {
                room: "AB12CD".to_owned(),
            }
        );
    }

    #[test]
    fn state_update_flattens_the_snapshot() {
        let snapshot = SessionSnapshot {
            sp: 100,
            spawn_cost: 10,
            lives: 3,
            wave: 1,
            phase: Phase::Normal,
            timer: 30,
            grid: vec![None; 15],
            entities: Vec::new(),
            projectiles: Vec::new(),
        };
        let line = encode(&ServerMessage::StateUpdate(snapshot)).expect("encode");
        let value: Value = serde_json::from_str(&line).expect("json");

        assert_eq!(value["type"], json!("STATE_UPDATE"));
        assert_eq!(value["sp"], json!(100));
        assert_eq!(value["spawn_cost"], json!(10));
        assert_eq!(value["phase"], json!("normal"));
        assert_eq!(value["grid"].as_array().map(Vec::len), Some(15));
    }
}
