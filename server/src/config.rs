//! Server configuration.
//!
//! Values are layered with the `config` crate: built-in defaults, an optional
//! TOML file, then `DICE_DEFENSE_*` environment variables
//! (for example `DICE_DEFENSE_TICK_RATE_HZ=60`).

use std::{path::Path, time::Duration};

use dice_defense_core::{Deck, UnitKind};
use serde::Deserialize;

use crate::error::ServerError;

/// Prefix of the environment variables read by [`ServerConfig::load`].
pub const ENV_PREFIX: &str = "DICE_DEFENSE";

/// Runtime settings of the server.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Scheduler frequency in ticks per second.
    pub tick_rate_hz: f32,
    /// Number of scheduler ticks between two snapshot broadcasts.
    pub broadcast_every: u32,
    /// Address the TCP listener binds to.
    pub bind_addr: String,
    /// Unit kinds used when a client creates a session without a deck.
    pub default_deck: Vec<String>,
    /// Seed for room codes and session dice; random when absent.
    pub seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 30.0,
            broadcast_every: 1,
            bind_addr: "127.0.0.1:7878".to_owned(),
            default_deck: ["fire", "electric", "wind", "poison", "ice"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            seed: None,
        }
    }
}

impl ServerConfig {
    /// Loads the configuration from defaults, an optional file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ServerError> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path).required(true));
        }
        let settings = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("default_deck"),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Fixed interval between two scheduler ticks.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        if self.tick_rate_hz > 0.0 {
            Duration::from_secs_f32(1.0 / self.tick_rate_hz)
        } else {
            Duration::from_secs_f32(1.0 / Self::default().tick_rate_hz)
        }
    }

    /// Parses [`ServerConfig::default_deck`].
    pub fn deck(&self) -> Result<Deck, ServerError> {
        parse_deck(&self.default_deck)
    }
}

/// Parses unit kind names into a validated deck.
pub fn parse_deck<S: AsRef<str>>(names: &[S]) -> Result<Deck, ServerError> {
    let kinds = names
        .iter()
        .map(|name| name.as_ref().trim().parse::<UnitKind>())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Deck::new(kinds)?)
}

#[cfg(test)]
mod tests {
    use std::{fs, process};

    use super::*;

    #[test]
    fn defaults_describe_a_thirty_hz_server() {
        let config = ServerConfig::default();
        assert_eq!(config.broadcast_every, 1);
        assert!((config.tick_interval().as_secs_f64() - 1.0 / 30.0).abs() < 1e-6);
        assert_eq!(config.deck().expect("default deck").kinds().len(), 5);
    }

    #[test]
    fn file_values_override_defaults() {
        let path = std::env::temp_dir().join(format!("dice-defense-{}.toml", process::id()));
        fs::write(
            &path,
            "tick_rate_hz = 60.0\nbroadcast_every = 5\ndefault_deck = [\"iron\", \"ice\"]\n",
        )
        .expect("write config file");

        let loaded = ServerConfig::load(Some(&path));
        let _ = fs::remove_file(&path);
        let config = loaded.expect("config loads");

        assert_eq!(config.tick_rate_hz, 60.0);
        assert_eq!(config.broadcast_every, 5);
        assert_eq!(config.bind_addr, "127.0.0.1:7878");
        assert_eq!(
            config.deck().expect("deck").kinds(),
            &[UnitKind::Iron, UnitKind::Ice]
        );
    }

    #[test]
    fn unknown_unit_names_are_rejected() {
        let error = parse_deck(&["fire", "lava"]).expect_err("lava is not a unit");
        assert!(matches!(error, ServerError::UnknownUnit(_)));
    }

    #[test]
    fn duplicate_units_are_rejected() {
        let error = parse_deck(&["fire", "fire"]).expect_err("duplicates");
        assert!(matches!(error, ServerError::InvalidDeck(_)));
    }
}
