//! Registry of running sessions keyed by room code.

use std::{collections::HashMap, fmt, sync::Arc, time::Duration};

use dice_defense_core::{Deck, Event, PlayerCommand, SessionSnapshot};
use dice_defense_session::{Config, Session};
use parking_lot::{Mutex, RwLock};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::{
    error::{ServerError, TickError},
    protocol::{self, ServerMessage},
    scheduler::{Scheduler, SessionDriver, SubscriptionId},
    transport::{ConnectionId, Connections, Outbound},
};

/// Characters room codes are drawn from.
const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
/// Length of a room code.
pub const ROOM_CODE_LENGTH: usize = 6;

/// Room code identifying a session.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(String);

impl SessionId {
    /// Wraps a room code; codes are case-insensitive and stored uppercase.
    #[must_use]
    pub fn new(code: &str) -> Self {
        Self(code.trim().to_ascii_uppercase())
    }

    /// Borrowed form of the code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A session together with the connections watching it.
#[derive(Debug)]
pub struct LiveSession {
    id: SessionId,
    session: Mutex<Session>,
    connections: Mutex<Connections>,
}

impl LiveSession {
    /// Wraps a freshly created session.
    #[must_use]
    pub fn new(id: SessionId, session: Session) -> Self {
        Self {
            id,
            session: Mutex::new(session),
            connections: Mutex::new(Connections::new()),
        }
    }

    /// Room code of the session.
    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Queues a command for the next tick.
    pub fn submit(&self, command: PlayerCommand) {
        self.session.lock().submit(command);
    }

    /// Current state of the session.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.lock().snapshot()
    }

    /// Number of attached connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Attaches a connection and sends it the `INIT` message.
    pub fn connect(&self, outbound: Outbound) -> Result<ConnectionId, ServerError> {
        let init = {
            let session = self.session.lock();
            ServerMessage::Init {
                room: self.id.to_string(),
                map: session.map_layout(),
                state: session.snapshot(),
            }
        };
        let payload = protocol::encode(&init)?;
        let mut connections = self.connections.lock();
        let id = connections.attach(outbound);
        let _ = connections.send_to(id, &payload);
        Ok(id)
    }

    /// Detaches a connection; returns the number of connections left.
    pub fn disconnect(&self, connection: ConnectionId) -> usize {
        let mut connections = self.connections.lock();
        let _ = connections.detach(connection);
        connections.len()
    }
}

impl SessionDriver for LiveSession {
    fn label(&self) -> &str {
        self.id.as_str()
    }

    fn tick(&self, dt: Duration) -> Result<(), TickError> {
        let mut session = self.session.lock();
        let room = self.id.as_str();
        for event in session.tick(dt) {
            match event {
                Event::SummonRejected { reason } => debug!(room, ?reason, "summon rejected"),
                Event::MergeRejected {
                    source,
                    target,
                    reason,
                } => debug!(
                    room,
                    source = source.get(),
                    target = target.get(),
                    ?reason,
                    "merge rejected"
                ),
                Event::PowerUpRejected { kind, reason } => {
                    debug!(room, %kind, ?reason, "power-up rejected");
                }
                Event::BossSummoned { hp, culled_hp, .. } => {
                    info!(room, hp, culled_hp, "boss summoned");
                }
                Event::WaveAdvanced { wave } => info!(room, wave, "wave advanced"),
                Event::MobEscaped { kind, penalty, .. } => {
                    debug!(room, ?kind, penalty, "mob escaped");
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn broadcast(&self) -> Result<(), TickError> {
        let snapshot = self.session.lock().snapshot();
        let payload = protocol::encode(&ServerMessage::StateUpdate(snapshot))?;
        let _ = self.connections.lock().broadcast(&payload);
        Ok(())
    }
}

#[derive(Debug)]
struct Registered {
    live: Arc<LiveSession>,
    subscription: SubscriptionId,
}

/// All running sessions of a server.
///
/// Every created session is subscribed to the injected [`Scheduler`] and
/// unsubscribed when it is destroyed.
#[derive(Debug)]
pub struct SessionRegistry {
    scheduler: Arc<Scheduler>,
    sessions: RwLock<HashMap<SessionId, Registered>>,
    rng: Mutex<ChaCha8Rng>,
}

impl SessionRegistry {
    /// Creates an empty registry; room codes and dice follow `seed` when given.
    #[must_use]
    pub fn new(scheduler: Arc<Scheduler>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            scheduler,
            sessions: RwLock::new(HashMap::new()),
            rng: Mutex::new(rng),
        }
    }

    /// Scheduler the registry subscribes sessions to.
    #[must_use]
    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    /// Number of running sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Reports whether no session is running.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Reports whether a session is registered under `id`.
    #[must_use]
    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions.read().contains_key(id)
    }

    /// Starts a session for `deck` under a fresh room code.
    pub fn create(&self, deck: Deck) -> SessionId {
        let mut rng = self.rng.lock();
        let seed = rng.gen::<u64>();
        let mut sessions = self.sessions.write();
        let id = loop {
            let code = room_code(&mut *rng);
            if !sessions.contains_key(&code) {
                break code;
            }
        };
        drop(rng);

        let live = Arc::new(LiveSession::new(
            id.clone(),
            Session::new(deck, Config::new(seed)),
        ));
        let subscription = self.scheduler.subscribe(live.clone());
        let _ = sessions.insert(id.clone(), Registered { live, subscription });
        info!(room = %id, "session created");
        id
    }

    /// Stops a session; returns `false` when it was not running.
    pub fn destroy(&self, id: &SessionId) -> bool {
        let removed = self.sessions.write().remove(id);
        match removed {
            Some(registered) => {
                let _ = self.scheduler.unsubscribe(registered.subscription);
                info!(room = %id, "session destroyed");
                true
            }
            None => false,
        }
    }

    /// Looks up a running session.
    pub fn get(&self, id: &SessionId) -> Result<Arc<LiveSession>, ServerError> {
        self.sessions
            .read()
            .get(id)
            .map(|registered| Arc::clone(&registered.live))
            .ok_or_else(|| ServerError::UnknownSession(id.clone()))
    }

    /// Queues a player command on a session.
    pub fn submit(&self, id: &SessionId, command: PlayerCommand) -> Result<(), ServerError> {
        self.get(id)?.submit(command);
        Ok(())
    }

    /// Current state of a session.
    pub fn snapshot(&self, id: &SessionId) -> Result<SessionSnapshot, ServerError> {
        Ok(self.get(id)?.snapshot())
    }

    /// Attaches a connection to a session and sends it the `INIT` message.
    pub fn connect(&self, id: &SessionId, outbound: Outbound) -> Result<ConnectionId, ServerError> {
        let sessions = self.sessions.read();
        let registered = sessions
            .get(id)
            .ok_or_else(|| ServerError::UnknownSession(id.clone()))?;
        registered.live.connect(outbound)
    }

    /// Detaches a connection; destroys the session when it was the last one.
    ///
    /// Returns `true` when the session was destroyed.
    pub fn disconnect(&self, id: &SessionId, connection: ConnectionId) -> bool {
        let mut sessions = self.sessions.write();
        let Some(registered) = sessions.get(id) else {
            return false;
        };
        if registered.live.disconnect(connection) > 0 {
            return false;
        }
        let Some(registered) = sessions.remove(id) else {
            return false;
        };
        drop(sessions);
        let _ = self.scheduler.unsubscribe(registered.subscription);
        info!(room = %id, "last connection left, session destroyed");
        true
    }
}

fn room_code(rng: &mut ChaCha8Rng) -> SessionId {
    let code: String = (0..ROOM_CODE_LENGTH)
        .map(|_| char::from(ROOM_CODE_ALPHABET[rng.gen_range(0..ROOM_CODE_ALPHABET.len())]))
        .collect();
    SessionId(code)
}

#[cfg(test)]
mod tests {
    use dice_defense_core::UnitKind;

    use super::*;
    use crate::transport;

    fn registry() -> SessionRegistry {
        SessionRegistry::new(
            Arc::new(Scheduler::new(Duration::from_millis(33), 1)),
            Some(17),
        )
    }

    fn deck() -> Deck {
        Deck::new(vec![UnitKind::Fire, UnitKind::Ice]).expect("valid deck")
    }

    #[test]
    fn room_codes_are_six_uppercase_alphanumerics() {
        let registry = registry();
        let id = registry.create(deck());
        assert_eq!(id.as_str().len(), ROOM_CODE_LENGTH);
        assert!(id
            .as_str()
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn session_ids_are_case_insensitive() {
        assert_eq!(SessionId::new(" ab12cd "), SessionId::new("AB12CD"));
    }

    #[test]
    fn create_and_destroy_manage_scheduler_subscriptions() {
        let registry = registry();
        let first = registry.create(deck());
        let second = registry.create(deck());
        assert_ne!(first, second);
        assert_eq!(registry.scheduler().len(), 2);

        assert!(registry.destroy(&first));
        assert!(!registry.destroy(&first));
        assert_eq!(registry.scheduler().len(), 1);
        assert!(registry.contains(&second));
    }

    #[test]
    fn unknown_sessions_are_reported() {
        let registry = registry();
        let missing = SessionId::new("ZZZZZZ");
        assert!(matches!(
            registry.submit(&missing, PlayerCommand::Summon),
            Err(ServerError::UnknownSession(_))
        ));
        assert!(registry.snapshot(&missing).is_err());
    }

    #[test]
    fn connect_sends_init_message() {
        let registry = registry();
        let id = registry.create(deck());
        let (tx, mut rx) = transport::channel();
        let _ = registry.connect(&id, tx).expect("connect");

        let line = rx.try_recv().expect("init message");
        let value: serde_json::Value = serde_json::from_str(&line).expect("json");
        assert_eq!(value["type"], "INIT");
        assert_eq!(value["room"], id.as_str());
        assert_eq!(value["map"]["grid"].as_array().map(Vec::len), Some(15));
        assert_eq!(value["state"]["sp"], 100);
    }

    #[test]
    fn last_disconnect_destroys_session() {
        let registry = registry();
        let id = registry.create(deck());
        let (first_tx, _first_rx) = transport::channel();
        let (second_tx, _second_rx) = transport::channel();
        let first = registry.connect(&id, first_tx).expect("first");
        let second = registry.connect(&id, second_tx).expect("second");

        assert!(!registry.disconnect(&id, first));
        assert!(registry.contains(&id));
        assert!(registry.disconnect(&id, second));
        assert!(!registry.contains(&id));
        assert!(registry.scheduler().is_empty());
    }

    #[tokio::test]
    async fn submitted_commands_apply_on_the_next_cycle() {
        let registry = registry();
        let id = registry.create(deck());
        registry
            .submit(&id, PlayerCommand::Summon)
            .expect("session exists");
        assert_eq!(registry.snapshot(&id).expect("snapshot").occupied_cells(), 0);

        let _ = registry.scheduler().run_once().await;
        let snapshot = registry.snapshot(&id).expect("snapshot");
        assert_eq!(snapshot.occupied_cells(), 1);
        assert_eq!(snapshot.sp, 90);
    }
}
