use std::collections::HashMap;

use common::model::{game::Coord, messages::SessionId};
use rusqlite::{Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::history::MoveHistory;

const SCHEMA: &str = include_str!("../sql/create_tables.sql");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    SessionId,
    MoveHistory,
    LastMove,
    PlayerName,
    Started,
}

impl StoreKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKey::SessionId => "sessionId",
            StoreKey::MoveHistory => "moveHistory",
            StoreKey::LastMove => "lastMove",
            StoreKey::PlayerName => "playerName",
            StoreKey::Started => "started",
        }
    }
}

/// Durable key/value shadow of the session.
///
/// Writes are best-effort: implementations log storage failures and carry on, losing the cache
/// only costs the operator a resume.
pub trait SessionStore {
    fn get(&self, key: StoreKey) -> Option<String>;
    fn set(&mut self, key: StoreKey, value: &str);
    fn clear(&mut self, key: StoreKey);
}

impl<S: SessionStore + ?Sized> SessionStore for Box<S> {
    fn get(&self, key: StoreKey) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: StoreKey, value: &str) {
        (**self).set(key, value)
    }

    fn clear(&mut self, key: StoreKey) {
        (**self).clear(key)
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<StoreKey, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: StoreKey) -> Option<String> {
        self.values.get(&key).cloned()
    }

    fn set(&mut self, key: StoreKey, value: &str) {
        self.values.insert(key, value.to_owned());
    }

    fn clear(&mut self, key: StoreKey) {
        self.values.remove(&key);
    }
}

/// SQLite-backed store, one row per key.
pub struct SqliteStore {
    connection: Connection,
}

impl SqliteStore {
    pub fn open(path: &str) -> rusqlite::Result<Self> {
        let connection = Connection::open(path)?;
        connection.execute_batch(SCHEMA)?;
        debug!("Opened session store at {}", path);
        Ok(SqliteStore { connection })
    }
}

impl SessionStore for SqliteStore {
    fn get(&self, key: StoreKey) -> Option<String> {
        let result = self
            .connection
            .query_row(
                "SELECT value FROM session_state WHERE key = ?1",
                [key.as_str()],
                |row| row.get::<_, String>(0),
            )
            .optional();
        match result {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to read {} from session store: {}", key.as_str(), e);
                None
            }
        }
    }

    fn set(&mut self, key: StoreKey, value: &str) {
        let result = self.connection.execute(
            "INSERT INTO session_state (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            (key.as_str(), value),
        );
        if let Err(e) = result {
            warn!("Failed to write {} to session store: {}", key.as_str(), e);
        }
    }

    fn clear(&mut self, key: StoreKey) {
        let result = self
            .connection
            .execute("DELETE FROM session_state WHERE key = ?1", [key.as_str()]);
        if let Err(e) = result {
            warn!("Failed to clear {} in session store: {}", key.as_str(), e);
        }
    }
}

/// The part of the session that survives a restart, in typed form.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PersistedSession {
    pub session_id: Option<SessionId>,
    pub history: MoveHistory,
    pub last_move: Option<Coord>,
    pub player_name: Option<String>,
    pub started: bool,
}

impl PersistedSession {
    /// Read every key once. Missing or unreadable values fall back to their defaults.
    pub fn load(store: &impl SessionStore) -> Self {
        PersistedSession {
            session_id: store
                .get(StoreKey::SessionId)
                .filter(|id| !id.is_empty())
                .map(SessionId),
            history: Self::read_json(store, StoreKey::MoveHistory).unwrap_or_default(),
            last_move: Self::read_json::<Option<Coord>>(store, StoreKey::LastMove).flatten(),
            player_name: store.get(StoreKey::PlayerName),
            started: store.get(StoreKey::Started).as_deref() == Some("true"),
        }
    }

    /// Write the keys whose value differs from `previous`.
    pub fn write_changes(&self, store: &mut impl SessionStore, previous: &PersistedSession) {
        if self.session_id != previous.session_id {
            match &self.session_id {
                Some(id) => store.set(StoreKey::SessionId, id.as_str()),
                None => store.clear(StoreKey::SessionId),
            }
        }
        if self.history != previous.history {
            Self::write_json(store, StoreKey::MoveHistory, &self.history);
        }
        if self.last_move != previous.last_move {
            Self::write_json(store, StoreKey::LastMove, &self.last_move);
        }
        if self.player_name != previous.player_name {
            match &self.player_name {
                Some(name) => store.set(StoreKey::PlayerName, name),
                None => store.clear(StoreKey::PlayerName),
            }
        }
        if self.started != previous.started {
            store.set(StoreKey::Started, if self.started { "true" } else { "false" });
        }
    }

    fn read_json<T: DeserializeOwned>(store: &impl SessionStore, key: StoreKey) -> Option<T> {
        let raw = store.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring unreadable {} in session store: {}", key.as_str(), e);
                None
            }
        }
    }

    fn write_json<T: Serialize>(store: &mut impl SessionStore, key: StoreKey, value: &T) {
        match serde_json::to_string(value) {
            Ok(raw) => store.set(key, &raw),
            Err(e) => warn!("Failed to serialize {}: {}", key.as_str(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MoveRecord;
    use uuid::Uuid;

    fn temp_db() -> String {
        let path = std::env::temp_dir().join(format!("checkers_store_test_{}.db", Uuid::new_v4()));
        path.to_str().unwrap().to_string()
    }

    fn sample() -> PersistedSession {
        let mut history = MoveHistory::new();
        history.prepend(vec![MoveRecord {
            actor: "Alice".to_owned(),
            notation: "B6 → A5".to_owned(),
        }]);
        PersistedSession {
            session_id: Some(SessionId("665f1c2ab1d3".to_owned())),
            history,
            last_move: Coord::new(4, 0),
            player_name: Some("Alice".to_owned()),
            started: true,
        }
    }

    #[test]
    fn memory_store_get_set_clear() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get(StoreKey::PlayerName), None);
        store.set(StoreKey::PlayerName, "Alice");
        store.set(StoreKey::PlayerName, "Bob");
        assert_eq!(store.get(StoreKey::PlayerName).as_deref(), Some("Bob"));
        store.clear(StoreKey::PlayerName);
        assert_eq!(store.get(StoreKey::PlayerName), None);
    }

    #[test]
    fn persisted_session_round_trips_through_store() {
        let mut store = MemoryStore::new();
        sample().write_changes(&mut store, &PersistedSession::default());
        assert_eq!(store.get(StoreKey::Started).as_deref(), Some("true"));
        assert_eq!(store.get(StoreKey::LastMove).as_deref(), Some("[4,0]"));
        assert_eq!(PersistedSession::load(&store), sample());
    }

    #[test]
    fn only_changed_keys_are_written() {
        let mut store = MemoryStore::new();
        let previous = sample();
        let mut current = sample();
        current.started = false;
        current.write_changes(&mut store, &previous);
        assert_eq!(store.get(StoreKey::Started).as_deref(), Some("false"));
        for key in [StoreKey::SessionId, StoreKey::MoveHistory, StoreKey::LastMove] {
            assert_eq!(store.get(key), None, "{} should be untouched", key.as_str());
        }
    }

    #[test]
    fn cleared_fields_are_written_as_absent() {
        let mut store = MemoryStore::new();
        let previous = sample();
        previous.write_changes(&mut store, &PersistedSession::default());
        let current = PersistedSession {
            session_id: None,
            last_move: None,
            ..sample()
        };
        current.write_changes(&mut store, &previous);
        assert_eq!(store.get(StoreKey::SessionId), None);
        assert_eq!(store.get(StoreKey::LastMove).as_deref(), Some("null"));
        assert_eq!(PersistedSession::load(&store).last_move, None);
    }

    #[test]
    fn garbage_values_load_as_defaults() {
        let mut store = MemoryStore::new();
        store.set(StoreKey::SessionId, "");
        store.set(StoreKey::MoveHistory, "[{\"actor\":");
        store.set(StoreKey::LastMove, "[9, 9]");
        store.set(StoreKey::Started, "yes");
        let loaded = PersistedSession::load(&store);
        assert_eq!(loaded, PersistedSession::default());
    }

    #[test]
    fn sqlite_store_survives_reopen() {
        let db_path = temp_db();
        {
            let mut store = SqliteStore::open(&db_path).expect("Failed to open store");
            sample().write_changes(&mut store, &PersistedSession::default());
            store.set(StoreKey::PlayerName, "Bob");
        }
        let store = SqliteStore::open(&db_path).expect("Failed to reopen store");
        let loaded = PersistedSession::load(&store);
        assert_eq!(loaded.player_name.as_deref(), Some("Bob"));
        assert_eq!(loaded.history, sample().history);
        assert_eq!(loaded.session_id, sample().session_id);
        let _ = std::fs::remove_file(db_path);
    }

    #[test]
    fn sqlite_store_clear() {
        let db_path = temp_db();
        let mut store = SqliteStore::open(&db_path).expect("Failed to open store");
        store.set(StoreKey::SessionId, "abc");
        store.clear(StoreKey::SessionId);
        assert_eq!(store.get(StoreKey::SessionId), None);
        let _ = std::fs::remove_file(db_path);
    }
}
