//! SQLite-backed mapping store.
//!
//! One table, keyed on the source message id. All statements are
//! parameterized; ids never enter SQL text.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension};
use tracing::info;

use crossbot_core::{domain::MessageId, ports::MappingStore, Error, Result};

pub struct SqliteMappingStore {
    conn: Mutex<Connection>,
}

impl SqliteMappingStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(storage_err)?;

        // WAL mode for concurrent reads.
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(storage_err)?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS crosspost_links (
                source_id  INTEGER PRIMARY KEY,
                link_id    INTEGER NOT NULL
            );",
        )
        .map_err(storage_err)?;

        info!("mapping store opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> rusqlite::Result<T>) -> Result<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| Error::Storage("connection lock poisoned".to_string()))?;
        f(&conn).map_err(storage_err)
    }
}

// Snowflakes are stored bit-for-bit; SQLite INTEGER is a signed 64-bit value.
fn to_db(id: MessageId) -> i64 {
    id.0 as i64
}

fn from_db(value: i64) -> MessageId {
    MessageId(value as u64)
}

fn storage_err(e: rusqlite::Error) -> Error {
    Error::Storage(e.to_string())
}

impl MappingStore for SqliteMappingStore {
    fn lookup(&self, source: MessageId) -> Result<Option<MessageId>> {
        let linked = self.with_conn(|conn| {
            conn.query_row(
                "SELECT link_id FROM crosspost_links WHERE source_id = ?1",
                [to_db(source)],
                |row| row.get::<_, i64>(0),
            )
            .optional()
        })?;

        Ok(linked.map(from_db))
    }

    fn insert(&self, source: MessageId, linked: MessageId) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO crosspost_links (source_id, link_id) VALUES (?1, ?2)",
                rusqlite::params![to_db(source), to_db(linked)],
            )?;
            Ok(())
        })
    }

    fn remove(&self, source: MessageId) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM crosspost_links WHERE source_id = ?1",
                [to_db(source)],
            )?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn tmp_db(prefix: &str) -> PathBuf {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let pid = std::process::id();
        PathBuf::from(format!("/tmp/{prefix}-{pid}-{ts}.db"))
    }

    #[test]
    fn insert_lookup_remove_roundtrip() {
        let path = tmp_db("crossbot-store-test");
        let store = SqliteMappingStore::open(&path).unwrap();

        assert_eq!(store.lookup(MessageId(1)).unwrap(), None);

        store.insert(MessageId(1), MessageId(2)).unwrap();
        assert_eq!(store.lookup(MessageId(1)).unwrap(), Some(MessageId(2)));

        store.remove(MessageId(1)).unwrap();
        assert_eq!(store.lookup(MessageId(1)).unwrap(), None);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn remove_of_absent_row_is_fine() {
        let path = tmp_db("crossbot-store-absent");
        let store = SqliteMappingStore::open(&path).unwrap();

        store.remove(MessageId(42)).unwrap();

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn mappings_survive_reopen() {
        let path = tmp_db("crossbot-store-reopen");

        {
            let store = SqliteMappingStore::open(&path).unwrap();
            store.insert(MessageId(7), MessageId(8)).unwrap();
        }

        let store = SqliteMappingStore::open(&path).unwrap();
        assert_eq!(store.lookup(MessageId(7)).unwrap(), Some(MessageId(8)));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn high_bit_snowflakes_roundtrip() {
        let path = tmp_db("crossbot-store-highbit");
        let store = SqliteMappingStore::open(&path).unwrap();

        let source = MessageId(u64::MAX - 3);
        let linked = MessageId(u64::MAX);
        store.insert(source, linked).unwrap();
        assert_eq!(store.lookup(source).unwrap(), Some(linked));

        let _ = std::fs::remove_file(&path);
    }
}
