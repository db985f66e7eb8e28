use super::SessionStore;
use crate::error::StoreError;
use crate::session::SessionRecord;
use rusqlite::{params, Connection, ErrorCode};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

/// SQLite-backed document store.
///
/// rusqlite is blocking, so every call runs on `spawn_blocking`.
#[derive(Clone)]
pub struct SqliteSessionStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSessionStore {
    /// Create or open the database at `db_path`
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Unavailable(format!("Failed to create data dir: {}", e))
                })?;
            }
        }

        let conn = Connection::open(db_path)
            .map_err(|e| StoreError::Unavailable(format!("Failed to open session db: {}", e)))?;
        let store = Self::with_connection(conn)?;

        info!("Opened session database at {:?}", db_path);
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::Unavailable(format!("Failed to open session db: {}", e)))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                body TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_user_created
                ON sessions(user_id, created_at);",
        )
        .map_err(|e| StoreError::Unavailable(format!("Failed to create schema: {}", e)))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| StoreError::Unavailable("session db lock poisoned".to_string()))?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("store task failed: {}", e)))?
    }
}

#[async_trait::async_trait]
impl SessionStore for SqliteSessionStore {
    async fn create(&self, record: &SessionRecord) -> Result<(), StoreError> {
        let body = serde_json::to_string(record)
            .map_err(|e| StoreError::Corrupt(format!("Failed to serialize session: {}", e)))?;
        let id = record.id().to_string();
        let user_id = record.user_id().to_string();
        let created_at = record.created_at().to_string();

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO sessions (id, user_id, created_at, body) VALUES (?1, ?2, ?3, ?4)",
                params![id, user_id, created_at, body],
            )
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(ref err, _)
                    if err.code == ErrorCode::ConstraintViolation =>
                {
                    StoreError::Duplicate(id.clone())
                }
                other => StoreError::Unavailable(format!("Failed to insert session: {}", other)),
            })?;
            Ok(())
        })
        .await
    }

    async fn query_by_user(&self, user_id: &str) -> Result<Vec<SessionRecord>, StoreError> {
        let user_id = user_id.to_string();

        self.with_conn(move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT body FROM sessions
                     WHERE user_id = ?1
                     ORDER BY created_at ASC, rowid ASC",
                )
                .map_err(|e| StoreError::Unavailable(format!("Failed to prepare query: {}", e)))?;

            let bodies = stmt
                .query_map(params![user_id], |row| row.get::<_, String>(0))
                .map_err(|e| StoreError::Unavailable(format!("Failed to query sessions: {}", e)))?
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| StoreError::Unavailable(format!("Failed to read sessions: {}", e)))?;

            bodies
                .iter()
                .map(|body| {
                    serde_json::from_str::<SessionRecord>(body)
                        .map_err(|e| StoreError::Corrupt(e.to_string()))
                })
                .collect()
        })
        .await
    }
}
