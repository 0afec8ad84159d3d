//! Cache store backends: persistent SQLite and in-memory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::error::StoreError;
use crate::http::{Method, Request, Response};

use super::traits::{CacheStore, CachedEntry};

/// Schema for the response cache. One row per request identity.
const CACHE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS response_cache (
    method TEXT NOT NULL,
    url TEXT NOT NULL,
    status INTEGER NOT NULL,
    headers BLOB NOT NULL,
    body BLOB NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (method, url)
);
"#;

/// SQLite-backed store. One database file per cache name, so changing the
/// name starts an empty store while the old file stays behind untouched.
pub struct SqliteStore {
  name: String,
  conn: Mutex<Connection>,
}

impl SqliteStore {
  /// Open (creating if absent) the store for `name` under the platform
  /// data directory.
  pub fn open(name: &str) -> Result<Self, StoreError> {
    let path = Self::default_path(name)?;
    Self::open_at(&path, name)
  }

  /// Open (creating if absent) a store backed by the given database file.
  pub fn open_at(path: &Path, name: &str) -> Result<Self, StoreError> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).map_err(|e| StoreError::CreateDir {
        path: parent.to_path_buf(),
        source: e,
      })?;
    }

    Self::from_connection(Connection::open(path)?, name)
  }

  /// Open a store that lives only as long as the process. Used by tests
  /// and by hosts that opt out of persistence.
  pub fn open_in_memory(name: &str) -> Result<Self, StoreError> {
    Self::from_connection(Connection::open_in_memory()?, name)
  }

  fn from_connection(conn: Connection, name: &str) -> Result<Self, StoreError> {
    conn.execute_batch(CACHE_SCHEMA)?;

    Ok(Self {
      name: name.to_string(),
      conn: Mutex::new(conn),
    })
  }

  /// Default database path: `<data dir>/offcache/<name>.db`.
  fn default_path(name: &str) -> Result<PathBuf, StoreError> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or(StoreError::NoDataDir)?;

    Ok(data_dir.join("offcache").join(format!("{}.db", name)))
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
    self.conn.lock().map_err(|_| StoreError::LockPoisoned)
  }
}

impl CacheStore for SqliteStore {
  fn name(&self) -> &str {
    &self.name
  }

  fn put_all(&self, entries: &[(Request, Response)]) -> Result<(), StoreError> {
    let mut conn = self.lock()?;
    let tx = conn.transaction()?;

    for (request, response) in entries {
      let headers = serde_json::to_vec(&response.headers)?;
      tx.execute(
        "INSERT OR REPLACE INTO response_cache (method, url, status, headers, body, cached_at)
         VALUES (?, ?, ?, ?, ?, datetime('now'))",
        params![
          request.method.as_str(),
          request.url,
          response.status,
          headers,
          response.body
        ],
      )?;
    }

    tx.commit()?;
    debug!(cache = %self.name, entries = entries.len(), "batch committed");

    Ok(())
  }

  fn match_request(&self, request: &Request) -> Result<Option<CachedEntry>, StoreError> {
    let conn = self.lock()?;

    let mut stmt = conn.prepare(
      "SELECT status, headers, body, cached_at FROM response_cache
       WHERE method = ? AND url = ?",
    )?;

    let row: Option<(u16, Vec<u8>, Vec<u8>, String)> = stmt
      .query_row(params![request.method.as_str(), request.url], |row| {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
      })
      .optional()?;

    match row {
      Some((status, headers, body, cached_at)) => {
        let headers: Vec<(String, String)> = serde_json::from_slice(&headers)?;

        Ok(Some(CachedEntry {
          response: Response {
            status,
            headers,
            body,
          },
          cached_at: parse_datetime(&cached_at)?,
        }))
      }
      None => Ok(None),
    }
  }

  fn keys(&self) -> Result<Vec<(Method, String)>, StoreError> {
    let conn = self.lock()?;

    let mut stmt = conn.prepare("SELECT method, url FROM response_cache ORDER BY url")?;
    let rows = stmt.query_map([], |row| {
      Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut keys = Vec::new();
    for row in rows {
      let (method, url) = row?;
      let method = Method::parse(&method)
        .ok_or_else(|| StoreError::Corrupt(format!("unknown method {} for {}", method, url)))?;
      keys.push((method, url));
    }

    Ok(keys)
  }
}

/// Parse a datetime string from SQLite format.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StoreError> {
  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.and_utc())
    .map_err(|e| StoreError::Corrupt(format!("bad timestamp '{}': {}", s, e)))
}

struct StoredResponse {
  response: Response,
  cached_at: DateTime<Utc>,
}

/// In-memory store with the same observable semantics as [`SqliteStore`],
/// minus persistence. The single map lock makes the batch commit atomic.
pub struct MemoryStore {
  name: String,
  entries: Mutex<HashMap<(Method, String), StoredResponse>>,
}

impl MemoryStore {
  pub fn new(name: &str) -> Self {
    Self {
      name: name.to_string(),
      entries: Mutex::new(HashMap::new()),
    }
  }
}

impl CacheStore for MemoryStore {
  fn name(&self) -> &str {
    &self.name
  }

  fn put_all(&self, entries: &[(Request, Response)]) -> Result<(), StoreError> {
    let mut map = self.entries.lock().map_err(|_| StoreError::LockPoisoned)?;
    let now = Utc::now();

    for (request, response) in entries {
      map.insert(
        (request.method, request.url.clone()),
        StoredResponse {
          response: response.clone(),
          cached_at: now,
        },
      );
    }

    Ok(())
  }

  fn match_request(&self, request: &Request) -> Result<Option<CachedEntry>, StoreError> {
    let map = self.entries.lock().map_err(|_| StoreError::LockPoisoned)?;

    Ok(
      map
        .get(&(request.method, request.url.clone()))
        .map(|stored| CachedEntry {
          response: stored.response.clone(),
          cached_at: stored.cached_at,
        }),
    )
  }

  fn keys(&self) -> Result<Vec<(Method, String)>, StoreError> {
    let map = self.entries.lock().map_err(|_| StoreError::LockPoisoned)?;

    let mut keys: Vec<(Method, String)> = map.keys().cloned().collect();
    keys.sort_by(|a, b| a.1.cmp(&b.1));

    Ok(keys)
  }
}
