//! Local session persistence.
//!
//! The authenticated admin is kept in a small SQLite key-value table under a
//! fixed key and restored at startup. Absence of a valid entry means logged
//! out.

use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;
use std::sync::Mutex;

use crate::api::types::Admin;

/// Fixed key the admin record is stored under.
const SESSION_KEY: &str = "admin";

const SESSION_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS session (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    saved_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

/// SQLite-backed session store.
pub struct SessionStore {
  conn: Mutex<Connection>,
}

impl SessionStore {
  /// Open or create the session database at the default location.
  pub fn open() -> Result<Self> {
    let path = Self::default_path()?;

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create session directory: {}", e))?;
    }

    let conn = Connection::open(&path)
      .map_err(|e| eyre!("Failed to open session database at {}: {}", path.display(), e))?;

    Self::from_conn(conn)
  }

  /// In-memory store for tests.
  #[cfg(test)]
  pub fn open_in_memory() -> Result<Self> {
    let conn =
      Connection::open_in_memory().map_err(|e| eyre!("Failed to open in-memory store: {}", e))?;
    Self::from_conn(conn)
  }

  fn from_conn(conn: Connection) -> Result<Self> {
    conn
      .execute_batch(SESSION_SCHEMA)
      .map_err(|e| eyre!("Failed to run session migrations: {}", e))?;
    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  /// Get the default database path.
  fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("feesctl").join("session.db"))
  }

  /// Persist the admin under the fixed session key.
  pub fn save_admin(&self, admin: &Admin) -> Result<()> {
    let value =
      serde_json::to_string(admin).map_err(|e| eyre!("Failed to serialize session: {}", e))?;

    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute(
        "INSERT OR REPLACE INTO session (key, value, saved_at) VALUES (?1, ?2, datetime('now'))",
        params![SESSION_KEY, value],
      )
      .map_err(|e| eyre!("Failed to save session: {}", e))?;

    Ok(())
  }

  /// Load the saved admin, if any. An unreadable entry counts as logged out.
  pub fn load_admin(&self) -> Result<Option<Admin>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let value: Option<String> = conn
      .query_row(
        "SELECT value FROM session WHERE key = ?1",
        params![SESSION_KEY],
        |row| row.get(0),
      )
      .optional()
      .map_err(|e| eyre!("Failed to read session: {}", e))?;

    match value {
      Some(raw) => match serde_json::from_str(&raw) {
        Ok(admin) => Ok(Some(admin)),
        Err(e) => {
          tracing::warn!("Discarding unreadable saved session: {}", e);
          Ok(None)
        }
      },
      None => Ok(None),
    }
  }

  /// Remove the saved session.
  pub fn clear(&self) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute("DELETE FROM session WHERE key = ?1", params![SESSION_KEY])
      .map_err(|e| eyre!("Failed to clear session: {}", e))?;

    Ok(())
  }
}
