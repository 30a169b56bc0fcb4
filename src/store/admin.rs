//! Admin session state: login, logout, credential updates.
//!
//! The authenticated identity is persisted through [`SessionStore`] and
//! restored at startup; every other console operation gates on it.

use color_eyre::{eyre::eyre, Result};
use tracing::{error, warn};

use crate::api::service::RecordService;
use crate::api::types::{Admin, AdminUpdate};
use crate::session::SessionStore;

pub struct AdminStore {
  admin: Option<Admin>,
  session: SessionStore,
}

impl AdminStore {
  /// Restore the session from disk; an unreadable store means logged out.
  pub fn restore(session: SessionStore) -> Self {
    let admin = match session.load_admin() {
      Ok(admin) => admin,
      Err(e) => {
        warn!("Failed to restore session: {e}");
        None
      }
    };
    Self { admin, session }
  }

  pub fn admin(&self) -> Option<&Admin> {
    self.admin.as_ref()
  }

  pub fn require_login(&self) -> Result<&Admin> {
    self
      .admin
      .as_ref()
      .ok_or_else(|| eyre!("Not logged in. Run `feesctl login <email>` first."))
  }

  /// Authenticate against the server and persist the session.
  pub async fn login<S: RecordService>(
    &mut self,
    svc: &S,
    email: String,
    password: String,
  ) -> Result<&Admin> {
    let admin = svc.login(email, password).await.inspect_err(|e| {
      error!("Login failed: {e}");
    })?;
    self.session.save_admin(&admin)?;
    Ok(self.admin.insert(admin))
  }

  /// Clear both the in-memory identity and the persisted session.
  pub fn logout(&mut self) -> Result<()> {
    self.session.clear()?;
    self.admin = None;
    Ok(())
  }

  /// Update the admin's email or password, then re-persist the session with
  /// the server's view of the record.
  pub async fn update<S: RecordService>(
    &mut self,
    svc: &S,
    id: i64,
    update: AdminUpdate,
  ) -> Result<&Admin> {
    let admin = svc.update_admin(id, update).await.inspect_err(|e| {
      error!("Failed to update admin {id}: {e}");
    })?;
    self.session.save_admin(&admin)?;
    Ok(self.admin.insert(admin))
  }
}
