//! Users and sessions.

use intel_core::user::{NewSession, NewUser};
use rusqlite::{Connection, OptionalExtension as _, params};

use crate::{
  encode::{RawUser, USER_SELECT, read_user},
  error::{CallResult, abort},
};

pub(crate) fn fetch(conn: &Connection, id: i64) -> CallResult<Option<RawUser>> {
  Ok(
    conn
      .query_row(&format!("{USER_SELECT} WHERE u.id = ?1"), [id], read_user)
      .optional()?,
  )
}

pub(crate) fn list(conn: &Connection) -> CallResult<Vec<RawUser>> {
  let mut stmt = conn.prepare(&format!("{USER_SELECT} ORDER BY u.name COLLATE NOCASE, u.id"))?;
  let rows = stmt
    .query_map([], read_user)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

pub(crate) fn insert(conn: &mut Connection, user: NewUser, now: &str) -> CallResult<RawUser> {
  let tx = conn.transaction()?;
  let taken = tx
    .query_row("SELECT 1 FROM users WHERE email = ?1", [&user.email], |_| Ok(()))
    .optional()?
    .is_some();
  if taken {
    return Err(abort(intel_core::Error::DuplicateEmail(user.email)));
  }

  tx.execute(
    "INSERT INTO users (name, last_name, email, role, password_hash, created_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    params![user.name, user.last_name, user.email, user.role.as_ref(), user.password_hash, now],
  )?;
  let id = tx.last_insert_rowid();
  let raw = tx.query_row(&format!("{USER_SELECT} WHERE u.id = ?1"), [id], read_user)?;
  tx.commit()?;
  Ok(raw)
}

/// The user with this email (case-insensitive) and their password hash.
pub(crate) fn credentials(conn: &Connection, email: &str) -> CallResult<Option<(RawUser, Option<String>)>> {
  Ok(
    conn
      .query_row(
        "SELECT u.id, u.name, u.last_name, u.email, u.role, u.created_at, u.password_hash
         FROM users u WHERE u.email = ?1",
        [email],
        |row| Ok((read_user(row)?, row.get(6)?)),
      )
      .optional()?,
  )
}

/// Sessions already expired at `created` are purged in the same transaction.
pub(crate) fn insert_session(conn: &mut Connection, session: &NewSession, created: &str, expires: &str) -> CallResult<()> {
  let tx = conn.transaction()?;
  let purged = tx.execute("DELETE FROM sessions WHERE expires_at <= ?1", [created])?;
  tx.execute(
    "INSERT INTO sessions (token_hash, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
    params![session.token_hash, session.user_id, created, expires],
  )?;
  tx.commit()?;
  if purged > 0 {
    tracing::debug!(purged, "expired sessions removed");
  }
  Ok(())
}

/// Timestamps share one fixed-width encoding, so the expiry comparison is a
/// plain string comparison.
pub(crate) fn session_user(conn: &Connection, token_hash: &str, now: &str) -> CallResult<Option<RawUser>> {
  Ok(
    conn
      .query_row(
        &format!(
          "{USER_SELECT}
           JOIN sessions s ON s.user_id = u.id
           WHERE s.token_hash = ?1 AND s.expires_at > ?2"
        ),
        params![token_hash, now],
        read_user,
      )
      .optional()?,
  )
}

pub(crate) fn delete_session(conn: &Connection, token_hash: &str) -> CallResult<bool> {
  Ok(conn.execute("DELETE FROM sessions WHERE token_hash = ?1", [token_hash])? > 0)
}
