//! Note queries and mutations. Permission checks run against the stored
//! author inside the same transaction as the write.

use intel_core::{
  note::{NewNote, NotePatch, may_modify},
  user::User,
};
use rusqlite::{Connection, OptionalExtension as _, params};

use crate::{
  contacts,
  encode::{NOTE_SELECT, RawNote, read_note},
  error::{CallResult, abort},
};

pub(crate) fn list(conn: &Connection, contact_id: i64) -> CallResult<Vec<RawNote>> {
  contacts::require(conn, contact_id)?;
  let mut stmt = conn.prepare(&format!(
    "{NOTE_SELECT} WHERE n.contact_id = ?1 ORDER BY n.created_at DESC, n.id DESC"
  ))?;
  let rows = stmt
    .query_map([contact_id], read_note)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

fn fetch_required(conn: &Connection, contact_id: i64, note_id: i64) -> CallResult<RawNote> {
  conn
    .query_row(
      &format!("{NOTE_SELECT} WHERE n.id = ?1 AND n.contact_id = ?2"),
      params![note_id, contact_id],
      read_note,
    )
    .optional()?
    .ok_or_else(|| abort(intel_core::Error::NoteNotFound(note_id)))
}

fn require_modifiable(conn: &Connection, contact_id: i64, note_id: i64, actor: &User) -> CallResult<()> {
  contacts::require(conn, contact_id)?;
  let note = fetch_required(conn, contact_id, note_id)?;
  if may_modify(note.user_id, actor) {
    Ok(())
  } else {
    Err(abort(intel_core::Error::Forbidden(
      "only the author or an admin may change this note".into(),
    )))
  }
}

pub(crate) fn insert(
  conn: &mut Connection,
  contact_id: i64,
  author_id: i64,
  input: NewNote,
  now: &str,
) -> CallResult<RawNote> {
  let tx = conn.transaction()?;
  contacts::require(&tx, contact_id)?;
  tx.execute(
    "INSERT INTO notes (contact_id, user_id, scope, content, created_at)
     VALUES (?1, ?2, ?3, ?4, ?5)",
    params![contact_id, author_id, input.scope.as_ref(), input.content, now],
  )?;
  let id = tx.last_insert_rowid();
  let raw = fetch_required(&tx, contact_id, id)?;
  tx.commit()?;
  Ok(raw)
}

pub(crate) fn update(
  conn: &mut Connection,
  contact_id: i64,
  note_id: i64,
  actor: &User,
  patch: NotePatch,
  now: &str,
) -> CallResult<RawNote> {
  let tx = conn.transaction()?;
  require_modifiable(&tx, contact_id, note_id, actor)?;
  tx.execute(
    "UPDATE notes
     SET content   = COALESCE(?1, content),
         scope     = COALESCE(?2, scope),
         is_edited = 1,
         edited_at = ?3
     WHERE id = ?4",
    params![patch.content, patch.scope.map(|s| s.as_ref().to_owned()), now, note_id],
  )?;
  let raw = fetch_required(&tx, contact_id, note_id)?;
  tx.commit()?;
  Ok(raw)
}

pub(crate) fn delete(conn: &mut Connection, contact_id: i64, note_id: i64, actor: &User) -> CallResult<()> {
  let tx = conn.transaction()?;
  require_modifiable(&tx, contact_id, note_id, actor)?;
  tx.execute("DELETE FROM notes WHERE id = ?1", [note_id])?;
  tx.commit()?;
  Ok(())
}
