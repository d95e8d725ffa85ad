//! Notes: free-text annotations on a contact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{
  Error, Result,
  user::{Role, User},
};

/// Audience tag carried by a note. Opaque to the backend.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NoteScope {
  #[default]
  General,
  Hemal,
  Yetkin,
  Private,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
  pub id:               i64,
  pub contact_id:       i64,
  pub user_id:          i64,
  pub author_name:      String,
  pub author_last_name: Option<String>,
  pub scope:            NoteScope,
  pub content:          String,
  pub is_edited:        bool,
  pub edited_at:        Option<DateTime<Utc>>,
  pub created_at:       DateTime<Utc>,
}

impl Note {
  /// Authors may change their own notes; admins may change any note.
  ///
  /// Decided purely on the stored author id and the acting user's stored
  /// role, never on anything carried in the edit request.
  pub fn can_be_modified_by(&self, user: &User) -> bool { may_modify(self.user_id, user) }
}

/// Edit/delete policy on a note's stored author id, usable before the note
/// is fully decoded.
pub fn may_modify(author_id: i64, user: &User) -> bool {
  author_id == user.id || user.role == Role::Admin
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNote {
  pub content: String,
  #[serde(default)]
  pub scope:   NoteScope,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NotePatch {
  #[serde(default)]
  pub content: Option<String>,
  #[serde(default)]
  pub scope:   Option<NoteScope>,
}

fn note_content(content: &str) -> Result<String> {
  let trimmed = content.trim();
  if trimmed.is_empty() {
    return Err(Error::Invalid("content is required".into()));
  }
  Ok(trimmed.to_owned())
}

impl NewNote {
  pub fn validate(mut self) -> Result<Self> {
    self.content = note_content(&self.content)?;
    Ok(self)
  }
}

impl NotePatch {
  pub fn validate(mut self) -> Result<Self> {
    if self.content.is_none() && self.scope.is_none() {
      return Err(Error::Invalid("no fields to update".into()));
    }
    if let Some(content) = &self.content {
      self.content = Some(note_content(content)?);
    }
    Ok(self)
  }
}
