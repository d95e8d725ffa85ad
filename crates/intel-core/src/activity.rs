//! Append-only and join records hanging off a contact: history, assignments,
//! outreach events and contact-to-contact relationships.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

// ─── History ─────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HistoryAction {
  Created,
  Updated,
  Deactivated,
}

/// One audit-log row. Never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
  pub id:         i64,
  pub contact_id: i64,
  pub action:     HistoryAction,
  /// For updates, the submitted fields verbatim (not a before/after diff).
  pub changes:    Option<serde_json::Value>,
  pub reason:     Option<String>,
  pub user_id:    Option<i64>,
  pub created_at: DateTime<Utc>,
}

// ─── Assignments ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
  pub id:             i64,
  pub contact_id:     i64,
  pub user_id:        i64,
  pub user_name:      String,
  pub user_last_name: Option<String>,
  pub assigned_at:    DateTime<Utc>,
}

// ─── Outreach ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutreachEvent {
  pub id:          i64,
  pub contact_id:  i64,
  /// e.g. `"email_sent"`, `"response_received"`.
  pub event_type:  String,
  pub channel:     Option<String>,
  pub description: Option<String>,
  pub user_id:     Option<i64>,
  pub occurred_at: DateTime<Utc>,
}

// ─── Relationships ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
  pub id:                 i64,
  pub contact_id:         i64,
  pub related_contact_id: i64,
  pub related_name:       String,
  /// Free-text label, e.g. `"spouse"`, `"agent"`.
  pub relationship_type:  String,
  pub created_at:         DateTime<Utc>,
}
