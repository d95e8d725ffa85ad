//! Listing queries and the pagination envelope.

use serde::Serialize;

use crate::{Error, Result, contact::Priority};

/// Items per page when the caller gives none (or garbage).
pub const DEFAULT_LIMIT: u32 = 20;

/// Upper bound on items per page.
pub const MAX_LIMIT: u32 = 100;

// ─── Pagination ──────────────────────────────────────────────────────────────

/// A validated page request. `page` is 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
  pub page:  u32,
  pub limit: u32,
}

impl Pagination {
  /// Clamp `page` to at least 1 and `limit` to `1..=MAX_LIMIT`.
  pub fn new(page: u32, limit: u32) -> Self {
    Self { page: page.max(1), limit: limit.clamp(1, MAX_LIMIT) }
  }

  /// Build from raw query-string values. Anything that does not parse as a
  /// non-negative integer falls back to the default rather than leaking a
  /// nonsense bound into the query.
  pub fn from_raw(page: Option<&str>, limit: Option<&str>) -> Self {
    let parse = |raw: Option<&str>, default: u32| {
      raw
        .and_then(|s| s.trim().parse::<u32>().ok())
        .unwrap_or(default)
    };
    Self::new(parse(page, 1), parse(limit, DEFAULT_LIMIT))
  }

  pub fn offset(&self) -> u64 { u64::from(self.page - 1) * u64::from(self.limit) }
}

impl Default for Pagination {
  fn default() -> Self { Self { page: 1, limit: DEFAULT_LIMIT } }
}

/// Pagination metadata returned next to every page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
  pub page:        u32,
  pub limit:       u32,
  pub total:       u64,
  pub total_pages: u64,
  pub has_next:    bool,
  pub has_prev:    bool,
}

impl PageInfo {
  /// `total` must come from a count over the whole filtered set, not from
  /// the page itself.
  pub fn new(pagination: Pagination, total: u64) -> Self {
    let limit = u64::from(pagination.limit);
    let total_pages = if total == 0 { 1 } else { total.div_ceil(limit) };
    let page = u64::from(pagination.page);
    Self {
      page: pagination.page,
      limit: pagination.limit,
      total,
      total_pages,
      has_next: page < total_pages,
      has_prev: page > 1,
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
  pub data:       Vec<T>,
  pub pagination: PageInfo,
}

// ─── Filters ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriorityFilter {
  #[default]
  All,
  Only(Priority),
}

impl PriorityFilter {
  /// Accepts `"ALL"` or any [`Priority`] tag; empty means `All`.
  pub fn parse(raw: Option<&str>) -> Result<Self> {
    match raw.map(str::trim) {
      None | Some("") | Some("ALL") => Ok(Self::All),
      Some(tag) => tag
        .parse::<Priority>()
        .map(Self::Only)
        .map_err(|_| Error::Invalid(format!("invalid priority: {tag:?}"))),
    }
  }

  pub fn priority(&self) -> Option<Priority> {
    match self {
      Self::All => None,
      Self::Only(p) => Some(*p),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
  #[default]
  All,
  Active,
  Inactive,
}

impl StatusFilter {
  pub fn parse(raw: Option<&str>) -> Result<Self> {
    match raw.map(str::trim) {
      None | Some("") | Some("all") => Ok(Self::All),
      Some("active") => Ok(Self::Active),
      Some("inactive") => Ok(Self::Inactive),
      Some(other) => Err(Error::Invalid(format!("invalid status: {other:?}"))),
    }
  }

  pub fn is_active(&self) -> Option<bool> {
    match self {
      Self::All => None,
      Self::Active => Some(true),
      Self::Inactive => Some(false),
    }
  }
}

/// Trim a search term; blank means no search.
pub fn search_term(raw: Option<&str>) -> Option<String> {
  raw.map(str::trim).filter(|s| !s.is_empty()).map(str::to_owned)
}

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`crate::store::IntelStore::list_contacts`].
///
/// `search` is a case-insensitive substring match on first name. Results are
/// ordered newest first, ties broken by id.
#[derive(Debug, Clone, Default)]
pub struct ContactQuery {
  pub pagination: Pagination,
  pub search:     Option<String>,
  pub priority:   PriorityFilter,
  pub status:     StatusFilter,
}

/// Parameters for [`crate::store::IntelStore::list_companies`].
///
/// `search` is a case-insensitive substring match on name. Results are
/// ordered alphabetically.
#[derive(Debug, Clone, Default)]
pub struct CompanyQuery {
  pub pagination: Pagination,
  pub search:     Option<String>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn offset_calculation() {
    assert_eq!(Pagination::new(1, 10).offset(), 0);
    assert_eq!(Pagination::new(2, 10).offset(), 10);
    assert_eq!(Pagination::new(3, 25).offset(), 50);
  }

  #[test]
  fn clamps_page_and_limit() {
    assert_eq!(Pagination::new(0, 10).page, 1);
    assert_eq!(Pagination::new(1, 0).limit, 1);
    assert_eq!(Pagination::new(1, 999).limit, MAX_LIMIT);
  }

  #[test]
  fn non_numeric_values_fall_back_to_defaults() {
    let p = Pagination::from_raw(Some("abc"), Some("NaN"));
    assert_eq!(p, Pagination { page: 1, limit: DEFAULT_LIMIT });

    let p = Pagination::from_raw(Some("-3"), Some("2.5"));
    assert_eq!(p, Pagination { page: 1, limit: DEFAULT_LIMIT });

    let p = Pagination::from_raw(Some(" 4 "), Some("15"));
    assert_eq!(p, Pagination { page: 4, limit: 15 });

    assert_eq!(Pagination::from_raw(None, None), Pagination::default());
  }

  #[test]
  fn total_pages() {
    assert_eq!(PageInfo::new(Pagination::new(1, 10), 0).total_pages, 1);
    assert_eq!(PageInfo::new(Pagination::new(1, 10), 25).total_pages, 3);
    assert_eq!(PageInfo::new(Pagination::new(1, 10), 100).total_pages, 10);
  }

  #[test]
  fn has_next_prev() {
    let first = PageInfo::new(Pagination::new(1, 10), 30);
    assert!(first.has_next && !first.has_prev);

    let middle = PageInfo::new(Pagination::new(2, 10), 30);
    assert!(middle.has_next && middle.has_prev);

    let last = PageInfo::new(Pagination::new(3, 10), 30);
    assert!(!last.has_next && last.has_prev);

    let empty = PageInfo::new(Pagination::default(), 0);
    assert!(!empty.has_next && !empty.has_prev);
  }

  #[test]
  fn priority_filter() {
    assert_eq!(PriorityFilter::parse(None).unwrap(), PriorityFilter::All);
    assert_eq!(PriorityFilter::parse(Some("ALL")).unwrap(), PriorityFilter::All);
    assert_eq!(
      PriorityFilter::parse(Some("HIGH")).unwrap(),
      PriorityFilter::Only(Priority::High)
    );
    assert!(PriorityFilter::parse(Some("URGENT")).is_err());
  }

  #[test]
  fn blank_search_is_none() {
    assert_eq!(search_term(Some("   ")), None);
    assert_eq!(search_term(Some(" Al ")).as_deref(), Some("Al"));
  }
}
