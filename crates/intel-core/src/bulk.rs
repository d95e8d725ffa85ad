//! Outcome of a batch operation where each item succeeds or fails on its own.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkItemError {
  /// Position of the item in the request.
  pub index: usize,
  /// The contact id the item referred to, when it had one.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub id:    Option<i64>,
  pub error: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BulkSummary {
  pub total:      usize,
  pub successful: usize,
  pub failed:     usize,
}

/// Accumulates per-item results. A failed item never affects the others.
#[derive(Debug, Clone, Serialize)]
pub struct BulkOutcome<T> {
  pub results: Vec<T>,
  pub errors:  Vec<BulkItemError>,
  pub summary: BulkSummary,
}

impl<T> BulkOutcome<T> {
  pub fn new(total: usize) -> Self {
    Self {
      results: Vec::with_capacity(total),
      errors:  Vec::new(),
      summary: BulkSummary { total, ..Default::default() },
    }
  }

  pub fn succeed(&mut self, item: T) {
    self.results.push(item);
    self.summary.successful += 1;
  }

  pub fn fail(&mut self, index: usize, id: Option<i64>, error: impl Into<String>) {
    self.errors.push(BulkItemError { index, id, error: error.into() });
    self.summary.failed += 1;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn summary_tracks_both_sides() {
    let mut outcome = BulkOutcome::new(3);
    outcome.succeed("a");
    outcome.fail(1, Some(42), "contact not found: 42");
    outcome.succeed("c");

    assert_eq!(outcome.summary, BulkSummary { total: 3, successful: 2, failed: 1 });
    assert_eq!(outcome.results, vec!["a", "c"]);
    assert_eq!(outcome.errors[0].index, 1);
    assert_eq!(outcome.errors[0].id, Some(42));
  }
}
