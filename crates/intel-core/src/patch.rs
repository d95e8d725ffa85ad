//! Serde helper for sparse updates.
//!
//! Patch fields are `Option<Option<T>>`: the outer `None` means the key was
//! absent, `Some(None)` means an explicit `null`.

use serde::{Deserialize, Deserializer};

pub(crate) fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
  T: Deserialize<'de>,
  D: Deserializer<'de>,
{
  Option::<T>::deserialize(deserializer).map(Some)
}
