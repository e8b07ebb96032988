//! Serde adapters shared by update payloads.

use serde::{Deserialize, Deserializer};

/// Deserialize a nullable field into `Option<Option<T>>`.
///
/// Use with `#[serde(default, deserialize_with = "double_option")]` so that an
/// absent field stays `None` (unchanged) while an explicit `null` becomes
/// `Some(None)` (clear the column).
///
/// # Errors
///
/// Propagates the inner deserializer error.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
