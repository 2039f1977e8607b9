//! Shared Serde helpers
//!
//! Default value functions and deserializers for partial-update request bodies.

use serde::{Deserialize, Deserializer};

// ============================================================================
// Default Value Functions (for serde #[serde(default = "...")] attributes)
// ============================================================================

/// Default value: true
pub fn bool_true() -> bool {
    true
}

/// Default value: false
pub fn bool_false() -> bool {
    false
}

// ============================================================================
// Custom Deserializers
// ============================================================================

/// Deserialize a nullable field of a partial-update body
///
/// Distinguishes the three states a PATCH-style field can be in:
/// - field absent → `None` (requires `#[serde(default)]`)
/// - `null` → `Some(None)` (clear the value)
/// - value → `Some(Some(value))`
///
/// # Example
/// ```ignore
/// #[derive(Deserialize)]
/// struct Patch {
///     #[serde(default, deserialize_with = "deserialize_nullable")]
///     description: Option<Option<String>>,
/// }
/// ```
pub fn deserialize_nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
