//! Support for partial updates.
//!
//! Patch structs use `Option<T>` for "leave unchanged" and `Option<Option<T>>`
//! for nullable attributes, where `Some(None)` clears the attribute.

use serde::{Deserialize, Deserializer};

/// Deserialize a present field (including `null`) as `Some(..)`.
///
/// Combined with `#[serde(default)]` a missing field stays `None`.
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Overwrite `target` when the patch carries a value.
pub fn apply<T: Clone>(target: &mut T, value: Option<&T>) {
    if let Some(value) = value {
        *target = value.clone();
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "super::double_option")]
        length: Option<Option<u32>>,
    }

    #[test]
    fn distinguishes_missing_from_null() {
        let missing: Patch = serde_json::from_str("{}").expect("missing");
        let cleared: Patch = serde_json::from_str(r#"{"length":null}"#).expect("null");
        let set: Patch = serde_json::from_str(r#"{"length":8}"#).expect("set");
        assert_eq!(missing.length, None);
        assert_eq!(cleared.length, Some(None));
        assert_eq!(set.length, Some(Some(8)));
    }
}
