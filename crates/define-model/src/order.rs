//! Helpers for order arrays kept next to keyed tables.

use std::collections::BTreeSet;
use std::fmt::Display;

use crate::error::{ModelError, Result};

/// Insert `value` at `position` (append when `None`).
pub fn insert_at<T>(
    collection: &'static str,
    order: &mut Vec<T>,
    position: Option<usize>,
    value: T,
) -> Result<()> {
    match position {
        None => order.push(value),
        Some(position) if position <= order.len() => order.insert(position, value),
        Some(position) => {
            return Err(ModelError::InvalidPosition {
                collection,
                position,
                len: order.len(),
            });
        }
    }
    Ok(())
}

/// Check that `proposed` holds exactly the elements of `current`, each once.
pub fn ensure_permutation<T: Ord>(
    collection: &'static str,
    current: &[T],
    proposed: &[T],
) -> Result<()> {
    if current.len() != proposed.len() {
        return Err(ModelError::NotAPermutation { collection });
    }
    let expected: BTreeSet<&T> = current.iter().collect();
    let found: BTreeSet<&T> = proposed.iter().collect();
    if found.len() != proposed.len() || expected != found {
        return Err(ModelError::NotAPermutation { collection });
    }
    Ok(())
}

/// Replace every occurrence of `old` with `new`. Returns true when anything changed.
pub fn rename_in<T: PartialEq + Clone>(values: &mut [T], old: &T, new: &T) -> bool {
    let mut changed = false;
    for value in values.iter_mut() {
        if *value == *old {
            *value = new.clone();
            changed = true;
        }
    }
    changed
}

/// Push `value` unless it is already present.
pub fn push_unique<T: PartialEq>(values: &mut Vec<T>, value: T) -> bool {
    if values.contains(&value) {
        return false;
    }
    values.push(value);
    true
}

/// Remove every occurrence of `value`. Returns true when anything was removed.
pub fn remove_value<T: PartialEq>(values: &mut Vec<T>, value: &T) -> bool {
    let before = values.len();
    values.retain(|candidate| candidate != value);
    before != values.len()
}

/// Ensure a key order only names distinct members of `order`.
pub fn ensure_subset<T: Ord + Display>(order: &[T], subset: &[T]) -> Result<()> {
    let members: BTreeSet<&T> = order.iter().collect();
    let mut seen = BTreeSet::new();
    for value in subset {
        if !members.contains(value) || !seen.insert(value) {
            return Err(ModelError::InvalidKeyOrder {
                oid: value.to_string(),
            });
        }
    }
    Ok(())
}
