//! Per-collection reducers.
//!
//! Every reducer has the shape
//! `fn reduce(state, action, context) -> Result<state>` and returns its input
//! (a cheap `Arc` clone) for actions that do not concern it. Tables are only
//! copied when an entry actually changes, so unchanged tables stay shared
//! with the previous snapshot.

pub mod arm;
pub mod code_lists;
pub mod comments;
pub mod item_defs;
pub mod item_groups;
pub mod leafs;
pub mod metadata_version;
pub mod methods;
pub mod odm;
pub mod order;
pub mod standards;
pub mod value_lists;
pub mod where_clauses;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use define_model::{ItemRef, ItemRefOid, ItemRefSet, MethodOid, Table, WhereClause};

/// Apply `edit` to every entry, copying the table only if an entry changed.
/// `edit` returns true when it modified the value.
pub(crate) fn edit_each<K, V>(table: &mut Table<K, V>, mut edit: impl FnMut(&mut V) -> bool) -> bool
where
    K: Ord + Clone,
    V: Clone,
{
    let changed: Vec<(K, V)> = table
        .iter()
        .filter_map(|(key, value)| {
            let mut next = value.clone();
            edit(&mut next).then(|| (key.clone(), next))
        })
        .collect();
    if changed.is_empty() {
        return false;
    }
    let map = Arc::make_mut(table);
    for (key, value) in changed {
        map.insert(key, value);
    }
    true
}

/// Apply `edit` to one entry. Missing keys leave the table untouched.
pub(crate) fn edit_one<K, V, R>(
    table: &mut Table<K, V>,
    key: &K,
    edit: impl FnOnce(&mut V) -> R,
) -> Option<R>
where
    K: Ord + Clone,
    V: Clone,
{
    if !table.contains_key(key) {
        return None;
    }
    Arc::make_mut(table).get_mut(key).map(edit)
}

/// Remove `keys`, copying the table only if one of them is present.
pub(crate) fn remove_keys<K, V>(table: &mut Table<K, V>, keys: &BTreeSet<K>) -> bool
where
    K: Ord + Clone,
    V: Clone,
{
    if !keys.iter().any(|key| table.contains_key(key)) {
        return false;
    }
    Arc::make_mut(table).retain(|key, _| !keys.contains(key));
    true
}

/// Move an entry to a new key, fixing its own OID with `set_key`.
pub(crate) fn rekey<K, V>(table: &mut Table<K, V>, old: &K, new: &K, set_key: impl FnOnce(&mut V))
where
    K: Ord + Clone,
    V: Clone,
{
    if !table.contains_key(old) {
        return;
    }
    let map = Arc::make_mut(table);
    if let Some(mut value) = map.remove(old) {
        set_key(&mut value);
        map.insert(new.clone(), value);
    }
}

/// Insert a value under a fresh key.
pub(crate) fn insert_new<K, V>(table: &mut Table<K, V>, key: K, value: V)
where
    K: Ord + Clone,
    V: Clone,
{
    Arc::make_mut(table).insert(key, value);
}

/// The item ref as stored by ADD_VALLVL: a new where clause is linked to it.
pub(crate) fn value_level_item_ref(item_ref: &ItemRef, where_clause: Option<&WhereClause>) -> ItemRef {
    let mut item_ref = item_ref.clone();
    if let Some(where_clause) = where_clause {
        item_ref.where_clause_oid = Some(where_clause.oid.clone());
    }
    item_ref
}

/// Set or clear the method of one item ref. Returns true when it changed.
pub(crate) fn set_item_ref_method(
    refs: &mut ItemRefSet,
    item_ref_oid: &ItemRefOid,
    method_oid: Option<MethodOid>,
) -> bool {
    match refs.item_refs.get_mut(item_ref_oid) {
        Some(item_ref) if item_ref.method_oid != method_oid => {
            item_ref.method_oid = method_oid;
            true
        }
        _ => false,
    }
}

/// Drop the given refs from a container. Returns true when anything changed.
pub(crate) fn remove_item_refs(
    refs: &mut ItemRefSet,
    item_ref_oids: &BTreeSet<ItemRefOid>,
) -> bool {
    let mut changed = false;
    for oid in item_ref_oids {
        changed |= refs.remove(oid).is_some();
    }
    changed
}

/// Clear an optional pointer when it names a removed entity.
pub(crate) fn clear_if_removed<T: Ord>(pointer: &mut Option<T>, removed: &BTreeSet<T>) -> bool {
    if pointer.as_ref().is_some_and(|value| removed.contains(value)) {
        *pointer = None;
        return true;
    }
    false
}

/// Rename a key of a sources map.
pub(crate) fn rename_key<K: Ord + Clone, V>(map: &mut BTreeMap<K, V>, old: &K, new: &K) -> bool {
    match map.remove(old) {
        Some(value) => {
            map.insert(new.clone(), value);
            true
        }
        None => false,
    }
}
