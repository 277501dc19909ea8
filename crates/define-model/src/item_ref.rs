//! Item references: the usage of an item def inside a dataset or value list.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::oid::{ItemDefOid, ItemGroupOid, ItemRefOid, MethodOid, ValueListOid, WhereClauseOid};
use crate::order;
use crate::patch::{apply, double_option};

/// Owner of a set of item refs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "oid", rename_all = "snake_case")]
pub enum ItemRefContainer {
    ItemGroup(ItemGroupOid),
    ValueList(ValueListOid),
}

impl fmt::Display for ItemRefContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ItemGroup(oid) => write!(f, "{oid}"),
            Self::ValueList(oid) => write!(f, "{oid}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRef {
    pub oid: ItemRefOid,
    pub item_oid: ItemDefOid,
    #[serde(default)]
    pub mandatory: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method_oid: Option<MethodOid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub where_clause_oid: Option<WhereClauseOid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_sequence: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_number: Option<u32>,
    #[serde(default)]
    pub is_non_standard: bool,
    #[serde(default)]
    pub has_no_data: bool,
}

impl ItemRef {
    pub fn new(oid: ItemRefOid, item_oid: ItemDefOid) -> Self {
        Self {
            oid,
            item_oid,
            mandatory: false,
            role: None,
            method_oid: None,
            where_clause_oid: None,
            key_sequence: None,
            order_number: None,
            is_non_standard: false,
            has_no_data: false,
        }
    }

    #[must_use]
    pub fn with_mandatory(mut self, mandatory: bool) -> Self {
        self.mandatory = mandatory;
        self
    }

    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    #[must_use]
    pub fn with_key_sequence(mut self, key_sequence: u32) -> Self {
        self.key_sequence = Some(key_sequence);
        self
    }

    #[must_use]
    pub fn with_method(mut self, method_oid: MethodOid) -> Self {
        self.method_oid = Some(method_oid);
        self
    }

    #[must_use]
    pub fn with_where_clause(mut self, where_clause_oid: WhereClauseOid) -> Self {
        self.where_clause_oid = Some(where_clause_oid);
        self
    }

    pub fn normalized(mut self) -> Self {
        self.role = self
            .role
            .map(|role| role.trim().to_string())
            .filter(|role| !role.is_empty());
        self.key_sequence = self.key_sequence.filter(|sequence| *sequence > 0);
        self
    }

    pub fn merged(&self, patch: &ItemRefPatch) -> Self {
        let mut next = self.clone();
        apply(&mut next.mandatory, patch.mandatory.as_ref());
        apply(&mut next.role, patch.role.as_ref());
        apply(&mut next.order_number, patch.order_number.as_ref());
        apply(&mut next.is_non_standard, patch.is_non_standard.as_ref());
        apply(&mut next.has_no_data, patch.has_no_data.as_ref());
        next.normalized()
    }
}

/// Partial update of an item ref's usage attributes.
///
/// Key sequence, method and where clause links have dedicated actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemRefPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mandatory: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub role: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub order_number: Option<Option<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_non_standard: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_no_data: Option<bool>,
}

/// Ordered, keyed set of item refs with a key-variable order.
///
/// Invariants: `item_ref_order` lists every key of `item_refs` exactly once,
/// `key_order` is a duplicate-free subset of `item_ref_order`, and each ref's
/// `key_sequence` is its 1-based position in `key_order`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemRefSet {
    pub item_refs: BTreeMap<ItemRefOid, ItemRef>,
    pub item_ref_order: Vec<ItemRefOid>,
    pub key_order: Vec<ItemRefOid>,
}

impl ItemRefSet {
    pub fn len(&self) -> usize {
        self.item_refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.item_refs.is_empty()
    }

    pub fn get(&self, oid: &ItemRefOid) -> Option<&ItemRef> {
        self.item_refs.get(oid)
    }

    /// Item refs in display order.
    pub fn ordered(&self) -> impl Iterator<Item = &ItemRef> {
        self.item_ref_order
            .iter()
            .filter_map(|oid| self.item_refs.get(oid))
    }

    pub fn find_by_item(&self, item_oid: &ItemDefOid) -> Option<&ItemRef> {
        self.item_refs
            .values()
            .find(|item_ref| item_ref.item_oid == *item_oid)
    }

    /// Insert a ref at `position`. A ref carrying a key sequence is also
    /// inserted into the key order at that sequence and the following keys
    /// are renumbered.
    pub fn insert(&mut self, item_ref: ItemRef, position: Option<usize>) -> Result<()> {
        let item_ref = item_ref.normalized();
        if self.item_refs.contains_key(&item_ref.oid) {
            return Err(ModelError::DuplicateOid {
                collection: "item refs",
                oid: item_ref.oid.to_string(),
            });
        }
        if self.find_by_item(&item_ref.item_oid).is_some() {
            return Err(ModelError::DuplicateItemRef {
                item_oid: item_ref.item_oid.to_string(),
            });
        }
        order::insert_at(
            "item refs",
            &mut self.item_ref_order,
            position,
            item_ref.oid.clone(),
        )?;
        if let Some(sequence) = item_ref.key_sequence {
            let index = (sequence as usize).saturating_sub(1).min(self.key_order.len());
            self.key_order.insert(index, item_ref.oid.clone());
        }
        self.item_refs.insert(item_ref.oid.clone(), item_ref);
        self.renumber_keys();
        Ok(())
    }

    /// Remove a ref from the table, the order and the key order.
    pub fn remove(&mut self, oid: &ItemRefOid) -> Option<ItemRef> {
        let removed = self.item_refs.remove(oid)?;
        order::remove_value(&mut self.item_ref_order, oid);
        if order::remove_value(&mut self.key_order, oid) {
            self.renumber_keys();
        }
        Some(removed)
    }

    pub fn set_order(&mut self, item_ref_order: Vec<ItemRefOid>) -> Result<()> {
        order::ensure_permutation("item refs", &self.item_ref_order, &item_ref_order)?;
        self.item_ref_order = item_ref_order;
        Ok(())
    }

    pub fn set_key_order(&mut self, key_order: Vec<ItemRefOid>) -> Result<()> {
        order::ensure_subset(&self.item_ref_order, &key_order)?;
        self.key_order = key_order;
        self.renumber_keys();
        Ok(())
    }

    /// Rewrite key sequences from the key order.
    pub fn renumber_keys(&mut self) {
        let item_refs = &self.item_refs;
        self.key_order.retain(|oid| item_refs.contains_key(oid));
        let positions: BTreeMap<&ItemRefOid, u32> = self.key_order.iter().zip(1u32..).collect();
        for (oid, item_ref) in &mut self.item_refs {
            item_ref.key_sequence = positions.get(oid).copied();
        }
    }

    /// Rebuild derived order data from possibly inconsistent input.
    pub fn normalized(mut self) -> Self {
        self.item_refs = self
            .item_refs
            .into_iter()
            .map(|(oid, item_ref)| (oid, item_ref.normalized()))
            .collect();
        let mut seen = std::collections::BTreeSet::new();
        let item_refs = &self.item_refs;
        self.item_ref_order
            .retain(|oid| item_refs.contains_key(oid) && seen.insert(oid.clone()));
        for oid in self.item_refs.keys() {
            if !seen.contains(oid) {
                self.item_ref_order.push(oid.clone());
            }
        }
        if self.key_order.is_empty() {
            let mut keyed: Vec<(&u32, &ItemRefOid)> = self
                .item_refs
                .values()
                .filter_map(|item_ref| item_ref.key_sequence.as_ref().map(|seq| (seq, &item_ref.oid)))
                .collect();
            keyed.sort();
            self.key_order = keyed.into_iter().map(|(_, oid)| oid.clone()).collect();
        } else {
            let mut seen_keys = std::collections::BTreeSet::new();
            self.key_order.retain(|oid| seen_keys.insert(oid.clone()));
        }
        self.renumber_keys();
        self
    }
}
