//! Where clauses: range-check conditions attached to value-level item refs
//! and analysis datasets.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::oid::{
    AnalysisResultOid, CommentOid, ItemDefOid, ItemGroupOid, ItemRefOid, ValueListOid,
    WhereClauseOid,
};
use crate::order;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Comparator {
    Lt,
    Le,
    Gt,
    Ge,
    #[default]
    Eq,
    Ne,
    In,
    Notin,
}

impl Comparator {
    /// Comparators that accept several check values.
    pub fn is_multi_valued(self) -> bool {
        matches!(self, Self::In | Self::Notin)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SoftHard {
    Soft,
    #[default]
    Hard,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeCheck {
    #[serde(default)]
    pub comparator: Comparator,
    #[serde(default)]
    pub soft_hard: SoftHard,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_group_oid: Option<ItemGroupOid>,
    pub item_oid: ItemDefOid,
    #[serde(default)]
    pub check_values: Vec<String>,
}

impl RangeCheck {
    pub fn new(item_oid: ItemDefOid, comparator: Comparator, check_values: Vec<String>) -> Self {
        Self {
            comparator,
            soft_hard: SoftHard::default(),
            item_group_oid: None,
            item_oid,
            check_values,
        }
    }

    #[must_use]
    pub fn in_group(mut self, item_group_oid: ItemGroupOid) -> Self {
        self.item_group_oid = Some(item_group_oid);
        self
    }

    fn normalized(mut self) -> Self {
        self.check_values = self
            .check_values
            .into_iter()
            .map(|value| value.trim().to_string())
            .collect();
        if !self.comparator.is_multi_valued() {
            self.check_values.truncate(1);
        }
        self
    }
}

/// Back-references: value list item refs and analysis result datasets using
/// the clause.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WhereClauseSources {
    pub value_lists: BTreeMap<ValueListOid, Vec<ItemRefOid>>,
    pub analysis_results: BTreeMap<AnalysisResultOid, Vec<ItemGroupOid>>,
}

impl WhereClauseSources {
    pub fn is_empty(&self) -> bool {
        self.value_lists.is_empty() && self.analysis_results.is_empty()
    }

    pub fn add_value_list_ref(&mut self, value_list_oid: ValueListOid, item_ref_oid: ItemRefOid) {
        order::push_unique(
            self.value_lists.entry(value_list_oid).or_default(),
            item_ref_oid,
        );
    }

    pub fn add_analysis_dataset(
        &mut self,
        analysis_result_oid: AnalysisResultOid,
        item_group_oid: ItemGroupOid,
    ) {
        order::push_unique(
            self.analysis_results.entry(analysis_result_oid).or_default(),
            item_group_oid,
        );
    }

    pub fn remove_value_list_ref(
        &mut self,
        value_list_oid: &ValueListOid,
        item_ref_oid: &ItemRefOid,
    ) -> bool {
        let Some(refs) = self.value_lists.get_mut(value_list_oid) else {
            return false;
        };
        let removed = order::remove_value(refs, item_ref_oid);
        if refs.is_empty() {
            self.value_lists.remove(value_list_oid);
        }
        removed
    }

    pub fn remove_analysis_dataset(
        &mut self,
        analysis_result_oid: &AnalysisResultOid,
        item_group_oid: &ItemGroupOid,
    ) -> bool {
        let Some(groups) = self.analysis_results.get_mut(analysis_result_oid) else {
            return false;
        };
        let removed = order::remove_value(groups, item_group_oid);
        if groups.is_empty() {
            self.analysis_results.remove(analysis_result_oid);
        }
        removed
    }

    /// Drop every back-reference coming from the given analysis results.
    pub fn remove_analysis_results(&mut self, removed: &BTreeSet<AnalysisResultOid>) -> bool {
        let before = self.analysis_results.len();
        self.analysis_results.retain(|oid, _| !removed.contains(oid));
        before != self.analysis_results.len()
    }

    pub fn rename_item_group(&mut self, old: &ItemGroupOid, new: &ItemGroupOid) -> bool {
        let mut changed = false;
        for groups in self.analysis_results.values_mut() {
            changed |= order::rename_in(groups, old, new);
        }
        changed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhereClause {
    pub oid: WhereClauseOid,
    #[serde(default)]
    pub range_checks: Vec<RangeCheck>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_oid: Option<CommentOid>,
    #[serde(default)]
    pub sources: WhereClauseSources,
}

impl WhereClause {
    pub fn new(oid: WhereClauseOid, range_checks: Vec<RangeCheck>) -> Self {
        Self {
            oid,
            range_checks,
            comment_oid: None,
            sources: WhereClauseSources::default(),
        }
    }

    pub fn normalized(mut self) -> Self {
        self.range_checks = self
            .range_checks
            .into_iter()
            .map(RangeCheck::normalized)
            .collect();
        self
    }

    /// Remove range checks testing one of `item_oids`.
    pub fn strip_items(&mut self, item_oids: &BTreeSet<ItemDefOid>) -> bool {
        let before = self.range_checks.len();
        self.range_checks
            .retain(|check| !item_oids.contains(&check.item_oid));
        before != self.range_checks.len()
    }

    pub fn rename_item_group(&mut self, old: &ItemGroupOid, new: &ItemGroupOid) -> bool {
        let mut changed = self.sources.rename_item_group(old, new);
        for check in &mut self.range_checks {
            if check.item_group_oid.as_ref() == Some(old) {
                check.item_group_oid = Some(new.clone());
                changed = true;
            }
        }
        changed
    }
}
