//! Cross-reference maintenance for cascading deletes.
//!
//! A delete is computed in two steps. The functions here walk the document
//! from the entities the user picked and collect everything that becomes
//! unreachable into a [`DeletionClosure`]. The closure travels inside the
//! `DEL_*` action and every collection reducer applies its own part of it.
//!
//! An owned entity (item def, value list, code list, method, comment, where
//! clause) is only part of the closure when no surviving owner references
//! it.

mod arm;
mod code_lists;
mod item_groups;
mod walker;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use define_model::{
    AnalysisResultOid, CodeListOid, CommentOid, CommentOwner, ItemDefOid, ItemGroupOid,
    ItemRefContainer, ItemRefOid, MetaDataVersion, MethodOid, MethodOwner, ResultDisplayOid,
    ValueListOid, WhereClauseOid,
};

pub use arm::{
    ArmRelated, analysis_datasets_related_oids, analysis_results_related_oids,
    arm_analysis_result_oids, arm_disable_closure, result_displays_related_oids,
};
pub use code_lists::code_lists_related_oids;
use walker::Walker;
pub use item_groups::{
    ItemGroupsRelated, ItemRefsRelated, item_groups_related_oids, item_refs_related_oids,
};

/// An item ref leaving its container.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RemovedItemRef {
    pub container: ItemRefContainer,
    pub item_ref_oid: ItemRefOid,
    pub item_oid: ItemDefOid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method_oid: Option<MethodOid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub where_clause_oid: Option<WhereClauseOid>,
}

/// A dataset entry leaving an analysis result.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RemovedAnalysisDataset {
    pub analysis_result_oid: AnalysisResultOid,
    pub item_group_oid: ItemGroupOid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub where_clause_oid: Option<WhereClauseOid>,
}

/// Everything a cascading delete removes or detaches.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeletionClosure {
    pub item_group_oids: BTreeSet<ItemGroupOid>,
    pub item_refs: BTreeSet<RemovedItemRef>,
    pub item_def_oids: BTreeSet<ItemDefOid>,
    pub value_list_oids: BTreeSet<ValueListOid>,
    pub where_clause_oids: BTreeSet<WhereClauseOid>,
    pub method_oids: BTreeSet<MethodOid>,
    pub comment_oids: BTreeSet<CommentOid>,
    pub code_list_oids: BTreeSet<CodeListOid>,
    pub analysis_datasets: BTreeSet<RemovedAnalysisDataset>,
    pub result_display_oids: BTreeSet<ResultDisplayOid>,
    pub analysis_result_oids: BTreeSet<AnalysisResultOid>,
    /// Drop the whole ARM section.
    pub disable_arm: bool,
}

impl DeletionClosure {
    pub fn is_empty(&self) -> bool {
        self.item_group_oids.is_empty()
            && self.item_refs.is_empty()
            && self.item_def_oids.is_empty()
            && self.value_list_oids.is_empty()
            && self.where_clause_oids.is_empty()
            && self.method_oids.is_empty()
            && self.comment_oids.is_empty()
            && self.code_list_oids.is_empty()
            && self.analysis_datasets.is_empty()
            && self.result_display_oids.is_empty()
            && self.analysis_result_oids.is_empty()
            && !self.disable_arm
    }

    /// True when the container itself is deleted.
    pub fn removes_container(&self, container: &ItemRefContainer) -> bool {
        match container {
            ItemRefContainer::ItemGroup(oid) => self.item_group_oids.contains(oid),
            ItemRefContainer::ValueList(oid) => self.value_list_oids.contains(oid),
        }
    }

    /// True when the item ref goes away, either listed or through its container.
    pub fn removes_item_ref(&self, container: &ItemRefContainer, item_ref_oid: &ItemRefOid) -> bool {
        self.removes_container(container)
            || self
                .item_refs
                .iter()
                .any(|removed| removed.container == *container && removed.item_ref_oid == *item_ref_oid)
    }

    /// True when `container` stops referencing `item_oid`.
    pub fn removes_usage(&self, container: &ItemRefContainer, item_oid: &ItemDefOid) -> bool {
        self.removes_container(container)
            || self
                .item_refs
                .iter()
                .any(|removed| removed.container == *container && removed.item_oid == *item_oid)
    }

    /// Item ref OIDs removed from one container.
    pub fn item_refs_of(&self, container: &ItemRefContainer) -> BTreeSet<ItemRefOid> {
        self.item_refs
            .iter()
            .filter(|removed| removed.container == *container)
            .map(|removed| removed.item_ref_oid.clone())
            .collect()
    }

    pub fn removes_method_owner(&self, owner: &MethodOwner) -> bool {
        self.removes_item_ref(&owner.container, &owner.item_ref_oid)
    }

    pub fn removes_analysis_dataset(
        &self,
        analysis_result_oid: &AnalysisResultOid,
        item_group_oid: &ItemGroupOid,
    ) -> bool {
        self.disable_arm
            || self.analysis_result_oids.contains(analysis_result_oid)
            || self.item_group_oids.contains(item_group_oid)
            || self.analysis_datasets.iter().any(|removed| {
                removed.analysis_result_oid == *analysis_result_oid
                    && removed.item_group_oid == *item_group_oid
            })
    }

    /// True when a comment owner is deleted by this closure.
    pub fn removes_comment_owner(&self, owner: &CommentOwner) -> bool {
        match owner {
            CommentOwner::ItemGroup(oid) => self.item_group_oids.contains(oid),
            CommentOwner::ItemDef(oid) => self.item_def_oids.contains(oid),
            CommentOwner::CodeList(oid) => self.code_list_oids.contains(oid),
            CommentOwner::WhereClause(oid) => self.where_clause_oids.contains(oid),
            CommentOwner::AnalysisResult(oid) => {
                self.disable_arm || self.analysis_result_oids.contains(oid)
            }
            CommentOwner::MetaDataVersion(_) => false,
        }
    }

    /// The first entity `required` removes that this closure keeps.
    pub fn first_omission(&self, required: &DeletionClosure) -> Option<String> {
        fn omitted<T: Ord + fmt::Display>(
            have: &BTreeSet<T>,
            need: &BTreeSet<T>,
            kind: &str,
        ) -> Option<String> {
            need.iter()
                .find(|oid| !have.contains(*oid))
                .map(|oid| format!("{kind} '{oid}'"))
        }

        if required.disable_arm && !self.disable_arm {
            return Some("the ARM section".to_string());
        }
        omitted(&self.item_group_oids, &required.item_group_oids, "item group")
            .or_else(|| {
                required
                    .item_refs
                    .iter()
                    .find(|removed| {
                        !self.removes_item_ref(&removed.container, &removed.item_ref_oid)
                    })
                    .map(|removed| {
                        format!("item ref '{}' of {}", removed.item_ref_oid, removed.container)
                    })
            })
            .or_else(|| omitted(&self.item_def_oids, &required.item_def_oids, "item def"))
            .or_else(|| omitted(&self.value_list_oids, &required.value_list_oids, "value list"))
            .or_else(|| {
                omitted(
                    &self.where_clause_oids,
                    &required.where_clause_oids,
                    "where clause",
                )
            })
            .or_else(|| omitted(&self.method_oids, &required.method_oids, "method"))
            .or_else(|| omitted(&self.comment_oids, &required.comment_oids, "comment"))
            .or_else(|| omitted(&self.code_list_oids, &required.code_list_oids, "code list"))
            .or_else(|| {
                required
                    .analysis_datasets
                    .iter()
                    .find(|removed| {
                        !self.removes_analysis_dataset(
                            &removed.analysis_result_oid,
                            &removed.item_group_oid,
                        )
                    })
                    .map(|removed| {
                        format!(
                            "analysis dataset '{}' of '{}'",
                            removed.item_group_oid, removed.analysis_result_oid
                        )
                    })
            })
            .or_else(|| {
                omitted(
                    &self.result_display_oids,
                    &required.result_display_oids,
                    "result display",
                )
            })
            .or_else(|| {
                omitted(
                    &self.analysis_result_oids,
                    &required.analysis_result_oids,
                    "analysis result",
                )
            })
    }

    /// Total number of entities removed, for logging.
    pub fn removed_count(&self) -> usize {
        self.item_group_oids.len()
            + self.item_refs.len()
            + self.item_def_oids.len()
            + self.value_list_oids.len()
            + self.where_clause_oids.len()
            + self.method_oids.len()
            + self.comment_oids.len()
            + self.code_list_oids.len()
            + self.analysis_datasets.len()
            + self.result_display_oids.len()
            + self.analysis_result_oids.len()
    }
}

/// Walk `mdv` again from the entities a closure deletes directly and return
/// everything that delete really releases.
///
/// Owned entities listed in `closure` (item defs, value lists, methods,
/// comments, where clauses) are not used as starting points; they must
/// follow from the roots.
pub fn required_closure(mdv: &MetaDataVersion, closure: &DeletionClosure) -> DeletionClosure {
    let mut walker = Walker::new(mdv);
    walker.remove_item_groups(&closure.item_group_oids);

    let mut item_refs: BTreeMap<&ItemRefContainer, Vec<ItemRefOid>> = BTreeMap::new();
    for removed in &closure.item_refs {
        item_refs
            .entry(&removed.container)
            .or_default()
            .push(removed.item_ref_oid.clone());
    }
    for (container, oids) in item_refs {
        walker.remove_item_refs(container, &oids);
    }

    walker.remove_code_lists(&closure.code_list_oids);
    if closure.disable_arm {
        walker.disable_arm();
    }
    walker.remove_result_displays(&closure.result_display_oids);
    walker.remove_analysis_results(&closure.analysis_result_oids);

    let mut datasets: BTreeMap<&AnalysisResultOid, Vec<&ItemGroupOid>> = BTreeMap::new();
    for removed in &closure.analysis_datasets {
        datasets
            .entry(&removed.analysis_result_oid)
            .or_default()
            .push(&removed.item_group_oid);
    }
    for (result, groups) in datasets {
        walker.remove_analysis_datasets(result, groups);
    }
    walker.finish()
}
