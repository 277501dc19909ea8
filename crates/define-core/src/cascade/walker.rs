//! Closure accumulation shared by all cascade entry points.

use std::collections::BTreeSet;

use define_model::{
    AnalysisResultOid, CodeListOid, CommentOid, ItemDef, ItemDefOid, ItemGroupOid,
    ItemRefContainer, ItemRefOid, ItemRefSet, MetaDataVersion, MethodOwner, ResultDisplayOid,
    ValueListOid, WhereClauseOid,
};

use super::arm::arm_analysis_result_oids;
use super::{DeletionClosure, RemovedAnalysisDataset, RemovedItemRef};

pub(super) struct Walker<'a> {
    mdv: &'a MetaDataVersion,
    closure: DeletionClosure,
}

impl<'a> Walker<'a> {
    pub(super) fn new(mdv: &'a MetaDataVersion) -> Self {
        Self {
            mdv,
            closure: DeletionClosure::default(),
        }
    }

    // ========================================================================
    // Datasets, item refs, item defs, value lists
    // ========================================================================

    pub(super) fn remove_item_groups<'o>(&mut self, oids: impl IntoIterator<Item = &'o ItemGroupOid>) {
        let mdv = self.mdv;
        let groups: Vec<_> = oids
            .into_iter()
            .filter_map(|oid| mdv.item_groups.get(oid))
            .collect();
        for group in &groups {
            self.closure.item_group_oids.insert(group.oid.clone());
        }
        for group in groups {
            let container = ItemRefContainer::ItemGroup(group.oid.clone());
            self.remove_item_refs(&container, &group.refs.item_ref_order);
        }
        if let Some(arm) = &mdv.analysis_result_displays {
            for result in arm.analysis_results.values() {
                for dataset in result.analysis_datasets.values() {
                    if self.closure.item_group_oids.contains(&dataset.item_group_oid) {
                        self.closure.analysis_datasets.insert(RemovedAnalysisDataset {
                            analysis_result_oid: result.oid.clone(),
                            item_group_oid: dataset.item_group_oid.clone(),
                            where_clause_oid: dataset.where_clause_oid.clone(),
                        });
                    }
                }
            }
        }
    }

    /// Remove item refs of one container and release whatever they owned.
    pub(super) fn remove_item_refs(&mut self, container: &ItemRefContainer, oids: &[ItemRefOid]) {
        let Some(set) = self.item_ref_set(container) else {
            return;
        };
        for oid in oids {
            let Some(item_ref) = set.get(oid) else {
                continue;
            };
            let removed = RemovedItemRef {
                container: container.clone(),
                item_ref_oid: item_ref.oid.clone(),
                item_oid: item_ref.item_oid.clone(),
                method_oid: item_ref.method_oid.clone(),
                where_clause_oid: item_ref.where_clause_oid.clone(),
            };
            if self.closure.item_refs.insert(removed) {
                self.release_item_def(&item_ref.item_oid);
            }
        }
    }

    fn item_ref_set(&self, container: &ItemRefContainer) -> Option<&'a ItemRefSet> {
        let mdv = self.mdv;
        match container {
            ItemRefContainer::ItemGroup(oid) => mdv.item_groups.get(oid).map(|group| &group.refs),
            ItemRefContainer::ValueList(oid) => mdv.value_lists.get(oid).map(|list| &list.refs),
        }
    }

    fn release_item_def(&mut self, oid: &ItemDefOid) {
        let mdv = self.mdv;
        let Some(item_def) = mdv.item_defs.get(oid) else {
            return;
        };
        if self.closure.item_def_oids.contains(oid) || !self.item_def_orphaned(item_def) {
            return;
        }
        self.closure.item_def_oids.insert(oid.clone());
        if let Some(value_list_oid) = &item_def.value_list_oid {
            self.release_value_list(value_list_oid);
        }
    }

    fn item_def_orphaned(&self, item_def: &ItemDef) -> bool {
        let groups = item_def.sources.item_groups.iter().all(|group| {
            self.closure
                .removes_usage(&ItemRefContainer::ItemGroup(group.clone()), &item_def.oid)
        });
        let lists = item_def.sources.value_lists.iter().all(|list| {
            self.closure
                .removes_usage(&ItemRefContainer::ValueList(list.clone()), &item_def.oid)
        });
        groups && lists
    }

    fn release_value_list(&mut self, oid: &ValueListOid) {
        let mdv = self.mdv;
        let Some(list) = mdv.value_lists.get(oid) else {
            return;
        };
        let orphaned = list
            .sources
            .item_defs
            .iter()
            .all(|parent| self.closure.item_def_oids.contains(parent));
        if !orphaned || !self.closure.value_list_oids.insert(oid.clone()) {
            return;
        }
        let container = ItemRefContainer::ValueList(oid.clone());
        self.remove_item_refs(&container, &list.refs.item_ref_order);
    }

    // ========================================================================
    // Code lists and ARM
    // ========================================================================

    pub(super) fn remove_code_lists<'o>(&mut self, oids: impl IntoIterator<Item = &'o CodeListOid>) {
        let mdv = self.mdv;
        for oid in oids {
            if mdv.code_lists.contains_key(oid) {
                self.closure.code_list_oids.insert(oid.clone());
            }
        }
    }

    pub(super) fn remove_result_displays<'o>(
        &mut self,
        oids: impl IntoIterator<Item = &'o ResultDisplayOid>,
    ) {
        let mdv = self.mdv;
        let Some(arm) = mdv.analysis_result_displays.as_deref() else {
            return;
        };
        for oid in oids {
            if arm.result_displays.contains_key(oid) {
                self.closure.result_display_oids.insert(oid.clone());
            }
        }
        let mut results = Vec::new();
        for oid in &self.closure.result_display_oids {
            let Some(display) = arm.result_displays.get(oid) else {
                continue;
            };
            for result_oid in &display.analysis_result_order {
                let orphaned = arm.analysis_results.get(result_oid).is_some_and(|result| {
                    result
                        .sources
                        .result_displays
                        .iter()
                        .all(|owner| self.closure.result_display_oids.contains(owner))
                });
                if orphaned {
                    results.push(result_oid.clone());
                }
            }
        }
        self.remove_analysis_results(&results);
    }

    pub(super) fn remove_analysis_results<'o>(
        &mut self,
        oids: impl IntoIterator<Item = &'o AnalysisResultOid>,
    ) {
        let mdv = self.mdv;
        let Some(arm) = mdv.analysis_result_displays.as_deref() else {
            return;
        };
        for oid in oids {
            if arm.analysis_results.contains_key(oid) {
                self.closure.analysis_result_oids.insert(oid.clone());
            }
        }
    }

    pub(super) fn remove_analysis_datasets<'o>(
        &mut self,
        analysis_result_oid: &AnalysisResultOid,
        item_group_oids: impl IntoIterator<Item = &'o ItemGroupOid>,
    ) {
        let mdv = self.mdv;
        let Some(result) = mdv
            .analysis_result_displays
            .as_deref()
            .and_then(|arm| arm.analysis_results.get(analysis_result_oid))
        else {
            return;
        };
        for item_group_oid in item_group_oids {
            if let Some(dataset) = result.analysis_datasets.get(item_group_oid) {
                self.closure.analysis_datasets.insert(RemovedAnalysisDataset {
                    analysis_result_oid: analysis_result_oid.clone(),
                    item_group_oid: item_group_oid.clone(),
                    where_clause_oid: dataset.where_clause_oid.clone(),
                });
            }
        }
    }

    pub(super) fn disable_arm(&mut self) {
        let mdv = self.mdv;
        let Some(arm) = mdv.analysis_result_displays.as_deref() else {
            return;
        };
        self.closure.disable_arm = true;
        self.closure
            .result_display_oids
            .extend(arm.result_displays.keys().cloned());
        self.closure
            .analysis_result_oids
            .extend(arm.analysis_results.keys().cloned());
    }

    // ========================================================================
    // Shared entities
    // ========================================================================

    /// Resolve the shared entities left without owners and return the closure.
    pub(super) fn finish(mut self) -> DeletionClosure {
        self.release_code_lists();
        self.release_methods();
        self.release_where_clauses();
        self.release_comments();
        self.closure
    }

    fn release_code_lists(&mut self) {
        let mdv = self.mdv;
        let candidates: BTreeSet<CodeListOid> = self
            .closure
            .item_def_oids
            .iter()
            .filter_map(|oid| mdv.item_defs.get(oid))
            .filter_map(|item_def| item_def.code_list_oid.clone())
            .collect();
        for oid in candidates {
            let orphaned = mdv.code_lists.get(&oid).is_some_and(|code_list| {
                code_list
                    .sources
                    .item_defs
                    .iter()
                    .all(|item_oid| self.closure.item_def_oids.contains(item_oid))
            });
            if orphaned {
                self.closure.code_list_oids.insert(oid);
            }
        }
    }

    fn release_methods(&mut self) {
        let mdv = self.mdv;
        let candidates: BTreeSet<_> = self
            .closure
            .item_refs
            .iter()
            .filter_map(|removed| removed.method_oid.clone())
            .collect();
        for oid in candidates {
            let orphaned = mdv.methods.get(&oid).is_some_and(|method| {
                method
                    .sources
                    .owners()
                    .iter()
                    .all(|owner: &MethodOwner| self.closure.removes_method_owner(owner))
            });
            if orphaned {
                self.closure.method_oids.insert(oid);
            }
        }
    }

    fn release_where_clauses(&mut self) {
        let mdv = self.mdv;
        let mut candidates: BTreeSet<WhereClauseOid> = self
            .closure
            .item_refs
            .iter()
            .filter_map(|removed| removed.where_clause_oid.clone())
            .collect();
        candidates.extend(
            self.closure
                .analysis_datasets
                .iter()
                .filter_map(|removed| removed.where_clause_oid.clone()),
        );
        if let Some(arm) = mdv.analysis_result_displays.as_deref() {
            let related = arm_analysis_result_oids(arm, &self.closure.analysis_result_oids);
            candidates.extend(related.where_clause_oids);
        }
        for oid in candidates {
            let Some(where_clause) = mdv.where_clauses.get(&oid) else {
                continue;
            };
            let value_lists = where_clause.sources.value_lists.iter().all(|(list, refs)| {
                let container = ItemRefContainer::ValueList(list.clone());
                refs.iter()
                    .all(|item_ref_oid| self.closure.removes_item_ref(&container, item_ref_oid))
            });
            let analysis_results = where_clause
                .sources
                .analysis_results
                .iter()
                .all(|(result, groups)| {
                    groups
                        .iter()
                        .all(|group| self.closure.removes_analysis_dataset(result, group))
                });
            if value_lists && analysis_results {
                self.closure.where_clause_oids.insert(oid);
            }
        }
    }

    fn release_comments(&mut self) {
        let mdv = self.mdv;
        let mut candidates: BTreeSet<CommentOid> = BTreeSet::new();
        for oid in &self.closure.item_group_oids {
            candidates.extend(mdv.item_groups.get(oid).and_then(|group| group.comment_oid.clone()));
        }
        for oid in &self.closure.item_def_oids {
            candidates.extend(mdv.item_defs.get(oid).and_then(|item| item.comment_oid.clone()));
        }
        for oid in &self.closure.code_list_oids {
            candidates.extend(mdv.code_lists.get(oid).and_then(|list| list.comment_oid.clone()));
        }
        for oid in &self.closure.where_clause_oids {
            candidates.extend(
                mdv.where_clauses
                    .get(oid)
                    .and_then(|clause| clause.comment_oid.clone()),
            );
        }
        if let Some(arm) = mdv.analysis_result_displays.as_deref() {
            let related = arm_analysis_result_oids(arm, &self.closure.analysis_result_oids);
            candidates.extend(related.comment_oids);
        }
        for oid in candidates {
            let orphaned = mdv.comments.get(&oid).is_some_and(|comment| {
                comment
                    .sources
                    .owners()
                    .iter()
                    .all(|owner| self.closure.removes_comment_owner(owner))
            });
            if orphaned {
                self.closure.comment_oids.insert(oid);
            }
        }
    }
}
