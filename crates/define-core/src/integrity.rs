//! Structural integrity checks over a metadata version.
//!
//! The reducers keep these invariants on every dispatch; the checker exists to
//! verify that claim on loaded documents, in tests, and optionally before the
//! store commits a new state.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use define_model::{
    CommentOid, CommentOwner, DocumentRef, ItemRefContainer, ItemRefSet, MetaDataVersion,
    MethodOid, MethodOwner,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    /// Order array and table disagree.
    Order,
    /// A back-reference is missing or points at a non-user.
    Sources,
    /// A pointer names an entity that does not exist.
    DanglingReference,
    /// A shared entity nobody uses.
    Orphan,
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Order => "order",
            Self::Sources => "sources",
            Self::DanglingReference => "dangling reference",
            Self::Orphan => "orphan",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrityIssue {
    pub category: IssueCategory,
    pub message: String,
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.category, self.message)
    }
}

/// Run every check and return the issues found, in a stable order.
pub fn check_integrity(mdv: &MetaDataVersion) -> Vec<IntegrityIssue> {
    let mut checker = Checker {
        mdv,
        issues: Vec::new(),
    };
    checker.orders();
    checker.item_defs();
    checker.value_lists();
    checker.code_lists();
    checker.comments();
    checker.methods();
    checker.where_clauses();
    checker.arm();
    checker.documents();
    checker.issues
}

struct Checker<'a> {
    mdv: &'a MetaDataVersion,
    issues: Vec<IntegrityIssue>,
}

impl Checker<'_> {
    fn push(&mut self, category: IssueCategory, message: String) {
        self.issues.push(IntegrityIssue { category, message });
    }

    fn dangling(&mut self, message: String) {
        self.push(IssueCategory::DanglingReference, message);
    }

    fn sources(&mut self, message: String) {
        self.push(IssueCategory::Sources, message);
    }

    // ========================================================================
    // Orders
    // ========================================================================

    fn order<K: Ord + fmt::Display>(&mut self, what: &str, order: &[K], keys: BTreeSet<&K>) {
        let mut seen = BTreeSet::new();
        for oid in order {
            if !seen.insert(oid) {
                self.push(IssueCategory::Order, format!("{what}: '{oid}' listed twice"));
            } else if !keys.contains(oid) {
                self.push(IssueCategory::Order, format!("{what}: '{oid}' is not in the table"));
            }
        }
        for oid in keys.difference(&seen) {
            self.push(IssueCategory::Order, format!("{what}: '{oid}' is missing from the order"));
        }
    }

    fn item_ref_set(&mut self, container: &ItemRefContainer, refs: &ItemRefSet) {
        let what = format!("item refs of {container}");
        self.order(&what, &refs.item_ref_order, refs.item_refs.keys().collect());
        let mut seen = BTreeSet::new();
        for (index, oid) in refs.key_order.iter().enumerate() {
            if !seen.insert(oid) || !refs.item_refs.contains_key(oid) {
                self.push(
                    IssueCategory::Order,
                    format!("key order of {container}: '{oid}' is not a distinct item ref"),
                );
                continue;
            }
            let expected = u32::try_from(index + 1).ok();
            if refs.item_refs[oid].key_sequence != expected {
                self.push(
                    IssueCategory::Order,
                    format!("key order of {container}: '{oid}' has a stale key sequence"),
                );
            }
        }
        for item_ref in refs.item_refs.values() {
            if item_ref.key_sequence.is_some() && !seen.contains(&item_ref.oid) {
                self.push(
                    IssueCategory::Order,
                    format!("{container}: '{}' has a key sequence but is not a key", item_ref.oid),
                );
            }
        }
        let mut items = BTreeSet::new();
        for item_ref in refs.item_refs.values() {
            if !items.insert(&item_ref.item_oid) {
                self.push(
                    IssueCategory::Order,
                    format!("{container}: item '{}' is referenced twice", item_ref.item_oid),
                );
            }
        }
    }

    fn orders(&mut self) {
        let mdv = self.mdv;
        self.order("item groups", &mdv.order.item_group_order, mdv.item_groups.keys().collect());
        self.order("code lists", &mdv.order.code_list_order, mdv.code_lists.keys().collect());
        self.order("leafs", &mdv.order.leaf_order, mdv.leafs.keys().collect());
        self.order("standards", &mdv.order.standard_order, mdv.standards.keys().collect());
        for group in mdv.item_groups.values() {
            self.item_ref_set(&ItemRefContainer::ItemGroup(group.oid.clone()), &group.refs);
        }
        for list in mdv.value_lists.values() {
            self.item_ref_set(&ItemRefContainer::ValueList(list.oid.clone()), &list.refs);
        }
        for list in mdv.code_lists.values() {
            let keys = list
                .code_list_items
                .keys()
                .chain(list.enumerated_items.keys())
                .collect();
            self.order(&format!("coded values of {}", list.oid), &list.item_order, keys);
        }
        if let Some(arm) = mdv.analysis_result_displays.as_deref() {
            self.order("result displays", &arm.result_display_order, arm.result_displays.keys().collect());
            for result in arm.analysis_results.values() {
                self.order(
                    &format!("datasets of {}", result.oid),
                    &result.analysis_dataset_order,
                    result.analysis_datasets.keys().collect(),
                );
            }
        }
    }

    // ========================================================================
    // Item defs and value lists
    // ========================================================================

    fn item_defs(&mut self) {
        let mdv = self.mdv;
        for group in mdv.item_groups.values() {
            if let Some(standard) = &group.standard_oid
                && !mdv.standards.contains_key(standard)
            {
                self.dangling(format!("{} uses missing standard '{standard}'", group.oid));
            }
            for item_ref in group.refs.item_refs.values() {
                match mdv.item_defs.get(&item_ref.item_oid) {
                    None => self.dangling(format!(
                        "{} references missing item '{}'",
                        group.oid, item_ref.item_oid
                    )),
                    Some(item_def) if !item_def.sources.item_groups.contains(&group.oid) => self
                        .sources(format!(
                            "{} does not list {} as a source",
                            item_def.oid, group.oid
                        )),
                    Some(_) => {}
                }
            }
        }
        for list in mdv.value_lists.values() {
            for item_ref in list.refs.item_refs.values() {
                match mdv.item_defs.get(&item_ref.item_oid) {
                    None => self.dangling(format!(
                        "{} references missing item '{}'",
                        list.oid, item_ref.item_oid
                    )),
                    Some(item_def) if !item_def.sources.value_lists.contains(&list.oid) => self
                        .sources(format!("{} does not list {} as a source", item_def.oid, list.oid)),
                    Some(_) => {}
                }
            }
        }
        for item_def in mdv.item_defs.values() {
            if item_def.sources.is_empty() {
                self.push(IssueCategory::Orphan, format!("{} is used by no container", item_def.oid));
            }
            for group in &item_def.sources.item_groups {
                let uses = mdv
                    .item_groups
                    .get(group)
                    .is_some_and(|group| group.refs.find_by_item(&item_def.oid).is_some());
                if !uses {
                    self.sources(format!("{} lists {group} but is not referenced there", item_def.oid));
                }
            }
            for list in &item_def.sources.value_lists {
                let uses = mdv
                    .value_lists
                    .get(list)
                    .is_some_and(|list| list.refs.find_by_item(&item_def.oid).is_some());
                if !uses {
                    self.sources(format!("{} lists {list} but is not referenced there", item_def.oid));
                }
            }
            if let Some(parent) = &item_def.parent_item_def_oid
                && !mdv.item_defs.contains_key(parent)
            {
                self.dangling(format!("{} has missing parent '{parent}'", item_def.oid));
            }
        }
    }

    fn value_lists(&mut self) {
        let mdv = self.mdv;
        for item_def in mdv.item_defs.values() {
            let Some(list_oid) = &item_def.value_list_oid else {
                continue;
            };
            match mdv.value_lists.get(list_oid) {
                None => self.dangling(format!("{} uses missing value list '{list_oid}'", item_def.oid)),
                Some(list) if !list.sources.item_defs.contains(&item_def.oid) => {
                    self.sources(format!("{list_oid} does not list {} as a source", item_def.oid));
                }
                Some(_) => {}
            }
        }
        for list in mdv.value_lists.values() {
            if list.sources.is_empty() {
                self.push(IssueCategory::Orphan, format!("{} has no parent item", list.oid));
            }
            for parent in &list.sources.item_defs {
                let uses = mdv
                    .item_defs
                    .get(parent)
                    .is_some_and(|item_def| item_def.value_list_oid.as_ref() == Some(&list.oid));
                if !uses {
                    self.sources(format!("{} lists {parent} but it does not use the list", list.oid));
                }
            }
        }
    }

    // ========================================================================
    // Shared entities
    // ========================================================================

    fn code_lists(&mut self) {
        let mdv = self.mdv;
        for item_def in mdv.item_defs.values() {
            let Some(code_list_oid) = &item_def.code_list_oid else {
                continue;
            };
            match mdv.code_lists.get(code_list_oid) {
                None => self.dangling(format!("{} uses missing code list '{code_list_oid}'", item_def.oid)),
                Some(list) if !list.sources.item_defs.contains(&item_def.oid) => {
                    self.sources(format!("{code_list_oid} does not list {} as a source", item_def.oid));
                }
                Some(_) => {}
            }
        }
        for list in mdv.code_lists.values() {
            for item_oid in &list.sources.item_defs {
                let uses = mdv
                    .item_defs
                    .get(item_oid)
                    .is_some_and(|item_def| item_def.code_list_oid.as_ref() == Some(&list.oid));
                if !uses {
                    self.sources(format!("{} lists {item_oid} but it does not use the list", list.oid));
                }
            }
            if let Some(linked) = &list.linked_code_list_oid {
                let symmetric = mdv
                    .code_lists
                    .get(linked)
                    .is_some_and(|partner| partner.linked_code_list_oid.as_ref() == Some(&list.oid));
                if !symmetric {
                    self.dangling(format!("{} is linked to '{linked}' but not the other way", list.oid));
                }
            }
            if let Some(standard) = &list.standard_oid
                && !mdv.standards.contains_key(standard)
            {
                self.dangling(format!("{} uses missing standard '{standard}'", list.oid));
            }
        }
    }

    fn comment_pointers(&self) -> BTreeMap<CommentOwner, CommentOid> {
        let mdv = self.mdv;
        let mut pointers = BTreeMap::new();
        let mut add = |owner: CommentOwner, comment: &Option<CommentOid>| {
            if let Some(comment) = comment {
                pointers.insert(owner, comment.clone());
            }
        };
        add(CommentOwner::MetaDataVersion(mdv.oid.clone()), &mdv.comment_oid);
        for group in mdv.item_groups.values() {
            add(CommentOwner::ItemGroup(group.oid.clone()), &group.comment_oid);
        }
        for item_def in mdv.item_defs.values() {
            add(CommentOwner::ItemDef(item_def.oid.clone()), &item_def.comment_oid);
        }
        for list in mdv.code_lists.values() {
            add(CommentOwner::CodeList(list.oid.clone()), &list.comment_oid);
        }
        for where_clause in mdv.where_clauses.values() {
            add(CommentOwner::WhereClause(where_clause.oid.clone()), &where_clause.comment_oid);
        }
        if let Some(arm) = mdv.analysis_result_displays.as_deref() {
            for result in arm.analysis_results.values() {
                add(
                    CommentOwner::AnalysisResult(result.oid.clone()),
                    &result.analysis_datasets_comment_oid,
                );
            }
        }
        pointers
    }

    fn comments(&mut self) {
        let mdv = self.mdv;
        let pointers = self.comment_pointers();
        for (owner, comment_oid) in &pointers {
            match mdv.comments.get(comment_oid) {
                None => self.dangling(format!("{owner:?} uses missing comment '{comment_oid}'")),
                Some(comment) if !comment.sources.contains(owner) => {
                    self.sources(format!("{comment_oid} does not list {owner:?}"));
                }
                Some(_) => {}
            }
        }
        for comment in mdv.comments.values() {
            if comment.sources.is_empty() {
                self.push(IssueCategory::Orphan, format!("{} has no owner", comment.oid));
            }
            for owner in comment.sources.owners() {
                if pointers.get(&owner) != Some(&comment.oid) {
                    self.sources(format!("{} lists {owner:?} but it does not use the comment", comment.oid));
                }
            }
        }
    }

    fn method_pointers(&self) -> BTreeMap<MethodOwner, MethodOid> {
        let mdv = self.mdv;
        let groups = mdv.item_groups.values().map(|group| {
            (ItemRefContainer::ItemGroup(group.oid.clone()), &group.refs)
        });
        let lists = mdv
            .value_lists
            .values()
            .map(|list| (ItemRefContainer::ValueList(list.oid.clone()), &list.refs));
        let mut pointers = BTreeMap::new();
        for (container, refs) in groups.chain(lists) {
            for item_ref in refs.item_refs.values() {
                if let Some(method) = &item_ref.method_oid {
                    pointers.insert(
                        MethodOwner::new(container.clone(), item_ref.oid.clone()),
                        method.clone(),
                    );
                }
            }
        }
        pointers
    }

    fn methods(&mut self) {
        let mdv = self.mdv;
        let pointers = self.method_pointers();
        for (owner, method_oid) in &pointers {
            match mdv.methods.get(method_oid) {
                None => self.dangling(format!(
                    "{} in {} uses missing method '{method_oid}'",
                    owner.item_ref_oid, owner.container
                )),
                Some(method) if !method.sources.contains(owner) => self.sources(format!(
                    "{method_oid} does not list {} in {}",
                    owner.item_ref_oid, owner.container
                )),
                Some(_) => {}
            }
        }
        for method in mdv.methods.values() {
            if method.sources.is_empty() {
                self.push(IssueCategory::Orphan, format!("{} is used by no item ref", method.oid));
            }
            for owner in method.sources.owners() {
                if pointers.get(&owner) != Some(&method.oid) {
                    self.sources(format!(
                        "{} lists {} in {} but it does not use the method",
                        method.oid, owner.item_ref_oid, owner.container
                    ));
                }
            }
        }
    }

    fn where_clauses(&mut self) {
        let mdv = self.mdv;
        for list in mdv.value_lists.values() {
            for item_ref in list.refs.item_refs.values() {
                let Some(oid) = &item_ref.where_clause_oid else {
                    continue;
                };
                let listed = mdv.where_clauses.get(oid).map(|where_clause| {
                    where_clause
                        .sources
                        .value_lists
                        .get(&list.oid)
                        .is_some_and(|refs| refs.contains(&item_ref.oid))
                });
                match listed {
                    None => self.dangling(format!("{} uses missing where clause '{oid}'", item_ref.oid)),
                    Some(false) => self.sources(format!("{oid} does not list {} in {}", item_ref.oid, list.oid)),
                    Some(true) => {}
                }
            }
        }
        let arm = mdv.analysis_result_displays.as_deref();
        for where_clause in mdv.where_clauses.values() {
            if where_clause.sources.is_empty() {
                self.push(IssueCategory::Orphan, format!("{} is used by nothing", where_clause.oid));
            }
            for (list_oid, refs) in &where_clause.sources.value_lists {
                for item_ref_oid in refs {
                    let uses = mdv
                        .value_lists
                        .get(list_oid)
                        .and_then(|list| list.refs.get(item_ref_oid))
                        .is_some_and(|item_ref| item_ref.where_clause_oid.as_ref() == Some(&where_clause.oid));
                    if !uses {
                        self.sources(format!(
                            "{} lists {item_ref_oid} in {list_oid} but it does not use the clause",
                            where_clause.oid
                        ));
                    }
                }
            }
            for (result_oid, groups) in &where_clause.sources.analysis_results {
                for group in groups {
                    let uses = arm
                        .and_then(|arm| arm.analysis_results.get(result_oid))
                        .and_then(|result| result.analysis_datasets.get(group))
                        .is_some_and(|dataset| dataset.where_clause_oid.as_ref() == Some(&where_clause.oid));
                    if !uses {
                        self.sources(format!(
                            "{} lists dataset {group} of {result_oid} but it does not use the clause",
                            where_clause.oid
                        ));
                    }
                }
            }
            for check in &where_clause.range_checks {
                if !mdv.item_defs.contains_key(&check.item_oid) {
                    self.dangling(format!("{} tests missing item '{}'", where_clause.oid, check.item_oid));
                }
                if let Some(group) = &check.item_group_oid
                    && !mdv.item_groups.contains_key(group)
                {
                    self.dangling(format!("{} tests missing dataset '{group}'", where_clause.oid));
                }
            }
        }
    }

    // ========================================================================
    // ARM
    // ========================================================================

    fn arm(&mut self) {
        let mdv = self.mdv;
        let Some(arm) = mdv.analysis_result_displays.as_deref() else {
            return;
        };
        for display in arm.result_displays.values() {
            for result_oid in &display.analysis_result_order {
                match arm.analysis_results.get(result_oid) {
                    None => self.dangling(format!("{} lists missing result '{result_oid}'", display.oid)),
                    Some(result) if !result.sources.result_displays.contains(&display.oid) => {
                        self.sources(format!("{result_oid} does not list {}", display.oid));
                    }
                    Some(_) => {}
                }
            }
        }
        for result in arm.analysis_results.values() {
            if result.sources.result_displays.is_empty() {
                self.push(IssueCategory::Orphan, format!("{} belongs to no display", result.oid));
            }
            for display_oid in &result.sources.result_displays {
                let lists = arm
                    .result_displays
                    .get(display_oid)
                    .is_some_and(|display| display.analysis_result_order.contains(&result.oid));
                if !lists {
                    self.sources(format!("{} lists {display_oid} but is not listed there", result.oid));
                }
            }
            if let Some(parameter) = &result.parameter_oid
                && !mdv.item_defs.contains_key(parameter)
            {
                self.dangling(format!("{} uses missing parameter '{parameter}'", result.oid));
            }
            for dataset in result.analysis_datasets.values() {
                if !mdv.item_groups.contains_key(&dataset.item_group_oid) {
                    self.dangling(format!(
                        "{} uses missing dataset '{}'",
                        result.oid, dataset.item_group_oid
                    ));
                }
                for variable in &dataset.analysis_variable_oids {
                    if !mdv.item_defs.contains_key(variable) {
                        self.dangling(format!("{} uses missing variable '{variable}'", result.oid));
                    }
                }
                if let Some(oid) = &dataset.where_clause_oid {
                    let listed = mdv.where_clauses.get(oid).map(|where_clause| {
                        where_clause
                            .sources
                            .analysis_results
                            .get(&result.oid)
                            .is_some_and(|groups| groups.contains(&dataset.item_group_oid))
                    });
                    match listed {
                        None => self.dangling(format!("{} uses missing where clause '{oid}'", result.oid)),
                        Some(false) => self.sources(format!(
                            "{oid} does not list dataset {} of {}",
                            dataset.item_group_oid, result.oid
                        )),
                        Some(true) => {}
                    }
                }
            }
        }
    }

    // ========================================================================
    // Documents
    // ========================================================================

    fn documents(&mut self) {
        let mdv = self.mdv;
        let mut refs: Vec<(String, &DocumentRef)> = Vec::new();
        for comment in mdv.comments.values() {
            refs.extend(comment.documents.iter().map(|doc| (comment.oid.to_string(), doc)));
        }
        for method in mdv.methods.values() {
            refs.extend(method.documents.iter().map(|doc| (method.oid.to_string(), doc)));
        }
        for item_def in mdv.item_defs.values() {
            for origin in &item_def.origins {
                refs.extend(origin.documents.iter().map(|doc| (item_def.oid.to_string(), doc)));
            }
        }
        if let Some(arm) = mdv.analysis_result_displays.as_deref() {
            for display in arm.result_displays.values() {
                refs.extend(display.documents.iter().map(|doc| (display.oid.to_string(), doc)));
            }
            for result in arm.analysis_results.values() {
                let documentation = result.documentation.iter().flat_map(|doc| &doc.documents);
                let code = result.programming_code.iter().flat_map(|code| &code.documents);
                refs.extend(documentation.chain(code).map(|doc| (result.oid.to_string(), doc)));
            }
        }
        for (owner, document) in refs {
            if !mdv.leafs.contains_key(&document.leaf_id) {
                self.dangling(format!("{owner} references missing leaf '{}'", document.leaf_id));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use define_model::{
        ItemDef, ItemDefOid, ItemGroup, ItemGroupOid, ItemRef, ItemRefOid, MetaDataVersionOid,
        Model,
    };

    #[test]
    fn empty_document_is_clean() {
        let mdv = MetaDataVersion::new(MetaDataVersionOid::from("MDV.1"), "Study", Model::Sdtm);
        assert!(check_integrity(&mdv).is_empty());
    }

    #[test]
    fn missing_back_reference_is_reported() {
        let mut mdv = MetaDataVersion::new(MetaDataVersionOid::from("MDV.1"), "Study", Model::Sdtm);
        let mut group = ItemGroup::new(ItemGroupOid::from("IG.DM"), "DM");
        group
            .refs
            .insert(
                ItemRef::new(ItemRefOid::from("IR.DM.AGE"), ItemDefOid::from("IT.DM.AGE")),
                None,
            )
            .expect("insert");
        let item_def = ItemDef::new(ItemDefOid::from("IT.DM.AGE"), "AGE");
        Arc::make_mut(&mut mdv.item_groups).insert(group.oid.clone(), group);
        Arc::make_mut(&mut mdv.item_defs).insert(item_def.oid.clone(), item_def);
        let mdv = mdv.normalized();

        let issues = check_integrity(&mdv);
        assert!(issues.iter().any(|issue| issue.category == IssueCategory::Sources));
        assert!(issues.iter().any(|issue| issue.category == IssueCategory::Orphan));
    }
}
