//! Per-dispatch context resolved once by the aggregator and handed to every
//! collection reducer.
//!
//! Resolution does the cross-table work a single reducer cannot: it checks
//! that references introduced by an action exist, and it decides whether a
//! rename moves an OID (and to which one).

use std::collections::BTreeMap;

use define_model::{
    AnalysisResultDisplays, CodeListOid, CodeListType, CommentOwner, DocumentRef, Documentation,
    ItemDef, ItemDefOid, ItemGroupOid, ItemRef, ItemRefContainer, ItemRefOid, MetaDataVersion,
    MethodOwner, Oid, ProgrammingCode, RangeCheck, is_name_derived, name_derived_oid,
};

use crate::action::Action;
use crate::error::{CoreError, Result};

/// An OID move caused by a rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename<O> {
    pub old: O,
    pub new: O,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReduceContext {
    pub item_group_rename: Option<Rename<ItemGroupOid>>,
    pub code_list_rename: Option<Rename<CodeListOid>>,
    /// The update names an entity that does not exist; the action is a no-op.
    pub target_missing: bool,
}

impl ReduceContext {
    /// Validate `action` against `mdv` and resolve its renames.
    pub fn resolve(mdv: &MetaDataVersion, action: &Action) -> Result<Self> {
        check_references(mdv, action)?;
        let mut context = Self::default();
        match action {
            Action::UpdateItemGroup { oid, patch } => {
                if let (Some(group), Some(name)) = (mdv.item_groups.get(oid), &patch.name) {
                    context.item_group_rename =
                        resolve_rename(&mdv.item_groups, oid, &group.name, name)?;
                }
            }
            Action::UpdateCodeList { oid, patch } => {
                if let (Some(code_list), Some(name)) = (mdv.code_lists.get(oid), &patch.name) {
                    context.code_list_rename =
                        resolve_rename(&mdv.code_lists, oid, &code_list.name, name)?;
                }
            }
            Action::UpdateItemDef { oid, .. } => {
                context.target_missing = !mdv.item_defs.contains_key(oid);
            }
            _ => {}
        }
        Ok(context)
    }

    pub fn item_group_oid<'a>(&'a self, oid: &'a ItemGroupOid) -> &'a ItemGroupOid {
        match &self.item_group_rename {
            Some(rename) if rename.old == *oid => &rename.new,
            _ => oid,
        }
    }

    pub fn code_list_oid<'a>(&'a self, oid: &'a CodeListOid) -> &'a CodeListOid {
        match &self.code_list_rename {
            Some(rename) if rename.old == *oid => &rename.new,
            _ => oid,
        }
    }
}

/// A name-derived OID follows the name; any other OID is kept.
fn resolve_rename<O: Oid, V>(
    table: &BTreeMap<O, V>,
    oid: &O,
    old_name: &str,
    new_name: &str,
) -> Result<Option<Rename<O>>> {
    let new_name = new_name.trim();
    if new_name.is_empty() {
        return Err(CoreError::invalid(format!("{} name cannot be empty", O::KIND)));
    }
    if new_name == old_name || !is_name_derived(oid, old_name) {
        return Ok(None);
    }
    let new: O = name_derived_oid(new_name);
    if new == *oid {
        return Ok(None);
    }
    if table.contains_key(&new) {
        return Err(CoreError::OidCollision {
            kind: O::KIND,
            oid: new.to_string(),
        });
    }
    Ok(Some(Rename {
        old: oid.clone(),
        new,
    }))
}

// ============================================================================
// Reference checks
// ============================================================================

fn require<O: Oid, V>(table: &BTreeMap<O, V>, oid: &O) -> Result<()> {
    if table.contains_key(oid) {
        Ok(())
    } else {
        Err(CoreError::missing(O::KIND, oid))
    }
}

fn require_opt<O: Oid, V>(table: &BTreeMap<O, V>, oid: Option<&O>) -> Result<()> {
    oid.map_or(Ok(()), |oid| require(table, oid))
}

fn fresh<O: Oid, V>(table: &BTreeMap<O, V>, oid: &O, collection: &'static str) -> Result<()> {
    if table.contains_key(oid) {
        Err(CoreError::DuplicateOid {
            collection,
            oid: oid.to_string(),
        })
    } else {
        Ok(())
    }
}

fn require_documents(mdv: &MetaDataVersion, documents: &[DocumentRef]) -> Result<()> {
    documents
        .iter()
        .try_for_each(|document| require(&mdv.leafs, &document.leaf_id))
}

fn require_result_documents(
    mdv: &MetaDataVersion,
    documentation: Option<&Documentation>,
    programming_code: Option<&ProgrammingCode>,
) -> Result<()> {
    if let Some(documentation) = documentation {
        require_documents(mdv, &documentation.documents)?;
    }
    if let Some(code) = programming_code {
        require_documents(mdv, &code.documents)?;
    }
    Ok(())
}

fn require_range_checks(mdv: &MetaDataVersion, range_checks: &[RangeCheck]) -> Result<()> {
    for check in range_checks {
        require(&mdv.item_defs, &check.item_oid)?;
        require_opt(&mdv.item_groups, check.item_group_oid.as_ref())?;
    }
    Ok(())
}

fn require_arm(mdv: &MetaDataVersion) -> Result<&AnalysisResultDisplays> {
    mdv.analysis_result_displays
        .as_deref()
        .ok_or_else(|| CoreError::invalid("analysis results metadata is not enabled"))
}

pub(crate) fn comment_owner_exists(mdv: &MetaDataVersion, owner: &CommentOwner) -> bool {
    match owner {
        CommentOwner::ItemGroup(oid) => mdv.item_groups.contains_key(oid),
        CommentOwner::ItemDef(oid) => mdv.item_defs.contains_key(oid),
        CommentOwner::CodeList(oid) => mdv.code_lists.contains_key(oid),
        CommentOwner::WhereClause(oid) => mdv.where_clauses.contains_key(oid),
        CommentOwner::AnalysisResult(oid) => mdv
            .analysis_result_displays
            .as_deref()
            .is_some_and(|arm| arm.analysis_results.contains_key(oid)),
        CommentOwner::MetaDataVersion(oid) => mdv.oid == *oid,
    }
}

fn item_ref_of<'a>(mdv: &'a MetaDataVersion, owner: &MethodOwner) -> Option<&'a ItemRef> {
    match &owner.container {
        ItemRefContainer::ItemGroup(oid) => mdv.item_groups.get(oid)?.refs.get(&owner.item_ref_oid),
        ItemRefContainer::ValueList(oid) => mdv.value_lists.get(oid)?.refs.get(&owner.item_ref_oid),
    }
}

/// Checks shared by ADD_VAR and ADD_VALLVL for the item def side.
fn check_new_item(mdv: &MetaDataVersion, item_ref: &ItemRef, item_def: Option<&ItemDef>) -> Result<()> {
    match item_def {
        Some(item_def) => {
            if item_def.oid != item_ref.item_oid {
                return Err(CoreError::invalid(format!(
                    "item ref '{}' points at '{}' but the new item def is '{}'",
                    item_ref.oid, item_ref.item_oid, item_def.oid
                )));
            }
            fresh(&mdv.item_defs, &item_def.oid, "item defs")?;
            if item_def.value_list_oid.is_some() {
                return Err(CoreError::invalid(
                    "a new item def cannot bring its own value list",
                ));
            }
            require_opt(&mdv.code_lists, item_def.code_list_oid.as_ref())?;
            require_opt(&mdv.comments, item_def.comment_oid.as_ref())?;
            for origin in &item_def.origins {
                require_documents(mdv, &origin.documents)?;
            }
        }
        None => require(&mdv.item_defs, &item_ref.item_oid)?,
    }
    require_opt(&mdv.methods, item_ref.method_oid.as_ref())
}

fn check_references(mdv: &MetaDataVersion, action: &Action) -> Result<()> {
    match action {
        Action::AddItemGroup { item_group, .. } => {
            fresh(&mdv.item_groups, &item_group.oid, "item groups")?;
            if !item_group.refs.is_empty() {
                return Err(CoreError::invalid(
                    "a new item group starts without variables; add them with ADD_VAR",
                ));
            }
            require_opt(&mdv.comments, item_group.comment_oid.as_ref())?;
            require_opt(&mdv.standards, item_group.standard_oid.as_ref())
        }
        Action::UpdateItemGroup { patch, .. } => {
            require_opt(&mdv.standards, patch.standard_oid.as_ref().and_then(Option::as_ref))
        }
        Action::AddVariable {
            item_group_oid,
            item_ref,
            item_def,
            ..
        } => {
            require(&mdv.item_groups, item_group_oid)?;
            if item_ref.where_clause_oid.is_some() {
                return Err(CoreError::invalid(
                    "dataset-level item refs cannot carry a where clause",
                ));
            }
            check_new_item(mdv, item_ref, item_def.as_ref())
        }
        Action::AddValueLevel {
            parent_item_oid,
            value_list_oid,
            item_ref,
            item_def,
            where_clause,
            ..
        } => {
            let Some(parent) = mdv.item_defs.get(parent_item_oid) else {
                return Err(CoreError::missing(ItemDefOid::KIND, parent_item_oid));
            };
            match &parent.value_list_oid {
                Some(current) if current != value_list_oid => {
                    return Err(CoreError::invalid(format!(
                        "'{parent_item_oid}' already uses value list '{current}'"
                    )));
                }
                Some(_) => require(&mdv.value_lists, value_list_oid)?,
                None => fresh(&mdv.value_lists, value_list_oid, "value lists")?,
            }
            check_new_item(mdv, item_ref, item_def.as_ref())?;
            match where_clause {
                Some(where_clause) => {
                    fresh(&mdv.where_clauses, &where_clause.oid, "where clauses")?;
                    require_opt(&mdv.comments, where_clause.comment_oid.as_ref())?;
                    require_range_checks(mdv, &where_clause.range_checks)
                }
                None => require_opt(&mdv.where_clauses, item_ref.where_clause_oid.as_ref()),
            }
        }
        Action::UpdateItemDef { patch, .. } => {
            require_opt(
                &mdv.code_lists,
                patch.code_list_oid.as_ref().and_then(Option::as_ref),
            )?;
            for origin in patch.origins.iter().flatten() {
                require_documents(mdv, &origin.documents)?;
            }
            Ok(())
        }
        Action::AddCodeList { code_list, .. } => {
            fresh(&mdv.code_lists, &code_list.oid, "code lists")?;
            if code_list.linked_code_list_oid.is_some() {
                return Err(CoreError::invalid(
                    "link code lists with UPD_LINKCODELISTS after adding them",
                ));
            }
            require_opt(&mdv.comments, code_list.comment_oid.as_ref())?;
            require_opt(&mdv.standards, code_list.standard_oid.as_ref())
        }
        Action::UpdateCodeList { patch, .. } => require_opt(
            &mdv.standards,
            patch.standard_oid.as_ref().and_then(Option::as_ref),
        ),
        Action::LinkCodeLists {
            code_list_oid,
            linked_code_list_oid,
        } => {
            require(&mdv.code_lists, code_list_oid)?;
            let Some(linked_oid) = linked_code_list_oid else {
                return Ok(());
            };
            require(&mdv.code_lists, linked_oid)?;
            let types = (
                mdv.code_lists[code_list_oid].code_list_type,
                mdv.code_lists[linked_oid].code_list_type,
            );
            match types {
                (CodeListType::Decoded, CodeListType::Enumerated)
                | (CodeListType::Enumerated, CodeListType::Decoded) => Ok(()),
                _ => Err(CoreError::invalid(
                    "only a decoded and an enumerated code list can be linked",
                )),
            }
        }
        Action::AddCodedValue { code_list_oid, .. } => {
            let Some(code_list) = mdv.code_lists.get(code_list_oid) else {
                return Err(CoreError::missing(CodeListOid::KIND, code_list_oid));
            };
            if code_list.code_list_type == CodeListType::External {
                return Err(CoreError::invalid(format!(
                    "'{code_list_oid}' references an external dictionary and has no coded values"
                )));
            }
            Ok(())
        }
        Action::UpdateWhereClause { range_checks, .. } => require_range_checks(mdv, range_checks),
        Action::AddComment { owner, comment } => {
            if !comment_owner_exists(mdv, owner) {
                return Err(CoreError::invalid(format!("comment owner {owner:?} does not exist")));
            }
            fresh(&mdv.comments, &comment.oid, "comments")?;
            require_documents(mdv, &comment.documents)
        }
        Action::LinkComment { owner, comment_oid } => {
            if !comment_owner_exists(mdv, owner) {
                return Err(CoreError::invalid(format!("comment owner {owner:?} does not exist")));
            }
            require(&mdv.comments, comment_oid)
        }
        Action::UpdateComment { patch, .. } => {
            require_documents(mdv, patch.documents.as_deref().unwrap_or_default())
        }
        Action::AddMethod { owner, method } => {
            if item_ref_of(mdv, owner).is_none() {
                return Err(CoreError::missing(ItemRefOid::KIND, &owner.item_ref_oid));
            }
            fresh(&mdv.methods, &method.oid, "methods")?;
            require_documents(mdv, &method.documents)
        }
        Action::LinkMethod { owner, method_oid } => {
            if item_ref_of(mdv, owner).is_none() {
                return Err(CoreError::missing(ItemRefOid::KIND, &owner.item_ref_oid));
            }
            require(&mdv.methods, method_oid)
        }
        Action::UpdateMethod { patch, .. } => {
            require_documents(mdv, patch.documents.as_deref().unwrap_or_default())
        }
        Action::AddLeaf { leaf, .. } => fresh(&mdv.leafs, &leaf.id, "leafs"),
        Action::AddStandard { standard, .. } => fresh(&mdv.standards, &standard.oid, "standards"),
        Action::EnableArm => {
            if mdv.model.supports_arm() {
                Ok(())
            } else {
                Err(CoreError::invalid(format!(
                    "analysis results metadata requires an ADaM define, not {}",
                    mdv.model
                )))
            }
        }
        Action::AddResultDisplay { result_display, .. } => {
            let arm = require_arm(mdv)?;
            fresh(&arm.result_displays, &result_display.oid, "result displays")?;
            require_documents(mdv, &result_display.documents)
        }
        Action::UpdateResultDisplay { patch, .. } => {
            require_arm(mdv)?;
            require_documents(mdv, patch.documents.as_deref().unwrap_or_default())
        }
        Action::AddAnalysisResult {
            result_display_oid,
            analysis_result,
            ..
        } => {
            let arm = require_arm(mdv)?;
            require(&arm.result_displays, result_display_oid)?;
            fresh(&arm.analysis_results, &analysis_result.oid, "analysis results")?;
            if !analysis_result.analysis_datasets.is_empty()
                || analysis_result.analysis_datasets_comment_oid.is_some()
            {
                return Err(CoreError::invalid(
                    "add analysis datasets and comments after creating the analysis result",
                ));
            }
            require_opt(&mdv.item_defs, analysis_result.parameter_oid.as_ref())?;
            require_result_documents(
                mdv,
                analysis_result.documentation.as_ref(),
                analysis_result.programming_code.as_ref(),
            )
        }
        Action::UpdateAnalysisResult { patch, .. } => {
            require_arm(mdv)?;
            require_opt(
                &mdv.item_defs,
                patch.parameter_oid.as_ref().and_then(Option::as_ref),
            )?;
            require_result_documents(
                mdv,
                patch.documentation.as_ref().and_then(Option::as_ref),
                patch.programming_code.as_ref().and_then(Option::as_ref),
            )
        }
        Action::UpdateAnalysisDataset {
            analysis_result_oid,
            dataset,
            where_clause,
        } => {
            let arm = require_arm(mdv)?;
            require(&arm.analysis_results, analysis_result_oid)?;
            require(&mdv.item_groups, &dataset.item_group_oid)?;
            for oid in &dataset.analysis_variable_oids {
                require(&mdv.item_defs, oid)?;
            }
            match where_clause {
                Some(where_clause) => {
                    if let Some(linked) = &dataset.where_clause_oid
                        && *linked != where_clause.oid
                    {
                        return Err(CoreError::invalid(format!(
                            "dataset links '{linked}' but carries where clause '{}'",
                            where_clause.oid
                        )));
                    }
                    require_range_checks(mdv, &where_clause.range_checks)
                }
                None => require_opt(&mdv.where_clauses, dataset.where_clause_oid.as_ref()),
            }
        }
        Action::UpdateModel { model } => {
            if mdv.arm_enabled() && !model.supports_arm() {
                return Err(CoreError::invalid(
                    "disable analysis results metadata before leaving ADaM",
                ));
            }
            Ok(())
        }
        _ => Ok(()),
    }
}
