//! Read-side helpers that resolve OIDs and orders into views for hosts.

use serde::Serialize;

use define_model::{
    CodeList, CodeListOid, ItemDef, ItemDefOid, ItemGroup, ItemGroupOid, ItemRef, ItemRefSet,
    Leaf, MetaDataVersion,
};

pub fn ordered_item_groups(mdv: &MetaDataVersion) -> impl Iterator<Item = &ItemGroup> {
    mdv.order
        .item_group_order
        .iter()
        .filter_map(|oid| mdv.item_groups.get(oid))
}

pub fn ordered_code_lists(mdv: &MetaDataVersion) -> impl Iterator<Item = &CodeList> {
    mdv.order
        .code_list_order
        .iter()
        .filter_map(|oid| mdv.code_lists.get(oid))
}

pub fn ordered_leafs(mdv: &MetaDataVersion) -> impl Iterator<Item = &Leaf> {
    mdv.order
        .leaf_order
        .iter()
        .filter_map(|oid| mdv.leafs.get(oid))
}

fn resolve<'a>(
    mdv: &'a MetaDataVersion,
    refs: impl Iterator<Item = &'a ItemRef>,
) -> Vec<(&'a ItemRef, &'a ItemDef)> {
    refs.filter_map(|item_ref| {
        mdv.item_defs
            .get(&item_ref.item_oid)
            .map(|item_def| (item_ref, item_def))
    })
    .collect()
}

fn key_refs(refs: &ItemRefSet) -> impl Iterator<Item = &ItemRef> {
    refs.key_order.iter().filter_map(|oid| refs.get(oid))
}

/// Variables of a dataset in display order. Empty for an unknown dataset.
pub fn variables_of<'a>(
    mdv: &'a MetaDataVersion,
    item_group_oid: &ItemGroupOid,
) -> Vec<(&'a ItemRef, &'a ItemDef)> {
    match mdv.item_groups.get(item_group_oid) {
        Some(group) => resolve(mdv, group.refs.ordered()),
        None => Vec::new(),
    }
}

/// Key variables of a dataset in key sequence order.
pub fn key_variables<'a>(
    mdv: &'a MetaDataVersion,
    item_group_oid: &ItemGroupOid,
) -> Vec<(&'a ItemRef, &'a ItemDef)> {
    match mdv.item_groups.get(item_group_oid) {
        Some(group) => resolve(mdv, key_refs(&group.refs)),
        None => Vec::new(),
    }
}

/// Value-level items under a variable, empty when it has no value list.
pub fn value_level_of<'a>(
    mdv: &'a MetaDataVersion,
    item_def_oid: &ItemDefOid,
) -> Vec<(&'a ItemRef, &'a ItemDef)> {
    let list = mdv
        .item_defs
        .get(item_def_oid)
        .and_then(|item_def| item_def.value_list_oid.as_ref())
        .and_then(|oid| mdv.value_lists.get(oid));
    match list {
        Some(list) => resolve(mdv, list.refs.ordered()),
        None => Vec::new(),
    }
}

/// Item defs using a code list.
pub fn code_list_usage<'a>(mdv: &'a MetaDataVersion, code_list_oid: &CodeListOid) -> Vec<&'a ItemDef> {
    let Some(list) = mdv.code_lists.get(code_list_oid) else {
        return Vec::new();
    };
    list.sources
        .item_defs
        .iter()
        .filter_map(|oid| mdv.item_defs.get(oid))
        .collect()
}

/// Table sizes of a metadata version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub item_groups: usize,
    pub item_defs: usize,
    pub value_lists: usize,
    pub where_clauses: usize,
    pub code_lists: usize,
    pub methods: usize,
    pub comments: usize,
    pub leafs: usize,
    pub standards: usize,
    pub result_displays: usize,
    pub analysis_results: usize,
}

pub fn document_summary(mdv: &MetaDataVersion) -> DocumentSummary {
    let arm = mdv.analysis_result_displays.as_deref();
    DocumentSummary {
        item_groups: mdv.item_groups.len(),
        item_defs: mdv.item_defs.len(),
        value_lists: mdv.value_lists.len(),
        where_clauses: mdv.where_clauses.len(),
        code_lists: mdv.code_lists.len(),
        methods: mdv.methods.len(),
        comments: mdv.comments.len(),
        leafs: mdv.leafs.len(),
        standards: mdv.standards.len(),
        result_displays: arm.map_or(0, |arm| arm.result_displays.len()),
        analysis_results: arm.map_or(0, |arm| arm.analysis_results.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use define_model::{ItemRefOid, MetaDataVersionOid, Model};

    #[test]
    fn key_variables_follow_key_order() {
        let mut mdv = MetaDataVersion::new(MetaDataVersionOid::from("MDV.1"), "Study", Model::Sdtm);
        let mut group = ItemGroup::new(ItemGroupOid::from("IG.DM"), "DM");
        for name in ["STUDYID", "USUBJID", "AGE"] {
            let item_def = ItemDef::new(ItemDefOid::new(format!("IT.DM.{name}")), name);
            group
                .refs
                .insert(
                    ItemRef::new(ItemRefOid::new(format!("IR.DM.{name}")), item_def.oid.clone()),
                    None,
                )
                .expect("insert");
            Arc::make_mut(&mut mdv.item_defs).insert(item_def.oid.clone(), item_def);
        }
        group
            .refs
            .set_key_order(vec![ItemRefOid::from("IR.DM.USUBJID"), ItemRefOid::from("IR.DM.STUDYID")])
            .expect("keys");
        Arc::make_mut(&mut mdv.item_groups).insert(group.oid.clone(), group);

        let oid = ItemGroupOid::from("IG.DM");
        let names: Vec<_> = key_variables(&mdv, &oid)
            .into_iter()
            .map(|(_, item_def)| item_def.name.as_str())
            .collect();
        assert_eq!(names, ["USUBJID", "STUDYID"]);
        assert_eq!(variables_of(&mdv, &oid).len(), 3);
        assert!(variables_of(&mdv, &ItemGroupOid::from("IG.XX")).is_empty());
    }
}
