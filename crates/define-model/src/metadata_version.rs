//! The `MetaDataVersion` aggregate: every entity table plus the order arrays
//! of the top-level collections.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::arm::AnalysisResultDisplays;
use crate::code_list::CodeList;
use crate::comment::Comment;
use crate::item_def::ItemDef;
use crate::item_group::ItemGroup;
use crate::leaf::Leaf;
use crate::method::Method;
use crate::oid::{
    CodeListOid, CommentOid, ItemDefOid, ItemGroupOid, LeafOid, MetaDataVersionOid, MethodOid,
    StandardOid, ValueListOid, WhereClauseOid,
};
use crate::patch::{apply, double_option};
use crate::standard::Standard;
use crate::value_list::ValueList;
use crate::where_clause::WhereClause;

/// A keyed entity table shared between snapshots until modified.
pub type Table<K, V> = Arc<BTreeMap<K, V>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Model {
    #[default]
    #[serde(rename = "SDTM")]
    Sdtm,
    #[serde(rename = "ADaM")]
    Adam,
    #[serde(rename = "SEND")]
    Send,
}

impl Model {
    /// ARM is only meaningful for analysis data.
    pub fn supports_arm(self) -> bool {
        self == Self::Adam
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sdtm => "SDTM",
            Self::Adam => "ADaM",
            Self::Send => "SEND",
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order arrays of the top-level collections.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MdvOrder {
    pub item_group_order: Vec<ItemGroupOid>,
    pub code_list_order: Vec<CodeListOid>,
    pub leaf_order: Vec<LeafOid>,
    pub standard_order: Vec<StandardOid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaDataVersion {
    pub oid: MetaDataVersionOid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_define_version")]
    pub define_version: String,
    #[serde(default)]
    pub model: Model,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_oid: Option<CommentOid>,
    #[serde(default)]
    pub standards: Table<StandardOid, Standard>,
    #[serde(default)]
    pub item_groups: Table<ItemGroupOid, ItemGroup>,
    #[serde(default)]
    pub item_defs: Table<ItemDefOid, ItemDef>,
    #[serde(default)]
    pub code_lists: Table<CodeListOid, CodeList>,
    #[serde(default)]
    pub methods: Table<MethodOid, Method>,
    #[serde(default)]
    pub comments: Table<CommentOid, Comment>,
    #[serde(default)]
    pub where_clauses: Table<WhereClauseOid, WhereClause>,
    #[serde(default)]
    pub value_lists: Table<ValueListOid, ValueList>,
    #[serde(default)]
    pub leafs: Table<LeafOid, Leaf>,
    /// `None` while ARM is disabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_result_displays: Option<Arc<AnalysisResultDisplays>>,
    #[serde(default)]
    pub order: MdvOrder,
}

fn default_define_version() -> String {
    "2.0.0".to_string()
}

impl MetaDataVersion {
    pub fn new(oid: MetaDataVersionOid, name: impl Into<String>, model: Model) -> Self {
        Self {
            oid,
            name: name.into().trim().to_string(),
            description: None,
            define_version: default_define_version(),
            model,
            comment_oid: None,
            standards: Table::default(),
            item_groups: Table::default(),
            item_defs: Table::default(),
            code_lists: Table::default(),
            methods: Table::default(),
            comments: Table::default(),
            where_clauses: Table::default(),
            value_lists: Table::default(),
            leafs: Table::default(),
            analysis_result_displays: None,
            order: MdvOrder::default(),
        }
    }

    pub fn arm_enabled(&self) -> bool {
        self.analysis_result_displays.is_some()
    }

    /// Repair derived data of freshly loaded input: entity normalization and
    /// order arrays (unknown entries dropped, missing keys appended).
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.item_groups = Arc::new(
            self.item_groups
                .values()
                .cloned()
                .map(|group| (group.oid.clone(), group.normalized()))
                .collect(),
        );
        self.item_defs = Arc::new(
            self.item_defs
                .values()
                .cloned()
                .map(|item| (item.oid.clone(), item.normalized()))
                .collect(),
        );
        self.code_lists = Arc::new(
            self.code_lists
                .values()
                .cloned()
                .map(|list| (list.oid.clone(), list.normalized()))
                .collect(),
        );
        self.value_lists = Arc::new(
            self.value_lists
                .values()
                .cloned()
                .map(|list| (list.oid.clone(), list.normalized()))
                .collect(),
        );
        if let Some(arm) = self.analysis_result_displays.take() {
            let mut arm = Arc::unwrap_or_clone(arm);
            arm.analysis_results = arm
                .analysis_results
                .into_values()
                .map(|result| (result.oid.clone(), result.normalized()))
                .collect();
            self.analysis_result_displays = Some(Arc::new(arm.normalized()));
        }
        reconcile_order(&mut self.order.item_group_order, &self.item_groups);
        reconcile_order(&mut self.order.code_list_order, &self.code_lists);
        reconcile_order(&mut self.order.leaf_order, &self.leafs);
        reconcile_order(&mut self.order.standard_order, &self.standards);
        self
    }

    pub fn merged(&self, patch: &MdvPatch) -> Self {
        let mut next = self.clone();
        apply(&mut next.name, patch.name.as_ref());
        apply(&mut next.description, patch.description.as_ref());
        apply(&mut next.define_version, patch.define_version.as_ref());
        next.name = next.name.trim().to_string();
        next
    }
}

/// Keep known keys in their current order and append the missing ones.
fn reconcile_order<K: Ord + Clone, V>(order: &mut Vec<K>, table: &BTreeMap<K, V>) {
    let mut seen = BTreeSet::new();
    order.retain(|oid| table.contains_key(oid) && seen.insert(oid.clone()));
    for oid in table.keys() {
        if !seen.contains(oid) {
            order.push(oid.clone());
        }
    }
}

/// Attribute update of the metadata version itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MdvPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub define_version: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_reconciles_order() {
        let mut mdv = MetaDataVersion::new(MetaDataVersionOid::from("MDV.1"), "Study", Model::Sdtm);
        let ae = ItemGroup::new(ItemGroupOid::from("IG.AE"), "AE");
        let dm = ItemGroup::new(ItemGroupOid::from("IG.DM"), "DM");
        Arc::make_mut(&mut mdv.item_groups).insert(ae.oid.clone(), ae);
        Arc::make_mut(&mut mdv.item_groups).insert(dm.oid.clone(), dm);
        mdv.order.item_group_order = vec![
            ItemGroupOid::from("IG.DM"),
            ItemGroupOid::from("IG.XX"),
            ItemGroupOid::from("IG.DM"),
        ];
        let mdv = mdv.normalized();
        assert_eq!(
            mdv.order.item_group_order,
            vec![ItemGroupOid::from("IG.DM"), ItemGroupOid::from("IG.AE")]
        );
    }

    #[test]
    fn model_uses_cdisc_spelling() {
        let json = serde_json::to_string(&Model::Adam).expect("serialize");
        assert_eq!(json, "\"ADaM\"");
        assert!(Model::Adam.supports_arm());
        assert!(!Model::Sdtm.supports_arm());
    }
}
