//! Datasets (`ItemGroupDef`).

use serde::{Deserialize, Serialize};

use crate::impl_describable;
use crate::item_ref::ItemRefSet;
use crate::leaf::Leaf;
use crate::oid::{CommentOid, ItemGroupOid, StandardOid};
use crate::patch::{apply, double_option};
use crate::text::{Alias, TranslatedText, normalize_descriptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Purpose {
    #[default]
    Tabulation,
    Analysis,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemGroup {
    pub oid: ItemGroupOid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default)]
    pub purpose: Purpose,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(default)]
    pub repeating: bool,
    #[serde(default)]
    pub is_reference_data: bool,
    #[serde(default)]
    pub is_non_standard: bool,
    #[serde(default)]
    pub has_no_data: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_oid: Option<StandardOid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_oid: Option<CommentOid>,
    #[serde(default)]
    pub descriptions: Vec<TranslatedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<Alias>,
    /// Dataset transport file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leaf: Option<Leaf>,
    #[serde(flatten)]
    pub refs: ItemRefSet,
}

impl_describable!(ItemGroup);

impl ItemGroup {
    /// A dataset with defaults applied and a generated transport file leaf.
    pub fn new(oid: ItemGroupOid, name: impl Into<String>) -> Self {
        let name = name.into().trim().to_string();
        let leaf = Some(Leaf::for_dataset(&name));
        Self {
            oid,
            dataset_name: Some(name.clone()),
            domain: None,
            name,
            purpose: Purpose::default(),
            structure: None,
            class: None,
            repeating: false,
            is_reference_data: false,
            is_non_standard: false,
            has_no_data: false,
            standard_oid: None,
            comment_oid: None,
            descriptions: Vec::new(),
            alias: None,
            leaf,
            refs: ItemRefSet::default(),
        }
    }

    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.descriptions.push(TranslatedText::new(description));
        self
    }

    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.descriptions = normalize_descriptions(self.descriptions);
        self.domain = trimmed(self.domain);
        self.dataset_name = trimmed(self.dataset_name);
        self.structure = trimmed(self.structure);
        self.class = trimmed(self.class);
        self.refs = self.refs.normalized();
        self
    }

    /// A new instance carrying the patched attributes.
    ///
    /// The OID is left alone; renames that move the OID are resolved by the
    /// caller, which knows the other datasets.
    pub fn merged(&self, patch: &ItemGroupPatch) -> Self {
        let mut next = self.clone();
        if let Some(name) = &patch.name {
            let old_name = next.name.clone();
            next.name = name.trim().to_string();
            if next
                .leaf
                .as_ref()
                .is_some_and(|leaf| leaf.is_dataset_leaf_for(&old_name))
            {
                next.leaf = Some(Leaf::for_dataset(&next.name));
            }
            if next.dataset_name.as_deref() == Some(old_name.as_str()) {
                next.dataset_name = Some(next.name.clone());
            }
        }
        apply(&mut next.dataset_name, patch.dataset_name.as_ref());
        apply(&mut next.domain, patch.domain.as_ref());
        apply(&mut next.purpose, patch.purpose.as_ref());
        apply(&mut next.structure, patch.structure.as_ref());
        apply(&mut next.class, patch.class.as_ref());
        apply(&mut next.repeating, patch.repeating.as_ref());
        apply(&mut next.is_reference_data, patch.is_reference_data.as_ref());
        apply(&mut next.is_non_standard, patch.is_non_standard.as_ref());
        apply(&mut next.has_no_data, patch.has_no_data.as_ref());
        apply(&mut next.standard_oid, patch.standard_oid.as_ref());
        apply(&mut next.descriptions, patch.descriptions.as_ref());
        apply(&mut next.alias, patch.alias.as_ref());
        apply(&mut next.leaf, patch.leaf.as_ref());
        next.normalized()
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Partial update of dataset-level attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemGroupPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub dataset_name: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub domain: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<Purpose>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub structure: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub class: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeating: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_reference_data: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_non_standard: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_no_data: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub standard_oid: Option<Option<StandardOid>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descriptions: Option<Vec<TranslatedText>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub alias: Option<Option<Alias>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub leaf: Option<Option<Leaf>>,
}

impl ItemGroupPatch {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}
