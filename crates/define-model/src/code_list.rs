//! Code lists and their coded values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::item_def::DataType;
use crate::oid::{CodeListItemOid, CodeListOid, CommentOid, ItemDefOid, StandardOid};
use crate::order;
use crate::patch::{apply, double_option};
use crate::text::{Alias, TranslatedText, normalize_descriptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeListType {
    Enumerated,
    #[default]
    Decoded,
    External,
}

/// Coded value with decodes (`CodeListItem`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeListItem {
    pub coded_value: String,
    #[serde(default)]
    pub decodes: Vec<TranslatedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<f64>,
    #[serde(default)]
    pub extended_value: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<Alias>,
}

impl CodeListItem {
    pub fn new(coded_value: impl Into<String>, decode: impl Into<String>) -> Self {
        Self {
            coded_value: coded_value.into(),
            decodes: vec![TranslatedText::new(decode)],
            rank: None,
            extended_value: false,
            alias: None,
        }
    }

    fn normalized(mut self) -> Self {
        self.coded_value = self.coded_value.trim().to_string();
        self.decodes = normalize_descriptions(self.decodes);
        self
    }

    pub fn merged(&self, patch: &CodedValuePatch) -> Self {
        let mut next = self.clone();
        apply(&mut next.coded_value, patch.coded_value.as_ref());
        apply(&mut next.decodes, patch.decodes.as_ref());
        apply(&mut next.rank, patch.rank.as_ref());
        apply(&mut next.extended_value, patch.extended_value.as_ref());
        apply(&mut next.alias, patch.alias.as_ref());
        next.normalized()
    }
}

/// Coded value without decodes (`EnumeratedItem`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumeratedItem {
    pub coded_value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<f64>,
    #[serde(default)]
    pub extended_value: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<Alias>,
}

impl From<CodeListItem> for EnumeratedItem {
    fn from(item: CodeListItem) -> Self {
        Self {
            coded_value: item.coded_value,
            rank: item.rank,
            extended_value: item.extended_value,
            alias: item.alias,
        }
    }
}

impl From<EnumeratedItem> for CodeListItem {
    fn from(item: EnumeratedItem) -> Self {
        Self {
            coded_value: item.coded_value,
            decodes: Vec::new(),
            rank: item.rank,
            extended_value: item.extended_value,
            alias: item.alias,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalCodeList {
    pub dictionary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeListSources {
    pub item_defs: Vec<ItemDefOid>,
}

impl CodeListSources {
    pub fn is_empty(&self) -> bool {
        self.item_defs.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeList {
    pub oid: CodeListOid,
    pub name: String,
    #[serde(default)]
    pub data_type: DataType,
    #[serde(default)]
    pub code_list_type: CodeListType,
    #[serde(default)]
    pub code_list_items: BTreeMap<CodeListItemOid, CodeListItem>,
    #[serde(default)]
    pub enumerated_items: BTreeMap<CodeListItemOid, EnumeratedItem>,
    #[serde(default)]
    pub item_order: Vec<CodeListItemOid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_code_list: Option<ExternalCodeList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<Alias>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_oid: Option<StandardOid>,
    /// Decoded/enumerated partner kept in sync by the editor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_code_list_oid: Option<CodeListOid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_oid: Option<CommentOid>,
    #[serde(default)]
    pub sources: CodeListSources,
}

impl CodeList {
    pub fn new(oid: CodeListOid, name: impl Into<String>, code_list_type: CodeListType) -> Self {
        Self {
            oid,
            name: name.into().trim().to_string(),
            data_type: DataType::Text,
            code_list_type,
            code_list_items: BTreeMap::new(),
            enumerated_items: BTreeMap::new(),
            item_order: Vec::new(),
            external_code_list: None,
            alias: None,
            standard_oid: None,
            linked_code_list_oid: None,
            comment_oid: None,
            sources: CodeListSources::default(),
        }
    }

    /// Number of coded values.
    pub fn len(&self) -> usize {
        self.item_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.item_order.is_empty()
    }

    pub fn contains_item(&self, oid: &CodeListItemOid) -> bool {
        self.code_list_items.contains_key(oid) || self.enumerated_items.contains_key(oid)
    }

    /// Coded values in display order.
    pub fn coded_values(&self) -> Vec<&str> {
        self.item_order
            .iter()
            .filter_map(|oid| match self.code_list_type {
                CodeListType::Decoded => self
                    .code_list_items
                    .get(oid)
                    .map(|item| item.coded_value.as_str()),
                CodeListType::Enumerated => self
                    .enumerated_items
                    .get(oid)
                    .map(|item| item.coded_value.as_str()),
                CodeListType::External => None,
            })
            .collect()
    }

    /// Insert a coded value in the representation matching the list type.
    pub fn insert_item(
        &mut self,
        oid: CodeListItemOid,
        item: CodeListItem,
        position: Option<usize>,
    ) -> crate::error::Result<()> {
        if self.contains_item(&oid) {
            return Err(crate::error::ModelError::DuplicateOid {
                collection: "coded values",
                oid: oid.to_string(),
            });
        }
        order::insert_at("coded values", &mut self.item_order, position, oid.clone())?;
        let item = item.normalized();
        match self.code_list_type {
            CodeListType::Enumerated => {
                self.enumerated_items.insert(oid, item.into());
            }
            _ => {
                self.code_list_items.insert(oid, item);
            }
        }
        Ok(())
    }

    pub fn remove_item(&mut self, oid: &CodeListItemOid) -> bool {
        let removed =
            self.code_list_items.remove(oid).is_some() | self.enumerated_items.remove(oid).is_some();
        order::remove_value(&mut self.item_order, oid);
        removed
    }

    /// Apply a patch to one coded value, whichever representation holds it.
    pub fn update_item(&mut self, oid: &CodeListItemOid, patch: &CodedValuePatch) -> bool {
        if let Some(item) = self.code_list_items.get_mut(oid) {
            *item = item.merged(patch);
            return true;
        }
        if let Some(item) = self.enumerated_items.get_mut(oid) {
            let merged = CodeListItem::from(item.clone()).merged(patch);
            *item = merged.into();
            return true;
        }
        false
    }

    /// Rebuild the item maps so that they match `code_list_type`.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        match self.code_list_type {
            CodeListType::Decoded => {
                for (oid, item) in std::mem::take(&mut self.enumerated_items) {
                    self.code_list_items.entry(oid).or_insert_with(|| item.into());
                }
                self.code_list_items = std::mem::take(&mut self.code_list_items)
                    .into_iter()
                    .map(|(oid, item)| (oid, item.normalized()))
                    .collect();
                self.external_code_list = None;
            }
            CodeListType::Enumerated => {
                for (oid, item) in std::mem::take(&mut self.code_list_items) {
                    self.enumerated_items.entry(oid).or_insert_with(|| item.into());
                }
                self.external_code_list = None;
            }
            CodeListType::External => {
                self.code_list_items.clear();
                self.enumerated_items.clear();
                self.linked_code_list_oid = None;
            }
        }
        let code_list_items = &self.code_list_items;
        let enumerated_items = &self.enumerated_items;
        let mut seen = std::collections::BTreeSet::new();
        self.item_order.retain(|oid| {
            (code_list_items.contains_key(oid) || enumerated_items.contains_key(oid))
                && seen.insert(oid.clone())
        });
        let missing: Vec<CodeListItemOid> = code_list_items
            .keys()
            .chain(enumerated_items.keys())
            .filter(|oid| !seen.contains(*oid))
            .cloned()
            .collect();
        self.item_order.extend(missing);
        let mut item_defs = Vec::new();
        for oid in std::mem::take(&mut self.sources.item_defs) {
            order::push_unique(&mut item_defs, oid);
        }
        self.sources.item_defs = item_defs;
        self
    }

    /// A new instance carrying the patched attributes; a type switch converts
    /// the coded values. The OID is resolved by the caller.
    pub fn merged(&self, patch: &CodeListPatch) -> Self {
        let mut next = self.clone();
        apply(&mut next.name, patch.name.as_ref());
        apply(&mut next.data_type, patch.data_type.as_ref());
        apply(&mut next.code_list_type, patch.code_list_type.as_ref());
        apply(&mut next.external_code_list, patch.external_code_list.as_ref());
        apply(&mut next.alias, patch.alias.as_ref());
        apply(&mut next.standard_oid, patch.standard_oid.as_ref());
        next.normalized()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeListPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_list_type: Option<CodeListType>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub external_code_list: Option<Option<ExternalCodeList>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub alias: Option<Option<Alias>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub standard_oid: Option<Option<StandardOid>>,
}

impl CodeListPatch {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodedValuePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coded_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decodes: Option<Vec<TranslatedText>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub rank: Option<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended_value: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub alias: Option<Option<Alias>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sex() -> CodeList {
        let mut list = CodeList::new(CodeListOid::from("CL.SEX"), "Sex", CodeListType::Decoded);
        list.insert_item(CodeListItemOid::from("CI.F"), CodeListItem::new("F", "Female"), None)
            .expect("F");
        list.insert_item(CodeListItemOid::from("CI.M"), CodeListItem::new("M", "Male"), None)
            .expect("M");
        list
    }

    #[test]
    fn type_switch_converts_items() {
        let list = sex();
        let patch = CodeListPatch {
            code_list_type: Some(CodeListType::Enumerated),
            ..CodeListPatch::default()
        };
        let enumerated = list.merged(&patch);
        assert!(enumerated.code_list_items.is_empty());
        assert_eq!(enumerated.enumerated_items.len(), 2);
        assert_eq!(enumerated.coded_values(), vec!["F", "M"]);
    }

    #[test]
    fn external_type_drops_items() {
        let patch = CodeListPatch {
            code_list_type: Some(CodeListType::External),
            external_code_list: Some(Some(ExternalCodeList {
                dictionary: "MedDRA".to_string(),
                version: Some("26.0".to_string()),
                reference: None,
                href: None,
            })),
            ..CodeListPatch::default()
        };
        let external = sex().merged(&patch);
        assert!(external.is_empty());
        assert!(external.external_code_list.is_some());
    }

    #[test]
    fn update_and_remove_items() {
        let mut list = sex();
        let patch = CodedValuePatch {
            coded_value: Some("U".to_string()),
            ..CodedValuePatch::default()
        };
        assert!(list.update_item(&CodeListItemOid::from("CI.M"), &patch));
        assert_eq!(list.coded_values(), vec!["F", "U"]);
        assert!(list.remove_item(&CodeListItemOid::from("CI.F")));
        assert_eq!(list.item_order, vec![CodeListItemOid::from("CI.M")]);
    }
}
