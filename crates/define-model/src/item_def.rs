//! Variables and value-level items (`ItemDef`).

use serde::{Deserialize, Serialize};

use crate::impl_describable;
use crate::oid::{CodeListOid, CommentOid, ItemDefOid, ItemGroupOid, ValueListOid};
use crate::order;
use crate::patch::{apply, double_option};
use crate::text::{DocumentRef, TranslatedText, normalize_descriptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataType {
    #[default]
    Text,
    Integer,
    Float,
    Date,
    #[serde(rename = "datetime")]
    DateTime,
    Time,
    PartialDate,
    PartialTime,
    #[serde(rename = "partialDatetime")]
    PartialDateTime,
    #[serde(rename = "incompleteDatetime")]
    IncompleteDateTime,
    #[serde(rename = "durationDatetime")]
    DurationDateTime,
    #[serde(rename = "intervalDatetime")]
    IntervalDateTime,
}

impl DataType {
    /// Data types that carry a `Length` attribute.
    pub fn has_length(self) -> bool {
        matches!(self, Self::Text | Self::Integer | Self::Float)
    }
}

/// Origin of a variable's values (CRF, Derived, Assigned, Predecessor, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    pub origin_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub descriptions: Vec<TranslatedText>,
    #[serde(default)]
    pub documents: Vec<DocumentRef>,
}

impl_describable!(Origin);

impl Origin {
    pub fn new(origin_type: impl Into<String>) -> Self {
        Self {
            origin_type: origin_type.into(),
            source: None,
            descriptions: Vec::new(),
            documents: Vec::new(),
        }
    }

    fn normalized(mut self) -> Self {
        self.origin_type = self.origin_type.trim().to_string();
        self.descriptions = normalize_descriptions(self.descriptions);
        self
    }
}

/// Owners of item refs that point at an item def.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemDefSources {
    pub item_groups: Vec<ItemGroupOid>,
    pub value_lists: Vec<ValueListOid>,
}

impl ItemDefSources {
    pub fn is_empty(&self) -> bool {
        self.item_groups.is_empty() && self.value_lists.is_empty()
    }

    pub fn count(&self) -> usize {
        self.item_groups.len() + self.value_lists.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDef {
    pub oid: ItemDefOid,
    pub name: String,
    #[serde(default)]
    pub data_type: DataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fraction_digits: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    /// Length is derived from the data rather than specified.
    #[serde(default)]
    pub length_as_data: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_list_oid: Option<CodeListOid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_list_oid: Option<ValueListOid>,
    /// Set on value-level items: the variable this item describes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_item_def_oid: Option<ItemDefOid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_oid: Option<CommentOid>,
    #[serde(default)]
    pub descriptions: Vec<TranslatedText>,
    #[serde(default)]
    pub origins: Vec<Origin>,
    #[serde(default)]
    pub sources: ItemDefSources,
}

impl_describable!(ItemDef);

impl ItemDef {
    pub fn new(oid: ItemDefOid, name: impl Into<String>) -> Self {
        Self {
            oid,
            name: name.into().trim().to_string(),
            data_type: DataType::default(),
            length: None,
            fraction_digits: None,
            display_format: None,
            field_name: None,
            length_as_data: false,
            code_list_oid: None,
            value_list_oid: None,
            parent_item_def_oid: None,
            comment_oid: None,
            descriptions: Vec::new(),
            origins: Vec::new(),
            sources: ItemDefSources::default(),
        }
    }

    #[must_use]
    pub fn with_data_type(mut self, data_type: DataType, length: Option<u32>) -> Self {
        self.data_type = data_type;
        self.length = length;
        self
    }

    #[must_use]
    pub fn with_code_list(mut self, code_list_oid: CodeListOid) -> Self {
        self.code_list_oid = Some(code_list_oid);
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.descriptions.push(TranslatedText::new(description));
        self
    }

    #[must_use]
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origins.push(origin);
        self
    }

    pub fn is_value_level(&self) -> bool {
        self.parent_item_def_oid.is_some()
    }

    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.descriptions = normalize_descriptions(self.descriptions);
        self.origins = self.origins.into_iter().map(Origin::normalized).collect();
        if !self.data_type.has_length() || self.length_as_data {
            self.length = None;
        }
        if self.data_type != DataType::Float {
            self.fraction_digits = None;
        }
        let mut item_groups = Vec::new();
        for oid in std::mem::take(&mut self.sources.item_groups) {
            order::push_unique(&mut item_groups, oid);
        }
        self.sources.item_groups = item_groups;
        let mut value_lists = Vec::new();
        for oid in std::mem::take(&mut self.sources.value_lists) {
            order::push_unique(&mut value_lists, oid);
        }
        self.sources.value_lists = value_lists;
        self
    }

    /// A new instance carrying the patched attributes. Sources and
    /// structural links (value list, parent, comment) are kept.
    pub fn merged(&self, patch: &ItemDefPatch) -> Self {
        let mut next = self.clone();
        apply(&mut next.name, patch.name.as_ref());
        apply(&mut next.data_type, patch.data_type.as_ref());
        apply(&mut next.length, patch.length.as_ref());
        apply(&mut next.fraction_digits, patch.fraction_digits.as_ref());
        apply(&mut next.display_format, patch.display_format.as_ref());
        apply(&mut next.field_name, patch.field_name.as_ref());
        apply(&mut next.length_as_data, patch.length_as_data.as_ref());
        apply(&mut next.code_list_oid, patch.code_list_oid.as_ref());
        apply(&mut next.descriptions, patch.descriptions.as_ref());
        apply(&mut next.origins, patch.origins.as_ref());
        next.normalized()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemDefPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub length: Option<Option<u32>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub fraction_digits: Option<Option<u32>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub display_format: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub field_name: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length_as_data: Option<bool>,
    /// Relink (`Some(Some(..))`) or unlink (`Some(None)`) the code list.
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub code_list_oid: Option<Option<CodeListOid>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descriptions: Option<Vec<TranslatedText>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origins: Option<Vec<Origin>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_is_dropped_for_dates() {
        let item = ItemDef::new(ItemDefOid::from("IT.AESTDTC"), "AESTDTC")
            .with_data_type(DataType::Date, Some(10))
            .normalized();
        assert_eq!(item.length, None);
    }

    #[test]
    fn patch_switches_type() {
        let item = ItemDef::new(ItemDefOid::from("IT.AGE"), "AGE")
            .with_data_type(DataType::Text, Some(3))
            .normalized();
        let patch = ItemDefPatch {
            data_type: Some(DataType::Integer),
            length: Some(Some(8)),
            ..ItemDefPatch::default()
        };
        let next = item.merged(&patch);
        assert_eq!(next.data_type, DataType::Integer);
        assert_eq!(next.length, Some(8));
        assert_eq!(next.oid, item.oid);
    }

    #[test]
    fn data_type_serializes_like_define_xml() {
        let json = serde_json::to_string(&DataType::PartialDateTime).expect("serialize");
        assert_eq!(json, "\"partialDatetime\"");
        let json = serde_json::to_string(&DataType::PartialDate).expect("serialize");
        assert_eq!(json, "\"partialDate\"");
    }
}
