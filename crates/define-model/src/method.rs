//! Computational methods referenced by item refs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::impl_describable;
use crate::item_ref::ItemRefContainer;
use crate::oid::{ItemGroupOid, ItemRefOid, MethodOid, ValueListOid};
use crate::order;
use crate::patch::apply;
use crate::text::{DocumentRef, TranslatedText, normalize_descriptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MethodType {
    #[default]
    Computation,
    Imputation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormalExpression {
    pub context: String,
    pub value: String,
}

/// The item ref that uses a method.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodOwner {
    pub container: ItemRefContainer,
    pub item_ref_oid: ItemRefOid,
}

impl MethodOwner {
    pub fn new(container: ItemRefContainer, item_ref_oid: ItemRefOid) -> Self {
        Self {
            container,
            item_ref_oid,
        }
    }
}

/// Back-references from a method to the item refs using it, per container.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodSources {
    pub item_groups: BTreeMap<ItemGroupOid, Vec<ItemRefOid>>,
    pub value_lists: BTreeMap<ValueListOid, Vec<ItemRefOid>>,
}

impl MethodSources {
    pub fn of(owner: MethodOwner) -> Self {
        let mut sources = Self::default();
        sources.add(owner);
        sources
    }

    pub fn is_empty(&self) -> bool {
        self.item_groups.is_empty() && self.value_lists.is_empty()
    }

    pub fn contains(&self, owner: &MethodOwner) -> bool {
        match &owner.container {
            ItemRefContainer::ItemGroup(oid) => self
                .item_groups
                .get(oid)
                .is_some_and(|refs| refs.contains(&owner.item_ref_oid)),
            ItemRefContainer::ValueList(oid) => self
                .value_lists
                .get(oid)
                .is_some_and(|refs| refs.contains(&owner.item_ref_oid)),
        }
    }

    pub fn add(&mut self, owner: MethodOwner) -> bool {
        let refs = match owner.container {
            ItemRefContainer::ItemGroup(oid) => self.item_groups.entry(oid).or_default(),
            ItemRefContainer::ValueList(oid) => self.value_lists.entry(oid).or_default(),
        };
        order::push_unique(refs, owner.item_ref_oid)
    }

    pub fn remove(&mut self, owner: &MethodOwner) -> bool {
        match &owner.container {
            ItemRefContainer::ItemGroup(oid) => {
                remove_from(&mut self.item_groups, oid, &owner.item_ref_oid)
            }
            ItemRefContainer::ValueList(oid) => {
                remove_from(&mut self.value_lists, oid, &owner.item_ref_oid)
            }
        }
    }

    /// Drop every ref of a container.
    pub fn remove_container(&mut self, container: &ItemRefContainer) -> bool {
        match container {
            ItemRefContainer::ItemGroup(oid) => self.item_groups.remove(oid).is_some(),
            ItemRefContainer::ValueList(oid) => self.value_lists.remove(oid).is_some(),
        }
    }

    pub fn owners(&self) -> Vec<MethodOwner> {
        let groups = self.item_groups.iter().flat_map(|(group, refs)| {
            refs.iter().map(move |item_ref_oid| {
                MethodOwner::new(
                    ItemRefContainer::ItemGroup(group.clone()),
                    item_ref_oid.clone(),
                )
            })
        });
        let lists = self.value_lists.iter().flat_map(|(list, refs)| {
            refs.iter().map(move |item_ref_oid| {
                MethodOwner::new(
                    ItemRefContainer::ValueList(list.clone()),
                    item_ref_oid.clone(),
                )
            })
        });
        groups.chain(lists).collect()
    }
}

fn remove_from<K: Ord>(
    map: &mut BTreeMap<K, Vec<ItemRefOid>>,
    key: &K,
    item_ref_oid: &ItemRefOid,
) -> bool {
    let Some(refs) = map.get_mut(key) else {
        return false;
    };
    let removed = order::remove_value(refs, item_ref_oid);
    if refs.is_empty() {
        map.remove(key);
    }
    removed
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Method {
    pub oid: MethodOid,
    pub name: String,
    #[serde(default)]
    pub method_type: MethodType,
    #[serde(default)]
    pub descriptions: Vec<TranslatedText>,
    #[serde(default)]
    pub documents: Vec<DocumentRef>,
    #[serde(default)]
    pub formal_expressions: Vec<FormalExpression>,
    /// Name is generated from the first owner's variable name.
    #[serde(default)]
    pub auto_method_name: bool,
    #[serde(default)]
    pub sources: MethodSources,
}

impl_describable!(Method);

impl Method {
    pub fn new(oid: MethodOid, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            oid,
            name: name.into().trim().to_string(),
            method_type: MethodType::default(),
            descriptions: vec![TranslatedText::new(description)],
            documents: Vec::new(),
            formal_expressions: Vec::new(),
            auto_method_name: false,
            sources: MethodSources::default(),
        }
    }

    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.descriptions = normalize_descriptions(self.descriptions);
        self.formal_expressions
            .retain(|expression| !expression.value.trim().is_empty());
        self
    }

    pub fn merged(&self, patch: &MethodPatch) -> Self {
        let mut next = self.clone();
        apply(&mut next.name, patch.name.as_ref());
        apply(&mut next.method_type, patch.method_type.as_ref());
        apply(&mut next.descriptions, patch.descriptions.as_ref());
        apply(&mut next.documents, patch.documents.as_ref());
        apply(&mut next.formal_expressions, patch.formal_expressions.as_ref());
        apply(&mut next.auto_method_name, patch.auto_method_name.as_ref());
        next.normalized()
    }

    #[must_use]
    pub fn with_sources(mut self, sources: MethodSources) -> Self {
        self.sources = sources;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method_type: Option<MethodType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descriptions: Option<Vec<TranslatedText>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents: Option<Vec<DocumentRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formal_expressions: Option<Vec<FormalExpression>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_method_name: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removing_last_ref_drops_container_entry() {
        let owner = MethodOwner::new(
            ItemRefContainer::ItemGroup(ItemGroupOid::from("IG.ADSL")),
            ItemRefOid::from("IR.AGE"),
        );
        let mut sources = MethodSources::of(owner.clone());
        assert!(sources.contains(&owner));
        assert!(sources.remove(&owner));
        assert!(sources.is_empty());
        assert!(sources.item_groups.is_empty());
    }

    #[test]
    fn owners_lists_each_ref() {
        let mut sources = MethodSources::default();
        sources.add(MethodOwner::new(
            ItemRefContainer::ItemGroup(ItemGroupOid::from("IG.ADSL")),
            ItemRefOid::from("IR.AGE"),
        ));
        sources.add(MethodOwner::new(
            ItemRefContainer::ValueList(ValueListOid::from("VL.PARAM")),
            ItemRefOid::from("IR.VL1"),
        ));
        assert_eq!(sources.owners().len(), 2);
    }
}
