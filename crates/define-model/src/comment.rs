//! Shared comments and their owners.

use serde::{Deserialize, Serialize};

use crate::impl_describable;
use crate::oid::{
    AnalysisResultOid, CodeListOid, CommentOid, ItemDefOid, ItemGroupOid, MetaDataVersionOid,
    WhereClauseOid,
};
use crate::order;
use crate::patch::apply;
use crate::text::{DocumentRef, TranslatedText, normalize_descriptions};

/// An entity that can carry a `comment_oid`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "oid", rename_all = "snake_case")]
pub enum CommentOwner {
    ItemGroup(ItemGroupOid),
    ItemDef(ItemDefOid),
    CodeList(CodeListOid),
    WhereClause(WhereClauseOid),
    AnalysisResult(AnalysisResultOid),
    MetaDataVersion(MetaDataVersionOid),
}

/// Back-references from a comment to every owner pointing at it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentSources {
    pub item_groups: Vec<ItemGroupOid>,
    pub item_defs: Vec<ItemDefOid>,
    pub code_lists: Vec<CodeListOid>,
    pub where_clauses: Vec<WhereClauseOid>,
    pub analysis_results: Vec<AnalysisResultOid>,
    pub metadata_versions: Vec<MetaDataVersionOid>,
}

impl CommentSources {
    pub fn of(owner: CommentOwner) -> Self {
        let mut sources = Self::default();
        sources.add(owner);
        sources
    }

    pub fn is_empty(&self) -> bool {
        self.item_groups.is_empty()
            && self.item_defs.is_empty()
            && self.code_lists.is_empty()
            && self.where_clauses.is_empty()
            && self.analysis_results.is_empty()
            && self.metadata_versions.is_empty()
    }

    pub fn contains(&self, owner: &CommentOwner) -> bool {
        match owner {
            CommentOwner::ItemGroup(oid) => self.item_groups.contains(oid),
            CommentOwner::ItemDef(oid) => self.item_defs.contains(oid),
            CommentOwner::CodeList(oid) => self.code_lists.contains(oid),
            CommentOwner::WhereClause(oid) => self.where_clauses.contains(oid),
            CommentOwner::AnalysisResult(oid) => self.analysis_results.contains(oid),
            CommentOwner::MetaDataVersion(oid) => self.metadata_versions.contains(oid),
        }
    }

    pub fn add(&mut self, owner: CommentOwner) -> bool {
        match owner {
            CommentOwner::ItemGroup(oid) => order::push_unique(&mut self.item_groups, oid),
            CommentOwner::ItemDef(oid) => order::push_unique(&mut self.item_defs, oid),
            CommentOwner::CodeList(oid) => order::push_unique(&mut self.code_lists, oid),
            CommentOwner::WhereClause(oid) => order::push_unique(&mut self.where_clauses, oid),
            CommentOwner::AnalysisResult(oid) => {
                order::push_unique(&mut self.analysis_results, oid)
            }
            CommentOwner::MetaDataVersion(oid) => {
                order::push_unique(&mut self.metadata_versions, oid)
            }
        }
    }

    pub fn remove(&mut self, owner: &CommentOwner) -> bool {
        match owner {
            CommentOwner::ItemGroup(oid) => order::remove_value(&mut self.item_groups, oid),
            CommentOwner::ItemDef(oid) => order::remove_value(&mut self.item_defs, oid),
            CommentOwner::CodeList(oid) => order::remove_value(&mut self.code_lists, oid),
            CommentOwner::WhereClause(oid) => order::remove_value(&mut self.where_clauses, oid),
            CommentOwner::AnalysisResult(oid) => {
                order::remove_value(&mut self.analysis_results, oid)
            }
            CommentOwner::MetaDataVersion(oid) => {
                order::remove_value(&mut self.metadata_versions, oid)
            }
        }
    }

    /// All owners, grouped by kind.
    pub fn owners(&self) -> Vec<CommentOwner> {
        let mut owners = Vec::new();
        owners.extend(self.item_groups.iter().cloned().map(CommentOwner::ItemGroup));
        owners.extend(self.item_defs.iter().cloned().map(CommentOwner::ItemDef));
        owners.extend(self.code_lists.iter().cloned().map(CommentOwner::CodeList));
        owners.extend(self.where_clauses.iter().cloned().map(CommentOwner::WhereClause));
        owners.extend(
            self.analysis_results
                .iter()
                .cloned()
                .map(CommentOwner::AnalysisResult),
        );
        owners.extend(
            self.metadata_versions
                .iter()
                .cloned()
                .map(CommentOwner::MetaDataVersion),
        );
        owners
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub oid: CommentOid,
    #[serde(default)]
    pub descriptions: Vec<TranslatedText>,
    #[serde(default)]
    pub documents: Vec<DocumentRef>,
    #[serde(default)]
    pub sources: CommentSources,
}

impl_describable!(Comment);

impl Comment {
    pub fn new(oid: CommentOid, text: impl Into<String>) -> Self {
        Self {
            oid,
            descriptions: vec![TranslatedText::new(text)],
            documents: Vec::new(),
            sources: CommentSources::default(),
        }
    }

    pub fn normalized(mut self) -> Self {
        self.descriptions = normalize_descriptions(self.descriptions);
        self
    }

    pub fn merged(&self, patch: &CommentPatch) -> Self {
        let mut next = self.clone();
        apply(&mut next.descriptions, patch.descriptions.as_ref());
        apply(&mut next.documents, patch.documents.as_ref());
        next.normalized()
    }

    /// Same text and documents, new back-references.
    #[must_use]
    pub fn with_sources(mut self, sources: CommentSources) -> Self {
        self.sources = sources;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descriptions: Option<Vec<TranslatedText>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents: Option<Vec<DocumentRef>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sources_track_owners() {
        let owner = CommentOwner::ItemGroup(ItemGroupOid::from("IG.AE"));
        let mut sources = CommentSources::of(owner.clone());
        assert!(sources.contains(&owner));
        assert!(!sources.add(owner.clone()));
        sources.add(CommentOwner::ItemDef(ItemDefOid::from("IT.AETERM")));
        assert_eq!(sources.owners().len(), 2);
        assert!(sources.remove(&owner));
        assert!(!sources.is_empty());
    }

    #[test]
    fn owner_serializes_with_kind_tag() {
        let owner = CommentOwner::CodeList(CodeListOid::from("CL.SEX"));
        let json = serde_json::to_string(&owner).expect("serialize");
        assert_eq!(json, r#"{"kind":"code_list","oid":"CL.SEX"}"#);
    }
}
