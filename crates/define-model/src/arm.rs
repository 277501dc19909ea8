//! Analysis Results Metadata (ARM).
//!
//! ARM is optional on a metadata version. When enabled it holds result
//! displays, each listing analysis results; an analysis result names the
//! datasets and variables it uses, optionally filtered by a where clause.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::impl_describable;
use crate::oid::{
    AnalysisResultOid, CommentOid, ItemDefOid, ItemGroupOid, ResultDisplayOid, WhereClauseOid,
};
use crate::order;
use crate::patch::{apply, double_option};
use crate::text::{DocumentRef, TranslatedText, normalize_descriptions};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Documentation {
    pub descriptions: Vec<TranslatedText>,
    pub documents: Vec<DocumentRef>,
}

impl_describable!(Documentation);

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgrammingCode {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub documents: Vec<DocumentRef>,
}

/// A dataset used by an analysis result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisDataset {
    pub item_group_oid: ItemGroupOid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub where_clause_oid: Option<WhereClauseOid>,
    #[serde(default)]
    pub analysis_variable_oids: Vec<ItemDefOid>,
}

impl AnalysisDataset {
    pub fn new(item_group_oid: ItemGroupOid) -> Self {
        Self {
            item_group_oid,
            where_clause_oid: None,
            analysis_variable_oids: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_variables(mut self, variables: Vec<ItemDefOid>) -> Self {
        self.analysis_variable_oids = variables;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisResultSources {
    pub result_displays: Vec<ResultDisplayOid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub oid: AnalysisResultOid,
    #[serde(default)]
    pub descriptions: Vec<TranslatedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_oid: Option<ItemDefOid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_purpose: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<Documentation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub programming_code: Option<ProgrammingCode>,
    #[serde(default)]
    pub analysis_datasets: BTreeMap<ItemGroupOid, AnalysisDataset>,
    #[serde(default)]
    pub analysis_dataset_order: Vec<ItemGroupOid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_datasets_comment_oid: Option<CommentOid>,
    #[serde(default)]
    pub sources: AnalysisResultSources,
}

impl_describable!(AnalysisResult);

impl AnalysisResult {
    pub fn new(oid: AnalysisResultOid, description: impl Into<String>) -> Self {
        Self {
            oid,
            descriptions: vec![TranslatedText::new(description)],
            parameter_oid: None,
            analysis_reason: None,
            analysis_purpose: None,
            documentation: None,
            programming_code: None,
            analysis_datasets: BTreeMap::new(),
            analysis_dataset_order: Vec::new(),
            analysis_datasets_comment_oid: None,
            sources: AnalysisResultSources::default(),
        }
    }

    pub fn normalized(mut self) -> Self {
        self.descriptions = normalize_descriptions(self.descriptions);
        let datasets = &self.analysis_datasets;
        let mut seen = BTreeSet::new();
        self.analysis_dataset_order
            .retain(|oid| datasets.contains_key(oid) && seen.insert(oid.clone()));
        for oid in self.analysis_datasets.keys() {
            if !seen.contains(oid) {
                self.analysis_dataset_order.push(oid.clone());
            }
        }
        self
    }

    pub fn merged(&self, patch: &AnalysisResultPatch) -> Self {
        let mut next = self.clone();
        apply(&mut next.descriptions, patch.descriptions.as_ref());
        apply(&mut next.parameter_oid, patch.parameter_oid.as_ref());
        apply(&mut next.analysis_reason, patch.analysis_reason.as_ref());
        apply(&mut next.analysis_purpose, patch.analysis_purpose.as_ref());
        apply(&mut next.documentation, patch.documentation.as_ref());
        apply(&mut next.programming_code, patch.programming_code.as_ref());
        next.normalized()
    }

    /// Insert or replace the dataset entry keyed by its item group.
    /// Returns the previous entry.
    pub fn upsert_dataset(&mut self, dataset: AnalysisDataset) -> Option<AnalysisDataset> {
        order::push_unique(
            &mut self.analysis_dataset_order,
            dataset.item_group_oid.clone(),
        );
        self.analysis_datasets
            .insert(dataset.item_group_oid.clone(), dataset)
    }

    pub fn remove_dataset(&mut self, item_group_oid: &ItemGroupOid) -> Option<AnalysisDataset> {
        order::remove_value(&mut self.analysis_dataset_order, item_group_oid);
        self.analysis_datasets.remove(item_group_oid)
    }

    pub fn rename_item_group(&mut self, old: &ItemGroupOid, new: &ItemGroupOid) -> bool {
        let Some(mut dataset) = self.analysis_datasets.remove(old) else {
            return false;
        };
        dataset.item_group_oid = new.clone();
        self.analysis_datasets.insert(new.clone(), dataset);
        order::rename_in(&mut self.analysis_dataset_order, old, new);
        true
    }

    /// Drop analysis variables and the parameter when they point at removed
    /// item defs.
    pub fn strip_item_defs(&mut self, removed: &BTreeSet<ItemDefOid>) -> bool {
        let mut changed = false;
        if self
            .parameter_oid
            .as_ref()
            .is_some_and(|oid| removed.contains(oid))
        {
            self.parameter_oid = None;
            changed = true;
        }
        for dataset in self.analysis_datasets.values_mut() {
            let before = dataset.analysis_variable_oids.len();
            dataset
                .analysis_variable_oids
                .retain(|oid| !removed.contains(oid));
            changed |= before != dataset.analysis_variable_oids.len();
        }
        changed
    }

    pub fn where_clause_oids(&self) -> impl Iterator<Item = &WhereClauseOid> {
        self.analysis_datasets
            .values()
            .filter_map(|dataset| dataset.where_clause_oid.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisResultPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descriptions: Option<Vec<TranslatedText>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub parameter_oid: Option<Option<ItemDefOid>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub analysis_reason: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub analysis_purpose: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub documentation: Option<Option<Documentation>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub programming_code: Option<Option<ProgrammingCode>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultDisplay {
    pub oid: ResultDisplayOid,
    pub name: String,
    #[serde(default)]
    pub descriptions: Vec<TranslatedText>,
    #[serde(default)]
    pub documents: Vec<DocumentRef>,
    #[serde(default)]
    pub analysis_result_order: Vec<AnalysisResultOid>,
}

impl_describable!(ResultDisplay);

impl ResultDisplay {
    pub fn new(oid: ResultDisplayOid, name: impl Into<String>) -> Self {
        Self {
            oid,
            name: name.into().trim().to_string(),
            descriptions: Vec::new(),
            documents: Vec::new(),
            analysis_result_order: Vec::new(),
        }
    }

    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.descriptions = normalize_descriptions(self.descriptions);
        self
    }

    pub fn merged(&self, patch: &ResultDisplayPatch) -> Self {
        let mut next = self.clone();
        apply(&mut next.name, patch.name.as_ref());
        apply(&mut next.descriptions, patch.descriptions.as_ref());
        apply(&mut next.documents, patch.documents.as_ref());
        next.normalized()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultDisplayPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descriptions: Option<Vec<TranslatedText>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents: Option<Vec<DocumentRef>>,
}

/// The ARM section of a metadata version.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisResultDisplays {
    pub result_displays: BTreeMap<ResultDisplayOid, ResultDisplay>,
    pub analysis_results: BTreeMap<AnalysisResultOid, AnalysisResult>,
    pub result_display_order: Vec<ResultDisplayOid>,
}

impl AnalysisResultDisplays {
    pub fn ordered_displays(&self) -> impl Iterator<Item = &ResultDisplay> {
        self.result_display_order
            .iter()
            .filter_map(|oid| self.result_displays.get(oid))
    }

    pub fn set_display_order(&mut self, order: Vec<ResultDisplayOid>) -> Result<()> {
        order::ensure_permutation("result displays", &self.result_display_order, &order)?;
        self.result_display_order = order;
        Ok(())
    }

    pub fn set_result_order(
        &mut self,
        result_display_oid: &ResultDisplayOid,
        order: Vec<AnalysisResultOid>,
    ) -> Result<()> {
        let Some(display) = self.result_displays.get_mut(result_display_oid) else {
            return Err(ModelError::NotAPermutation {
                collection: "analysis results",
            });
        };
        order::ensure_permutation("analysis results", &display.analysis_result_order, &order)?;
        display.analysis_result_order = order;
        Ok(())
    }

    pub fn normalized(mut self) -> Self {
        let displays = &self.result_displays;
        let mut seen = BTreeSet::new();
        self.result_display_order
            .retain(|oid| displays.contains_key(oid) && seen.insert(oid.clone()));
        for oid in self.result_displays.keys() {
            if !seen.contains(oid) {
                self.result_display_order.push(oid.clone());
            }
        }
        self
    }
}
