//! Intents: deletes expressed by what the user picked, expanded against the
//! current document into a `DEL_*` action with its deletion closure.

use serde::{Deserialize, Serialize};

use define_model::{
    AnalysisResultOid, CodeListOid, ItemGroupOid, ItemRefContainer, ItemRefOid, MetaDataVersion,
    ResultDisplayOid,
};

use crate::action::Action;
use crate::cascade::{
    analysis_datasets_related_oids, analysis_results_related_oids, arm_disable_closure,
    code_lists_related_oids, item_groups_related_oids, item_refs_related_oids,
    result_displays_related_oids,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    DeleteItemGroups {
        item_group_oids: Vec<ItemGroupOid>,
    },
    /// Delete item refs of a dataset or value list, with the item defs and
    /// value-level data nothing else uses.
    DeleteVariables {
        container: ItemRefContainer,
        item_ref_oids: Vec<ItemRefOid>,
    },
    DeleteCodeLists {
        code_list_oids: Vec<CodeListOid>,
    },
    DeleteResultDisplays {
        result_display_oids: Vec<ResultDisplayOid>,
    },
    DeleteAnalysisResults {
        analysis_result_oids: Vec<AnalysisResultOid>,
    },
    DeleteAnalysisDatasets {
        analysis_result_oid: AnalysisResultOid,
        item_group_oids: Vec<ItemGroupOid>,
    },
    DisableArm,
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::DeleteItemGroups { .. } => "delete_item_groups",
            Self::DeleteVariables { .. } => "delete_variables",
            Self::DeleteCodeLists { .. } => "delete_code_lists",
            Self::DeleteResultDisplays { .. } => "delete_result_displays",
            Self::DeleteAnalysisResults { .. } => "delete_analysis_results",
            Self::DeleteAnalysisDatasets { .. } => "delete_analysis_datasets",
            Self::DisableArm => "disable_arm",
        }
    }

    /// Compute the deletion closure against `mdv`. Unknown OIDs are skipped.
    pub fn expand(&self, mdv: &MetaDataVersion) -> Action {
        match self {
            Self::DeleteItemGroups { item_group_oids } => Action::DeleteItemGroups {
                closure: item_groups_related_oids(mdv, item_group_oids).closure,
            },
            Self::DeleteVariables {
                container,
                item_ref_oids,
            } => Action::DeleteVariables {
                closure: item_refs_related_oids(mdv, container, item_ref_oids),
            },
            Self::DeleteCodeLists { code_list_oids } => Action::DeleteCodeLists {
                closure: code_lists_related_oids(mdv, code_list_oids),
            },
            Self::DeleteResultDisplays {
                result_display_oids,
            } => Action::DeleteResultDisplays {
                closure: result_displays_related_oids(mdv, result_display_oids),
            },
            Self::DeleteAnalysisResults {
                analysis_result_oids,
            } => Action::DeleteAnalysisResults {
                closure: analysis_results_related_oids(mdv, analysis_result_oids),
            },
            Self::DeleteAnalysisDatasets {
                analysis_result_oid,
                item_group_oids,
            } => Action::DeleteAnalysisDatasets {
                closure: analysis_datasets_related_oids(mdv, analysis_result_oid, item_group_oids),
            },
            Self::DisableArm => Action::DisableArm {
                closure: arm_disable_closure(mdv),
            },
        }
    }
}

/// One entry of an edit script: an intent or a plain action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScriptStep {
    Intent(Intent),
    Action(Action),
}
