//! The action protocol.
//!
//! Actions are plain data tagged by `type`, so scripts and hosts can send
//! them as JSON. Cascading deletes carry a pre-computed
//! [`DeletionClosure`]; build it with the functions in [`crate::cascade`] or
//! dispatch an [`crate::Intent`] instead.

use serde::{Deserialize, Serialize};

use define_model::{
    AnalysisDataset, AnalysisResult, AnalysisResultOid, AnalysisResultPatch, CodeList,
    CodeListItem, CodeListItemOid, CodeListOid, CodeListPatch, CodedValuePatch, Comment,
    CommentOid, CommentOwner, CommentPatch, DefineDocument, DefineId, GlobalVariablesPatch,
    ItemDef, ItemDefOid, ItemDefPatch, ItemGroup, ItemGroupOid, ItemGroupPatch, ItemRef,
    ItemRefContainer, ItemRefOid, ItemRefPatch, Leaf, LeafOid, MdvPatch, Method, MethodOid,
    MethodOwner, MethodPatch, Model, OdmAttributesPatch, RangeCheck, ResultDisplay,
    ResultDisplayOid, ResultDisplayPatch, Standard, StandardOid, StandardPatch, ValueListOid,
    WhereClause, WhereClauseOid,
};

use crate::cascade::DeletionClosure;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Action {
    // ========================================================================
    // Datasets and variables
    // ========================================================================
    #[serde(rename = "ADD_ITEMGROUP")]
    AddItemGroup {
        item_group: ItemGroup,
        #[serde(default)]
        position: Option<usize>,
    },
    #[serde(rename = "UPD_ITEMGROUP")]
    UpdateItemGroup {
        oid: ItemGroupOid,
        patch: ItemGroupPatch,
    },
    #[serde(rename = "DEL_ITEMGROUPS")]
    DeleteItemGroups { closure: DeletionClosure },
    #[serde(rename = "UPD_ITEMGROUPORDER")]
    UpdateItemGroupOrder { order: Vec<ItemGroupOid> },
    /// Add a variable to a dataset, reusing `item_ref.item_oid` when no new
    /// item def is given.
    #[serde(rename = "ADD_VAR")]
    AddVariable {
        item_group_oid: ItemGroupOid,
        item_ref: ItemRef,
        #[serde(default)]
        item_def: Option<ItemDef>,
        #[serde(default)]
        position: Option<usize>,
    },
    /// Add a value-level item under `parent_item_oid`. The value list is
    /// created when the parent has none.
    #[serde(rename = "ADD_VALLVL")]
    AddValueLevel {
        parent_item_oid: ItemDefOid,
        value_list_oid: ValueListOid,
        item_ref: ItemRef,
        #[serde(default)]
        item_def: Option<ItemDef>,
        #[serde(default)]
        where_clause: Option<WhereClause>,
        #[serde(default)]
        position: Option<usize>,
    },
    #[serde(rename = "UPD_ITEMREF")]
    UpdateItemRef {
        container: ItemRefContainer,
        item_ref_oid: ItemRefOid,
        patch: ItemRefPatch,
    },
    #[serde(rename = "UPD_ITEMDEF")]
    UpdateItemDef { oid: ItemDefOid, patch: ItemDefPatch },
    #[serde(rename = "DEL_VARS")]
    DeleteVariables { closure: DeletionClosure },
    #[serde(rename = "UPD_ITEMREFORDER")]
    UpdateItemRefOrder {
        container: ItemRefContainer,
        order: Vec<ItemRefOid>,
    },
    #[serde(rename = "UPD_KEYORDER")]
    UpdateKeyOrder {
        container: ItemRefContainer,
        key_order: Vec<ItemRefOid>,
    },

    // ========================================================================
    // Code lists
    // ========================================================================
    #[serde(rename = "ADD_CODELIST")]
    AddCodeList {
        code_list: CodeList,
        #[serde(default)]
        position: Option<usize>,
    },
    #[serde(rename = "UPD_CODELIST")]
    UpdateCodeList { oid: CodeListOid, patch: CodeListPatch },
    #[serde(rename = "DEL_CODELISTS")]
    DeleteCodeLists { closure: DeletionClosure },
    #[serde(rename = "UPD_CODELISTORDER")]
    UpdateCodeListOrder { order: Vec<CodeListOid> },
    /// Link a decoded and an enumerated list, or unlink with `None`.
    #[serde(rename = "UPD_LINKCODELISTS")]
    LinkCodeLists {
        code_list_oid: CodeListOid,
        #[serde(default)]
        linked_code_list_oid: Option<CodeListOid>,
    },
    #[serde(rename = "ADD_CODEDVALUE")]
    AddCodedValue {
        code_list_oid: CodeListOid,
        item_oid: CodeListItemOid,
        item: CodeListItem,
        #[serde(default)]
        position: Option<usize>,
    },
    #[serde(rename = "UPD_CODEDVALUE")]
    UpdateCodedValue {
        code_list_oid: CodeListOid,
        item_oid: CodeListItemOid,
        patch: CodedValuePatch,
    },
    #[serde(rename = "DEL_CODEDVALUES")]
    DeleteCodedValues {
        code_list_oid: CodeListOid,
        item_oids: Vec<CodeListItemOid>,
    },
    #[serde(rename = "UPD_CODEDVALUEORDER")]
    UpdateCodedValueOrder {
        code_list_oid: CodeListOid,
        order: Vec<CodeListItemOid>,
    },

    // ========================================================================
    // Where clauses, comments, methods
    // ========================================================================
    #[serde(rename = "UPD_WHERECLAUSE")]
    UpdateWhereClause {
        oid: WhereClauseOid,
        range_checks: Vec<RangeCheck>,
    },
    /// Attach a new comment to `owner`, replacing its current one.
    #[serde(rename = "ADD_COMMENT")]
    AddComment { owner: CommentOwner, comment: Comment },
    /// Attach an existing comment to `owner`.
    #[serde(rename = "LINK_COMMENT")]
    LinkComment {
        owner: CommentOwner,
        comment_oid: CommentOid,
    },
    /// Detach a comment from `owner`; the comment is removed with its last owner.
    #[serde(rename = "DEL_COMMENT")]
    DeleteComment {
        owner: CommentOwner,
        comment_oid: CommentOid,
    },
    #[serde(rename = "UPD_COMMENT")]
    UpdateComment { oid: CommentOid, patch: CommentPatch },
    #[serde(rename = "ADD_METHOD")]
    AddMethod { owner: MethodOwner, method: Method },
    #[serde(rename = "LINK_METHOD")]
    LinkMethod {
        owner: MethodOwner,
        method_oid: MethodOid,
    },
    #[serde(rename = "DEL_METHOD")]
    DeleteMethod {
        owner: MethodOwner,
        method_oid: MethodOid,
    },
    #[serde(rename = "UPD_METHOD")]
    UpdateMethod { oid: MethodOid, patch: MethodPatch },

    // ========================================================================
    // Leafs and standards
    // ========================================================================
    #[serde(rename = "ADD_LEAF")]
    AddLeaf {
        leaf: Leaf,
        #[serde(default)]
        position: Option<usize>,
    },
    #[serde(rename = "UPD_LEAF")]
    UpdateLeaf {
        leaf_id: LeafOid,
        #[serde(default)]
        href: Option<String>,
        #[serde(default)]
        title: Option<String>,
    },
    /// Remove leafs and every document reference to them.
    #[serde(rename = "DEL_LEAFS")]
    DeleteLeafs { leaf_ids: Vec<LeafOid> },
    #[serde(rename = "UPD_LEAFORDER")]
    UpdateLeafOrder { order: Vec<LeafOid> },
    #[serde(rename = "ADD_STANDARD")]
    AddStandard {
        standard: Standard,
        #[serde(default)]
        position: Option<usize>,
    },
    #[serde(rename = "UPD_STANDARD")]
    UpdateStandard {
        oid: StandardOid,
        patch: StandardPatch,
    },
    /// Remove standards and clear the dataset and code list links to them.
    #[serde(rename = "DEL_STANDARDS")]
    DeleteStandards { standard_oids: Vec<StandardOid> },
    #[serde(rename = "UPD_STANDARDORDER")]
    UpdateStandardOrder { order: Vec<StandardOid> },

    // ========================================================================
    // Analysis results metadata
    // ========================================================================
    #[serde(rename = "ENABLE_ARM")]
    EnableArm,
    #[serde(rename = "DISABLE_ARM")]
    DisableArm { closure: DeletionClosure },
    #[serde(rename = "ADD_RESULTDISPLAY")]
    AddResultDisplay {
        result_display: ResultDisplay,
        #[serde(default)]
        position: Option<usize>,
    },
    #[serde(rename = "UPD_RESULTDISPLAY")]
    UpdateResultDisplay {
        oid: ResultDisplayOid,
        patch: ResultDisplayPatch,
    },
    #[serde(rename = "DEL_RESULTDISPLAYS")]
    DeleteResultDisplays { closure: DeletionClosure },
    #[serde(rename = "UPD_RESULTDISPLAYORDER")]
    UpdateResultDisplayOrder { order: Vec<ResultDisplayOid> },
    #[serde(rename = "ADD_ANALYSISRESULT")]
    AddAnalysisResult {
        result_display_oid: ResultDisplayOid,
        analysis_result: AnalysisResult,
        #[serde(default)]
        position: Option<usize>,
    },
    #[serde(rename = "UPD_ANALYSISRESULT")]
    UpdateAnalysisResult {
        oid: AnalysisResultOid,
        patch: AnalysisResultPatch,
    },
    #[serde(rename = "DEL_ANALYSISRESULTS")]
    DeleteAnalysisResults { closure: DeletionClosure },
    #[serde(rename = "UPD_ANALYSISRESULTORDER")]
    UpdateAnalysisResultOrder {
        result_display_oid: ResultDisplayOid,
        order: Vec<AnalysisResultOid>,
    },
    /// Insert or replace the dataset entry of an analysis result. A given
    /// where clause is created (or replaced) and linked to the dataset.
    #[serde(rename = "UPD_ANALYSISDATASET")]
    UpdateAnalysisDataset {
        analysis_result_oid: AnalysisResultOid,
        dataset: AnalysisDataset,
        #[serde(default)]
        where_clause: Option<WhereClause>,
    },
    #[serde(rename = "DEL_ANALYSISDATASETS")]
    DeleteAnalysisDatasets { closure: DeletionClosure },

    // ========================================================================
    // Metadata version, ODM and document
    // ========================================================================
    #[serde(rename = "UPD_MDV")]
    UpdateMetaDataVersion { patch: MdvPatch },
    #[serde(rename = "UPD_MODEL")]
    UpdateModel { model: Model },
    #[serde(rename = "LOAD_DOCUMENT")]
    LoadDocument { document: DefineDocument },
    #[serde(rename = "UPD_GLOBALVARIABLES")]
    UpdateGlobalVariables { patch: GlobalVariablesPatch },
    #[serde(rename = "UPD_ODMATTRS")]
    UpdateOdmAttributes { patch: OdmAttributesPatch },
    #[serde(rename = "DEL_DEFINE")]
    DeleteDefine { define_id: DefineId },

    // ========================================================================
    // History
    // ========================================================================
    #[serde(rename = "UNDO")]
    Undo,
    #[serde(rename = "REDO")]
    Redo,
    #[serde(rename = "CLEAR_HISTORY")]
    ClearHistory,
}

impl Action {
    /// The wire name of the action.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AddItemGroup { .. } => "ADD_ITEMGROUP",
            Self::UpdateItemGroup { .. } => "UPD_ITEMGROUP",
            Self::DeleteItemGroups { .. } => "DEL_ITEMGROUPS",
            Self::UpdateItemGroupOrder { .. } => "UPD_ITEMGROUPORDER",
            Self::AddVariable { .. } => "ADD_VAR",
            Self::AddValueLevel { .. } => "ADD_VALLVL",
            Self::UpdateItemRef { .. } => "UPD_ITEMREF",
            Self::UpdateItemDef { .. } => "UPD_ITEMDEF",
            Self::DeleteVariables { .. } => "DEL_VARS",
            Self::UpdateItemRefOrder { .. } => "UPD_ITEMREFORDER",
            Self::UpdateKeyOrder { .. } => "UPD_KEYORDER",
            Self::AddCodeList { .. } => "ADD_CODELIST",
            Self::UpdateCodeList { .. } => "UPD_CODELIST",
            Self::DeleteCodeLists { .. } => "DEL_CODELISTS",
            Self::UpdateCodeListOrder { .. } => "UPD_CODELISTORDER",
            Self::LinkCodeLists { .. } => "UPD_LINKCODELISTS",
            Self::AddCodedValue { .. } => "ADD_CODEDVALUE",
            Self::UpdateCodedValue { .. } => "UPD_CODEDVALUE",
            Self::DeleteCodedValues { .. } => "DEL_CODEDVALUES",
            Self::UpdateCodedValueOrder { .. } => "UPD_CODEDVALUEORDER",
            Self::UpdateWhereClause { .. } => "UPD_WHERECLAUSE",
            Self::AddComment { .. } => "ADD_COMMENT",
            Self::LinkComment { .. } => "LINK_COMMENT",
            Self::DeleteComment { .. } => "DEL_COMMENT",
            Self::UpdateComment { .. } => "UPD_COMMENT",
            Self::AddMethod { .. } => "ADD_METHOD",
            Self::LinkMethod { .. } => "LINK_METHOD",
            Self::DeleteMethod { .. } => "DEL_METHOD",
            Self::UpdateMethod { .. } => "UPD_METHOD",
            Self::AddLeaf { .. } => "ADD_LEAF",
            Self::UpdateLeaf { .. } => "UPD_LEAF",
            Self::DeleteLeafs { .. } => "DEL_LEAFS",
            Self::UpdateLeafOrder { .. } => "UPD_LEAFORDER",
            Self::AddStandard { .. } => "ADD_STANDARD",
            Self::UpdateStandard { .. } => "UPD_STANDARD",
            Self::DeleteStandards { .. } => "DEL_STANDARDS",
            Self::UpdateStandardOrder { .. } => "UPD_STANDARDORDER",
            Self::EnableArm => "ENABLE_ARM",
            Self::DisableArm { .. } => "DISABLE_ARM",
            Self::AddResultDisplay { .. } => "ADD_RESULTDISPLAY",
            Self::UpdateResultDisplay { .. } => "UPD_RESULTDISPLAY",
            Self::DeleteResultDisplays { .. } => "DEL_RESULTDISPLAYS",
            Self::UpdateResultDisplayOrder { .. } => "UPD_RESULTDISPLAYORDER",
            Self::AddAnalysisResult { .. } => "ADD_ANALYSISRESULT",
            Self::UpdateAnalysisResult { .. } => "UPD_ANALYSISRESULT",
            Self::DeleteAnalysisResults { .. } => "DEL_ANALYSISRESULTS",
            Self::UpdateAnalysisResultOrder { .. } => "UPD_ANALYSISRESULTORDER",
            Self::UpdateAnalysisDataset { .. } => "UPD_ANALYSISDATASET",
            Self::DeleteAnalysisDatasets { .. } => "DEL_ANALYSISDATASETS",
            Self::UpdateMetaDataVersion { .. } => "UPD_MDV",
            Self::UpdateModel { .. } => "UPD_MODEL",
            Self::LoadDocument { .. } => "LOAD_DOCUMENT",
            Self::UpdateGlobalVariables { .. } => "UPD_GLOBALVARIABLES",
            Self::UpdateOdmAttributes { .. } => "UPD_ODMATTRS",
            Self::DeleteDefine { .. } => "DEL_DEFINE",
            Self::Undo => "UNDO",
            Self::Redo => "REDO",
            Self::ClearHistory => "CLEAR_HISTORY",
        }
    }

    /// The deletion closure carried by cascading deletes.
    pub fn closure(&self) -> Option<&DeletionClosure> {
        match self {
            Self::DeleteItemGroups { closure }
            | Self::DeleteVariables { closure }
            | Self::DeleteCodeLists { closure }
            | Self::DisableArm { closure }
            | Self::DeleteResultDisplays { closure }
            | Self::DeleteAnalysisResults { closure }
            | Self::DeleteAnalysisDatasets { closure } => Some(closure),
            _ => None,
        }
    }

    /// History actions are handled by the store, not by reducers.
    pub fn is_history(&self) -> bool {
        matches!(self, Self::Undo | Self::Redo | Self::ClearHistory)
    }
}
