//! Normalized Define-XML document model.
//!
//! Entities live in keyed tables on [`MetaDataVersion`]; every cross
//! reference is an OID, and shared entities keep `sources` back-references
//! to their owners so that deletes and renames can be applied locally.
//!
//! # Module Organization
//!
//! - [`oid`]: typed OIDs and the OID generator
//! - [`text`]: translated text, aliases, document references
//! - [`item_group`], [`item_ref`], [`item_def`], [`value_list`]: datasets, variables and value level
//! - [`code_list`], [`method`], [`comment`], [`where_clause`]: shared entities
//! - [`standard`], [`leaf`], [`arm`]: standards, external files, analysis results metadata
//! - [`metadata_version`], [`odm`]: the aggregate and the document root
//! - [`order`], [`patch`]: helpers for order arrays and partial updates

pub mod arm;
pub mod code_list;
pub mod comment;
pub mod error;
pub mod item_def;
pub mod item_group;
pub mod item_ref;
pub mod leaf;
pub mod metadata_version;
pub mod method;
pub mod odm;
pub mod oid;
pub mod order;
pub mod patch;
pub mod standard;
pub mod text;
pub mod value_list;
pub mod where_clause;

pub use arm::{
    AnalysisDataset, AnalysisResult, AnalysisResultDisplays, AnalysisResultPatch,
    AnalysisResultSources, Documentation, ProgrammingCode, ResultDisplay, ResultDisplayPatch,
};
pub use code_list::{
    CodeList, CodeListItem, CodeListPatch, CodeListSources, CodeListType, CodedValuePatch,
    EnumeratedItem, ExternalCodeList,
};
pub use comment::{Comment, CommentOwner, CommentPatch, CommentSources};
pub use error::{ModelError, Result};
pub use item_def::{DataType, ItemDef, ItemDefPatch, ItemDefSources, Origin};
pub use item_group::{ItemGroup, ItemGroupPatch, Purpose};
pub use item_ref::{ItemRef, ItemRefContainer, ItemRefPatch, ItemRefSet};
pub use leaf::Leaf;
pub use metadata_version::{MdvOrder, MdvPatch, MetaDataVersion, Model, Table};
pub use method::{
    FormalExpression, Method, MethodOwner, MethodPatch, MethodSources, MethodType,
};
pub use odm::{
    DefineDocument, GlobalVariables, GlobalVariablesPatch, Odm, OdmAttributes,
    OdmAttributesPatch, Study,
};
pub use oid::{
    AnalysisResultOid, CodeListItemOid, CodeListOid, CommentOid, DefineId, ItemDefOid,
    ItemGroupOid, ItemRefOid, LeafOid, MetaDataVersionOid, MethodOid, Oid, OidKind,
    ResultDisplayOid, StandardOid, StudyOid, ValueListOid, WhereClauseOid, get_oid,
    is_name_derived, name_derived_oid,
};
pub use standard::{Standard, StandardPatch, StandardType};
pub use text::{Alias, Describable, DocumentRef, PdfPageRef, PdfPageType, TranslatedText};
pub use value_list::{ValueList, ValueListSources};
pub use where_clause::{Comparator, RangeCheck, SoftHard, WhereClause, WhereClauseSources};
