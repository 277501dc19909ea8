//! ODM root, study and global variables.

use serde::{Deserialize, Serialize};

use crate::metadata_version::MetaDataVersion;
use crate::oid::{DefineId, StudyOid};
use crate::patch::{apply, double_option};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalVariables {
    pub study_name: String,
    pub study_description: String,
    pub protocol_name: String,
}

impl GlobalVariables {
    pub fn merged(&self, patch: &GlobalVariablesPatch) -> Self {
        let mut next = self.clone();
        apply(&mut next.study_name, patch.study_name.as_ref());
        apply(&mut next.study_description, patch.study_description.as_ref());
        apply(&mut next.protocol_name, patch.protocol_name.as_ref());
        next.study_name = next.study_name.trim().to_string();
        next.protocol_name = next.protocol_name.trim().to_string();
        next
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalVariablesPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub study_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub study_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Study {
    pub oid: StudyOid,
    #[serde(default)]
    pub global_variables: GlobalVariables,
    pub metadata_version: MetaDataVersion,
}

/// Attributes of the `ODM` element.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OdmAttributes {
    pub file_oid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_of_date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub originator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_system_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_location: Option<String>,
}

impl OdmAttributes {
    pub fn merged(&self, patch: &OdmAttributesPatch) -> Self {
        let mut next = self.clone();
        apply(&mut next.file_oid, patch.file_oid.as_ref());
        apply(&mut next.creation_date_time, patch.creation_date_time.as_ref());
        apply(&mut next.as_of_date_time, patch.as_of_date_time.as_ref());
        apply(&mut next.originator, patch.originator.as_ref());
        apply(&mut next.source_system, patch.source_system.as_ref());
        apply(
            &mut next.source_system_version,
            patch.source_system_version.as_ref(),
        );
        apply(&mut next.schema_location, patch.schema_location.as_ref());
        next
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OdmAttributesPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_oid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub creation_date_time: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub as_of_date_time: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub originator: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub source_system: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub source_system_version: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub schema_location: Option<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Odm {
    pub define_id: DefineId,
    #[serde(default)]
    pub attributes: OdmAttributes,
    pub study: Study,
}

impl Odm {
    pub fn metadata_version(&self) -> &MetaDataVersion {
        &self.study.metadata_version
    }

    pub fn normalized(mut self) -> Self {
        self.study.metadata_version = self.study.metadata_version.normalized();
        self
    }
}

/// Root of the editor state: at most one open define.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DefineDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub odm: Option<Odm>,
}

impl DefineDocument {
    pub fn new(odm: Odm) -> Self {
        Self { odm: Some(odm) }
    }

    pub fn metadata_version(&self) -> Option<&MetaDataVersion> {
        self.odm.as_ref().map(Odm::metadata_version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_variables_patch_trims_names() {
        let globals = GlobalVariables::default();
        let patch = GlobalVariablesPatch {
            study_name: Some(" CDISC01 ".to_string()),
            ..GlobalVariablesPatch::default()
        };
        assert_eq!(globals.merged(&patch).study_name, "CDISC01");
    }

    #[test]
    fn empty_document_serializes_to_empty_object() {
        let json = serde_json::to_string(&DefineDocument::default()).expect("serialize");
        assert_eq!(json, "{}");
    }
}
