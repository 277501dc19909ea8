use serde::{Deserialize, Serialize};

use crate::oid::StandardOid;
use crate::patch::{apply, double_option};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StandardType {
    #[default]
    IG,
    CT,
}

/// An implementation guide or controlled terminology release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standard {
    pub oid: StandardOid,
    pub name: String,
    #[serde(default)]
    pub standard_type: StandardType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publishing_set: Option<String>,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

impl Standard {
    pub fn new(
        oid: StandardOid,
        name: impl Into<String>,
        standard_type: StandardType,
        version: impl Into<String>,
    ) -> Self {
        Self {
            oid,
            name: name.into().trim().to_string(),
            standard_type,
            publishing_set: None,
            version: version.into().trim().to_string(),
            status: None,
            is_default: false,
        }
    }

    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.version = self.version.trim().to_string();
        if self.standard_type != StandardType::CT {
            self.publishing_set = None;
        }
        self
    }

    pub fn merged(&self, patch: &StandardPatch) -> Self {
        let mut next = self.clone();
        apply(&mut next.name, patch.name.as_ref());
        apply(&mut next.standard_type, patch.standard_type.as_ref());
        apply(&mut next.publishing_set, patch.publishing_set.as_ref());
        apply(&mut next.version, patch.version.as_ref());
        apply(&mut next.status, patch.status.as_ref());
        apply(&mut next.is_default, patch.is_default.as_ref());
        next.normalized()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StandardPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standard_type: Option<StandardType>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub publishing_set: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub status: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publishing_set_only_for_terminology() {
        let mut standard = Standard::new(StandardOid::from("STD.1"), "SDTMIG", StandardType::IG, "3.3");
        standard.publishing_set = Some("SDTM".to_string());
        assert_eq!(standard.normalized().publishing_set, None);
    }
}
