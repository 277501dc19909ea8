use serde::{Deserialize, Serialize};

use crate::oid::{LeafOid, name_derived_oid};

/// A referenced file: annotated CRF, supplemental document or dataset file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaf {
    pub id: LeafOid,
    pub href: String,
    #[serde(default)]
    pub title: String,
}

impl Leaf {
    pub fn new(id: LeafOid, href: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id,
            href: href.into().trim().to_string(),
            title: title.into().trim().to_string(),
        }
    }

    /// The transport file leaf of a dataset (`LF.<name>`, `<name>.xpt`).
    pub fn for_dataset(name: &str) -> Self {
        let name = name.trim();
        let href = format!("{}.xpt", name.to_lowercase());
        Self::new(name_derived_oid(name), href.clone(), href)
    }

    /// True when this leaf is the generated transport file leaf for `name`.
    pub fn is_dataset_leaf_for(&self, name: &str) -> bool {
        *self == Self::for_dataset(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_leaf_follows_name() {
        let leaf = Leaf::for_dataset("AE");
        assert_eq!(leaf.id.as_str(), "LF.AE");
        assert_eq!(leaf.href, "ae.xpt");
        assert!(leaf.is_dataset_leaf_for("AE"));
        assert!(!leaf.is_dataset_leaf_for("CM"));
    }
}
