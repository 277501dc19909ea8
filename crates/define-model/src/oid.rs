//! Typed object identifiers and OID generation.
//!
//! Every entity kind gets its own newtype so that an item def OID can never be
//! stored where a code list OID is expected. All of them serialize as plain
//! strings of the form `<PREFIX>.<suffix>`.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ModelError, Result};

/// Entity kinds that own an OID namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OidKind {
    MetaDataVersion,
    Standard,
    ValueList,
    WhereClause,
    ItemGroup,
    Item,
    CodeList,
    Method,
    Comment,
    Leaf,
    ItemRef,
    CodeListItem,
    ResultDisplay,
    AnalysisResult,
    Study,
    Define,
}

impl OidKind {
    /// OID prefix, including the trailing dot.
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::MetaDataVersion => "MDV.",
            Self::Standard => "STD.",
            Self::ValueList => "VL.",
            Self::WhereClause => "WC.",
            Self::ItemGroup => "IG.",
            Self::Item => "IT.",
            Self::CodeList => "CL.",
            Self::Method => "MT.",
            Self::Comment => "COM.",
            Self::Leaf => "LF.",
            Self::ItemRef => "IR.",
            Self::CodeListItem => "CI.",
            Self::ResultDisplay => "RD.",
            Self::AnalysisResult => "AR.",
            Self::Study => "ST.",
            Self::Define => "DEF.",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::MetaDataVersion => "MetaDataVersion",
            Self::Standard => "Standard",
            Self::ValueList => "ValueList",
            Self::WhereClause => "WhereClause",
            Self::ItemGroup => "ItemGroup",
            Self::Item => "Item",
            Self::CodeList => "CodeList",
            Self::Method => "Method",
            Self::Comment => "Comment",
            Self::Leaf => "Leaf",
            Self::ItemRef => "ItemRef",
            Self::CodeListItem => "CodeListItem",
            Self::ResultDisplay => "ResultDisplay",
            Self::AnalysisResult => "AnalysisResult",
            Self::Study => "Study",
            Self::Define => "Define",
        }
    }
}

impl fmt::Display for OidKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Common behaviour of the typed OID newtypes.
pub trait Oid: Clone + Ord + fmt::Display {
    const KIND: OidKind;

    fn from_string(value: String) -> Self;

    fn as_str(&self) -> &str;
}

macro_rules! define_oid {
    ($(#[$meta:meta])* $name:ident => $kind:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Oid for $name {
            const KIND: OidKind = OidKind::$kind;

            fn from_string(value: String) -> Self {
                Self(value)
            }

            fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_oid!(
    /// Identifier of the `MetaDataVersion` element.
    MetaDataVersionOid => MetaDataVersion
);
define_oid!(StandardOid => Standard);
define_oid!(ValueListOid => ValueList);
define_oid!(WhereClauseOid => WhereClause);
define_oid!(
    /// Identifier of a dataset (`ItemGroupDef`).
    ItemGroupOid => ItemGroup
);
define_oid!(
    /// Identifier of a variable or value-level item (`ItemDef`).
    ItemDefOid => Item
);
define_oid!(CodeListOid => CodeList);
define_oid!(MethodOid => Method);
define_oid!(CommentOid => Comment);
define_oid!(LeafOid => Leaf);
define_oid!(ItemRefOid => ItemRef);
define_oid!(CodeListItemOid => CodeListItem);
define_oid!(ResultDisplayOid => ResultDisplay);
define_oid!(AnalysisResultOid => AnalysisResult);
define_oid!(StudyOid => Study);
define_oid!(
    /// Identifier of an opened define document in the host application.
    DefineId => Define
);

/// Produce a new OID of kind `O`.
///
/// With a suffix the OID is deterministic (`prefix + suffix`) and a collision
/// with `existing` is an error. Without a suffix a random UUID suffix is drawn
/// until it does not collide.
pub fn get_oid<'a, O>(suffix: Option<&str>, existing: impl IntoIterator<Item = &'a O>) -> Result<O>
where
    O: Oid + 'a,
{
    let existing: BTreeSet<&str> = existing.into_iter().map(Oid::as_str).collect();
    let prefix = O::KIND.prefix();
    if let Some(suffix) = suffix {
        let suffix = suffix.trim();
        if suffix.is_empty() {
            return Err(ModelError::InvalidSuffix {
                kind: O::KIND,
                suffix: suffix.to_string(),
            });
        }
        let candidate = format!("{prefix}{suffix}");
        if existing.contains(candidate.as_str()) {
            return Err(ModelError::OidCollision {
                kind: O::KIND,
                oid: candidate,
            });
        }
        return Ok(O::from_string(candidate));
    }
    loop {
        let candidate = format!("{prefix}{}", Uuid::new_v4().hyphenated());
        if !existing.contains(candidate.as_str()) {
            return Ok(O::from_string(candidate));
        }
    }
}

/// The OID an entity named `name` receives when its OID follows its name.
pub fn name_derived_oid<O: Oid>(name: &str) -> O {
    O::from_string(format!("{}{}", O::KIND.prefix(), name.trim()))
}

/// True when `oid` is exactly the name-derived OID for `name`.
pub fn is_name_derived<O: Oid>(oid: &O, name: &str) -> bool {
    let prefix = O::KIND.prefix();
    oid.as_str()
        .strip_prefix(prefix)
        .is_some_and(|suffix| suffix == name.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_oid_uses_prefix() {
        let existing: Vec<ItemGroupOid> = Vec::new();
        let oid: ItemGroupOid = get_oid(Some("AE"), &existing).expect("oid");
        assert_eq!(oid.as_str(), "IG.AE");
    }

    #[test]
    fn deterministic_collision_is_an_error() {
        let existing = vec![ItemGroupOid::from("IG.AE")];
        let error = get_oid::<ItemGroupOid>(Some("AE"), &existing).unwrap_err();
        assert_eq!(
            error,
            ModelError::OidCollision {
                kind: OidKind::ItemGroup,
                oid: "IG.AE".to_string()
            }
        );
    }

    #[test]
    fn random_oid_avoids_existing() {
        let existing = vec![CommentOid::from("COM.1")];
        let oid: CommentOid = get_oid(None, &existing).expect("oid");
        assert!(oid.as_str().starts_with("COM."));
        assert_ne!(oid, existing[0]);
    }

    #[test]
    fn blank_suffix_is_rejected() {
        let existing: Vec<CodeListOid> = Vec::new();
        assert!(get_oid::<CodeListOid>(Some("  "), &existing).is_err());
    }

    #[test]
    fn name_derivation_round_trip() {
        let oid: ItemGroupOid = name_derived_oid("LB");
        assert_eq!(oid.as_str(), "IG.LB");
        assert!(is_name_derived(&oid, "LB"));
        assert!(!is_name_derived(&oid, "LBX"));
        assert!(!is_name_derived(&ItemGroupOid::from("IG.0b1c"), "LB"));
    }
}
