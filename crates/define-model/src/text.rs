//! Descriptive building blocks shared by many entity kinds.
//!
//! Descriptions are plain `Vec<TranslatedText>` fields; the [`Describable`]
//! trait gives every owner the same accessors without a common base type.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::oid::LeafOid;

/// A text value with an optional `xml:lang`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatedText {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    pub value: String,
}

impl TranslatedText {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            lang: None,
            value: value.into(),
        }
    }

    pub fn with_lang(lang: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            lang: Some(lang.into()),
            value: value.into(),
        }
    }
}

/// Trims values, drops empty entries and keeps only the first entry per language.
pub fn normalize_descriptions(descriptions: Vec<TranslatedText>) -> Vec<TranslatedText> {
    let mut seen: BTreeSet<Option<String>> = BTreeSet::new();
    descriptions
        .into_iter()
        .filter_map(|text| {
            let value = text.value.trim().to_string();
            let lang = text
                .lang
                .map(|lang| lang.trim().to_string())
                .filter(|lang| !lang.is_empty());
            if value.is_empty() || !seen.insert(lang.clone()) {
                return None;
            }
            Some(TranslatedText { lang, value })
        })
        .collect()
}

/// Access to the translated descriptions of an entity.
pub trait Describable {
    fn descriptions(&self) -> &[TranslatedText];

    fn descriptions_mut(&mut self) -> &mut Vec<TranslatedText>;

    /// Description in `lang`, falling back to the untagged one and then the first.
    fn description(&self, lang: Option<&str>) -> Option<&str> {
        let descriptions = self.descriptions();
        descriptions
            .iter()
            .find(|text| text.lang.as_deref() == lang)
            .or_else(|| descriptions.iter().find(|text| text.lang.is_none()))
            .or_else(|| descriptions.first())
            .map(|text| text.value.as_str())
    }

    /// Replace the description for `lang`; an empty value removes it.
    fn set_description(&mut self, lang: Option<&str>, value: &str) {
        let descriptions = self.descriptions_mut();
        let value = value.trim();
        let position = descriptions
            .iter()
            .position(|text| text.lang.as_deref() == lang);
        match (position, value.is_empty()) {
            (Some(index), true) => {
                descriptions.remove(index);
            }
            (Some(index), false) => descriptions[index].value = value.to_string(),
            (None, true) => {}
            (None, false) => descriptions.push(TranslatedText {
                lang: lang.map(str::to_string),
                value: value.to_string(),
            }),
        }
    }
}

/// Implements [`Describable`] for a struct with a `descriptions` field.
#[macro_export]
macro_rules! impl_describable {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::text::Describable for $ty {
                fn descriptions(&self) -> &[$crate::text::TranslatedText] {
                    &self.descriptions
                }

                fn descriptions_mut(&mut self) -> &mut Vec<$crate::text::TranslatedText> {
                    &mut self.descriptions
                }
            }
        )+
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    pub context: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PdfPageType {
    #[default]
    PhysicalRef,
    NamedDestination,
}

/// Page reference inside a PDF document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfPageRef {
    pub page_type: PdfPageType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_refs: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Reference from a comment, method or origin to a leaf document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub leaf_id: LeafOid,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pdf_page_refs: Vec<PdfPageRef>,
}

impl DocumentRef {
    pub fn new(leaf_id: LeafOid) -> Self {
        Self {
            leaf_id,
            pdf_page_refs: Vec::new(),
        }
    }
}

/// Remove references to `removed` leafs. Returns true when anything changed.
pub fn strip_documents(documents: &mut Vec<DocumentRef>, removed: &BTreeSet<LeafOid>) -> bool {
    let before = documents.len();
    documents.retain(|document| !removed.contains(&document.leaf_id));
    before != documents.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Described {
        descriptions: Vec<TranslatedText>,
    }

    impl_describable!(Described);

    #[test]
    fn normalization_drops_blank_and_duplicate_languages() {
        let normalized = normalize_descriptions(vec![
            TranslatedText::new("  Adverse Events "),
            TranslatedText::new("Duplicate"),
            TranslatedText::with_lang("fr", ""),
            TranslatedText::with_lang("de", "Ereignisse"),
        ]);
        assert_eq!(
            normalized,
            vec![
                TranslatedText::new("Adverse Events"),
                TranslatedText::with_lang("de", "Ereignisse"),
            ]
        );
    }

    #[test]
    fn set_description_replaces_and_removes() {
        let mut item = Described {
            descriptions: vec![TranslatedText::new("Old")],
        };
        item.set_description(None, "New");
        assert_eq!(item.description(None), Some("New"));
        item.set_description(Some("de"), "Neu");
        assert_eq!(item.description(Some("de")), Some("Neu"));
        assert_eq!(item.description(Some("fr")), Some("New"));
        item.set_description(None, " ");
        assert_eq!(item.descriptions().len(), 1);
    }

    #[test]
    fn strip_documents_reports_change() {
        let mut documents = vec![
            DocumentRef::new(LeafOid::from("LF.ACRF")),
            DocumentRef::new(LeafOid::from("LF.SDG")),
        ];
        let removed = BTreeSet::from([LeafOid::from("LF.ACRF")]);
        assert!(strip_documents(&mut documents, &removed));
        assert!(!strip_documents(&mut documents, &removed));
        assert_eq!(documents.len(), 1);
    }
}
