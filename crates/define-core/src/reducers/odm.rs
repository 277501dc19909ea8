//! The root reducer: document lifecycle, ODM attributes and global variables.

use tracing::info;

use define_model::{DefineDocument, Odm};

use super::metadata_version;
use crate::action::Action;
use crate::error::{CoreError, Result};

pub fn reduce(document: &DefineDocument, action: &Action) -> Result<DefineDocument> {
    match action {
        Action::LoadDocument { document: loaded } => {
            let odm = loaded.odm.clone().map(Odm::normalized);
            if let Some(odm) = &odm {
                info!(define_id = %odm.define_id, "document loaded");
            }
            return Ok(DefineDocument { odm });
        }
        Action::DeleteDefine { define_id } => {
            return Ok(match &document.odm {
                Some(odm) if odm.define_id == *define_id => {
                    info!(define_id = %define_id, "define removed");
                    DefineDocument::default()
                }
                _ => document.clone(),
            });
        }
        _ if action.is_history() => {
            return Err(CoreError::invalid(format!(
                "{} is handled by the store, not by reducers",
                action.kind()
            )));
        }
        _ => {}
    }

    let Some(odm) = &document.odm else {
        return Err(CoreError::invalid(format!(
            "{} needs an open define",
            action.kind()
        )));
    };
    let mut next = odm.clone();
    match action {
        Action::UpdateGlobalVariables { patch } => {
            next.study.global_variables = odm.study.global_variables.merged(patch);
        }
        Action::UpdateOdmAttributes { patch } => {
            next.attributes = odm.attributes.merged(patch);
        }
        _ => {
            next.study.metadata_version = metadata_version::reduce(odm.metadata_version(), action)?;
        }
    }
    Ok(DefineDocument::new(next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use define_model::{
        DefineId, GlobalVariables, GlobalVariablesPatch, MetaDataVersion, MetaDataVersionOid, Model,
        OdmAttributes, Study, StudyOid,
    };

    fn document() -> DefineDocument {
        DefineDocument::new(Odm {
            define_id: DefineId::from("DEF.1"),
            attributes: OdmAttributes::default(),
            study: Study {
                oid: StudyOid::from("ST.1"),
                global_variables: GlobalVariables::default(),
                metadata_version: MetaDataVersion::new(
                    MetaDataVersionOid::from("MDV.1"),
                    "Study",
                    Model::Sdtm,
                ),
            },
        })
    }

    #[test]
    fn actions_need_an_open_define() {
        let error = reduce(&DefineDocument::default(), &Action::EnableArm).unwrap_err();
        assert!(matches!(error, CoreError::InvalidAction(_)));
    }

    #[test]
    fn delete_define_only_matches_its_id() {
        let document = document();
        let kept = reduce(
            &document,
            &Action::DeleteDefine {
                define_id: DefineId::from("DEF.2"),
            },
        )
        .expect("reduce");
        assert!(kept.odm.is_some());
        let removed = reduce(
            &document,
            &Action::DeleteDefine {
                define_id: DefineId::from("DEF.1"),
            },
        )
        .expect("reduce");
        assert!(removed.odm.is_none());
    }

    #[test]
    fn global_variables_are_patched() {
        let action = Action::UpdateGlobalVariables {
            patch: GlobalVariablesPatch {
                study_name: Some("CDISCPILOT01".to_string()),
                ..GlobalVariablesPatch::default()
            },
        };
        let next = reduce(&document(), &action).expect("reduce");
        let odm = next.odm.expect("open");
        assert_eq!(odm.study.global_variables.study_name, "CDISCPILOT01");
    }

    #[test]
    fn history_actions_are_not_reduced() {
        let error = reduce(&document(), &Action::Undo).unwrap_err();
        assert!(matches!(error, CoreError::InvalidAction(_)));
    }
}
