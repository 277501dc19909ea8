//! Shared fixtures: small studies built through the store so every fixture
//! goes through the same reducers as real edits.

#![allow(dead_code)]

use define_core::{Action, DefineStore, DispatchOutcome, Intent, StoreConfig};
use define_model::{
    CodeList, CodeListItem, CodeListItemOid, CodeListOid, CodeListType, Comment, CommentOid,
    CommentOwner, Comparator, DefineDocument, DefineId, DocumentRef, GlobalVariables, ItemDef,
    ItemDefOid, ItemGroup, ItemGroupOid, ItemRef, ItemRefContainer, ItemRefOid, Leaf, LeafOid,
    MetaDataVersion, MetaDataVersionOid, Method, MethodOid, MethodOwner, Model, Odm,
    OdmAttributes, RangeCheck, Study, StudyOid, ValueListOid, WhereClause, WhereClauseOid,
};

pub fn empty_document(model: Model) -> DefineDocument {
    DefineDocument::new(Odm {
        define_id: DefineId::from("DEF.PILOT"),
        attributes: OdmAttributes::default(),
        study: Study {
            oid: StudyOid::from("ST.PILOT"),
            global_variables: GlobalVariables::default(),
            metadata_version: MetaDataVersion::new(
                MetaDataVersionOid::from("MDV.PILOT"),
                "Pilot",
                model,
            ),
        },
    })
}

/// A store that checks integrity on every dispatch.
pub fn store(model: Model) -> DefineStore {
    DefineStore::new(
        empty_document(model),
        StoreConfig {
            history_limit: None,
            verify_integrity: true,
        },
    )
}

pub fn apply(store: &mut DefineStore, action: Action) -> DispatchOutcome {
    let kind = action.kind();
    store
        .dispatch(&action)
        .unwrap_or_else(|error| panic!("{kind} failed: {error}"))
}

pub fn apply_intent(store: &mut DefineStore, intent: Intent) -> DispatchOutcome {
    store
        .dispatch_intent(&intent)
        .unwrap_or_else(|error| panic!("{} failed: {error}", intent.name()))
}

pub fn mdv(store: &DefineStore) -> &MetaDataVersion {
    store.metadata_version().expect("open define")
}

pub fn ig(name: &str) -> ItemGroupOid {
    ItemGroupOid::new(format!("IG.{name}"))
}

pub fn it(name: &str) -> ItemDefOid {
    ItemDefOid::new(format!("IT.{name}"))
}

pub fn ir(name: &str) -> ItemRefOid {
    ItemRefOid::new(format!("IR.{name}"))
}

pub fn cl(name: &str) -> CodeListOid {
    CodeListOid::new(format!("CL.{name}"))
}

pub fn add_group(name: &str) -> Action {
    Action::AddItemGroup {
        item_group: ItemGroup::new(ig(name), name).with_domain(name),
        position: None,
    }
}

/// A variable with a new item def `IT.<item>` referenced by `IR.<item>`.
pub fn add_variable(group: &str, item: &str, code_list: Option<&str>) -> Action {
    let mut item_def = ItemDef::new(it(item), item.rsplit('.').next().unwrap_or(item));
    if let Some(code_list) = code_list {
        item_def = item_def.with_code_list(cl(code_list));
    }
    Action::AddVariable {
        item_group_oid: ig(group),
        item_ref: ItemRef::new(ir(item), it(item)),
        item_def: Some(item_def),
        position: None,
    }
}

/// A variable reusing the existing item def `IT.<item>`.
pub fn share_variable(group: &str, item: &str) -> Action {
    Action::AddVariable {
        item_group_oid: ig(group),
        item_ref: ItemRef::new(ItemRefOid::new(format!("IR.{group}.{item}")), it(item)),
        item_def: None,
        position: None,
    }
}

pub fn add_code_list(name: &str, values: &[(&str, &str)]) -> Vec<Action> {
    let mut actions = vec![Action::AddCodeList {
        code_list: CodeList::new(cl(name), name, CodeListType::Decoded),
        position: None,
    }];
    for (index, (coded, decode)) in values.iter().enumerate() {
        actions.push(Action::AddCodedValue {
            code_list_oid: cl(name),
            item_oid: CodeListItemOid::new(format!("CL.{name}.{}", index + 1)),
            item: CodeListItem::new(*coded, *decode),
            position: None,
        });
    }
    actions
}

/// `IG.AE` with `r1 -> IT.1` (coded by `CL.SEX`) and `r2 -> IT.2`.
pub fn ae_with_sex() -> DefineStore {
    let mut store = store(Model::Sdtm);
    for action in add_code_list("SEX", &[("M", "Male"), ("F", "Female")]) {
        apply(&mut store, action);
    }
    apply(&mut store, add_group("AE"));
    for (reference, item, code_list) in [("r1", "IT.1", Some(cl("SEX"))), ("r2", "IT.2", None)] {
        let mut item_def = ItemDef::new(ItemDefOid::from(item), item);
        if let Some(code_list) = code_list {
            item_def = item_def.with_code_list(code_list);
        }
        apply(
            &mut store,
            Action::AddVariable {
                item_group_oid: ig("AE"),
                item_ref: ItemRef::new(ItemRefOid::from(reference), ItemDefOid::from(item)),
                item_def: Some(item_def),
                position: None,
            },
        );
    }
    store
}

/// DM and AE sharing STUDYID/USUBJID, with a code list, a comment on DM
/// backed by a leaf, a derivation method and value-level metadata on AESEV.
pub fn pilot_study() -> DefineStore {
    let mut store = store(Model::Sdtm);
    apply(
        &mut store,
        Action::AddLeaf {
            leaf: Leaf::new(LeafOid::from("LF.ACRF"), "acrf.pdf", "Annotated CRF"),
            position: None,
        },
    );
    for action in add_code_list("SEX", &[("M", "Male"), ("F", "Female")]) {
        apply(&mut store, action);
    }
    for action in add_code_list("AESEV", &[("MILD", "Mild"), ("SEVERE", "Severe")]) {
        apply(&mut store, action);
    }

    apply(&mut store, add_group("DM"));
    apply(&mut store, add_variable("DM", "STUDYID", None));
    apply(&mut store, add_variable("DM", "USUBJID", None));
    apply(&mut store, add_variable("DM", "DM.SEX", Some("SEX")));
    apply(&mut store, add_variable("DM", "DM.AGE", None));
    apply(
        &mut store,
        Action::UpdateKeyOrder {
            container: ItemRefContainer::ItemGroup(ig("DM")),
            key_order: vec![ir("STUDYID"), ir("USUBJID")],
        },
    );

    apply(&mut store, add_group("AE"));
    apply(&mut store, share_variable("AE", "STUDYID"));
    apply(&mut store, share_variable("AE", "USUBJID"));
    apply(&mut store, add_variable("AE", "AE.AESEV", Some("AESEV")));

    let mut comment = Comment::new(CommentOid::from("COM.DM"), "One record per subject");
    comment.documents.push(DocumentRef::new(LeafOid::from("LF.ACRF")));
    apply(
        &mut store,
        Action::AddComment {
            owner: CommentOwner::ItemGroup(ig("DM")),
            comment,
        },
    );
    apply(
        &mut store,
        Action::AddMethod {
            owner: MethodOwner::new(ItemRefContainer::ItemGroup(ig("DM")), ir("DM.AGE")),
            method: Method::new(MethodOid::from("MT.AGE"), "Age", "Age at informed consent"),
        },
    );
    apply(
        &mut store,
        Action::AddValueLevel {
            parent_item_oid: it("AE.AESEV"),
            value_list_oid: ValueListOid::from("VL.AE.AESEV"),
            item_ref: ItemRef::new(ir("VL.AESEV.MILD"), it("AE.AESEV.MILD"))
                .with_where_clause(WhereClauseOid::from("WC.AESEV.MILD")),
            item_def: Some(ItemDef::new(it("AE.AESEV.MILD"), "AESEV")),
            where_clause: Some(WhereClause::new(
                WhereClauseOid::from("WC.AESEV.MILD"),
                vec![
                    RangeCheck::new(it("AE.AESEV"), Comparator::Eq, vec!["MILD".to_string()])
                        .in_group(ig("AE")),
                ],
            )),
            position: None,
        },
    );
    store
}
