//! Dispatch-level behaviour of the reducers on a small study.

mod common;

use common::{add_group, add_variable, apply, apply_intent, cl, ig, ir, it, mdv, pilot_study, store};
use define_core::{Action, CoreError, DispatchOutcome, Intent, check_integrity};
use define_model::{
    AnalysisDataset, AnalysisResult, AnalysisResultOid, CodeList, CodeListItemOid, CodeListPatch,
    CodeListType, CommentOid, Comparator, ItemDefPatch, ItemGroupPatch, ItemRef,
    ItemRefContainer, LeafOid, MethodOid, Model, RangeCheck, ResultDisplay, ResultDisplayOid,
    WhereClause, WhereClauseOid,
};

#[test]
fn dataset_rename_moves_every_reference() {
    let mut store = pilot_study();
    apply(
        &mut store,
        Action::UpdateItemGroup {
            oid: ig("DM"),
            patch: ItemGroupPatch::rename("DM2"),
        },
    );
    let mdv = mdv(&store);

    assert!(!mdv.item_groups.contains_key(&ig("DM")));
    assert_eq!(mdv.item_groups[&ig("DM2")].name, "DM2");
    assert_eq!(mdv.order.item_group_order, vec![ig("DM2"), ig("AE")]);
    assert!(mdv.item_defs[&it("STUDYID")].sources.item_groups.contains(&ig("DM2")));
    assert_eq!(
        mdv.comments[&CommentOid::from("COM.DM")].sources.item_groups,
        vec![ig("DM2")]
    );
    assert!(
        mdv.methods[&MethodOid::from("MT.AGE")]
            .sources
            .item_groups
            .contains_key(&ig("DM2"))
    );
    assert!(check_integrity(mdv).is_empty());
}

#[test]
fn rename_to_the_same_name_changes_nothing() {
    let mut store = pilot_study();
    let before = store.document().clone();
    let outcome = apply(
        &mut store,
        Action::UpdateItemGroup {
            oid: ig("DM"),
            patch: ItemGroupPatch::rename("DM"),
        },
    );
    assert_eq!(outcome, DispatchOutcome::Unchanged);
    assert_eq!(*store.document(), before);
}

#[test]
fn code_list_rename_follows_into_item_defs() {
    let mut store = pilot_study();
    apply(
        &mut store,
        Action::UpdateCodeList {
            oid: cl("SEX"),
            patch: CodeListPatch::rename("SEXN"),
        },
    );
    let mdv = mdv(&store);
    assert_eq!(mdv.item_defs[&it("DM.SEX")].code_list_oid, Some(cl("SEXN")));
    assert_eq!(mdv.code_lists[&cl("SEXN")].sources.item_defs, vec![it("DM.SEX")]);
}

#[test]
fn insert_then_delete_restores_the_dataset() {
    let mut store = pilot_study();
    let before = mdv(&store).clone();

    let mut action = add_variable("DM", "DM.RACE", None);
    if let Action::AddVariable { position, .. } = &mut action {
        *position = Some(1);
    }
    apply(&mut store, action);
    assert_eq!(mdv(&store).item_groups[&ig("DM")].refs.item_ref_order[1], ir("DM.RACE"));

    apply_intent(
        &mut store,
        Intent::DeleteVariables {
            container: ItemRefContainer::ItemGroup(ig("DM")),
            item_ref_oids: vec![ir("DM.RACE")],
        },
    );
    let after = mdv(&store);
    assert_eq!(after.item_groups, before.item_groups);
    assert_eq!(after.item_defs, before.item_defs);
}

#[test]
fn switching_code_list_moves_the_source() {
    let mut store = pilot_study();
    apply(
        &mut store,
        Action::UpdateItemDef {
            oid: it("DM.SEX"),
            patch: ItemDefPatch {
                code_list_oid: Some(Some(cl("AESEV"))),
                ..ItemDefPatch::default()
            },
        },
    );
    let mdv = mdv(&store);
    assert!(mdv.code_lists[&cl("SEX")].sources.item_defs.is_empty());
    assert!(mdv.code_lists[&cl("AESEV")].sources.item_defs.contains(&it("DM.SEX")));
}

#[test]
fn decoded_and_enumerated_lists_link_both_ways() {
    let mut store = pilot_study();
    apply(
        &mut store,
        Action::AddCodeList {
            code_list: CodeList::new(cl("SEXE"), "SEXE", CodeListType::Enumerated),
            position: None,
        },
    );
    apply(
        &mut store,
        Action::LinkCodeLists {
            code_list_oid: cl("SEX"),
            linked_code_list_oid: Some(cl("SEXE")),
        },
    );
    let mdv = mdv(&store);
    assert_eq!(mdv.code_lists[&cl("SEX")].linked_code_list_oid, Some(cl("SEXE")));
    assert_eq!(mdv.code_lists[&cl("SEXE")].linked_code_list_oid, Some(cl("SEX")));

    let error = store
        .dispatch(&Action::LinkCodeLists {
            code_list_oid: cl("SEX"),
            linked_code_list_oid: Some(cl("AESEV")),
        })
        .unwrap_err();
    assert!(matches!(error, CoreError::InvalidAction(_)));
}

#[test]
fn coded_value_order_must_be_a_permutation() {
    let mut store = pilot_study();
    let past = store.history().past_len();
    let error = store
        .dispatch(&Action::UpdateCodedValueOrder {
            code_list_oid: cl("SEX"),
            order: vec![CodeListItemOid::from("CL.SEX.2")],
        })
        .unwrap_err();
    assert!(matches!(error, CoreError::NotAPermutation { .. }));
    assert_eq!(store.history().past_len(), past);

    apply(
        &mut store,
        Action::UpdateCodedValueOrder {
            code_list_oid: cl("SEX"),
            order: vec![CodeListItemOid::from("CL.SEX.2"), CodeListItemOid::from("CL.SEX.1")],
        },
    );
    assert_eq!(mdv(&store).code_lists[&cl("SEX")].coded_values(), ["F", "M"]);
}

#[test]
fn deleting_a_leaf_strips_document_references() {
    let mut store = pilot_study();
    apply(
        &mut store,
        Action::DeleteLeafs {
            leaf_ids: vec![LeafOid::from("LF.ACRF")],
        },
    );
    let mdv = mdv(&store);
    assert!(mdv.leafs.is_empty());
    assert!(mdv.comments[&CommentOid::from("COM.DM")].documents.is_empty());
}

#[test]
fn missing_reference_is_rejected() {
    let mut store = pilot_study();
    let error = store
        .dispatch(&Action::AddVariable {
            item_group_oid: ig("DM"),
            item_ref: ItemRef::new(ir("DM.XX"), it("XX")),
            item_def: None,
            position: None,
        })
        .unwrap_err();
    assert!(matches!(error, CoreError::MissingReference { .. }));
}

#[test]
fn analysis_results_round_trip_through_disable() {
    let mut store = store(Model::Adam);
    apply(&mut store, add_group("ADSL"));
    apply(&mut store, add_variable("ADSL", "ADSL.SAFFL", None));
    apply(&mut store, Action::EnableArm);
    apply(
        &mut store,
        Action::AddResultDisplay {
            result_display: ResultDisplay::new(ResultDisplayOid::from("RD.14.1"), "Table 14.1"),
            position: None,
        },
    );
    apply(
        &mut store,
        Action::AddAnalysisResult {
            result_display_oid: ResultDisplayOid::from("RD.14.1"),
            analysis_result: AnalysisResult::new(AnalysisResultOid::from("AR.14.1.1"), "Demographics"),
            position: None,
        },
    );
    apply(
        &mut store,
        Action::UpdateAnalysisDataset {
            analysis_result_oid: AnalysisResultOid::from("AR.14.1.1"),
            dataset: AnalysisDataset::new(ig("ADSL")).with_variables(vec![it("ADSL.SAFFL")]),
            where_clause: Some(WhereClause::new(
                WhereClauseOid::from("WC.SAFFL"),
                vec![RangeCheck::new(it("ADSL.SAFFL"), Comparator::Eq, vec!["Y".to_string()])],
            )),
        },
    );
    {
        let mdv = mdv(&store);
        let where_clause = &mdv.where_clauses[&WhereClauseOid::from("WC.SAFFL")];
        assert_eq!(
            where_clause.sources.analysis_results[&AnalysisResultOid::from("AR.14.1.1")],
            vec![ig("ADSL")]
        );
        assert!(check_integrity(mdv).is_empty());
    }

    apply_intent(&mut store, Intent::DisableArm);
    let mdv = mdv(&store);
    assert!(mdv.analysis_result_displays.is_none());
    assert!(mdv.where_clauses.is_empty());
    assert!(mdv.item_groups.contains_key(&ig("ADSL")));
}

#[test]
fn leaving_adam_requires_arm_to_be_disabled() {
    let mut store = store(Model::Adam);
    apply(&mut store, Action::EnableArm);
    let error = store
        .dispatch(&Action::UpdateModel { model: Model::Sdtm })
        .unwrap_err();
    assert!(matches!(error, CoreError::InvalidAction(_)));
}
