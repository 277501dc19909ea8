//! Integration tests for the document model: construction, normalization
//! and the JSON shape of a small define.

use std::sync::Arc;

use define_model::{
    CodeList, CodeListItem, CodeListItemOid, CodeListOid, CodeListType, DataType, DefineDocument,
    DefineId, Describable, GlobalVariables, ItemDef, ItemDefOid, ItemGroup, ItemGroupOid, ItemRef,
    ItemRefOid, MetaDataVersion, MetaDataVersionOid, Model, Odm, OdmAttributes, Study, StudyOid,
    get_oid,
};

fn small_define() -> DefineDocument {
    let mut mdv = MetaDataVersion::new(MetaDataVersionOid::from("MDV.1"), "Study CDISC01", Model::Sdtm);

    let mut sex = CodeList::new(CodeListOid::from("CL.SEX"), "Sex", CodeListType::Decoded);
    sex.insert_item(CodeListItemOid::from("CI.M"), CodeListItem::new("M", "Male"), None)
        .expect("insert M");
    sex.insert_item(CodeListItemOid::from("CI.F"), CodeListItem::new("F", "Female"), None)
        .expect("insert F");
    sex.sources.item_defs.push(ItemDefOid::from("IT.DM.SEX"));

    let mut item = ItemDef::new(ItemDefOid::from("IT.DM.SEX"), "SEX")
        .with_data_type(DataType::Text, Some(1))
        .with_code_list(sex.oid.clone())
        .with_description("Sex");
    item.sources.item_groups.push(ItemGroupOid::from("IG.DM"));

    let mut dm = ItemGroup::new(ItemGroupOid::from("IG.DM"), "DM")
        .with_domain("DM")
        .with_description("Demographics");
    dm.refs
        .insert(
            ItemRef::new(ItemRefOid::from("IR.DM.SEX"), item.oid.clone()).with_mandatory(true),
            None,
        )
        .expect("insert ref");

    Arc::make_mut(&mut mdv.code_lists).insert(sex.oid.clone(), sex);
    Arc::make_mut(&mut mdv.item_defs).insert(item.oid.clone(), item);
    Arc::make_mut(&mut mdv.item_groups).insert(dm.oid.clone(), dm);

    DefineDocument::new(Odm {
        define_id: DefineId::from("DEF.1"),
        attributes: OdmAttributes::default(),
        study: Study {
            oid: StudyOid::from("ST.CDISC01"),
            global_variables: GlobalVariables::default(),
            metadata_version: mdv.normalized(),
        },
    })
}

#[test]
fn normalization_fills_order_arrays() {
    let document = small_define();
    let mdv = document.metadata_version().expect("mdv");
    assert_eq!(mdv.order.item_group_order, vec![ItemGroupOid::from("IG.DM")]);
    assert_eq!(mdv.order.code_list_order, vec![CodeListOid::from("CL.SEX")]);
    assert_eq!(mdv.code_lists[&CodeListOid::from("CL.SEX")].coded_values(), vec!["M", "F"]);
}

#[test]
fn document_survives_json() {
    let document = small_define();
    let json = serde_json::to_string_pretty(&document).expect("serialize");
    let back: DefineDocument = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, document);
}

#[test]
fn loading_repairs_inconsistent_key_sequences() {
    let json = r#"{
        "oid": "IG.AE",
        "name": "AE",
        "item_refs": {
            "IR.1": {"oid": "IR.1", "item_oid": "IT.STUDYID", "key_sequence": 2},
            "IR.2": {"oid": "IR.2", "item_oid": "IT.AESEQ", "key_sequence": 7}
        },
        "item_ref_order": ["IR.2"]
    }"#;
    let group: ItemGroup = serde_json::from_str(json).expect("deserialize");
    let group = group.normalized();
    assert_eq!(
        group.refs.item_ref_order,
        vec![ItemRefOid::from("IR.2"), ItemRefOid::from("IR.1")]
    );
    assert_eq!(
        group.refs.key_order,
        vec![ItemRefOid::from("IR.1"), ItemRefOid::from("IR.2")]
    );
    assert_eq!(group.refs.item_refs[&ItemRefOid::from("IR.2")].key_sequence, Some(2));
}

#[test]
fn switching_code_list_type_converts_items() {
    let document = small_define();
    let mdv = document.metadata_version().expect("mdv");
    let sex = &mdv.code_lists[&CodeListOid::from("CL.SEX")];
    let patch = define_model::CodeListPatch {
        code_list_type: Some(CodeListType::Enumerated),
        ..Default::default()
    };
    let enumerated = sex.merged(&patch);
    assert!(enumerated.code_list_items.is_empty());
    assert_eq!(enumerated.enumerated_items.len(), 2);
    assert_eq!(enumerated.coded_values(), vec!["M", "F"]);
}

#[test]
fn generated_oids_do_not_collide_with_loaded_ones() {
    let document = small_define();
    let mdv = document.metadata_version().expect("mdv");
    let oid: ItemGroupOid = get_oid(None, mdv.item_groups.keys()).expect("oid");
    assert!(!mdv.item_groups.contains_key(&oid));
    assert!(get_oid::<ItemGroupOid>(Some("DM"), mdv.item_groups.keys()).is_err());
}

#[test]
fn describable_prefers_requested_language() {
    let mut group = ItemGroup::new(ItemGroupOid::from("IG.LB"), "LB");
    group.set_description(None, "Laboratory");
    group.set_description(Some("de"), "Labor");
    assert_eq!(group.description(Some("de")), Some("Labor"));
    assert_eq!(group.description(Some("fr")), Some("Laboratory"));
}
