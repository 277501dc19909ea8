//! Random edit sequences never break structural integrity.

mod common;

use proptest::prelude::*;

use common::{add_code_list, add_group, add_variable, cl, empty_document, ig, it, share_variable};
use define_core::{Action, DefineStore, Intent, ScriptStep, StoreConfig, check_integrity};
use define_model::{
    AnalysisDataset, AnalysisResult, AnalysisResultOid, CodeListPatch, Comment, CommentOid,
    CommentOwner, Comparator, DefineDocument, ItemDef, ItemDefOid, ItemDefPatch, ItemGroupPatch,
    ItemRef, ItemRefContainer, ItemRefOid, MetaDataVersion, Method, MethodOid, MethodOwner, Model,
    RangeCheck, ResultDisplay, ResultDisplayOid, ValueListOid, WhereClause, WhereClauseOid,
};

const GROUPS: [&str; 3] = ["AE", "CM", "DM"];
const GROUP_NAMES: [&str; 4] = ["AE", "CM", "DM", "QS"];
const ITEMS: [&str; 4] = ["STUDYID", "USUBJID", "SEQ", "TERM"];
const CODE_LISTS: [&str; 2] = ["NY", "SEX"];
const CODE_LIST_NAMES: [&str; 3] = ["NY", "SEX", "YN"];
const VALUES: [&str; 2] = ["A", "B"];

/// Entity positions are indexes into the current document (order lists or
/// table keys), so the same op keeps meaning something after a rename.
#[derive(Debug, Clone)]
enum Op {
    AddGroup(usize),
    AddVariable(usize, usize),
    InsertVariable(usize, usize, usize),
    ShareVariable(usize, usize),
    AddCodeList(usize),
    SetCodeList(usize, Option<usize>),
    RenameGroup(usize, usize),
    RenameCodeList(usize, usize),
    RotateGroups(usize),
    RotateVariables(usize, usize),
    AddValueLevel(usize, usize),
    EditWhereClause(usize, usize),
    AddComment(usize, usize, usize),
    LinkComment(usize, usize, usize),
    UnlinkComment(usize, usize),
    AddMethod(usize, usize, usize),
    LinkMethod(usize, usize, usize),
    UnlinkMethod(usize, usize),
    EnableArm,
    AddResultDisplay(usize),
    AddAnalysisResult(usize, usize),
    SetAnalysisDataset(usize, usize),
    DeleteGroup(usize),
    DeleteVariable(usize, usize),
    DeleteValueLevel(usize, usize),
    DeleteCodeList(usize),
    DeleteResultDisplay(usize),
    DeleteAnalysisResult(usize),
    DeleteAnalysisDataset(usize, usize),
    DisableArm,
    Undo,
    Redo,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..GROUPS.len()).prop_map(Op::AddGroup),
        (0..GROUPS.len(), 0..ITEMS.len()).prop_map(|(g, i)| Op::AddVariable(g, i)),
        (0..GROUPS.len(), 0..ITEMS.len(), 0..4usize)
            .prop_map(|(g, i, p)| Op::InsertVariable(g, i, p)),
        (0..GROUPS.len(), 0..ITEMS.len()).prop_map(|(g, i)| Op::ShareVariable(g, i)),
        (0..CODE_LISTS.len()).prop_map(Op::AddCodeList),
        (0..ITEMS.len(), proptest::option::of(0..CODE_LISTS.len()))
            .prop_map(|(i, c)| Op::SetCodeList(i, c)),
        (0..3usize, 0..GROUP_NAMES.len()).prop_map(|(g, n)| Op::RenameGroup(g, n)),
        (0..2usize, 0..CODE_LIST_NAMES.len()).prop_map(|(c, n)| Op::RenameCodeList(c, n)),
        (1..3usize).prop_map(Op::RotateGroups),
        (0..GROUPS.len(), 1..3usize).prop_map(|(g, n)| Op::RotateVariables(g, n)),
        (0..4usize, 0..VALUES.len()).prop_map(|(i, v)| Op::AddValueLevel(i, v)),
        (0..3usize, 0..VALUES.len()).prop_map(|(w, v)| Op::EditWhereClause(w, v)),
        (0..4usize, 0..3usize, 0..3usize).prop_map(|(k, o, c)| Op::AddComment(k, o, c)),
        (0..4usize, 0..3usize, 0..3usize).prop_map(|(k, o, c)| Op::LinkComment(k, o, c)),
        (0..4usize, 0..3usize).prop_map(|(k, o)| Op::UnlinkComment(k, o)),
        (0..3usize, 0..4usize, 0..2usize).prop_map(|(g, r, m)| Op::AddMethod(g, r, m)),
        (0..3usize, 0..4usize, 0..2usize).prop_map(|(g, r, m)| Op::LinkMethod(g, r, m)),
        (0..3usize, 0..4usize).prop_map(|(g, r)| Op::UnlinkMethod(g, r)),
        Just(Op::EnableArm),
        (0..2usize).prop_map(Op::AddResultDisplay),
        (0..2usize, 0..3usize).prop_map(|(d, r)| Op::AddAnalysisResult(d, r)),
        (0..3usize, 0..3usize).prop_map(|(r, g)| Op::SetAnalysisDataset(r, g)),
        (0..GROUPS.len()).prop_map(Op::DeleteGroup),
        (0..GROUPS.len(), 0..4usize).prop_map(|(g, n)| Op::DeleteVariable(g, n)),
        (0..3usize, 0..2usize).prop_map(|(l, n)| Op::DeleteValueLevel(l, n)),
        (0..CODE_LISTS.len()).prop_map(Op::DeleteCodeList),
        (0..2usize).prop_map(Op::DeleteResultDisplay),
        (0..3usize).prop_map(Op::DeleteAnalysisResult),
        (0..3usize, 0..2usize).prop_map(|(r, d)| Op::DeleteAnalysisDataset(r, d)),
        Just(Op::DisableArm),
        Just(Op::Undo),
        Just(Op::Redo),
    ]
}

/// Owner kinds: dataset, item def, code list, where clause.
fn comment_owner(mdv: &MetaDataVersion, kind: usize, position: usize) -> Option<CommentOwner> {
    match kind {
        0 => mdv
            .order
            .item_group_order
            .get(position)
            .cloned()
            .map(CommentOwner::ItemGroup),
        1 => mdv.item_defs.keys().nth(position).cloned().map(CommentOwner::ItemDef),
        2 => mdv
            .order
            .code_list_order
            .get(position)
            .cloned()
            .map(CommentOwner::CodeList),
        _ => mdv
            .where_clauses
            .keys()
            .nth(position)
            .cloned()
            .map(CommentOwner::WhereClause),
    }
}

fn current_comment(mdv: &MetaDataVersion, owner: &CommentOwner) -> Option<CommentOid> {
    match owner {
        CommentOwner::ItemGroup(oid) => mdv.item_groups.get(oid)?.comment_oid.clone(),
        CommentOwner::ItemDef(oid) => mdv.item_defs.get(oid)?.comment_oid.clone(),
        CommentOwner::CodeList(oid) => mdv.code_lists.get(oid)?.comment_oid.clone(),
        CommentOwner::WhereClause(oid) => mdv.where_clauses.get(oid)?.comment_oid.clone(),
        _ => None,
    }
}

fn method_owner(mdv: &MetaDataVersion, group: usize, position: usize) -> Option<MethodOwner> {
    let oid = mdv.order.item_group_order.get(group)?;
    let item_ref_oid = mdv.item_groups.get(oid)?.refs.item_ref_order.get(position)?;
    Some(MethodOwner::new(
        ItemRefContainer::ItemGroup(oid.clone()),
        item_ref_oid.clone(),
    ))
}

fn nth_result(mdv: &MetaDataVersion, position: usize) -> Option<&AnalysisResult> {
    mdv.analysis_result_displays
        .as_deref()?
        .analysis_results
        .values()
        .nth(position)
}

/// Items are owned by the first group that adds them (`IT.<item>`); other
/// groups share them. Value-level items hang off dataset-level item defs and
/// their where clauses test the parent.
fn steps(store: &DefineStore, op: &Op) -> Vec<ScriptStep> {
    let Some(mdv) = store.metadata_version() else {
        return Vec::new();
    };
    let actions = match op {
        Op::AddGroup(g) => vec![add_group(GROUPS[*g])],
        Op::AddVariable(g, i) => vec![add_variable(GROUPS[*g], ITEMS[*i], None)],
        Op::InsertVariable(g, i, p) => {
            let Action::AddVariable {
                item_group_oid,
                item_ref,
                item_def,
                ..
            } = add_variable(GROUPS[*g], ITEMS[*i], None)
            else {
                return Vec::new();
            };
            vec![Action::AddVariable {
                item_group_oid,
                item_ref,
                item_def,
                position: Some(*p),
            }]
        }
        Op::ShareVariable(g, i) => vec![share_variable(GROUPS[*g], ITEMS[*i])],
        Op::AddCodeList(c) => add_code_list(CODE_LISTS[*c], &[("Y", "Yes"), ("N", "No")]),
        Op::SetCodeList(i, c) => vec![Action::UpdateItemDef {
            oid: it(ITEMS[*i]),
            patch: ItemDefPatch {
                code_list_oid: Some(c.map(|c| cl(CODE_LISTS[c]))),
                ..ItemDefPatch::default()
            },
        }],
        Op::RenameGroup(g, n) => {
            let Some(oid) = mdv.order.item_group_order.get(*g) else {
                return Vec::new();
            };
            vec![Action::UpdateItemGroup {
                oid: oid.clone(),
                patch: ItemGroupPatch::rename(GROUP_NAMES[*n]),
            }]
        }
        Op::RenameCodeList(c, n) => {
            let Some(oid) = mdv.order.code_list_order.get(*c) else {
                return Vec::new();
            };
            vec![Action::UpdateCodeList {
                oid: oid.clone(),
                patch: CodeListPatch::rename(CODE_LIST_NAMES[*n]),
            }]
        }
        Op::RotateGroups(n) => {
            let mut order = mdv.order.item_group_order.clone();
            if !order.is_empty() {
                let len = order.len();
                order.rotate_left(n % len);
            }
            vec![Action::UpdateItemGroupOrder { order }]
        }
        Op::RotateVariables(g, n) => {
            let Some(group) = mdv.item_groups.get(&ig(GROUPS[*g])) else {
                return Vec::new();
            };
            let mut order = group.refs.item_ref_order.clone();
            if !order.is_empty() {
                let len = order.len();
                order.rotate_left(n % len);
            }
            vec![Action::UpdateItemRefOrder {
                container: ItemRefContainer::ItemGroup(group.oid.clone()),
                order,
            }]
        }
        Op::AddValueLevel(i, v) => {
            let Some(parent) = mdv
                .item_defs
                .values()
                .filter(|item_def| !item_def.sources.item_groups.is_empty())
                .nth(*i)
            else {
                return Vec::new();
            };
            let value = VALUES[*v];
            let value_list_oid = parent
                .value_list_oid
                .clone()
                .unwrap_or_else(|| ValueListOid::new(format!("VL.{}", parent.oid)));
            let where_clause_oid = WhereClauseOid::new(format!("WC.{}.{value}", parent.oid));
            let item_oid = ItemDefOid::new(format!("{}.{value}", parent.oid));
            vec![Action::AddValueLevel {
                parent_item_oid: parent.oid.clone(),
                value_list_oid,
                item_ref: ItemRef::new(
                    ItemRefOid::new(format!("IR.{}.{value}", parent.oid)),
                    item_oid.clone(),
                )
                .with_where_clause(where_clause_oid.clone()),
                item_def: Some(ItemDef::new(item_oid, parent.name.clone())),
                where_clause: Some(WhereClause::new(
                    where_clause_oid,
                    vec![RangeCheck::new(
                        parent.oid.clone(),
                        Comparator::Eq,
                        vec![value.to_string()],
                    )],
                )),
                position: None,
            }]
        }
        Op::EditWhereClause(w, v) => {
            let Some(where_clause) = mdv.where_clauses.values().nth(*w) else {
                return Vec::new();
            };
            let Some(tested) = where_clause.range_checks.first() else {
                return Vec::new();
            };
            vec![Action::UpdateWhereClause {
                oid: where_clause.oid.clone(),
                range_checks: vec![RangeCheck::new(
                    tested.item_oid.clone(),
                    Comparator::In,
                    VALUES[..=*v].iter().map(|value| value.to_string()).collect(),
                )],
            }]
        }
        Op::AddComment(kind, o, c) => {
            let Some(owner) = comment_owner(mdv, *kind, *o) else {
                return Vec::new();
            };
            vec![Action::AddComment {
                owner,
                comment: Comment::new(CommentOid::new(format!("COM.{c}")), "Comment"),
            }]
        }
        Op::LinkComment(kind, o, c) => {
            let (Some(owner), Some(comment_oid)) =
                (comment_owner(mdv, *kind, *o), mdv.comments.keys().nth(*c))
            else {
                return Vec::new();
            };
            vec![Action::LinkComment {
                owner,
                comment_oid: comment_oid.clone(),
            }]
        }
        Op::UnlinkComment(kind, o) => {
            let Some(owner) = comment_owner(mdv, *kind, *o) else {
                return Vec::new();
            };
            let Some(comment_oid) = current_comment(mdv, &owner) else {
                return Vec::new();
            };
            vec![Action::DeleteComment { owner, comment_oid }]
        }
        Op::AddMethod(g, r, m) => {
            let Some(owner) = method_owner(mdv, *g, *r) else {
                return Vec::new();
            };
            vec![Action::AddMethod {
                owner,
                method: Method::new(MethodOid::new(format!("MT.{m}")), "Derivation", "Derived"),
            }]
        }
        Op::LinkMethod(g, r, m) => {
            let (Some(owner), Some(method_oid)) =
                (method_owner(mdv, *g, *r), mdv.methods.keys().nth(*m))
            else {
                return Vec::new();
            };
            vec![Action::LinkMethod {
                owner,
                method_oid: method_oid.clone(),
            }]
        }
        Op::UnlinkMethod(g, r) => {
            let Some(owner) = method_owner(mdv, *g, *r) else {
                return Vec::new();
            };
            let Some(method_oid) = mdv
                .methods
                .values()
                .find(|method| method.sources.contains(&owner))
                .map(|method| method.oid.clone())
            else {
                return Vec::new();
            };
            vec![Action::DeleteMethod { owner, method_oid }]
        }
        Op::EnableArm => vec![Action::EnableArm],
        Op::AddResultDisplay(d) => vec![Action::AddResultDisplay {
            result_display: ResultDisplay::new(
                ResultDisplayOid::new(format!("RD.{d}")),
                format!("Table {d}"),
            ),
            position: None,
        }],
        Op::AddAnalysisResult(d, r) => {
            let Some(display_oid) = mdv
                .analysis_result_displays
                .as_deref()
                .and_then(|arm| arm.result_displays.keys().nth(*d))
            else {
                return Vec::new();
            };
            vec![Action::AddAnalysisResult {
                result_display_oid: display_oid.clone(),
                analysis_result: AnalysisResult::new(
                    AnalysisResultOid::new(format!("AR.{r}")),
                    "Analysis",
                ),
                position: None,
            }]
        }
        Op::SetAnalysisDataset(r, g) => {
            let (Some(result), Some(group_oid)) =
                (nth_result(mdv, *r), mdv.order.item_group_order.get(*g))
            else {
                return Vec::new();
            };
            let variables = mdv
                .item_groups
                .get(group_oid)
                .and_then(|group| group.refs.ordered().next())
                .map(|item_ref| vec![item_ref.item_oid.clone()])
                .unwrap_or_default();
            vec![Action::UpdateAnalysisDataset {
                analysis_result_oid: result.oid.clone(),
                dataset: AnalysisDataset::new(group_oid.clone()).with_variables(variables),
                where_clause: None,
            }]
        }
        Op::DeleteGroup(g) => {
            return vec![ScriptStep::Intent(Intent::DeleteItemGroups {
                item_group_oids: vec![ig(GROUPS[*g])],
            })];
        }
        Op::DeleteVariable(g, n) => {
            let Some(group) = mdv.item_groups.get(&ig(GROUPS[*g])) else {
                return Vec::new();
            };
            let Some(item_ref_oid) = group.refs.item_ref_order.get(*n) else {
                return Vec::new();
            };
            return vec![ScriptStep::Intent(Intent::DeleteVariables {
                container: ItemRefContainer::ItemGroup(group.oid.clone()),
                item_ref_oids: vec![item_ref_oid.clone()],
            })];
        }
        Op::DeleteValueLevel(l, n) => {
            let Some(list) = mdv.value_lists.values().nth(*l) else {
                return Vec::new();
            };
            let Some(item_ref_oid) = list.refs.item_ref_order.get(*n) else {
                return Vec::new();
            };
            return vec![ScriptStep::Intent(Intent::DeleteVariables {
                container: ItemRefContainer::ValueList(list.oid.clone()),
                item_ref_oids: vec![item_ref_oid.clone()],
            })];
        }
        Op::DeleteCodeList(c) => {
            return vec![ScriptStep::Intent(Intent::DeleteCodeLists {
                code_list_oids: vec![cl(CODE_LISTS[*c])],
            })];
        }
        Op::DeleteResultDisplay(d) => {
            let Some(display_oid) = mdv
                .analysis_result_displays
                .as_deref()
                .and_then(|arm| arm.result_displays.keys().nth(*d))
            else {
                return Vec::new();
            };
            return vec![ScriptStep::Intent(Intent::DeleteResultDisplays {
                result_display_oids: vec![display_oid.clone()],
            })];
        }
        Op::DeleteAnalysisResult(r) => {
            let Some(result) = nth_result(mdv, *r) else {
                return Vec::new();
            };
            return vec![ScriptStep::Intent(Intent::DeleteAnalysisResults {
                analysis_result_oids: vec![result.oid.clone()],
            })];
        }
        Op::DeleteAnalysisDataset(r, d) => {
            let Some(result) = nth_result(mdv, *r) else {
                return Vec::new();
            };
            let Some(group_oid) = result.analysis_dataset_order.get(*d) else {
                return Vec::new();
            };
            return vec![ScriptStep::Intent(Intent::DeleteAnalysisDatasets {
                analysis_result_oid: result.oid.clone(),
                item_group_oids: vec![group_oid.clone()],
            })];
        }
        Op::DisableArm => return vec![ScriptStep::Intent(Intent::DisableArm)],
        Op::Undo => vec![Action::Undo],
        Op::Redo => vec![Action::Redo],
    };
    actions.into_iter().map(ScriptStep::Action).collect()
}

fn unverified_store(start: DefineDocument) -> DefineStore {
    DefineStore::new(
        start,
        StoreConfig {
            history_limit: None,
            verify_integrity: false,
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn random_edits_keep_integrity(ops in proptest::collection::vec(op(), 1..60)) {
        let mut store = unverified_store(empty_document(Model::Adam));
        for op in &ops {
            for step in steps(&store, op) {
                // Rejected steps leave the store untouched.
                let _ = store.dispatch_step(&step);
                let mdv = store.metadata_version().expect("open define");
                let issues = check_integrity(mdv);
                prop_assert!(issues.is_empty(), "after {:?}: {:?}", op, issues);
            }
        }
    }

    #[test]
    fn undo_everything_returns_to_the_start(ops in proptest::collection::vec(op(), 1..40)) {
        let start = empty_document(Model::Adam);
        let mut store = unverified_store(start.clone());
        for op in &ops {
            for step in steps(&store, op) {
                let _ = store.dispatch_step(&step);
            }
        }
        while store.can_undo() {
            store.dispatch(&Action::Undo).expect("undo");
        }
        prop_assert_eq!(store.document(), &start);
    }

    #[test]
    fn redo_replays_to_the_same_document(ops in proptest::collection::vec(op(), 1..40)) {
        let mut store = unverified_store(empty_document(Model::Adam));
        for op in &ops {
            for step in steps(&store, op) {
                let _ = store.dispatch_step(&step);
            }
        }
        let end = store.document().clone();
        while store.can_undo() {
            store.dispatch(&Action::Undo).expect("undo");
        }
        while store.can_redo() {
            store.dispatch(&Action::Redo).expect("redo");
        }
        prop_assert_eq!(store.document(), &end);
    }
}
