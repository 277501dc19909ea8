use std::collections::BTreeSet;

use define_model::{
    CodeList, CodeListOid, CodeListSources, CodeListType, CommentOwner, ItemDefOid, StandardOid,
    Table, order,
};

use super::{clear_if_removed, edit_each, edit_one, insert_new, rekey, remove_keys};
use crate::action::Action;
use crate::cascade::DeletionClosure;
use crate::context::ReduceContext;
use crate::error::Result;

/// Only a decoded and an enumerated list can be linked to each other.
fn linkable(left: CodeListType, right: CodeListType) -> bool {
    matches!(
        (left, right),
        (CodeListType::Decoded, CodeListType::Enumerated)
            | (CodeListType::Enumerated, CodeListType::Decoded)
    )
}

pub fn reduce(
    state: &Table<CodeListOid, CodeList>,
    action: &Action,
    context: &ReduceContext,
) -> Result<Table<CodeListOid, CodeList>> {
    let mut next = state.clone();
    if let Some(closure) = action.closure() {
        apply_closure(&mut next, closure);
        return Ok(next);
    }
    match action {
        Action::AddCodeList { code_list, .. } => {
            let mut code_list = code_list.clone().normalized();
            code_list.sources = CodeListSources::default();
            code_list.linked_code_list_oid = None;
            insert_new(&mut next, code_list.oid.clone(), code_list);
        }
        Action::UpdateCodeList { oid, patch } => {
            let Some(code_list) = state.get(oid) else {
                return Ok(next);
            };
            let mut merged = code_list.merged(patch);
            if let Some(partner_oid) = &code_list.linked_code_list_oid {
                let keeps_link = state
                    .get(partner_oid)
                    .is_some_and(|partner| linkable(merged.code_list_type, partner.code_list_type));
                if !keeps_link {
                    merged.linked_code_list_oid = None;
                    edit_one(&mut next, partner_oid, |partner| {
                        partner.linked_code_list_oid = None;
                    });
                }
            }
            edit_one(&mut next, oid, |code_list| *code_list = merged);
            if let Some(rename) = &context.code_list_rename {
                rekey(&mut next, &rename.old, &rename.new, |code_list| {
                    code_list.oid = rename.new.clone();
                });
                edit_each(&mut next, |code_list| {
                    if code_list.linked_code_list_oid.as_ref() == Some(&rename.old) {
                        code_list.linked_code_list_oid = Some(rename.new.clone());
                        return true;
                    }
                    false
                });
            }
        }
        Action::LinkCodeLists {
            code_list_oid,
            linked_code_list_oid,
        } => {
            let mut previous: Vec<CodeListOid> = Vec::new();
            for oid in std::iter::once(code_list_oid).chain(linked_code_list_oid.as_ref()) {
                if let Some(partner) = state.get(oid).and_then(|list| list.linked_code_list_oid.clone()) {
                    previous.push(partner);
                }
            }
            for partner in &previous {
                edit_one(&mut next, partner, |list| list.linked_code_list_oid = None);
            }
            edit_one(&mut next, code_list_oid, |list| {
                list.linked_code_list_oid = linked_code_list_oid.clone();
            });
            if let Some(linked) = linked_code_list_oid {
                edit_one(&mut next, linked, |list| {
                    list.linked_code_list_oid = Some(code_list_oid.clone());
                });
            }
        }
        Action::AddCodedValue {
            code_list_oid,
            item_oid,
            item,
            position,
        } => {
            if let Some(result) = edit_one(&mut next, code_list_oid, |list| {
                list.insert_item(item_oid.clone(), item.clone(), *position)
            }) {
                result?;
            }
        }
        Action::UpdateCodedValue {
            code_list_oid,
            item_oid,
            patch,
        } => {
            if state
                .get(code_list_oid)
                .is_some_and(|list| list.contains_item(item_oid))
            {
                edit_one(&mut next, code_list_oid, |list| list.update_item(item_oid, patch));
            }
        }
        Action::DeleteCodedValues {
            code_list_oid,
            item_oids,
        } => {
            if state
                .get(code_list_oid)
                .is_some_and(|list| item_oids.iter().any(|oid| list.contains_item(oid)))
            {
                edit_one(&mut next, code_list_oid, |list| {
                    for oid in item_oids {
                        list.remove_item(oid);
                    }
                });
            }
        }
        Action::UpdateCodedValueOrder {
            code_list_oid,
            order: item_order,
        } => {
            if let Some(list) = state.get(code_list_oid) {
                order::ensure_permutation("coded values", &list.item_order, item_order)?;
                edit_one(&mut next, code_list_oid, |list| list.item_order = item_order.clone());
            }
        }
        Action::AddVariable {
            item_def: Some(item_def),
            ..
        }
        | Action::AddValueLevel {
            item_def: Some(item_def),
            ..
        } => {
            if let Some(code_list_oid) = &item_def.code_list_oid {
                add_source(&mut next, code_list_oid, &item_def.oid);
            }
        }
        Action::UpdateItemDef { oid, patch } => {
            if let Some(target) = &patch.code_list_oid {
                edit_each(&mut next, |list| {
                    if target.as_ref() == Some(&list.oid) {
                        order::push_unique(&mut list.sources.item_defs, oid.clone())
                    } else {
                        order::remove_value(&mut list.sources.item_defs, oid)
                    }
                });
            }
        }
        Action::AddComment {
            owner: CommentOwner::CodeList(oid),
            comment,
        } => {
            edit_one(&mut next, oid, |list| list.comment_oid = Some(comment.oid.clone()));
        }
        Action::LinkComment {
            owner: CommentOwner::CodeList(oid),
            comment_oid,
        } => {
            edit_one(&mut next, oid, |list| list.comment_oid = Some(comment_oid.clone()));
        }
        Action::DeleteComment {
            owner: CommentOwner::CodeList(oid),
            comment_oid,
        } => {
            if state
                .get(oid)
                .is_some_and(|list| list.comment_oid.as_ref() == Some(comment_oid))
            {
                edit_one(&mut next, oid, |list| list.comment_oid = None);
            }
        }
        Action::DeleteStandards { standard_oids } => {
            let removed: BTreeSet<StandardOid> = standard_oids.iter().cloned().collect();
            edit_each(&mut next, |list| clear_if_removed(&mut list.standard_oid, &removed));
        }
        _ => {}
    }
    Ok(next)
}

fn add_source(table: &mut Table<CodeListOid, CodeList>, code_list_oid: &CodeListOid, item_oid: &ItemDefOid) {
    if table
        .get(code_list_oid)
        .is_some_and(|list| !list.sources.item_defs.contains(item_oid))
    {
        edit_one(table, code_list_oid, |list| {
            list.sources.item_defs.push(item_oid.clone());
        });
    }
}

fn apply_closure(table: &mut Table<CodeListOid, CodeList>, closure: &DeletionClosure) {
    remove_keys(table, &closure.code_list_oids);
    edit_each(table, |list| {
        let before = list.sources.item_defs.len();
        list.sources
            .item_defs
            .retain(|oid| !closure.item_def_oids.contains(oid));
        let mut changed = before != list.sources.item_defs.len();
        changed |= clear_if_removed(&mut list.linked_code_list_oid, &closure.code_list_oids);
        changed |= clear_if_removed(&mut list.comment_oid, &closure.comment_oids);
        changed
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use define_model::{CodeListPatch, DataType};
    use std::sync::Arc;

    fn linked_pair() -> Table<CodeListOid, CodeList> {
        let mut decoded = CodeList::new(CodeListOid::from("CL.SEX"), "SEX", CodeListType::Decoded);
        let mut enumerated =
            CodeList::new(CodeListOid::from("CL.SEXE"), "SEXE", CodeListType::Enumerated);
        decoded.linked_code_list_oid = Some(enumerated.oid.clone());
        enumerated.linked_code_list_oid = Some(decoded.oid.clone());
        Arc::new(
            [
                (decoded.oid.clone(), decoded),
                (enumerated.oid.clone(), enumerated),
            ]
            .into(),
        )
    }

    #[test]
    fn switching_to_external_unlinks_partner() {
        let state = linked_pair();
        let action = Action::UpdateCodeList {
            oid: CodeListOid::from("CL.SEX"),
            patch: CodeListPatch {
                code_list_type: Some(CodeListType::External),
                data_type: Some(DataType::Text),
                ..CodeListPatch::default()
            },
        };
        let next = reduce(&state, &action, &ReduceContext::default()).expect("reduce");
        assert_eq!(next[&CodeListOid::from("CL.SEX")].linked_code_list_oid, None);
        assert_eq!(next[&CodeListOid::from("CL.SEXE")].linked_code_list_oid, None);
    }

    #[test]
    fn unlink_clears_both_sides() {
        let state = linked_pair();
        let action = Action::LinkCodeLists {
            code_list_oid: CodeListOid::from("CL.SEXE"),
            linked_code_list_oid: None,
        };
        let next = reduce(&state, &action, &ReduceContext::default()).expect("reduce");
        assert!(next.values().all(|list| list.linked_code_list_oid.is_none()));
    }

    #[test]
    fn reordering_coded_values_requires_a_permutation() {
        let mut state = linked_pair();
        Arc::make_mut(&mut state)
            .get_mut(&CodeListOid::from("CL.SEX"))
            .expect("present")
            .insert_item(
                define_model::CodeListItemOid::from("CLI.M"),
                define_model::CodeListItem::new("M", "Male"),
                None,
            )
            .expect("insert");
        let action = Action::UpdateCodedValueOrder {
            code_list_oid: CodeListOid::from("CL.SEX"),
            order: Vec::new(),
        };
        let error = reduce(&state, &action, &ReduceContext::default()).unwrap_err();
        assert!(matches!(error, crate::CoreError::NotAPermutation { .. }));
    }
}
