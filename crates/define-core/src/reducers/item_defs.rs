use define_model::text::strip_documents;
use define_model::{
    CommentOwner, ItemDef, ItemDefOid, ItemDefSources, ItemRefContainer, LeafOid, Table,
    order,
};

use super::{clear_if_removed, edit_each, edit_one, insert_new, remove_keys};
use crate::action::Action;
use crate::cascade::DeletionClosure;
use crate::context::ReduceContext;
use crate::error::Result;

pub fn reduce(
    state: &Table<ItemDefOid, ItemDef>,
    action: &Action,
    context: &ReduceContext,
) -> Result<Table<ItemDefOid, ItemDef>> {
    let mut next = state.clone();
    if let Some(closure) = action.closure() {
        apply_closure(&mut next, closure);
        return Ok(next);
    }
    match action {
        Action::AddVariable {
            item_group_oid,
            item_ref,
            item_def,
            ..
        } => match item_def {
            Some(item_def) => {
                let mut item_def = item_def.clone().normalized();
                item_def.parent_item_def_oid = None;
                item_def.sources = ItemDefSources {
                    item_groups: vec![item_group_oid.clone()],
                    value_lists: Vec::new(),
                };
                insert_new(&mut next, item_def.oid.clone(), item_def);
            }
            None => {
                edit_one(&mut next, &item_ref.item_oid, |item_def| {
                    order::push_unique(&mut item_def.sources.item_groups, item_group_oid.clone())
                });
            }
        },
        Action::AddValueLevel {
            parent_item_oid,
            value_list_oid,
            item_ref,
            item_def,
            ..
        } => {
            if state
                .get(parent_item_oid)
                .is_some_and(|parent| parent.value_list_oid.is_none())
            {
                edit_one(&mut next, parent_item_oid, |parent| {
                    parent.value_list_oid = Some(value_list_oid.clone());
                });
            }
            match item_def {
                Some(item_def) => {
                    let mut item_def = item_def.clone().normalized();
                    item_def.parent_item_def_oid = Some(parent_item_oid.clone());
                    item_def.sources = ItemDefSources {
                        item_groups: Vec::new(),
                        value_lists: vec![value_list_oid.clone()],
                    };
                    insert_new(&mut next, item_def.oid.clone(), item_def);
                }
                None => {
                    edit_one(&mut next, &item_ref.item_oid, |item_def| {
                        order::push_unique(&mut item_def.sources.value_lists, value_list_oid.clone())
                    });
                }
            }
        }
        Action::UpdateItemDef { oid, patch } => {
            if let Some(item_def) = state.get(oid) {
                let merged = item_def.merged(patch);
                edit_one(&mut next, oid, |item_def| *item_def = merged);
            }
        }
        Action::UpdateItemGroup { .. } => {
            if let Some(rename) = &context.item_group_rename {
                edit_each(&mut next, |item_def| {
                    order::rename_in(&mut item_def.sources.item_groups, &rename.old, &rename.new)
                });
            }
        }
        Action::UpdateCodeList { .. } => {
            if let Some(rename) = &context.code_list_rename {
                edit_each(&mut next, |item_def| {
                    if item_def.code_list_oid.as_ref() == Some(&rename.old) {
                        item_def.code_list_oid = Some(rename.new.clone());
                        return true;
                    }
                    false
                });
            }
        }
        Action::AddComment {
            owner: CommentOwner::ItemDef(oid),
            comment,
        } => {
            edit_one(&mut next, oid, |item_def| item_def.comment_oid = Some(comment.oid.clone()));
        }
        Action::LinkComment {
            owner: CommentOwner::ItemDef(oid),
            comment_oid,
        } => {
            edit_one(&mut next, oid, |item_def| item_def.comment_oid = Some(comment_oid.clone()));
        }
        Action::DeleteComment {
            owner: CommentOwner::ItemDef(oid),
            comment_oid,
        } => {
            if state
                .get(oid)
                .is_some_and(|item_def| item_def.comment_oid.as_ref() == Some(comment_oid))
            {
                edit_one(&mut next, oid, |item_def| item_def.comment_oid = None);
            }
        }
        Action::DeleteLeafs { leaf_ids } => {
            let removed: std::collections::BTreeSet<LeafOid> = leaf_ids.iter().cloned().collect();
            edit_each(&mut next, |item_def| {
                let mut changed = false;
                for origin in &mut item_def.origins {
                    changed |= strip_documents(&mut origin.documents, &removed);
                }
                changed
            });
        }
        _ => {}
    }
    Ok(next)
}

fn apply_closure(table: &mut Table<ItemDefOid, ItemDef>, closure: &DeletionClosure) {
    remove_keys(table, &closure.item_def_oids);
    edit_each(table, |item_def| {
        let oid = item_def.oid.clone();
        let sources = &mut item_def.sources;
        let before = sources.count();
        sources.item_groups.retain(|group| {
            !closure.removes_usage(&ItemRefContainer::ItemGroup(group.clone()), &oid)
        });
        sources.value_lists.retain(|list| {
            !closure.removes_usage(&ItemRefContainer::ValueList(list.clone()), &oid)
        });
        let mut changed = before != sources.count();
        changed |= clear_if_removed(&mut item_def.code_list_oid, &closure.code_list_oids);
        changed |= clear_if_removed(&mut item_def.value_list_oid, &closure.value_list_oids);
        changed |= clear_if_removed(&mut item_def.parent_item_def_oid, &closure.item_def_oids);
        changed |= clear_if_removed(&mut item_def.comment_oid, &closure.comment_oids);
        changed
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use define_model::{ItemGroupOid, ItemRef, ItemRefOid};
    use std::sync::Arc;

    #[test]
    fn reused_item_def_gains_a_source() {
        let mut item_def = ItemDef::new(ItemDefOid::from("IT.STUDYID"), "STUDYID");
        item_def.sources.item_groups.push(ItemGroupOid::from("IG.DM"));
        let state: Table<ItemDefOid, ItemDef> = Arc::new([(item_def.oid.clone(), item_def)].into());
        let action = Action::AddVariable {
            item_group_oid: ItemGroupOid::from("IG.AE"),
            item_ref: ItemRef::new(ItemRefOid::from("IR.AE.STUDYID"), ItemDefOid::from("IT.STUDYID")),
            item_def: None,
            position: None,
        };
        let next = reduce(&state, &action, &ReduceContext::default()).expect("reduce");
        assert_eq!(
            next[&ItemDefOid::from("IT.STUDYID")].sources.item_groups,
            vec![ItemGroupOid::from("IG.DM"), ItemGroupOid::from("IG.AE")]
        );
    }
}
