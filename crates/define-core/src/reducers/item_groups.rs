use std::collections::BTreeSet;

use define_model::{
    CommentOwner, ItemGroup, ItemGroupOid, ItemRefContainer, MethodOid, MethodOwner, StandardOid,
    Table,
};

use super::{
    clear_if_removed, edit_each, edit_one, insert_new, rekey, remove_item_refs, remove_keys,
    set_item_ref_method,
};
use crate::action::Action;
use crate::cascade::DeletionClosure;
use crate::context::ReduceContext;
use crate::error::Result;

pub fn reduce(
    state: &Table<ItemGroupOid, ItemGroup>,
    action: &Action,
    context: &ReduceContext,
) -> Result<Table<ItemGroupOid, ItemGroup>> {
    let mut next = state.clone();
    if let Some(closure) = action.closure() {
        apply_closure(&mut next, closure);
        return Ok(next);
    }
    match action {
        Action::AddItemGroup { item_group, .. } => {
            insert_new(&mut next, item_group.oid.clone(), item_group.clone().normalized());
        }
        Action::UpdateItemGroup { oid, patch } => {
            let Some(group) = state.get(oid) else {
                return Ok(next);
            };
            let merged = group.merged(patch);
            edit_one(&mut next, oid, |group| *group = merged);
            if let Some(rename) = &context.item_group_rename {
                rekey(&mut next, &rename.old, &rename.new, |group| {
                    group.oid = rename.new.clone();
                });
            }
        }
        Action::AddVariable {
            item_group_oid,
            item_ref,
            position,
            ..
        } => {
            if let Some(result) = edit_one(&mut next, item_group_oid, |group| {
                group.refs.insert(item_ref.clone(), *position)
            }) {
                result?;
            }
        }
        Action::UpdateItemRef {
            container: ItemRefContainer::ItemGroup(oid),
            item_ref_oid,
            patch,
        } => {
            edit_one(&mut next, oid, |group| {
                if let Some(item_ref) = group.refs.item_refs.get_mut(item_ref_oid) {
                    *item_ref = item_ref.merged(patch);
                }
            });
        }
        Action::UpdateItemRefOrder {
            container: ItemRefContainer::ItemGroup(oid),
            order,
        } => {
            if let Some(result) = edit_one(&mut next, oid, |group| group.refs.set_order(order.clone())) {
                result?;
            }
        }
        Action::UpdateKeyOrder {
            container: ItemRefContainer::ItemGroup(oid),
            key_order,
        } => {
            if let Some(result) =
                edit_one(&mut next, oid, |group| group.refs.set_key_order(key_order.clone()))
            {
                result?;
            }
        }
        Action::AddComment {
            owner: CommentOwner::ItemGroup(oid),
            comment,
        } => {
            edit_one(&mut next, oid, |group| group.comment_oid = Some(comment.oid.clone()));
        }
        Action::LinkComment {
            owner: CommentOwner::ItemGroup(oid),
            comment_oid,
        } => {
            edit_one(&mut next, oid, |group| group.comment_oid = Some(comment_oid.clone()));
        }
        Action::DeleteComment {
            owner: CommentOwner::ItemGroup(oid),
            comment_oid,
        } => {
            if state
                .get(oid)
                .is_some_and(|group| group.comment_oid.as_ref() == Some(comment_oid))
            {
                edit_one(&mut next, oid, |group| group.comment_oid = None);
            }
        }
        Action::AddMethod { owner, method } => {
            set_method(&mut next, owner, Some(method.oid.clone()));
        }
        Action::LinkMethod { owner, method_oid } => {
            set_method(&mut next, owner, Some(method_oid.clone()));
        }
        Action::DeleteMethod { owner, method_oid } => {
            let current = match &owner.container {
                ItemRefContainer::ItemGroup(oid) => state
                    .get(oid)
                    .and_then(|group| group.refs.get(&owner.item_ref_oid))
                    .and_then(|item_ref| item_ref.method_oid.as_ref()),
                ItemRefContainer::ValueList(_) => None,
            };
            if current == Some(method_oid) {
                set_method(&mut next, owner, None);
            }
        }
        Action::DeleteStandards { standard_oids } => {
            let removed: BTreeSet<StandardOid> = standard_oids.iter().cloned().collect();
            edit_each(&mut next, |group| clear_if_removed(&mut group.standard_oid, &removed));
        }
        _ => {}
    }
    Ok(next)
}

fn set_method(
    table: &mut Table<ItemGroupOid, ItemGroup>,
    owner: &MethodOwner,
    method_oid: Option<MethodOid>,
) {
    let ItemRefContainer::ItemGroup(oid) = &owner.container else {
        return;
    };
    let changes = table
        .get(oid)
        .and_then(|group| group.refs.get(&owner.item_ref_oid))
        .is_some_and(|item_ref| item_ref.method_oid != method_oid);
    if changes {
        edit_one(table, oid, |group| {
            set_item_ref_method(&mut group.refs, &owner.item_ref_oid, method_oid)
        });
    }
}

fn apply_closure(table: &mut Table<ItemGroupOid, ItemGroup>, closure: &DeletionClosure) {
    remove_keys(table, &closure.item_group_oids);
    edit_each(table, |group| {
        let container = ItemRefContainer::ItemGroup(group.oid.clone());
        let mut changed = remove_item_refs(&mut group.refs, &closure.item_refs_of(&container));
        changed |= clear_if_removed(&mut group.comment_oid, &closure.comment_oids);
        for item_ref in group.refs.item_refs.values_mut() {
            changed |= clear_if_removed(&mut item_ref.method_oid, &closure.method_oids);
        }
        changed
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use define_model::{ItemDefOid, ItemGroupPatch, ItemRef, ItemRefOid};
    use std::sync::Arc;

    use crate::context::Rename;

    fn table() -> Table<ItemGroupOid, ItemGroup> {
        let mut group = ItemGroup::new(ItemGroupOid::from("IG.AE"), "AE");
        group
            .refs
            .insert(
                ItemRef::new(ItemRefOid::from("IR.AE.AETERM"), ItemDefOid::from("IT.AE.AETERM")),
                None,
            )
            .expect("insert");
        Arc::new([(group.oid.clone(), group)].into())
    }

    #[test]
    fn unrelated_action_keeps_table_shared() {
        let state = table();
        let next = reduce(&state, &Action::EnableArm, &ReduceContext::default()).expect("reduce");
        assert!(Arc::ptr_eq(&state, &next));
    }

    #[test]
    fn rename_moves_key_and_oid() {
        let state = table();
        let context = ReduceContext {
            item_group_rename: Some(Rename {
                old: ItemGroupOid::from("IG.AE"),
                new: ItemGroupOid::from("IG.AE2"),
            }),
            ..ReduceContext::default()
        };
        let action = Action::UpdateItemGroup {
            oid: ItemGroupOid::from("IG.AE"),
            patch: ItemGroupPatch::rename("AE2"),
        };
        let next = reduce(&state, &action, &context).expect("reduce");
        let group = &next[&ItemGroupOid::from("IG.AE2")];
        assert_eq!(group.oid, ItemGroupOid::from("IG.AE2"));
        assert_eq!(group.name, "AE2");
        assert!(!next.contains_key(&ItemGroupOid::from("IG.AE")));
    }

    #[test]
    fn update_of_unknown_group_is_a_no_op() {
        let state = table();
        let action = Action::UpdateItemGroup {
            oid: ItemGroupOid::from("IG.XX"),
            patch: ItemGroupPatch::rename("XX"),
        };
        let next = reduce(&state, &action, &ReduceContext::default()).expect("reduce");
        assert!(Arc::ptr_eq(&state, &next));
    }
}
