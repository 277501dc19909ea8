use define_model::{ItemRefContainer, MethodOid, MethodOwner, Table, ValueList, ValueListOid};

use super::{
    clear_if_removed, edit_each, edit_one, insert_new, remove_item_refs, remove_keys,
    set_item_ref_method, value_level_item_ref,
};
use crate::action::Action;
use crate::cascade::DeletionClosure;
use crate::context::ReduceContext;
use crate::error::Result;

pub fn reduce(
    state: &Table<ValueListOid, ValueList>,
    action: &Action,
    _context: &ReduceContext,
) -> Result<Table<ValueListOid, ValueList>> {
    let mut next = state.clone();
    if let Some(closure) = action.closure() {
        apply_closure(&mut next, closure);
        return Ok(next);
    }
    match action {
        Action::AddValueLevel {
            parent_item_oid,
            value_list_oid,
            item_ref,
            where_clause,
            position,
            ..
        } => {
            if !next.contains_key(value_list_oid) {
                insert_new(
                    &mut next,
                    value_list_oid.clone(),
                    ValueList::new(value_list_oid.clone(), parent_item_oid.clone()),
                );
            }
            let item_ref = value_level_item_ref(item_ref, where_clause.as_ref());
            if let Some(result) = edit_one(&mut next, value_list_oid, |list| {
                list.refs.insert(item_ref, *position)
            }) {
                result?;
            }
        }
        Action::UpdateItemRef {
            container: ItemRefContainer::ValueList(oid),
            item_ref_oid,
            patch,
        } => {
            if state.get(oid).is_some_and(|list| list.refs.get(item_ref_oid).is_some()) {
                edit_one(&mut next, oid, |list| {
                    if let Some(item_ref) = list.refs.item_refs.get_mut(item_ref_oid) {
                        *item_ref = item_ref.merged(patch);
                    }
                });
            }
        }
        Action::UpdateItemRefOrder {
            container: ItemRefContainer::ValueList(oid),
            order,
        } => {
            if let Some(result) = edit_one(&mut next, oid, |list| list.refs.set_order(order.clone())) {
                result?;
            }
        }
        Action::UpdateKeyOrder {
            container: ItemRefContainer::ValueList(oid),
            key_order,
        } => {
            if let Some(result) =
                edit_one(&mut next, oid, |list| list.refs.set_key_order(key_order.clone()))
            {
                result?;
            }
        }
        Action::AddMethod { owner, method } => set_method(&mut next, owner, Some(method.oid.clone())),
        Action::LinkMethod { owner, method_oid } => {
            set_method(&mut next, owner, Some(method_oid.clone()));
        }
        Action::DeleteMethod { owner, method_oid } => {
            let ItemRefContainer::ValueList(oid) = &owner.container else {
                return Ok(next);
            };
            let current = state
                .get(oid)
                .and_then(|list| list.refs.get(&owner.item_ref_oid))
                .and_then(|item_ref| item_ref.method_oid.as_ref());
            if current == Some(method_oid) {
                set_method(&mut next, owner, None);
            }
        }
        _ => {}
    }
    Ok(next)
}

fn set_method(
    table: &mut Table<ValueListOid, ValueList>,
    owner: &MethodOwner,
    method_oid: Option<MethodOid>,
) {
    let ItemRefContainer::ValueList(oid) = &owner.container else {
        return;
    };
    let changes = table
        .get(oid)
        .and_then(|list| list.refs.get(&owner.item_ref_oid))
        .is_some_and(|item_ref| item_ref.method_oid != method_oid);
    if changes {
        edit_one(table, oid, |list| {
            set_item_ref_method(&mut list.refs, &owner.item_ref_oid, method_oid)
        });
    }
}

fn apply_closure(table: &mut Table<ValueListOid, ValueList>, closure: &DeletionClosure) {
    remove_keys(table, &closure.value_list_oids);
    edit_each(table, |list| {
        let container = ItemRefContainer::ValueList(list.oid.clone());
        let mut changed = remove_item_refs(&mut list.refs, &closure.item_refs_of(&container));
        let before = list.sources.item_defs.len();
        list.sources
            .item_defs
            .retain(|oid| !closure.item_def_oids.contains(oid));
        changed |= before != list.sources.item_defs.len();
        for item_ref in list.refs.item_refs.values_mut() {
            changed |= clear_if_removed(&mut item_ref.method_oid, &closure.method_oids);
            changed |= clear_if_removed(&mut item_ref.where_clause_oid, &closure.where_clause_oids);
        }
        changed
    });
}
