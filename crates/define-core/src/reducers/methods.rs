use std::collections::BTreeSet;
use std::sync::Arc;

use define_model::text::strip_documents;
use define_model::{ItemRefContainer, LeafOid, Method, MethodOid, MethodOwner, MethodSources, Table};

use super::{edit_each, edit_one, insert_new, remove_keys, rename_key};
use crate::action::Action;
use crate::cascade::DeletionClosure;
use crate::context::ReduceContext;
use crate::error::Result;

pub fn reduce(
    state: &Table<MethodOid, Method>,
    action: &Action,
    context: &ReduceContext,
) -> Result<Table<MethodOid, Method>> {
    let mut next = state.clone();
    if let Some(closure) = action.closure() {
        apply_closure(&mut next, closure);
        return Ok(next);
    }
    match action {
        Action::AddVariable {
            item_group_oid,
            item_ref,
            ..
        } => {
            if let Some(method_oid) = &item_ref.method_oid {
                let owner = MethodOwner::new(
                    ItemRefContainer::ItemGroup(item_group_oid.clone()),
                    item_ref.oid.clone(),
                );
                edit_one(&mut next, method_oid, |method| method.sources.add(owner));
            }
        }
        Action::AddValueLevel {
            value_list_oid,
            item_ref,
            ..
        } => {
            if let Some(method_oid) = &item_ref.method_oid {
                let owner = MethodOwner::new(
                    ItemRefContainer::ValueList(value_list_oid.clone()),
                    item_ref.oid.clone(),
                );
                edit_one(&mut next, method_oid, |method| method.sources.add(owner));
            }
        }
        Action::AddMethod { owner, method } => {
            detach(&mut next, owner, None);
            let method = method
                .clone()
                .normalized()
                .with_sources(MethodSources::of(owner.clone()));
            insert_new(&mut next, method.oid.clone(), method);
        }
        Action::LinkMethod { owner, method_oid } => {
            detach(&mut next, owner, Some(method_oid));
            if state
                .get(method_oid)
                .is_some_and(|method| !method.sources.contains(owner))
            {
                edit_one(&mut next, method_oid, |method| method.sources.add(owner.clone()));
            }
        }
        Action::DeleteMethod { owner, method_oid } => {
            if state
                .get(method_oid)
                .is_some_and(|method| method.sources.contains(owner))
            {
                release(&mut next, method_oid, owner);
            }
        }
        Action::UpdateMethod { oid, patch } => {
            if let Some(method) = state.get(oid) {
                let merged = method.merged(patch);
                edit_one(&mut next, oid, |method| *method = merged);
            }
        }
        Action::UpdateItemGroup { .. } => {
            if let Some(rename) = &context.item_group_rename {
                edit_each(&mut next, |method| {
                    rename_key(&mut method.sources.item_groups, &rename.old, &rename.new)
                });
            }
        }
        Action::DeleteLeafs { leaf_ids } => {
            let removed: BTreeSet<LeafOid> = leaf_ids.iter().cloned().collect();
            edit_each(&mut next, |method| strip_documents(&mut method.documents, &removed));
        }
        _ => {}
    }
    Ok(next)
}

/// Detach `owner` from whatever method it currently uses, except `keep`.
fn detach(table: &mut Table<MethodOid, Method>, owner: &MethodOwner, keep: Option<&MethodOid>) {
    let previous: Vec<MethodOid> = table
        .values()
        .filter(|method| Some(&method.oid) != keep && method.sources.contains(owner))
        .map(|method| method.oid.clone())
        .collect();
    for oid in previous {
        release(table, &oid, owner);
    }
}

/// Remove one owner; the method goes away with its last owner.
fn release(table: &mut Table<MethodOid, Method>, oid: &MethodOid, owner: &MethodOwner) {
    let orphaned = edit_one(table, oid, |method| {
        method.sources.remove(owner);
        method.sources.is_empty()
    });
    if orphaned == Some(true) {
        Arc::make_mut(table).remove(oid);
    }
}

fn apply_closure(table: &mut Table<MethodOid, Method>, closure: &DeletionClosure) {
    remove_keys(table, &closure.method_oids);
    edit_each(table, |method| {
        let mut changed = false;
        for owner in method.sources.owners() {
            if closure.removes_method_owner(&owner) {
                changed |= method.sources.remove(&owner);
            }
        }
        changed
    });
}
