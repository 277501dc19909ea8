use std::collections::BTreeSet;
use std::sync::Arc;

use define_model::text::strip_documents;
use define_model::{Comment, CommentOid, CommentOwner, CommentSources, LeafOid, Table, order};

use super::{edit_each, edit_one, insert_new, remove_keys};
use crate::action::Action;
use crate::cascade::DeletionClosure;
use crate::context::ReduceContext;
use crate::error::Result;

pub fn reduce(
    state: &Table<CommentOid, Comment>,
    action: &Action,
    context: &ReduceContext,
) -> Result<Table<CommentOid, Comment>> {
    let mut next = state.clone();
    if let Some(closure) = action.closure() {
        apply_closure(&mut next, closure);
        return Ok(next);
    }
    match action {
        Action::AddItemGroup { item_group, .. } => {
            if let Some(comment_oid) = &item_group.comment_oid {
                attach(&mut next, comment_oid, CommentOwner::ItemGroup(item_group.oid.clone()));
            }
        }
        Action::AddVariable { item_def, .. } => {
            if let Some(item_def) = item_def
                && let Some(comment_oid) = &item_def.comment_oid
            {
                attach(&mut next, comment_oid, CommentOwner::ItemDef(item_def.oid.clone()));
            }
        }
        Action::AddValueLevel {
            item_def,
            where_clause,
            ..
        } => {
            if let Some(item_def) = item_def
                && let Some(comment_oid) = &item_def.comment_oid
            {
                attach(&mut next, comment_oid, CommentOwner::ItemDef(item_def.oid.clone()));
            }
            if let Some(where_clause) = where_clause
                && let Some(comment_oid) = &where_clause.comment_oid
            {
                attach(
                    &mut next,
                    comment_oid,
                    CommentOwner::WhereClause(where_clause.oid.clone()),
                );
            }
        }
        Action::AddCodeList { code_list, .. } => {
            if let Some(comment_oid) = &code_list.comment_oid {
                attach(&mut next, comment_oid, CommentOwner::CodeList(code_list.oid.clone()));
            }
        }
        Action::AddComment { owner, comment } => {
            detach(&mut next, owner, None);
            let comment = comment
                .clone()
                .normalized()
                .with_sources(CommentSources::of(owner.clone()));
            insert_new(&mut next, comment.oid.clone(), comment);
        }
        Action::LinkComment { owner, comment_oid } => {
            detach(&mut next, owner, Some(comment_oid));
            attach(&mut next, comment_oid, owner.clone());
        }
        Action::DeleteComment { owner, comment_oid } => {
            if state
                .get(comment_oid)
                .is_some_and(|comment| comment.sources.contains(owner))
            {
                release(&mut next, comment_oid, owner);
            }
        }
        Action::UpdateComment { oid, patch } => {
            if let Some(comment) = state.get(oid) {
                let merged = comment.merged(patch);
                edit_one(&mut next, oid, |comment| *comment = merged);
            }
        }
        Action::UpdateItemGroup { .. } => {
            if let Some(rename) = &context.item_group_rename {
                edit_each(&mut next, |comment| {
                    order::rename_in(&mut comment.sources.item_groups, &rename.old, &rename.new)
                });
            }
        }
        Action::UpdateCodeList { .. } => {
            if let Some(rename) = &context.code_list_rename {
                edit_each(&mut next, |comment| {
                    order::rename_in(&mut comment.sources.code_lists, &rename.old, &rename.new)
                });
            }
        }
        Action::DeleteLeafs { leaf_ids } => {
            let removed: BTreeSet<LeafOid> = leaf_ids.iter().cloned().collect();
            edit_each(&mut next, |comment| strip_documents(&mut comment.documents, &removed));
        }
        _ => {}
    }
    Ok(next)
}

fn attach(table: &mut Table<CommentOid, Comment>, oid: &CommentOid, owner: CommentOwner) {
    if table
        .get(oid)
        .is_some_and(|comment| !comment.sources.contains(&owner))
    {
        edit_one(table, oid, |comment| comment.sources.add(owner));
    }
}

/// Detach `owner` from its current comment unless that comment is `keep`.
fn detach(table: &mut Table<CommentOid, Comment>, owner: &CommentOwner, keep: Option<&CommentOid>) {
    let previous: Vec<CommentOid> = table
        .values()
        .filter(|comment| Some(&comment.oid) != keep && comment.sources.contains(owner))
        .map(|comment| comment.oid.clone())
        .collect();
    for oid in previous {
        release(table, &oid, owner);
    }
}

/// Remove one owner; the comment goes away with its last owner.
fn release(table: &mut Table<CommentOid, Comment>, oid: &CommentOid, owner: &CommentOwner) {
    let orphaned = edit_one(table, oid, |comment| {
        comment.sources.remove(owner);
        comment.sources.is_empty()
    });
    if orphaned == Some(true) {
        Arc::make_mut(table).remove(oid);
    }
}

fn apply_closure(table: &mut Table<CommentOid, Comment>, closure: &DeletionClosure) {
    remove_keys(table, &closure.comment_oids);
    edit_each(table, |comment| {
        let mut changed = false;
        for owner in comment.sources.owners() {
            if closure.removes_comment_owner(&owner) {
                changed |= comment.sources.remove(&owner);
            }
        }
        changed
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use define_model::{ItemDefOid, ItemGroupOid};

    #[test]
    fn linking_moves_owner_between_comments() {
        let first = Comment::new(CommentOid::from("COM.1"), "First")
            .with_sources(CommentSources::of(CommentOwner::ItemGroup(ItemGroupOid::from("IG.AE"))));
        let mut shared_sources = CommentSources::of(CommentOwner::ItemDef(ItemDefOid::from("IT.AETERM")));
        shared_sources.add(CommentOwner::ItemGroup(ItemGroupOid::from("IG.CM")));
        let shared = Comment::new(CommentOid::from("COM.2"), "Shared").with_sources(shared_sources);
        let state: Table<CommentOid, Comment> = Arc::new(
            [(first.oid.clone(), first), (shared.oid.clone(), shared)].into(),
        );

        let action = Action::LinkComment {
            owner: CommentOwner::ItemGroup(ItemGroupOid::from("IG.AE")),
            comment_oid: CommentOid::from("COM.2"),
        };
        let next = reduce(&state, &action, &ReduceContext::default()).expect("reduce");

        assert!(!next.contains_key(&CommentOid::from("COM.1")));
        assert_eq!(
            next[&CommentOid::from("COM.2")].sources.item_groups,
            vec![ItemGroupOid::from("IG.CM"), ItemGroupOid::from("IG.AE")]
        );
    }
}
