use std::sync::Arc;

use define_model::{
    CommentOwner, ItemRefContainer, Table, WhereClause, WhereClauseOid, WhereClauseSources,
};

use super::{clear_if_removed, edit_each, edit_one, insert_new, remove_keys};
use crate::action::Action;
use crate::cascade::DeletionClosure;
use crate::context::ReduceContext;
use crate::error::Result;

pub fn reduce(
    state: &Table<WhereClauseOid, WhereClause>,
    action: &Action,
    context: &ReduceContext,
) -> Result<Table<WhereClauseOid, WhereClause>> {
    let mut next = state.clone();
    if let Some(closure) = action.closure() {
        apply_closure(&mut next, closure);
        return Ok(next);
    }
    match action {
        Action::AddValueLevel {
            value_list_oid,
            item_ref,
            where_clause,
            ..
        } => match where_clause {
            Some(where_clause) => {
                let mut where_clause = where_clause.clone().normalized();
                where_clause.sources = WhereClauseSources::default();
                where_clause
                    .sources
                    .add_value_list_ref(value_list_oid.clone(), item_ref.oid.clone());
                insert_new(&mut next, where_clause.oid.clone(), where_clause);
            }
            None => {
                if let Some(oid) = &item_ref.where_clause_oid {
                    edit_one(&mut next, oid, |where_clause| {
                        where_clause
                            .sources
                            .add_value_list_ref(value_list_oid.clone(), item_ref.oid.clone());
                    });
                }
            }
        },
        Action::UpdateWhereClause { oid, range_checks } => {
            edit_one(&mut next, oid, |where_clause| {
                where_clause.range_checks = range_checks.clone();
                *where_clause = where_clause.clone().normalized();
            });
        }
        Action::UpdateAnalysisDataset {
            analysis_result_oid,
            dataset,
            where_clause,
        } => {
            let item_group_oid = &dataset.item_group_oid;
            let target = where_clause
                .as_ref()
                .map(|where_clause| &where_clause.oid)
                .or(dataset.where_clause_oid.as_ref());
            let previous: Vec<WhereClauseOid> = state
                .values()
                .filter(|where_clause| Some(&where_clause.oid) != target)
                .filter(|where_clause| {
                    where_clause
                        .sources
                        .analysis_results
                        .get(analysis_result_oid)
                        .is_some_and(|groups| groups.contains(item_group_oid))
                })
                .map(|where_clause| where_clause.oid.clone())
                .collect();
            for oid in previous {
                let orphaned = edit_one(&mut next, &oid, |where_clause| {
                    where_clause
                        .sources
                        .remove_analysis_dataset(analysis_result_oid, item_group_oid);
                    where_clause.sources.is_empty()
                });
                if orphaned == Some(true) {
                    Arc::make_mut(&mut next).remove(&oid);
                }
            }
            if let Some(where_clause) = where_clause {
                if next.contains_key(&where_clause.oid) {
                    edit_one(&mut next, &where_clause.oid, |existing| {
                        existing.range_checks = where_clause.range_checks.clone();
                        *existing = existing.clone().normalized();
                    });
                } else {
                    let created = WhereClause::new(
                        where_clause.oid.clone(),
                        where_clause.range_checks.clone(),
                    )
                    .normalized();
                    insert_new(&mut next, created.oid.clone(), created);
                }
            }
            if let Some(target) = target {
                edit_one(&mut next, target, |where_clause| {
                    where_clause
                        .sources
                        .add_analysis_dataset(analysis_result_oid.clone(), item_group_oid.clone());
                });
            }
        }
        Action::UpdateItemGroup { .. } => {
            if let Some(rename) = &context.item_group_rename {
                edit_each(&mut next, |where_clause| {
                    where_clause.rename_item_group(&rename.old, &rename.new)
                });
            }
        }
        Action::AddComment {
            owner: CommentOwner::WhereClause(oid),
            comment,
        } => {
            edit_one(&mut next, oid, |where_clause| {
                where_clause.comment_oid = Some(comment.oid.clone());
            });
        }
        Action::LinkComment {
            owner: CommentOwner::WhereClause(oid),
            comment_oid,
        } => {
            edit_one(&mut next, oid, |where_clause| {
                where_clause.comment_oid = Some(comment_oid.clone());
            });
        }
        Action::DeleteComment {
            owner: CommentOwner::WhereClause(oid),
            comment_oid,
        } => {
            if state
                .get(oid)
                .is_some_and(|where_clause| where_clause.comment_oid.as_ref() == Some(comment_oid))
            {
                edit_one(&mut next, oid, |where_clause| where_clause.comment_oid = None);
            }
        }
        _ => {}
    }
    Ok(next)
}

fn apply_closure(table: &mut Table<WhereClauseOid, WhereClause>, closure: &DeletionClosure) {
    remove_keys(table, &closure.where_clause_oids);
    edit_each(table, |where_clause| {
        let mut changed = false;
        for removed in &closure.item_refs {
            if let ItemRefContainer::ValueList(list) = &removed.container {
                changed |= where_clause
                    .sources
                    .remove_value_list_ref(list, &removed.item_ref_oid);
            }
        }
        let sources = &mut where_clause.sources;
        let before = sources.value_lists.len();
        sources
            .value_lists
            .retain(|list, _| !closure.value_list_oids.contains(list));
        changed |= before != sources.value_lists.len();

        for (result, groups) in &mut sources.analysis_results {
            let before = groups.len();
            groups.retain(|group| !closure.removes_analysis_dataset(result, group));
            changed |= before != groups.len();
        }
        sources.analysis_results.retain(|_, groups| !groups.is_empty());

        changed |= where_clause.strip_items(&closure.item_def_oids);
        let before = where_clause.range_checks.len();
        where_clause.range_checks.retain(|check| {
            check
                .item_group_oid
                .as_ref()
                .is_none_or(|group| !closure.item_group_oids.contains(group))
        });
        changed |= before != where_clause.range_checks.len();
        changed |= clear_if_removed(&mut where_clause.comment_oid, &closure.comment_oids);
        changed
    });
}
