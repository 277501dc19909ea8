//! Analysis results metadata: result displays and analysis results.

use std::collections::BTreeSet;
use std::sync::Arc;

use define_model::text::strip_documents;
use define_model::{
    AnalysisResultDisplays, AnalysisResultOid, AnalysisResultSources, CommentOid, CommentOwner,
    LeafOid, order,
};

use super::clear_if_removed;
use crate::action::Action;
use crate::cascade::DeletionClosure;
use crate::context::ReduceContext;
use crate::error::Result;

type Arm = Option<Arc<AnalysisResultDisplays>>;

pub fn reduce(state: &Arm, action: &Action, context: &ReduceContext) -> Result<Arm> {
    if let Action::EnableArm = action {
        return Ok(Some(state.clone().unwrap_or_default()));
    }
    let Some(current) = state else {
        return Ok(None);
    };
    if let Some(closure) = action.closure() {
        if closure.disable_arm {
            return Ok(None);
        }
        let mut next = current.as_ref().clone();
        if apply_closure(&mut next, closure) {
            return Ok(Some(Arc::new(next)));
        }
        return Ok(state.clone());
    }
    let mut next = current.as_ref().clone();
    let changed = match action {
        Action::AddResultDisplay {
            result_display,
            position,
        } => {
            let display = result_display.clone().normalized();
            order::insert_at(
                "result displays",
                &mut next.result_display_order,
                *position,
                display.oid.clone(),
            )?;
            next.result_displays.insert(display.oid.clone(), display);
            true
        }
        Action::UpdateResultDisplay { oid, patch } => match next.result_displays.get_mut(oid) {
            Some(display) => {
                *display = display.merged(patch);
                true
            }
            None => false,
        },
        Action::UpdateResultDisplayOrder { order } => {
            next.set_display_order(order.clone())?;
            true
        }
        Action::AddAnalysisResult {
            result_display_oid,
            analysis_result,
            position,
        } => {
            let Some(display) = next.result_displays.get_mut(result_display_oid) else {
                return Ok(state.clone());
            };
            order::insert_at(
                "analysis results",
                &mut display.analysis_result_order,
                *position,
                analysis_result.oid.clone(),
            )?;
            let mut result = analysis_result.clone().normalized();
            result.sources = AnalysisResultSources {
                result_displays: vec![result_display_oid.clone()],
            };
            next.analysis_results.insert(result.oid.clone(), result);
            true
        }
        Action::UpdateAnalysisResult { oid, patch } => match next.analysis_results.get_mut(oid) {
            Some(result) => {
                *result = result.merged(patch);
                true
            }
            None => false,
        },
        Action::UpdateAnalysisResultOrder {
            result_display_oid,
            order,
        } => {
            if !next.result_displays.contains_key(result_display_oid) {
                return Ok(state.clone());
            }
            next.set_result_order(result_display_oid, order.clone())?;
            true
        }
        Action::UpdateAnalysisDataset {
            analysis_result_oid,
            dataset,
            where_clause,
        } => match next.analysis_results.get_mut(analysis_result_oid) {
            Some(result) => {
                let mut dataset = dataset.clone();
                if let Some(where_clause) = where_clause {
                    dataset.where_clause_oid = Some(where_clause.oid.clone());
                }
                result.upsert_dataset(dataset);
                true
            }
            None => false,
        },
        Action::UpdateItemGroup { .. } => match &context.item_group_rename {
            Some(rename) => {
                let mut changed = false;
                for result in next.analysis_results.values_mut() {
                    changed |= result.rename_item_group(&rename.old, &rename.new);
                }
                changed
            }
            None => false,
        },
        Action::AddComment {
            owner: CommentOwner::AnalysisResult(oid),
            comment,
        } => set_comment(&mut next, oid, Some(comment.oid.clone())),
        Action::LinkComment {
            owner: CommentOwner::AnalysisResult(oid),
            comment_oid,
        } => set_comment(&mut next, oid, Some(comment_oid.clone())),
        Action::DeleteComment {
            owner: CommentOwner::AnalysisResult(oid),
            comment_oid,
        } => {
            let linked = next
                .analysis_results
                .get(oid)
                .is_some_and(|result| result.analysis_datasets_comment_oid.as_ref() == Some(comment_oid));
            linked && set_comment(&mut next, oid, None)
        }
        Action::DeleteLeafs { leaf_ids } => {
            let removed: BTreeSet<LeafOid> = leaf_ids.iter().cloned().collect();
            strip_leafs(&mut next, &removed)
        }
        _ => false,
    };
    if changed {
        Ok(Some(Arc::new(next)))
    } else {
        Ok(state.clone())
    }
}

fn set_comment(
    arm: &mut AnalysisResultDisplays,
    oid: &AnalysisResultOid,
    comment_oid: Option<CommentOid>,
) -> bool {
    match arm.analysis_results.get_mut(oid) {
        Some(result) if result.analysis_datasets_comment_oid != comment_oid => {
            result.analysis_datasets_comment_oid = comment_oid;
            true
        }
        _ => false,
    }
}

fn strip_leafs(arm: &mut AnalysisResultDisplays, removed: &BTreeSet<LeafOid>) -> bool {
    let mut changed = false;
    for display in arm.result_displays.values_mut() {
        changed |= strip_documents(&mut display.documents, removed);
    }
    for result in arm.analysis_results.values_mut() {
        if let Some(documentation) = &mut result.documentation {
            changed |= strip_documents(&mut documentation.documents, removed);
        }
        if let Some(code) = &mut result.programming_code {
            changed |= strip_documents(&mut code.documents, removed);
        }
    }
    changed
}

fn apply_closure(arm: &mut AnalysisResultDisplays, closure: &DeletionClosure) -> bool {
    let mut changed = false;

    let before = arm.result_displays.len();
    arm.result_displays
        .retain(|oid, _| !closure.result_display_oids.contains(oid));
    arm.result_display_order
        .retain(|oid| !closure.result_display_oids.contains(oid));
    changed |= before != arm.result_displays.len();

    let before = arm.analysis_results.len();
    arm.analysis_results
        .retain(|oid, _| !closure.analysis_result_oids.contains(oid));
    changed |= before != arm.analysis_results.len();
    for display in arm.result_displays.values_mut() {
        let before = display.analysis_result_order.len();
        display
            .analysis_result_order
            .retain(|oid| !closure.analysis_result_oids.contains(oid));
        changed |= before != display.analysis_result_order.len();
    }

    for result in arm.analysis_results.values_mut() {
        let before = result.sources.result_displays.len();
        result
            .sources
            .result_displays
            .retain(|oid| !closure.result_display_oids.contains(oid));
        changed |= before != result.sources.result_displays.len();

        let removed: Vec<_> = result
            .analysis_datasets
            .keys()
            .filter(|group| closure.removes_analysis_dataset(&result.oid, group))
            .cloned()
            .collect();
        for group in &removed {
            result.remove_dataset(group);
        }
        changed |= !removed.is_empty();

        changed |= result.strip_item_defs(&closure.item_def_oids);
        for dataset in result.analysis_datasets.values_mut() {
            changed |= clear_if_removed(&mut dataset.where_clause_oid, &closure.where_clause_oids);
        }
        changed |= clear_if_removed(
            &mut result.analysis_datasets_comment_oid,
            &closure.comment_oids,
        );
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use define_model::{AnalysisResult, ResultDisplay, ResultDisplayOid};

    fn enabled() -> Arm {
        reduce(&None, &Action::EnableArm, &ReduceContext::default()).expect("enable")
    }

    #[test]
    fn enable_creates_empty_section() {
        let arm = enabled().expect("enabled");
        assert!(arm.result_displays.is_empty());
    }

    #[test]
    fn actions_without_arm_leave_it_disabled() {
        let action = Action::AddResultDisplay {
            result_display: ResultDisplay::new(ResultDisplayOid::from("RD.1"), "Table 14.1"),
            position: None,
        };
        assert_eq!(reduce(&None, &action, &ReduceContext::default()).expect("reduce"), None);
    }

    #[test]
    fn analysis_result_is_listed_under_its_display() {
        let arm = enabled();
        let arm = reduce(
            &arm,
            &Action::AddResultDisplay {
                result_display: ResultDisplay::new(ResultDisplayOid::from("RD.1"), "Table 14.1"),
                position: None,
            },
            &ReduceContext::default(),
        )
        .expect("display");
        let arm = reduce(
            &arm,
            &Action::AddAnalysisResult {
                result_display_oid: ResultDisplayOid::from("RD.1"),
                analysis_result: AnalysisResult::new(AnalysisResultOid::from("AR.1"), "Demographics"),
                position: None,
            },
            &ReduceContext::default(),
        )
        .expect("result")
        .expect("enabled");
        assert_eq!(
            arm.result_displays[&ResultDisplayOid::from("RD.1")].analysis_result_order,
            vec![AnalysisResultOid::from("AR.1")]
        );
        assert_eq!(
            arm.analysis_results[&AnalysisResultOid::from("AR.1")]
                .sources
                .result_displays,
            vec![ResultDisplayOid::from("RD.1")]
        );
    }
}
