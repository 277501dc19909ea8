use std::collections::BTreeSet;

use define_model::{
    AnalysisResultDisplays, AnalysisResultOid, CommentOid, ItemGroupOid, MetaDataVersion,
    ResultDisplayOid, WhereClauseOid,
};

use super::DeletionClosure;
use super::walker::Walker;

/// Comments and where clauses referenced by a set of analysis results.
///
/// These are candidates only: whether they are deleted depends on their
/// other owners.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArmRelated {
    pub comment_oids: BTreeSet<CommentOid>,
    pub where_clause_oids: BTreeSet<WhereClauseOid>,
}

pub fn arm_analysis_result_oids<'a>(
    arm: &AnalysisResultDisplays,
    analysis_result_oids: impl IntoIterator<Item = &'a AnalysisResultOid>,
) -> ArmRelated {
    let mut related = ArmRelated::default();
    for oid in analysis_result_oids {
        let Some(result) = arm.analysis_results.get(oid) else {
            continue;
        };
        related
            .comment_oids
            .extend(result.analysis_datasets_comment_oid.clone());
        related
            .where_clause_oids
            .extend(result.where_clause_oids().cloned());
    }
    related
}

/// Closure of deleting result displays, including analysis results that
/// belong to no other display.
pub fn result_displays_related_oids(
    mdv: &MetaDataVersion,
    result_display_oids: &[ResultDisplayOid],
) -> DeletionClosure {
    let mut walker = Walker::new(mdv);
    walker.remove_result_displays(result_display_oids);
    walker.finish()
}

pub fn analysis_results_related_oids(
    mdv: &MetaDataVersion,
    analysis_result_oids: &[AnalysisResultOid],
) -> DeletionClosure {
    let mut walker = Walker::new(mdv);
    walker.remove_analysis_results(analysis_result_oids);
    walker.finish()
}

/// Closure of removing datasets from one analysis result.
pub fn analysis_datasets_related_oids(
    mdv: &MetaDataVersion,
    analysis_result_oid: &AnalysisResultOid,
    item_group_oids: &[ItemGroupOid],
) -> DeletionClosure {
    let mut walker = Walker::new(mdv);
    walker.remove_analysis_datasets(analysis_result_oid, item_group_oids);
    walker.finish()
}

/// Closure of turning ARM off: every display and result, plus the where
/// clauses and comments only ARM used.
pub fn arm_disable_closure(mdv: &MetaDataVersion) -> DeletionClosure {
    let mut walker = Walker::new(mdv);
    walker.disable_arm();
    walker.finish()
}
