//! The metadata version aggregator.
//!
//! Validates the action, resolves renames once, then hands the action to
//! every collection reducer and assembles the next snapshot.

use tracing::{debug, instrument};

use define_model::{CommentOid, CommentOwner, MetaDataVersion};

use super::{
    arm, code_lists, comments, item_defs, item_groups, leafs, methods, order, standards,
    value_lists, where_clauses,
};
use crate::action::Action;
use crate::context::ReduceContext;
use crate::error::Result;

#[instrument(level = "debug", skip_all, fields(action = action.kind()))]
pub fn reduce(mdv: &MetaDataVersion, action: &Action) -> Result<MetaDataVersion> {
    let context = ReduceContext::resolve(mdv, action)?;
    if context.target_missing {
        debug!("update target does not exist");
        return Ok(mdv.clone());
    }
    match action {
        Action::UpdateMetaDataVersion { patch } => return Ok(mdv.merged(patch)),
        Action::UpdateModel { model } => {
            let mut next = mdv.clone();
            next.model = *model;
            return Ok(next);
        }
        _ => {}
    }

    if let Some(closure) = action.closure() {
        debug!(removed = closure.removed_count(), "applying deletion closure");
    }
    if let Some(rename) = &context.item_group_rename {
        debug!(old = %rename.old, new = %rename.new, "item group OID follows rename");
    }
    if let Some(rename) = &context.code_list_rename {
        debug!(old = %rename.old, new = %rename.new, "code list OID follows rename");
    }

    Ok(MetaDataVersion {
        oid: mdv.oid.clone(),
        name: mdv.name.clone(),
        description: mdv.description.clone(),
        define_version: mdv.define_version.clone(),
        model: mdv.model,
        comment_oid: own_comment(mdv, action),
        standards: standards::reduce(&mdv.standards, action, &context)?,
        item_groups: item_groups::reduce(&mdv.item_groups, action, &context)?,
        item_defs: item_defs::reduce(&mdv.item_defs, action, &context)?,
        code_lists: code_lists::reduce(&mdv.code_lists, action, &context)?,
        methods: methods::reduce(&mdv.methods, action, &context)?,
        comments: comments::reduce(&mdv.comments, action, &context)?,
        where_clauses: where_clauses::reduce(&mdv.where_clauses, action, &context)?,
        value_lists: value_lists::reduce(&mdv.value_lists, action, &context)?,
        leafs: leafs::reduce(&mdv.leafs, action, &context)?,
        analysis_result_displays: arm::reduce(&mdv.analysis_result_displays, action, &context)?,
        order: order::reduce(&mdv.order, action, &context)?,
    })
}

/// The comment of the metadata version itself.
fn own_comment(mdv: &MetaDataVersion, action: &Action) -> Option<CommentOid> {
    let owns = |owner: &CommentOwner| *owner == CommentOwner::MetaDataVersion(mdv.oid.clone());
    match action {
        Action::AddComment { owner, comment } if owns(owner) => Some(comment.oid.clone()),
        Action::LinkComment { owner, comment_oid } if owns(owner) => Some(comment_oid.clone()),
        Action::DeleteComment { owner, comment_oid }
            if owns(owner) && mdv.comment_oid.as_ref() == Some(comment_oid) =>
        {
            None
        }
        _ => mdv.comment_oid.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use define_model::{
        ItemGroup, ItemGroupOid, ItemGroupPatch, MdvPatch, MetaDataVersionOid, Model,
    };

    use crate::error::CoreError;

    fn mdv() -> MetaDataVersion {
        MetaDataVersion::new(MetaDataVersionOid::from("MDV.1"), "Study", Model::Sdtm)
    }

    #[test]
    fn unrelated_tables_stay_shared() {
        let before = mdv();
        let action = Action::AddItemGroup {
            item_group: ItemGroup::new(ItemGroupOid::from("IG.AE"), "AE"),
            position: None,
        };
        let after = reduce(&before, &action).expect("reduce");
        assert!(Arc::ptr_eq(&before.code_lists, &after.code_lists));
        assert!(Arc::ptr_eq(&before.item_defs, &after.item_defs));
        assert!(!Arc::ptr_eq(&before.item_groups, &after.item_groups));
        assert_eq!(after.order.item_group_order, vec![ItemGroupOid::from("IG.AE")]);
    }

    #[test]
    fn mdv_patch_updates_attributes() {
        let action = Action::UpdateMetaDataVersion {
            patch: MdvPatch {
                name: Some(" Pilot ".to_string()),
                ..MdvPatch::default()
            },
        };
        let after = reduce(&mdv(), &action).expect("reduce");
        assert_eq!(after.name, "Pilot");
    }

    #[test]
    fn arm_requires_adam() {
        let error = reduce(&mdv(), &Action::EnableArm).unwrap_err();
        assert!(matches!(error, CoreError::InvalidAction(_)));
    }

    #[test]
    fn rename_collision_is_rejected_without_changes() {
        let mut before = mdv();
        for name in ["AE", "CM"] {
            let group = ItemGroup::new(ItemGroupOid::new(format!("IG.{name}")), name);
            Arc::make_mut(&mut before.item_groups).insert(group.oid.clone(), group);
        }
        let before = before.normalized();
        let action = Action::UpdateItemGroup {
            oid: ItemGroupOid::from("IG.AE"),
            patch: ItemGroupPatch::rename("CM"),
        };
        let error = reduce(&before, &action).unwrap_err();
        assert!(matches!(error, CoreError::OidCollision { .. }));
    }
}
