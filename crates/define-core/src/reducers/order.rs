//! Order arrays of the top-level collections.

use std::collections::BTreeSet;

use define_model::{LeafOid, MdvOrder, StandardOid, order};

use crate::action::Action;
use crate::context::ReduceContext;
use crate::error::Result;

pub fn reduce(state: &MdvOrder, action: &Action, context: &ReduceContext) -> Result<MdvOrder> {
    let mut next = state.clone();
    if let Some(closure) = action.closure() {
        next.item_group_order
            .retain(|oid| !closure.item_group_oids.contains(oid));
        next.code_list_order
            .retain(|oid| !closure.code_list_oids.contains(oid));
        return Ok(next);
    }
    match action {
        Action::AddItemGroup {
            item_group,
            position,
        } => order::insert_at(
            "item groups",
            &mut next.item_group_order,
            *position,
            item_group.oid.clone(),
        )?,
        Action::UpdateItemGroup { .. } => {
            if let Some(rename) = &context.item_group_rename {
                order::rename_in(&mut next.item_group_order, &rename.old, &rename.new);
            }
        }
        Action::UpdateItemGroupOrder { order: proposed } => {
            order::ensure_permutation("item groups", &state.item_group_order, proposed)?;
            next.item_group_order = proposed.clone();
        }
        Action::AddCodeList {
            code_list,
            position,
        } => order::insert_at(
            "code lists",
            &mut next.code_list_order,
            *position,
            code_list.oid.clone(),
        )?,
        Action::UpdateCodeList { .. } => {
            if let Some(rename) = &context.code_list_rename {
                order::rename_in(&mut next.code_list_order, &rename.old, &rename.new);
            }
        }
        Action::UpdateCodeListOrder { order: proposed } => {
            order::ensure_permutation("code lists", &state.code_list_order, proposed)?;
            next.code_list_order = proposed.clone();
        }
        Action::AddLeaf { leaf, position } => {
            order::insert_at("leafs", &mut next.leaf_order, *position, leaf.id.clone())?;
        }
        Action::DeleteLeafs { leaf_ids } => {
            let removed: BTreeSet<&LeafOid> = leaf_ids.iter().collect();
            next.leaf_order.retain(|oid| !removed.contains(oid));
        }
        Action::UpdateLeafOrder { order: proposed } => {
            order::ensure_permutation("leafs", &state.leaf_order, proposed)?;
            next.leaf_order = proposed.clone();
        }
        Action::AddStandard { standard, position } => {
            order::insert_at(
                "standards",
                &mut next.standard_order,
                *position,
                standard.oid.clone(),
            )?;
        }
        Action::DeleteStandards { standard_oids } => {
            let removed: BTreeSet<&StandardOid> = standard_oids.iter().collect();
            next.standard_order.retain(|oid| !removed.contains(oid));
        }
        Action::UpdateStandardOrder { order: proposed } => {
            order::ensure_permutation("standards", &state.standard_order, proposed)?;
            next.standard_order = proposed.clone();
        }
        _ => {}
    }
    Ok(next)
}
