use std::collections::BTreeSet;

use define_model::{Leaf, LeafOid, Table};

use super::{edit_one, insert_new, remove_keys};
use crate::action::Action;
use crate::context::ReduceContext;
use crate::error::Result;

pub fn reduce(
    state: &Table<LeafOid, Leaf>,
    action: &Action,
    _context: &ReduceContext,
) -> Result<Table<LeafOid, Leaf>> {
    let mut next = state.clone();
    match action {
        Action::AddLeaf { leaf, .. } => {
            let leaf = Leaf::new(leaf.id.clone(), &leaf.href, &leaf.title);
            insert_new(&mut next, leaf.id.clone(), leaf);
        }
        Action::UpdateLeaf {
            leaf_id,
            href,
            title,
        } => {
            if let Some(leaf) = state.get(leaf_id) {
                let updated = Leaf::new(
                    leaf.id.clone(),
                    href.as_deref().unwrap_or(&leaf.href),
                    title.as_deref().unwrap_or(&leaf.title),
                );
                if updated != *leaf {
                    edit_one(&mut next, leaf_id, |leaf| *leaf = updated);
                }
            }
        }
        Action::DeleteLeafs { leaf_ids } => {
            let removed: BTreeSet<LeafOid> = leaf_ids.iter().cloned().collect();
            remove_keys(&mut next, &removed);
        }
        _ => {}
    }
    Ok(next)
}
