use std::collections::{BTreeMap, BTreeSet};

use define_model::{
    CommentOid, ItemDefOid, ItemGroupOid, ItemRefContainer, ItemRefOid, MetaDataVersion,
};

use super::DeletionClosure;
use super::walker::Walker;

/// What a dataset delete removes from one dataset's variables.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemRefsRelated {
    pub item_ref_oids: Vec<ItemRefOid>,
    /// Item defs of these refs that have no other user.
    pub item_def_oids: Vec<ItemDefOid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemGroupsRelated {
    pub item_group_oids: BTreeSet<ItemGroupOid>,
    pub comment_oids: BTreeSet<CommentOid>,
    pub item_group_data: BTreeMap<ItemGroupOid, ItemRefsRelated>,
    pub closure: DeletionClosure,
}

/// Closure of deleting whole datasets. Unknown OIDs are ignored.
pub fn item_groups_related_oids(
    mdv: &MetaDataVersion,
    item_group_oids: &[ItemGroupOid],
) -> ItemGroupsRelated {
    let mut walker = Walker::new(mdv);
    walker.remove_item_groups(item_group_oids);
    let closure = walker.finish();

    let item_group_data = closure
        .item_group_oids
        .iter()
        .map(|group| {
            let container = ItemRefContainer::ItemGroup(group.clone());
            let mut related = ItemRefsRelated::default();
            for removed in closure
                .item_refs
                .iter()
                .filter(|removed| removed.container == container)
            {
                related.item_ref_oids.push(removed.item_ref_oid.clone());
                if closure.item_def_oids.contains(&removed.item_oid) {
                    related.item_def_oids.push(removed.item_oid.clone());
                }
            }
            (group.clone(), related)
        })
        .collect();

    ItemGroupsRelated {
        item_group_oids: closure.item_group_oids.clone(),
        comment_oids: closure.comment_oids.clone(),
        item_group_data,
        closure,
    }
}

/// Closure of deleting item refs from one dataset or value list.
///
/// The walk follows the value lists of removed item defs, so deleting a
/// variable also removes its value-level items when nothing else uses them.
pub fn item_refs_related_oids(
    mdv: &MetaDataVersion,
    container: &ItemRefContainer,
    item_ref_oids: &[ItemRefOid],
) -> DeletionClosure {
    let mut walker = Walker::new(mdv);
    walker.remove_item_refs(container, item_ref_oids);
    walker.finish()
}
