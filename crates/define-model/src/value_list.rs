//! Value lists: value-level metadata attached to a parent variable.

use serde::{Deserialize, Serialize};

use crate::item_ref::ItemRefSet;
use crate::oid::{ItemDefOid, ValueListOid};
use crate::order;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueListSources {
    pub item_defs: Vec<ItemDefOid>,
}

impl ValueListSources {
    pub fn is_empty(&self) -> bool {
        self.item_defs.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueList {
    pub oid: ValueListOid,
    #[serde(flatten)]
    pub refs: ItemRefSet,
    #[serde(default)]
    pub sources: ValueListSources,
}

impl ValueList {
    /// An empty value list owned by `parent`.
    pub fn new(oid: ValueListOid, parent: ItemDefOid) -> Self {
        Self {
            oid,
            refs: ItemRefSet::default(),
            sources: ValueListSources {
                item_defs: vec![parent],
            },
        }
    }

    pub fn normalized(mut self) -> Self {
        self.refs = self.refs.normalized();
        let mut item_defs = Vec::new();
        for oid in std::mem::take(&mut self.sources.item_defs) {
            order::push_unique(&mut item_defs, oid);
        }
        self.sources.item_defs = item_defs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item_ref::ItemRef;
    use crate::oid::ItemRefOid;

    #[test]
    fn flattened_refs_serialize_inline() {
        let mut list = ValueList::new(ValueListOid::from("VL.PARAM"), ItemDefOid::from("IT.PARAM"));
        list.refs
            .insert(
                ItemRef::new(ItemRefOid::from("IR.1"), ItemDefOid::from("IT.PARAM.AGE")),
                None,
            )
            .expect("insert");
        let json = serde_json::to_value(&list).expect("serialize");
        assert_eq!(json["item_ref_order"][0], "IR.1");
        let back: ValueList = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, list);
    }
}
