use define_model::{CodeListOid, MetaDataVersion};

use super::DeletionClosure;
use super::walker::Walker;

/// Closure of deleting code lists: the lists and their orphaned comments.
/// Item defs using a deleted list are unlinked, not deleted.
pub fn code_lists_related_oids(mdv: &MetaDataVersion, code_list_oids: &[CodeListOid]) -> DeletionClosure {
    let mut walker = Walker::new(mdv);
    walker.remove_code_lists(code_list_oids);
    walker.finish()
}
