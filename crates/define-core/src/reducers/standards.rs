use std::collections::BTreeSet;

use define_model::{Standard, StandardOid, Table};

use super::{edit_each, edit_one, insert_new, remove_keys};
use crate::action::Action;
use crate::context::ReduceContext;
use crate::error::Result;

pub fn reduce(
    state: &Table<StandardOid, Standard>,
    action: &Action,
    _context: &ReduceContext,
) -> Result<Table<StandardOid, Standard>> {
    let mut next = state.clone();
    match action {
        Action::AddStandard { standard, .. } => {
            let standard = standard.clone().normalized();
            if standard.is_default {
                clear_other_defaults(&mut next, &standard);
            }
            insert_new(&mut next, standard.oid.clone(), standard);
        }
        Action::UpdateStandard { oid, patch } => {
            if let Some(standard) = state.get(oid) {
                let merged = standard.merged(patch);
                if merged.is_default {
                    clear_other_defaults(&mut next, &merged);
                }
                edit_one(&mut next, oid, |standard| *standard = merged);
            }
        }
        Action::DeleteStandards { standard_oids } => {
            let removed: BTreeSet<StandardOid> = standard_oids.iter().cloned().collect();
            remove_keys(&mut next, &removed);
        }
        _ => {}
    }
    Ok(next)
}

/// At most one standard per type is the default.
fn clear_other_defaults(table: &mut Table<StandardOid, Standard>, default: &Standard) {
    edit_each(table, |standard| {
        if standard.oid != default.oid
            && standard.standard_type == default.standard_type
            && standard.is_default
        {
            standard.is_default = false;
            return true;
        }
        false
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use define_model::StandardType;
    use std::sync::Arc;

    #[test]
    fn new_default_replaces_previous_default() {
        let mut sdtmig = Standard::new(StandardOid::from("STD.1"), "SDTMIG", StandardType::IG, "3.3");
        sdtmig.is_default = true;
        let state: Table<StandardOid, Standard> = Arc::new([(sdtmig.oid.clone(), sdtmig)].into());
        let mut newer = Standard::new(StandardOid::from("STD.2"), "SDTMIG", StandardType::IG, "3.4");
        newer.is_default = true;
        let action = Action::AddStandard {
            standard: newer,
            position: None,
        };
        let next = reduce(&state, &action, &ReduceContext::default()).expect("reduce");
        assert!(!next[&StandardOid::from("STD.1")].is_default);
        assert!(next[&StandardOid::from("STD.2")].is_default);
    }
}
