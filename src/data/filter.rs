use std::collections::{BTreeMap, BTreeSet};

use super::model::{CurveSet, MetadataValue};

/// Selected values per key field (`group`, `series`, ...).
/// A field absent from the map places no constraint on the curves.
pub type FilterState = BTreeMap<String, BTreeSet<MetadataValue>>;

/// Everything selected: every curve visible.
pub fn init_filter_state(set: &CurveSet) -> FilterState {
    set.unique_values.clone()
}

/// Indices of curves that pass all field filters, in batch order.
///
/// * Field not in `filters` → passes
/// * Empty selection → nothing passes
/// * Curve without that field (name not a trace key) → passes only while the
///   whole field is selected
pub fn filtered_indices(set: &CurveSet, filters: &FilterState) -> Vec<usize> {
    set.curves
        .iter()
        .enumerate()
        .filter(|(_, curve)| {
            filters.iter().all(|(field, selected)| {
                let all_selected = set
                    .unique_values
                    .get(field)
                    .map_or(true, |all| selected.len() == all.len());
                match curve.fields.get(field) {
                    _ if selected.is_empty() => false,
                    Some(val) => selected.contains(val),
                    None => all_selected,
                }
            })
        })
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Derived, DerivedResult, TraceId};

    fn set(names: &[&str]) -> CurveSet {
        CurveSet::from_results(
            names
                .iter()
                .map(|n| DerivedResult {
                    id: TraceId::from(*n),
                    name: n.to_string(),
                    unit_x: "s".into(),
                    unit_y: "A".into(),
                    value: Derived::Curve {
                        x: vec![0.0],
                        y: vec![0.0],
                    },
                })
                .collect(),
        )
    }

    #[test]
    fn initial_state_shows_everything() {
        let s = set(&["PM_1_1_1_Imon", "PM_1_1_2_Imon", "other"]);
        let filters = init_filter_state(&s);
        assert_eq!(filtered_indices(&s, &filters), vec![0, 1, 2]);
    }

    #[test]
    fn deselecting_a_sweep_hides_it() {
        let s = set(&["PM_1_1_1_Imon", "PM_1_1_2_Imon", "PM_1_1_2_Vmon", "other"]);
        let mut filters = init_filter_state(&s);
        filters
            .get_mut("sweep")
            .unwrap()
            .remove(&MetadataValue::Integer(2));
        assert_eq!(filtered_indices(&s, &filters), vec![0]);
    }

    #[test]
    fn empty_selection_hides_everything() {
        let s = set(&["PM_1_1_1_Imon", "PM_1_1_2_Imon"]);
        let mut filters = init_filter_state(&s);
        filters.insert("trace".into(), BTreeSet::new());
        assert!(filtered_indices(&s, &filters).is_empty());
    }
}
