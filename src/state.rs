use std::collections::BTreeSet;

use eframe::egui::Color32;

use crate::color::{Coloring, FieldColors};
use crate::data::filter::{filtered_indices, init_filter_state, FilterState};
use crate::data::model::{CurveSet, MetadataValue};

/// Viewer state, independent of rendering.
pub struct ViewerState {
    pub curves: CurveSet,

    /// Per-field filter selections.
    pub filters: FilterState,

    /// Indices of curves passing the current filters (cached).
    pub visible_indices: Vec<usize>,

    /// Key field used for colouring; `None` gives every curve its own colour.
    pub color_field: Option<String>,

    pub coloring: Coloring,
}

impl ViewerState {
    pub fn new(curves: CurveSet) -> Self {
        let filters = init_filter_state(&curves);
        let visible_indices = (0..curves.len()).collect();
        let coloring = Coloring::per_curve(curves.len());
        Self {
            curves,
            filters,
            visible_indices,
            color_field: None,
            coloring,
        }
    }

    /// Colour of the curve at `idx`.
    pub fn curve_color(&self, idx: usize) -> Color32 {
        match &self.coloring {
            Coloring::PerCurve(palette) => palette.get(idx).copied().unwrap_or(Color32::LIGHT_BLUE),
            Coloring::ByField(map) => {
                map.color_for(self.curves.curves.get(idx).and_then(|c| c.fields.get(&map.field)))
            }
        }
    }

    pub fn set_color_field(&mut self, field: Option<String>) {
        self.coloring = match field
            .as_ref()
            .and_then(|f| self.curves.unique_values.get(f).map(|vals| (f, vals)))
        {
            Some((f, vals)) => Coloring::ByField(FieldColors::new(f, vals)),
            None => Coloring::per_curve(self.curves.len()),
        };
        self.color_field = field;
    }

    /// Recompute `visible_indices` after a filter change.
    pub fn refilter(&mut self) {
        self.visible_indices = filtered_indices(&self.curves, &self.filters);
    }

    pub fn select_all(&mut self, field: &str) {
        if let Some(all_vals) = self.curves.unique_values.get(field) {
            self.filters.insert(field.to_string(), all_vals.clone());
            self.refilter();
        }
    }

    pub fn select_none(&mut self, field: &str) {
        self.filters.insert(field.to_string(), BTreeSet::new());
        self.refilter();
    }

    pub fn toggle_filter_value(&mut self, field: &str, value: &MetadataValue) {
        let selected = self.filters.entry(field.to_string()).or_default();
        if !selected.remove(value) {
            selected.insert(value.clone());
        }
        self.refilter();
    }
}
