use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::MetadataValue;

/// `n` visually distinct colours on evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

/// How curves are coloured in the viewer.
#[derive(Debug, Clone)]
pub enum Coloring {
    /// One hue per curve, in batch order.
    PerCurve(Vec<Color32>),
    /// One hue per value of a key field, shared by all curves with that value.
    ByField(FieldColors),
}

impl Coloring {
    pub fn per_curve(n: usize) -> Self {
        Coloring::PerCurve(generate_palette(n))
    }
}

/// Maps the values of one key field to distinct colours.
#[derive(Debug, Clone)]
pub struct FieldColors {
    pub field: String,
    mapping: BTreeMap<MetadataValue, Color32>,
}

impl FieldColors {
    pub fn new(field: &str, values: &BTreeSet<MetadataValue>) -> Self {
        let mapping = values
            .iter()
            .cloned()
            .zip(generate_palette(values.len()))
            .collect();
        FieldColors {
            field: field.to_string(),
            mapping,
        }
    }

    /// Grey for values (or curves) the map does not know.
    pub fn color_for(&self, value: Option<&MetadataValue>) -> Color32 {
        value
            .and_then(|v| self.mapping.get(v))
            .copied()
            .unwrap_or(Color32::GRAY)
    }
}
