use std::collections::BTreeSet;

use eframe::egui::Color32;

use super::{AgeSelection, DIMMED_OPACITY};
use crate::color::LogColorScale;
use crate::data::model::{AgeBracket, MortalityTable};

/// One rectangle of the country × age heatmap.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatCell {
    /// Index of the source row in the table.
    pub row: usize,
    /// Column in [`HeatmapModel::ages`].
    pub age_idx: usize,
    /// Row in [`HeatmapModel::countries`].
    pub country_idx: usize,
    pub rate: f64,
    pub color: Color32,
    pub opacity: f32,
    pub tooltip: String,
}

/// Everything needed to draw the heatmap for one subset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeatmapModel {
    pub title: String,
    /// x axis, canonical age order.
    pub ages: Vec<AgeBracket>,
    /// y axis, alphabetical.
    pub countries: Vec<String>,
    pub cells: Vec<HeatCell>,
}

impl HeatmapModel {
    pub fn build(
        table: &MortalityTable,
        subset: &[usize],
        selection: &AgeSelection,
        scale: &LogColorScale,
        title: String,
    ) -> Self {
        let ages: Vec<AgeBracket> = subset
            .iter()
            .map(|&i| table.records[i].age.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let countries: Vec<String> = subset
            .iter()
            .map(|&i| table.records[i].country.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect();

        let cells = subset
            .iter()
            .filter_map(|&i| {
                let rec = &table.records[i];
                let age_idx = ages.iter().position(|a| *a == rec.age)?;
                let country_idx = countries.iter().position(|c| *c == rec.country)?;
                let opacity = if selection.matches(&rec.age) {
                    1.0
                } else {
                    DIMMED_OPACITY
                };
                Some(HeatCell {
                    row: i,
                    age_idx,
                    country_idx,
                    rate: rec.rate,
                    color: scale.color_for(rec.rate),
                    opacity,
                    tooltip: format!("Rate: {:.4}", rec.rate),
                })
            })
            .collect();

        HeatmapModel {
            title,
            ages,
            countries,
            cells,
        }
    }

    /// Cell under the given grid coordinates, if any.
    pub fn cell_at(&self, age_idx: usize, country_idx: usize) -> Option<&HeatCell> {
        self.cells
            .iter()
            .find(|c| c.age_idx == age_idx && c.country_idx == country_idx)
    }
}
