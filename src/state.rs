use std::sync::Arc;

use crate::charts::{bar_title, heatmap_title, AgeSelection, BarModel, HeatmapModel};
use crate::color::LogColorScale;
use crate::data::diagnostics::{coverage, Coverage};
use crate::data::filter::{clamp_year, filtered_indices, FilterSelection};
use crate::data::model::{AgeBracket, MortalityTable, Sex};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
///
/// Every widget event goes through one of the setters below, which re-derive
/// the subset and both chart models. The table itself is never touched.
pub struct AppState {
    /// Merged table, loaded once at startup.
    pub table: Arc<MortalityTable>,

    /// Current widget values.
    pub filters: FilterSelection,

    /// Indices of rows passing the current filters.
    pub visible_indices: Vec<usize>,

    /// Age clicked in the heatmap, read by both charts.
    pub age_selection: AgeSelection,

    /// Requested vs. present countries for the current subset.
    pub coverage: Coverage,

    pub heatmap: HeatmapModel,
    pub bars: BarModel,

    /// Text typed into the country search box.
    pub country_query: String,

    scale: LogColorScale,
}

impl AppState {
    pub fn new(table: Arc<MortalityTable>, filters: FilterSelection) -> Self {
        let mut state = Self {
            table,
            filters,
            visible_indices: Vec::new(),
            age_selection: AgeSelection::default(),
            coverage: Coverage::NoData,
            heatmap: HeatmapModel::default(),
            bars: BarModel::default(),
            country_query: String::new(),
            scale: LogColorScale::default(),
        };
        state.refilter();
        state
    }

    pub fn scale(&self) -> &LogColorScale {
        &self.scale
    }

    /// Recompute the subset, diagnostics and charts after a filter change.
    pub fn refilter(&mut self) {
        self.visible_indices = filtered_indices(&self.table, &self.filters);
        self.coverage = coverage(&self.table, &self.visible_indices, &self.filters.countries);

        let table = &self.table;
        self.age_selection
            .retain_within(self.visible_indices.iter().map(|&i| &table.records[i].age));

        log::debug!(
            "year={} sex={} countries={} cancer={:?}: {} rows",
            self.filters.year,
            self.filters.sex,
            self.filters.countries.len(),
            self.filters.cancer,
            self.visible_indices.len()
        );
        self.rebuild_charts();
    }

    /// Rebuild both chart models from the current subset and age selection.
    fn rebuild_charts(&mut self) {
        let cancer = self.filters.cancer.as_deref().unwrap_or("Cancer");
        self.heatmap = HeatmapModel::build(
            &self.table,
            &self.visible_indices,
            &self.age_selection,
            &self.scale,
            heatmap_title(cancer, self.filters.sex, self.filters.year),
        );
        self.bars = BarModel::build(
            &self.table,
            &self.visible_indices,
            &self.age_selection,
            bar_title(self.filters.sex, self.filters.year),
        );
    }

    pub fn set_year(&mut self, year: i32) {
        self.filters.year = clamp_year(self.table.year_range, year);
        self.refilter();
    }

    pub fn set_sex(&mut self, sex: Sex) {
        self.filters.sex = sex;
        self.refilter();
    }

    pub fn set_cancer(&mut self, cancer: String) {
        self.filters.cancer = Some(cancer);
        self.refilter();
    }

    /// Toggle a single country in the multi-select.
    pub fn toggle_country(&mut self, country: &str) {
        if !self.filters.countries.remove(country) {
            self.filters.countries.insert(country.to_string());
        }
        self.refilter();
    }

    /// Select every country in the table.
    pub fn select_all_countries(&mut self) {
        self.filters.countries = self.table.countries.iter().cloned().collect();
        self.refilter();
    }

    /// Deselect all countries.
    pub fn select_no_countries(&mut self) {
        self.filters.countries.clear();
        self.refilter();
    }

    /// Heatmap click. Only the chart models change; the subset stays.
    pub fn click_age(&mut self, age: &AgeBracket) {
        self.age_selection.click(age);
        self.rebuild_charts();
    }

    pub fn clear_age_selection(&mut self) {
        if self.age_selection.get().is_some() {
            self.age_selection.clear();
            self.rebuild_charts();
        }
    }

    /// Countries offered by the multi-select, narrowed by the search box.
    /// Selected countries are always listed.
    pub fn country_options(&self) -> Vec<&str> {
        let query = self.country_query.trim().to_lowercase();
        self.table
            .countries
            .iter()
            .map(String::as_str)
            .filter(|c| {
                query.is_empty()
                    || c.to_lowercase().contains(&query)
                    || self.filters.countries.contains(*c)
            })
            .collect()
    }
}
