//! Renderer-independent chart models.
//!
//! Both charts are built from the same filtered rows. The heatmap owns the
//! age selection; the bar chart only reads it.

pub mod bars;
pub mod heatmap;

pub use bars::BarModel;
pub use heatmap::HeatmapModel;

use crate::data::model::{AgeBracket, Sex};

/// Opacity of heatmap cells outside the current age selection.
pub const DIMMED_OPACITY: f32 = 0.2;

/// Shared click selection over the Age field.
///
/// Unset means "everything selected": the heatmap draws all cells at full
/// opacity and the bar chart shows every age.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgeSelection {
    selected: Option<AgeBracket>,
}

impl AgeSelection {
    pub fn get(&self) -> Option<&AgeBracket> {
        self.selected.as_ref()
    }

    /// Select `age`, or clear the selection when `age` is already selected.
    pub fn click(&mut self, age: &AgeBracket) {
        if self.selected.as_ref() == Some(age) {
            self.selected = None;
        } else {
            self.selected = Some(age.clone());
        }
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }

    pub fn matches(&self, age: &AgeBracket) -> bool {
        self.selected.as_ref().map_or(true, |s| s == age)
    }

    /// Drop the selection if its age is not among `available`.
    pub fn retain_within<'a>(&mut self, mut available: impl Iterator<Item = &'a AgeBracket>) {
        if let Some(selected) = &self.selected {
            if !available.any(|a| a == selected) {
                log::debug!("Age selection {selected} no longer present, clearing");
                self.selected = None;
            }
        }
    }
}

pub fn heatmap_title(cancer: &str, sex: Sex, year: i32) -> String {
    format!("{cancer} mortality rates for {} in {year}", sex.label())
}

pub fn bar_title(sex: Sex, year: i32) -> String {
    format!("Population size of each country for {} in {year}", sex.label())
}
