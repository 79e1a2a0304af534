use eframe::egui::{self, RichText, ScrollArea, Ui};

use crate::data::model::Sex;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel. Each widget change re-runs the filters.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    year_slider(ui, state);
    ui.add_space(6.0);
    sex_radio(ui, state);
    ui.add_space(6.0);
    cancer_select(ui, state);
    ui.separator();
    country_select(ui, state);
}

fn year_slider(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Year");
    let Some((lo, hi)) = state.table.year_range else {
        ui.label("No years available.");
        return;
    };
    let mut year = state.filters.year;
    if ui.add(egui::Slider::new(&mut year, lo..=hi)).changed() {
        state.set_year(year);
    }
}

fn sex_radio(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Sex");
    ui.horizontal(|ui: &mut Ui| {
        for sex in Sex::ALL {
            if ui.radio(state.filters.sex == sex, sex.code()).clicked() && state.filters.sex != sex
            {
                state.set_sex(sex);
            }
        }
    });
}

fn cancer_select(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Cancer");
    let current = state.filters.cancer.clone().unwrap_or_default();
    let mut chosen: Option<String> = None;
    egui::ComboBox::from_id_salt("cancer")
        .selected_text(current.as_str())
        .width(ui.available_width() - 8.0)
        .show_ui(ui, |ui: &mut Ui| {
            for cancer in &state.table.cancers {
                if ui.selectable_label(current == *cancer, cancer.as_str()).clicked() {
                    chosen = Some(cancer.clone());
                }
            }
        });
    if let Some(cancer) = chosen.filter(|c| *c != current) {
        state.set_cancer(cancer);
    }
}

fn country_select(ui: &mut Ui, state: &mut AppState) {
    let n_selected = state.filters.countries.len();
    let n_total = state.table.countries.len();
    ui.strong(format!("Countries  ({n_selected}/{n_total})"));

    ui.horizontal(|ui: &mut Ui| {
        if ui.small_button("All").clicked() {
            state.select_all_countries();
        }
        if ui.small_button("None").clicked() {
            state.select_no_countries();
        }
    });
    ui.add(egui::TextEdit::singleline(&mut state.country_query).hint_text("Search…"));

    // Clone what we need so we can mutate state after the loop.
    let options: Vec<String> = state
        .country_options()
        .into_iter()
        .map(str::to_string)
        .collect();
    let mut toggled: Option<String> = None;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for country in &options {
                let mut checked = state.filters.countries.contains(country);
                if ui.checkbox(&mut checked, country.as_str()).changed() {
                    toggled = Some(country.clone());
                }
            }
        });

    if let Some(country) = toggled {
        state.toggle_country(&country);
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the status bar above the charts.
pub fn top_bar(ui: &mut Ui, state: &AppState) {
    ui.horizontal(|ui: &mut Ui| {
        ui.label(RichText::new("Cancer Mortality Atlas").strong());
        ui.separator();
        ui.label(format!(
            "{} rows loaded, {} visible",
            state.table.len(),
            state.visible_indices.len()
        ));
        if let Some(age) = state.age_selection.get() {
            ui.separator();
            ui.label(format!("Selected age: {age}"));
        }
    });
}
