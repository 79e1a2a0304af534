use eframe::egui::{self, pos2, vec2, Align2, Color32, FontId, Pos2, Rect, RichText, Sense, Ui};
use egui_plot::{Bar, BarChart, GridMark, Legend, Plot};

use crate::color::{generate_palette, LogColorScale};
use crate::data::model::CANONICAL_AGES;
use crate::state::AppState;

const COUNTRY_LABEL_WIDTH: f32 = 120.0;
const AGE_LABEL_HEIGHT: f32 = 22.0;
const CELL_HEIGHT: f32 = 22.0;
const MAX_CELL_WIDTH: f32 = 70.0;
const LEGEND_WIDTH: f32 = 90.0;
const LEGEND_HEIGHT: f32 = 160.0;
const BAR_ROW_HEIGHT: f32 = 26.0;

// ---------------------------------------------------------------------------
// Heatmap (country × age, colour = rate)
// ---------------------------------------------------------------------------

/// Render the heatmap and handle age clicks.
pub fn heatmap(ui: &mut Ui, state: &mut AppState) {
    ui.strong(state.heatmap.title.as_str());

    let model = &state.heatmap;
    if model.cells.is_empty() {
        ui.label("Nothing to show for this selection.");
        return;
    }

    let n_cols = model.ages.len();
    let n_rows = model.countries.len();
    let cell_w = ((ui.available_width() - COUNTRY_LABEL_WIDTH - LEGEND_WIDTH) / n_cols as f32)
        .clamp(20.0, MAX_CELL_WIDTH);
    let grid_h = CELL_HEIGHT * n_rows as f32;
    let size = vec2(
        COUNTRY_LABEL_WIDTH + cell_w * n_cols as f32 + LEGEND_WIDTH,
        (grid_h + AGE_LABEL_HEIGHT).max(LEGEND_HEIGHT + 20.0),
    );

    let (response, painter) = ui.allocate_painter(size, Sense::click());
    let origin = response.rect.min + vec2(COUNTRY_LABEL_WIDTH, 0.0);
    let cell = vec2(cell_w, CELL_HEIGHT);
    let text_color = ui.visuals().text_color();
    let font = FontId::proportional(12.0);

    for c in &model.cells {
        let min = origin + vec2(c.age_idx as f32 * cell_w, c.country_idx as f32 * CELL_HEIGHT);
        let rect = Rect::from_min_size(min, cell).shrink(0.5);
        painter.rect_filled(rect, 0.0, c.color.gamma_multiply(c.opacity));
    }
    for (j, country) in model.countries.iter().enumerate() {
        painter.text(
            pos2(origin.x - 6.0, origin.y + (j as f32 + 0.5) * CELL_HEIGHT),
            Align2::RIGHT_CENTER,
            country,
            font.clone(),
            text_color,
        );
    }
    for (i, age) in model.ages.iter().enumerate() {
        painter.text(
            pos2(origin.x + (i as f32 + 0.5) * cell_w, origin.y + grid_h + 4.0),
            Align2::CENTER_TOP,
            age.label(),
            font.clone(),
            text_color,
        );
    }

    let legend_origin = pos2(origin.x + cell_w * n_cols as f32 + 16.0, response.rect.min.y);
    color_legend(&painter, legend_origin, state.scale(), text_color);

    let hovered = response
        .hover_pos()
        .and_then(|p| grid_cell(origin, cell, p, n_cols, n_rows))
        .and_then(|(i, j)| model.cell_at(i, j))
        .map(|c| c.tooltip.clone());

    let clicked = if response.clicked() {
        Some(
            response
                .interact_pointer_pos()
                .and_then(|p| grid_cell(origin, cell, p, n_cols, n_rows))
                .and_then(|(i, j)| model.cell_at(i, j))
                .map(|c| model.ages[c.age_idx].clone()),
        )
    } else {
        None
    };

    if let Some(tooltip) = hovered {
        let _ = response.on_hover_text_at_pointer(tooltip);
    }
    match clicked {
        Some(Some(age)) => state.click_age(&age),
        Some(None) => state.clear_age_selection(),
        None => {}
    }
}

/// Map a pointer position to `(column, row)` of a grid starting at `origin`.
pub fn grid_cell(
    origin: Pos2,
    cell: egui::Vec2,
    pos: Pos2,
    n_cols: usize,
    n_rows: usize,
) -> Option<(usize, usize)> {
    let rel = pos - origin;
    if rel.x < 0.0 || rel.y < 0.0 {
        return None;
    }
    let col = (rel.x / cell.x) as usize;
    let row = (rel.y / cell.y) as usize;
    (col < n_cols && row < n_rows).then_some((col, row))
}

/// Vertical gradient with decade ticks, low values at the bottom.
fn color_legend(painter: &egui::Painter, origin: Pos2, scale: &LogColorScale, text_color: Color32) {
    const STEPS: usize = 48;
    const BAR_WIDTH: f32 = 14.0;
    let font = FontId::proportional(11.0);

    painter.text(
        origin,
        Align2::LEFT_TOP,
        "Mortality rate per 100k",
        font.clone(),
        text_color,
    );
    let top = origin.y + 18.0;
    let step_h = LEGEND_HEIGHT / STEPS as f32;
    for k in 0..STEPS {
        let t = 1.0 - (k as f32 + 0.5) / STEPS as f32;
        let rect = Rect::from_min_size(
            pos2(origin.x, top + k as f32 * step_h),
            vec2(BAR_WIDTH, step_h + 0.5),
        );
        painter.rect_filled(rect, 0.0, scale.color_at(t));
    }
    for tick in scale.ticks() {
        let y = top + (1.0 - scale.normalize(tick)) * LEGEND_HEIGHT;
        painter.text(
            pos2(origin.x + BAR_WIDTH + 4.0, y),
            Align2::LEFT_CENTER,
            format_tick(tick),
            font.clone(),
            text_color,
        );
    }
}

fn format_tick(v: f64) -> String {
    if v >= 1.0 {
        format!("{v:.0}")
    } else {
        format!("{v}")
    }
}

// ---------------------------------------------------------------------------
// Population bars (stacked by age, filtered by the age selection)
// ---------------------------------------------------------------------------

/// Render the population chart below the heatmap.
pub fn population_bars(ui: &mut Ui, state: &AppState) {
    let model = &state.bars;
    ui.strong(model.title.as_str());
    if model.countries.is_empty() {
        ui.label("Nothing to show for this selection.");
        return;
    }

    let palette = generate_palette(CANONICAL_AGES.len() + 1);
    let charts: Vec<BarChart> = model
        .ages
        .iter()
        .map(|age| {
            let color = palette[age.rank().unwrap_or(CANONICAL_AGES.len())];
            let bars: Vec<Bar> = model
                .segments
                .iter()
                .filter(|s| s.age == *age)
                .map(|s| {
                    Bar::new(s.country_idx as f64, s.pop)
                        .base_offset(s.offset)
                        .name(&s.tooltip)
                        .fill(color)
                        .width(0.7)
                })
                .collect();
            BarChart::new(bars).horizontal().color(color).name(age.label())
        })
        .collect();

    let widest = model.totals().into_iter().fold(0.0, f64::max);
    let labels = model.countries.clone();
    Plot::new("population_bars")
        .legend(Legend::default())
        .height(BAR_ROW_HEIGHT * labels.len() as f32 + 60.0)
        .x_axis_label("Population")
        .include_x(0.0)
        .include_x(widest * 1.05)
        .y_axis_formatter(move |mark: GridMark, _range| {
            let v = mark.value;
            if v < 0.0 || (v - v.round()).abs() > 1e-6 {
                return String::new();
            }
            labels.get(v.round() as usize).cloned().unwrap_or_default()
        })
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .show(ui, |plot_ui| {
            for chart in charts {
                plot_ui.bar_chart(chart);
            }
        });
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

pub fn diagnostics(ui: &mut Ui, state: &AppState) {
    if let Some(message) = state.coverage.message() {
        ui.label(RichText::new(message).color(ui.visuals().warn_fg_color));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_cell_inside() {
        let origin = pos2(100.0, 50.0);
        let cell = vec2(40.0, 20.0);
        assert_eq!(grid_cell(origin, cell, pos2(101.0, 51.0), 3, 2), Some((0, 0)));
        assert_eq!(grid_cell(origin, cell, pos2(185.0, 65.0), 3, 2), Some((2, 0)));
        assert_eq!(grid_cell(origin, cell, pos2(145.0, 89.0), 3, 2), Some((1, 1)));
    }

    #[test]
    fn test_grid_cell_outside() {
        let origin = pos2(100.0, 50.0);
        let cell = vec2(40.0, 20.0);
        assert_eq!(grid_cell(origin, cell, pos2(99.0, 60.0), 3, 2), None);
        assert_eq!(grid_cell(origin, cell, pos2(110.0, 49.0), 3, 2), None);
        assert_eq!(grid_cell(origin, cell, pos2(221.0, 60.0), 3, 2), None);
        assert_eq!(grid_cell(origin, cell, pos2(110.0, 91.0), 3, 2), None);
    }

    #[test]
    fn test_format_tick() {
        assert_eq!(format_tick(1000.0), "1000");
        assert_eq!(format_tick(1.0), "1");
        assert_eq!(format_tick(0.1), "0.1");
    }
}
