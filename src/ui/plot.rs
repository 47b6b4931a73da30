use eframe::egui::{RichText, Ui};
use egui_plot::{Bar, BarChart, Plot};

use nutri_panda::data::breakdown::{MacroBreakdown, Macros};

use crate::color::macro_colors;

// ---------------------------------------------------------------------------
// Macro breakdown charts (central panel)
// ---------------------------------------------------------------------------

/// Two bar charts side by side: grams per macro and calories per macro.
pub fn macro_charts(ui: &mut Ui, breakdown: &MacroBreakdown) {
    let shares = breakdown.calorie_shares();

    ui.columns(2, |cols: &mut [Ui]| {
        cols[0].strong("Macronutrient composition (g)");
        macro_bar_chart(&mut cols[0], "macro_grams", "grams", &breakdown.grams);

        cols[1].strong("Calorie contribution by macronutrient (kcal)");
        macro_bar_chart(
            &mut cols[1],
            "macro_calories",
            "kcal",
            &breakdown.calories_from_macro,
        );
        for ((label, pct), color) in shares.labelled().iter().zip(macro_colors()) {
            cols[1].label(RichText::new(format!("{label}: {pct:.1}%")).color(color));
        }
    });
}

fn macro_bar_chart(ui: &mut Ui, id: &str, unit: &str, values: &Macros) {
    let bars: Vec<Bar> = values
        .labelled()
        .iter()
        .zip(macro_colors())
        .enumerate()
        .map(|(i, ((label, value), color))| {
            Bar::new(i as f64, *value)
                .name(format!("{label} ({value:.1} {unit})"))
                .fill(color)
                .width(0.6)
        })
        .collect();

    Plot::new(id)
        .height(240.0)
        .y_axis_label(unit)
        .show_x(false)
        .allow_boxed_zoom(false)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));
        });
}
