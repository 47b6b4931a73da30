use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use nutri_panda::data::model::FoodRecord;

use crate::state::AppState;
use crate::ui::plot;

// ---------------------------------------------------------------------------
// Left side panel – prediction and recommendation inputs
// ---------------------------------------------------------------------------

/// Render the left input panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Predict calories");
            ui.separator();

            egui::Grid::new("prediction_inputs")
                .num_columns(2)
                .show(ui, |ui: &mut Ui| {
                    for (feature, value) in state.inputs.iter_mut() {
                        ui.label(feature_label(feature));
                        ui.add(
                            egui::DragValue::new(value)
                                .speed(0.1)
                                .range(0.0..=f64::MAX)
                                .suffix(" g"),
                        );
                        ui.end_row();
                    }
                });

            if ui.button("Predict calories").clicked() {
                state.predict();
            }
            match &state.prediction {
                Some(Ok(kcal)) => {
                    ui.label(RichText::new(format!("Estimated calories: {kcal:.2} kcal")).strong());
                }
                Some(Err(e)) => {
                    ui.label(RichText::new(e.to_string()).color(Color32::RED));
                }
                None => {}
            }

            ui.add_space(12.0);
            ui.heading("Recommend foods");
            ui.separator();

            let query = &mut state.query;
            ui.add(egui::Slider::new(&mut query.max_calories, 50.0..=1000.0).text("Max calories"));
            ui.add(egui::Slider::new(&mut query.min_protein, 0.0..=50.0).text("Min protein (g)"));
            ui.add(egui::Slider::new(&mut query.max_fat, 0.0..=50.0).text("Max fat (g)"));
            ui.add(egui::Slider::new(&mut query.top_n, 1..=50).text("Top N foods"));

            if ui.button("Recommend foods").clicked() {
                state.recommend();
            }
        });
}

/// `"carbohydrate"` → `"Carbohydrate"`, underscores as spaces.
fn feature_label(feature: &str) -> String {
    let text = feature.replace('_', " ");
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Central panel – recommendations and breakdown
// ---------------------------------------------------------------------------

/// Render the recommendation results and the macro breakdown of one food.
pub fn central_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Recommended foods");
    match &state.recommendations {
        None => {
            ui.label("Set your goals and press \"Recommend foods\".");
        }
        Some(Ok(recs)) if recs.is_empty() => {
            ui.label(
                RichText::new("No matching foods found. Try adjusting the filters.")
                    .color(Color32::YELLOW),
            );
        }
        Some(Ok(recs)) => recommendation_table(ui, recs),
        Some(Err(e)) => {
            ui.label(RichText::new(e.to_string()).color(Color32::RED));
        }
    }

    ui.add_space(12.0);
    ui.separator();
    ui.heading("Nutrient breakdown");

    let current = state.selected_food.clone().unwrap_or_default();
    let mut picked: Option<String> = None;
    egui::ComboBox::from_id_salt("food_select")
        .selected_text(current.as_str())
        .width(320.0)
        .show_ui(ui, |ui: &mut Ui| {
            for name in &state.food_names {
                if ui.selectable_label(current == *name, name.as_str()).clicked() {
                    picked = Some(name.clone());
                }
            }
        });
    if picked.is_some() {
        state.select_food(picked);
    }

    match &state.breakdown {
        Some(Ok(breakdown)) => plot::macro_charts(ui, breakdown),
        Some(Err(e)) => {
            ui.label(RichText::new(e.to_string()).color(Color32::RED));
        }
        None => {
            ui.label("No food selected.");
        }
    }
}

fn recommendation_table(ui: &mut Ui, recs: &[FoodRecord]) {
    TableBuilder::new(ui)
        .striped(true)
        .max_scroll_height(280.0)
        .column(Column::auto().at_least(220.0))
        .columns(Column::auto().at_least(80.0), 3)
        .column(Column::remainder())
        .header(20.0, |mut header| {
            for title in ["Name", "Calories", "Protein", "Fat", "Carbohydrate"] {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|mut body| {
            for rec in recs {
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.label(rec.display_name());
                    });
                    for value in [rec.calories(), rec.protein(), rec.fat(), rec.carbohydrate()] {
                        row.col(|ui| {
                            ui.label(format!("{value:.1}"));
                        });
                    }
                });
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open dataset…").clicked() {
                open_dataset_dialog(state);
                ui.close_menu();
            }
            if ui.button("Open pipeline…").clicked() {
                open_pipeline_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        ui.label(format!(
            "{} foods loaded from {}",
            state.service.table().len(),
            state.config.dataset_path.display()
        ));

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_dataset_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open nutrition dataset")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.open_dataset(path);
    }
}

pub fn open_pipeline_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open prediction pipeline")
        .add_filter("Pipeline bundle", &["json"])
        .pick_file();

    if let Some(path) = file {
        state.open_pipeline(path);
    }
}
