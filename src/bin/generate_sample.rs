//! Writes a small, deliberately messy nutrition table (`nutrition.csv` and
//! `nutrition.parquet`) plus a matching `pipeline.json`, so the dashboard can
//! be started without the full dataset.

use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde_json::json;

/// name, serving, calories, protein, fat, carbohydrate, fiber, sodium (mg)
type Food = (&'static str, &'static str, f64, f64, f64, f64, f64, f64);

const FOODS: &[Food] = &[
    ("Chicken breast, roasted", "100 g", 165.0, 31.0, 3.6, 0.0, 0.0, 74.0),
    ("Egg, whole, boiled", "100 g", 155.0, 12.6, 10.6, 1.1, 0.0, 124.0),
    ("Egg white, raw", "100 g", 52.0, 10.9, 0.2, 0.7, 0.0, 166.0),
    ("Tofu, firm", "100 g", 76.0, 8.1, 4.8, 1.9, 0.3, 7.0),
    ("Tuna, canned in water", "100 g", 116.0, 25.5, 0.8, 0.0, 0.0, 247.0),
    ("Cod, baked", "100 g", 105.0, 22.8, 0.9, 0.0, 0.0, 78.0),
    ("Shrimp, cooked", "100 g", 99.0, 24.0, 0.3, 0.2, 0.0, 111.0),
    ("Lentils, boiled", "100 g", 116.0, 9.0, 0.4, 20.1, 7.9, 2.0),
    ("Chickpeas, boiled", "100 g", 164.0, 8.9, 2.6, 27.4, 7.6, 7.0),
    ("Black beans, boiled", "100 g", 132.0, 8.9, 0.5, 23.7, 8.7, 1.0),
    ("Greek yogurt, nonfat", "100 g", 59.0, 10.2, 0.4, 3.6, 0.0, 36.0),
    ("Cottage cheese, lowfat", "100 g", 72.0, 12.4, 1.0, 2.7, 0.0, 406.0),
    ("Milk, whole", "100 g", 61.0, 3.2, 3.3, 4.8, 0.0, 43.0),
    ("Cheddar cheese", "100 g", 403.0, 24.9, 33.1, 1.3, 0.0, 621.0),
    ("Almonds", "100 g", 579.0, 21.2, 49.9, 21.6, 12.5, 1.0),
    ("Peanut butter", "100 g", 588.0, 25.1, 50.4, 19.6, 6.0, 459.0),
    ("Oats, rolled", "100 g", 379.0, 13.2, 6.5, 67.7, 10.1, 6.0),
    ("Rice, white, cooked", "100 g", 130.0, 2.7, 0.3, 28.2, 0.4, 1.0),
    ("Bread, whole wheat", "100 g", 247.0, 13.0, 3.4, 41.3, 6.8, 400.0),
    ("Pasta, cooked", "100 g", 158.0, 5.8, 0.9, 30.9, 1.8, 1.0),
    ("Potato, baked", "100 g", 93.0, 2.5, 0.1, 21.2, 2.2, 10.0),
    ("Broccoli, raw", "100 g", 34.0, 2.8, 0.4, 6.6, 2.6, 33.0),
    ("Spinach, raw", "100 g", 23.0, 2.9, 0.4, 3.6, 2.2, 79.0),
    ("Apple, raw", "100 g", 52.0, 0.3, 0.2, 13.8, 2.4, 1.0),
    ("Banana, raw", "100 g", 89.0, 1.1, 0.3, 22.8, 2.6, 1.0),
    ("Avocado, raw", "100 g", 160.0, 2.0, 14.7, 8.5, 6.7, 7.0),
    ("Salmon, atlantic, cooked", "100 g", 206.0, 22.1, 12.4, 0.0, 0.0, 61.0),
    ("Beef, ground, 90% lean", "100 g", 217.0, 26.1, 11.7, 0.0, 0.0, 72.0),
    ("Butter, salted", "100 g", 717.0, 0.9, 81.1, 0.1, 0.0, 643.0),
    ("Olive oil", "100 g", 884.0, 0.0, 100.0, 0.0, 0.0, 2.0),
    ("Cornstarch", "100 g", 381.0, 0.3, 0.1, 91.3, 0.9, 9.0),
    ("Dark chocolate, 70%", "100 g", 598.0, 7.8, 42.6, 45.9, 10.9, 20.0),
];

/// Atwater factors for protein, fat and carbohydrate; fiber is dropped by
/// the selector.
const MACRO_WEIGHTS: [f64; 3] = [4.0, 9.0, 4.0];

/// Render a value the way scraped nutrition tables tend to: unit suffixes,
/// stray placeholders and blanks.
fn messy(value: f64, unit: &str, row: usize, col: usize) -> Option<String> {
    match (row * 7 + col * 3) % 17 {
        0 => None,
        1 => Some("--".to_string()),
        2 | 3 => Some(format!("{value}")),
        4 => Some(format!("{value:.2} {unit}")),
        _ => Some(format!("{value}{unit}")),
    }
}

fn mean_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

struct Columns {
    calories: Vec<Option<String>>,
    protein: Vec<Option<String>>,
    fat: Vec<Option<String>>,
    carbohydrate: Vec<Option<String>>,
    fiber: Vec<Option<String>>,
    sodium: Vec<Option<String>>,
}

fn column(get: fn(&Food) -> f64, unit: &str, idx: usize) -> Vec<Option<String>> {
    FOODS
        .iter()
        .enumerate()
        .map(|(row, food)| messy(get(food), unit, row, idx))
        .collect()
}

fn messy_columns() -> Columns {
    Columns {
        calories: column(|f| f.2, "kcal", 0),
        protein: column(|f| f.3, "g", 1),
        fat: column(|f| f.4, "g", 2),
        carbohydrate: column(|f| f.5, "g", 3),
        fiber: column(|f| f.6, "g", 4),
        sodium: column(|f| f.7, "mg", 5),
    }
}

fn write_csv(path: &str, cols: &Columns) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    writer.write_record([
        "", "name", "serving_size", "calories", "protein", "fat", "carbohydrate", "fiber",
        "sodium",
    ])?;
    for (row, food) in FOODS.iter().enumerate() {
        let cell = |c: &Vec<Option<String>>| c[row].clone().unwrap_or_default();
        writer.write_record([
            row.to_string(),
            food.0.to_string(),
            food.1.to_string(),
            cell(&cols.calories),
            cell(&cols.protein),
            cell(&cols.fat),
            cell(&cols.carbohydrate),
            cell(&cols.fiber),
            cell(&cols.sodium),
        ])?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

/// Same table as Parquet; calories stored as a numeric column with nulls,
/// the other nutrients as raw text.
fn write_parquet(path: &str, cols: &Columns) -> Result<()> {
    let text = |c: &Vec<Option<String>>| -> ArrayRef {
        Arc::new(StringArray::from(c.iter().map(|v| v.as_deref()).collect::<Vec<_>>()))
    };
    let calories: Float64Array = FOODS
        .iter()
        .enumerate()
        .map(|(row, food)| cols.calories[row].as_ref().map(|_| food.2))
        .collect();

    let schema = Arc::new(Schema::new(vec![
        Field::new("unnamed_0", DataType::Int64, false),
        Field::new("name", DataType::Utf8, false),
        Field::new("serving_size", DataType::Utf8, false),
        Field::new("calories", DataType::Float64, true),
        Field::new("protein", DataType::Utf8, true),
        Field::new("fat", DataType::Utf8, true),
        Field::new("carbohydrate", DataType::Utf8, true),
        Field::new("fiber", DataType::Utf8, true),
        Field::new("sodium", DataType::Utf8, true),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from_iter_values(0..FOODS.len() as i64)),
            Arc::new(StringArray::from_iter_values(FOODS.iter().map(|f| f.0))),
            Arc::new(StringArray::from_iter_values(FOODS.iter().map(|f| f.1))),
            Arc::new(calories),
            text(&cols.protein),
            text(&cols.fat),
            text(&cols.carbohydrate),
            text(&cols.fiber),
            text(&cols.sodium),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

/// Standard scaler fitted on the clean values, mask dropping fiber, and a
/// linear model equivalent to the Atwater sum on the unscaled inputs.
fn write_pipeline(path: &str) -> Result<()> {
    let features: [fn(&Food) -> f64; 4] = [|f| f.3, |f| f.4, |f| f.5, |f| f.6];
    let stats: Vec<(f64, f64)> = features
        .iter()
        .map(|get| mean_std(&FOODS.iter().map(*get).collect::<Vec<_>>()))
        .collect();

    let coefficients: Vec<f64> = MACRO_WEIGHTS
        .iter()
        .zip(&stats)
        .map(|(w, (_, std))| w * std)
        .collect();
    let intercept: f64 = MACRO_WEIGHTS
        .iter()
        .zip(&stats)
        .map(|(w, (mean, _))| w * mean)
        .sum();

    let bundle = json!({
        "features": ["protein", "fat", "carbohydrate", "fiber"],
        "scaler": {
            "kind": "standard",
            "mean": stats.iter().map(|s| s.0).collect::<Vec<_>>(),
            "scale": stats.iter().map(|s| s.1).collect::<Vec<_>>(),
        },
        "selector": { "kind": "mask", "support": [true, true, true, false] },
        "model": { "kind": "linear", "coefficients": coefficients, "intercept": intercept },
    });
    let text = serde_json::to_string_pretty(&bundle).context("serializing pipeline")?;
    std::fs::write(path, text).context("writing pipeline")?;
    Ok(())
}

fn main() -> Result<()> {
    let cols = messy_columns();

    write_csv("nutrition.csv", &cols)?;
    write_parquet("nutrition.parquet", &cols)?;
    write_pipeline("pipeline.json")?;

    println!(
        "Wrote {} foods to nutrition.csv / nutrition.parquet and pipeline.json",
        FOODS.len()
    );
    Ok(())
}
