use super::model::{FoodRecord, FoodTable};
use crate::error::{NutritionError, Result};

/// Atwater factors, kcal per gram.
pub const PROTEIN_KCAL_PER_G: f64 = 4.0;
pub const FAT_KCAL_PER_G: f64 = 9.0;
pub const CARBOHYDRATE_KCAL_PER_G: f64 = 4.0;

/// One value per macronutrient (grams or kcal depending on context).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Macros {
    pub protein: f64,
    pub fat: f64,
    pub carbohydrate: f64,
}

impl Macros {
    pub fn total(&self) -> f64 {
        self.protein + self.fat + self.carbohydrate
    }

    /// `(label, value)` pairs in display order.
    pub fn labelled(&self) -> [(&'static str, f64); 3] {
        [
            ("Protein", self.protein),
            ("Fat", self.fat),
            ("Carbohydrates", self.carbohydrate),
        ]
    }
}

/// Macronutrient composition of a single food.
#[derive(Debug, Clone, PartialEq)]
pub struct MacroBreakdown {
    pub name: String,
    pub grams: Macros,
    pub calories_from_macro: Macros,
}

impl MacroBreakdown {
    pub fn from_record(record: &FoodRecord) -> Self {
        let grams = Macros {
            protein: record.protein(),
            fat: record.fat(),
            carbohydrate: record.carbohydrate(),
        };
        Self {
            name: record.display_name().to_string(),
            grams,
            calories_from_macro: Macros {
                protein: grams.protein * PROTEIN_KCAL_PER_G,
                fat: grams.fat * FAT_KCAL_PER_G,
                carbohydrate: grams.carbohydrate * CARBOHYDRATE_KCAL_PER_G,
            },
        }
    }

    /// Share of macro calories per macronutrient, in percent.  All zero when
    /// the food has no macro calories.
    pub fn calorie_shares(&self) -> Macros {
        let total = self.calories_from_macro.total();
        if total <= 0.0 {
            return Macros::default();
        }
        Macros {
            protein: self.calories_from_macro.protein / total * 100.0,
            fat: self.calories_from_macro.fat / total * 100.0,
            carbohydrate: self.calories_from_macro.carbohydrate / total * 100.0,
        }
    }
}

/// Breakdown for the first food named exactly `name`.
pub fn macro_breakdown(table: &FoodTable, name: &str) -> Result<MacroBreakdown> {
    table
        .find_by_name(name)
        .map(MacroBreakdown::from_record)
        .ok_or_else(|| NutritionError::NotFound {
            name: name.to_string(),
        })
}
