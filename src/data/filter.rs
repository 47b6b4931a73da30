use super::model::{FoodRecord, FoodTable};
use crate::error::{NutritionError, Result};

// ---------------------------------------------------------------------------
// Recommendation query: thresholds + protein ranking
// ---------------------------------------------------------------------------

/// Nutrition goals used to pick foods from the table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecommendQuery {
    pub max_calories: f64,
    pub min_protein: f64,
    pub max_fat: f64,
    pub top_n: usize,
}

impl Default for RecommendQuery {
    fn default() -> Self {
        Self {
            max_calories: 200.0,
            min_protein: 5.0,
            max_fat: 10.0,
            top_n: 10,
        }
    }
}

impl RecommendQuery {
    /// Thresholds must be finite and non-negative, `top_n` at least 1.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("max_calories", self.max_calories),
            ("min_protein", self.min_protein),
            ("max_fat", self.max_fat),
        ] {
            if !value.is_finite() {
                return Err(NutritionError::invalid(field, "must be a finite number"));
            }
            if value < 0.0 {
                return Err(NutritionError::invalid(field, "must be non-negative"));
            }
        }
        if self.top_n == 0 {
            return Err(NutritionError::invalid("top_n", "must be at least 1"));
        }
        Ok(())
    }

    /// Whether a record satisfies all three thresholds.
    pub fn matches(&self, record: &FoodRecord) -> bool {
        record.calories() <= self.max_calories
            && record.protein() >= self.min_protein
            && record.fat() <= self.max_fat
    }
}

/// Return up to `top_n` records passing the thresholds, highest protein
/// first.  Ties keep table order.  No match is an empty result.
pub fn recommend<'a>(table: &'a FoodTable, query: &RecommendQuery) -> Result<Vec<&'a FoodRecord>> {
    query.validate()?;

    let mut selected: Vec<&FoodRecord> = table
        .records
        .iter()
        .filter(|r| query.matches(r))
        .collect();

    // `sort_by` is stable, so equal protein values stay in row order.
    selected.sort_by(|a, b| b.protein().total_cmp(&a.protein()));
    selected.truncate(query.top_n);
    Ok(selected)
}
