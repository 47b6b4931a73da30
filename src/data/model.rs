use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::{NutritionError, Result};

pub const NAME_COLUMN: &str = "name";
pub const SERVING_SIZE_COLUMN: &str = "serving_size";
pub const CALORIES: &str = "calories";
pub const PROTEIN: &str = "protein";
pub const FAT: &str = "fat";
pub const CARBOHYDRATE: &str = "carbohydrate";
pub const FIBER: &str = "fiber";

/// Columns every normalized table must provide for the facade queries.
pub const REQUIRED_NUTRIENTS: [&str; 4] = [CALORIES, PROTEIN, FAT, CARBOHYDRATE];

// ---------------------------------------------------------------------------
// RawCell – a single cell as read from the source
// ---------------------------------------------------------------------------

/// A cell before cleaning: already numeric, free text, or absent.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Number(f64),
    Text(String),
    Null,
}

impl fmt::Display for RawCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawCell::Number(v) => write!(f, "{v}"),
            RawCell::Text(s) => write!(f, "{s}"),
            RawCell::Null => write!(f, "<null>"),
        }
    }
}

impl RawCell {
    /// Text content of the cell, numbers rendered as-is, `None` for null.
    pub fn as_text(&self) -> Option<String> {
        match self {
            RawCell::Number(v) => Some(v.to_string()),
            RawCell::Text(s) => Some(s.clone()),
            RawCell::Null => None,
        }
    }
}

// ---------------------------------------------------------------------------
// RawTable – the source as loaded, before normalization
// ---------------------------------------------------------------------------

/// Column-ordered table of raw cells. Every row has one cell per column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<RawCell>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row, padding short rows with nulls and truncating long ones.
    pub fn push_row(&mut self, mut row: Vec<RawCell>) {
        row.resize(self.columns.len(), RawCell::Null);
        self.rows.push(row);
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// FoodRecord – one normalized row
// ---------------------------------------------------------------------------

/// A single food (one row of the normalized table).
#[derive(Debug, Clone, PartialEq)]
pub struct FoodRecord {
    /// Source row order, starting at 0.
    pub id: usize,
    pub name: Option<String>,
    /// Kept verbatim, never cleaned.
    pub serving_size: Option<String>,
    /// Cleaned and imputed numeric columns: column_name → value.
    pub nutrients: BTreeMap<String, f64>,
    /// Other protected columns (e.g. the exported index), kept as text.
    pub passthrough: BTreeMap<String, String>,
}

impl FoodRecord {
    /// Value of a nutrient column, NaN if the column is absent.
    pub fn nutrient(&self, column: &str) -> f64 {
        self.nutrients.get(column).copied().unwrap_or(f64::NAN)
    }

    pub fn calories(&self) -> f64 {
        self.nutrient(CALORIES)
    }

    pub fn protein(&self) -> f64 {
        self.nutrient(PROTEIN)
    }

    pub fn fat(&self) -> f64 {
        self.nutrient(FAT)
    }

    pub fn carbohydrate(&self) -> f64 {
        self.nutrient(CARBOHYDRATE)
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

// ---------------------------------------------------------------------------
// FoodTable – the complete normalized dataset
// ---------------------------------------------------------------------------

/// The normalized, immutable nutrition table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FoodTable {
    pub records: Vec<FoodRecord>,
    /// Ordered list of cleaned columns (source order).
    pub nutrient_columns: Vec<String>,
}

impl FoodTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First record whose name matches exactly.
    pub fn find_by_name(&self, name: &str) -> Option<&FoodRecord> {
        self.records
            .iter()
            .find(|r| r.name.as_deref() == Some(name))
    }

    /// Distinct non-empty food names, sorted, for the food selector.
    pub fn food_names(&self) -> Vec<String> {
        self.records
            .iter()
            .filter_map(|r| r.name.as_deref())
            .filter(|n| !n.is_empty())
            .collect::<BTreeSet<&str>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Fail with a load error if a column the queries depend on is missing.
    pub fn require_columns(&self, required: &[&str]) -> Result<()> {
        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|col| !self.nutrient_columns.iter().any(|c| c == col))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(NutritionError::Load(format!(
                "dataset is missing required column(s): {}",
                missing.join(", ")
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: usize, name: Option<&str>) -> FoodRecord {
        FoodRecord {
            id,
            name: name.map(str::to_string),
            serving_size: Some("100 g".to_string()),
            nutrients: BTreeMap::from([(PROTEIN.to_string(), 5.0)]),
            passthrough: BTreeMap::new(),
        }
    }

    #[test]
    fn test_push_row_pads_and_truncates() {
        let mut table = RawTable::new(vec!["a".into(), "b".into()]);
        table.push_row(vec![RawCell::Number(1.0)]);
        table.push_row(vec![
            RawCell::Null,
            RawCell::Text("x".into()),
            RawCell::Text("extra".into()),
        ]);
        assert_eq!(table.rows[0], vec![RawCell::Number(1.0), RawCell::Null]);
        assert_eq!(table.rows[1].len(), 2);
        assert_eq!(table.column_index("b"), Some(1));
    }

    #[test]
    fn test_missing_nutrient_is_nan() {
        let r = record(0, Some("Egg"));
        assert_eq!(r.protein(), 5.0);
        assert!(r.calories().is_nan());
    }

    #[test]
    fn test_find_by_name_returns_first_match() {
        let table = FoodTable {
            records: vec![record(0, Some("Egg")), record(1, Some("Egg")), record(2, None)],
            nutrient_columns: vec![PROTEIN.to_string()],
        };
        assert_eq!(table.find_by_name("Egg").map(|r| r.id), Some(0));
        assert!(table.find_by_name("Milk").is_none());
    }

    #[test]
    fn test_food_names_distinct_sorted() {
        let table = FoodTable {
            records: vec![
                record(0, Some("Tofu")),
                record(1, Some("Apple")),
                record(2, Some("Tofu")),
                record(3, None),
                record(4, Some("")),
            ],
            nutrient_columns: vec![],
        };
        assert_eq!(table.food_names(), vec!["Apple", "Tofu"]);
    }

    #[test]
    fn test_require_columns_lists_missing() {
        let table = FoodTable {
            records: vec![],
            nutrient_columns: vec![PROTEIN.to_string(), FAT.to_string()],
        };
        assert!(table.require_columns(&[PROTEIN]).is_ok());
        let err = table.require_columns(&REQUIRED_NUTRIENTS).unwrap_err();
        assert_eq!(
            err,
            NutritionError::Load(
                "dataset is missing required column(s): calories, carbohydrate".to_string()
            )
        );
    }
}
