use std::collections::BTreeMap;
use std::sync::Arc;

use crate::data::breakdown::{macro_breakdown, MacroBreakdown};
use crate::data::filter::{recommend, RecommendQuery};
use crate::data::model::{FoodRecord, FoodTable};
use crate::error::{NutritionError, Result};
use crate::pipeline::CaloriePredictor;

// ---------------------------------------------------------------------------
// Query / prediction facade
// ---------------------------------------------------------------------------

/// Read-only view over one normalized table and one loaded pipeline.
///
/// Both are shared behind `Arc` and never mutated, so a service can be
/// cloned freely and queried from any thread.
#[derive(Clone)]
pub struct NutritionService {
    table: Arc<FoodTable>,
    predictor: Arc<dyn CaloriePredictor>,
}

impl NutritionService {
    pub fn new(table: Arc<FoodTable>, predictor: Arc<dyn CaloriePredictor>) -> Self {
        Self { table, predictor }
    }

    pub fn table(&self) -> &FoodTable {
        &self.table
    }

    /// Feature names in the order the pipeline was trained on.
    pub fn feature_names(&self) -> &[String] {
        self.predictor.feature_names()
    }

    /// Estimate calories from macronutrient amounts.
    ///
    /// `inputs` must hold exactly the pipeline's features, each finite and
    /// non-negative; otherwise the pipeline is never invoked.
    pub fn predict_calories(&self, inputs: &BTreeMap<String, f64>) -> Result<f64> {
        let features = self.predictor.feature_names();

        for (name, value) in inputs {
            if !features.contains(name) {
                return Err(NutritionError::invalid(name, "not a model feature"));
            }
            if !value.is_finite() {
                return Err(NutritionError::invalid(name, "must be a finite number"));
            }
            if *value < 0.0 {
                return Err(NutritionError::invalid(name, "must be non-negative"));
            }
        }

        let vector = features
            .iter()
            .map(|name| {
                inputs
                    .get(name)
                    .copied()
                    .ok_or_else(|| NutritionError::invalid(name, "missing value"))
            })
            .collect::<Result<Vec<f64>>>()?;

        self.predictor.predict(&vector)
    }

    /// Foods within the calorie/fat limits and above the protein floor,
    /// best protein first.
    pub fn recommend_foods(&self, query: &RecommendQuery) -> Result<Vec<&FoodRecord>> {
        recommend(&self.table, query)
    }

    pub fn macro_breakdown(&self, food_name: &str) -> Result<MacroBreakdown> {
        macro_breakdown(&self.table, food_name)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::data::model::{CALORIES, CARBOHYDRATE, FAT, FIBER, PROTEIN};

    /// Sums protein*4 + fat*9 + carbohydrate*4 and counts invocations.
    struct FakePredictor {
        features: Vec<String>,
        calls: AtomicUsize,
    }

    impl FakePredictor {
        fn new() -> Self {
            Self {
                features: [PROTEIN, FAT, CARBOHYDRATE, FIBER]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl CaloriePredictor for FakePredictor {
        fn feature_names(&self) -> &[String] {
            &self.features
        }

        fn predict(&self, features: &[f64]) -> Result<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(features[0] * 4.0 + features[1] * 9.0 + features[2] * 4.0)
        }
    }

    fn table() -> FoodTable {
        let rec = |id: usize, name: &str, cal: f64, p: f64, f: f64, c: f64| FoodRecord {
            id,
            name: Some(name.to_string()),
            serving_size: None,
            nutrients: BTreeMap::from([
                (CALORIES.to_string(), cal),
                (PROTEIN.to_string(), p),
                (FAT.to_string(), f),
                (CARBOHYDRATE.to_string(), c),
            ]),
            passthrough: BTreeMap::new(),
        };
        FoodTable {
            records: vec![
                rec(0, "Greek yogurt", 59.0, 10.0, 0.4, 3.6),
                rec(1, "Almonds", 579.0, 21.0, 50.0, 22.0),
                rec(2, "Turkey", 135.0, 30.0, 1.0, 0.0),
            ],
            nutrient_columns: vec![
                CALORIES.into(),
                PROTEIN.into(),
                FAT.into(),
                CARBOHYDRATE.into(),
            ],
        }
    }

    fn service() -> (NutritionService, Arc<FakePredictor>) {
        let fake = Arc::new(FakePredictor::new());
        let svc = NutritionService::new(Arc::new(table()), fake.clone());
        (svc, fake)
    }

    fn inputs(protein: f64, fat: f64, carbohydrate: f64, fiber: f64) -> BTreeMap<String, f64> {
        BTreeMap::from([
            (PROTEIN.to_string(), protein),
            (FAT.to_string(), fat),
            (CARBOHYDRATE.to_string(), carbohydrate),
            (FIBER.to_string(), fiber),
        ])
    }

    #[test]
    fn test_predict_forwards_ordered_vector() {
        let (svc, fake) = service();
        let kcal = svc.predict_calories(&inputs(10.0, 2.0, 5.0, 1.0)).unwrap();
        assert!((kcal - 78.0).abs() < 1e-10);
        assert_eq!(fake.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_predict_negative_rejected_before_pipeline() {
        let (svc, fake) = service();
        let err = svc.predict_calories(&inputs(-1.0, 0.0, 0.0, 0.0)).unwrap_err();
        assert!(matches!(err, NutritionError::InvalidInput { ref field, .. } if field == "protein"));
        assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_predict_non_finite_rejected() {
        let (svc, fake) = service();
        for bad in [f64::NAN, f64::INFINITY] {
            let err = svc.predict_calories(&inputs(1.0, bad, 0.0, 0.0)).unwrap_err();
            assert!(matches!(err, NutritionError::InvalidInput { ref field, .. } if field == "fat"));
        }
        assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_predict_requires_exact_feature_set() {
        let (svc, fake) = service();

        let mut missing = inputs(1.0, 1.0, 1.0, 1.0);
        missing.remove(FIBER);
        let err = svc.predict_calories(&missing).unwrap_err();
        assert!(matches!(err, NutritionError::InvalidInput { ref field, .. } if field == "fiber"));

        let mut extra = inputs(1.0, 1.0, 1.0, 1.0);
        extra.insert("sugar".to_string(), 3.0);
        let err = svc.predict_calories(&extra).unwrap_err();
        assert!(matches!(err, NutritionError::InvalidInput { ref field, .. } if field == "sugar"));

        assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_recommend_through_service() {
        let (svc, _) = service();
        let query = RecommendQuery {
            max_calories: 200.0,
            min_protein: 5.0,
            max_fat: 10.0,
            top_n: 10,
        };
        let names: Vec<&str> = svc
            .recommend_foods(&query)
            .unwrap()
            .iter()
            .map(|r| r.display_name())
            .collect();
        assert_eq!(names, vec!["Turkey", "Greek yogurt"]);

        let none = RecommendQuery {
            max_calories: 0.0,
            ..query
        };
        assert!(svc.recommend_foods(&none).unwrap().is_empty());
    }

    #[test]
    fn test_breakdown_through_service() {
        let (svc, _) = service();
        let b = svc.macro_breakdown("Almonds").unwrap();
        assert_eq!(b.calories_from_macro.fat, 450.0);
        assert!(matches!(
            svc.macro_breakdown("Unknown Food XYZ"),
            Err(NutritionError::NotFound { .. })
        ));
    }
}
