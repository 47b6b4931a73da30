use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use nutri_panda::cache::ResourceCache;
use nutri_panda::config::AppConfig;
use nutri_panda::data::breakdown::MacroBreakdown;
use nutri_panda::data::filter::RecommendQuery;
use nutri_panda::data::model::FoodRecord;
use nutri_panda::error::NutritionError;
use nutri_panda::service::NutritionService;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Paths currently in use.
    pub config: AppConfig,
    cache: Arc<ResourceCache>,
    pub service: NutritionService,

    /// Sorted distinct food names (cached for the selector).
    pub food_names: Vec<String>,

    /// Prediction form: feature name → grams.
    pub inputs: BTreeMap<String, f64>,
    pub prediction: Option<Result<f64, NutritionError>>,

    /// Recommendation form and its last result.
    pub query: RecommendQuery,
    pub recommendations: Option<Result<Vec<FoodRecord>, NutritionError>>,

    /// Food picked for the breakdown charts.
    pub selected_food: Option<String>,
    pub breakdown: Option<Result<MacroBreakdown, NutritionError>>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: AppConfig, cache: Arc<ResourceCache>, service: NutritionService) -> Self {
        let mut state = Self {
            config,
            cache,
            service: service.clone(),
            food_names: Vec::new(),
            inputs: BTreeMap::new(),
            prediction: None,
            query: RecommendQuery::default(),
            recommendations: None,
            selected_food: None,
            breakdown: None,
            status_message: None,
        };
        state.set_service(service);
        state
    }

    /// Swap in a new table/pipeline pair and reset the derived results.
    pub fn set_service(&mut self, service: NutritionService) {
        self.food_names = service.table().food_names();
        self.inputs = service
            .feature_names()
            .iter()
            .map(|f| (f.clone(), self.inputs.get(f).copied().unwrap_or(0.0)))
            .collect();
        self.service = service;
        self.prediction = None;
        self.recommendations = None;

        // Keep the current selection if the new table still has it.
        let keep = self
            .selected_food
            .as_ref()
            .is_some_and(|name| self.food_names.binary_search(name).is_ok());
        if keep {
            self.refresh_breakdown();
        } else {
            let first = self.food_names.first().cloned();
            self.select_food(first);
        }
    }

    pub fn predict(&mut self) {
        let result = self.service.predict_calories(&self.inputs);
        if let Err(e) = &result {
            log::warn!("Prediction rejected: {e}");
        }
        self.prediction = Some(result);
    }

    pub fn recommend(&mut self) {
        let result = self
            .service
            .recommend_foods(&self.query)
            .map(|recs| recs.into_iter().cloned().collect::<Vec<_>>());
        match &result {
            Ok(recs) => log::info!("{} foods match {:?}", recs.len(), self.query),
            Err(e) => log::warn!("Recommendation rejected: {e}"),
        }
        self.recommendations = Some(result);
    }

    pub fn select_food(&mut self, name: Option<String>) {
        self.selected_food = name;
        self.refresh_breakdown();
    }

    fn refresh_breakdown(&mut self) {
        self.breakdown = self
            .selected_food
            .as_deref()
            .map(|name| self.service.macro_breakdown(name));
    }

    /// Replace the dataset, keeping the current pipeline.
    pub fn open_dataset(&mut self, path: PathBuf) {
        self.reload(path, self.config.pipeline_path.clone());
    }

    /// Replace the pipeline, keeping the current dataset.
    pub fn open_pipeline(&mut self, path: PathBuf) {
        self.reload(self.config.dataset_path.clone(), path);
    }

    fn reload(&mut self, dataset: PathBuf, pipeline: PathBuf) {
        match self.cache.service(&dataset, &pipeline) {
            Ok(service) => {
                log::info!(
                    "Loaded {} foods from {} with pipeline {}",
                    service.table().len(),
                    dataset.display(),
                    pipeline.display()
                );
                self.config.dataset_path = dataset;
                self.config.pipeline_path = pipeline;
                self.set_service(service);
                self.status_message = None;
            }
            Err(e) => {
                log::error!("Failed to load: {e}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }
}
