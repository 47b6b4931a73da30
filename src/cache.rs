//! Construct-once, read-many storage for the loaded table and pipeline.
//!
//! Each source path gets one slot.  The first caller for a path runs the
//! construction; callers arriving while it runs block on the same slot and
//! receive the same `Arc` (or the same error).  Successful builds are never
//! evicted, so a path always maps to the table that was first built from it.
//! A failed slot is dropped once its waiters have the error, and the next
//! request for that path builds again.

use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use crate::data::clean::{normalize_with, EmptyColumnPolicy};
use crate::data::loader::load_file;
use crate::data::model::{FoodTable, NAME_COLUMN, REQUIRED_NUTRIENTS};
use crate::error::{NutritionError, Result};
use crate::pipeline::{load_pipeline, PredictionPipeline};
use crate::service::NutritionService;

type Slot<V> = Arc<OnceLock<Result<Arc<V>>>>;

/// Single-flight memo keyed by `K`.
pub struct SingleFlight<K, V> {
    slots: Mutex<HashMap<K, Slot<V>>>,
}

impl<K: Eq + Hash + Clone, V> Default for SingleFlight<K, V> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone, V> SingleFlight<K, V> {
    /// Return the value for `key`, running `build` only if no successful
    /// construction for that key has happened or is in progress.
    pub fn get_or_build<F>(&self, key: &K, build: F) -> Result<Arc<V>>
    where
        F: FnOnce() -> Result<V>,
    {
        // The map lock only guards slot lookup; construction runs outside it
        // so different keys build in parallel.
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.entry(key.clone()).or_default().clone()
        };
        let result = slot.get_or_init(|| build().map(Arc::new)).clone();

        if result.is_err() {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            // A retry may already have replaced the slot.
            if slots.get(key).is_some_and(|s| Arc::ptr_eq(s, &slot)) {
                slots.remove(key);
            }
        }
        result
    }
}

// ---------------------------------------------------------------------------
// ResourceCache
// ---------------------------------------------------------------------------

/// Process-wide cache of normalized tables and pipelines.
///
/// Created once in `main` and shared by the dashboard; every table it builds
/// uses the same protected columns and empty-column policy.
pub struct ResourceCache {
    protected_columns: BTreeSet<String>,
    empty_column_policy: EmptyColumnPolicy,
    tables: SingleFlight<PathBuf, FoodTable>,
    pipelines: SingleFlight<PathBuf, PredictionPipeline>,
}

impl ResourceCache {
    pub fn new(protected_columns: BTreeSet<String>, empty_column_policy: EmptyColumnPolicy) -> Self {
        Self {
            protected_columns,
            empty_column_policy,
            tables: SingleFlight::default(),
            pipelines: SingleFlight::default(),
        }
    }

    /// Load and normalize the dataset at `path`, at most once per path.
    pub fn table(&self, path: &Path) -> Result<Arc<FoodTable>> {
        self.tables.get_or_build(&path.to_path_buf(), || {
            let raw = load_file(path)?;
            if raw.column_index(NAME_COLUMN).is_none() {
                return Err(NutritionError::Load(format!(
                    "dataset is missing required column(s): {NAME_COLUMN}"
                )));
            }
            let table = normalize_with(&raw, &self.protected_columns, self.empty_column_policy)?;
            table.require_columns(&REQUIRED_NUTRIENTS)?;
            log::info!(
                "Normalized {} foods with nutrient columns {:?}",
                table.len(),
                table.nutrient_columns
            );
            Ok(table)
        })
    }

    /// Load the pipeline bundle at `path`, at most once per path.
    pub fn pipeline(&self, path: &Path) -> Result<Arc<PredictionPipeline>> {
        self.pipelines
            .get_or_build(&path.to_path_buf(), || Ok(load_pipeline(path)?))
    }

    /// Build the query facade over the cached table and pipeline.
    pub fn service(&self, dataset: &Path, pipeline: &Path) -> Result<NutritionService> {
        let table = self.table(dataset)?;
        let pipeline = self.pipeline(pipeline)?;
        Ok(NutritionService::new(table, pipeline))
    }
}
