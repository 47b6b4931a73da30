//! Pre-trained calorie regression pipeline.
//!
//! The pipeline is read from a JSON bundle with the same parts as the
//! trained artefact: the feature order, a scaler, a feature selector and a
//! linear model.
//!
//! ```json
//! {
//!   "features": ["protein", "fat", "carbohydrate", "fiber"],
//!   "scaler":   { "kind": "standard", "mean": [..], "scale": [..] },
//!   "selector": { "kind": "mask", "support": [true, true, true, false] },
//!   "model":    { "kind": "linear", "coefficients": [..], "intercept": 0.0 }
//! }
//! ```

use std::path::Path;

use anyhow::{bail, ensure, Context};
use serde::{Deserialize, Serialize};

use crate::error::{NutritionError, Result};

// ---------------------------------------------------------------------------
// Capability traits
// ---------------------------------------------------------------------------

/// One named step that maps a feature vector to another feature vector.
pub trait Transform: Send + Sync {
    fn name(&self) -> &str;
    fn transform(&self, input: &[f64]) -> Result<Vec<f64>>;
}

/// Final step producing the scalar estimate.
pub trait Model: Send + Sync {
    fn predict(&self, input: &[f64]) -> Result<f64>;
}

/// What the query facade needs from a pipeline: the expected feature order
/// and a prediction over a vector in that order.
pub trait CaloriePredictor: Send + Sync {
    fn feature_names(&self) -> &[String];
    fn predict(&self, features: &[f64]) -> Result<f64>;
}

fn check_len(stage: &str, input: &[f64], expected: usize) -> Result<()> {
    if input.len() == expected {
        Ok(())
    } else {
        Err(NutritionError::Pipeline(format!(
            "{stage}: expected {expected} values, got {}",
            input.len()
        )))
    }
}

// ---------------------------------------------------------------------------
// Scalers
// ---------------------------------------------------------------------------

/// `(x - mean) / scale`
#[derive(Debug, Clone)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl Transform for StandardScaler {
    fn name(&self) -> &str {
        "standard_scaler"
    }

    fn transform(&self, input: &[f64]) -> Result<Vec<f64>> {
        check_len(self.name(), input, self.mean.len())?;
        Ok(input
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| (x - m) / s)
            .collect())
    }
}

/// `(x - min) / (max - min)`; constant features use a range of 1.
#[derive(Debug, Clone)]
pub struct MinMaxScaler {
    data_min: Vec<f64>,
    data_max: Vec<f64>,
}

impl Transform for MinMaxScaler {
    fn name(&self) -> &str {
        "min_max_scaler"
    }

    fn transform(&self, input: &[f64]) -> Result<Vec<f64>> {
        check_len(self.name(), input, self.data_min.len())?;
        Ok(input
            .iter()
            .zip(self.data_min.iter().zip(&self.data_max))
            .map(|(x, (min, max))| {
                let range = max - min;
                let range = if range.abs() < f64::EPSILON { 1.0 } else { range };
                (x - min) / range
            })
            .collect())
    }
}

#[derive(Debug, Clone)]
pub struct Passthrough {
    width: usize,
}

impl Transform for Passthrough {
    fn name(&self) -> &str {
        "passthrough"
    }

    fn transform(&self, input: &[f64]) -> Result<Vec<f64>> {
        check_len(self.name(), input, self.width)?;
        Ok(input.to_vec())
    }
}

// ---------------------------------------------------------------------------
// Selector
// ---------------------------------------------------------------------------

/// Keeps the trained subset of features, in input order.
#[derive(Debug, Clone)]
pub struct FeatureSelector {
    input_width: usize,
    indices: Vec<usize>,
}

impl Transform for FeatureSelector {
    fn name(&self) -> &str {
        "feature_selector"
    }

    fn transform(&self, input: &[f64]) -> Result<Vec<f64>> {
        check_len(self.name(), input, self.input_width)?;
        Ok(self.indices.iter().map(|&i| input[i]).collect())
    }
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LinearModel {
    coefficients: Vec<f64>,
    intercept: f64,
}

impl Model for LinearModel {
    fn predict(&self, input: &[f64]) -> Result<f64> {
        check_len("linear_model", input, self.coefficients.len())?;
        Ok(self.intercept
            + input
                .iter()
                .zip(&self.coefficients)
                .map(|(x, w)| x * w)
                .sum::<f64>())
    }
}

// ---------------------------------------------------------------------------
// File format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalerDef {
    Standard { mean: Vec<f64>, scale: Vec<f64> },
    MinMax { data_min: Vec<f64>, data_max: Vec<f64> },
    Passthrough,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectorDef {
    Mask { support: Vec<bool> },
    Indices { indices: Vec<usize> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelDef {
    Linear { coefficients: Vec<f64>, intercept: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineBundle {
    pub features: Vec<String>,
    pub scaler: ScalerDef,
    pub selector: SelectorDef,
    pub model: ModelDef,
}

fn ensure_finite(what: &str, values: &[f64]) -> anyhow::Result<()> {
    ensure!(
        values.iter().all(|v| v.is_finite()),
        "{what} contains non-finite values"
    );
    Ok(())
}

impl ScalerDef {
    fn build(self, width: usize) -> anyhow::Result<Box<dyn Transform>> {
        let stage: Box<dyn Transform> = match self {
            ScalerDef::Standard { mean, scale } => {
                ensure!(
                    mean.len() == width && scale.len() == width,
                    "standard scaler expects {width} mean/scale values, got {}/{}",
                    mean.len(),
                    scale.len()
                );
                ensure_finite("scaler mean", &mean)?;
                ensure_finite("scaler scale", &scale)?;
                ensure!(scale.iter().all(|s| *s != 0.0), "scaler scale contains zero");
                Box::new(StandardScaler { mean, scale })
            }
            ScalerDef::MinMax { data_min, data_max } => {
                ensure!(
                    data_min.len() == width && data_max.len() == width,
                    "min-max scaler expects {width} min/max values, got {}/{}",
                    data_min.len(),
                    data_max.len()
                );
                ensure_finite("scaler data_min", &data_min)?;
                ensure_finite("scaler data_max", &data_max)?;
                Box::new(MinMaxScaler { data_min, data_max })
            }
            ScalerDef::Passthrough => Box::new(Passthrough { width }),
        };
        Ok(stage)
    }
}

impl SelectorDef {
    fn build(self, width: usize) -> anyhow::Result<FeatureSelector> {
        let indices: Vec<usize> = match self {
            SelectorDef::Mask { support } => {
                ensure!(
                    support.len() == width,
                    "selector mask has {} entries, expected {width}",
                    support.len()
                );
                support
                    .iter()
                    .enumerate()
                    .filter(|(_, keep)| **keep)
                    .map(|(i, _)| i)
                    .collect()
            }
            SelectorDef::Indices { indices } => {
                if let Some(bad) = indices.iter().find(|&&i| i >= width) {
                    bail!("selector index {bad} out of range for {width} features");
                }
                indices
            }
        };
        ensure!(!indices.is_empty(), "selector keeps no features");
        Ok(FeatureSelector {
            input_width: width,
            indices,
        })
    }
}

// ---------------------------------------------------------------------------
// PredictionPipeline
// ---------------------------------------------------------------------------

/// Ordered transform stages followed by a model.
pub struct PredictionPipeline {
    features: Vec<String>,
    stages: Vec<Box<dyn Transform>>,
    model: Box<dyn Model>,
}

impl std::fmt::Debug for PredictionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionPipeline")
            .field("features", &self.features)
            .field("stages", &self.stage_names())
            .finish()
    }
}

impl PredictionPipeline {
    pub fn new(features: Vec<String>, stages: Vec<Box<dyn Transform>>, model: Box<dyn Model>) -> Self {
        Self {
            features,
            stages,
            model,
        }
    }

    /// Validate a parsed bundle and assemble scaler → selector → model.
    pub fn from_bundle(bundle: PipelineBundle) -> anyhow::Result<Self> {
        let width = bundle.features.len();
        ensure!(width > 0, "pipeline lists no features");

        let scaler = bundle.scaler.build(width).context("invalid scaler")?;
        let selector = bundle.selector.build(width).context("invalid selector")?;
        let selected = selector.indices.len();

        let model: Box<dyn Model> = match bundle.model {
            ModelDef::Linear {
                coefficients,
                intercept,
            } => {
                ensure!(
                    coefficients.len() == selected,
                    "model has {} coefficients but selector keeps {selected} features",
                    coefficients.len()
                );
                ensure_finite("model coefficients", &coefficients)?;
                ensure!(intercept.is_finite(), "model intercept is not finite");
                Box::new(LinearModel {
                    coefficients,
                    intercept,
                })
            }
        };

        let selector: Box<dyn Transform> = Box::new(selector);
        Ok(Self::new(bundle.features, vec![scaler, selector], model))
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let bundle: PipelineBundle = serde_json::from_str(text).context("parsing pipeline JSON")?;
        Self::from_bundle(bundle)
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }
}

impl CaloriePredictor for PredictionPipeline {
    fn feature_names(&self) -> &[String] {
        &self.features
    }

    fn predict(&self, features: &[f64]) -> Result<f64> {
        check_len("pipeline input", features, self.features.len())?;
        let mut current = features.to_vec();
        for stage in &self.stages {
            current = stage.transform(&current)?;
        }
        self.model.predict(&current)
    }
}

/// Read and validate a pipeline bundle from disk.
pub fn load_pipeline(path: &Path) -> anyhow::Result<PredictionPipeline> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading pipeline {}", path.display()))?;
    let pipeline = PredictionPipeline::from_json(&text)
        .with_context(|| format!("loading pipeline {}", path.display()))?;
    log::info!(
        "Loaded pipeline with features {:?} and stages {:?}",
        pipeline.features,
        pipeline.stage_names()
    );
    Ok(pipeline)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUNDLE: &str = r#"{
        "features": ["protein", "fat", "carbohydrate", "fiber"],
        "scaler": {"kind": "standard", "mean": [1.0, 2.0, 3.0, 4.0], "scale": [1.0, 1.0, 1.0, 2.0]},
        "selector": {"kind": "mask", "support": [true, true, true, false]},
        "model": {"kind": "linear", "coefficients": [4.0, 9.0, 4.0], "intercept": 100.0}
    }"#;

    #[test]
    fn test_pipeline_applies_stages_in_order() {
        let pipeline = PredictionPipeline::from_json(BUNDLE).unwrap();
        assert_eq!(
            pipeline.stage_names(),
            vec!["standard_scaler", "feature_selector"]
        );
        // scaled: [10-1, 5-2, 20-3, ..] = [9, 3, 17]; 100 + 36 + 27 + 68
        let pred = pipeline.predict(&[10.0, 5.0, 20.0, 2.0]).unwrap();
        assert!((pred - 231.0).abs() < 1e-10);
    }

    #[test]
    fn test_min_max_scaler_constant_feature() {
        let scaler = MinMaxScaler {
            data_min: vec![0.0, 5.0],
            data_max: vec![10.0, 5.0],
        };
        let out = scaler.transform(&[5.0, 7.0]).unwrap();
        assert!((out[0] - 0.5).abs() < 1e-10);
        assert!((out[1] - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_index_selector() {
        let selector = SelectorDef::Indices {
            indices: vec![3, 0],
        }
        .build(4)
        .unwrap();
        assert_eq!(selector.transform(&[1.0, 2.0, 3.0, 4.0]).unwrap(), vec![4.0, 1.0]);
    }

    #[test]
    fn test_wrong_input_width_is_pipeline_error() {
        let pipeline = PredictionPipeline::from_json(BUNDLE).unwrap();
        assert!(matches!(
            pipeline.predict(&[1.0, 2.0]),
            Err(NutritionError::Pipeline(_))
        ));
    }

    #[test]
    fn test_rejects_inconsistent_bundles() {
        let coef_mismatch = BUNDLE.replace("[4.0, 9.0, 4.0]", "[4.0, 9.0]");
        let err = PredictionPipeline::from_json(&coef_mismatch).unwrap_err();
        assert!(format!("{err:#}").contains("selector keeps 3 features"));

        let zero_scale = BUNDLE.replace("[1.0, 1.0, 1.0, 2.0]", "[1.0, 0.0, 1.0, 2.0]");
        let err = PredictionPipeline::from_json(&zero_scale).unwrap_err();
        assert!(format!("{err:#}").contains("scale contains zero"));

        let empty_mask = BUNDLE.replace("[true, true, true, false]", "[false, false, false, false]");
        assert!(PredictionPipeline::from_json(&empty_mask).is_err());

        let bad_index = r#"{
            "features": ["protein"],
            "scaler": {"kind": "passthrough"},
            "selector": {"kind": "indices", "indices": [1]},
            "model": {"kind": "linear", "coefficients": [1.0], "intercept": 0.0}
        }"#;
        let err = PredictionPipeline::from_json(bad_index).unwrap_err();
        assert!(format!("{err:#}").contains("out of range"));

        assert!(PredictionPipeline::from_json("{}").is_err());
    }

    #[test]
    fn test_load_pipeline_missing_file() {
        let path = std::env::temp_dir().join("nutri_panda_missing_pipeline.json");
        let err = load_pipeline(&path).unwrap_err();
        assert!(format!("{err:#}").contains("reading pipeline"));
    }
}
