//! Nutrition analysis core: dataset cleaning, calorie prediction and food
//! recommendation.
//!
//! The dashboard binary is a thin caller over [`cache::ResourceCache`] and
//! [`service::NutritionService`].

pub mod cache;
pub mod config;
pub mod data;
pub mod error;
pub mod pipeline;
pub mod service;

pub use cache::ResourceCache;
pub use config::AppConfig;
pub use data::model::{FoodRecord, FoodTable, RawCell, RawTable};
pub use error::{NutritionError, Result};
pub use service::NutritionService;
