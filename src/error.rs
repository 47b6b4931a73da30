use thiserror::Error;

// ---------------------------------------------------------------------------
// Domain errors
// ---------------------------------------------------------------------------

/// Errors surfaced by the loader, the normalizer and the query facade.
///
/// `Clone` so that a failed one-time construction can be handed to every
/// caller waiting on it (see [`crate::cache::ResourceCache`]).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NutritionError {
    /// A cleaned column contains no parseable value, so it has no median.
    #[error("column '{column}' has no parseable values; median is undefined")]
    UndefinedMedian { column: String },

    /// A caller-supplied value was rejected before any work was done.
    #[error("invalid input for '{field}': {reason}")]
    InvalidInput { field: String, reason: String },

    /// No record carries the requested food name.
    #[error("no food named '{name}'")]
    NotFound { name: String },

    /// Dataset or pipeline could not be loaded.
    #[error("load failed: {0}")]
    Load(String),

    /// A pipeline stage received a vector of the wrong shape.
    #[error("pipeline error: {0}")]
    Pipeline(String),
}

impl NutritionError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        NutritionError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<anyhow::Error> for NutritionError {
    fn from(err: anyhow::Error) -> Self {
        // Alternate formatting keeps the whole context chain.
        NutritionError::Load(format!("{err:#}"))
    }
}

pub type Result<T> = std::result::Result<T, NutritionError>;

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_error_display() {
        let err = NutritionError::UndefinedMedian {
            column: "fiber".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "column 'fiber' has no parseable values; median is undefined"
        );

        let err = NutritionError::invalid("protein", "must be non-negative");
        assert_eq!(err.to_string(), "invalid input for 'protein': must be non-negative");

        let err = NutritionError::NotFound {
            name: "Unknown Food XYZ".to_string(),
        };
        assert_eq!(err.to_string(), "no food named 'Unknown Food XYZ'");
    }

    #[test]
    fn test_anyhow_conversion_keeps_context() {
        let inner: anyhow::Result<()> = Err(anyhow::anyhow!("file not found"));
        let err: NutritionError = inner.context("opening CSV").unwrap_err().into();
        assert_eq!(
            err,
            NutritionError::Load("opening CSV: file not found".to_string())
        );
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<NutritionError>();
        assert_sync::<NutritionError>();
    }
}
