use thiserror::Error;

#[derive(Debug, Error)]
pub enum PhoenixError {
    /// Terms failed the structural readiness contract; no calculation was attempted.
    #[error("Schema error: {field} — {reason}")]
    Schema { field: String, reason: String },

    /// Price path misaligned with the observation schedule, or an unusable price.
    #[error("Malformed path{}: {underlying} — {reason}", fmt_date_index(.date_index))]
    MalformedPath {
        date_index: Option<usize>,
        underlying: String,
        reason: String,
    },

    /// Term values rejected by the engine's own guards.
    #[error("Configuration error: {field} — {reason}")]
    Configuration { field: String, reason: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

fn fmt_date_index(date_index: &Option<usize>) -> String {
    match date_index {
        Some(idx) => format!(" at date index {idx}"),
        None => String::new(),
    }
}

impl PhoenixError {
    pub fn schema(field: impl Into<String>, reason: impl Into<String>) -> Self {
        PhoenixError::Schema {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn configuration(field: impl Into<String>, reason: impl Into<String>) -> Self {
        PhoenixError::Configuration {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn malformed_path(
        date_index: Option<usize>,
        underlying: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        PhoenixError::MalformedPath {
            date_index,
            underlying: underlying.into(),
            reason: reason.into(),
        }
    }

    pub fn is_schema(&self) -> bool {
        matches!(self, PhoenixError::Schema { .. })
    }

    pub fn is_malformed_path(&self) -> bool {
        matches!(self, PhoenixError::MalformedPath { .. })
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, PhoenixError::Configuration { .. })
    }
}

impl From<serde_json::Error> for PhoenixError {
    fn from(e: serde_json::Error) -> Self {
        PhoenixError::SerializationError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_path_message_includes_date_index() {
        let err = PhoenixError::malformed_path(Some(3), "SX5E", "price must be positive");
        assert_eq!(
            err.to_string(),
            "Malformed path at date index 3: SX5E — price must be positive"
        );
        assert!(err.is_malformed_path());
    }

    #[test]
    fn test_malformed_path_message_without_date_index() {
        let err = PhoenixError::malformed_path(None, "SPX", "expected 4 prices, got 3");
        assert_eq!(
            err.to_string(),
            "Malformed path: SPX — expected 4 prices, got 3"
        );
    }

    #[test]
    fn test_predicates_are_exclusive() {
        let err = PhoenixError::schema("underlyings", "empty");
        assert!(err.is_schema());
        assert!(!err.is_configuration());
        assert!(!err.is_malformed_path());
    }
}
