use thiserror::Error;

use crate::scrape::FetchError;

/// Failures while locating labeled fields in a flattened wiki page.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("no line starts with `{label}`")]
    LabelNotFound { label: String },
    #[error("label `{first}` does not precede `{second}`")]
    LabelOrder { first: String, second: String },
    #[error("unexpected page layout near {context}")]
    LayoutMismatch { context: String },
}

impl ExtractError {
    pub fn label_not_found(label: impl Into<String>) -> Self {
        Self::LabelNotFound { label: label.into() }
    }

    pub fn layout_mismatch(context: impl Into<String>) -> Self {
        Self::LayoutMismatch { context: context.into() }
    }
}

/// One card lookup failing end to end. Both variants are converted into a
/// short user-facing notice at the service boundary; neither propagates to
/// the platform layer.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error(transparent)]
    Unreachable(#[from] FetchError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

#[cfg(test)]
mod tests {
    use crate::scrape::FetchError;

    use super::{ExtractError, LookupError};

    #[test]
    fn fetch_failure_wraps_into_lookup_error() {
        let error = LookupError::from(FetchError::Unreachable {
            url: "http://dnd5e.wikidot.com/spell:nonexistent".to_owned(),
            reason: "404 Not Found".to_owned(),
        });

        assert!(matches!(error, LookupError::Unreachable(_)));
        assert!(error.to_string().contains("spell:nonexistent"));
    }

    #[test]
    fn missing_label_wraps_into_lookup_error() {
        let error = LookupError::from(ExtractError::label_not_found("**Duration:"));

        assert!(matches!(
            error,
            LookupError::Extract(ExtractError::LabelNotFound { ref label }) if label == "**Duration:"
        ));
    }
}
