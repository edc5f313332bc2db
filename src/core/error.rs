use thiserror::Error;

/// Errors raised while turning raw bytes into a recognized invoice tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum LoadError {
    /// The bytes are not XML, or not even permissive parsing could recover a root.
    #[error("malformed XML: {0}")]
    MalformedXml(String),

    /// The effective root is not an invoice, credit note or debit note.
    #[error("unrecognized document type: {0}")]
    UnrecognizedDocumentType(String),

    /// The document carries neither a monetary total nor a monetary custom field.
    #[error("document has no monetary content")]
    NoMonetaryContent,
}

/// Errors raised by the pipeline facade.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ExtractError {
    /// `extract` was called before a successful `load`.
    #[error("no document loaded")]
    NotLoaded,

    /// No source in the document states an amount payable.
    #[error("no authoritative payable total found in document")]
    NoAuthoritativeTotal,

    /// Loading failed.
    #[error(transparent)]
    Load(#[from] LoadError),
}

/// A single audit finding with field path and message.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ValidationError {
    /// Dot-separated path to the offending field (e.g. "components.payable").
    pub field: String,
    /// Human-readable description.
    pub message: String,
    /// Rule identifier if applicable (e.g. "MV-01").
    pub rule: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(rule) = &self.rule {
            write!(f, "[{}] {}: {}", rule, self.field, self.message)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

impl ValidationError {
    /// Create a finding without a rule ID.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            rule: None,
        }
    }

    /// Create a finding with a rule ID.
    pub fn with_rule(
        field: impl Into<String>,
        message: impl Into<String>,
        rule: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            rule: Some(rule.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finding_display_includes_rule() {
        let e = ValidationError::with_rule("components.payable", "off by 0.02", "MV-01");
        assert_eq!(e.to_string(), "[MV-01] components.payable: off by 0.02");
        let e = ValidationError::new("components.tax", "absent");
        assert_eq!(e.to_string(), "components.tax: absent");
    }

    #[test]
    fn load_error_converts_into_extract_error() {
        let e: ExtractError = LoadError::NoMonetaryContent.into();
        assert_eq!(e, ExtractError::Load(LoadError::NoMonetaryContent));
        assert_eq!(e.to_string(), "document has no monetary content");
    }
}
