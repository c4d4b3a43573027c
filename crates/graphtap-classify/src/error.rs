//! Error types for classifier tables

/// Errors raised when validating classifier tables
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    /// A table entry has an empty pattern
    #[error("empty pattern in {table} table at position {index}")]
    EmptyPattern { table: &'static str, index: usize },

    /// Table maps a pattern to a non-domain category
    #[error("{table} table maps '{pattern}' to non-domain category '{category}'")]
    NonDomainCategory {
        table: &'static str,
        pattern: String,
        category: String,
    },

    /// No identifier parameters configured
    #[error("at least one identifier parameter is required")]
    NoIdentifierParams,
}

impl ClassifyError {
    /// Create empty pattern error
    pub fn empty_pattern(table: &'static str, index: usize) -> Self {
        Self::EmptyPattern { table, index }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_error_display() {
        let err = ClassifyError::empty_pattern("exclusion", 3);
        assert_eq!(err.to_string(), "empty pattern in exclusion table at position 3");
    }
}
