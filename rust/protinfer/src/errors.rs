use crate::filter::FilterComparator;
use std::fmt::Display;

#[derive(Debug)]
pub enum CompilerError {
    /// A single record could not be used. The run continues without it.
    MalformedRecord {
        reason: &'static str,
        context: String,
    },
    UnknownHandle {
        kind: &'static str,
        index: usize,
    },
    /// The evidence tables are frozen once groups are built.
    CompilationClosed {
        operation: &'static str,
    },
    /// An accession claims a peptide edge that crosses two groups.
    InconsistentGroup {
        accession: String,
        peptide: String,
    },
}

impl CompilerError {
    pub fn append_to_context(mut self, context: &str) -> Self {
        if let CompilerError::MalformedRecord {
            context: owned_context,
            ..
        } = &mut self
        {
            if !owned_context.is_empty() {
                owned_context.push_str("; ");
            }
            owned_context.push_str(context);
        }
        self
    }

    /// Fatal errors abort the run, everything else only drops the offending record.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, CompilerError::MalformedRecord { .. })
    }
}

impl Display for CompilerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompilerError::MalformedRecord { reason, context } => {
                write!(f, "Malformed record ({}): {}", reason, context)
            }
            CompilerError::UnknownHandle { kind, index } => {
                write!(f, "Unknown {} handle: {}", kind, index)
            }
            CompilerError::CompilationClosed { operation } => write!(
                f,
                "Cannot {} after the groups were built, start a new compilation",
                operation
            ),
            CompilerError::InconsistentGroup { accession, peptide } => write!(
                f,
                "Accession {} and peptide {} ended up in different groups",
                accession, peptide
            ),
        }
    }
}

impl std::error::Error for CompilerError {}

#[derive(Debug)]
pub enum FilterError {
    UnknownFilter {
        name: String,
    },
    InvalidComparator {
        filter: String,
        comparator: FilterComparator,
    },
    ValueTypeMismatch {
        filter: String,
        expected: &'static str,
    },
}

impl Display for FilterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterError::UnknownFilter { name } => write!(f, "Unknown filter: '{}'", name),
            FilterError::InvalidComparator { filter, comparator } => write!(
                f,
                "Comparator '{}' cannot be used with filter '{}'",
                comparator, filter
            ),
            FilterError::ValueTypeMismatch { filter, expected } => {
                write!(f, "Filter '{}' expects a {} value", filter, expected)
            }
        }
    }
}

impl std::error::Error for FilterError {}

#[derive(Debug)]
pub enum ConfigError {
    /// A filter or scoring setting references a score kind that no PSM carries.
    UnresolvableScoreKind {
        kind: String,
        context: String,
    },
    InvalidDecoyPattern {
        pattern: String,
        source: regex::Error,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::UnresolvableScoreKind { kind, context } => write!(
                f,
                "Score '{}' is not present in any PSM ({})",
                kind, context
            ),
            ConfigError::InvalidDecoyPattern { pattern, source } => {
                write!(f, "Invalid decoy pattern '{}': {}", pattern, source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidDecoyPattern { source, .. } => Some(source),
            ConfigError::UnresolvableScoreKind { .. } => None,
        }
    }
}

#[derive(Debug)]
pub enum InferenceError {
    GroupsNotBuilt,
    PsmSetsNotBuilt,
}

impl Display for InferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InferenceError::GroupsNotBuilt => {
                write!(f, "Protein inference needs the groups to be built first")
            }
            InferenceError::PsmSetsNotBuilt => {
                write!(f, "Protein inference needs the PSM sets to be built first")
            }
        }
    }
}

impl std::error::Error for InferenceError {}

#[derive(Debug)]
pub enum ProtInferError {
    Compiler(CompilerError),
    Filter(FilterError),
    Config(ConfigError),
    Inference(InferenceError),
}

impl Display for ProtInferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtInferError::Compiler(e) => write!(f, "{}", e),
            ProtInferError::Filter(e) => write!(f, "{}", e),
            ProtInferError::Config(e) => write!(f, "{}", e),
            ProtInferError::Inference(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ProtInferError {}

pub type Result<T> = std::result::Result<T, ProtInferError>;

impl From<CompilerError> for ProtInferError {
    fn from(x: CompilerError) -> Self {
        Self::Compiler(x)
    }
}

impl From<FilterError> for ProtInferError {
    fn from(x: FilterError) -> Self {
        Self::Filter(x)
    }
}

impl From<ConfigError> for ProtInferError {
    fn from(x: ConfigError) -> Self {
        Self::Config(x)
    }
}

impl From<InferenceError> for ProtInferError {
    fn from(x: InferenceError) -> Self {
        Self::Inference(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_keep_their_layer() {
        let err: ProtInferError = InferenceError::GroupsNotBuilt.into();
        assert!(matches!(
            err,
            ProtInferError::Inference(InferenceError::GroupsNotBuilt)
        ));
        let err: ProtInferError = CompilerError::CompilationClosed {
            operation: "add a PSM",
        }
        .into();
        assert!(matches!(err, ProtInferError::Compiler(ref e) if e.is_fatal()));
        assert_eq!(
            err.to_string(),
            "Cannot add a PSM after the groups were built, start a new compilation"
        );
    }
}
