use std::path::PathBuf;

/// Failures of the bank-matching core. Every variant carries the identifiers
/// needed to tell which group or sub-group could not be handled.
#[derive(Debug, thiserror::Error)]
pub enum AssignError {
    #[error("cannot load {what} from {}: {reason}", path.display())]
    MissingInput {
        what: &'static str,
        path: PathBuf,
        reason: String,
    },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("no unclaimed bank group left for target group {target} ({candidates} candidates, all taken)")]
    MatchExhaustion { target: String, candidates: usize },

    #[error("bank sub-group {group}/{subgroup} has no records to extend from")]
    ExtensionSourceEmpty { group: String, subgroup: String },

    #[error(
        "target group {target} needs {needed} sub-groups but bank group {bank} only has {available}"
    )]
    IndexRange {
        target: String,
        bank: String,
        needed: usize,
        available: usize,
    },
}

impl AssignError {
    pub(crate) fn missing(what: &'static str, path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        AssignError::MissingInput {
            what,
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
