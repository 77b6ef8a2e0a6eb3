use std::fmt::{Display, Formatter};

/// Problems with the renames handed to [`super::RuleTableBuilder`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// Two rules have the same key once wildcard suffixes are stripped
    DuplicateKey(String),

    /// Rule key is empty (or only a wildcard suffix)
    EmptyKey,

    /// Bundle identity update which is not `symbolic-name,version,name,description`
    MalformedBundle(String),
}

impl Display for RuleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleError::DuplicateKey(key) => write!(f, "Duplicate rename rule for '{}'", key),
            RuleError::EmptyKey => write!(f, "Empty rename rule key"),
            RuleError::MalformedBundle(text) => {
                write!(f, "Incorrectly formatted bundle identity update '{}'", text)
            }
        }
    }
}

impl std::error::Error for RuleError {}
