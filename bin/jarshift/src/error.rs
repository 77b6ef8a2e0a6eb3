use jarshift::rules::RuleError;
use jarshift::transform;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::PathBuf;

/// Ways a run can go wrong
#[derive(Debug)]
pub enum RunError {
    Io(io::Error),

    /// Line in a rules file which is not a `key=value` pair
    Properties {
        path: PathBuf,
        line: usize,
        message: &'static str,
    },
    Rules(RuleError),
    Transform(transform::Error),
}

impl Display for RunError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RunError::Io(err) => write!(f, "IO - {}", err),
            RunError::Properties {
                path,
                line,
                message,
            } => write!(f, "{}:{} - {}", path.display(), line, message),
            RunError::Rules(err) => write!(f, "Rules - {}", err),
            RunError::Transform(err) => write!(f, "Transform - {}", err),
        }
    }
}

impl std::error::Error for RunError {}

impl RunError {
    /// Whether the whole run has to stop, rather than just this resource
    ///
    /// An unknown constant pool tag means the class file format is newer than this tool, so
    /// carrying on would only produce more output which cannot be trusted.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RunError::Transform(transform::Error::UnknownConstantTag { .. })
        )
    }
}

impl From<io::Error> for RunError {
    fn from(err: io::Error) -> RunError {
        RunError::Io(err)
    }
}

impl From<RuleError> for RunError {
    fn from(err: RuleError) -> RunError {
        RunError::Rules(err)
    }
}

impl From<transform::Error> for RunError {
    fn from(err: transform::Error) -> RunError {
        RunError::Transform(err)
    }
}

/// What happened to one resource
pub enum Outcome {
    /// Copied over as is
    Unchanged,

    /// Rewritten, with a summary of what changed
    Changed(String),

    /// Could not be processed
    Failed(String),
}

impl From<RunError> for Outcome {
    fn from(err: RunError) -> Outcome {
        Outcome::Failed(err.to_string())
    }
}
