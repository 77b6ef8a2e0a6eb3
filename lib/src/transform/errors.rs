use crate::jvm::class_file::ConstantIndex;
use std::fmt::{Display, Formatter};

/// Errors which stop the processing of a resource
///
/// Most problems with a class are not in this list: a class which cannot be parsed or rewritten
/// is logged and passed through unchanged.
#[derive(Debug)]
pub enum Error {
    /// Constant pool entry with a tag this library does not know about
    ///
    /// The class was compiled for a newer JVM than is supported, so passing it through would
    /// silently leave its references unrenamed.
    UnknownConstantTag {
        resource: String,
        tag: u8,
        index: ConstantIndex,
    },

    /// Resource could not be read in
    Read {
        resource: String,
        source: std::io::Error,
    },

    /// Transformed class could not be written out
    Write {
        resource: String,
        source: std::io::Error,
    },
}

impl Error {
    /// Name of the resource being processed when the error happened
    pub fn resource(&self) -> &str {
        match self {
            Error::UnknownConstantTag { resource, .. }
            | Error::Read { resource, .. }
            | Error::Write { resource, .. } => resource,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::UnknownConstantTag {
                resource,
                tag,
                index,
            } => write!(
                f,
                "{}: unknown constant pool tag {} at #{}",
                resource, tag, index.0
            ),
            Error::Read { resource, source } => write!(f, "{}: failed to read: {}", resource, source),
            Error::Write { resource, source } => {
                write!(f, "{}: failed to write: {}", resource, source)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::UnknownConstantTag { .. } => None,
            Error::Read { source, .. } | Error::Write { source, .. } => Some(source),
        }
    }
}
