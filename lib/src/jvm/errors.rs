use super::class_file::ConstantIndex;
use std::fmt::{Display, Formatter};

/// Errors encountered while reading or interpreting a class file
#[derive(Debug)]
pub enum Error {
    IoError(std::io::Error),

    /// Class file does not start with `0xCAFEBABE`
    BadMagic(u32),

    /// Bytes left over after the last class attribute
    TrailingBytes(usize),

    /// Constant pool entry with a tag this library does not know about
    ///
    /// Since the tag decides how wide the entry is, nothing after this point in the pool can be
    /// trusted.
    UnknownConstantTag { tag: u8, index: ConstantIndex },

    UnknownHandleKind(u8),

    /// Index points nowhere (or into the second half of a `Long`/`Double`)
    MissingConstant(ConstantIndex),

    /// Index points at a constant of the wrong kind
    UnexpectedConstant {
        index: ConstantIndex,
        expected: &'static str,
    },

    /// Replacing a constant would change the width of its slot
    IncompatibleWidth(ConstantIndex),

    UnknownFrameType(u8),
    UnknownVerificationType(u8),
    UnknownElementValueTag(u8),
    UnknownTargetType(u8),

    /// Attribute body was not fully consumed by parsing
    AttributeLength {
        name: String,
        declared: usize,
        consumed: usize,
    },

    /// Descriptor or signature which does not follow the grammar
    BadDescriptor { descriptor: String, message: String },
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::IoError(err) => write!(f, "I/O error: {}", err),
            Error::BadMagic(magic) => write!(f, "Bad class file magic {:#010x}", magic),
            Error::TrailingBytes(count) => write!(f, "{} trailing bytes after class file", count),
            Error::UnknownConstantTag { tag, index } => {
                write!(f, "Unknown constant pool tag {} at #{}", tag, index.0)
            }
            Error::UnknownHandleKind(kind) => write!(f, "Unknown method handle kind {}", kind),
            Error::MissingConstant(index) => write!(f, "No constant at #{}", index.0),
            Error::UnexpectedConstant { index, expected } => {
                write!(f, "Expected {} constant at #{}", expected, index.0)
            }
            Error::IncompatibleWidth(index) => {
                write!(f, "Replacement for #{} has a different width", index.0)
            }
            Error::UnknownFrameType(tag) => write!(f, "Unknown stack map frame type {}", tag),
            Error::UnknownVerificationType(tag) => write!(f, "Unknown verification type {}", tag),
            Error::UnknownElementValueTag(tag) => {
                write!(f, "Unknown element value tag '{}'", *tag as char)
            }
            Error::UnknownTargetType(tag) => write!(f, "Unknown type annotation target {:#x}", tag),
            Error::AttributeLength {
                name,
                declared,
                consumed,
            } => write!(
                f,
                "Attribute {} declares {} bytes but {} were parsed",
                name, declared, consumed
            ),
            Error::BadDescriptor {
                descriptor,
                message,
            } => write!(f, "Malformed descriptor '{}': {}", descriptor, message),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::IoError(err)
    }
}

impl Error {
    /// Wrap up a descriptor parse failure
    pub fn bad_descriptor(descriptor: &str, err: std::io::Error) -> Error {
        Error::BadDescriptor {
            descriptor: descriptor.to_owned(),
            message: err.to_string(),
        }
    }
}
