//! Binary model of class files
//!
//! Parsing keeps every byte that matters for writing the class back out: constant pool indices
//! stay where they were, attributes nobody needs to look inside are kept raw.

mod annotation;
mod attribute;
mod class;
mod constants;
mod field;
mod method;
mod stack_map;
mod version;

pub use annotation::*;
pub use attribute::*;
pub use class::*;
pub use constants::*;
pub use field::*;
pub use method::*;
pub use stack_map::*;
pub use version::*;
