//! Renaming packages inside a parsed class file
//!
//! [`ClassAction`] is the entry point. It parses a class, renames the class itself, its super
//! class and interfaces, the descriptors and attributes of every field and method, the class
//! attributes, and finally whatever is left in the constant pool. Constant pool indices and
//! entry widths never change, so every index stored anywhere in the class stays valid.

mod action;
mod attributes;
mod buffer;
mod changes;
mod constants;
mod errors;
mod rewriter;
mod signatures;

pub use action::*;
pub use attributes::rewrite_each;
pub use buffer::*;
pub use changes::*;
pub use constants::rewrite_pool;
pub use errors::*;
pub use rewriter::*;
pub use signatures::*;
