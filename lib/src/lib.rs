//! Rename Java packages inside compiled class files
//!
//! The crate parses a class file into an index-based model of its constant pool, members and
//! attributes, renames every type reference it can find according to a [`rules::RuleTable`], and
//! serializes the result. Constant pool indices never move: renamed strings either point at an
//! already renamed entry with the new value or overwrite the entry they came from.
//!
//! ```
//! use jarshift::rules::RuleTable;
//! use jarshift::transform::ClassAction;
//! use std::sync::Arc;
//!
//! let rules = RuleTable::builder()
//!     .rename("javax.servlet", "jakarta.servlet")
//!     .build()
//!     .unwrap();
//! let action = ClassAction::new(Arc::new(rules));
//!
//! // Not a class file: reported and passed through unchanged
//! let output = action.apply("com/example/Widget.class", b"not a class").unwrap();
//! assert!(output.is_none());
//! ```

pub mod jvm;
pub mod rules;
pub mod transform;
mod util;
