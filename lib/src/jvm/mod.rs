//! Read and write JVM classes
//!
//! ### Simple example
//!
//! Round-tripping a class file through the model gives back the same bytes:
//!
//! ```
//! use jarshift::jvm::class_file::{ClassFile, ConstantPool, Version};
//! use jarshift::jvm::ClassAccessFlags;
//!
//! # fn round_trip() -> Result<(), jarshift::jvm::Error> {
//! let mut constants = ConstantPool::new();
//! let this_class = constants.class_constant("me/alec/Point");
//! let super_class = constants.class_constant("java/lang/Object");
//! let class = ClassFile {
//!     version: Version::JAVA8,
//!     constants,
//!     access_flags: ClassAccessFlags::PUBLIC,
//!     this_class,
//!     super_class: Some(super_class),
//!     interfaces: vec![],
//!     fields: vec![],
//!     methods: vec![],
//!     attributes: vec![],
//! };
//!
//! let bytes = class.to_bytes()?;
//! let parsed = ClassFile::parse(&bytes)?;
//! assert_eq!(parsed.class_name()?, "me/alec/Point");
//! assert_eq!(parsed.to_bytes()?, bytes);
//! # Ok(())
//! # }
//! # round_trip().unwrap();
//! ```

mod access_flags;
mod binary_format;
pub mod class_file;
mod descriptors;
mod errors;
mod names;
pub mod signatures;

pub use access_flags::*;
pub use binary_format::*;
pub use descriptors::*;
pub use errors::*;
pub use names::*;
