use super::signatures::{
    transform_constant, transform_descriptor, transform_return_descriptor, transform_signature,
    SignatureKind,
};
use crate::jvm::class_file::{
    ClassConstantIndex, Constant, ConstantIndex, ConstantPool, NameAndTypeConstantIndex,
    Utf8ConstantIndex,
};
use crate::jvm::Error;
use crate::rules::RuleTable;
use std::collections::HashSet;

/// Renames the constants of one class
///
/// A renamed string is stored by pointing at an already renamed `Utf8` entry with the new value
/// if there is one, and otherwise by overwriting the `Utf8` entry the old value was in. Every entry
/// which has been dealt with is remembered, so that a value is never renamed twice (which would
/// matter for rules like `a -> b` and `b -> c`) and nothing is counted twice.
pub struct Rewriter<'a> {
    rules: &'a RuleTable,
    constants: &'a mut ConstantPool,

    /// Entries which already hold their final value
    settled: HashSet<ConstantIndex>,
}

impl<'a> Rewriter<'a> {
    pub fn new(rules: &'a RuleTable, constants: &'a mut ConstantPool) -> Rewriter<'a> {
        Rewriter {
            rules,
            constants,
            settled: HashSet::new(),
        }
    }

    pub fn rules(&self) -> &RuleTable {
        self.rules
    }

    pub fn constants(&self) -> &ConstantPool {
        self.constants
    }

    pub fn is_settled(&self, index: impl Into<ConstantIndex>) -> bool {
        self.settled.contains(&index.into())
    }

    /// Rename the value of a `Utf8` entry referenced from somewhere
    ///
    /// Returns the index the referrer should now use, or `None` if nothing changed. Malformed
    /// `Utf8` payloads are left alone.
    fn rename_utf8_with<F>(
        &mut self,
        index: Utf8ConstantIndex,
        what: &str,
        rename: F,
    ) -> Result<Option<Utf8ConstantIndex>, Error>
    where
        F: FnOnce(&RuleTable, &str) -> Result<Option<String>, Error>,
    {
        if self.is_settled(index) {
            return Ok(None);
        }
        let renamed = match self.constants.get(index)? {
            Constant::Utf8(value) => match rename(self.rules, value)? {
                Some(renamed) => {
                    log::info!("Renamed {} '{}' to '{}'", what, value, renamed);
                    renamed
                }
                None => return Ok(None),
            },
            Constant::RawUtf8(_) => return Ok(None),
            _ => {
                return Err(Error::UnexpectedConstant {
                    index: index.0,
                    expected: "Utf8",
                })
            }
        };

        // An existing entry is only shared once it holds its final value: until then, its own
        // referrers may still rename it
        if let Some(existing) = self.constants.find_utf8(&renamed) {
            if self.is_settled(existing) {
                return Ok(Some(existing));
            }
        }
        self.constants.replace(index, Constant::Utf8(renamed))?;
        self.settled.insert(index.0);
        Ok(Some(index))
    }

    /// Rename a `Utf8` entry in place, without knowing what refers to it
    ///
    /// Returns whether the entry changed.
    pub fn rename_utf8_entry(&mut self, index: Utf8ConstantIndex) -> Result<bool, Error> {
        if !self.settled.insert(index.0) {
            return Ok(false);
        }
        let renamed = match self.constants.get(index)? {
            Constant::Utf8(value) => match transform_constant(self.rules, value) {
                Some(renamed) => {
                    log::info!("Renamed string '{}' to '{}'", value, renamed);
                    renamed
                }
                None => return Ok(false),
            },
            _ => return Ok(false),
        };
        self.constants.replace(index, Constant::Utf8(renamed))?;
        Ok(true)
    }

    /// Rename a field or method descriptor
    pub fn rename_descriptor(
        &mut self,
        index: Utf8ConstantIndex,
    ) -> Result<Option<Utf8ConstantIndex>, Error> {
        self.rename_utf8_with(index, "descriptor", transform_descriptor)
    }

    /// Rename the descriptor of an annotation class literal (which can be `V`)
    pub fn rename_return_descriptor(
        &mut self,
        index: Utf8ConstantIndex,
    ) -> Result<Option<Utf8ConstantIndex>, Error> {
        self.rename_utf8_with(index, "class literal", transform_return_descriptor)
    }

    pub fn rename_signature(
        &mut self,
        index: Utf8ConstantIndex,
        kind: SignatureKind,
    ) -> Result<Option<Utf8ConstantIndex>, Error> {
        self.rename_utf8_with(index, "signature", |rules, signature| {
            transform_signature(rules, signature, kind)
        })
    }

    /// Rename a string which might contain type or package names
    pub fn rename_string(
        &mut self,
        index: Utf8ConstantIndex,
    ) -> Result<Option<Utf8ConstantIndex>, Error> {
        self.rename_utf8_with(index, "string", |rules, value| {
            Ok(transform_constant(rules, value))
        })
    }

    /// Update an entry wrapping a `Utf8` after that `Utf8` was renamed
    ///
    /// Returns whether the wrapping entry now has a new value.
    fn repoint(
        &mut self,
        index: ConstantIndex,
        old: Utf8ConstantIndex,
        renamed: Option<Utf8ConstantIndex>,
        wrap: impl FnOnce(Utf8ConstantIndex) -> Constant,
    ) -> Result<bool, Error> {
        match renamed {
            Some(new) if new != old => {
                self.constants.replace(index, wrap(new))?;
                Ok(true)
            }
            Some(_) => Ok(true),
            None => Ok(false),
        }
    }

    /// Rename a `Class` entry (plain class or array class)
    pub fn rename_class(&mut self, index: ClassConstantIndex) -> Result<bool, Error> {
        if !self.settled.insert(index.0) {
            return Ok(false);
        }
        let name = self.constants.class_name_index(index)?;
        let renamed = self.rename_utf8_with(name, "class", |rules, name| {
            Ok(rules.rename_binary_type(name))
        })?;
        self.repoint(index.0, name, renamed, Constant::Class)
    }

    /// Rename the descriptor half of a `NameAndType` entry
    pub fn rename_name_and_type(&mut self, index: NameAndTypeConstantIndex) -> Result<bool, Error> {
        if !self.settled.insert(index.0) {
            return Ok(false);
        }
        let (name, descriptor) = self.constants.name_and_type(index)?;
        let renamed = self.rename_descriptor(descriptor)?;
        self.repoint(index.0, descriptor, renamed, |descriptor| {
            Constant::NameAndType { name, descriptor }
        })
    }

    pub fn rename_method_type(&mut self, index: ConstantIndex) -> Result<bool, Error> {
        if !self.settled.insert(index) {
            return Ok(false);
        }
        let descriptor = match self.constants.get(index)? {
            Constant::MethodType { descriptor } => *descriptor,
            _ => {
                return Err(Error::UnexpectedConstant {
                    index,
                    expected: "MethodType",
                })
            }
        };
        let renamed = self.rename_descriptor(descriptor)?;
        self.repoint(index, descriptor, renamed, |descriptor| {
            Constant::MethodType { descriptor }
        })
    }

    /// Rename the value of a `String` entry
    pub fn rename_string_constant(&mut self, index: ConstantIndex) -> Result<bool, Error> {
        if !self.settled.insert(index) {
            return Ok(false);
        }
        let value = match self.constants.get(index)? {
            Constant::String(value) => *value,
            _ => {
                return Err(Error::UnexpectedConstant {
                    index,
                    expected: "String",
                })
            }
        };
        let renamed = self.rename_string(value)?;
        self.repoint(index, value, renamed, Constant::String)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn rules() -> RuleTable {
        RuleTable::builder()
            .rename("javax.servlet", "jakarta.servlet")
            .build()
            .unwrap()
    }

    #[test]
    fn classes_are_renamed_in_place() {
        let rules = rules();
        let mut constants = ConstantPool::new();
        let servlet = constants.class_constant("javax/servlet/Servlet");
        let string = constants.class_constant("java/lang/String");
        let name = constants.class_name_index(servlet).unwrap();
        let count = constants.count();

        let mut rewriter = Rewriter::new(&rules, &mut constants);
        assert!(rewriter.rename_class(servlet).unwrap());
        assert!(!rewriter.rename_class(servlet).unwrap());
        assert!(!rewriter.rename_class(string).unwrap());

        assert_eq!(constants.count(), count);
        assert_eq!(constants.class_name_index(servlet).unwrap(), name);
        assert_eq!(constants.class_name(servlet).unwrap(), "jakarta/servlet/Servlet");
        assert_eq!(constants.class_name(string).unwrap(), "java/lang/String");
    }

    #[test]
    fn renamed_values_are_reused() {
        let rules = rules();
        let mut constants = ConstantPool::new();
        let name = constants.utf8_constant("servlet");
        let first = Utf8ConstantIndex(constants.push(Constant::Utf8(
            "Ljavax/servlet/Servlet;".to_owned(),
        )));
        let second = Utf8ConstantIndex(constants.push(Constant::Utf8(
            "Ljavax/servlet/Servlet;".to_owned(),
        )));
        let first_field = NameAndTypeConstantIndex(constants.push(Constant::NameAndType {
            name,
            descriptor: first,
        }));
        let second_field = NameAndTypeConstantIndex(constants.push(Constant::NameAndType {
            name,
            descriptor: second,
        }));

        let mut rewriter = Rewriter::new(&rules, &mut constants);
        assert!(rewriter.rename_name_and_type(first_field).unwrap());
        assert!(rewriter.rename_name_and_type(second_field).unwrap());
        assert!(rewriter.is_settled(first));
        assert!(!rewriter.is_settled(second));

        assert_eq!(constants.name_and_type(first_field).unwrap(), (name, first));
        assert_eq!(constants.name_and_type(second_field).unwrap(), (name, first));
        assert_eq!(constants.utf8(first).unwrap(), "Ljakarta/servlet/Servlet;");
        assert_eq!(constants.utf8(second).unwrap(), "Ljavax/servlet/Servlet;");
    }

    #[test]
    fn unrenamed_values_are_not_shared() {
        let rules = RuleTable::builder()
            .rename("a.b", "b.c")
            .rename("b.c", "c.d")
            .build()
            .unwrap();
        let mut constants = ConstantPool::new();
        let old = constants.class_constant("a/b/Thing");
        let middle = constants.class_constant("b/c/Thing");
        let old_name = constants.class_name_index(old).unwrap();
        let middle_name = constants.class_name_index(middle).unwrap();

        let mut rewriter = Rewriter::new(&rules, &mut constants);
        assert!(rewriter.rename_class(old).unwrap());
        assert!(!rewriter.is_settled(middle_name));
        assert!(rewriter.rename_class(middle).unwrap());

        assert_eq!(constants.class_name_index(old).unwrap(), old_name);
        assert_eq!(constants.class_name(old).unwrap(), "b/c/Thing");
        assert_eq!(constants.class_name(middle).unwrap(), "c/d/Thing");
    }

    #[test]
    fn chained_rules_apply_once() {
        let rules = RuleTable::builder()
            .rename("a.b", "b.c")
            .rename("b.c", "c.d")
            .build()
            .unwrap();
        let mut constants = ConstantPool::new();
        let class = constants.class_constant("a/b/Thing");
        let name = constants.class_name_index(class).unwrap();
        let literal = constants.push(Constant::String(name));

        let mut rewriter = Rewriter::new(&rules, &mut constants);
        assert!(rewriter.rename_class(class).unwrap());
        assert!(!rewriter.rename_string_constant(literal).unwrap());
        assert!(!rewriter.rename_utf8_entry(name).unwrap());

        assert_eq!(constants.class_name(class).unwrap(), "b/c/Thing");
        assert_eq!(constants.get(literal).unwrap(), &Constant::String(name));
    }

    #[test]
    fn malformed_strings_are_left_alone() {
        let rules = rules();
        let mut constants = ConstantPool::new();
        let raw = Utf8ConstantIndex(constants.push(Constant::RawUtf8(vec![0xED, 0xA0, 0x80])));
        let descriptor = constants.utf8_constant("Ljavax/servlet/Servlet");

        let mut rewriter = Rewriter::new(&rules, &mut constants);
        assert_eq!(rewriter.rename_string(raw).unwrap(), None);
        assert!(!rewriter.rename_utf8_entry(raw).unwrap());
        assert!(matches!(
            rewriter.rename_descriptor(descriptor),
            Err(Error::BadDescriptor { .. })
        ));
        assert!(matches!(
            rewriter.rename_class(ClassConstantIndex(descriptor.0)),
            Err(Error::UnexpectedConstant { .. })
        ));
    }
}
