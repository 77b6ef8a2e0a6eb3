//! Renaming the class names embedded in descriptors and generic signatures
//!
//! Strings are parsed into their grammar tree, every class name in the tree goes through the
//! rules, and the tree is rendered back out only if at least one name changed.

use crate::jvm::signatures::{
    ClassSignature, ClassTypeSignature, FieldSignature, JavaTypeSignature, MethodSignature,
    ReferenceTypeSignature, SimpleClassTypeSignature, TypeArgument, TypeParameter,
};
use crate::jvm::{
    BinaryName, Descriptor, Error, FieldType, MethodDescriptor, Name, ParseDescriptor, RefType,
    RenderDescriptor,
};
use crate::rules::{NameForm, RuleTable};

/// Which signature grammar applies, which depends on where the signature was found
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum SignatureKind {
    Class,
    Field,
    Method,
}

/// Grammar trees which contain class names
pub trait RenameTypes {
    /// Rename every class name inside, returning whether anything changed
    fn rename_types(&mut self, rules: &RuleTable) -> bool;
}

impl<T: RenameTypes> RenameTypes for Vec<T> {
    fn rename_types(&mut self, rules: &RuleTable) -> bool {
        self.iter_mut()
            .fold(false, |changed, item| item.rename_types(rules) | changed)
    }
}

impl<T: RenameTypes> RenameTypes for Option<T> {
    fn rename_types(&mut self, rules: &RuleTable) -> bool {
        match self {
            Some(item) => item.rename_types(rules),
            None => false,
        }
    }
}

impl<T: RenameTypes> RenameTypes for Box<T> {
    fn rename_types(&mut self, rules: &RuleTable) -> bool {
        self.as_mut().rename_types(rules)
    }
}

impl RenameTypes for BinaryName {
    fn rename_types(&mut self, rules: &RuleTable) -> bool {
        let renamed = match rules.rename_binary_type(self.as_str()) {
            Some(renamed) => renamed,
            None => return false,
        };
        match BinaryName::from_string(renamed) {
            Ok(renamed) => {
                *self = renamed;
                true
            }
            Err(msg) => {
                log::warn!("Not renaming {:?}: {}", self, msg);
                false
            }
        }
    }
}

impl RenameTypes for RefType<BinaryName> {
    fn rename_types(&mut self, rules: &RuleTable) -> bool {
        match self {
            RefType::Object(class) => class.rename_types(rules),
            RefType::ObjectArray(array) => array.element_type.rename_types(rules),
            RefType::PrimitiveArray(_) => false,
        }
    }
}

impl RenameTypes for FieldType<BinaryName> {
    fn rename_types(&mut self, rules: &RuleTable) -> bool {
        match self {
            FieldType::Base(_) => false,
            FieldType::Ref(ref_type) => ref_type.rename_types(rules),
        }
    }
}

impl RenameTypes for MethodDescriptor<BinaryName> {
    fn rename_types(&mut self, rules: &RuleTable) -> bool {
        self.parameters.rename_types(rules) | self.return_type.rename_types(rules)
    }
}

impl RenameTypes for Descriptor<BinaryName> {
    fn rename_types(&mut self, rules: &RuleTable) -> bool {
        match self {
            Descriptor::Field(field) => field.rename_types(rules),
            Descriptor::Method(method) => method.rename_types(rules),
        }
    }
}

impl RenameTypes for ClassTypeSignature {
    fn rename_types(&mut self, rules: &RuleTable) -> bool {
        let mut changed = false;
        if let Some(renamed) = rules.rename_binary_type(&self.name) {
            self.name = renamed;
            changed = true;
        }
        changed | self.arguments.rename_types(rules) | self.suffixes.rename_types(rules)
    }
}

/// Member classes keep their simple name: only type arguments can change
impl RenameTypes for SimpleClassTypeSignature {
    fn rename_types(&mut self, rules: &RuleTable) -> bool {
        self.arguments.rename_types(rules)
    }
}

impl RenameTypes for TypeArgument {
    fn rename_types(&mut self, rules: &RuleTable) -> bool {
        match self {
            TypeArgument::Concrete(_, reference) => reference.rename_types(rules),
            TypeArgument::Wildcard => false,
        }
    }
}

impl RenameTypes for ReferenceTypeSignature {
    fn rename_types(&mut self, rules: &RuleTable) -> bool {
        match self {
            ReferenceTypeSignature::Class(class) => class.rename_types(rules),
            ReferenceTypeSignature::TypeVariable(_) => false,
            ReferenceTypeSignature::Array(element) => element.rename_types(rules),
        }
    }
}

impl RenameTypes for JavaTypeSignature {
    fn rename_types(&mut self, rules: &RuleTable) -> bool {
        match self {
            JavaTypeSignature::Base(_) => false,
            JavaTypeSignature::Reference(reference) => reference.rename_types(rules),
        }
    }
}

impl RenameTypes for TypeParameter {
    fn rename_types(&mut self, rules: &RuleTable) -> bool {
        self.class_bound.rename_types(rules) | self.interface_bounds.rename_types(rules)
    }
}

impl RenameTypes for ClassSignature {
    fn rename_types(&mut self, rules: &RuleTable) -> bool {
        self.type_parameters.rename_types(rules)
            | self.superclass.rename_types(rules)
            | self.interfaces.rename_types(rules)
    }
}

impl RenameTypes for MethodSignature {
    fn rename_types(&mut self, rules: &RuleTable) -> bool {
        self.type_parameters.rename_types(rules)
            | self.parameters.rename_types(rules)
            | self.result.rename_types(rules)
            | self.throws.rename_types(rules)
    }
}

/// Parse, rename, and render again if anything changed
fn rename_parsed<T>(rules: &RuleTable, value: &str) -> Result<Option<String>, Error>
where
    T: ParseDescriptor + RenderDescriptor + RenameTypes,
{
    let mut parsed = T::parse(value).map_err(|err| Error::bad_descriptor(value, err))?;
    if parsed.rename_types(rules) {
        Ok(Some(parsed.render()))
    } else {
        Ok(None)
    }
}

/// Rename the classes in a field or method descriptor
///
/// `None` means nothing changed. A string which is not a descriptor is an error.
pub fn transform_descriptor(rules: &RuleTable, descriptor: &str) -> Result<Option<String>, Error> {
    rename_parsed::<Descriptor<BinaryName>>(rules, descriptor)
}

/// Like [`transform_descriptor`], but `V` is also accepted (as in class literals of annotations)
pub fn transform_return_descriptor(
    rules: &RuleTable,
    descriptor: &str,
) -> Result<Option<String>, Error> {
    if descriptor == "V" {
        Ok(None)
    } else {
        transform_descriptor(rules, descriptor)
    }
}

/// Rename the classes in a generic signature
pub fn transform_signature(
    rules: &RuleTable,
    signature: &str,
    kind: SignatureKind,
) -> Result<Option<String>, Error> {
    match kind {
        SignatureKind::Class => rename_parsed::<ClassSignature>(rules, signature),
        SignatureKind::Field => rename_parsed::<FieldSignature>(rules, signature),
        SignatureKind::Method => rename_parsed::<MethodSignature>(rules, signature),
    }
}

/// Rename a string constant which might hold a type or package name
///
/// The stages are tried in order, stopping at the first which changes something:
///
///   1. a whole descriptor gets its classes renamed, anything else gets dotted package names
///      replaced anywhere in the text
///   2. a binary class name gets its package renamed, anything else gets slashed package names
///      replaced anywhere in the text (resource paths, for instance)
///   3. an exact replacement for the whole string
///
/// Blank strings are never changed.
pub fn transform_constant(rules: &RuleTable, value: &str) -> Option<String> {
    if value.trim().is_empty() {
        return None;
    }

    let renamed = match Descriptor::<BinaryName>::parse(value) {
        Ok(mut descriptor) => {
            if descriptor.rename_types(rules) {
                Some(descriptor.render())
            } else {
                None
            }
        }
        Err(_) => rules.replace_packages(value, NameForm::Dotted),
    };
    if renamed.is_some() {
        return renamed;
    }

    let renamed = if BinaryName::check_valid(value).is_ok() {
        rules.rename_binary_type(value)
    } else {
        rules.replace_packages(value, NameForm::Binary)
    };
    if renamed.is_some() {
        return renamed;
    }

    rules.direct_string(value).map(str::to_owned)
}
