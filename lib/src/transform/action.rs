use super::buffer::BufferPool;
use super::changes::ClassChanges;
use super::constants::rewrite_pool;
use super::errors::Error;
use super::rewriter::Rewriter;
use super::signatures::SignatureKind;
use crate::jvm;
use crate::jvm::class_file::{Attribute, ClassFile, Utf8ConstantIndex};
use crate::rules::RuleTable;
use std::io::Read;
use std::sync::Arc;

/// Renamed resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed<C> {
    /// Name of the resource to write (which may differ from the name it was read under)
    pub name: String,
    pub bytes: Vec<u8>,
    pub changes: C,
}

/// Transformation of one kind of resource
///
/// `Ok(None)` from [`Action::apply`] means "keep the original name and bytes". Implementations
/// are shared between threads, one resource per call.
pub trait Action: Send + Sync {
    type Changes;

    /// Short name, for reporting
    fn name(&self) -> &'static str;

    /// Whether this action applies to the resource
    fn accepts(&self, resource_name: &str) -> bool;

    fn apply(
        &self,
        resource_name: &str,
        bytes: &[u8],
    ) -> Result<Option<Transformed<Self::Changes>>, Error>;
}

/// Renames the packages used by a class file
#[derive(Debug)]
pub struct ClassAction {
    rules: Arc<RuleTable>,
    buffers: BufferPool,
}

impl ClassAction {
    pub fn new(rules: Arc<RuleTable>) -> ClassAction {
        ClassAction {
            rules,
            buffers: BufferPool::new(),
        }
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Pool holding the scratch buffers used by [`ClassAction::apply_reader`]
    pub fn buffers(&self) -> &BufferPool {
        &self.buffers
    }

    /// Transform a class file
    ///
    /// A class which cannot be parsed or rewritten is logged and passed through (`Ok(None)`),
    /// except for one using an unknown constant pool tag.
    pub fn apply(
        &self,
        resource_name: &str,
        bytes: &[u8],
    ) -> Result<Option<Transformed<ClassChanges>>, Error> {
        let mut class = match ClassFile::parse(bytes) {
            Ok(class) => class,
            Err(jvm::Error::UnknownConstantTag { tag, index }) => {
                return Err(Error::UnknownConstantTag {
                    resource: resource_name.to_owned(),
                    tag,
                    index,
                })
            }
            Err(err) => {
                log::error!("Failed to parse {}: {}", resource_name, err);
                return Ok(None);
            }
        };

        let changes = match self.rewrite_class(resource_name, &mut class) {
            Ok(changes) => changes,
            Err(err) => {
                log::error!("Failed to rename in {}: {}", resource_name, err);
                return Ok(None);
            }
        };
        if !changes.has_changes() {
            log::debug!("Unchanged {}", resource_name);
            return Ok(None);
        }

        let bytes = class.to_bytes().map_err(|source| Error::Write {
            resource: resource_name.to_owned(),
            source,
        })?;
        log::debug!("Changed {} {}", resource_name, changes);
        Ok(Some(Transformed {
            name: changes.output_resource_name.clone(),
            bytes,
            changes,
        }))
    }

    /// Read a class file into a pooled buffer, then transform it
    pub fn apply_reader<R: Read>(
        &self,
        resource_name: &str,
        mut reader: R,
    ) -> Result<Option<Transformed<ClassChanges>>, Error> {
        let mut buffer = self.buffers.take();
        reader
            .read_to_end(&mut buffer)
            .map_err(|source| Error::Read {
                resource: resource_name.to_owned(),
                source,
            })?;
        self.apply(resource_name, &buffer)
    }

    /// Rename everything in a parsed class, in place
    fn rewrite_class(
        &self,
        resource_name: &str,
        class: &mut ClassFile,
    ) -> Result<ClassChanges, jvm::Error> {
        let ClassFile {
            constants,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
            ..
        } = class;

        let super_name = match super_class {
            Some(super_class) => Some(constants.class_name(*super_class)?),
            None => None,
        };
        let mut changes =
            ClassChanges::new(resource_name, constants.class_name(*this_class)?, super_name);
        let mut rewriter = Rewriter::new(&self.rules, constants);

        if rewriter.rename_class(*this_class)? {
            let new_name = rewriter.constants().class_name(*this_class)?.to_owned();
            changes.output_resource_name =
                relocate_class(resource_name, &changes.input_class_name, &new_name);
            changes.output_class_name = new_name;
        }

        if let Some(super_class) = super_class {
            if rewriter.rename_class(*super_class)? {
                changes.output_super_name =
                    Some(rewriter.constants().class_name(*super_class)?.to_owned());
            }
        }

        for interface in interfaces.iter() {
            if rewriter.rename_class(*interface)? {
                changes.modified_interfaces += 1;
            }
        }

        for field in fields.iter_mut() {
            log::debug!("Field #{}", field.name_index.0 .0);
            if rewrite_member(
                &mut rewriter,
                &mut field.descriptor_index,
                &mut field.attributes,
                SignatureKind::Field,
            )? {
                changes.modified_fields += 1;
            }
        }

        for method in methods.iter_mut() {
            log::debug!("Method #{}", method.name_index.0 .0);
            if rewrite_member(
                &mut rewriter,
                &mut method.descriptor_index,
                &mut method.attributes,
                SignatureKind::Method,
            )? {
                changes.modified_methods += 1;
            }
        }

        for attribute in attributes.iter_mut() {
            if let Some(rewritten) = rewriter.rewrite_attribute(attribute, SignatureKind::Class)? {
                *attribute = rewritten;
                changes.modified_attributes += 1;
            }
        }

        changes.modified_constants = rewrite_pool(&mut rewriter)?;
        Ok(changes)
    }
}

/// Rename the descriptor and attributes of a field or method, returning whether either changed
fn rewrite_member(
    rewriter: &mut Rewriter<'_>,
    descriptor_index: &mut Utf8ConstantIndex,
    attributes: &mut Vec<Attribute>,
    kind: SignatureKind,
) -> Result<bool, jvm::Error> {
    let descriptor = rewriter.rename_descriptor(*descriptor_index)?;
    if let Some(descriptor) = descriptor {
        *descriptor_index = descriptor;
    }

    let rewritten = rewriter.rewrite_attributes(attributes, kind)?;
    let attributes_changed = rewritten.is_some();
    if let Some(rewritten) = rewritten {
        *attributes = rewritten;
    }

    Ok(descriptor.is_some() || attributes_changed)
}

impl Action for ClassAction {
    type Changes = ClassChanges;

    fn name(&self) -> &'static str {
        "class"
    }

    fn accepts(&self, resource_name: &str) -> bool {
        resource_name.ends_with(".class")
    }

    fn apply(
        &self,
        resource_name: &str,
        bytes: &[u8],
    ) -> Result<Option<Transformed<ClassChanges>>, Error> {
        ClassAction::apply(self, resource_name, bytes)
    }
}

/// Directories which hold classes without being part of their package
const WEB_CLASSES: &str = "WEB-INF/classes/";
const VERSIONS: &str = "META-INF/versions/";

/// Work out where a class file goes once its class has been renamed
///
/// If the class was at the path its old name calls for (possibly under some prefix), it moves to
/// the path of its new name (under the same prefix). Otherwise the location only gets
/// approximated, keeping a web application or multi-release prefix if there was one.
pub fn relocate_class(resource_name: &str, old_class: &str, new_class: &str) -> String {
    let old_path = format!("{}.class", old_class);
    let new_path = format!("{}.class", new_class);

    if let Some(prefix) = resource_name.strip_suffix(&old_path) {
        if prefix.is_empty() || prefix.ends_with('/') {
            return format!("{}{}", prefix, new_path);
        }
    }

    let prefix = if resource_name.starts_with(WEB_CLASSES) {
        WEB_CLASSES.len()
    } else if let Some(rest) = resource_name.strip_prefix(VERSIONS) {
        match rest.find('/') {
            Some(end) => VERSIONS.len() + end + 1,
            None => 0,
        }
    } else {
        0
    };
    let relocated = format!("{}{}", &resource_name[..prefix], new_path);
    log::warn!(
        "Approximate relocation of {} (class {}) to {}",
        resource_name,
        new_class,
        relocated
    );
    relocated
}
