use std::fmt::{Display, Formatter};

/// Record of what rewriting one class changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassChanges {
    pub input_resource_name: String,
    pub output_resource_name: String,

    pub input_class_name: String,
    pub output_class_name: String,

    pub input_super_name: Option<String>,
    pub output_super_name: Option<String>,

    pub modified_interfaces: usize,
    pub modified_fields: usize,
    pub modified_methods: usize,
    pub modified_attributes: usize,
    pub modified_constants: usize,
}

impl ClassChanges {
    /// Start a record for a resource, before anything has changed
    pub fn new(resource_name: &str, class_name: &str, super_name: Option<&str>) -> ClassChanges {
        ClassChanges {
            input_resource_name: resource_name.to_owned(),
            output_resource_name: resource_name.to_owned(),
            input_class_name: class_name.to_owned(),
            output_class_name: class_name.to_owned(),
            input_super_name: super_name.map(str::to_owned),
            output_super_name: super_name.map(str::to_owned),
            ..ClassChanges::default()
        }
    }

    pub fn has_resource_name_change(&self) -> bool {
        self.input_resource_name != self.output_resource_name
    }

    /// Whether anything inside the class changed
    pub fn has_non_resource_name_changes(&self) -> bool {
        self.input_class_name != self.output_class_name
            || self.input_super_name != self.output_super_name
            || self.modified_interfaces > 0
            || self.modified_fields > 0
            || self.modified_methods > 0
            || self.modified_attributes > 0
            || self.modified_constants > 0
    }

    pub fn has_changes(&self) -> bool {
        self.has_resource_name_change() || self.has_non_resource_name_changes()
    }
}

/// Summary of the counts, leaving out the resource name (which the reader already knows) unless
/// the resource moved
impl Display for ClassChanges {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.has_resource_name_change() {
            write!(f, "moved to {} ", self.output_resource_name)?;
        }
        write!(
            f,
            "(interfaces: {}, fields: {}, methods: {}, attributes: {}, constants: {})",
            self.modified_interfaces,
            self.modified_fields,
            self.modified_methods,
            self.modified_attributes,
            self.modified_constants
        )
    }
}
