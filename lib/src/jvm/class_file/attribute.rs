use crate::jvm::class_file::{
    Annotation, ClassConstantIndex, ConstantIndex, ConstantPool, ElementValue,
    NameAndTypeConstantIndex, ParameterAnnotations, StackMapTable, TypeAnnotation,
    Utf8ConstantIndex,
};
use crate::jvm::{Deserialize, Error, InnerClassAccessFlags, Serialize};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::Read;

/// Attributes (used in classes, fields, methods, and even on some attributes)
///
/// Attributes that can mention a type are parsed into their structure. Everything else is kept
/// as the raw bytes it was read from, so that it is written back exactly.
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name_index: Utf8ConstantIndex,
    pub body: AttributeBody,
}

impl Attribute {
    /// Make an attribute, adding its name to the constant pool if needed
    pub fn new(constants: &mut ConstantPool, name: &str, body: AttributeBody) -> Attribute {
        Attribute {
            name_index: constants.utf8_constant(name),
            body,
        }
    }
}

impl Serialize for Attribute {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.name_index.serialize(writer)?;

        // Attribute info length is 4 bytes
        let mut info = vec![];
        self.body.serialize(&mut info)?;
        u32_length(info.len())?.serialize(writer)?;
        writer.write_all(&info)?;

        Ok(())
    }
}

impl Deserialize for Attribute {
    fn deserialize<R: ReadBytesExt>(reader: &mut R, constants: &ConstantPool) -> Result<Self, Error> {
        let name_index = Utf8ConstantIndex::deserialize(reader, constants)?;
        let length = reader.read_u32::<BigEndian>()? as usize;
        let info = read_blob(reader, length)?;
        let name = constants.utf8(name_index)?;

        let mut cursor: &[u8] = &info;
        let body = AttributeBody::read_from(name, &mut cursor, constants)?;
        if !cursor.is_empty() {
            return Err(Error::AttributeLength {
                name: name.to_owned(),
                declared: length,
                consumed: length - cursor.len(),
            });
        }
        Ok(Attribute { name_index, body })
    }
}

/// Contents of an attribute, picked by the attribute name
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeBody {
    /// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.2
    ConstantValue(ConstantIndex),

    Code(Code),

    StackMapTable(StackMapTable),

    /// Checked exceptions a method may throw
    Exceptions(Vec<ClassConstantIndex>),

    InnerClasses(Vec<InnerClass>),

    /// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.7
    EnclosingMethod {
        class: ClassConstantIndex,
        method: Option<NameAndTypeConstantIndex>,
    },

    /// Generic signature of a class, field, or method (the kind comes from where it is found)
    Signature(Utf8ConstantIndex),

    /// Entries carry a field descriptor
    LocalVariableTable(Vec<LocalVariable>),

    /// Entries carry a field signature
    LocalVariableTypeTable(Vec<LocalVariable>),

    RuntimeVisibleAnnotations(Vec<Annotation>),
    RuntimeInvisibleAnnotations(Vec<Annotation>),
    RuntimeVisibleParameterAnnotations(ParameterAnnotations),
    RuntimeInvisibleParameterAnnotations(ParameterAnnotations),
    RuntimeVisibleTypeAnnotations(Vec<TypeAnnotation>),
    RuntimeInvisibleTypeAnnotations(Vec<TypeAnnotation>),

    AnnotationDefault(ElementValue),

    /// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.28
    NestHost(ClassConstantIndex),

    /// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.29
    NestMembers(Vec<ClassConstantIndex>),

    /// Any other attribute, module attributes included
    Other(Vec<u8>),
}

impl AttributeBody {
    /// Parse the attribute info, given the attribute name
    fn read_from(name: &str, reader: &mut &[u8], constants: &ConstantPool) -> Result<Self, Error> {
        let body = match name {
            "ConstantValue" => {
                AttributeBody::ConstantValue(ConstantIndex::deserialize(reader, constants)?)
            }
            "Code" => AttributeBody::Code(Code::deserialize(reader, constants)?),
            "StackMapTable" => {
                AttributeBody::StackMapTable(StackMapTable::deserialize(reader, constants)?)
            }
            "Exceptions" => AttributeBody::Exceptions(Vec::deserialize(reader, constants)?),
            "InnerClasses" => AttributeBody::InnerClasses(Vec::deserialize(reader, constants)?),
            "EnclosingMethod" => AttributeBody::EnclosingMethod {
                class: ClassConstantIndex::deserialize(reader, constants)?,
                method: Option::deserialize(reader, constants)?,
            },
            "Signature" => AttributeBody::Signature(Utf8ConstantIndex::deserialize(reader, constants)?),
            "LocalVariableTable" => {
                AttributeBody::LocalVariableTable(Vec::deserialize(reader, constants)?)
            }
            "LocalVariableTypeTable" => {
                AttributeBody::LocalVariableTypeTable(Vec::deserialize(reader, constants)?)
            }
            "RuntimeVisibleAnnotations" => {
                AttributeBody::RuntimeVisibleAnnotations(Vec::deserialize(reader, constants)?)
            }
            "RuntimeInvisibleAnnotations" => {
                AttributeBody::RuntimeInvisibleAnnotations(Vec::deserialize(reader, constants)?)
            }
            "RuntimeVisibleParameterAnnotations" => {
                AttributeBody::RuntimeVisibleParameterAnnotations(ParameterAnnotations::deserialize(
                    reader, constants,
                )?)
            }
            "RuntimeInvisibleParameterAnnotations" => {
                AttributeBody::RuntimeInvisibleParameterAnnotations(
                    ParameterAnnotations::deserialize(reader, constants)?,
                )
            }
            "RuntimeVisibleTypeAnnotations" => {
                AttributeBody::RuntimeVisibleTypeAnnotations(Vec::deserialize(reader, constants)?)
            }
            "RuntimeInvisibleTypeAnnotations" => {
                AttributeBody::RuntimeInvisibleTypeAnnotations(Vec::deserialize(reader, constants)?)
            }
            "AnnotationDefault" => {
                AttributeBody::AnnotationDefault(ElementValue::deserialize(reader, constants)?)
            }
            "NestHost" => AttributeBody::NestHost(ClassConstantIndex::deserialize(reader, constants)?),
            "NestMembers" => AttributeBody::NestMembers(Vec::deserialize(reader, constants)?),
            _ => AttributeBody::Other(std::mem::take(reader).to_vec()),
        };
        Ok(body)
    }
}

impl Serialize for AttributeBody {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        match self {
            AttributeBody::ConstantValue(constant) => constant.serialize(writer),
            AttributeBody::Code(code) => code.serialize(writer),
            AttributeBody::StackMapTable(table) => table.serialize(writer),
            AttributeBody::Exceptions(exceptions) => exceptions.serialize(writer),
            AttributeBody::InnerClasses(classes) => classes.serialize(writer),
            AttributeBody::EnclosingMethod { class, method } => {
                class.serialize(writer)?;
                method.serialize(writer)
            }
            AttributeBody::Signature(signature) => signature.serialize(writer),
            AttributeBody::LocalVariableTable(table)
            | AttributeBody::LocalVariableTypeTable(table) => table.serialize(writer),
            AttributeBody::RuntimeVisibleAnnotations(annotations)
            | AttributeBody::RuntimeInvisibleAnnotations(annotations) => {
                annotations.serialize(writer)
            }
            AttributeBody::RuntimeVisibleParameterAnnotations(annotations)
            | AttributeBody::RuntimeInvisibleParameterAnnotations(annotations) => {
                annotations.serialize(writer)
            }
            AttributeBody::RuntimeVisibleTypeAnnotations(annotations)
            | AttributeBody::RuntimeInvisibleTypeAnnotations(annotations) => {
                annotations.serialize(writer)
            }
            AttributeBody::AnnotationDefault(value) => value.serialize(writer),
            AttributeBody::NestHost(host) => host.serialize(writer),
            AttributeBody::NestMembers(members) => members.serialize(writer),
            AttributeBody::Other(info) => writer.write_all(info),
        }
    }
}

/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.3
#[derive(Debug, Clone, PartialEq)]
pub struct Code {
    pub max_stack: u16,
    pub max_locals: u16,

    /// Encoded bytecode instructions, never looked inside
    pub code_array: Vec<u8>,
    pub exception_table: Vec<ExceptionHandler>,
    pub attributes: Vec<Attribute>,
}

impl Serialize for Code {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.max_stack.serialize(writer)?;
        self.max_locals.serialize(writer)?;
        u32_length(self.code_array.len())?.serialize(writer)?;
        writer.write_all(&self.code_array)?;
        self.exception_table.serialize(writer)?;
        self.attributes.serialize(writer)?;
        Ok(())
    }
}

impl Deserialize for Code {
    fn deserialize<R: ReadBytesExt>(reader: &mut R, constants: &ConstantPool) -> Result<Self, Error> {
        let max_stack = reader.read_u16::<BigEndian>()?;
        let max_locals = reader.read_u16::<BigEndian>()?;
        let code_length = reader.read_u32::<BigEndian>()? as usize;
        Ok(Code {
            max_stack,
            max_locals,
            code_array: read_blob(reader, code_length)?,
            exception_table: Vec::deserialize(reader, constants)?,
            attributes: Vec::deserialize(reader, constants)?,
        })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ExceptionHandler {
    /// Start of exception handler range (inclusive)
    pub start_pc: u16,

    /// End of exception handler range (exclusive)
    pub end_pc: u16,

    /// Start of the exception handler
    pub handler_pc: u16,

    /// `None` catches everything (used for `finally`)
    pub catch_type: Option<ClassConstantIndex>,
}

impl Serialize for ExceptionHandler {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.start_pc.serialize(writer)?;
        self.end_pc.serialize(writer)?;
        self.handler_pc.serialize(writer)?;
        self.catch_type.serialize(writer)?;
        Ok(())
    }
}

impl Deserialize for ExceptionHandler {
    fn deserialize<R: ReadBytesExt>(reader: &mut R, constants: &ConstantPool) -> Result<Self, Error> {
        Ok(ExceptionHandler {
            start_pc: reader.read_u16::<BigEndian>()?,
            end_pc: reader.read_u16::<BigEndian>()?,
            handler_pc: reader.read_u16::<BigEndian>()?,
            catch_type: Option::deserialize(reader, constants)?,
        })
    }
}

/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.6
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct InnerClass {
    pub inner_class: ClassConstantIndex,

    /// `None` for local and anonymous classes
    pub outer_class: Option<ClassConstantIndex>,

    /// `None` for anonymous classes
    pub inner_name: Option<Utf8ConstantIndex>,
    pub access_flags: InnerClassAccessFlags,
}

impl Serialize for InnerClass {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.inner_class.serialize(writer)?;
        self.outer_class.serialize(writer)?;
        self.inner_name.serialize(writer)?;
        self.access_flags.serialize(writer)?;
        Ok(())
    }
}

impl Deserialize for InnerClass {
    fn deserialize<R: ReadBytesExt>(reader: &mut R, constants: &ConstantPool) -> Result<Self, Error> {
        Ok(InnerClass {
            inner_class: ClassConstantIndex::deserialize(reader, constants)?,
            outer_class: Option::deserialize(reader, constants)?,
            inner_name: Option::deserialize(reader, constants)?,
            access_flags: InnerClassAccessFlags::deserialize(reader, constants)?,
        })
    }
}

/// Entry in either `LocalVariableTable` or `LocalVariableTypeTable`
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LocalVariable {
    pub start_pc: u16,
    pub length: u16,
    pub name_index: Utf8ConstantIndex,

    /// Descriptor in a `LocalVariableTable`, signature in a `LocalVariableTypeTable`
    pub descriptor_index: Utf8ConstantIndex,
    pub index: u16,
}

impl Serialize for LocalVariable {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.start_pc.serialize(writer)?;
        self.length.serialize(writer)?;
        self.name_index.serialize(writer)?;
        self.descriptor_index.serialize(writer)?;
        self.index.serialize(writer)?;
        Ok(())
    }
}

impl Deserialize for LocalVariable {
    fn deserialize<R: ReadBytesExt>(reader: &mut R, constants: &ConstantPool) -> Result<Self, Error> {
        Ok(LocalVariable {
            start_pc: reader.read_u16::<BigEndian>()?,
            length: reader.read_u16::<BigEndian>()?,
            name_index: Utf8ConstantIndex::deserialize(reader, constants)?,
            descriptor_index: Utf8ConstantIndex::deserialize(reader, constants)?,
            index: reader.read_u16::<BigEndian>()?,
        })
    }
}

/// Read exactly `length` bytes
fn read_blob<R: Read>(reader: &mut R, length: usize) -> Result<Vec<u8>, Error> {
    let mut bytes = Vec::with_capacity(length.min(1 << 16));
    reader.take(length as u64).read_to_end(&mut bytes)?;
    if bytes.len() != length {
        let msg = format!("Expected {} bytes but only found {}", length, bytes.len());
        return Err(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, msg).into());
    }
    Ok(bytes)
}

fn u32_length(len: usize) -> std::io::Result<u32> {
    u32::try_from(len).map_err(|_| {
        let msg = format!("Length {} does not fit in a u32", len);
        std::io::Error::new(std::io::ErrorKind::InvalidData, msg)
    })
}
