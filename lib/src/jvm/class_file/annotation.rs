use crate::jvm::binary_format::u8_length;
use crate::jvm::class_file::{ConstantIndex, ConstantPool, Utf8ConstantIndex};
use crate::jvm::{Deserialize, Error, Serialize};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

/// [0]: https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-4.html#jvms-4.7.16
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Field descriptor of the annotation interface
    pub type_index: Utf8ConstantIndex,
    pub elements: Vec<ElementValuePair>,
}

impl Serialize for Annotation {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.type_index.serialize(writer)?;
        self.elements.serialize(writer)?;
        Ok(())
    }
}

impl Deserialize for Annotation {
    fn deserialize<R: ReadBytesExt>(reader: &mut R, constants: &ConstantPool) -> Result<Self, Error> {
        Ok(Annotation {
            type_index: Utf8ConstantIndex::deserialize(reader, constants)?,
            elements: Vec::deserialize(reader, constants)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementValuePair {
    pub name_index: Utf8ConstantIndex,
    pub value: ElementValue,
}

impl Serialize for ElementValuePair {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.name_index.serialize(writer)?;
        self.value.serialize(writer)?;
        Ok(())
    }
}

impl Deserialize for ElementValuePair {
    fn deserialize<R: ReadBytesExt>(reader: &mut R, constants: &ConstantPool) -> Result<Self, Error> {
        Ok(ElementValuePair {
            name_index: Utf8ConstantIndex::deserialize(reader, constants)?,
            value: ElementValue::deserialize(reader, constants)?,
        })
    }
}

/// [0]: https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-4.html#jvms-4.7.16.1
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementValue {
    /// Primitive or string constant, with its tag (one of `BCDFIJSZs`)
    Const { tag: u8, value: ConstantIndex },

    /// Enum constant
    Enum {
        /// Field descriptor of the enum class
        type_name: Utf8ConstantIndex,
        const_name: Utf8ConstantIndex,
    },

    /// Class literal, as a return descriptor (so `V` is allowed)
    Class(Utf8ConstantIndex),

    /// Nested annotation
    Annotation(Annotation),

    Array(Vec<ElementValue>),
}

impl Serialize for ElementValue {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        match self {
            ElementValue::Const { tag, value } => {
                tag.serialize(writer)?;
                value.serialize(writer)?;
            }
            ElementValue::Enum {
                type_name,
                const_name,
            } => {
                b'e'.serialize(writer)?;
                type_name.serialize(writer)?;
                const_name.serialize(writer)?;
            }
            ElementValue::Class(class_info) => {
                b'c'.serialize(writer)?;
                class_info.serialize(writer)?;
            }
            ElementValue::Annotation(annotation) => {
                b'@'.serialize(writer)?;
                annotation.serialize(writer)?;
            }
            ElementValue::Array(values) => {
                b'['.serialize(writer)?;
                values.serialize(writer)?;
            }
        };
        Ok(())
    }
}

impl Deserialize for ElementValue {
    fn deserialize<R: ReadBytesExt>(reader: &mut R, constants: &ConstantPool) -> Result<Self, Error> {
        let tag = reader.read_u8()?;
        Ok(match tag {
            b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b's' => ElementValue::Const {
                tag,
                value: ConstantIndex::deserialize(reader, constants)?,
            },
            b'e' => ElementValue::Enum {
                type_name: Utf8ConstantIndex::deserialize(reader, constants)?,
                const_name: Utf8ConstantIndex::deserialize(reader, constants)?,
            },
            b'c' => ElementValue::Class(Utf8ConstantIndex::deserialize(reader, constants)?),
            b'@' => ElementValue::Annotation(Annotation::deserialize(reader, constants)?),
            b'[' => ElementValue::Array(Vec::deserialize(reader, constants)?),
            _ => return Err(Error::UnknownElementValueTag(tag)),
        })
    }
}

/// Annotations on each formal parameter of a method
///
/// Unlike most lists in class files, the number of parameters is a `u8`.
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-4.html#jvms-4.7.18
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterAnnotations(pub Vec<Vec<Annotation>>);

impl Serialize for ParameterAnnotations {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        u8_length(self.0.len())?.serialize(writer)?;
        for parameter in &self.0 {
            parameter.serialize(writer)?;
        }
        Ok(())
    }
}

impl Deserialize for ParameterAnnotations {
    fn deserialize<R: ReadBytesExt>(reader: &mut R, constants: &ConstantPool) -> Result<Self, Error> {
        let count = reader.read_u8()?;
        let mut parameters = Vec::with_capacity(count as usize);
        for _ in 0..count {
            parameters.push(Vec::deserialize(reader, constants)?);
        }
        Ok(ParameterAnnotations(parameters))
    }
}

/// Annotation on a use of a type
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-4.html#jvms-4.7.20
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeAnnotation {
    /// Raw `target_type`, which also picks the shape of `target_info`
    pub target_type: u8,
    pub target_info: TargetInfo,
    pub target_path: Vec<TypePathEntry>,
    pub annotation: Annotation,
}

impl Serialize for TypeAnnotation {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.target_type.serialize(writer)?;
        self.target_info.serialize(writer)?;
        u8_length(self.target_path.len())?.serialize(writer)?;
        for entry in &self.target_path {
            entry.type_path_kind.serialize(writer)?;
            entry.type_argument_index.serialize(writer)?;
        }
        self.annotation.serialize(writer)?;
        Ok(())
    }
}

impl Deserialize for TypeAnnotation {
    fn deserialize<R: ReadBytesExt>(reader: &mut R, constants: &ConstantPool) -> Result<Self, Error> {
        let target_type = reader.read_u8()?;
        let target_info = TargetInfo::read_from(reader, target_type)?;
        let path_length = reader.read_u8()?;
        let mut target_path = Vec::with_capacity(path_length as usize);
        for _ in 0..path_length {
            target_path.push(TypePathEntry {
                type_path_kind: reader.read_u8()?,
                type_argument_index: reader.read_u8()?,
            });
        }
        Ok(TypeAnnotation {
            target_type,
            target_info,
            target_path,
            annotation: Annotation::deserialize(reader, constants)?,
        })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TypePathEntry {
    pub type_path_kind: u8,
    pub type_argument_index: u8,
}

/// Which type in a declaration or expression is annotated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetInfo {
    /// `0x00`, `0x01`
    TypeParameter { type_parameter_index: u8 },

    /// `0x10`
    Supertype { supertype_index: u16 },

    /// `0x11`, `0x12`
    TypeParameterBound {
        type_parameter_index: u8,
        bound_index: u8,
    },

    /// `0x13`, `0x14`, `0x15`
    Empty,

    /// `0x16`
    FormalParameter { formal_parameter_index: u8 },

    /// `0x17`
    Throws { throws_type_index: u16 },

    /// `0x40`, `0x41`
    LocalVar(Vec<LocalVarTarget>),

    /// `0x42`
    Catch { exception_table_index: u16 },

    /// `0x43` to `0x46`
    Offset { offset: u16 },

    /// `0x47` to `0x4B`
    TypeArgument { offset: u16, type_argument_index: u8 },
}

impl TargetInfo {
    fn read_from<R: ReadBytesExt>(reader: &mut R, target_type: u8) -> Result<TargetInfo, Error> {
        Ok(match target_type {
            0x00 | 0x01 => TargetInfo::TypeParameter {
                type_parameter_index: reader.read_u8()?,
            },
            0x10 => TargetInfo::Supertype {
                supertype_index: reader.read_u16::<BigEndian>()?,
            },
            0x11 | 0x12 => TargetInfo::TypeParameterBound {
                type_parameter_index: reader.read_u8()?,
                bound_index: reader.read_u8()?,
            },
            0x13..=0x15 => TargetInfo::Empty,
            0x16 => TargetInfo::FormalParameter {
                formal_parameter_index: reader.read_u8()?,
            },
            0x17 => TargetInfo::Throws {
                throws_type_index: reader.read_u16::<BigEndian>()?,
            },
            0x40 | 0x41 => {
                let count = reader.read_u16::<BigEndian>()?;
                let mut table = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    table.push(LocalVarTarget {
                        start_pc: reader.read_u16::<BigEndian>()?,
                        length: reader.read_u16::<BigEndian>()?,
                        index: reader.read_u16::<BigEndian>()?,
                    });
                }
                TargetInfo::LocalVar(table)
            }
            0x42 => TargetInfo::Catch {
                exception_table_index: reader.read_u16::<BigEndian>()?,
            },
            0x43..=0x46 => TargetInfo::Offset {
                offset: reader.read_u16::<BigEndian>()?,
            },
            0x47..=0x4B => TargetInfo::TypeArgument {
                offset: reader.read_u16::<BigEndian>()?,
                type_argument_index: reader.read_u8()?,
            },
            _ => return Err(Error::UnknownTargetType(target_type)),
        })
    }
}

impl Serialize for TargetInfo {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        match self {
            TargetInfo::TypeParameter {
                type_parameter_index,
            } => type_parameter_index.serialize(writer)?,
            TargetInfo::Supertype { supertype_index } => supertype_index.serialize(writer)?,
            TargetInfo::TypeParameterBound {
                type_parameter_index,
                bound_index,
            } => {
                type_parameter_index.serialize(writer)?;
                bound_index.serialize(writer)?;
            }
            TargetInfo::Empty => (),
            TargetInfo::FormalParameter {
                formal_parameter_index,
            } => formal_parameter_index.serialize(writer)?,
            TargetInfo::Throws { throws_type_index } => throws_type_index.serialize(writer)?,
            TargetInfo::LocalVar(table) => table.serialize(writer)?,
            TargetInfo::Catch {
                exception_table_index,
            } => exception_table_index.serialize(writer)?,
            TargetInfo::Offset { offset } => offset.serialize(writer)?,
            TargetInfo::TypeArgument {
                offset,
                type_argument_index,
            } => {
                offset.serialize(writer)?;
                type_argument_index.serialize(writer)?;
            }
        };
        Ok(())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LocalVarTarget {
    pub start_pc: u16,
    pub length: u16,
    pub index: u16,
}

impl Serialize for LocalVarTarget {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.start_pc.serialize(writer)?;
        self.length.serialize(writer)?;
        self.index.serialize(writer)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn nested_element_values() {
        #[rustfmt::skip]
        let bytes: Vec<u8> = vec![
            0, 1, // type
            0, 3, // 3 pairs
            0, 2, b's', 0, 3,
            0, 4, b'[', 0, 2, b'c', 0, 5, b'e', 0, 6, 0, 7,
            0, 8, b'@', 0, 9, 0, 0,
        ];
        let pool = ConstantPool::new();
        let annotation = Annotation::deserialize(&mut bytes.as_slice(), &pool).unwrap();
        assert_eq!(annotation.elements.len(), 3);
        assert!(matches!(
            &annotation.elements[1].value,
            ElementValue::Array(values) if values.len() == 2
        ));

        let mut written = vec![];
        annotation.serialize(&mut written).unwrap();
        assert_eq!(written, bytes);
    }

    #[test]
    fn type_annotation_targets() {
        #[rustfmt::skip]
        let bytes: Vec<u8> = vec![
            0, 2, // 2 annotations
            0x40, 0, 1, 0, 0, 0, 10, 0, 3, // local variable target
            1, 3, 0, // path
            0, 4, 0, 0, // annotation
            0x47, 0, 12, 1, // type argument target
            0, // empty path
            0, 4, 0, 0,
        ];
        let pool = ConstantPool::new();
        let annotations: Vec<TypeAnnotation> =
            Vec::deserialize(&mut bytes.as_slice(), &pool).unwrap();
        assert_eq!(
            annotations[0].target_info,
            TargetInfo::LocalVar(vec![LocalVarTarget {
                start_pc: 0,
                length: 10,
                index: 3
            }])
        );
        assert_eq!(annotations[0].target_path.len(), 1);

        let mut written = vec![];
        annotations.serialize(&mut written).unwrap();
        assert_eq!(written, bytes);
    }

    #[test]
    fn bad_tags() {
        let pool = ConstantPool::new();
        let bytes: &[u8] = &[b'x', 0, 1];
        assert!(matches!(
            ElementValue::deserialize(&mut &bytes[..], &pool),
            Err(Error::UnknownElementValueTag(b'x'))
        ));
        let bytes: &[u8] = &[0x30, 0, 0, 0, 0];
        assert!(matches!(
            TypeAnnotation::deserialize(&mut &bytes[..], &pool),
            Err(Error::UnknownTargetType(0x30))
        ));
    }
}
