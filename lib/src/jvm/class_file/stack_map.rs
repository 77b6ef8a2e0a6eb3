use crate::jvm::class_file::{ClassConstantIndex, ConstantPool};
use crate::jvm::{Deserialize, Error, Serialize};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

/// [0]: https://docs.oracle.com/javase/specs/jvms/se7/html/jvms-4.html#jvms-4.7.4
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackMapTable(pub Vec<StackMapFrame>);

impl Serialize for StackMapTable {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.0.serialize(writer)
    }
}

impl Deserialize for StackMapTable {
    fn deserialize<R: ReadBytesExt>(reader: &mut R, constants: &ConstantPool) -> Result<Self, Error> {
        Vec::deserialize(reader, constants).map(StackMapTable)
    }
}

/// Frames keep track of whether they used the compact or extended encoding, so that a frame with
/// a small offset delta written in the extended form is written back the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackMapFrame {
    /// Frame has the same locals as the previous frame and number of stack items is zero
    /// Tags: 0-63
    Same { offset_delta: u8 },

    /// Frame has the same locals as the previous frame and number of stack items is one
    /// Tags: 64-127
    SameLocalsOneStack {
        offset_delta: u8,
        stack: VerificationType,
    },

    /// Tag: 247
    SameLocalsOneStackExtended {
        offset_delta: u16,
        stack: VerificationType,
    },

    /// Frame is like the previous frame, but without the last `chopped_k` locals
    ///
    /// Note: `chopped_k` must be in the range 1 to 3 inclusive
    /// Tags: 248-250
    Chop { offset_delta: u16, chopped_k: u8 },

    /// Tag: 251
    SameExtended { offset_delta: u16 },

    /// Frame is like the previous frame, but with 1 to 3 extra locals
    /// Tags: 252-254
    Append {
        offset_delta: u16,
        locals: Vec<VerificationType>,
    },

    /// Frame has exactly the locals and stack specified
    /// Tag: 255
    Full {
        offset_delta: u16,
        locals: Vec<VerificationType>,
        stack: Vec<VerificationType>,
    },
}

impl Serialize for StackMapFrame {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        match self {
            StackMapFrame::Same { offset_delta } => offset_delta.serialize(writer)?,
            StackMapFrame::SameLocalsOneStack {
                offset_delta,
                stack,
            } => {
                (offset_delta + 64).serialize(writer)?;
                stack.serialize(writer)?;
            }
            StackMapFrame::SameLocalsOneStackExtended {
                offset_delta,
                stack,
            } => {
                247u8.serialize(writer)?;
                offset_delta.serialize(writer)?;
                stack.serialize(writer)?;
            }
            StackMapFrame::Chop {
                offset_delta,
                chopped_k,
            } => {
                (251 - chopped_k).serialize(writer)?;
                offset_delta.serialize(writer)?;
            }
            StackMapFrame::SameExtended { offset_delta } => {
                251u8.serialize(writer)?;
                offset_delta.serialize(writer)?;
            }
            StackMapFrame::Append {
                offset_delta,
                locals,
            } => {
                (251 + locals.len() as u8).serialize(writer)?;
                offset_delta.serialize(writer)?;
                for local in locals {
                    local.serialize(writer)?;
                }
            }
            StackMapFrame::Full {
                offset_delta,
                locals,
                stack,
            } => {
                255u8.serialize(writer)?;
                offset_delta.serialize(writer)?;
                locals.serialize(writer)?;
                stack.serialize(writer)?;
            }
        };
        Ok(())
    }
}

impl Deserialize for StackMapFrame {
    fn deserialize<R: ReadBytesExt>(reader: &mut R, constants: &ConstantPool) -> Result<Self, Error> {
        let frame_type = reader.read_u8()?;
        let frame = match frame_type {
            0..=63 => StackMapFrame::Same {
                offset_delta: frame_type,
            },
            64..=127 => StackMapFrame::SameLocalsOneStack {
                offset_delta: frame_type - 64,
                stack: VerificationType::deserialize(reader, constants)?,
            },
            247 => StackMapFrame::SameLocalsOneStackExtended {
                offset_delta: reader.read_u16::<BigEndian>()?,
                stack: VerificationType::deserialize(reader, constants)?,
            },
            248..=250 => StackMapFrame::Chop {
                offset_delta: reader.read_u16::<BigEndian>()?,
                chopped_k: 251 - frame_type,
            },
            251 => StackMapFrame::SameExtended {
                offset_delta: reader.read_u16::<BigEndian>()?,
            },
            252..=254 => {
                let offset_delta = reader.read_u16::<BigEndian>()?;
                let mut locals = vec![];
                for _ in 0..(frame_type - 251) {
                    locals.push(VerificationType::deserialize(reader, constants)?);
                }
                StackMapFrame::Append {
                    offset_delta,
                    locals,
                }
            }
            255 => StackMapFrame::Full {
                offset_delta: reader.read_u16::<BigEndian>()?,
                locals: Vec::deserialize(reader, constants)?,
                stack: Vec::deserialize(reader, constants)?,
            },
            _ => return Err(Error::UnknownFrameType(frame_type)),
        };
        Ok(frame)
    }
}

/// These types are from [this hierarchy][0]
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se7/html/jvms-4.html#jvms-4.10.1.2
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub enum VerificationType {
    Top,
    Integer,
    Float,
    Double,
    Long,
    Null,

    /// In the constructor, the `this` parameter starts with this type then turns into an object
    /// type after `<init>` is called
    UninitializedThis,

    /// Object type
    Object(ClassConstantIndex),

    /// State of an object after `new` has been called but `<init>` has not been called, along
    /// with the offset of the `new` instruction
    Uninitialized(u16),
}

impl Serialize for VerificationType {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        match self {
            VerificationType::Top => 0u8.serialize(writer)?,
            VerificationType::Integer => 1u8.serialize(writer)?,
            VerificationType::Float => 2u8.serialize(writer)?,
            VerificationType::Double => 3u8.serialize(writer)?,
            VerificationType::Long => 4u8.serialize(writer)?,
            VerificationType::Null => 5u8.serialize(writer)?,
            VerificationType::UninitializedThis => 6u8.serialize(writer)?,
            VerificationType::Object(cls) => {
                7u8.serialize(writer)?;
                cls.serialize(writer)?;
            }
            VerificationType::Uninitialized(offset) => {
                8u8.serialize(writer)?;
                offset.serialize(writer)?;
            }
        };
        Ok(())
    }
}

impl Deserialize for VerificationType {
    fn deserialize<R: ReadBytesExt>(reader: &mut R, constants: &ConstantPool) -> Result<Self, Error> {
        let tag = reader.read_u8()?;
        Ok(match tag {
            0 => VerificationType::Top,
            1 => VerificationType::Integer,
            2 => VerificationType::Float,
            3 => VerificationType::Double,
            4 => VerificationType::Long,
            5 => VerificationType::Null,
            6 => VerificationType::UninitializedThis,
            7 => VerificationType::Object(ClassConstantIndex::deserialize(reader, constants)?),
            8 => VerificationType::Uninitialized(reader.read_u16::<BigEndian>()?),
            _ => return Err(Error::UnknownVerificationType(tag)),
        })
    }
}
