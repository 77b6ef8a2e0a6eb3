use crate::jvm::binary_format::u16_length;
use crate::jvm::{Deserialize, Error, Serialize};
use crate::util::{Offset, OffsetResult, OffsetVec, Width};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::collections::HashMap;
use std::io::Read;

/// Constant pool of a parsed class file
///
/// Entries are addressed by their 1-based [`ConstantIndex`]. The pool is only ever grown while
/// building a class from scratch: rewriting an existing class replaces entries in place, so that
/// every index stored elsewhere in the class file (and every `Long`/`Double` second slot) stays
/// where it was.
#[derive(Debug, Clone)]
pub struct ConstantPool {
    constants: OffsetVec<Constant>,

    /// First index of every well-formed `Utf8` constant, by value
    utf8s: HashMap<String, Utf8ConstantIndex>,
}

impl Default for ConstantPool {
    fn default() -> Self {
        ConstantPool::new()
    }
}

impl ConstantPool {
    /// Make a fresh empty constants pool
    pub fn new() -> ConstantPool {
        ConstantPool {
            constants: OffsetVec::new_starting_at(Offset(1)),
            utf8s: HashMap::new(),
        }
    }

    /// Value of `constant_pool_count` (one more than the largest index, counting the unusable
    /// slots after `Long` and `Double` constants)
    pub fn count(&self) -> usize {
        self.constants.offset_len().0
    }

    /// Number of entries (not counting unusable slots)
    pub fn len(&self) -> usize {
        self.constants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constants.is_empty()
    }

    /// Add a constant to the end of the pool
    pub fn push(&mut self, constant: Constant) -> ConstantIndex {
        let index = ConstantIndex(self.constants.offset_len().0 as u16);
        if let Constant::Utf8(string) = &constant {
            self.utf8s
                .entry(string.clone())
                .or_insert(Utf8ConstantIndex(index));
        }
        self.constants.push(constant);
        index
    }

    /// Get or insert a `Utf8` constant
    pub fn utf8_constant(&mut self, string: &str) -> Utf8ConstantIndex {
        match self.find_utf8(string) {
            Some(index) => index,
            None => Utf8ConstantIndex(self.push(Constant::Utf8(string.to_owned()))),
        }
    }

    /// Get or insert a `Class` constant
    pub fn class_constant(&mut self, name: &str) -> ClassConstantIndex {
        let name = self.utf8_constant(name);
        let existing = self.iter().find_map(|(index, constant)| match constant {
            Constant::Class(class_name) if *class_name == name => Some(index),
            _ => None,
        });
        ClassConstantIndex(existing.unwrap_or_else(|| self.push(Constant::Class(name))))
    }

    /// Get or insert a `NameAndType` constant
    pub fn name_and_type_constant(
        &mut self,
        name: &str,
        descriptor: &str,
    ) -> NameAndTypeConstantIndex {
        let name = self.utf8_constant(name);
        let descriptor = self.utf8_constant(descriptor);
        let existing = self.iter().find_map(|(index, constant)| match constant {
            Constant::NameAndType {
                name: n,
                descriptor: d,
            } if *n == name && *d == descriptor => Some(index),
            _ => None,
        });
        NameAndTypeConstantIndex(
            existing.unwrap_or_else(|| self.push(Constant::NameAndType { name, descriptor })),
        )
    }

    /// Look up a constant by index
    pub fn get(&self, index: impl Into<ConstantIndex>) -> Result<&Constant, Error> {
        let index = index.into();
        self.constants
            .get_offset(Offset(index.0 as usize))
            .ok()
            .ok_or(Error::MissingConstant(index))
    }

    /// Look up the value of a `Utf8` constant
    ///
    /// Payloads which are not well-formed modified UTF-8 are reported as the wrong kind of
    /// constant, since there is no string to return for them.
    pub fn utf8(&self, index: Utf8ConstantIndex) -> Result<&str, Error> {
        match self.get(index)? {
            Constant::Utf8(string) => Ok(string),
            _ => Err(Error::UnexpectedConstant {
                index: index.0,
                expected: "Utf8",
            }),
        }
    }

    /// Look up the `Utf8` index holding the name of a `Class` constant
    pub fn class_name_index(&self, index: ClassConstantIndex) -> Result<Utf8ConstantIndex, Error> {
        match self.get(index)? {
            Constant::Class(name) => Ok(*name),
            _ => Err(Error::UnexpectedConstant {
                index: index.0,
                expected: "Class",
            }),
        }
    }

    /// Look up the name of a `Class` constant
    pub fn class_name(&self, index: ClassConstantIndex) -> Result<&str, Error> {
        self.utf8(self.class_name_index(index)?)
    }

    /// Look up the name and descriptor of a `NameAndType` constant
    pub fn name_and_type(
        &self,
        index: NameAndTypeConstantIndex,
    ) -> Result<(Utf8ConstantIndex, Utf8ConstantIndex), Error> {
        match self.get(index)? {
            Constant::NameAndType { name, descriptor } => Ok((*name, *descriptor)),
            _ => Err(Error::UnexpectedConstant {
                index: index.0,
                expected: "NameAndType",
            }),
        }
    }

    /// Find the first `Utf8` constant with the given value
    pub fn find_utf8(&self, string: &str) -> Option<Utf8ConstantIndex> {
        self.utf8s.get(string).copied()
    }

    /// Replace the constant at an existing index, returning the previous constant
    ///
    /// The replacement must have the same width as the constant it replaces.
    pub fn replace(
        &mut self,
        index: impl Into<ConstantIndex>,
        constant: Constant,
    ) -> Result<Constant, Error> {
        let index = index.into();
        let new_utf8 = match &constant {
            Constant::Utf8(string) => Some(string.clone()),
            _ => None,
        };
        let old = match self.constants.set_offset(Offset(index.0 as usize), constant) {
            OffsetResult::Replaced(_, old) => old,
            OffsetResult::IncompatibleWidth(_, _) => return Err(Error::IncompatibleWidth(index)),
            _ => return Err(Error::MissingConstant(index)),
        };
        if let Constant::Utf8(old_string) = &old {
            if self.utf8s.get(old_string) == Some(&Utf8ConstantIndex(index)) {
                self.utf8s.remove(old_string);
            }
        }
        if let Some(string) = new_utf8 {
            self.utf8s.entry(string).or_insert(Utf8ConstantIndex(index));
        }
        Ok(old)
    }

    /// Iterate through constants, along with their indices
    pub fn iter(&self) -> impl Iterator<Item = (ConstantIndex, &Constant)> {
        self.constants
            .iter()
            .map(|(offset, _, constant)| (ConstantIndex(offset.0 as u16), constant))
    }

    /// Read the `constant_pool_count` and then every constant
    pub fn parse_from<R: ReadBytesExt>(reader: &mut R) -> Result<ConstantPool, Error> {
        let count = reader.read_u16::<BigEndian>()? as usize;
        let mut pool = ConstantPool::new();
        while pool.count() < count {
            let index = ConstantIndex(pool.count() as u16);
            let constant = Constant::read_from(reader, index)?;
            pool.push(constant);
        }
        if pool.count() != count {
            // A `Long` or `Double` in the last slot claims an index past the end
            return Err(Error::MissingConstant(ConstantIndex(count as u16)));
        }
        Ok(pool)
    }
}

impl Serialize for ConstantPool {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        u16_length(self.count())?.serialize(writer)?;
        for (_, constant) in self.iter() {
            constant.serialize(writer)?;
        }
        Ok(())
    }
}

/// Constant in the constant pool
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-4.html#jvms-4.4
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// Class or an interface
    Class(Utf8ConstantIndex),

    /// Field
    FieldRef(ClassConstantIndex, NameAndTypeConstantIndex),

    /// Method (this combines `Methodref` and `InterfaceMethodref`
    MethodRef {
        class: ClassConstantIndex,
        name_and_type: NameAndTypeConstantIndex,
        is_interface: bool,
    },

    /// Constant object of type `java.lang.String`
    String(Utf8ConstantIndex),

    /// Constant primitive of type `int`
    Integer(i32),

    /// Constant primitive of type `float`
    Float(f32),

    /// Constant primitive of type `long`
    Long(i64),

    /// Constant primitive of type `double`
    Double(f64),

    /// Name and a type (eg. for a field or a method)
    NameAndType {
        name: Utf8ConstantIndex,
        descriptor: Utf8ConstantIndex,
    },

    /// Constant UTF-8 encoded raw string value
    ///
    /// Despite the name, the encoding is not quite UTF-8 (the encoding of the
    /// null character `\u{0000}` and the encoding of supplementary characters
    /// is different).
    Utf8(String),

    /// `Utf8` constant whose payload is not canonical modified UTF-8 (eg. an unpaired surrogate)
    ///
    /// The bytes are kept as is, so that they are written back unchanged.
    RawUtf8(Vec<u8>),

    /// Constant object of type `java.lang.invoke.MethodHandle`
    MethodHandle {
        handle_kind: HandleKind,

        /// Depending on the method kind, this points to different things:
        ///
        ///   - `FieldRef` for `GetField`, `GetStatic`, `PutField`, `PutStatic`
        ///   - `MethodRef` for the rest
        member: ConstantIndex,
    },

    /// Method type
    MethodType { descriptor: Utf8ConstantIndex },

    /// Dynamically-computed constant
    Dynamic {
        /// Index into the `BootstrapMethods` attribute
        bootstrap_method: u16,
        name_and_type: NameAndTypeConstantIndex,
    },

    /// Dynamically-computed call site
    InvokeDynamic {
        /// Index into the `BootstrapMethods` attribute
        bootstrap_method: u16,
        method_descriptor: NameAndTypeConstantIndex,
    },

    /// Module name
    Module(Utf8ConstantIndex),

    /// Package name, in internal form
    Package(Utf8ConstantIndex),
}

impl Constant {
    /// Read one constant (including its tag)
    ///
    /// The index is only used for error reporting.
    fn read_from<R: ReadBytesExt>(reader: &mut R, index: ConstantIndex) -> Result<Constant, Error> {
        fn read_index<R: ReadBytesExt>(reader: &mut R) -> Result<ConstantIndex, Error> {
            Ok(ConstantIndex(reader.read_u16::<BigEndian>()?))
        }

        let tag = reader.read_u8()?;
        let constant = match tag {
            1 => {
                let len = reader.read_u16::<BigEndian>()? as u64;
                let mut bytes = vec![];
                reader.by_ref().take(len).read_to_end(&mut bytes)?;
                if bytes.len() as u64 != len {
                    let msg = "Truncated Utf8 constant";
                    return Err(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, msg).into());
                }
                match decode_modified_utf8(&bytes) {
                    Some(string) => Constant::Utf8(string),
                    None => Constant::RawUtf8(bytes),
                }
            }
            3 => Constant::Integer(reader.read_i32::<BigEndian>()?),
            4 => Constant::Float(reader.read_f32::<BigEndian>()?),
            5 => Constant::Long(reader.read_i64::<BigEndian>()?),
            6 => Constant::Double(reader.read_f64::<BigEndian>()?),
            7 => Constant::Class(Utf8ConstantIndex(read_index(reader)?)),
            8 => Constant::String(Utf8ConstantIndex(read_index(reader)?)),
            9 => Constant::FieldRef(
                ClassConstantIndex(read_index(reader)?),
                NameAndTypeConstantIndex(read_index(reader)?),
            ),
            10 | 11 => Constant::MethodRef {
                class: ClassConstantIndex(read_index(reader)?),
                name_and_type: NameAndTypeConstantIndex(read_index(reader)?),
                is_interface: tag == 11,
            },
            12 => Constant::NameAndType {
                name: Utf8ConstantIndex(read_index(reader)?),
                descriptor: Utf8ConstantIndex(read_index(reader)?),
            },
            15 => Constant::MethodHandle {
                handle_kind: HandleKind::from_u8(reader.read_u8()?)?,
                member: read_index(reader)?,
            },
            16 => Constant::MethodType {
                descriptor: Utf8ConstantIndex(read_index(reader)?),
            },
            17 => Constant::Dynamic {
                bootstrap_method: reader.read_u16::<BigEndian>()?,
                name_and_type: NameAndTypeConstantIndex(read_index(reader)?),
            },
            18 => Constant::InvokeDynamic {
                bootstrap_method: reader.read_u16::<BigEndian>()?,
                method_descriptor: NameAndTypeConstantIndex(read_index(reader)?),
            },
            19 => Constant::Module(Utf8ConstantIndex(read_index(reader)?)),
            20 => Constant::Package(Utf8ConstantIndex(read_index(reader)?)),
            _ => return Err(Error::UnknownConstantTag { tag, index }),
        };
        Ok(constant)
    }
}

impl Serialize for Constant {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        match self {
            Constant::Utf8(string) => {
                1u8.serialize(writer)?;
                let buffer: Vec<u8> = encode_modified_utf8(string);
                u16_length(buffer.len())?.serialize(writer)?;
                writer.write_all(&buffer)?;
            }
            Constant::RawUtf8(bytes) => {
                1u8.serialize(writer)?;
                u16_length(bytes.len())?.serialize(writer)?;
                writer.write_all(bytes)?;
            }
            Constant::Integer(integer) => {
                3u8.serialize(writer)?;
                integer.serialize(writer)?;
            }
            Constant::Float(float) => {
                4u8.serialize(writer)?;
                float.serialize(writer)?;
            }
            Constant::Long(long) => {
                5u8.serialize(writer)?;
                long.serialize(writer)?;
            }
            Constant::Double(double) => {
                6u8.serialize(writer)?;
                double.serialize(writer)?;
            }
            Constant::Class(name) => {
                7u8.serialize(writer)?;
                name.serialize(writer)?;
            }
            Constant::String(bytes) => {
                8u8.serialize(writer)?;
                bytes.serialize(writer)?;
            }
            Constant::FieldRef(class, name_and_type) => {
                9u8.serialize(writer)?;
                class.serialize(writer)?;
                name_and_type.serialize(writer)?;
            }
            Constant::MethodRef {
                class,
                name_and_type,
                is_interface,
            } => {
                (if !is_interface { 10u8 } else { 11u8 }).serialize(writer)?;
                class.serialize(writer)?;
                name_and_type.serialize(writer)?;
            }
            Constant::NameAndType { name, descriptor } => {
                12u8.serialize(writer)?;
                name.serialize(writer)?;
                descriptor.serialize(writer)?;
            }
            Constant::MethodHandle {
                handle_kind,
                member,
            } => {
                15u8.serialize(writer)?;
                handle_kind.serialize(writer)?;
                member.serialize(writer)?;
            }
            Constant::MethodType { descriptor } => {
                16u8.serialize(writer)?;
                descriptor.serialize(writer)?;
            }
            Constant::Dynamic {
                bootstrap_method,
                name_and_type,
            } => {
                17u8.serialize(writer)?;
                bootstrap_method.serialize(writer)?;
                name_and_type.serialize(writer)?;
            }
            Constant::InvokeDynamic {
                bootstrap_method,
                method_descriptor,
            } => {
                18u8.serialize(writer)?;
                bootstrap_method.serialize(writer)?;
                method_descriptor.serialize(writer)?;
            }
            Constant::Module(name) => {
                19u8.serialize(writer)?;
                name.serialize(writer)?;
            }
            Constant::Package(name) => {
                20u8.serialize(writer)?;
                name.serialize(writer)?;
            }
        };
        Ok(())
    }
}

/// Modified UTF-8 format used in class files.
///
/// See [this `DataInput` section for details][0]. Quoting from that section:
///
/// > The differences between this format and the standard UTF-8 format are the following:
/// >
/// >  * The null byte `\u0000` is encoded in 2-byte format rather than 1-byte, so that the encoded
/// >    strings never have embedded nulls.
/// >  * Only the 1-byte, 2-byte, and 3-byte formats are used.
/// >  * Supplementary characters are represented in the form of surrogate pairs.
///
/// [0]: https://docs.oracle.com/en/java/javase/17/docs/api/java.base/java/io/DataInput.html#modified-utf-8
pub fn encode_modified_utf8(string: &str) -> Vec<u8> {
    let mut buffer: Vec<u8> = vec![];
    for c in string.chars() {
        // Handle the exception for how `\u{0000}` is represented
        let len: usize = if c == '\u{0000}' { 2 } else { c.len_utf8() };
        let code: u32 = c as u32;

        match len {
            1 => buffer.push(code as u8),
            2 => {
                buffer.push((code >> 6 & 0x1F) as u8 | 0b1100_0000);
                buffer.push((code & 0x3F) as u8 | 0b1000_0000);
            }
            3 => {
                buffer.push((code >> 12 & 0x0F) as u8 | 0b1110_0000);
                buffer.push((code >> 6 & 0x3F) as u8 | 0b1000_0000);
                buffer.push((code & 0x3F) as u8 | 0b1000_0000);
            }

            // Supplementary characters: main divergence from unicode
            _ => {
                buffer.push(0b1110_1101);
                buffer.push(((code >> 16 & 0x0F) as u8).wrapping_sub(1) & 0x0F | 0b1010_0000);
                buffer.push((code >> 10 & 0x3F) as u8 | 0b1000_0000);

                buffer.push(0b1110_1101);
                buffer.push(((code >> 6 & 0x0F) as u8) | 0b1011_0000);
                buffer.push((code & 0x3F) as u8 | 0b1000_0000);
            }
        }
    }
    buffer
}

/// Inverse of [`encode_modified_utf8`]
///
/// Only the encoding `encode_modified_utf8` would produce is accepted, so that decoding and then
/// encoding again always gives back the original bytes. Anything else (overlong forms, 4-byte
/// forms, unpaired surrogates, raw null bytes) returns `None`.
pub fn decode_modified_utf8(bytes: &[u8]) -> Option<String> {
    fn continuation(bytes: &[u8], at: usize) -> Option<u32> {
        match bytes.get(at) {
            Some(b) if b & 0b1100_0000 == 0b1000_0000 => Some((b & 0x3F) as u32),
            _ => None,
        }
    }

    /// Read a 3-byte unit, returning the code unit and the new position
    fn three_bytes(bytes: &[u8], at: usize) -> Option<u32> {
        let first = *bytes.get(at)?;
        if first & 0b1111_0000 != 0b1110_0000 {
            return None;
        }
        let code = ((first & 0x0F) as u32) << 12
            | continuation(bytes, at + 1)? << 6
            | continuation(bytes, at + 2)?;
        if code < 0x800 {
            None
        } else {
            Some(code)
        }
    }

    let mut string = String::with_capacity(bytes.len());
    let mut at = 0;
    while at < bytes.len() {
        let first = bytes[at];
        if first == 0 {
            return None;
        } else if first < 0x80 {
            string.push(first as char);
            at += 1;
        } else if first & 0b1110_0000 == 0b1100_0000 {
            let code = ((first & 0x1F) as u32) << 6 | continuation(bytes, at + 1)?;
            if code != 0 && code < 0x80 {
                return None;
            }
            string.push(char::from_u32(code)?);
            at += 2;
        } else {
            let code = three_bytes(bytes, at)?;
            match code {
                0xD800..=0xDBFF => {
                    let low = three_bytes(bytes, at + 3)?;
                    if !(0xDC00..=0xDFFF).contains(&low) {
                        return None;
                    }
                    let combined = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                    string.push(char::from_u32(combined)?);
                    at += 6;
                }
                0xDC00..=0xDFFF => return None,
                _ => {
                    string.push(char::from_u32(code)?);
                    at += 3;
                }
            }
        }
    }
    Some(string)
}


/// Almost all constants have width 1, except for `Constant::Long` and `Constant::Double`. Quoting
/// the spec:
///
/// > All 8-byte constants take up two entries in the constant_pool table of the class file. If a
/// > CONSTANT_Long_info or CONSTANT_Double_info structure is the item in the constant_pool table
/// > at index n, then the next usable item in the pool is located at index n+2. The constant_pool
/// > index n+1 must be valid but is considered unusable.
impl Width for Constant {
    fn width(&self) -> usize {
        match self {
            Constant::Long(_) | Constant::Double(_) => 2,
            _ => 1,
        }
    }
}

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct ConstantIndex(pub u16);

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct Utf8ConstantIndex(pub ConstantIndex);

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct ClassConstantIndex(pub ConstantIndex);

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct NameAndTypeConstantIndex(pub ConstantIndex);

impl Serialize for ConstantIndex {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.0.serialize(writer)
    }
}

impl Deserialize for ConstantIndex {
    fn deserialize<R: ReadBytesExt>(reader: &mut R, _: &ConstantPool) -> Result<Self, Error> {
        Ok(ConstantIndex(reader.read_u16::<BigEndian>()?))
    }
}

/// Typed indices serialize as the plain index. Where `0` is allowed to mean "absent", the
/// `Option` of the typed index is used.
macro_rules! typed_constant_index {
    ($($typed:ident),*) => {
        $(
            impl From<$typed> for ConstantIndex {
                fn from(index: $typed) -> ConstantIndex {
                    index.0
                }
            }

            impl Serialize for $typed {
                fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
                    self.0.serialize(writer)
                }
            }

            impl Deserialize for $typed {
                fn deserialize<R: ReadBytesExt>(
                    reader: &mut R,
                    constants: &ConstantPool,
                ) -> Result<Self, Error> {
                    ConstantIndex::deserialize(reader, constants).map($typed)
                }
            }

            impl Serialize for Option<$typed> {
                fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
                    match self {
                        Some(index) => index.serialize(writer),
                        None => 0u16.serialize(writer),
                    }
                }
            }

            impl Deserialize for Option<$typed> {
                fn deserialize<R: ReadBytesExt>(
                    reader: &mut R,
                    constants: &ConstantPool,
                ) -> Result<Self, Error> {
                    let index = ConstantIndex::deserialize(reader, constants)?;
                    Ok(if index.0 == 0 { None } else { Some($typed(index)) })
                }
            }
        )*
    };
}

typed_constant_index!(
    Utf8ConstantIndex,
    ClassConstantIndex,
    NameAndTypeConstantIndex
);

/// Type of method handle
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-5.html#jvms-5.4.3.5-220
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum HandleKind {
    GetField,
    GetStatic,
    PutField,
    PutStatic,
    InvokeVirtual,
    InvokeStatic,
    InvokeSpecial,
    NewInvokeSpecial,
    InvokeInterface,
}

impl HandleKind {
    fn from_u8(kind: u8) -> Result<HandleKind, Error> {
        Ok(match kind {
            1 => HandleKind::GetField,
            2 => HandleKind::GetStatic,
            3 => HandleKind::PutField,
            4 => HandleKind::PutStatic,
            5 => HandleKind::InvokeVirtual,
            6 => HandleKind::InvokeStatic,
            7 => HandleKind::InvokeSpecial,
            8 => HandleKind::NewInvokeSpecial,
            9 => HandleKind::InvokeInterface,
            _ => return Err(Error::UnknownHandleKind(kind)),
        })
    }
}

impl Serialize for HandleKind {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        let byte: u8 = match self {
            HandleKind::GetField => 1,
            HandleKind::GetStatic => 2,
            HandleKind::PutField => 3,
            HandleKind::PutStatic => 4,
            HandleKind::InvokeVirtual => 5,
            HandleKind::InvokeStatic => 6,
            HandleKind::InvokeSpecial => 7,
            HandleKind::NewInvokeSpecial => 8,
            HandleKind::InvokeInterface => 9,
        };
        byte.serialize(writer)
    }
}

#[cfg(test)]
mod pool_tests {
    use super::*;

    fn sample_pool() -> ConstantPool {
        let mut pool = ConstantPool::new();
        pool.class_constant("javax/servlet/Servlet");
        pool.push(Constant::Double(1.5));
        pool.push(Constant::Integer(7));
        pool
    }

    #[test]
    fn wide_constants_take_two_slots() {
        let pool = sample_pool();
        assert_eq!(pool.len(), 4);
        assert_eq!(pool.count(), 6);
        assert_eq!(pool.get(ConstantIndex(3)).unwrap(), &Constant::Double(1.5));
        assert!(matches!(
            pool.get(ConstantIndex(4)),
            Err(Error::MissingConstant(ConstantIndex(4)))
        ));
        assert_eq!(pool.get(ConstantIndex(5)).unwrap(), &Constant::Integer(7));
        assert!(pool.get(ConstantIndex(0)).is_err());
    }

    #[test]
    fn parse_round_trip() {
        let pool = sample_pool();
        let mut bytes = vec![];
        pool.serialize(&mut bytes).unwrap();
        assert_eq!(&bytes[..2], &[0, 6]);

        let parsed = ConstantPool::parse_from(&mut bytes.as_slice()).unwrap();
        assert_eq!(parsed.count(), 6);
        assert_eq!(
            parsed.class_name(ClassConstantIndex(ConstantIndex(2))).unwrap(),
            "javax/servlet/Servlet"
        );
        let mut written = vec![];
        parsed.serialize(&mut written).unwrap();
        assert_eq!(written, bytes);
    }

    #[test]
    fn unknown_tag() {
        let bytes: &[u8] = &[0, 3, 3, 0, 0, 0, 1, 2, 0, 0];
        assert!(matches!(
            ConstantPool::parse_from(&mut &bytes[..]),
            Err(Error::UnknownConstantTag {
                tag: 2,
                index: ConstantIndex(2)
            })
        ));
    }

    #[test]
    fn raw_utf8_is_preserved() {
        let bytes: &[u8] = &[0, 2, 1, 0, 3, 237, 160, 128];
        let pool = ConstantPool::parse_from(&mut &bytes[..]).unwrap();
        assert_eq!(
            pool.get(ConstantIndex(1)).unwrap(),
            &Constant::RawUtf8(vec![237, 160, 128])
        );
        assert!(pool.utf8(Utf8ConstantIndex(ConstantIndex(1))).is_err());

        let mut written = vec![];
        pool.serialize(&mut written).unwrap();
        assert_eq!(written, bytes);
    }

    #[test]
    fn replace_keeps_width_and_lookup() {
        let mut pool = sample_pool();
        let old = pool
            .replace(ConstantIndex(1), Constant::Utf8("jakarta/servlet/Servlet".into()))
            .unwrap();
        assert_eq!(old, Constant::Utf8("javax/servlet/Servlet".into()));
        assert_eq!(pool.find_utf8("javax/servlet/Servlet"), None);
        assert_eq!(
            pool.find_utf8("jakarta/servlet/Servlet"),
            Some(Utf8ConstantIndex(ConstantIndex(1)))
        );
        assert!(matches!(
            pool.replace(ConstantIndex(3), Constant::Integer(1)),
            Err(Error::IncompatibleWidth(ConstantIndex(3)))
        ));
        assert_eq!(pool.count(), 6);
    }
}
