use crate::jvm::class_file::{
    Attribute, ClassConstantIndex, ConstantPool, Field, Method, Version,
};
use crate::jvm::{ClassAccessFlags, Deserialize, Error, Serialize};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

/// Representation of the [`class` file format of the JVM][0]
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html
#[derive(Debug, Clone)]
pub struct ClassFile {
    pub version: Version,
    pub constants: ConstantPool,
    pub access_flags: ClassAccessFlags,
    pub this_class: ClassConstantIndex,

    /// Only `java/lang/Object` (and `module-info`) have no super class
    pub super_class: Option<ClassConstantIndex>,
    pub interfaces: Vec<ClassConstantIndex>,
    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
    pub attributes: Vec<Attribute>,
}

impl ClassFile {
    /// Magic header bytes that go at the front of the serialized class file
    pub const MAGIC: [u8; 4] = [0xCA, 0xFE, 0xBA, 0xBE];

    /// Parse a complete class file
    ///
    /// Every byte must be accounted for: leftover bytes after the class attributes are an error.
    pub fn parse(bytes: &[u8]) -> Result<ClassFile, Error> {
        let mut reader = bytes;
        let magic = reader.read_u32::<BigEndian>()?;
        if magic.to_be_bytes() != ClassFile::MAGIC {
            return Err(Error::BadMagic(magic));
        }
        let empty = ConstantPool::new();
        let version = Version::deserialize(&mut reader, &empty)?;
        let constants = ConstantPool::parse_from(&mut reader)?;
        let class_file = ClassFile {
            version,
            access_flags: ClassAccessFlags::deserialize(&mut reader, &constants)?,
            this_class: ClassConstantIndex::deserialize(&mut reader, &constants)?,
            super_class: Option::deserialize(&mut reader, &constants)?,
            interfaces: Vec::deserialize(&mut reader, &constants)?,
            fields: Vec::deserialize(&mut reader, &constants)?,
            methods: Vec::deserialize(&mut reader, &constants)?,
            attributes: Vec::deserialize(&mut reader, &constants)?,
            constants,
        };
        if !reader.is_empty() {
            return Err(Error::TrailingBytes(reader.len()));
        }
        Ok(class_file)
    }

    /// Name of this class
    pub fn class_name(&self) -> Result<&str, Error> {
        self.constants.class_name(self.this_class)
    }

    /// Encode the class file into a fresh buffer
    pub fn to_bytes(&self) -> std::io::Result<Vec<u8>> {
        let mut bytes = vec![];
        self.serialize(&mut bytes)?;
        Ok(bytes)
    }
}

impl Serialize for ClassFile {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&ClassFile::MAGIC)?;
        self.version.serialize(writer)?;
        self.constants.serialize(writer)?;
        self.access_flags.serialize(writer)?;
        self.this_class.serialize(writer)?;
        self.super_class.serialize(writer)?;
        self.interfaces.serialize(writer)?;
        self.fields.serialize(writer)?;
        self.methods.serialize(writer)?;
        self.attributes.serialize(writer)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::class_file::AttributeBody;
    use crate::jvm::FieldAccessFlags;

    fn sample() -> ClassFile {
        let mut constants = ConstantPool::new();
        let this_class = constants.class_constant("com/example/Widget");
        let super_class = constants.class_constant("java/lang/Object");
        let name_index = constants.utf8_constant("config");
        let descriptor_index = constants.utf8_constant("Ljavax/servlet/ServletConfig;");
        let source = Attribute::new(
            &mut constants,
            "SourceFile",
            AttributeBody::Other(vec![0, 1]),
        );
        ClassFile {
            version: Version::JAVA8,
            constants,
            access_flags: ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER,
            this_class,
            super_class: Some(super_class),
            interfaces: vec![],
            fields: vec![Field {
                access_flags: FieldAccessFlags::PRIVATE,
                name_index,
                descriptor_index,
                attributes: vec![],
            }],
            methods: vec![],
            attributes: vec![source],
        }
    }

    #[test]
    fn parse_what_was_written() {
        let class = sample();
        let bytes = class.to_bytes().unwrap();
        assert_eq!(&bytes[..4], &ClassFile::MAGIC);

        let parsed = ClassFile::parse(&bytes).unwrap();
        assert_eq!(parsed.class_name().unwrap(), "com/example/Widget");
        assert_eq!(parsed.fields, class.fields);
        assert_eq!(parsed.attributes, class.attributes);
        assert_eq!(parsed.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn bad_magic_and_trailing_bytes() {
        assert!(matches!(
            ClassFile::parse(&[0xCA, 0xFE, 0xD0, 0x0D, 0, 0]),
            Err(Error::BadMagic(0xCAFED00D))
        ));
        assert!(matches!(ClassFile::parse(&[0xCA]), Err(Error::IoError(_))));

        let mut bytes = sample().to_bytes().unwrap();
        bytes.push(0);
        assert!(matches!(
            ClassFile::parse(&bytes),
            Err(Error::TrailingBytes(1))
        ));
    }
}
