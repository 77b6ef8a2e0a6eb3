//! Generic signatures, as found in `Signature` and `LocalVariableTypeTable` attributes
//!
//! See [the grammar in the JVM spec][0]. Unlike descriptors, signatures carry type parameters,
//! type arguments, type variables, and checked exceptions.
//!
//! [0]: https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-4.html#jvms-4.7.9.1

use super::descriptors::{eof, expect_char, invalid};
use super::{BaseType, ParseDescriptor, RenderDescriptor};
use std::io::Result;
use std::iter::Peekable;
use std::str::Chars;

/// Any JVM signature
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum JavaTypeSignature {
    Base(BaseType),
    Reference(ReferenceTypeSignature),
}

impl RenderDescriptor for JavaTypeSignature {
    fn render_to(&self, write_to: &mut String) {
        match self {
            JavaTypeSignature::Base(typ) => typ.render_to(write_to),
            JavaTypeSignature::Reference(typ) => typ.render_to(write_to),
        }
    }
}

impl ParseDescriptor for JavaTypeSignature {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self> {
        match source.peek().copied() {
            Some('L' | 'T' | '[') => {
                ReferenceTypeSignature::parse_from(source).map(JavaTypeSignature::Reference)
            }
            _ => BaseType::parse_from(source).map(JavaTypeSignature::Base),
        }
    }
}

/// Signature for a reference type
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum ReferenceTypeSignature {
    Class(ClassTypeSignature),
    TypeVariable(String),
    Array(Box<JavaTypeSignature>),
}

impl RenderDescriptor for ReferenceTypeSignature {
    fn render_to(&self, write_to: &mut String) {
        match self {
            ReferenceTypeSignature::Class(class) => class.render_to(write_to),
            ReferenceTypeSignature::TypeVariable(ty_var) => {
                write_to.push('T');
                write_to.push_str(ty_var);
                write_to.push(';');
            }
            ReferenceTypeSignature::Array(sig) => {
                write_to.push('[');
                sig.render_to(write_to);
            }
        }
    }
}

impl ParseDescriptor for ReferenceTypeSignature {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self> {
        match source.peek().copied() {
            Some('L') => ClassTypeSignature::parse_from(source).map(ReferenceTypeSignature::Class),
            Some('T') => {
                let _ = source.next();
                let name = parse_identifier(source)?;
                expect_char(source, ';')?;
                Ok(ReferenceTypeSignature::TypeVariable(name))
            }
            Some('[') => {
                let _ = source.next();
                let sig = JavaTypeSignature::parse_from(source)?;
                Ok(ReferenceTypeSignature::Array(Box::new(sig)))
            }
            Some(c) => Err(invalid(format!("Invalid start to reference type: {}", c))),
            None => Err(eof("Expected reference type")),
        }
    }
}

/// Identifiers in signatures are anything up to the next grammar character
fn parse_identifier(source: &mut Peekable<Chars>) -> Result<String> {
    let mut name = String::new();
    while let Some(c) = source.next_if(|c| !matches!(*c, '.' | ';' | '[' | '/' | '<' | '>' | ':')) {
        name.push(c);
    }
    if name.is_empty() {
        match source.peek() {
            Some(c) => Err(invalid(format!("Expected identifier but found '{}'", c))),
            None => Err(eof("Expected identifier")),
        }
    } else {
        Ok(name)
    }
}

/// Type signature for a class or an interface
///
/// `Lpkg/Outer<TT;>.Inner<Ljava/lang/String;>;` has `pkg/Outer` as its name and one suffix for
/// `Inner`. Only `name` is a binary class name: the suffixes are simple names of member classes.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct ClassTypeSignature {
    /// Binary name of the outermost class (including its package)
    pub name: String,
    pub arguments: Vec<TypeArgument>,
    pub suffixes: Vec<SimpleClassTypeSignature>,
}

impl RenderDescriptor for ClassTypeSignature {
    fn render_to(&self, write_to: &mut String) {
        write_to.push('L');
        write_to.push_str(&self.name);
        render_type_arguments(&self.arguments, write_to);
        for suffix in &self.suffixes {
            write_to.push('.');
            suffix.render_to(write_to);
        }
        write_to.push(';')
    }
}

impl ParseDescriptor for ClassTypeSignature {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self> {
        expect_char(source, 'L')?;

        let mut name = parse_identifier(source)?;
        while source.next_if_eq(&'/').is_some() {
            name.push('/');
            name.push_str(&parse_identifier(source)?);
        }
        let arguments = parse_type_arguments(source)?;

        let mut suffixes = vec![];
        while source.next_if_eq(&'.').is_some() {
            suffixes.push(SimpleClassTypeSignature::parse_from(source)?);
        }
        expect_char(source, ';')?;

        Ok(ClassTypeSignature {
            name,
            arguments,
            suffixes,
        })
    }
}

/// Type signature without a package prefix
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct SimpleClassTypeSignature {
    pub name: String,
    pub arguments: Vec<TypeArgument>,
}

impl RenderDescriptor for SimpleClassTypeSignature {
    fn render_to(&self, write_to: &mut String) {
        write_to.push_str(&self.name);
        render_type_arguments(&self.arguments, write_to);
    }
}

impl ParseDescriptor for SimpleClassTypeSignature {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self> {
        let name = parse_identifier(source)?;
        let arguments = parse_type_arguments(source)?;
        Ok(SimpleClassTypeSignature { name, arguments })
    }
}

fn render_type_arguments(arguments: &[TypeArgument], write_to: &mut String) {
    if !arguments.is_empty() {
        write_to.push('<');
        for argument in arguments {
            argument.render_to(write_to);
        }
        write_to.push('>');
    }
}

/// Optional `<...>` type argument list (which is never empty when present)
fn parse_type_arguments(source: &mut Peekable<Chars>) -> Result<Vec<TypeArgument>> {
    let mut arguments = vec![];
    if source.next_if_eq(&'<').is_some() {
        loop {
            arguments.push(TypeArgument::parse_from(source)?);
            if source.next_if_eq(&'>').is_some() {
                break;
            }
        }
    }
    Ok(arguments)
}

/// Type argument (needed to complete signatures for generic classes)
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum TypeArgument {
    Concrete(Option<WildcardIndicator>, ReferenceTypeSignature),
    Wildcard,
}

impl RenderDescriptor for TypeArgument {
    fn render_to(&self, write_to: &mut String) {
        match self {
            TypeArgument::Wildcard => write_to.push('*'),
            TypeArgument::Concrete(indicator, reference_type) => {
                match indicator {
                    Some(WildcardIndicator::Plus) => write_to.push('+'),
                    Some(WildcardIndicator::Minus) => write_to.push('-'),
                    None => (),
                }
                reference_type.render_to(write_to);
            }
        };
    }
}

impl ParseDescriptor for TypeArgument {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self> {
        let indicator = match source.peek().copied() {
            Some('*') => {
                let _ = source.next();
                return Ok(TypeArgument::Wildcard);
            }
            Some('+') => Some(WildcardIndicator::Plus),
            Some('-') => Some(WildcardIndicator::Minus),
            _ => None,
        };
        if indicator.is_some() {
            let _ = source.next();
        }
        let ref_type = ReferenceTypeSignature::parse_from(source)?;
        Ok(TypeArgument::Concrete(indicator, ref_type))
    }
}

/// Bound on a wildcard type argument: `? extends T` is `+` and `? super T` is `-`
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum WildcardIndicator {
    Plus,
    Minus,
}

/// Declaration of a type variable, with its bounds
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct TypeParameter {
    pub name: String,
    pub class_bound: Option<ReferenceTypeSignature>,
    pub interface_bounds: Vec<ReferenceTypeSignature>,
}

impl RenderDescriptor for TypeParameter {
    fn render_to(&self, write_to: &mut String) {
        write_to.push_str(&self.name);
        write_to.push(':');
        if let Some(bound) = &self.class_bound {
            bound.render_to(write_to);
        }
        for bound in &self.interface_bounds {
            write_to.push(':');
            bound.render_to(write_to);
        }
    }
}

impl ParseDescriptor for TypeParameter {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self> {
        let name = parse_identifier(source)?;
        expect_char(source, ':')?;
        let class_bound = match source.peek() {
            Some('L' | 'T' | '[') => Some(ReferenceTypeSignature::parse_from(source)?),
            _ => None,
        };
        let mut interface_bounds = vec![];
        while source.next_if_eq(&':').is_some() {
            interface_bounds.push(ReferenceTypeSignature::parse_from(source)?);
        }
        Ok(TypeParameter {
            name,
            class_bound,
            interface_bounds,
        })
    }
}

fn render_type_parameters(parameters: &[TypeParameter], write_to: &mut String) {
    if !parameters.is_empty() {
        write_to.push('<');
        for parameter in parameters {
            parameter.render_to(write_to);
        }
        write_to.push('>');
    }
}

fn parse_type_parameters(source: &mut Peekable<Chars>) -> Result<Vec<TypeParameter>> {
    let mut parameters = vec![];
    if source.next_if_eq(&'<').is_some() {
        loop {
            parameters.push(TypeParameter::parse_from(source)?);
            if source.next_if_eq(&'>').is_some() {
                break;
            }
        }
    }
    Ok(parameters)
}

/// Signature of a class declaration: type parameters, superclass, and superinterfaces
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct ClassSignature {
    pub type_parameters: Vec<TypeParameter>,
    pub superclass: ClassTypeSignature,
    pub interfaces: Vec<ClassTypeSignature>,
}

impl RenderDescriptor for ClassSignature {
    fn render_to(&self, write_to: &mut String) {
        render_type_parameters(&self.type_parameters, write_to);
        self.superclass.render_to(write_to);
        for interface in &self.interfaces {
            interface.render_to(write_to);
        }
    }
}

impl ParseDescriptor for ClassSignature {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self> {
        let type_parameters = parse_type_parameters(source)?;
        let superclass = ClassTypeSignature::parse_from(source)?;
        let mut interfaces = vec![];
        while source.peek().is_some() {
            interfaces.push(ClassTypeSignature::parse_from(source)?);
        }
        Ok(ClassSignature {
            type_parameters,
            superclass,
            interfaces,
        })
    }
}

/// Signature of a method declaration
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct MethodSignature {
    pub type_parameters: Vec<TypeParameter>,
    pub parameters: Vec<JavaTypeSignature>,

    /// `None` is for `void`
    pub result: Option<JavaTypeSignature>,

    /// Each of these is either a class type or a type variable
    pub throws: Vec<ReferenceTypeSignature>,
}

impl RenderDescriptor for MethodSignature {
    fn render_to(&self, write_to: &mut String) {
        render_type_parameters(&self.type_parameters, write_to);
        write_to.push('(');
        for parameter in &self.parameters {
            parameter.render_to(write_to);
        }
        write_to.push(')');
        match &self.result {
            None => write_to.push('V'),
            Some(result) => result.render_to(write_to),
        }
        for throws in &self.throws {
            write_to.push('^');
            throws.render_to(write_to);
        }
    }
}

impl ParseDescriptor for MethodSignature {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self> {
        let type_parameters = parse_type_parameters(source)?;
        expect_char(source, '(')?;
        let mut parameters = vec![];
        while source.next_if_eq(&')').is_none() {
            parameters.push(JavaTypeSignature::parse_from(source)?);
        }
        let result = if source.next_if_eq(&'V').is_some() {
            None
        } else {
            Some(JavaTypeSignature::parse_from(source)?)
        };
        let mut throws = vec![];
        while source.next_if_eq(&'^').is_some() {
            let throw = match source.peek() {
                Some('L' | 'T') => ReferenceTypeSignature::parse_from(source)?,
                Some(c) => return Err(invalid(format!("Invalid thrown type start '{}'", c))),
                None => return Err(eof("Expected thrown type")),
            };
            throws.push(throw);
        }
        Ok(MethodSignature {
            type_parameters,
            parameters,
            result,
            throws,
        })
    }
}

/// Field signatures are just reference type signatures
pub type FieldSignature = ReferenceTypeSignature;

#[cfg(test)]
mod test {
    use super::*;

    fn round_trip<T: RenderDescriptor + ParseDescriptor + std::fmt::Debug>(rendered: &str) -> T {
        let parsed = T::parse(rendered).unwrap();
        assert_eq!(parsed.render(), rendered);
        parsed
    }

    #[test]
    fn field_signatures() {
        let list: FieldSignature = round_trip("Ljava/util/List<Ljavax/servlet/Filter;>;");
        match list {
            ReferenceTypeSignature::Class(class) => {
                assert_eq!(class.name, "java/util/List");
                assert_eq!(class.arguments.len(), 1);
            }
            other => panic!("Unexpected {:?}", other),
        }
        round_trip::<FieldSignature>("TT;");
        round_trip::<FieldSignature>("[[TT;");
        round_trip::<FieldSignature>("[I");
        round_trip::<FieldSignature>("Ljava/util/Map<*+Ljava/lang/Number;-TK;>;");
        round_trip::<FieldSignature>("Lpkg/Outer<TT;>.Inner<Ljava/lang/String;>.Deeper;");
        round_trip::<FieldSignature>("LNoPackage;");
    }

    #[test]
    fn class_signatures() {
        let sig: ClassSignature = round_trip(
            "<T:Ljava/lang/Object;U::Ljava/lang/Comparable<TU;>;>Ljavax/servlet/GenericServlet;Ljava/io/Serializable;",
        );
        assert_eq!(sig.type_parameters.len(), 2);
        assert_eq!(sig.type_parameters[1].class_bound, None);
        assert_eq!(sig.type_parameters[1].interface_bounds.len(), 1);
        assert_eq!(sig.superclass.name, "javax/servlet/GenericServlet");
        assert_eq!(sig.interfaces.len(), 1);
    }

    #[test]
    fn method_signatures() {
        let sig: MethodSignature =
            round_trip("<E:Ljava/lang/Exception;>(TE;[Ljava/lang/String;J)V^TE;^Ljava/io/IOException;");
        assert_eq!(sig.parameters.len(), 3);
        assert_eq!(sig.result, None);
        assert_eq!(sig.throws.len(), 2);
        round_trip::<MethodSignature>("()Ljava/util/List<+Ljavax/servlet/Servlet;>;");
    }

    #[test]
    fn malformed() {
        assert!(FieldSignature::parse("Ljava/util/List<>;").is_err());
        assert!(FieldSignature::parse("Ljava/util/List").is_err());
        assert!(FieldSignature::parse("T;").is_err());
        assert!(ClassSignature::parse("<T:>").is_err());
        assert!(MethodSignature::parse("(I)V^I").is_err());
        assert!(MethodSignature::parse("Ljava/lang/Object;").is_err());
    }
}
