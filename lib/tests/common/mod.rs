#![allow(dead_code)]

use jarshift::jvm::class_file::{
    Annotation, Attribute, AttributeBody, ClassFile, Code, Constant, ConstantPool, ElementValue,
    ElementValuePair, ExceptionHandler, Field, LocalVariable, Method, StackMapFrame,
    StackMapTable, VerificationType, Version,
};
use jarshift::jvm::{ClassAccessFlags, FieldAccessFlags, MethodAccessFlags};
use jarshift::rules::RuleTable;
use std::sync::Arc;

pub fn rules() -> Arc<RuleTable> {
    let rules = RuleTable::builder()
        .rename("javax.servlet", "jakarta.servlet")
        .rename("javax.annotation.*", "jakarta.annotation.*")
        .build()
        .unwrap();
    Arc::new(rules)
}

/// Class with no members, just `this` and `super`
pub fn empty_class(name: &str, super_name: &str) -> ClassFile {
    let mut constants = ConstantPool::new();
    let this_class = constants.class_constant(name);
    let super_class = constants.class_constant(super_name);
    ClassFile {
        version: Version::JAVA8,
        constants,
        access_flags: ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER,
        this_class,
        super_class: Some(super_class),
        interfaces: vec![],
        fields: vec![],
        methods: vec![],
        attributes: vec![],
    }
}

/// Servlet-ish class which mentions `javax` types just about everywhere they can go
///
/// ```java
/// @RunAs("admin")
/// public class Widget extends GenericServlet implements Filter {
///     private ServletConfig config;
///     private List<Filter> filters;
///
///     public void service(ServletRequest request, ServletResponse response)
///         throws ServletException { ... }
/// }
/// ```
pub fn widget() -> ClassFile {
    let mut class = empty_class("com/example/Widget", "javax/servlet/GenericServlet");
    let this_class = class.this_class;
    let constants = &mut class.constants;

    class.interfaces.push(constants.class_constant("javax/servlet/Filter"));
    let exception = constants.class_constant("javax/servlet/ServletException");

    // Only used by bytecode, and in a sub-package which the rules do not cover
    constants.class_constant("javax/servlet/http/HttpServletRequest");

    let message = constants.utf8_constant("javax.servlet.Filter");
    constants.push(Constant::String(message));
    constants.push(Constant::Long(7));

    let config = Field {
        access_flags: FieldAccessFlags::PRIVATE,
        name_index: constants.utf8_constant("config"),
        descriptor_index: constants.utf8_constant("Ljavax/servlet/ServletConfig;"),
        attributes: vec![],
    };
    let signature = constants.utf8_constant("Ljava/util/List<Ljavax/servlet/Filter;>;");
    let filters = Field {
        access_flags: FieldAccessFlags::PRIVATE,
        name_index: constants.utf8_constant("filters"),
        descriptor_index: constants.utf8_constant("Ljava/util/List;"),
        attributes: vec![Attribute::new(
            constants,
            "Signature",
            AttributeBody::Signature(signature),
        )],
    };
    class.fields = vec![config, filters];

    let request = constants.class_constant("javax/servlet/ServletRequest");
    let frames = Attribute::new(
        constants,
        "StackMapTable",
        AttributeBody::StackMapTable(StackMapTable(vec![
            StackMapFrame::Full {
                offset_delta: 2,
                locals: vec![VerificationType::Object(this_class), VerificationType::Integer],
                stack: vec![],
            },
            StackMapFrame::SameLocalsOneStack {
                offset_delta: 0,
                stack: VerificationType::Object(request),
            },
            StackMapFrame::Same { offset_delta: 0 },
        ])),
    );
    let this_name = constants.utf8_constant("this");
    let this_descriptor = constants.utf8_constant("Lcom/example/Widget;");
    let request_name = constants.utf8_constant("request");
    let request_descriptor = constants.utf8_constant("Ljavax/servlet/ServletRequest;");
    let locals = Attribute::new(
        constants,
        "LocalVariableTable",
        AttributeBody::LocalVariableTable(vec![
            LocalVariable {
                start_pc: 0,
                length: 6,
                name_index: this_name,
                descriptor_index: this_descriptor,
                index: 0,
            },
            LocalVariable {
                start_pc: 0,
                length: 6,
                name_index: request_name,
                descriptor_index: request_descriptor,
                index: 1,
            },
        ]),
    );
    let code = Code {
        max_stack: 1,
        max_locals: 3,
        code_array: vec![0x00, 0x00, 0xB1, 0x4E, 0xB1, 0x00],
        exception_table: vec![ExceptionHandler {
            start_pc: 0,
            end_pc: 2,
            handler_pc: 3,
            catch_type: Some(exception),
        }],
        attributes: vec![frames, locals],
    };
    let service = Method {
        access_flags: MethodAccessFlags::PUBLIC,
        name_index: constants.utf8_constant("service"),
        descriptor_index: constants.utf8_constant(
            "(Ljavax/servlet/ServletRequest;Ljavax/servlet/ServletResponse;)V",
        ),
        attributes: vec![
            Attribute::new(constants, "Code", AttributeBody::Code(code)),
            Attribute::new(
                constants,
                "Exceptions",
                AttributeBody::Exceptions(vec![exception]),
            ),
        ],
    };
    class.methods = vec![service];

    let run_as = constants.utf8_constant("Ljavax/annotation/security/RunAs;");
    let value = constants.utf8_constant("value");
    let admin = constants.utf8_constant("admin");
    let source_file = constants.utf8_constant("Widget.java");
    class.attributes = vec![
        Attribute::new(
            constants,
            "RuntimeVisibleAnnotations",
            AttributeBody::RuntimeVisibleAnnotations(vec![Annotation {
                type_index: run_as,
                elements: vec![ElementValuePair {
                    name_index: value,
                    value: ElementValue::Const {
                        tag: b's',
                        value: admin.0,
                    },
                }],
            }]),
        ),
        Attribute::new(
            constants,
            "SourceFile",
            AttributeBody::Other(source_file.0 .0.to_be_bytes().to_vec()),
        ),
    ];

    class
}

/// Find the first attribute of a list with the given name
pub fn attribute<'a>(
    constants: &ConstantPool,
    attributes: &'a [Attribute],
    name: &str,
) -> &'a AttributeBody {
    attributes
        .iter()
        .find(|attribute| constants.utf8(attribute.name_index).unwrap() == name)
        .map(|attribute| &attribute.body)
        .unwrap_or_else(|| panic!("no {} attribute", name))
}
