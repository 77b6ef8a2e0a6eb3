mod common;

use common::{attribute, empty_class, rules, widget};
use jarshift::jvm::class_file::{
    AttributeBody, ClassFile, Constant, StackMapFrame, StackMapTable, VerificationType,
};
use jarshift::rules::RuleTable;
use jarshift::transform::{Action, ClassAction, ClassChanges, Error};
use std::io::{self, Cursor, Read};
use std::sync::Arc;
use std::thread;

const WIDGET: &str = "com/example/Widget.class";

#[test]
fn everything_is_renamed() {
    let action = ClassAction::new(rules());
    let input = widget().to_bytes().unwrap();
    let output = action.apply(WIDGET, &input).unwrap().unwrap();

    assert_eq!(output.name, WIDGET);
    let changes = &output.changes;
    assert_eq!(changes.output_class_name, "com/example/Widget");
    assert_eq!(
        changes.input_super_name.as_deref(),
        Some("javax/servlet/GenericServlet")
    );
    assert_eq!(
        changes.output_super_name.as_deref(),
        Some("jakarta/servlet/GenericServlet")
    );
    assert_eq!(changes.modified_interfaces, 1);
    assert_eq!(changes.modified_fields, 2);
    assert_eq!(changes.modified_methods, 1);
    assert_eq!(changes.modified_attributes, 1);
    assert_eq!(changes.modified_constants, 1);
    assert!(!changes.has_resource_name_change());

    let class = ClassFile::parse(&output.bytes).unwrap();
    let constants = &class.constants;
    assert_eq!(constants.count(), widget().constants.count());
    assert_eq!(
        constants.class_name(class.interfaces[0]).unwrap(),
        "jakarta/servlet/Filter"
    );

    let config = &class.fields[0];
    assert_eq!(
        constants.utf8(config.descriptor_index).unwrap(),
        "Ljakarta/servlet/ServletConfig;"
    );
    let filters = &class.fields[1];
    match attribute(constants, &filters.attributes, "Signature") {
        AttributeBody::Signature(signature) => assert_eq!(
            constants.utf8(*signature).unwrap(),
            "Ljava/util/List<Ljakarta/servlet/Filter;>;"
        ),
        other => panic!("unexpected {:?}", other),
    }

    let service = &class.methods[0];
    assert_eq!(
        constants.utf8(service.descriptor_index).unwrap(),
        "(Ljakarta/servlet/ServletRequest;Ljakarta/servlet/ServletResponse;)V"
    );
    let code = match attribute(constants, &service.attributes, "Code") {
        AttributeBody::Code(code) => code,
        other => panic!("unexpected {:?}", other),
    };
    assert_eq!(code.code_array, vec![0x00, 0x00, 0xB1, 0x4E, 0xB1, 0x00]);
    let catch_type = code.exception_table[0].catch_type.unwrap();
    assert_eq!(
        constants.class_name(catch_type).unwrap(),
        "jakarta/servlet/ServletException"
    );
    match attribute(constants, &code.attributes, "LocalVariableTable") {
        AttributeBody::LocalVariableTable(locals) => {
            assert_eq!(
                constants.utf8(locals[0].descriptor_index).unwrap(),
                "Lcom/example/Widget;"
            );
            assert_eq!(
                constants.utf8(locals[1].descriptor_index).unwrap(),
                "Ljakarta/servlet/ServletRequest;"
            );
        }
        other => panic!("unexpected {:?}", other),
    }

    match attribute(constants, &class.attributes, "RuntimeVisibleAnnotations") {
        AttributeBody::RuntimeVisibleAnnotations(annotations) => assert_eq!(
            constants.utf8(annotations[0].type_index).unwrap(),
            "Ljakarta/annotation/security/RunAs;"
        ),
        other => panic!("unexpected {:?}", other),
    }

    let strings: Vec<&str> = constants
        .iter()
        .filter_map(|(_, constant)| match constant {
            Constant::String(value) => constants.utf8(*value).ok(),
            _ => None,
        })
        .collect();
    assert_eq!(strings, vec!["jakarta.servlet.Filter"]);

    // Sub-packages are not covered by an exact rule
    assert!(constants
        .iter()
        .any(|(_, constant)| constant == &Constant::Utf8(
            "javax/servlet/http/HttpServletRequest".to_owned()
        )));
    assert!(constants
        .iter()
        .any(|(_, constant)| constant == &Constant::Long(7)));
}

#[test]
fn only_the_renamed_stack_map_frame_changes() {
    fn frames(class: &ClassFile) -> Vec<StackMapFrame> {
        let constants = &class.constants;
        let code = match attribute(constants, &class.methods[0].attributes, "Code") {
            AttributeBody::Code(code) => code,
            other => panic!("unexpected {:?}", other),
        };
        match attribute(constants, &code.attributes, "StackMapTable") {
            AttributeBody::StackMapTable(StackMapTable(frames)) => frames.clone(),
            other => panic!("unexpected {:?}", other),
        }
    }

    let input = widget();
    let action = ClassAction::new(rules());
    let output = action
        .apply(WIDGET, &input.to_bytes().unwrap())
        .unwrap()
        .unwrap();
    let class = ClassFile::parse(&output.bytes).unwrap();

    let before = frames(&input);
    let after = frames(&class);
    assert_eq!(after.len(), 3);
    assert_eq!(after[0], before[0]);
    assert_eq!(after[2], before[2]);
    match &after[1] {
        StackMapFrame::SameLocalsOneStack {
            offset_delta: 0,
            stack: VerificationType::Object(request),
        } => assert_eq!(
            class.constants.class_name(*request).unwrap(),
            "jakarta/servlet/ServletRequest"
        ),
        other => panic!("unexpected frame {:?}", other),
    }
    match &after[0] {
        StackMapFrame::Full { locals, .. } => match locals[0] {
            VerificationType::Object(this) => {
                assert_eq!(class.constants.class_name(this).unwrap(), "com/example/Widget")
            }
            ref other => panic!("unexpected local {:?}", other),
        },
        other => panic!("unexpected frame {:?}", other),
    }
}

#[test]
fn chained_renames_reach_every_class() {
    let rules = RuleTable::builder()
        .rename("a.b", "b.c")
        .rename("b.c", "c.d")
        .build()
        .unwrap();
    let mut class = empty_class("com/example/Thing", "a/b/Thing");
    let interface = class.constants.class_constant("b/c/Thing");
    class.interfaces.push(interface);

    let action = ClassAction::new(Arc::new(rules));
    let output = action
        .apply("com/example/Thing.class", &class.to_bytes().unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(output.changes.output_super_name.as_deref(), Some("b/c/Thing"));
    assert_eq!(output.changes.modified_interfaces, 1);

    let class = ClassFile::parse(&output.bytes).unwrap();
    let super_class = class.super_class.unwrap();
    assert_eq!(class.constants.class_name(super_class).unwrap(), "b/c/Thing");
    assert_eq!(
        class.constants.class_name(class.interfaces[0]).unwrap(),
        "c/d/Thing"
    );
}

#[test]
fn renaming_twice_changes_nothing() {
    let action = ClassAction::new(rules());
    let output = action
        .apply(WIDGET, &widget().to_bytes().unwrap())
        .unwrap()
        .unwrap();
    assert!(action.apply(&output.name, &output.bytes).unwrap().is_none());
}

#[test]
fn unchanged_classes_are_passed_through() {
    let input = widget().to_bytes().unwrap();

    // The model writes back exactly what it read
    assert_eq!(ClassFile::parse(&input).unwrap().to_bytes().unwrap(), input);

    let empty = ClassAction::new(Arc::new(RuleTable::empty()));
    assert!(empty.apply(WIDGET, &input).unwrap().is_none());

    let unrelated = RuleTable::builder()
        .rename("org.example", "org.sample")
        .build()
        .unwrap();
    let unrelated = ClassAction::new(Arc::new(unrelated));
    assert!(unrelated.apply(WIDGET, &input).unwrap().is_none());
}

#[test]
fn malformed_classes_are_passed_through() {
    let action = ClassAction::new(rules());
    let input = widget().to_bytes().unwrap();

    assert!(action.apply(WIDGET, b"not a class").unwrap().is_none());
    assert!(action
        .apply(WIDGET, &input[..input.len() / 2])
        .unwrap()
        .is_none());

    let mut trailing = input;
    trailing.push(0);
    assert!(action.apply(WIDGET, &trailing).unwrap().is_none());
}

#[test]
fn bad_descriptors_are_passed_through() {
    let mut class = empty_class("com/example/Broken", "java/lang/Object");
    class.fields.push(jarshift::jvm::class_file::Field {
        access_flags: jarshift::jvm::FieldAccessFlags::PRIVATE,
        name_index: class.constants.utf8_constant("broken"),
        descriptor_index: class.constants.utf8_constant("Ljavax/servlet/Servlet"),
        attributes: vec![],
    });

    let action = ClassAction::new(rules());
    let output = action
        .apply("com/example/Broken.class", &class.to_bytes().unwrap())
        .unwrap();
    assert!(output.is_none());
}

#[test]
fn unknown_constant_tags_are_fatal() {
    let action = ClassAction::new(rules());
    let mut input = ClassFile::MAGIC.to_vec();
    input.extend_from_slice(&[0x00, 0x00, 0x00, 0x34]);
    input.extend_from_slice(&[0x00, 0x02, 99, 0x00, 0x00]);

    match action.apply(WIDGET, &input) {
        Err(Error::UnknownConstantTag { resource, tag, .. }) => {
            assert_eq!(resource, WIDGET);
            assert_eq!(tag, 99);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn renamed_classes_move() {
    let action = ClassAction::new(rules());
    let input = empty_class("javax/servlet/Foo", "java/lang/Object")
        .to_bytes()
        .unwrap();

    let output = action
        .apply("WEB-INF/classes/javax/servlet/Foo.class", &input)
        .unwrap()
        .unwrap();
    assert_eq!(output.name, "WEB-INF/classes/jakarta/servlet/Foo.class");
    assert_eq!(output.changes.input_class_name, "javax/servlet/Foo");
    assert_eq!(output.changes.output_class_name, "jakarta/servlet/Foo");
    assert!(output.changes.has_resource_name_change());

    let class = ClassFile::parse(&output.bytes).unwrap();
    assert_eq!(class.class_name().unwrap(), "jakarta/servlet/Foo");
}

#[test]
fn write_failures_are_reported() {
    let mut class = empty_class("com/example/Big", "java/lang/Object");
    let text = "javax.servlet.A ".repeat(4000);
    let text = class.constants.utf8_constant(&text);
    class.constants.push(Constant::String(text));
    let input = class.to_bytes().unwrap();

    // Every `javax` becoming `jakarta` pushes the string past what a `Utf8` can hold
    let action = ClassAction::new(rules());
    match action.apply("com/example/Big.class", &input) {
        Err(Error::Write { resource, .. }) => assert_eq!(resource, "com/example/Big.class"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn shared_between_threads() {
    let action = ClassAction::new(rules());
    let input = widget().to_bytes().unwrap();
    let expected = action.apply(WIDGET, &input).unwrap().unwrap();

    let (action, input) = (&action, &input);
    thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(move || action.apply(WIDGET, input).unwrap().unwrap()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

struct FailingReader;

impl Read for FailingReader {
    fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::Other, "disk on fire"))
    }
}

#[test]
fn buffers_are_returned() {
    let action = ClassAction::new(rules());
    let input = widget().to_bytes().unwrap();

    let output = action.apply_reader(WIDGET, Cursor::new(&input)).unwrap();
    assert!(output.is_some());
    assert_eq!(action.buffers().available(), 1);

    let output = action.apply_reader(WIDGET, &b"junk"[..]).unwrap();
    assert!(output.is_none());
    assert_eq!(action.buffers().available(), 1);

    assert!(matches!(
        action.apply_reader(WIDGET, FailingReader),
        Err(Error::Read { .. })
    ));
    assert_eq!(action.buffers().available(), 1);
}

#[test]
fn used_through_the_trait() {
    let actions: Vec<Box<dyn Action<Changes = ClassChanges>>> =
        vec![Box::new(ClassAction::new(rules()))];
    let input = widget().to_bytes().unwrap();
    for action in &actions {
        assert!(action.accepts(WIDGET));
        assert!(action.apply(WIDGET, &input).unwrap().is_some());
    }
}
