//! Renaming the type references nested in attributes
//!
//! Everything here is copy-on-write: a rewrite returns `None` if nothing changed and a new
//! value otherwise. Shared lists are only copied once one of their elements changes.

use super::rewriter::Rewriter;
use super::signatures::SignatureKind;
use crate::jvm::class_file::{
    Annotation, Attribute, AttributeBody, Code, Constant, ConstantIndex, ElementValue,
    ElementValuePair, InnerClass, LocalVariable, ParameterAnnotations,
    StackMapFrame, StackMapTable, TypeAnnotation, VerificationType,
};
use crate::jvm::Error;
use std::borrow::Cow;

/// Rewrite the elements of a list, copying the list only if some element changes
pub fn rewrite_each<T, F>(items: &[T], mut rewrite: F) -> Result<Option<Vec<T>>, Error>
where
    T: Clone,
    F: FnMut(&T) -> Result<Option<T>, Error>,
{
    let mut output = Cow::Borrowed(items);
    for (i, item) in items.iter().enumerate() {
        if let Some(new_item) = rewrite(item)? {
            output.to_mut()[i] = new_item;
        }
    }
    Ok(match output {
        Cow::Owned(output) => Some(output),
        Cow::Borrowed(_) => None,
    })
}

/// Attributes which the class file model keeps raw, but which refer to packages
const MODULE_ATTRIBUTES: [&str; 3] = ["Module", "ModulePackages", "ModuleMainClass"];

impl Rewriter<'_> {
    /// Rewrite a list of attributes of a class, field, method, or `Code`
    pub fn rewrite_attributes(
        &mut self,
        attributes: &[Attribute],
        kind: SignatureKind,
    ) -> Result<Option<Vec<Attribute>>, Error> {
        rewrite_each(attributes, |attribute| self.rewrite_attribute(attribute, kind))
    }

    /// Rewrite one attribute
    ///
    /// `kind` says what the attribute is attached to, which decides how a `Signature` is read.
    pub fn rewrite_attribute(
        &mut self,
        attribute: &Attribute,
        kind: SignatureKind,
    ) -> Result<Option<Attribute>, Error> {
        let body = match &attribute.body {
            AttributeBody::ConstantValue(value) => self
                .rewrite_constant_value(*value)?
                .then(|| AttributeBody::ConstantValue(*value)),
            AttributeBody::Code(code) => self.rewrite_code(code)?.map(AttributeBody::Code),
            AttributeBody::StackMapTable(table) => self
                .rewrite_stack_map_table(table)?
                .map(AttributeBody::StackMapTable),
            AttributeBody::Exceptions(exceptions) => {
                rewrite_each(exceptions, |class| Ok(self.rename_class(*class)?.then(|| *class)))?
                    .map(AttributeBody::Exceptions)
            }
            AttributeBody::InnerClasses(classes) => {
                rewrite_each(classes, |class| self.rewrite_inner_class(class))?
                    .map(AttributeBody::InnerClasses)
            }
            AttributeBody::EnclosingMethod { class, method } => {
                let class_changed = self.rename_class(*class)?;
                let method_changed = match method {
                    Some(method) => self.rename_name_and_type(*method)?,
                    None => false,
                };
                (class_changed || method_changed).then(|| AttributeBody::EnclosingMethod {
                    class: *class,
                    method: *method,
                })
            }
            AttributeBody::Signature(signature) => self
                .rename_signature(*signature, kind)?
                .map(AttributeBody::Signature),
            AttributeBody::LocalVariableTable(variables) => {
                rewrite_each(variables, |variable| {
                    Ok(self
                        .rename_descriptor(variable.descriptor_index)?
                        .map(|descriptor_index| LocalVariable {
                            descriptor_index,
                            ..*variable
                        }))
                })?
                .map(AttributeBody::LocalVariableTable)
            }
            AttributeBody::LocalVariableTypeTable(variables) => {
                rewrite_each(variables, |variable| {
                    Ok(self
                        .rename_signature(variable.descriptor_index, SignatureKind::Field)?
                        .map(|descriptor_index| LocalVariable {
                            descriptor_index,
                            ..*variable
                        }))
                })?
                .map(AttributeBody::LocalVariableTypeTable)
            }
            AttributeBody::RuntimeVisibleAnnotations(annotations) => self
                .rewrite_annotations(annotations)?
                .map(AttributeBody::RuntimeVisibleAnnotations),
            AttributeBody::RuntimeInvisibleAnnotations(annotations) => self
                .rewrite_annotations(annotations)?
                .map(AttributeBody::RuntimeInvisibleAnnotations),
            AttributeBody::RuntimeVisibleParameterAnnotations(parameters) => self
                .rewrite_parameter_annotations(parameters)?
                .map(AttributeBody::RuntimeVisibleParameterAnnotations),
            AttributeBody::RuntimeInvisibleParameterAnnotations(parameters) => self
                .rewrite_parameter_annotations(parameters)?
                .map(AttributeBody::RuntimeInvisibleParameterAnnotations),
            AttributeBody::RuntimeVisibleTypeAnnotations(annotations) => self
                .rewrite_type_annotations(annotations)?
                .map(AttributeBody::RuntimeVisibleTypeAnnotations),
            AttributeBody::RuntimeInvisibleTypeAnnotations(annotations) => self
                .rewrite_type_annotations(annotations)?
                .map(AttributeBody::RuntimeInvisibleTypeAnnotations),
            AttributeBody::AnnotationDefault(value) => self
                .rewrite_element_value(value)?
                .map(AttributeBody::AnnotationDefault),
            AttributeBody::NestHost(_) | AttributeBody::NestMembers(_) => {
                log::warn!("Nest attributes are not renamed");
                None
            }
            AttributeBody::Other(_) => {
                let name = self.constants().utf8(attribute.name_index)?;
                if MODULE_ATTRIBUTES.contains(&name) {
                    log::warn!("{} attribute is not renamed", name);
                }
                None
            }
        };

        Ok(body.map(|body| Attribute {
            name_index: attribute.name_index,
            body,
        }))
    }

    /// Only `String` constants can change
    fn rewrite_constant_value(&mut self, value: ConstantIndex) -> Result<bool, Error> {
        if matches!(self.constants().get(value)?, Constant::String(_)) {
            self.rename_string_constant(value)
        } else {
            Ok(false)
        }
    }

    fn rewrite_code(&mut self, code: &Code) -> Result<Option<Code>, Error> {
        let exception_table = rewrite_each(&code.exception_table, |handler| {
            Ok(match handler.catch_type {
                Some(catch_type) => self.rename_class(catch_type)?.then(|| *handler),
                None => None,
            })
        })?;
        let attributes = self.rewrite_attributes(&code.attributes, SignatureKind::Method)?;

        if exception_table.is_none() && attributes.is_none() {
            return Ok(None);
        }
        Ok(Some(Code {
            max_stack: code.max_stack,
            max_locals: code.max_locals,
            code_array: code.code_array.clone(),
            exception_table: exception_table.unwrap_or_else(|| code.exception_table.clone()),
            attributes: attributes.unwrap_or_else(|| code.attributes.clone()),
        }))
    }

    fn rewrite_stack_map_table(
        &mut self,
        table: &StackMapTable,
    ) -> Result<Option<StackMapTable>, Error> {
        Ok(rewrite_each(&table.0, |frame| self.rewrite_frame(frame))?.map(StackMapTable))
    }

    fn rewrite_frame(&mut self, frame: &StackMapFrame) -> Result<Option<StackMapFrame>, Error> {
        let frame = match frame {
            StackMapFrame::Same { .. }
            | StackMapFrame::Chop { .. }
            | StackMapFrame::SameExtended { .. } => None,
            StackMapFrame::SameLocalsOneStack {
                offset_delta,
                stack,
            } => self
                .rewrite_verification_type(stack)?
                .map(|stack| StackMapFrame::SameLocalsOneStack {
                    offset_delta: *offset_delta,
                    stack,
                }),
            StackMapFrame::SameLocalsOneStackExtended {
                offset_delta,
                stack,
            } => self.rewrite_verification_type(stack)?.map(|stack| {
                StackMapFrame::SameLocalsOneStackExtended {
                    offset_delta: *offset_delta,
                    stack,
                }
            }),
            StackMapFrame::Append {
                offset_delta,
                locals,
            } => rewrite_each(locals, |local| self.rewrite_verification_type(local))?.map(
                |locals| StackMapFrame::Append {
                    offset_delta: *offset_delta,
                    locals,
                },
            ),
            StackMapFrame::Full {
                offset_delta,
                locals,
                stack,
            } => {
                let new_locals = rewrite_each(locals, |local| self.rewrite_verification_type(local))?;
                let new_stack = rewrite_each(stack, |item| self.rewrite_verification_type(item))?;
                if new_locals.is_none() && new_stack.is_none() {
                    None
                } else {
                    Some(StackMapFrame::Full {
                        offset_delta: *offset_delta,
                        locals: new_locals.unwrap_or_else(|| locals.clone()),
                        stack: new_stack.unwrap_or_else(|| stack.clone()),
                    })
                }
            }
        };
        Ok(frame)
    }

    fn rewrite_verification_type(
        &mut self,
        verification_type: &VerificationType,
    ) -> Result<Option<VerificationType>, Error> {
        match verification_type {
            VerificationType::Object(class) => {
                Ok(self.rename_class(*class)?.then(|| *verification_type))
            }
            _ => Ok(None),
        }
    }

    fn rewrite_inner_class(&mut self, class: &InnerClass) -> Result<Option<InnerClass>, Error> {
        let inner_changed = self.rename_class(class.inner_class)?;
        let outer_changed = match class.outer_class {
            Some(outer) => self.rename_class(outer)?,
            None => false,
        };
        Ok((inner_changed || outer_changed).then(|| *class))
    }

    fn rewrite_annotations(
        &mut self,
        annotations: &[Annotation],
    ) -> Result<Option<Vec<Annotation>>, Error> {
        rewrite_each(annotations, |annotation| self.rewrite_annotation(annotation))
    }

    fn rewrite_parameter_annotations(
        &mut self,
        parameters: &ParameterAnnotations,
    ) -> Result<Option<ParameterAnnotations>, Error> {
        Ok(
            rewrite_each(&parameters.0, |annotations| self.rewrite_annotations(annotations))?
                .map(ParameterAnnotations),
        )
    }

    fn rewrite_type_annotations(
        &mut self,
        annotations: &[TypeAnnotation],
    ) -> Result<Option<Vec<TypeAnnotation>>, Error> {
        rewrite_each(annotations, |type_annotation| {
            Ok(self
                .rewrite_annotation(&type_annotation.annotation)?
                .map(|annotation| TypeAnnotation {
                    annotation,
                    ..type_annotation.clone()
                }))
        })
    }

    fn rewrite_annotation(&mut self, annotation: &Annotation) -> Result<Option<Annotation>, Error> {
        let type_index = self.rename_descriptor(annotation.type_index)?;
        let elements = rewrite_each(&annotation.elements, |pair| {
            Ok(self
                .rewrite_element_value(&pair.value)?
                .map(|value| ElementValuePair {
                    name_index: pair.name_index,
                    value,
                }))
        })?;

        if type_index.is_none() && elements.is_none() {
            return Ok(None);
        }
        Ok(Some(Annotation {
            type_index: type_index.unwrap_or(annotation.type_index),
            elements: elements.unwrap_or_else(|| annotation.elements.clone()),
        }))
    }

    /// String constants in element values point straight at `Utf8` entries, which the constant
    /// pool pass takes care of
    fn rewrite_element_value(&mut self, value: &ElementValue) -> Result<Option<ElementValue>, Error> {
        let value = match value {
            ElementValue::Const { .. } => None,
            ElementValue::Enum {
                type_name,
                const_name,
            } => self
                .rename_descriptor(*type_name)?
                .map(|type_name| ElementValue::Enum {
                    type_name,
                    const_name: *const_name,
                }),
            ElementValue::Class(class) => self
                .rename_return_descriptor(*class)?
                .map(ElementValue::Class),
            ElementValue::Annotation(annotation) => self
                .rewrite_annotation(annotation)?
                .map(ElementValue::Annotation),
            ElementValue::Array(values) => {
                rewrite_each(values, |value| self.rewrite_element_value(value))?
                    .map(ElementValue::Array)
            }
        };
        Ok(value)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::class_file::{ConstantPool, ExceptionHandler};
    use crate::rules::RuleTable;

    fn rules() -> RuleTable {
        RuleTable::builder()
            .rename("javax.servlet", "jakarta.servlet")
            .rename("javax.annotation", "jakarta.annotation")
            .build()
            .unwrap()
    }

    #[test]
    fn unchanged_lists_are_not_copied() {
        let items = vec![1, 2, 3];
        let unchanged = rewrite_each(&items, |_| Ok(None)).unwrap();
        assert_eq!(unchanged, None);

        let changed = rewrite_each(&items, |i| Ok((*i == 2).then(|| 20))).unwrap();
        assert_eq!(changed, Some(vec![1, 20, 3]));
    }

    #[test]
    fn annotations() {
        let rules = rules();
        let mut constants = ConstantPool::new();
        let resource = constants.utf8_constant("Ljavax/annotation/Resource;");
        let name = constants.utf8_constant("type");
        let class = constants.utf8_constant("Ljavax/servlet/Servlet;");
        let void = constants.utf8_constant("V");
        let text = constants.utf8_constant("javax.servlet.Servlet");
        let attribute = Attribute::new(
            &mut constants,
            "RuntimeVisibleAnnotations",
            AttributeBody::RuntimeVisibleAnnotations(vec![Annotation {
                type_index: resource,
                elements: vec![ElementValuePair {
                    name_index: name,
                    value: ElementValue::Array(vec![
                        ElementValue::Class(void),
                        ElementValue::Class(class),
                        ElementValue::Const {
                            tag: b's',
                            value: text.0,
                        },
                    ]),
                }],
            }]),
        );

        let mut rewriter = Rewriter::new(&rules, &mut constants);
        let rewritten = rewriter
            .rewrite_attribute(&attribute, SignatureKind::Class)
            .unwrap()
            .unwrap();
        assert_eq!(rewritten, attribute);
        assert_eq!(
            rewriter.rewrite_attribute(&attribute, SignatureKind::Class).unwrap(),
            None
        );

        assert_eq!(constants.utf8(resource).unwrap(), "Ljakarta/annotation/Resource;");
        assert_eq!(constants.utf8(class).unwrap(), "Ljakarta/servlet/Servlet;");
        assert_eq!(constants.utf8(void).unwrap(), "V");
        assert_eq!(constants.utf8(text).unwrap(), "javax.servlet.Servlet");
    }

    #[test]
    fn code_and_stack_maps() {
        let rules = rules();
        let mut constants = ConstantPool::new();
        let exception = constants.class_constant("javax/servlet/ServletException");
        let request = constants.class_constant("javax/servlet/ServletRequest");
        let string = constants.class_constant("java/lang/String");
        let frames = Attribute::new(
            &mut constants,
            "StackMapTable",
            AttributeBody::StackMapTable(StackMapTable(vec![
                StackMapFrame::Same { offset_delta: 3 },
                StackMapFrame::Full {
                    offset_delta: 7,
                    locals: vec![
                        VerificationType::Object(string),
                        VerificationType::Object(request),
                    ],
                    stack: vec![VerificationType::Integer],
                },
            ])),
        );
        let code = Code {
            max_stack: 2,
            max_locals: 2,
            code_array: vec![0xB1],
            exception_table: vec![ExceptionHandler {
                start_pc: 0,
                end_pc: 1,
                handler_pc: 0,
                catch_type: Some(exception),
            }],
            attributes: vec![frames],
        };
        let attribute = Attribute::new(&mut constants, "Code", AttributeBody::Code(code));

        let mut rewriter = Rewriter::new(&rules, &mut constants);
        let rewritten = rewriter
            .rewrite_attribute(&attribute, SignatureKind::Method)
            .unwrap();
        assert_eq!(rewritten, Some(attribute));
        assert!(rewriter.is_settled(exception));
        assert!(rewriter.is_settled(request));

        assert_eq!(
            constants.class_name(exception).unwrap(),
            "jakarta/servlet/ServletException"
        );
        assert_eq!(
            constants.class_name(request).unwrap(),
            "jakarta/servlet/ServletRequest"
        );
        assert_eq!(constants.class_name(string).unwrap(), "java/lang/String");
    }

    #[test]
    fn signatures_and_local_variables() {
        let rules = rules();
        let mut constants = ConstantPool::new();
        let signature = constants.utf8_constant("Ljava/util/List<Ljavax/servlet/Filter;>;");
        let name = constants.utf8_constant("filters");
        let variable = LocalVariable {
            start_pc: 0,
            length: 4,
            name_index: name,
            descriptor_index: signature,
            index: 1,
        };
        let attribute = Attribute::new(
            &mut constants,
            "LocalVariableTypeTable",
            AttributeBody::LocalVariableTypeTable(vec![variable]),
        );
        let field_signature = Attribute::new(
            &mut constants,
            "Signature",
            AttributeBody::Signature(signature),
        );

        let mut rewriter = Rewriter::new(&rules, &mut constants);
        let rewritten = rewriter
            .rewrite_attribute(&attribute, SignatureKind::Method)
            .unwrap()
            .unwrap();
        assert_eq!(
            rewritten.body,
            AttributeBody::LocalVariableTypeTable(vec![variable])
        );

        // Shares the entry which was just renamed
        assert_eq!(
            rewriter
                .rewrite_attribute(&field_signature, SignatureKind::Field)
                .unwrap(),
            None
        );
        assert_eq!(
            constants.utf8(signature).unwrap(),
            "Ljava/util/List<Ljakarta/servlet/Filter;>;"
        );
    }

    #[test]
    fn raw_and_nest_attributes_are_left_alone() {
        let rules = rules();
        let mut constants = ConstantPool::new();
        let host = constants.class_constant("javax/servlet/Outer");
        let nest_host = Attribute::new(&mut constants, "NestHost", AttributeBody::NestHost(host));
        let module = Attribute::new(&mut constants, "ModulePackages", AttributeBody::Other(vec![0, 0]));
        let constant = Attribute::new(
            &mut constants,
            "ConstantValue",
            AttributeBody::ConstantValue(host.0),
        );

        let mut rewriter = Rewriter::new(&rules, &mut constants);
        assert_eq!(rewriter.rewrite_attribute(&nest_host, SignatureKind::Class).unwrap(), None);
        assert_eq!(rewriter.rewrite_attribute(&module, SignatureKind::Class).unwrap(), None);
        assert_eq!(rewriter.rewrite_attribute(&constant, SignatureKind::Field).unwrap(), None);
        assert!(!rewriter.is_settled(host));

        assert_eq!(constants.class_name(host).unwrap(), "javax/servlet/Outer");
    }
}
