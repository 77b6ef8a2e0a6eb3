use super::rewriter::Rewriter;
use crate::jvm::class_file::{
    ClassConstantIndex, Constant, ConstantIndex, NameAndTypeConstantIndex, Utf8ConstantIndex,
};
use crate::jvm::Error;

/// Rename everything left in the constant pool after the class structure has been rewritten
///
/// Entries are visited in index order. Only `Class`, `NameAndType`, `MethodType`, `String` and
/// `Utf8` entries can change; the unusable slot after a `Long` or `Double` is never visited.
/// Entries settled by earlier rewriting are skipped, so the count returned is the number of
/// entries this pass changed.
pub fn rewrite_pool(rewriter: &mut Rewriter<'_>) -> Result<usize, Error> {
    let indices: Vec<ConstantIndex> = rewriter
        .constants()
        .iter()
        .map(|(index, _)| index)
        .collect();

    let mut changed = 0;
    for index in indices {
        let modified = match rewriter.constants().get(index)? {
            Constant::Class(_) => rewriter.rename_class(ClassConstantIndex(index))?,
            Constant::NameAndType { .. } => {
                rewriter.rename_name_and_type(NameAndTypeConstantIndex(index))?
            }
            Constant::MethodType { .. } => rewriter.rename_method_type(index)?,
            Constant::String(_) => rewriter.rename_string_constant(index)?,
            Constant::Utf8(_) => rewriter.rename_utf8_entry(Utf8ConstantIndex(index))?,
            _ => false,
        };
        if modified {
            changed += 1;
        }
    }

    log::debug!("Renamed {} constant pool entries", changed);
    Ok(changed)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::class_file::ConstantPool;
    use crate::rules::RuleTable;

    #[test]
    fn every_kind_of_entry() {
        let rules = RuleTable::builder()
            .rename("javax.servlet", "jakarta.servlet")
            .direct("Servlet 4.0", "Servlet 5.0")
            .build()
            .unwrap();
        let mut constants = ConstantPool::new();
        let class = constants.class_constant("javax/servlet/Servlet");
        let array = constants.class_constant("[[Ljavax/servlet/Filter;");
        let name_and_type = constants.name_and_type_constant("init", "(Ljavax/servlet/ServletConfig;)V");
        let descriptor = constants.utf8_constant("(Ljavax/servlet/ServletRequest;)Z");
        let method_type = constants.push(Constant::MethodType { descriptor });
        let dotted = constants.utf8_constant("javax.servlet.GenericServlet");
        let literal = constants.push(Constant::String(dotted));
        let version = constants.utf8_constant("Servlet 4.0");
        let number = constants.push(Constant::Long(42));
        let untouched = constants.utf8_constant("Hello");

        let count = constants.count();
        let changed = rewrite_pool(&mut Rewriter::new(&rules, &mut constants)).unwrap();
        assert_eq!(changed, 6);
        assert_eq!(constants.count(), count);

        assert_eq!(constants.class_name(class).unwrap(), "jakarta/servlet/Servlet");
        assert_eq!(constants.class_name(array).unwrap(), "[[Ljakarta/servlet/Filter;");
        let (_, descriptor) = constants.name_and_type(name_and_type).unwrap();
        assert_eq!(
            constants.utf8(descriptor).unwrap(),
            "(Ljakarta/servlet/ServletConfig;)V"
        );
        match constants.get(method_type).unwrap() {
            Constant::MethodType { descriptor } => assert_eq!(
                constants.utf8(*descriptor).unwrap(),
                "(Ljakarta/servlet/ServletRequest;)Z"
            ),
            other => panic!("unexpected constant {:?}", other),
        }
        assert_eq!(
            constants.get(literal).unwrap(),
            &Constant::String(dotted)
        );
        assert_eq!(
            constants.utf8(dotted).unwrap(),
            "jakarta.servlet.GenericServlet"
        );
        assert_eq!(constants.utf8(version).unwrap(), "Servlet 5.0");
        assert_eq!(constants.get(number).unwrap(), &Constant::Long(42));
        assert_eq!(constants.utf8(untouched).unwrap(), "Hello");
    }

    #[test]
    fn slot_after_wide_constants_is_skipped() {
        let rules = RuleTable::builder()
            .rename("javax.servlet", "jakarta.servlet")
            .build()
            .unwrap();
        let mut constants = ConstantPool::new();
        constants.push(Constant::Double(1.5));
        let class = constants.class_constant("javax/servlet/Filter");
        assert_eq!(class.0, ConstantIndex(4));

        let changed = rewrite_pool(&mut Rewriter::new(&rules, &mut constants)).unwrap();
        assert_eq!(changed, 1);
        assert_eq!(constants.class_name(class).unwrap(), "jakarta/servlet/Filter");
        assert!(matches!(
            constants.get(ConstantIndex(2)),
            Err(Error::MissingConstant(ConstantIndex(2)))
        ));
    }
}
