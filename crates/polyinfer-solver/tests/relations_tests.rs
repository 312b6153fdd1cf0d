use super::*;
use crate::fixtures::Library;

#[test]
fn test_primitive_widening() {
    let lib = Library::new();
    let oracle = lib.oracle();
    assert!(oracle.is_subtype(TypeId::BYTE, TypeId::INT));
    assert!(oracle.is_subtype(TypeId::CHAR, TypeId::DOUBLE));
    assert!(!oracle.is_subtype(TypeId::CHAR, TypeId::SHORT));
    assert!(!oracle.is_subtype(TypeId::BOOLEAN, TypeId::INT));
    assert!(!oracle.is_subtype(TypeId::INT, TypeId::INTEGER));
}

#[test]
fn test_nominal_subtyping_through_parameterized_supertypes() {
    let lib = Library::new();
    let oracle = lib.oracle();
    let db = &lib.db;
    let array_list = db.apply1(lib.array_list, TypeId::STRING);

    assert!(oracle.is_subtype(array_list, lib.list_of(TypeId::STRING)));
    assert!(!oracle.is_subtype(array_list, lib.list_of(TypeId::OBJECT)));
    assert!(oracle.is_subtype(array_list, TypeId::OBJECT));
    assert!(oracle.is_subtype(TypeId::INTEGER, TypeId::NUMBER));
    assert!(oracle.is_subtype(TypeId::NULL, array_list));
    assert!(!oracle.is_subtype(TypeId::NULL, TypeId::INT));
}

#[test]
fn test_wildcard_containment() {
    let lib = Library::new();
    let oracle = lib.oracle();
    let db = &lib.db;
    let ints = lib.list_of(TypeId::INTEGER);

    assert!(oracle.is_subtype(ints, lib.list_of(db.wildcard_extends(TypeId::NUMBER))));
    assert!(oracle.is_subtype(ints, lib.list_of(db.wildcard())));
    assert!(!oracle.is_subtype(ints, lib.list_of(db.wildcard_super(TypeId::NUMBER))));
    assert!(oracle.is_subtype(
        lib.list_of(TypeId::NUMBER),
        lib.list_of(db.wildcard_super(TypeId::INTEGER))
    ));
    assert!(oracle.is_subtype(
        lib.list_of(db.wildcard_extends(TypeId::INTEGER)),
        lib.list_of(db.wildcard_extends(TypeId::NUMBER))
    ));
}

#[test]
fn test_array_subtyping() {
    let lib = Library::new();
    let oracle = lib.oracle();
    let db = &lib.db;
    assert!(oracle.is_subtype(db.array(TypeId::INTEGER), db.array(TypeId::NUMBER)));
    assert!(!oracle.is_subtype(db.array(TypeId::INT), db.array(TypeId::LONG)));
    assert!(oracle.is_subtype(db.array(TypeId::INT), TypeId::OBJECT));
}

#[test]
fn test_assignability_boxing_and_raw() {
    let lib = Library::new();
    let oracle = lib.oracle();
    let db = &lib.db;

    assert!(oracle.is_assignable(TypeId::INTEGER, TypeId::INT));
    assert!(oracle.is_assignable(TypeId::NUMBER, TypeId::INT));
    assert!(oracle.is_assignable(TypeId::LONG, TypeId::INTEGER));
    assert!(!oracle.is_assignable(TypeId::SHORT, TypeId::INTEGER));
    assert!(oracle.is_assignable(lib.list_of(TypeId::STRING), db.raw(lib.list)));
    assert!(oracle.is_assignable(lib.list_of(TypeId::STRING), db.raw(lib.array_list)));
    assert!(!oracle.is_assignable(lib.list_of(TypeId::STRING), TypeId::STRING));
}

#[test]
fn test_as_super_on_raw_type_is_raw() {
    let lib = Library::new();
    let oracle = lib.oracle();
    let db = &lib.db;
    assert_eq!(
        oracle.as_super(db.raw(lib.array_list), lib.list),
        Some(db.raw(lib.list))
    );
    assert_eq!(
        oracle.as_super(TypeId::STRING, lib.comparable),
        Some(db.apply1(lib.comparable, TypeId::STRING))
    );
    assert_eq!(oracle.as_super(TypeId::STRING, lib.list), None);
}

#[test]
fn test_lub_of_boxes_is_number() {
    let lib = Library::new();
    let oracle = lib.oracle();
    assert_eq!(oracle.lub(&[TypeId::INTEGER, TypeId::DOUBLE_BOX]), TypeId::NUMBER);
    assert_eq!(oracle.lub(&[TypeId::INT, TypeId::INTEGER]), TypeId::INTEGER);
    assert_eq!(oracle.lub(&[TypeId::STRING, TypeId::NULL]), TypeId::STRING);
    assert_eq!(oracle.lub(&[TypeId::STRING, TypeId::INTEGER]), TypeId::OBJECT);
}

#[test]
fn test_lub_generalizes_type_arguments() {
    let lib = Library::new();
    let oracle = lib.oracle();
    let db = &lib.db;
    let lub = oracle.lub(&[
        db.apply1(lib.array_list, TypeId::INTEGER),
        lib.list_of(TypeId::DOUBLE_BOX),
    ]);
    assert_eq!(lub, lib.list_of(db.wildcard_extends(TypeId::NUMBER)));
}

#[test]
fn test_glb_drops_supertypes() {
    let lib = Library::new();
    let oracle = lib.oracle();
    let comparable = lib.db.apply1(lib.comparable, TypeId::STRING);
    assert_eq!(oracle.glb(&[TypeId::OBJECT, TypeId::STRING]), TypeId::STRING);
    assert_eq!(oracle.glb(&[comparable, TypeId::STRING]), TypeId::STRING);
    let Some(TypeData::Intersection(members)) =
        lib.db.lookup(oracle.glb(&[comparable, TypeId::NUMBER]))
    else {
        panic!("unrelated bounds intersect");
    };
    assert_eq!(members.as_slice(), &[TypeId::NUMBER, comparable]);
}

#[test]
fn test_functional_method_substitutes_arguments() {
    let lib = Library::new();
    let oracle = lib.oracle();
    let method = oracle
        .functional_method(lib.function_of(TypeId::STRING, TypeId::INTEGER))
        .expect("Function is a functional interface");
    assert_eq!(method.params, vec![TypeId::STRING]);
    assert_eq!(method.return_type, TypeId::INTEGER);

    // `equals` comes from Object and does not count.
    let compare = oracle
        .functional_method(lib.comparator_of(TypeId::STRING))
        .expect("Comparator is a functional interface");
    assert_eq!(compare.params, vec![TypeId::STRING, TypeId::STRING]);

    assert!(oracle.functional_method(lib.list_of(TypeId::STRING)).is_none());
    assert!(oracle.functional_method(TypeId::STRING).is_none());
}

#[test]
fn test_checked_exceptions() {
    let lib = Library::new();
    let oracle = lib.oracle();
    assert!(oracle.is_checked_exception(lib.io_exception));
    assert!(oracle.is_checked_exception(TypeId::EXCEPTION));
    assert!(!oracle.is_checked_exception(TypeId::RUNTIME_EXCEPTION));
    assert!(!oracle.is_checked_exception(TypeId::ERROR));
    assert!(!oracle.is_checked_exception(TypeId::STRING));
}

#[test]
fn test_erasure() {
    let lib = Library::new();
    let oracle = lib.oracle();
    let db = &lib.db;
    let t = db.fresh_type_param("T");
    db.set_type_param_bound(t, TypeId::NUMBER);

    assert_eq!(oracle.erasure(lib.list_of(TypeId::STRING)), db.raw(lib.list));
    assert_eq!(oracle.erasure(db.type_param(t)), TypeId::NUMBER);
    assert_eq!(
        oracle.erasure(db.array(lib.list_of(TypeId::STRING))),
        db.array(db.raw(lib.list))
    );
}
