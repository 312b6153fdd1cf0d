use super::*;
use polyinfer_solver::TypeFormatter;

fn setup() -> (TypeInterner, TypeNames, DefId) {
    let db = TypeInterner::new();
    let mut names = TypeNames::new();
    let e = db.fresh_type_param("E");
    let list = db.declare_interface("List", &[e]);
    names.declare("List", list).expect("first declaration");
    (db, names, list)
}

#[test]
fn test_builtin_and_keyword_types() {
    let (db, names, _) = setup();
    let parse = |text: &str| parse_type(&db, &names, &[], text).expect(text);

    assert_eq!(parse("String"), TypeId::STRING);
    assert_eq!(parse("  Integer "), TypeId::INTEGER);
    assert_eq!(parse("int"), TypeId::INT);
    assert_eq!(parse("void"), TypeId::VOID);
    assert_eq!(parse("null"), TypeId::NULL);
    assert_eq!(parse("double[][]"), db.array(db.array(TypeId::DOUBLE)));
}

#[test]
fn test_parameterized_and_wildcard_types() {
    let (db, names, list) = setup();
    let parse = |text: &str| parse_type(&db, &names, &[], text).expect(text);

    assert_eq!(parse("List<String>"), db.apply1(list, TypeId::STRING));
    assert_eq!(parse("List"), db.raw(list));
    assert_eq!(parse("List<?>"), db.apply1(list, db.wildcard()));
    assert_eq!(
        parse("List<? extends Number>"),
        db.apply1(list, db.wildcard_extends(TypeId::NUMBER))
    );
    assert_eq!(
        parse("List<? super List<int[]>>[]"),
        db.array(db.apply1(
            list,
            db.wildcard_super(db.apply1(list, db.array(TypeId::INT)))
        ))
    );
    let formatter = TypeFormatter::new(&db);
    assert_eq!(
        formatter.format(parse("List<List<? extends Number>>")),
        "List<List<? extends Number>>"
    );
}

#[test]
fn test_type_parameters_in_scope() {
    let (db, names, list) = setup();
    let outer = db.fresh_type_param("T");
    let inner = db.fresh_type_param("T");
    let scope = vec![("T".to_string(), outer), ("T".to_string(), inner)];

    // The innermost declaration wins.
    assert_eq!(
        parse_type(&db, &names, &scope, "List<T>").expect("List<T>"),
        db.apply1(list, db.type_param(inner))
    );
    assert!(parse_type(&db, &names, &[], "T").is_err());
}

#[test]
fn test_intersection() {
    let (db, names, list) = setup();
    let ty = parse_type(&db, &names, &[], "Number & List<String>").expect("intersection");
    assert_eq!(
        ty,
        db.intersection([TypeId::NUMBER, db.apply1(list, TypeId::STRING)])
    );
}

#[test]
fn test_malformed_types() {
    let (db, mut names, list) = setup();
    for text in [
        "",
        "Unknown",
        "List<String",
        "List<String, String>",
        "String]",
        "? extending Number",
        "int[",
    ] {
        assert!(parse_type(&db, &names, &[], text).is_err(), "{text:?}");
    }
    assert!(names.declare("List", list).is_err());
}
