use super::*;
use crate::TypeInterner;

#[test]
fn test_substitution_basic() {
    let interner = TypeInterner::new();
    let t = interner.fresh_type_param("T");
    let u = interner.fresh_type_param("U");

    let mut subst = TypeSubstitution::new();
    assert!(subst.is_empty());

    subst.insert(t, TypeId::STRING);
    assert_eq!(subst.get(t), Some(TypeId::STRING));
    assert_eq!(subst.get(u), None);
    assert_eq!(subst.len(), 1);
}

#[test]
fn test_substitution_from_args_keeps_declaration_order() {
    let interner = TypeInterner::new();
    let params = [
        interner.fresh_type_param("K"),
        interner.fresh_type_param("V"),
        interner.fresh_type_param("W"),
    ];
    let subst = TypeSubstitution::from_args(&params, &[TypeId::STRING, TypeId::INTEGER]);

    let pairs: Vec<_> = subst.iter().collect();
    assert_eq!(
        pairs,
        vec![(params[0], TypeId::STRING), (params[1], TypeId::INTEGER)]
    );
    assert_eq!(subst.get(params[2]), None);
}

#[test]
fn test_instantiate_nested_type() {
    let interner = TypeInterner::new();
    let e = interner.fresh_type_param("E");
    let list = interner.declare_interface("List", &[e]);
    let t = interner.fresh_type_param("T");

    // List<? extends T>[]
    let ty = interner.array(interner.apply1(list, interner.wildcard_extends(interner.type_param(t))));
    let mut subst = TypeSubstitution::new();
    subst.insert(t, TypeId::NUMBER);

    let expected = interner.array(interner.apply1(list, interner.wildcard_extends(TypeId::NUMBER)));
    assert_eq!(instantiate_type(&interner, ty, &subst), expected);
}

#[test]
fn test_instantiate_untouched_type_keeps_id() {
    let interner = TypeInterner::new();
    let t = interner.fresh_type_param("T");
    let u = interner.fresh_type_param("U");
    let mut subst = TypeSubstitution::new();
    subst.insert(t, TypeId::STRING);

    let ty = interner.array(interner.type_param(u));
    assert_eq!(instantiate_type(&interner, ty, &subst), ty);
    assert_eq!(instantiate_type(&interner, TypeId::INT, &subst), TypeId::INT);
}

#[test]
fn test_substitute_vars_in_intersection() {
    let interner = TypeInterner::new();
    let alpha = InferenceVar(0);
    let ty = interner.intersection([interner.var(alpha), TypeId::STRING]);

    let mut subst = VarSubstitution::default();
    subst.insert(alpha, TypeId::NUMBER);
    let result = substitute_vars(&interner, ty, &subst);

    let Some(TypeData::Intersection(members)) = interner.lookup(result) else {
        panic!("substituted intersection stays an intersection");
    };
    assert_eq!(members.as_slice(), &[TypeId::NUMBER, TypeId::STRING]);
}

#[test]
fn test_var_queries() {
    let interner = TypeInterner::new();
    let e = interner.fresh_type_param("E");
    let list = interner.declare_interface("List", &[e]);
    let alpha = InferenceVar(3);
    let beta = InferenceVar(4);
    let ty = interner.apply1(
        list,
        interner.wildcard_super(interner.array(interner.var(alpha))),
    );

    assert!(contains_vars(&interner, ty));
    assert!(mentions_var(&interner, ty, alpha));
    assert!(!mentions_var(&interner, ty, beta));
    assert!(!contains_vars(&interner, interner.raw(list)));

    let mut out = IndexSet::default();
    collect_vars(
        &interner,
        interner.intersection([interner.var(beta), ty]),
        &mut out,
    );
    assert_eq!(out.into_iter().collect::<Vec<_>>(), vec![beta, alpha]);
}

#[test]
fn test_type_param_queries() {
    let interner = TypeInterner::new();
    let t = interner.fresh_type_param("T");
    let u = interner.fresh_type_param("U");
    let ty = interner.array(interner.type_param(t));

    assert!(contains_type_params(&interner, ty));
    assert!(mentions_type_params(&interner, ty, &[t]));
    assert!(!mentions_type_params(&interner, ty, &[u]));
    assert!(!contains_type_params(&interner, TypeId::OBJECT));
}

#[test]
fn test_captured_types_are_leaves() {
    let interner = TypeInterner::new();
    let t = interner.fresh_type_param("T");
    let captured = interner.captured(crate::types::CapturedWildcard {
        id: interner.next_capture_id(),
        wildcard: interner.wildcard_extends(interner.type_param(t)),
        param: t,
    });
    let mut subst = TypeSubstitution::new();
    subst.insert(t, TypeId::STRING);

    assert_eq!(instantiate_type(&interner, captured, &subst), captured);
    assert!(!contains_type_params(&interner, captured));
}
