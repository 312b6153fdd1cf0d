use super::*;
use crate::diagnostics::DiagnosticArg;
use crate::expr::{LambdaBody, LambdaParams};
use crate::fixtures::Library;

#[test]
fn test_seed_call_creates_variables_and_bounds() {
    let lib = Library::new();
    let oracle = lib.oracle();
    let db = &lib.db;
    let params = lib.type_params(&["T", "X"]);
    db.set_type_param_bound(params[0], TypeId::NUMBER);
    db.set_type_param_bound(params[1], TypeId::THROWABLE);
    // <T extends Number, X extends Throwable> T check(T t) throws X
    let method = lib
        .method("check", &params, vec![lib.tp(params[0])], lib.tp(params[0]))
        .with_thrown(vec![lib.tp(params[1])]);

    let mut exprs = ExprArena::new();
    let arg = exprs.standalone(TypeId::INTEGER);
    let call = exprs.call(method, vec![arg]);
    let ctx = lib.context(&oracle, &exprs);
    let mut session = InferenceSession::root(&ctx);
    let Some(ExprData::Call(data)) = exprs.get(call) else {
        panic!("call");
    };

    let returned = session.seed_call(call, data).expect("arity fits");
    let vars: Vec<(InferenceVar, VarData)> =
        session.vars.iter().map(|(&v, d)| (v, d.clone())).collect();
    assert_eq!(vars.len(), 2);
    let (t, t_data) = &vars[0];
    let (x, x_data) = &vars[1];
    assert_eq!(t_data.origin, Some(params[0]));
    assert!(!t_data.throws);
    assert!(x_data.throws);
    assert_eq!(returned, db.var(*t));

    let pending: Vec<ConstraintFormula> = session.pending.iter().cloned().collect();
    assert_eq!(
        pending,
        vec![
            ConstraintFormula::StrictSubtyping {
                sub: db.var(*t),
                sup: TypeId::NUMBER
            },
            ConstraintFormula::StrictSubtyping {
                sub: db.var(*x),
                sup: TypeId::THROWABLE
            },
            ConstraintFormula::ExpressionCompatibility {
                expr: arg,
                target: db.var(*t)
            },
        ]
    );
    assert_eq!(session.call_vars[&call].get(params[0]), Some(db.var(*t)));
}

#[test]
fn test_seed_call_checks_argument_count() {
    let lib = Library::new();
    let oracle = lib.oracle();
    let mut exprs = ExprArena::new();
    let call = exprs.call(lib.identity(), vec![]);
    let ctx = lib.context(&oracle, &exprs);
    let mut session = InferenceSession::root(&ctx);
    let Some(ExprData::Call(data)) = exprs.get(call) else {
        panic!("call");
    };

    assert_eq!(session.seed_call(call, data), None);
    let record = &session.errors[0];
    assert_eq!(record.message, MessageTemplate::ArgumentCountMismatch);
    let expected: Vec<DiagnosticArg> = vec![1usize.into(), 0usize.into()];
    assert_eq!(record.args, expected);
}

#[test]
fn test_seed_call_spreads_variable_arity() {
    let lib = Library::new();
    let oracle = lib.oracle();
    let db = &lib.db;
    let t = lib.type_params(&["T"]);
    let elem = lib.tp(t[0]);
    // <T> List<T> listOf(T... items)
    let list_of = lib
        .method("listOf", &t, vec![db.array(elem)], lib.list_of(elem))
        .with_varargs();

    let mut exprs = ExprArena::new();
    let a = exprs.standalone(TypeId::STRING);
    let b = exprs.standalone(TypeId::STRING);
    let spread = exprs.call(list_of.clone(), vec![a, b]);
    let array = exprs.standalone(db.array(TypeId::STRING));
    let direct = exprs.call(list_of.clone(), vec![array]);
    let empty = exprs.call(list_of, vec![]);
    let ctx = lib.context(&oracle, &exprs);

    let targets = |call: ExprId| -> Vec<TypeId> {
        let mut session = InferenceSession::root(&ctx);
        let Some(ExprData::Call(data)) = exprs.get(call) else {
            panic!("call");
        };
        session.seed_call(call, data).expect("arity fits");
        let var = *session.vars.keys().next().expect("one variable");
        session
            .pending
            .iter()
            .map(|formula| match *formula {
                ConstraintFormula::ExpressionCompatibility { target, .. } => {
                    substitute_vars(db, target, &[(var, TypeId::OBJECT)].into_iter().collect())
                }
                _ => panic!("only argument formulas are queued"),
            })
            .collect()
    };

    assert_eq!(targets(spread), vec![TypeId::OBJECT, TypeId::OBJECT]);
    assert_eq!(targets(direct), vec![db.array(TypeId::OBJECT)]);
    assert!(targets(empty).is_empty());
}

#[test]
fn test_nested_call_is_folded_into_parent() {
    let lib = Library::new();
    let oracle = lib.oracle();
    let mut exprs = ExprArena::new();
    let arg = exprs.standalone(TypeId::STRING);
    let inner = exprs.call(lib.identity(), vec![arg]);
    let outer = exprs.call(lib.identity(), vec![inner]);
    let ctx = lib.context(&oracle, &exprs);

    let outcome = ctx.infer_call(outer, None).expect("inference succeeds");
    assert_eq!(outcome.variables.len(), 2);
    assert_eq!(outcome.call_substitutions.len(), 2);
    assert!(outcome.variables.values().all(|&ty| ty == TypeId::STRING));
    assert_eq!(outcome.return_type, Some(TypeId::STRING));
}

#[test]
fn test_explicit_type_arguments_need_no_variables() {
    let lib = Library::new();
    let oracle = lib.oracle();
    let mut exprs = ExprArena::new();
    let arg = exprs.standalone(TypeId::STRING);
    let call = exprs.call_explicit(lib.identity(), vec![TypeId::OBJECT], vec![arg]);
    let ctx = lib.context(&oracle, &exprs);

    let outcome = ctx.infer_call(call, Some(TypeId::OBJECT)).expect("fits");
    assert!(outcome.variables.is_empty());
    assert_eq!(outcome.return_type, Some(TypeId::OBJECT));
    assert_eq!(outcome.substitution.iter().next().map(|(_, ty)| ty), Some(TypeId::OBJECT));
}

#[test]
fn test_nesting_limit() {
    let lib = Library::new();
    let oracle = lib.oracle();
    let mut exprs = ExprArena::new();
    let arg = exprs.standalone(TypeId::STRING);
    let inner = exprs.call(lib.identity(), vec![arg]);
    let outer = exprs.call(lib.identity(), vec![inner]);
    let ctx = lib.context(&oracle, &exprs).with_limits(InferenceLimits {
        max_nested_depth: 1,
        ..InferenceLimits::default()
    });

    let Err(InferenceError::Incompatible(records)) = ctx.infer_call(outer, None) else {
        panic!("nesting past the limit fails");
    };
    assert_eq!(records[0].message, MessageTemplate::NestingTooDeep);
    assert_eq!(records[0].call, Some(outer));
}

#[test]
fn test_iteration_limit() {
    let lib = Library::new();
    let oracle = lib.oracle();
    let mut exprs = ExprArena::new();
    let arg = exprs.standalone(TypeId::STRING);
    let call = exprs.call(lib.identity(), vec![arg]);
    let ctx = lib.context(&oracle, &exprs).with_limits(InferenceLimits {
        max_iterations: 1,
        ..InferenceLimits::default()
    });

    let Err(InferenceError::Incompatible(records)) = ctx.infer_call(call, None) else {
        panic!("a single step is not enough");
    };
    assert_eq!(records[0].message, MessageTemplate::DidNotConverge);
}

#[test]
fn test_cancelled_before_start() {
    let lib = Library::new();
    let oracle = lib.oracle();
    let mut exprs = ExprArena::new();
    let arg = exprs.standalone(TypeId::STRING);
    let call = exprs.call(lib.identity(), vec![arg]);
    let token = CancellationToken::new();
    token.cancel();
    let ctx = lib.context(&oracle, &exprs).with_cancellation(token);

    let err = ctx.infer_call(call, None).expect_err("cancelled");
    assert_eq!(err, InferenceError::Cancelled);
    assert_eq!(err.to_string(), "inference cancelled");
}

#[test]
fn test_not_a_call() {
    let lib = Library::new();
    let oracle = lib.oracle();
    let mut exprs = ExprArena::new();
    let value = exprs.standalone(TypeId::STRING);
    let ctx = lib.context(&oracle, &exprs);

    let Err(InferenceError::Incompatible(records)) = ctx.infer_call(value, None) else {
        panic!("a standalone expression is not a call");
    };
    assert_eq!(records[0].message, MessageTemplate::CouldNotInfer);
}

#[test]
fn test_infer_expression_reports_lambda_parameters() {
    let lib = Library::new();
    let oracle = lib.oracle();
    let mut exprs = ExprArena::new();
    let lambda = exprs.lambda(LambdaParams::Implicit(1), |arena, _| {
        LambdaBody::expression(arena.standalone(TypeId::INT), false)
    });
    let ctx = lib.context(&oracle, &exprs);

    let outcome = ctx
        .infer_expression(lambda, lib.function_of(TypeId::STRING, TypeId::INTEGER))
        .expect("lambda fits");
    assert_eq!(outcome.lambda_parameters[&lambda], vec![TypeId::STRING]);
    assert_eq!(outcome.return_type, None);
    assert!(outcome.call_substitutions.is_empty());
}

#[test]
fn test_error_display() {
    let lib = Library::new();
    let oracle = lib.oracle();
    let mut exprs = ExprArena::new();
    let arg = exprs.standalone(TypeId::STRING);
    let call = exprs.call(lib.identity(), vec![arg]);
    let ctx = lib.context(&oracle, &exprs);

    let err = ctx
        .infer_call(call, Some(TypeId::INTEGER))
        .expect_err("String is not an Integer");
    let text = err.to_string();
    assert!(text.starts_with("inference failed: "), "{text}");
}
