use super::*;
use crate::constraint::ConstraintFormula;
use crate::expr::{ExprArena, ExprId};
use crate::fixtures::Library;
use crate::session::SessionState;

fn fresh(session: &mut InferenceSession<'_, '_>, bounds: &[(BoundKind, TypeId)]) -> InferenceVar {
    let var = session.ctx.fresh_var();
    let mut data = VarData::default();
    for &(kind, ty) in bounds {
        data.bounds.insert(kind, ty);
    }
    session.vars.insert(var, data);
    var
}

#[test]
fn test_equality_wins_over_lower_bounds() {
    let lib = Library::new();
    let oracle = lib.oracle();
    let exprs = ExprArena::new();
    let ctx = lib.context(&oracle, &exprs);
    let mut session = InferenceSession::root(&ctx);
    let alpha = fresh(
        &mut session,
        &[
            (BoundKind::Lower, TypeId::INTEGER),
            (BoundKind::Eq, TypeId::NUMBER),
        ],
    );

    assert_eq!(session.resolve_next(), ResolutionStep::Progress);
    assert_eq!(session.resolved.get(&alpha), Some(&TypeId::NUMBER));
    assert_eq!(session.vars[&alpha].resolved, Some(TypeId::NUMBER));
}

#[test]
fn test_lub_of_lower_bounds_ignores_null() {
    let lib = Library::new();
    let oracle = lib.oracle();
    let exprs = ExprArena::new();
    let ctx = lib.context(&oracle, &exprs);
    let mut session = InferenceSession::root(&ctx);
    let alpha = fresh(
        &mut session,
        &[
            (BoundKind::Lower, TypeId::INTEGER),
            (BoundKind::Lower, TypeId::NULL),
            (BoundKind::Lower, TypeId::DOUBLE_BOX),
            (BoundKind::Upper, TypeId::OBJECT),
        ],
    );

    session.resolve_next();
    assert_eq!(session.resolved.get(&alpha), Some(&TypeId::NUMBER));
}

#[test]
fn test_upper_bounds_when_no_lower_bounds() {
    let lib = Library::new();
    let oracle = lib.oracle();
    let exprs = ExprArena::new();
    let ctx = lib.context(&oracle, &exprs);
    let mut session = InferenceSession::root(&ctx);
    let bounded = fresh(
        &mut session,
        &[
            (BoundKind::Upper, TypeId::OBJECT),
            (BoundKind::Upper, TypeId::NUMBER),
        ],
    );
    let free = fresh(&mut session, &[]);

    session.resolve_next();
    session.resolve_next();
    assert_eq!(session.resolved.get(&bounded), Some(&TypeId::NUMBER));
    assert_eq!(session.resolved.get(&free), Some(&TypeId::OBJECT));
}

#[test]
fn test_throws_variable_defaults_to_runtime_exception() {
    let lib = Library::new();
    let oracle = lib.oracle();
    let exprs = ExprArena::new();
    let ctx = lib.context(&oracle, &exprs);
    let mut session = InferenceSession::root(&ctx);
    let open = fresh(&mut session, &[(BoundKind::Upper, TypeId::EXCEPTION)]);
    let narrow = fresh(&mut session, &[(BoundKind::Upper, lib.io_exception)]);
    session.vars[&open].throws = true;
    session.vars[&narrow].throws = true;

    session.resolve_next();
    session.resolve_next();
    assert_eq!(session.resolved.get(&open), Some(&TypeId::RUNTIME_EXCEPTION));
    assert_eq!(session.resolved.get(&narrow), Some(&lib.io_exception));
}

#[test]
fn test_dependencies_resolve_first() {
    let lib = Library::new();
    let oracle = lib.oracle();
    let exprs = ExprArena::new();
    let ctx = lib.context(&oracle, &exprs);
    let mut session = InferenceSession::root(&ctx);
    // α :> List<β> is declared before β, but β has to go first.
    let beta_ty = lib.db.var(InferenceVar(1));
    let alpha = fresh(&mut session, &[(BoundKind::Lower, lib.list_of(beta_ty))]);
    let beta = fresh(&mut session, &[(BoundKind::Lower, TypeId::STRING)]);
    assert_eq!(lib.db.var(beta), beta_ty);

    assert_eq!(session.resolve_next(), ResolutionStep::Progress);
    assert!(session.resolved.contains_key(&beta));
    assert!(!session.resolved.contains_key(&alpha));

    session.resolve_next();
    assert_eq!(
        session.resolved.get(&alpha),
        Some(&lib.list_of(TypeId::STRING))
    );
}

#[test]
fn test_mutually_dependent_variables_resolve_together() {
    let lib = Library::new();
    let oracle = lib.oracle();
    let exprs = ExprArena::new();
    let ctx = lib.context(&oracle, &exprs);
    let mut session = InferenceSession::root(&ctx);
    let alpha = fresh(&mut session, &[(BoundKind::Upper, lib.db.var(InferenceVar(1)))]);
    let beta = fresh(
        &mut session,
        &[
            (BoundKind::Lower, lib.db.var(alpha)),
            (BoundKind::Upper, TypeId::NUMBER),
        ],
    );

    assert_eq!(session.resolve_next(), ResolutionStep::Progress);
    assert_eq!(session.resolved.get(&alpha), Some(&TypeId::OBJECT));
    assert_eq!(session.resolved.get(&beta), Some(&TypeId::NUMBER));
    // The choice is checked against the other bounds afterwards.
    assert!(session.pending.contains(&F::StrictSubtyping {
        sub: lib.db.var(alpha),
        sup: TypeId::NUMBER
    }));
}

#[test]
fn test_structured_cycle_fails() {
    let lib = Library::new();
    let oracle = lib.oracle();
    let exprs = ExprArena::new();
    let ctx = lib.context(&oracle, &exprs);
    let mut session = InferenceSession::root(&ctx);
    let alpha = fresh(
        &mut session,
        &[(BoundKind::Eq, lib.list_of(lib.db.var(InferenceVar(1))))],
    );
    fresh(&mut session, &[(BoundKind::Eq, lib.list_of(lib.db.var(alpha)))]);

    assert_eq!(session.resolve_next(), ResolutionStep::Failed);
    assert_eq!(session.errors[0].message, MessageTemplate::InferenceCycle);
    assert!(session.resolved.is_empty());
}

#[test]
fn test_delayed_input_variables_go_first() {
    let lib = Library::new();
    let oracle = lib.oracle();
    let exprs = ExprArena::new();
    let ctx = lib.context(&oracle, &exprs);
    let mut session = InferenceSession::root(&ctx);
    let alpha = fresh(&mut session, &[(BoundKind::Lower, TypeId::INTEGER)]);
    let beta = fresh(&mut session, &[(BoundKind::Lower, TypeId::STRING)]);
    session.delayed.push(F::LambdaCompatibility {
        lambda: ExprId(0),
        target: lib.db.var(beta),
    });

    session.resolve_next();
    assert_eq!(session.resolved.get(&beta), Some(&TypeId::STRING));
    assert!(!session.resolved.contains_key(&alpha));
}

#[test]
fn test_completion() {
    let lib = Library::new();
    let oracle = lib.oracle();
    let exprs = ExprArena::new();
    let ctx = lib.context(&oracle, &exprs);
    let mut session = InferenceSession::root(&ctx);
    assert_eq!(session.resolve_next(), ResolutionStep::Complete);

    session.delayed.push(F::LambdaCompatibility {
        lambda: ExprId(7),
        target: TypeId::STRING,
    });
    assert_eq!(session.resolve_next(), ResolutionStep::Failed);
    let record = &session.errors[0];
    assert_eq!(record.message, MessageTemplate::CouldNotInfer);
    assert_eq!(record.args, vec![DiagnosticArg::Expr(ExprId(7))]);
}

#[test]
fn test_run_to_fixpoint() {
    let lib = Library::new();
    let oracle = lib.oracle();
    let exprs = ExprArena::new();
    let ctx = lib.context(&oracle, &exprs);
    let mut session = InferenceSession::root(&ctx);
    let alpha = fresh(&mut session, &[]);
    let beta = fresh(&mut session, &[]);
    let (a, b) = (lib.db.var(alpha), lib.db.var(beta));

    session.push(ConstraintFormula::StrictSubtyping {
        sub: lib.db.apply1(lib.array_list, TypeId::STRING),
        sup: lib.list_of(a),
    });
    session.push(ConstraintFormula::StrictSubtyping {
        sub: lib.list_of(a),
        sup: b,
    });

    assert_eq!(session.run(), SessionState::Done);
    assert_eq!(session.resolved.get(&alpha), Some(&TypeId::STRING));
    assert_eq!(session.resolved.get(&beta), Some(&lib.list_of(TypeId::STRING)));
}
