//! Lambdas, method references and their checked exceptions.
//!
//! A functional interface target is first *grounded*: wildcard type
//! arguments are replaced so that the interface has a single function type.
//!
//! | argument | grounded to |
//! |----------|-------------|
//! | `?` | the declared bound of the parameter (`Object` if it is F-bounded) |
//! | `? extends U` | `U`, or `glb(U, B)` for a declared bound `B` |
//! | `? super L` | `L` |
//!
//! The functional method of the ground type then drives decomposition.
//! Implicitly typed lambdas and inexact method references cannot be looked
//! at until the parameter types of the function type are proper; until then
//! the formula stays delayed and its *input variables* block it.

use crate::bounds::{VarData, VarSet};
use crate::constraint::{ConstraintFormula, Reduction};
use crate::def::MethodSig;
use crate::diagnostics::IncompatibilityRecord;
use crate::expr::{ExprData, ExprId, LambdaParams, MethodRefKind};
use crate::instantiate::{TypeSubstitution, collect_vars, instantiate_type, mentions_type_params};
use crate::session::{InferenceSession, LambdaParamTypes};
use crate::types::{TypeData, TypeId, TypeList, WildcardKind};
use polyinfer_common::diagnostics::MessageTemplate;
use tracing::trace;

use ConstraintFormula as F;

impl InferenceSession<'_, '_> {
    /// Replace the wildcard arguments of a functional interface type.
    pub(crate) fn ground_target(&self, target: TypeId) -> TypeId {
        let db = self.db();
        let Some(TypeData::Class(class)) = db.lookup(target) else {
            return target;
        };
        let params = db.defs().get_type_params(class.def);
        if params.len() != class.args.len() {
            return target;
        }
        let mut changed = false;
        let args: TypeList = class
            .args
            .iter()
            .zip(&params)
            .map(|(&arg, &param)| {
                let Some(TypeData::Wildcard(kind)) = db.lookup(arg) else {
                    return arg;
                };
                changed = true;
                let declared = db.type_param_bound(param);
                let usable = declared != TypeId::OBJECT
                    && !mentions_type_params(db, declared, &params);
                match kind {
                    WildcardKind::Unbounded if usable => declared,
                    WildcardKind::Unbounded => TypeId::OBJECT,
                    WildcardKind::Extends(upper) if usable && self.is_proper(upper) => {
                        self.oracle().glb(&[upper, declared])
                    }
                    WildcardKind::Extends(upper) => upper,
                    WildcardKind::Super(lower) => lower,
                }
            })
            .collect();
        if changed {
            db.class(class.def, args)
        } else {
            target
        }
    }

    /// The function type of `target`, after grounding.
    fn function_type(&self, target: TypeId) -> Option<MethodSig> {
        self.oracle().functional_method(self.ground_target(target))
    }

    /// Unresolved variables that must be resolved before `formula` can be
    /// reduced. Empty for every formula that is never delayed.
    pub(crate) fn input_variables(&self, formula: &ConstraintFormula) -> VarSet {
        let mut out = VarSet::default();
        let (expr, target) = match *formula {
            F::LambdaCompatibility { lambda, target } => (lambda, target),
            F::MethodReferenceCompatibility { reference, target } => (reference, target),
            F::CheckedExceptionCompatibility { target, .. } => {
                if let Some(var) = self.unresolved_var(target) {
                    out.insert(var);
                }
                return out;
            }
            _ => return out,
        };
        if let Some(var) = self.unresolved_var(target) {
            out.insert(var);
            return out;
        }
        let blocked_on_params = match self.exprs().get(expr) {
            Some(ExprData::Lambda(lambda)) => lambda.params.is_implicit(),
            Some(ExprData::MethodRef(reference)) => !reference.exact,
            _ => false,
        };
        if blocked_on_params && let Some(method) = self.function_type(target) {
            for &param in &method.params {
                collect_vars(self.db(), param, &mut out);
            }
            out.retain(|var| !self.resolved.contains_key(var));
        }
        out
    }

    // =========================================================================
    // Lambdas
    // =========================================================================

    pub(crate) fn reduce_lambda(&mut self, lambda: ExprId, target: TypeId) -> Reduction {
        if self.unresolved_var(target).is_some() {
            return Reduction::Delayed;
        }
        let Some(ExprData::Lambda(expr)) = self.exprs().get(lambda) else {
            return self.fail(IncompatibilityRecord::new(
                MessageTemplate::CouldNotInfer,
                vec![lambda.into()],
            ));
        };
        let Some(method) = self.function_type(target) else {
            return self.fail(IncompatibilityRecord::new(
                MessageTemplate::NotAFunctionalInterface,
                vec![target.into()],
            ));
        };
        if method.is_generic() {
            return self.fail(IncompatibilityRecord::new(
                MessageTemplate::GenericFunctionalMethod,
                vec![target.into()],
            ));
        }
        if method.params.len() != expr.params.len() {
            return self.fail(IncompatibilityRecord::new(
                MessageTemplate::LambdaArityMismatch,
                vec![method.params.len().into(), expr.params.len().into()],
            ));
        }

        let mut formulas = Vec::new();
        let params: LambdaParamTypes = match &expr.params {
            LambdaParams::Implicit(_) => {
                if method.params.iter().any(|&p| !self.is_proper(p)) {
                    return Reduction::Delayed;
                }
                method.params.iter().map(|&p| self.substitute(p)).collect()
            }
            LambdaParams::Explicit(types) => {
                formulas.extend(
                    types
                        .iter()
                        .zip(&method.params)
                        .map(|(&left, &right)| F::TypeEquality { left, right }),
                );
                types.iter().copied().collect()
            }
        };
        trace!(lambda = lambda.0, ?params, "lambda parameters");
        self.lambda_params.insert(lambda, params);

        let body = &expr.body;
        if method.return_type == TypeId::VOID {
            if !body.void_compatible {
                return self.fail(IncompatibilityRecord::new(
                    MessageTemplate::LambdaNotVoidCompatible,
                    vec![target.into()],
                ));
            }
        } else {
            if !body.value_compatible {
                return self.fail(IncompatibilityRecord::new(
                    MessageTemplate::LambdaNotValueCompatible,
                    vec![method.return_type.into()],
                ));
            }
            formulas.extend(body.results.iter().map(|&result| F::ExpressionCompatibility {
                expr: result,
                target: method.return_type,
            }));
        }
        Reduction::Replaced(formulas)
    }

    // =========================================================================
    // Method references
    // =========================================================================

    pub(crate) fn reduce_method_ref(&mut self, reference: ExprId, target: TypeId) -> Reduction {
        if self.unresolved_var(target).is_some() {
            return Reduction::Delayed;
        }
        let db = self.db();
        let Some(ExprData::MethodRef(expr)) = self.exprs().get(reference) else {
            return self.fail(IncompatibilityRecord::new(
                MessageTemplate::CouldNotInfer,
                vec![reference.into()],
            ));
        };
        let Some(method) = self.function_type(target) else {
            return self.fail(IncompatibilityRecord::new(
                MessageTemplate::NotAFunctionalInterface,
                vec![target.into()],
            ));
        };
        if method.is_generic() {
            return self.fail(IncompatibilityRecord::new(
                MessageTemplate::GenericFunctionalMethod,
                vec![target.into()],
            ));
        }
        if !expr.exact && method.params.iter().any(|&p| !self.is_proper(p)) {
            return Reduction::Delayed;
        }

        let member = &expr.member;
        let offset = usize::from(matches!(expr.kind, MethodRefKind::Unbound { .. }));
        let Some(arity) = method.params.len().checked_sub(offset) else {
            return self.fail(IncompatibilityRecord::new(
                MessageTemplate::MethodReferenceArityMismatch,
                vec![member.params.len().into(), method.params.len().into()],
            ));
        };
        let declared = member.params.len();
        let arity_ok = if member.is_variable_arity() {
            arity + 1 >= declared
        } else {
            arity == declared
        };
        if !arity_ok {
            return self.fail(IncompatibilityRecord::new(
                MessageTemplate::MethodReferenceArityMismatch,
                vec![declared.into(), arity.into()],
            ));
        }

        let mut formulas = Vec::new();
        let subst = match &expr.explicit_type_args {
            Some(args) => TypeSubstitution::from_args(&member.type_params, args),
            None => {
                let mut subst = TypeSubstitution::new();
                for &param in &member.type_params {
                    let var = self.ctx.fresh_var();
                    self.vars.insert(var, VarData::for_param(param));
                    subst.insert(param, db.var(var));
                }
                for &param in &member.type_params {
                    let bound = db.type_param_bound(param);
                    if bound != TypeId::OBJECT
                        && let Some(var_ty) = subst.get(param)
                    {
                        formulas.push(F::StrictSubtyping {
                            sub: var_ty,
                            sup: instantiate_type(db, bound, &subst),
                        });
                    }
                }
                subst
            }
        };
        let inst = |ty: TypeId| instantiate_type(db, ty, &subst);

        if let MethodRefKind::Unbound { receiver } = expr.kind {
            formulas.push(F::StrictSubtyping {
                sub: method.params[0],
                sup: inst(receiver),
            });
        }
        let spread = member.is_variable_arity() && arity != declared;
        for (i, &functional) in method.params[offset..].iter().enumerate() {
            let param = if spread && i + 1 >= declared {
                match db.lookup(member.params[declared - 1]) {
                    Some(TypeData::Array(component)) => component,
                    _ => member.params[declared - 1],
                }
            } else {
                member.params[i]
            };
            formulas.push(F::TypeCompatibility {
                target: inst(param),
                source: functional,
            });
        }

        if method.return_type != TypeId::VOID {
            let returned = inst(member.return_type);
            if returned == TypeId::VOID {
                return self.fail(IncompatibilityRecord::new(
                    MessageTemplate::IncompatibleTypes,
                    vec![method.return_type.into(), returned.into()],
                ));
            }
            formulas.push(F::TypeCompatibility {
                target: method.return_type,
                source: returned,
            });
        }
        Reduction::Replaced(formulas)
    }

    // =========================================================================
    // Checked exceptions
    // =========================================================================

    /// Every checked exception the lambda body or referenced member throws
    /// must be covered by the `throws` clause of the function type. Clause
    /// entries that are still inference variables absorb them as lower
    /// bounds.
    pub(crate) fn reduce_checked_exceptions(&mut self, expr: ExprId, target: TypeId) -> Reduction {
        if self.unresolved_var(target).is_some() {
            return Reduction::Delayed;
        }
        let db = self.db();
        let oracle = self.oracle();
        // A target without a function type is reported by the lambda or
        // method reference formula itself.
        let Some(method) = self.function_type(target) else {
            return Reduction::Resolved(true);
        };
        let thrown: Vec<TypeId> = match self.exprs().get(expr) {
            Some(ExprData::Lambda(lambda)) => lambda.body.thrown.clone(),
            Some(ExprData::MethodRef(reference)) => reference
                .member
                .thrown
                .iter()
                .copied()
                .filter(|&ty| !mentions_type_params(db, ty, &reference.member.type_params))
                .collect(),
            _ => return Reduction::Resolved(true),
        };

        let (proper, open): (Vec<TypeId>, Vec<TypeId>) = method
            .thrown
            .iter()
            .map(|&ty| self.substitute(ty))
            .partition(|&ty| self.is_proper(ty));
        for &declared in &open {
            if let Some(var) = self.unresolved_var(declared)
                && let Some(data) = self.vars.get_mut(&var)
            {
                data.throws = true;
            }
        }

        let mut formulas = Vec::new();
        for exception in thrown {
            if !oracle.is_checked_exception(exception)
                || proper.iter().any(|&d| oracle.is_subtype(exception, d))
            {
                continue;
            }
            if open.is_empty() {
                return self.fail(IncompatibilityRecord::new(
                    MessageTemplate::UnhandledException,
                    vec![exception.into()],
                ));
            }
            formulas.extend(open.iter().map(|&declared| F::StrictSubtyping {
                sub: exception,
                sup: declared,
            }));
        }
        Reduction::Replaced(formulas)
    }
}

#[cfg(test)]
#[path = "../tests/functional_tests.rs"]
mod tests;
