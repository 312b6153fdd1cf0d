//! Turns a parsed [`Scenario`] into a type store and an expression arena.

use crate::scenario::{
    CallNode, ClassDecl, ExprNode, LambdaNode, LambdaParamsNode, MethodDecl, MethodRefNode,
    RefKindNode, Scenario, TypeParamDecl,
};
use crate::type_syntax::{TypeNames, parse_type};
use anyhow::{Context, Result, bail};
use polyinfer_solver::{
    DefId, ExprArena, ExprData, ExprId, LambdaBody, LambdaParams, MethodRefExpr, MethodRefKind,
    MethodSig, TypeData, TypeId, TypeInterner, TypeParamId,
};
use rustc_hash::FxHashMap;
use tracing::debug;

/// A scenario ready for inference.
pub struct LoadedScenario {
    pub db: TypeInterner,
    pub exprs: ExprArena,
    pub root: ExprId,
    pub target: Option<TypeId>,
}

pub fn load(scenario: &Scenario) -> Result<LoadedScenario> {
    let db = TypeInterner::new();
    let mut names = TypeNames::new();

    // Declare first so that supertypes and methods may refer to any class.
    let mut declared: Vec<(DefId, Vec<(String, TypeParamId)>)> = Vec::new();
    for class in &scenario.classes {
        let params = fresh_params(&db, &class.type_params);
        let ids: Vec<TypeParamId> = params.iter().map(|(_, p)| *p).collect();
        let def = if class.interface {
            db.declare_interface(&class.name, &ids)
        } else {
            db.declare_class(&class.name, &ids)
        };
        names.declare(&class.name, def)?;
        declared.push((def, params));
    }
    for (class, (def, params)) in scenario.classes.iter().zip(&declared) {
        fill_class(&db, &names, class, *def, params)
            .with_context(|| format!("in class `{}`", class.name))?;
    }

    let mut methods = FxHashMap::default();
    for decl in &scenario.methods {
        let sig = method_sig(&db, &names, &[], decl)
            .with_context(|| format!("in method `{}`", decl.name))?;
        if methods.insert(decl.name.clone(), sig).is_some() {
            bail!("method `{}` is declared twice", decl.name);
        }
    }

    let target = scenario
        .target
        .as_deref()
        .map(|text| parse_type(&db, &names, &[], text))
        .transpose()
        .context("in target type")?;

    let mut exprs = ExprArena::new();
    let root = {
        let lowerer = Lowerer {
            db: &db,
            names: &names,
            methods: &methods,
        };
        let mut lambdas = Vec::new();
        lowerer.lower(&mut exprs, &mut lambdas, &scenario.expression)?
    };
    debug!(
        classes = scenario.classes.len(),
        methods = methods.len(),
        exprs = exprs.len(),
        "scenario loaded"
    );
    Ok(LoadedScenario {
        db,
        exprs,
        root,
        target,
    })
}

fn fresh_params(db: &TypeInterner, decls: &[TypeParamDecl]) -> Vec<(String, TypeParamId)> {
    decls
        .iter()
        .map(|decl| (decl.name().to_string(), db.fresh_type_param(decl.name())))
        .collect()
}

/// Bounds may mention any parameter of the same declaration.
fn set_bounds(
    db: &TypeInterner,
    names: &TypeNames,
    scope: &[(String, TypeParamId)],
    decls: &[TypeParamDecl],
    params: &[(String, TypeParamId)],
) -> Result<()> {
    for (decl, (_, param)) in decls.iter().zip(params) {
        if let Some(bound) = decl.bound() {
            let bound = parse_type(db, names, scope, bound)
                .with_context(|| format!("in bound of `{}`", decl.name()))?;
            db.set_type_param_bound(*param, bound);
        }
    }
    Ok(())
}

fn fill_class(
    db: &TypeInterner,
    names: &TypeNames,
    class: &ClassDecl,
    def: DefId,
    params: &[(String, TypeParamId)],
) -> Result<()> {
    set_bounds(db, names, params, &class.type_params, params)?;
    for text in &class.supertypes {
        let supertype = parse_type(db, names, params, text)?;
        db.defs().add_supertype(def, supertype);
    }
    for decl in &class.methods {
        let sig = method_sig(db, names, params, decl)
            .with_context(|| format!("in method `{}`", decl.name))?;
        db.defs().add_abstract_method(def, sig);
    }
    Ok(())
}

fn method_sig(
    db: &TypeInterner,
    names: &TypeNames,
    outer: &[(String, TypeParamId)],
    decl: &MethodDecl,
) -> Result<MethodSig> {
    let own = fresh_params(db, &decl.type_params);
    let scope: Vec<(String, TypeParamId)> =
        outer.iter().cloned().chain(own.iter().cloned()).collect();
    set_bounds(db, names, &scope, &decl.type_params, &own)?;

    let params = decl
        .params
        .iter()
        .map(|text| parse_type(db, names, &scope, text))
        .collect::<Result<Vec<_>>>()?;
    let ends_in_array = matches!(
        params.last().and_then(|&p| db.lookup(p)),
        Some(TypeData::Array(_))
    );
    if decl.varargs && !ends_in_array {
        bail!("a variable-arity method must end with an array parameter");
    }
    let returns = parse_type(db, names, &scope, &decl.returns)?;
    let thrown = decl
        .throws
        .iter()
        .map(|text| parse_type(db, names, &scope, text))
        .collect::<Result<Vec<_>>>()?;

    let mut sig = MethodSig::new(db.intern_string(&decl.name), params, returns)
        .with_type_params(own.iter().map(|(_, p)| *p))
        .with_thrown(thrown);
    if decl.varargs {
        sig = sig.with_varargs();
    }
    Ok(sig)
}

struct Lowerer<'a> {
    db: &'a TypeInterner,
    names: &'a TypeNames,
    methods: &'a FxHashMap<String, MethodSig>,
}

impl Lowerer<'_> {
    fn ty(&self, text: &str) -> Result<TypeId> {
        parse_type(self.db, self.names, &[], text)
    }

    fn types(&self, texts: &[String]) -> Result<Vec<TypeId>> {
        texts.iter().map(|text| self.ty(text)).collect()
    }

    fn method(&self, name: &str) -> Result<MethodSig> {
        self.methods
            .get(name)
            .cloned()
            .with_context(|| format!("unknown method `{name}`"))
    }

    /// `lambdas` holds the enclosing lambdas, innermost last.
    fn lower(
        &self,
        arena: &mut ExprArena,
        lambdas: &mut Vec<ExprId>,
        node: &ExprNode,
    ) -> Result<ExprId> {
        let id = match node {
            ExprNode::Value(text) => arena.standalone(self.ty(text)?),
            ExprNode::Param(index) => {
                let Some(&lambda) = lambdas.last() else {
                    bail!("parameter reference outside of a lambda");
                };
                arena.lambda_param(lambda, *index)
            }
            ExprNode::Paren(inner) => {
                let inner = self.lower(arena, lambdas, inner)?;
                arena.paren(inner)
            }
            ExprNode::Conditional(then_branch, else_branch) => {
                let then_branch = self.lower(arena, lambdas, then_branch)?;
                let else_branch = self.lower(arena, lambdas, else_branch)?;
                arena.conditional(then_branch, else_branch)
            }
            ExprNode::Switch(results) => {
                let results = results
                    .iter()
                    .map(|result| self.lower(arena, lambdas, result))
                    .collect::<Result<Vec<_>>>()?;
                arena.switch(&results)
            }
            ExprNode::Call(call) => self.lower_call(arena, lambdas, call)?,
            ExprNode::Lambda(lambda) => self.lower_lambda(arena, lambdas, lambda)?,
            ExprNode::MethodRef(reference) => self.lower_method_ref(arena, reference)?,
        };
        Ok(id)
    }

    fn lower_call(
        &self,
        arena: &mut ExprArena,
        lambdas: &mut Vec<ExprId>,
        call: &CallNode,
    ) -> Result<ExprId> {
        let method = self.method(&call.method)?;
        let args = call
            .args
            .iter()
            .map(|arg| self.lower(arena, lambdas, arg))
            .collect::<Result<Vec<_>>>()?;
        Ok(match &call.type_args {
            Some(type_args) => {
                if type_args.len() != method.type_params.len() {
                    bail!(
                        "`{}` takes {} type argument(s), {} given",
                        call.method,
                        method.type_params.len(),
                        type_args.len()
                    );
                }
                arena.call_explicit(method, self.types(type_args)?, args)
            }
            None => arena.call(method, args),
        })
    }

    fn lower_lambda(
        &self,
        arena: &mut ExprArena,
        lambdas: &mut Vec<ExprId>,
        lambda: &LambdaNode,
    ) -> Result<ExprId> {
        let params = match &lambda.params {
            LambdaParamsNode::Implicit(count) => LambdaParams::Implicit(*count),
            LambdaParamsNode::Explicit(types) => LambdaParams::Explicit(self.types(types)?),
        };
        let thrown = self.types(&lambda.throws)?;
        // The arena hands the lambda its id before the body exists; errors
        // from lowering the body are carried out of the closure.
        let mut failure = None;
        let id = arena.lambda(params, |arena, id| {
            lambdas.push(id);
            let body = self.lower_lambda_body(arena, lambdas, lambda);
            lambdas.pop();
            match body {
                Ok(body) => body.throwing(thrown),
                Err(err) => {
                    failure = Some(err);
                    LambdaBody::default()
                }
            }
        });
        match failure {
            Some(err) => Err(err),
            None => Ok(id),
        }
    }

    fn lower_lambda_body(
        &self,
        arena: &mut ExprArena,
        lambdas: &mut Vec<ExprId>,
        lambda: &LambdaNode,
    ) -> Result<LambdaBody> {
        if let Some(body) = &lambda.body {
            if !lambda.returns.is_empty() || lambda.never_completes {
                bail!("a lambda has either an expression body or a block body");
            }
            let result = self.lower(arena, lambdas, body)?;
            return Ok(LambdaBody::expression(result, lambda.statement));
        }
        if lambda.never_completes {
            return Ok(LambdaBody::never_completes());
        }
        let returns = lambda
            .returns
            .iter()
            .map(|result| self.lower(arena, lambdas, result))
            .collect::<Result<Vec<_>>>()?;
        Ok(LambdaBody::block(returns))
    }

    fn lower_method_ref(&self, arena: &mut ExprArena, reference: &MethodRefNode) -> Result<ExprId> {
        let member = self.method(&reference.method)?;
        let kind = match &reference.kind {
            RefKindNode::Static => MethodRefKind::Static,
            RefKindNode::Bound => MethodRefKind::Bound,
            RefKindNode::Constructor => MethodRefKind::Constructor,
            RefKindNode::Unbound { receiver } => MethodRefKind::Unbound {
                receiver: self.ty(receiver)?,
            },
        };
        let explicit_type_args = reference
            .type_args
            .as_deref()
            .map(|types| self.types(types))
            .transpose()?;
        Ok(arena.alloc(ExprData::MethodRef(MethodRefExpr {
            member,
            kind,
            exact: reference.exact,
            explicit_type_args,
        })))
    }
}

#[cfg(test)]
#[path = "../tests/loader_tests.rs"]
mod tests;
