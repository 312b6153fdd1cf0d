//! JSON report of one inference run.

use crate::loader::LoadedScenario;
use polyinfer_common::MessageTemplate;
use polyinfer_solver::{
    DiagnosticArg, ExprData, ExprId, IncompatibilityRecord, InferenceError, InferenceOutcome,
    InferenceVar, TypeFormatter, TypeId, TypeSubstitution, render_record,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Report {
    Ok(Success),
    Failed { errors: Vec<ErrorReport> },
    Cancelled,
}

impl Report {
    pub fn is_ok(&self) -> bool {
        matches!(self, Report::Ok(_))
    }
}

#[derive(Debug, Serialize)]
pub struct Success {
    /// Absent when the root expression is not a call.
    pub return_type: Option<String>,
    pub type_arguments: Vec<TypeArgument>,
    pub calls: Vec<CallReport>,
    pub lambdas: Vec<LambdaReport>,
    pub captures: usize,
    pub erased: bool,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct TypeArgument {
    pub param: String,
    #[serde(rename = "type")]
    pub ty: String,
}

#[derive(Debug, Serialize)]
pub struct CallReport {
    pub expr: ExprId,
    pub method: String,
    pub type_arguments: Vec<TypeArgument>,
}

#[derive(Debug, Serialize)]
pub struct LambdaReport {
    pub expr: ExprId,
    pub params: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub code: u32,
    pub template: MessageTemplate,
    pub message: String,
    pub args: Vec<DiagnosticArg>,
    pub variables: Vec<InferenceVar>,
    pub call: Option<ExprId>,
    /// Name of the method `call` invokes.
    pub method: Option<String>,
}

pub fn build_report(
    scenario: &LoadedScenario,
    result: Result<InferenceOutcome, InferenceError>,
) -> Report {
    let builder = ReportBuilder {
        scenario,
        formatter: TypeFormatter::new(&scenario.db),
    };
    match result {
        Ok(outcome) => Report::Ok(builder.success(&outcome)),
        Err(InferenceError::Incompatible(records)) => Report::Failed {
            errors: records.iter().map(|r| builder.error(r)).collect(),
        },
        Err(InferenceError::Cancelled) => Report::Cancelled,
    }
}

struct ReportBuilder<'a> {
    scenario: &'a LoadedScenario,
    formatter: TypeFormatter<'a>,
}

impl ReportBuilder<'_> {
    fn ty(&self, ty: TypeId) -> String {
        self.formatter.format(ty)
    }

    fn type_arguments(&self, subst: &TypeSubstitution) -> Vec<TypeArgument> {
        let db = &self.scenario.db;
        subst
            .iter()
            .map(|(param, ty)| TypeArgument {
                param: db
                    .type_param_info(param)
                    .map(|info| db.resolve_atom(info.name).to_string())
                    .unwrap_or_else(|| format!("#{}", param.0)),
                ty: self.ty(ty),
            })
            .collect()
    }

    fn method_name(&self, call: ExprId) -> Option<String> {
        match self.scenario.exprs.get(call)? {
            ExprData::Call(data) => Some(self.scenario.db.resolve_atom(data.method.name).to_string()),
            _ => None,
        }
    }

    fn success(&self, outcome: &InferenceOutcome) -> Success {
        let calls = outcome
            .call_substitutions
            .iter()
            .map(|(&expr, subst)| CallReport {
                expr,
                method: self.method_name(expr).unwrap_or_default(),
                type_arguments: self.type_arguments(subst),
            })
            .collect();
        let mut lambdas: Vec<LambdaReport> = outcome
            .lambda_parameters
            .iter()
            .map(|(&expr, params)| LambdaReport {
                expr,
                params: params.iter().map(|&ty| self.ty(ty)).collect(),
            })
            .collect();
        lambdas.sort_by_key(|lambda| lambda.expr);
        Success {
            return_type: outcome.return_type.map(|ty| self.ty(ty)),
            type_arguments: self.type_arguments(&outcome.substitution),
            calls,
            lambdas,
            captures: outcome.captures.len(),
            erased: outcome.erased,
        }
    }

    fn error(&self, record: &IncompatibilityRecord) -> ErrorReport {
        ErrorReport {
            code: record.code(),
            template: record.message,
            message: render_record(&self.scenario.db, record),
            args: record.args.clone(),
            variables: record.variables.to_vec(),
            call: record.call,
            method: record.call.and_then(|call| self.method_name(call)),
        }
    }
}
