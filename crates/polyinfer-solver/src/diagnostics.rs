//! Incompatibility records and their rendering.
//!
//! ## Lazy diagnostics
//!
//! Inference is often run tentatively (once per overload candidate), and most
//! failures are discarded. Records therefore store structured arguments
//! (`TypeId`s, variables, counts) and a [`MessageTemplate`]; text is produced
//! only when [`render_record`] is called.

use crate::expr::ExprId;
use crate::intern::TypeInterner;
use crate::types::{InferenceVar, TypeData, TypeId, WildcardKind};
use polyinfer_common::diagnostics::{MessageTemplate, format_message};
use polyinfer_common::limits::MAX_TYPE_WALK_DEPTH;
use serde::Serialize;
use smallvec::SmallVec;
use std::fmt::Write;

/// An argument for a message template.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum DiagnosticArg {
    Type(TypeId),
    Var(InferenceVar),
    Expr(ExprId),
    Number(usize),
}

macro_rules! impl_from_diagnostic_arg {
    ($($source:ty => $variant:ident),* $(,)?) => {
        $(impl From<$source> for DiagnosticArg {
            fn from(v: $source) -> Self { Self::$variant(v) }
        })*
    };
}

impl_from_diagnostic_arg! {
    TypeId       => Type,
    InferenceVar => Var,
    ExprId       => Expr,
    usize        => Number,
}

/// Why inference failed, for one formula or one variable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncompatibilityRecord {
    /// Inference variables the failure is about.
    pub variables: SmallVec<[InferenceVar; 2]>,
    pub message: MessageTemplate,
    pub args: Vec<DiagnosticArg>,
    /// The generic call whose session produced the record; `None` for
    /// failures of the outermost expression itself.
    pub call: Option<ExprId>,
}

impl IncompatibilityRecord {
    pub fn new(message: MessageTemplate, args: Vec<DiagnosticArg>) -> Self {
        Self {
            variables: SmallVec::new(),
            message,
            args,
            call: None,
        }
    }

    pub fn with_variables(mut self, variables: impl IntoIterator<Item = InferenceVar>) -> Self {
        self.variables.extend(variables);
        self
    }

    pub fn code(&self) -> u32 {
        self.message.code()
    }
}

/// Renders types for messages: `List<? extends Number>`, `int[]`, `α3`.
pub struct TypeFormatter<'a> {
    db: &'a TypeInterner,
}

impl<'a> TypeFormatter<'a> {
    pub fn new(db: &'a TypeInterner) -> Self {
        Self { db }
    }

    pub fn format(&self, ty: TypeId) -> String {
        let mut out = String::new();
        self.write(&mut out, ty, 0);
        out
    }

    fn write(&self, out: &mut String, ty: TypeId, depth: u32) {
        if depth > MAX_TYPE_WALK_DEPTH {
            out.push_str("...");
            return;
        }
        let Some(data) = self.db.lookup(ty) else {
            let _ = write!(out, "<type#{}>", ty.0);
            return;
        };
        match data {
            TypeData::Void => out.push_str("void"),
            TypeData::Null => out.push_str("null"),
            TypeData::Primitive(kind) => out.push_str(kind.name()),
            TypeData::Class(class) => {
                let name = self
                    .db
                    .defs()
                    .get_name(class.def)
                    .map(|atom| self.db.resolve_atom(atom));
                match name {
                    Some(name) => out.push_str(&name),
                    None => {
                        let _ = write!(out, "<def#{}>", class.def.0);
                    }
                }
                if !class.args.is_empty() {
                    out.push('<');
                    for (i, &arg) in class.args.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        self.write(out, arg, depth + 1);
                    }
                    out.push('>');
                }
            }
            TypeData::Array(elem) => {
                self.write(out, elem, depth + 1);
                out.push_str("[]");
            }
            TypeData::TypeParam(param) => match self.db.type_param_info(param) {
                Some(info) => out.push_str(&self.db.resolve_atom(info.name)),
                None => {
                    let _ = write!(out, "<param#{}>", param.0);
                }
            },
            TypeData::Wildcard(WildcardKind::Unbounded) => out.push('?'),
            TypeData::Wildcard(WildcardKind::Extends(bound)) => {
                out.push_str("? extends ");
                self.write(out, bound, depth + 1);
            }
            TypeData::Wildcard(WildcardKind::Super(bound)) => {
                out.push_str("? super ");
                self.write(out, bound, depth + 1);
            }
            TypeData::Intersection(members) => {
                for (i, &m) in members.iter().enumerate() {
                    if i > 0 {
                        out.push_str(" & ");
                    }
                    self.write(out, m, depth + 1);
                }
            }
            TypeData::Captured(captured) => {
                let _ = write!(out, "capture#{} of ", captured.id);
                self.write(out, captured.wildcard, depth + 1);
            }
            TypeData::Var(var) => {
                let _ = write!(out, "α{}", var.0);
            }
        }
    }
}

/// Render a record's message with its arguments filled in.
pub fn render_record(db: &TypeInterner, record: &IncompatibilityRecord) -> String {
    let formatter = TypeFormatter::new(db);
    let args: Vec<String> = record
        .args
        .iter()
        .map(|arg| match arg {
            DiagnosticArg::Type(ty) => formatter.format(*ty),
            DiagnosticArg::Var(var) => format!("α{}", var.0),
            DiagnosticArg::Expr(expr) => format!("expression #{}", expr.0),
            DiagnosticArg::Number(n) => n.to_string(),
        })
        .collect();
    let refs: Vec<&str> = args.iter().map(String::as_str).collect();
    format_message(record.message.message(), &refs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parameterized_types() {
        let db = TypeInterner::new();
        let e = db.fresh_type_param("E");
        let list = db.declare_interface("List", &[e]);
        let ty = db.apply1(list, db.wildcard_extends(TypeId::NUMBER));
        let formatter = TypeFormatter::new(&db);
        assert_eq!(formatter.format(ty), "List<? extends Number>");
        assert_eq!(formatter.format(db.array(TypeId::INT)), "int[]");
        assert_eq!(formatter.format(db.var(InferenceVar(3))), "α3");
    }

    #[test]
    fn test_render_record() {
        let db = TypeInterner::new();
        let record = IncompatibilityRecord::new(
            MessageTemplate::IncompatibleTypes,
            vec![TypeId::STRING.into(), TypeId::INTEGER.into()],
        );
        assert_eq!(
            render_record(&db, &record),
            "Incompatible types: Integer cannot be converted to String"
        );
        assert_eq!(record.code(), 1001);
    }
}
