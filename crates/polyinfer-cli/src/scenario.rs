//! JSON scenario format.
//!
//! A scenario declares a small class library, a table of methods, one
//! expression tree and the type it must conform to. Types are written in
//! source syntax (`List<? extends Number>`, `int[]`, `T`) and parsed against
//! the declared classes and the type parameters in scope.
//!
//! ```json
//! {
//!   "classes": [
//!     { "name": "Function", "interface": true, "type_params": ["T", "R"],
//!       "methods": [{ "name": "apply", "params": ["T"], "returns": "R" }] }
//!   ],
//!   "methods": [
//!     { "name": "apply", "type_params": ["T", "R"],
//!       "params": ["T", "Function<T, R>"], "returns": "R" }
//!   ],
//!   "expression": { "call": { "method": "apply", "args": [
//!     { "value": "String" },
//!     { "lambda": { "params": 1, "body": { "param": 0 } } }
//!   ] } },
//!   "target": "Object"
//! }
//! ```

use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default)]
    pub classes: Vec<ClassDecl>,
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
    pub expression: ExprNode,
    /// Absent for a call in statement position.
    #[serde(default)]
    pub target: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassDecl {
    pub name: String,
    #[serde(default)]
    pub interface: bool,
    #[serde(default)]
    pub type_params: Vec<TypeParamDecl>,
    /// Direct supertypes, in terms of this class's type parameters.
    #[serde(default)]
    pub supertypes: Vec<String>,
    /// Abstract methods. An interface with exactly one is functional.
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TypeParamDecl {
    Name(String),
    Bounded { name: String, bound: String },
}

impl TypeParamDecl {
    pub fn name(&self) -> &str {
        match self {
            TypeParamDecl::Name(name) | TypeParamDecl::Bounded { name, .. } => name,
        }
    }

    pub fn bound(&self) -> Option<&str> {
        match self {
            TypeParamDecl::Name(_) => None,
            TypeParamDecl::Bounded { bound, .. } => Some(bound),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MethodDecl {
    pub name: String,
    #[serde(default)]
    pub type_params: Vec<TypeParamDecl>,
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default = "void")]
    pub returns: String,
    #[serde(default)]
    pub throws: Vec<String>,
    #[serde(default)]
    pub varargs: bool,
}

fn void() -> String {
    "void".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum ExprNode {
    /// A standalone expression of the given type.
    Value(String),
    /// The `n`-th parameter of the innermost enclosing lambda.
    Param(u32),
    Paren(Box<ExprNode>),
    /// `[then, else]`
    Conditional(Box<ExprNode>, Box<ExprNode>),
    /// Result expressions of a switch expression.
    Switch(Vec<ExprNode>),
    Call(CallNode),
    Lambda(LambdaNode),
    MethodRef(MethodRefNode),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CallNode {
    /// Name of an entry in the scenario's method table.
    pub method: String,
    #[serde(default)]
    pub type_args: Option<Vec<String>>,
    #[serde(default)]
    pub args: Vec<ExprNode>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum LambdaParamsNode {
    /// `(a, b) -> ...`
    Implicit(u32),
    /// `(String a, int b) -> ...`
    Explicit(Vec<String>),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LambdaNode {
    pub params: LambdaParamsNode,
    /// Expression body.
    #[serde(default)]
    pub body: Option<Box<ExprNode>>,
    /// The expression body is a statement expression.
    #[serde(default)]
    pub statement: bool,
    /// Block body: operands of its `return` statements.
    #[serde(default)]
    pub returns: Vec<ExprNode>,
    /// Block body that cannot complete normally.
    #[serde(default)]
    pub never_completes: bool,
    /// Checked exceptions thrown by the body.
    #[serde(default)]
    pub throws: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum RefKindNode {
    Static,
    Bound,
    Constructor,
    Unbound { receiver: String },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MethodRefNode {
    pub method: String,
    pub kind: RefKindNode,
    #[serde(default)]
    pub exact: bool,
    #[serde(default)]
    pub type_args: Option<Vec<String>>,
}
