use super::*;
use polyinfer_solver::ExprId;

fn run_default(source: &str) -> Report {
    run(source, InferenceLimits::default()).expect("scenario loads")
}

fn success(report: Report) -> crate::report::Success {
    match report {
        Report::Ok(success) => success,
        other => panic!("expected success, got {other:?}"),
    }
}

#[test]
fn test_lambda_scenario() {
    let report = success(run_default(include_str!("../scenarios/map_lambda.json")));
    assert_eq!(report.return_type.as_deref(), Some("List<Integer>"));
    let arguments: Vec<(&str, &str)> = report
        .type_arguments
        .iter()
        .map(|arg| (arg.param.as_str(), arg.ty.as_str()))
        .collect();
    assert_eq!(arguments, vec![("T", "String"), ("R", "Integer")]);
    assert_eq!(report.lambdas.len(), 1);
    assert_eq!(report.lambdas[0].params, vec!["String".to_string()]);
    assert_eq!(report.calls.len(), 1);
    assert_eq!(report.calls[0].method, "map");
    assert!(!report.erased);
}

#[test]
fn test_nested_failure_scenario() {
    let report = run_default(include_str!("../scenarios/nested_failure.json"));
    let Report::Failed { errors } = &report else {
        panic!("half(\"s\") cannot infer N");
    };
    let first = &errors[0];
    assert_eq!(first.template, polyinfer_common::MessageTemplate::IncompatibleBounds);
    assert_eq!(first.code, first.template.code());
    assert_eq!(first.call, Some(ExprId(1)));
    assert_eq!(first.method.as_deref(), Some("half"));
    assert!(!first.message.is_empty());

    let json = serde_json::to_value(&report).expect("serializes");
    assert_eq!(json["status"], "failed");
    assert_eq!(json["errors"][0]["call"], 1);
    assert_eq!(json["errors"][0]["template"], "IncompatibleBounds");
    assert_eq!(json["errors"][0]["args"][0]["kind"], "var");
}

#[test]
fn test_success_report_json_shape() {
    let source = r#"{
        "methods": [{ "name": "id", "type_params": ["T"], "params": ["T"], "returns": "T" }],
        "expression": { "call": { "method": "id", "args": [
            { "conditional": [{ "value": "Integer" }, { "value": "Double" }] }
        ] } }
    }"#;
    let report = run_default(source);
    let json = serde_json::to_value(&report).expect("serializes");
    assert_eq!(json["status"], "ok");
    assert_eq!(json["return_type"], "Number");
    assert_eq!(json["type_arguments"][0]["param"], "T");
    assert_eq!(json["type_arguments"][0]["type"], "Number");
    assert_eq!(json["calls"][0]["expr"], 3);
}

#[test]
fn test_non_call_root_uses_target() {
    let source = r#"{
        "classes": [{ "name": "Supplier", "interface": true, "type_params": ["T"],
                      "methods": [{ "name": "get", "returns": "T" }] }],
        "expression": { "lambda": { "params": 0, "body": { "value": "String" } } },
        "target": "Supplier<? extends CharSequence>"
    }"#;
    // CharSequence is not declared.
    assert!(run(source, InferenceLimits::default()).is_err());

    let source = source.replace("? extends CharSequence", "String");
    let report = success(run_default(&source));
    assert_eq!(report.return_type, None);
    assert_eq!(report.lambdas[0].params, Vec::<String>::new());
}

#[test]
fn test_limits_are_applied() {
    let limits = InferenceLimits {
        max_iterations: 1,
        ..InferenceLimits::default()
    };
    let report = run(include_str!("../scenarios/map_lambda.json"), limits).expect("loads");
    let Report::Failed { errors } = report else {
        panic!("one iteration is not enough");
    };
    assert_eq!(
        errors[0].template,
        polyinfer_common::MessageTemplate::DidNotConverge
    );
}

#[test]
fn test_invalid_json_is_an_error() {
    let err = run("{ \"expression\": 3 }", InferenceLimits::default()).unwrap_err();
    assert!(format!("{err:#}").contains("invalid scenario"));
}
