//! Diagnostic message templates for inference failures.
//!
//! The solver never renders messages. It records a [`MessageTemplate`] plus
//! structured arguments; whoever displays the failure looks the template up
//! here and fills the `{0}`, `{1}`, ... placeholders with [`format_message`].

use serde::Serialize;

/// Diagnostic category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DiagnosticCategory {
    Warning = 0,
    Error = 1,
}

/// A diagnostic message definition with code, category, and message template.
#[derive(Clone, Copy, Debug)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    pub message: &'static str,
}

/// Every failure the inference engine can report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum MessageTemplate {
    IncompatibleTypes,
    NotEqual,
    NotASubtype,
    NotContained,
    IncompatibleBounds,
    IncompatibleResolution,
    NotAFunctionalInterface,
    GenericFunctionalMethod,
    LambdaArityMismatch,
    LambdaNotValueCompatible,
    LambdaNotVoidCompatible,
    MethodReferenceArityMismatch,
    UnhandledException,
    ArgumentCountMismatch,
    InferenceCycle,
    CouldNotInfer,
    DidNotConverge,
    NestingTooDeep,
}

pub const DIAGNOSTIC_MESSAGES: &[DiagnosticMessage] = &[
    DiagnosticMessage {
        code: 1001,
        category: DiagnosticCategory::Error,
        message: "Incompatible types: {1} cannot be converted to {0}",
    },
    DiagnosticMessage {
        code: 1002,
        category: DiagnosticCategory::Error,
        message: "Incompatible equality constraint: {0} and {1}",
    },
    DiagnosticMessage {
        code: 1003,
        category: DiagnosticCategory::Error,
        message: "{0} is not a subtype of {1}",
    },
    DiagnosticMessage {
        code: 1004,
        category: DiagnosticCategory::Error,
        message: "Type argument {0} is not within {1}",
    },
    DiagnosticMessage {
        code: 1005,
        category: DiagnosticCategory::Error,
        message: "Inference variable {0} has incompatible bounds: {1} and {2}",
    },
    DiagnosticMessage {
        code: 1006,
        category: DiagnosticCategory::Error,
        message: "Inference variable {0} resolved to {1} but must equal {2}",
    },
    DiagnosticMessage {
        code: 1007,
        category: DiagnosticCategory::Error,
        message: "{0} is not a functional interface",
    },
    DiagnosticMessage {
        code: 1008,
        category: DiagnosticCategory::Error,
        message: "Target method of {0} is generic",
    },
    DiagnosticMessage {
        code: 1009,
        category: DiagnosticCategory::Error,
        message: "Incompatible parameter count in lambda expression: expected {0}, found {1}",
    },
    DiagnosticMessage {
        code: 1010,
        category: DiagnosticCategory::Error,
        message: "Bad return type in lambda expression: {0} expected, body returns no value",
    },
    DiagnosticMessage {
        code: 1011,
        category: DiagnosticCategory::Error,
        message: "Bad return type in lambda expression: {0} is void but body returns a value",
    },
    DiagnosticMessage {
        code: 1012,
        category: DiagnosticCategory::Error,
        message: "Invalid method reference: expected {0} parameters, found {1}",
    },
    DiagnosticMessage {
        code: 1013,
        category: DiagnosticCategory::Error,
        message: "Unhandled exception: {0}",
    },
    DiagnosticMessage {
        code: 1014,
        category: DiagnosticCategory::Error,
        message: "Expected {0} arguments but found {1}",
    },
    DiagnosticMessage {
        code: 1015,
        category: DiagnosticCategory::Error,
        message: "Inference cycle between {0}",
    },
    DiagnosticMessage {
        code: 1016,
        category: DiagnosticCategory::Error,
        message: "Could not infer type for {0}",
    },
    DiagnosticMessage {
        code: 1017,
        category: DiagnosticCategory::Error,
        message: "Inference did not converge after {0} steps",
    },
    DiagnosticMessage {
        code: 1018,
        category: DiagnosticCategory::Error,
        message: "Generic call nesting exceeds {0} levels",
    },
];

impl MessageTemplate {
    /// The table entry for this template.
    pub fn definition(self) -> &'static DiagnosticMessage {
        &DIAGNOSTIC_MESSAGES[self as usize]
    }

    /// Stable numeric code.
    pub fn code(self) -> u32 {
        self.definition().code
    }

    /// Message template with `{0}`, `{1}`, etc. placeholders.
    pub fn message(self) -> &'static str {
        self.definition().message
    }
}

/// Format a diagnostic message by replacing {0}, {1}, etc. with arguments.
#[must_use]
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

/// Look up a diagnostic message definition by code.
#[must_use]
pub fn get_diagnostic_message(code: u32) -> Option<&'static DiagnosticMessage> {
    DIAGNOSTIC_MESSAGES.iter().find(|m| m.code == code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_table_is_aligned() {
        assert_eq!(MessageTemplate::IncompatibleTypes.code(), 1001);
        assert_eq!(MessageTemplate::NestingTooDeep.code(), 1018);
        for (i, m) in DIAGNOSTIC_MESSAGES.iter().enumerate() {
            assert_eq!(m.code, 1001 + i as u32);
        }
    }

    #[test]
    fn test_format_message() {
        let text = format_message(
            MessageTemplate::IncompatibleTypes.message(),
            &["List<String>", "Integer"],
        );
        assert_eq!(
            text,
            "Incompatible types: Integer cannot be converted to List<String>"
        );
    }

    #[test]
    fn test_lookup_by_code() {
        let m = get_diagnostic_message(1013).expect("code exists");
        assert_eq!(m.message, MessageTemplate::UnhandledException.message());
        assert!(get_diagnostic_message(42).is_none());
    }
}
