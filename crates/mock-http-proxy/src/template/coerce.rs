//! Conversions between template values, text and booleans.

use serde_json::Value;

/// Parse rendered predicate output as a boolean.
///
/// Surrounding whitespace is ignored. `1`, `t` and `true` are true and `0`,
/// `f` and `false` are false, in any ASCII case. Anything else is not a
/// boolean and counts as false.
pub fn parse_bool(rendered: &str) -> bool {
    try_parse_bool(rendered).unwrap_or(false)
}

/// Like [`parse_bool`], but distinguishes "false" from "not a boolean".
pub fn try_parse_bool(rendered: &str) -> Option<bool> {
    let trimmed = rendered.trim();
    const TRUE: [&str; 3] = ["1", "t", "true"];
    const FALSE: [&str; 3] = ["0", "f", "false"];

    if TRUE.iter().any(|t| trimmed.eq_ignore_ascii_case(t)) {
        Some(true)
    } else if FALSE.iter().any(|f| trimmed.eq_ignore_ascii_case(f)) {
        Some(false)
    } else {
        None
    }
}

/// Truthiness used by `if`, `and`, `or` and `not`.
///
/// `false`, zero, `null` and empty strings, arrays and objects are false.
pub fn is_true(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Text written for an action's result.
pub fn to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        structured => structured.to_string(),
    }
}

pub(crate) fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "nil",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_bool_true() {
        for input in ["true", "TRUE", "True", "tRuE", "t", "T", "1", "  true\n", "\ttrue "] {
            assert!(parse_bool(input), "{input:?} should be true");
        }
    }

    #[test]
    fn test_parse_bool_false_and_invalid() {
        for input in ["false", "FALSE", "f", "0", "", "   ", "yes", "on", "2", "truee", "t r u e"] {
            assert!(!parse_bool(input), "{input:?} should be false");
        }
    }

    #[test]
    fn test_try_parse_bool() {
        assert_eq!(try_parse_bool("F"), Some(false));
        assert_eq!(try_parse_bool("1"), Some(true));
        assert_eq!(try_parse_bool("maybe"), None);
    }

    #[test]
    fn test_is_true() {
        assert!(!is_true(&Value::Null));
        assert!(!is_true(&json!(false)));
        assert!(!is_true(&json!(0)));
        assert!(!is_true(&json!(0.0)));
        assert!(!is_true(&json!("")));
        assert!(!is_true(&json!([])));
        assert!(!is_true(&json!({})));

        assert!(is_true(&json!(true)));
        assert!(is_true(&json!(-1)));
        assert!(is_true(&json!("false")));
        assert!(is_true(&json!([0])));
        assert!(is_true(&json!({"a": null})));
    }

    #[test]
    fn test_to_text() {
        assert_eq!(to_text(&Value::Null), "");
        assert_eq!(to_text(&json!("x")), "x");
        assert_eq!(to_text(&json!(true)), "true");
        assert_eq!(to_text(&json!(5)), "5");
        assert_eq!(to_text(&json!(2.5)), "2.5");
        assert_eq!(to_text(&json!({"a": [1]})), r#"{"a":[1]}"#);
    }
}
