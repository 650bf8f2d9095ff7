//! Builtin template functions.
//!
//! `and` and `or` short-circuit and are evaluated by the executor; every
//! other function receives its arguments already evaluated.

use super::coerce::{is_true, kind_name};
use super::ExecError;
use serde_json::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Not,
    Index,
    Len,
}

impl Func {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "eq" => Func::Eq,
            "ne" => Func::Ne,
            "lt" => Func::Lt,
            "le" => Func::Le,
            "gt" => Func::Gt,
            "ge" => Func::Ge,
            "and" => Func::And,
            "or" => Func::Or,
            "not" => Func::Not,
            "index" => Func::Index,
            "len" => Func::Len,
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Func::Eq => "eq",
            Func::Ne => "ne",
            Func::Lt => "lt",
            Func::Le => "le",
            Func::Gt => "gt",
            Func::Ge => "ge",
            Func::And => "and",
            Func::Or => "or",
            Func::Not => "not",
            Func::Index => "index",
            Func::Len => "len",
        }
    }
}

/// Apply a function to evaluated arguments.
pub(crate) fn apply(func: Func, args: &[Value]) -> Result<Value, ExecError> {
    match func {
        Func::Eq => {
            require_at_least(func, args, 2)?;
            for other in &args[1..] {
                if equal(func, &args[0], other)? {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }
        Func::Ne => {
            require_exactly(func, args, 2)?;
            Ok(Value::Bool(!equal(func, &args[0], &args[1])?))
        }
        Func::Lt => compare(func, args, |o| o == Ordering::Less),
        Func::Le => compare(func, args, |o| o != Ordering::Greater),
        Func::Gt => compare(func, args, |o| o == Ordering::Greater),
        Func::Ge => compare(func, args, |o| o != Ordering::Less),
        Func::And => {
            require_at_least(func, args, 1)?;
            Ok(args
                .iter()
                .find(|v| !is_true(v))
                .unwrap_or(&args[args.len() - 1])
                .clone())
        }
        Func::Or => {
            require_at_least(func, args, 1)?;
            Ok(args
                .iter()
                .find(|v| is_true(v))
                .unwrap_or(&args[args.len() - 1])
                .clone())
        }
        Func::Not => {
            require_exactly(func, args, 1)?;
            Ok(Value::Bool(!is_true(&args[0])))
        }
        Func::Index => {
            require_at_least(func, args, 1)?;
            let mut current = args[0].clone();
            for key in &args[1..] {
                current = index(current, key)?;
            }
            Ok(current)
        }
        Func::Len => {
            require_exactly(func, args, 1)?;
            let len = match &args[0] {
                Value::String(s) => s.len(),
                Value::Array(a) => a.len(),
                Value::Object(o) => o.len(),
                other => return Err(ExecError::NoLength(kind_name(other))),
            };
            Ok(Value::from(len))
        }
    }
}

fn require_exactly(func: Func, args: &[Value], want: usize) -> Result<(), ExecError> {
    if args.len() != want {
        return Err(ExecError::ArgCount {
            func: func.name(),
            want: want.to_string(),
            got: args.len(),
        });
    }
    Ok(())
}

fn require_at_least(func: Func, args: &[Value], want: usize) -> Result<(), ExecError> {
    if args.len() < want {
        return Err(ExecError::ArgCount {
            func: func.name(),
            want: format!("at least {want}"),
            got: args.len(),
        });
    }
    Ok(())
}

/// `nil` equals only `nil`; numbers compare by value regardless of representation.
fn equal(func: Func, a: &Value, b: &Value) -> Result<bool, ExecError> {
    match (a, b) {
        (Value::Null, Value::Null) => Ok(true),
        (Value::Null, _) | (_, Value::Null) => Ok(false),
        (Value::Bool(x), Value::Bool(y)) => Ok(x == y),
        (Value::String(x), Value::String(y)) => Ok(x == y),
        (Value::Number(x), Value::Number(y)) => Ok(x.as_f64() == y.as_f64()),
        (Value::Array(_) | Value::Object(_), _) | (_, Value::Array(_) | Value::Object(_)) => {
            Err(ExecError::NotComparable(func.name()))
        }
        _ => Err(ExecError::IncompatibleTypes(func.name())),
    }
}

fn compare(
    func: Func,
    args: &[Value],
    accept: impl Fn(Ordering) -> bool,
) -> Result<Value, ExecError> {
    require_exactly(func, args, 2)?;
    let ordering = match (&args[0], &args[1]) {
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x
                .partial_cmp(&y)
                .ok_or(ExecError::NotComparable(func.name()))?,
            _ => return Err(ExecError::NotComparable(func.name())),
        },
        (Value::Bool(_) | Value::Null | Value::Array(_) | Value::Object(_), _) => {
            return Err(ExecError::NotComparable(func.name()))
        }
        _ => return Err(ExecError::IncompatibleTypes(func.name())),
    };
    Ok(Value::Bool(accept(ordering)))
}

fn index(item: Value, key: &Value) -> Result<Value, ExecError> {
    match (item, key) {
        (Value::Object(mut map), Value::String(k)) => Ok(map.remove(k).unwrap_or(Value::Null)),
        (Value::Array(mut items), Value::Number(n)) => {
            let len = items.len();
            match n.as_u64().and_then(|i| usize::try_from(i).ok()) {
                Some(i) if i < len => Ok(items.swap_remove(i)),
                _ => Err(ExecError::IndexOutOfRange(n.to_string())),
            }
        }
        (Value::Null, _) => Ok(Value::Null),
        (other, _) => Err(ExecError::CannotIndex(kind_name(&other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(func: Func, args: Vec<Value>) -> Result<Value, ExecError> {
        apply(func, &args)
    }

    #[test]
    fn test_from_name_round_trips() {
        for name in ["eq", "ne", "lt", "le", "gt", "ge", "and", "or", "not", "index", "len"] {
            assert_eq!(Func::from_name(name).map(|f| f.name()), Some(name));
        }
        assert_eq!(Func::from_name("printf"), None);
    }

    #[test]
    fn test_eq() {
        assert_eq!(call(Func::Eq, vec![json!("5"), json!("5")]).unwrap(), json!(true));
        assert_eq!(call(Func::Eq, vec![json!("5"), json!("9")]).unwrap(), json!(false));
        assert_eq!(call(Func::Eq, vec![json!(5), json!(5.0)]).unwrap(), json!(true));
        assert_eq!(call(Func::Eq, vec![json!(true), json!(true)]).unwrap(), json!(true));
        assert_eq!(
            call(Func::Eq, vec![json!("a"), json!("b"), json!("a")]).unwrap(),
            json!(true)
        );
        assert_eq!(call(Func::Eq, vec![Value::Null, json!("x")]).unwrap(), json!(false));
        assert_eq!(call(Func::Eq, vec![Value::Null, Value::Null]).unwrap(), json!(true));
    }

    #[test]
    fn test_eq_errors() {
        assert!(matches!(
            call(Func::Eq, vec![json!("5"), json!(5)]),
            Err(ExecError::IncompatibleTypes("eq"))
        ));
        assert!(matches!(
            call(Func::Eq, vec![json!({"a": 1}), json!({"a": 1})]),
            Err(ExecError::NotComparable("eq"))
        ));
        assert!(matches!(
            call(Func::Eq, vec![json!(1)]),
            Err(ExecError::ArgCount { func: "eq", .. })
        ));
    }

    #[test]
    fn test_ne() {
        assert_eq!(call(Func::Ne, vec![json!("a"), json!("b")]).unwrap(), json!(true));
        assert_eq!(call(Func::Ne, vec![json!(1), json!(1)]).unwrap(), json!(false));
        assert!(call(Func::Ne, vec![json!(1), json!(1), json!(2)]).is_err());
    }

    #[test]
    fn test_ordering() {
        assert_eq!(call(Func::Lt, vec![json!(1), json!(2)]).unwrap(), json!(true));
        assert_eq!(call(Func::Le, vec![json!(2), json!(2)]).unwrap(), json!(true));
        assert_eq!(call(Func::Gt, vec![json!(1.5), json!(2)]).unwrap(), json!(false));
        assert_eq!(call(Func::Ge, vec![json!("b"), json!("a")]).unwrap(), json!(true));
        assert!(call(Func::Lt, vec![json!("1"), json!(2)]).is_err());
        assert!(call(Func::Lt, vec![json!(true), json!(false)]).is_err());
    }

    #[test]
    fn test_and_or_not() {
        assert_eq!(call(Func::And, vec![json!(1), json!("x")]).unwrap(), json!("x"));
        assert_eq!(call(Func::And, vec![json!(0), json!("x")]).unwrap(), json!(0));
        assert_eq!(call(Func::Or, vec![json!(""), json!("y")]).unwrap(), json!("y"));
        assert_eq!(call(Func::Or, vec![json!(""), json!(0)]).unwrap(), json!(0));
        assert_eq!(call(Func::Not, vec![json!("")]).unwrap(), json!(true));
        assert!(call(Func::And, vec![]).is_err());
    }

    #[test]
    fn test_index() {
        let data = json!({"users": [{"name": "ada"}, {"name": "bob"}]});
        assert_eq!(
            call(Func::Index, vec![data.clone(), json!("users"), json!(1), json!("name")]).unwrap(),
            json!("bob")
        );
        assert_eq!(
            call(Func::Index, vec![data.clone(), json!("missing")]).unwrap(),
            Value::Null
        );
        assert!(matches!(
            call(Func::Index, vec![data.clone(), json!("users"), json!(5)]),
            Err(ExecError::IndexOutOfRange(_))
        ));
        assert!(matches!(
            call(Func::Index, vec![json!("str"), json!(0)]),
            Err(ExecError::CannotIndex("string"))
        ));
    }

    #[test]
    fn test_len() {
        assert_eq!(call(Func::Len, vec![json!("abc")]).unwrap(), json!(3));
        assert_eq!(call(Func::Len, vec![json!([1, 2])]).unwrap(), json!(2));
        assert_eq!(call(Func::Len, vec![json!({"a": 1})]).unwrap(), json!(1));
        assert!(matches!(
            call(Func::Len, vec![json!(5)]),
            Err(ExecError::NoLength("number"))
        ));
    }
}
