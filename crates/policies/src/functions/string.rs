//! String manipulation functions (`spec.md` §4.D).

use crate::datatype::Value;
use crate::decision::Status;
use crate::expr::EvalValue;

use super::{FunctionDef, FunctionKind};

fn require_string(value: &EvalValue) -> Result<&str, Status> {
    match value.as_single()? {
        Value::String(s) => Ok(s.as_str()),
        other => Err(Status::processing_error(format!("expected xs:string, found {}", other.datatype()))),
    }
}

fn string_concatenate(args: &[EvalValue]) -> Result<EvalValue, Status> {
    if args.len() < 2 {
        return Err(Status::processing_error("string-concatenate requires at least two arguments"));
    }
    let mut out = String::new();
    for arg in args {
        out.push_str(require_string(arg)?);
    }
    Ok(EvalValue::Single(Value::String(out)))
}

fn string_normalize_space(args: &[EvalValue]) -> Result<EvalValue, Status> {
    if args.len() != 1 {
        return Err(Status::processing_error("string-normalize-space takes exactly one argument"));
    }
    Ok(EvalValue::Single(Value::String(require_string(&args[0])?.trim().to_string())))
}

fn string_normalize_to_lower_case(args: &[EvalValue]) -> Result<EvalValue, Status> {
    if args.len() != 1 {
        return Err(Status::processing_error(
            "string-normalize-to-lower-case takes exactly one argument",
        ));
    }
    Ok(EvalValue::Single(Value::String(require_string(&args[0])?.to_lowercase())))
}

fn string_starts_with(args: &[EvalValue]) -> Result<EvalValue, Status> {
    if args.len() != 2 {
        return Err(Status::processing_error("string-starts-with takes exactly two arguments"));
    }
    // Per §4.D argument order: (prefix, string).
    let prefix = require_string(&args[0])?;
    let string = require_string(&args[1])?;
    Ok(EvalValue::Single(Value::Boolean(string.starts_with(prefix))))
}

fn string_ends_with(args: &[EvalValue]) -> Result<EvalValue, Status> {
    if args.len() != 2 {
        return Err(Status::processing_error("string-ends-with takes exactly two arguments"));
    }
    let suffix = require_string(&args[0])?;
    let string = require_string(&args[1])?;
    Ok(EvalValue::Single(Value::Boolean(string.ends_with(suffix))))
}

fn string_contains(args: &[EvalValue]) -> Result<EvalValue, Status> {
    if args.len() != 2 {
        return Err(Status::processing_error("string-contains takes exactly two arguments"));
    }
    let needle = require_string(&args[0])?;
    let haystack = require_string(&args[1])?;
    Ok(EvalValue::Single(Value::Boolean(haystack.contains(needle))))
}

fn string_substring(args: &[EvalValue]) -> Result<EvalValue, Status> {
    if args.len() != 3 {
        return Err(Status::processing_error("string-substring takes exactly three arguments"));
    }
    let s = require_string(&args[0])?;
    let begin = require_int(&args[1])? as usize;
    let end_raw = require_int(&args[2])?;
    let chars: Vec<char> = s.chars().collect();
    if begin > chars.len() {
        return Err(Status::processing_error("string-substring begin index out of range"));
    }
    let end = if end_raw < 0 { chars.len() } else { end_raw as usize };
    if end < begin || end > chars.len() {
        return Err(Status::processing_error("string-substring end index out of range"));
    }
    Ok(EvalValue::Single(Value::String(chars[begin..end].iter().collect())))
}

/// `string-regexp-match(pattern, string)`: true iff `string` matches the
/// XML-Schema-style `pattern` anywhere (`spec.md` §4.D). An invalid pattern
/// is a `processing-error`, not a silent `false`.
fn string_regexp_match(args: &[EvalValue]) -> Result<EvalValue, Status> {
    if args.len() != 2 {
        return Err(Status::processing_error("string-regexp-match takes exactly two arguments"));
    }
    let pattern = require_string(&args[0])?;
    let subject = require_string(&args[1])?;
    let re = regex::Regex::new(pattern)
        .map_err(|e| Status::processing_error(format!("invalid regular expression {pattern:?}: {e}")))?;
    Ok(EvalValue::Single(Value::Boolean(re.is_match(subject))))
}

fn require_int(value: &EvalValue) -> Result<i64, Status> {
    match value.as_single()? {
        Value::Integer(i) => i
            .to_string()
            .parse()
            .map_err(|_| Status::processing_error("integer argument out of range")),
        other => Err(Status::processing_error(format!("expected xs:integer, found {}", other.datatype()))),
    }
}

pub fn functions() -> Vec<FunctionDef> {
    vec![
        FunctionDef {
            id: "urn:oasis:names:tc:xacml:1.0:function:string-normalize-space",
            kind: FunctionKind::Standard(string_normalize_space),
        },
        FunctionDef {
            id: "urn:oasis:names:tc:xacml:1.0:function:string-normalize-to-lower-case",
            kind: FunctionKind::Standard(string_normalize_to_lower_case),
        },
        FunctionDef {
            id: "urn:oasis:names:tc:xacml:2.0:function:string-concatenate",
            kind: FunctionKind::Standard(string_concatenate),
        },
        FunctionDef {
            id: "urn:oasis:names:tc:xacml:3.0:function:string-starts-with",
            kind: FunctionKind::Standard(string_starts_with),
        },
        FunctionDef {
            id: "urn:oasis:names:tc:xacml:3.0:function:string-ends-with",
            kind: FunctionKind::Standard(string_ends_with),
        },
        FunctionDef {
            id: "urn:oasis:names:tc:xacml:3.0:function:string-contains",
            kind: FunctionKind::Standard(string_contains),
        },
        FunctionDef {
            id: "urn:oasis:names:tc:xacml:3.0:function:string-substring",
            kind: FunctionKind::Standard(string_substring),
        },
        FunctionDef {
            id: "urn:oasis:names:tc:xacml:1.0:function:string-regexp-match",
            kind: FunctionKind::Standard(string_regexp_match),
        },
    ]
}
