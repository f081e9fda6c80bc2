//! `not`, and the registry entries for the short-circuiting `and`/`or`/
//! `n-of` (`spec.md` §4.C, §4.D). The short-circuit functions have no
//! `StandardFn` body at all — the evaluator special-cases their
//! [`FunctionKind`] variant so it controls argument evaluation order.

use crate::datatype::Value;
use crate::decision::Status;
use crate::expr::EvalValue;

use super::{ids, FunctionDef, FunctionKind};

fn not(args: &[EvalValue]) -> Result<EvalValue, Status> {
    if args.len() != 1 {
        return Err(Status::processing_error("not takes exactly one argument"));
    }
    Ok(EvalValue::Single(Value::Boolean(!args[0].truthy()?)))
}

pub fn functions() -> Vec<FunctionDef> {
    vec![
        FunctionDef { id: "urn:oasis:names:tc:xacml:1.0:function:not", kind: FunctionKind::Standard(not) },
        FunctionDef { id: ids::AND, kind: FunctionKind::ShortCircuitAnd },
        FunctionDef { id: ids::OR, kind: FunctionKind::ShortCircuitOr },
        FunctionDef { id: ids::N_OF, kind: FunctionKind::ShortCircuitNOf },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_negates() {
        let args = [EvalValue::Single(Value::Boolean(true))];
        assert!(!not(&args).unwrap().truthy().unwrap());
    }
}
