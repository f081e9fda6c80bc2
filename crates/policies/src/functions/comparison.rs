//! `*-greater-than`/`*-less-than`(-or-equal) over the ordered datatypes
//! (`spec.md` §4.D; `Datatype::is_ordered`).

use std::cmp::Ordering;

use crate::datatype::{Datatype, Value};
use crate::decision::Status;
use crate::expr::EvalValue;

use super::{FunctionDef, FunctionKind};

fn require_ordered_pair(args: &[EvalValue], datatype: Datatype) -> Result<Ordering, Status> {
    if args.len() != 2 {
        return Err(Status::processing_error(format!(
            "expected 2 arguments, found {}",
            args.len()
        )));
    }
    let a = args[0].as_single()?;
    let b = args[1].as_single()?;
    if a.datatype() != datatype || b.datatype() != datatype {
        return Err(Status::processing_error(format!(
            "expected two {datatype} arguments, found {} and {}",
            a.datatype(),
            b.datatype()
        )));
    }
    a.partial_cmp_ordered(b)
        .ok_or_else(|| Status::processing_error(format!("{datatype} values are not comparable")))
}

macro_rules! comparison_family {
    ($datatype:expr, $gt:ident, $ge:ident, $lt:ident, $le:ident) => {
        fn $gt(args: &[EvalValue]) -> Result<EvalValue, Status> {
            Ok(EvalValue::Single(Value::Boolean(
                require_ordered_pair(args, $datatype)? == Ordering::Greater,
            )))
        }
        fn $ge(args: &[EvalValue]) -> Result<EvalValue, Status> {
            Ok(EvalValue::Single(Value::Boolean(
                require_ordered_pair(args, $datatype)? != Ordering::Less,
            )))
        }
        fn $lt(args: &[EvalValue]) -> Result<EvalValue, Status> {
            Ok(EvalValue::Single(Value::Boolean(
                require_ordered_pair(args, $datatype)? == Ordering::Less,
            )))
        }
        fn $le(args: &[EvalValue]) -> Result<EvalValue, Status> {
            Ok(EvalValue::Single(Value::Boolean(
                require_ordered_pair(args, $datatype)? != Ordering::Greater,
            )))
        }
    };
}

comparison_family!(
    Datatype::Integer,
    integer_greater_than,
    integer_greater_than_or_equal,
    integer_less_than,
    integer_less_than_or_equal
);
comparison_family!(
    Datatype::Double,
    double_greater_than,
    double_greater_than_or_equal,
    double_less_than,
    double_less_than_or_equal
);
comparison_family!(
    Datatype::Date,
    date_greater_than,
    date_greater_than_or_equal,
    date_less_than,
    date_less_than_or_equal
);
comparison_family!(
    Datatype::Time,
    time_greater_than,
    time_greater_than_or_equal,
    time_less_than,
    time_less_than_or_equal
);
comparison_family!(
    Datatype::DateTime,
    date_time_greater_than,
    date_time_greater_than_or_equal,
    date_time_less_than,
    date_time_less_than_or_equal
);

pub fn functions() -> Vec<FunctionDef> {
    macro_rules! def {
        ($suffix:literal, $f:expr) => {
            FunctionDef {
                id: concat!("urn:oasis:names:tc:xacml:1.0:function:", $suffix),
                kind: FunctionKind::Standard($f),
            }
        };
    }
    vec![
        def!("integer-greater-than", integer_greater_than),
        def!("integer-greater-than-or-equal", integer_greater_than_or_equal),
        def!("integer-less-than", integer_less_than),
        def!("integer-less-than-or-equal", integer_less_than_or_equal),
        def!("double-greater-than", double_greater_than),
        def!("double-greater-than-or-equal", double_greater_than_or_equal),
        def!("double-less-than", double_less_than),
        def!("double-less-than-or-equal", double_less_than_or_equal),
        def!("date-greater-than", date_greater_than),
        def!("date-greater-than-or-equal", date_greater_than_or_equal),
        def!("date-less-than", date_less_than),
        def!("date-less-than-or-equal", date_less_than_or_equal),
        def!("time-greater-than", time_greater_than),
        def!("time-greater-than-or-equal", time_greater_than_or_equal),
        def!("time-less-than", time_less_than),
        def!("time-less-than-or-equal", time_less_than_or_equal),
        def!("dateTime-greater-than", date_time_greater_than),
        def!("dateTime-greater-than-or-equal", date_time_greater_than_or_equal),
        def!("dateTime-less-than", date_time_less_than),
        def!("dateTime-less-than-or-equal", date_time_less_than_or_equal),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_greater_than() {
        let args = [
            EvalValue::Single(Value::Integer(5.into())),
            EvalValue::Single(Value::Integer(3.into())),
        ];
        assert!(super::integer_greater_than(&args).unwrap().truthy().unwrap());
    }

    #[test]
    fn unordered_datatype_is_rejected_at_the_type_level() {
        // string has no comparison functions at all; nothing to call here.
        // This test documents that expectation rather than exercising code.
        assert!(!Datatype::String.is_ordered());
    }
}
