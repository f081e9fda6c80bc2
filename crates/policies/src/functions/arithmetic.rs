//! `integer-*`/`double-*` arithmetic, `round`, `floor` (`spec.md` §4.D).

use num_bigint::BigInt;
use num_traits::Signed;

use crate::datatype::Value;
use crate::decision::Status;
use crate::expr::EvalValue;

use super::{FunctionDef, FunctionKind};

fn integers(args: &[EvalValue]) -> Result<Vec<BigInt>, Status> {
    args.iter()
        .map(|a| match a.as_single()? {
            Value::Integer(i) => Ok(i.clone()),
            other => Err(Status::processing_error(format!(
                "expected xs:integer, found {}",
                other.datatype()
            ))),
        })
        .collect()
}

fn doubles(args: &[EvalValue]) -> Result<Vec<f64>, Status> {
    args.iter()
        .map(|a| match a.as_single()? {
            Value::Double(d) => Ok(*d),
            other => Err(Status::processing_error(format!(
                "expected xs:double, found {}",
                other.datatype()
            ))),
        })
        .collect()
}

fn require_at_least(n: usize, args: &[EvalValue]) -> Result<(), Status> {
    if args.len() < n {
        Err(Status::processing_error(format!("expected at least {n} arguments, found {}", args.len())))
    } else {
        Ok(())
    }
}

fn integer_add(args: &[EvalValue]) -> Result<EvalValue, Status> {
    require_at_least(2, args)?;
    let sum = integers(args)?.into_iter().sum();
    Ok(EvalValue::Single(Value::Integer(sum)))
}

fn integer_subtract(args: &[EvalValue]) -> Result<EvalValue, Status> {
    if args.len() != 2 {
        return Err(Status::processing_error("integer-subtract takes exactly two arguments"));
    }
    let ints = integers(args)?;
    Ok(EvalValue::Single(Value::Integer(&ints[0] - &ints[1])))
}

fn integer_multiply(args: &[EvalValue]) -> Result<EvalValue, Status> {
    require_at_least(2, args)?;
    let product = integers(args)?.into_iter().fold(BigInt::from(1), |acc, v| acc * v);
    Ok(EvalValue::Single(Value::Integer(product)))
}

fn integer_divide(args: &[EvalValue]) -> Result<EvalValue, Status> {
    if args.len() != 2 {
        return Err(Status::processing_error("integer-divide takes exactly two arguments"));
    }
    let ints = integers(args)?;
    if ints[1] == BigInt::from(0) {
        return Err(Status::processing_error("integer division by zero"));
    }
    Ok(EvalValue::Single(Value::Integer(&ints[0] / &ints[1])))
}

fn integer_mod(args: &[EvalValue]) -> Result<EvalValue, Status> {
    if args.len() != 2 {
        return Err(Status::processing_error("integer-mod takes exactly two arguments"));
    }
    let ints = integers(args)?;
    if ints[1] == BigInt::from(0) {
        return Err(Status::processing_error("integer modulo by zero"));
    }
    Ok(EvalValue::Single(Value::Integer(&ints[0] % &ints[1])))
}

fn integer_abs(args: &[EvalValue]) -> Result<EvalValue, Status> {
    if args.len() != 1 {
        return Err(Status::processing_error("integer-abs takes exactly one argument"));
    }
    let ints = integers(args)?;
    Ok(EvalValue::Single(Value::Integer(ints[0].abs())))
}

fn double_add(args: &[EvalValue]) -> Result<EvalValue, Status> {
    require_at_least(2, args)?;
    Ok(EvalValue::Single(Value::Double(doubles(args)?.into_iter().sum())))
}

fn double_subtract(args: &[EvalValue]) -> Result<EvalValue, Status> {
    if args.len() != 2 {
        return Err(Status::processing_error("double-subtract takes exactly two arguments"));
    }
    let d = doubles(args)?;
    Ok(EvalValue::Single(Value::Double(d[0] - d[1])))
}

fn double_multiply(args: &[EvalValue]) -> Result<EvalValue, Status> {
    require_at_least(2, args)?;
    Ok(EvalValue::Single(Value::Double(doubles(args)?.into_iter().product())))
}

fn double_divide(args: &[EvalValue]) -> Result<EvalValue, Status> {
    if args.len() != 2 {
        return Err(Status::processing_error("double-divide takes exactly two arguments"));
    }
    let d = doubles(args)?;
    if d[1] == 0.0 {
        return Err(Status::processing_error("double division by zero"));
    }
    Ok(EvalValue::Single(Value::Double(d[0] / d[1])))
}

fn double_abs(args: &[EvalValue]) -> Result<EvalValue, Status> {
    if args.len() != 1 {
        return Err(Status::processing_error("double-abs takes exactly one argument"));
    }
    Ok(EvalValue::Single(Value::Double(doubles(args)?[0].abs())))
}

fn round(args: &[EvalValue]) -> Result<EvalValue, Status> {
    if args.len() != 1 {
        return Err(Status::processing_error("round takes exactly one argument"));
    }
    Ok(EvalValue::Single(Value::Double(doubles(args)?[0].round())))
}

fn floor(args: &[EvalValue]) -> Result<EvalValue, Status> {
    if args.len() != 1 {
        return Err(Status::processing_error("floor takes exactly one argument"));
    }
    Ok(EvalValue::Single(Value::Double(doubles(args)?[0].floor())))
}

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
        def!("integer-add", integer_add),
        def!("integer-subtract", integer_subtract),
        def!("integer-multiply", integer_multiply),
        def!("integer-divide", integer_divide),
        def!("integer-mod", integer_mod),
        def!("integer-abs", integer_abs),
        def!("double-add", double_add),
        def!("double-subtract", double_subtract),
        def!("double-multiply", double_multiply),
        def!("double-divide", double_divide),
        def!("double-abs", double_abs),
        def!("round", round),
        def!("floor", floor),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_divide_by_zero_is_processing_error() {
        let args = [
            EvalValue::Single(Value::Integer(1.into())),
            EvalValue::Single(Value::Integer(0.into())),
        ];
        assert!(integer_divide(&args).is_err());
    }

    #[test]
    fn integer_arithmetic_is_arbitrary_precision() {
        let huge = "170141183460469231731687303715884105728"; // 2^127
        let args = [
            EvalValue::Single(Value::Integer(huge.parse().unwrap())),
            EvalValue::Single(Value::Integer(huge.parse().unwrap())),
        ];
        let result = integer_add(&args).unwrap();
        match result.as_single().unwrap() {
            Value::Integer(i) => assert_eq!(i.to_string(), "340282366920938463463374607431768211456"),
            _ => panic!("expected integer"),
        }
    }

    #[test]
    fn double_divide_by_zero_is_processing_error() {
        let args = [EvalValue::Single(Value::Double(1.0)), EvalValue::Single(Value::Double(0.0))];
        assert!(double_divide(&args).is_err());
    }
}
