//! `urn:oasis:names:tc:xacml:1.0:function:*-equal` (`spec.md` §4.D).

use crate::datatype::{Datatype, Value};
use crate::decision::Status;
use crate::expr::EvalValue;

use super::{FunctionDef, FunctionKind};

fn require_pair(args: &[EvalValue], datatype: Datatype) -> Result<(&Value, &Value), Status> {
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
    Ok((a, b))
}

macro_rules! equal_fn {
    ($name:ident, $datatype:expr) => {
        fn $name(args: &[EvalValue]) -> Result<EvalValue, Status> {
            let (a, b) = require_pair(args, $datatype)?;
            Ok(EvalValue::Single(Value::Boolean(a == b)))
        }
    };
}

equal_fn!(string_equal, Datatype::String);
equal_fn!(boolean_equal, Datatype::Boolean);
equal_fn!(integer_equal, Datatype::Integer);
equal_fn!(double_equal, Datatype::Double);
equal_fn!(date_equal, Datatype::Date);
equal_fn!(time_equal, Datatype::Time);
equal_fn!(date_time_equal, Datatype::DateTime);
equal_fn!(day_time_duration_equal, Datatype::DayTimeDuration);
equal_fn!(year_month_duration_equal, Datatype::YearMonthDuration);
equal_fn!(any_uri_equal, Datatype::AnyUri);
equal_fn!(x500_name_equal, Datatype::X500Name);
equal_fn!(rfc822_name_equal, Datatype::Rfc822Name);
equal_fn!(hex_binary_equal, Datatype::HexBinary);
equal_fn!(base64_binary_equal, Datatype::Base64Binary);

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
        def!("string-equal", string_equal),
        def!("boolean-equal", boolean_equal),
        def!("integer-equal", integer_equal),
        def!("double-equal", double_equal),
        def!("date-equal", date_equal),
        def!("time-equal", time_equal),
        def!("dateTime-equal", date_time_equal),
        def!("dayTimeDuration-equal", day_time_duration_equal),
        def!("yearMonthDuration-equal", year_month_duration_equal),
        def!("anyURI-equal", any_uri_equal),
        def!("x500Name-equal", x500_name_equal),
        def!("rfc822Name-equal", rfc822_name_equal),
        def!("hexBinary-equal", hex_binary_equal),
        def!("base64Binary-equal", base64_binary_equal),
    ]
}
