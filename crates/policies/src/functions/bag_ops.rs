//! `*-bag`, `*-is-in`, `*-bag-size`, `*-one-and-only`, one family per
//! primitive datatype (`spec.md` §4.D).

use num_bigint::BigInt;

use crate::datatype::{Bag, Datatype, Value};
use crate::decision::Status;
use crate::expr::EvalValue;

use super::{FunctionDef, FunctionKind};

fn bag_size(args: &[EvalValue], datatype: Datatype) -> Result<EvalValue, Status> {
    if args.len() != 1 {
        return Err(Status::processing_error("bag-size takes exactly one argument"));
    }
    let bag = args[0].as_bag()?;
    if bag.datatype() != datatype {
        return Err(Status::processing_error(format!("expected a bag of {datatype}")));
    }
    Ok(EvalValue::Single(Value::Integer(BigInt::from(bag.len()))))
}

fn is_in(args: &[EvalValue], datatype: Datatype) -> Result<EvalValue, Status> {
    if args.len() != 2 {
        return Err(Status::processing_error("is-in takes exactly two arguments"));
    }
    let value = args[0].as_single()?;
    let bag = args[1].as_bag()?;
    if value.datatype() != datatype || bag.datatype() != datatype {
        return Err(Status::processing_error(format!("expected a {datatype} value and bag")));
    }
    Ok(EvalValue::Single(Value::Boolean(bag.contains(value))))
}

fn make_bag(args: &[EvalValue], datatype: Datatype) -> Result<EvalValue, Status> {
    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        let v = arg.as_single()?;
        if v.datatype() != datatype {
            return Err(Status::processing_error(format!("expected all arguments to be {datatype}")));
        }
        values.push(v.clone());
    }
    Ok(EvalValue::Bag(Bag::new(datatype, values).expect("datatype already checked above")))
}

fn one_and_only(args: &[EvalValue], datatype: Datatype) -> Result<EvalValue, Status> {
    if args.len() != 1 {
        return Err(Status::processing_error("one-and-only takes exactly one argument"));
    }
    let bag = args[0].as_bag()?;
    if bag.datatype() != datatype {
        return Err(Status::processing_error(format!("expected a bag of {datatype}")));
    }
    bag.one_and_only()
        .cloned()
        .map(EvalValue::Single)
        .ok_or_else(|| Status::processing_error("bag does not contain exactly one value"))
}

macro_rules! bag_family {
    ($datatype:expr, $size:ident, $is_in:ident, $bag:ident, $one:ident) => {
        fn $size(args: &[EvalValue]) -> Result<EvalValue, Status> {
            bag_size(args, $datatype)
        }
        fn $is_in(args: &[EvalValue]) -> Result<EvalValue, Status> {
            is_in(args, $datatype)
        }
        fn $bag(args: &[EvalValue]) -> Result<EvalValue, Status> {
            make_bag(args, $datatype)
        }
        fn $one(args: &[EvalValue]) -> Result<EvalValue, Status> {
            one_and_only(args, $datatype)
        }
    };
}

bag_family!(Datatype::String, string_bag_size, string_is_in, string_bag, string_one_and_only);
bag_family!(Datatype::Boolean, boolean_bag_size, boolean_is_in, boolean_bag, boolean_one_and_only);
bag_family!(Datatype::Integer, integer_bag_size, integer_is_in, integer_bag, integer_one_and_only);
bag_family!(Datatype::Double, double_bag_size, double_is_in, double_bag, double_one_and_only);
bag_family!(Datatype::Date, date_bag_size, date_is_in, date_bag, date_one_and_only);
bag_family!(Datatype::Time, time_bag_size, time_is_in, time_bag, time_one_and_only);
bag_family!(Datatype::DateTime, date_time_bag_size, date_time_is_in, date_time_bag, date_time_one_and_only);
bag_family!(Datatype::AnyUri, any_uri_bag_size, any_uri_is_in, any_uri_bag, any_uri_one_and_only);
bag_family!(
    Datatype::HexBinary,
    hex_binary_bag_size,
    hex_binary_is_in,
    hex_binary_bag,
    hex_binary_one_and_only
);
bag_family!(
    Datatype::Base64Binary,
    base64_binary_bag_size,
    base64_binary_is_in,
    base64_binary_bag,
    base64_binary_one_and_only
);
bag_family!(
    Datatype::DayTimeDuration,
    day_time_duration_bag_size,
    day_time_duration_is_in,
    day_time_duration_bag,
    day_time_duration_one_and_only
);
bag_family!(
    Datatype::YearMonthDuration,
    year_month_duration_bag_size,
    year_month_duration_is_in,
    year_month_duration_bag,
    year_month_duration_one_and_only
);
bag_family!(
    Datatype::Rfc822Name,
    rfc822_name_bag_size,
    rfc822_name_is_in,
    rfc822_name_bag,
    rfc822_name_one_and_only
);
bag_family!(Datatype::X500Name, x500_name_bag_size, x500_name_is_in, x500_name_bag, x500_name_one_and_only);
bag_family!(
    Datatype::IpAddress,
    ip_address_bag_size,
    ip_address_is_in,
    ip_address_bag,
    ip_address_one_and_only
);
bag_family!(Datatype::DnsName, dns_name_bag_size, dns_name_is_in, dns_name_bag, dns_name_one_and_only);

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
        def!("string-bag-size", string_bag_size),
        def!("string-is-in", string_is_in),
        def!("string-bag", string_bag),
        def!("string-one-and-only", string_one_and_only),
        def!("boolean-bag-size", boolean_bag_size),
        def!("boolean-is-in", boolean_is_in),
        def!("boolean-bag", boolean_bag),
        def!("boolean-one-and-only", boolean_one_and_only),
        def!("integer-bag-size", integer_bag_size),
        def!("integer-is-in", integer_is_in),
        def!("integer-bag", integer_bag),
        def!("integer-one-and-only", integer_one_and_only),
        def!("double-bag-size", double_bag_size),
        def!("double-is-in", double_is_in),
        def!("double-bag", double_bag),
        def!("double-one-and-only", double_one_and_only),
        def!("date-bag-size", date_bag_size),
        def!("date-is-in", date_is_in),
        def!("date-bag", date_bag),
        def!("date-one-and-only", date_one_and_only),
        def!("time-bag-size", time_bag_size),
        def!("time-is-in", time_is_in),
        def!("time-bag", time_bag),
        def!("time-one-and-only", time_one_and_only),
        def!("dateTime-bag-size", date_time_bag_size),
        def!("dateTime-is-in", date_time_is_in),
        def!("dateTime-bag", date_time_bag),
        def!("dateTime-one-and-only", date_time_one_and_only),
        def!("anyURI-bag-size", any_uri_bag_size),
        def!("anyURI-is-in", any_uri_is_in),
        def!("anyURI-bag", any_uri_bag),
        def!("anyURI-one-and-only", any_uri_one_and_only),
        def!("hexBinary-bag-size", hex_binary_bag_size),
        def!("hexBinary-is-in", hex_binary_is_in),
        def!("hexBinary-bag", hex_binary_bag),
        def!("hexBinary-one-and-only", hex_binary_one_and_only),
        def!("base64Binary-bag-size", base64_binary_bag_size),
        def!("base64Binary-is-in", base64_binary_is_in),
        def!("base64Binary-bag", base64_binary_bag),
        def!("base64Binary-one-and-only", base64_binary_one_and_only),
        def!("dayTimeDuration-bag-size", day_time_duration_bag_size),
        def!("dayTimeDuration-is-in", day_time_duration_is_in),
        def!("dayTimeDuration-bag", day_time_duration_bag),
        def!("dayTimeDuration-one-and-only", day_time_duration_one_and_only),
        def!("yearMonthDuration-bag-size", year_month_duration_bag_size),
        def!("yearMonthDuration-is-in", year_month_duration_is_in),
        def!("yearMonthDuration-bag", year_month_duration_bag),
        def!("yearMonthDuration-one-and-only", year_month_duration_one_and_only),
        def!("rfc822Name-bag-size", rfc822_name_bag_size),
        def!("rfc822Name-is-in", rfc822_name_is_in),
        def!("rfc822Name-bag", rfc822_name_bag),
        def!("rfc822Name-one-and-only", rfc822_name_one_and_only),
        def!("x500Name-bag-size", x500_name_bag_size),
        def!("x500Name-is-in", x500_name_is_in),
        def!("x500Name-bag", x500_name_bag),
        def!("x500Name-one-and-only", x500_name_one_and_only),
        def!("ipAddress-bag-size", ip_address_bag_size),
        def!("ipAddress-is-in", ip_address_is_in),
        def!("ipAddress-bag", ip_address_bag),
        def!("ipAddress-one-and-only", ip_address_one_and_only),
        def!("dnsName-bag-size", dns_name_bag_size),
        def!("dnsName-is-in", dns_name_is_in),
        def!("dnsName-bag", dns_name_bag),
        def!("dnsName-one-and-only", dns_name_one_and_only),
    ]
}
