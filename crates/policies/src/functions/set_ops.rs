//! `*-union`, `*-subset`, `*-set-equals`, `*-at-least-one-member-of`, one
//! family per primitive datatype (`spec.md` §4.D).

use crate::datatype::{Bag, Datatype, Value};
use crate::decision::Status;
use crate::expr::EvalValue;

use super::{FunctionDef, FunctionKind};

fn two_bags(args: &[EvalValue], datatype: Datatype) -> Result<(&Bag, &Bag), Status> {
    if args.len() != 2 {
        return Err(Status::processing_error("expected exactly two bag arguments"));
    }
    let a = args[0].as_bag()?;
    let b = args[1].as_bag()?;
    if a.datatype() != datatype || b.datatype() != datatype {
        return Err(Status::processing_error(format!("expected two bags of {datatype}")));
    }
    Ok((a, b))
}

fn union(args: &[EvalValue], datatype: Datatype) -> Result<EvalValue, Status> {
    let (a, b) = two_bags(args, datatype)?;
    Ok(EvalValue::Bag(a.union(b).expect("datatypes already checked")))
}

fn intersection(args: &[EvalValue], datatype: Datatype) -> Result<EvalValue, Status> {
    let (a, b) = two_bags(args, datatype)?;
    Ok(EvalValue::Bag(a.intersection(b).expect("datatypes already checked")))
}

fn at_least_one_member_of(args: &[EvalValue], datatype: Datatype) -> Result<EvalValue, Status> {
    let (a, b) = two_bags(args, datatype)?;
    let intersects = a.intersection(b).expect("datatypes already checked").len() > 0;
    Ok(EvalValue::Single(Value::Boolean(intersects)))
}

fn subset(args: &[EvalValue], datatype: Datatype) -> Result<EvalValue, Status> {
    let (a, b) = two_bags(args, datatype)?;
    Ok(EvalValue::Single(Value::Boolean(a.is_subset(b).expect("datatypes already checked"))))
}

fn set_equals(args: &[EvalValue], datatype: Datatype) -> Result<EvalValue, Status> {
    let (a, b) = two_bags(args, datatype)?;
    Ok(EvalValue::Single(Value::Boolean(a.set_equals(b).expect("datatypes already checked"))))
}

macro_rules! set_family {
    ($datatype:expr, $union:ident, $intersection:ident, $at_least_one:ident, $subset:ident, $set_equals:ident) => {
        fn $union(args: &[EvalValue]) -> Result<EvalValue, Status> {
            union(args, $datatype)
        }
        fn $intersection(args: &[EvalValue]) -> Result<EvalValue, Status> {
            intersection(args, $datatype)
        }
        fn $at_least_one(args: &[EvalValue]) -> Result<EvalValue, Status> {
            at_least_one_member_of(args, $datatype)
        }
        fn $subset(args: &[EvalValue]) -> Result<EvalValue, Status> {
            subset(args, $datatype)
        }
        fn $set_equals(args: &[EvalValue]) -> Result<EvalValue, Status> {
            set_equals(args, $datatype)
        }
    };
}

set_family!(
    Datatype::String,
    string_union,
    string_intersection,
    string_at_least_one_member_of,
    string_subset,
    string_set_equals
);
set_family!(
    Datatype::Integer,
    integer_union,
    integer_intersection,
    integer_at_least_one_member_of,
    integer_subset,
    integer_set_equals
);
set_family!(
    Datatype::Double,
    double_union,
    double_intersection,
    double_at_least_one_member_of,
    double_subset,
    double_set_equals
);
set_family!(
    Datatype::AnyUri,
    any_uri_union,
    any_uri_intersection,
    any_uri_at_least_one_member_of,
    any_uri_subset,
    any_uri_set_equals
);
set_family!(
    Datatype::Boolean,
    boolean_union,
    boolean_intersection,
    boolean_at_least_one_member_of,
    boolean_subset,
    boolean_set_equals
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
        def!("string-union", string_union),
        def!("string-intersection", string_intersection),
        def!("string-at-least-one-member-of", string_at_least_one_member_of),
        def!("string-subset", string_subset),
        def!("string-set-equals", string_set_equals),
        def!("integer-union", integer_union),
        def!("integer-intersection", integer_intersection),
        def!("integer-at-least-one-member-of", integer_at_least_one_member_of),
        def!("integer-subset", integer_subset),
        def!("integer-set-equals", integer_set_equals),
        def!("double-union", double_union),
        def!("double-intersection", double_intersection),
        def!("double-at-least-one-member-of", double_at_least_one_member_of),
        def!("double-subset", double_subset),
        def!("double-set-equals", double_set_equals),
        def!("anyURI-union", any_uri_union),
        def!("anyURI-intersection", any_uri_intersection),
        def!("anyURI-at-least-one-member-of", any_uri_at_least_one_member_of),
        def!("anyURI-subset", any_uri_subset),
        def!("anyURI-set-equals", any_uri_set_equals),
        def!("boolean-union", boolean_union),
        def!("boolean-intersection", boolean_intersection),
        def!("boolean-at-least-one-member-of", boolean_at_least_one_member_of),
        def!("boolean-subset", boolean_subset),
        def!("boolean-set-equals", boolean_set_equals),
    ]
}
