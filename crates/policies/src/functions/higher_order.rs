//! Higher-order bag functions: `any-of`, `all-of`, `any-of-any`,
//! `all-of-any`, `any-of-all`, `all-of-all`, `map` (`spec.md` §4.D).
//!
//! These have no [`super::StandardFn`] body — the evaluator
//! (`crate::expr::expression::eval_higher_order`) looks up the function
//! reference passed as the first argument and applies it itself, the same
//! way it special-cases `and`/`or`/`n-of`.

use super::{FunctionDef, FunctionKind, HigherOrderKind};

pub fn functions() -> Vec<FunctionDef> {
    macro_rules! def {
        ($suffix:literal, $kind:expr) => {
            FunctionDef {
                id: concat!("urn:oasis:names:tc:xacml:1.0:function:", $suffix),
                kind: FunctionKind::HigherOrder($kind),
            }
        };
    }
    vec![
        def!("any-of", HigherOrderKind::AnyOf),
        def!("all-of", HigherOrderKind::AllOf),
        def!("any-of-any", HigherOrderKind::AnyOfAny),
        def!("all-of-any", HigherOrderKind::AllOfAny),
        def!("any-of-all", HigherOrderKind::AnyOfAll),
        def!("all-of-all", HigherOrderKind::AllOfAll),
        def!("map", HigherOrderKind::Map),
    ]
}
