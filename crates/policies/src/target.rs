//! `Target`/`AnyOf`/`AllOf`/`Match` short-circuit matching (component E,
//! `spec.md` §4.E).
//!
//! A `Target` is a conjunction of `AnyOf`; an `AnyOf` is a disjunction of
//! `AllOf`; an `AllOf` is a conjunction of `Match`. Each level short-circuits
//! on the first result that already decides it, but remembers an
//! `Indeterminate` it passes over so it can surface one if nothing else
//! settles the question.

use crate::decision::Status;
use crate::expr::{Designator, EvalEnv, EvalValue, Expression, Selector};
use crate::functions::FunctionKind;

/// The tri-state (plus error) outcome of matching a `Target`/`AnyOf`/
/// `AllOf`/`Match` against the context (`spec.md` §4.E).
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    Match,
    NoMatch,
    Indeterminate(Status),
}

/// Which side of a `Match` the designator/selector occupies (`spec.md` §3).
#[derive(Debug, Clone)]
pub enum MatchAttribute {
    Designator(Designator),
    Selector(Selector),
}

/// `(function, attributeValue, designator-or-selector)` (`spec.md` §3).
/// True iff at least one bag element, combined with `value` via
/// `function_id`, yields boolean `true`.
#[derive(Debug, Clone)]
pub struct Match {
    pub function_id: String,
    pub value: crate::datatype::Value,
    pub attribute: MatchAttribute,
}

impl Match {
    pub fn evaluate(&self, env: &mut EvalEnv) -> MatchResult {
        let bag = match &self.attribute {
            MatchAttribute::Designator(d) => Expression::Designator(d.clone()).eval(env),
            MatchAttribute::Selector(s) => Expression::Selector(s.clone()).eval(env),
        };
        let bag = match bag.and_then(|v| v.into_bag()) {
            Ok(bag) => bag,
            Err(status) => return MatchResult::Indeterminate(status),
        };

        let predicate = match env.functions.lookup(&self.function_id).map(|def| &def.kind) {
            Some(FunctionKind::Standard(f)) => *f,
            Some(_) => {
                return MatchResult::Indeterminate(Status::processing_error(format!(
                    "{} cannot be used as a Match function",
                    self.function_id
                )))
            }
            None => {
                return MatchResult::Indeterminate(Status::processing_error(format!(
                    "unknown function {}",
                    self.function_id
                )))
            }
        };

        for member in bag.values() {
            let args = [EvalValue::Single(self.value.clone()), EvalValue::Single(member.clone())];
            match predicate(&args).and_then(|v| v.truthy()) {
                Ok(true) => return MatchResult::Match,
                Ok(false) => {}
                Err(status) => return MatchResult::Indeterminate(status),
            }
        }
        MatchResult::NoMatch
    }
}

/// A conjunction of [`Match`] (`spec.md` §3, §4.E).
#[derive(Debug, Clone, Default)]
pub struct AllOf {
    pub matches: Vec<Match>,
}

impl AllOf {
    pub fn evaluate(&self, env: &mut EvalEnv) -> MatchResult {
        let mut indeterminate = None;
        for m in &self.matches {
            match m.evaluate(env) {
                MatchResult::NoMatch => return MatchResult::NoMatch,
                MatchResult::Indeterminate(status) => {
                    indeterminate.get_or_insert(status);
                }
                MatchResult::Match => {}
            }
        }
        match indeterminate {
            Some(status) => MatchResult::Indeterminate(status),
            None => MatchResult::Match,
        }
    }
}

/// A disjunction of [`AllOf`] (`spec.md` §3, §4.E).
#[derive(Debug, Clone, Default)]
pub struct AnyOf {
    pub all_of: Vec<AllOf>,
}

impl AnyOf {
    pub fn evaluate(&self, env: &mut EvalEnv) -> MatchResult {
        let mut indeterminate = None;
        for all_of in &self.all_of {
            match all_of.evaluate(env) {
                MatchResult::Match => return MatchResult::Match,
                MatchResult::Indeterminate(status) => {
                    indeterminate.get_or_insert(status);
                }
                MatchResult::NoMatch => {}
            }
        }
        match indeterminate {
            Some(status) => MatchResult::Indeterminate(status),
            None => MatchResult::NoMatch,
        }
    }
}

/// A conjunction of [`AnyOf`]; an empty `Target` matches anything
/// (`spec.md` §3, §4.E).
#[derive(Debug, Clone, Default)]
pub struct Target {
    pub any_of: Vec<AnyOf>,
}

impl Target {
    pub fn evaluate(&self, env: &mut EvalEnv) -> MatchResult {
        let mut indeterminate = None;
        for any_of in &self.any_of {
            match any_of.evaluate(env) {
                MatchResult::NoMatch => return MatchResult::NoMatch,
                MatchResult::Indeterminate(status) => {
                    indeterminate.get_or_insert(status);
                }
                MatchResult::Match => {}
            }
        }
        match indeterminate {
            Some(status) => MatchResult::Indeterminate(status),
            None => MatchResult::Match,
        }
    }
}
