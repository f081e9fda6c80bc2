//! A combining algorithm's view of its children: lazily computable target
//! matches and full evaluations, so algorithms that don't need every
//! child's body (`first-applicable`, `only-one-applicable`) don't pay for
//! it (`spec.md` §4.G, §5).

use crate::decision::DecisionResult;
use crate::target::MatchResult;

/// Bundles the two operations a combining algorithm may need per child: a
/// cheap target-only applicability check, and the full evaluation (target
/// + condition/body + nested combining).
///
/// Generic over `Ctx` — `Policy` uses this with an `EvalEnv` (rules share
/// one per-policy `VariableScope`); `PolicySet` uses it with its own
/// evaluation context (children may be references resolved through a
/// `PolicyProvider`). The evaluation context is threaded through each
/// call rather than captured by the closures, so the same `&mut Ctx` can
/// back both the `target_match` and `evaluate` closures without two
/// simultaneous exclusive borrows.
pub struct Children<'a, Ctx> {
    len: usize,
    target_match: Box<dyn FnMut(&mut Ctx, usize) -> MatchResult + 'a>,
    evaluate: Box<dyn FnMut(&mut Ctx, usize) -> DecisionResult + 'a>,
}

impl<'a, Ctx> Children<'a, Ctx> {
    pub fn new(
        len: usize,
        target_match: impl FnMut(&mut Ctx, usize) -> MatchResult + 'a,
        evaluate: impl FnMut(&mut Ctx, usize) -> DecisionResult + 'a,
    ) -> Self {
        Children { len, target_match: Box::new(target_match), evaluate: Box::new(evaluate) }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn target_match(&mut self, ctx: &mut Ctx, index: usize) -> MatchResult {
        (self.target_match)(ctx, index)
    }

    pub fn evaluate(&mut self, ctx: &mut Ctx, index: usize) -> DecisionResult {
        (self.evaluate)(ctx, index)
    }
}
