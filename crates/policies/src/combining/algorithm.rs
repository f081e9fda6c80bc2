//! The eight combining algorithms required by `spec.md` §4.G, with their
//! bit-exact XACML 3.0 identifiers (`spec.md` §6).

use crate::combining::children::Children;
use crate::decision::{Decision, DecisionResult, IndeterminateCause, Status};

/// Whether a combining algorithm identifier names a rule-combining or a
/// policy-combining algorithm. `only-one-applicable` is policy-combining
/// only (`spec.md` §4.G); every other algorithm exists in both scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    RuleCombining,
    PolicyCombining,
}

/// The eight algorithms `spec.md` §4.G requires. Ordered and unordered
/// variants of deny/permit-overrides share one implementation here: per
/// `DESIGN.md`'s resolution of the "obligation ordering" open question,
/// children are always combined in the order supplied (document order),
/// which is simultaneously a correct *ordered* evaluation and a
/// deterministic, reproducible *unordered* one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombiningAlgorithm {
    DenyOverrides,
    PermitOverrides,
    OrderedDenyOverrides,
    OrderedPermitOverrides,
    FirstApplicable,
    OnlyOneApplicable,
    DenyUnlessPermit,
    PermitUnlessDeny,
}

/// The bit-exact XACML 3.0 combining-algorithm identifier URIs
/// (`spec.md` §6). `deny-overrides`/`permit-overrides` use the 3.0
/// namespace (the corrected, non-legacy truth table this engine
/// implements); `first-applicable` is unchanged since XACML 1.0.
pub mod algorithm_id {
    pub mod rule {
        pub const DENY_OVERRIDES: &str =
            "urn:oasis:names:tc:xacml:3.0:rule-combining-algorithm:deny-overrides";
        pub const PERMIT_OVERRIDES: &str =
            "urn:oasis:names:tc:xacml:3.0:rule-combining-algorithm:permit-overrides";
        pub const ORDERED_DENY_OVERRIDES: &str =
            "urn:oasis:names:tc:xacml:3.0:rule-combining-algorithm:ordered-deny-overrides";
        pub const ORDERED_PERMIT_OVERRIDES: &str =
            "urn:oasis:names:tc:xacml:3.0:rule-combining-algorithm:ordered-permit-overrides";
        pub const FIRST_APPLICABLE: &str =
            "urn:oasis:names:tc:xacml:1.0:rule-combining-algorithm:first-applicable";
        pub const DENY_UNLESS_PERMIT: &str =
            "urn:oasis:names:tc:xacml:3.0:rule-combining-algorithm:deny-unless-permit";
        pub const PERMIT_UNLESS_DENY: &str =
            "urn:oasis:names:tc:xacml:3.0:rule-combining-algorithm:permit-unless-deny";
    }

    pub mod policy {
        pub const DENY_OVERRIDES: &str =
            "urn:oasis:names:tc:xacml:3.0:policy-combining-algorithm:deny-overrides";
        pub const PERMIT_OVERRIDES: &str =
            "urn:oasis:names:tc:xacml:3.0:policy-combining-algorithm:permit-overrides";
        pub const ORDERED_DENY_OVERRIDES: &str =
            "urn:oasis:names:tc:xacml:3.0:policy-combining-algorithm:ordered-deny-overrides";
        pub const ORDERED_PERMIT_OVERRIDES: &str =
            "urn:oasis:names:tc:xacml:3.0:policy-combining-algorithm:ordered-permit-overrides";
        pub const FIRST_APPLICABLE: &str =
            "urn:oasis:names:tc:xacml:1.0:policy-combining-algorithm:first-applicable";
        pub const ONLY_ONE_APPLICABLE: &str =
            "urn:oasis:names:tc:xacml:1.0:policy-combining-algorithm:only-one-applicable";
        pub const DENY_UNLESS_PERMIT: &str =
            "urn:oasis:names:tc:xacml:3.0:policy-combining-algorithm:deny-unless-permit";
        pub const PERMIT_UNLESS_DENY: &str =
            "urn:oasis:names:tc:xacml:3.0:policy-combining-algorithm:permit-unless-deny";
    }
}

impl CombiningAlgorithm {
    /// Resolve an algorithm id in the given scope. `only-one-applicable`
    /// is rejected outside `Scope::PolicyCombining` (`spec.md` §4.G).
    pub fn from_id(id: &str, scope: Scope) -> Option<Self> {
        use algorithm_id::{policy, rule};
        let algorithm = match scope {
            Scope::RuleCombining => match id {
                x if x == rule::DENY_OVERRIDES => CombiningAlgorithm::DenyOverrides,
                x if x == rule::PERMIT_OVERRIDES => CombiningAlgorithm::PermitOverrides,
                x if x == rule::ORDERED_DENY_OVERRIDES => CombiningAlgorithm::OrderedDenyOverrides,
                x if x == rule::ORDERED_PERMIT_OVERRIDES => CombiningAlgorithm::OrderedPermitOverrides,
                x if x == rule::FIRST_APPLICABLE => CombiningAlgorithm::FirstApplicable,
                x if x == rule::DENY_UNLESS_PERMIT => CombiningAlgorithm::DenyUnlessPermit,
                x if x == rule::PERMIT_UNLESS_DENY => CombiningAlgorithm::PermitUnlessDeny,
                _ => return None,
            },
            Scope::PolicyCombining => match id {
                x if x == policy::DENY_OVERRIDES => CombiningAlgorithm::DenyOverrides,
                x if x == policy::PERMIT_OVERRIDES => CombiningAlgorithm::PermitOverrides,
                x if x == policy::ORDERED_DENY_OVERRIDES => CombiningAlgorithm::OrderedDenyOverrides,
                x if x == policy::ORDERED_PERMIT_OVERRIDES => CombiningAlgorithm::OrderedPermitOverrides,
                x if x == policy::FIRST_APPLICABLE => CombiningAlgorithm::FirstApplicable,
                x if x == policy::ONLY_ONE_APPLICABLE => CombiningAlgorithm::OnlyOneApplicable,
                x if x == policy::DENY_UNLESS_PERMIT => CombiningAlgorithm::DenyUnlessPermit,
                x if x == policy::PERMIT_UNLESS_DENY => CombiningAlgorithm::PermitUnlessDeny,
                _ => return None,
            },
        };
        Some(algorithm)
    }

    /// Reduce `children` to one decision, aggregating obligations/advice
    /// from whichever children's individual decision equals the final one
    /// (`spec.md` §4.G). The returned result never carries the combining
    /// node's *own* obligations/advice — the policy/policy-set evaluator
    /// (component H) prepends those once this returns.
    pub fn combine<Ctx>(self, children: &mut Children<Ctx>, ctx: &mut Ctx) -> DecisionResult {
        match self {
            CombiningAlgorithm::DenyOverrides | CombiningAlgorithm::OrderedDenyOverrides => {
                overrides(children, ctx, Decision::Deny)
            }
            CombiningAlgorithm::PermitOverrides | CombiningAlgorithm::OrderedPermitOverrides => {
                overrides(children, ctx, Decision::Permit)
            }
            CombiningAlgorithm::FirstApplicable => first_applicable(children, ctx),
            CombiningAlgorithm::OnlyOneApplicable => only_one_applicable(children, ctx),
            CombiningAlgorithm::DenyUnlessPermit => unless(children, ctx, Decision::Permit, Decision::Deny),
            CombiningAlgorithm::PermitUnlessDeny => unless(children, ctx, Decision::Deny, Decision::Permit),
        }
    }
}

/// `deny-overrides`/`permit-overrides` (and their ordered variants): the
/// `overriding` decision anywhere forces that decision; otherwise the
/// XACML 3.0 truth table over the flavoured `Indeterminate`s applies
/// (`spec.md` §4.G, §6 scenario 2).
fn overrides<Ctx>(children: &mut Children<Ctx>, ctx: &mut Ctx, overriding: Decision) -> DecisionResult {
    let overridden = match overriding {
        Decision::Deny => Decision::Permit,
        Decision::Permit => Decision::Deny,
        _ => unreachable!("overrides is only ever called with Permit or Deny"),
    };
    let overriding_cause = match overriding {
        Decision::Deny => IndeterminateCause::D,
        Decision::Permit => IndeterminateCause::P,
        _ => unreachable!(),
    };
    let overridden_cause = match overridden {
        Decision::Deny => IndeterminateCause::D,
        Decision::Permit => IndeterminateCause::P,
        _ => unreachable!(),
    };

    let results: Vec<DecisionResult> = (0..children.len()).map(|i| children.evaluate(ctx, i)).collect();

    let mut saw_overriding = false;
    let mut saw_overridden = false;
    let mut saw_overriding_indeterminate: Option<Status> = None;
    let mut saw_overridden_indeterminate: Option<Status> = None;
    let mut saw_dp_indeterminate: Option<Status> = None;

    for result in &results {
        match result.decision {
            d if d == overriding => saw_overriding = true,
            d if d == overridden => saw_overridden = true,
            Decision::Indeterminate(IndeterminateCause::DP) => {
                saw_dp_indeterminate.get_or_insert_with(|| result.status.clone());
            }
            Decision::Indeterminate(cause) if cause == overriding_cause => {
                saw_overriding_indeterminate.get_or_insert_with(|| result.status.clone());
            }
            Decision::Indeterminate(cause) if cause == overridden_cause => {
                saw_overridden_indeterminate.get_or_insert_with(|| result.status.clone());
            }
            Decision::Indeterminate(_) => unreachable!("every IndeterminateCause variant is covered above"),
            Decision::NotApplicable => {}
        }
    }

    let final_decision = if saw_overriding {
        overriding
    } else if saw_dp_indeterminate.is_some()
        || (saw_overriding_indeterminate.is_some() && (saw_overridden || saw_overridden_indeterminate.is_some()))
    {
        Decision::Indeterminate(IndeterminateCause::DP)
    } else if let Some(status) = saw_overriding_indeterminate {
        return finalize(Decision::Indeterminate(overriding_cause), status, &results);
    } else if saw_overridden {
        overridden
    } else if let Some(status) = saw_overridden_indeterminate {
        return finalize(Decision::Indeterminate(overridden_cause), status, &results);
    } else {
        Decision::NotApplicable
    };

    let status = match final_decision {
        Decision::Indeterminate(IndeterminateCause::DP) => {
            saw_dp_indeterminate.or(saw_overriding_indeterminate).unwrap_or_else(Status::ok)
        }
        _ => Status::ok(),
    };
    finalize(final_decision, status, &results)
}

/// `first-applicable`: the first child whose decision is not
/// `NotApplicable` wins outright, without evaluating later children
/// (`spec.md` §4.G).
fn first_applicable<Ctx>(children: &mut Children<Ctx>, ctx: &mut Ctx) -> DecisionResult {
    for i in 0..children.len() {
        let result = children.evaluate(ctx, i);
        if result.decision != Decision::NotApplicable {
            return result;
        }
    }
    DecisionResult::not_applicable()
}

/// `only-one-applicable`: a target-only applicability scan (cheap,
/// doesn't evaluate rule/policy bodies) decides whether zero, one, or
/// more than one child applies; only in the exactly-one case is that
/// child fully evaluated (`spec.md` §4.G, §8 scenario 3).
fn only_one_applicable<Ctx>(children: &mut Children<Ctx>, ctx: &mut Ctx) -> DecisionResult {
    use crate::target::MatchResult;

    let mut applicable_index = None;
    let mut applicable_count = 0usize;
    let mut indeterminate: Option<Status> = None;

    for i in 0..children.len() {
        match children.target_match(ctx, i) {
            MatchResult::Match => {
                applicable_count += 1;
                applicable_index = Some(i);
            }
            MatchResult::Indeterminate(status) => {
                applicable_count += 1;
                indeterminate.get_or_insert(status);
            }
            MatchResult::NoMatch => {}
        }
    }

    if applicable_count == 0 {
        return DecisionResult::not_applicable();
    }
    if applicable_count > 1 {
        return DecisionResult::indeterminate(
            IndeterminateCause::DP,
            Status::processing_error("Too many (more than one) applicable policies"),
        );
    }
    if let Some(status) = indeterminate {
        return DecisionResult::indeterminate(IndeterminateCause::DP, status);
    }
    children.evaluate(ctx, applicable_index.expect("applicable_count == 1 implies an index was recorded"))
}

/// `deny-unless-permit`/`permit-unless-deny`: never `NotApplicable` or
/// `Indeterminate`; any child reaching `winning` forces the overall
/// decision to `winning`, otherwise it is `otherwise` (`spec.md` §4.G).
fn unless<Ctx>(children: &mut Children<Ctx>, ctx: &mut Ctx, winning: Decision, otherwise: Decision) -> DecisionResult {
    let results: Vec<DecisionResult> = (0..children.len()).map(|i| children.evaluate(ctx, i)).collect();
    let final_decision = if results.iter().any(|r| r.decision == winning) { winning } else { otherwise };
    finalize(final_decision, Status::ok(), &results)
}

/// Aggregate obligations/advice from every evaluated child whose decision
/// equals `final_decision`, in evaluation order (`spec.md` §4.G, and the
/// document-order decision for the "unordered" open question).
fn finalize(final_decision: Decision, status: Status, results: &[DecisionResult]) -> DecisionResult {
    let mut obligations = Vec::new();
    let mut advice = Vec::new();
    for result in results {
        if result.decision == final_decision {
            obligations.extend(result.obligations.iter().cloned());
            advice.extend(result.advice.iter().cloned());
        }
    }
    DecisionResult { decision: final_decision, status, obligations, advice }
}
