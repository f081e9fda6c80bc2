//! `PolicySet` evaluation: target, policy-combining, reference
//! resolution, and self-reference cycle detection (`spec.md` §3, §4.H,
//! §9 design notes).

use std::collections::HashSet;

use crate::combining::{Children, CombiningAlgorithm};
use crate::context::AttributeContext;
use crate::decision::{Decision, DecisionResult, IndeterminateCause, ObligationExpression, Status};
use crate::expr::{EvalEnv, VariableScope};
use crate::functions::FunctionRegistry;
use crate::policy::policy::Policy;
use crate::policy::provider::{PolicyProvider, PolicyReference, RefType, ResolvedPolicy};
use crate::target::{MatchResult, Target};

/// One child of a `PolicySet`: an inline policy/policy-set, or a
/// reference resolved through a [`PolicyProvider`] at evaluation time
/// (`spec.md` §3).
#[derive(Debug, Clone)]
pub enum PolicySetChild {
    Policy(Policy),
    PolicySet(PolicySet),
    Reference(PolicyReference),
}

/// `(id, version, target, policy-combining-alg, children*, obligations*,
/// advice*)` (`spec.md` §3).
#[derive(Debug, Clone)]
pub struct PolicySet {
    pub id: String,
    pub version: String,
    pub target: Target,
    pub policy_combining_algorithm: CombiningAlgorithm,
    pub children: Vec<PolicySetChild>,
    pub obligations: Vec<ObligationExpression>,
    pub advice: Vec<ObligationExpression>,
}

/// Bundles what a `PolicySet`'s children need during combining: the
/// shared `AttributeContext`/`FunctionRegistry`, the reference resolver,
/// and the set of ids currently being evaluated on this call stack (used
/// to reject self-referential policy graphs, per `spec.md` §9 design
/// notes: "avoid cyclic ownership by disallowing self-references").
struct PolicySetEvalCtx<'a> {
    ctx: &'a mut AttributeContext,
    functions: &'a FunctionRegistry,
    resolver: &'a dyn PolicyProvider,
    in_progress: &'a mut HashSet<String>,
}

impl PolicySet {
    /// Evaluate this policy-set against `ctx`, per `spec.md` §4.H: match
    /// the target, then combine children via `policy_combining_algorithm`,
    /// then apply this policy-set's own obligations/advice.
    #[tracing::instrument(skip(self, ctx, functions, resolver), fields(policy_set_id = %self.id, version = %self.version))]
    pub fn evaluate(
        &self,
        ctx: &mut AttributeContext,
        functions: &FunctionRegistry,
        resolver: &dyn PolicyProvider,
    ) -> DecisionResult {
        let mut in_progress = HashSet::new();
        in_progress.insert(self.id.clone());
        self.evaluate_inner(ctx, functions, resolver, &mut in_progress)
    }

    fn evaluate_inner(
        &self,
        ctx: &mut AttributeContext,
        functions: &FunctionRegistry,
        resolver: &dyn PolicyProvider,
        in_progress: &mut HashSet<String>,
    ) -> DecisionResult {
        let mut vars = VariableScope::new();
        let mut env = EvalEnv { ctx, vars: &mut vars, functions };
        match self.target.evaluate(&mut env) {
            MatchResult::NoMatch => return DecisionResult::not_applicable(),
            MatchResult::Indeterminate(status) => {
                return DecisionResult::indeterminate(IndeterminateCause::DP, status)
            }
            MatchResult::Match => {}
        }
        env.ctx.record_matched_policy(&self.id);

        let mut eval_ctx = PolicySetEvalCtx { ctx: env.ctx, functions, resolver, in_progress };
        let own_children = &self.children;
        let mut children = Children::new(
            own_children.len(),
            |eval_ctx: &mut PolicySetEvalCtx, i| target_match_of(&own_children[i], eval_ctx),
            |eval_ctx: &mut PolicySetEvalCtx, i| evaluate_child(&own_children[i], eval_ctx),
        );
        let combined = self.policy_combining_algorithm.combine(&mut children, &mut eval_ctx);

        tracing::debug!(decision = ?combined.decision, "policy set evaluated");

        // Policy sets define no variables of their own (`spec.md` §3 scopes
        // variable definitions to `Policy`), so a fresh scope is sufficient
        // for evaluating this policy set's own obligation/advice
        // expressions.
        let mut own_vars = VariableScope::new();
        let mut own_env = EvalEnv { ctx: eval_ctx.ctx, vars: &mut own_vars, functions: eval_ctx.functions };

        let mut obligations =
            match DecisionResult::resolve_obligations(combined.decision, &self.obligations, &mut own_env) {
                Ok(obligations) => obligations,
                Err(status) => {
                    return DecisionResult::indeterminate(IndeterminateCause::for_decision(combined.decision), status)
                }
            };
        obligations.extend(combined.obligations);
        let mut advice = match DecisionResult::resolve_obligations(combined.decision, &self.advice, &mut own_env) {
            Ok(advice) => advice,
            Err(status) => {
                return DecisionResult::indeterminate(IndeterminateCause::for_decision(combined.decision), status)
            }
        };
        advice.extend(combined.advice);

        DecisionResult { decision: combined.decision, status: combined.status, obligations, advice }
    }
}

/// Resolve a reference to its concrete policy/policy-set, or `None` if
/// the provider has nothing for it.
fn resolve(reference: &PolicyReference, resolver: &dyn PolicyProvider) -> Option<ResolvedPolicy> {
    resolver.find_by_reference(&reference.id, &reference.version_constraint, reference.ref_type)
}

fn target_match_of(child: &PolicySetChild, eval_ctx: &mut PolicySetEvalCtx) -> MatchResult {
    let mut vars = VariableScope::new();
    match child {
        PolicySetChild::Policy(p) => {
            let mut env = EvalEnv { ctx: eval_ctx.ctx, vars: &mut vars, functions: eval_ctx.functions };
            p.target.evaluate(&mut env)
        }
        PolicySetChild::PolicySet(p) => {
            let mut env = EvalEnv { ctx: eval_ctx.ctx, vars: &mut vars, functions: eval_ctx.functions };
            p.target.evaluate(&mut env)
        }
        PolicySetChild::Reference(reference) => match resolve(reference, eval_ctx.resolver) {
            None => MatchResult::Indeterminate(Status::processing_error(format!(
                "policy reference {} could not be resolved",
                reference.id
            ))),
            Some(ResolvedPolicy::Policy(p)) => {
                let mut env = EvalEnv { ctx: eval_ctx.ctx, vars: &mut vars, functions: eval_ctx.functions };
                p.target.evaluate(&mut env)
            }
            Some(ResolvedPolicy::PolicySet(p)) => {
                let mut env = EvalEnv { ctx: eval_ctx.ctx, vars: &mut vars, functions: eval_ctx.functions };
                p.target.evaluate(&mut env)
            }
        },
    }
}

fn evaluate_child(child: &PolicySetChild, eval_ctx: &mut PolicySetEvalCtx) -> DecisionResult {
    match child {
        PolicySetChild::Policy(p) => p.evaluate(eval_ctx.ctx, eval_ctx.functions),
        PolicySetChild::PolicySet(p) => {
            if !eval_ctx.in_progress.insert(p.id.clone()) {
                return DecisionResult::indeterminate(
                    IndeterminateCause::DP,
                    Status::processing_error(format!("policy set {} references itself", p.id)),
                );
            }
            let result = p.evaluate_inner(eval_ctx.ctx, eval_ctx.functions, eval_ctx.resolver, eval_ctx.in_progress);
            eval_ctx.in_progress.remove(&p.id);
            result
        }
        PolicySetChild::Reference(reference) => match resolve(reference, eval_ctx.resolver) {
            None => DecisionResult::indeterminate(
                IndeterminateCause::DP,
                Status::processing_error(format!("policy reference {} could not be resolved", reference.id)),
            ),
            Some(ResolvedPolicy::Policy(p)) => {
                if !eval_ctx.in_progress.insert(p.id.clone()) {
                    return DecisionResult::indeterminate(
                        IndeterminateCause::DP,
                        Status::processing_error(format!("policy {} references itself", p.id)),
                    );
                }
                let result = p.evaluate(eval_ctx.ctx, eval_ctx.functions);
                eval_ctx.in_progress.remove(&p.id);
                result
            }
            Some(ResolvedPolicy::PolicySet(p)) => {
                if !eval_ctx.in_progress.insert(p.id.clone()) {
                    return DecisionResult::indeterminate(
                        IndeterminateCause::DP,
                        Status::processing_error(format!("policy set {} references itself", p.id)),
                    );
                }
                let result = p.evaluate_inner(eval_ctx.ctx, eval_ctx.functions, eval_ctx.resolver, eval_ctx.in_progress);
                eval_ctx.in_progress.remove(&p.id);
                result
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Clock;
    use crate::decision::{AttributeAssignmentExpression, FulfillOn};
    use crate::expr::Expression;
    use crate::policy::provider::{mocks::MockProvider, VersionConstraint};
    use crate::rule::{Effect, Rule};

    fn permit_policy(id: &str) -> Policy {
        Policy {
            id: id.to_string(),
            version: "1.0".into(),
            target: Target::default(),
            rule_combining_algorithm: CombiningAlgorithm::DenyOverrides,
            rules: vec![Rule {
                id: "r1".into(),
                effect: Effect::Permit,
                target: Target::default(),
                condition: None,
                obligations: vec![],
                advice: vec![],
            }],
            variable_definitions: vec![],
            obligations: vec![],
            advice: vec![],
            max_delegation_depth: None,
        }
    }

    fn no_op_provider() -> MockProvider {
        MockProvider::new()
    }

    #[test]
    fn combines_inline_policy_children() {
        let policy_set = PolicySet {
            id: "ps1".into(),
            version: "1.0".into(),
            target: Target::default(),
            policy_combining_algorithm: CombiningAlgorithm::DenyOverrides,
            children: vec![PolicySetChild::Policy(permit_policy("p1"))],
            obligations: vec![],
            advice: vec![],
        };
        let mut ctx = AttributeContext::new(vec![], vec![], Clock::wall_clock(), false);
        let functions = FunctionRegistry::standard();
        let provider = no_op_provider();
        let result = policy_set.evaluate(&mut ctx, &functions, &provider);
        assert_eq!(result.decision, Decision::Permit);
    }

    #[test]
    fn unresolvable_reference_is_processing_error() {
        let mut provider = MockProvider::new();
        provider.expect_find_by_reference().returning(|_, _, _| None);
        let policy_set = PolicySet {
            id: "ps1".into(),
            version: "1.0".into(),
            target: Target::default(),
            policy_combining_algorithm: CombiningAlgorithm::FirstApplicable,
            children: vec![PolicySetChild::Reference(PolicyReference {
                id: "missing".into(),
                version_constraint: VersionConstraint::any(),
                ref_type: RefType::Policy,
            })],
            obligations: vec![],
            advice: vec![],
        };
        let mut ctx = AttributeContext::new(vec![], vec![], Clock::wall_clock(), false);
        let functions = FunctionRegistry::standard();
        let result = policy_set.evaluate(&mut ctx, &functions, &provider);
        assert_eq!(result.decision, Decision::Indeterminate(IndeterminateCause::DP));
        assert_eq!(result.status.code, crate::decision::status_code::PROCESSING_ERROR);
    }

    #[test]
    fn self_referential_policy_set_is_indeterminate_not_infinite_loop() {
        let provider = no_op_provider();
        let policy_set = PolicySet {
            id: "ps1".into(),
            version: "1.0".into(),
            target: Target::default(),
            policy_combining_algorithm: CombiningAlgorithm::FirstApplicable,
            children: vec![PolicySetChild::PolicySet(PolicySet {
                id: "ps1".into(),
                version: "1.0".into(),
                target: Target::default(),
                policy_combining_algorithm: CombiningAlgorithm::FirstApplicable,
                children: vec![],
                obligations: vec![],
                advice: vec![],
            })],
            obligations: vec![],
            advice: vec![],
        };
        let mut ctx = AttributeContext::new(vec![], vec![], Clock::wall_clock(), false);
        let functions = FunctionRegistry::standard();
        let result = policy_set.evaluate(&mut ctx, &functions, &provider);
        assert_eq!(result.decision, Decision::Indeterminate(IndeterminateCause::DP));
    }

    #[test]
    fn indeterminate_own_attribute_assignment_expression_lifts_policy_set_decision() {
        let provider = no_op_provider();
        let policy_set = PolicySet {
            id: "ps1".into(),
            version: "1.0".into(),
            target: Target::default(),
            policy_combining_algorithm: CombiningAlgorithm::DenyOverrides,
            children: vec![PolicySetChild::Policy(permit_policy("p1"))],
            obligations: vec![ObligationExpression {
                id: "notify".into(),
                fulfill_on: FulfillOn::Permit,
                attribute_assignments: vec![AttributeAssignmentExpression {
                    attribute_id: "reason".into(),
                    category: None,
                    issuer: None,
                    expression: Expression::Designator(crate::expr::Designator {
                        category: "subject".into(),
                        attribute_id: "missing".into(),
                        datatype: crate::datatype::Datatype::String,
                        issuer: None,
                        must_be_present: true,
                    }),
                }],
            }],
            advice: vec![],
        };
        let mut ctx = AttributeContext::new(vec![], vec![], Clock::wall_clock(), false);
        let functions = FunctionRegistry::standard();
        let result = policy_set.evaluate(&mut ctx, &functions, &provider);
        assert_eq!(result.decision, Decision::Indeterminate(IndeterminateCause::P));
    }
}
