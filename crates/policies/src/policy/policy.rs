//! `Policy` evaluation: target, rule-combining, policy-level obligations
//! (`spec.md` §3, §4.H).

use crate::combining::{Children, CombiningAlgorithm};
use crate::context::AttributeContext;
use crate::decision::{Decision, DecisionResult, IndeterminateCause, ObligationExpression};
use crate::expr::{EvalEnv, VariableDefinition, VariableScope};
use crate::functions::FunctionRegistry;
use crate::rule::Rule;
use crate::target::{MatchResult, Target};

/// `(id, version, target, rule-combining-alg, rules*, variable-defs*,
/// obligations*, advice*, max-delegation-depth?)` (`spec.md` §3).
#[derive(Debug, Clone)]
pub struct Policy {
    pub id: String,
    pub version: String,
    pub target: Target,
    pub rule_combining_algorithm: CombiningAlgorithm,
    pub rules: Vec<Rule>,
    pub variable_definitions: Vec<VariableDefinition>,
    pub obligations: Vec<ObligationExpression>,
    pub advice: Vec<ObligationExpression>,
    pub max_delegation_depth: Option<u32>,
}

impl Policy {
    /// Evaluate this policy against `ctx`, per `spec.md` §4.H:
    ///
    /// 1. match the target (mirrors rule target semantics; an
    ///    Indeterminate target yields `Indeterminate{DP}`, since at the
    ///    policy level no single rule `Effect` is yet known).
    /// 2. instantiate a fresh per-policy `VariableScope`.
    /// 3. combine child rules via `rule_combining_algorithm`.
    /// 4. apply this policy's own obligations/advice on top of the
    ///    combined result.
    #[tracing::instrument(skip(self, ctx, functions), fields(policy_id = %self.id, version = %self.version))]
    pub fn evaluate(&self, ctx: &mut AttributeContext, functions: &FunctionRegistry) -> DecisionResult {
        let mut vars = VariableScope::from_definitions(self.variable_definitions.iter().cloned());
        let mut env = EvalEnv { ctx, vars: &mut vars, functions };

        match self.target.evaluate(&mut env) {
            MatchResult::NoMatch => return DecisionResult::not_applicable(),
            MatchResult::Indeterminate(status) => {
                return DecisionResult::indeterminate(IndeterminateCause::DP, status)
            }
            MatchResult::Match => {}
        }
        env.ctx.record_matched_policy(&self.id);

        let rules = &self.rules;
        let mut children = Children::new(
            rules.len(),
            |env: &mut EvalEnv, i| rules[i].target.evaluate(env),
            |env: &mut EvalEnv, i| rules[i].evaluate(env),
        );
        let combined = self.rule_combining_algorithm.combine(&mut children, &mut env);

        tracing::debug!(decision = ?combined.decision, "policy evaluated");
        let mut obligations = match DecisionResult::resolve_obligations(combined.decision, &self.obligations, &mut env)
        {
            Ok(obligations) => obligations,
            Err(status) => {
                return DecisionResult::indeterminate(IndeterminateCause::for_decision(combined.decision), status)
            }
        };
        obligations.extend(combined.obligations);
        let mut advice = match DecisionResult::resolve_obligations(combined.decision, &self.advice, &mut env) {
            Ok(advice) => advice,
            Err(status) => {
                return DecisionResult::indeterminate(IndeterminateCause::for_decision(combined.decision), status)
            }
        };
        advice.extend(combined.advice);

        DecisionResult { decision: combined.decision, status: combined.status, obligations, advice }
    }
}
