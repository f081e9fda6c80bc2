//! Rule evaluation: target, then condition, then effect (component F,
//! `spec.md` §4.F).

use crate::decision::{Decision, DecisionResult, IndeterminateCause, ObligationExpression, Status};
use crate::expr::{EvalEnv, Expression};
use crate::target::{MatchResult, Target};

/// The effect a fully-matching, fully-satisfied rule emits (`spec.md` §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Permit,
    Deny,
}

impl Effect {
    pub fn as_decision(self) -> Decision {
        match self {
            Effect::Permit => Decision::Permit,
            Effect::Deny => Decision::Deny,
        }
    }

    /// The flavoured `Indeterminate` a rule of this effect yields when its
    /// target or condition fails to resolve (`spec.md` §4.F): a `Deny`
    /// rule can never have produced `Permit`, so its failure is
    /// `Indeterminate{D}`, never `Indeterminate{P}` or `{DP}`.
    pub fn indeterminate_cause(self) -> IndeterminateCause {
        match self {
            Effect::Permit => IndeterminateCause::P,
            Effect::Deny => IndeterminateCause::D,
        }
    }
}

/// `(id, effect, target?, condition?, obligations*, advice*)` (`spec.md` §3).
#[derive(Debug, Clone)]
pub struct Rule {
    pub id: String,
    pub effect: Effect,
    pub target: Target,
    pub condition: Option<Expression>,
    pub obligations: Vec<ObligationExpression>,
    pub advice: Vec<ObligationExpression>,
}

impl Rule {
    /// Evaluate this rule against the current context per `spec.md` §4.F:
    ///
    /// 1. target `NoMatch` → `NotApplicable`; `Indeterminate` → flavoured
    ///    `Indeterminate{Effect}`.
    /// 2. condition `false` (or absent, treated as `true`) → continue/
    ///    `NotApplicable`; `Indeterminate` → flavoured `Indeterminate`.
    /// 3. otherwise: `Effect`, with obligations/advice whose `fulfill_on`
    ///    matches that effect.
    #[tracing::instrument(skip(self, env), fields(rule_id = %self.id))]
    pub fn evaluate(&self, env: &mut EvalEnv) -> DecisionResult {
        match self.target.evaluate(env) {
            MatchResult::NoMatch => return DecisionResult::not_applicable(),
            MatchResult::Indeterminate(status) => {
                return DecisionResult::indeterminate(self.effect.indeterminate_cause(), status)
            }
            MatchResult::Match => {}
        }

        match &self.condition {
            None => {}
            Some(condition) => match condition.eval(env).and_then(|v| v.truthy()) {
                Ok(true) => {}
                Ok(false) => return DecisionResult::not_applicable(),
                Err(status) => {
                    return DecisionResult::indeterminate(self.effect.indeterminate_cause(), status)
                }
            },
        }

        let decision = self.effect.as_decision();
        let obligations = match DecisionResult::resolve_obligations(decision, &self.obligations, env) {
            Ok(obligations) => obligations,
            Err(status) => return DecisionResult::indeterminate(self.effect.indeterminate_cause(), status),
        };
        let advice = match DecisionResult::resolve_obligations(decision, &self.advice, env) {
            Ok(advice) => advice,
            Err(status) => return DecisionResult::indeterminate(self.effect.indeterminate_cause(), status),
        };

        tracing::debug!(decision = ?decision, "rule matched");
        DecisionResult { decision, status: Status::ok(), obligations, advice }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{category, AttributeContext, Clock};
    use crate::datatype::Value;
    use crate::decision::FulfillOn;
    use crate::expr::VariableScope;
    use crate::functions::FunctionRegistry;
    use crate::target::{AllOf, AnyOf, Match, MatchAttribute};

    fn env_parts() -> (AttributeContext, VariableScope, FunctionRegistry) {
        (AttributeContext::new(vec![], vec![], Clock::wall_clock(), false), VariableScope::new(), FunctionRegistry::standard())
    }

    #[test]
    fn permit_leaf_with_empty_target_and_no_condition() {
        let (mut ctx, mut vars, functions) = env_parts();
        let mut env = EvalEnv { ctx: &mut ctx, vars: &mut vars, functions: &functions };
        let rule = Rule {
            id: "r1".into(),
            effect: Effect::Permit,
            target: Target::default(),
            condition: None,
            obligations: vec![],
            advice: vec![],
        };
        let result = rule.evaluate(&mut env);
        assert_eq!(result.decision, Decision::Permit);
        assert!(result.obligations.is_empty());
    }

    #[test]
    fn false_condition_is_not_applicable() {
        let (mut ctx, mut vars, functions) = env_parts();
        let mut env = EvalEnv { ctx: &mut ctx, vars: &mut vars, functions: &functions };
        let rule = Rule {
            id: "r1".into(),
            effect: Effect::Permit,
            target: Target::default(),
            condition: Some(Expression::Literal(Value::Boolean(false))),
            obligations: vec![],
            advice: vec![],
        };
        assert_eq!(rule.evaluate(&mut env).decision, Decision::NotApplicable);
    }

    #[test]
    fn no_match_target_is_not_applicable() {
        let (mut ctx, mut vars, functions) = env_parts();
        let mut env = EvalEnv { ctx: &mut ctx, vars: &mut vars, functions: &functions };
        let target = Target {
            any_of: vec![AnyOf {
                all_of: vec![AllOf {
                    matches: vec![Match {
                        function_id: "urn:oasis:names:tc:xacml:1.0:function:string-equal".into(),
                        value: Value::String("admin".into()),
                        attribute: MatchAttribute::Designator(crate::expr::Designator {
                            category: category::SUBJECT.to_string(),
                            attribute_id: "role".to_string(),
                            datatype: crate::datatype::Datatype::String,
                            issuer: None,
                            must_be_present: false,
                        }),
                    }],
                }],
            }],
        };
        let rule = Rule {
            id: "r1".into(),
            effect: Effect::Permit,
            target,
            condition: None,
            obligations: vec![],
            advice: vec![],
        };
        assert_eq!(rule.evaluate(&mut env).decision, Decision::NotApplicable);
    }

    #[test]
    fn missing_mandatory_attribute_in_target_is_indeterminate_p_for_permit_rule() {
        let (mut ctx, mut vars, functions) = env_parts();
        let mut env = EvalEnv { ctx: &mut ctx, vars: &mut vars, functions: &functions };
        let target = Target {
            any_of: vec![AnyOf {
                all_of: vec![AllOf {
                    matches: vec![Match {
                        function_id: "urn:oasis:names:tc:xacml:1.0:function:string-equal".into(),
                        value: Value::String("admin".into()),
                        attribute: MatchAttribute::Designator(crate::expr::Designator {
                            category: category::SUBJECT.to_string(),
                            attribute_id: "role".to_string(),
                            datatype: crate::datatype::Datatype::String,
                            issuer: None,
                            must_be_present: true,
                        }),
                    }],
                }],
            }],
        };
        let rule = Rule {
            id: "r1".into(),
            effect: Effect::Permit,
            target,
            condition: None,
            obligations: vec![],
            advice: vec![],
        };
        let result = rule.evaluate(&mut env);
        assert_eq!(result.decision, Decision::Indeterminate(IndeterminateCause::P));
    }

    #[test]
    fn obligations_are_filtered_by_fulfill_on() {
        let (mut ctx, mut vars, functions) = env_parts();
        let mut env = EvalEnv { ctx: &mut ctx, vars: &mut vars, functions: &functions };
        let rule = Rule {
            id: "r1".into(),
            effect: Effect::Permit,
            target: Target::default(),
            condition: None,
            obligations: vec![
                ObligationExpression { id: "on-permit".into(), fulfill_on: FulfillOn::Permit, attribute_assignments: vec![] },
                ObligationExpression { id: "on-deny".into(), fulfill_on: FulfillOn::Deny, attribute_assignments: vec![] },
            ],
            advice: vec![],
        };
        let result = rule.evaluate(&mut env);
        assert_eq!(result.obligations.len(), 1);
        assert_eq!(result.obligations[0].id, "on-permit");
    }

    #[test]
    fn indeterminate_attribute_assignment_expression_lifts_rule_to_indeterminate_effect() {
        let (mut ctx, mut vars, functions) = env_parts();
        let mut env = EvalEnv { ctx: &mut ctx, vars: &mut vars, functions: &functions };
        let rule = Rule {
            id: "r1".into(),
            effect: Effect::Deny,
            target: Target::default(),
            condition: None,
            obligations: vec![ObligationExpression {
                id: "on-deny".into(),
                fulfill_on: FulfillOn::Deny,
                attribute_assignments: vec![crate::decision::AttributeAssignmentExpression {
                    attribute_id: "reason".into(),
                    category: None,
                    issuer: None,
                    expression: Expression::Designator(crate::expr::Designator {
                        category: category::SUBJECT.to_string(),
                        attribute_id: "missing".to_string(),
                        datatype: crate::datatype::Datatype::String,
                        issuer: None,
                        must_be_present: true,
                    }),
                }],
            }],
            advice: vec![],
        };
        let result = rule.evaluate(&mut env);
        assert_eq!(result.decision, Decision::Indeterminate(IndeterminateCause::D));
        assert_eq!(result.status.code, crate::decision::status_code::MISSING_ATTRIBUTE);
    }
}
