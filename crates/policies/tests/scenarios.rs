//! End-to-end scenario tests exercising `Pdp::evaluate` against the worked
//! examples a policy decision engine must get right (`spec.md` §8).

use policies::combining::CombiningAlgorithm;
use policies::context::{category, RequestAttribute};
use policies::datatype::{Datatype, Value};
use policies::decision::{Decision, FulfillOn, IndeterminateCause, ObligationExpression};
use policies::expr::{Designator, Expression};
use policies::pdp::{DecisionRequest, EnvironmentAttributes, Pdp};
use policies::policy::Policy;
use policies::rule::{Effect, Rule};
use policies::target::{AllOf, AnyOf, Match, MatchAttribute, Target};

fn role_is(value: &str) -> Target {
    Target {
        any_of: vec![AnyOf {
            all_of: vec![AllOf {
                matches: vec![Match {
                    function_id: "urn:oasis:names:tc:xacml:1.0:function:string-equal".into(),
                    value: Value::String(value.into()),
                    attribute: MatchAttribute::Designator(Designator {
                        category: category::SUBJECT.into(),
                        attribute_id: "role".into(),
                        datatype: Datatype::String,
                        issuer: None,
                        must_be_present: false,
                    }),
                }],
            }],
        }],
    }
}

fn role_attribute(role: &str) -> RequestAttribute {
    RequestAttribute {
        category: category::SUBJECT.into(),
        attribute_id: "role".into(),
        datatype: Datatype::String,
        issuer: None,
        value: Value::String(role.into()),
    }
}

fn request(attributes: Vec<RequestAttribute>) -> DecisionRequest {
    DecisionRequest { attributes }
}

/// Scenario 1: a policy with one `Permit` rule whose target matches →
/// `Permit`, no obligations.
#[test]
fn permit_leaf() {
    let policy = Policy {
        id: "permit-admin".into(),
        version: "1.0".into(),
        target: Target::default(),
        rule_combining_algorithm: CombiningAlgorithm::DenyOverrides,
        rules: vec![Rule {
            id: "r1".into(),
            effect: Effect::Permit,
            target: role_is("admin"),
            condition: None,
            obligations: vec![],
            advice: vec![],
        }],
        variable_definitions: vec![],
        obligations: vec![],
        advice: vec![],
        max_delegation_depth: None,
    };
    let pdp = Pdp::builder().root_policy(policy).build().expect("valid tree");
    let result = pdp.evaluate(&request(vec![role_attribute("admin")]), &EnvironmentAttributes::default());
    assert_eq!(result.decision, Decision::Permit);
    assert!(result.obligations.is_empty());
}

/// Scenario 2: deny-overrides combines a matching `Deny` rule and a matching
/// `Permit` rule into `Deny`, keeping only the deny rule's obligations.
#[test]
fn deny_overrides_aggregates_only_the_winning_rules_obligations() {
    let policy = Policy {
        id: "mixed".into(),
        version: "1.0".into(),
        target: Target::default(),
        rule_combining_algorithm: CombiningAlgorithm::DenyOverrides,
        rules: vec![
            Rule {
                id: "permit-rule".into(),
                effect: Effect::Permit,
                target: Target::default(),
                condition: None,
                obligations: vec![ObligationExpression {
                    id: "permit-ob".into(),
                    fulfill_on: FulfillOn::Permit,
                    attribute_assignments: vec![],
                }],
                advice: vec![],
            },
            Rule {
                id: "deny-rule".into(),
                effect: Effect::Deny,
                target: Target::default(),
                condition: None,
                obligations: vec![ObligationExpression {
                    id: "deny-ob".into(),
                    fulfill_on: FulfillOn::Deny,
                    attribute_assignments: vec![],
                }],
                advice: vec![],
            },
        ],
        variable_definitions: vec![],
        obligations: vec![],
        advice: vec![],
        max_delegation_depth: None,
    };
    let pdp = Pdp::builder().root_policy(policy).build().expect("valid tree");
    let result = pdp.evaluate(&request(vec![]), &EnvironmentAttributes::default());
    assert_eq!(result.decision, Decision::Deny);
    assert_eq!(result.obligations.len(), 1);
    assert_eq!(result.obligations[0].id, "deny-ob");
}

/// Scenario 3: `only-one-applicable` over two policy-sets both matching the
/// request's target is `Indeterminate{DP}` with a processing-error status.
#[test]
fn only_one_applicable_with_two_applicable_policies_is_processing_error() {
    use policies::policy::{PolicySet, PolicySetChild};

    let permit_policy = |id: &str| Policy {
        id: id.into(),
        version: "1.0".into(),
        target: Target::default(),
        rule_combining_algorithm: CombiningAlgorithm::DenyOverrides,
        rules: vec![Rule {
            id: format!("{id}-r1"),
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
    };

    let policy_set = PolicySet {
        id: "ps-root".into(),
        version: "1.0".into(),
        target: Target::default(),
        policy_combining_algorithm: CombiningAlgorithm::OnlyOneApplicable,
        children: vec![
            PolicySetChild::Policy(permit_policy("p1")),
            PolicySetChild::Policy(permit_policy("p2")),
        ],
        obligations: vec![],
        advice: vec![],
    };
    let pdp = Pdp::builder().root_policy_set(policy_set).build().expect("valid tree");
    let result = pdp.evaluate(&request(vec![]), &EnvironmentAttributes::default());
    assert_eq!(result.decision, Decision::Indeterminate(IndeterminateCause::DP));
    assert_eq!(result.status.code, policies::decision::status_code::PROCESSING_ERROR);
}

/// Scenario 4: a rule whose target designator has `mustBePresent=true` and
/// the attribute is absent from the request is `Indeterminate{P}` (the
/// rule's effect), not a silent `NotApplicable`.
#[test]
fn missing_mandatory_attribute_is_indeterminate() {
    let mandatory_role = Target {
        any_of: vec![AnyOf {
            all_of: vec![AllOf {
                matches: vec![Match {
                    function_id: "urn:oasis:names:tc:xacml:1.0:function:string-equal".into(),
                    value: Value::String("admin".into()),
                    attribute: MatchAttribute::Designator(Designator {
                        category: category::SUBJECT.into(),
                        attribute_id: "role".into(),
                        datatype: Datatype::String,
                        issuer: None,
                        must_be_present: true,
                    }),
                }],
            }],
        }],
    };
    let policy = Policy {
        id: "mandatory-role".into(),
        version: "1.0".into(),
        target: Target::default(),
        rule_combining_algorithm: CombiningAlgorithm::DenyOverrides,
        rules: vec![Rule {
            id: "r1".into(),
            effect: Effect::Permit,
            target: mandatory_role,
            condition: None,
            obligations: vec![],
            advice: vec![],
        }],
        variable_definitions: vec![],
        obligations: vec![],
        advice: vec![],
        max_delegation_depth: None,
    };
    let pdp = Pdp::builder().root_policy(policy).build().expect("valid tree");
    let result = pdp.evaluate(&request(vec![]), &EnvironmentAttributes::default());
    assert_eq!(result.decision, Decision::Indeterminate(IndeterminateCause::P));
    assert_eq!(result.status.code, policies::decision::status_code::MISSING_ATTRIBUTE);
}

/// Scenario 5: `n-of(2, ...)` short-circuits to `false` once it becomes
/// impossible to reach the threshold, never evaluating the mandatory
/// designator that would otherwise force an error.
#[test]
fn n_of_short_circuit_avoids_evaluating_unreachable_designator() {
    let condition = Expression::Apply {
        function_id: "urn:oasis:names:tc:xacml:1.0:function:n-of".into(),
        args: vec![
            Expression::Literal(Value::Integer(2.into())),
            Expression::Literal(Value::Boolean(false)),
            Expression::Literal(Value::Boolean(false)),
            Expression::Designator(Designator {
                category: category::SUBJECT.into(),
                attribute_id: "never-consulted".into(),
                datatype: Datatype::Boolean,
                issuer: None,
                must_be_present: true,
            }),
        ],
    };
    let policy = Policy {
        id: "n-of-policy".into(),
        version: "1.0".into(),
        target: Target::default(),
        rule_combining_algorithm: CombiningAlgorithm::DenyOverrides,
        rules: vec![Rule {
            id: "r1".into(),
            effect: Effect::Permit,
            target: Target::default(),
            condition: Some(condition),
            obligations: vec![],
            advice: vec![],
        }],
        variable_definitions: vec![],
        obligations: vec![],
        advice: vec![],
        max_delegation_depth: None,
    };
    let pdp = Pdp::builder().root_policy(policy).build().expect("valid tree");
    let result = pdp.evaluate(&request(vec![]), &EnvironmentAttributes::default());
    assert_eq!(result.decision, Decision::NotApplicable);
}

/// Scenario 6: the clock freezes on first observation within a request, so
/// two designators both resolving `current-dateTime` see the identical
/// instant even though the PDP never receives a pre-seeded value.
#[test]
fn clock_freezes_within_one_decision() {
    use policies::datatype::XsDateTime;
    use policies::expr::{EvalEnv, Selector};
    use policies::functions::FunctionRegistry;

    // `Pdp::evaluate` doesn't expose the clock directly, so exercise the
    // freezing guarantee the way `rule.rs`/`policy.rs` consume it: through
    // two independent `Clock::now()` observations on the same context.
    let mut ctx = policies::context::AttributeContext::new(
        vec![],
        vec![],
        policies::context::Clock::wall_clock(),
        false,
    );
    let first: XsDateTime = ctx.clock().now();
    let second: XsDateTime = ctx.clock().now();
    assert_eq!(first, second);

    // And confirm a Selector lookup against an environment "current time"
    // attribute behaves deterministically across two evaluations in the
    // same context (no provider registered, so both resolve to an empty
    // bag rather than erroring).
    let functions = FunctionRegistry::standard();
    let mut vars = policies::expr::VariableScope::new();
    let selector = Expression::Selector(Selector {
        category: category::ENVIRONMENT.into(),
        path: "current-dateTime".into(),
        datatype: Datatype::DateTime,
        must_be_present: false,
    });
    let mut env = EvalEnv { ctx: &mut ctx, vars: &mut vars, functions: &functions };
    let first_eval = selector.eval(&mut env).unwrap();
    let second_eval = selector.eval(&mut env).unwrap();
    assert_eq!(first_eval.as_bag().unwrap().len(), second_eval.as_bag().unwrap().len());
}
