//! Decisions, status, and obligations/advice (`spec.md` §3, §6, §7).

use serde::{Deserialize, Serialize};

use crate::datatype::{Datatype, Value};
use crate::expr::{EvalEnv, Expression};

/// The standard status-code URIs from the XACML 3.0 core specification,
/// used verbatim by [`Status`] (`spec.md` §6, §7).
pub mod status_code {
    pub const OK: &str = "urn:oasis:names:tc:xacml:1.0:status:ok";
    pub const MISSING_ATTRIBUTE: &str =
        "urn:oasis:names:tc:xacml:1.0:status:missing-attribute";
    pub const SYNTAX_ERROR: &str = "urn:oasis:names:tc:xacml:1.0:status:syntax-error";
    pub const PROCESSING_ERROR: &str =
        "urn:oasis:names:tc:xacml:1.0:status:processing-error";
}

/// Detail attached to a `missing-attribute` status, identifying exactly
/// which designator could not be resolved (`spec.md` §7).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingAttributeDetail {
    pub category: String,
    pub attribute_id: String,
    pub datatype: Datatype,
    pub issuer: Option<String>,
}

/// The outcome of one evaluation step: either `ok`, or one of the three
/// in-band error kinds carried as `Indeterminate` (`spec.md` §7).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub code: String,
    pub message: Option<String>,
    pub missing_attribute: Option<MissingAttributeDetail>,
}

impl Status {
    pub fn ok() -> Self {
        Status { code: status_code::OK.to_string(), message: None, missing_attribute: None }
    }

    pub fn syntax_error(message: impl Into<String>) -> Self {
        Status {
            code: status_code::SYNTAX_ERROR.to_string(),
            message: Some(message.into()),
            missing_attribute: None,
        }
    }

    pub fn processing_error(message: impl Into<String>) -> Self {
        Status {
            code: status_code::PROCESSING_ERROR.to_string(),
            message: Some(message.into()),
            missing_attribute: None,
        }
    }

    pub fn missing_attribute(detail: MissingAttributeDetail) -> Self {
        Status {
            code: status_code::MISSING_ATTRIBUTE.to_string(),
            message: None,
            missing_attribute: Some(detail),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == status_code::OK
    }
}

/// Why an `Indeterminate` decision arose, which governs how it combines
/// with sibling rules/policies (`spec.md` §4.F/§4.G): a rule whose *effect*
/// is `Permit` that errors out is `Indeterminate{P}`, not `Indeterminate{D}`,
/// because only a `Permit` could ever have resulted from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndeterminateCause {
    /// Only a `Deny` could have resulted.
    D,
    /// Only a `Permit` could have resulted.
    P,
    /// Either a `Permit` or a `Deny` could have resulted (e.g. the target
    /// itself was indeterminate before the effect was known).
    DP,
}

impl IndeterminateCause {
    /// Combine two causes when both branches of a decision could have gone
    /// either way (used when merging `Indeterminate` results of unlike
    /// cause during combining).
    pub fn merge(self, other: Self) -> Self {
        if self == other { self } else { IndeterminateCause::DP }
    }

    /// The cause to lift to when a node's *own* obligation/advice
    /// attribute-assignment expression is `Indeterminate`, generalising
    /// `spec.md` §4.F step 3 to the policy/policy-set level: only `Permit`
    /// or `Deny` ever carry a node's own obligations (`FulfillOn` has no
    /// `NotApplicable`/`Indeterminate` variant), so those are the only
    /// decisions this is ever called with in practice.
    pub fn for_decision(decision: Decision) -> Self {
        match decision {
            Decision::Permit => IndeterminateCause::P,
            Decision::Deny => IndeterminateCause::D,
            Decision::NotApplicable | Decision::Indeterminate(_) => IndeterminateCause::DP,
        }
    }
}

/// The result of evaluating a rule, policy, policy set, or an entire request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Permit,
    Deny,
    NotApplicable,
    Indeterminate(IndeterminateCause),
}

impl Decision {
    pub fn is_indeterminate(self) -> bool {
        matches!(self, Decision::Indeterminate(_))
    }
}

/// An `AttributeAssignment` inside a resolved [`Obligation`] or [`Advice`]
/// (`spec.md` §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeAssignment {
    pub attribute_id: String,
    pub category: Option<String>,
    pub issuer: Option<String>,
    pub value: Value,
}

/// An attribute-assignment *expression* inside an [`ObligationExpression`]/
/// [`AdviceExpression`] template. Unlike the resolved [`AttributeAssignment`]
/// it carries, this is an [`Expression`] evaluated fresh each time its
/// enclosing template is fulfilled — it can designate, apply a function, or
/// reference a variable, and so can itself be `Indeterminate` (`spec.md`
/// §3, §4.F step 3).
#[derive(Debug, Clone)]
pub struct AttributeAssignmentExpression {
    pub attribute_id: String,
    pub category: Option<String>,
    pub issuer: Option<String>,
    pub expression: Expression,
}

impl AttributeAssignmentExpression {
    fn evaluate(&self, env: &mut EvalEnv) -> Result<AttributeAssignment, Status> {
        let value = self.expression.eval(env)?.as_single()?.clone();
        Ok(AttributeAssignment {
            attribute_id: self.attribute_id.clone(),
            category: self.category.clone(),
            issuer: self.issuer.clone(),
            value,
        })
    }
}

/// Effect a rule/policy must have for its [`ObligationExpression`]/
/// [`AdviceExpression`] to be included in a final decision (`spec.md` §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FulfillOn {
    Permit,
    Deny,
}

impl FulfillOn {
    pub fn matches(self, decision: Decision) -> bool {
        matches!(
            (self, decision),
            (FulfillOn::Permit, Decision::Permit) | (FulfillOn::Deny, Decision::Deny)
        )
    }
}

/// An obligation or advice *template* attached to a rule or policy, carried
/// forward only if the enclosing node's decision matches `fulfill_on`
/// (`spec.md` §3, §4.G).
#[derive(Debug, Clone)]
pub struct ObligationExpression {
    pub id: String,
    pub fulfill_on: FulfillOn,
    pub attribute_assignments: Vec<AttributeAssignmentExpression>,
}

/// An advice template; identical shape to [`ObligationExpression`] but
/// non-binding on the PEP (`spec.md` §3).
pub type AdviceExpression = ObligationExpression;

/// A resolved obligation attached to a [`DecisionResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obligation {
    pub id: String,
    pub attribute_assignments: Vec<AttributeAssignment>,
}

/// A resolved advice attached to a [`DecisionResult`].
pub type Advice = Obligation;

impl ObligationExpression {
    /// Evaluate every attribute-assignment expression against `env`,
    /// producing a resolved [`Obligation`]/[`Advice`]. The first
    /// `Indeterminate` among them short-circuits as `Err` — the caller
    /// lifts that to `Indeterminate{Effect}` (`spec.md` §4.F step 3).
    fn evaluate(&self, env: &mut EvalEnv) -> Result<Obligation, Status> {
        let attribute_assignments = self
            .attribute_assignments
            .iter()
            .map(|assignment| assignment.evaluate(env))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Obligation { id: self.id.clone(), attribute_assignments })
    }
}

/// The fully-resolved result of evaluating a decision request
/// (`spec.md` §3, §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionResult {
    pub decision: Decision,
    pub status: Status,
    pub obligations: Vec<Obligation>,
    pub advice: Vec<Advice>,
}

impl DecisionResult {
    pub fn not_applicable() -> Self {
        DecisionResult {
            decision: Decision::NotApplicable,
            status: Status::ok(),
            obligations: Vec::new(),
            advice: Vec::new(),
        }
    }

    pub fn indeterminate(cause: IndeterminateCause, status: Status) -> Self {
        DecisionResult {
            decision: Decision::Indeterminate(cause),
            status,
            obligations: Vec::new(),
            advice: Vec::new(),
        }
    }

    /// Filter a set of obligation/advice templates down to those whose
    /// `fulfill_on` matches this result's decision, in declaration order
    /// (`spec.md` §4.G, and the document-order decision recorded for the
    /// "unordered combining algorithm" open question), evaluating each
    /// matching template's attribute-assignment expressions against `env`.
    /// Any `Indeterminate` among them is returned as `Err`, for the caller
    /// to lift the enclosing rule/policy/policy-set decision to
    /// `Indeterminate` (`spec.md` §4.F step 3).
    pub fn resolve_obligations(
        decision: Decision,
        templates: &[ObligationExpression],
        env: &mut EvalEnv,
    ) -> Result<Vec<Obligation>, Status> {
        templates.iter().filter(|t| t.fulfill_on.matches(decision)).map(|t| t.evaluate(env)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fulfill_on_only_matches_its_own_effect() {
        assert!(FulfillOn::Permit.matches(Decision::Permit));
        assert!(!FulfillOn::Permit.matches(Decision::Deny));
        assert!(!FulfillOn::Permit.matches(Decision::NotApplicable));
    }

    #[test]
    fn indeterminate_cause_merge_is_symmetric_and_widens() {
        assert_eq!(IndeterminateCause::D.merge(IndeterminateCause::D), IndeterminateCause::D);
        assert_eq!(IndeterminateCause::D.merge(IndeterminateCause::P), IndeterminateCause::DP);
    }

    #[test]
    fn indeterminate_cause_for_decision_only_lifts_permit_and_deny_distinctly() {
        assert_eq!(IndeterminateCause::for_decision(Decision::Permit), IndeterminateCause::P);
        assert_eq!(IndeterminateCause::for_decision(Decision::Deny), IndeterminateCause::D);
        assert_eq!(IndeterminateCause::for_decision(Decision::NotApplicable), IndeterminateCause::DP);
    }

    fn test_env() -> (crate::context::AttributeContext, crate::expr::VariableScope, crate::functions::FunctionRegistry) {
        (
            crate::context::AttributeContext::new(vec![], vec![], crate::context::Clock::wall_clock(), false),
            crate::expr::VariableScope::new(),
            crate::functions::FunctionRegistry::standard(),
        )
    }

    #[test]
    fn resolve_obligations_preserves_declaration_order() {
        let (mut ctx, mut vars, functions) = test_env();
        let mut env = EvalEnv { ctx: &mut ctx, vars: &mut vars, functions: &functions };
        let templates = vec![
            ObligationExpression {
                id: "first".into(),
                fulfill_on: FulfillOn::Permit,
                attribute_assignments: vec![],
            },
            ObligationExpression {
                id: "second".into(),
                fulfill_on: FulfillOn::Permit,
                attribute_assignments: vec![],
            },
        ];
        let resolved = DecisionResult::resolve_obligations(Decision::Permit, &templates, &mut env).unwrap();
        assert_eq!(resolved.iter().map(|o| o.id.as_str()).collect::<Vec<_>>(), vec!["first", "second"]);
    }

    #[test]
    fn resolve_obligations_evaluates_attribute_assignment_expressions() {
        let (mut ctx, mut vars, functions) = test_env();
        let mut env = EvalEnv { ctx: &mut ctx, vars: &mut vars, functions: &functions };
        let templates = vec![ObligationExpression {
            id: "notify".into(),
            fulfill_on: FulfillOn::Permit,
            attribute_assignments: vec![AttributeAssignmentExpression {
                attribute_id: "message".into(),
                category: None,
                issuer: None,
                expression: Expression::Literal(Value::String("granted".into())),
            }],
        }];
        let resolved = DecisionResult::resolve_obligations(Decision::Permit, &templates, &mut env).unwrap();
        assert_eq!(resolved[0].attribute_assignments[0].value, Value::String("granted".into()));
    }

    #[test]
    fn indeterminate_attribute_assignment_expression_propagates_as_err() {
        let (mut ctx, mut vars, functions) = test_env();
        let mut env = EvalEnv { ctx: &mut ctx, vars: &mut vars, functions: &functions };
        let templates = vec![ObligationExpression {
            id: "notify".into(),
            fulfill_on: FulfillOn::Permit,
            attribute_assignments: vec![AttributeAssignmentExpression {
                attribute_id: "message".into(),
                category: None,
                issuer: None,
                expression: Expression::Designator(crate::expr::Designator {
                    category: "subject".into(),
                    attribute_id: "missing".into(),
                    datatype: Datatype::String,
                    issuer: None,
                    must_be_present: true,
                }),
            }],
        }];
        let err = DecisionResult::resolve_obligations(Decision::Permit, &templates, &mut env).unwrap_err();
        assert_eq!(err.code, status_code::MISSING_ATTRIBUTE);
    }

    #[test]
    fn non_matching_template_expression_is_never_evaluated() {
        let (mut ctx, mut vars, functions) = test_env();
        let mut env = EvalEnv { ctx: &mut ctx, vars: &mut vars, functions: &functions };
        let templates = vec![ObligationExpression {
            id: "deny-only".into(),
            fulfill_on: FulfillOn::Deny,
            attribute_assignments: vec![AttributeAssignmentExpression {
                attribute_id: "message".into(),
                category: None,
                issuer: None,
                expression: Expression::Designator(crate::expr::Designator {
                    category: "subject".into(),
                    attribute_id: "missing".into(),
                    datatype: Datatype::String,
                    issuer: None,
                    must_be_present: true,
                }),
            }],
        }];
        let resolved = DecisionResult::resolve_obligations(Decision::Permit, &templates, &mut env).unwrap();
        assert!(resolved.is_empty());
    }
}
