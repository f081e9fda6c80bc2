//! The root evaluator: merges PDP-issued environment attributes into the
//! request, builds a fresh `AttributeContext`, and dispatches to the root
//! policy/policy-set (component I, `spec.md` §4.I).

use std::sync::Arc;

use crate::context::{AccessRecord, AttributeContext, AttributeProvider, Clock, RequestAttribute};
use crate::decision::DecisionResult;
use crate::error::EngineError;
use crate::functions::FunctionRegistry;
use crate::policy::{Policy, PolicyProvider, PolicySet, PolicySetChild};

/// The attributes supplied by the caller for one decision, grouped the way
/// `spec.md` §6 describes a parsed Request: a flat list, each attribute
/// already tagged with its category.
#[derive(Debug, Clone, Default)]
pub struct DecisionRequest {
    pub attributes: Vec<RequestAttribute>,
}

/// The `current-time`/`current-date`/`current-dateTime` (and any other)
/// attributes the PDP itself issues, independent of what the caller sent
/// (`spec.md` §4.B).
#[derive(Debug, Clone, Default)]
pub struct EnvironmentAttributes {
    pub attributes: Vec<RequestAttribute>,
}

/// Flags governing one `Pdp`'s evaluation behaviour (`SPEC_FULL.md` §2 —
/// explicit builder/config value object, no ambient global state).
#[derive(Debug, Clone, Copy)]
pub struct PdpConfig {
    /// `false` (default): request-provided values win over PDP-issued
    /// environment attributes on a key collision. `true`: PDP-issued values
    /// always override (`spec.md` §4.B).
    pub pdp_env_overrides_request: bool,
    /// When set, `Pdp::evaluate_traced` records every attribute lookup made
    /// during the decision, hit or miss (`spec.md` §4.I, `SPEC_FULL.md`'s
    /// `DecisionTrace` supplemental feature).
    pub return_used_attributes: bool,
}

impl Default for PdpConfig {
    fn default() -> Self {
        PdpConfig { pdp_env_overrides_request: false, return_used_attributes: false }
    }
}

/// Evaluation observability returned alongside a [`DecisionResult`] when
/// `return_used_attributes` is set: every attribute lookup made during the
/// decision, and the ids of every policy/policy-set whose target matched
/// the request (`spec.md` §4.I step 4, §6 "attributes actually consulted" /
/// "policies that matched").
#[derive(Debug, Clone, Default)]
pub struct DecisionTrace {
    pub attribute_accesses: Vec<AccessRecord>,
    pub matched_policies: Vec<String>,
}

/// The root of the policy tree: exactly one top-level `Policy` or
/// `PolicySet` (`spec.md` §4.H, §4.I).
#[derive(Debug, Clone)]
pub enum RootEntity {
    Policy(Policy),
    PolicySet(PolicySet),
}

/// The fully-assembled decision engine: an immutable policy tree plus the
/// provider chain and registries it evaluates against. Cheap to `Clone` —
/// every field is an `Arc` handle — so callers may fan `Pdp::evaluate` out
/// across their own thread pool without this crate imposing one
/// (`SPEC_FULL.md` §5).
#[derive(Clone)]
pub struct Pdp {
    root: Arc<RootEntity>,
    attribute_providers: Arc<Vec<Arc<dyn AttributeProvider>>>,
    policy_provider: Arc<dyn PolicyProvider>,
    functions: Arc<FunctionRegistry>,
    config: PdpConfig,
}

impl Pdp {
    pub fn builder() -> PdpBuilder {
        PdpBuilder::default()
    }

    /// Evaluate one decision request, per `spec.md` §4.I:
    ///
    /// 1. merge `request` and `pdp_env` per `config.pdp_env_overrides_request`.
    /// 2. build a fresh `AttributeContext`; the clock freezes on first use.
    /// 3. dispatch to the root policy/policy-set evaluator.
    #[tracing::instrument(skip_all)]
    pub fn evaluate(&self, request: &DecisionRequest, pdp_env: &EnvironmentAttributes) -> DecisionResult {
        self.evaluate_traced(request, pdp_env).0
    }

    /// Like [`Pdp::evaluate`], but also returns a [`DecisionTrace`] (empty
    /// unless `config.return_used_attributes` is set) backing the Response
    /// data model's "attributes actually consulted" / "policies that
    /// matched" fields (`spec.md` §4.I, §6).
    pub fn evaluate_traced(
        &self,
        request: &DecisionRequest,
        pdp_env: &EnvironmentAttributes,
    ) -> (DecisionResult, DecisionTrace) {
        let merged = merge_attributes(&request.attributes, &pdp_env.attributes, self.config.pdp_env_overrides_request);
        let mut ctx = AttributeContext::new(
            merged,
            (*self.attribute_providers).clone(),
            Clock::wall_clock(),
            self.config.return_used_attributes,
        );

        let result = match self.root.as_ref() {
            RootEntity::Policy(policy) => policy.evaluate(&mut ctx, &self.functions),
            RootEntity::PolicySet(policy_set) => {
                policy_set.evaluate(&mut ctx, &self.functions, self.policy_provider.as_ref())
            }
        };
        tracing::info!(decision = ?result.decision, "decision evaluated");

        let trace = if self.config.return_used_attributes {
            DecisionTrace {
                attribute_accesses: ctx.access_log().to_vec(),
                matched_policies: ctx.matched_policies().to_vec(),
            }
        } else {
            DecisionTrace::default()
        };
        (result, trace)
    }
}

/// Combine request and PDP-issued attributes for one decision
/// (`spec.md` §4.B): on a `(category, attribute_id, datatype, issuer)`
/// collision, `overrides_request` decides which side's values are kept —
/// the loser's values for that key are dropped entirely, not interleaved.
/// Neither input slice is mutated; this always allocates a fresh vector so
/// the PDP-issued map can be reused across requests.
fn merge_attributes(
    request: &[RequestAttribute],
    pdp_env: &[RequestAttribute],
    overrides_request: bool,
) -> Vec<RequestAttribute> {
    let key = |a: &RequestAttribute| (a.category.clone(), a.attribute_id.clone(), a.datatype, a.issuer.clone());

    let (winning, losing) = if overrides_request { (pdp_env, request) } else { (request, pdp_env) };
    let winning_keys: std::collections::HashSet<_> = winning.iter().map(key).collect();

    let mut merged: Vec<RequestAttribute> = winning.to_vec();
    merged.extend(losing.iter().filter(|a| !winning_keys.contains(&key(a))).cloned());
    merged
}

/// Walks inline (non-`Reference`) children looking for an id that appears
/// more than once in its own ancestry — a self-referential tree built
/// directly rather than through provider-resolved references, which
/// `PolicySet::evaluate` cannot detect lazily because it never sees the
/// whole inline structure at once (`SPEC_FULL.md` §7).
fn check_self_reference(entity: &RootEntity) -> Result<(), EngineError> {
    fn walk(id: &str, children: &[PolicySetChild], ancestors: &mut Vec<String>) -> Result<(), EngineError> {
        for child in children {
            match child {
                PolicySetChild::Policy(_) => {}
                PolicySetChild::PolicySet(nested) => {
                    if ancestors.iter().any(|a| a == &nested.id) || nested.id == id {
                        return Err(EngineError::SelfReferentialPolicy { id: nested.id.clone() });
                    }
                    ancestors.push(nested.id.clone());
                    walk(&nested.id, &nested.children, ancestors)?;
                    ancestors.pop();
                }
                PolicySetChild::Reference(_) => {}
            }
        }
        Ok(())
    }

    match entity {
        RootEntity::Policy(_) => Ok(()),
        RootEntity::PolicySet(root) => {
            let mut ancestors = vec![root.id.clone()];
            walk(&root.id, &root.children, &mut ancestors)
        }
    }
}

/// Assembles a [`Pdp`] from its root policy/policy-set, attribute/policy
/// providers, and `PdpConfig` (`SPEC_FULL.md` §6, in the style of the
/// teacher's `EngineBuilder`).
pub struct PdpBuilder {
    root: Option<RootEntity>,
    attribute_providers: Vec<Arc<dyn AttributeProvider>>,
    policy_provider: Option<Arc<dyn PolicyProvider>>,
    functions: FunctionRegistry,
    config: PdpConfig,
}

impl Default for PdpBuilder {
    fn default() -> Self {
        PdpBuilder {
            root: None,
            attribute_providers: Vec::new(),
            policy_provider: None,
            functions: FunctionRegistry::standard(),
            config: PdpConfig::default(),
        }
    }
}

impl PdpBuilder {
    pub fn root_policy(mut self, policy: Policy) -> Self {
        self.root = Some(RootEntity::Policy(policy));
        self
    }

    pub fn root_policy_set(mut self, policy_set: PolicySet) -> Self {
        self.root = Some(RootEntity::PolicySet(policy_set));
        self
    }

    pub fn attribute_provider(mut self, provider: Arc<dyn AttributeProvider>) -> Self {
        self.attribute_providers.push(provider);
        self
    }

    pub fn policy_provider(mut self, provider: Arc<dyn PolicyProvider>) -> Self {
        self.policy_provider = Some(provider);
        self
    }

    pub fn functions(mut self, functions: FunctionRegistry) -> Self {
        self.functions = functions;
        self
    }

    pub fn config(mut self, config: PdpConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the `Pdp`, rejecting a root whose inline policy-set tree
    /// contains itself (`SPEC_FULL.md` §7). A `PolicySet` root with no
    /// `policy_provider` supplied is allowed — it only matters if the tree
    /// actually contains a `PolicySetChild::Reference`, which then resolves
    /// to in-band `Indeterminate` at evaluation time rather than failing
    /// here, since the provider may legitimately have nothing registered
    /// yet at build time.
    pub fn build(self) -> Result<Pdp, EngineError> {
        let root = self.root.expect("Pdp::builder() requires root_policy or root_policy_set before build()");
        check_self_reference(&root)?;

        let policy_provider = self.policy_provider.unwrap_or_else(|| Arc::new(NoPolicyProvider));

        Ok(Pdp {
            root: Arc::new(root),
            attribute_providers: Arc::new(self.attribute_providers),
            policy_provider,
            functions: Arc::new(self.functions),
            config: self.config,
        })
    }
}

/// The default `PolicyProvider` when none is supplied: resolves nothing.
/// Adequate for any tree built entirely of inline policies/policy-sets.
struct NoPolicyProvider;

impl PolicyProvider for NoPolicyProvider {
    fn find_by_reference(
        &self,
        _id: &str,
        _version_constraint: &crate::policy::VersionConstraint,
        _ref_type: crate::policy::RefType,
    ) -> Option<crate::policy::ResolvedPolicy> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combining::CombiningAlgorithm;
    use crate::context::category;
    use crate::datatype::{Datatype, Value};
    use crate::decision::Decision;
    use crate::rule::{Effect, Rule};
    use crate::target::Target;

    fn permit_everyone() -> Policy {
        Policy {
            id: "p1".into(),
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

    #[test]
    fn builds_and_evaluates_a_single_policy_root() {
        let pdp = Pdp::builder().root_policy(permit_everyone()).build().expect("build");
        let result = pdp.evaluate(&DecisionRequest::default(), &EnvironmentAttributes::default());
        assert_eq!(result.decision, Decision::Permit);
    }

    #[test]
    #[tracing_test::traced_test]
    fn evaluate_logs_the_final_decision() {
        let pdp = Pdp::builder().root_policy(permit_everyone()).build().expect("build");
        let result = pdp.evaluate(&DecisionRequest::default(), &EnvironmentAttributes::default());
        assert_eq!(result.decision, Decision::Permit);
        assert!(logs_contain("decision evaluated"));
    }

    #[test]
    fn trace_is_empty_unless_return_used_attributes_is_set() {
        let pdp = Pdp::builder().root_policy(permit_everyone()).build().expect("build");
        let (_, trace) = pdp.evaluate_traced(&DecisionRequest::default(), &EnvironmentAttributes::default());
        assert!(trace.attribute_accesses.is_empty());
        assert!(trace.matched_policies.is_empty());
    }

    #[test]
    fn trace_records_the_matched_root_policy_when_enabled() {
        let pdp = Pdp::builder()
            .root_policy(permit_everyone())
            .config(PdpConfig { return_used_attributes: true, ..PdpConfig::default() })
            .build()
            .expect("build");
        let (result, trace) = pdp.evaluate_traced(&DecisionRequest::default(), &EnvironmentAttributes::default());
        assert_eq!(result.decision, Decision::Permit);
        assert_eq!(trace.matched_policies, vec!["p1".to_string()]);
    }

    #[test]
    fn self_referential_policy_set_root_is_rejected_at_build_time() {
        let cyclic = PolicySet {
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
        let result = Pdp::builder().root_policy_set(cyclic).build();
        assert!(matches!(result, Err(EngineError::SelfReferentialPolicy { .. })));
    }

    #[test]
    fn request_attribute_wins_over_pdp_env_by_default() {
        let request = vec![RequestAttribute {
            category: category::ENVIRONMENT.into(),
            attribute_id: "current-time".into(),
            datatype: Datatype::String,
            issuer: None,
            value: Value::String("from-request".into()),
        }];
        let pdp_env = vec![RequestAttribute {
            category: category::ENVIRONMENT.into(),
            attribute_id: "current-time".into(),
            datatype: Datatype::String,
            issuer: None,
            value: Value::String("from-pdp".into()),
        }];
        let merged = merge_attributes(&request, &pdp_env, false);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].value, Value::String("from-request".into()));
    }

    #[test]
    fn pdp_env_overrides_request_when_flag_is_set() {
        let request = vec![RequestAttribute {
            category: category::ENVIRONMENT.into(),
            attribute_id: "current-time".into(),
            datatype: Datatype::String,
            issuer: None,
            value: Value::String("from-request".into()),
        }];
        let pdp_env = vec![RequestAttribute {
            category: category::ENVIRONMENT.into(),
            attribute_id: "current-time".into(),
            datatype: Datatype::String,
            issuer: None,
            value: Value::String("from-pdp".into()),
        }];
        let merged = merge_attributes(&request, &pdp_env, true);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].value, Value::String("from-pdp".into()));
    }

    #[test]
    fn non_colliding_attributes_are_both_kept() {
        let request = vec![RequestAttribute {
            category: category::SUBJECT.into(),
            attribute_id: "role".into(),
            datatype: Datatype::String,
            issuer: None,
            value: Value::String("admin".into()),
        }];
        let pdp_env = vec![RequestAttribute {
            category: category::ENVIRONMENT.into(),
            attribute_id: "current-time".into(),
            datatype: Datatype::String,
            issuer: None,
            value: Value::String("from-pdp".into()),
        }];
        let merged = merge_attributes(&request, &pdp_env, false);
        assert_eq!(merged.len(), 2);
    }
}
