//! Reference provider implementations (`spec.md` §6, `SPEC_FULL.md` §6).
//!
//! Neither type is this crate's recommended production adapter — a real
//! deployment's providers talk to a PIP, directory service, or policy
//! catalog. These exist so a caller can get a `Pdp` running against static
//! data without writing their own `AttributeProvider`/`PolicyProvider` for a
//! quick start, and so crate-level integration tests have something to
//! exercise that isn't a mock.

use std::sync::Arc;

use dashmap::DashMap;

use crate::context::{AttributeProvider, ProviderContext};
use crate::datatype::{Bag, Datatype, Value};
use crate::decision::Status;
use crate::policy::{PolicyProvider, RefType, ResolvedPolicy, Version, VersionConstraint};

/// An `AttributeProvider` backed by a fixed, caller-supplied table —
/// `(category, attribute_id, datatype) -> Bag`. Useful for tests and small
/// deployments where the full attribute set is known up front.
#[derive(Debug, Default)]
pub struct StaticAttributeProvider {
    values: std::collections::HashMap<(String, String, Datatype), Bag>,
}

impl StaticAttributeProvider {
    pub fn new() -> Self {
        StaticAttributeProvider::default()
    }

    /// Register a single-valued attribute.
    pub fn with_value(mut self, category: impl Into<String>, attribute_id: impl Into<String>, value: Value) -> Self {
        let datatype = value.datatype();
        self.values.insert((category.into(), attribute_id.into(), datatype), Bag::singleton(value));
        self
    }

    /// Register a multi-valued attribute as a whole bag.
    pub fn with_bag(mut self, category: impl Into<String>, attribute_id: impl Into<String>, bag: Bag) -> Self {
        self.values.insert((category.into(), attribute_id.into(), bag.datatype()), bag);
        self
    }
}

impl AttributeProvider for StaticAttributeProvider {
    fn supports(&self, category: &str, attribute_id: &str, datatype: Datatype) -> bool {
        self.values.contains_key(&(category.to_string(), attribute_id.to_string(), datatype))
    }

    fn find(
        &self,
        category: &str,
        attribute_id: &str,
        datatype: Datatype,
        _issuer: Option<&str>,
        _context: &ProviderContext,
    ) -> Result<Bag, Status> {
        Ok(self
            .values
            .get(&(category.to_string(), attribute_id.to_string(), datatype))
            .cloned()
            .unwrap_or_else(|| Bag::empty(datatype)))
    }
}

/// A `PolicyProvider` backed by a `DashMap` keyed on policy/policy-set id,
/// holding every registered version — grounded on the teacher's
/// `InMemoryPolicyPersister` (`Arc<DashMap<PolicyId, Policy>>`), generalised
/// from a single-version store to one that resolves version constraints.
#[derive(Clone)]
pub struct InMemoryPolicyProvider {
    policies: Arc<DashMap<String, Vec<(Version, ResolvedPolicy)>>>,
}

impl InMemoryPolicyProvider {
    pub fn new() -> Self {
        InMemoryPolicyProvider { policies: Arc::new(DashMap::new()) }
    }

    /// Register one version of a policy/policy-set under its id.
    pub fn register(&self, id: impl Into<String>, version: Version, resolved: ResolvedPolicy) {
        self.policies.entry(id.into()).or_default().push((version, resolved));
    }
}

impl Default for InMemoryPolicyProvider {
    fn default() -> Self {
        InMemoryPolicyProvider::new()
    }
}

impl PolicyProvider for InMemoryPolicyProvider {
    fn find_by_reference(
        &self,
        id: &str,
        version_constraint: &VersionConstraint,
        ref_type: RefType,
    ) -> Option<ResolvedPolicy> {
        let versions = self.policies.get(id)?;
        versions
            .iter()
            .filter(|(version, resolved)| {
                version_constraint.matches(version)
                    && match (ref_type, resolved) {
                        (RefType::Policy, ResolvedPolicy::Policy(_)) => true,
                        (RefType::PolicySet, ResolvedPolicy::PolicySet(_)) => true,
                        _ => false,
                    }
            })
            .max_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, resolved)| resolved.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combining::CombiningAlgorithm;
    use crate::policy::Policy;
    use crate::target::Target;

    #[test]
    fn static_provider_resolves_registered_attribute() {
        let provider = StaticAttributeProvider::new().with_value("subject", "role", Value::String("admin".into()));
        assert!(provider.supports("subject", "role", Datatype::String));
        let ctx = ProviderContext { request: &[], clock: &crate::context::Clock::wall_clock() };
        let bag = provider.find("subject", "role", Datatype::String, None, &ctx).unwrap();
        assert_eq!(bag.one_and_only(), Some(&Value::String("admin".into())));
    }

    #[test]
    fn static_provider_does_not_support_unregistered_attribute() {
        let provider = StaticAttributeProvider::new();
        assert!(!provider.supports("subject", "role", Datatype::String));
    }

    fn empty_policy(id: &str) -> Policy {
        Policy {
            id: id.into(),
            version: "1.0".into(),
            target: Target::default(),
            rule_combining_algorithm: CombiningAlgorithm::DenyOverrides,
            rules: vec![],
            variable_definitions: vec![],
            obligations: vec![],
            advice: vec![],
            max_delegation_depth: None,
        }
    }

    #[test]
    fn in_memory_provider_resolves_exact_version() {
        let provider = InMemoryPolicyProvider::new();
        provider.register("p1", Version("1.0".into()), ResolvedPolicy::Policy(empty_policy("p1")));
        provider.register("p1", Version("2.0".into()), ResolvedPolicy::Policy(empty_policy("p1")));
        let resolved = provider
            .find_by_reference("p1", &VersionConstraint::exact("1.0"), RefType::Policy)
            .expect("resolved");
        assert_eq!(resolved.id(), "p1");
    }

    #[test]
    fn in_memory_provider_picks_latest_matching_version_when_unconstrained() {
        let provider = InMemoryPolicyProvider::new();
        provider.register("p1", Version("1.0".into()), ResolvedPolicy::Policy(empty_policy("p1")));
        provider.register("p1", Version("3.0".into()), ResolvedPolicy::Policy(empty_policy("p1")));
        provider.register("p1", Version("2.0".into()), ResolvedPolicy::Policy(empty_policy("p1")));
        let resolved = provider.find_by_reference("p1", &VersionConstraint::any(), RefType::Policy).expect("resolved");
        match resolved {
            ResolvedPolicy::Policy(p) => assert_eq!(p.version, "3.0"),
            ResolvedPolicy::PolicySet(_) => panic!("expected Policy"),
        }
    }

    #[test]
    fn in_memory_provider_returns_none_for_unknown_id() {
        let provider = InMemoryPolicyProvider::new();
        assert!(provider.find_by_reference("missing", &VersionConstraint::any(), RefType::Policy).is_none());
    }

    #[test]
    fn in_memory_provider_rejects_ref_type_mismatch() {
        let provider = InMemoryPolicyProvider::new();
        provider.register("p1", Version("1.0".into()), ResolvedPolicy::Policy(empty_policy("p1")));
        assert!(provider.find_by_reference("p1", &VersionConstraint::any(), RefType::PolicySet).is_none());
    }
}
