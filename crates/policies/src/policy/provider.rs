//! The policy-reference resolution port (`spec.md` §4.H, §6).

use crate::policy::policy::Policy;
use crate::policy::policy_set::PolicySet;

/// A dotted-numeric XACML policy/policy-set version (e.g. `"1.2.0"`).
/// Falls back to lexical ordering for any component that isn't numeric,
/// so a malformed version string is still comparable rather than a parse
/// error (version syntax is a policy-provider/catalog concern, out of
/// scope for this engine per `spec.md` §1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version(pub String);

impl Version {
    fn components(&self) -> Vec<Result<u64, &str>> {
        self.0.split('.').map(|part| part.parse::<u64>().map_err(|_| part)).collect()
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.components().cmp(&other.components())
    }
}

/// A reference's version constraint: an exact match, or an inclusive
/// earliest/latest bound (`spec.md` §4.H — "exact, earliest, latest").
#[derive(Debug, Clone, Default)]
pub struct VersionConstraint {
    pub exact: Option<Version>,
    pub earliest: Option<Version>,
    pub latest: Option<Version>,
}

impl VersionConstraint {
    pub fn exact(version: impl Into<String>) -> Self {
        VersionConstraint { exact: Some(Version(version.into())), earliest: None, latest: None }
    }

    pub fn any() -> Self {
        VersionConstraint::default()
    }

    /// Whether `candidate` satisfies this constraint. Used by reference
    /// provider implementations (e.g. `providers::InMemoryPolicyProvider`)
    /// when selecting among several versions of the same policy id.
    pub fn matches(&self, candidate: &Version) -> bool {
        if let Some(exact) = &self.exact {
            return candidate == exact;
        }
        if let Some(earliest) = &self.earliest {
            if candidate < earliest {
                return false;
            }
        }
        if let Some(latest) = &self.latest {
            if candidate > latest {
                return false;
            }
        }
        true
    }
}

/// Whether a `PolicyReference` points at a `Policy` or a `PolicySet`
/// (`spec.md` §3, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefType {
    Policy,
    PolicySet,
}

/// A reference to a `Policy`/`PolicySet` by id, resolved at evaluation
/// time through a [`PolicyProvider`] (`spec.md` §3, §4.H).
#[derive(Debug, Clone)]
pub struct PolicyReference {
    pub id: String,
    pub version_constraint: VersionConstraint,
    pub ref_type: RefType,
}

/// What a [`PolicyProvider`] hands back for a resolved reference.
#[derive(Debug, Clone)]
pub enum ResolvedPolicy {
    Policy(Policy),
    PolicySet(PolicySet),
}

impl ResolvedPolicy {
    pub fn id(&self) -> &str {
        match self {
            ResolvedPolicy::Policy(p) => &p.id,
            ResolvedPolicy::PolicySet(p) => &p.id,
        }
    }
}

/// Resolves `PolicyReference`s to concrete policies/policy-sets
/// (`spec.md` §4.H, §6). Deliberately synchronous for the same reason as
/// [`crate::context::AttributeProvider`] — `spec.md` §5 mandates
/// synchronously-invoked collaborators on the evaluation hot path.
///
/// Policy *loading* (from files, URLs, databases) and catalog resolution
/// are explicitly out of scope for this engine (`spec.md` §1); this trait
/// is only the narrow in-evaluation contract for resolving one reference
/// once a tree is already loaded.
pub trait PolicyProvider: Send + Sync {
    fn find_by_reference(
        &self,
        id: &str,
        version_constraint: &VersionConstraint,
        ref_type: RefType,
    ) -> Option<ResolvedPolicy>;
}

#[cfg(test)]
pub(crate) mod mocks {
    use super::*;

    mockall::mock! {
        pub Provider {}

        impl PolicyProvider for Provider {
            fn find_by_reference(
                &self,
                id: &str,
                version_constraint: &VersionConstraint,
                ref_type: RefType,
            ) -> Option<ResolvedPolicy>;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_compares_numeric_components() {
        assert!(Version("1.2.0".into()) < Version("1.10.0".into()));
    }

    #[test]
    fn exact_constraint_rejects_other_versions() {
        let constraint = VersionConstraint::exact("2.0");
        assert!(constraint.matches(&Version("2.0".into())));
        assert!(!constraint.matches(&Version("2.1".into())));
    }

    #[test]
    fn earliest_latest_bounds_are_inclusive() {
        let constraint = VersionConstraint {
            exact: None,
            earliest: Some(Version("1.0".into())),
            latest: Some(Version("2.0".into())),
        };
        assert!(constraint.matches(&Version("1.0".into())));
        assert!(constraint.matches(&Version("2.0".into())));
        assert!(!constraint.matches(&Version("2.1".into())));
    }
}
