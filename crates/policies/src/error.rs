//! Crate-wide contract-violation errors.
//!
//! These are distinct from an in-band `Indeterminate` decision
//! (`spec.md` §4.C/§7): an `Indeterminate` is a legitimate outcome of
//! evaluating a well-formed policy tree against a particular request.
//! `EngineError` covers the smaller set of problems that mean the tree or
//! registry itself is malformed and evaluation cannot proceed at all
//! (`SPEC_FULL.md` §7).
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("function {id} is already registered")]
    DuplicateFunction { id: String },

    #[error("unknown combining algorithm: {id}")]
    UnknownCombiningAlgorithm { id: String },

    #[error("policy {id} references itself, directly or transitively")]
    SelfReferentialPolicy { id: String },
}

impl EngineError {
    /// A stable category label for logs/metrics, in the style of the
    /// teacher's `error_category()` helper on feature-local error enums.
    pub fn error_category(&self) -> &'static str {
        match self {
            EngineError::DuplicateFunction { .. } => "registry",
            EngineError::UnknownCombiningAlgorithm { .. } => "combining-algorithm",
            EngineError::SelfReferentialPolicy { .. } => "policy-graph",
        }
    }

    /// None of these are transient: they indicate a malformed policy tree
    /// or registry, not a condition that resolves on retry.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
