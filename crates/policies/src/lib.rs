//! # policies — an XACML 3.0 policy decision engine
//!
//! A pure evaluation engine: attribute context, expression evaluator,
//! target matcher, combining algorithms, and the policy-tree evaluator.
//! Policy *authoring*, *loading* (files/URLs/databases), catalog resolution,
//! and CLI/HTTP entry points are external collaborators — this crate only
//! evaluates an already-constructed policy tree against a decision request.
//!
//! ## Architecture
//!
//! Each module is one component of the engine:
//!
//! - [`datatype`] — the closed XACML datatype/value/bag system (component A)
//! - [`context`] — per-request attribute resolution and the frozen clock (B)
//! - [`expr`] — the expression AST, evaluator, and variable memoisation (C)
//! - [`functions`] — the standard function library (D)
//! - [`target`] — `Target`/`AnyOf`/`AllOf`/`Match` short-circuit matching (E)
//! - [`rule`] — rule evaluation: target → condition → effect (F)
//! - [`combining`] — the eight rule/policy combining algorithms (G)
//! - [`policy`] — `Policy`/`PolicySet` evaluation and reference resolution (H)
//! - [`pdp`] — `Pdp`, the root entry point (I)
//! - [`decision`] — decisions, status, obligations/advice
//! - [`providers`] — reference `AttributeProvider`/`PolicyProvider` adapters
//! - [`error`] — crate-wide contract-violation errors
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use policies::combining::CombiningAlgorithm;
//! use policies::pdp::{DecisionRequest, EnvironmentAttributes, Pdp};
//! use policies::policy::Policy;
//! use policies::rule::{Effect, Rule};
//! use policies::target::Target;
//!
//! let policy = Policy {
//!     id: "allow-all".into(),
//!     version: "1.0".into(),
//!     target: Target::default(),
//!     rule_combining_algorithm: CombiningAlgorithm::DenyOverrides,
//!     rules: vec![Rule {
//!         id: "r1".into(),
//!         effect: Effect::Permit,
//!         target: Target::default(),
//!         condition: None,
//!         obligations: vec![],
//!         advice: vec![],
//!     }],
//!     variable_definitions: vec![],
//!     obligations: vec![],
//!     advice: vec![],
//!     max_delegation_depth: None,
//! };
//!
//! let pdp = Pdp::builder().root_policy(policy).build().expect("valid tree");
//! let decision = pdp.evaluate(&DecisionRequest::default(), &EnvironmentAttributes::default());
//! assert_eq!(decision.decision, policies::decision::Decision::Permit);
//! ```

pub mod combining;
pub mod context;
pub mod datatype;
pub mod decision;
pub mod error;
pub mod expr;
pub mod functions;
pub mod pdp;
pub mod policy;
pub mod providers;
pub mod rule;
pub mod target;

pub use error::EngineError;
pub use pdp::{DecisionRequest, DecisionTrace, EnvironmentAttributes, Pdp, PdpBuilder, PdpConfig};
