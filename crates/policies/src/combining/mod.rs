//! Rule- and policy-combining algorithms (component G, `spec.md` §4.G).

mod algorithm;
mod children;

pub use algorithm::{algorithm_id, CombiningAlgorithm, Scope};
pub use children::Children;
