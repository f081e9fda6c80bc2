//! Variable definitions and per-policy memoisation (`spec.md` §3 invariant 3).

use std::collections::{HashMap, HashSet};

use crate::context::AttributeContext;
use crate::decision::Status;
use crate::expr::expression::{EvalEnv, EvalValue, Expression};
use crate::functions::FunctionRegistry;

/// A named, policy-scoped expression (`<VariableDefinition>`).
#[derive(Debug, Clone)]
pub struct VariableDefinition {
    pub id: String,
    pub expression: Expression,
}

/// Holds one policy's `VariableDefinition`s and memoises each one's result
/// the first time it is referenced, so that a variable referenced by
/// several rules within the same policy is evaluated exactly once
/// (`spec.md` §3 invariant 3, §4.C).
#[derive(Debug, Default)]
pub struct VariableScope {
    definitions: HashMap<String, Expression>,
    memo: HashMap<String, EvalValue>,
    in_progress: HashSet<String>,
}

impl VariableScope {
    pub fn new() -> Self {
        VariableScope::default()
    }

    pub fn from_definitions(defs: impl IntoIterator<Item = VariableDefinition>) -> Self {
        let mut scope = VariableScope::new();
        for def in defs {
            scope.define(def.id, def.expression);
        }
        scope
    }

    pub fn define(&mut self, id: impl Into<String>, expression: Expression) {
        self.definitions.insert(id.into(), expression);
    }

    /// Resolve a variable by id, memoising the result. Returns a
    /// `processing-error` `Indeterminate` if the id is undefined or if
    /// resolving it would require evaluating itself (a cycle).
    pub fn resolve(
        &mut self,
        id: &str,
        functions: &FunctionRegistry,
        ctx: &mut AttributeContext,
    ) -> Result<EvalValue, Status> {
        if let Some(cached) = self.memo.get(id) {
            return Ok(cached.clone());
        }
        if self.in_progress.contains(id) {
            return Err(Status::processing_error(format!(
                "circular reference through variable {id}"
            )));
        }
        let expression = self
            .definitions
            .get(id)
            .cloned()
            .ok_or_else(|| Status::processing_error(format!("reference to undefined variable {id}")))?;

        self.in_progress.insert(id.to_string());
        let mut env = EvalEnv { ctx, vars: self, functions };
        let result = expression.eval(&mut env);
        self.in_progress.remove(id);

        let value = result?;
        self.memo.insert(id.to_string(), value.clone());
        Ok(value)
    }
}
