//! The expression AST and its evaluator (`spec.md` §4.C).

use crate::context::AttributeContext;
use crate::datatype::{Bag, Datatype, Value};
use crate::decision::Status;
use crate::expr::variable::VariableScope;
use crate::functions::{FunctionKind, FunctionRegistry};

/// An expression's value: either a single typed value or a bag. Designators
/// and selectors always produce a bag; most standard functions take and
/// return single values, a handful operate on bags directly (`spec.md`
/// §4.C, §4.D).
#[derive(Debug, Clone)]
pub enum EvalValue {
    Single(Value),
    Bag(Bag),
}

impl EvalValue {
    pub fn datatype(&self) -> Datatype {
        match self {
            EvalValue::Single(v) => v.datatype(),
            EvalValue::Bag(b) => b.datatype(),
        }
    }

    pub fn as_single(&self) -> Result<&Value, Status> {
        match self {
            EvalValue::Single(v) => Ok(v),
            EvalValue::Bag(_) => Err(Status::processing_error("expected a single value, found a bag")),
        }
    }

    pub fn as_bag(&self) -> Result<&Bag, Status> {
        match self {
            EvalValue::Bag(b) => Ok(b),
            EvalValue::Single(v) => Err(Status::processing_error(format!(
                "expected a bag, found a single {}",
                v.datatype()
            ))),
        }
    }

    pub fn into_bag(self) -> Result<Bag, Status> {
        match self {
            EvalValue::Bag(b) => Ok(b),
            EvalValue::Single(v) => Err(Status::processing_error(format!(
                "expected a bag, found a single {}",
                v.datatype()
            ))),
        }
    }

    pub fn truthy(&self) -> Result<bool, Status> {
        match self.as_single()? {
            Value::Boolean(b) => Ok(*b),
            other => Err(Status::processing_error(format!(
                "expected xs:boolean, found {}",
                other.datatype()
            ))),
        }
    }
}

/// A designator resolves a bag of attribute values directly from the
/// context by category/id/datatype/issuer (`spec.md` §3, §4.B).
#[derive(Debug, Clone)]
pub struct Designator {
    pub category: String,
    pub attribute_id: String,
    pub datatype: Datatype,
    pub issuer: Option<String>,
    pub must_be_present: bool,
}

/// A selector resolves a bag via an XPath-style expression evaluated
/// against a `<Content>` element of the named category. This engine treats
/// the expression as an opaque key resolved through the same
/// `AttributeContext`/provider mechanism as a designator — XPath evaluation
/// over request content is a marshalling-layer concern out of scope here
/// (`spec.md` §1).
#[derive(Debug, Clone)]
pub struct Selector {
    pub category: String,
    pub path: String,
    pub datatype: Datatype,
    pub must_be_present: bool,
}

/// The expression AST (`spec.md` §3, §4.C).
#[derive(Debug, Clone)]
pub enum Expression {
    Literal(Value),
    Bag(Datatype, Vec<Expression>),
    Designator(Designator),
    Selector(Selector),
    VariableReference(String),
    Apply { function_id: String, args: Vec<Expression> },
    /// A literal reference to a function, valid only as the first argument
    /// of a higher-order function (`any-of`, `all-of`, `map`, ...). Not a
    /// value in its own right — evaluating it standalone is an error.
    FunctionReference(String),
}

/// Bundles everything `Expression::eval` needs so recursive calls don't
/// thread four separate parameters (`spec.md` §4.C).
pub struct EvalEnv<'a> {
    pub ctx: &'a mut AttributeContext,
    pub vars: &'a mut VariableScope,
    pub functions: &'a FunctionRegistry,
}

impl Expression {
    pub fn eval(&self, env: &mut EvalEnv) -> Result<EvalValue, Status> {
        match self {
            Expression::Literal(v) => Ok(EvalValue::Single(v.clone())),
            Expression::Bag(datatype, items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(item.eval(env)?.as_single()?.clone());
                }
                Bag::new(*datatype, values)
                    .map(EvalValue::Bag)
                    .ok_or_else(|| Status::processing_error("bag literal contains mixed datatypes"))
            }
            Expression::Designator(d) => {
                let bag = env.ctx.get(
                    &d.category,
                    &d.attribute_id,
                    d.datatype,
                    d.issuer.as_deref(),
                    d.must_be_present,
                )?;
                Ok(EvalValue::Bag(bag))
            }
            Expression::Selector(s) => {
                let bag = env.ctx.get(&s.category, &s.path, s.datatype, None, s.must_be_present)?;
                Ok(EvalValue::Bag(bag))
            }
            Expression::VariableReference(id) => env.vars.resolve(id, env.functions, env.ctx),
            Expression::Apply { function_id, args } => eval_apply(function_id, args, env),
            Expression::FunctionReference(id) => Err(Status::processing_error(format!(
                "function reference {id} used outside of a higher-order function"
            ))),
        }
    }
}

fn eval_apply(function_id: &str, args: &[Expression], env: &mut EvalEnv) -> Result<EvalValue, Status> {
    let def = env
        .functions
        .lookup(function_id)
        .ok_or_else(|| Status::processing_error(format!("unknown function {function_id}")))?;

    match &def.kind {
        FunctionKind::ShortCircuitAnd => eval_short_circuit_and(args, env),
        FunctionKind::ShortCircuitOr => eval_short_circuit_or(args, env),
        FunctionKind::ShortCircuitNOf => eval_n_of(args, env),
        FunctionKind::Standard(implementation) => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(arg.eval(env)?);
            }
            implementation(&values)
        }
        FunctionKind::HigherOrder(kind) => eval_higher_order(*kind, args, env),
    }
}

fn inner_predicate<'a>(
    id: &str,
    env: &EvalEnv<'a>,
) -> Result<crate::functions::StandardFn, Status> {
    match env.functions.lookup(id).map(|def| &def.kind) {
        Some(FunctionKind::Standard(f)) => Ok(*f),
        Some(_) => Err(Status::processing_error(format!(
            "function {id} cannot be used as a higher-order function argument"
        ))),
        None => Err(Status::processing_error(format!("unknown function {id}"))),
    }
}

fn function_reference_arg(expr: &Expression) -> Result<&str, Status> {
    match expr {
        Expression::FunctionReference(id) => Ok(id.as_str()),
        _ => Err(Status::processing_error(
            "higher-order functions require a function reference as their first argument",
        )),
    }
}

/// Evaluates `any-of`/`all-of`/`any-of-any`/`all-of-any`/`any-of-all`/
/// `all-of-all`/`map`: the inner predicate is looked up once, then applied
/// across the combinations each variant defines (`spec.md` §4.D).
fn eval_higher_order(
    kind: crate::functions::HigherOrderKind,
    args: &[Expression],
    env: &mut EvalEnv,
) -> Result<EvalValue, Status> {
    use crate::functions::HigherOrderKind::*;

    let (function_expr, rest) = args
        .split_first()
        .ok_or_else(|| Status::processing_error("higher-order function requires a function argument"))?;
    let inner_id = function_reference_arg(function_expr)?;
    let inner = inner_predicate(inner_id, env)?;

    match kind {
        AnyOf | AllOf => {
            if rest.len() != 2 {
                return Err(Status::processing_error("expected (function, value, bag)"));
            }
            let value = rest[0].eval(env)?;
            let bag = rest[1].eval(env)?.into_bag()?;
            let mut any = false;
            for member in bag.values() {
                let result = inner(&[value.clone(), EvalValue::Single(member.clone())])?.truthy()?;
                if kind == AnyOf && result {
                    return Ok(EvalValue::Single(Value::Boolean(true)));
                }
                if kind == AllOf && !result {
                    return Ok(EvalValue::Single(Value::Boolean(false)));
                }
                any = any || result;
            }
            Ok(EvalValue::Single(Value::Boolean(if kind == AnyOf { any } else { true })))
        }
        AnyOfAny | AllOfAny | AnyOfAll | AllOfAll => {
            if rest.len() != 2 {
                return Err(Status::processing_error("expected (function, bag, bag)"));
            }
            let bag1 = rest[0].eval(env)?.into_bag()?;
            let bag2 = rest[1].eval(env)?.into_bag()?;
            let pair_true = |a: &Value, b: &Value| -> Result<bool, Status> {
                inner(&[EvalValue::Single(a.clone()), EvalValue::Single(b.clone())])?.truthy()
            };
            let result = match kind {
                AnyOfAny => {
                    let mut found = false;
                    'outer: for a in bag1.values() {
                        for b in bag2.values() {
                            if pair_true(a, b)? {
                                found = true;
                                break 'outer;
                            }
                        }
                    }
                    found
                }
                AllOfAny => {
                    let mut all = true;
                    for a in bag1.values() {
                        let mut any = false;
                        for b in bag2.values() {
                            if pair_true(a, b)? {
                                any = true;
                                break;
                            }
                        }
                        if !any {
                            all = false;
                            break;
                        }
                    }
                    all
                }
                AnyOfAll => {
                    let mut found = false;
                    for a in bag1.values() {
                        let mut all = true;
                        for b in bag2.values() {
                            if !pair_true(a, b)? {
                                all = false;
                                break;
                            }
                        }
                        if all {
                            found = true;
                            break;
                        }
                    }
                    found
                }
                AllOfAll => {
                    let mut all = true;
                    'outer2: for a in bag1.values() {
                        for b in bag2.values() {
                            if !pair_true(a, b)? {
                                all = false;
                                break 'outer2;
                            }
                        }
                    }
                    all
                }
                _ => unreachable!(),
            };
            Ok(EvalValue::Single(Value::Boolean(result)))
        }
        Map => {
            if rest.len() != 1 {
                return Err(Status::processing_error("expected (function, bag)"));
            }
            let bag = rest[0].eval(env)?.into_bag()?;
            let mut mapped = Vec::with_capacity(bag.len());
            for member in bag.values() {
                mapped.push(inner(&[EvalValue::Single(member.clone())])?.as_single()?.clone());
            }
            let result_datatype = mapped.first().map(|v| v.datatype()).unwrap_or(bag.datatype());
            Bag::new(result_datatype, mapped)
                .map(EvalValue::Bag)
                .ok_or_else(|| Status::processing_error("map produced a heterogeneous bag"))
        }
    }
}

/// `and`: evaluates left-to-right, stops at the first `false`
/// (`spec.md` §4.C/§4.D).
fn eval_short_circuit_and(args: &[Expression], env: &mut EvalEnv) -> Result<EvalValue, Status> {
    for arg in args {
        if !arg.eval(env)?.truthy()? {
            return Ok(EvalValue::Single(Value::Boolean(false)));
        }
    }
    Ok(EvalValue::Single(Value::Boolean(true)))
}

/// `or`: evaluates left-to-right, stops at the first `true`.
fn eval_short_circuit_or(args: &[Expression], env: &mut EvalEnv) -> Result<EvalValue, Status> {
    for arg in args {
        if arg.eval(env)?.truthy()? {
            return Ok(EvalValue::Single(Value::Boolean(true)));
        }
    }
    Ok(EvalValue::Single(Value::Boolean(false)))
}

/// `n-of`: the first argument is the integer threshold `n`; stops as soon
/// as either `n` of the remaining arguments are `true` (result `true`) or
/// it becomes impossible to reach `n` (result `false`).
fn eval_n_of(args: &[Expression], env: &mut EvalEnv) -> Result<EvalValue, Status> {
    let (n_expr, rest) = args
        .split_first()
        .ok_or_else(|| Status::processing_error("n-of requires at least one argument"))?;
    let n = match n_expr.eval(env)?.as_single()? {
        Value::Integer(i) => i
            .to_string()
            .parse::<i64>()
            .map_err(|_| Status::processing_error("n-of threshold out of range"))?,
        other => {
            return Err(Status::processing_error(format!(
                "n-of threshold must be xs:integer, found {}",
                other.datatype()
            )))
        }
    };
    if n <= 0 {
        return Ok(EvalValue::Single(Value::Boolean(true)));
    }
    let mut satisfied = 0i64;
    let mut remaining = rest.len() as i64;
    for arg in rest {
        remaining -= 1;
        if arg.eval(env)?.truthy()? {
            satisfied += 1;
            if satisfied >= n {
                return Ok(EvalValue::Single(Value::Boolean(true)));
            }
        }
        if satisfied + remaining < n {
            return Ok(EvalValue::Single(Value::Boolean(false)));
        }
    }
    Ok(EvalValue::Single(Value::Boolean(satisfied >= n)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Clock;

    fn env_with<'a>(
        ctx: &'a mut AttributeContext,
        vars: &'a mut VariableScope,
        functions: &'a FunctionRegistry,
    ) -> EvalEnv<'a> {
        EvalEnv { ctx, vars, functions }
    }

    fn fresh_ctx() -> AttributeContext {
        AttributeContext::new(vec![], vec![], Clock::wall_clock(), false)
    }

    #[test]
    fn and_short_circuits_on_first_false() {
        let functions = FunctionRegistry::standard();
        let mut ctx = fresh_ctx();
        let mut vars = VariableScope::new();
        let mut env = env_with(&mut ctx, &mut vars, &functions);
        let expr = Expression::Apply {
            function_id: "urn:oasis:names:tc:xacml:1.0:function:and".to_string(),
            args: vec![
                Expression::Literal(Value::Boolean(false)),
                // A designator with must_be_present would error if evaluated;
                // and's short-circuit must prevent that.
                Expression::Designator(Designator {
                    category: "nonexistent".into(),
                    attribute_id: "x".into(),
                    datatype: Datatype::Boolean,
                    issuer: None,
                    must_be_present: true,
                }),
            ],
        };
        let result = expr.eval(&mut env).unwrap();
        assert!(!result.truthy().unwrap());
    }

    #[test]
    fn n_of_stops_early_when_threshold_unreachable() {
        let functions = FunctionRegistry::standard();
        let mut ctx = fresh_ctx();
        let mut vars = VariableScope::new();
        let mut env = env_with(&mut ctx, &mut vars, &functions);
        let expr = Expression::Apply {
            function_id: "urn:oasis:names:tc:xacml:1.0:function:n-of".to_string(),
            args: vec![
                Expression::Literal(Value::Integer(2.into())),
                Expression::Literal(Value::Boolean(false)),
                Expression::Literal(Value::Boolean(false)),
                Expression::Designator(Designator {
                    category: "nonexistent".into(),
                    attribute_id: "x".into(),
                    datatype: Datatype::Boolean,
                    issuer: None,
                    must_be_present: true,
                }),
            ],
        };
        let result = expr.eval(&mut env).unwrap();
        assert!(!result.truthy().unwrap());
    }

    #[test]
    fn bag_literal_rejects_mixed_datatypes() {
        let functions = FunctionRegistry::standard();
        let mut ctx = fresh_ctx();
        let mut vars = VariableScope::new();
        let mut env = env_with(&mut ctx, &mut vars, &functions);
        let expr = Expression::Bag(
            Datatype::String,
            vec![
                Expression::Literal(Value::String("a".into())),
                Expression::Literal(Value::Boolean(true)),
            ],
        );
        assert!(expr.eval(&mut env).is_err());
    }
}
