use crate::value::{is_close, Environment, Value, DEFAULT_ABS_TOLERANCE, DEFAULT_REL_TOLERANCE};

use super::parser::{BinOp, CmpOp, Expr, Stmt, UnaryOp};

pub type Result<T> = std::result::Result<T, EvalError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("Undefined variable '{0}'")]
    UndefinedVar(String),

    #[error("Unknown function '{0}'")]
    UnknownFunction(String),

    #[error("{func}() takes {expected} argument(s) but {got} were given")]
    Arity {
        func: String,
        expected: usize,
        got: usize,
    },

    #[error("{func}() expects a {expected} argument, got {got}")]
    ArgType {
        func: String,
        expected: &'static str,
        got: &'static str,
    },

    #[error("Unsupported operand for '{op}': {kind}")]
    UnsupportedOperand { op: &'static str, kind: &'static str },

    #[error("Division by zero")]
    DivisionByZero,
}

/// Evaluates prompt statements against a learner environment.
///
/// Closeness tolerances follow numpy's `isclose` defaults and can be
/// overridden from the grading config.
#[derive(Debug, Clone)]
pub struct Evaluator {
    rel_tolerance: f64,
    abs_tolerance: f64,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self {
            rel_tolerance: DEFAULT_REL_TOLERANCE,
            abs_tolerance: DEFAULT_ABS_TOLERANCE,
        }
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tolerances(mut self, rel: f64, abs: f64) -> Self {
        self.rel_tolerance = rel;
        self.abs_tolerance = abs;
        self
    }

    /// Executes one statement. Assignments bind into `env` and produce no
    /// output; expressions produce their value.
    pub fn eval_stmt(&self, stmt: &Stmt, env: &mut Environment) -> Result<Option<Value>> {
        match stmt {
            Stmt::Assign { name, expr } => {
                let v = self.eval_expr(expr, env)?;
                env.bind(name.clone(), v);
                Ok(None)
            }
            Stmt::Expr(expr) => self.eval_expr(expr, env).map(Some),
        }
    }

    pub fn eval_expr(&self, expr: &Expr, env: &Environment) -> Result<Value> {
        use Expr::*;
        match expr {
            Number(x) => Ok(Value::Number(*x)),
            Bool(b) => Ok(Value::Bool(*b)),
            Str(s) => Ok(Value::Str(s.clone())),
            Unset => Ok(Value::Unset),

            Var(name) => env
                .get(name)
                .cloned()
                .ok_or_else(|| EvalError::UndefinedVar(name.clone())),

            Unary { op, operand } => self.eval_unary(*op, operand, env),
            Binary { op, lhs, rhs } => self.eval_binary(*op, lhs, rhs, env),

            Comparison { first, rest } => {
                let mut lhs = self.eval_expr(first, env)?;
                for (op, rhs_expr) in rest {
                    let rhs = self.eval_expr(rhs_expr, env)?;
                    if !compare(*op, &lhs, &rhs)? {
                        return Ok(Value::Bool(false));
                    }
                    lhs = rhs;
                }
                Ok(Value::Bool(true))
            }

            IsUnset { operand, negated } => {
                let v = self.eval_expr(operand, env)?;
                Ok(Value::Bool(v.is_unset() != *negated))
            }

            Call { func, args } => self.eval_call(func, args, env),
        }
    }

    fn eval_unary(&self, op: UnaryOp, operand: &Expr, env: &Environment) -> Result<Value> {
        let v = self.eval_expr(operand, env)?;
        match (op, v) {
            (UnaryOp::Neg, Value::Number(x)) => Ok(Value::Number(-x)),
            (UnaryOp::Neg, v) => Err(EvalError::UnsupportedOperand {
                op: "-",
                kind: v.kind(),
            }),
            (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
            (UnaryOp::Not, v) => Err(EvalError::UnsupportedOperand {
                op: "not",
                kind: v.kind(),
            }),
        }
    }

    fn eval_binary(&self, op: BinOp, lhs: &Expr, rhs: &Expr, env: &Environment) -> Result<Value> {
        // `and` / `or` short-circuit
        if matches!(op, BinOp::And | BinOp::Or) {
            let op_name = if op == BinOp::And { "and" } else { "or" };
            let l = self.expect_bool(lhs, env, op_name)?;
            return match (op, l) {
                (BinOp::And, false) => Ok(Value::Bool(false)),
                (BinOp::Or, true) => Ok(Value::Bool(true)),
                _ => Ok(Value::Bool(self.expect_bool(rhs, env, op_name)?)),
            };
        }

        let op_sym = match op {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::And | BinOp::Or => unreachable!(),
        };
        let l = self.expect_number(lhs, env, op_sym)?;
        let r = self.expect_number(rhs, env, op_sym)?;
        let x = match op {
            BinOp::Add => l + r,
            BinOp::Sub => l - r,
            BinOp::Mul => l * r,
            BinOp::Div => {
                if r == 0.0 {
                    return Err(EvalError::DivisionByZero);
                }
                l / r
            }
            BinOp::And | BinOp::Or => unreachable!(),
        };
        Ok(Value::Number(x))
    }

    fn eval_call(&self, func: &str, args: &[Expr], env: &Environment) -> Result<Value> {
        match func {
            "defined" => {
                let [arg] = args else {
                    return Err(EvalError::Arity {
                        func: func.to_owned(),
                        expected: 1,
                        got: args.len(),
                    });
                };
                match self.eval_expr(arg, env)? {
                    Value::Str(name) => Ok(Value::Bool(env.defines(&name))),
                    v => Err(EvalError::ArgType {
                        func: func.to_owned(),
                        expected: "string",
                        got: v.kind(),
                    }),
                }
            }
            "isclose" => {
                let [a, b] = args else {
                    return Err(EvalError::Arity {
                        func: func.to_owned(),
                        expected: 2,
                        got: args.len(),
                    });
                };
                let a = self.expect_number_arg(func, a, env)?;
                let b = self.expect_number_arg(func, b, env)?;
                Ok(Value::Bool(is_close(
                    a,
                    b,
                    self.rel_tolerance,
                    self.abs_tolerance,
                )))
            }
            _ => Err(EvalError::UnknownFunction(func.to_owned())),
        }
    }

    fn expect_bool(&self, expr: &Expr, env: &Environment, op: &'static str) -> Result<bool> {
        match self.eval_expr(expr, env)? {
            Value::Bool(b) => Ok(b),
            v => Err(EvalError::UnsupportedOperand { op, kind: v.kind() }),
        }
    }

    fn expect_number(&self, expr: &Expr, env: &Environment, op: &'static str) -> Result<f64> {
        match self.eval_expr(expr, env)? {
            Value::Number(x) => Ok(x),
            v => Err(EvalError::UnsupportedOperand { op, kind: v.kind() }),
        }
    }

    fn expect_number_arg(&self, func: &str, expr: &Expr, env: &Environment) -> Result<f64> {
        match self.eval_expr(expr, env)? {
            Value::Number(x) => Ok(x),
            v => Err(EvalError::ArgType {
                func: func.to_owned(),
                expected: "number",
                got: v.kind(),
            }),
        }
    }
}

fn compare(op: CmpOp, lhs: &Value, rhs: &Value) -> Result<bool> {
    use Value::*;
    match op {
        // equality works across kinds: different kinds are simply unequal
        CmpOp::Eq => Ok(lhs == rhs),
        CmpOp::Ne => Ok(lhs != rhs),

        // ordering is defined for numbers only
        _ => {
            let (Number(l), Number(r)) = (lhs, rhs) else {
                let kind = if matches!(lhs, Number(_)) {
                    rhs.kind()
                } else {
                    lhs.kind()
                };
                return Err(EvalError::UnsupportedOperand {
                    op: op.symbol(),
                    kind,
                });
            };
            Ok(match op {
                CmpOp::Lt => l < r,
                CmpOp::Le => l <= r,
                CmpOp::Gt => l > r,
                CmpOp::Ge => l >= r,
                CmpOp::Eq | CmpOp::Ne => unreachable!(),
            })
        }
    }
}
