//! Tree-walking evaluator for parsed formula bodies.
//!
//! Evaluation is deterministic and side-effect-free with respect to the
//! namespace: the only mutable state is the interpreter's own local
//! variables and the warning list. Arithmetic uses checked decimal
//! operations, so failures surface as typed errors instead of wrapping or
//! panicking.

use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value as JsonValue;

use super::EvalError;
use super::ast::{BinaryOp, Expr, MathFn, Path, Program, Stmt, UnaryOp};
use super::namespace::{Namespace, Resolution};

/// A runtime value: formulas compute with numbers and booleans only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    /// A decimal number.
    Number(Decimal),
    /// A boolean, produced by comparisons and consumed by conditions.
    Bool(bool),
}

impl Value {
    fn as_number(self, context: &str) -> Result<Decimal, EvalError> {
        match self {
            Value::Number(n) => Ok(n),
            Value::Bool(_) => Err(EvalError::TypeMismatch {
                message: format!("{} expects a number, found a boolean", context),
            }),
        }
    }

    fn as_bool(self, context: &str) -> Result<bool, EvalError> {
        match self {
            Value::Bool(b) => Ok(b),
            Value::Number(_) => Err(EvalError::TypeMismatch {
                message: format!("{} expects a boolean, found a number", context),
            }),
        }
    }
}

/// The result of successfully evaluating one formula body.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// The computed numeric value.
    pub value: Decimal,
    /// Paths that resolved to `0` because they were absent.
    pub warnings: Vec<String>,
}

/// Evaluates a parsed formula body against a namespace.
///
/// Expression bodies yield their expression's value; script bodies run to
/// a `return`. The final value must be numeric. Missing namespace paths
/// default to `0` and are reported in [`Outcome::warnings`]; every other
/// failure is a typed [`EvalError`] the caller records and recovers from.
pub fn evaluate(program: &Program, namespace: &Namespace) -> Result<Outcome, EvalError> {
    let mut interpreter = Interpreter {
        namespace,
        scalars: HashMap::new(),
        elements: HashMap::new(),
        warnings: Vec::new(),
    };

    let value = match program {
        Program::Expression(expr) => interpreter.eval(expr)?,
        Program::Script(stmts) => match interpreter.exec_all(stmts)? {
            Flow::Return(value) => value,
            Flow::Break => return Err(EvalError::BreakOutsideLoop),
            Flow::Normal => return Err(EvalError::NoReturnValue),
        },
    };

    match value {
        Value::Number(value) => Ok(Outcome {
            value,
            warnings: interpreter.warnings,
        }),
        Value::Bool(_) => Err(EvalError::TypeMismatch {
            message: "formula produced a boolean, expected a number".to_string(),
        }),
    }
}

/// How a statement's execution ended.
enum Flow {
    Normal,
    Break,
    Return(Value),
}

struct Interpreter<'a> {
    namespace: &'a Namespace,
    /// `let` bindings.
    scalars: HashMap<String, Value>,
    /// Loop variables, each bound to one array element.
    elements: HashMap<String, JsonValue>,
    warnings: Vec<String>,
}

impl<'a> Interpreter<'a> {
    // --- Statements ---

    fn exec_all(&mut self, stmts: &[Stmt]) -> Result<Flow, EvalError> {
        for stmt in stmts {
            match self.exec(stmt)? {
                Flow::Normal => {}
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec(&mut self, stmt: &Stmt) -> Result<Flow, EvalError> {
        match stmt {
            Stmt::Let { name, value } => {
                let value = self.eval(value)?;
                self.scalars.insert(name.clone(), value);
                Ok(Flow::Normal)
            }
            Stmt::Assign { name, value } => {
                if !self.scalars.contains_key(name) {
                    return Err(EvalError::AssignmentToUndeclared { name: name.clone() });
                }
                let value = self.eval(value)?;
                self.scalars.insert(name.clone(), value);
                Ok(Flow::Normal)
            }
            Stmt::If {
                condition,
                then_body,
                else_body,
            } => {
                if self.eval(condition)?.as_bool("if condition")? {
                    self.exec_all(then_body)
                } else {
                    self.exec_all(else_body)
                }
            }
            Stmt::For {
                variable,
                array,
                body,
            } => self.exec_for(variable, array, body),
            Stmt::Break => Ok(Flow::Break),
            Stmt::Return(expr) => Ok(Flow::Return(self.eval(expr)?)),
        }
    }

    fn exec_for(&mut self, variable: &str, array: &Path, body: &[Stmt]) -> Result<Flow, EvalError> {
        if self.scalars.contains_key(&array.base) || self.elements.contains_key(&array.base) {
            return Err(EvalError::NotAnArray {
                path: array.dotted(),
            });
        }

        let items = match self.namespace.resolve(&array.base, &array.segments) {
            Resolution::Value(JsonValue::Array(items)) => items,
            Resolution::Value(_) | Resolution::Missing => {
                return Err(EvalError::NotAnArray {
                    path: array.dotted(),
                });
            }
            Resolution::UnknownRoot => {
                return Err(EvalError::UnknownVariable {
                    name: array.base.clone(),
                });
            }
        };

        // The loop variable shadows any same-named variable from an outer
        // loop; the shadowed binding is restored afterwards.
        let shadowed = self.elements.remove(variable);
        let mut flow = Flow::Normal;
        for item in items {
            self.elements.insert(variable.to_string(), item.clone());
            match self.exec_all(body)? {
                Flow::Normal => {}
                Flow::Break => break,
                returned @ Flow::Return(_) => {
                    flow = returned;
                    break;
                }
            }
        }
        self.elements.remove(variable);
        if let Some(previous) = shadowed {
            self.elements.insert(variable.to_string(), previous);
        }
        Ok(flow)
    }

    // --- Expressions ---

    fn eval(&mut self, expr: &Expr) -> Result<Value, EvalError> {
        match expr {
            Expr::Number(value) => Ok(Value::Number(*value)),
            Expr::Bool(value) => Ok(Value::Bool(*value)),
            Expr::Path(path) => self.eval_path(path),
            Expr::Call { function, args } => self.eval_call(*function, args),
            Expr::Unary { op, operand } => {
                let operand = self.eval(operand)?;
                match op {
                    UnaryOp::Neg => Ok(Value::Number(-operand.as_number("negation")?)),
                    UnaryOp::Not => Ok(Value::Bool(!operand.as_bool("'!'")?)),
                }
            }
            Expr::Binary { op, lhs, rhs } => self.eval_binary(*op, lhs, rhs),
            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.eval(condition)?.as_bool("ternary condition")? {
                    self.eval(then_branch)
                } else {
                    self.eval(else_branch)
                }
            }
        }
    }

    fn eval_path(&mut self, path: &Path) -> Result<Value, EvalError> {
        if path.segments.is_empty() {
            if let Some(value) = self.scalars.get(&path.base) {
                return Ok(*value);
            }
            if self.elements.contains_key(&path.base) {
                return Err(EvalError::TypeMismatch {
                    message: format!("loop variable '{}' is not a scalar", path.base),
                });
            }
        } else if let Some(element) = self.elements.get(&path.base) {
            let mut current = element;
            for segment in &path.segments {
                match current.get(segment) {
                    Some(next) => current = next,
                    None => return Ok(self.default_for_missing(&path.dotted())),
                }
            }
            let current = current.clone();
            return self.scalar_from_json(&current, &path.dotted());
        } else if self.scalars.contains_key(&path.base) {
            return Err(EvalError::TypeMismatch {
                message: format!("variable '{}' has no fields", path.base),
            });
        }

        match self.namespace.resolve(&path.base, &path.segments) {
            Resolution::Value(json) => {
                let json = json.clone();
                self.scalar_from_json(&json, &path.dotted())
            }
            Resolution::Missing => Ok(self.default_for_missing(&path.dotted())),
            Resolution::UnknownRoot => Err(EvalError::UnknownVariable {
                name: path.base.clone(),
            }),
        }
    }

    /// Best-effort namespace access: an absent path reads as zero, with a
    /// warning recorded so the substitution is visible to operators.
    fn default_for_missing(&mut self, path: &str) -> Value {
        self.warnings
            .push(format!("'{}' resolved to 0 (missing value)", path));
        Value::Number(Decimal::ZERO)
    }

    fn scalar_from_json(&mut self, json: &JsonValue, path: &str) -> Result<Value, EvalError> {
        match json {
            JsonValue::Bool(b) => Ok(Value::Bool(*b)),
            JsonValue::String(s) => {
                Decimal::from_str(s)
                    .map(Value::Number)
                    .map_err(|_| EvalError::TypeMismatch {
                        message: format!("'{}' is not numeric", path),
                    })
            }
            JsonValue::Number(n) => {
                let decimal = if let Some(i) = n.as_i64() {
                    Some(Decimal::from(i))
                } else if let Some(u) = n.as_u64() {
                    Some(Decimal::from(u))
                } else {
                    n.as_f64().and_then(Decimal::from_f64)
                };
                decimal.map(Value::Number).ok_or(EvalError::Overflow)
            }
            JsonValue::Null => Ok(self.default_for_missing(path)),
            JsonValue::Array(_) | JsonValue::Object(_) => Err(EvalError::TypeMismatch {
                message: format!("'{}' does not resolve to a scalar", path),
            }),
        }
    }

    fn eval_call(&mut self, function: MathFn, args: &[Expr]) -> Result<Value, EvalError> {
        let mut numbers = Vec::with_capacity(args.len());
        for arg in args {
            numbers.push(self.eval(arg)?.as_number(function.name())?);
        }
        let value = match function {
            MathFn::Min => numbers[0].min(numbers[1]),
            MathFn::Max => numbers[0].max(numbers[1]),
            MathFn::Abs => numbers[0].abs(),
            MathFn::Floor => numbers[0].floor(),
            MathFn::Ceil => numbers[0].ceil(),
            MathFn::Round => {
                numbers[0].round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            }
        };
        Ok(Value::Number(value))
    }

    fn eval_binary(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> Result<Value, EvalError> {
        // Boolean operators short-circuit; everything else evaluates both
        // sides eagerly.
        match op {
            BinaryOp::And => {
                return if self.eval(lhs)?.as_bool("'&&'")? {
                    Ok(Value::Bool(self.eval(rhs)?.as_bool("'&&'")?))
                } else {
                    Ok(Value::Bool(false))
                };
            }
            BinaryOp::Or => {
                return if self.eval(lhs)?.as_bool("'||'")? {
                    Ok(Value::Bool(true))
                } else {
                    Ok(Value::Bool(self.eval(rhs)?.as_bool("'||'")?))
                };
            }
            _ => {}
        }

        let left = self.eval(lhs)?;
        let right = self.eval(rhs)?;

        if op == BinaryOp::Eq || op == BinaryOp::NotEq {
            let equal = match (left, right) {
                (Value::Number(a), Value::Number(b)) => a == b,
                (Value::Bool(a), Value::Bool(b)) => a == b,
                _ => {
                    return Err(EvalError::TypeMismatch {
                        message: "cannot compare a number with a boolean".to_string(),
                    });
                }
            };
            return Ok(Value::Bool(if op == BinaryOp::Eq { equal } else { !equal }));
        }

        let a = left.as_number(op_name(op))?;
        let b = right.as_number(op_name(op))?;
        match op {
            BinaryOp::Add => a.checked_add(b).map(Value::Number).ok_or(EvalError::Overflow),
            BinaryOp::Sub => a.checked_sub(b).map(Value::Number).ok_or(EvalError::Overflow),
            BinaryOp::Mul => a.checked_mul(b).map(Value::Number).ok_or(EvalError::Overflow),
            BinaryOp::Div => {
                if b.is_zero() {
                    Err(EvalError::DivisionByZero)
                } else {
                    a.checked_div(b).map(Value::Number).ok_or(EvalError::Overflow)
                }
            }
            BinaryOp::Rem => {
                if b.is_zero() {
                    Err(EvalError::DivisionByZero)
                } else {
                    a.checked_rem(b).map(Value::Number).ok_or(EvalError::Overflow)
                }
            }
            BinaryOp::Lt => Ok(Value::Bool(a < b)),
            BinaryOp::LtEq => Ok(Value::Bool(a <= b)),
            BinaryOp::Gt => Ok(Value::Bool(a > b)),
            BinaryOp::GtEq => Ok(Value::Bool(a >= b)),
            BinaryOp::And | BinaryOp::Or | BinaryOp::Eq | BinaryOp::NotEq => unreachable!(),
        }
    }
}

fn op_name(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "'+'",
        BinaryOp::Sub => "'-'",
        BinaryOp::Mul => "'*'",
        BinaryOp::Div => "'/'",
        BinaryOp::Rem => "'%'",
        BinaryOp::Lt => "'<'",
        BinaryOp::LtEq => "'<='",
        BinaryOp::Gt => "'>'",
        BinaryOp::GtEq => "'>='",
        BinaryOp::Eq => "'=='",
        BinaryOp::NotEq => "'!='",
        BinaryOp::And => "'&&'",
        BinaryOp::Or => "'||'",
    }
}
