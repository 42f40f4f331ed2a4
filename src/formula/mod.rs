//! The formula expression language and its sandboxed evaluator.
//!
//! Formula bodies are short strings in a restricted expression language.
//! They are parsed to an AST and run by a tree-walking interpreter with
//! exactly four things in scope: the read-only `input`, `config`, and
//! `result` namespaces, and a fixed set of math functions (`min`, `max`,
//! `abs`, `floor`, `ceil`, `round`). Nothing else is reachable from a
//! formula body: no I/O, no process state, no host code.
//!
//! Two body shapes exist, inferred from the text:
//!
//! - **Expression**: a single expression, e.g.
//!   `input.base_salary * config.deposit_rate`.
//! - **Script**: statements separated by `;`, ending in `return`, with
//!   `let`, assignment, `if`/`else`, `break`, and `for <var> in <path>`
//!   over arrays from the namespace (typically a bracket table).
//!
//! Missing namespace paths resolve to `0` and are reported as warnings so
//! a typo in a configuration path degrades visibly instead of silently.

mod ast;
mod interpreter;
mod lexer;
mod namespace;
mod parser;

use thiserror::Error;

pub use ast::{BinaryOp, Expr, MathFn, Path, Program, Stmt, UnaryOp};
pub use interpreter::{Outcome, Value, evaluate};
pub use namespace::{Namespace, Resolution};

/// A recoverable failure from parsing or evaluating one formula body.
///
/// These never abort a calculation: the calling graph records the error
/// against the formula's name, degrades the field to `0`, and continues.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// The body is not valid formula syntax.
    #[error("syntax error: {message}")]
    Syntax {
        /// What the parser or lexer rejected.
        message: String,
    },

    /// A call names a function outside the fixed math set.
    #[error("unknown function: {name}")]
    UnknownFunction {
        /// The name that was called.
        name: String,
    },

    /// A math function was called with the wrong number of arguments.
    #[error("{name} expects {expected} argument(s), found {found}")]
    WrongArity {
        /// The function name.
        name: String,
        /// How many arguments it takes.
        expected: usize,
        /// How many were supplied.
        found: usize,
    },

    /// A bare identifier is neither a local variable nor a namespace root.
    #[error("unknown variable: {name}")]
    UnknownVariable {
        /// The identifier that failed to resolve.
        name: String,
    },

    /// An assignment targets a variable that was never declared.
    #[error("assignment to undeclared variable: {name}")]
    AssignmentToUndeclared {
        /// The assignment target.
        name: String,
    },

    /// An operation was applied to operands of the wrong type.
    #[error("type mismatch: {message}")]
    TypeMismatch {
        /// Which operation rejected which operand.
        message: String,
    },

    /// Division or remainder by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// An arithmetic operation exceeded the numeric range.
    #[error("numeric overflow")]
    Overflow,

    /// A `for` loop target did not resolve to an array.
    #[error("'{path}' is not an array")]
    NotAnArray {
        /// The dotted path that was iterated.
        path: String,
    },

    /// A script finished without executing `return`.
    #[error("script ended without returning a value")]
    NoReturnValue,

    /// `break` executed outside of any loop.
    #[error("break outside of a loop")]
    BreakOutsideLoop,
}
