//! Abstract syntax tree for the formula language.
//!
//! The AST is deliberately small: arithmetic, comparisons, boolean logic,
//! a ternary, dot-path reads, a fixed math function set, and (for script
//! bodies) a handful of statements. Everything a formula can do is
//! enumerated here; there is no escape hatch into host code.

use std::collections::BTreeSet;

use rust_decimal::Decimal;

/// A unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Arithmetic negation of a number.
    Neg,
    /// Logical negation of a boolean.
    Not,
}

/// A binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
    /// `==`
    Eq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `&&` (short-circuiting)
    And,
    /// `||` (short-circuiting)
    Or,
}

/// One of the fixed math functions available to formulas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathFn {
    /// Smaller of two numbers.
    Min,
    /// Larger of two numbers.
    Max,
    /// Absolute value.
    Abs,
    /// Round toward negative infinity.
    Floor,
    /// Round toward positive infinity.
    Ceil,
    /// Round to the nearest integer, halves away from zero.
    Round,
}

impl MathFn {
    /// Looks a function up by its source name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            "abs" => Some(Self::Abs),
            "floor" => Some(Self::Floor),
            "ceil" => Some(Self::Ceil),
            "round" => Some(Self::Round),
            _ => None,
        }
    }

    /// The source name of the function.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Min => "min",
            Self::Max => "max",
            Self::Abs => "abs",
            Self::Floor => "floor",
            Self::Ceil => "ceil",
            Self::Round => "round",
        }
    }

    /// How many arguments the function takes.
    pub fn arity(&self) -> usize {
        match self {
            Self::Min | Self::Max => 2,
            Self::Abs | Self::Floor | Self::Ceil | Self::Round => 1,
        }
    }
}

/// A dotted path, e.g. `config.deductions.dependents.deduction_per_dependent`.
///
/// The base is resolved at evaluation time: local variables shadow nothing
/// because the namespace roots (`input`, `config`, `result`) are reserved
/// words for declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    /// The leading identifier.
    pub base: String,
    /// The remaining segments, possibly empty.
    pub segments: Vec<String>,
}

impl Path {
    /// Renders the path in `a.b.c` form for error messages.
    pub fn dotted(&self) -> String {
        let mut out = self.base.clone();
        for segment in &self.segments {
            out.push('.');
            out.push_str(segment);
        }
        out
    }
}

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A numeric literal.
    Number(Decimal),
    /// A boolean literal.
    Bool(bool),
    /// A variable or namespace path read.
    Path(Path),
    /// A math function call.
    Call {
        /// The function being called.
        function: MathFn,
        /// Argument expressions, length matching the function's arity.
        args: Vec<Expr>,
    },
    /// A unary operation.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: Box<Expr>,
    },
    /// A binary operation.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left-hand side.
        lhs: Box<Expr>,
        /// Right-hand side.
        rhs: Box<Expr>,
    },
    /// `condition ? then : else`, lazily evaluated.
    Ternary {
        /// The boolean condition.
        condition: Box<Expr>,
        /// Value when the condition is true.
        then_branch: Box<Expr>,
        /// Value when the condition is false.
        else_branch: Box<Expr>,
    },
}

/// A statement in a script body.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `let name = expr;`
    Let {
        /// The declared variable.
        name: String,
        /// Its initial value.
        value: Expr,
    },
    /// `name = expr;` over a previously declared variable.
    Assign {
        /// The assignment target.
        name: String,
        /// The new value.
        value: Expr,
    },
    /// `if cond { ... } else { ... }`
    If {
        /// The boolean condition.
        condition: Expr,
        /// Statements when true.
        then_body: Vec<Stmt>,
        /// Statements when false (empty when there is no `else`).
        else_body: Vec<Stmt>,
    },
    /// `for var in path { ... }` over an array from the namespace.
    For {
        /// The loop variable, bound to each element in turn.
        variable: String,
        /// The array path (typically a bracket table in `config`).
        array: Path,
        /// The loop body.
        body: Vec<Stmt>,
    },
    /// `break;`
    Break,
    /// `return expr;`
    Return(Expr),
}

/// A parsed formula body: either a single expression or a script.
#[derive(Debug, Clone, PartialEq)]
pub enum Program {
    /// A single expression whose value is the formula's value.
    Expression(Expr),
    /// Statements executed in order; must terminate via `return`.
    Script(Vec<Stmt>),
}

impl Program {
    /// Parses a formula body, inferring its shape from the text: a body
    /// containing `;` is a script, anything else is a single expression.
    pub fn parse(body: &str) -> Result<Self, super::EvalError> {
        super::parser::parse(body)
    }

    /// Collects the `result.*` names this program reads.
    ///
    /// Used to statically check the evaluation order: every collected name
    /// must be computed before this formula runs.
    pub fn result_references(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        match self {
            Program::Expression(expr) => collect_expr(expr, &mut names),
            Program::Script(stmts) => collect_stmts(stmts, &mut names),
        }
        names
    }
}

fn collect_stmts(stmts: &[Stmt], names: &mut BTreeSet<String>) {
    for stmt in stmts {
        match stmt {
            Stmt::Let { value, .. } | Stmt::Assign { value, .. } | Stmt::Return(value) => {
                collect_expr(value, names);
            }
            Stmt::If {
                condition,
                then_body,
                else_body,
            } => {
                collect_expr(condition, names);
                collect_stmts(then_body, names);
                collect_stmts(else_body, names);
            }
            Stmt::For { array, body, .. } => {
                collect_path(array, names);
                collect_stmts(body, names);
            }
            Stmt::Break => {}
        }
    }
}

fn collect_expr(expr: &Expr, names: &mut BTreeSet<String>) {
    match expr {
        Expr::Number(_) | Expr::Bool(_) => {}
        Expr::Path(path) => collect_path(path, names),
        Expr::Call { args, .. } => {
            for arg in args {
                collect_expr(arg, names);
            }
        }
        Expr::Unary { operand, .. } => collect_expr(operand, names),
        Expr::Binary { lhs, rhs, .. } => {
            collect_expr(lhs, names);
            collect_expr(rhs, names);
        }
        Expr::Ternary {
            condition,
            then_branch,
            else_branch,
        } => {
            collect_expr(condition, names);
            collect_expr(then_branch, names);
            collect_expr(else_branch, names);
        }
    }
}

fn collect_path(path: &Path, names: &mut BTreeSet<String>) {
    if path.base == "result" {
        if let Some(first) = path.segments.first() {
            names.insert(first.clone());
        }
    }
}
