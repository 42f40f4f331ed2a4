//! Recursive-descent parser for formula bodies.
//!
//! Precedence, loosest first: ternary, `||`, `&&`, equality, comparison,
//! additive, multiplicative, unary, primary. Script statements are parsed
//! when the body contains a `;`.

use super::EvalError;
use super::ast::{BinaryOp, Expr, MathFn, Path, Program, Stmt, UnaryOp};
use super::lexer::{Token, tokenize};

/// Names that cannot be declared or assigned inside a script: the
/// namespace roots must always mean the namespace.
const RESERVED: [&str; 3] = ["input", "config", "result"];

/// Parses a formula body into a [`Program`].
pub fn parse(body: &str) -> Result<Program, EvalError> {
    let tokens = tokenize(body)?;
    let mut parser = Parser { tokens, pos: 0 };

    if body.contains(';') {
        let stmts = parser.statements_until(None)?;
        if stmts.is_empty() {
            return Err(EvalError::Syntax {
                message: "empty script body".to_string(),
            });
        }
        Ok(Program::Script(stmts))
    } else {
        let expr = parser.expression()?;
        parser.expect_end()?;
        Ok(Program::Expression(expr))
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token, context: &str) -> Result<(), EvalError> {
        if self.eat(&token) {
            Ok(())
        } else {
            Err(EvalError::Syntax {
                message: format!("expected {:?} {}, found {:?}", token, context, self.peek()),
            })
        }
    }

    fn expect_end(&self) -> Result<(), EvalError> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(EvalError::Syntax {
                message: format!("unexpected trailing {:?}", token),
            }),
        }
    }

    fn expect_ident(&mut self, context: &str) -> Result<String, EvalError> {
        match self.next() {
            Some(Token::Ident(name)) => Ok(name),
            other => Err(EvalError::Syntax {
                message: format!("expected identifier {}, found {:?}", context, other),
            }),
        }
    }

    // --- Statements ---

    /// Parses statements until the closing token (or end of input when
    /// `closing` is `None`).
    fn statements_until(&mut self, closing: Option<&Token>) -> Result<Vec<Stmt>, EvalError> {
        let mut stmts = Vec::new();
        loop {
            match (self.peek(), closing) {
                (None, None) => return Ok(stmts),
                (None, Some(token)) => {
                    return Err(EvalError::Syntax {
                        message: format!("expected {:?} before end of body", token),
                    });
                }
                (Some(token), Some(close)) if token == close => return Ok(stmts),
                _ => stmts.push(self.statement()?),
            }
        }
    }

    fn statement(&mut self) -> Result<Stmt, EvalError> {
        match self.peek() {
            Some(Token::Let) => {
                self.pos += 1;
                let name = self.declared_name("after 'let'")?;
                self.expect(Token::Assign, "after let binding name")?;
                let value = self.expression()?;
                self.expect(Token::Semicolon, "after let statement")?;
                Ok(Stmt::Let { name, value })
            }
            Some(Token::Return) => {
                self.pos += 1;
                let value = self.expression()?;
                self.expect(Token::Semicolon, "after return value")?;
                Ok(Stmt::Return(value))
            }
            Some(Token::Break) => {
                self.pos += 1;
                self.expect(Token::Semicolon, "after break")?;
                Ok(Stmt::Break)
            }
            Some(Token::If) => self.if_statement(),
            Some(Token::For) => {
                self.pos += 1;
                let variable = self.declared_name("after 'for'")?;
                self.expect(Token::In, "after loop variable")?;
                let array = self.path()?;
                self.expect(Token::LBrace, "to open loop body")?;
                let body = self.statements_until(Some(&Token::RBrace))?;
                self.expect(Token::RBrace, "to close loop body")?;
                Ok(Stmt::For {
                    variable,
                    array,
                    body,
                })
            }
            Some(Token::Ident(_)) => {
                let name = self.expect_ident("at start of statement")?;
                if RESERVED.contains(&name.as_str()) {
                    return Err(EvalError::Syntax {
                        message: format!("cannot assign to reserved name '{}'", name),
                    });
                }
                self.expect(Token::Assign, "in assignment")?;
                let value = self.expression()?;
                self.expect(Token::Semicolon, "after assignment")?;
                Ok(Stmt::Assign { name, value })
            }
            other => Err(EvalError::Syntax {
                message: format!("expected a statement, found {:?}", other),
            }),
        }
    }

    fn if_statement(&mut self) -> Result<Stmt, EvalError> {
        self.expect(Token::If, "at start of conditional")?;
        let condition = self.expression()?;
        self.expect(Token::LBrace, "to open if body")?;
        let then_body = self.statements_until(Some(&Token::RBrace))?;
        self.expect(Token::RBrace, "to close if body")?;

        let else_body = if self.eat(&Token::Else) {
            if self.peek() == Some(&Token::If) {
                vec![self.if_statement()?]
            } else {
                self.expect(Token::LBrace, "to open else body")?;
                let body = self.statements_until(Some(&Token::RBrace))?;
                self.expect(Token::RBrace, "to close else body")?;
                body
            }
        } else {
            Vec::new()
        };

        Ok(Stmt::If {
            condition,
            then_body,
            else_body,
        })
    }

    /// Reads an identifier being declared, rejecting the namespace roots.
    fn declared_name(&mut self, context: &str) -> Result<String, EvalError> {
        let name = self.expect_ident(context)?;
        if RESERVED.contains(&name.as_str()) {
            return Err(EvalError::Syntax {
                message: format!("cannot declare reserved name '{}'", name),
            });
        }
        Ok(name)
    }

    // --- Expressions ---

    fn expression(&mut self) -> Result<Expr, EvalError> {
        self.ternary()
    }

    fn ternary(&mut self) -> Result<Expr, EvalError> {
        let condition = self.or()?;
        if !self.eat(&Token::Question) {
            return Ok(condition);
        }
        let then_branch = self.expression()?;
        self.expect(Token::Colon, "between ternary branches")?;
        let else_branch = self.ternary()?;
        Ok(Expr::Ternary {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        })
    }

    fn or(&mut self) -> Result<Expr, EvalError> {
        let mut expr = self.and()?;
        while self.eat(&Token::OrOr) {
            let rhs = self.and()?;
            expr = binary(BinaryOp::Or, expr, rhs);
        }
        Ok(expr)
    }

    fn and(&mut self) -> Result<Expr, EvalError> {
        let mut expr = self.equality()?;
        while self.eat(&Token::AndAnd) {
            let rhs = self.equality()?;
            expr = binary(BinaryOp::And, expr, rhs);
        }
        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr, EvalError> {
        let mut expr = self.comparison()?;
        loop {
            let op = match self.peek() {
                Some(Token::EqEq) => BinaryOp::Eq,
                Some(Token::NotEq) => BinaryOp::NotEq,
                _ => return Ok(expr),
            };
            self.pos += 1;
            let rhs = self.comparison()?;
            expr = binary(op, expr, rhs);
        }
    }

    fn comparison(&mut self) -> Result<Expr, EvalError> {
        let mut expr = self.additive()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => BinaryOp::Lt,
                Some(Token::LtEq) => BinaryOp::LtEq,
                Some(Token::Gt) => BinaryOp::Gt,
                Some(Token::GtEq) => BinaryOp::GtEq,
                _ => return Ok(expr),
            };
            self.pos += 1;
            let rhs = self.additive()?;
            expr = binary(op, expr, rhs);
        }
    }

    fn additive(&mut self) -> Result<Expr, EvalError> {
        let mut expr = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(expr),
            };
            self.pos += 1;
            let rhs = self.multiplicative()?;
            expr = binary(op, expr, rhs);
        }
    }

    fn multiplicative(&mut self) -> Result<Expr, EvalError> {
        let mut expr = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Rem,
                _ => return Ok(expr),
            };
            self.pos += 1;
            let rhs = self.unary()?;
            expr = binary(op, expr, rhs);
        }
    }

    fn unary(&mut self) -> Result<Expr, EvalError> {
        let op = match self.peek() {
            Some(Token::Minus) => Some(UnaryOp::Neg),
            Some(Token::Bang) => Some(UnaryOp::Not),
            _ => None,
        };
        if let Some(op) = op {
            self.pos += 1;
            let operand = self.unary()?;
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
            });
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, EvalError> {
        match self.next() {
            Some(Token::Number(value)) => Ok(Expr::Number(value)),
            Some(Token::True) => Ok(Expr::Bool(true)),
            Some(Token::False) => Ok(Expr::Bool(false)),
            Some(Token::LParen) => {
                let expr = self.expression()?;
                self.expect(Token::RParen, "to close parenthesized expression")?;
                Ok(expr)
            }
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.call(&name)
                } else {
                    self.pos -= 1;
                    Ok(Expr::Path(self.path()?))
                }
            }
            other => Err(EvalError::Syntax {
                message: format!("expected an expression, found {:?}", other),
            }),
        }
    }

    fn call(&mut self, name: &str) -> Result<Expr, EvalError> {
        let function = MathFn::from_name(name).ok_or_else(|| EvalError::UnknownFunction {
            name: name.to_string(),
        })?;

        self.expect(Token::LParen, "to open argument list")?;
        let mut args = Vec::new();
        if !self.eat(&Token::RParen) {
            loop {
                args.push(self.expression()?);
                if self.eat(&Token::RParen) {
                    break;
                }
                self.expect(Token::Comma, "between arguments")?;
            }
        }

        if args.len() != function.arity() {
            return Err(EvalError::WrongArity {
                name: function.name().to_string(),
                expected: function.arity(),
                found: args.len(),
            });
        }
        Ok(Expr::Call { function, args })
    }

    fn path(&mut self) -> Result<Path, EvalError> {
        let base = self.expect_ident("at start of path")?;
        let mut segments = Vec::new();
        while self.eat(&Token::Dot) {
            segments.push(self.expect_ident("after '.'")?);
        }
        Ok(Path { base, segments })
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}
