//! Expression parsing.
//!
//! One method per precedence level, each delegating to the next-tighter
//! level and folding left-associative operator chains in a loop.

use lyra_lex::TokenKind;
use lyra_util::Symbol;

use crate::ast::{Expr, Literal};
use crate::Parser;

impl<'a> Parser<'a> {
    /// Entry point: an expression is an assignment.
    pub(crate) fn expression(&mut self) -> Option<Expr> {
        self.assignment()
    }

    /// `target = value` (right-associative) or anything tighter.
    fn assignment(&mut self) -> Option<Expr> {
        let expr = self.logic_or()?;
        if self.match_kind(TokenKind::Eq) {
            let equals = self.previous();
            let value = self.assignment()?;
            return match expr {
                Expr::Variable { name } => Some(Expr::Assign {
                    name,
                    value: Box::new(value),
                }),
                _ => {
                    self.error(&equals, "Invalid assignment target.");
                    None
                }
            };
        }
        Some(expr)
    }

    /// `left || right`
    fn logic_or(&mut self) -> Option<Expr> {
        let mut expr = self.logic_and()?;
        while self.match_kind(TokenKind::OrOr) {
            let op = self.previous();
            let right = self.logic_and()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }
        Some(expr)
    }

    /// `left && right`
    fn logic_and(&mut self) -> Option<Expr> {
        let mut expr = self.bit_or()?;
        while self.match_kind(TokenKind::AndAnd) {
            let op = self.previous();
            let right = self.bit_or()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }
        Some(expr)
    }

    /// `left | right`
    fn bit_or(&mut self) -> Option<Expr> {
        let mut expr = self.bit_xor()?;
        while self.match_kind(TokenKind::Pipe) {
            let op = self.previous();
            let right = self.bit_xor()?;
            expr = binary(expr, op, right);
        }
        Some(expr)
    }

    /// `left ^ right`
    fn bit_xor(&mut self) -> Option<Expr> {
        let mut expr = self.bit_and()?;
        while self.match_kind(TokenKind::Caret) {
            let op = self.previous();
            let right = self.bit_and()?;
            expr = binary(expr, op, right);
        }
        Some(expr)
    }

    /// `left & right`
    fn bit_and(&mut self) -> Option<Expr> {
        let mut expr = self.equality()?;
        while self.match_kind(TokenKind::Amp) {
            let op = self.previous();
            let right = self.equality()?;
            expr = binary(expr, op, right);
        }
        Some(expr)
    }

    /// `left == right`, `left != right`
    fn equality(&mut self) -> Option<Expr> {
        let mut expr = self.comparison()?;
        while self.match_kind(TokenKind::NotEq) || self.match_kind(TokenKind::EqEq) {
            let op = self.previous();
            let right = self.comparison()?;
            expr = binary(expr, op, right);
        }
        Some(expr)
    }

    /// Comparisons and shifts: `< <= > >= << >>`.
    fn comparison(&mut self) -> Option<Expr> {
        let mut expr = self.term()?;
        while self.match_kind(TokenKind::Gt)
            || self.match_kind(TokenKind::GtEq)
            || self.match_kind(TokenKind::Lt)
            || self.match_kind(TokenKind::LtEq)
            || self.match_kind(TokenKind::Shl)
            || self.match_kind(TokenKind::Shr)
        {
            let op = self.previous();
            let right = self.term()?;
            expr = binary(expr, op, right);
        }
        Some(expr)
    }

    /// `left + right`, `left - right`
    fn term(&mut self) -> Option<Expr> {
        let mut expr = self.factor()?;
        while self.match_kind(TokenKind::Minus) || self.match_kind(TokenKind::Plus) {
            let op = self.previous();
            let right = self.factor()?;
            expr = binary(expr, op, right);
        }
        Some(expr)
    }

    /// `left * right`, `left / right`, `left % right`
    fn factor(&mut self) -> Option<Expr> {
        let mut expr = self.unary()?;
        while self.match_kind(TokenKind::Slash)
            || self.match_kind(TokenKind::Star)
            || self.match_kind(TokenKind::Percent)
        {
            let op = self.previous();
            let right = self.unary()?;
            expr = binary(expr, op, right);
        }
        Some(expr)
    }

    /// Prefix operators `! - + ~`, the reserved `load`/`pointer` forms,
    /// or a call.
    fn unary(&mut self) -> Option<Expr> {
        if self.match_kind(TokenKind::Bang)
            || self.match_kind(TokenKind::Minus)
            || self.match_kind(TokenKind::Plus)
            || self.match_kind(TokenKind::Tilde)
        {
            let op = self.previous();
            let right = self.unary()?;
            return Some(Expr::Unary {
                op,
                right: Box::new(right),
            });
        }
        if self.match_kind(TokenKind::Load) {
            let name = self.consume(TokenKind::Ident, "Expect identifier after load.")?;
            return Some(Expr::Load { name });
        }
        if self.match_kind(TokenKind::Pointer) {
            let name = self.consume(TokenKind::Ident, "Expect identifier after pointer.")?;
            return Some(Expr::Pointer { name });
        }
        self.call()
    }

    /// A primary expression followed by any number of call suffixes.
    fn call(&mut self) -> Option<Expr> {
        let mut expr = self.primary()?;
        while self.match_kind(TokenKind::LParen) {
            expr = self.finish_call(expr)?;
        }
        Some(expr)
    }

    /// Arguments and closing parenthesis of a call.
    fn finish_call(&mut self, callee: Expr) -> Option<Expr> {
        let mut args = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                args.push(self.expression()?);
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
        }
        let paren = self.consume(TokenKind::RParen, "Expected ')' after arguments.")?;
        Some(Expr::Call {
            callee: Box::new(callee),
            paren,
            args,
        })
    }

    /// Literals, variables, and parenthesized expressions.
    fn primary(&mut self) -> Option<Expr> {
        if self.match_kind(TokenKind::False) {
            return Some(Expr::Literal {
                value: Literal::Bool(false),
            });
        }
        if self.match_kind(TokenKind::True) {
            return Some(Expr::Literal {
                value: Literal::Bool(true),
            });
        }
        if self.match_kind(TokenKind::Null) {
            return Some(Expr::Literal {
                value: Literal::Null,
            });
        }
        if self.match_kind(TokenKind::Str) {
            let token = self.previous();
            let text = token.lexeme.as_str();
            // the scanner keeps the delimiters
            let stripped = text
                .strip_prefix('"')
                .and_then(|s| s.strip_suffix('"'))
                .unwrap_or(text);
            return Some(Expr::Literal {
                value: Literal::Str(Symbol::intern(stripped)),
            });
        }
        if self.match_kind(TokenKind::Number) {
            return self.number_literal();
        }
        if self.match_kind(TokenKind::Ident) {
            return Some(Expr::Variable {
                name: self.previous(),
            });
        }
        if self.match_kind(TokenKind::LParen) {
            let inner = self.expression()?;
            self.consume(TokenKind::RParen, "Expect ')' after expression.")?;
            return Some(Expr::Grouping {
                inner: Box::new(inner),
            });
        }
        // a scanner error token carries its own message
        let current = self.current();
        if current.kind == TokenKind::Error {
            self.error(&current, current.lexeme.as_str());
        } else {
            self.error(&current, "Expected expression.");
        }
        None
    }

    /// Classify and convert a number token.
    ///
    /// Float iff the lexeme contains `.`, hex iff it contains `x`/`X`;
    /// the two are mutually exclusive.
    fn number_literal(&mut self) -> Option<Expr> {
        let token = self.previous();
        let text = token.lexeme.as_str();
        let is_float = text.contains('.');
        let is_hex = text.contains('x') || text.contains('X');
        if is_float && is_hex {
            self.error(&token, "Invalid number literal.");
            return None;
        }
        let value = if is_float {
            text.parse::<f64>().ok().map(Literal::Float)
        } else if is_hex {
            text.strip_prefix("0x")
                .or_else(|| text.strip_prefix("0X"))
                .and_then(|digits| u64::from_str_radix(digits, 16).ok())
                .map(Literal::Hex)
        } else {
            text.parse::<u64>().ok().map(Literal::Int)
        };
        match value {
            Some(value) => Some(Expr::Literal { value }),
            None => {
                self.error(&token, "Invalid number literal.");
                None
            }
        }
    }
}

/// Fold helper for left-associative binary chains.
fn binary(left: Expr, op: lyra_lex::Token, right: Expr) -> Expr {
    Expr::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}
