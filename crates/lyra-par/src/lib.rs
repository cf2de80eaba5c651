//! lyra-par - Recursive-descent parser.
//!
//! Translates the token stream into the AST. Parsing is a single pass with
//! no recovery: the first error is reported through the [`Handler`] with
//! the offending token's line and lexeme, and the parse aborts (every parse
//! function returns `Option` and failures bubble to the caller).
//!
//! Precedence, lowest to highest: assignment, `||`, `&&`, `|`, `^`, `&`,
//! equality, comparison (including `<<` `>>`), term, factor, unary
//! (`! - + ~`, prefix `load` / `pointer`), call, primary.

pub mod ast;
mod expr;
pub mod printer;
mod stmt;

pub use ast::{Ast, Expr, FunctionDecl, Literal, Param, Stmt};
pub use printer::print_ast;

use lyra_lex::{Token, TokenKind};
use lyra_util::Handler;

/// Recursive-descent parser.
///
/// # Example
///
/// ```
/// use lyra_lex::Scanner;
/// use lyra_par::Parser;
/// use lyra_util::Handler;
///
/// let handler = Handler::new();
/// let tokens = Scanner::new("print(1 + 2);").scan();
/// let ast = Parser::new(tokens, &handler).parse();
/// assert!(ast.is_some());
/// ```
pub struct Parser<'a> {
    /// Token stream, terminated by `Eof`
    tokens: Vec<Token>,

    /// Current position in the token stream
    position: usize,

    /// Error handler
    handler: &'a Handler,

    /// Set while parsing a function body; guards nested functions and
    /// stray `return`
    in_function: bool,

    /// Number of enclosing `while` bodies; guards stray `break`/`continue`
    loop_depth: u32,
}

impl<'a> Parser<'a> {
    /// Create a new parser over a scanned token stream.
    pub fn new(tokens: Vec<Token>, handler: &'a Handler) -> Self {
        Self {
            tokens,
            position: 0,
            handler,
            in_function: false,
            loop_depth: 0,
        }
    }

    /// Parse a complete script.
    ///
    /// Returns `None` after reporting the first error.
    pub fn parse(mut self) -> Option<Ast> {
        let mut statements = Vec::new();
        while !self.check(TokenKind::Eof) {
            statements.push(self.declaration()?);
        }
        Some(statements)
    }

    // =========================================================================
    // TOKEN STREAM HELPERS
    // =========================================================================

    /// Current token without consuming it.
    pub(crate) fn current(&self) -> Token {
        self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    /// Most recently consumed token.
    pub(crate) fn previous(&self) -> Token {
        self.tokens[self.position.saturating_sub(1)]
    }

    /// Consume the current token (never past `Eof`).
    pub(crate) fn advance(&mut self) -> Token {
        if self.current().kind != TokenKind::Eof {
            self.position += 1;
        }
        self.previous()
    }

    /// True when the current token has the given kind.
    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    /// Consume the current token if it has the given kind.
    pub(crate) fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume a token of the given kind or report `message` and fail.
    pub(crate) fn consume(&mut self, kind: TokenKind, message: &str) -> Option<Token> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            self.error(&self.current(), message);
            None
        }
    }

    /// Report a parse error at the given token.
    pub(crate) fn error(&self, token: &Token, message: &str) {
        self.handler.error(token.line(), token.locus(), message);
    }

    pub(crate) fn set_in_function(&mut self, value: bool) {
        self.in_function = value;
    }

    pub(crate) fn in_function(&self) -> bool {
        self.in_function
    }

    pub(crate) fn enter_loop(&mut self) {
        self.loop_depth += 1;
    }

    pub(crate) fn exit_loop(&mut self) {
        self.loop_depth -= 1;
    }

    pub(crate) fn in_loop(&self) -> bool {
        self.loop_depth > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyra_lex::Scanner;

    fn parse_source(source: &str) -> (Option<Ast>, Handler) {
        let handler = Handler::new();
        let tokens = Scanner::new(source).scan();
        let ast = Parser::new(tokens, &handler).parse();
        (ast, handler)
    }

    fn first_message(handler: &Handler) -> String {
        handler.diagnostics()[0].message.clone()
    }

    #[test]
    fn test_parse_empty_source() {
        let (ast, handler) = parse_source("");
        assert!(!handler.has_errors());
        assert!(ast.unwrap().is_empty());
    }

    #[test]
    fn test_parse_let_declaration() {
        let (ast, handler) = parse_source("let a : uint32 = 3;");
        assert!(!handler.has_errors());
        let ast = ast.unwrap();
        assert_eq!(ast.len(), 1);
        match &ast[0] {
            Stmt::Variable {
                name,
                type_tok,
                initializer,
            } => {
                assert_eq!(name.lexeme.as_str(), "a");
                assert_eq!(type_tok.lexeme.as_str(), "uint32");
                assert!(initializer.is_some());
            }
            other => panic!("expected variable declaration, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_let_without_initializer() {
        let (ast, _) = parse_source("let a : uint32;");
        match &ast.unwrap()[0] {
            Stmt::Variable { initializer, .. } => assert!(initializer.is_none()),
            other => panic!("expected variable declaration, got {other:?}"),
        }
    }

    #[test]
    fn test_const_requires_initializer() {
        let (ast, handler) = parse_source("const PI : float;");
        assert!(ast.is_none());
        assert_eq!(first_message(&handler), "Constants need an initializer.");
    }

    #[test]
    fn test_const_always_has_initializer() {
        let (ast, _) = parse_source("const PI : float = 3.14;");
        match &ast.unwrap()[0] {
            Stmt::Const { initializer, .. } => {
                assert!(matches!(
                    initializer,
                    Expr::Literal {
                        value: Literal::Float(_)
                    }
                ));
            }
            other => panic!("expected const declaration, got {other:?}"),
        }
    }

    #[test]
    fn test_precedence_term_vs_factor() {
        let (ast, _) = parse_source("print(1 + 2 * 3);");
        let Stmt::Print { expr } = &ast.unwrap()[0] else {
            panic!("expected print");
        };
        // 1 + (2 * 3)
        match expr {
            Expr::Binary { op, right, .. } => {
                assert_eq!(op.kind, TokenKind::Plus);
                assert!(matches!(&**right, Expr::Binary { op, .. } if op.kind == TokenKind::Star));
            }
            other => panic!("expected binary, got {other:?}"),
        }
    }

    #[test]
    fn test_left_associativity() {
        let (ast, _) = parse_source("print(10 - 3 - 2);");
        let Stmt::Print { expr } = &ast.unwrap()[0] else {
            panic!("expected print");
        };
        // (10 - 3) - 2
        match expr {
            Expr::Binary { left, op, .. } => {
                assert_eq!(op.kind, TokenKind::Minus);
                assert!(matches!(&**left, Expr::Binary { .. }));
            }
            other => panic!("expected binary, got {other:?}"),
        }
    }

    #[test]
    fn test_logical_lower_than_equality() {
        let (ast, _) = parse_source("print(a == 1 || b == 2);");
        let Stmt::Print { expr } = &ast.unwrap()[0] else {
            panic!("expected print");
        };
        assert!(matches!(expr, Expr::Logical { op, .. } if op.kind == TokenKind::OrOr));
    }

    #[test]
    fn test_shift_parses_at_comparison_level() {
        let (ast, _) = parse_source("print(1 << 2 + 3);");
        let Stmt::Print { expr } = &ast.unwrap()[0] else {
            panic!("expected print");
        };
        // 1 << (2 + 3)
        match expr {
            Expr::Binary { op, right, .. } => {
                assert_eq!(op.kind, TokenKind::Shl);
                assert!(matches!(&**right, Expr::Binary { op, .. } if op.kind == TokenKind::Plus));
            }
            other => panic!("expected binary, got {other:?}"),
        }
    }

    #[test]
    fn test_assignment_target_validation() {
        let (ast, handler) = parse_source("1 = 2;");
        assert!(ast.is_none());
        assert_eq!(first_message(&handler), "Invalid assignment target.");
    }

    #[test]
    fn test_number_classification() {
        let (ast, _) = parse_source("print(0x1F); print(2.5); print(7);");
        let ast = ast.unwrap();
        let literal = |stmt: &Stmt| match stmt {
            Stmt::Print {
                expr: Expr::Literal { value },
            } => *value,
            other => panic!("expected print literal, got {other:?}"),
        };
        assert_eq!(literal(&ast[0]), Literal::Hex(0x1F));
        assert_eq!(literal(&ast[1]), Literal::Float(2.5));
        assert_eq!(literal(&ast[2]), Literal::Int(7));
    }

    #[test]
    fn test_string_literal_strips_quotes() {
        let (ast, _) = parse_source("print(\"hi\");");
        match &ast.unwrap()[0] {
            Stmt::Print {
                expr: Expr::Literal {
                    value: Literal::Str(s),
                },
            } => assert_eq!(s.as_str(), "hi"),
            other => panic!("expected string literal, got {other:?}"),
        }
    }

    #[test]
    fn test_function_declaration() {
        let (ast, handler) = parse_source("fn adder(x: int32): int32 { return x + 1; }");
        assert!(!handler.has_errors());
        match &ast.unwrap()[0] {
            Stmt::Function(decl) => {
                assert_eq!(decl.name.lexeme.as_str(), "adder");
                assert_eq!(decl.params.len(), 1);
                assert_eq!(decl.params[0].type_tok.lexeme.as_str(), "int32");
                assert_eq!(decl.return_type.lexeme.as_str(), "int32");
                assert!(decl.body.is_some());
                assert!(decl.load_id.is_none());
            }
            other => panic!("expected function, got {other:?}"),
        }
    }

    #[test]
    fn test_load_function_declaration() {
        let (ast, handler) = parse_source("fn c_foo2(): int8 {} = load c_foo2;");
        assert!(!handler.has_errors());
        match &ast.unwrap()[0] {
            Stmt::Function(decl) => {
                assert!(decl.body.is_none());
                assert_eq!(decl.load_id.unwrap().lexeme.as_str(), "c_foo2");
            }
            other => panic!("expected function, got {other:?}"),
        }
    }

    #[test]
    fn test_function_body_load_exclusive() {
        for source in [
            "fn a(): void {}",
            "fn b(): int8 {} = load b;",
            "fn c(x: uint8, y: uint8): uint8 { return x; }",
        ] {
            let (ast, handler) = parse_source(source);
            assert!(!handler.has_errors(), "{source}");
            for stmt in ast.unwrap() {
                if let Stmt::Function(decl) = stmt {
                    assert!(decl.body.is_some() != decl.load_id.is_some(), "{source}");
                }
            }
        }
    }

    #[test]
    fn test_nested_function_rejected() {
        let (ast, handler) = parse_source("fn outer(): void { fn inner(): void {} }");
        assert!(ast.is_none());
        assert_eq!(
            first_message(&handler),
            "Function in function is not allowed"
        );
    }

    #[test]
    fn test_return_outside_function_rejected() {
        let (ast, handler) = parse_source("return 1;");
        assert!(ast.is_none());
        assert_eq!(first_message(&handler), "Return is only in functions allowed");
    }

    #[test]
    fn test_break_outside_loop_rejected() {
        let (ast, handler) = parse_source("break;");
        assert!(ast.is_none());
        assert_eq!(
            first_message(&handler),
            "Break is only allowed inside a loop"
        );
    }

    #[test]
    fn test_break_with_level_inside_loop() {
        let (ast, handler) = parse_source("while (true) { break 1; continue; }");
        assert!(!handler.has_errors());
        let Stmt::While { body, .. } = &ast.unwrap()[0] else {
            panic!("expected while");
        };
        let Stmt::Block { stmts } = &**body else {
            panic!("expected block body");
        };
        assert!(matches!(&stmts[0], Stmt::Break { level: Some(_), .. }));
        assert!(matches!(&stmts[1], Stmt::Continue { level: None, .. }));
    }

    #[test]
    fn test_pointer_statement_parses() {
        let (ast, handler) = parse_source("pointer p { print(1); }");
        assert!(!handler.has_errors());
        assert!(matches!(&ast.unwrap()[0], Stmt::Pointer { .. }));
    }

    #[test]
    fn test_missing_semicolon() {
        let (ast, handler) = parse_source("let a : uint8 = 1");
        assert!(ast.is_none());
        assert_eq!(
            first_message(&handler),
            "Expect ';' after variable declaration."
        );
        assert_eq!(handler.diagnostics()[0].locus, lyra_util::Locus::End);
    }

    #[test]
    fn test_scanner_error_token_reported() {
        let (ast, handler) = parse_source("let a : uint8 = @;");
        assert!(ast.is_none());
        assert_eq!(first_message(&handler), "Unknown token");
    }

    #[test]
    fn test_call_arguments() {
        let (ast, _) = parse_source("f(1, 2, 3);");
        let Stmt::Expression { expr } = &ast.unwrap()[0] else {
            panic!("expected expression statement");
        };
        match expr {
            Expr::Call { args, .. } => assert_eq!(args.len(), 3),
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn test_first_error_aborts() {
        let (ast, handler) = parse_source("let ; let b : uint8 = 1;");
        assert!(ast.is_none());
        assert_eq!(handler.error_count(), 1);
    }
}
