//! Statement and declaration parsing.

use std::rc::Rc;

use lyra_lex::TokenKind;

use crate::ast::{FunctionDecl, Param, Stmt};
use crate::Parser;

impl<'a> Parser<'a> {
    /// A declaration (`fn`, `let`, `const`) or any other statement.
    pub(crate) fn declaration(&mut self) -> Option<Stmt> {
        if self.match_kind(TokenKind::Fn) {
            return self.function_declaration();
        }
        if self.match_kind(TokenKind::Let) {
            return self.let_declaration();
        }
        if self.match_kind(TokenKind::Const) {
            return self.const_declaration();
        }
        self.statement()
    }

    fn statement(&mut self) -> Option<Stmt> {
        if self.match_kind(TokenKind::If) {
            return self.if_statement();
        }
        if self.match_kind(TokenKind::Print) {
            return self.print_statement();
        }
        if self.match_kind(TokenKind::Return) {
            return self.return_statement();
        }
        if self.match_kind(TokenKind::While) {
            return self.while_statement();
        }
        if self.match_kind(TokenKind::Break) {
            return self.break_statement();
        }
        if self.match_kind(TokenKind::Continue) {
            return self.continue_statement();
        }
        if self.match_kind(TokenKind::LBrace) {
            return self.block_statement();
        }
        if self.match_kind(TokenKind::Pointer) {
            return self.pointer_statement();
        }
        self.expression_statement()
    }

    /// `let NAME : TYPE ( = EXPR )? ;`
    fn let_declaration(&mut self) -> Option<Stmt> {
        let name = self.consume(TokenKind::Ident, "Expect variable name.")?;
        self.consume(TokenKind::Colon, "Expect colon after variable name.")?;
        let type_tok = self.consume(TokenKind::TypeIdent, "Expect type identifier after colon.")?;
        let initializer = if self.match_kind(TokenKind::Eq) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after variable declaration.")?;
        Some(Stmt::Variable {
            name,
            type_tok,
            initializer,
        })
    }

    /// `const NAME : TYPE = EXPR ;`
    fn const_declaration(&mut self) -> Option<Stmt> {
        let name = self.consume(TokenKind::Ident, "Expect variable name.")?;
        self.consume(TokenKind::Colon, "Expect colon after variable name.")?;
        let type_tok = self.consume(TokenKind::TypeIdent, "Expect type identifier after colon.")?;
        if !self.match_kind(TokenKind::Eq) {
            self.error(&name, "Constants need an initializer.");
            return None;
        }
        let initializer = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expect ';' after variable declaration.")?;
        Some(Stmt::Const {
            name,
            type_tok,
            initializer,
        })
    }

    /// `fn NAME ( (PARAM (, PARAM)*)? ) : TYPE { BODY }` or
    /// `fn NAME ( ... ) : TYPE {} = load IDENT ;`
    fn function_declaration(&mut self) -> Option<Stmt> {
        if self.in_function() {
            let current = self.current();
            self.error(&current, "Function in function is not allowed");
            return None;
        }
        self.set_in_function(true);
        let result = self.function_declaration_inner();
        self.set_in_function(false);
        result
    }

    fn function_declaration_inner(&mut self) -> Option<Stmt> {
        let name = self.consume(TokenKind::Ident, "Expect function name.")?;
        self.consume(TokenKind::LParen, "Expect '(' after function name.")?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                let param_name = self.consume(TokenKind::Ident, "Expect parameter name.")?;
                self.consume(TokenKind::Colon, "Expect colon after parameter name.")?;
                let param_type =
                    self.consume(TokenKind::TypeIdent, "Expect type identifier after colon.")?;
                params.push(Param {
                    name: param_name,
                    type_tok: param_type,
                });
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RParen, "Expected ')' after arguments.")?;
        self.consume(TokenKind::Colon, "Expect colon after closing parenthesis.")?;
        let return_type = self.consume(TokenKind::TypeIdent, "Expect return type identifier.")?;
        self.consume(TokenKind::LBrace, "Expected '{' before body.")?;
        let body = self.block_statement()?;

        // `{} = load name ;` replaces the body with a native binding
        let (body, load_id) = if self.match_kind(TokenKind::Eq) {
            self.consume(TokenKind::Load, "Expect load type after equal.")?;
            let load_id = self.consume(TokenKind::Ident, "Expect identifier after load.")?;
            self.consume(TokenKind::Semicolon, "Expect ';' after load identifier.")?;
            (None, Some(load_id))
        } else {
            (Some(body), None)
        };

        Some(Stmt::Function(Rc::new(FunctionDecl {
            name,
            params,
            return_type,
            body,
            load_id,
        })))
    }

    /// `if ( EXPR ) STMT ( else STMT )?`
    fn if_statement(&mut self) -> Option<Stmt> {
        self.consume(TokenKind::LParen, "Expect '(' after 'if'.")?;
        let cond = self.expression()?;
        self.consume(TokenKind::RParen, "Expect ')' after 'if'.")?;
        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.match_kind(TokenKind::Else) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        Some(Stmt::If {
            cond,
            then_branch,
            else_branch,
        })
    }

    /// `while ( EXPR ) STMT`
    fn while_statement(&mut self) -> Option<Stmt> {
        self.consume(TokenKind::LParen, "Expect '(' after 'while'.")?;
        let cond = self.expression()?;
        self.consume(TokenKind::RParen, "Expect ')' after condition.")?;
        self.enter_loop();
        let body = self.statement();
        self.exit_loop();
        Some(Stmt::While {
            cond,
            body: Box::new(body?),
        })
    }

    /// `print ( EXPR ) ;`
    fn print_statement(&mut self) -> Option<Stmt> {
        self.consume(TokenKind::LParen, "Expect '(' after print.")?;
        let expr = self.expression()?;
        self.consume(TokenKind::RParen, "Expect ')' after expression.")?;
        self.consume(TokenKind::Semicolon, "Expect ';' at end of print.")?;
        Some(Stmt::Print { expr })
    }

    /// `return EXPR? ;` - only legal inside a function body.
    fn return_statement(&mut self) -> Option<Stmt> {
        if !self.in_function() {
            let current = self.current();
            self.error(&current, "Return is only in functions allowed");
            return None;
        }
        let keyword = self.previous();
        let value = if !self.check(TokenKind::Semicolon) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after return value.")?;
        Some(Stmt::Return { keyword, value })
    }

    /// `break EXPR? ;` - only legal inside a loop body.
    fn break_statement(&mut self) -> Option<Stmt> {
        let keyword = self.previous();
        if !self.in_loop() {
            self.error(&keyword, "Break is only allowed inside a loop");
            return None;
        }
        let level = if !self.check(TokenKind::Semicolon) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after break.")?;
        Some(Stmt::Break { keyword, level })
    }

    /// `continue EXPR? ;` - only legal inside a loop body.
    fn continue_statement(&mut self) -> Option<Stmt> {
        let keyword = self.previous();
        if !self.in_loop() {
            self.error(&keyword, "Continue is only allowed inside a loop");
            return None;
        }
        let level = if !self.check(TokenKind::Semicolon) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after continue.")?;
        Some(Stmt::Continue { keyword, level })
    }

    /// `{ DECL* }` - the opening brace is already consumed.
    pub(crate) fn block_statement(&mut self) -> Option<Stmt> {
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.check(TokenKind::Eof) {
            stmts.push(self.declaration()?);
        }
        self.consume(TokenKind::RBrace, "Expect '}' after block.")?;
        Some(Stmt::Block { stmts })
    }

    /// `pointer IDENT STMT` (reserved form)
    fn pointer_statement(&mut self) -> Option<Stmt> {
        let name = self.consume(TokenKind::Ident, "Expect identifier after pointer.")?;
        let stmt = self.statement()?;
        Some(Stmt::Pointer {
            name,
            stmt: Box::new(stmt),
        })
    }

    /// `EXPR ;`
    fn expression_statement(&mut self) -> Option<Stmt> {
        let expr = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expect ';' after expression.")?;
        Some(Stmt::Expression { expr })
    }
}
