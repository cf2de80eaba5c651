//! AST pretty-printer.
//!
//! Renders a parsed program as s-expressions for the `--ast` driver mode.
//! Total on every successful parse: it never fails and never panics.

use std::fmt::Write;

use crate::ast::{Ast, Expr, Literal, Stmt};

/// Render the whole program, CRLF terminated.
pub fn print_ast(ast: &Ast) -> String {
    let mut out = String::new();
    for stmt in ast {
        write_stmt(&mut out, stmt);
    }
    out.push_str("\r\n");
    out
}

fn write_stmt(out: &mut String, stmt: &Stmt) {
    match stmt {
        Stmt::Function(decl) => {
            let _ = write!(out, "(fn {} (", decl.name.lexeme);
            for (index, param) in decl.params.iter().enumerate() {
                if index > 0 {
                    out.push(' ');
                }
                let _ = write!(out, "{}:{}", param.name.lexeme, param.type_tok.lexeme);
            }
            let _ = write!(out, "): {}", decl.return_type.lexeme);
            if let Some(body) = &decl.body {
                out.push(' ');
                write_stmt(out, body);
            }
            if let Some(load_id) = &decl.load_id {
                let _ = write!(out, " = load {}", load_id.lexeme);
            }
            out.push(')');
        }
        Stmt::Variable {
            name, initializer, ..
        } => {
            let _ = write!(out, "(let {}", name.lexeme);
            if let Some(init) = initializer {
                out.push_str(" = ");
                write_expr(out, init);
            }
            out.push(')');
        }
        Stmt::Const {
            name, initializer, ..
        } => {
            let _ = write!(out, "(const {} = ", name.lexeme);
            write_expr(out, initializer);
            out.push(')');
        }
        Stmt::If {
            cond,
            then_branch,
            else_branch,
        } => {
            match else_branch {
                None => {
                    out.push_str("(if ");
                    write_expr(out, cond);
                    out.push(' ');
                    write_stmt(out, then_branch);
                }
                Some(else_branch) => {
                    out.push_str("(if-else ");
                    write_expr(out, cond);
                    out.push(' ');
                    write_stmt(out, then_branch);
                    out.push(' ');
                    write_stmt(out, else_branch);
                }
            }
            out.push(')');
        }
        Stmt::Print { expr } => {
            out.push_str("(print ");
            write_expr(out, expr);
            out.push(')');
        }
        Stmt::Return { value, .. } => match value {
            None => out.push_str("(return)"),
            Some(value) => {
                out.push_str("(return ");
                write_expr(out, value);
                out.push(')');
            }
        },
        Stmt::While { cond, body } => {
            out.push_str("(while ");
            write_expr(out, cond);
            out.push(' ');
            write_stmt(out, body);
            out.push(')');
        }
        Stmt::Block { stmts } => {
            out.push_str("(block");
            for stmt in stmts {
                out.push(' ');
                write_stmt(out, stmt);
            }
            out.push(')');
        }
        Stmt::Break { level, .. } => match level {
            None => out.push_str("(break)"),
            Some(level) => {
                out.push_str("(break ");
                write_expr(out, level);
                out.push(')');
            }
        },
        Stmt::Continue { level, .. } => match level {
            None => out.push_str("(continue)"),
            Some(level) => {
                out.push_str("(continue ");
                write_expr(out, level);
                out.push(')');
            }
        },
        Stmt::Pointer { name, stmt } => {
            let _ = write!(out, "(p {} ", name.lexeme);
            write_stmt(out, stmt);
            out.push(')');
        }
        Stmt::Expression { expr } => {
            out.push_str("(; ");
            write_expr(out, expr);
            out.push(')');
        }
    }
}

fn write_expr(out: &mut String, expr: &Expr) {
    match expr {
        Expr::Assign { name, value } => {
            let _ = write!(out, "(= {} ", name.lexeme);
            write_expr(out, value);
            out.push(')');
        }
        Expr::Binary { left, op, right } | Expr::Logical { left, op, right } => {
            let _ = write!(out, "({} ", op.lexeme);
            write_expr(out, left);
            out.push(' ');
            write_expr(out, right);
            out.push(')');
        }
        Expr::Call { callee, args, .. } => {
            out.push_str("(call ");
            write_expr(out, callee);
            for arg in args {
                out.push(' ');
                write_expr(out, arg);
            }
            out.push(')');
        }
        Expr::Load { name } => {
            let _ = write!(out, "(load {})", name.lexeme);
        }
        Expr::Pointer { name } => {
            let _ = write!(out, "(p {})", name.lexeme);
        }
        Expr::Grouping { inner } => {
            out.push_str("(group ");
            write_expr(out, inner);
            out.push(')');
        }
        Expr::Literal { value } => match value {
            Literal::Null => out.push_str("null"),
            Literal::Int(n) => {
                let _ = write!(out, "{n}");
            }
            Literal::Hex(n) => {
                let _ = write!(out, "{n:x}");
            }
            Literal::Float(f) => {
                let _ = write!(out, "{f:.6}");
            }
            Literal::Str(s) => out.push_str(s.as_str()),
            Literal::Bool(b) => {
                let _ = write!(out, "{b}");
            }
        },
        Expr::Unary { op, right } => {
            let _ = write!(out, "({} ", op.lexeme);
            write_expr(out, right);
            out.push(')');
        }
        Expr::Variable { name } => {
            let _ = write!(out, "{}", name.lexeme);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Parser;
    use lyra_lex::Scanner;
    use lyra_util::Handler;

    fn print_source(source: &str) -> String {
        let handler = Handler::new();
        let tokens = Scanner::new(source).scan();
        let ast = Parser::new(tokens, &handler).parse().expect("parse failed");
        print_ast(&ast)
    }

    #[test]
    fn test_print_let_with_binary() {
        assert_eq!(
            print_source("let a : uint32 = 3 + 4;"),
            "(let a = (+ 3 4))\r\n"
        );
    }

    #[test]
    fn test_print_precedence_grouping() {
        assert_eq!(print_source("print((1 + 2) * 3);"), "(print (* (group (+ 1 2)) 3))\r\n");
    }

    #[test]
    fn test_print_function() {
        assert_eq!(
            print_source("fn adder(x: int32): int32 { return x + 1; }"),
            "(fn adder (x:int32): int32 (block (return (+ x 1))))\r\n"
        );
    }

    #[test]
    fn test_print_load_function() {
        assert_eq!(
            print_source("fn c_foo2(): int8 {} = load c_foo2;"),
            "(fn c_foo2 (): int8 = load c_foo2)\r\n"
        );
    }

    #[test]
    fn test_print_if_else() {
        assert_eq!(
            print_source("if (true) print(1); else print(2);"),
            "(if-else true (print 1) (print 2))\r\n"
        );
    }

    #[test]
    fn test_print_while_with_break() {
        assert_eq!(
            print_source("while (true) { break; continue 2; }"),
            "(while true (block (break) (continue 2)))\r\n"
        );
    }

    #[test]
    fn test_print_literals() {
        assert_eq!(
            print_source("print(0xff); print(2.5); print(\"hi\"); print(null);"),
            "(print ff)(print 2.500000)(print hi)(print null)\r\n"
        );
    }

    #[test]
    fn test_print_assignment_and_logical() {
        assert_eq!(
            print_source("a = b && true;"),
            "(; (= a (&& b true)))\r\n"
        );
    }

    #[test]
    fn test_printer_total_on_reserved_forms() {
        assert_eq!(
            print_source("pointer x print(1);"),
            "(p x (print 1))\r\n"
        );
    }
}
