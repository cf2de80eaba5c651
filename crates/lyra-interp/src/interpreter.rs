//! Tree-walking interpreter.
//!
//! Walks the AST, evaluating expressions and executing statements against
//! the current environment. Failures are fail-fast: the first error goes to
//! the diagnostic sink and sets a sticky flag that every evaluator checks
//! at its boundaries, so the rest of the program unwinds without running.
//!
//! `return`, `break`, and `continue` travel upward as control values:
//! flagged [`Value`]s returned by the statement executors until an
//! enclosing handler (loop or call) consumes them.

use std::io::Write;

use lyra_lex::{Token, TokenKind};
use lyra_par::{Ast, Expr, Literal, Stmt};
use lyra_util::{Handler, Locus};

use crate::binding::Bindings;
use crate::environment::{AssignError, EnvRef, Environment};
use crate::value::{
    coerce_to_type, values_equal, Callable, CallableKind, Number, Payload, TypeTag, Value,
    ValueKind,
};

/// The interpreter state for one run.
pub struct Interpreter<'a> {
    handler: &'a Handler,
    bindings: &'a Bindings,

    /// Current environment; starts at the global scope
    env: EnvRef,

    /// Number of `while` loops currently entered
    loop_level: i64,
    /// Outstanding multi-level break count
    break_remaining: i64,
    /// Outstanding multi-level continue count
    continue_remaining: i64,

    /// Sticky error flag, checked after every recursive step
    error: bool,

    /// Standard output sink for `print`
    out: Box<dyn Write>,
}

impl<'a> Interpreter<'a> {
    /// Create an interpreter writing `print` output to standard out.
    pub fn new(bindings: &'a Bindings, handler: &'a Handler) -> Self {
        Self::with_output(bindings, handler, Box::new(std::io::stdout()))
    }

    /// Create an interpreter with a custom output sink.
    pub fn with_output(bindings: &'a Bindings, handler: &'a Handler, out: Box<dyn Write>) -> Self {
        Self {
            handler,
            bindings,
            env: Environment::new(),
            loop_level: 0,
            break_remaining: 0,
            continue_remaining: 0,
            error: false,
            out,
        }
    }

    /// Execute the program. Returns false when any error was reported.
    pub fn run(&mut self, ast: &Ast) -> bool {
        for stmt in ast {
            self.loop_level = 0;
            self.break_remaining = 0;
            self.continue_remaining = 0;
            let _ = self.execute(stmt);
            if self.error {
                return false;
            }
        }
        true
    }

    /// True once any runtime error has been reported.
    pub fn had_error(&self) -> bool {
        self.error
    }

    fn emit_error(&mut self, token: Option<&Token>, message: &str) {
        match token {
            Some(token) => self.handler.error(token.line(), token.locus(), message),
            None => self.handler.error(0, Locus::None, message),
        }
        self.error = true;
    }

    fn type_tag(token: &Token) -> TypeTag {
        TypeTag::from_name(token.lexeme.as_str()).unwrap_or(TypeTag::Undefined)
    }

    // =========================================================================
    // STATEMENT EXECUTION
    // =========================================================================

    /// Execute one statement.
    ///
    /// `Some` is a control value (`is_return`/`is_break`/`is_continue`)
    /// propagating upward; `None` is normal completion or, when the error
    /// flag is set, an aborted one. Control values leaving here are always
    /// evaluator-owned (`environment == false`).
    fn execute(&mut self, stmt: &Stmt) -> Option<Value> {
        if self.error {
            return None;
        }
        match stmt {
            Stmt::Block { stmts } => {
                let inner = Environment::with_enclosing(self.env.clone());
                let previous = std::mem::replace(&mut self.env, inner);
                let mut result = None;
                for stmt in stmts {
                    if let Some(ctrl) = self.execute(stmt) {
                        result = Some(ctrl.duplicate_environment());
                        break;
                    }
                    if self.error {
                        break;
                    }
                }
                // the nested scope and the values it owns drop here
                self.env = previous;
                result
            }
            Stmt::Expression { expr } => {
                let _ = self.evaluate(expr);
                None
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let Some(condition) = self.evaluate(cond) else {
                    return None;
                };
                let result = if condition.truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    None
                };
                result.map(Value::duplicate_environment)
            }
            Stmt::While { cond, body } => self.execute_while(cond, body),
            Stmt::Print { expr } => {
                let Some(value) = self.evaluate(expr) else {
                    return None;
                };
                match value.stringify() {
                    Some(text) => {
                        let _ = write!(self.out, "{text}\r\n");
                        let _ = self.out.flush();
                    }
                    None => self.emit_error(None, "Stringify of evaluated object failed."),
                }
                None
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::null(),
                };
                let mut copy = value.duplicate_environment();
                copy.is_return = true;
                Some(copy)
            }
            Stmt::Variable {
                name,
                type_tok,
                initializer,
            } => {
                self.declare(name, type_tok, initializer.as_ref(), false);
                None
            }
            Stmt::Const {
                name,
                type_tok,
                initializer,
            } => {
                self.declare(name, type_tok, Some(initializer), true);
                None
            }
            Stmt::Function(decl) => {
                let kind = if decl.load_id.is_some() {
                    CallableKind::Native
                } else {
                    CallableKind::Script {
                        closure: self.env.clone(),
                    }
                };
                let value = Value::callable(Callable {
                    decl: decl.clone(),
                    kind,
                });
                self.env.borrow_mut().define(decl.name.lexeme, value);
                None
            }
            Stmt::Break { keyword, level } => self.control_statement(keyword, level.as_ref(), true),
            Stmt::Continue { keyword, level } => {
                self.control_statement(keyword, level.as_ref(), false)
            }
            Stmt::Pointer { name, .. } => {
                self.emit_error(Some(name), "Not implemented statement");
                None
            }
        }
    }

    /// Declare a variable or constant in the current scope.
    fn declare(
        &mut self,
        name: &Token,
        type_tok: &Token,
        initializer: Option<&Expr>,
        constant: bool,
    ) {
        let value = match initializer {
            Some(expr) => match self.evaluate(expr) {
                Some(value) => value.duplicate_environment(),
                None => return,
            },
            None => Value::null(),
        };
        let target = Self::type_tag(type_tok);
        let mut value = match coerce_to_type(value, target) {
            Ok(value) => value,
            Err(message) => {
                self.emit_error(Some(name), &message);
                return;
            }
        };
        value.constant = constant;
        self.env.borrow_mut().define(name.lexeme, value);
    }

    /// `while` with multi-level break/continue unwinding.
    ///
    /// `break n` and `continue n` leave `n - 1` outstanding levels in the
    /// interpreter counters; each enclosing loop consumes one at the top of
    /// its next iteration, breaking further out or resuming.
    fn execute_while(&mut self, cond: &Expr, body: &Stmt) -> Option<Value> {
        self.loop_level += 1;
        loop {
            if self.break_remaining > 0 {
                self.break_remaining -= 1;
                break;
            }
            if self.continue_remaining > 0 {
                self.continue_remaining -= 1;
                if self.continue_remaining > 0 {
                    break;
                }
            }
            let Some(condition) = self.evaluate(cond) else {
                break;
            };
            if !condition.truthy() {
                break;
            }
            let result = self.execute(body);
            if self.error {
                break;
            }
            if let Some(ctrl) = result {
                if ctrl.is_return {
                    let copy = ctrl.duplicate_environment();
                    self.loop_level -= 1;
                    return Some(copy);
                }
                if ctrl.is_continue {
                    self.continue_remaining = control_level(&ctrl) - 1;
                    if self.continue_remaining > 0 {
                        break;
                    }
                    continue;
                }
                if ctrl.is_break {
                    self.break_remaining = control_level(&ctrl) - 1;
                    break;
                }
            }
        }
        self.loop_level -= 1;
        None
    }

    /// `break` / `continue`: validate the level and build the control value.
    fn control_statement(
        &mut self,
        keyword: &Token,
        level: Option<&Expr>,
        is_break: bool,
    ) -> Option<Value> {
        let level_value = match level {
            Some(expr) => self.evaluate(expr)?,
            None => Value::uint(TypeTag::Int8, 1),
        };
        let amount = match level_value.as_number() {
            Some(Number::Signed(value)) => value,
            Some(Number::Unsigned(value)) => value as i64,
            _ => {
                let message = if is_break {
                    "Break level has to be of type signed integer."
                } else {
                    "Continue level has to be of type signed integer."
                };
                self.emit_error(Some(keyword), message);
                return None;
            }
        };
        if amount < 0 {
            let message = if is_break {
                "Negative break level is not allowed."
            } else {
                "Negative continue level is not allowed."
            };
            self.emit_error(Some(keyword), message);
            return None;
        }
        if amount > self.loop_level {
            let message = if is_break {
                "Break statement too high."
            } else {
                "Continue statement too high."
            };
            self.emit_error(Some(keyword), message);
            return None;
        }
        let mut value = Value::int(TypeTag::Int64, amount);
        if is_break {
            value.is_break = true;
        } else {
            value.is_continue = true;
        }
        Some(value)
    }

    // =========================================================================
    // EXPRESSION EVALUATION
    // =========================================================================

    /// Evaluate one expression. `None` means an error was reported.
    fn evaluate(&mut self, expr: &Expr) -> Option<Value> {
        if self.error {
            return None;
        }
        match expr {
            Expr::Literal { value } => Some(match value {
                Literal::Null => Value::null(),
                Literal::Int(value) | Literal::Hex(value) => Value::uint(TypeTag::UInt64, *value),
                Literal::Float(value) => Value::float(*value),
                Literal::Str(value) => Value::string(value.as_str()),
                Literal::Bool(value) => Value::bool_value(*value),
            }),
            Expr::Variable { name } => {
                let value = self.env.borrow().get(name.lexeme);
                match value {
                    Some(value) => Some(value),
                    None => {
                        self.emit_error(Some(name), "Undefined variable.");
                        None
                    }
                }
            }
            Expr::Grouping { inner } => self.evaluate(inner),
            Expr::Assign { name, value } => self.eval_assign(name, value),
            Expr::Binary { left, op, right } => self.eval_binary(left, op, right),
            Expr::Logical { left, op, right } => self.eval_logical(left, op, right),
            Expr::Unary { op, right } => self.eval_unary(op, right),
            Expr::Call {
                callee,
                paren,
                args,
            } => self.eval_call(callee, paren, args),
            Expr::Load { name } | Expr::Pointer { name } => {
                self.emit_error(Some(name), "Not implemented");
                None
            }
        }
    }

    /// Assignment: coerce to the existing binding's declared type and
    /// rebind. Evaluates to the assigned value.
    fn eval_assign(&mut self, name: &Token, value: &Expr) -> Option<Value> {
        let value = self.evaluate(value)?.duplicate_environment();
        let current = self.env.borrow().get(name.lexeme);
        let Some(current) = current else {
            self.emit_error(Some(name), "Undefined variable.");
            return None;
        };
        if current.constant {
            self.emit_error(Some(name), "Change a constant is not allowed.");
            return None;
        }
        let coerced = match coerce_to_type(value, current.ty) {
            Ok(value) => value,
            Err(message) => {
                self.emit_error(Some(name), &message);
                return None;
            }
        };
        let result = coerced.clone();
        let assign_result = self.env.borrow_mut().assign(name.lexeme, coerced);
        match assign_result {
            Ok(()) => Some(result),
            Err(AssignError::Constant) => {
                self.emit_error(Some(name), "Change a constant is not allowed.");
                None
            }
            Err(AssignError::Undefined) => {
                self.emit_error(Some(name), "Undefined variable.");
                None
            }
        }
    }

    /// Short-circuiting `&&` / `||`: the left operand is returned on early
    /// exit, the right operand's value otherwise.
    fn eval_logical(&mut self, left: &Expr, op: &Token, right: &Expr) -> Option<Value> {
        let left = self.evaluate(left)?;
        let truthy = left.truthy();
        if (op.kind == TokenKind::OrOr && truthy) || (op.kind == TokenKind::AndAnd && !truthy) {
            return Some(left);
        }
        self.evaluate(right)
    }

    fn eval_unary(&mut self, op: &Token, right: &Expr) -> Option<Value> {
        let right = self.evaluate(right)?;
        match op.kind {
            TokenKind::Bang => Some(Value::bool_value(!right.truthy())),
            TokenKind::Minus => match right.kind {
                ValueKind::Float => {
                    let Some(Number::Float(value)) = right.as_number() else {
                        self.emit_error(Some(op), "Number extraction failed.");
                        return None;
                    };
                    Some(Value::float(-value))
                }
                ValueKind::IntSigned => {
                    Some(Value::int(TypeTag::Int64, (right.bits() as i64).wrapping_neg()))
                }
                ValueKind::IntUnsigned => {
                    if right.ty.is_signed_int() {
                        // declared signed: negate in place, keeping the type
                        Some(Value::int(right.ty, (right.bits() as i64).wrapping_neg()))
                    } else if right.environment {
                        self.emit_error(Some(op), "Expected signed variable.");
                        None
                    } else {
                        // widen the transient value to the largest signed type
                        Some(Value::int(TypeTag::Int64, (right.bits() as i64).wrapping_neg()))
                    }
                }
                _ => {
                    self.emit_error(Some(op), "Expect numeric");
                    None
                }
            },
            TokenKind::Plus => match right.kind {
                ValueKind::Float | ValueKind::IntSigned | ValueKind::IntUnsigned => Some(right),
                _ => {
                    self.emit_error(Some(op), "Expect numeric");
                    None
                }
            },
            TokenKind::Tilde => match right.kind {
                ValueKind::IntSigned => Some(Value::int(TypeTag::Int64, !(right.bits() as i64))),
                ValueKind::IntUnsigned => Some(Value::uint(TypeTag::UInt64, !right.bits())),
                _ => {
                    self.emit_error(Some(op), "Expect numeric integer");
                    None
                }
            },
            _ => {
                self.emit_error(Some(op), "Unknown unary token.");
                None
            }
        }
    }

    fn eval_binary(&mut self, left: &Expr, op: &Token, right: &Expr) -> Option<Value> {
        let mut lhs = self.evaluate(left)?;
        let mut rhs = self.evaluate(right)?;
        match op.kind {
            TokenKind::EqEq => Some(Value::bool_value(values_equal(&lhs, &rhs))),
            TokenKind::NotEq => Some(Value::bool_value(!values_equal(&lhs, &rhs))),
            TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Star
            | TokenKind::Slash
            | TokenKind::Gt
            | TokenKind::GtEq
            | TokenKind::Lt
            | TokenKind::LtEq => {
                self.promote(&mut lhs, &mut rhs, op)?;
                let (Some(lnum), Some(rnum)) = (lhs.as_number(), rhs.as_number()) else {
                    self.emit_error(Some(op), "Number extraction failed.");
                    return None;
                };
                self.apply_arithmetic(op, lnum, rnum)
            }
            TokenKind::Shl | TokenKind::Shr => self.eval_shift(op, &lhs, &rhs),
            // % & | ^ parse but have no evaluation semantics
            _ => {
                self.emit_error(Some(op), "Unknown binary token.");
                None
            }
        }
    }

    /// One-sided signed promotion between the integer kinds.
    ///
    /// When exactly one operand is a signed integer the other integer
    /// operand is reinterpreted as signed (the widened payload bits are
    /// unchanged). Any other kind mismatch is an error.
    fn promote(&mut self, lhs: &mut Value, rhs: &mut Value, op: &Token) -> Option<()> {
        if lhs.kind == rhs.kind {
            return Some(());
        }
        if lhs.kind == ValueKind::IntSigned && rhs.kind == ValueKind::IntUnsigned {
            rhs.payload = Payload::Signed(rhs.bits() as i64);
            rhs.kind = ValueKind::IntSigned;
            return Some(());
        }
        if rhs.kind == ValueKind::IntSigned && lhs.kind == ValueKind::IntUnsigned {
            lhs.payload = Payload::Signed(lhs.bits() as i64);
            lhs.kind = ValueKind::IntSigned;
            return Some(());
        }
        self.emit_error(Some(op), "Different types for binary.");
        None
    }

    /// `+ - * /` and the ordered comparisons over matching numeric kinds.
    ///
    /// Integer arithmetic wraps on the 64-bit storage; results carry the
    /// widest declared type of their kind.
    fn apply_arithmetic(&mut self, op: &Token, lhs: Number, rhs: Number) -> Option<Value> {
        match (lhs, rhs) {
            (Number::Float(a), Number::Float(b)) => Some(match op.kind {
                TokenKind::Plus => Value::float(a + b),
                TokenKind::Minus => Value::float(a - b),
                TokenKind::Star => Value::float(a * b),
                TokenKind::Slash => Value::float(a / b),
                TokenKind::Gt => Value::bool_value(a > b),
                TokenKind::GtEq => Value::bool_value(a >= b),
                TokenKind::Lt => Value::bool_value(a < b),
                TokenKind::LtEq => Value::bool_value(a <= b),
                _ => unreachable!("checked by caller"),
            }),
            (Number::Unsigned(a), Number::Unsigned(b)) => {
                if op.kind == TokenKind::Slash && b == 0 {
                    self.emit_error(Some(op), "Division by zero.");
                    return None;
                }
                Some(match op.kind {
                    TokenKind::Plus => Value::uint(TypeTag::UInt64, a.wrapping_add(b)),
                    TokenKind::Minus => Value::uint(TypeTag::UInt64, a.wrapping_sub(b)),
                    TokenKind::Star => Value::uint(TypeTag::UInt64, a.wrapping_mul(b)),
                    TokenKind::Slash => Value::uint(TypeTag::UInt64, a / b),
                    TokenKind::Gt => Value::bool_value(a > b),
                    TokenKind::GtEq => Value::bool_value(a >= b),
                    TokenKind::Lt => Value::bool_value(a < b),
                    TokenKind::LtEq => Value::bool_value(a <= b),
                    _ => unreachable!("checked by caller"),
                })
            }
            (Number::Signed(a), Number::Signed(b)) => {
                if op.kind == TokenKind::Slash && b == 0 {
                    self.emit_error(Some(op), "Division by zero.");
                    return None;
                }
                Some(match op.kind {
                    TokenKind::Plus => Value::int(TypeTag::Int64, a.wrapping_add(b)),
                    TokenKind::Minus => Value::int(TypeTag::Int64, a.wrapping_sub(b)),
                    TokenKind::Star => Value::int(TypeTag::Int64, a.wrapping_mul(b)),
                    TokenKind::Slash => Value::int(TypeTag::Int64, a.wrapping_div(b)),
                    TokenKind::Gt => Value::bool_value(a > b),
                    TokenKind::GtEq => Value::bool_value(a >= b),
                    TokenKind::Lt => Value::bool_value(a < b),
                    TokenKind::LtEq => Value::bool_value(a <= b),
                    _ => unreachable!("checked by caller"),
                })
            }
            _ => {
                self.emit_error(Some(op), "Different types for binary.");
                None
            }
        }
    }

    /// `<<` / `>>` over integers.
    ///
    /// The permitted shift range comes from the LEFT operand's declared
    /// width; the result widens to `uint64`/`int64` by its signedness.
    fn eval_shift(&mut self, op: &Token, lhs: &Value, rhs: &Value) -> Option<Value> {
        let integers = matches!(lhs.kind, ValueKind::IntSigned | ValueKind::IntUnsigned)
            && matches!(rhs.kind, ValueKind::IntSigned | ValueKind::IntUnsigned);
        if !integers {
            self.emit_error(Some(op), "Shifting is restricted to integers.");
            return None;
        }
        let Some(max_bit) = lhs.ty.bit_width() else {
            self.emit_error(Some(op), "Unknown left type");
            return None;
        };
        let amount = match rhs.kind {
            ValueKind::IntSigned => rhs.bits() as i64,
            _ => {
                let bits = rhs.bits();
                if bits > i64::MAX as u64 {
                    i64::MAX
                } else {
                    bits as i64
                }
            }
        };
        if amount < 0 || amount as u64 >= u64::from(max_bit) {
            self.emit_error(
                Some(op),
                &format!("Bit amount to shift has to be positive and smaller than {max_bit}."),
            );
            return None;
        }
        match lhs.kind {
            ValueKind::IntUnsigned => {
                let value = lhs.bits();
                let result = if op.kind == TokenKind::Shl {
                    value << amount
                } else {
                    value >> amount
                };
                Some(Value::uint(TypeTag::UInt64, result))
            }
            _ => {
                let value = lhs.bits() as i64;
                let result = if op.kind == TokenKind::Shl {
                    value << amount
                } else {
                    value >> amount
                };
                Some(Value::int(TypeTag::Int64, result))
            }
        }
    }

    // =========================================================================
    // CALL DISPATCH
    // =========================================================================

    fn eval_call(&mut self, callee: &Expr, paren: &Token, args: &[Expr]) -> Option<Value> {
        let callee = self.evaluate(callee)?;
        let Payload::Callable(callable) = &callee.payload else {
            self.emit_error(Some(paren), "Not a callable function.");
            return None;
        };
        let callable = callable.clone();
        let mut arguments = Vec::with_capacity(args.len());
        for arg in args {
            arguments.push(self.evaluate(arg)?.duplicate_environment());
        }
        if arguments.len() != callable.decl.params.len() {
            self.emit_error(Some(paren), "Argument mismatch.");
            return None;
        }
        match &callable.kind {
            CallableKind::Native => self.call_native(&callable, &callee, &arguments),
            CallableKind::Script { closure } => {
                self.call_script(&callable, closure.clone(), arguments)
            }
        }
    }

    /// Resolve a load declaration through the binding registry and invoke
    /// the host callback.
    fn call_native(&mut self, callable: &Callable, callee: &Value, args: &[Value]) -> Option<Value> {
        let Some(load_id) = callable.decl.load_id else {
            self.emit_error(Some(&callable.decl.name), "Function binding not found.");
            return None;
        };
        let Some(native) = self.bindings.lookup(load_id.lexeme) else {
            self.emit_error(Some(&load_id), "Function binding not found.");
            return None;
        };
        match native(callee, args) {
            Ok(value) => Some(value),
            Err(message) => {
                self.emit_error(Some(&load_id), &message);
                None
            }
        }
    }

    /// Invoke a script function: bind arguments in a fresh frame enclosing
    /// the captured closure, execute the body, validate the return value.
    fn call_script(&mut self, callable: &Callable, closure: EnvRef, args: Vec<Value>) -> Option<Value> {
        let decl = &callable.decl;
        let Some(body) = &decl.body else {
            self.emit_error(Some(&decl.name), "Function has no body.");
            return None;
        };
        let frame = Environment::with_enclosing(closure);
        for (param, arg) in decl.params.iter().zip(args) {
            let target = Self::type_tag(&param.type_tok);
            match coerce_to_type(arg, target) {
                Ok(value) => frame.borrow_mut().define(param.name.lexeme, value),
                Err(message) => {
                    self.emit_error(Some(&param.name), &message);
                    return None;
                }
            }
        }

        // swap in the call frame; loop bookkeeping never crosses a call
        let previous_env = std::mem::replace(&mut self.env, frame);
        let previous_loops = (
            self.loop_level,
            self.break_remaining,
            self.continue_remaining,
        );
        self.loop_level = 0;
        self.break_remaining = 0;
        self.continue_remaining = 0;

        let result = self.execute(body);

        self.env = previous_env;
        (
            self.loop_level,
            self.break_remaining,
            self.continue_remaining,
        ) = previous_loops;

        if self.error {
            return None;
        }
        match result {
            Some(ctrl) if ctrl.is_return => {
                let mut value = ctrl.duplicate_environment();
                value.is_return = false;
                let return_ty = Self::type_tag(&decl.return_type);
                match coerce_to_type(value, return_ty) {
                    Ok(value) => Some(value),
                    Err(message) => {
                        self.emit_error(Some(&decl.return_type), &message);
                        None
                    }
                }
            }
            // a body that never returns yields null
            _ => Some(Value::null()),
        }
    }
}

/// Level carried by a break/continue control value.
fn control_level(value: &Value) -> i64 {
    match value.payload {
        Payload::Signed(level) => level,
        Payload::Unsigned(level) => level as i64,
        _ => 1,
    }
}
