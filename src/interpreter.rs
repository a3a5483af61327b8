// ABOUTME: Tree-walking evaluator: executes statements, evaluates expressions

use crate::ast::{Expr, ExprId, Stmt};
use crate::callable::{BuiltIn, Callable, Class, Function, Instance, Lambda};
use crate::diagnostics::Diagnostics;
use crate::env::Environment;
use crate::error::RuntimeError;
use crate::token::{Token, TokenKind};
use crate::value::Value;
use std::collections::HashMap;
use std::rc::Rc;

/// The three ways a statement's execution can leave its caller other than by
/// normal completion. Modeled as an enum thread back up through `Result`
/// rather than as a native exception, per the source's "any strategy is
/// acceptable" design freedom.
pub enum Unwind {
    Break(Token),
    Continue(Token),
    Return(Value),
    Error(RuntimeError, u32),
}

type ExecResult = Result<(), Unwind>;
type EvalResult = Result<Value, Unwind>;

pub struct Interpreter {
    pub globals: Rc<Environment>,
    env: Rc<Environment>,
    locals: HashMap<ExprId, usize>,
    stdout: Box<dyn std::io::Write>,
}

impl Interpreter {
    pub fn new(locals: HashMap<ExprId, usize>) -> Self {
        Self::with_stdout(locals, Box::new(std::io::stdout()))
    }

    /// Same pipeline, but `print` writes to the given sink instead of the
    /// process's real stdout. Integration tests use this to assert on
    /// program output without capturing the test harness's own stdout.
    pub fn with_stdout(locals: HashMap<ExprId, usize>, stdout: Box<dyn std::io::Write>) -> Self {
        let globals = Environment::new();
        crate::builtins::register(&globals);
        Interpreter {
            globals: Rc::clone(&globals),
            env: globals,
            locals,
            stdout,
        }
    }

    /// Runs a whole program. Any uncaught `Unwind` (a runtime error, or a
    /// `break`/`continue`/`return` that escaped every enclosing construct)
    /// is reported as a single diagnostic and execution stops.
    pub fn interpret(&mut self, statements: &[Stmt], diags: &mut Diagnostics) {
        if diags.has_fatal() {
            return;
        }
        for stmt in statements {
            if let Err(unwind) = self.exec(stmt) {
                self.report_unwind(unwind, diags);
                return;
            }
        }
    }

    fn report_unwind(&self, unwind: Unwind, diags: &mut Diagnostics) {
        match unwind {
            Unwind::Error(err, line) => diags.error(line, err.to_string()),
            Unwind::Break(token) => diags.error(token.line, RuntimeError::BreakOutsideLoop.to_string()),
            Unwind::Continue(token) => diags.error(token.line, RuntimeError::ContinueOutsideLoop.to_string()),
            Unwind::Return(_) => diags.error(0, RuntimeError::ReturnOutsideFunction.to_string()),
        }
        diags.finish_phase("interpreting");
    }

    fn fail(&self, line: u32, err: impl Into<RuntimeError>) -> Unwind {
        Unwind::Error(err.into(), line)
    }

    fn exec(&mut self, stmt: &Stmt) -> ExecResult {
        match stmt {
            Stmt::Expression(expr) => {
                self.eval(expr)?;
                Ok(())
            }
            Stmt::Print(expr) => {
                let value = self.eval(expr)?;
                let _ = writeln!(self.stdout, "{}", value);
                Ok(())
            }
            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(init) => self.eval(init)?,
                    None => Value::Nil,
                };
                self.env.define(name.lexeme.clone(), value);
                Ok(())
            }
            Stmt::Block(statements) => {
                let child = Environment::with_parent(Rc::clone(&self.env));
                self.execute_block(statements, child)
            }
            Stmt::IfStmt {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.eval(condition)?.is_truthy() {
                    self.exec(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.exec(else_branch)
                } else {
                    Ok(())
                }
            }
            Stmt::While { condition, body } => {
                while self.eval(condition)?.is_truthy() {
                    match self.exec(body) {
                        Ok(()) => {}
                        Err(Unwind::Break(_)) => break,
                        Err(Unwind::Continue(_)) => continue,
                        Err(other) => return Err(other),
                    }
                }
                Ok(())
            }
            Stmt::ForLoop {
                initializer,
                condition,
                increment,
                body,
            } => {
                if let Some(initializer) = initializer {
                    self.exec(initializer)?;
                }
                while self.eval(condition)?.is_truthy() {
                    match self.exec(body) {
                        Ok(()) => {}
                        Err(Unwind::Break(_)) => break,
                        Err(Unwind::Continue(_)) => {
                            if let Some(increment) = increment {
                                self.eval(increment)?;
                            }
                            continue;
                        }
                        Err(other) => return Err(other),
                    }
                    if let Some(increment) = increment {
                        self.eval(increment)?;
                    }
                }
                Ok(())
            }
            Stmt::LoopControl(token) => match token.kind {
                TokenKind::Break => Err(Unwind::Break(token.clone())),
                TokenKind::Continue => Err(Unwind::Continue(token.clone())),
                _ => unreachable!("parser only ever produces Break/Continue LoopControl tokens"),
            },
            Stmt::Function(decl) => {
                let function = Function::new(Rc::new(decl.clone()), Rc::clone(&self.env));
                self.env.define(
                    decl.name.lexeme.clone(),
                    Value::Callable(Rc::new(function)),
                );
                Ok(())
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.eval(expr)?,
                    None => Value::Nil,
                };
                Err(Unwind::Return(value))
            }
            Stmt::Klass { name, methods } => {
                let mut method_table = HashMap::with_capacity(methods.len());
                for method in methods {
                    let function = Function::new(Rc::new(method.clone()), Rc::clone(&self.env));
                    method_table.insert(method.name.lexeme.clone(), Rc::new(function));
                }
                let class = Class::new(name.lexeme.clone(), method_table);
                self.env
                    .define(name.lexeme.clone(), Value::Callable(Rc::new(class)));
                Ok(())
            }
        }
    }

    /// Executes `statements` against `env` as the current environment,
    /// restoring the previous environment afterward even on non-local exit.
    pub fn execute_block(&mut self, statements: &[Stmt], env: Rc<Environment>) -> ExecResult {
        let previous = std::mem::replace(&mut self.env, env);
        let result = (|| {
            for stmt in statements {
                self.exec(stmt)?;
            }
            Ok(())
        })();
        self.env = previous;
        result
    }

    fn eval(&mut self, expr: &Expr) -> EvalResult {
        match expr {
            Expr::Literal { value, .. } => Ok(value.clone()),
            Expr::Grouping { inner, .. } => self.eval(inner),
            Expr::Unary { id: _, op, operand } => {
                let value = self.eval(operand)?;
                match op.kind {
                    TokenKind::Minus => value.negate().map_err(|e| self.fail(op.line, e)),
                    TokenKind::Bang => Ok(value.not()),
                    _ => unreachable!("parser only ever produces -/! unary operators"),
                }
            }
            Expr::Binary { left, op, right, .. } => self.eval_binary(left, op, right),
            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                if self.eval(condition)?.is_truthy() {
                    self.eval(then_branch)
                } else {
                    self.eval(else_branch)
                }
            }
            Expr::Variable { id, name } => self.lookup_variable(*id, &name.lexeme, name.line),
            Expr::ThisKw { id, keyword } => self.lookup_variable(*id, &keyword.lexeme, keyword.line),
            Expr::Assign { id, name, value } => {
                let value = self.eval(value)?;
                match self.locals.get(id) {
                    Some(depth) => self.env.assign_at(&name.lexeme, value.clone(), *depth),
                    None => self
                        .globals
                        .assign(&name.lexeme, value.clone())
                        .map_err(|e| self.fail(name.line, e))?,
                }
                Ok(value)
            }
            Expr::Call { callee, paren, args } => self.eval_call(callee, paren, args),
            Expr::Lambda { params, body, .. } => Ok(Value::Callable(Rc::new(Lambda {
                params: params.clone(),
                body: body.clone(),
                closure: Rc::clone(&self.env),
            }))),
            Expr::Get { object, name } => {
                let object = self.eval(object)?;
                match object {
                    Value::Instance(instance) => instance
                        .get(&name.lexeme)
                        .ok_or_else(|| self.fail(name.line, RuntimeError::UndefinedProperty(name.lexeme.clone()))),
                    _ => Err(self.fail(name.line, RuntimeError::NotInstance)),
                }
            }
            Expr::Set { object, name, value } => {
                let object = self.eval(object)?;
                match object {
                    Value::Instance(instance) => {
                        let value = self.eval(value)?;
                        instance.set(name.lexeme.clone(), value.clone());
                        Ok(value)
                    }
                    _ => Err(self.fail(name.line, RuntimeError::NotInstance)),
                }
            }
        }
    }

    fn eval_binary(&mut self, left: &Expr, op: &Token, right: &Expr) -> EvalResult {
        // `and`/`or` short-circuit and must not evaluate the right operand
        // unconditionally, so they are handled before the left value is used
        // for anything else.
        if op.kind == TokenKind::And {
            let l = self.eval(left)?;
            return if !l.is_truthy() {
                Ok(Value::Bool(false))
            } else {
                Ok(Value::Bool(self.eval(right)?.is_truthy()))
            };
        }
        if op.kind == TokenKind::Or {
            let l = self.eval(left)?;
            return if l.is_truthy() {
                Ok(Value::Bool(true))
            } else {
                Ok(Value::Bool(self.eval(right)?.is_truthy()))
            };
        }

        let l = self.eval(left)?;
        let r = self.eval(right)?;
        let result = match op.kind {
            TokenKind::Plus => l.add(&r),
            TokenKind::Minus => l.sub(&r),
            TokenKind::Star => l.mul(&r),
            TokenKind::Slash => l.div(&r),
            TokenKind::EqualEqual => Ok(l.equals(&r)),
            TokenKind::BangEqual => Ok(l.not_equals(&r)),
            TokenKind::Less => l.less_than(&r),
            TokenKind::LessEqual => l.less_equal(&r),
            TokenKind::Greater => l.greater_than(&r),
            TokenKind::GreaterEqual => l.greater_equal(&r),
            _ => unreachable!("parser only ever produces these operators in Binary position"),
        };
        result.map_err(|e| self.fail(op.line, e))
    }

    fn eval_call(&mut self, callee: &Expr, paren: &Token, args: &[Expr]) -> EvalResult {
        let callee_value = self.eval(callee)?;
        let mut arg_values = Vec::with_capacity(args.len());
        for arg in args {
            arg_values.push(self.eval(arg)?);
        }
        let callable: Rc<dyn Callable> = match callee_value {
            Value::Callable(c) => c,
            _ => return Err(self.fail(paren.line, RuntimeError::NotCallable)),
        };
        if arg_values.len() != callable.arity() {
            return Err(self.fail(
                paren.line,
                RuntimeError::ArityMismatch {
                    expected: callable.arity(),
                    actual: arg_values.len(),
                },
            ));
        }
        callable.call(self, arg_values)
    }

    fn lookup_variable(&self, id: ExprId, name: &str, line: u32) -> EvalResult {
        match self.locals.get(&id) {
            Some(depth) => Ok(self.env.lookup_at(name, *depth)),
            None => self.globals.lookup(name).map_err(|e| self.fail(line, e)),
        }
    }
}
