// ABOUTME: Static pass binding every variable use to a lexical scope distance

use crate::ast::{Expr, ExprId, FunctionDecl, Stmt};
use crate::diagnostics::Diagnostics;
use crate::token::Token;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FunctionKind {
    None,
    Function,
    Lambda,
    Method,
}

/// Walks the statement list once, before evaluation. Populates `locals`
/// (keyed by the expression-node identity the parser assigned) and reports
/// static errors: duplicate declarations, use-before-init, and `return`/
/// `break`/`continue` outside their enclosing construct.
pub struct Resolver<'d> {
    scopes: Vec<HashMap<String, bool>>,
    locals: HashMap<ExprId, usize>,
    current_function: FunctionKind,
    in_loop: bool,
    diags: &'d mut Diagnostics,
}

impl<'d> Resolver<'d> {
    pub fn new(diags: &'d mut Diagnostics) -> Self {
        Resolver {
            scopes: Vec::new(),
            locals: HashMap::new(),
            current_function: FunctionKind::None,
            in_loop: false,
            diags,
        }
    }

    /// Resolves an entire program and returns the id → depth side-table.
    pub fn resolve(mut self, statements: &[Stmt]) -> HashMap<ExprId, usize> {
        self.resolve_stmts(statements);
        self.diags.finish_phase("resolving");
        self.locals
    }

    fn resolve_stmts(&mut self, statements: &[Stmt]) {
        for stmt in statements {
            self.resolve_stmt(stmt);
        }
    }

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expression(expr) => self.resolve_expr(expr),
            Stmt::Print(expr) => self.resolve_expr(expr),
            Stmt::Var { name, initializer } => {
                self.declare(name);
                if let Some(init) = initializer {
                    self.resolve_expr(init);
                }
                self.define(name);
            }
            Stmt::Block(statements) => {
                self.begin_scope();
                self.resolve_stmts(statements);
                self.end_scope();
            }
            Stmt::IfStmt {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch);
                }
            }
            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                let enclosing_loop = self.in_loop;
                self.in_loop = true;
                self.resolve_stmt(body);
                self.in_loop = enclosing_loop;
            }
            Stmt::ForLoop {
                initializer,
                condition,
                increment,
                body,
            } => {
                if let Some(initializer) = initializer {
                    self.resolve_stmt(initializer);
                }
                self.resolve_expr(condition);
                if let Some(increment) = increment {
                    self.resolve_expr(increment);
                }
                let enclosing_loop = self.in_loop;
                self.in_loop = true;
                self.resolve_stmt(body);
                self.in_loop = enclosing_loop;
            }
            Stmt::LoopControl(token) => {
                if !self.in_loop {
                    let message = if token.lexeme == "break" {
                        "'break' outside a loop."
                    } else {
                        "'continue' outside a loop."
                    };
                    self.diags.error(token.line, message);
                }
            }
            Stmt::Function(decl) => {
                self.declare(&decl.name);
                self.define(&decl.name);
                self.resolve_function(decl, FunctionKind::Function);
            }
            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionKind::None {
                    self.diags.error(keyword.line, "'return' outside a function.");
                }
                if let Some(value) = value {
                    self.resolve_expr(value);
                }
            }
            Stmt::Klass { name, methods } => {
                self.declare(name);
                self.define(name);
                self.begin_scope();
                self.scopes
                    .last_mut()
                    .expect("scope just pushed")
                    .insert("this".to_string(), true);
                for method in methods {
                    self.resolve_function(method, FunctionKind::Method);
                }
                self.end_scope();
            }
        }
    }

    fn resolve_function(&mut self, decl: &FunctionDecl, kind: FunctionKind) {
        let enclosing_function = self.current_function;
        self.current_function = kind;
        self.begin_scope();
        for param in &decl.params {
            self.declare(param);
            self.define(param);
        }
        self.resolve_stmts(&decl.body);
        self.end_scope();
        self.current_function = enclosing_function;
    }

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal { .. } => {}
            Expr::Grouping { inner, .. } => self.resolve_expr(inner),
            Expr::Unary { operand, .. } => self.resolve_expr(operand),
            Expr::Binary { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }
            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                self.resolve_expr(condition);
                self.resolve_expr(then_branch);
                self.resolve_expr(else_branch);
            }
            Expr::Variable { id, name } => {
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&name.lexeme) == Some(false) {
                        self.diags.error(
                            name.line,
                            format!("Can't read local variable '{}' in its own initializer.", name.lexeme),
                        );
                    }
                }
                self.resolve_local(*id, &name.lexeme);
            }
            Expr::Assign { id, name, value } => {
                self.resolve_expr(value);
                self.resolve_local(*id, &name.lexeme);
            }
            Expr::Call { callee, args, .. } => {
                self.resolve_expr(callee);
                for arg in args {
                    self.resolve_expr(arg);
                }
            }
            Expr::Lambda { params, body, .. } => {
                let enclosing_function = self.current_function;
                self.current_function = FunctionKind::Lambda;
                self.begin_scope();
                for param in params {
                    self.declare(param);
                    self.define(param);
                }
                self.resolve_stmts(body);
                self.end_scope();
                self.current_function = enclosing_function;
            }
            Expr::Get { object, .. } => self.resolve_expr(object),
            Expr::Set { object, value, .. } => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }
            Expr::ThisKw { id, keyword } => self.resolve_local(*id, &keyword.lexeme),
        }
    }

    fn resolve_local(&mut self, id: ExprId, name: &str) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(name) {
                self.locals.insert(id, depth);
                return;
            }
        }
        // Not found in any local scope: treated as global at runtime.
    }

    fn declare(&mut self, name: &Token) {
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };
        if scope.contains_key(&name.lexeme) {
            self.diags.error(
                name.line,
                format!("Variable '{}' already declared in this scope.", name.lexeme),
            );
        }
        scope.insert(name.lexeme.clone(), false);
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn resolve(src: &str) -> (HashMap<ExprId, usize>, Diagnostics) {
        ast::reset_ids();
        let mut diags = Diagnostics::new();
        let tokens = Lexer::new(src).scan_tokens(&mut diags);
        let stmts = Parser::new(tokens).parse(&mut diags);
        let mut diags2 = Diagnostics::new();
        let locals = Resolver::new(&mut diags2).resolve(&stmts);
        (locals, diags2)
    }

    #[test]
    fn global_reads_have_no_local_entry() {
        let (locals, diags) = resolve("var x = 1; print x;");
        assert!(locals.is_empty());
        assert_eq!(diags.count(crate::diagnostics::Level::Error), 0);
    }

    #[test]
    fn block_local_is_resolved_at_depth_zero() {
        let (locals, _) = resolve("{ var x = 1; print x; }");
        assert_eq!(locals.len(), 1);
        assert_eq!(*locals.values().next().unwrap(), 0);
    }

    #[test]
    fn self_referential_initializer_is_an_error() {
        let (_, diags) = resolve("{ var a = a; }");
        assert_eq!(diags.count(crate::diagnostics::Level::Error), 1);
    }

    #[test]
    fn duplicate_local_declaration_is_an_error() {
        let (_, diags) = resolve("{ var a = 1; var a = 2; }");
        assert_eq!(diags.count(crate::diagnostics::Level::Error), 1);
    }

    #[test]
    fn break_outside_loop_is_an_error() {
        let (_, diags) = resolve("break;");
        assert_eq!(diags.count(crate::diagnostics::Level::Error), 1);
    }

    #[test]
    fn return_outside_function_is_an_error() {
        let (_, diags) = resolve("return 1;");
        assert_eq!(diags.count(crate::diagnostics::Level::Error), 1);
    }
}
