// ABOUTME: Recursive-descent parser turning a token stream into a statement list

use crate::ast::{Expr, FunctionDecl, Stmt};
use crate::diagnostics::Diagnostics;
use crate::token::{Literal, Token, TokenKind};

/// Marks that the current declaration/statement could not be parsed. The
/// diagnostic has already been recorded at the point of failure; this is
/// only used to unwind to `synchronize_`.
struct ParseError;

const MAX_ARGS: usize = 255;

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, current: 0 }
    }

    /// Parses the whole token stream into a statement list. Never halts on
    /// error: a broken declaration is skipped (panic-mode recovery) and
    /// parsing resumes at the next statement boundary.
    pub fn parse(mut self, diags: &mut Diagnostics) -> Vec<Stmt> {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            if let Some(stmt) = self.declaration(diags) {
                statements.push(stmt);
            }
        }
        diags.finish_phase("parsing");
        statements
    }

    fn declaration(&mut self, diags: &mut Diagnostics) -> Option<Stmt> {
        let result = if self.matches(&[TokenKind::Class]) {
            self.class_decl(diags)
        } else if self.matches(&[TokenKind::Fun]) {
            self.function(diags, "function").map(Stmt::Function)
        } else if self.matches(&[TokenKind::Var]) {
            self.var_decl(diags)
        } else {
            self.statement(diags)
        };
        match result {
            Ok(stmt) => Some(stmt),
            Err(ParseError) => {
                self.synchronize();
                None
            }
        }
    }

    fn class_decl(&mut self, diags: &mut Diagnostics) -> Result<Stmt, ParseError> {
        let name = self.consume(diags, TokenKind::Identifier, "Expect class name.")?;
        self.consume(diags, TokenKind::LeftBrace, "Expect '{' before class body.")?;
        let mut methods = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            methods.push(self.function(diags, "method")?);
        }
        self.consume(diags, TokenKind::RightBrace, "Expect '}' after class body.")?;
        Ok(Stmt::Klass { name, methods })
    }

    fn function(&mut self, diags: &mut Diagnostics, kind: &str) -> Result<FunctionDecl, ParseError> {
        let name = self.consume(diags, TokenKind::Identifier, &format!("Expect {} name.", kind))?;
        let (params, body) = self.function_tail(diags)?;
        Ok(FunctionDecl { name, params, body })
    }

    /// Parses `"(" params? ")" block`, shared by named functions, methods,
    /// and `fun` lambdas (which reuse this after consuming the keyword).
    fn function_tail(&mut self, diags: &mut Diagnostics) -> Result<(Vec<Token>, Vec<Stmt>), ParseError> {
        self.consume(diags, TokenKind::LeftParen, "Expect '(' after name.")?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                if params.len() >= MAX_ARGS {
                    self.error(diags, self.peek().clone(), &format!("Can't have more than {} parameters.", MAX_ARGS));
                }
                params.push(self.consume(diags, TokenKind::Identifier, "Expect parameter name.")?);
                if !self.matches(&[TokenKind::Comma]) {
                    break;
                }
            }
        }
        self.consume(diags, TokenKind::RightParen, "Expect ')' after parameters.")?;
        self.consume(diags, TokenKind::LeftBrace, "Expect '{' before body.")?;
        let body = self.block(diags)?;
        Ok((params, body))
    }

    fn var_decl(&mut self, diags: &mut Diagnostics) -> Result<Stmt, ParseError> {
        let name = self.consume(diags, TokenKind::Identifier, "Expect variable name.")?;
        let initializer = if self.matches(&[TokenKind::Equal]) {
            Some(self.expression(diags)?)
        } else {
            None
        };
        self.consume(diags, TokenKind::Semicolon, "Expect ';' after variable declaration.")?;
        Ok(Stmt::Var { name, initializer })
    }

    fn statement(&mut self, diags: &mut Diagnostics) -> Result<Stmt, ParseError> {
        if self.matches(&[TokenKind::Print]) {
            return self.print_stmt(diags);
        }
        if self.matches(&[TokenKind::LeftBrace]) {
            return Ok(Stmt::Block(self.block(diags)?));
        }
        if self.matches(&[TokenKind::If]) {
            return self.if_stmt(diags);
        }
        if self.matches(&[TokenKind::While]) {
            return self.while_stmt(diags);
        }
        if self.matches(&[TokenKind::For]) {
            return self.for_stmt(diags);
        }
        if self.matches(&[TokenKind::Return]) {
            return self.return_stmt(diags);
        }
        if self.matches(&[TokenKind::Break]) {
            let token = self.previous().clone();
            self.consume(diags, TokenKind::Semicolon, "Expect ';' after 'break'.")?;
            return Ok(Stmt::LoopControl(token));
        }
        if self.matches(&[TokenKind::Continue]) {
            let token = self.previous().clone();
            self.consume(diags, TokenKind::Semicolon, "Expect ';' after 'continue'.")?;
            return Ok(Stmt::LoopControl(token));
        }
        self.expr_stmt(diags)
    }

    fn print_stmt(&mut self, diags: &mut Diagnostics) -> Result<Stmt, ParseError> {
        let value = self.expression(diags)?;
        self.consume(diags, TokenKind::Semicolon, "Expect ';' after value.")?;
        Ok(Stmt::Print(value))
    }

    fn expr_stmt(&mut self, diags: &mut Diagnostics) -> Result<Stmt, ParseError> {
        let expr = self.expression(diags)?;
        self.consume(diags, TokenKind::Semicolon, "Expect ';' after expression.")?;
        Ok(Stmt::Expression(expr))
    }

    fn block(&mut self, diags: &mut Diagnostics) -> Result<Vec<Stmt>, ParseError> {
        let mut statements = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            if let Some(stmt) = self.declaration(diags) {
                statements.push(stmt);
            }
        }
        self.consume(diags, TokenKind::RightBrace, "Expect '}' after block.")?;
        Ok(statements)
    }

    fn if_stmt(&mut self, diags: &mut Diagnostics) -> Result<Stmt, ParseError> {
        self.consume(diags, TokenKind::LeftParen, "Expect '(' after 'if'.")?;
        let condition = self.expression(diags)?;
        self.consume(diags, TokenKind::RightParen, "Expect ')' after if condition.")?;
        let then_branch = Box::new(self.statement(diags)?);
        let else_branch = if self.matches(&[TokenKind::Else]) {
            Some(Box::new(self.statement(diags)?))
        } else {
            None
        };
        Ok(Stmt::IfStmt {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn while_stmt(&mut self, diags: &mut Diagnostics) -> Result<Stmt, ParseError> {
        self.consume(diags, TokenKind::LeftParen, "Expect '(' after 'while'.")?;
        let condition = self.expression(diags)?;
        self.consume(diags, TokenKind::RightParen, "Expect ')' after while condition.")?;
        let body = Box::new(self.statement(diags)?);
        Ok(Stmt::While { condition, body })
    }

    fn for_stmt(&mut self, diags: &mut Diagnostics) -> Result<Stmt, ParseError> {
        self.consume(diags, TokenKind::LeftParen, "Expect '(' after 'for'.")?;

        let initializer = if self.matches(&[TokenKind::Semicolon]) {
            None
        } else if self.matches(&[TokenKind::Var]) {
            Some(Box::new(self.var_decl(diags)?))
        } else {
            Some(Box::new(self.expr_stmt(diags)?))
        };

        let condition = if !self.check(TokenKind::Semicolon) {
            self.expression(diags)?
        } else {
            Expr::literal(crate::value::Value::Bool(true))
        };
        self.consume(diags, TokenKind::Semicolon, "Expect ';' after loop condition.")?;

        let increment = if !self.check(TokenKind::RightParen) {
            Some(self.expression(diags)?)
        } else {
            None
        };
        self.consume(diags, TokenKind::RightParen, "Expect ')' after for clauses.")?;

        let body = Box::new(self.statement(diags)?);

        // The initializer runs once "in the enclosing scope," but that scope
        // is a fresh block the parser introduces here — otherwise a loop
        // variable would leak into (and could collide with) whatever scope
        // contains the `for`.
        Ok(Stmt::Block(vec![Stmt::ForLoop {
            initializer,
            condition,
            increment,
            body,
        }]))
    }

    fn return_stmt(&mut self, diags: &mut Diagnostics) -> Result<Stmt, ParseError> {
        let keyword = self.previous().clone();
        let value = if !self.check(TokenKind::Semicolon) {
            Some(self.expression(diags)?)
        } else {
            None
        };
        self.consume(diags, TokenKind::Semicolon, "Expect ';' after return value.")?;
        Ok(Stmt::Return { keyword, value })
    }

    fn expression(&mut self, diags: &mut Diagnostics) -> Result<Expr, ParseError> {
        self.assignment(diags)
    }

    fn assignment(&mut self, diags: &mut Diagnostics) -> Result<Expr, ParseError> {
        let expr = self.ternary(diags)?;
        if self.matches(&[TokenKind::Equal]) {
            let equals = self.previous().clone();
            let value = self.assignment(diags)?;
            return match expr {
                Expr::Variable { name, .. } => Ok(Expr::assign(name, value)),
                Expr::Get { object, name, .. } => Ok(Expr::set(*object, name, value)),
                _ => {
                    self.error(diags, equals, "Invalid assignment target.");
                    Err(ParseError)
                }
            };
        }
        Ok(expr)
    }

    fn ternary(&mut self, diags: &mut Diagnostics) -> Result<Expr, ParseError> {
        let condition = self.logic_or(diags)?;
        if self.matches(&[TokenKind::QuestionMark]) {
            let then_branch = self.ternary(diags)?;
            self.consume(diags, TokenKind::Colon, "Expect ':' after ternary option.")?;
            let else_branch = self.ternary(diags)?;
            return Ok(Expr::ternary(condition, then_branch, else_branch));
        }
        Ok(condition)
    }

    fn logic_or(&mut self, diags: &mut Diagnostics) -> Result<Expr, ParseError> {
        let mut expr = self.logic_and(diags)?;
        while self.matches(&[TokenKind::Or]) {
            let op = self.previous().clone();
            let right = self.logic_and(diags)?;
            expr = Expr::binary(expr, op, right);
        }
        Ok(expr)
    }

    fn logic_and(&mut self, diags: &mut Diagnostics) -> Result<Expr, ParseError> {
        let mut expr = self.equality(diags)?;
        while self.matches(&[TokenKind::And]) {
            let op = self.previous().clone();
            let right = self.equality(diags)?;
            expr = Expr::binary(expr, op, right);
        }
        Ok(expr)
    }

    fn equality(&mut self, diags: &mut Diagnostics) -> Result<Expr, ParseError> {
        let mut expr = self.comparison(diags)?;
        while self.matches(&[TokenKind::EqualEqual, TokenKind::BangEqual]) {
            let op = self.previous().clone();
            let right = self.comparison(diags)?;
            expr = Expr::binary(expr, op, right);
        }
        Ok(expr)
    }

    fn comparison(&mut self, diags: &mut Diagnostics) -> Result<Expr, ParseError> {
        let mut expr = self.addition(diags)?;
        while self.matches(&[
            TokenKind::Greater,
            TokenKind::GreaterEqual,
            TokenKind::Less,
            TokenKind::LessEqual,
        ]) {
            let op = self.previous().clone();
            let right = self.addition(diags)?;
            expr = Expr::binary(expr, op, right);
        }
        Ok(expr)
    }

    fn addition(&mut self, diags: &mut Diagnostics) -> Result<Expr, ParseError> {
        let mut expr = self.multiplication(diags)?;
        while self.matches(&[TokenKind::Plus, TokenKind::Minus]) {
            let op = self.previous().clone();
            let right = self.multiplication(diags)?;
            expr = Expr::binary(expr, op, right);
        }
        Ok(expr)
    }

    fn multiplication(&mut self, diags: &mut Diagnostics) -> Result<Expr, ParseError> {
        let mut expr = self.unary(diags)?;
        while self.matches(&[TokenKind::Star, TokenKind::Slash]) {
            let op = self.previous().clone();
            let right = self.unary(diags)?;
            expr = Expr::binary(expr, op, right);
        }
        Ok(expr)
    }

    fn unary(&mut self, diags: &mut Diagnostics) -> Result<Expr, ParseError> {
        if self.matches(&[TokenKind::Minus, TokenKind::Bang]) {
            let op = self.previous().clone();
            let operand = self.unary(diags)?;
            return Ok(Expr::unary(op, operand));
        }
        self.call(diags)
    }

    fn call(&mut self, diags: &mut Diagnostics) -> Result<Expr, ParseError> {
        let mut expr = self.primary(diags)?;
        loop {
            if self.matches(&[TokenKind::LeftParen]) {
                expr = self.finish_call(diags, expr)?;
            } else if self.matches(&[TokenKind::Dot]) {
                let name = self.consume(diags, TokenKind::Identifier, "Expect property name after '.'.")?;
                expr = Expr::get(expr, name);
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn finish_call(&mut self, diags: &mut Diagnostics, callee: Expr) -> Result<Expr, ParseError> {
        let mut args = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                if args.len() >= MAX_ARGS {
                    self.error(diags, self.peek().clone(), &format!("Can't have more than {} arguments.", MAX_ARGS));
                }
                args.push(self.expression(diags)?);
                if !self.matches(&[TokenKind::Comma]) {
                    break;
                }
            }
        }
        let paren = self.consume(diags, TokenKind::RightParen, "Expect ')' after arguments.")?;
        Ok(Expr::call(callee, paren, args))
    }

    fn primary(&mut self, diags: &mut Diagnostics) -> Result<Expr, ParseError> {
        if self.matches(&[TokenKind::False]) {
            return Ok(Expr::literal(crate::value::Value::Bool(false)));
        }
        if self.matches(&[TokenKind::True]) {
            return Ok(Expr::literal(crate::value::Value::Bool(true)));
        }
        if self.matches(&[TokenKind::Nil]) {
            return Ok(Expr::literal(crate::value::Value::Nil));
        }
        if self.matches(&[TokenKind::Number]) {
            let n = match &self.previous().literal {
                Literal::Number(n) => *n,
                _ => unreachable!("lexer always attaches a Number literal to a Number token"),
            };
            return Ok(Expr::literal(crate::value::Value::Number(n)));
        }
        if self.matches(&[TokenKind::String]) {
            let s = match &self.previous().literal {
                Literal::Text(s) => s.clone(),
                _ => unreachable!("lexer always attaches a Text literal to a String token"),
            };
            return Ok(Expr::literal(crate::value::Value::Text(s)));
        }
        if self.matches(&[TokenKind::This]) {
            return Ok(Expr::this_kw(self.previous().clone()));
        }
        if self.matches(&[TokenKind::Fun]) {
            let (params, body) = self.function_tail(diags)?;
            return Ok(Expr::lambda(params, body));
        }
        if self.matches(&[TokenKind::LeftParen]) {
            let expr = self.expression(diags)?;
            self.consume(diags, TokenKind::RightParen, "Expect ')' after expression.")?;
            return Ok(Expr::grouping(expr));
        }
        if self.matches(&[TokenKind::Identifier]) {
            return Ok(Expr::variable(self.previous().clone()));
        }
        let token = self.peek().clone();
        self.error(diags, token, "Expect expression.");
        Err(ParseError)
    }

    fn matches(&mut self, kinds: &[TokenKind]) -> bool {
        for kind in kinds {
            if self.check(*kind) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.peek().kind == kind
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn consume(&mut self, diags: &mut Diagnostics, kind: TokenKind, message: &str) -> Result<Token, ParseError> {
        if self.check(kind) {
            return Ok(self.advance().clone());
        }
        let token = self.peek().clone();
        self.error(diags, token, message);
        Err(ParseError)
    }

    fn error(&self, diags: &mut Diagnostics, token: Token, message: &str) {
        diags.error(token.line, format!("At token '{}' {}", token.lexeme, message));
    }

    /// Advances past the broken construct to the next statement boundary: a
    /// semicolon, or a token that starts a new statement.
    fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() {
            if self.previous().kind == TokenKind::Semicolon {
                return;
            }
            match self.peek().kind {
                TokenKind::Class
                | TokenKind::Fun
                | TokenKind::Var
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Return => return,
                _ => {}
            }
            self.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast;
    use crate::lexer::Lexer;

    fn parse(src: &str) -> (Vec<Stmt>, Diagnostics) {
        ast::reset_ids();
        let mut diags = Diagnostics::new();
        let tokens = Lexer::new(src).scan_tokens(&mut diags);
        let stmts = Parser::new(tokens).parse(&mut diags);
        (stmts, diags)
    }

    #[test]
    fn print_statement() {
        let (stmts, diags) = parse("print 1 + 2 * 3;");
        assert_eq!(stmts.len(), 1);
        assert!(matches!(stmts[0], Stmt::Print(_)));
        assert_eq!(diags.count(crate::diagnostics::Level::Error), 0);
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let (stmts, _) = parse("print 1 + 2 * 3;");
        match &stmts[0] {
            Stmt::Print(Expr::Binary { left, op, right }) => {
                assert!(matches!(**left, Expr::Literal { .. }));
                assert_eq!(op.kind, TokenKind::Plus);
                assert!(matches!(**right, Expr::Binary { .. }));
            }
            _ => panic!("expected print of a binary expression"),
        }
    }

    #[test]
    fn assignment_is_right_associative() {
        let (stmts, diags) = parse("a = b = 1;");
        assert_eq!(diags.count(crate::diagnostics::Level::Error), 0);
        assert_eq!(stmts.len(), 1);
    }

    #[test]
    fn invalid_assignment_target_is_an_error() {
        let (_, diags) = parse("1 = 2;");
        assert_eq!(diags.count(crate::diagnostics::Level::Error), 1);
    }

    #[test]
    fn class_with_a_method() {
        let (stmts, diags) = parse("class C { hello() { print 1; } }");
        assert_eq!(diags.count(crate::diagnostics::Level::Error), 0);
        assert!(matches!(stmts[0], Stmt::Klass { .. }));
    }

    #[test]
    fn parse_error_recovers_at_next_statement() {
        let (stmts, diags) = parse("var = ; print 1;");
        assert_eq!(diags.count(crate::diagnostics::Level::Error), 1);
        assert_eq!(stmts.len(), 1);
    }

    #[test]
    fn for_loop_desugars_into_a_for_loop_node_inside_a_fresh_block() {
        let (stmts, _) = parse("for (var i = 0; i < 3; i = i + 1) print i;");
        match &stmts[0] {
            Stmt::Block(inner) => assert!(matches!(inner[0], Stmt::ForLoop { .. })),
            _ => panic!("expected the for-loop wrapped in a fresh block"),
        }
    }

    #[test]
    fn ternary_expression() {
        let (stmts, diags) = parse("print true ? 1 : 2;");
        assert_eq!(diags.count(crate::diagnostics::Level::Error), 0);
        assert!(matches!(stmts[0], Stmt::Print(Expr::Ternary { .. })));
    }
}
