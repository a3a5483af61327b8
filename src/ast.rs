// ABOUTME: AST node definitions for expressions and statements

use crate::token::Token;
use crate::value::Value;
use std::cell::Cell;

/// A dense integer identity assigned to every expression node at construction time.
/// The resolver keys its `locals` side-table on this id; the interpreter looks
/// up by the same id. Stands in for the pointer identity the source uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(u32);

thread_local! {
    static NEXT_ID: Cell<u32> = const { Cell::new(0) };
}

fn next_id() -> ExprId {
    NEXT_ID.with(|n| {
        let id = n.get();
        n.set(id + 1);
        ExprId(id)
    })
}

/// Resets the expression-id counter. Only meant for test isolation between
/// independently-parsed programs in the same process (the REPL runs each
/// line through a fresh parser without needing this; it exists so tests can
/// assert on concrete id values when that is convenient).
#[cfg(test)]
pub fn reset_ids() {
    NEXT_ID.with(|n| n.set(0));
}

#[derive(Debug, Clone)]
pub enum Expr {
    Literal {
        id: ExprId,
        value: Value,
    },
    Grouping {
        id: ExprId,
        inner: Box<Expr>,
    },
    Unary {
        id: ExprId,
        op: Token,
        operand: Box<Expr>,
    },
    Binary {
        id: ExprId,
        left: Box<Expr>,
        op: Token,
        right: Box<Expr>,
    },
    Ternary {
        id: ExprId,
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    Variable {
        id: ExprId,
        name: Token,
    },
    Assign {
        id: ExprId,
        name: Token,
        value: Box<Expr>,
    },
    Call {
        id: ExprId,
        callee: Box<Expr>,
        paren: Token,
        args: Vec<Expr>,
    },
    Lambda {
        id: ExprId,
        params: Vec<Token>,
        body: Vec<Stmt>,
    },
    Get {
        id: ExprId,
        object: Box<Expr>,
        name: Token,
    },
    Set {
        id: ExprId,
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },
    ThisKw {
        id: ExprId,
        keyword: Token,
    },
}

impl Expr {
    pub fn id(&self) -> ExprId {
        match self {
            Expr::Literal { id, .. }
            | Expr::Grouping { id, .. }
            | Expr::Unary { id, .. }
            | Expr::Binary { id, .. }
            | Expr::Ternary { id, .. }
            | Expr::Variable { id, .. }
            | Expr::Assign { id, .. }
            | Expr::Call { id, .. }
            | Expr::Lambda { id, .. }
            | Expr::Get { id, .. }
            | Expr::Set { id, .. }
            | Expr::ThisKw { id, .. } => *id,
        }
    }

    pub fn literal(value: Value) -> Expr {
        Expr::Literal {
            id: next_id(),
            value,
        }
    }

    pub fn grouping(inner: Expr) -> Expr {
        Expr::Grouping {
            id: next_id(),
            inner: Box::new(inner),
        }
    }

    pub fn unary(op: Token, operand: Expr) -> Expr {
        Expr::Unary {
            id: next_id(),
            op,
            operand: Box::new(operand),
        }
    }

    pub fn binary(left: Expr, op: Token, right: Expr) -> Expr {
        Expr::Binary {
            id: next_id(),
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn ternary(condition: Expr, then_branch: Expr, else_branch: Expr) -> Expr {
        Expr::Ternary {
            id: next_id(),
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        }
    }

    pub fn variable(name: Token) -> Expr {
        Expr::Variable {
            id: next_id(),
            name,
        }
    }

    pub fn assign(name: Token, value: Expr) -> Expr {
        Expr::Assign {
            id: next_id(),
            name,
            value: Box::new(value),
        }
    }

    pub fn call(callee: Expr, paren: Token, args: Vec<Expr>) -> Expr {
        Expr::Call {
            id: next_id(),
            callee: Box::new(callee),
            paren,
            args,
        }
    }

    pub fn lambda(params: Vec<Token>, body: Vec<Stmt>) -> Expr {
        Expr::Lambda {
            id: next_id(),
            params,
            body,
        }
    }

    pub fn get(object: Expr, name: Token) -> Expr {
        Expr::Get {
            id: next_id(),
            object: Box::new(object),
            name,
        }
    }

    pub fn set(object: Expr, name: Token, value: Expr) -> Expr {
        Expr::Set {
            id: next_id(),
            object: Box::new(object),
            name,
            value: Box::new(value),
        }
    }

    pub fn this_kw(keyword: Token) -> Expr {
        Expr::ThisKw {
            id: next_id(),
            keyword,
        }
    }
}

/// A function or method declaration's shared shape, reused for both
/// top-level `fun` declarations and `class` method bodies.
#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: Token,
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Expression(Expr),
    Print(Expr),
    Var {
        name: Token,
        initializer: Option<Expr>,
    },
    Block(Vec<Stmt>),
    IfStmt {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    ForLoop {
        initializer: Option<Box<Stmt>>,
        condition: Expr,
        increment: Option<Expr>,
        body: Box<Stmt>,
    },
    LoopControl(Token),
    Function(FunctionDecl),
    Return {
        keyword: Token,
        value: Option<Expr>,
    },
    Klass {
        name: Token,
        methods: Vec<FunctionDecl>,
    },
}
