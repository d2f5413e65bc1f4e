// quill-object - AST construction helpers
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Terse constructors for syntax trees.
//!
//! Nodes are built at position `0:0`; chain `.at(line, column)` to place
//! them.
//!
//! ```
//! use quill_object::ast::build::*;
//!
//! // var x = 1 + 2; print(x);
//! let prog = program(vec![
//!     var("x", add(int(1), int(2))).at(1, 1),
//!     expr_stmt(call(ident("print"), vec![ident("x")])).at(2, 1),
//! ]);
//! assert_eq!(prog.statements.len(), 2);
//! ```

use std::rc::Rc;

use super::*;

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        Expr {
            kind,
            pos: Position::default(),
        }
    }

    #[must_use]
    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.pos = Position::new(line, column);
        self
    }
}

impl Stmt {
    pub fn new(kind: StmtKind) -> Self {
        Stmt {
            kind,
            pos: Position::default(),
        }
    }

    #[must_use]
    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.pos = Position::new(line, column);
        self
    }
}

pub fn program(statements: Vec<Stmt>) -> Program {
    Program::new(statements)
}

pub fn body(statements: Vec<Stmt>) -> Block {
    Block {
        statements,
        pos: Position::default(),
    }
}

// ============================================================================
// Expressions
// ============================================================================

pub fn int(n: i64) -> Expr {
    Expr::new(ExprKind::Int(n))
}

pub fn float(n: f64) -> Expr {
    Expr::new(ExprKind::Float(n))
}

pub fn str(s: &str) -> Expr {
    Expr::new(ExprKind::Str(s.to_string()))
}

pub fn boolean(b: bool) -> Expr {
    Expr::new(ExprKind::Bool(b))
}

pub fn null() -> Expr {
    Expr::new(ExprKind::Null)
}

pub fn ident(name: &str) -> Expr {
    Expr::new(ExprKind::Ident(name.to_string()))
}

pub fn neg(right: Expr) -> Expr {
    Expr::new(ExprKind::Prefix {
        op: PrefixOp::Neg,
        right: Box::new(right),
    })
}

pub fn not(right: Expr) -> Expr {
    Expr::new(ExprKind::Prefix {
        op: PrefixOp::Not,
        right: Box::new(right),
    })
}

pub fn infix(op: InfixOp, left: Expr, right: Expr) -> Expr {
    Expr::new(ExprKind::Infix {
        op,
        left: Box::new(left),
        right: Box::new(right),
    })
}

pub fn add(l: Expr, r: Expr) -> Expr {
    infix(InfixOp::Add, l, r)
}

pub fn sub(l: Expr, r: Expr) -> Expr {
    infix(InfixOp::Sub, l, r)
}

pub fn mul(l: Expr, r: Expr) -> Expr {
    infix(InfixOp::Mul, l, r)
}

pub fn div(l: Expr, r: Expr) -> Expr {
    infix(InfixOp::Div, l, r)
}

pub fn rem(l: Expr, r: Expr) -> Expr {
    infix(InfixOp::Mod, l, r)
}

pub fn eq(l: Expr, r: Expr) -> Expr {
    infix(InfixOp::Eq, l, r)
}

pub fn not_eq(l: Expr, r: Expr) -> Expr {
    infix(InfixOp::NotEq, l, r)
}

pub fn lt(l: Expr, r: Expr) -> Expr {
    infix(InfixOp::Lt, l, r)
}

pub fn gt(l: Expr, r: Expr) -> Expr {
    infix(InfixOp::Gt, l, r)
}

pub fn lt_eq(l: Expr, r: Expr) -> Expr {
    infix(InfixOp::LtEq, l, r)
}

pub fn gt_eq(l: Expr, r: Expr) -> Expr {
    infix(InfixOp::GtEq, l, r)
}

pub fn and(l: Expr, r: Expr) -> Expr {
    infix(InfixOp::And, l, r)
}

pub fn or(l: Expr, r: Expr) -> Expr {
    infix(InfixOp::Or, l, r)
}

/// `needle in haystack`
pub fn within(needle: Expr, haystack: Expr) -> Expr {
    infix(InfixOp::In, needle, haystack)
}

pub fn is(l: Expr, r: Expr) -> Expr {
    infix(InfixOp::Is, l, r)
}

pub fn assign(name: &str, value: Expr) -> Expr {
    Expr::new(ExprKind::Assign {
        target: AssignTarget::Name(name.to_string()),
        value: Box::new(value),
    })
}

pub fn assign_index(object: Expr, index: Expr, value: Expr) -> Expr {
    Expr::new(ExprKind::Assign {
        target: AssignTarget::Index {
            object: Box::new(object),
            index: Box::new(index),
        },
        value: Box::new(value),
    })
}

pub fn assign_member(object: Expr, name: &str, value: Expr) -> Expr {
    Expr::new(ExprKind::Assign {
        target: AssignTarget::Member {
            object: Box::new(object),
            name: name.to_string(),
        },
        value: Box::new(value),
    })
}

pub fn call(function: Expr, args: Vec<Expr>) -> Expr {
    Expr::new(ExprKind::Call {
        function: Box::new(function),
        args,
    })
}

/// Call a function by name.
pub fn call_named(name: &str, args: Vec<Expr>) -> Expr {
    call(ident(name), args)
}

/// `object.name(args)`
pub fn method_call(object: Expr, name: &str, args: Vec<Expr>) -> Expr {
    call(member(object, name), args)
}

pub fn index(left: Expr, index: Expr) -> Expr {
    Expr::new(ExprKind::Index {
        left: Box::new(left),
        index: Box::new(index),
    })
}

pub fn member(object: Expr, name: &str) -> Expr {
    Expr::new(ExprKind::Member {
        object: Box::new(object),
        name: name.to_string(),
    })
}

pub fn array(items: Vec<Expr>) -> Expr {
    Expr::new(ExprKind::Array(items))
}

pub fn map(entries: Vec<(Expr, Expr)>) -> Expr {
    Expr::new(ExprKind::Map(entries))
}

pub fn hash(entries: Vec<(Expr, Expr)>) -> Expr {
    Expr::new(ExprKind::Hash(entries))
}

/// Anonymous function literal.
pub fn lambda(params: &[&str], statements: Vec<Stmt>) -> Expr {
    Expr::new(ExprKind::Function(FunctionLiteral {
        name: None,
        params: names(params),
        body: Rc::new(body(statements)),
    }))
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// Statements
// ============================================================================

pub fn expr_stmt(expr: Expr) -> Stmt {
    Stmt::new(StmtKind::Expr(expr))
}

pub fn var(name: &str, value: Expr) -> Stmt {
    Stmt::new(StmtKind::Var {
        name: name.to_string(),
        value,
    })
}

pub fn ret(value: Expr) -> Stmt {
    Stmt::new(StmtKind::Return(Some(value)))
}

pub fn ret_void() -> Stmt {
    Stmt::new(StmtKind::Return(None))
}

pub fn block(statements: Vec<Stmt>) -> Stmt {
    Stmt::new(StmtKind::Block(body(statements)))
}

pub fn if_stmt(condition: Expr, consequence: Vec<Stmt>) -> Stmt {
    Stmt::new(StmtKind::If {
        condition,
        consequence: body(consequence),
        alternative: None,
    })
}

pub fn if_else(condition: Expr, consequence: Vec<Stmt>, alternative: Vec<Stmt>) -> Stmt {
    Stmt::new(StmtKind::If {
        condition,
        consequence: body(consequence),
        alternative: Some(Else::Block(body(alternative))),
    })
}

/// `if (c) { ... } else if ...`
pub fn if_else_if(condition: Expr, consequence: Vec<Stmt>, next: Stmt) -> Stmt {
    Stmt::new(StmtKind::If {
        condition,
        consequence: body(consequence),
        alternative: Some(Else::If(Box::new(next))),
    })
}

pub fn while_loop(condition: Expr, statements: Vec<Stmt>) -> Stmt {
    Stmt::new(StmtKind::While {
        condition,
        body: body(statements),
    })
}

pub fn for_loop(
    init: Option<Stmt>,
    condition: Option<Expr>,
    post: Option<Stmt>,
    statements: Vec<Stmt>,
) -> Stmt {
    Stmt::new(StmtKind::For {
        init: init.map(Box::new),
        condition,
        post: post.map(Box::new),
        body: body(statements),
    })
}

pub fn break_stmt() -> Stmt {
    Stmt::new(StmtKind::Break)
}

pub fn continue_stmt() -> Stmt {
    Stmt::new(StmtKind::Continue)
}

pub fn func(name: &str, params: &[&str], statements: Vec<Stmt>) -> Stmt {
    Stmt::new(StmtKind::Function(function_decl(name, params, statements)))
}

fn function_decl(name: &str, params: &[&str], statements: Vec<Stmt>) -> FunctionDecl {
    FunctionDecl {
        name: name.to_string(),
        params: names(params),
        body: Rc::new(body(statements)),
    }
}

pub fn class(name: &str, members: Vec<ClassMember>) -> Stmt {
    Stmt::new(StmtKind::Class(ClassDecl {
        name: name.to_string(),
        members,
    }))
}

pub fn method(name: &str, params: &[&str], statements: Vec<Stmt>) -> ClassMember {
    ClassMember::Method(function_decl(name, params, statements))
}

pub fn class_var(name: &str, value: Expr) -> ClassMember {
    ClassMember::Variable {
        name: name.to_string(),
        value,
    }
}

pub fn try_stmt(
    statements: Vec<Stmt>,
    catches: Vec<CatchClause>,
    finally: Option<Vec<Stmt>>,
) -> Stmt {
    Stmt::new(StmtKind::Try {
        body: body(statements),
        catches,
        finally: finally.map(body),
    })
}

pub fn catch(
    exception_type: Option<&str>,
    variable: Option<&str>,
    statements: Vec<Stmt>,
) -> CatchClause {
    CatchClause {
        exception_type: exception_type.map(str::to_string),
        variable: variable.map(str::to_string),
        body: body(statements),
    }
}

pub fn throw(value: Expr) -> Stmt {
    Stmt::new(StmtKind::Throw(value))
}

pub fn with(context: Expr, binding: Option<&str>, statements: Vec<Stmt>) -> Stmt {
    Stmt::new(StmtKind::With {
        context,
        binding: binding.map(str::to_string),
        body: body(statements),
    })
}

pub fn import(path: &str) -> Stmt {
    Stmt::new(StmtKind::Import {
        path: path.to_string(),
        alias: None,
    })
}

pub fn import_as(path: &str, alias: &str) -> Stmt {
    Stmt::new(StmtKind::Import {
        path: path.to_string(),
        alias: Some(alias.to_string()),
    })
}

pub fn assert(condition: Expr, message: Option<Expr>) -> Stmt {
    Stmt::new(StmtKind::Assert { condition, message })
}

pub fn global(list: &[&str]) -> Stmt {
    Stmt::new(StmtKind::Global(names(list)))
}

pub fn nonlocal(list: &[&str]) -> Stmt {
    Stmt::new(StmtKind::Nonlocal(names(list)))
}

pub fn del(name: &str) -> Stmt {
    Stmt::new(StmtKind::Del(name.to_string()))
}
