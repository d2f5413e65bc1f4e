// quill-object - Abstract syntax tree
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Syntax tree consumed by both the interpreter and the compiler.
//!
//! Every statement and expression carries the source [`Position`] it was
//! parsed from; the [`build`] module constructs trees without a parser.

pub mod build;

use std::fmt;
use std::rc::Rc;

use crate::ops::BinaryOp;

/// Source position (1-based; `0:0` when unknown).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub const fn new(line: u32, column: u32) -> Self {
        Position { line, column }
    }
}

/// A parsed program.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
    /// File name used in stack traces; empty means "use the runner's default"
    pub file: String,
}

impl Program {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Program {
            statements,
            file: String::new(),
        }
    }

    #[must_use]
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = file.into();
        self
    }
}

/// A brace-delimited statement list.
#[derive(Debug, Clone, Default)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub pos: Position,
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub pos: Position,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    Expr(Expr),
    Var {
        name: String,
        value: Expr,
    },
    Return(Option<Expr>),
    Block(Block),
    If {
        condition: Expr,
        consequence: Block,
        alternative: Option<Else>,
    },
    While {
        condition: Expr,
        body: Block,
    },
    For {
        init: Option<Box<Stmt>>,
        condition: Option<Expr>,
        post: Option<Box<Stmt>>,
        body: Block,
    },
    Break,
    Continue,
    Function(FunctionDecl),
    Class(ClassDecl),
    Try {
        body: Block,
        catches: Vec<CatchClause>,
        finally: Option<Block>,
    },
    Throw(Expr),
    With {
        context: Expr,
        binding: Option<String>,
        body: Block,
    },
    Import {
        path: String,
        alias: Option<String>,
    },
    Assert {
        condition: Expr,
        message: Option<Expr>,
    },
    Global(Vec<String>),
    Nonlocal(Vec<String>),
    Del(String),
}

/// The `else` arm of an `if`: a block, or a chained `if` statement.
#[derive(Debug, Clone)]
pub enum Else {
    Block(Block),
    If(Box<Stmt>),
}

#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<String>,
    pub body: Rc<Block>,
}

#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub name: String,
    pub members: Vec<ClassMember>,
}

#[derive(Debug, Clone)]
pub enum ClassMember {
    Method(FunctionDecl),
    Variable { name: String, value: Expr },
}

#[derive(Debug, Clone)]
pub struct CatchClause {
    /// `None` catches every exception
    pub exception_type: Option<String>,
    pub variable: Option<String>,
    pub body: Block,
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub pos: Position,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Null,
    Ident(String),
    Prefix {
        op: PrefixOp,
        right: Box<Expr>,
    },
    Infix {
        op: InfixOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Assign {
        target: AssignTarget,
        value: Box<Expr>,
    },
    Call {
        function: Box<Expr>,
        args: Vec<Expr>,
    },
    Index {
        left: Box<Expr>,
        index: Box<Expr>,
    },
    Member {
        object: Box<Expr>,
        name: String,
    },
    Array(Vec<Expr>),
    Map(Vec<(Expr, Expr)>),
    Hash(Vec<(Expr, Expr)>),
    Function(FunctionLiteral),
}

#[derive(Debug, Clone)]
pub enum AssignTarget {
    Name(String),
    Index { object: Box<Expr>, index: Box<Expr> },
    Member { object: Box<Expr>, name: String },
}

#[derive(Debug, Clone)]
pub struct FunctionLiteral {
    pub name: Option<String>,
    pub params: Vec<String>,
    pub body: Rc<Block>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    And,
    Or,
    In,
    Is,
}

impl InfixOp {
    /// The shared binary operator, for everything except the logical,
    /// membership and identity operators.
    pub fn as_binary(self) -> Option<BinaryOp> {
        Some(match self {
            InfixOp::Add => BinaryOp::Add,
            InfixOp::Sub => BinaryOp::Sub,
            InfixOp::Mul => BinaryOp::Mul,
            InfixOp::Div => BinaryOp::Div,
            InfixOp::Mod => BinaryOp::Mod,
            InfixOp::Eq => BinaryOp::Eq,
            InfixOp::NotEq => BinaryOp::NotEq,
            InfixOp::Lt => BinaryOp::Lt,
            InfixOp::Gt => BinaryOp::Gt,
            InfixOp::LtEq => BinaryOp::LtEq,
            InfixOp::GtEq => BinaryOp::GtEq,
            InfixOp::And | InfixOp::Or | InfixOp::In | InfixOp::Is => return None,
        })
    }
}

impl fmt::Display for InfixOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_binary() {
            Some(op) => write!(f, "{}", op),
            None => f.write_str(match self {
                InfixOp::And => "&&",
                InfixOp::Or => "||",
                InfixOp::In => "in",
                _ => "is",
            }),
        }
    }
}
