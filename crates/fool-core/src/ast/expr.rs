//! Expression nodes.

use std::fmt;

use crate::symbol::{Resolution, SymbolEntry};

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    And,
    Or,
    Eq,
    Le,
    Ge,
}

impl BinaryOp {
    /// `+ - * /`
    pub fn is_arithmetic(self) -> bool {
        matches!(self, BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div)
    }

    /// `&& ||`
    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    /// `== <= >=`
    pub fn is_comparison(self) -> bool {
        matches!(self, BinaryOp::Eq | BinaryOp::Le | BinaryOp::Ge)
    }

    /// Name of the operation, used in type error messages.
    pub fn describe(self) -> &'static str {
        match self {
            BinaryOp::Add => "sum",
            BinaryOp::Sub => "subtraction",
            BinaryOp::Mul => "multiplication",
            BinaryOp::Div => "division",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Eq => "equal",
            BinaryOp::Le => "less-equal",
            BinaryOp::Ge => "greater-equal",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Eq => "==",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
        };
        f.write_str(symbol)
    }
}

/// An expression with its source line.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub line: u32,
}

/// Expression variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Int(i64),
    Bool(bool),
    Null,
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Not(Box<Expr>),
    If {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    Print(Box<Expr>),
    Id(IdRef),
    Call(Call),
    New(New),
    MethodCall(MethodCall),
}

/// Plain identifier reference.
#[derive(Debug, Clone, PartialEq)]
pub struct IdRef {
    pub name: String,
    /// Written by the symbol table pass.
    pub resolution: Option<Resolution>,
}

/// Call of a function, or of a method of the enclosing class.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub callee: String,
    pub args: Vec<Expr>,
    /// Written by the symbol table pass.
    pub resolution: Option<Resolution>,
}

/// Object instantiation `new C(args)`.
#[derive(Debug, Clone, PartialEq)]
pub struct New {
    pub class: String,
    pub args: Vec<Expr>,
    /// Class entry plus use-site level. Written by the symbol table pass.
    pub resolution: Option<Resolution>,
}

/// Qualified call `receiver.method(args)`.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub receiver: String,
    pub method: String,
    pub args: Vec<Expr>,
    /// Receiver entry plus use-site level. Written by the symbol table pass.
    pub resolution: Option<Resolution>,
    /// Method entry from the receiver's class virtual table.
    pub method_entry: Option<SymbolEntry>,
}

impl Expr {
    pub fn new(kind: ExprKind, line: u32) -> Self {
        Self { kind, line }
    }

    pub fn int(value: i64, line: u32) -> Self {
        Self::new(ExprKind::Int(value), line)
    }

    pub fn bool(value: bool, line: u32) -> Self {
        Self::new(ExprKind::Bool(value), line)
    }

    pub fn null(line: u32) -> Self {
        Self::new(ExprKind::Null, line)
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr, line: u32) -> Self {
        Self::new(
            ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            line,
        )
    }

    pub fn not(operand: Expr, line: u32) -> Self {
        Self::new(ExprKind::Not(Box::new(operand)), line)
    }

    pub fn if_then_else(cond: Expr, then: Expr, otherwise: Expr, line: u32) -> Self {
        Self::new(
            ExprKind::If {
                cond: Box::new(cond),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            },
            line,
        )
    }

    pub fn print(operand: Expr, line: u32) -> Self {
        Self::new(ExprKind::Print(Box::new(operand)), line)
    }

    pub fn id(name: impl Into<String>, line: u32) -> Self {
        Self::new(
            ExprKind::Id(IdRef {
                name: name.into(),
                resolution: None,
            }),
            line,
        )
    }

    pub fn call(callee: impl Into<String>, args: Vec<Expr>, line: u32) -> Self {
        Self::new(
            ExprKind::Call(Call {
                callee: callee.into(),
                args,
                resolution: None,
            }),
            line,
        )
    }

    pub fn new_object(class: impl Into<String>, args: Vec<Expr>, line: u32) -> Self {
        Self::new(
            ExprKind::New(New {
                class: class.into(),
                args,
                resolution: None,
            }),
            line,
        )
    }

    pub fn method_call(
        receiver: impl Into<String>,
        method: impl Into<String>,
        args: Vec<Expr>,
        line: u32,
    ) -> Self {
        Self::new(
            ExprKind::MethodCall(MethodCall {
                receiver: receiver.into(),
                method: method.into(),
                args,
                resolution: None,
                method_entry: None,
            }),
            line,
        )
    }
}
