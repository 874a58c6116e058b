//! The FOOL syntax tree.
//!
//! Nodes own their children. Apart from the annotation slots (`Option`
//! fields documented as written by the symbol table pass) the tree is
//! read-only once the parser has built it.

mod decl;
mod expr;
mod types;

pub use decl::{ClassDecl, Declaration, FieldDecl, FunDecl, MethodDecl, ParamDecl, VarDecl};
pub use expr::{BinaryOp, Call, Expr, ExprKind, IdRef, MethodCall, New};
pub use types::{ArrowType, ClassType, TypeNode};

/// A whole compilation unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub kind: ProgramKind,
    resolved: bool,
}

/// The two program shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgramKind {
    /// `let classes declarations in body`; classes precede the other declarations.
    LetIn {
        classes: Vec<ClassDecl>,
        declarations: Vec<Declaration>,
        body: Expr,
    },
    /// A bare expression.
    Body(Expr),
}

impl Program {
    pub fn let_in(classes: Vec<ClassDecl>, declarations: Vec<Declaration>, body: Expr) -> Self {
        Self {
            kind: ProgramKind::LetIn {
                classes,
                declarations,
                body,
            },
            resolved: false,
        }
    }

    pub fn body(body: Expr) -> Self {
        Self {
            kind: ProgramKind::Body(body),
            resolved: false,
        }
    }

    /// Whether the symbol table pass has already annotated this tree.
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub fn mark_resolved(&mut self) {
        self.resolved = true;
    }

    pub fn main_expr(&self) -> &Expr {
        match &self.kind {
            ProgramKind::LetIn { body, .. } => body,
            ProgramKind::Body(body) => body,
        }
    }

    pub fn classes(&self) -> &[ClassDecl] {
        match &self.kind {
            ProgramKind::LetIn { classes, .. } => classes,
            ProgramKind::Body(_) => &[],
        }
    }

    pub fn declarations(&self) -> &[Declaration] {
        match &self.kind {
            ProgramKind::LetIn { declarations, .. } => declarations,
            ProgramKind::Body(_) => &[],
        }
    }
}
