//! FOOL Core
//!
//! Shared data model for the FOOL compiler passes.
//!
//! ## Modules
//!
//! - [`ast`]: The syntax tree produced by the parser, with annotation slots
//!   written by the symbol table pass
//! - [`symbol`]: Symbol-table entries and use-site resolutions
//! - [`error`]: Semantic errors reported by the passes
//! - [`diagnostics`]: Accumulated error collection

pub mod ast;
pub mod diagnostics;
pub mod error;
pub mod symbol;

pub use ast::{
    ArrowType, BinaryOp, Call, ClassDecl, ClassType, Declaration, Expr, ExprKind, FieldDecl,
    FunDecl, IdRef, MethodCall, MethodDecl, New, ParamDecl, Program, ProgramKind, TypeNode,
    VarDecl,
};
pub use diagnostics::Diagnostics;
pub use error::{CompilationError, MemberKind, UseKind};
pub use symbol::{EntryKind, Resolution, SymbolEntry};

/// Nesting level of the outermost (program) scope.
pub const GLOBAL_LEVEL: u32 = 0;
