//! Semantic errors.
//!
//! ## Error Taxonomy
//!
//! ```text
//! CompilationError
//! ├── scope errors      - Duplicate, Undeclared
//! ├── structural errors - MemberCollision, NotAClass, NotAnObject
//! └── type errors       - Type (recorded by the type checker)
//! ```
//!
//! Scope and structural errors are reported by the symbol table pass and never
//! stop its traversal. Type errors are raised by the type checker and recorded
//! at the nearest enclosing declaration list.

use std::fmt;

use thiserror::Error;

use crate::symbol::EntryKind;

// ============================================================================
// Name categories
// ============================================================================

/// What a use site expected a name to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UseKind {
    /// A plain identifier (variable, parameter or field).
    Identifier,
    Function,
    Class,
    Superclass,
    Method,
    /// Receiver of a qualified call.
    Object,
}

impl fmt::Display for UseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UseKind::Identifier => "Var or Par",
            UseKind::Function => "Fun",
            UseKind::Class => "Class",
            UseKind::Superclass => "Superclass",
            UseKind::Method => "Method",
            UseKind::Object => "Object",
        };
        f.write_str(name)
    }
}

/// Class member category, for inheritance collisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Field,
    Method,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKind::Field => f.write_str("Field"),
            MemberKind::Method => f.write_str("Method"),
        }
    }
}

impl MemberKind {
    /// Lowercase name, for use inside a sentence.
    pub fn noun(self) -> &'static str {
        match self {
            MemberKind::Field => "field",
            MemberKind::Method => "method",
        }
    }
}

// ============================================================================
// Compilation Errors
// ============================================================================

/// Errors reported by the semantic passes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompilationError {
    /// A name was declared twice in the same scope.
    #[error("{kind} id {name} at line {line} already declared")]
    Duplicate {
        kind: EntryKind,
        name: String,
        line: u32,
    },

    /// A name was used without a visible declaration.
    #[error("{kind} id {name} at line {line} not declared")]
    Undeclared {
        kind: UseKind,
        name: String,
        line: u32,
    },

    /// A class member tried to take over an inherited member of the other category.
    #[error("{kind} id {name} at line {line} cannot replace an inherited {}", .inherited.noun())]
    MemberCollision {
        kind: MemberKind,
        name: String,
        inherited: MemberKind,
        line: u32,
    },

    /// A name expected to denote a class denotes something else.
    #[error("{kind} id {name} at line {line} is not a class")]
    NotAClass {
        kind: UseKind,
        name: String,
        line: u32,
    },

    /// The receiver of a qualified call is not an object reference.
    #[error("Object id {name} at line {line} is not an object")]
    NotAnObject { name: String, line: u32 },

    /// A type rule was violated.
    #[error("{message} at line {line}")]
    Type { message: String, line: u32 },
}

impl CompilationError {
    /// Source line where this error occurred.
    pub fn line(&self) -> u32 {
        match self {
            CompilationError::Duplicate { line, .. } => *line,
            CompilationError::Undeclared { line, .. } => *line,
            CompilationError::MemberCollision { line, .. } => *line,
            CompilationError::NotAClass { line, .. } => *line,
            CompilationError::NotAnObject { line, .. } => *line,
            CompilationError::Type { line, .. } => *line,
        }
    }

    /// Whether this error came from the type checker.
    pub fn is_type_error(&self) -> bool {
        matches!(self, CompilationError::Type { .. })
    }
}
