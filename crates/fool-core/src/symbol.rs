//! Symbol-table entries.
//!
//! One [`SymbolEntry`] describes one declared name. Use sites that resolved to
//! an entry keep a [`Resolution`], which pairs the entry with the nesting level
//! of the use site so the code generator can count static-chain hops.

use std::fmt;

use crate::ast::TypeNode;

/// What a declared name denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Variable,
    Parameter,
    Function,
    Class,
    Field,
    Method,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntryKind::Variable => "Var",
            EntryKind::Parameter => "Par",
            EntryKind::Function => "Fun",
            EntryKind::Class => "Class",
            EntryKind::Field => "Field",
            EntryKind::Method => "Method",
        };
        f.write_str(name)
    }
}

/// A declared name.
///
/// Offsets follow the frame layout: locals from -2 downward, parameters from
/// 1 upward, fields from -1 downward (relative to the object address), and
/// methods as non-negative dispatch slots.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolEntry {
    /// Nesting level of the scope holding the declaration.
    pub nesting_level: u32,
    pub ty: TypeNode,
    pub offset: i32,
    pub kind: EntryKind,
}

impl SymbolEntry {
    pub fn new(nesting_level: u32, ty: TypeNode, offset: i32, kind: EntryKind) -> Self {
        Self {
            nesting_level,
            ty,
            offset,
            kind,
        }
    }
}

/// A use site bound to its declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub entry: SymbolEntry,
    /// Nesting level at the use site.
    pub nesting_level: u32,
}

impl Resolution {
    pub fn new(entry: SymbolEntry, nesting_level: u32) -> Self {
        Self {
            entry,
            nesting_level,
        }
    }

    /// Number of access links to follow from the use site to the declaring frame.
    pub fn static_distance(&self) -> u32 {
        self.nesting_level.saturating_sub(self.entry.nesting_level)
    }
}
