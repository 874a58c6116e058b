//! Compiler passes.
//!
//! - [`symbol_table`]: Pass 1 - resolve names and lay out frames and classes
//! - [`type_check`]: Pass 2 - check the typing rules
//! - [`codegen`]: Pass 3 - emit stack machine code

pub mod codegen;
pub mod symbol_table;
pub mod type_check;

pub use codegen::{CodegenOutput, CodegenPass};
pub use symbol_table::{
    ClassTable, SymbolTableError, SymbolTableOutput, SymbolTablePass, VirtualTable,
};
pub use type_check::{TypeCheckError, TypeCheckOutput, TypeCheckPass};
