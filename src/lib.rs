//! FOOL - a small functional object-oriented language for a stack machine.
//!
//! This crate bundles the compiler core: the syntax tree and diagnostics from
//! [`fool_core`] and the three passes from [`fool_compiler`]. Parsing is left
//! to the caller, who hands over a built [`Program`].
//!
//! ```
//! use fool::prelude::*;
//!
//! let mut program = Program::body(Expr::print(Expr::int(42, 1), 1));
//! let compiled = fool::compile(&mut program).unwrap();
//! assert_eq!(compiled.to_assembly(), "push 42\nprint\nhalt\n");
//! ```

pub use fool_compiler as compiler;
pub use fool_core as ast;

pub use fool_compiler::{
    CompileFailure, CompiledProgram, Compiler, CompilerOptions, Instruction, Operand,
};
pub use fool_core::{CompilationError, Diagnostics, Program};

/// Compile `program` with the default options.
pub fn compile(program: &mut Program) -> Result<CompiledProgram, CompileFailure> {
    Compiler::default().compile(program)
}

// Re-export main types
pub mod prelude {
    pub use fool_compiler::{
        CodeChunk, CompileFailure, CompiledProgram, Compiler, CompilerOptions, Instruction,
        Operand,
    };
    pub use fool_core::{
        BinaryOp, ClassDecl, CompilationError, Declaration, Diagnostics, Expr, ExprKind,
        FieldDecl, FunDecl, MethodDecl, ParamDecl, Program, TypeNode, VarDecl,
    };
}
