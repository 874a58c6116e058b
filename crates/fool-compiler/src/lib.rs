//! FOOL Compiler
//!
//! A 3-pass compiler from the FOOL syntax tree to stack machine code.
//!
//! ## Architecture
//!
//! - **Pass 1 (Symbol table)**: Bind names to declarations, lay out frames, objects and dispatch tables
//! - **Pass 2 (Type check)**: Check the typing rules with nominal class subtyping
//! - **Pass 3 (Code generation)**: Emit instructions for the stack machine
//!
//! ## Modules
//!
//! - [`bytecode`]: Instruction set and instruction streams
//! - [`context`]: Per-compilation state (options, class hierarchy, diagnostics)
//! - [`emit`]: Label generation and put-aside function bodies
//! - [`options`]: Compiler configuration
//! - [`passes`]: The three passes
//! - [`type_rels`]: Subtyping and least common ancestor

pub mod bytecode;
pub mod context;
pub mod emit;
pub mod options;
pub mod passes;
pub mod type_rels;

pub use bytecode::{CodeChunk, Instruction, Operand};
pub use context::CompilationContext;
pub use options::{CompilerOptions, DEFAULT_MEMORY_SIZE};
pub use passes::{
    ClassTable, CodegenOutput, CodegenPass, SymbolTableError, SymbolTableOutput, SymbolTablePass,
    TypeCheckError, TypeCheckOutput, TypeCheckPass, VirtualTable,
};
pub use type_rels::ClassHierarchy;

// Re-export the shared model for convenience
pub use fool_core::{CompilationError, Diagnostics, Program, TypeNode};

use thiserror::Error;
use tracing::info;

/// A successfully compiled program.
#[derive(Debug)]
pub struct CompiledProgram {
    /// Main code, `halt`, then function bodies.
    pub code: CodeChunk,
    /// Type of the main body expression.
    pub program_type: Option<TypeNode>,
    /// Errors tolerated because `stop_on_errors` was off.
    pub diagnostics: Diagnostics,
}

impl CompiledProgram {
    pub fn to_assembly(&self) -> String {
        self.code.to_assembly()
    }
}

/// Why the pipeline stopped.
#[derive(Debug, Error)]
pub enum CompileFailure {
    /// The symbol table pass reported errors.
    #[error("{} symbol table error(s)", .0.error_count())]
    SymbolTable(Diagnostics),

    /// The type checker reported errors.
    #[error("{} type error(s)", .0.error_count())]
    TypeCheck(Diagnostics),

    /// The tree had already been compiled.
    #[error(transparent)]
    AlreadyResolved(#[from] SymbolTableError),

    /// Code generation met annotations it could not use.
    #[error("{0} unresolved annotation(s) during code generation")]
    Unresolved(usize),
}

impl CompileFailure {
    /// Errors gathered before the pipeline stopped.
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            CompileFailure::SymbolTable(diagnostics) | CompileFailure::TypeCheck(diagnostics) => {
                Some(diagnostics)
            }
            CompileFailure::AlreadyResolved(_) | CompileFailure::Unresolved(_) => None,
        }
    }
}

/// The main compiler entry point.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: CompilerOptions,
}

impl Compiler {
    pub fn new(options: CompilerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Run all three passes over `program`.
    ///
    /// With `stop_on_errors` set, symbol table errors stop the pipeline before
    /// type checking and type errors stop it before code generation. Otherwise
    /// every pass runs and the errors are returned with the program.
    #[cfg_attr(feature = "profiling", profiling::function)]
    #[tracing::instrument(skip_all)]
    pub fn compile(&self, program: &mut Program) -> Result<CompiledProgram, CompileFailure> {
        let mut ctx = CompilationContext::new(self.options.clone());
        let stop = self.options.stop_on_errors;

        let symbols = SymbolTablePass::new(&mut ctx).run(program)?;
        info!(errors = symbols.error_count(), "symbol table pass done");
        let symbol_errors = !symbols.errors.is_empty();
        ctx.diagnostics_mut().extend(symbols.errors);
        if stop && symbol_errors {
            return Err(CompileFailure::SymbolTable(ctx.take_diagnostics()));
        }

        let types = TypeCheckPass::new(&ctx).run(program);
        info!(errors = types.error_count(), "type check pass done");
        let type_errors = !types.errors.is_empty();
        ctx.diagnostics_mut().extend(types.errors);
        if stop && type_errors {
            return Err(CompileFailure::TypeCheck(ctx.take_diagnostics()));
        }

        let generated = CodegenPass::new(&ctx).run(program);
        info!(instructions = generated.code.len(), "code generation done");
        if stop && generated.unresolved > 0 {
            return Err(CompileFailure::Unresolved(generated.unresolved));
        }

        Ok(CompiledProgram {
            code: generated.code,
            program_type: types.program_type,
            diagnostics: ctx.take_diagnostics(),
        })
    }
}
