//! CompilationContext - state shared by the passes of one compilation.

use fool_core::Diagnostics;

use crate::options::CompilerOptions;
use crate::type_rels::ClassHierarchy;

/// Per-compilation state: options, the class hierarchy registry and the
/// diagnostics gathered so far.
///
/// One context is created per program, so independent compilations never
/// observe each other's classes.
#[derive(Debug, Default)]
pub struct CompilationContext {
    options: CompilerOptions,
    hierarchy: ClassHierarchy,
    diagnostics: Diagnostics,
}

impl CompilationContext {
    pub fn new(options: CompilerOptions) -> Self {
        Self {
            options,
            hierarchy: ClassHierarchy::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn hierarchy(&self) -> &ClassHierarchy {
        &self.hierarchy
    }

    pub fn hierarchy_mut(&mut self) -> &mut ClassHierarchy {
        &mut self.hierarchy
    }

    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Diagnostics {
        std::mem::take(&mut self.diagnostics)
    }
}
