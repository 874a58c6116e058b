//! Compiler configuration.

/// Memory size of the reference stack machine.
pub const DEFAULT_MEMORY_SIZE: i64 = 10_000;

/// Options shared by every pass of one compilation.
///
/// ```
/// use fool_compiler::CompilerOptions;
///
/// let options = CompilerOptions::default()
///     .with_memory_size(4096)
///     .with_stop_on_errors(false);
/// assert_eq!(options.memory_size, 4096);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    /// Number of memory cells of the target machine.
    ///
    /// The stack starts at the top of memory, so this is also the frame
    /// pointer of the global scope.
    pub memory_size: i64,
    /// Stop before type checking when the symbol table pass reported errors,
    /// and before code generation when type checking did.
    pub stop_on_errors: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            memory_size: DEFAULT_MEMORY_SIZE,
            stop_on_errors: true,
        }
    }
}

impl CompilerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_memory_size(mut self, memory_size: i64) -> Self {
        self.memory_size = memory_size;
        self
    }

    pub fn with_stop_on_errors(mut self, stop: bool) -> Self {
        self.stop_on_errors = stop;
        self
    }

    /// Frame pointer of the global activation record.
    pub fn global_frame_pointer(&self) -> i64 {
        self.memory_size
    }
}
