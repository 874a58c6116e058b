//! Code emission helpers for the code generator.
//!
//! The [`Emitter`] owns the label counters and the function bodies that are
//! put aside while the main program is generated. Bodies are appended after
//! the program's `halt`, in the order they were generated.

mod labels;

pub use labels::LabelGenerator;

use crate::bytecode::{CodeChunk, Instruction};

/// Label and put-aside state for one code generation run.
#[derive(Debug, Default)]
pub struct Emitter {
    labels: LabelGenerator,
    functions: CodeChunk,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh_label(&mut self) -> String {
        self.labels.fresh_label()
    }

    pub fn fresh_function(&mut self) -> String {
        self.labels.fresh_function()
    }

    /// Keep a function body for emission after the main program.
    pub fn put_aside(&mut self, body: CodeChunk) {
        self.functions.append(body);
    }

    /// All put-aside bodies, leaving the emitter empty.
    pub fn take_functions(&mut self) -> CodeChunk {
        std::mem::take(&mut self.functions)
    }

    /// Emit `<branch> l1; push on_fall; b l2; l1: push on_branch; l2:`.
    ///
    /// `branch` builds the conditional jump from the fresh target label.
    pub fn select(
        &mut self,
        code: &mut CodeChunk,
        branch: impl FnOnce(String) -> Instruction,
        on_fall: i64,
        on_branch: i64,
    ) {
        let taken = self.fresh_label();
        let exit = self.fresh_label();
        code.emit(branch(taken.clone()));
        code.emit(Instruction::push(on_fall));
        code.emit(Instruction::Branch(exit.clone()));
        code.emit(Instruction::Label(taken));
        code.emit(Instruction::push(on_branch));
        code.emit(Instruction::Label(exit));
    }
}

/// Move the top of the stack to `hp` and bump the heap pointer.
pub fn store_on_heap(code: &mut CodeChunk) {
    code.extend([
        Instruction::LoadHp,
        Instruction::StoreWord,
        Instruction::LoadHp,
        Instruction::push(1),
        Instruction::Add,
        Instruction::StoreHp,
    ]);
}
