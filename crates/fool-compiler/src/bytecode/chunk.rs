//! Instruction streams.

use std::fmt;

use super::Instruction;

/// An ordered run of instructions.
///
/// Code for each node is built as its own chunk and appended to the parent's,
/// so the final program is the concatenation in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeChunk {
    code: Vec<Instruction>,
}

impl CodeChunk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            code: Vec::with_capacity(capacity),
        }
    }

    pub fn emit(&mut self, instruction: Instruction) {
        self.code.push(instruction);
    }

    pub fn append(&mut self, mut other: CodeChunk) {
        self.code.append(&mut other.code);
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.code
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.code.iter()
    }

    pub fn into_instructions(self) -> Vec<Instruction> {
        self.code
    }

    /// Assembly text, one instruction per line.
    pub fn to_assembly(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CodeChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for instruction in &self.code {
            writeln!(f, "{instruction}")?;
        }
        Ok(())
    }
}

impl From<Vec<Instruction>> for CodeChunk {
    fn from(code: Vec<Instruction>) -> Self {
        Self { code }
    }
}

impl FromIterator<Instruction> for CodeChunk {
    fn from_iter<T: IntoIterator<Item = Instruction>>(iter: T) -> Self {
        Self {
            code: iter.into_iter().collect(),
        }
    }
}

impl Extend<Instruction> for CodeChunk {
    fn extend<T: IntoIterator<Item = Instruction>>(&mut self, iter: T) {
        self.code.extend(iter);
    }
}

impl<'a> IntoIterator for &'a CodeChunk {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.code.iter()
    }
}
