//! Instruction set.
//!
//! Every instruction renders to one line of assembly text. The machine keeps
//! its stack at the top of memory growing down and its heap at the bottom
//! growing up; registers are `fp`, `ra`, `tm`, `hp` and `sp`.

use std::fmt;

/// Argument of a `push`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operand {
    Int(i64),
    /// Address of a label, resolved by the assembler.
    Label(String),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Int(value) => write!(f, "{value}"),
            Operand::Label(label) => f.write_str(label),
        }
    }
}

/// One machine instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Instruction {
    // =========================================================================
    // Stack
    // =========================================================================
    Push(Operand),
    Pop,

    // =========================================================================
    // Arithmetic
    // =========================================================================
    /// Pops two values, pushes their sum.
    Add,
    /// Pops `b` then `a`, pushes `a - b`.
    Sub,
    Mult,
    /// Pops `b` then `a`, pushes `a / b`.
    Div,

    // =========================================================================
    // Registers
    // =========================================================================
    /// `fp = sp`
    CopyFp,
    /// Pops into `fp`.
    StoreFp,
    /// Pushes `fp`.
    LoadFp,
    /// Pushes `ra`.
    LoadRa,
    /// Pops into `ra`.
    StoreRa,
    /// Pops into `tm`.
    StoreTm,
    /// Pushes `tm`.
    LoadTm,
    /// Pushes `hp`.
    LoadHp,
    /// Pops into `hp`.
    StoreHp,

    // =========================================================================
    // Memory
    // =========================================================================
    /// Pops an address, pushes the word stored there.
    LoadWord,
    /// Pops an address then a value, stores the value at the address.
    StoreWord,

    // =========================================================================
    // Control flow
    // =========================================================================
    Branch(String),
    /// Pops two values, branches when they are equal.
    BranchEq(String),
    /// Pops `b` then `a`, branches when `a <= b`.
    BranchLessEq(String),
    /// Pops a code address, saves the return address in `ra` and jumps.
    JumpSub,
    /// Shows the top of the stack without popping it.
    Print,
    Halt,
    /// Label definition.
    Label(String),
}

impl Instruction {
    pub fn push(value: i64) -> Self {
        Instruction::Push(Operand::Int(value))
    }

    pub fn push_label(label: impl Into<String>) -> Self {
        Instruction::Push(Operand::Label(label.into()))
    }

    pub fn label(name: impl Into<String>) -> Self {
        Instruction::Label(name.into())
    }

    /// Mnemonic without operands.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Instruction::Push(_) => "push",
            Instruction::Pop => "pop",
            Instruction::Add => "add",
            Instruction::Sub => "sub",
            Instruction::Mult => "mult",
            Instruction::Div => "div",
            Instruction::CopyFp => "cfp",
            Instruction::StoreFp => "sfp",
            Instruction::LoadFp => "lfp",
            Instruction::LoadRa => "lra",
            Instruction::StoreRa => "sra",
            Instruction::StoreTm => "stm",
            Instruction::LoadTm => "ltm",
            Instruction::LoadHp => "lhp",
            Instruction::StoreHp => "shp",
            Instruction::LoadWord => "lw",
            Instruction::StoreWord => "sw",
            Instruction::Branch(_) => "b",
            Instruction::BranchEq(_) => "beq",
            Instruction::BranchLessEq(_) => "bleq",
            Instruction::JumpSub => "js",
            Instruction::Print => "print",
            Instruction::Halt => "halt",
            Instruction::Label(_) => "",
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Push(operand) => write!(f, "push {operand}"),
            Instruction::Branch(label)
            | Instruction::BranchEq(label)
            | Instruction::BranchLessEq(label) => write!(f, "{} {label}", self.mnemonic()),
            Instruction::Label(label) => write!(f, "{label}:"),
            other => f.write_str(other.mnemonic()),
        }
    }
}
