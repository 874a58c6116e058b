//! Shared support for the integration tests: AST builders and a reference
//! interpreter for the stack machine.

#![allow(dead_code)]

use fool::compiler::DEFAULT_MEMORY_SIZE;
use fool::prelude::*;
use rustc_hash::FxHashMap;

// ============================================================================
// AST builders
// ============================================================================

pub fn int(value: i64) -> Expr {
    Expr::int(value, 1)
}

pub fn boolean(value: bool) -> Expr {
    Expr::bool(value, 1)
}

pub fn id(name: &str) -> Expr {
    Expr::id(name, 1)
}

pub fn bin(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::binary(op, lhs, rhs, 1)
}

pub fn call(callee: &str, args: Vec<Expr>) -> Expr {
    Expr::call(callee, args, 1)
}

pub fn print(expr: Expr) -> Expr {
    Expr::print(expr, 1)
}

pub fn if_(cond: Expr, then: Expr, otherwise: Expr) -> Expr {
    Expr::if_then_else(cond, then, otherwise, 1)
}

pub fn class_ref(name: &str) -> TypeNode {
    TypeNode::reference(name)
}

pub fn var(name: &str, ty: TypeNode, init: Expr) -> Declaration {
    Declaration::Var(VarDecl::new(name, ty, init, 1))
}

pub fn param(name: &str, ty: TypeNode) -> ParamDecl {
    ParamDecl::new(name, ty, 1)
}

pub fn fun(
    name: &str,
    ret: TypeNode,
    params: Vec<ParamDecl>,
    declarations: Vec<Declaration>,
    body: Expr,
) -> Declaration {
    Declaration::Fun(FunDecl::new(name, ret, params, declarations, body, 1))
}

pub fn field(name: &str, ty: TypeNode) -> FieldDecl {
    FieldDecl::new(name, ty, 1)
}

pub fn method(name: &str, ret: TypeNode, params: Vec<ParamDecl>, body: Expr) -> MethodDecl {
    MethodDecl::new(name, ret, params, vec![], body, 1)
}

pub fn class(
    name: &str,
    superclass: Option<&str>,
    fields: Vec<FieldDecl>,
    methods: Vec<MethodDecl>,
) -> ClassDecl {
    ClassDecl::new(name, superclass.map(str::to_string), fields, methods, 1)
}

// ============================================================================
// Stack machine
// ============================================================================

/// What a run left behind.
#[derive(Debug, Default, PartialEq)]
pub struct Execution {
    /// Values shown by `print`, in order.
    pub output: Vec<i64>,
    /// Stack contents at `halt`, bottom first.
    pub stack: Vec<i64>,
}

/// Interpreter for the generated code.
///
/// Stack at the top of memory growing down, heap from 0 growing up, code
/// addresses are instruction indices.
pub struct Machine {
    memory: Vec<i64>,
    memory_size: i64,
    step_limit: usize,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_SIZE)
    }
}

impl Machine {
    pub fn new(memory_size: i64) -> Self {
        Self {
            memory: vec![0; memory_size as usize],
            memory_size,
            step_limit: 1_000_000,
        }
    }

    pub fn run(mut self, code: &[Instruction]) -> Result<Execution, String> {
        let labels: FxHashMap<&str, i64> = code
            .iter()
            .enumerate()
            .filter_map(|(index, instruction)| match instruction {
                Instruction::Label(name) => Some((name.as_str(), index as i64)),
                _ => None,
            })
            .collect();
        let address = |label: &str| {
            labels
                .get(label)
                .copied()
                .ok_or_else(|| format!("unknown label {label}"))
        };

        let mut output = Vec::new();
        let (mut ip, mut sp, mut fp) = (0i64, self.memory_size, self.memory_size);
        let (mut ra, mut tm, mut hp) = (0i64, 0i64, 0i64);

        for _ in 0..self.step_limit {
            let instruction = code
                .get(ip as usize)
                .ok_or_else(|| format!("ip {ip} outside code"))?;
            ip += 1;

            macro_rules! push {
                ($value:expr) => {{
                    let value = $value;
                    sp -= 1;
                    *self.cell(sp)? = value;
                }};
            }
            macro_rules! pop {
                () => {{
                    if sp >= self.memory_size {
                        return Err("pop on empty stack".to_string());
                    }
                    let value = *self.cell(sp)?;
                    sp += 1;
                    value
                }};
            }

            match instruction {
                Instruction::Push(Operand::Int(value)) => push!(*value),
                Instruction::Push(Operand::Label(label)) => push!(address(label)?),
                Instruction::Pop => {
                    pop!();
                }
                Instruction::Add => {
                    let (right, left) = (pop!(), pop!());
                    push!(left + right)
                }
                Instruction::Sub => {
                    let (right, left) = (pop!(), pop!());
                    push!(left - right)
                }
                Instruction::Mult => {
                    let (right, left) = (pop!(), pop!());
                    push!(left * right)
                }
                Instruction::Div => {
                    let (right, left) = (pop!(), pop!());
                    if right == 0 {
                        return Err("division by zero".to_string());
                    }
                    push!(left / right)
                }
                Instruction::CopyFp => fp = sp,
                Instruction::StoreFp => fp = pop!(),
                Instruction::LoadFp => push!(fp),
                Instruction::LoadRa => push!(ra),
                Instruction::StoreRa => ra = pop!(),
                Instruction::StoreTm => tm = pop!(),
                Instruction::LoadTm => push!(tm),
                Instruction::LoadHp => push!(hp),
                Instruction::StoreHp => hp = pop!(),
                Instruction::LoadWord => {
                    let at = pop!();
                    let value = *self.cell(at)?;
                    push!(value)
                }
                Instruction::StoreWord => {
                    let at = pop!();
                    let value = pop!();
                    *self.cell(at)? = value;
                }
                Instruction::Branch(label) => ip = address(label)?,
                Instruction::BranchEq(label) => {
                    let (right, left) = (pop!(), pop!());
                    if left == right {
                        ip = address(label)?;
                    }
                }
                Instruction::BranchLessEq(label) => {
                    let (right, left) = (pop!(), pop!());
                    if left <= right {
                        ip = address(label)?;
                    }
                }
                Instruction::JumpSub => {
                    let target = pop!();
                    ra = ip;
                    ip = target;
                }
                Instruction::Print => {
                    if sp >= self.memory_size {
                        return Err("print on empty stack".to_string());
                    }
                    output.push(*self.cell(sp)?);
                }
                Instruction::Halt => {
                    let stack = self.memory[sp as usize..].iter().rev().copied().collect();
                    return Ok(Execution { output, stack });
                }
                Instruction::Label(_) => {}
            }

            if sp <= hp {
                return Err(format!("stack overflow: sp {sp} hp {hp}"));
            }
        }
        Err("step limit exceeded".to_string())
    }

    fn cell(&mut self, at: i64) -> Result<&mut i64, String> {
        usize::try_from(at)
            .ok()
            .and_then(|at| self.memory.get_mut(at))
            .ok_or_else(|| format!("address {at} out of memory"))
    }
}

// ============================================================================
// Pipeline helpers
// ============================================================================

/// Compile and run, panicking on any compile error.
pub fn run(mut program: Program) -> Execution {
    let compiled = fool::compile(&mut program)
        .unwrap_or_else(|failure| panic!("compile failed: {failure}\n{:?}", failure.diagnostics()));
    Machine::default()
        .run(compiled.code.instructions())
        .unwrap_or_else(|error| panic!("machine error: {error}\n{}", compiled.to_assembly()))
}

/// Rendered diagnostics of a program expected to fail.
pub fn failure_messages(mut program: Program) -> Vec<String> {
    match fool::compile(&mut program) {
        Ok(compiled) => panic!("expected failure, got:\n{}", compiled.to_assembly()),
        Err(failure) => failure
            .diagnostics()
            .map(|diagnostics| diagnostics.iter().map(ToString::to_string).collect())
            .unwrap_or_default(),
    }
}
