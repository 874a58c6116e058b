//! Code Generation Pass (Pass 3) - Emit stack machine code.
//!
//! Reads a resolved, type-checked tree and produces one instruction stream.
//! Function and method bodies are generated where they are declared but put
//! aside, then appended after the main program's `halt`.
//!
//! ## Activation record
//!
//! ```text
//!   fp + n   argument n
//!   ...
//!   fp + 1   argument 1
//!   fp       access link (declaring frame, or the object for methods)
//!   fp - 1   return address
//!   fp - 2   first local declaration
//!   ...
//! ```
//!
//! The control link (caller's `fp`) sits just above the last argument.
//!
//! ## Objects
//!
//! ```text
//!   obj      dispatch pointer -> [slot 0, slot 1, ...]
//!   obj - 1  field 0
//!   obj - 2  field 1
//! ```

use fool_core::{
    BinaryOp, Call, ClassDecl, Declaration, EntryKind, Expr, ExprKind, GLOBAL_LEVEL, IdRef,
    MethodCall, New, Program, ProgramKind, Resolution,
};
use tracing::{debug, trace, warn};

use crate::bytecode::{CodeChunk, Instruction};
use crate::context::CompilationContext;
use crate::emit::{Emitter, store_on_heap};

/// Output of the code generation pass.
#[derive(Debug, Default)]
pub struct CodegenOutput {
    /// The complete program: main code, `halt`, then every function body.
    pub code: CodeChunk,
    /// Unresolved annotations met, each emitted as `push -1`.
    pub unresolved: usize,
}

impl CodegenOutput {
    pub fn instructions(&self) -> &[Instruction] {
        self.code.instructions()
    }

    pub fn to_assembly(&self) -> String {
        self.code.to_assembly()
    }
}

/// Pass 3: generate code. Never fails; missing annotations become sentinels.
pub struct CodegenPass {
    emitter: Emitter,
    /// Global frame pointer, used for globals referenced from class bodies.
    global_fp: i64,
    /// Dispatch tables in class declaration order; `None` marks an empty slot.
    dispatch_tables: Vec<Vec<Option<String>>>,
    /// Set while generating method bodies.
    in_class: bool,
    unresolved: usize,
}

impl CodegenPass {
    pub fn new(ctx: &CompilationContext) -> Self {
        Self {
            emitter: Emitter::new(),
            global_fp: ctx.options().global_frame_pointer(),
            dispatch_tables: Vec::new(),
            in_class: false,
            unresolved: 0,
        }
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    #[tracing::instrument(name = "codegen", skip_all)]
    pub fn run(mut self, program: &Program) -> CodegenOutput {
        let mut code = CodeChunk::new();
        match &program.kind {
            ProgramKind::LetIn {
                classes,
                declarations,
                body,
            } => {
                code.emit(Instruction::push(0));
                for class in classes {
                    self.gen_class(&mut code, class);
                }
                for decl in declarations {
                    self.gen_declaration(&mut code, decl);
                }
                self.gen_expr(&mut code, body);
            }
            ProgramKind::Body(body) => self.gen_expr(&mut code, body),
        }
        code.emit(Instruction::Halt);
        code.append(self.emitter.take_functions());

        debug!(
            instructions = code.len(),
            unresolved = self.unresolved,
            "code generated"
        );

        CodegenOutput {
            code,
            unresolved: self.unresolved,
        }
    }

    /// Emit the placeholder for a missing annotation.
    fn sentinel(&mut self, code: &mut CodeChunk, what: &str, line: u32) {
        warn!(what, line, "unresolved annotation, emitting sentinel");
        self.unresolved += 1;
        code.emit(Instruction::push(-1));
    }

    /// Push the frame holding the declaration `resolution` points to.
    fn frame_of(&self, code: &mut CodeChunk, resolution: &Resolution) {
        let distance = resolution.static_distance();
        if self.in_class && resolution.entry.nesting_level == GLOBAL_LEVEL && distance > 0 {
            // the static chain of a method ends at its object
            code.emit(Instruction::push(self.global_fp));
            return;
        }
        code.emit(Instruction::LoadFp);
        code.extend(std::iter::repeat_n(Instruction::LoadWord, distance as usize));
    }

    /// Push the word stored at `offset` in the frame of `resolution`'s declaration.
    fn load_entry(&self, code: &mut CodeChunk, resolution: &Resolution) {
        self.frame_of(code, resolution);
        code.emit(Instruction::push(resolution.entry.offset.into()));
        code.emit(Instruction::Add);
        code.emit(Instruction::LoadWord);
    }

    // ==========================================================================
    // Declarations
    // ==========================================================================

    fn gen_declaration(&mut self, code: &mut CodeChunk, decl: &Declaration) {
        match decl {
            Declaration::Var(var) => {
                trace!(name = %var.name, "variable");
                self.gen_expr(code, &var.init);
            }
            Declaration::Fun(fun) => {
                let label = self.emitter.fresh_function();
                debug!(name = %fun.name, %label, "function");
                let body =
                    self.gen_body(&label, fun.params.len(), &fun.declarations, &fun.body);
                self.emitter.put_aside(body);
                code.emit(Instruction::push_label(label));
            }
        }
    }

    /// Entry label, frame setup, locals, body and the return sequence.
    fn gen_body(
        &mut self,
        label: &str,
        param_count: usize,
        declarations: &[Declaration],
        body: &Expr,
    ) -> CodeChunk {
        let mut code = CodeChunk::new();
        code.emit(Instruction::label(label));
        code.emit(Instruction::CopyFp);
        code.emit(Instruction::LoadRa);
        for decl in declarations {
            self.gen_declaration(&mut code, decl);
        }
        self.gen_expr(&mut code, body);

        code.emit(Instruction::StoreTm);
        code.extend(std::iter::repeat_n(Instruction::Pop, declarations.len()));
        code.emit(Instruction::StoreRa);
        // access link
        code.emit(Instruction::Pop);
        code.extend(std::iter::repeat_n(Instruction::Pop, param_count));
        code.emit(Instruction::StoreFp);
        code.emit(Instruction::LoadTm);
        code.emit(Instruction::LoadRa);
        code.emit(Instruction::JumpSub);
        code
    }

    fn gen_class(&mut self, code: &mut CodeChunk, class: &ClassDecl) {
        let mut table = class
            .super_entry
            .as_ref()
            .and_then(|entry| usize::try_from(-entry.offset - 2).ok())
            .and_then(|index| self.dispatch_tables.get(index))
            .cloned()
            .unwrap_or_default();

        for method in &class.methods {
            let Some(slot) = method.offset.and_then(|slot| usize::try_from(slot).ok()) else {
                warn!(class = %class.name, method = %method.name, "method without a slot");
                self.unresolved += 1;
                continue;
            };
            let label = self.emitter.fresh_function();
            let outer = std::mem::replace(&mut self.in_class, true);
            let body = self.gen_body(
                &label,
                method.params.len(),
                &method.declarations,
                &method.body,
            );
            self.in_class = outer;
            self.emitter.put_aside(body);

            if table.len() <= slot {
                table.resize(slot + 1, None);
            }
            table[slot] = Some(label);
        }

        debug!(class = %class.name, slots = table.len(), "dispatch table");

        code.emit(Instruction::LoadHp);
        for slot in &table {
            match slot {
                Some(label) => code.emit(Instruction::push_label(label.clone())),
                None => self.sentinel(code, "dispatch slot", class.line),
            }
            store_on_heap(code);
        }
        self.dispatch_tables.push(table);
    }

    // ==========================================================================
    // Expressions
    // ==========================================================================

    fn gen_expr(&mut self, code: &mut CodeChunk, expr: &Expr) {
        match &expr.kind {
            ExprKind::Int(value) => code.emit(Instruction::push(*value)),
            ExprKind::Bool(value) => code.emit(Instruction::push(i64::from(*value))),
            ExprKind::Null => code.emit(Instruction::push(-1)),
            ExprKind::Binary { op, lhs, rhs } => self.gen_binary(code, *op, lhs, rhs),
            ExprKind::Not(operand) => {
                self.gen_expr(code, operand);
                code.emit(Instruction::push(0));
                self.emitter.select(code, Instruction::BranchEq, 0, 1);
            }
            ExprKind::If {
                cond,
                then,
                otherwise,
            } => {
                let taken = self.emitter.fresh_label();
                let exit = self.emitter.fresh_label();
                self.gen_expr(code, cond);
                code.emit(Instruction::push(1));
                code.emit(Instruction::BranchEq(taken.clone()));
                self.gen_expr(code, otherwise);
                code.emit(Instruction::Branch(exit.clone()));
                code.emit(Instruction::Label(taken));
                self.gen_expr(code, then);
                code.emit(Instruction::Label(exit));
            }
            ExprKind::Print(operand) => {
                self.gen_expr(code, operand);
                code.emit(Instruction::Print);
            }
            ExprKind::Id(id) => self.gen_id(code, id, expr.line),
            ExprKind::Call(call) => self.gen_call(code, call, expr.line),
            ExprKind::New(new) => self.gen_new(code, new, expr.line),
            ExprKind::MethodCall(call) => self.gen_method_call(code, call, expr.line),
        }
    }

    fn gen_binary(&mut self, code: &mut CodeChunk, op: BinaryOp, lhs: &Expr, rhs: &Expr) {
        // `a >= b` is `b <= a`
        if op == BinaryOp::Ge {
            self.gen_expr(code, rhs);
            self.gen_expr(code, lhs);
        } else {
            self.gen_expr(code, lhs);
            self.gen_expr(code, rhs);
        }

        match op {
            BinaryOp::Add => code.emit(Instruction::Add),
            BinaryOp::Sub => code.emit(Instruction::Sub),
            BinaryOp::Mul => code.emit(Instruction::Mult),
            BinaryOp::Div => code.emit(Instruction::Div),
            BinaryOp::Eq => self.emitter.select(code, Instruction::BranchEq, 0, 1),
            BinaryOp::Le | BinaryOp::Ge => {
                self.emitter.select(code, Instruction::BranchLessEq, 0, 1)
            }
            BinaryOp::And => {
                code.emit(Instruction::Mult);
                code.emit(Instruction::push(0));
                self.emitter.select(code, Instruction::BranchEq, 1, 0);
            }
            BinaryOp::Or => {
                code.emit(Instruction::Add);
                code.emit(Instruction::push(0));
                self.emitter.select(code, Instruction::BranchEq, 1, 0);
            }
        }
    }

    fn gen_id(&mut self, code: &mut CodeChunk, id: &IdRef, line: u32) {
        match &id.resolution {
            Some(resolution) => self.load_entry(code, resolution),
            None => self.sentinel(code, &id.name, line),
        }
    }

    fn gen_call(&mut self, code: &mut CodeChunk, call: &Call, line: u32) {
        let Some(resolution) = &call.resolution else {
            self.sentinel(code, &call.callee, line);
            return;
        };
        trace!(callee = %call.callee, line, "call");

        code.emit(Instruction::LoadFp);
        for arg in call.args.iter().rev() {
            self.gen_expr(code, arg);
        }
        self.frame_of(code, resolution);
        code.emit(Instruction::StoreTm);
        code.emit(Instruction::LoadTm);
        code.emit(Instruction::LoadTm);
        if resolution.entry.kind == EntryKind::Method {
            // sibling method: the access link is the object, go through its table
            code.emit(Instruction::LoadWord);
        }
        code.emit(Instruction::push(resolution.entry.offset.into()));
        code.emit(Instruction::Add);
        code.emit(Instruction::LoadWord);
        code.emit(Instruction::JumpSub);
    }

    fn gen_new(&mut self, code: &mut CodeChunk, new: &New, line: u32) {
        let Some(resolution) = &new.resolution else {
            self.sentinel(code, &new.class, line);
            return;
        };
        trace!(class = %new.class, line, "new");

        for arg in &new.args {
            self.gen_expr(code, arg);
        }
        for _ in &new.args {
            store_on_heap(code);
        }
        // dispatch pointer from the class's global slot
        self.load_entry(code, resolution);
        code.emit(Instruction::LoadHp);
        code.emit(Instruction::StoreWord);
        // object address, then bump hp past it
        code.emit(Instruction::LoadHp);
        code.emit(Instruction::LoadHp);
        code.emit(Instruction::push(1));
        code.emit(Instruction::Add);
        code.emit(Instruction::StoreHp);
    }

    fn gen_method_call(&mut self, code: &mut CodeChunk, call: &MethodCall, line: u32) {
        let (Some(resolution), Some(method)) = (&call.resolution, &call.method_entry) else {
            self.sentinel(code, &format!("{}.{}", call.receiver, call.method), line);
            return;
        };
        trace!(receiver = %call.receiver, method = %call.method, line, "method call");

        code.emit(Instruction::LoadFp);
        for arg in call.args.iter().rev() {
            self.gen_expr(code, arg);
        }
        self.load_entry(code, resolution);
        code.emit(Instruction::StoreTm);
        code.emit(Instruction::LoadTm);
        code.emit(Instruction::LoadTm);
        code.emit(Instruction::LoadWord);
        code.emit(Instruction::push(method.offset.into()));
        code.emit(Instruction::Add);
        code.emit(Instruction::LoadWord);
        code.emit(Instruction::JumpSub);
    }
}
