//! Symbol Table Pass (Pass 1) - Bind every use of a name to its declaration.
//!
//! Class layouts are built first, in declaration order, so every method body
//! sees every class. Then one depth-first, left-to-right walk covers method
//! bodies, declarations and the main expression. Each scope-introducing
//! node (program, function, method, class body) pushes a frame before its
//! children and pops it afterwards. Use sites are annotated with the entry they
//! resolved to and the nesting level they appear at; declarations get their
//! offsets.
//!
//! ## Layout
//!
//! ```text
//! level 0  global frame      classes, then vars and funs at -2, -3, ...
//! level 1  class body        fields at -1, -2, ... / methods at slots 0, 1, ...
//! level n  function/method   params at 1, 2, ... / locals at -2, -3, ...
//! ```
//!
//! Errors never stop the walk: they are collected and returned with the
//! output, and the offending annotation is left empty.

use fool_core::{
    ArrowType, Call, ClassDecl, ClassType, CompilationError, Declaration, EntryKind, Expr,
    ExprKind, FunDecl, GLOBAL_LEVEL, IdRef, MemberKind, MethodCall, MethodDecl, New, ParamDecl,
    Program, ProgramKind, Resolution, SymbolEntry, TypeNode, UseKind, VarDecl,
};
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;
use tracing::{debug, trace};

use crate::context::CompilationContext;

/// Members of one class, inherited ones included, keyed by name.
pub type VirtualTable = FxHashMap<String, SymbolEntry>;

/// Virtual table of every declared class.
pub type ClassTable = FxHashMap<String, VirtualTable>;

/// First offset handed out to declarations in a fresh scope.
const FIRST_DECL_OFFSET: i32 = -2;

/// Misuse of the pass itself, as opposed to errors in the program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymbolTableError {
    /// The tree already carries annotations from an earlier run.
    #[error("program has already been resolved")]
    AlreadyResolved,
}

/// Output of the symbol table pass.
#[derive(Debug, Default)]
pub struct SymbolTableOutput {
    /// Scope and structural errors, in discovery order.
    pub errors: Vec<CompilationError>,
    /// Flattened virtual table of each class.
    pub class_table: ClassTable,
}

impl SymbolTableOutput {
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Pass 1: resolve names and lay out frames, objects and dispatch tables.
pub struct SymbolTablePass<'a> {
    ctx: &'a mut CompilationContext,
    /// Innermost scope last; the index is the nesting level.
    scopes: Vec<FxHashMap<String, SymbolEntry>>,
    class_table: ClassTable,
    /// Every class name in the program, for validating declared types.
    known_classes: FxHashSet<String>,
    /// Next offset for a declaration in the current scope.
    decl_offset: i32,
    errors: Vec<CompilationError>,
}

impl<'a> SymbolTablePass<'a> {
    pub fn new(ctx: &'a mut CompilationContext) -> Self {
        Self {
            ctx,
            scopes: Vec::new(),
            class_table: ClassTable::default(),
            known_classes: FxHashSet::default(),
            decl_offset: FIRST_DECL_OFFSET,
            errors: Vec::new(),
        }
    }

    /// Run the pass, annotating `program` in place.
    ///
    /// A tree can only be resolved once.
    #[cfg_attr(feature = "profiling", profiling::function)]
    #[tracing::instrument(name = "symbol_table", skip_all)]
    pub fn run(mut self, program: &mut Program) -> Result<SymbolTableOutput, SymbolTableError> {
        if program.is_resolved() {
            return Err(SymbolTableError::AlreadyResolved);
        }

        self.known_classes = program
            .classes()
            .iter()
            .map(|class| class.name.clone())
            .collect();

        let saved = self.enter_scope();
        match &mut program.kind {
            ProgramKind::LetIn {
                classes,
                declarations,
                body,
            } => {
                // every layout first, so method bodies see every class
                let vtables: Vec<VirtualTable> =
                    classes.iter_mut().map(|class| self.layout_class(class)).collect();
                for (class, vtable) in classes.iter_mut().zip(vtables) {
                    self.visit_class_body(class, vtable);
                }
                for decl in declarations {
                    self.visit_declaration(decl);
                }
                self.visit_expr(body);
            }
            ProgramKind::Body(body) => self.visit_expr(body),
        }
        self.exit_scope(saved);

        program.mark_resolved();
        debug!(
            errors = self.errors.len(),
            classes = self.class_table.len(),
            "symbol table built"
        );

        Ok(SymbolTableOutput {
            errors: self.errors,
            class_table: self.class_table,
        })
    }

    // ==========================================================================
    // Scopes
    // ==========================================================================

    /// Push a frame and reset the declaration counter, returning the old one.
    fn enter_scope(&mut self) -> i32 {
        self.enter_scope_with(FxHashMap::default())
    }

    fn enter_scope_with(&mut self, frame: FxHashMap<String, SymbolEntry>) -> i32 {
        self.scopes.push(frame);
        std::mem::replace(&mut self.decl_offset, FIRST_DECL_OFFSET)
    }

    fn exit_scope(&mut self, saved: i32) {
        self.scopes.pop();
        self.decl_offset = saved;
    }

    fn level(&self) -> u32 {
        self.scopes.len().saturating_sub(1) as u32
    }

    fn next_decl_offset(&mut self) -> i32 {
        let offset = self.decl_offset;
        self.decl_offset -= 1;
        offset
    }

    /// Enter `name` in the current scope. A redeclaration is reported and replaces
    /// the earlier entry.
    fn declare(&mut self, name: &str, entry: SymbolEntry, line: u32) {
        let kind = entry.kind;
        let Some(frame) = self.scopes.last_mut() else {
            return;
        };
        if frame.insert(name.to_string(), entry).is_some() {
            self.errors.push(CompilationError::Duplicate {
                kind,
                name: name.to_string(),
                line,
            });
        }
    }

    /// Innermost visible declaration of `name`.
    fn lookup(&self, name: &str) -> Option<&SymbolEntry> {
        self.scopes.iter().rev().find_map(|frame| frame.get(name))
    }

    fn lookup_global(&self, name: &str) -> Option<&SymbolEntry> {
        self.scopes.get(GLOBAL_LEVEL as usize)?.get(name)
    }

    /// Report every class named in `ty` that the program does not declare.
    fn check_type(&mut self, ty: &TypeNode, line: u32) {
        for class in ty.referenced_classes() {
            if !self.known_classes.contains(class) {
                self.errors.push(CompilationError::Undeclared {
                    kind: UseKind::Class,
                    name: class.to_string(),
                    line,
                });
            }
        }
    }

    // ==========================================================================
    // Classes
    // ==========================================================================

    /// Build the class's virtual table and layout, and declare it globally.
    fn layout_class(&mut self, class: &mut ClassDecl) -> VirtualTable {
        let (mut vtable, mut layout) = self.inherit(class);
        let mut own_members = FxHashSet::default();

        for field in &mut class.fields {
            self.check_type(&field.ty, field.line);
            if !own_members.insert(field.name.clone()) {
                self.errors.push(CompilationError::Duplicate {
                    kind: EntryKind::Field,
                    name: field.name.clone(),
                    line: field.line,
                });
            }

            let inherited = vtable.get(&field.name).map(|entry| (entry.kind, entry.offset));
            let offset = match inherited {
                Some((EntryKind::Field, offset)) => {
                    if let Some(slot) = layout.fields.get_mut(field_index(offset)) {
                        *slot = field.ty.clone();
                    }
                    offset
                }
                Some(_) => {
                    self.errors.push(CompilationError::MemberCollision {
                        kind: MemberKind::Field,
                        name: field.name.clone(),
                        inherited: MemberKind::Method,
                        line: field.line,
                    });
                    field.offset = Some(push_field(&mut layout, &field.ty));
                    continue;
                }
                None => push_field(&mut layout, &field.ty),
            };

            field.offset = Some(offset);
            vtable.insert(
                field.name.clone(),
                SymbolEntry::new(1, field.ty.clone(), offset, EntryKind::Field),
            );
        }

        for method in &mut class.methods {
            self.check_type(&method.return_type, method.line);
            for param in &method.params {
                self.check_type(&param.ty, param.line);
            }
            let duplicate = !own_members.insert(method.name.clone());
            if duplicate {
                self.errors.push(CompilationError::Duplicate {
                    kind: EntryKind::Method,
                    name: method.name.clone(),
                    line: method.line,
                });
            }

            let signature = method.signature();
            let inherited = vtable.get(&method.name).map(|entry| (entry.kind, entry.offset));
            let slot = match inherited {
                Some((EntryKind::Method, slot)) => {
                    if let Some(existing) = layout.methods.get_mut(slot as usize) {
                        *existing = signature.clone();
                    }
                    slot
                }
                Some(_) => {
                    if !duplicate {
                        self.errors.push(CompilationError::MemberCollision {
                            kind: MemberKind::Method,
                            name: method.name.clone(),
                            inherited: MemberKind::Field,
                            line: method.line,
                        });
                    }
                    method.offset = Some(push_method(&mut layout, signature));
                    continue;
                }
                None => push_method(&mut layout, signature.clone()),
            };

            method.offset = Some(slot);
            vtable.insert(
                method.name.clone(),
                SymbolEntry::new(1, TypeNode::Arrow(signature), slot, EntryKind::Method),
            );
        }

        debug!(
            class = %class.name,
            fields = layout.fields.len(),
            methods = layout.methods.len(),
            "class layout"
        );

        let offset = self.next_decl_offset();
        let entry = SymbolEntry::new(self.level(), TypeNode::Class(layout), offset, EntryKind::Class);
        self.declare(&class.name, entry.clone(), class.line);
        class.entry = Some(entry);
        self.class_table.insert(class.name.clone(), vtable.clone());
        vtable
    }

    fn visit_class_body(&mut self, class: &mut ClassDecl, vtable: VirtualTable) {
        let saved = self.enter_scope_with(vtable);
        for method in &mut class.methods {
            self.visit_method(method);
        }
        self.exit_scope(saved);
    }

    /// Resolve the superclass and start from a copy of its members.
    fn inherit(&mut self, class: &mut ClassDecl) -> (VirtualTable, ClassType) {
        let Some(superclass) = class.superclass.as_deref() else {
            return Default::default();
        };

        match self.lookup_global(superclass).cloned() {
            None => {
                self.errors.push(CompilationError::Undeclared {
                    kind: UseKind::Superclass,
                    name: superclass.to_string(),
                    line: class.line,
                });
                Default::default()
            }
            Some(entry) if entry.kind != EntryKind::Class => {
                self.errors.push(CompilationError::NotAClass {
                    kind: UseKind::Superclass,
                    name: superclass.to_string(),
                    line: class.line,
                });
                Default::default()
            }
            Some(entry) => {
                self.ctx.hierarchy_mut().register(&class.name, superclass);
                let vtable = self
                    .class_table
                    .get(superclass)
                    .cloned()
                    .unwrap_or_default();
                let layout = entry.ty.as_class().cloned().unwrap_or_default();
                class.super_entry = Some(entry);
                (vtable, layout)
            }
        }
    }

    fn visit_method(&mut self, method: &mut MethodDecl) {
        trace!(method = %method.name, line = method.line, "method body");
        let saved = self.enter_scope();
        self.declare_params(&method.params);
        for decl in &mut method.declarations {
            self.visit_declaration(decl);
        }
        self.visit_expr(&mut method.body);
        self.exit_scope(saved);
    }

    // ==========================================================================
    // Declarations
    // ==========================================================================

    fn visit_declaration(&mut self, decl: &mut Declaration) {
        match decl {
            Declaration::Var(var) => self.visit_var(var),
            Declaration::Fun(fun) => self.visit_fun(fun),
        }
    }

    fn visit_var(&mut self, var: &mut VarDecl) {
        self.check_type(&var.ty, var.line);
        // The initializer cannot see the variable it initializes.
        self.visit_expr(&mut var.init);

        let offset = self.next_decl_offset();
        debug!(name = %var.name, offset, level = self.level(), "variable");
        let entry = SymbolEntry::new(self.level(), var.ty.clone(), offset, EntryKind::Variable);
        self.declare(&var.name, entry, var.line);
    }

    fn visit_fun(&mut self, fun: &mut FunDecl) {
        self.check_type(&fun.return_type, fun.line);
        for param in &fun.params {
            self.check_type(&param.ty, param.line);
        }

        // Entered before the body so the function can call itself.
        let offset = self.next_decl_offset();
        debug!(name = %fun.name, offset, level = self.level(), "function");
        let entry = SymbolEntry::new(
            self.level(),
            TypeNode::Arrow(fun.signature()),
            offset,
            EntryKind::Function,
        );
        self.declare(&fun.name, entry, fun.line);

        let saved = self.enter_scope();
        self.declare_params(&fun.params);
        for decl in &mut fun.declarations {
            self.visit_declaration(decl);
        }
        self.visit_expr(&mut fun.body);
        self.exit_scope(saved);
    }

    fn declare_params(&mut self, params: &[ParamDecl]) {
        let level = self.level();
        for (offset, param) in (1..).zip(params) {
            let entry = SymbolEntry::new(level, param.ty.clone(), offset, EntryKind::Parameter);
            self.declare(&param.name, entry, param.line);
        }
    }

    // ==========================================================================
    // Expressions
    // ==========================================================================

    fn visit_expr(&mut self, expr: &mut Expr) {
        let line = expr.line;
        match &mut expr.kind {
            ExprKind::Int(_) | ExprKind::Bool(_) | ExprKind::Null => {}
            ExprKind::Binary { lhs, rhs, .. } => {
                self.visit_expr(lhs);
                self.visit_expr(rhs);
            }
            ExprKind::Not(operand) | ExprKind::Print(operand) => self.visit_expr(operand),
            ExprKind::If {
                cond,
                then,
                otherwise,
            } => {
                self.visit_expr(cond);
                self.visit_expr(then);
                self.visit_expr(otherwise);
            }
            ExprKind::Id(id) => self.visit_id(id, line),
            ExprKind::Call(call) => self.visit_call(call, line),
            ExprKind::New(new) => self.visit_new(new, line),
            ExprKind::MethodCall(call) => self.visit_method_call(call, line),
        }
    }

    fn visit_id(&mut self, id: &mut IdRef, line: u32) {
        trace!(name = %id.name, line, "identifier");
        match self.lookup(&id.name).cloned() {
            Some(entry) => id.resolution = Some(Resolution::new(entry, self.level())),
            None => self.errors.push(CompilationError::Undeclared {
                kind: UseKind::Identifier,
                name: id.name.clone(),
                line,
            }),
        }
    }

    fn visit_call(&mut self, call: &mut Call, line: u32) {
        trace!(callee = %call.callee, line, "call");
        match self.lookup(&call.callee).cloned() {
            Some(entry) => call.resolution = Some(Resolution::new(entry, self.level())),
            None => self.errors.push(CompilationError::Undeclared {
                kind: UseKind::Function,
                name: call.callee.clone(),
                line,
            }),
        }
        for arg in &mut call.args {
            self.visit_expr(arg);
        }
    }

    fn visit_new(&mut self, new: &mut New, line: u32) {
        trace!(class = %new.class, line, "new");
        match self.lookup_global(&new.class).cloned() {
            Some(entry)
                if entry.kind == EntryKind::Class && self.class_table.contains_key(&new.class) =>
            {
                new.resolution = Some(Resolution::new(entry, self.level()));
            }
            Some(_) => self.errors.push(CompilationError::NotAClass {
                kind: UseKind::Class,
                name: new.class.clone(),
                line,
            }),
            None => self.errors.push(CompilationError::Undeclared {
                kind: UseKind::Class,
                name: new.class.clone(),
                line,
            }),
        }
        for arg in &mut new.args {
            self.visit_expr(arg);
        }
    }

    fn visit_method_call(&mut self, call: &mut MethodCall, line: u32) {
        trace!(receiver = %call.receiver, method = %call.method, line, "method call");
        self.resolve_method(call, line);
        for arg in &mut call.args {
            self.visit_expr(arg);
        }
    }

    fn resolve_method(&mut self, call: &mut MethodCall, line: u32) {
        let Some(receiver) = self.lookup(&call.receiver).cloned() else {
            self.errors.push(CompilationError::Undeclared {
                kind: UseKind::Object,
                name: call.receiver.clone(),
                line,
            });
            return;
        };

        let Some(class) = receiver.ty.class_name().map(str::to_string) else {
            self.errors.push(CompilationError::NotAnObject {
                name: call.receiver.clone(),
                line,
            });
            return;
        };
        call.resolution = Some(Resolution::new(receiver, self.level()));

        let Some(vtable) = self.class_table.get(&class) else {
            self.errors.push(CompilationError::Undeclared {
                kind: UseKind::Class,
                name: class,
                line,
            });
            return;
        };

        match vtable.get(&call.method) {
            Some(entry) if entry.kind == EntryKind::Method => {
                call.method_entry = Some(entry.clone());
            }
            _ => self.errors.push(CompilationError::Undeclared {
                kind: UseKind::Method,
                name: call.method.clone(),
                line,
            }),
        }
    }
}

/// Position of a field in its class type from its (negative) offset.
fn field_index(offset: i32) -> usize {
    (-offset - 1).max(0) as usize
}

fn push_field(layout: &mut ClassType, ty: &TypeNode) -> i32 {
    layout.fields.push(ty.clone());
    -(layout.fields.len() as i32)
}

fn push_method(layout: &mut ClassType, signature: ArrowType) -> i32 {
    layout.methods.push(signature);
    layout.methods.len() as i32 - 1
}
