//! Type Check Pass (Pass 2) - Verify the typing rules over the annotated tree.
//!
//! Expressions synthesize their type bottom-up. A violated rule raises a
//! [`TypeCheckError::Fatal`] that unwinds to the nearest declaration list,
//! where it is recorded and checking resumes with the next declaration. A
//! missing annotation or a partially built type raises
//! [`TypeCheckError::Incomplete`], which is dropped silently: the symbol table
//! pass has already reported whatever caused it.
//!
//! Recovery points:
//!
//! - each class and each declaration of the program
//! - each declaration inside a function or method
//! - each method of a class, and each override check
//! - the main body expression

use fool_core::{
    ClassDecl, CompilationError, Declaration, EntryKind, Expr, ExprKind, FunDecl, MethodDecl,
    ParamDecl, Program, TypeNode, VarDecl,
};
use thiserror::Error;
use tracing::{debug, trace};

use crate::context::CompilationContext;
use crate::type_rels::ClassHierarchy;

/// Why checking a node stopped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeCheckError {
    /// A typing rule was violated.
    #[error("{message} at line {line}")]
    Fatal { message: String, line: u32 },

    /// Type information is missing because an earlier pass failed.
    #[error("incomplete type information")]
    Incomplete,
}

type TypeResult<T> = Result<T, TypeCheckError>;

fn fatal<T>(message: impl Into<String>, line: u32) -> TypeResult<T> {
    Err(TypeCheckError::Fatal {
        message: message.into(),
        line,
    })
}

/// Fail with `Incomplete` when `ty` contains the incomplete marker.
fn complete(ty: &TypeNode) -> TypeResult<&TypeNode> {
    if ty.is_incomplete() {
        Err(TypeCheckError::Incomplete)
    } else {
        Ok(ty)
    }
}

/// Output of the type check pass.
#[derive(Debug, Default)]
pub struct TypeCheckOutput {
    /// Type of the main body expression, when it could be computed.
    pub program_type: Option<TypeNode>,
    /// Recorded type errors, in discovery order.
    pub errors: Vec<CompilationError>,
}

impl TypeCheckOutput {
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}

/// Pass 2: check types. Reads the tree, never writes it.
pub struct TypeCheckPass<'a> {
    hierarchy: &'a ClassHierarchy,
    errors: Vec<CompilationError>,
}

impl<'a> TypeCheckPass<'a> {
    pub fn new(ctx: &'a CompilationContext) -> Self {
        Self {
            hierarchy: ctx.hierarchy(),
            errors: Vec::new(),
        }
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    #[tracing::instrument(name = "type_check", skip_all)]
    pub fn run(mut self, program: &Program) -> TypeCheckOutput {
        for class in program.classes() {
            let result = self.check_class(class);
            self.recover(result);
        }
        for decl in program.declarations() {
            let result = self.check_declaration(decl);
            self.recover(result);
        }

        let program_type = match self.check_expr(program.main_expr()) {
            Ok(ty) => Some(ty),
            Err(error) => {
                self.recover(Err(error));
                None
            }
        };

        debug!(
            errors = self.errors.len(),
            program_type = ?program_type,
            "type check finished"
        );

        TypeCheckOutput {
            program_type,
            errors: self.errors,
        }
    }

    /// Record a fatal error and carry on.
    fn recover(&mut self, result: TypeResult<()>) {
        match result {
            Ok(()) => {}
            Err(TypeCheckError::Fatal { message, line }) => {
                debug!(%message, line, "type error");
                self.errors.push(CompilationError::Type { message, line });
            }
            Err(TypeCheckError::Incomplete) => {}
        }
    }

    fn is_subtype(&self, a: &TypeNode, b: &TypeNode) -> bool {
        self.hierarchy.is_subtype(a, b)
    }

    // ==========================================================================
    // Declarations
    // ==========================================================================

    fn check_declaration(&mut self, decl: &Declaration) -> TypeResult<()> {
        match decl {
            Declaration::Var(var) => self.check_var(var),
            Declaration::Fun(fun) => self.check_fun(fun),
        }
    }

    fn check_var(&mut self, var: &VarDecl) -> TypeResult<()> {
        trace!(name = %var.name, "variable");
        let declared = complete(&var.ty)?;
        let init = self.check_expr(&var.init)?;
        if !self.is_subtype(&init, declared) {
            return fatal(format!("Incompatible value for variable {}", var.name), var.line);
        }
        Ok(())
    }

    fn check_fun(&mut self, fun: &FunDecl) -> TypeResult<()> {
        trace!(name = %fun.name, "function");
        let body = self.check_callable(
            &fun.params,
            &fun.return_type,
            &fun.declarations,
            &fun.body,
        )?;
        if !self.is_subtype(&body, &fun.return_type) {
            return fatal(format!("Wrong return type for function {}", fun.name), fun.line);
        }
        Ok(())
    }

    fn check_method(&mut self, method: &MethodDecl) -> TypeResult<()> {
        trace!(name = %method.name, "method");
        let body = self.check_callable(
            &method.params,
            &method.return_type,
            &method.declarations,
            &method.body,
        )?;
        if !self.is_subtype(&body, &method.return_type) {
            return fatal(format!("Wrong return type for method {}", method.name), method.line);
        }
        Ok(())
    }

    /// Check the local declarations and return the body's type.
    fn check_callable(
        &mut self,
        params: &[ParamDecl],
        return_type: &TypeNode,
        declarations: &[Declaration],
        body: &Expr,
    ) -> TypeResult<TypeNode> {
        complete(return_type)?;
        for param in params {
            complete(&param.ty)?;
        }
        for decl in declarations {
            let result = self.check_declaration(decl);
            self.recover(result);
        }
        self.check_expr(body)
    }

    // ==========================================================================
    // Classes
    // ==========================================================================

    fn check_class(&mut self, class: &ClassDecl) -> TypeResult<()> {
        trace!(name = %class.name, "class");
        for method in &class.methods {
            let result = self.check_method(method);
            self.recover(result);
        }

        if let Some(super_entry) = &class.super_entry {
            let own = class
                .entry
                .as_ref()
                .and_then(|entry| entry.ty.as_class())
                .ok_or(TypeCheckError::Incomplete)?;
            let inherited = super_entry
                .ty
                .as_class()
                .ok_or(TypeCheckError::Incomplete)?;

            for field in &class.fields {
                let Some(offset) = field.offset else { continue };
                let position = (-offset - 1) as usize;
                let result = match (own.fields.get(position), inherited.fields.get(position)) {
                    (Some(ty), Some(super_ty)) if !self.is_subtype(ty, super_ty) => fatal(
                        format!("Wrong type for overriding field {}", field.name),
                        field.line,
                    ),
                    _ => Ok(()),
                };
                self.recover(result);
            }

            for method in &class.methods {
                let Some(slot) = method.offset else { continue };
                let slot = slot as usize;
                let result = match (own.methods.get(slot), inherited.methods.get(slot)) {
                    (Some(sig), Some(super_sig))
                        if !self.hierarchy.is_arrow_subtype(sig, super_sig) =>
                    {
                        fatal(
                            format!("Wrong type for overriding method {}", method.name),
                            method.line,
                        )
                    }
                    _ => Ok(()),
                };
                self.recover(result);
            }
        }
        Ok(())
    }

    // ==========================================================================
    // Expressions
    // ==========================================================================

    fn check_expr(&mut self, expr: &Expr) -> TypeResult<TypeNode> {
        let line = expr.line;
        match &expr.kind {
            ExprKind::Int(_) => Ok(TypeNode::Int),
            ExprKind::Bool(_) => Ok(TypeNode::Bool),
            ExprKind::Null => Ok(TypeNode::Empty),

            ExprKind::Binary { op, lhs, rhs } => {
                let left = self.check_expr(lhs)?;
                let right = self.check_expr(rhs)?;
                if op.is_arithmetic() {
                    if !(self.is_subtype(&left, &TypeNode::Int)
                        && self.is_subtype(&right, &TypeNode::Int))
                    {
                        return fatal(format!("Non integers in {}", op.describe()), line);
                    }
                    Ok(TypeNode::Int)
                } else if op.is_logical() {
                    if left != TypeNode::Bool || right != TypeNode::Bool {
                        return fatal(format!("Incompatible types in {}", op.describe()), line);
                    }
                    Ok(TypeNode::Bool)
                } else {
                    if !self.hierarchy.are_comparable(&left, &right) {
                        return fatal(format!("Incompatible types in {}", op.describe()), line);
                    }
                    Ok(TypeNode::Bool)
                }
            }

            ExprKind::Not(operand) => {
                if self.check_expr(operand)? != TypeNode::Bool {
                    return fatal("Incompatible type for not", line);
                }
                Ok(TypeNode::Bool)
            }

            ExprKind::If {
                cond,
                then,
                otherwise,
            } => {
                if self.check_expr(cond)? != TypeNode::Bool {
                    return fatal("Non boolean condition in if", line);
                }
                let then = self.check_expr(then)?;
                let otherwise = self.check_expr(otherwise)?;
                match self.hierarchy.lowest_common_ancestor(&then, &otherwise) {
                    Some(ty) => Ok(ty),
                    None => fatal("Incompatible types in then-else branches", line),
                }
            }

            ExprKind::Print(operand) => self.check_expr(operand),

            ExprKind::Id(id) => {
                let resolution = id.resolution.as_ref().ok_or(TypeCheckError::Incomplete)?;
                let entry = &resolution.entry;
                match entry.kind {
                    EntryKind::Function | EntryKind::Method => {
                        return fatal(format!("Wrong usage of function identifier {}", id.name), line);
                    }
                    EntryKind::Class => {
                        return fatal(format!("Wrong usage of class identifier {}", id.name), line);
                    }
                    _ if entry.ty.as_arrow().is_some() => {
                        return fatal(format!("Wrong usage of function identifier {}", id.name), line);
                    }
                    _ => {}
                }
                complete(&entry.ty).cloned()
            }

            ExprKind::Call(call) => {
                let resolution = call.resolution.as_ref().ok_or(TypeCheckError::Incomplete)?;
                let ty = complete(&resolution.entry.ty)?;
                let Some(arrow) = ty.as_arrow() else {
                    return fatal(format!("Invocation of a non-function {}", call.callee), line);
                };
                self.check_arguments(&arrow.params, &call.args, &call.callee, line)?;
                Ok((*arrow.ret).clone())
            }

            ExprKind::New(new) => {
                let resolution = new.resolution.as_ref().ok_or(TypeCheckError::Incomplete)?;
                let class = complete(&resolution.entry.ty)?
                    .as_class()
                    .ok_or(TypeCheckError::Incomplete)?;
                if class.fields.len() != new.args.len() {
                    return fatal(
                        format!("Wrong number of fields in the instantiation of {}", new.class),
                        line,
                    );
                }
                for (index, (arg, field)) in new.args.iter().zip(&class.fields).enumerate() {
                    let arg = self.check_expr(arg)?;
                    if !self.is_subtype(&arg, field) {
                        return fatal(
                            format!(
                                "Wrong type for {}-th field in the instantiation of {}",
                                index + 1,
                                new.class
                            ),
                            line,
                        );
                    }
                }
                Ok(TypeNode::reference(&new.class))
            }

            ExprKind::MethodCall(call) => {
                call.resolution.as_ref().ok_or(TypeCheckError::Incomplete)?;
                let entry = call.method_entry.as_ref().ok_or(TypeCheckError::Incomplete)?;
                let qualified = format!("{}.{}", call.receiver, call.method);
                let Some(arrow) = complete(&entry.ty)?.as_arrow() else {
                    return fatal(format!("Invocation of a non-method {qualified}"), line);
                };
                self.check_arguments(&arrow.params, &call.args, &qualified, line)?;
                Ok((*arrow.ret).clone())
            }
        }
    }

    /// Exact arity, then positional subtyping.
    fn check_arguments(
        &mut self,
        params: &[TypeNode],
        args: &[Expr],
        callee: &str,
        line: u32,
    ) -> TypeResult<()> {
        if params.len() != args.len() {
            return fatal(
                format!("Wrong number of parameters in the invocation of {callee}"),
                line,
            );
        }
        for (index, (arg, param)) in args.iter().zip(params).enumerate() {
            let arg = self.check_expr(arg)?;
            if !self.is_subtype(&arg, param) {
                return fatal(
                    format!(
                        "Wrong type for {}-th parameter in the invocation of {callee}",
                        index + 1
                    ),
                    line,
                );
            }
        }
        Ok(())
    }
}
