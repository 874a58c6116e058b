//! Declaration nodes.

use super::expr::Expr;
use super::types::{ArrowType, TypeNode};
use crate::symbol::SymbolEntry;

/// A declaration inside a `let` block or a function/method body.
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Var(VarDecl),
    Fun(FunDecl),
}

/// `var name: ty = init;`
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: String,
    pub ty: TypeNode,
    pub init: Expr,
    pub line: u32,
}

impl VarDecl {
    pub fn new(name: impl Into<String>, ty: TypeNode, init: Expr, line: u32) -> Self {
        Self {
            name: name.into(),
            ty,
            init,
            line,
        }
    }
}

/// Function or method parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDecl {
    pub name: String,
    pub ty: TypeNode,
    pub line: u32,
}

impl ParamDecl {
    pub fn new(name: impl Into<String>, ty: TypeNode, line: u32) -> Self {
        Self {
            name: name.into(),
            ty,
            line,
        }
    }
}

/// `fun name: ret (params) let declarations in body`
#[derive(Debug, Clone, PartialEq)]
pub struct FunDecl {
    pub name: String,
    pub return_type: TypeNode,
    pub params: Vec<ParamDecl>,
    pub declarations: Vec<Declaration>,
    pub body: Expr,
    pub line: u32,
}

impl FunDecl {
    pub fn new(
        name: impl Into<String>,
        return_type: TypeNode,
        params: Vec<ParamDecl>,
        declarations: Vec<Declaration>,
        body: Expr,
        line: u32,
    ) -> Self {
        Self {
            name: name.into(),
            return_type,
            params,
            declarations,
            body,
            line,
        }
    }

    pub fn signature(&self) -> ArrowType {
        signature(&self.params, &self.return_type)
    }
}

/// `class Name extends Super (fields) { methods }`
///
/// Classes are only declared at the global level.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: String,
    pub superclass: Option<String>,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<MethodDecl>,
    pub line: u32,
    /// The class's own entry, carrying its flattened [`ClassType`](super::ClassType).
    pub entry: Option<SymbolEntry>,
    /// Entry of the resolved superclass.
    pub super_entry: Option<SymbolEntry>,
}

impl ClassDecl {
    pub fn new(
        name: impl Into<String>,
        superclass: Option<String>,
        fields: Vec<FieldDecl>,
        methods: Vec<MethodDecl>,
        line: u32,
    ) -> Self {
        Self {
            name: name.into(),
            superclass,
            fields,
            methods,
            line,
            entry: None,
            super_entry: None,
        }
    }
}

/// Class field, initialised positionally by `new`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeNode,
    pub line: u32,
    /// Offset from the object address, written by the symbol table pass.
    pub offset: Option<i32>,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, ty: TypeNode, line: u32) -> Self {
        Self {
            name: name.into(),
            ty,
            line,
            offset: None,
        }
    }
}

/// Class method.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub name: String,
    pub return_type: TypeNode,
    pub params: Vec<ParamDecl>,
    pub declarations: Vec<Declaration>,
    pub body: Expr,
    pub line: u32,
    /// Dispatch slot, written by the symbol table pass.
    pub offset: Option<i32>,
}

impl MethodDecl {
    pub fn new(
        name: impl Into<String>,
        return_type: TypeNode,
        params: Vec<ParamDecl>,
        declarations: Vec<Declaration>,
        body: Expr,
        line: u32,
    ) -> Self {
        Self {
            name: name.into(),
            return_type,
            params,
            declarations,
            body,
            line,
            offset: None,
        }
    }

    pub fn signature(&self) -> ArrowType {
        signature(&self.params, &self.return_type)
    }
}

fn signature(params: &[ParamDecl], ret: &TypeNode) -> ArrowType {
    ArrowType::new(params.iter().map(|p| p.ty.clone()).collect(), ret.clone())
}
