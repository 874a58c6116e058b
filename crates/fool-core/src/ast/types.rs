//! Type nodes.
//!
//! Types appear in declarations (written by the parser) and are also produced
//! by the type checker as the inferred type of expressions.

use std::fmt;

/// A FOOL type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeNode {
    /// `int`
    Int,
    /// `bool`, a subtype of `int`
    Bool,
    /// Function or method type `(P1, .., Pn) -> R`
    Arrow(ArrowType),
    /// Composite type of a class declaration: field and method types by position
    Class(ClassType),
    /// Reference to an object of the named class
    Ref(String),
    /// Type of `null`
    Empty,
    /// A type the parser could not build
    Incomplete,
}

impl TypeNode {
    /// Build a reference-to-class type.
    pub fn reference(class: impl Into<String>) -> Self {
        TypeNode::Ref(class.into())
    }

    /// Build an arrow type.
    pub fn arrow(params: Vec<TypeNode>, ret: TypeNode) -> Self {
        TypeNode::Arrow(ArrowType::new(params, ret))
    }

    /// Whether this type, or any type nested in it, is the incomplete marker.
    pub fn is_incomplete(&self) -> bool {
        match self {
            TypeNode::Incomplete => true,
            TypeNode::Arrow(arrow) => arrow.is_incomplete(),
            TypeNode::Class(class) => {
                class.fields.iter().any(TypeNode::is_incomplete)
                    || class.methods.iter().any(ArrowType::is_incomplete)
            }
            TypeNode::Int | TypeNode::Bool | TypeNode::Ref(_) | TypeNode::Empty => false,
        }
    }

    pub fn as_arrow(&self) -> Option<&ArrowType> {
        match self {
            TypeNode::Arrow(arrow) => Some(arrow),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&ClassType> {
        match self {
            TypeNode::Class(class) => Some(class),
            _ => None,
        }
    }

    /// Class name of a reference type.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            TypeNode::Ref(name) => Some(name),
            _ => None,
        }
    }

    /// Names of every class referenced by this type.
    pub fn referenced_classes(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_classes(&mut names);
        names
    }

    fn collect_classes<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            TypeNode::Ref(name) => names.push(name),
            TypeNode::Arrow(arrow) => arrow.collect_classes(names),
            TypeNode::Class(class) => {
                for field in &class.fields {
                    field.collect_classes(names);
                }
                for method in &class.methods {
                    method.collect_classes(names);
                }
            }
            TypeNode::Int | TypeNode::Bool | TypeNode::Empty | TypeNode::Incomplete => {}
        }
    }
}

impl fmt::Display for TypeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeNode::Int => write!(f, "int"),
            TypeNode::Bool => write!(f, "bool"),
            TypeNode::Arrow(arrow) => write!(f, "{arrow}"),
            TypeNode::Class(class) => write!(f, "{class}"),
            TypeNode::Ref(name) => write!(f, "{name}"),
            TypeNode::Empty => write!(f, "null"),
            TypeNode::Incomplete => write!(f, "<incomplete>"),
        }
    }
}

/// Function type: parameter types and return type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrowType {
    pub params: Vec<TypeNode>,
    pub ret: Box<TypeNode>,
}

impl ArrowType {
    pub fn new(params: Vec<TypeNode>, ret: TypeNode) -> Self {
        Self {
            params,
            ret: Box::new(ret),
        }
    }

    pub fn is_incomplete(&self) -> bool {
        self.params.iter().any(TypeNode::is_incomplete) || self.ret.is_incomplete()
    }

    fn collect_classes<'a>(&'a self, names: &mut Vec<&'a str>) {
        for param in &self.params {
            param.collect_classes(names);
        }
        self.ret.collect_classes(names);
    }
}

impl fmt::Display for ArrowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{param}")?;
        }
        write!(f, ") -> {}", self.ret)
    }
}

/// Flattened class layout, inherited members included.
///
/// `fields[i]` is the field stored at offset `-(i + 1)` from the object
/// address; `methods[s]` is the method at dispatch slot `s`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClassType {
    pub fields: Vec<TypeNode>,
    pub methods: Vec<ArrowType>,
}

impl ClassType {
    pub fn new(fields: Vec<TypeNode>, methods: Vec<ArrowType>) -> Self {
        Self { fields, methods }
    }
}

impl fmt::Display for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "class {{ fields: [")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{field}")?;
        }
        write!(f, "], methods: [")?;
        for (i, method) in self.methods.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{method}")?;
        }
        write!(f, "] }}")
    }
}
