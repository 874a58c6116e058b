//! Type relations.
//!
//! Pure queries over [`TypeNode`]s: the subtype relation and the least common
//! ancestor used to type conditionals. Nominal class subtyping consults the
//! [`ClassHierarchy`] registry, which maps each class to its direct superclass.

use fool_core::{ArrowType, TypeNode};
use rustc_hash::{FxHashMap, FxHashSet};

/// Registry of direct superclass links, one compilation's worth.
#[derive(Debug, Clone, Default)]
pub struct ClassHierarchy {
    super_types: FxHashMap<String, String>,
}

impl ClassHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `class` directly extends `superclass`.
    pub fn register(&mut self, class: impl Into<String>, superclass: impl Into<String>) {
        self.super_types.insert(class.into(), superclass.into());
    }

    pub fn superclass(&self, class: &str) -> Option<&str> {
        self.super_types.get(class).map(String::as_str)
    }

    /// The class itself followed by its superclass chain, nearest first.
    ///
    /// Stops at the first repeated name, so a malformed registry cannot loop.
    pub fn ancestors<'a>(&'a self, class: &'a str) -> Ancestors<'a> {
        Ancestors {
            hierarchy: self,
            next: Some(class),
            seen: FxHashSet::default(),
        }
    }

    /// Whether `sub` is `sup` or inherits from it.
    pub fn is_subclass(&self, sub: &str, sup: &str) -> bool {
        self.ancestors(sub).any(|ancestor| ancestor == sup)
    }

    /// Whether a value of type `a` can be used where `b` is expected.
    pub fn is_subtype(&self, a: &TypeNode, b: &TypeNode) -> bool {
        match (a, b) {
            (TypeNode::Ref(sub), TypeNode::Ref(sup)) => self.is_subclass(sub, sup),
            (TypeNode::Arrow(sub), TypeNode::Arrow(sup)) => self.is_arrow_subtype(sub, sup),
            (TypeNode::Bool, TypeNode::Int) => true,
            (TypeNode::Empty, TypeNode::Ref(_)) => true,
            _ => a == b,
        }
    }

    /// Contravariant parameters, covariant return.
    pub fn is_arrow_subtype(&self, sub: &ArrowType, sup: &ArrowType) -> bool {
        sub.params.len() == sup.params.len()
            && sub
                .params
                .iter()
                .zip(&sup.params)
                .all(|(sub_param, sup_param)| self.is_subtype(sup_param, sub_param))
            && self.is_subtype(&sub.ret, &sup.ret)
    }

    /// Whether either type is a subtype of the other.
    pub fn are_comparable(&self, a: &TypeNode, b: &TypeNode) -> bool {
        self.is_subtype(a, b) || self.is_subtype(b, a)
    }

    /// Most specific type both `a` and `b` are subtypes of, if any.
    pub fn lowest_common_ancestor(&self, a: &TypeNode, b: &TypeNode) -> Option<TypeNode> {
        match (a, b) {
            (TypeNode::Bool, TypeNode::Bool) => Some(TypeNode::Bool),
            (TypeNode::Int | TypeNode::Bool, TypeNode::Int | TypeNode::Bool) => Some(TypeNode::Int),
            (TypeNode::Empty, TypeNode::Ref(_)) => Some(b.clone()),
            (TypeNode::Ref(_), TypeNode::Empty) => Some(a.clone()),
            (TypeNode::Ref(left), TypeNode::Ref(right)) => self
                .ancestors(left)
                .find(|ancestor| self.is_subclass(right, ancestor))
                .map(TypeNode::reference),
            _ if self.is_subtype(a, b) => Some(b.clone()),
            _ if self.is_subtype(b, a) => Some(a.clone()),
            _ => None,
        }
    }
}

/// Iterator over a class and its superclasses.
pub struct Ancestors<'a> {
    hierarchy: &'a ClassHierarchy,
    next: Option<&'a str>,
    seen: FxHashSet<&'a str>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        if !self.seen.insert(current) {
            return None;
        }
        self.next = self.hierarchy.superclass(current);
        Some(current)
    }
}
