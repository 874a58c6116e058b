use std::fmt;

use crate::error::CompilationError;

/// A collection of semantic errors accumulated over one compilation.
///
/// Passes report into their own output; the driver gathers everything here so
/// callers can decide whether to keep going.
///
/// # Examples
///
/// ```
/// use fool_core::{CompilationError, Diagnostics, UseKind};
///
/// let mut diagnostics = Diagnostics::new();
/// diagnostics.push(CompilationError::Undeclared {
///     kind: UseKind::Function,
///     name: "foo".to_string(),
///     line: 1,
/// });
///
/// assert_eq!(diagnostics.error_count(), 1);
/// assert_eq!(diagnostics.to_string(), "Fun id foo at line 1 not declared\n");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    errors: Vec<CompilationError>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: CompilationError) {
        self.errors.push(error);
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompilationError> {
        self.errors.iter()
    }

    /// Errors reported by the type checker.
    pub fn type_errors(&self) -> impl Iterator<Item = &CompilationError> {
        self.errors.iter().filter(|e| e.is_type_error())
    }
}

impl Extend<CompilationError> for Diagnostics {
    fn extend<T: IntoIterator<Item = CompilationError>>(&mut self, iter: T) {
        self.errors.extend(iter);
    }
}

impl FromIterator<CompilationError> for Diagnostics {
    fn from_iter<T: IntoIterator<Item = CompilationError>>(iter: T) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a CompilationError;
    type IntoIter = std::slice::Iter<'a, CompilationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for error in &self.errors {
            writeln!(f, "{error}")?;
        }
        Ok(())
    }
}
