//! Fresh label names.

/// Hands out unique branch and function labels for one code generation run.
#[derive(Debug, Default)]
pub struct LabelGenerator {
    branches: u32,
    functions: u32,
}

impl LabelGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next branch target, `label<n>`.
    pub fn fresh_label(&mut self) -> String {
        let label = format!("label{}", self.branches);
        self.branches += 1;
        label
    }

    /// Next function or method entry, `function<n>`.
    pub fn fresh_function(&mut self) -> String {
        let label = format!("function{}", self.functions);
        self.functions += 1;
        label
    }
}
