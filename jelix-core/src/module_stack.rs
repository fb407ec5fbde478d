//! Stack of the modules currently being executed

/// Tracks which module is current during nested cross-module calls
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleContextStack {
    modules: Vec<String>,
}

impl ModuleContextStack {
    /// Create an empty stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `module` the current module
    pub fn push(&mut self, module: impl Into<String>) {
        self.modules.push(module.into());
    }

    /// Leave the current module, returning its name
    pub fn pop(&mut self) -> Option<String> {
        self.modules.pop()
    }

    /// Name of the current module
    pub fn current(&self) -> Option<&str> {
        self.modules.last().map(String::as_str)
    }

    /// Number of nested modules
    pub fn depth(&self) -> usize {
        self.modules.len()
    }

    /// Whether no module is current
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifo() {
        let mut stack = ModuleContextStack::new();
        assert_eq!(stack.current(), None);

        stack.push("news");
        stack.push("jelix");
        assert_eq!(stack.current(), Some("jelix"));
        assert_eq!(stack.depth(), 2);

        assert_eq!(stack.pop().as_deref(), Some("jelix"));
        assert_eq!(stack.current(), Some("news"));
        assert_eq!(stack.pop().as_deref(), Some("news"));
        assert_eq!(stack.pop(), None);
        assert!(stack.is_empty());
    }
}
