//! Propositional-variable interning.
//!
//! Formulas and models refer to propositional variables by dense index; the
//! [`VarTable`] owns the index-to-name mapping. The table is an explicit
//! value threaded through every operation that needs variable names, so the
//! checkers stay reentrant and nothing hides in global state.

use std::collections::HashMap;
use std::fmt;

/// A propositional-variable identifier (0-indexed).
///
/// Variable ids are positions in a [`VarTable`]; the same id means the same
/// variable across the model, the formulas, and every automaton built from
/// them, as long as one table is used throughout.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Var(u32);

impl Var {
    /// Creates a variable id from a raw index.
    pub fn new(index: u32) -> Self {
        Var(index)
    }

    /// Returns the index as a `usize`, for bit-set addressing.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Interning table mapping variable names to dense indices.
#[derive(Debug, Clone, Default)]
pub struct VarTable {
    names: Vec<String>,
    index: HashMap<String, u32>,
}

impl VarTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id for `name`, adding it if it has not been seen before.
    pub fn intern(&mut self, name: &str) -> Var {
        if let Some(&i) = self.index.get(name) {
            return Var(i);
        }
        let i = self.names.len() as u32;
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), i);
        Var(i)
    }

    /// Returns the id for `name` if it has been interned.
    pub fn lookup(&self, name: &str) -> Option<Var> {
        self.index.get(name).map(|&i| Var(i))
    }

    /// Returns the name of a variable.
    ///
    /// # Panics
    ///
    /// Panics if `var` was not produced by this table.
    pub fn name(&self, var: Var) -> &str {
        &self.names[var.index()]
    }

    /// Number of interned variables (1 + the highest index).
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if no variables have been interned.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Removes every variable.
    pub fn clear(&mut self) {
        self.names.clear();
        self.index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_is_stable() {
        let mut vars = VarTable::new();
        let p = vars.intern("p");
        let q = vars.intern("q");
        assert_ne!(p, q);
        assert_eq!(vars.intern("p"), p);
        assert_eq!(vars.len(), 2);
    }

    #[test]
    fn test_lookup_and_name() {
        let mut vars = VarTable::new();
        let p = vars.intern("p");
        assert_eq!(vars.lookup("p"), Some(p));
        assert_eq!(vars.lookup("q"), None);
        assert_eq!(vars.name(p), "p");
    }

    #[test]
    fn test_indices_are_dense() {
        let mut vars = VarTable::new();
        assert_eq!(vars.intern("a").index(), 0);
        assert_eq!(vars.intern("b").index(), 1);
        assert_eq!(vars.intern("c").index(), 2);
    }
}
