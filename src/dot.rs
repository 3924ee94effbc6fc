//! Model and automaton rendering to DOT (Graphviz).
//!
//! Diagnostic output for eyeballing small models and automata; render with
//! `dot -Tpng out.dot -o out.png` or any online viewer.
//!
//! Conventions:
//! - States are circles; accepting automaton states get a double border
//!   (`peripheries=2`).
//! - Initial states are pointed at by a small invisible source node.
//! - Model states are labelled with their name and true variables;
//!   automaton states with their id, valuation constraints, and label.

use std::fmt::Write;

use crate::buchi::Buchi;
use crate::model::Model;
use crate::vars::{Var, VarTable};

/// Configuration options for DOT output generation.
#[derive(Debug, Clone)]
pub struct DotConfig {
    /// Shape for states (default: "circle").
    pub state_shape: &'static str,
    /// Shape for the invisible initial-state markers (default: "point").
    pub initial_shape: &'static str,
    /// Graph layout direction (default: "LR").
    pub rankdir: &'static str,
}

impl Default for DotConfig {
    fn default() -> Self {
        Self {
            state_shape: "circle",
            initial_shape: "point",
            rankdir: "LR",
        }
    }
}

impl Model {
    /// Converts the model to DOT format with default settings.
    pub fn to_dot(&self, vars: &VarTable) -> Result<String, std::fmt::Error> {
        self.to_dot_with_config(vars, &DotConfig::default())
    }

    /// Converts the model to DOT format.
    pub fn to_dot_with_config(
        &self,
        vars: &VarTable,
        config: &DotConfig,
    ) -> Result<String, std::fmt::Error> {
        let mut out = String::new();
        writeln!(out, "digraph model {{")?;
        writeln!(out, "  rankdir={};", config.rankdir)?;
        writeln!(out, "  node [shape={}];", config.state_shape)?;

        for id in 0..self.n_states() {
            let name = self.state_name(id);
            let mut props = String::new();
            for i in 0..vars.len() {
                let var = Var::new(i as u32);
                if self.prop_var(name, var) {
                    if !props.is_empty() {
                        props.push(' ');
                    }
                    props.push_str(vars.name(var));
                }
            }
            let label = if props.is_empty() {
                format!("{}", name)
            } else {
                format!("{}\\n{}", name, props)
            };
            writeln!(out, "  s{} [label=\"{}\"];", name, label)?;
        }

        for &name in self.initial_states().iter() {
            writeln!(
                out,
                "  i{} [shape={}, label=\"\"]; i{} -> s{};",
                name, config.initial_shape, name, name
            )?;
        }

        for id in 0..self.n_states() {
            let name = self.state_name(id);
            for j in 0..self.degree(name) {
                writeln!(out, "  s{} -> s{};", name, self.next(name, j))?;
            }
        }

        writeln!(out, "}}")?;
        Ok(out)
    }
}

impl Buchi {
    /// Converts the automaton to DOT format with default settings.
    pub fn to_dot(&self, vars: &VarTable) -> Result<String, std::fmt::Error> {
        self.to_dot_with_config(vars, &DotConfig::default())
    }

    /// Converts the automaton to DOT format.
    ///
    /// Accepting states (members of any accept set) are double-bordered;
    /// contradiction-marked states are grayed out.
    pub fn to_dot_with_config(
        &self,
        vars: &VarTable,
        config: &DotConfig,
    ) -> Result<String, std::fmt::Error> {
        let mut out = String::new();
        writeln!(out, "digraph buchi {{")?;
        writeln!(out, "  rankdir={};", config.rankdir)?;
        writeln!(out, "  node [shape={}];", config.state_shape)?;

        for id in 0..self.n_states() {
            let mut constraints = String::new();
            for i in 0..vars.len() {
                let var = Var::new(i as u32);
                for (value, prefix) in [(true, ""), (false, "!")] {
                    if self.constrains(id, var, value) {
                        if !constraints.is_empty() {
                            constraints.push(' ');
                        }
                        constraints.push_str(prefix);
                        constraints.push_str(vars.name(var));
                    }
                }
            }
            let mut label = format!("{}", id);
            if !constraints.is_empty() {
                label.push_str("\\n");
                label.push_str(&constraints);
            }
            if let Some(text) = self.state_label(id) {
                label.push_str("\\n");
                label.push_str(text);
            }
            let accepting = (0..self.n_accept_sets()).any(|s| self.accepting(id, s));
            let mut attrs = format!("label=\"{}\"", label);
            if accepting {
                attrs.push_str(", peripheries=2");
            }
            if self.is_contradiction(id) {
                attrs.push_str(", style=filled, fillcolor=gray");
            }
            writeln!(out, "  s{} [{}];", id, attrs)?;
        }

        for &id in self.initial_states().iter() {
            writeln!(
                out,
                "  i{} [shape={}, label=\"\"]; i{} -> s{};",
                id, config.initial_shape, id, id
            )?;
        }

        for src in 0..self.n_states() {
            for &dest in self.successors(src) {
                writeln!(out, "  s{} -> s{};", src, dest)?;
            }
        }

        writeln!(out, "}}")?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitset::BitSet;
    use crate::model::ModelToken;

    #[test]
    fn test_model_dot() {
        let mut vars = VarTable::new();
        let mut m = Model::new();
        use ModelToken::*;
        let tokens = vec![
            Open,
            Initial,
            Int(1),
            Int(1),
            PropVar("p".to_string()),
            Close,
        ];
        m.parse(
            tokens.into_iter().enumerate().map(|(i, t)| (i + 1, t)),
            &mut vars,
        )
        .unwrap();
        let dot = m.to_dot(&vars).unwrap();
        assert!(dot.starts_with("digraph model {"));
        assert!(dot.contains("s1 -> s1;"));
        assert!(dot.contains("i1 -> s1;"));
        assert!(dot.contains('p'));
    }

    #[test]
    fn test_buchi_dot() {
        let mut vars = VarTable::new();
        let p = vars.intern("p");
        let mut b = Buchi::new();
        b.add_state(true);
        b.add_state(false);
        b.add_transition(0, 1);
        b.add_transition(1, 1);
        b.add_prop_var(1, p, false);
        let mut accept = BitSet::new();
        accept.set(1, true);
        b.add_accept_set(accept);

        let dot = b.to_dot(&vars).unwrap();
        assert!(dot.starts_with("digraph buchi {"));
        assert!(dot.contains("peripheries=2"));
        assert!(dot.contains("!p"));
        assert!(dot.contains("s0 -> s1;"));
    }
}
