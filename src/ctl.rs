//! CTL model checking by fixed-point labelling.
//!
//! The checker reduces the formula to the adequate connective set
//! `{false, !, &, AF, E[· U ·], EX}`, extracts the distinct subformulas
//! bottom-up (structurally equal duplicates share one representative, so
//! the formula is treated as a DAG and each subformula is labelled once),
//! and then computes, per subformula, the set of model states satisfying
//! it. `AF` and `EU` are least fixed points: the labelling loop runs until
//! no state can be added, which terminates because the domain is finite
//! and the step is monotone.

use std::collections::HashMap;

use log::{debug, warn};

use crate::bitset::BitSet;
use crate::error::{Error, Result};
use crate::forest::{NodeId, TreeId};
use crate::formula::{Connective, Formulas};
use crate::model::Model;
use crate::vars::VarTable;

/// The CTL fixed-point checker.
///
/// A checker value is reusable: every [`check`](Self::check) call resets
/// its scratch state.
#[derive(Debug, Default)]
pub struct CtlChecker {
    /// Per model state, one bit per formula node id.
    state_flags: Vec<BitSet>,
    /// Maps each subformula node to its structural representative.
    alias: HashMap<NodeId, NodeId>,
    /// Representatives in children-before-parents labelling order.
    order: Vec<NodeId>,
    /// Variables already warned about, to report each at most once.
    pv_warn: BitSet,
}

impl CtlChecker {
    /// Creates a checker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks `tree` against `model` and returns the set of satisfying
    /// state ids.
    ///
    /// The formula must be CTL (or plain propositional); anything using
    /// LTL connectives is rejected with [`Error::FormulaClass`]. The tree
    /// is reduced in place as a side effect.
    pub fn check(
        &mut self,
        vars: &VarTable,
        model: &Model,
        formulas: &mut Formulas,
        tree: TreeId,
    ) -> Result<BitSet> {
        self.state_flags.clear();
        self.alias.clear();
        self.order.clear();
        self.pv_warn.clear();

        if !formulas.is_ctl(tree) {
            return Err(Error::FormulaClass {
                expected: "CTL",
                found: formulas.tree_class(tree),
            });
        }

        let mut result = BitSet::new();
        if !model.is_defined() {
            return Ok(result);
        }

        formulas.reduce_ctl(tree);
        let root = formulas.root(tree);
        debug!("check: reduced formula {}", formulas.render(vars, root));

        self.state_flags = vec![BitSet::new(); model.n_states()];
        self.extract_subformulas(formulas, root);

        for i in 0..self.order.len() {
            let node = self.order[i];
            self.label(vars, model, formulas, node);
        }

        let sat = *self.order.last().expect("formula has a root");
        for i in 0..model.n_states() {
            if self.flag(i, sat) {
                result.set(i, true);
            }
        }
        Ok(result)
    }

    /// Collects the distinct subformulas of `root` in children-first
    /// order, aliasing structurally-equal duplicates to the first-seen
    /// representative.
    fn extract_subformulas(&mut self, formulas: &Formulas, root: NodeId) {
        let mut stack: Vec<(NodeId, usize)> = vec![(root, 0)];
        while let Some(&(n, i)) = stack.last() {
            if i == 0 && self.order.contains(&n) {
                stack.pop();
                continue;
            }
            if i < formulas.n_children(n) {
                stack.last_mut().expect("frame exists").1 = i + 1;
                stack.push((formulas.child(n, i), 0));
                continue;
            }
            stack.pop();

            let mut representative = n;
            for &m in &self.order {
                if formulas.equal(n, m) {
                    representative = m;
                    break;
                }
            }
            self.alias.insert(n, representative);
            if representative == n {
                self.order.push(n);
            }
        }
    }

    /// Child of a node, routed through the alias table.
    fn child_formula(&self, formulas: &Formulas, node: NodeId, index: usize) -> NodeId {
        self.alias[&formulas.child(node, index)]
    }

    fn flag(&self, state: usize, node: NodeId) -> bool {
        self.state_flags[state].get(node)
    }

    fn mark(&mut self, state: usize, node: NodeId) {
        debug!("  + state id {} satisfies node {}", state, node);
        self.state_flags[state].set(node, true);
    }

    /// Labels every state with `root` if it satisfies it, assuming all
    /// child subformulas are already labelled.
    fn label(&mut self, vars: &VarTable, model: &Model, formulas: &Formulas, root: NodeId) {
        debug!("labelling {}", formulas.render(vars, root));
        match formulas.kind(root) {
            Connective::Var(v) => {
                if !model.prop_var_used(v) && !self.pv_warn.get(v.index()) {
                    self.pv_warn.set(v.index(), true);
                    warn!("variable '{}' not used in model", vars.name(v));
                }
                for i in 0..model.n_states() {
                    if model.prop_var(model.state_name(i), v) {
                        self.mark(i, root);
                    }
                }
            }
            Connective::False => {}
            Connective::Not => {
                let c = self.child_formula(formulas, root, 0);
                for i in 0..model.n_states() {
                    if !self.flag(i, c) {
                        self.mark(i, root);
                    }
                }
            }
            Connective::And => {
                let a = self.child_formula(formulas, root, 0);
                let b = self.child_formula(formulas, root, 1);
                for i in 0..model.n_states() {
                    if self.flag(i, a) && self.flag(i, b) {
                        self.mark(i, root);
                    }
                }
            }
            Connective::ExistsNext => {
                let c = self.child_formula(formulas, root, 0);
                for i in 0..model.n_states() {
                    let name = model.state_name(i);
                    for j in (0..model.degree(name)).rev() {
                        let succ = model
                            .state_id(model.next(name, j))
                            .expect("validated transition target");
                        if self.flag(succ, c) {
                            self.mark(i, root);
                            break;
                        }
                    }
                }
            }
            Connective::AllFinally => {
                let c = self.child_formula(formulas, root, 0);
                let mut changed = true;
                while changed {
                    changed = false;
                    for i in 0..model.n_states() {
                        if self.flag(i, root) {
                            continue;
                        }
                        if self.flag(i, c) {
                            self.mark(i, root);
                            changed = true;
                            continue;
                        }
                        // Every successor already satisfies AF; a state
                        // with no successors passes vacuously.
                        let name = model.state_name(i);
                        let mut all = true;
                        for j in (0..model.degree(name)).rev() {
                            let succ = model
                                .state_id(model.next(name, j))
                                .expect("validated transition target");
                            if !self.flag(succ, root) {
                                all = false;
                                break;
                            }
                        }
                        if all {
                            self.mark(i, root);
                            changed = true;
                        }
                    }
                }
            }
            Connective::ExistsUntil => {
                let a = self.child_formula(formulas, root, 0);
                let b = self.child_formula(formulas, root, 1);
                let mut changed = true;
                while changed {
                    changed = false;
                    for i in 0..model.n_states() {
                        if self.flag(i, root) {
                            continue;
                        }
                        if self.flag(i, b) {
                            self.mark(i, root);
                            changed = true;
                            continue;
                        }
                        if !self.flag(i, a) {
                            continue;
                        }
                        let name = model.state_name(i);
                        for j in (0..model.degree(name)).rev() {
                            let succ = model
                                .state_id(model.next(name, j))
                                .expect("validated transition target");
                            if self.flag(succ, root) {
                                self.mark(i, root);
                                changed = true;
                                break;
                            }
                        }
                    }
                }
            }
            other => unreachable!("connective {:?} after CTL reduction", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelToken;
    use test_log::test;

    /// State 1 (initial, `p`) -> {1, 2}; state 2 (no vars) -> {2}.
    fn two_state_model(vars: &mut VarTable) -> Model {
        use ModelToken::*;
        let tokens = vec![
            Open,
            Initial,
            Int(1),
            Int(1),
            Int(2),
            PropVar("p".to_string()),
            Int(2),
            Int(2),
            PropVar("_".to_string()),
            Close,
        ];
        let mut m = Model::new();
        m.parse(tokens.into_iter().enumerate().map(|(i, t)| (i + 1, t)), vars)
            .unwrap();
        m
    }

    fn bits(states: &[usize]) -> BitSet {
        let mut bs = BitSet::new();
        for &s in states {
            bs.set(s, true);
        }
        bs
    }

    #[test]
    fn test_exists_next() {
        let mut vars = VarTable::new();
        let model = two_state_model(&mut vars);
        let p = vars.lookup("p").unwrap();

        let mut fs = Formulas::new();
        let vp = fs.var(p);
        let ex = fs.exists_next(vp);
        let tree = fs.tree(ex);

        let mut checker = CtlChecker::new();
        let sat = checker.check(&vars, &model, &mut fs, tree).unwrap();
        // State 1 has a successor (itself) where p holds; state 2 does not.
        assert_eq!(sat, bits(&[0]));
    }

    #[test]
    fn test_all_finally() {
        let mut vars = VarTable::new();
        let model = two_state_model(&mut vars);
        let p = vars.lookup("p").unwrap();

        let mut fs = Formulas::new();
        let vp = fs.var(p);
        let af = fs.all_finally(vp);
        let tree = fs.tree(af);

        let mut checker = CtlChecker::new();
        let sat = checker.check(&vars, &model, &mut fs, tree).unwrap();
        // p holds immediately in state 1; state 2 can never reach p.
        assert_eq!(sat, bits(&[0]));
    }

    #[test]
    fn test_all_globally_fails_everywhere() {
        let mut vars = VarTable::new();
        let model = two_state_model(&mut vars);
        let p = vars.lookup("p").unwrap();

        let mut fs = Formulas::new();
        let vp = fs.var(p);
        let ag = fs.all_globally(vp);
        let tree = fs.tree(ag);

        let mut checker = CtlChecker::new();
        let sat = checker.check(&vars, &model, &mut fs, tree).unwrap();
        // Every path from state 1 can fall into state 2 where p fails.
        assert_eq!(sat.count(true), 0);
    }

    #[test]
    fn test_exists_finally() {
        let mut vars = VarTable::new();
        let model = two_state_model(&mut vars);
        let p = vars.lookup("p").unwrap();

        let mut fs = Formulas::new();
        let vp = fs.var(p);
        let ef = fs.exists_finally(vp);
        let tree = fs.tree(ef);

        let mut checker = CtlChecker::new();
        let sat = checker.check(&vars, &model, &mut fs, tree).unwrap();
        assert_eq!(sat, bits(&[0]));
    }

    #[test]
    fn test_propositional_or() {
        let mut vars = VarTable::new();
        let model = two_state_model(&mut vars);
        let p = vars.lookup("p").unwrap();
        let q = vars.intern("q");

        let mut fs = Formulas::new();
        let vp = fs.var(p);
        let vq = fs.var(q);
        let or = fs.or(vp, vq);
        let tree = fs.tree(or);

        let mut checker = CtlChecker::new();
        // q is never set in the model: the check warns (once) and treats
        // it as false everywhere.
        let sat = checker.check(&vars, &model, &mut fs, tree).unwrap();
        assert_eq!(sat, bits(&[0]));
    }

    #[test]
    fn test_idempotent() {
        let mut vars = VarTable::new();
        let model = two_state_model(&mut vars);
        let p = vars.lookup("p").unwrap();

        let mut fs = Formulas::new();
        let vp = fs.var(p);
        let af = fs.all_finally(vp);
        let tree = fs.tree(af);

        let mut checker = CtlChecker::new();
        let first = checker.check(&vars, &model, &mut fs, tree).unwrap();
        let second = checker.check(&vars, &model, &mut fs, tree).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_rejects_ltl_formula() {
        let mut vars = VarTable::new();
        let model = two_state_model(&mut vars);
        let p = vars.lookup("p").unwrap();

        let mut fs = Formulas::new();
        let vp = fs.var(p);
        let g = fs.globally(vp);
        let tree = fs.tree(g);

        let mut checker = CtlChecker::new();
        let err = checker.check(&vars, &model, &mut fs, tree).unwrap_err();
        assert!(matches!(err, Error::FormulaClass { expected: "CTL", .. }));
    }

    #[test]
    fn test_empty_model_yields_empty_set() {
        let vars = VarTable::new();
        let model = Model::new();
        let mut fs = Formulas::new();
        let t = fs.tt();
        let tree = fs.tree(t);
        let mut checker = CtlChecker::new();
        let sat = checker.check(&vars, &model, &mut fs, tree).unwrap();
        assert_eq!(sat.count(true), 0);
    }
}
