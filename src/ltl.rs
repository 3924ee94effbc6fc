//! LTL model checking via tableau-constructed Büchi automata.
//!
//! The construction follows Gerth, Peled, Vardi & Wolper, *Simple on-the-fly
//! automatic verification of linear temporal logic*: the (negated, reduced)
//! formula is expanded into a graph of tableau nodes, each tracking the
//! obligations already recorded (`old`), still pending for the current
//! state (`new`), and deferred past the next transition (`next`). Completed
//! nodes with identical `(old, next)` pairs are merged, which keeps the
//! graph finite. The graph becomes a generalized Büchi automaton — one
//! accept set per `U`-subformula forces every until obligation to resolve —
//! which is then de-generalized, pruned, composed with the model's
//! automaton, and tested for emptiness.

use std::fmt;

use log::debug;

use crate::bitset::BitSet;
use crate::buchi::Buchi;
use crate::error::{Error, Result};
use crate::forest::{NodeId, TreeId};
use crate::formula::{Connective, Formulas, Literal};
use crate::model::Model;
use crate::ordset::OrdSet;
use crate::vars::VarTable;

/// A tableau node: predecessors plus the three obligation sets.
#[derive(Debug, Clone, Default)]
struct TableauNode {
    /// Ids of predecessor tableau nodes.
    incoming: OrdSet<usize>,
    /// Subformulas already satisfied and recorded for this state.
    old: OrdSet<NodeId>,
    /// Subformulas pending decomposition for this state.
    new: OrdSet<NodeId>,
    /// Subformulas deferred to the successor state.
    next: OrdSet<NodeId>,
}

/// Verdict of an LTL check.
#[derive(Debug)]
pub enum LtlOutcome {
    /// Every behavior of the model satisfies the formula.
    Satisfied,
    /// Some behavior violates the formula; here is one.
    CounterExample(Counterexample),
}

/// A lasso-shaped witness: a finite prefix followed by a repeating suffix.
#[derive(Debug, Clone)]
pub struct Counterexample {
    /// Labels of the witness states, in order.
    pub states: Vec<String>,
    /// Index into `states` where the repeating suffix begins, if the
    /// witness closes a cycle.
    pub cycle_start: Option<usize>,
}

impl fmt::Display for Counterexample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, label) in self.states.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            if self.cycle_start == Some(i) {
                f.write_str("{")?;
            }
            f.write_str(label)?;
        }
        if self.cycle_start.is_some() {
            f.write_str("}*")?;
        }
        Ok(())
    }
}

/// Result of comparing two formulas for language equivalence.
#[derive(Debug)]
pub struct Comparison {
    /// A behavior the first formula allows and the second forbids.
    pub first_allows: Option<Counterexample>,
    /// A behavior the second formula allows and the first forbids.
    pub second_allows: Option<Counterexample>,
}

impl Comparison {
    /// True when neither direction produced a witness.
    pub fn equivalent(&self) -> bool {
        self.first_allows.is_none() && self.second_allows.is_none()
    }
}

/// The LTL checker. Holds the tableau scratch space between calls.
#[derive(Debug, Default)]
pub struct LtlChecker {
    /// Tableau node arena, cleared per construction.
    nodes: Vec<TableauNode>,
    /// Completed nodes in completion order; position = automaton state.
    node_list: Vec<usize>,
    /// Id of the synthetic initial node.
    init_node: usize,
}

impl LtlChecker {
    /// Creates a checker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the Büchi automaton for a formula (negated first when
    /// `negate` is set) into `dest`.
    ///
    /// The formula must be LTL (or plain propositional). The tableau
    /// produces a generalized automaton; generalization removal and
    /// reachability reduction are applied before handing it back.
    pub fn construct_automaton(
        &mut self,
        formulas: &mut Formulas,
        tree: TreeId,
        negate: bool,
        dest: &mut Buchi,
    ) -> Result<()> {
        if !formulas.is_ltl(tree) {
            return Err(Error::FormulaClass {
                expected: "LTL",
                found: formulas.tree_class(tree),
            });
        }

        let work = if negate { formulas.negate(tree) } else { tree };
        formulas.reduce_ltl(work);
        debug!(
            "construct_automaton: reduced formula root {}",
            formulas.root(work)
        );

        self.create_graph(formulas, work);

        let mut general = Buchi::new();
        self.construct_buchi(formulas, work, &mut general);

        let mut plain = Buchi::new();
        general.convert_generalized(&mut plain);
        plain.reduce(dest);

        if negate {
            // The negated copy was ours; sweep its nodes.
            formulas.free_tree(work);
            formulas.collect_garbage();
        }
        Ok(())
    }

    fn new_node(&mut self) -> usize {
        self.nodes.push(TableauNode::default());
        self.nodes.len() - 1
    }

    /// Seeds the tableau with the formula root and expands it.
    fn create_graph(&mut self, formulas: &Formulas, tree: TreeId) {
        self.nodes.clear();
        self.node_list.clear();

        self.init_node = self.new_node();
        self.node_list.push(self.init_node);

        let first = self.new_node();
        self.nodes[first].incoming.insert(self.init_node);
        self.nodes[first].new.insert(formulas.root(tree));
        self.expand(formulas, first);
        debug!("create_graph: {} tableau states", self.node_list.len());
    }

    /// Expands tableau nodes until every branch has completed or died.
    ///
    /// The recursion of the paper is driven by an explicit work stack; a
    /// branching step pushes its second branch and continues with the
    /// first, which reproduces the recursive order exactly.
    fn expand(&mut self, formulas: &Formulas, start: usize) {
        let mut work = vec![start];
        while let Some(mut q) = work.pop() {
            loop {
                if self.nodes[q].new.is_empty() {
                    // A completed node: merge into an existing state with
                    // the same (old, next), if any. Position 0 of the list
                    // is the synthetic initial node — never merged into.
                    let mut merged = false;
                    for pos in 1..self.node_list.len() {
                        let t = self.node_list[pos];
                        if self.nodes[t].old == self.nodes[q].old
                            && self.nodes[t].next == self.nodes[q].next
                        {
                            let incoming = self.nodes[q].incoming.clone();
                            self.nodes[t].incoming.include(&incoming);
                            merged = true;
                            break;
                        }
                    }
                    if merged {
                        break;
                    }
                    // A new automaton state: its successor starts from the
                    // deferred obligations.
                    let succ = self.new_node();
                    self.nodes[succ].incoming.insert(q);
                    self.nodes[succ].new = self.nodes[q].next.clone();
                    self.node_list.push(q);
                    q = succ;
                    continue;
                }

                let e = self.nodes[q].new.pop().expect("new is not empty");
                if self.nodes[q].old.contains(e) {
                    continue; // already recorded; nothing to do
                }

                let lit = formulas.literal(e);
                if lit.is_literal() {
                    if lit == Literal::False {
                        break; // this branch is dead
                    }
                    // Contradiction with something already recorded?
                    let mut contradictory = false;
                    for &o in self.nodes[q].old.iter() {
                        if formulas.literal(o).code() == -lit.code() {
                            contradictory = true;
                            break;
                        }
                    }
                    if contradictory {
                        break;
                    }
                    if lit != Literal::True {
                        self.nodes[q].old.insert(e);
                    }
                    continue;
                }

                match formulas.kind(e) {
                    Connective::Until | Connective::Release | Connective::Or => {
                        let c0 = formulas.child(e, 0);
                        let c1 = formulas.child(e, 1);

                        // First branch: for U and OR require the left
                        // operand now (for R the right), and for U and R
                        // re-oblige the whole formula on the next state.
                        let n1 = self.new_node();
                        self.nodes[n1].incoming = self.nodes[q].incoming.clone();
                        self.nodes[n1].new = self.nodes[q].new.clone();
                        match formulas.kind(e) {
                            Connective::Until | Connective::Or => {
                                self.nodes[n1].new.insert(c0);
                            }
                            Connective::Release => {
                                self.nodes[n1].new.insert(c1);
                            }
                            _ => unreachable!(),
                        }
                        let mut old = self.nodes[q].old.clone();
                        old.insert(e);
                        self.nodes[n1].old = old.clone();
                        self.nodes[n1].next = self.nodes[q].next.clone();
                        if matches!(
                            formulas.kind(e),
                            Connective::Until | Connective::Release
                        ) {
                            self.nodes[n1].next.insert(e);
                        }

                        // Second branch: require the right operand now
                        // (for R both operands), unconditionally.
                        let n2 = self.new_node();
                        self.nodes[n2].incoming = self.nodes[q].incoming.clone();
                        self.nodes[n2].new = self.nodes[q].new.clone();
                        match formulas.kind(e) {
                            Connective::Until | Connective::Or => {
                                self.nodes[n2].new.insert(c1);
                            }
                            Connective::Release => {
                                self.nodes[n2].new.insert(c0);
                                self.nodes[n2].new.insert(c1);
                            }
                            _ => unreachable!(),
                        }
                        self.nodes[n2].old = old;
                        self.nodes[n2].next = self.nodes[q].next.clone();

                        work.push(n2);
                        q = n1;
                        continue;
                    }
                    Connective::And => {
                        let c0 = formulas.child(e, 0);
                        let c1 = formulas.child(e, 1);
                        let n1 = self.new_node();
                        self.nodes[n1].incoming = self.nodes[q].incoming.clone();
                        self.nodes[n1].new = self.nodes[q].new.clone();
                        self.nodes[n1].new.insert(c0);
                        self.nodes[n1].new.insert(c1);
                        let mut old = self.nodes[q].old.clone();
                        old.insert(e);
                        self.nodes[n1].old = old;
                        self.nodes[n1].next = self.nodes[q].next.clone();
                        q = n1;
                        continue;
                    }
                    Connective::Next => {
                        let c0 = formulas.child(e, 0);
                        let n1 = self.new_node();
                        self.nodes[n1].incoming = self.nodes[q].incoming.clone();
                        self.nodes[n1].new = self.nodes[q].new.clone();
                        let mut old = self.nodes[q].old.clone();
                        old.insert(e);
                        self.nodes[n1].old = old;
                        self.nodes[n1].next = self.nodes[q].next.clone();
                        self.nodes[n1].next.insert(c0);
                        q = n1;
                        continue;
                    }
                    other => unreachable!("connective {:?} in negation normal form", other),
                }
            }
        }
    }

    /// Turns the completed tableau into a generalized Büchi automaton.
    fn construct_buchi(&self, formulas: &Formulas, tree: TreeId, b: &mut Buchi) {
        b.clear();

        // Tableau id -> automaton state (position in completion order).
        let mut state_of = vec![usize::MAX; self.nodes.len()];
        for (pos, &n) in self.node_list.iter().enumerate() {
            state_of[n] = pos;
        }

        for (pos, &n) in self.node_list.iter().enumerate() {
            let s = b.add_state(pos == 0);
            for &f in self.nodes[n].old.iter() {
                match formulas.literal(f) {
                    Literal::Var(v) => b.add_prop_var(s, v, true),
                    Literal::NegVar(v) => b.add_prop_var(s, v, false),
                    _ => {}
                }
            }
        }

        for (pos, &n) in self.node_list.iter().enumerate() {
            for &src in self.nodes[n].incoming.iter() {
                b.add_transition(state_of[src], pos);
            }
        }

        // One accept set per distinct U-subformula: a state is in the set
        // unless the until is pending there with its right operand still
        // unsatisfied.
        let root = formulas.root(tree);
        for node in formulas.node_list(root) {
            if formulas.kind(node) != Connective::Until {
                continue;
            }
            let right = formulas.child(node, 1);
            let mut set = BitSet::new();
            for (pos, &n) in self.node_list.iter().enumerate() {
                let old = &self.nodes[n].old;
                if !old.contains(node) || old.contains(right) {
                    set.set(pos, true);
                }
            }
            b.add_accept_set(set);
        }
        debug!(
            "construct_buchi: {} states, {} accept sets",
            b.n_states(),
            b.n_accept_sets()
        );
    }

    /// Checks whether every behavior of `model` satisfies `tree`.
    ///
    /// Builds the automaton of the negated formula, composes it with the
    /// model's automaton, and tests the product for emptiness. A non-empty
    /// product yields a counterexample naming the model states along the
    /// offending behavior.
    pub fn check(
        &mut self,
        vars: &VarTable,
        model: &Model,
        formulas: &mut Formulas,
        tree: TreeId,
    ) -> Result<LtlOutcome> {
        let mut negated = Buchi::new();
        self.construct_automaton(formulas, tree, true, &mut negated)?;

        assert!(model.is_defined(), "checking an empty model");
        let mut model_buchi = Buchi::new();
        model_buchi.convert_kripke(model, vars);

        let mut product = Buchi::new();
        product.product(&model_buchi, &negated);
        let mut reduced = Buchi::new();
        product.reduce(&mut reduced);

        let mut seq = Vec::new();
        if reduced.non_empty(&mut seq) {
            debug!("check: counterexample found");
            Ok(LtlOutcome::CounterExample(counterexample(&reduced, &mut seq)))
        } else {
            debug!("check: satisfied");
            Ok(LtlOutcome::Satisfied)
        }
    }

    /// Compares two formulas for language equivalence by checking
    /// `f1 & !f2` and `f2 & !f1` for emptiness.
    pub fn compare(
        &mut self,
        vars: &VarTable,
        formulas: &mut Formulas,
        f1: TreeId,
        f2: TreeId,
    ) -> Result<Comparison> {
        let mut witnesses = [None, None];
        for (pass, witness) in witnesses.iter_mut().enumerate() {
            let (plain, negated) = if pass == 0 { (f1, f2) } else { (f2, f1) };

            let mut b1 = Buchi::new();
            self.construct_automaton(formulas, plain, false, &mut b1)?;
            let mut b2 = Buchi::new();
            self.construct_automaton(formulas, negated, true, &mut b2)?;

            // Witness states are described by the first automaton's
            // valuation constraints.
            b1.set_prop_var_labels(vars);

            let mut product = Buchi::new();
            product.product(&b1, &b2);
            let mut reduced = Buchi::new();
            product.reduce(&mut reduced);

            let mut seq = Vec::new();
            if reduced.non_empty(&mut seq) {
                *witness = Some(counterexample(&reduced, &mut seq));
            }
        }
        let [first_allows, second_allows] = witnesses;
        Ok(Comparison {
            first_allows,
            second_allows,
        })
    }
}

/// Finds the index where the witness starts repeating: the first state
/// equal to the final one, scanning backward from the end. On a match the
/// duplicated final entry is removed. This exact tie-break is deliberate;
/// do not swap in a shortest-cycle search.
fn repeat_point(seq: &mut Vec<usize>) -> Option<usize> {
    let &last = seq.last()?;
    for i in (0..seq.len().saturating_sub(1)).rev() {
        if seq[i] == last {
            seq.pop();
            return Some(i);
        }
    }
    None
}

/// Builds a [`Counterexample`] from an emptiness witness. The leading
/// entry is the synthetic initial state and carries no label; it is
/// dropped from the rendition.
fn counterexample(automaton: &Buchi, seq: &mut Vec<usize>) -> Counterexample {
    let repeat = repeat_point(seq);
    let mut states = Vec::new();
    let mut cycle_start = None;
    for (i, &s) in seq.iter().enumerate().skip(1) {
        if repeat == Some(i) {
            cycle_start = Some(states.len());
        }
        states.push(automaton.state_label(s).unwrap_or_default().to_string());
    }
    if repeat.is_some() && cycle_start.is_none() {
        // The repeat point was the (skipped) initial entry.
        cycle_start = Some(0);
    }
    Counterexample {
        states,
        cycle_start,
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

    #[test]
    fn test_globally_p_fails_with_lasso() {
        let mut vars = VarTable::new();
        let model = two_state_model(&mut vars);
        let p = vars.lookup("p").unwrap();

        let mut fs = Formulas::new();
        let vp = fs.var(p);
        let g = fs.globally(vp);
        let tree = fs.tree(g);

        let mut checker = LtlChecker::new();
        let outcome = checker.check(&vars, &model, &mut fs, tree).unwrap();
        let cex = match outcome {
            LtlOutcome::CounterExample(cex) => cex,
            LtlOutcome::Satisfied => panic!("G p should fail on this model"),
        };
        // The offending behavior reaches state 2 and loops there.
        let start = cex.cycle_start.expect("lasso witness");
        assert!(!cex.states.is_empty());
        assert!(cex.states[start..].iter().all(|s| s == "2"));
        assert!(cex.states.contains(&"1".to_string()));
    }

    #[test]
    fn test_finally_p_holds() {
        let mut vars = VarTable::new();
        let model = two_state_model(&mut vars);
        let p = vars.lookup("p").unwrap();

        let mut fs = Formulas::new();
        let vp = fs.var(p);
        let f = fs.finally(vp);
        let tree = fs.tree(f);

        let mut checker = LtlChecker::new();
        let outcome = checker.check(&vars, &model, &mut fs, tree).unwrap();
        assert!(matches!(outcome, LtlOutcome::Satisfied));
    }

    #[test]
    fn test_automaton_for_until_has_accept_set() {
        let mut vars = VarTable::new();
        let p = vars.intern("p");
        let q = vars.intern("q");

        let mut fs = Formulas::new();
        let vp = fs.var(p);
        let vq = fs.var(q);
        let u = fs.until(vp, vq);
        let tree = fs.tree(u);

        let mut checker = LtlChecker::new();
        let mut b = Buchi::new();
        checker
            .construct_automaton(&mut fs, tree, false, &mut b)
            .unwrap();
        assert!(!b.general());
        assert!(b.n_states() > 0);
        // p U q has behaviors, e.g. q immediately.
        let mut seq = Vec::new();
        assert!(b.non_empty(&mut seq));
    }

    #[test]
    fn test_rejects_ctl_formula() {
        let mut vars = VarTable::new();
        let p = vars.intern("p");

        let mut fs = Formulas::new();
        let vp = fs.var(p);
        let af = fs.all_finally(vp);
        let tree = fs.tree(af);

        let mut checker = LtlChecker::new();
        let mut b = Buchi::new();
        let err = checker
            .construct_automaton(&mut fs, tree, false, &mut b)
            .unwrap_err();
        assert!(matches!(err, Error::FormulaClass { expected: "LTL", .. }));
    }

    #[test]
    fn test_compare_equivalent() {
        let mut vars = VarTable::new();
        let p = vars.intern("p");

        let mut fs = Formulas::new();
        // G p versus !F !p.
        let vp1 = fs.var(p);
        let g = fs.globally(vp1);
        let t1 = fs.tree(g);

        let vp2 = fs.var(p);
        let np = fs.not(vp2);
        let fnp = fs.finally(np);
        let nfnp = fs.not(fnp);
        let t2 = fs.tree(nfnp);

        let mut checker = LtlChecker::new();
        let cmp = checker.compare(&vars, &mut fs, t1, t2).unwrap();
        assert!(cmp.equivalent());
    }

    #[test]
    fn test_compare_inequivalent() {
        let mut vars = VarTable::new();
        let p = vars.intern("p");

        let mut fs = Formulas::new();
        // G p versus F p: F p allows behaviors G p forbids.
        let vp1 = fs.var(p);
        let g = fs.globally(vp1);
        let t1 = fs.tree(g);

        let vp2 = fs.var(p);
        let f = fs.finally(vp2);
        let t2 = fs.tree(f);

        let mut checker = LtlChecker::new();
        let cmp = checker.compare(&vars, &mut fs, t1, t2).unwrap();
        assert!(!cmp.equivalent());
        // Everything G p allows also satisfies F p...
        assert!(cmp.first_allows.is_none());
        // ...but not the other way around.
        assert!(cmp.second_allows.is_some());
    }

    #[test]
    fn test_compare_weak_until_identity() {
        let mut vars = VarTable::new();
        let p = vars.intern("p");
        let q = vars.intern("q");

        let mut fs = Formulas::new();
        // p W q versus (p U q) | G p.
        let vp1 = fs.var(p);
        let vq1 = fs.var(q);
        let w = fs.weak_until(vp1, vq1);
        let t1 = fs.tree(w);

        let vp2 = fs.var(p);
        let vq2 = fs.var(q);
        let u = fs.until(vp2, vq2);
        let vp3 = fs.var(p);
        let g = fs.globally(vp3);
        let or = fs.or(u, g);
        let t2 = fs.tree(or);

        let mut checker = LtlChecker::new();
        let cmp = checker.compare(&vars, &mut fs, t1, t2).unwrap();
        assert!(cmp.equivalent());
    }

    #[test]
    fn test_counterexample_display() {
        let cex = Counterexample {
            states: vec!["1".to_string(), "2".to_string(), "2".to_string()],
            cycle_start: Some(1),
        };
        assert_eq!(cex.to_string(), "1 {2 2}*");
        let no_cycle = Counterexample {
            states: vec!["1".to_string()],
            cycle_start: None,
        };
        assert_eq!(no_cycle.to_string(), "1");
    }
}
