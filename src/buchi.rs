//! Büchi automata and their algebra.
//!
//! A [`Buchi`] is a nondeterministic automaton over infinite words whose
//! alphabet is a propositional valuation: each state carries the variables
//! that must be true (`pv_true`) or false (`pv_false`) for the state to
//! match a valuation; a variable in neither set is "don't care". One or
//! more accept sets are supported — more than one makes the automaton
//! *generalized* (a run accepts iff it visits every set infinitely often).
//!
//! The operations here are the classical constructions (see Clarke,
//! Grumberg & Peled, *Model Checking*): counting-based removal of
//! generalized acceptance, Kripke-model conversion, the three-phase
//! intersection product, nested-depth-first-search emptiness with a lasso
//! witness, and reachability reduction.

use log::debug;

use crate::bitset::BitSet;
use crate::model::Model;
use crate::ordset::OrdSet;
use crate::vars::{Var, VarTable};

#[derive(Debug, Clone, Default)]
struct State {
    /// Successor state ids; multi-edges permitted, order preserved.
    trans: Vec<usize>,
    /// Variables that must be true for this state to match.
    pv_true: BitSet,
    /// Variables that must be false for this state to match.
    pv_false: BitSet,
    /// Display label (diagnostic only).
    label: Option<String>,
}

/// A (possibly generalized) Büchi automaton.
#[derive(Debug, Clone, Default)]
pub struct Buchi {
    states: Vec<State>,
    initial: OrdSet<usize>,
    accept_sets: Vec<BitSet>,
    /// States whose merged valuation constraints are self-contradictory.
    /// Only the product construction marks these.
    contradiction: BitSet,
}

impl Buchi {
    /// Creates an empty automaton.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the automaton to its freshly-constructed state.
    pub fn clear(&mut self) {
        self.states.clear();
        self.initial.clear();
        self.accept_sets.clear();
        self.contradiction.clear();
    }

    /// Adds a state and returns its id.
    pub fn add_state(&mut self, initial: bool) -> usize {
        let id = self.states.len();
        self.states.push(State::default());
        if initial {
            self.initial.insert(id);
        }
        id
    }

    /// Adds a transition between two existing states.
    pub fn add_transition(&mut self, src: usize, dest: usize) {
        assert!(
            src < self.states.len() && dest < self.states.len(),
            "transition {} -> {} outside state range",
            src,
            dest
        );
        self.states[src].trans.push(dest);
    }

    /// Constrains a variable's value in a state's valuation.
    pub fn add_prop_var(&mut self, state: usize, var: Var, value: bool) {
        let st = &mut self.states[state];
        if value {
            st.pv_true.set(var.index(), true);
        } else {
            st.pv_false.set(var.index(), true);
        }
    }

    /// Appends an accept set (a bit per state id).
    pub fn add_accept_set(&mut self, set: BitSet) {
        self.accept_sets.push(set);
    }

    /// Number of states.
    pub fn n_states(&self) -> usize {
        self.states.len()
    }

    /// Number of accept sets.
    pub fn n_accept_sets(&self) -> usize {
        self.accept_sets.len()
    }

    /// True if the automaton has more than one accept set.
    pub fn general(&self) -> bool {
        self.accept_sets.len() > 1
    }

    /// Ids of the initial states, ascending.
    pub fn initial_states(&self) -> &OrdSet<usize> {
        &self.initial
    }

    /// True if `state` belongs to accept set `set`.
    pub fn accepting(&self, state: usize, set: usize) -> bool {
        assert!(set < self.accept_sets.len(), "no accept set {}", set);
        self.accept_sets[set].get(state)
    }

    /// True if the product construction marked this state contradictory.
    pub fn is_contradiction(&self, state: usize) -> bool {
        self.contradiction.get(state)
    }

    /// True if the state's valuation constrains `var` to `value`.
    pub fn constrains(&self, state: usize, var: Var, value: bool) -> bool {
        let st = &self.states[state];
        if value {
            st.pv_true.get(var.index())
        } else {
            st.pv_false.get(var.index())
        }
    }

    /// Successor state ids, in insertion order (multi-edges included).
    pub fn successors(&self, state: usize) -> &[usize] {
        &self.states[state].trans
    }

    /// Attaches a display label to a state.
    pub fn add_state_label(&mut self, state: usize, label: impl Into<String>) {
        self.states[state].label = Some(label.into());
    }

    /// The display label of a state, if any.
    pub fn state_label(&self, state: usize) -> Option<&str> {
        self.states[state].label.as_deref()
    }

    /// Labels every state with a rendering of its valuation constraints
    /// (`(p ^ !q)` style; `T` for unconstrained, `B` for contradictory).
    pub fn set_prop_var_labels(&mut self, vars: &VarTable) {
        for id in 0..self.states.len() {
            let mut text = String::new();
            let mut literals = 0;
            for i in 0..vars.len() {
                let t = self.states[id].pv_true.get(i);
                let f = self.states[id].pv_false.get(i);
                if t && f {
                    literals = 1;
                    text = "B".to_string();
                    break;
                }
                if t || f {
                    if literals == 1 {
                        text.insert(0, '(');
                    }
                    if literals > 0 {
                        text.push_str(" ^ ");
                    }
                    literals += 1;
                    if f {
                        text.push('!');
                    }
                    text.push_str(vars.name(Var::new(i as u32)));
                }
            }
            if literals == 0 {
                text.push('T');
                literals += 1;
            }
            if literals > 1 {
                text.push(')');
            }
            self.states[id].label = Some(text);
        }
    }

    /// Converts a generalized automaton into an ordinary one.
    ///
    /// The counting construction: with `k` accept sets the result has
    /// `k + 1` copies ("pages") of every state. While on page `x < k`, a
    /// transition into `j` advances to page `x + 1` exactly when `j` lies
    /// in accept set `x`; from the last page every transition wraps back to
    /// page 0. The single accept set of the result is the whole last page,
    /// so a run visits it infinitely often iff it visits every original
    /// accept set infinitely often. With `k = 0` this degenerates to a
    /// copy whose accept set is all states.
    pub fn convert_generalized(&self, dest: &mut Buchi) {
        dest.clear();

        let pages = self.n_accept_sets() + 1;
        let row = self.n_states();
        debug!(
            "convert_generalized: {} states, {} accept sets",
            row,
            self.n_accept_sets()
        );

        for _ in 0..pages * row {
            dest.add_state(false);
        }

        for &i in self.initial.iter() {
            dest.initial.insert(i); // page-0 copy
        }

        let mut accept = BitSet::new();
        for i in 0..row {
            accept.set(i + row * (pages - 1), true);
        }
        dest.add_accept_set(accept);

        for i in 0..row {
            for &j in &self.states[i].trans {
                for x in 0..pages {
                    let y = if x < pages - 1 && self.accept_sets[x].get(j) {
                        x + 1
                    } else if x == pages - 1 {
                        0
                    } else {
                        x
                    };
                    dest.add_transition(i + row * x, j + row * y);
                }
            }
        }

        for i in 0..row {
            for x in 0..pages {
                let copy = &mut dest.states[i + row * x];
                copy.pv_true = self.states[i].pv_true.clone();
                copy.pv_false = self.states[i].pv_false.clone();
            }
        }
    }

    /// Builds the automaton recognizing exactly the infinite behaviors of
    /// a Kripke model.
    ///
    /// State 0 is a fresh initial "root" with no valuation constraints;
    /// states `1..=n` copy the model states (valuation fully specified:
    /// every interned variable is constrained true or false). The root
    /// steps to the copies of the model's initial states, and every state
    /// is accepting.
    pub fn convert_kripke(&mut self, model: &Model, vars: &VarTable) {
        debug_assert!(
            !model.initial_states().is_empty() || !model.is_defined(),
            "converting a model with no initial states"
        );
        self.clear();

        self.add_state(true);
        for i in 0..model.n_states() {
            let id = self.add_state(false);
            self.add_state_label(id, model.state_name(i).to_string());
        }

        for i in 0..model.n_states() {
            let id = i + 1;
            let name = model.state_name(i);
            for j in 0..vars.len() {
                let var = Var::new(j as u32);
                self.add_prop_var(id, var, model.prop_var(name, var));
            }
            for j in 0..model.degree(name) {
                let dest = model.next(name, j);
                let dest_id = model.state_id(dest).expect("validated transition target");
                self.add_transition(id, 1 + dest_id);
            }
        }

        for &name in model.initial_states().iter() {
            let id = model.state_id(name).expect("initial state exists");
            self.add_transition(0, 1 + id);
        }

        let mut accept = BitSet::new();
        for i in 0..self.n_states() {
            accept.set(i, true);
        }
        self.add_accept_set(accept);
    }

    /// Builds the intersection product of two non-generalized automata.
    ///
    /// States are triples `(s1, s2, phase)` with phase in `{0, 1, 2}`, laid
    /// out `s1 + |Q1|*s2 + |Q1|*|Q2|*phase`. A transition advances phase
    /// 0 to 1 when the `b1` target is accepting, 1 to 2 when the `b2`
    /// target is accepting, and always returns 2 to 0; the accept set is
    /// "phase == 2", which a run reaches infinitely often iff both
    /// components accept. Valuation constraints of a pair are OR-merged;
    /// a pair asserting some variable both true and false is marked
    /// contradictory and excluded from all transition construction.
    /// Labels are copied from `b1`.
    ///
    /// # Panics
    ///
    /// Panics if either operand is generalized.
    pub fn product(&mut self, b1: &Buchi, b2: &Buchi) {
        assert!(
            !b1.general() && !b2.general(),
            "product operands must not be generalized"
        );
        self.clear();

        let q1 = b1.n_states();
        let q2 = b2.n_states();
        let row = q1;
        let page = q1 * q2;
        debug!("product: {} x {} states", q1, q2);

        for id in 0..q1 * q2 * 3 {
            self.add_state(false);
            if let Some(label) = b1.state_label(id % q1) {
                self.add_state_label(id, label.to_string());
            }
        }

        // Merge valuation constraints per (s1, s2) pair and flag
        // contradictions; the three phase copies agree.
        for i in 0..q1 {
            for j in 0..q2 {
                let pair = i + row * j;
                let mut pv_true = b1.states[i].pv_true.clone();
                let mut pv_false = b1.states[i].pv_false.clone();
                pv_true.or_with(&b2.states[j].pv_true);
                pv_false.or_with(&b2.states[j].pv_false);

                let mut test = pv_true.clone();
                test.and_with(&pv_false);
                let contradictory = test.count(true) != 0;
                if contradictory {
                    debug!("product: pair ({}, {}) is contradictory", i, j);
                }

                for phase in 0..3 {
                    let id = pair + phase * page;
                    self.states[id].pv_true = pv_true.clone();
                    self.states[id].pv_false = pv_false.clone();
                    if contradictory {
                        self.contradiction.set(id, true);
                    }
                }
            }
        }

        for &i1 in b1.initial.iter() {
            for &j1 in b2.initial.iter() {
                self.initial.insert(i1 + j1 * row);
            }
        }

        let mut accept = BitSet::new();
        for i in 0..q1 {
            for j in 0..q2 {
                accept.set(i + j * row + 2 * page, true);
            }
        }
        self.add_accept_set(accept);

        for ri in 0..q1 {
            for &rm in &b1.states[ri].trans {
                for qj in 0..q2 {
                    for &qn in &b2.states[qj].trans {
                        let src_pair = ri + qj * row;
                        let dest_pair = rm + qn * row;
                        if self.contradiction.get(dest_pair) || self.contradiction.get(src_pair) {
                            continue;
                        }
                        for x in 0..3 {
                            let y = match x {
                                0 if b1.accepting(rm, 0) => 1,
                                1 if b2.accepting(qn, 0) => 2,
                                2 => 0,
                                _ => x,
                            };
                            self.add_transition(src_pair + x * page, dest_pair + y * page);
                        }
                    }
                }
            }
        }
    }

    /// Tests the automaton's language for non-emptiness.
    ///
    /// Runs the nested depth-first search: the outer search explores from
    /// each initial state; when it finishes an accepting state, the inner
    /// search hunts for a path back to any state still on the outer stack.
    /// On success, `seq` receives the witness — the outer path followed by
    /// the cycle-closing inner path (a lasso) — and the result is true.
    pub fn non_empty(&self, seq: &mut Vec<usize>) -> bool {
        seq.clear();
        let mut search = Search {
            buchi: self,
            hashed: BitSet::new(),
            flagged: BitSet::new(),
            stacked: BitSet::new(),
            stack1: Vec::new(),
            stack2: Vec::new(),
        };

        let mut found = false;
        for &q0 in self.initial.iter() {
            if self.is_contradiction(q0) {
                continue;
            }
            if search.dfs1(q0) {
                found = true;
                break;
            }
        }

        if found {
            seq.extend_from_slice(&search.stack1);
            seq.extend_from_slice(&search.stack2[1..]);
            debug!("non_empty: witness {:?}", seq);
        }
        found
    }

    /// Copies the automaton into `dest`, keeping only states reachable
    /// from an initial state (contradiction-marked states are neither
    /// traversed nor kept), densely renumbered. Transitions into dropped
    /// states are discarded; accept sets and initial states are remapped.
    pub fn reduce(&self, dest: &mut Buchi) {
        dest.clear();

        let mut flagged = BitSet::new();
        let mut stack: Vec<usize> = self.initial.iter().copied().collect();
        while let Some(s) = stack.pop() {
            if flagged.get(s) || self.is_contradiction(s) {
                continue;
            }
            flagged.set(s, true);
            for &d in &self.states[s].trans {
                stack.push(d);
            }
        }

        let mut new_id = vec![0usize; self.n_states()];
        let mut next = 0;
        for (i, slot) in new_id.iter_mut().enumerate() {
            *slot = next;
            if flagged.get(i) {
                next += 1;
            }
        }
        debug!("reduce: {} of {} states reachable", next, self.n_states());

        for i in 0..self.n_states() {
            if !flagged.get(i) {
                continue;
            }
            let mut state = self.states[i].clone();
            state.trans = state
                .trans
                .iter()
                .filter(|&&d| flagged.get(d))
                .map(|&d| new_id[d])
                .collect();
            dest.states.push(state);
        }

        for &i in self.initial.iter() {
            if flagged.get(i) {
                dest.initial.insert(new_id[i]);
            }
        }

        for src in &self.accept_sets {
            let mut set = BitSet::new();
            for i in 0..self.n_states() {
                if flagged.get(i) && src.get(i) {
                    set.set(new_id[i], true);
                }
            }
            dest.accept_sets.push(set);
        }
    }

    fn render(&self, vars: Option<&VarTable>) -> String {
        let mut out = String::new();
        for (i, st) in self.states.iter().enumerate() {
            let marker = if self.initial.contains(i) { '>' } else { ' ' };
            let mut constraints = String::new();
            let max_var = st.pv_true.len().max(st.pv_false.len());
            let mut printed = false;
            for j in 0..max_var {
                let t = st.pv_true.get(j);
                let f = st.pv_false.get(j);
                if !(t || f) {
                    continue;
                }
                if printed {
                    constraints.push(',');
                }
                printed = true;
                if t && f {
                    constraints.push('*');
                } else if f {
                    constraints.push('!');
                }
                match vars {
                    Some(v) => constraints.push_str(v.name(Var::new(j as u32))),
                    // Letters instead of digits, to keep variables apart
                    // from state ids.
                    None => constraints.push(if j < 26 {
                        (b'a' + j as u8) as char
                    } else {
                        '?'
                    }),
                }
            }
            let mut line = format!("{}{:>3}: {:<20}", marker, i, constraints);
            for &t in &st.trans {
                line.push_str(&format!("{} ", t));
            }
            if let Some(label) = &st.label {
                while line.len() < 40 {
                    line.push(' ');
                }
                line.push_str(label);
            }
            out.push_str(line.trim_end());
            out.push('\n');
        }
        for (i, set) in self.accept_sets.iter().enumerate() {
            if i == 0 {
                out.push_str(" --- accept sets ---\n");
            }
            out.push_str(" (");
            let mut first = true;
            for j in set.ones() {
                if !first {
                    out.push(' ');
                }
                first = false;
                out.push_str(&j.to_string());
            }
            out.push_str(")\n");
        }
        out
    }

    /// Renders the automaton with variable names from a table.
    pub fn render_with(&self, vars: &VarTable) -> String {
        self.render(Some(vars))
    }
}

/// Nested-DFS state. The recursion of the textbook algorithm is driven by
/// explicit frame stacks so the search depth never touches the call stack.
struct Search<'a> {
    buchi: &'a Buchi,
    /// Visited by the outer search.
    hashed: BitSet,
    /// Visited by the inner search.
    flagged: BitSet,
    /// On the outer path stack right now.
    stacked: BitSet,
    /// Outer path.
    stack1: Vec<usize>,
    /// Inner (cycle-closing) path.
    stack2: Vec<usize>,
}

impl Search<'_> {
    /// Outer search from `q0`. On success the outer stack holds the path
    /// to the accepting state and the inner stack holds the cycle.
    fn dfs1(&mut self, q0: usize) -> bool {
        // (state, next successor index) frames.
        let mut frames: Vec<(usize, usize)> = Vec::new();
        self.stacked.set(q0, true);
        self.stack1.push(q0);
        self.hashed.set(q0, true);
        frames.push((q0, 0));

        while let Some(&(q, resume)) = frames.last() {
            // Scan successors in order for the next unvisited one.
            let mut idx = resume;
            let mut child = None;
            while idx < self.buchi.states[q].trans.len() {
                let q2 = self.buchi.states[q].trans[idx];
                idx += 1;
                if !self.hashed.get(q2) {
                    child = Some(q2);
                    break;
                }
            }
            frames.last_mut().expect("frame exists").1 = idx;

            if let Some(q2) = child {
                self.stacked.set(q2, true);
                self.stack1.push(q2);
                self.hashed.set(q2, true);
                frames.push((q2, 0));
                continue;
            }
            // All successors explored without success.
            if self.buchi.accepting(q, 0) && self.dfs2(q) {
                return true;
            }
            frames.pop();
            self.stack1.pop();
            self.stacked.set(q, false);
        }
        false
    }

    /// Inner search: looks for a way back onto the outer stack.
    fn dfs2(&mut self, q0: usize) -> bool {
        enum Step {
            Descend(usize),
            CloseCycle(usize),
        }

        let mut frames: Vec<(usize, usize)> = Vec::new();
        self.stack2.push(q0);
        self.flagged.set(q0, true);
        frames.push((q0, 0));

        while let Some(&(q, resume)) = frames.last() {
            let mut idx = resume;
            let mut step = None;
            while idx < self.buchi.states[q].trans.len() {
                let q2 = self.buchi.states[q].trans[idx];
                idx += 1;
                if self.stacked.get(q2) {
                    step = Some(Step::CloseCycle(q2));
                    break;
                }
                if !self.flagged.get(q2) {
                    step = Some(Step::Descend(q2));
                    break;
                }
            }
            frames.last_mut().expect("frame exists").1 = idx;

            match step {
                Some(Step::CloseCycle(q2)) => {
                    self.stack2.push(q2);
                    return true;
                }
                Some(Step::Descend(q2)) => {
                    self.stack2.push(q2);
                    self.flagged.set(q2, true);
                    frames.push((q2, 0));
                }
                None => {
                    frames.pop();
                    self.stack2.pop();
                }
            }
        }
        false
    }
}

/// Renders states, valuation constraints (letter-coded variables),
/// transitions, and accept sets.
impl std::fmt::Display for Buchi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render(None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelToken;
    use test_log::test;

    fn var(i: u32) -> Var {
        Var::new(i)
    }

    /// 0 (initial) -> 1, 1 -> 1, accept {1}.
    fn lasso_automaton() -> Buchi {
        let mut b = Buchi::new();
        b.add_state(true);
        b.add_state(false);
        b.add_transition(0, 1);
        b.add_transition(1, 1);
        let mut accept = BitSet::new();
        accept.set(1, true);
        b.add_accept_set(accept);
        b
    }

    #[test]
    fn test_non_empty_lasso_witness() {
        let b = lasso_automaton();
        let mut seq = Vec::new();
        assert!(b.non_empty(&mut seq));
        // The witness must exhibit the self-loop on state 1.
        assert!(seq.iter().filter(|&&s| s == 1).count() >= 2);
        assert_eq!(seq[0], 0);
    }

    #[test]
    fn test_empty_when_no_accepting_cycle() {
        let mut b = Buchi::new();
        b.add_state(true);
        b.add_state(false);
        b.add_transition(0, 1);
        // 1 has no successors; no cycle exists at all.
        let mut accept = BitSet::new();
        accept.set(1, true);
        b.add_accept_set(accept);
        let mut seq = Vec::new();
        assert!(!b.non_empty(&mut seq));
        assert!(seq.is_empty());
    }

    #[test]
    fn test_cycle_without_accepting_state_is_empty() {
        let mut b = Buchi::new();
        b.add_state(true);
        b.add_state(false);
        b.add_transition(0, 1);
        b.add_transition(1, 0);
        let mut accept = BitSet::new();
        accept.grow_to(2);
        b.add_accept_set(accept);
        let mut seq = Vec::new();
        assert!(!b.non_empty(&mut seq));
    }

    #[test]
    fn test_convert_generalized_preserves_acceptance() {
        // Two states cycling 0 -> 1 -> 0; accept set 0 is {0}, accept set 1
        // is {1}. The cycle visits both sets infinitely often, so the
        // converted automaton must be non-empty.
        let mut g = Buchi::new();
        g.add_state(true);
        g.add_state(false);
        g.add_transition(0, 1);
        g.add_transition(1, 0);
        let mut a0 = BitSet::new();
        a0.set(0, true);
        let mut a1 = BitSet::new();
        a1.set(1, true);
        g.add_accept_set(a0);
        g.add_accept_set(a1);
        assert!(g.general());

        let mut b = Buchi::new();
        g.convert_generalized(&mut b);
        assert!(!b.general());
        assert_eq!(b.n_states(), 2 * 3);
        let mut seq = Vec::new();
        assert!(b.non_empty(&mut seq));
    }

    #[test]
    fn test_convert_generalized_starving_set_is_empty() {
        // Self-loop on state 0 only; accept set 1 = {1} is never visited.
        let mut g = Buchi::new();
        g.add_state(true);
        g.add_state(false);
        g.add_transition(0, 0);
        let mut a0 = BitSet::new();
        a0.set(0, true);
        let mut a1 = BitSet::new();
        a1.set(1, true);
        g.add_accept_set(a0);
        g.add_accept_set(a1);

        let mut b = Buchi::new();
        g.convert_generalized(&mut b);
        let mut seq = Vec::new();
        assert!(!b.non_empty(&mut seq));
    }

    #[test]
    fn test_product_contradiction_pruning() {
        // Two single-state self-loops with opposite demands on variable 0.
        let mut b1 = Buchi::new();
        b1.add_state(true);
        b1.add_transition(0, 0);
        b1.add_prop_var(0, var(0), true);
        let mut a = BitSet::new();
        a.set(0, true);
        b1.add_accept_set(a.clone());

        let mut b2 = Buchi::new();
        b2.add_state(true);
        b2.add_transition(0, 0);
        b2.add_prop_var(0, var(0), false);
        b2.add_accept_set(a);

        let mut p = Buchi::new();
        p.product(&b1, &b2);
        assert_eq!(p.n_states(), 3);
        assert!(p.is_contradiction(0));
        let mut seq = Vec::new();
        assert!(!p.non_empty(&mut seq));
    }

    #[test]
    fn test_product_of_compatible_loops() {
        // Same demand on both sides: the product must stay non-empty and
        // cycle through all three phases.
        let mut b1 = Buchi::new();
        b1.add_state(true);
        b1.add_transition(0, 0);
        b1.add_prop_var(0, var(0), true);
        let mut a = BitSet::new();
        a.set(0, true);
        b1.add_accept_set(a.clone());

        let mut b2 = Buchi::new();
        b2.add_state(true);
        b2.add_transition(0, 0);
        b2.add_prop_var(0, var(0), true);
        b2.add_accept_set(a);

        let mut p = Buchi::new();
        p.product(&b1, &b2);
        assert!(!p.is_contradiction(0));
        let mut seq = Vec::new();
        assert!(p.non_empty(&mut seq));
        // The merged state demands variable 0 true and nothing false.
        assert!(p.states[0].pv_true.get(0));
        assert_eq!(p.states[0].pv_false.count(true), 0);
    }

    #[test]
    fn test_reduce_drops_unreachable() {
        let mut b = Buchi::new();
        b.add_state(true);
        b.add_state(false);
        b.add_state(false); // unreachable
        b.add_transition(0, 1);
        b.add_transition(1, 1);
        b.add_transition(2, 0);
        let mut accept = BitSet::new();
        accept.set(1, true);
        accept.set(2, true);
        b.add_accept_set(accept);

        let mut r = Buchi::new();
        b.reduce(&mut r);
        assert!(r.n_states() <= b.n_states());
        assert_eq!(r.n_states(), 2);
        assert!(r.accepting(1, 0));
        assert!(!r.accepting(0, 0));
        let initial: Vec<_> = r.initial_states().iter().copied().collect();
        assert_eq!(initial, vec![0]);
        // Language unchanged: still non-empty.
        let mut seq = Vec::new();
        assert!(r.non_empty(&mut seq));
    }

    #[test]
    fn test_reduce_skips_contradictions() {
        let mut b1 = Buchi::new();
        b1.add_state(true);
        b1.add_transition(0, 0);
        b1.add_prop_var(0, var(0), true);
        let mut a = BitSet::new();
        a.set(0, true);
        b1.add_accept_set(a.clone());

        let mut b2 = Buchi::new();
        b2.add_state(true);
        b2.add_transition(0, 0);
        b2.add_prop_var(0, var(0), false);
        b2.add_accept_set(a);

        let mut p = Buchi::new();
        p.product(&b1, &b2);
        let mut r = Buchi::new();
        p.reduce(&mut r);
        assert_eq!(r.n_states(), 0);
    }

    #[test]
    fn test_convert_kripke_shape() {
        let mut vars = VarTable::new();
        let mut m = Model::new();
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
        m.parse(
            tokens.into_iter().enumerate().map(|(i, t)| (i + 1, t)),
            &mut vars,
        )
        .unwrap();

        let mut b = Buchi::new();
        b.convert_kripke(&m, &vars);
        assert_eq!(b.n_states(), 3);
        assert!(!b.general());
        // Every state accepting.
        for i in 0..3 {
            assert!(b.accepting(i, 0));
        }
        // Root steps to the copy of state 1 only.
        assert_eq!(b.states[0].trans, vec![1]);
        // Valuations fully specified.
        let p = vars.lookup("p").unwrap();
        assert!(b.states[1].pv_true.get(p.index()));
        assert!(b.states[2].pv_false.get(p.index()));
        assert_eq!(b.state_label(1), Some("1"));
        assert_eq!(b.state_label(2), Some("2"));
        // The model automaton has behaviors.
        let mut seq = Vec::new();
        assert!(b.non_empty(&mut seq));
    }

    #[test]
    fn test_display_mentions_constraints() {
        let mut b = Buchi::new();
        b.add_state(true);
        b.add_prop_var(0, var(0), true);
        b.add_prop_var(0, var(1), false);
        let text = b.to_string();
        assert!(text.contains('a'));
        assert!(text.contains("!b"));
        assert!(text.starts_with('>'));
    }
}
