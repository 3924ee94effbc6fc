//! Temporal-logic formulas over a shared node arena.
//!
//! Formulas are DAGs of [`Connective`] nodes stored in a [`Forest`]. The
//! checkers consume formulas through this module: class tests (is the
//! formula plain CTL, plain LTL, or CTL*), literal classification, negation,
//! and reduction to the minimal connective set each checker works with.
//!
//! Reduction targets:
//! - CTL: `{false, !, &, AF, E[· U ·], EX}` plus variables, using the
//!   standard adequate-set identities (e.g. `AG a = !E[true U !a]`,
//!   `A[a U b] = AF b & !E[!b U (!a & !b)]`).
//! - LTL: negation normal form over `{literals, &, |, U, R, X}`, with
//!   `F a = true U a`, `G a = false R a`, `a W b = b R (a | b)`.
//!
//! There is no text parser here; formulas are built programmatically and a
//! parser is expected to sit in front of these builders.

use std::collections::HashMap;
use std::fmt;

use crate::forest::{Forest, NodeId, TreeId};
use crate::vars::{Var, VarTable};

/// The connective (or atom) stored at a formula node.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Connective {
    /// Constant true.
    True,
    /// Constant false.
    False,
    /// Propositional variable.
    Var(Var),
    /// Negation (1 child).
    Not,
    /// Conjunction (2 children).
    And,
    /// Disjunction (2 children).
    Or,
    /// Implication (2 children).
    Implies,
    /// LTL next, `X a`.
    Next,
    /// LTL until, `a U b`.
    Until,
    /// LTL release, `a R b`.
    Release,
    /// LTL weak until, `a W b`.
    WeakUntil,
    /// LTL eventually, `F a`.
    Finally,
    /// LTL always, `G a`.
    Globally,
    /// CTL `A[a U b]`.
    AllUntil,
    /// CTL `E[a U b]`.
    ExistsUntil,
    /// CTL `AG a`.
    AllGlobally,
    /// CTL `EG a`.
    ExistsGlobally,
    /// CTL `AF a`.
    AllFinally,
    /// CTL `EF a`.
    ExistsFinally,
    /// CTL `AX a`.
    AllNext,
    /// CTL `EX a`.
    ExistsNext,
}

impl Connective {
    fn is_ltl_only(self) -> bool {
        matches!(
            self,
            Connective::Next
                | Connective::Until
                | Connective::Release
                | Connective::WeakUntil
                | Connective::Finally
                | Connective::Globally
        )
    }

    fn is_ctl_only(self) -> bool {
        matches!(
            self,
            Connective::AllUntil
                | Connective::ExistsUntil
                | Connective::AllGlobally
                | Connective::ExistsGlobally
                | Connective::AllFinally
                | Connective::ExistsFinally
                | Connective::AllNext
                | Connective::ExistsNext
        )
    }
}

/// The logic fragment a formula belongs to, judged by the connectives it
/// uses. `Simple` formulas (no temporal operators at all) are both valid
/// CTL and valid LTL.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FormulaClass {
    /// Pure propositional logic.
    Simple,
    /// Uses LTL-only connectives.
    Ltl,
    /// Uses CTL-only connectives.
    Ctl,
    /// Mixes both; neither checker accepts it.
    CtlStar,
}

impl fmt::Display for FormulaClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FormulaClass::Simple => "propositional",
            FormulaClass::Ltl => "LTL",
            FormulaClass::Ctl => "CTL",
            FormulaClass::CtlStar => "CTL*",
        };
        f.write_str(name)
    }
}

/// Classification of a formula node as a literal.
///
/// The signed integer `code` derived from this classification is the
/// contract the CTL checker, the LTL tableau, and the product construction
/// all rely on to compare literals and negate them without walking the
/// node tree: `1` is true, `-1` is false, `2 + n` is variable `n`,
/// `-(2 + n)` its negation, and `0` means "not a literal". Negating a
/// literal negates its code.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Literal {
    /// The constant true (or a negated false).
    True,
    /// The constant false (or a negated true).
    False,
    /// A plain propositional variable.
    Var(Var),
    /// A negated propositional variable.
    NegVar(Var),
    /// Anything compound.
    NotALiteral,
}

impl Literal {
    /// Returns the signed-integer code described above.
    pub fn code(self) -> i64 {
        match self {
            Literal::True => 1,
            Literal::False => -1,
            Literal::Var(v) => 2 + v.index() as i64,
            Literal::NegVar(v) => -(2 + v.index() as i64),
            Literal::NotALiteral => 0,
        }
    }

    /// Returns the negated literal. `NotALiteral` stays as it is.
    pub fn negated(self) -> Literal {
        match self {
            Literal::True => Literal::False,
            Literal::False => Literal::True,
            Literal::Var(v) => Literal::NegVar(v),
            Literal::NegVar(v) => Literal::Var(v),
            Literal::NotALiteral => Literal::NotALiteral,
        }
    }

    /// Returns true for everything except `NotALiteral`.
    pub fn is_literal(self) -> bool {
        self != Literal::NotALiteral
    }
}

/// The formula store: a [`Forest`] of [`Connective`] nodes plus the
/// operations the checkers need.
#[derive(Debug, Clone, Default)]
pub struct Formulas {
    forest: Forest<Connective>,
}

impl Formulas {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // -- builders ----------------------------------------------------------

    /// Constant true.
    pub fn tt(&mut self) -> NodeId {
        self.forest.new_node(Connective::True, vec![])
    }

    /// Constant false.
    pub fn ff(&mut self) -> NodeId {
        self.forest.new_node(Connective::False, vec![])
    }

    /// Propositional variable.
    pub fn var(&mut self, v: Var) -> NodeId {
        self.forest.new_node(Connective::Var(v), vec![])
    }

    /// Negation `!a`.
    pub fn not(&mut self, a: NodeId) -> NodeId {
        self.forest.new_node(Connective::Not, vec![a])
    }

    /// Conjunction `a & b`.
    pub fn and(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.forest.new_node(Connective::And, vec![a, b])
    }

    /// Disjunction `a | b`.
    pub fn or(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.forest.new_node(Connective::Or, vec![a, b])
    }

    /// Implication `a -> b`.
    pub fn implies(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.forest.new_node(Connective::Implies, vec![a, b])
    }

    /// LTL `X a`.
    pub fn next(&mut self, a: NodeId) -> NodeId {
        self.forest.new_node(Connective::Next, vec![a])
    }

    /// LTL `a U b`.
    pub fn until(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.forest.new_node(Connective::Until, vec![a, b])
    }

    /// LTL `a R b`.
    pub fn release(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.forest.new_node(Connective::Release, vec![a, b])
    }

    /// LTL `a W b`.
    pub fn weak_until(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.forest.new_node(Connective::WeakUntil, vec![a, b])
    }

    /// LTL `F a`.
    pub fn finally(&mut self, a: NodeId) -> NodeId {
        self.forest.new_node(Connective::Finally, vec![a])
    }

    /// LTL `G a`.
    pub fn globally(&mut self, a: NodeId) -> NodeId {
        self.forest.new_node(Connective::Globally, vec![a])
    }

    /// CTL `A[a U b]`.
    pub fn all_until(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.forest.new_node(Connective::AllUntil, vec![a, b])
    }

    /// CTL `E[a U b]`.
    pub fn exists_until(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.forest.new_node(Connective::ExistsUntil, vec![a, b])
    }

    /// CTL `AG a`.
    pub fn all_globally(&mut self, a: NodeId) -> NodeId {
        self.forest.new_node(Connective::AllGlobally, vec![a])
    }

    /// CTL `EG a`.
    pub fn exists_globally(&mut self, a: NodeId) -> NodeId {
        self.forest.new_node(Connective::ExistsGlobally, vec![a])
    }

    /// CTL `AF a`.
    pub fn all_finally(&mut self, a: NodeId) -> NodeId {
        self.forest.new_node(Connective::AllFinally, vec![a])
    }

    /// CTL `EF a`.
    pub fn exists_finally(&mut self, a: NodeId) -> NodeId {
        self.forest.new_node(Connective::ExistsFinally, vec![a])
    }

    /// CTL `AX a`.
    pub fn all_next(&mut self, a: NodeId) -> NodeId {
        self.forest.new_node(Connective::AllNext, vec![a])
    }

    /// CTL `EX a`.
    pub fn exists_next(&mut self, a: NodeId) -> NodeId {
        self.forest.new_node(Connective::ExistsNext, vec![a])
    }

    // -- trees -------------------------------------------------------------

    /// Registers `root` as a tree and returns its handle.
    pub fn tree(&mut self, root: NodeId) -> TreeId {
        self.forest.new_tree(root)
    }

    /// Root node of a tree.
    pub fn root(&self, tree: TreeId) -> NodeId {
        self.forest.root(tree)
    }

    /// Drops a tree handle.
    pub fn free_tree(&mut self, tree: TreeId) {
        self.forest.free_tree(tree)
    }

    /// Sweeps arena slots unreachable from any surviving tree.
    pub fn collect_garbage(&mut self) {
        self.forest.collect_garbage()
    }

    /// Number of live formula nodes (diagnostic).
    pub fn live_nodes(&self) -> usize {
        self.forest.live_nodes()
    }

    // -- structure ---------------------------------------------------------

    /// Connective stored at a node.
    pub fn kind(&self, node: NodeId) -> Connective {
        *self.forest.value(node)
    }

    /// Number of children of a node.
    pub fn n_children(&self, node: NodeId) -> usize {
        self.forest.n_children(node)
    }

    /// Child `index` of a node.
    pub fn child(&self, node: NodeId, index: usize) -> NodeId {
        self.forest.child(node, index)
    }

    /// All nodes reachable from `root`, ascending by id.
    pub fn node_list(&self, root: NodeId) -> Vec<NodeId> {
        self.forest.node_list(root)
    }

    /// Structural equality of two formulas (same connectives, same
    /// variables, same shape).
    pub fn equal(&self, a: NodeId, b: NodeId) -> bool {
        let mut stack = vec![(a, b)];
        while let Some((a, b)) = stack.pop() {
            if self.kind(a) != self.kind(b) {
                return false;
            }
            for i in 0..self.n_children(a) {
                stack.push((self.child(a, i), self.child(b, i)));
            }
        }
        true
    }

    /// Classifies a node as a literal. At most one leading negation is
    /// stripped; `!!a` is not a literal.
    pub fn literal(&self, node: NodeId) -> Literal {
        let (node, negated) = if self.kind(node) == Connective::Not {
            (self.child(node, 0), true)
        } else {
            (node, false)
        };
        let lit = match self.kind(node) {
            Connective::True => Literal::True,
            Connective::False => Literal::False,
            Connective::Var(v) => Literal::Var(v),
            _ => Literal::NotALiteral,
        };
        if negated {
            lit.negated()
        } else {
            lit
        }
    }

    // -- classification ----------------------------------------------------

    /// Determines the logic fragment of the formula rooted at `root`.
    pub fn class(&self, root: NodeId) -> FormulaClass {
        let mut ltl = false;
        let mut ctl = false;
        for node in self.node_list(root) {
            let kind = self.kind(node);
            ltl |= kind.is_ltl_only();
            ctl |= kind.is_ctl_only();
        }
        match (ltl, ctl) {
            (false, false) => FormulaClass::Simple,
            (true, false) => FormulaClass::Ltl,
            (false, true) => FormulaClass::Ctl,
            (true, true) => FormulaClass::CtlStar,
        }
    }

    /// Class of the formula stored in a tree.
    pub fn tree_class(&self, tree: TreeId) -> FormulaClass {
        self.class(self.root(tree))
    }

    /// True if the CTL checker accepts this tree.
    pub fn is_ctl(&self, tree: TreeId) -> bool {
        matches!(
            self.tree_class(tree),
            FormulaClass::Ctl | FormulaClass::Simple
        )
    }

    /// True if the LTL checker accepts this tree.
    pub fn is_ltl(&self, tree: TreeId) -> bool {
        matches!(
            self.tree_class(tree),
            FormulaClass::Ltl | FormulaClass::Simple
        )
    }

    // -- negation and reduction --------------------------------------------

    /// Builds the negation of a tree as a new tree. The original tree is
    /// left untouched (the new root shares its nodes).
    pub fn negate(&mut self, tree: TreeId) -> TreeId {
        let root = self.root(tree);
        let negated = self.not(root);
        self.tree(negated)
    }

    /// Negation with double-negation collapse.
    fn mk_not(&mut self, a: NodeId) -> NodeId {
        if self.kind(a) == Connective::Not {
            self.child(a, 0)
        } else {
            self.not(a)
        }
    }

    /// Reduces a tree to the minimal CTL connective set
    /// `{false, !, &, AF, EU, EX}` plus variables, then shares duplicate
    /// subformulas.
    pub fn reduce_ctl(&mut self, tree: TreeId) {
        let root = self.root(tree);
        let reduced = self.rewrite_ctl(root);
        self.forest.set_root(tree, reduced);
        self.to_dag(tree);
    }

    fn rewrite_ctl(&mut self, n: NodeId) -> NodeId {
        use Connective::*;
        match self.kind(n) {
            Var(_) | False => n,
            True => {
                let bot = self.ff();
                self.not(bot)
            }
            Not => {
                let c = self.child(n, 0);
                let a = self.rewrite_ctl(c);
                self.mk_not(a)
            }
            And => {
                let (c0, c1) = (self.child(n, 0), self.child(n, 1));
                let a = self.rewrite_ctl(c0);
                let b = self.rewrite_ctl(c1);
                self.and(a, b)
            }
            Or => {
                // a | b = !(!a & !b)
                let (c0, c1) = (self.child(n, 0), self.child(n, 1));
                let a = self.rewrite_ctl(c0);
                let b = self.rewrite_ctl(c1);
                let na = self.mk_not(a);
                let nb = self.mk_not(b);
                let both = self.and(na, nb);
                self.mk_not(both)
            }
            Implies => {
                // a -> b = !(a & !b)
                let (c0, c1) = (self.child(n, 0), self.child(n, 1));
                let a = self.rewrite_ctl(c0);
                let b = self.rewrite_ctl(c1);
                let nb = self.mk_not(b);
                let body = self.and(a, nb);
                self.mk_not(body)
            }
            ExistsNext => {
                let c = self.child(n, 0);
                let a = self.rewrite_ctl(c);
                self.exists_next(a)
            }
            AllFinally => {
                let c = self.child(n, 0);
                let a = self.rewrite_ctl(c);
                self.all_finally(a)
            }
            ExistsUntil => {
                let (c0, c1) = (self.child(n, 0), self.child(n, 1));
                let a = self.rewrite_ctl(c0);
                let b = self.rewrite_ctl(c1);
                self.exists_until(a, b)
            }
            AllNext => {
                // AX a = !EX !a
                let c = self.child(n, 0);
                let a = self.rewrite_ctl(c);
                let na = self.mk_not(a);
                let ex = self.exists_next(na);
                self.mk_not(ex)
            }
            ExistsFinally => {
                // EF a = E[true U a]
                let c = self.child(n, 0);
                let a = self.rewrite_ctl(c);
                let bot = self.ff();
                let top = self.not(bot);
                self.exists_until(top, a)
            }
            AllGlobally => {
                // AG a = !E[true U !a]
                let c = self.child(n, 0);
                let a = self.rewrite_ctl(c);
                let na = self.mk_not(a);
                let bot = self.ff();
                let top = self.not(bot);
                let eu = self.exists_until(top, na);
                self.mk_not(eu)
            }
            ExistsGlobally => {
                // EG a = !AF !a
                let c = self.child(n, 0);
                let a = self.rewrite_ctl(c);
                let na = self.mk_not(a);
                let af = self.all_finally(na);
                self.mk_not(af)
            }
            AllUntil => {
                // A[a U b] = AF b & !E[!b U (!a & !b)]
                let (c0, c1) = (self.child(n, 0), self.child(n, 1));
                let a = self.rewrite_ctl(c0);
                let b = self.rewrite_ctl(c1);
                let afb = self.all_finally(b);
                let na = self.mk_not(a);
                let nb = self.mk_not(b);
                let both = self.and(na, nb);
                let eu = self.exists_until(nb, both);
                let neu = self.mk_not(eu);
                self.and(afb, neu)
            }
            Next | Until | Release | WeakUntil | Finally | Globally => {
                unreachable!("LTL connective in CTL reduction")
            }
        }
    }

    /// Reduces a tree to LTL negation normal form over
    /// `{literals, &, |, U, R, X}`, then shares duplicate subformulas.
    pub fn reduce_ltl(&mut self, tree: TreeId) {
        let root = self.root(tree);
        let reduced = self.nnf(root, false);
        self.forest.set_root(tree, reduced);
        self.to_dag(tree);
    }

    fn nnf(&mut self, n: NodeId, neg: bool) -> NodeId {
        use Connective::*;
        match self.kind(n) {
            True => {
                if neg {
                    self.ff()
                } else {
                    n
                }
            }
            False => {
                if neg {
                    self.tt()
                } else {
                    n
                }
            }
            Var(_) => {
                if neg {
                    self.not(n)
                } else {
                    n
                }
            }
            Not => {
                let c = self.child(n, 0);
                self.nnf(c, !neg)
            }
            And => {
                let (c0, c1) = (self.child(n, 0), self.child(n, 1));
                let a = self.nnf(c0, neg);
                let b = self.nnf(c1, neg);
                if neg {
                    self.or(a, b)
                } else {
                    self.and(a, b)
                }
            }
            Or => {
                let (c0, c1) = (self.child(n, 0), self.child(n, 1));
                let a = self.nnf(c0, neg);
                let b = self.nnf(c1, neg);
                if neg {
                    self.and(a, b)
                } else {
                    self.or(a, b)
                }
            }
            Implies => {
                // a -> b = !a | b
                let (c0, c1) = (self.child(n, 0), self.child(n, 1));
                let a = self.nnf(c0, !neg);
                let b = self.nnf(c1, neg);
                if neg {
                    self.and(a, b)
                } else {
                    self.or(a, b)
                }
            }
            Next => {
                let c = self.child(n, 0);
                let a = self.nnf(c, neg);
                self.next(a)
            }
            Until => {
                let (c0, c1) = (self.child(n, 0), self.child(n, 1));
                let a = self.nnf(c0, neg);
                let b = self.nnf(c1, neg);
                if neg {
                    self.release(a, b)
                } else {
                    self.until(a, b)
                }
            }
            Release => {
                let (c0, c1) = (self.child(n, 0), self.child(n, 1));
                let a = self.nnf(c0, neg);
                let b = self.nnf(c1, neg);
                if neg {
                    self.until(a, b)
                } else {
                    self.release(a, b)
                }
            }
            Finally => {
                // F a = true U a
                let c = self.child(n, 0);
                let a = self.nnf(c, neg);
                if neg {
                    let bot = self.ff();
                    self.release(bot, a)
                } else {
                    let top = self.tt();
                    self.until(top, a)
                }
            }
            Globally => {
                // G a = false R a
                let c = self.child(n, 0);
                let a = self.nnf(c, neg);
                if neg {
                    let top = self.tt();
                    self.until(top, a)
                } else {
                    let bot = self.ff();
                    self.release(bot, a)
                }
            }
            WeakUntil => {
                // a W b = b R (a | b)
                let (c0, c1) = (self.child(n, 0), self.child(n, 1));
                let a = self.nnf(c0, neg);
                let b = self.nnf(c1, neg);
                if neg {
                    let both = self.and(a, b);
                    self.until(b, both)
                } else {
                    let either = self.or(a, b);
                    self.release(b, either)
                }
            }
            AllUntil | ExistsUntil | AllGlobally | ExistsGlobally | AllFinally | ExistsFinally
            | AllNext | ExistsNext => {
                unreachable!("CTL connective in LTL reduction")
            }
        }
    }

    /// Aliases structurally-equal subformulas to a single representative,
    /// turning the tree into a DAG. The first occurrence (lowest node id)
    /// wins; child edges of the representatives are redirected.
    pub fn to_dag(&mut self, tree: TreeId) {
        let root = self.root(tree);
        let nodes = self.node_list(root);
        let mut alias: HashMap<NodeId, NodeId> = HashMap::new();
        for (i, &n) in nodes.iter().enumerate() {
            let mut representative = n;
            for &m in &nodes[..i] {
                if alias[&m] != m {
                    continue;
                }
                if self.equal(n, m) {
                    representative = m;
                    break;
                }
            }
            alias.insert(n, representative);
        }
        for &n in &nodes {
            if alias[&n] != n {
                continue;
            }
            for i in 0..self.n_children(n) {
                let c = self.child(n, i);
                let a = alias[&c];
                if a != c {
                    self.forest.set_child(n, i, a);
                }
            }
        }
    }

    // -- rendering ---------------------------------------------------------

    /// Renders a formula as text, inserting parentheses only where the
    /// operator priorities require them.
    pub fn render(&self, vars: &VarTable, node: NodeId) -> String {
        self.render_prec(vars, node, 0)
    }

    fn render_prec(&self, vars: &VarTable, n: NodeId, min_prec: u8) -> String {
        use Connective::*;
        let unary = |op: &str| -> (String, u8) {
            (
                format!("{}{}", op, self.render_prec(vars, self.child(n, 0), 3)),
                3,
            )
        };
        let binary = |op: &str, prec: u8, lhs_min: u8, rhs_min: u8| -> (String, u8) {
            (
                format!(
                    "{} {} {}",
                    self.render_prec(vars, self.child(n, 0), lhs_min),
                    op,
                    self.render_prec(vars, self.child(n, 1), rhs_min)
                ),
                prec,
            )
        };
        let bracketed = |q: &str| -> (String, u8) {
            (
                format!(
                    "{}[{} U {}]",
                    q,
                    self.render_prec(vars, self.child(n, 0), 0),
                    self.render_prec(vars, self.child(n, 1), 0)
                ),
                4,
            )
        };
        let (text, prec) = match self.kind(n) {
            True => ("true".to_string(), 4),
            False => ("false".to_string(), 4),
            Var(v) => (vars.name(v).to_string(), 4),
            Not => unary("!"),
            Next => unary("X "),
            Finally => unary("F "),
            Globally => unary("G "),
            AllGlobally => unary("AG "),
            ExistsGlobally => unary("EG "),
            AllFinally => unary("AF "),
            ExistsFinally => unary("EF "),
            AllNext => unary("AX "),
            ExistsNext => unary("EX "),
            Until => binary("U", 2, 3, 3),
            Release => binary("R", 2, 3, 3),
            WeakUntil => binary("W", 2, 3, 3),
            And => binary("&", 1, 1, 2),
            Or => binary("|", 1, 1, 2),
            Implies => binary("->", 0, 1, 0),
            AllUntil => bracketed("A"),
            ExistsUntil => bracketed("E"),
        };
        if prec < min_prec {
            format!("({})", text)
        } else {
            text
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> (Formulas, VarTable, Var, Var) {
        let mut vars = VarTable::new();
        let p = vars.intern("p");
        let q = vars.intern("q");
        (Formulas::new(), vars, p, q)
    }

    #[test]
    fn test_literal_codes() {
        let (mut fs, _vars, p, q) = table();
        let vp = fs.var(p);
        let vq = fs.var(q);
        let t = fs.tt();
        let b = fs.ff();
        assert_eq!(fs.literal(t).code(), 1);
        assert_eq!(fs.literal(b).code(), -1);
        assert_eq!(fs.literal(vp).code(), 2);
        assert_eq!(fs.literal(vq).code(), 3);
        let and = fs.and(vp, vq);
        assert_eq!(fs.literal(and).code(), 0);
        assert!(!fs.literal(and).is_literal());
    }

    #[test]
    fn test_literal_negation_round_trip() {
        let (mut fs, _vars, p, _q) = table();
        let candidates = vec![fs.tt(), fs.ff(), fs.var(p)];
        for n in candidates {
            let neg = fs.not(n);
            assert_eq!(fs.literal(neg).code(), -fs.literal(n).code());
            assert_eq!(fs.literal(n).negated(), fs.literal(neg));
        }
        // Double negation is not a literal.
        let vp = fs.var(p);
        let nn = fs.not(vp);
        let nnn = fs.not(nn);
        assert_eq!(fs.literal(nnn), Literal::NotALiteral);
    }

    #[test]
    fn test_class() {
        let (mut fs, _vars, p, q) = table();
        let vp = fs.var(p);
        let vq = fs.var(q);
        let simple = fs.and(vp, vq);
        assert_eq!(fs.class(simple), FormulaClass::Simple);

        let vp2 = fs.var(p);
        let ltl = fs.globally(vp2);
        assert_eq!(fs.class(ltl), FormulaClass::Ltl);

        let vp3 = fs.var(p);
        let ctl = fs.all_finally(vp3);
        assert_eq!(fs.class(ctl), FormulaClass::Ctl);

        let star = fs.and(ltl, ctl);
        assert_eq!(fs.class(star), FormulaClass::CtlStar);

        let t_simple = fs.tree(simple);
        assert!(fs.is_ctl(t_simple));
        assert!(fs.is_ltl(t_simple));
        let t_ltl = fs.tree(ltl);
        assert!(fs.is_ltl(t_ltl));
        assert!(!fs.is_ctl(t_ltl));
    }

    #[test]
    fn test_structural_equality() {
        let (mut fs, _vars, p, q) = table();
        let a1 = fs.var(p);
        let b1 = fs.var(q);
        let u1 = fs.until(a1, b1);
        let a2 = fs.var(p);
        let b2 = fs.var(q);
        let u2 = fs.until(a2, b2);
        assert!(fs.equal(u1, u2));
        let r = fs.release(a1, b1);
        assert!(!fs.equal(u1, r));
        let swapped = fs.until(b2, a2);
        assert!(!fs.equal(u1, swapped));
    }

    #[test]
    fn test_nnf_globally() {
        let (mut fs, vars, p, _q) = table();
        let vp = fs.var(p);
        let g = fs.globally(vp);
        let tree = fs.tree(g);
        fs.reduce_ltl(tree);
        let root = fs.root(tree);
        // G p = false R p
        assert_eq!(fs.kind(root), Connective::Release);
        assert_eq!(fs.kind(fs.child(root, 0)), Connective::False);
        assert_eq!(fs.render(&vars, root), "false R p");
    }

    #[test]
    fn test_nnf_negated_until() {
        let (mut fs, _vars, p, q) = table();
        let vp = fs.var(p);
        let vq = fs.var(q);
        let u = fs.until(vp, vq);
        let nu = fs.not(u);
        let tree = fs.tree(nu);
        fs.reduce_ltl(tree);
        let root = fs.root(tree);
        // !(p U q) = !p R !q
        assert_eq!(fs.kind(root), Connective::Release);
        assert_eq!(fs.literal(fs.child(root, 0)), Literal::NegVar(p));
        assert_eq!(fs.literal(fs.child(root, 1)), Literal::NegVar(q));
    }

    #[test]
    fn test_nnf_weak_until() {
        let (mut fs, vars, p, q) = table();
        let vp = fs.var(p);
        let vq = fs.var(q);
        let w = fs.weak_until(vp, vq);
        let tree = fs.tree(w);
        fs.reduce_ltl(tree);
        // p W q = q R (p | q)
        assert_eq!(fs.render(&vars, fs.root(tree)), "q R (p | q)");
    }

    #[test]
    fn test_ctl_reduction_shapes() {
        let (mut fs, vars, p, _q) = table();
        let vp = fs.var(p);
        let ag = fs.all_globally(vp);
        let tree = fs.tree(ag);
        fs.reduce_ctl(tree);
        // AG p = !E[!false U !p]
        assert_eq!(fs.render(&vars, fs.root(tree)), "!E[!false U !p]");

        let vp2 = fs.var(p);
        let eg = fs.exists_globally(vp2);
        let tree2 = fs.tree(eg);
        fs.reduce_ctl(tree2);
        assert_eq!(fs.render(&vars, fs.root(tree2)), "!AF !p");
    }

    #[test]
    fn test_ctl_reduction_connective_set() {
        let (mut fs, _vars, p, q) = table();
        let vp = fs.var(p);
        let vq = fs.var(q);
        let au = fs.all_until(vp, vq);
        let imp = fs.implies(au, vq);
        let ax = fs.all_next(imp);
        let tree = fs.tree(ax);
        fs.reduce_ctl(tree);
        for node in fs.node_list(fs.root(tree)) {
            assert!(
                matches!(
                    fs.kind(node),
                    Connective::False
                        | Connective::Var(_)
                        | Connective::Not
                        | Connective::And
                        | Connective::AllFinally
                        | Connective::ExistsUntil
                        | Connective::ExistsNext
                ),
                "unexpected connective {:?}",
                fs.kind(node)
            );
        }
    }

    #[test]
    fn test_to_dag_aliases_duplicates() {
        let (mut fs, _vars, p, q) = table();
        let a1 = fs.var(p);
        let b1 = fs.var(q);
        let left = fs.and(a1, b1);
        let a2 = fs.var(p);
        let b2 = fs.var(q);
        let right = fs.and(a2, b2);
        let top = fs.or(left, right);
        let tree = fs.tree(top);
        fs.to_dag(tree);
        let root = fs.root(tree);
        // Both children of the root collapse to the first-seen conjunction.
        assert_eq!(fs.child(root, 0), fs.child(root, 1));
        assert_eq!(fs.child(root, 0), left);
    }

    #[test]
    fn test_negate_leaves_original() {
        let (mut fs, _vars, p, _q) = table();
        let vp = fs.var(p);
        let tree = fs.tree(vp);
        let neg = fs.negate(tree);
        assert_eq!(fs.kind(fs.root(neg)), Connective::Not);
        assert_eq!(fs.child(fs.root(neg), 0), fs.root(tree));
        assert_eq!(fs.literal(fs.root(neg)), Literal::NegVar(p));
    }

    #[test]
    fn test_render_priorities() {
        let (mut fs, vars, p, q) = table();
        let vp = fs.var(p);
        let vq = fs.var(q);
        let or = fs.or(vp, vq);
        let np = fs.not(vp);
        let and = fs.and(np, or);
        assert_eq!(fs.render(&vars, and), "!p & (p | q)");
        let u = fs.until(and, vq);
        assert_eq!(fs.render(&vars, u), "(!p & (p | q)) U q");
        let g = fs.globally(u);
        assert_eq!(fs.render(&vars, g), "G ((!p & (p | q)) U q)");
    }

    #[test]
    fn test_gc_after_free() {
        let (mut fs, _vars, p, _q) = table();
        let vp = fs.var(p);
        let g = fs.globally(vp);
        let tree = fs.tree(g);
        let before = fs.live_nodes();
        fs.free_tree(tree);
        fs.collect_garbage();
        assert!(fs.live_nodes() < before);
        assert_eq!(fs.live_nodes(), 0);
    }
}
