//! # buchi-rs: explicit-state CTL/LTL model checking
//!
//! **`buchi-rs`** decides whether a finite-state transition system (a
//! *Kripke model*) satisfies a temporal-logic specification, and produces a
//! counterexample when it does not. State sets are explicit and enumerated
//! throughout — there is no symbolic (BDD-style) representation here.
//!
//! ## How it works
//!
//! - **CTL** formulas are checked directly on the model by fixed-point
//!   labelling over the adequate connective set `{false, !, &, AF, EU, EX}`
//!   ([`ctl::CtlChecker`]).
//! - **LTL** formulas go through automaton theory: the negated formula is
//!   expanded into a generalized Büchi automaton by an on-the-fly tableau
//!   construction, composed with the model's own automaton, and the product
//!   is tested for an accepting cycle ([`ltl::LtlChecker`]). A non-empty
//!   product yields a lasso-shaped counterexample (finite prefix plus
//!   repeating suffix).
//!
//! The [`buchi::Buchi`] automaton supports the algebra both pipelines rely
//! on: generalized-acceptance removal, Kripke-model conversion, the
//! intersection product, nested-DFS emptiness with a witness, and
//! reachability reduction.
//!
//! ## Quick start
//!
//! ```rust
//! use buchi_rs::ctl::CtlChecker;
//! use buchi_rs::formula::Formulas;
//! use buchi_rs::ltl::{LtlChecker, LtlOutcome};
//! use buchi_rs::model::Model;
//! use buchi_rs::vars::VarTable;
//!
//! // A two-state model: state 1 (initial) satisfies p and steps to 1 or 2;
//! // state 2 satisfies nothing and loops forever.
//! let mut vars = VarTable::new();
//! let p = vars.intern("p");
//! let mut model = Model::new();
//! model.add_state(1).unwrap();
//! model.add_state(2).unwrap();
//! model.add_prop_var(1, p).unwrap();
//! model.add_transition(1, 1).unwrap();
//! model.add_transition(1, 2).unwrap();
//! model.add_transition(2, 2).unwrap();
//! model.set_initial(1);
//!
//! let mut formulas = Formulas::new();
//!
//! // CTL: "some successor satisfies p" holds exactly in state 1.
//! let vp = formulas.var(p);
//! let ex_p = formulas.exists_next(vp);
//! let tree = formulas.tree(ex_p);
//! let sat = CtlChecker::new()
//!     .check(&vars, &model, &mut formulas, tree)
//!     .unwrap();
//! assert!(sat.get(0));
//! assert!(!sat.get(1));
//!
//! // LTL: "always p" fails — the run that falls into state 2 violates it.
//! let vp = formulas.var(p);
//! let always_p = formulas.globally(vp);
//! let tree = formulas.tree(always_p);
//! let outcome = LtlChecker::new()
//!     .check(&vars, &model, &mut formulas, tree)
//!     .unwrap();
//! match outcome {
//!     LtlOutcome::CounterExample(cex) => {
//!         // Rendered like "1 {2}*": reach state 2, loop there forever.
//!         assert!(cex.cycle_start.is_some());
//!     }
//!     LtlOutcome::Satisfied => unreachable!(),
//! }
//! ```
//!
//! ## Core components
//!
//! - **[`bitset`]**: the growable bit vector every set representation uses.
//! - **[`model`]**: Kripke models, built programmatically or from scanner
//!   tokens.
//! - **[`formula`]**: formula DAGs, literal codes, class checks, and the
//!   reductions to minimal connective sets.
//! - **[`buchi`]**: the Büchi automaton and its algebra.
//! - **[`ctl`]** / **[`ltl`]**: the two checkers.
//! - **[`dot`]**: Graphviz rendering for debugging.

pub mod bitset;
pub mod buchi;
pub mod ctl;
pub mod dot;
pub mod error;
pub mod forest;
pub mod formula;
pub mod ltl;
pub mod model;
pub mod ordset;
pub mod vars;
