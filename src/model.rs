//! Finite-state (Kripke) models.
//!
//! A model is a directed graph of states, each carrying a propositional
//! valuation. States are named by caller-chosen integers; internally they
//! get dense ids in insertion order. Transition lists store *names*, not
//! ids, so forward references work: targets may be defined later in the
//! input, and a post-parse sweep rejects targets that never materialize.

use std::collections::HashMap;

use log::debug;

use crate::bitset::BitSet;
use crate::error::{Error, Result};
use crate::ordset::OrdSet;
use crate::vars::{Var, VarTable};

/// Dense internal id of a model state.
pub type StateId = usize;

/// Tokens produced by the external model scanner.
///
/// The scanner itself (lexing, comments, line splitting) is not part of
/// this crate; [`Model::parse`] consumes `(line, token)` pairs from any
/// iterator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelToken {
    /// Opening delimiter of the model block.
    Open,
    /// Closing delimiter of the model block.
    Close,
    /// Marker flagging the following state as initial.
    Initial,
    /// A state name (definition or transition target).
    Int(i64),
    /// A propositional-variable name; the literal `_` means "no variables".
    PropVar(String),
}

#[derive(Debug, Clone, Default)]
struct KState {
    /// Which prop. vars are true in this state.
    pv: BitSet,
    /// Successor state *names*, in insertion order, duplicates allowed.
    trans: Vec<i64>,
}

/// A Kripke model: named states, transitions, valuations, initial states.
#[derive(Debug, Clone, Default)]
pub struct Model {
    states: Vec<KState>,
    names: Vec<i64>,
    ids: HashMap<i64, StateId>,
    /// Which prop. vars appear somewhere in the model.
    vars_used: BitSet,
    /// Names of the initial states.
    initial: OrdSet<i64>,
}

impl Model {
    /// Creates an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the model to its freshly-constructed state.
    pub fn clear(&mut self) {
        self.states.clear();
        self.names.clear();
        self.ids.clear();
        self.vars_used.clear();
        self.initial.clear();
    }

    /// Adds a state with the given name and returns its id.
    pub fn add_state(&mut self, name: i64) -> Result<StateId> {
        if self.ids.contains_key(&name) {
            return Err(Error::StateExists { name });
        }
        let id = self.states.len();
        self.states.push(KState::default());
        self.names.push(name);
        self.ids.insert(name, id);
        Ok(id)
    }

    /// Number of states.
    pub fn n_states(&self) -> usize {
        self.states.len()
    }

    /// True once the model has at least one state.
    pub fn is_defined(&self) -> bool {
        !self.states.is_empty()
    }

    /// Looks up the id of a state name.
    pub fn state_id(&self, name: i64) -> Option<StateId> {
        self.ids.get(&name).copied()
    }

    /// Returns the name of a state id.
    pub fn state_name(&self, id: StateId) -> i64 {
        self.names[id]
    }

    fn id_of(&self, name: i64) -> StateId {
        match self.state_id(name) {
            Some(id) => id,
            None => panic!("unknown state {}", name),
        }
    }

    /// Appends a transition from `src` to `dest` (both by name).
    ///
    /// The source must already exist; the destination need not — it is
    /// recorded by name and validated once the whole model is known.
    pub fn add_transition(&mut self, src: i64, dest: i64) -> Result<()> {
        let id = self
            .state_id(src)
            .ok_or(Error::UnknownState { name: src })?;
        self.states[id].trans.push(dest);
        Ok(())
    }

    /// Marks a propositional variable true in a state.
    pub fn add_prop_var(&mut self, state: i64, var: Var) -> Result<()> {
        let id = self
            .state_id(state)
            .ok_or(Error::UnknownState { name: state })?;
        self.states[id].pv.set(var.index(), true);
        self.vars_used.set(var.index(), true);
        Ok(())
    }

    /// Adds a state name to the set of initial states.
    pub fn set_initial(&mut self, name: i64) {
        self.initial.insert(name);
    }

    /// Names of the initial states, ascending.
    pub fn initial_states(&self) -> &OrdSet<i64> {
        &self.initial
    }

    /// Number of outgoing transitions of the named state.
    ///
    /// # Panics
    ///
    /// Panics if the state does not exist.
    pub fn degree(&self, name: i64) -> usize {
        self.states[self.id_of(name)].trans.len()
    }

    /// The `index`-th successor (by name) of the named state.
    pub fn next(&self, name: i64, index: usize) -> i64 {
        self.states[self.id_of(name)].trans[index]
    }

    /// True if the variable is true in the named state.
    pub fn prop_var(&self, name: i64, var: Var) -> bool {
        self.states[self.id_of(name)].pv.get(var.index())
    }

    /// True if the variable is set anywhere in the model.
    pub fn prop_var_used(&self, var: Var) -> bool {
        self.vars_used.get(var.index())
    }

    /// Builds the model from scanner tokens.
    ///
    /// The expected shape is `{` followed by state entries followed by `}`.
    /// Each entry is `[initial-marker] name target+ propvar+`: at least one
    /// transition target and at least one prop-var token (the `_` token
    /// stands for "no variables"). Duplicate state definitions and
    /// transitions to states that are never defined are parse errors; if no
    /// state is marked initial, every state becomes initial.
    pub fn parse<I>(&mut self, tokens: I, vars: &mut VarTable) -> Result<()>
    where
        I: IntoIterator<Item = (usize, ModelToken)>,
    {
        let mut it = tokens.into_iter().peekable();
        let mut line = 0;
        let mut defined = BitSet::new();
        let mut init_seen = false;

        match it.next() {
            Some((l, ModelToken::Open)) => line = l,
            Some((l, t)) => {
                return Err(Error::Parse {
                    line: l,
                    msg: format!("expected model opening, found {:?}", t),
                })
            }
            None => {
                return Err(Error::Parse {
                    line,
                    msg: "empty model text".to_string(),
                })
            }
        }

        loop {
            match it.peek() {
                Some((_, ModelToken::Close)) => {
                    let (l, _) = it.next().expect("peeked");
                    line = l;
                    break;
                }
                None => {
                    return Err(Error::Parse {
                        line,
                        msg: "unexpected end of model text".to_string(),
                    })
                }
                _ => {}
            }

            let initial = matches!(it.peek(), Some((_, ModelToken::Initial)));
            if initial {
                it.next();
            }

            let name = match it.next() {
                Some((l, ModelToken::Int(n))) => {
                    line = l;
                    n
                }
                Some((l, t)) => {
                    return Err(Error::Parse {
                        line: l,
                        msg: format!("expected state name, found {:?}", t),
                    })
                }
                None => {
                    return Err(Error::Parse {
                        line,
                        msg: "expected state name".to_string(),
                    })
                }
            };
            debug!("parse: state {} (initial = {})", name, initial);

            match self.state_id(name) {
                Some(id) if defined.get(id) => {
                    return Err(Error::Parse {
                        line,
                        msg: format!("duplicate definition of state {}", name),
                    })
                }
                Some(id) => defined.set(id, true),
                None => {
                    let id = self.add_state(name)?;
                    defined.set(id, true);
                }
            }
            if initial {
                self.set_initial(name);
                init_seen = true;
            }

            // Transition targets: at least one required.
            let mut first = true;
            loop {
                match it.peek() {
                    Some((_, ModelToken::Int(_))) => {}
                    _ if !first => break,
                    other => {
                        return Err(Error::Parse {
                            line,
                            msg: format!("expected transition target, found {:?}", other),
                        })
                    }
                }
                let (l, tok) = it.next().expect("peeked");
                line = l;
                let dest = match tok {
                    ModelToken::Int(n) => n,
                    _ => unreachable!(),
                };
                first = false;
                if self.state_id(dest).is_none() {
                    // Forward reference: register the name, leave it
                    // undefined until (unless) its own entry shows up.
                    self.add_state(dest)?;
                }
                self.add_transition(name, dest)?;
                debug!("parse: transition {} -> {}", name, dest);
            }

            // Prop. vars: at least one token required; `_` means none.
            let mut first = true;
            loop {
                match it.peek() {
                    Some((_, ModelToken::PropVar(_))) => {}
                    _ if !first => break,
                    other => {
                        return Err(Error::Parse {
                            line,
                            msg: format!("expected proposition, found {:?}", other),
                        })
                    }
                }
                let (l, tok) = it.next().expect("peeked");
                line = l;
                first = false;
                let text = match tok {
                    ModelToken::PropVar(s) => s,
                    _ => unreachable!(),
                };
                if text != "_" {
                    let var = vars.intern(&text);
                    self.add_prop_var(name, var)?;
                    debug!("parse: {} holds in state {}", text, name);
                }
            }
        }

        // Verify that every transition target was eventually defined.
        for id in 0..self.states.len() {
            for &dest in &self.states[id].trans {
                let dest_id = self.id_of(dest);
                if !defined.get(dest_id) {
                    return Err(Error::Parse {
                        line,
                        msg: format!(
                            "transition to unknown state: state {} to {}",
                            self.state_name(id),
                            dest
                        ),
                    });
                }
            }
        }

        // No explicit initial states: every state is initial.
        if !init_seen {
            for id in 0..self.states.len() {
                self.initial.insert(self.names[id]);
            }
        }

        Ok(())
    }

    /// Renders the model as text: one line per state with its initial
    /// marker, name, successors, and true variables.
    pub fn render(&self, vars: &VarTable) -> String {
        let mut out = String::new();
        for id in 0..self.states.len() {
            let name = self.state_name(id);
            let marker = if self.initial.contains(name) { '>' } else { ' ' };
            let mut fields = String::new();
            for &dest in &self.states[id].trans {
                fields.push_str(&format!("{} ", dest));
            }
            let mut props = String::new();
            for i in 0..vars.len() {
                if self.states[id].pv.get(i) {
                    props.push_str(vars.name(Var::new(i as u32)));
                    props.push(' ');
                }
            }
            out.push_str(&format!(
                "{}{:>4}: {:<16} {}\n",
                marker,
                name,
                fields.trim_end(),
                props.trim_end()
            ));
        }
        out
    }
}
