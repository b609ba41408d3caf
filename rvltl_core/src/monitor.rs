use crate::formula::Node;
use crate::{Atom, B4, Formula};
use log::trace;
use smallvec::{SmallVec, smallvec};
use std::borrow::Cow;
use thiserror::Error;

/// A key of a step: either an [`Atom`] handle or the external identifier of an atom.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key<'a> {
    /// An atom, by handle.
    Atom(Atom),
    /// An atom, by identifier.
    Identifier(Cow<'a, str>),
}

impl From<Atom> for Key<'_> {
    fn from(value: Atom) -> Self {
        Key::Atom(value)
    }
}

impl<'a> From<&'a str> for Key<'a> {
    fn from(value: &'a str) -> Self {
        Key::Identifier(Cow::Borrowed(value))
    }
}

impl<'a> From<&'a String> for Key<'a> {
    fn from(value: &'a String) -> Self {
        Key::Identifier(Cow::Borrowed(value.as_str()))
    }
}

impl From<String> for Key<'_> {
    fn from(value: String) -> Self {
        Key::Identifier(Cow::Owned(value))
    }
}

/// Error raised when a step does not assign a value to every atom of the formula.
///
/// The monitor is left untouched: the step is either committed as a whole or not at all.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("missing atomic propositions: {}", describe_missing(.names, .unnamed))]
pub struct MissingAtoms {
    /// The missing atoms, in creation order.
    pub atoms: Vec<Atom>,
    /// The names of the missing atoms that have one.
    pub names: Vec<String>,
    /// How many of the missing atoms have no name.
    pub unnamed: usize,
}

impl MissingAtoms {
    fn new(formula: &Formula, atoms: Vec<Atom>) -> Self {
        let names: Vec<String> = atoms
            .iter()
            .filter_map(|atom| formula.atom_name(*atom))
            .map(str::to_owned)
            .collect();
        let unnamed = atoms.len() - names.len();
        Self {
            atoms,
            names,
            unnamed,
        }
    }
}

fn describe_missing(names: &[String], unnamed: &usize) -> String {
    let mut parts = names.to_vec();
    if *unnamed > 0 {
        parts.push(format!("{unnamed} unnamed atomic proposition(s)"));
    }
    parts.join(", ")
}

/// Evaluates a [`Formula`] online, against a trace that is revealed one step at a time.
///
/// A [`Monitor`] is spawned by [`Formula::monitor`] and borrows the compiled formula;
/// it only owns the observed trace.
/// Every call to [`Monitor::update`] advances all nodes of the formula by one step at once,
/// so the trace length is the same for every node.
#[derive(Debug, Clone)]
pub struct Monitor<'f> {
    formula: &'f Formula,
    // Append-only history of each atom, indexed by atom.
    // Atoms not occurring in the formula keep an empty history.
    histories: Vec<Vec<bool>>,
    len: usize,
}

impl<'f> From<&'f Formula> for Monitor<'f> {
    fn from(formula: &'f Formula) -> Self {
        Monitor {
            formula,
            histories: vec![Vec::new(); formula.atoms_len()],
            len: 0,
        }
    }
}

impl<'f> Monitor<'f> {
    /// The formula being monitored.
    pub fn formula(&self) -> &'f Formula {
        self.formula
    }

    /// Number of steps observed so far.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no step has been observed yet.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Index of the last observed step, if any.
    pub fn last_index(&self) -> Option<usize> {
        self.len.checked_sub(1)
    }

    /// The values observed so far for the given atom,
    /// or `None` if the atom does not occur in the formula.
    pub fn history(&self, atom: Atom) -> Option<&[bool]> {
        self.formula
            .required_atoms()
            .binary_search(&atom)
            .ok()
            .map(|_| self.histories[atom.index()].as_slice())
    }


    fn resolve(&self, key: Key<'_>) -> Option<Atom> {
        match key {
            Key::Atom(atom) => self.formula.owns(atom).then_some(atom),
            Key::Identifier(identifier) => self.formula.atom_by_identifier(&identifier),
        }
    }

    /// Observes a new step of the trace.
    ///
    /// The step assigns boolean values to atoms, given either by handle or by identifier.
    /// Keys that do not resolve to an atom of the formula are ignored;
    /// if an atom is assigned more than once, the last value wins.
    ///
    /// Fails without changing the state of the monitor
    /// if any atom occurring in the formula is not assigned a value.
    ///
    /// ```
    /// # use rvltl_core::{FormulaBuilder, Key, Ltl};
    /// let mut builder = FormulaBuilder::new();
    /// let alice = builder.new_identified_atom("alice", None).expect("atom");
    /// let bob = builder.new_identified_atom("bob", Some("Bob")).expect("atom");
    /// let formula = builder.build(Ltl::and([alice, bob])).expect("build");
    /// let mut monitor = formula.monitor();
    ///
    /// monitor.update([("alice", true), ("bob", true)]).expect("complete step");
    /// monitor.update([(Key::from(alice), true), (Key::from("bob"), false)]).expect("complete step");
    /// let err = monitor.update([(alice, true)]).expect_err("bob is missing");
    /// assert_eq!(err.names, vec!["Bob".to_string()]);
    /// assert_eq!(monitor.len(), 2);
    /// ```
    pub fn update<'k, K, I>(&mut self, step: I) -> Result<(), MissingAtoms>
    where
        K: Into<Key<'k>>,
        I: IntoIterator<Item = (K, bool)>,
    {
        let formula = self.formula;
        let mut values: SmallVec<[Option<bool>; 16]> = smallvec![None; formula.atoms_len()];
        for (key, value) in step {
            if let Some(atom) = self.resolve(key.into()) {
                values[atom.index()] = Some(value);
            }
        }

        // Check the step is complete before touching any history.
        let required = formula.required_atoms();
        let mut missing = Vec::new();
        let mut committed: SmallVec<[bool; 16]> = SmallVec::with_capacity(required.len());
        for atom in required {
            match values[atom.index()] {
                Some(value) => committed.push(value),
                None => missing.push(*atom),
            }
        }
        if !missing.is_empty() {
            let err = MissingAtoms::new(formula, missing);
            trace!("step {} rejected: {err}", self.len);
            return Err(err);
        }

        required
            .iter()
            .zip(committed)
            .for_each(|(atom, value)| self.histories[atom.index()].push(value));
        self.len += 1;
        trace!("step {} committed", self.len - 1);
        Ok(())
    }

    /// Evaluates the formula over the whole trace observed so far.
    ///
    /// # Panics
    ///
    /// Panics if no step has been observed yet.
    pub fn evaluate(&self) -> B4 {
        assert!(
            !self.is_empty(),
            "formula evaluated before observing any step"
        );
        self.evaluate_at(0)
    }

    /// Evaluates the formula over the suffix of the observed trace starting at index `i`.
    ///
    /// Temporal operators looking past the observed trace assume it may still continue,
    /// and evaluate to [`B4::PresumablyFalse`] when they cannot find a witness.
    ///
    /// # Panics
    ///
    /// Panics if evaluation needs the value of an atom at an index that has not been observed.
    pub fn evaluate_at(&self, i: usize) -> B4 {
        self.eval(self.formula.root(), i)
    }

    fn eval(&self, node: usize, i: usize) -> B4 {
        match self.formula.node(node) {
            Node::Atom(atom) => self.histories[atom.index()]
                .get(i)
                .copied()
                .map(B4::from)
                .expect("atom evaluated past the observed trace"),
            Node::Not(sub) => !self.eval(*sub, i),
            Node::And(subs) => B4::all(subs.iter().map(|sub| self.eval(*sub, i))),
            Node::Or(subs) => B4::any(subs.iter().map(|sub| self.eval(*sub, i))),
            Node::Next(sub) => match i.checked_add(1) {
                Some(next) if next < self.len => self.eval(*sub, next),
                // Were the trace to end now, there would be no next step.
                _ => B4::PresumablyFalse,
            },
            Node::Until(lhs, rhs) => self.until(*lhs, *rhs, i),
        }
    }

    // The first index k >= i where rhs is truthy is the witness:
    // the verdict is rhs at k, conjoined with lhs at every j in i..k.
    fn until(&self, lhs: usize, rhs: usize, i: usize) -> B4 {
        let Some((k, witness)) = (i..self.len).find_map(|k| {
            let witness = self.eval(rhs, k);
            witness.is_truthy().then_some((k, witness))
        }) else {
            // rhs may still hold in the unobserved future.
            return B4::PresumablyFalse;
        };
        let mut verdict = witness;
        for j in i..k {
            verdict &= self.eval(lhs, j);
            if verdict == B4::False {
                break;
            }
        }
        verdict
    }
}
