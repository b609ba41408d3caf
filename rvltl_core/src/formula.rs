use crate::Monitor;
use log::info;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt::Display;
use thiserror::Error;

type AtomIdx = u16;
// Random per-builder nonce carried by every handle.
type BuilderTag = u32;

/// An atomic proposition, i.e., a boolean signal observed at every step of a trace.
///
/// [`Atom`]s are handles minted by a [`FormulaBuilder`]:
/// two atoms are the same signal only if they are the same handle,
/// regardless of their names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Atom(BuilderTag, AtomIdx);

impl Atom {
    #[inline(always)]
    pub(crate) fn index(self) -> usize {
        self.1 as usize
    }
}

/// The error type for operations on a [`FormulaBuilder`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormulaError {
    /// The formula uses an atom that was not created by this builder.
    #[error("atom {0:?} does not belong to the formula builder")]
    MissingAtom(Atom),
    /// The identifier is already used by another atom of this builder.
    #[error("identifier '{0}' is already in use")]
    DuplicateIdentifier(String),
    /// The builder has run out of atom handles.
    #[error("too many atomic propositions")]
    TooManyAtoms,
}

/// An LTL formula over [`Atom`]s.
///
/// This is a description only: it holds no trace.
/// Use a [`FormulaBuilder`] to turn it into a [`Formula`] that can be monitored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Ltl {
    /// The true formula.
    True,
    /// The false formula.
    False,
    /// An atomic formula.
    Atom(Atom),
    /// Logical negation of a formula.
    Not(Box<Ltl>),
    /// Logical conjunction of a list of formulae.
    And(Vec<Ltl>),
    /// Logical disjunction of a list of formulae.
    Or(Vec<Ltl>),
    /// Temporal next operator.
    Next(Box<Ltl>),
    /// Temporal until operator, `lhs U rhs`.
    Until(Box<(Ltl, Ltl)>),
    /// Temporal eventually operator, i.e., `True U f`.
    Eventually(Box<Ltl>),
    /// Temporal always operator, i.e., `¬ eventually ¬f`.
    Always(Box<Ltl>),
    /// Logical implication of an antecedent formula and a consequent formula.
    Implies(Box<(Ltl, Ltl)>),
}

impl From<Atom> for Ltl {
    fn from(value: Atom) -> Self {
        Ltl::Atom(value)
    }
}

impl Ltl {
    /// `X f`
    pub fn next(f: impl Into<Ltl>) -> Self {
        Ltl::Next(Box::new(f.into()))
    }

    /// `lhs U rhs`
    pub fn until(lhs: impl Into<Ltl>, rhs: impl Into<Ltl>) -> Self {
        Ltl::Until(Box::new((lhs.into(), rhs.into())))
    }

    /// `F f`
    pub fn eventually(f: impl Into<Ltl>) -> Self {
        Ltl::Eventually(Box::new(f.into()))
    }

    /// `G f`
    pub fn always(f: impl Into<Ltl>) -> Self {
        Ltl::Always(Box::new(f.into()))
    }

    /// `lhs → rhs`
    pub fn implies(lhs: impl Into<Ltl>, rhs: impl Into<Ltl>) -> Self {
        Ltl::Implies(Box::new((lhs.into(), rhs.into())))
    }

    /// Conjunction of all the given formulae.
    pub fn and<I, F>(fs: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<Ltl>,
    {
        Ltl::And(fs.into_iter().map(Into::into).collect())
    }

    /// Disjunction of all the given formulae.
    pub fn or<I, F>(fs: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<Ltl>,
    {
        Ltl::Or(fs.into_iter().map(Into::into).collect())
    }

    fn atoms(&self, atoms: &mut Vec<Atom>) {
        match self {
            Ltl::True | Ltl::False => {}
            Ltl::Atom(atom) => atoms.push(*atom),
            Ltl::And(subs) | Ltl::Or(subs) => subs.iter().for_each(|f| f.atoms(atoms)),
            Ltl::Not(sub) | Ltl::Next(sub) | Ltl::Eventually(sub) | Ltl::Always(sub) => {
                sub.atoms(atoms)
            }
            Ltl::Until(subs) | Ltl::Implies(subs) => {
                subs.0.atoms(atoms);
                subs.1.atoms(atoms);
            }
        }
    }
}

impl std::ops::Not for Ltl {
    type Output = Ltl;

    fn not(self) -> Self::Output {
        Ltl::Not(Box::new(self))
    }
}

impl std::ops::BitAnd for Ltl {
    type Output = Ltl;

    fn bitand(self, rhs: Self) -> Self::Output {
        Ltl::And(vec![self, rhs])
    }
}

impl std::ops::BitOr for Ltl {
    type Output = Ltl;

    fn bitor(self, rhs: Self) -> Self::Output {
        Ltl::Or(vec![self, rhs])
    }
}

// Compiled operators, referring to their operands by position in the node arena.
// Derived operators are rewritten into these, and constants are the empty And/Or.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Node {
    Atom(Atom),
    Not(usize),
    And(SmallVec<[usize; 4]>),
    Or(SmallVec<[usize; 4]>),
    Next(usize),
    Until(usize, usize),
}

#[derive(Debug, Clone, Default)]
struct AtomData {
    name: Option<String>,
    identifier: Option<String>,
}

/// Defines the atomic propositions of a formula and builds it into a [`Formula`].
#[derive(Debug)]
pub struct FormulaBuilder {
    tag: BuilderTag,
    atoms: Vec<AtomData>,
    identifiers: HashMap<String, Atom>,
}

impl Default for FormulaBuilder {
    fn default() -> Self {
        Self {
            tag: rand::random(),
            atoms: Vec::new(),
            identifiers: HashMap::new(),
        }
    }
}

impl FormulaBuilder {
    /// Creates a new [`FormulaBuilder`] with no atoms.
    pub fn new() -> Self {
        Self::default()
    }

    fn push_atom(&mut self, data: AtomData) -> Result<Atom, FormulaError> {
        let idx = AtomIdx::try_from(self.atoms.len()).map_err(|_| FormulaError::TooManyAtoms)?;
        self.atoms.push(data);
        Ok(Atom(self.tag, idx))
    }

    fn owns(&self, atom: Atom) -> bool {
        atom.0 == self.tag && atom.index() < self.atoms.len()
    }

    /// Adds a new anonymous atom.
    ///
    /// ```
    /// # use rvltl_core::FormulaBuilder;
    /// let mut builder = FormulaBuilder::new();
    /// let p = builder.new_atom();
    /// let q = builder.new_atom();
    /// assert_ne!(p, q);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the builder already holds `u16::MAX + 1` atoms.
    pub fn new_atom(&mut self) -> Atom {
        self.push_atom(AtomData::default()).expect("atom limit")
    }

    /// Adds a new atom with a human-readable name.
    /// Names are only used for reporting: atoms sharing a name are still different atoms.
    /// An empty name is the same as no name.
    ///
    /// # Panics
    ///
    /// Panics if the builder already holds `u16::MAX + 1` atoms.
    pub fn new_named_atom(&mut self, name: &str) -> Atom {
        let name = (!name.is_empty()).then(|| name.to_owned());
        self.push_atom(AtomData {
            name,
            identifier: None,
        })
        .expect("atom limit")
    }

    /// Adds a new atom with an external identifier, and optionally a name.
    /// The identifier can be used in place of the [`Atom`] handle when updating a [`Monitor`].
    ///
    /// Fails if another atom already uses the same identifier.
    ///
    /// ```
    /// # use rvltl_core::FormulaBuilder;
    /// let mut builder = FormulaBuilder::new();
    /// builder
    ///     .new_identified_atom("alice", None)
    ///     .expect("identifier is free");
    /// builder
    ///     .new_identified_atom("alice", Some("another alice"))
    ///     .expect_err("identifier is taken");
    /// ```
    pub fn new_identified_atom(
        &mut self,
        identifier: &str,
        name: Option<&str>,
    ) -> Result<Atom, FormulaError> {
        if self.identifiers.contains_key(identifier) {
            return Err(FormulaError::DuplicateIdentifier(identifier.to_owned()));
        }
        let atom = self.push_atom(AtomData {
            name: name.filter(|n| !n.is_empty()).map(str::to_owned),
            identifier: Some(identifier.to_owned()),
        })?;
        self.identifiers.insert(identifier.to_owned(), atom);
        Ok(atom)
    }

    /// Returns the atom with the given identifier, if any.
    pub fn atom_by_identifier(&self, identifier: &str) -> Option<Atom> {
        self.identifiers.get(identifier).copied()
    }

    /// Produces a [`Formula`] from the given [`Ltl`] description, consuming the builder.
    ///
    /// Fails if the description uses atoms not created by this builder.
    pub fn build(mut self, ltl: Ltl) -> Result<Formula, FormulaError> {
        let mut required = Vec::new();
        ltl.atoms(&mut required);
        if let Some(atom) = required.iter().find(|a| !self.owns(**a)) {
            return Err(FormulaError::MissingAtom(*atom));
        }
        required.sort_unstable();
        required.dedup();
        required.shrink_to_fit();

        let mut compiler = Compiler::default();
        let root = compiler.compile(&ltl);
        let mut nodes = compiler.nodes;
        nodes.shrink_to_fit();
        self.atoms.shrink_to_fit();
        info!(
            "compile LTL formula with:\n{} nodes\n{} atoms ({} required)",
            nodes.len(),
            self.atoms.len(),
            required.len()
        );
        Ok(Formula {
            tag: self.tag,
            ltl,
            atoms: self.atoms,
            identifiers: self.identifiers,
            required,
            nodes,
            root,
        })
    }
}

// Hash-conses subformulae into a post-order arena, so that every node comes after its operands.
#[derive(Default)]
struct Compiler {
    nodes: Vec<Node>,
    index: HashMap<Node, usize>,
}

impl Compiler {
    fn intern(&mut self, node: Node) -> usize {
        if let Some(&idx) = self.index.get(&node) {
            idx
        } else {
            let idx = self.nodes.len();
            self.nodes.push(node.clone());
            self.index.insert(node, idx);
            idx
        }
    }

    fn truth(&mut self) -> usize {
        self.intern(Node::And(SmallVec::new()))
    }

    fn compile(&mut self, ltl: &Ltl) -> usize {
        match ltl {
            Ltl::True => self.truth(),
            Ltl::False => self.intern(Node::Or(SmallVec::new())),
            Ltl::Atom(atom) => self.intern(Node::Atom(*atom)),
            Ltl::Not(sub) => {
                let sub = self.compile(sub);
                self.intern(Node::Not(sub))
            }
            Ltl::And(subs) => {
                let subs = subs.iter().map(|f| self.compile(f)).collect();
                self.intern(Node::And(subs))
            }
            Ltl::Or(subs) => {
                let subs = subs.iter().map(|f| self.compile(f)).collect();
                self.intern(Node::Or(subs))
            }
            Ltl::Next(sub) => {
                let sub = self.compile(sub);
                self.intern(Node::Next(sub))
            }
            Ltl::Until(subs) => {
                let lhs = self.compile(&subs.0);
                let rhs = self.compile(&subs.1);
                self.intern(Node::Until(lhs, rhs))
            }
            Ltl::Eventually(sub) => {
                let sub = self.compile(sub);
                self.eventually(sub)
            }
            Ltl::Always(sub) => {
                let sub = self.compile(sub);
                let not_sub = self.intern(Node::Not(sub));
                let eventually = self.eventually(not_sub);
                self.intern(Node::Not(eventually))
            }
            Ltl::Implies(subs) => {
                let lhs = self.compile(&subs.0);
                let rhs = self.compile(&subs.1);
                let not_lhs = self.intern(Node::Not(lhs));
                self.intern(Node::Or(SmallVec::from_slice(&[not_lhs, rhs])))
            }
        }
    }

    fn eventually(&mut self, sub: usize) -> usize {
        let truth = self.truth();
        self.intern(Node::Until(truth, sub))
    }
}

/// An immutable, compiled LTL formula.
///
/// A [`Formula`] holds no trace:
/// it spawns any number of independent [`Monitor`]s,
/// one for each trace to be verified against it.
#[derive(Debug, Clone)]
pub struct Formula {
    tag: BuilderTag,
    ltl: Ltl,
    atoms: Vec<AtomData>,
    identifiers: HashMap<String, Atom>,
    // Atoms reachable from the root, sorted and without repetitions.
    required: Vec<Atom>,
    nodes: Vec<Node>,
    root: usize,
}

impl Formula {
    /// Spawns a new [`Monitor`] with an empty trace.
    ///
    /// ```
    /// # use rvltl_core::{B4, FormulaBuilder, Ltl};
    /// let mut builder = FormulaBuilder::new();
    /// let p = builder.new_atom();
    /// let formula = builder.build(Ltl::eventually(p)).expect("build formula");
    ///
    /// let mut first = formula.monitor();
    /// let mut second = formula.monitor();
    /// first.update([(p, true)]).expect("update");
    /// second.update([(p, false)]).expect("update");
    /// assert_eq!(first.evaluate(), B4::True);
    /// assert_eq!(second.evaluate(), B4::PresumablyFalse);
    /// ```
    pub fn monitor(&self) -> Monitor<'_> {
        Monitor::from(self)
    }

    /// The description the formula was built from.
    pub fn ltl(&self) -> &Ltl {
        &self.ltl
    }

    /// All atoms created by the builder of this formula.
    pub fn atoms(&self) -> impl Iterator<Item = Atom> {
        let tag = self.tag;
        (0..self.atoms.len()).map(move |idx| Atom(tag, idx as AtomIdx))
    }

    /// Whether the atom was created by the builder of this formula.
    pub fn owns(&self, atom: Atom) -> bool {
        atom.0 == self.tag && atom.index() < self.atoms.len()
    }

    /// The atoms that occur in the formula, sorted and without repetitions.
    /// Every step of a trace has to assign a value to each of them.
    pub fn required_atoms(&self) -> &[Atom] {
        &self.required
    }

    /// The name of the given atom, if it has one.
    pub fn atom_name(&self, atom: Atom) -> Option<&str> {
        self.atoms.get(atom.index())?.name.as_deref()
    }

    /// The identifier of the given atom, if it has one.
    pub fn atom_identifier(&self, atom: Atom) -> Option<&str> {
        self.atoms.get(atom.index())?.identifier.as_deref()
    }

    /// Returns the atom with the given identifier, if any.
    pub fn atom_by_identifier(&self, identifier: &str) -> Option<Atom> {
        self.identifiers.get(identifier).copied()
    }

    /// Number of nodes of the compiled formula.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the compiled formula has no nodes (never, as any formula compiles to at least one).
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline(always)]
    pub(crate) fn atoms_len(&self) -> usize {
        self.atoms.len()
    }

    #[inline(always)]
    pub(crate) fn node(&self, idx: usize) -> &Node {
        &self.nodes[idx]
    }

    #[inline(always)]
    pub(crate) fn root(&self) -> usize {
        self.root
    }

    fn fmt_ltl(&self, ltl: &Ltl, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match ltl {
            Ltl::True => write!(f, "⊤"),
            Ltl::False => write!(f, "⊥"),
            Ltl::Atom(atom) => match (self.atom_name(*atom), self.atom_identifier(*atom)) {
                (Some(name), _) | (None, Some(name)) => write!(f, "{name}"),
                (None, None) => write!(f, "#{}", atom.index()),
            },
            Ltl::Not(sub) => {
                write!(f, "(¬")?;
                self.fmt_ltl(sub, f)?;
                write!(f, ")")
            }
            Ltl::And(subs) if subs.is_empty() => write!(f, "⊤"),
            Ltl::Or(subs) if subs.is_empty() => write!(f, "⊥"),
            Ltl::And(subs) | Ltl::Or(subs) => {
                let op = if matches!(ltl, Ltl::And(_)) { " ∧ " } else { " ∨ " };
                write!(f, "(")?;
                for (idx, sub) in subs.iter().enumerate() {
                    if idx > 0 {
                        write!(f, "{op}")?;
                    }
                    self.fmt_ltl(sub, f)?;
                }
                write!(f, ")")
            }
            Ltl::Next(sub) => {
                write!(f, "(X ")?;
                self.fmt_ltl(sub, f)?;
                write!(f, ")")
            }
            Ltl::Eventually(sub) => {
                write!(f, "(eventually ")?;
                self.fmt_ltl(sub, f)?;
                write!(f, ")")
            }
            Ltl::Always(sub) => {
                write!(f, "(always ")?;
                self.fmt_ltl(sub, f)?;
                write!(f, ")")
            }
            Ltl::Until(subs) | Ltl::Implies(subs) => {
                let op = if matches!(ltl, Ltl::Until(_)) { " U " } else { " implies " };
                write!(f, "(")?;
                self.fmt_ltl(&subs.0, f)?;
                write!(f, "{op}")?;
                self.fmt_ltl(&subs.1, f)?;
                write!(f, ")")
            }
        }
    }
}

impl Display for Formula {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.fmt_ltl(&self.ltl, f)
    }
}
