use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use anyhow::{Context, anyhow};
use log::info;
use rvltl_core::{Atom, Formula, FormulaBuilder, Ltl};
use serde::Deserialize;

/// An atomic proposition declared by a formula file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct AtomDecl {
    /// Identifier of the atom, used by traces to refer to it.
    id: String,
    /// Human-readable name used in reports.
    #[serde(default)]
    name: Option<String>,
    /// Probability of the atom being true at any step of a simulated run.
    #[serde(default = "default_probability")]
    probability: f64,
}

fn default_probability() -> f64 {
    0.5
}

/// Structured encoding of an LTL formula, e.g.,
/// `{"always": {"implies": [{"atom": "request"}, {"eventually": {"atom": "response"}}]}}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Node {
    True,
    False,
    Atom(String),
    Not(Box<Node>),
    And(Vec<Node>),
    Or(Vec<Node>),
    Next(Box<Node>),
    Until(Box<Node>, Box<Node>),
    Eventually(Box<Node>),
    Always(Box<Node>),
    Implies(Box<Node>, Box<Node>),
}

impl Node {
    fn to_ltl(&self, builder: &FormulaBuilder) -> anyhow::Result<Ltl> {
        let ltl = match self {
            Node::True => Ltl::True,
            Node::False => Ltl::False,
            Node::Atom(id) => builder
                .atom_by_identifier(id)
                .map(Ltl::Atom)
                .ok_or_else(|| anyhow!("atom '{id}' is not declared"))?,
            Node::Not(f) => !f.to_ltl(builder)?,
            Node::And(fs) => Ltl::And(Self::to_ltls(fs, builder)?),
            Node::Or(fs) => Ltl::Or(Self::to_ltls(fs, builder)?),
            Node::Next(f) => Ltl::next(f.to_ltl(builder)?),
            Node::Until(lhs, rhs) => Ltl::until(lhs.to_ltl(builder)?, rhs.to_ltl(builder)?),
            Node::Eventually(f) => Ltl::eventually(f.to_ltl(builder)?),
            Node::Always(f) => Ltl::always(f.to_ltl(builder)?),
            Node::Implies(lhs, rhs) => {
                Ltl::implies(lhs.to_ltl(builder)?, rhs.to_ltl(builder)?)
            }
        };
        Ok(ltl)
    }

    fn to_ltls(fs: &[Node], builder: &FormulaBuilder) -> anyhow::Result<Vec<Ltl>> {
        fs.iter().map(|f| f.to_ltl(builder)).collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct FormulaFile {
    atoms: Vec<AtomDecl>,
    formula: Node,
}

/// A compiled formula together with the probabilities assigned to its atoms.
#[derive(Debug)]
pub(crate) struct Loaded {
    pub(crate) formula: Formula,
    pub(crate) probabilities: Vec<(Atom, f64)>,
}

pub(crate) fn load(path: &Path) -> anyhow::Result<Loaded> {
    info!("loading formula file {}", path.display());
    let file = File::open(path)
        .with_context(|| format!("failed to open formula file '{}'", path.display()))?;
    parse(BufReader::new(file))
        .with_context(|| format!("failed to load formula file '{}'", path.display()))
}

pub(crate) fn parse(reader: impl Read) -> anyhow::Result<Loaded> {
    let file: FormulaFile = serde_json::from_reader(reader).context("malformed formula")?;
    let mut builder = FormulaBuilder::new();
    let probabilities = file
        .atoms
        .iter()
        .map(|decl| {
            builder
                .new_identified_atom(&decl.id, decl.name.as_deref())
                .map(|atom| (atom, decl.probability))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let ltl = file.formula.to_ltl(&builder)?;
    let formula = builder.build(ltl)?;
    Ok(Loaded {
        formula,
        probabilities,
    })
}
