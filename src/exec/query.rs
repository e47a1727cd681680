//! Query-shaped inputs accepted by the [`Executor`](super::executor::Executor)
//! (spec §6.1).

use crate::iceberg_source::TimeTravel;

/// A term appearing in subject/predicate/object position of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// A query variable, e.g. `?airline`.
    Variable(String),
    /// A bound IRI.
    Iri(String),
}

impl Term {
    pub fn as_variable(&self) -> Option<&str> {
        match self {
            Term::Variable(name) => Some(name),
            Term::Iri(_) => None,
        }
    }

    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Term::Iri(iri) => Some(iri),
            Term::Variable(_) => None,
        }
    }
}

/// A single triple pattern `subject predicate object`, predicate always
/// bound to an IRI (the engine routes through R2RML predicate mappings,
/// not variable predicates).
///
/// `optional` marks the pattern as a SPARQL-style `OPTIONAL { }` member
/// (spec §4.5.5, §4.6.5, §6.2): the table(s) it alone introduces are
/// joined in with a left-outer join rather than excluding a row from the
/// result when nothing matches.
#[derive(Debug, Clone)]
pub struct TriplePattern {
    pub subject: Term,
    pub predicate: String,
    pub object: Term,
    pub optional: bool,
}

impl TriplePattern {
    pub fn new(subject: Term, predicate: impl Into<String>, object: Term) -> Self {
        TriplePattern {
            subject,
            predicate: predicate.into(),
            object,
            optional: false,
        }
    }

    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }
}

/// `+` requires at least one hop; `*` is reflexive over the start node
/// (spec §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    OnePlus,
    ZeroPlus,
}

/// A transitive property-path pattern `subject predicate{+,*} object`.
#[derive(Debug, Clone)]
pub struct TransitivePattern {
    pub subject: Term,
    pub predicate: String,
    pub object: Term,
    pub kind: PathKind,
}

/// Per-query options layered over the engine's ambient defaults.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Applied by the executor after all joins complete (spec §9 Open
    /// Questions: per-scan `limit` is advisory only).
    pub limit: Option<u64>,
    pub time_travel: TimeTravel,
}

/// A full graph query: zero or more basic triple patterns plus zero or
/// more transitive path patterns, all implicitly conjoined.
#[derive(Debug, Clone, Default)]
pub struct GraphQuery {
    pub patterns: Vec<TriplePattern>,
    pub transitive_patterns: Vec<TransitivePattern>,
    pub options: QueryOptions,
}
