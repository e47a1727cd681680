//! Query result shapes (spec §3.1): a `Solution` binds each query variable
//! to an RDF term for one matching row.

use std::collections::HashMap;

/// One query-variable binding.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Iri { iri: String },
    Literal {
        value: String,
        datatype: Option<String>,
        lang: Option<String>,
    },
    Unbound,
}

impl Binding {
    pub fn iri(iri: impl Into<String>) -> Self {
        Binding::Iri { iri: iri.into() }
    }

    pub fn literal(value: impl Into<String>, datatype: Option<String>) -> Self {
        Binding::Literal {
            value: value.into(),
            datatype,
            lang: None,
        }
    }

    pub fn is_bound(&self) -> bool {
        !matches!(self, Binding::Unbound)
    }
}

/// One row of the result set: variable name → binding.
pub type Solution = HashMap<String, Binding>;
