//! R2RML mapping parsing and the routing index derived from it (spec §4.4).

mod model;
mod parse;
mod routing;

pub use model::{template_columns, template_extract, template_render, JoinCondition, ObjectMap, R2RMLMapping};
pub use parse::{parse_document, R2RMLError};
pub use routing::{PredicateTarget, RoutingIndex};
