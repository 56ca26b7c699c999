//! The Filter AST: an in-memory, recursive tagged-tree representation of a
//! parsed filter expression (§4.B).

use hotfield_core::Json;

/// A single field operator and its operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    Eq(Json),
    Ne(Json),
    Gt(Json),
    Gte(Json),
    Lt(Json),
    Lte(Json),
    In(Vec<Json>),
    Nin(Vec<Json>),
    Exists(bool),
    Regex { pattern: String, options: Option<String> },
    Type(String),
    All(Vec<Json>),
    ElemMatch(Box<Filter>),
    Size(i64),
}

impl Operator {
    /// The `$`-prefixed operator name, used for diagnostics and for
    /// matching against §6's client-facing grammar.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Eq(_) => "$eq",
            Self::Ne(_) => "$ne",
            Self::Gt(_) => "$gt",
            Self::Gte(_) => "$gte",
            Self::Lt(_) => "$lt",
            Self::Lte(_) => "$lte",
            Self::In(_) => "$in",
            Self::Nin(_) => "$nin",
            Self::Exists(_) => "$exists",
            Self::Regex { .. } => "$regex",
            Self::Type(_) => "$type",
            Self::All(_) => "$all",
            Self::ElemMatch(_) => "$elemMatch",
            Self::Size(_) => "$size",
        }
    }
}

/// A node in the filter expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `field_path OP operand`.
    Field { path: String, op: Operator },
    /// `and(children)` — requires at least one child.
    And(Vec<Filter>),
    /// `or(children)` — requires at least one child.
    Or(Vec<Filter>),
    /// `not(child)`.
    Not(Box<Filter>),
}

impl Filter {
    /// A convenience constructor for the common implicit-equality case.
    #[must_use]
    pub fn eq(path: impl Into<String>, value: impl Into<Json>) -> Self {
        Self::Field { path: path.into(), op: Operator::Eq(value.into()) }
    }

    /// Collect every leaf field path touched by this filter, in
    /// left-to-right traversal order, excluding envelope fields (those
    /// starting with `_`). Used by the Query Translator to report accessed
    /// paths to the Pattern Analyzer (§4.D "Side effects").
    pub fn collect_field_paths(&self, out: &mut Vec<String>) {
        match self {
            Self::Field { path, op } => {
                if !path.starts_with('_') {
                    out.push(path.clone());
                }
                if let Operator::ElemMatch(inner) = op {
                    inner.collect_field_paths(out);
                }
            }
            Self::And(children) | Self::Or(children) => {
                for child in children {
                    child.collect_field_paths(out);
                }
            }
            Self::Not(child) => child.collect_field_paths(out),
        }
    }
}
