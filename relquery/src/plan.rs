//! Backend-neutral boolean filter fragments.
//!
//! A [`Fragment`] is what the translator hands to the SQL compiler: a logical
//! tree of AND/OR/NOT, comparisons and correlated EXISTS subqueries. Column
//! references carry the alias of the table they belong to, so a fragment is
//! meaningful only inside the query that declares those aliases.

use sea_orm::Value;

use crate::filter::Operator;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub alias: String,
    pub column: String,
}

impl ColumnRef {
    pub fn new(alias: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            column: column.into(),
        }
    }
}

/// Right-hand side of a comparison, already converted to driver values.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    None,
    Single(Value),
    List(Vec<Value>),
    Range(Value, Value),
}

impl Operand {
    pub fn value_count(&self) -> usize {
        match self {
            Operand::None => 0,
            Operand::Single(_) => 1,
            Operand::List(values) => values.len(),
            Operand::Range(..) => 2,
        }
    }
}

/// `SELECT 1 FROM <table> <alias> WHERE <filter>`, evaluated per outer row.
#[derive(Debug, Clone, PartialEq)]
pub struct Subquery {
    pub table: String,
    pub alias: String,
    pub filter: Fragment,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    True,
    False,
    And(Vec<Fragment>),
    Or(Vec<Fragment>),
    Not(Box<Fragment>),
    /// Holds unless the inner fragment is TRUE, so SQL NULL counts as failure.
    NotTrue(Box<Fragment>),
    Compare {
        column: ColumnRef,
        operator: Operator,
        operand: Operand,
    },
    ColumnEq(ColumnRef, ColumnRef),
    Exists(Box<Subquery>),
}

impl Fragment {
    /// Conjunction that drops `True` members and collapses on `False`.
    pub fn and(parts: Vec<Fragment>) -> Fragment {
        let mut kept = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                Fragment::True => {}
                Fragment::False => return Fragment::False,
                Fragment::And(inner) => kept.extend(inner),
                other => kept.push(other),
            }
        }
        match kept.len() {
            0 => Fragment::True,
            1 => kept.remove(0),
            _ => Fragment::And(kept),
        }
    }

    /// Disjunction that drops `False` members and collapses on `True`.
    pub fn or(parts: Vec<Fragment>) -> Fragment {
        let mut kept = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                Fragment::False => {}
                Fragment::True => return Fragment::True,
                Fragment::Or(inner) => kept.extend(inner),
                other => kept.push(other),
            }
        }
        match kept.len() {
            0 => Fragment::False,
            1 => kept.remove(0),
            _ => Fragment::Or(kept),
        }
    }

    pub fn not(inner: Fragment) -> Fragment {
        match inner {
            Fragment::True => Fragment::False,
            Fragment::False => Fragment::True,
            Fragment::Not(inner) => *inner,
            other => Fragment::Not(Box::new(other)),
        }
    }

    pub fn not_true(inner: Fragment) -> Fragment {
        match inner {
            Fragment::True => Fragment::False,
            Fragment::False => Fragment::True,
            other => Fragment::NotTrue(Box::new(other)),
        }
    }

    pub fn exists(table: impl Into<String>, alias: impl Into<String>, filter: Fragment) -> Fragment {
        Fragment::Exists(Box::new(Subquery {
            table: table.into(),
            alias: alias.into(),
            filter,
        }))
    }

    pub fn has_subquery(&self) -> bool {
        match self {
            Fragment::Exists(_) => true,
            Fragment::And(parts) | Fragment::Or(parts) => parts.iter().any(Fragment::has_subquery),
            Fragment::Not(inner) | Fragment::NotTrue(inner) => inner.has_subquery(),
            Fragment::True
            | Fragment::False
            | Fragment::Compare { .. }
            | Fragment::ColumnEq(..) => false,
        }
    }

    /// Number of bound parameters the compiled fragment will carry.
    pub fn value_count(&self) -> usize {
        match self {
            Fragment::Compare { operand, .. } => operand.value_count(),
            Fragment::And(parts) | Fragment::Or(parts) => parts.iter().map(Fragment::value_count).sum(),
            Fragment::Not(inner) | Fragment::NotTrue(inner) => inner.value_count(),
            Fragment::Exists(subquery) => subquery.filter.value_count(),
            Fragment::True | Fragment::False | Fragment::ColumnEq(..) => 0,
        }
    }
}
