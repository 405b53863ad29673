//! Dynamic `find_by_<field>`-style finders.
//!
//! A finder name is parsed against a fixed prefix table into a [`Finder`], which is
//! then routed to one of the parametrized fetch/count operations. There is no method
//! synthesis: `"find_by_name"` and `find_by("name", ..)` reach the same code.

use crate::error::{OrmError, OrmResult};
use crate::fragment::create_in_clause_placeholders;
use crate::value::Value;
use std::fmt;
use std::str::FromStr;

/// Which operation a finder routes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinderKind {
    /// `find_by_<field>`: every match.
    FindAll,
    /// `findOne_by_<field>`: first match ordered by the field ascending.
    FindOne,
    /// `first_by_<field>`: first match ordered by the field ascending.
    First,
    /// `last_by_<field>`: first match ordered by the field descending.
    Last,
    /// `count_by_<field>`: number of matches.
    Count,
}

const PREFIXES: &[(&str, FinderKind)] = &[
    ("find_by_", FinderKind::FindAll),
    ("findOne_by_", FinderKind::FindOne),
    ("first_by_", FinderKind::First),
    ("last_by_", FinderKind::Last),
    ("count_by_", FinderKind::Count),
];

impl FinderKind {
    pub fn prefix(self) -> &'static str {
        PREFIXES
            .iter()
            .find(|(_, kind)| *kind == self)
            .map_or("", |(prefix, _)| prefix)
    }

    /// Sort direction applied to the matched field, if any.
    pub fn order(self) -> Option<&'static str> {
        match self {
            FinderKind::FindOne | FinderKind::First => Some("ASC"),
            FinderKind::Last => Some("DESC"),
            FinderKind::FindAll | FinderKind::Count => None,
        }
    }
}

/// A parsed finder call: operation plus the field it matches on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finder {
    pub kind: FinderKind,
    pub field: String,
}

impl Finder {
    pub fn new(kind: FinderKind, field: impl Into<String>) -> Self {
        Self {
            kind,
            field: field.into(),
        }
    }

    /// Parse a call name such as `find_by_name` or `count_by_status`.
    ///
    /// Names are case sensitive. Unrecognised names fail with
    /// [`OrmError::UnknownOperation`].
    pub fn parse(name: &str) -> OrmResult<Self> {
        for (prefix, kind) in PREFIXES {
            if let Some(field) = name.strip_prefix(prefix) {
                if field.is_empty() {
                    break;
                }
                return Ok(Self::new(*kind, field));
            }
        }
        Err(OrmError::UnknownOperation(name.to_string()))
    }
}

impl FromStr for Finder {
    type Err = OrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Finder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.prefix(), self.field)
    }
}

/// The argument of a finder: one value (`=`) or a set of values (`IN`).
#[derive(Debug, Clone, PartialEq)]
pub enum Match {
    One(Value),
    Many(Vec<Value>),
}

impl Match {
    /// WHERE body and parameters for `quoted_field`.
    ///
    /// An empty set matches nothing.
    pub fn condition(&self, quoted_field: &str) -> (String, Vec<Value>) {
        match self {
            Match::One(v) => (format!("{quoted_field} = ?"), vec![v.clone()]),
            Match::Many(vs) if vs.is_empty() => ("1 = 0".to_string(), Vec::new()),
            Match::Many(vs) => (
                format!(
                    "{quoted_field} IN ({})",
                    create_in_clause_placeholders(vs.len())
                ),
                vs.clone(),
            ),
        }
    }
}

macro_rules! impl_match_one {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Match {
                fn from(v: $t) -> Self {
                    Match::One(v.into())
                }
            }
        )*
    };
}

impl_match_one!(Value, &str, String, i32, i64, u32, bool, f64, chrono::NaiveDateTime);

impl<T: Into<Value>> From<Vec<T>> for Match {
    fn from(vs: Vec<T>) -> Self {
        Match::Many(vs.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Match {
    fn from(vs: [T; N]) -> Self {
        Match::Many(vs.into_iter().map(Into::into).collect())
    }
}

impl<T: Clone + Into<Value>> From<&[T]> for Match {
    fn from(vs: &[T]) -> Self {
        Match::Many(vs.iter().cloned().map(Into::into).collect())
    }
}

/// Result of a dynamically dispatched finder.
#[derive(Debug, Clone, PartialEq)]
pub enum FinderOutput<T> {
    Many(Vec<T>),
    One(Option<T>),
    Count(i64),
}

impl<T> FinderOutput<T> {
    pub fn into_many(self) -> Option<Vec<T>> {
        match self {
            FinderOutput::Many(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_one(self) -> Option<Option<T>> {
        match self {
            FinderOutput::One(v) => Some(v),
            _ => None,
        }
    }

    pub fn count(&self) -> Option<i64> {
        match self {
            FinderOutput::Count(n) => Some(*n),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> FinderOutput<U> {
        match self {
            FinderOutput::Many(v) => FinderOutput::Many(v.into_iter().map(f).collect()),
            FinderOutput::One(v) => FinderOutput::One(v.map(f)),
            FinderOutput::Count(n) => FinderOutput::Count(n),
        }
    }
}
