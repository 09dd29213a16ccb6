//! Per-parameter validation rules.
//!
//! A rule is compiled when it is attached to a route, so a malformed pattern
//! surfaces as an [`Error::InvalidConstraintPattern`] during configuration
//! rather than on the first request that happens to reach it. At request time
//! a failed rule only removes that route from consideration; lookup carries
//! on with the next registered route.

use std::collections::HashMap;

use regex::Regex;

use crate::context::Params;
use crate::error::Error;

pub(crate) const NUMBER: &str = "[0-9]+";
pub(crate) const ALPHA: &str = "[a-zA-Z]+";
pub(crate) const ALPHA_NUMERIC: &str = "[a-zA-Z0-9]+";
pub(crate) const UUID: &str =
    "[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}";
pub(crate) const ULID: &str = "[0-7][0-9a-hjkmnp-tv-zA-HJKMNP-TV-Z]{25}";

/// A validation rule for one route parameter.
///
/// Every form must match the *whole* parameter value.
///
/// ```rust
/// use waypoint::Rule;
///
/// let by_pattern: Rule = "[a-z]+".into();
/// let by_values = Rule::one_of(["draft", "published"]);
/// ```
#[derive(Clone, Debug)]
pub enum Rule {
    /// Regular-expression source, compiled on attachment.
    Pattern(String),
    /// An already compiled expression.
    Regex(Regex),
    /// A fixed set of accepted values, matched literally.
    OneOf(Vec<String>),
}

impl Rule {
    pub fn one_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::OneOf(values.into_iter().map(Into::into).collect())
    }
}

impl From<&str> for Rule {
    fn from(src: &str) -> Self { Self::Pattern(src.to_owned()) }
}

impl From<String> for Rule {
    fn from(src: String) -> Self { Self::Pattern(src) }
}

impl From<Regex> for Rule {
    fn from(re: Regex) -> Self { Self::Regex(re) }
}

/// A compiled rule that only accepts whole-value matches.
#[derive(Clone, Debug)]
pub(crate) enum Constraint {
    /// Compiled from text with `^(?:…)$` around it.
    Anchored(Regex),
    /// A caller's own expression, flags intact; the leftmost match must span
    /// the whole value.
    Whole(Regex),
}

impl Constraint {
    pub(crate) fn compile(param: &str, rule: Rule) -> Result<Self, Error> {
        let invalid = |reason: String| Error::InvalidConstraintPattern {
            param: param.to_owned(),
            reason,
        };
        let source = match rule {
            Rule::Regex(re) => return Ok(Self::Whole(re)),
            Rule::Pattern(src) => src,
            Rule::OneOf(values) if values.is_empty() => {
                return Err(invalid("empty value list".to_owned()));
            }
            Rule::OneOf(values) => {
                values.iter().map(|v| regex::escape(v)).collect::<Vec<_>>().join("|")
            }
        };
        Regex::new(&format!("^(?:{source})$"))
            .map(Self::Anchored)
            .map_err(|e| invalid(e.to_string()))
    }

    pub(crate) fn accepts(&self, value: &str) -> bool {
        match self {
            Self::Anchored(re) => re.is_match(value),
            Self::Whole(re) => re
                .find(value)
                .is_some_and(|m| m.start() == 0 && m.end() == value.len()),
        }
    }
}

/// The rules attached to one route, keyed by parameter name.
#[derive(Clone, Debug, Default)]
pub(crate) struct Constraints {
    rules: HashMap<String, Constraint>,
}

impl Constraints {
    /// Replaces any rule previously attached to `param`.
    pub(crate) fn insert(&mut self, param: &str, constraint: Constraint) {
        self.rules.insert(param.to_owned(), constraint);
    }

    /// A parameter without a rule passes, and so does an absent one: rules
    /// never force an optional parameter to be present.
    pub(crate) fn check(&self, params: &Params) -> bool {
        self.rules.iter().all(|(name, rule)| match params.get(name) {
            Some(value) => rule.accepts(value),
            None => true,
        })
    }
}
