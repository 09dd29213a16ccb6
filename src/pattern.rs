//! Route path compilation.
//!
//! A route path such as `/users/:id/posts/:slug?` is compiled once, at
//! registration, into an anchored [`Regex`] plus an ordered list of
//! segments. The regex answers "does this request path match, and what
//! did it capture"; the segments drive the inverse direction, rebuilding a
//! concrete path from parameter values for [`Router::url_for`].
//!
//! ```text
//! /users/:id/posts/:slug?
//!   Literal("/users")  Param(id)  Literal("/posts")  Param(slug, optional)
//!   ^/users/([^/]+)/posts(?:/([^/]+))?/?$
//! ```
//!
//! The separator in front of a parameter belongs to the parameter, which is
//! what lets an omitted optional parameter take its `/` with it.
//!
//! [`Router::url_for`]: crate::Router::url_for

use std::borrow::Cow;

use regex::Regex;

use crate::context::Params;
use crate::error::Error;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param { name: String, optional: bool },
}

/// A compiled route path.
#[derive(Clone, Debug)]
pub(crate) struct Pattern {
    regex: Regex,
    segments: Vec<Segment>,
    names: Vec<String>,
}

impl Pattern {
    /// Compiles `path`, rejecting a parameter name that appears twice.
    pub(crate) fn compile(path: &str) -> Result<Self, Error> {
        let mut segments = Vec::new();
        let mut names: Vec<String> = Vec::new();
        let mut literal = String::new();
        let mut rest = path;

        while !rest.is_empty() {
            if let Some((name, optional, tail)) = split_param(rest) {
                if names.iter().any(|n| n == name) {
                    return Err(Error::DuplicateParameterName {
                        path: path.to_owned(),
                        name: name.to_owned(),
                    });
                }
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                names.push(name.to_owned());
                segments.push(Segment::Param { name: name.to_owned(), optional });
                rest = tail;
                continue;
            }
            let mut chars = rest.chars();
            if let Some(ch) = chars.next() {
                literal.push(ch);
            }
            rest = chars.as_str();
        }

        // The trailing separator is matched optionally below, so it is never
        // part of the literal text.
        let trimmed = literal.trim_end_matches('/');
        if !trimmed.is_empty() {
            segments.push(Segment::Literal(trimmed.to_owned()));
        }

        let mut source = String::with_capacity(path.len() * 2 + 8);
        source.push('^');
        for segment in &segments {
            match segment {
                Segment::Literal(text) => source.push_str(&regex::escape(text)),
                Segment::Param { optional: false, .. } => source.push_str("/([^/]+)"),
                Segment::Param { optional: true, .. } => source.push_str("(?:/([^/]+))?"),
            }
        }
        source.push_str("/?$");

        let regex = Regex::new(&source).map_err(|e| Error::InvalidPath {
            path: path.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self { regex, segments, names })
    }

    /// Parameter names in path order.
    pub(crate) fn param_names(&self) -> &[String] {
        &self.names
    }

    pub(crate) fn has_param(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Matches `path` structurally and returns one entry per declared
    /// parameter. Omitted optional segments come back absent, never as `""`.
    pub(crate) fn captures(&self, path: &str) -> Option<Params> {
        let caps = self.regex.captures(path)?;
        let entries = self
            .names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let value = caps
                    .get(i + 1)
                    .map(|m| m.as_str())
                    .filter(|v| !v.is_empty())
                    .map(|v| decode(v).into_owned());
                (name.clone(), value)
            })
            .collect();
        Some(Params::from_entries(entries))
    }

    /// Rebuilds a concrete path, percent-encoding every substituted value.
    ///
    /// `lookup` yields the supplied value for a parameter name; an empty
    /// value counts as not supplied.
    pub(crate) fn expand<'v>(
        &self,
        route: &str,
        lookup: impl Fn(&str) -> Option<&'v str>,
    ) -> Result<String, Error> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Param { name, optional } => match lookup(name).filter(|v| !v.is_empty()) {
                    Some(value) => {
                        out.push('/');
                        out.push_str(&urlencoding::encode(value));
                    }
                    None if *optional => {}
                    None => {
                        return Err(Error::MissingRequiredParameter {
                            route: route.to_owned(),
                            param: name.clone(),
                        });
                    }
                },
            }
        }
        if out.is_empty() {
            out.push('/');
        }
        Ok(out)
    }
}

/// Recognises `/:name` or `/:name?` at the start of `input` and returns the
/// name, the optional flag and the remaining input.
fn split_param(input: &str) -> Option<(&str, bool, &str)> {
    let after = input.strip_prefix("/:")?;
    let len = after
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(after.len());
    if len == 0 {
        return None;
    }
    let (name, tail) = after.split_at(len);
    match tail.strip_prefix('?') {
        Some(tail) => Some((name, true, tail)),
        None => Some((name, false, tail)),
    }
}

/// Percent-decodes a captured segment; invalid UTF-8 escapes are kept verbatim.
fn decode(raw: &str) -> Cow<'_, str> {
    urlencoding::decode(raw).unwrap_or(Cow::Borrowed(raw))
}
