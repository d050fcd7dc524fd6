//! URL pattern parsing, matching and generation.
//!
//! Pattern syntax is literal path text interleaved with variables:
//!
//! - `{name}` matches one path segment (`[^/]+`)
//! - `{name>regex}` matches whatever `regex` matches, slashes included
//!
//! A leading `/` is implied and the empty pattern is `/`. Dotted names like
//! `{article.id}` are plain variables as far as matching is concerned; the
//! dots only matter when a URL is built from an object graph.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use regex::Regex;

use crate::encoding::quote;
use crate::error::{Result, RouterError};
use crate::params::PathParams;

/// Matcher used by variables without an explicit regex.
pub const DEFAULT_MATCHER: &str = "[^/]+";

/// A variable segment of a pattern.
#[derive(Debug, Clone)]
pub struct Variable {
    name: String,
    matcher: String,
    /// Capture group name inside the compiled pattern regex.
    group: String,
    /// The matcher anchored on both ends, for validating generated values.
    validator: Regex,
}

impl Variable {
    fn parse(pattern: &str, body: &str, index: usize) -> Result<Self> {
        let (name, matcher) = match body.split_once('>') {
            Some((name, matcher)) => (name, matcher),
            None => (body, DEFAULT_MATCHER),
        };

        if name.is_empty() {
            return Err(RouterError::malformed(pattern, "empty variable name"));
        }
        if name.split('.').any(str::is_empty) || name.contains(['{', '}']) {
            return Err(RouterError::malformed(
                pattern,
                format!("invalid variable name {name:?}"),
            ));
        }
        if matcher.is_empty() {
            return Err(RouterError::malformed(
                pattern,
                format!("empty matcher for variable {name:?}"),
            ));
        }

        let validator = Regex::new(&format!("^(?:{matcher})$")).map_err(|e| {
            RouterError::malformed(pattern, format!("bad matcher for {name:?}: {e}"))
        })?;

        Ok(Self {
            name: name.to_string(),
            matcher: matcher.to_string(),
            group: format!("__v{index}"),
            validator,
        })
    }

    /// Returns the variable name, dots included.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the matcher regex source.
    pub fn matcher(&self) -> &str {
        &self.matcher
    }

    /// Returns the first component of a dotted name (`article` for `article.id`).
    pub fn root(&self) -> &str {
        self.name.split('.').next().unwrap_or(&self.name)
    }

    /// Returns whether the name addresses a field of a bound object.
    pub fn is_dotted(&self) -> bool {
        self.name.contains('.')
    }

    /// Returns whether `value` as a whole satisfies the matcher.
    pub fn accepts(&self, value: &str) -> bool {
        self.validator.is_match(value)
    }
}

/// A segment in a pattern.
#[derive(Debug, Clone)]
pub enum Segment {
    /// Literal text, matched verbatim.
    Literal(String),
    /// A variable capturing whatever its matcher accepts.
    Variable(Variable),
}

/// A parsed URL pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    /// The normalized pattern string.
    source: String,
    /// Parsed segments; adjacent literal text is always merged.
    segments: Vec<Segment>,
    /// Compiled matcher anchored on both ends.
    regex: Regex,
}

impl Pattern {
    /// Parses a pattern string.
    ///
    /// # Example
    ///
    /// ```
    /// use waypoint::Pattern;
    ///
    /// let pattern = Pattern::parse("/posts/{id>\\d+}/comments/{comment_id}").unwrap();
    /// let params = pattern.match_path("/posts/123/comments/456").unwrap();
    /// assert_eq!(params.get("id"), Some("123"));
    /// assert_eq!(params.get("comment_id"), Some("456"));
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        let source = if text.starts_with('/') {
            text.to_string()
        } else {
            format!("/{text}")
        };

        let mut segments = Vec::new();
        let mut names = HashSet::new();
        let mut literal = String::new();
        let mut chars = source.char_indices();

        while let Some((start, c)) = chars.next() {
            match c {
                '{' => {
                    let end = find_closing_brace(&mut chars).ok_or_else(|| {
                        RouterError::malformed(&source, format!("unclosed '{{' at offset {start}"))
                    })?;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    let index = names.len();
                    let variable = Variable::parse(&source, &source[start + 1..end], index)?;
                    if !names.insert(variable.name.clone()) {
                        return Err(RouterError::malformed(
                            &source,
                            format!("duplicate variable {:?}", variable.name),
                        ));
                    }
                    segments.push(Segment::Variable(variable));
                }
                '}' => {
                    return Err(RouterError::malformed(
                        &source,
                        format!("unmatched '}}' at offset {start}"),
                    ));
                }
                _ => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        let mut regex_str = String::from("^");
        for segment in &segments {
            match segment {
                Segment::Literal(text) => regex_str.push_str(&regex::escape(text)),
                Segment::Variable(var) => {
                    regex_str.push_str(&format!("(?P<{}>{})", var.group, var.matcher));
                }
            }
        }
        regex_str.push('$');

        let regex = Regex::new(&regex_str)
            .map_err(|e| RouterError::malformed(&source, e.to_string()))?;

        Ok(Self {
            source,
            segments,
            regex,
        })
    }

    /// Attempts to match a decoded path against this pattern.
    ///
    /// Returns every captured variable, dotted names included.
    pub fn match_path(&self, path: &str) -> Option<PathParams> {
        let caps = self.regex.captures(path)?;

        let mut params = PathParams::new();
        for var in self.variables() {
            if let Some(value) = caps.name(&var.group) {
                params.insert(var.name.clone(), value.as_str());
            }
        }

        Some(params)
    }

    /// Generates a path from parameters.
    ///
    /// Every value must be present and satisfy its variable's matcher; values
    /// are percent-encoded on output.
    ///
    /// # Example
    ///
    /// ```
    /// use waypoint::{PathParams, Pattern};
    ///
    /// let pattern = Pattern::parse("/foo/{var>\\d+}").unwrap();
    /// let params: PathParams = [("var", "123")].into_iter().collect();
    /// assert_eq!(pattern.generate(&params).unwrap(), "/foo/123");
    /// ```
    pub fn generate(&self, params: &PathParams) -> Result<String> {
        let mut path = String::new();

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => path.push_str(text),
                Segment::Variable(var) => {
                    let value = params
                        .get(&var.name)
                        .ok_or_else(|| RouterError::MissingVariable(var.name.clone()))?;
                    if !var.accepts(value) {
                        return Err(RouterError::invalid(
                            &var.name,
                            format!("{value:?} does not match /{}/", var.matcher),
                        ));
                    }
                    path.push_str(&quote(value));
                }
            }
        }

        Ok(path)
    }

    /// Returns whether two patterns are interchangeable.
    ///
    /// Variable names are ignored; literal text and matcher sources must be
    /// identical segment by segment.
    pub fn equals(&self, other: &Self) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|pair| match pair {
                    (Segment::Literal(a), Segment::Literal(b)) => a == b,
                    (Segment::Variable(a), Segment::Variable(b)) => a.matcher == b.matcher,
                    _ => false,
                })
    }

    /// Compares the specificity of two patterns.
    ///
    /// `Some(Ordering::Less)` means `self` is more specific and must be tried
    /// before `other`. `None` means the patterns are incomparable.
    ///
    /// Segments are compared pairwise from the start:
    /// - a literal is more specific than a variable;
    /// - of two different literals, one extending the other is more specific,
    ///   otherwise the lexicographically smaller one is;
    /// - two variables tie and scanning continues.
    ///
    /// When every compared position ties the pattern with fewer segments is
    /// more specific; equal lengths are incomparable.
    pub fn specificity(&self, other: &Self) -> Option<Ordering> {
        for pair in self.segments.iter().zip(&other.segments) {
            match pair {
                (Segment::Literal(mine), Segment::Literal(theirs)) => {
                    if mine == theirs {
                        continue;
                    }
                    if mine.starts_with(theirs.as_str()) {
                        return Some(Ordering::Less);
                    }
                    if theirs.starts_with(mine.as_str()) {
                        return Some(Ordering::Greater);
                    }
                    return Some(mine.cmp(theirs));
                }
                (Segment::Literal(_), Segment::Variable(_)) => return Some(Ordering::Less),
                (Segment::Variable(_), Segment::Literal(_)) => return Some(Ordering::Greater),
                (Segment::Variable(_), Segment::Variable(_)) => {}
            }
        }

        match self.segments.len().cmp(&other.segments.len()) {
            Ordering::Equal => None,
            ord => Some(ord),
        }
    }

    /// Returns whether `self` must be tried before `other`.
    pub fn is_more_specific_than(&self, other: &Self) -> bool {
        self.specificity(other) == Some(Ordering::Less)
    }

    /// Returns the normalized pattern string.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns the parsed segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the variables in pattern order.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Variable(var) => Some(var),
            Segment::Literal(_) => None,
        })
    }

    /// Returns the distinct root names of all variables, in pattern order.
    ///
    /// `/{article.author.slug}/{article.id}-{page}` has roots `article` and
    /// `page`.
    pub fn roots(&self) -> Vec<&str> {
        let mut roots: Vec<&str> = Vec::new();
        for var in self.variables() {
            if !roots.contains(&var.root()) {
                roots.push(var.root());
            }
        }
        roots
    }
}

/// Consumes characters up to the brace closing an opened variable.
///
/// Braces nest so that matchers may use quantifiers like `\d{4}`; a backslash
/// escapes the next character.
fn find_closing_brace(chars: &mut std::str::CharIndices<'_>) -> Option<usize> {
    let mut depth = 1usize;
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for Pattern {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
