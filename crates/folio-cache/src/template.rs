//! Cache key templates.
//!
//! A template such as `"dashboard_view_{user_id}_{role}"` is parsed once
//! into literal text and placeholders, then resolved per call against the
//! call's arguments and the caller's identity.
//!
//! Placeholder kinds:
//! - `{user_id}` / `{role}`: the principal's id and role. Without a
//!   principal they fall back to keyword arguments of the same name.
//! - `{0}`, `{1}`, ...: positional arguments.
//! - `{name}`: keyword arguments.
//!
//! A placeholder with nothing to substitute stays in the key verbatim and
//! is reported in [`ResolvedKey::unresolved`].

use folio_core::Principal;
use std::collections::BTreeMap;
use std::fmt;

/// A substitutable part of a key template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Placeholder {
    /// `{user_id}`
    UserId,
    /// `{role}`
    Role,
    /// `{i}`
    Positional(usize),
    /// `{name}`
    Named(String),
}

impl Placeholder {
    /// Parses the text between the braces.
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "user_id" => Some(Self::UserId),
            "role" => Some(Self::Role),
            _ if !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()) => {
                // `{01}` is not `{1}`: only the canonical spelling is a placeholder.
                let index: usize = name.parse().ok()?;
                (index.to_string() == name).then_some(Self::Positional(index))
            }
            _ if is_identifier(name) => Some(Self::Named(name.to_string())),
            _ => None,
        }
    }

    /// Whether this placeholder is filled from the caller's identity.
    #[must_use]
    pub const fn is_identity(&self) -> bool {
        matches!(self, Self::UserId | Self::Role)
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserId => f.write_str("{user_id}"),
            Self::Role => f.write_str("{role}"),
            Self::Positional(index) => write!(f, "{{{}}}", index),
            Self::Named(name) => write!(f, "{{{}}}", name),
        }
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Placeholder(Placeholder),
}

/// A parsed key template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl KeyTemplate {
    /// Parses a template. Never fails: anything that is not a well-formed
    /// placeholder, including stray braces, is literal text.
    pub fn parse(source: impl Into<String>) -> Self {
        let source = source.into();
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = source.as_str();

        while let Some(open) = rest.find('{') {
            literal.push_str(&rest[..open]);
            let after = &rest[open + 1..];

            match after.find(['{', '}']) {
                Some(close) if after.as_bytes()[close] == b'}' => {
                    let name = &after[..close];
                    match Placeholder::from_name(name) {
                        Some(placeholder) => {
                            if !literal.is_empty() {
                                segments.push(Segment::Literal(std::mem::take(&mut literal)));
                            }
                            segments.push(Segment::Placeholder(placeholder));
                        }
                        None => {
                            literal.push('{');
                            literal.push_str(name);
                            literal.push('}');
                        }
                    }
                    rest = &after[close + 1..];
                }
                // Unclosed, or another `{` opens first: this brace is text.
                _ => {
                    literal.push('{');
                    rest = after;
                }
            }
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self { source, segments }
    }

    /// The template text as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Placeholders in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = &Placeholder> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Placeholder(placeholder) => Some(placeholder),
            Segment::Literal(_) => None,
        })
    }

    /// Resolves the template into a concrete key. Pure.
    #[must_use]
    pub fn resolve(&self, args: &CallArgs, identity: Option<&Principal>) -> ResolvedKey {
        let mut key = String::with_capacity(self.source.len());
        let mut unresolved = Vec::new();

        for segment in &self.segments {
            let placeholder = match segment {
                Segment::Literal(text) => {
                    key.push_str(text);
                    continue;
                }
                Segment::Placeholder(placeholder) => placeholder,
            };

            let value = match placeholder {
                Placeholder::UserId => identity
                    .map(|p| p.id.as_str())
                    .or_else(|| args.named("user_id")),
                Placeholder::Role => identity
                    .map(|p| p.role.as_str())
                    .or_else(|| args.named("role")),
                Placeholder::Positional(index) => args.positional(*index),
                Placeholder::Named(name) => args.named(name),
            };

            match value {
                Some(value) => key.push_str(value),
                None => {
                    key.push_str(&placeholder.to_string());
                    if !unresolved.contains(placeholder) {
                        unresolved.push(placeholder.clone());
                    }
                }
            }
        }

        ResolvedKey { key, unresolved }
    }
}

impl From<&str> for KeyTemplate {
    fn from(source: &str) -> Self {
        Self::parse(source)
    }
}

impl From<String> for KeyTemplate {
    fn from(source: String) -> Self {
        Self::parse(source)
    }
}

impl fmt::Display for KeyTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Arguments of a memoized call, already rendered to text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallArgs {
    positional: Vec<String>,
    named: BTreeMap<String, String>,
}

impl CallArgs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument.
    #[must_use]
    pub fn arg(mut self, value: impl fmt::Display) -> Self {
        self.positional.push(value.to_string());
        self
    }

    /// Sets a keyword argument.
    #[must_use]
    pub fn kwarg(mut self, name: impl Into<String>, value: impl fmt::Display) -> Self {
        self.named.insert(name.into(), value.to_string());
        self
    }

    /// The positional argument at `index`.
    #[must_use]
    pub fn positional(&self, index: usize) -> Option<&str> {
        self.positional.get(index).map(String::as_str)
    }

    /// The keyword argument called `name`.
    #[must_use]
    pub fn named(&self, name: &str) -> Option<&str> {
        self.named.get(name).map(String::as_str)
    }
}

/// Outcome of resolving a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedKey {
    /// The key, with unresolved placeholders left in literally.
    pub key: String,
    /// Placeholders that had no value, without duplicates.
    pub unresolved: Vec<Placeholder>,
}

impl ResolvedKey {
    /// Whether every placeholder was substituted.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }

    /// Whether an identity placeholder was left unfilled.
    #[must_use]
    pub fn missing_identity(&self) -> bool {
        self.unresolved.iter().any(Placeholder::is_identity)
    }
}
