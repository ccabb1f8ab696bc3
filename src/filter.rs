//! Thread matching predicates for canonical dumps.
//!
//! A [`Filter`] pairs one thread field with a [`Matcher`] strategy and
//! answers whether a given [`Thread`] matches. All strategies share the
//! same calling shape so consumers can pick one at runtime; pattern
//! matching runs a compiled [`Regex`] owned by the matcher.

use regex::Regex;

use crate::model::{Frame, Thread};

// === Match strategies ===

/// How an observed string is compared against the expected value.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// The value must equal the expected string exactly.
    Exact(String),
    /// The value must start with the expected string.
    Prefix(String),
    /// The value must contain the expected string anywhere.
    Substring(String),
    /// The value must contain a match of the compiled pattern.
    Pattern(Regex),
}

impl Matcher {
    pub fn exact(value: impl Into<String>) -> Self {
        Matcher::Exact(value.into())
    }

    pub fn prefix(value: impl Into<String>) -> Self {
        Matcher::Prefix(value.into())
    }

    pub fn substring(value: impl Into<String>) -> Self {
        Matcher::Substring(value.into())
    }

    /// Compiles `expr` into a pattern matcher.
    pub fn pattern(expr: &str) -> Result<Self, regex::Error> {
        Ok(Matcher::Pattern(Regex::new(expr)?))
    }

    /// Applies the strategy to one observed value.
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Matcher::Exact(expected) => value == expected,
            Matcher::Prefix(prefix) => value.starts_with(prefix.as_str()),
            Matcher::Substring(needle) => value.contains(needle.as_str()),
            Matcher::Pattern(pattern) => pattern.is_match(value),
        }
    }
}

// === Field selection ===

/// The thread field a [`Filter`] inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Name,
    NativeId,
    JavaId,
    Stacktrace,
}

/// A field selector combined with a match strategy.
#[derive(Debug, Clone)]
pub struct Filter {
    field: FilterField,
    matcher: Matcher,
}

impl Filter {
    pub fn new(field: FilterField, matcher: Matcher) -> Self {
        Self { field, matcher }
    }

    pub fn field(&self) -> FilterField {
        self.field
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Tests `thread` against this filter.
    ///
    /// The stacktrace selector checks the symbol of every code and
    /// constructor frame and succeeds on the first hit. Lock frames
    /// carry no call symbol and are not consulted.
    pub fn matches(&self, thread: &Thread) -> bool {
        match self.field {
            FilterField::Name => self.matcher.matches(&thread.name),
            FilterField::NativeId => self.matcher.matches(&thread.native_id),
            FilterField::JavaId => self.matcher.matches(&thread.java_id),
            FilterField::Stacktrace => thread
                .frames
                .iter()
                .filter_map(Frame::call_symbol)
                .any(|symbol| self.matcher.matches(symbol)),
        }
    }
}
