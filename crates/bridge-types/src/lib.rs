//! Validated primitive types shared across the bridge crates.
//!
//! These wrappers are checked once at construction so that translators can rely on
//! their contents without re-validating:
//! - [`NonEmptyText`]: trimmed text with at least one visible character.
//! - [`ResourceId`]: a FHIR logical id (`[A-Za-z0-9\-.]{1,64}`).

use std::fmt;
use std::str::FromStr;

/// Errors raised when constructing validated primitives.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input was empty once surrounding whitespace was removed.
    #[error("text cannot be empty")]
    Empty,

    /// The input is not a legal FHIR logical id.
    #[error("invalid FHIR resource id: '{0}'")]
    InvalidResourceId(String),
}

/// Text guaranteed to hold at least one non-whitespace character.
///
/// Leading and trailing whitespace is stripped on construction, so two values built from
/// `" CIEL "` and `"CIEL"` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Trims `input` and wraps it, failing with [`TextError::Empty`] when nothing is left.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for NonEmptyText {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Maximum length of a FHIR logical id.
pub const MAX_RESOURCE_ID_LEN: usize = 64;

/// A FHIR logical resource id.
///
/// FHIR restricts ids to ASCII letters, digits, `-` and `.`, between 1 and 64 characters.
/// Domain uuids in their hyphenated form always satisfy this.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId(String);

impl ResourceId {
    /// Validates `input` as a FHIR logical id. No trimming or case folding is applied.
    pub fn parse(input: &str) -> Result<Self, TextError> {
        if Self::is_valid(input) {
            return Ok(Self(input.to_owned()));
        }
        Err(TextError::InvalidResourceId(input.to_owned()))
    }

    /// Returns true if `input` is a syntactically valid FHIR logical id.
    pub fn is_valid(input: &str) -> bool {
        !input.is_empty()
            && input.len() <= MAX_RESOURCE_ID_LEN
            && input
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'.')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ResourceId {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for ResourceId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for ResourceId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ResourceId::parse(&s).map_err(serde::de::Error::custom)
    }
}
