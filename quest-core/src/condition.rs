//! Eligibility condition attached to a quest (its "variable").
//!
//! The textual form is what quest authors write:
//! - `none`, `any` or empty: always satisfied
//! - `a,b,c`: satisfied when the signal carries any of the listed values
//! - `a&b`: satisfied when the signal carries every listed value
//!
//! Matching is case-insensitive.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Condition {
    #[default]
    Any,
    OneOf(Vec<String>),
    AllOf(Vec<String>),
}

impl Condition {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty()
            || trimmed.eq_ignore_ascii_case("none")
            || trimmed.eq_ignore_ascii_case("any")
        {
            return Condition::Any;
        }
        if trimmed.contains('&') {
            let values = split_values(trimmed, '&');
            if values.is_empty() {
                return Condition::Any;
            }
            return Condition::AllOf(values);
        }
        let values = split_values(trimmed, ',');
        if values.is_empty() {
            return Condition::Any;
        }
        Condition::OneOf(values)
    }

    /// Check the condition against the values carried by a signal.
    pub fn matches<S: AsRef<str>>(&self, values: &[S]) -> bool {
        let carries = |wanted: &str| {
            values
                .iter()
                .any(|v| v.as_ref().trim().eq_ignore_ascii_case(wanted))
        };
        match self {
            Condition::Any => true,
            Condition::OneOf(wanted) => wanted.iter().any(|w| carries(w.as_str())),
            Condition::AllOf(wanted) => wanted.iter().all(|w| carries(w.as_str())),
        }
    }

    pub fn is_unconditional(&self) -> bool {
        matches!(self, Condition::Any)
    }
}

fn split_values(raw: &str, separator: char) -> Vec<String> {
    raw.split(separator)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_lowercase)
        .collect()
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Any => f.write_str("none"),
            Condition::OneOf(values) => f.write_str(&values.join(",")),
            Condition::AllOf(values) => f.write_str(&values.join("&")),
        }
    }
}

impl FromStr for Condition {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<String> for Condition {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<&str> for Condition {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<Condition> for String {
    fn from(value: Condition) -> Self {
        value.to_string()
    }
}
