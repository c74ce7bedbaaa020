use std::{
    fmt::{Display, Formatter, Result},
    ops::Deref,
};

/// A lowercase `[a-z0-9-]` identifier that neither starts nor ends with `-`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceName(String);

impl AsRef<str> for ResourceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for ResourceName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for ResourceName {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{}", self.0)
    }
}

impl From<ResourceName> for String {
    fn from(value: ResourceName) -> Self {
        value.0
    }
}

impl From<&ResourceName> for String {
    fn from(value: &ResourceName) -> Self {
        value.0.clone()
    }
}

/// Lowercases `raw`, collapses every run of characters outside `[a-z0-9-]`
/// into a single `-` and trims `-` from both ends. Returns `fallback` when
/// nothing is left.
///
/// The character classes are ASCII only: `Ä` lowercases to `ä` and is still
/// replaced.
#[must_use]
pub fn sanitize(raw: &str, fallback: &str) -> ResourceName {
    let mut name = String::with_capacity(raw.len());
    let mut replacing = false;

    for c in raw.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
            name.push(c);
            replacing = false;
        } else if !replacing {
            name.push('-');
            replacing = true;
        }
    }

    let name = name.trim_matches('-');

    if name.is_empty() {
        ResourceName(fallback.to_string())
    } else {
        ResourceName(name.to_string())
    }
}
