use std::fmt;

/// Unique, stable name of a user record, e.g. an email address.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Identifier(String);

impl Identifier {
    /// Returns `None` for an empty (or whitespace-only) input.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Identifier(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UserRecord {
    pub identifier: Identifier,
    pub is_admin: bool,
}
