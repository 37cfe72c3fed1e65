//! Registry key for named models.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static ENTITY_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("valid entity name regex"));

/// Logical collection identifier, unique per model.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityName(String);

impl EntityName {
    /// Parses a trimmed, non-empty identifier.
    pub fn parse(value: &str) -> Result<Self, InvalidEntityName> {
        let trimmed = value.trim();
        if !ENTITY_NAME_RE.is_match(trimmed) {
            return Err(InvalidEntityName(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for EntityName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidEntityName(pub String);

impl Display for InvalidEntityName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "entity name is invalid: `{}`", self.0)
    }
}

impl Error for InvalidEntityName {}

#[cfg(test)]
mod tests {
    use super::EntityName;

    #[test]
    fn parse_trims_and_accepts_identifiers() {
        assert_eq!(EntityName::parse("  Trip ").unwrap().as_str(), "Trip");
        assert_eq!(EntityName::parse("trip_v2").unwrap().as_str(), "trip_v2");
    }

    #[test]
    fn parse_rejects_blank_and_odd_names() {
        assert!(EntityName::parse("").is_err());
        assert!(EntityName::parse("   ").is_err());
        assert!(EntityName::parse("2trips").is_err());
        assert!(EntityName::parse("trips; DROP").is_err());
    }
}
