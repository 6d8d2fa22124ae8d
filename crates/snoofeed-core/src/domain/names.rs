use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Validated subreddit name, stored without any `r/` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubredditName(String);

impl SubredditName {
    /// Parse a subreddit name, accepting and stripping `r/` and `/r/`
    /// prefixes the way users commonly type them.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        let name = strip_prefixes(trimmed, &["/r/", "r/"]);

        let len = name.chars().count();
        let shape_ok = (2..=21).contains(&len)
            && name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
        if !shape_ok {
            return Err(ValidationError::InvalidSubredditName {
                value: trimmed.to_string(),
            });
        }

        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SubredditName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for SubredditName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for SubredditName {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<SubredditName> for String {
    fn from(value: SubredditName) -> Self {
        value.0
    }
}

/// Validated Reddit username, stored without any `u/` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Parse a username, accepting and stripping `u/` and `/u/` prefixes.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        let name = strip_prefixes(trimmed, &["/u/", "u/"]);

        let len = name.chars().count();
        let shape_ok = (3..=20).contains(&len)
            && name
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-');
        if !shape_ok {
            return Err(ValidationError::InvalidUsername {
                value: trimmed.to_string(),
            });
        }

        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Username {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Username {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for Username {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

fn strip_prefixes<'a>(input: &'a str, prefixes: &[&str]) -> &'a str {
    for prefix in prefixes {
        if let Some(stripped) = input.strip_prefix(prefix) {
            return stripped;
        }
    }
    input
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subreddit_names_shed_prefixes() {
        assert_eq!(SubredditName::parse("rust").unwrap().as_str(), "rust");
        assert_eq!(SubredditName::parse("r/rust").unwrap().as_str(), "rust");
        assert_eq!(SubredditName::parse("/r/rust").unwrap().as_str(), "rust");
        assert_eq!(SubredditName::parse("  r/AskReddit  ").unwrap().as_str(), "AskReddit");
    }

    #[test]
    fn subreddit_names_reject_bad_shapes() {
        for input in ["", "a", "x".repeat(22).as_str(), "has space", "semi;colon", "dash-ed"] {
            assert!(SubredditName::parse(input).is_err(), "accepted {input:?}");
        }
    }

    #[test]
    fn usernames_shed_prefixes_and_allow_hyphens() {
        assert_eq!(Username::parse("u/spez").unwrap().as_str(), "spez");
        assert_eq!(Username::parse("/u/some-user_1").unwrap().as_str(), "some-user_1");
    }

    #[test]
    fn usernames_reject_bad_shapes() {
        for input in ["", "ab", "x".repeat(21).as_str(), "bad name", "dot.ted"] {
            assert!(Username::parse(input).is_err(), "accepted {input:?}");
        }
    }

    #[test]
    fn serde_round_trips_through_the_validated_form() {
        let name: SubredditName = serde_json::from_str("\"r/rust\"").unwrap();
        assert_eq!(name.as_str(), "rust");
        assert_eq!(serde_json::to_string(&name).unwrap(), "\"rust\"");

        let rejected: Result<Username, _> = serde_json::from_str("\"!!\"");
        assert!(rejected.is_err());
    }
}
