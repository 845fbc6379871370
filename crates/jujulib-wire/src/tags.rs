//! Parsed Juju entity tags.
//!
//! The controller identifies users as `user-<name>[@<domain>]` and models as
//! `model-<uuid>`. Keeping these as small value types means the domain
//! defaulting rule lives in one place.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Domain assigned to users that were created on the controller itself.
pub const LOCAL_DOMAIN: &str = "local";

const USER_PREFIX: &str = "user-";
const MODEL_PREFIX: &str = "model-";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TagError {
    #[error("empty user name in {0:?}")]
    EmptyUserName(String),

    #[error("empty user domain in {0:?}")]
    EmptyDomain(String),

    #[error("not a model tag: {0:?}")]
    NotAModelTag(String),
}

/// A user tag such as `user-bob` or `user-bob@external`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserTag {
    name: String,
    domain: Option<String>,
}

impl UserTag {
    /// A user without an explicit domain.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            domain: None,
        }
    }

    /// A user qualified with a domain.
    pub fn with_domain(name: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            domain: Some(domain.into()),
        }
    }

    /// Parse a user tag. The `user-` prefix is optional, so bare user names
    /// returned by the controller (`"who"`) are accepted as well.
    pub fn parse(s: &str) -> Result<Self, TagError> {
        let body = s.strip_prefix(USER_PREFIX).unwrap_or(s);
        let (name, domain) = match body.split_once('@') {
            Some((name, domain)) => {
                if domain.is_empty() {
                    return Err(TagError::EmptyDomain(s.to_string()));
                }
                (name, Some(domain.to_string()))
            }
            None => (body, None),
        };

        if name.is_empty() {
            return Err(TagError::EmptyUserName(s.to_string()));
        }

        Ok(Self {
            name: name.to_string(),
            domain,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// True when the user belongs to the controller's own user database.
    pub fn is_local(&self) -> bool {
        self.domain.as_deref().map_or(true, |d| d == LOCAL_DOMAIN)
    }

    /// Fill in the `local` domain when none was given.
    pub fn with_default_domain(mut self) -> Self {
        if self.domain.is_none() {
            self.domain = Some(LOCAL_DOMAIN.to_string());
        }
        self
    }

    /// The user name without the tag prefix, e.g. `bob@external`.
    pub fn canonical_name(&self) -> String {
        match &self.domain {
            Some(domain) => format!("{}@{}", self.name, domain),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for UserTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", USER_PREFIX, self.canonical_name())
    }
}

impl FromStr for UserTag {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for UserTag {
    type Error = TagError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<UserTag> for String {
    fn from(tag: UserTag) -> Self {
        tag.to_string()
    }
}

/// A model tag, `model-<uuid>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModelTag {
    uuid: String,
}

impl ModelTag {
    pub fn from_uuid(uuid: impl Into<String>) -> Self {
        Self { uuid: uuid.into() }
    }

    pub fn parse(s: &str) -> Result<Self, TagError> {
        match s.strip_prefix(MODEL_PREFIX) {
            Some(uuid) if !uuid.is_empty() => Ok(Self::from_uuid(uuid)),
            _ => Err(TagError::NotAModelTag(s.to_string())),
        }
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }
}

impl fmt::Display for ModelTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", MODEL_PREFIX, self.uuid)
    }
}

impl FromStr for ModelTag {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ModelTag {
    type Error = TagError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ModelTag> for String {
    fn from(tag: ModelTag) -> Self {
        tag.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user_tag_forms() {
        let bare = UserTag::parse("who").unwrap();
        assert_eq!(bare.name(), "who");
        assert_eq!(bare.domain(), None);
        assert_eq!(bare.to_string(), "user-who");

        let tagged = UserTag::parse("user-dalek@skaro").unwrap();
        assert_eq!(tagged.name(), "dalek");
        assert_eq!(tagged.domain(), Some("skaro"));
        assert_eq!(tagged.to_string(), "user-dalek@skaro");

        let bare_domain = UserTag::parse("rose@external").unwrap();
        assert_eq!(bare_domain.to_string(), "user-rose@external");
    }

    #[test]
    fn test_user_tag_rejects_empty_parts() {
        assert!(matches!(
            UserTag::parse("user-"),
            Err(TagError::EmptyUserName(_))
        ));
        assert!(matches!(
            UserTag::parse("user-@local"),
            Err(TagError::EmptyUserName(_))
        ));
        assert!(matches!(
            UserTag::parse("user-bob@"),
            Err(TagError::EmptyDomain(_))
        ));
    }

    #[test]
    fn test_default_domain_only_fills_missing() {
        let bob = UserTag::parse("user-bob").unwrap().with_default_domain();
        assert_eq!(bob.to_string(), "user-bob@local");
        assert!(bob.is_local());

        let ext = UserTag::parse("user-bob@external")
            .unwrap()
            .with_default_domain();
        assert_eq!(ext.to_string(), "user-bob@external");
        assert!(!ext.is_local());
    }

    #[test]
    fn test_canonical_name() {
        assert_eq!(UserTag::new("admin").canonical_name(), "admin");
        assert_eq!(
            UserTag::with_domain("admin", "local").canonical_name(),
            "admin@local"
        );
    }

    #[test]
    fn test_model_tag() {
        let tag = ModelTag::parse("model-5bea955d-1").unwrap();
        assert_eq!(tag.uuid(), "5bea955d-1");
        assert_eq!(tag.to_string(), "model-5bea955d-1");
        assert_eq!(ModelTag::from_uuid("abc").to_string(), "model-abc");

        assert!(ModelTag::parse("model-").is_err());
        assert!(ModelTag::parse("user-bob").is_err());
    }

    #[test]
    fn test_tags_serialize_as_strings() {
        let tag = ModelTag::from_uuid("u1");
        assert_eq!(serde_json::to_value(&tag).unwrap(), "model-u1");

        let user: UserTag = serde_json::from_value(serde_json::json!("user-who")).unwrap();
        assert_eq!(user, UserTag::new("who"));

        let bad: Result<ModelTag, _> = serde_json::from_value(serde_json::json!("nope"));
        assert!(bad.is_err());
    }
}
