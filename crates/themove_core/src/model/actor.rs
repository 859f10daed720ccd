//! Viewer identity used to compute per-actor move state.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable identity of one app user.
///
/// Deserialization goes through [`ActorId::parse`], so a blank id never
/// decodes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ActorId(String);

/// Rejection for an actor id that is empty after trimming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlankActorId;

impl Display for BlankActorId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "actor id must not be blank")
    }
}

impl Error for BlankActorId {}

impl ActorId {
    /// Parses an actor id, trimming surrounding whitespace.
    ///
    /// Returns `None` for blank input.
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ActorId {
    type Error = BlankActorId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or(BlankActorId)
    }
}

impl From<ActorId> for String {
    fn from(value: ActorId) -> Self {
        value.0
    }
}

impl Display for ActorId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The actor currently driving the app.
///
/// `display_name` is what other people see on comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub display_name: String,
}

impl Actor {
    /// Builds an actor; a blank display name falls back to the id.
    pub fn new(id: ActorId, display_name: impl Into<String>) -> Self {
        let display_name = display_name.into();
        let trimmed = display_name.trim();
        let display_name = if trimmed.is_empty() {
            id.as_str().to_string()
        } else {
            trimmed.to_string()
        };
        Self { id, display_name }
    }

    /// First character of the display name, uppercased, for avatar badges.
    pub fn initial(&self) -> char {
        comment_initial(&self.display_name)
    }
}

/// Uppercased first character of a name, `?` for empty names.
pub fn comment_initial(name: &str) -> char {
    name.chars()
        .next()
        .and_then(|c| c.to_uppercase().next())
        .unwrap_or('?')
}

#[cfg(test)]
mod tests {
    use super::{comment_initial, Actor, ActorId, BlankActorId};

    #[test]
    fn parse_rejects_blank_ids() {
        assert!(ActorId::parse("   ").is_none());
        assert_eq!(ActorId::parse(" sam ").unwrap().as_str(), "sam");
    }

    #[test]
    fn deserialize_goes_through_parse() {
        let id: ActorId = serde_json::from_str("\" sam \"").unwrap();
        assert_eq!(id.as_str(), "sam");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"sam\"");

        let err = serde_json::from_str::<ActorId>("\"  \"").unwrap_err();
        assert!(err.to_string().contains("actor id must not be blank"));
        assert_eq!(ActorId::try_from(String::new()), Err(BlankActorId));
    }

    #[test]
    fn blank_display_name_falls_back_to_id() {
        let actor = Actor::new(ActorId::parse("u-42").unwrap(), "  ");
        assert_eq!(actor.display_name, "u-42");
        assert_eq!(actor.initial(), 'U');
    }

    #[test]
    fn initial_handles_empty_names() {
        assert_eq!(comment_initial(""), '?');
        assert_eq!(comment_initial("you"), 'Y');
    }
}
