//! Move domain model.
//!
//! # Responsibility
//! - Define the canonical meetup record and its draft/patch shapes.
//! - Own validation and the join/participant coupling rules.
//!
//! # Invariants
//! - `id` is stable, non-blank, and never reused for another move.
//! - `title`, `location`, `exact_meeting_spot` and `time_range` are non-blank.
//! - `max_participants`, when set, is at least 1. It is advisory only.
//! - `participants >= joined_by.len()`, so unjoin can never underflow.
//! - `comments` is append-only in insertion order.

use crate::model::actor::{Actor, ActorId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Opaque identifier of one move.
///
/// Generated ids are UUID v4 strings; imported ids (`"m1"`) are kept as-is.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MoveId(String);

impl MoveId {
    /// Generates a fresh client-side id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Parses an id, trimming surrounding whitespace.
    pub fn parse(value: &str) -> Result<Self, MoveValidationError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(MoveValidationError::BlankId);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for MoveId {
    type Err = MoveValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MoveId {
    type Error = MoveValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<MoveId> for String {
    fn from(value: MoveId) -> Self {
        value.0
    }
}

impl Display for MoveId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Closed set of move categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Sports,
    Study,
    Social,
    Food,
}

impl Category {
    pub const ALL: [Category; 4] = [Self::Sports, Self::Study, Self::Social, Self::Food];

    /// Human-readable label, identical to the wire value.
    pub fn label(self) -> &'static str {
        match self {
            Self::Sports => "Sports",
            Self::Study => "Study",
            Self::Social => "Social",
            Self::Food => "Food",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.label() == value)
    }
}

/// Move status. Set explicitly; never derived from the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveStatus {
    #[serde(rename = "Live Now")]
    LiveNow,
    Upcoming,
    Past,
}

impl MoveStatus {
    pub const ALL: [MoveStatus; 3] = [Self::LiveNow, Self::Upcoming, Self::Past];

    /// Human-readable label, identical to the wire value.
    pub fn label(self) -> &'static str {
        match self {
            Self::LiveNow => "Live Now",
            Self::Upcoming => "Upcoming",
            Self::Past => "Past",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.label() == value)
    }
}

/// One entry of a move's discussion thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub user: String,
    pub text: String,
}

/// Validation failures for move records and drafts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveValidationError {
    BlankId,
    BlankField(&'static str),
    BlankActor(&'static str),
    ZeroCapacity,
    ParticipantsBelowMembers { participants: u32, members: usize },
}

impl Display for MoveValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankId => write!(f, "move id must not be blank"),
            Self::BlankField(field) => write!(f, "{field} must not be blank"),
            Self::BlankActor(field) => write!(f, "{field} must not contain blank actor ids"),
            Self::ZeroCapacity => write!(f, "maxParticipants must be at least 1 when set"),
            Self::ParticipantsBelowMembers {
                participants,
                members,
            } => write!(
                f,
                "participants ({participants}) must be >= joined members ({members})"
            ),
        }
    }
}

impl Error for MoveValidationError {}

/// User-supplied fields for a new move.
///
/// Defaults mirror the create form: `Social` / `Upcoming`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMove {
    pub title: String,
    pub category: Category,
    pub status: MoveStatus,
    pub time_range: String,
    pub location: String,
    pub exact_meeting_spot: String,
    pub max_participants: Option<u32>,
    pub notes: Option<String>,
}

impl NewMove {
    pub fn new(
        title: impl Into<String>,
        time_range: impl Into<String>,
        location: impl Into<String>,
        exact_meeting_spot: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            category: Category::Social,
            status: MoveStatus::Upcoming,
            time_range: time_range.into(),
            location: location.into(),
            exact_meeting_spot: exact_meeting_spot.into(),
            max_participants: None,
            notes: None,
        }
    }

    /// Trims text fields and turns blank notes into `None`.
    fn normalized(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            time_range: self.time_range.trim().to_string(),
            location: self.location.trim().to_string(),
            exact_meeting_spot: self.exact_meeting_spot.trim().to_string(),
            notes: self
                .notes
                .map(|notes| notes.trim().to_string())
                .filter(|notes| !notes.is_empty()),
            ..self
        }
    }
}

/// Canonical meetup record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawMove")]
pub struct Move {
    pub id: MoveId,
    pub title: String,
    pub category: Category,
    pub status: MoveStatus,
    pub time_range: String,
    pub location: String,
    pub exact_meeting_spot: String,
    pub participants: u32,
    pub max_participants: Option<u32>,
    pub notes: Option<String>,
    /// Actor who created the move.
    pub host_id: ActorId,
    pub joined_by: BTreeSet<ActorId>,
    pub saved_by: BTreeSet<ActorId>,
    pub comments: Vec<Comment>,
    /// Unix epoch milliseconds; recency key for `newest` ordering.
    pub created_at: i64,
}

impl Move {
    /// Creates a move hosted by `host` with a generated id.
    ///
    /// # Invariants
    /// - The creator counts as the first participant and is joined.
    /// - `saved_by` and `comments` start empty.
    pub fn create(draft: NewMove, host: &Actor) -> Result<Self, MoveValidationError> {
        Self::with_id(MoveId::generate(), draft, host, now_epoch_ms())
    }

    /// Creates a move with caller-provided identity and creation time.
    ///
    /// Used by seed/import paths where identity already exists.
    pub fn with_id(
        id: MoveId,
        draft: NewMove,
        host: &Actor,
        created_at: i64,
    ) -> Result<Self, MoveValidationError> {
        let draft = draft.normalized();
        let mut joined_by = BTreeSet::new();
        joined_by.insert(host.id.clone());

        let created = Self {
            id,
            title: draft.title,
            category: draft.category,
            status: draft.status,
            time_range: draft.time_range,
            location: draft.location,
            exact_meeting_spot: draft.exact_meeting_spot,
            participants: 1,
            max_participants: draft.max_participants,
            notes: draft.notes,
            host_id: host.id.clone(),
            joined_by,
            saved_by: BTreeSet::new(),
            comments: Vec::new(),
            created_at,
        };
        created.validate()?;
        Ok(created)
    }

    /// Checks record-level invariants.
    pub fn validate(&self) -> Result<(), MoveValidationError> {
        if self.id.as_str().trim().is_empty() {
            return Err(MoveValidationError::BlankId);
        }
        for (field, value) in [
            ("title", &self.title),
            ("timeRange", &self.time_range),
            ("location", &self.location),
            ("exactMeetingSpot", &self.exact_meeting_spot),
        ] {
            if value.trim().is_empty() {
                return Err(MoveValidationError::BlankField(field));
            }
        }
        if self.host_id.as_str().trim().is_empty() {
            return Err(MoveValidationError::BlankActor("hostId"));
        }
        for (field, members) in [("joinedBy", &self.joined_by), ("savedBy", &self.saved_by)] {
            if members.iter().any(|actor| actor.as_str().trim().is_empty()) {
                return Err(MoveValidationError::BlankActor(field));
            }
        }
        if self.max_participants == Some(0) {
            return Err(MoveValidationError::ZeroCapacity);
        }
        if (self.participants as usize) < self.joined_by.len() {
            return Err(MoveValidationError::ParticipantsBelowMembers {
                participants: self.participants,
                members: self.joined_by.len(),
            });
        }
        Ok(())
    }

    pub fn is_joined_by(&self, actor: &ActorId) -> bool {
        self.joined_by.contains(actor)
    }

    pub fn is_saved_by(&self, actor: &ActorId) -> bool {
        self.saved_by.contains(actor)
    }

    pub fn is_hosted_by(&self, actor: &ActorId) -> bool {
        &self.host_id == actor
    }

    pub fn is_live(&self) -> bool {
        self.status == MoveStatus::LiveNow
    }

    /// Whether the advisory capacity is reached. Joins are not blocked by it.
    pub fn is_full(&self) -> bool {
        self.max_participants
            .is_some_and(|capacity| self.participants >= capacity)
    }

    /// Builds the single patch that flips `actor`'s membership.
    ///
    /// Membership and the participant counter always change together.
    pub fn join_toggle_patch(&self, actor: &ActorId) -> MovePatch {
        let mut joined_by = self.joined_by.clone();
        let participants = if joined_by.remove(actor) {
            self.participants.saturating_sub(1)
        } else {
            joined_by.insert(actor.clone());
            self.participants.saturating_add(1)
        };
        MovePatch {
            participants: Some(participants),
            joined_by: Some(joined_by),
            ..MovePatch::default()
        }
    }

    /// Builds the patch that flips `actor`'s saved flag.
    pub fn save_toggle_patch(&self, actor: &ActorId) -> MovePatch {
        let mut saved_by = self.saved_by.clone();
        if !saved_by.remove(actor) {
            saved_by.insert(actor.clone());
        }
        MovePatch {
            saved_by: Some(saved_by),
            ..MovePatch::default()
        }
    }
}

/// Partial update applied by `MoveRepository::update_move`.
///
/// `None` fields are left untouched. `append_comment` is pushed to the end of
/// the thread; existing comments are never rewritten.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovePatch {
    pub status: Option<MoveStatus>,
    pub participants: Option<u32>,
    pub joined_by: Option<BTreeSet<ActorId>>,
    pub saved_by: Option<BTreeSet<ActorId>>,
    pub append_comment: Option<Comment>,
}

impl MovePatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.participants.is_none()
            && self.joined_by.is_none()
            && self.saved_by.is_none()
            && self.append_comment.is_none()
    }

    /// Applies the patch in place and re-validates the record.
    ///
    /// On validation failure `target` is left unchanged.
    pub fn apply_to(&self, target: &mut Move) -> Result<(), MoveValidationError> {
        let mut next = target.clone();
        if let Some(status) = self.status {
            next.status = status;
        }
        if let Some(participants) = self.participants {
            next.participants = participants;
        }
        if let Some(joined_by) = &self.joined_by {
            next.joined_by = joined_by.clone();
        }
        if let Some(saved_by) = &self.saved_by {
            next.saved_by = saved_by.clone();
        }
        if let Some(comment) = &self.append_comment {
            next.comments.push(comment.clone());
        }
        next.validate()?;
        *target = next;
        Ok(())
    }
}

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMove {
    id: MoveId,
    title: String,
    category: Category,
    status: MoveStatus,
    time_range: String,
    location: String,
    exact_meeting_spot: String,
    participants: u32,
    #[serde(default)]
    max_participants: Option<u32>,
    #[serde(default)]
    notes: Option<String>,
    host_id: ActorId,
    #[serde(default)]
    joined_by: BTreeSet<ActorId>,
    #[serde(default)]
    saved_by: BTreeSet<ActorId>,
    #[serde(default)]
    comments: Vec<Comment>,
    created_at: i64,
}

impl TryFrom<RawMove> for Move {
    type Error = MoveValidationError;

    fn try_from(raw: RawMove) -> Result<Self, Self::Error> {
        let decoded = Self {
            id: raw.id,
            title: raw.title,
            category: raw.category,
            status: raw.status,
            time_range: raw.time_range,
            location: raw.location,
            exact_meeting_spot: raw.exact_meeting_spot,
            participants: raw.participants,
            max_participants: raw.max_participants,
            notes: raw.notes,
            host_id: raw.host_id,
            joined_by: raw.joined_by,
            saved_by: raw.saved_by,
            comments: raw.comments,
            created_at: raw.created_at,
        };
        decoded.validate()?;
        Ok(decoded)
    }
}
