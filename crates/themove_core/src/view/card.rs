//! Per-viewer render model for one move.

use crate::model::actor::ActorId;
use crate::model::move_record::{Category, Comment, Move, MoveId, MoveStatus};
use crate::repo::move_repo::{HostMarking, StoreCapabilities};
use serde::Serialize;

/// Render-ready move as seen by one viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveCard {
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
    pub comments: Vec<Comment>,
    pub is_joined: bool,
    pub is_saved: bool,
    pub is_host: bool,
    pub is_live: bool,
    pub is_full: bool,
    pub can_delete: bool,
    /// `"3/10"`, or `"3/-"` without a capacity.
    pub capacity_label: String,
    /// `"3/10 participants"`, or `"3 participants"` without a capacity.
    pub participants_label: String,
}

impl MoveCard {
    pub fn for_viewer(record: &Move, viewer: &ActorId, capabilities: StoreCapabilities) -> Self {
        let is_host = match capabilities.host_marking {
            HostMarking::Creator => record.is_hosted_by(viewer),
            HostMarking::Everyone => true,
        };
        let (capacity_label, participants_label) = match record.max_participants {
            Some(capacity) => (
                format!("{}/{}", record.participants, capacity),
                format!("{}/{} participants", record.participants, capacity),
            ),
            None => (
                format!("{}/-", record.participants),
                format!("{} participants", record.participants),
            ),
        };

        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            category: record.category,
            status: record.status,
            time_range: record.time_range.clone(),
            location: record.location.clone(),
            exact_meeting_spot: record.exact_meeting_spot.clone(),
            participants: record.participants,
            max_participants: record.max_participants,
            notes: record.notes.clone(),
            comments: record.comments.clone(),
            is_joined: record.is_joined_by(viewer),
            is_saved: record.is_saved_by(viewer),
            is_host,
            is_live: record.is_live(),
            is_full: record.is_full(),
            can_delete: capabilities.supports_delete && is_host,
            capacity_label,
            participants_label,
        }
    }
}
